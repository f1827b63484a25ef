use tracing::debug;

use crate::Error;

/// Client-held copy of one backend collection.
///
/// The backend is the source of truth: items are only ever replaced wholesale
/// from a fresh list response, never patched locally. Mutated only through
/// [`begin`](Self::begin), [`replace`](Self::replace) and [`fail`](Self::fail).
#[derive(Debug, Clone)]
pub struct CollectionState<T> {
    items: Vec<T>,
    loading: bool,
    error: Option<String>,
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T> CollectionState<T> {
    /// Create an empty, idle collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current items, as of the last successful refetch.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Returns `true` while an operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed operation, cleared when the next one starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Mark an operation as started.
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Install a fresh list from the backend and finish loading.
    pub fn replace(&mut self, items: Vec<T>) {
        debug!(count = items.len(), "collection refreshed");
        self.items = items;
        self.loading = false;
    }

    /// Record a failure and finish loading. Items are left as they were.
    pub fn fail(&mut self, error: &Error) {
        self.loading = false;
        self.error = Some(error.to_string());
    }

    /// Settle an operation's result: record the error on failure, pass it through.
    pub(crate) fn settle<R>(&mut self, result: Result<R, Error>) -> Result<R, Error> {
        if let Err(ref e) = result {
            self.fail(e);
        }
        result
    }
}
