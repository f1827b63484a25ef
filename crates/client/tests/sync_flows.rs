//! End-to-end flows against a scripted in-process backend.
//!
//! The mock answers connections strictly in script order and records every
//! request, so tests can assert both the exact call sequence and that calls
//! which must not happen (an upsert after a failed upload) never arrive.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use procura_client::{
    BrokerFailure, CatalogSync, CityCache, Error, LinkingSync, ProcuraClient, StaticCredentials,
    UploadBroker, UserSync,
};
use procura_core::{
    AttachmentSet, CatalogItemFields, CompanyUserPatch, LinkingResponse, LinkingStatus,
    NewCompanyUser,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    target: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

struct MockBackend {
    listener: TcpListener,
    base_url: String,
}

struct RunningBackend {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server");
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("http://127.0.0.1:{port}");
        Self { listener, base_url }
    }

    /// Answer one connection per scripted `(status, body)` pair, in order.
    fn serve(self, script: Vec<(u16, String)>) -> RunningBackend {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let listener = self.listener;
        let handle = tokio::spawn(async move {
            for (status, body) in script {
                let (mut stream, _) = listener.accept().await.unwrap();
                let request = read_request(&mut stream).await;
                recorded.lock().unwrap().push(request);

                let response = format!(
                    "HTTP/1.1 {status} OK\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\
                     \r\n\
                     {body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            }
        });
        RunningBackend {
            base_url: self.base_url,
            requests,
            handle,
        }
    }
}

impl RunningBackend {
    /// Stop serving and return everything that was received.
    async fn finish(self) -> Vec<Recorded> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.handle.abort();
        let _ = self.handle.await;
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap().split(' ');
    let method = request_line.next().unwrap().to_string();
    let target = request_line.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Recorded {
        method,
        target,
        headers,
        body,
    }
}

fn client(base_url: &str) -> ProcuraClient {
    ProcuraClient::builder(base_url)
        .credentials(Arc::new(StaticCredentials::new("test-token")))
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn form_grant(base_url: &str, key: &str) -> String {
    serde_json::json!({
        "put_url": {
            "url": format!("{base_url}/storage"),
            "fields": {"key": key, "policy": "opaque-policy"}
        },
        "finalurl": format!("https://cdn.example.com/{key}")
    })
    .to_string()
}

fn products(items: &serde_json::Value) -> String {
    serde_json::json!({ "products": items }).to_string()
}

fn flour(pictures: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "product_id": "p-1",
        "name": "Flour",
        "description": "Wheat flour",
        "stock_quantity": 40,
        "retail_price": 2.5,
        "threshold": 10,
        "bulk_price": 2.0,
        "minimum_order": 1,
        "unit": "kg",
        "picture_url": pictures
    })
}

#[tokio::test]
async fn update_uploads_only_staged_and_keeps_order() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let uploaded_ref = "https://cdn.example.com/uploads/new.png";
    let refetched = serde_json::json!([flour(&["A", uploaded_ref])]);
    let running = backend.serve(vec![
        (200, form_grant(&base, "uploads/new.png")),
        (204, String::new()),
        (200, r#"{"ok": true}"#.to_string()),
        (200, products(&refetched)),
    ]);

    let mut catalog = CatalogSync::new(client(&base));
    let mut pictures = AttachmentSet::from_persisted(["A"]);
    pictures.stage(b"png-bytes".to_vec(), "file1.png");
    let mut fields = CatalogItemFields::new("Flour");
    fields.unit = "kg".into();

    let item = catalog.update("p-1", fields, pictures).await.unwrap();
    let requests = running.finish().await;

    assert_eq!(requests.len(), 4);

    let grant = &requests[0];
    assert_eq!(grant.method, "GET");
    assert_eq!(grant.target, "/uploads/upload-url?ext=png");
    assert_eq!(grant.header("authorization"), Some("Bearer test-token"));

    let transfer = &requests[1];
    assert_eq!(transfer.method, "POST");
    assert_eq!(transfer.target, "/storage");
    assert!(transfer.header("authorization").is_none());
    let form = transfer.body_text();
    let key_at = form.find("name=\"key\"").expect("key field sent");
    let file_at = form.find("name=\"file\"").expect("file part sent");
    assert!(key_at < file_at, "form fields must precede the file");
    assert!(form.contains("filename=\"file1.png\""));
    assert!(form.contains("png-bytes"));
    assert_eq!(
        transfer.header("content-length"),
        Some(transfer.body.len().to_string().as_str()),
        "staged bytes go out with a known length"
    );
    assert!(form.contains("opaque-policy"));

    let upsert = &requests[2];
    assert_eq!(upsert.method, "PUT");
    assert_eq!(upsert.target, "/products/p-1");
    let body = upsert.json();
    assert_eq!(body["picture_url"], serde_json::json!(["A", uploaded_ref]));
    assert_eq!(body["pictures_to_remove"], serde_json::json!([]));
    assert_eq!(body["product_id"], "p-1");
    assert_eq!(body["unit"], "kg");

    assert_eq!(requests[3].method, "GET");
    assert_eq!(requests[3].target, "/products/");

    assert_eq!(item.picture_url, vec!["A", uploaded_ref]);
    assert_eq!(catalog.items().len(), 1);
    assert!(!catalog.state().is_loading());
    assert!(catalog.state().error().is_none());
}

#[tokio::test]
async fn update_sends_removed_references() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![
        (200, products(&serde_json::json!([flour(&["A", "B"])]))),
        (200, r#"{"ok": true}"#.to_string()),
        (200, products(&serde_json::json!([flour(&["B"])]))),
    ]);

    let mut catalog = CatalogSync::new(client(&base));
    catalog.fetch().await.unwrap();
    let mut pictures = catalog.edit_pictures("p-1").unwrap();
    assert!(pictures.remove_reference("A"));

    catalog
        .update("p-1", CatalogItemFields::new("Flour"), pictures)
        .await
        .unwrap();
    let requests = running.finish().await;

    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].method, "PUT");
    let body = requests[1].json();
    assert_eq!(body["picture_url"], serde_json::json!(["B"]));
    assert_eq!(body["pictures_to_remove"], serde_json::json!(["A"]));
    assert_eq!(catalog.find("p-1").unwrap().picture_url, vec!["B"]);
}

#[tokio::test]
async fn create_without_pictures_makes_no_grant_request() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![
        (201, r#"{"product_id": "p-7"}"#.to_string()),
        (
            200,
            products(&serde_json::json!([{"product_id": "p-7", "name": "Salt"}])),
        ),
    ]);

    let mut catalog = CatalogSync::new(client(&base));
    let item = catalog
        .create(CatalogItemFields::new("Salt"), AttachmentSet::new())
        .await
        .unwrap();
    let requests = running.finish().await;

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].target, "/products/");
    let body = requests[0].json();
    assert_eq!(body["picture_url"], serde_json::json!([]));
    assert!(body.get("pictures_to_remove").is_none());
    assert_eq!(item.product_id(), Some("p-7"));
}

#[tokio::test]
async fn failed_transfer_aborts_before_upsert() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![
        (200, form_grant(&base, "uploads/one.jpg")),
        (204, String::new()),
        (200, form_grant(&base, "uploads/two.jpg")),
        (403, "<Error><Code>AccessDenied</Code></Error>".to_string()),
    ]);

    let mut catalog = CatalogSync::new(client(&base));
    let mut pictures = AttachmentSet::new();
    pictures.stage(b"one".to_vec(), "one.jpg");
    pictures.stage(b"two".to_vec(), "two.jpg");
    pictures.stage(b"three".to_vec(), "three.jpg");

    let err = catalog
        .create(CatalogItemFields::new("Sugar"), pictures)
        .await
        .unwrap_err();
    let requests = running.finish().await;

    match &err {
        Error::Reconciliation { position, source } => {
            assert_eq!(*position, 1);
            assert!(matches!(**source, Error::Transfer { status: 403, .. }));
        }
        other => panic!("expected reconciliation error, got {other:?}"),
    }
    assert_eq!(requests.len(), 4);
    assert!(requests.iter().all(|r| !r.target.starts_with("/products")));
    assert!(!catalog.state().is_loading());
    assert!(catalog.state().error().unwrap().contains("AccessDenied"));
    assert!(catalog.items().is_empty());
}

#[tokio::test]
async fn unauthorized_grant_is_reported() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![(401, r#"{"detail": "Not authenticated"}"#.to_string())]);

    let err = client(&base).request_grant("png").await.unwrap_err();
    running.finish().await;

    match err {
        Error::UploadBroker { reason, message } => {
            assert_eq!(reason, BrokerFailure::Unauthorized);
            assert_eq!(message, "Not authenticated");
        }
        other => panic!("expected broker error, got {other:?}"),
    }
}

#[tokio::test]
async fn grant_without_target_is_malformed() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![(
        200,
        r#"{"put_url": {"url": "", "fields": {}}, "finalurl": "https://cdn/x.png"}"#.to_string(),
    )]);

    let err = client(&base).request_grant("png").await.unwrap_err();
    running.finish().await;

    assert!(matches!(
        err,
        Error::UploadBroker {
            reason: BrokerFailure::MalformedResponse,
            ..
        }
    ));
}

#[tokio::test]
async fn put_grant_transfers_raw_bytes() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let grant = serde_json::json!({
        "put_url": format!("{base}/bucket/logo.png?signature=abc"),
        "finalurl": "https://cdn.example.com/logo.png"
    })
    .to_string();
    let running = backend.serve(vec![(200, grant), (200, String::new())]);

    let reference = client(&base)
        .upload("png", &bytes::Bytes::from_static(b"\x89PNG raw"), "logo.png")
        .await
        .unwrap();
    let requests = running.finish().await;

    assert_eq!(reference, "https://cdn.example.com/logo.png");
    assert_eq!(requests[1].method, "PUT");
    assert_eq!(requests[1].target, "/bucket/logo.png?signature=abc");
    assert_eq!(requests[1].body, b"\x89PNG raw");
}

#[tokio::test]
async fn delete_refetches_collection() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![
        (200, products(&serde_json::json!([flour(&[])]))),
        (200, String::new()),
        (200, products(&serde_json::json!([]))),
    ]);

    let mut catalog = CatalogSync::new(client(&base));
    catalog.fetch().await.unwrap();
    assert_eq!(catalog.items().len(), 1);

    catalog.remove("p-1").await.unwrap();
    let requests = running.finish().await;

    assert_eq!(requests[1].method, "DELETE");
    assert_eq!(requests[1].target, "/products/p-1");
    assert_eq!(requests[2].target, "/products/");
    assert!(catalog.items().is_empty());
}

#[tokio::test]
async fn rejected_upsert_surfaces_backend_detail() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![(
        422,
        r#"{"detail": [{"loc": ["body", "unit"], "msg": "field required"}]}"#.to_string(),
    )]);

    let mut catalog = CatalogSync::new(client(&base));
    let err = catalog
        .create(CatalogItemFields::new("Oil"), AttachmentSet::new())
        .await
        .unwrap_err();
    let requests = running.finish().await;

    assert!(matches!(err, Error::Upsert { status: 422, .. }));
    assert_eq!(catalog.state().error(), Some("field required"));
    assert_eq!(requests.len(), 1, "no refetch after a rejected upsert");
}

#[tokio::test]
async fn missing_token_fails_without_network() {
    let unauthenticated = ProcuraClient::builder("http://127.0.0.1:1").build().unwrap();
    let mut catalog = CatalogSync::new(unauthenticated);

    let err = catalog.fetch().await.unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert!(!catalog.state().is_loading());
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let base = {
        let backend = MockBackend::bind().await;
        backend.base_url.clone()
    };
    let err = client(&base).list_products().await.unwrap_err();
    assert!(err.is_network_error());
}

#[tokio::test]
async fn adding_user_forces_locale_and_refetches() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let users = serde_json::json!({"users": [
        {"id": "u-1", "email": "owner@acme.kz", "role": "owner"},
        {"id": "u-2", "email": "sales@acme.kz", "role": "salesman"}
    ]})
    .to_string();
    let running = backend.serve(vec![(201, "{}".to_string()), (200, users)]);

    let mut staff = UserSync::new(client(&base));
    let mut user = NewCompanyUser::new("sales@acme.kz", "pw", "salesman");
    user.locale = "ru".into();
    staff.add(user).await.unwrap();
    let requests = running.finish().await;

    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].target, "/user/");
    assert_eq!(requests[0].json()["locale"], "en");
    assert_eq!(requests[1].target, "/user");
    assert_eq!(staff.users().len(), 2);
}

#[tokio::test]
async fn updating_user_sends_patch() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![
        (200, "{}".to_string()),
        (200, r#"{"users": []}"#.to_string()),
    ]);

    let mut staff = UserSync::new(client(&base));
    let patch = CompanyUserPatch {
        phone_number: Some("+7 700 000 0000".into()),
        ..Default::default()
    };
    staff.update("u-2", &patch).await.unwrap();
    let requests = running.finish().await;

    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(requests[0].target, "/user/u-2");
    assert_eq!(
        requests[0].json(),
        serde_json::json!({"phone_number": "+7 700 000 0000"})
    );
}

#[tokio::test]
async fn answering_linking_refetches() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let linkings = serde_json::json!({"linkings": [{
        "linking_id": 4,
        "consumer_company_id": 105,
        "supplier_company_id": 101,
        "requested_by_user_id": 12,
        "status": "active",
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-02T00:00:00Z"
    }]})
    .to_string();
    let running = backend.serve(vec![(200, "{}".to_string()), (200, linkings)]);

    let mut sync = LinkingSync::new(client(&base));
    sync.respond(4, LinkingResponse::Accepted).await.unwrap();
    let requests = running.finish().await;

    assert_eq!(requests[0].method, "PATCH");
    assert_eq!(
        requests[0].target,
        "/linkings/supplier_response/4?status=accepted"
    );
    assert_eq!(requests[1].target, "/linkings/");
    assert_eq!(sync.linkings().len(), 1);
}

#[tokio::test]
async fn unlinking_refetch_reads_new_status() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let linkings = serde_json::json!({"linkings": [
        {
            "linking_id": 4,
            "consumer_company_id": 105,
            "supplier_company_id": 101,
            "requested_by_user_id": 12,
            "status": "unlinked",
            "created_at": "2025-01-01T00:00:00",
            "updated_at": "2025-01-03T10:15:00.250000"
        },
        {
            "linking_id": 5,
            "consumer_company_id": 106,
            "supplier_company_id": 101,
            "requested_by_user_id": 13,
            "status": "archived",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z"
        }
    ]})
    .to_string();
    let running = backend.serve(vec![(200, "{}".to_string()), (200, linkings)]);

    let mut sync = LinkingSync::new(client(&base));
    sync.respond(4, LinkingResponse::Unlinked).await.unwrap();
    let requests = running.finish().await;

    assert_eq!(
        requests[0].target,
        "/linkings/supplier_response/4?status=unlinked"
    );
    assert!(sync.state().error().is_none());
    assert_eq!(sync.linkings().len(), 2);
    assert_eq!(sync.linkings()[0].status, LinkingStatus::Unlinked);
    assert!(sync.linkings()[0].updated_at.is_some());
    assert_eq!(sync.linkings()[1].status, LinkingStatus::Unknown);
}

#[tokio::test]
async fn numeric_product_ids_survive_refetch() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![
        (201, r#"{"product_id": 17}"#.to_string()),
        (
            200,
            products(&serde_json::json!([
                {"product_id": 16, "name": "Salt"},
                {"product_id": 17, "name": "Salt"}
            ])),
        ),
    ]);

    let mut catalog = CatalogSync::new(client(&base));
    let item = catalog
        .create(CatalogItemFields::new("Salt"), AttachmentSet::new())
        .await
        .unwrap();
    running.finish().await;

    assert_eq!(item.product_id(), Some("17"));
    assert_eq!(catalog.items().len(), 2);
    assert!(catalog.find("16").is_some());
}

#[tokio::test]
async fn cities_are_fetched_once() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![(
        200,
        r#"[{"city_id": 1, "city_name": "Almaty", "city_name_ru": "Алматы", "city_name_kz": "Алматы"}]"#
            .to_string(),
    )]);

    let mut cache = CityCache::new(ProcuraClient::builder(&base).build().unwrap());
    assert_eq!(cache.get().await.unwrap().len(), 1);
    assert_eq!(cache.get().await.unwrap()[0].city_name, "Almaty");
    let requests = running.finish().await;

    assert_eq!(requests.len(), 1);
    assert!(requests[0].header("authorization").is_none());
}

#[tokio::test]
async fn login_returns_session() {
    let backend = MockBackend::bind().await;
    let base = backend.base_url.clone();
    let running = backend.serve(vec![(
        200,
        r#"{"access_token": "a", "refresh_token": "r", "user": {"id": "1", "email": "o@acme.kz", "company_id": 5}}"#
            .to_string(),
    )]);

    let session = ProcuraClient::builder(&base)
        .build()
        .unwrap()
        .login("o@acme.kz", "pw")
        .await
        .unwrap();
    let requests = running.finish().await;

    assert_eq!(session.access_token, "a");
    assert_eq!(session.user.company_id, Some(5));
    assert_eq!(requests[0].target, "/auth/login");
    assert_eq!(requests[0].json()["email"], "o@acme.kz");
}
