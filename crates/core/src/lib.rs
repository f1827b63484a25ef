pub mod attachment;
pub mod catalog;
pub mod city;
pub mod company;
pub mod linking;
pub mod session;
pub mod upload;

pub use attachment::{Attachment, AttachmentSet, DEFAULT_EXTENSION, file_extension};
pub use catalog::{CatalogItem, CatalogItemFields};
pub use city::City;
pub use company::{Company, CompanyType, CompanyUser, CompanyUserPatch, NewCompanyUser};
pub use linking::{Linking, LinkingResponse, LinkingStatus};
pub use session::{NewCompany, NewOwner, Registration, Session, SessionUser};
pub use upload::{UploadGrant, UploadTarget};
