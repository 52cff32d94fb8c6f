//! Storage module for file management
//!
//! Local disk storage for generated documents and uploads, plus HMAC signed
//! download links.

mod local_storage;
mod signed_url;

pub use local_storage::{unique_file_name, LocalStorage};
pub use signed_url::{SignedUrl, UrlSigner};
