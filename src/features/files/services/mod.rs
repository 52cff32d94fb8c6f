mod file_service;
pub mod storage_paths;

pub use file_service::{FileService, StoredFile};
