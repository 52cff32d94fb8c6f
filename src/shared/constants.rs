/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// UPLOADS
// =============================================================================

/// Largest accepted upload (10MB)
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Extensions accepted by the upload endpoints, lowercase without the dot
pub const ALLOWED_UPLOAD_EXTENSIONS: &[&str] =
    &["pdf", "docx", "doc", "xlsx", "xls", "png", "jpg", "jpeg"];

/// Subdirectory of the storage root for generated documents
pub const DOCUMENTS_DIR: &str = "documents";

/// Subdirectory of the storage root for user uploads
pub const UPLOADS_DIR: &str = "uploads";

/// Subdirectory of the storage root for attachments
pub const ATTACHMENTS_DIR: &str = "attachments";
