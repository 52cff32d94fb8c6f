mod attachment_file;
mod user_file;

pub use attachment_file::{AttachmentFile, ATTACHMENT_COLUMNS};
pub use user_file::{DownloadStatus, NewUserFile, UserFile, USER_FILE_COLUMNS};
