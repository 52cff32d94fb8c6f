mod user;

pub use user::{User, UserRole, USER_COLUMNS};
