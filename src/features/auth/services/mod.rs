mod auth_service;
mod login_limiter;
pub mod password;
mod token_service;

pub use auth_service::{AuthService, INVALID_CREDENTIALS};
pub use login_limiter::LoginLimiter;
pub use token_service::{IssuedToken, TokenService};
