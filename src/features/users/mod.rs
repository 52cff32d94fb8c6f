//! The signed-in user's own account.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | PATCH | `/api/users/me` | Update display name |
//! | POST | `/api/users/me/password` | Change password |
//! | GET | `/api/users/me/dashboard` | Project counts and recent files |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::UserService;
