//! Back-office for administrators.
//!
//! Every route requires the admin role. Mutations append to `audit_logs`
//! inside the transaction that performs them.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::AdminService;
