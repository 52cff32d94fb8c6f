mod admin_service;
mod audit;
mod role_rules;

pub use admin_service::AdminService;
