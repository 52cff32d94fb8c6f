pub mod admin;
pub mod auth;
pub mod documents;
pub mod files;
pub mod projects;
pub mod users;
