mod project_service;

pub use project_service::{ensure_project_access, ProjectService};
