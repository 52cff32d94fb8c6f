mod project;

pub use project::{Project, ProjectStatus, PROJECT_COLUMNS};
