use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::projects::handlers;
use crate::features::projects::services::ProjectService;

/// Create routes for the projects feature
///
/// All routes require the auth middleware, applied by the caller
pub fn routes(service: Arc<ProjectService>) -> Router {
    Router::new()
        .route(
            "/api/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(handlers::get_project)
                .patch(handlers::update_project)
                .delete(handlers::delete_project),
        )
        .route("/api/projects/{id}/files", get(handlers::list_project_files))
        .with_state(service)
}
