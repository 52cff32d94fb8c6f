use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers;
use crate::features::files::services::FileService;
use crate::shared::constants::MAX_UPLOAD_SIZE;

/// Multipart overhead allowed on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Routes that work without a session
pub fn public_routes(file_service: Arc<FileService>) -> Router {
    Router::new()
        .route("/api/files/signed/{id}", get(handlers::signed_download))
        .with_state(file_service)
}

/// Routes that require the auth middleware, applied by the caller
pub fn routes(file_service: Arc<FileService>) -> Router {
    let upload_limit = DefaultBodyLimit::max(MAX_UPLOAD_SIZE + MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/api/files/upload",
            post(handlers::upload_file).layer(upload_limit.clone()),
        )
        .route("/api/files", get(handlers::list_files))
        .route(
            "/api/files/{id}",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route("/api/files/{id}/project", patch(handlers::assign_project))
        .route("/api/files/{id}/download", get(handlers::download_file))
        .route("/api/files/{id}/preview", get(handlers::preview_file))
        .route("/api/files/{id}/signed-url", post(handlers::create_signed_url))
        .route(
            "/api/files/{id}/attachments",
            post(handlers::upload_attachment)
                .layer(upload_limit)
                .get(handlers::list_attachments),
        )
        .route(
            "/api/files/{id}/attachments/{attachment_id}",
            axum::routing::delete(handlers::delete_attachment),
        )
        .route(
            "/api/files/{id}/attachments/{attachment_id}/download",
            get(handlers::download_attachment),
        )
        .with_state(file_service)
}
