use crate::features::users::handlers;
use crate::features::users::services::UserService;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users/me", patch(handlers::update_profile))
        .route("/api/users/me/password", post(handlers::change_password))
        .route("/api/users/me/dashboard", get(handlers::get_dashboard))
        .with_state(service)
}
