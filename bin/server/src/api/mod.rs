//! HTTP surface: state, extractors, routes.

pub mod extract;
pub mod grants;
pub mod invites;
pub mod requests;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::{AccessRequestService, AccessService, InviteService};

/// Shared application state.
pub struct AppState {
    pub db_pool: PgPool,
    pub access: AccessService,
    pub invites: InviteService,
    pub requests: AccessRequestService,
}

/// Builds the API router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/access-requests", post(requests::create))
        .route(
            "/access-requests/{id}",
            patch(requests::decide).delete(requests::withdraw),
        )
        .route(
            "/children/{child_id}/access-requests",
            get(requests::list_pending),
        )
        .route("/children/{child_id}/invite", post(invites::send))
        .route("/invites/redeem", post(invites::redeem))
        .route("/children/{child_id}/access", get(grants::list))
        .route("/children/{child_id}/access/check", get(grants::check))
        .route(
            "/children/{child_id}/access/{professional_id}",
            delete(grants::revoke),
        )
        .route("/children/{child_id}/audit", get(grants::audit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
