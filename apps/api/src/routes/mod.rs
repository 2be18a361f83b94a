pub mod analyses;
pub mod auth;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::models::analysis::MAX_PDF_BYTES;
use crate::state::AppState;

// Room for multipart framing on top of the PDF size bound.
const MAX_BODY_BYTES: usize = MAX_PDF_BYTES + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/auth/me", get(auth::handle_me))
        .route("/api/v1/auth/sign-out", post(auth::handle_sign_out))
        .route(
            "/api/v1/analyses",
            post(analyses::handle_analyze).get(analyses::handle_list),
        )
        .route("/api/v1/analyses/:id", get(analyses::handle_get))
        .route("/api/v1/analyses/:id/image", get(analyses::handle_image))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/auth/sign-in", post(auth::handle_sign_in))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
