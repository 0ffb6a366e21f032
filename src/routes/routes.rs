//! Defines routes for the image upload service.
//!
//! ## Structure
//! - `GET  /`                     — browser upload page
//! - `POST /UploadImageAndGetUrl` — store the first file part, return its URL
//!   (`GET` is also routed for historical reasons; only `POST` carries a body)
//! - `GET  /{container}/{*key}`   — serve a stored object (public read)
//! - `GET  /healthz`, `/readyz`   — liveness and readiness probes
//!
//! The wildcard `*key` tolerates nested keys, though generated names are flat.

use crate::handlers::{
    AppState,
    health_handlers::{healthz, readyz},
    object_handlers::get_object,
    upload_handlers::upload_image,
};
use axum::{
    Router,
    response::Html,
    routing::{get, post},
};

/// Build and return the router for all service routes.
///
/// The router carries shared state (`AppState`) to all handlers. Static
/// routes take precedence over the `{container}` wildcard, so the upload and
/// probe endpoints are never shadowed.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // upload endpoint
        .route("/UploadImageAndGetUrl", post(upload_image).get(upload_image))
        // public object serving
        .route("/{container}/{*key}", get(get_object))
}

/// Minimal browser client: pick a file, POST it, render the returned URL.
async fn index() -> Html<&'static str> {
    Html(include_str!("../../static/index.html"))
}
