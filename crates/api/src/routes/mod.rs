pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the render route tree.
///
/// ```text
/// /process        multipart render (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/process", post(handlers::process::process))
}
