use std::path::Path;

use axum::Router;
use tower_http::services::ServeFile;

use crate::state::AppState;

/// The three page routes. Everything else under the static dir stays
/// unreachable; unknown paths fall through to the JSON 404 fallback.
pub fn router(static_dir: &str) -> Router<AppState> {
    let dir = Path::new(static_dir);
    Router::new()
        .route_service("/", ServeFile::new(dir.join("index.html")))
        .route_service("/login.html", ServeFile::new(dir.join("login.html")))
        .route_service("/register.html", ServeFile::new(dir.join("register.html")))
}
