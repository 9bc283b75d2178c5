use std::path::{Component, Path, PathBuf};

use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tracing::{instrument, warn};

use crate::state::AppState;

/// `GET /`: the landing page.
#[instrument(skip(state))]
pub async fn serve_index(State(state): State<AppState>) -> Response {
    let path = state.config.server.static_dir.join("index.html");
    serve_file(&path).await
}

/// Fallback for every path the API does not claim: a file under `static_dir`.
#[instrument(skip(state))]
pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    match resolve_asset(&state.config.server.static_dir, uri.path()) {
        Some(path) => serve_file(&path).await,
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Map a request path onto `root`, refusing anything that could climb out.
pub fn resolve_asset(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }

    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(resolved)
}

async fn serve_file(path: &Path) -> Response {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return StatusCode::NOT_FOUND.into_response();
        }
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(content))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
