use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::{IntoResponse, Redirect, Response};

use crate::config::RedirectConfig;

/// Every request on the plaintext listener is sent to the HTTPS origin.
pub async fn redirect_to_https(
    State(config): State<RedirectConfig>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    Redirect::permanent(&https_target(host, uri.path(), config.https_port)).into_response()
}

/// `https://<host>[:port]<path>`; the port of `host`, if any, is replaced.
pub fn https_target(host: &str, path: &str, https_port: u16) -> String {
    let hostname = strip_port(host);
    if https_port == 443 {
        format!("https://{hostname}{path}")
    } else {
        format!("https://{hostname}:{https_port}{path}")
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // [v6]:port
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
