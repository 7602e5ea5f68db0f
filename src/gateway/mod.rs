//! Axum-based web variant.
//!
//! Three routes: the static UI page, `/analyze` (one browser frame in, one
//! model reply out), and `/clear-history`. Body limits and request timeouts
//! are applied at the router level; the shared conversation history lives in
//! [`AppState`] behind a mutex, never in ambient process state.

mod handlers;

use handlers::{handle_analyze, handle_clear_history, handle_index};

use crate::config::Config;
use crate::error::Result;
use crate::history::{self, SharedHistory};
use crate::vision::{AnthropicVision, Vision};
use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (10 MiB) — a base64 camera frame plus headroom.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;
/// Request timeout — must outlast the vision client's own 120s ceiling.
pub const REQUEST_TIMEOUT_SECS: u64 = 150;

/// Media type assumed for browser uploads without a data-URL prefix.
pub const DEFAULT_UPLOAD_MEDIA_TYPE: &str = "image/jpeg";

/// Shared state for all axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub vision: Arc<dyn Vision>,
    pub history: SharedHistory,
}

/// `/analyze` request body.
#[derive(serde::Deserialize)]
pub struct AnalyzeBody {
    /// Base64 image data; a `data:<media-type>;base64,` prefix is tolerated.
    pub image: Option<String>,
    /// Optional free-text question, overriding template selection.
    #[serde(default)]
    pub prompt: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/analyze", post(handle_analyze))
        .route("/clear-history", post(handle_clear_history))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Run the web variant on the configured address.
pub async fn run_gateway(host: &str, port: u16, config: &Config) -> Result<()> {
    let api_key = config.require_api_key()?;
    let vision: Arc<dyn Vision> = Arc::new(AnthropicVision::new(
        api_key,
        &config.model,
        config.max_tokens,
    ));
    let state = AppState {
        vision,
        history: history::shared(),
    };

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address {host}:{port}: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(anyhow::Error::from)?;

    run_gateway_with_listener(host, listener, state).await
}

/// Run the web variant from a pre-bound listener.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    state: AppState,
) -> Result<()> {
    let actual_port = listener
        .local_addr()
        .map_err(anyhow::Error::from)?
        .port();

    println!("🍳 Cooking assistant web server");
    println!("◆ Listening on http://{host}:{actual_port}");
    println!("  GET  /              → UI");
    println!("  POST /analyze       → analyze one frame");
    println!("  POST /clear-history → reset the conversation");
    println!("  Ctrl+C to stop\n");

    axum::serve(listener, router(state))
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}

/// Split an optional `data:<media-type>;base64,` prefix off an uploaded image
/// field, returning the media type (when present) and the bare payload.
pub(crate) fn split_data_url(image: &str) -> (Option<&str>, &str) {
    if let Some(rest) = image.strip_prefix("data:") {
        if let Some((media_type, data)) = rest.split_once(";base64,") {
            return (Some(media_type), data);
        }
    }
    (None, image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_limit_fits_a_camera_frame() {
        assert_eq!(MAX_BODY_SIZE, 10 * 1024 * 1024);
    }

    #[test]
    fn timeout_outlasts_the_vision_client() {
        assert!(REQUEST_TIMEOUT_SECS > 120);
    }

    #[test]
    fn app_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn analyze_body_image_field_is_optional_in_json() {
        let parsed: AnalyzeBody = serde_json::from_str(r#"{"prompt": "hello"}"#).unwrap();
        assert!(parsed.image.is_none());
        assert_eq!(parsed.prompt.as_deref(), Some("hello"));

        let parsed: AnalyzeBody = serde_json::from_str(r#"{"image": "aGk="}"#).unwrap();
        assert_eq!(parsed.image.as_deref(), Some("aGk="));
        assert!(parsed.prompt.is_none());
    }

    #[test]
    fn split_data_url_extracts_media_type() {
        let (media_type, data) = split_data_url("data:image/png;base64,aGVsbG8=");
        assert_eq!(media_type, Some("image/png"));
        assert_eq!(data, "aGVsbG8=");
    }

    #[test]
    fn split_data_url_passes_bare_payloads_through() {
        let (media_type, data) = split_data_url("aGVsbG8=");
        assert_eq!(media_type, None);
        assert_eq!(data, "aGVsbG8=");
    }

    #[test]
    fn split_data_url_ignores_malformed_prefixes() {
        let (media_type, data) = split_data_url("data:image/png,not-base64-marked");
        assert_eq!(media_type, None);
        assert_eq!(data, "data:image/png,not-base64-marked");
    }
}
