use super::{AnalyzeBody, AppState, DEFAULT_UPLOAD_MEDIA_TYPE, split_data_url};
use crate::capture::ImagePayload;
use crate::history::{self, Turn};
use crate::prompt::select_prompt;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// GET / — the embedded single-page UI.
pub(super) async fn handle_index() -> impl IntoResponse {
    Html(include_str!("../../assets/index.html"))
}

/// POST /analyze — one browser frame in, one model reply out.
///
/// A success appends exactly two turns under one lock, so concurrent requests
/// cannot interleave a pair.
pub(super) async fn handle_analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, axum::extract::rejection::JsonRejection>,
) -> impl IntoResponse {
    let Json(analyze_body) = match body {
        Ok(b) => b,
        Err(e) => {
            let err = serde_json::json!({
                "error": format!("Invalid JSON: {e}. Expected: {{\"image\": \"<base64>\"}}")
            });
            return (StatusCode::BAD_REQUEST, Json(err));
        }
    };

    let Some(image_field) = analyze_body
        .image
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        let err = serde_json::json!({"error": "No image provided"});
        return (StatusCode::BAD_REQUEST, Json(err));
    };

    let (media_type, image_b64) = split_data_url(image_field);
    if BASE64.decode(image_b64).is_err() {
        let err = serde_json::json!({"error": "Image field is not valid base64"});
        return (StatusCode::BAD_REQUEST, Json(err));
    }

    let history_is_empty = history::lock(&state.history).is_empty();
    let prompt = select_prompt(history_is_empty, analyze_body.prompt.as_deref());
    let payload = ImagePayload::new(
        media_type.unwrap_or(DEFAULT_UPLOAD_MEDIA_TYPE),
        image_b64.to_owned(),
    );

    match state.vision.describe(&payload, prompt).await {
        Ok(reply) => {
            {
                let mut log = history::lock(&state.history);
                log.append(Turn::user("Image captured"));
                log.append(Turn::assistant(reply.clone()));
            }
            let body = serde_json::json!({"success": true, "response": reply});
            (StatusCode::OK, Json(body))
        }
        Err(e) => {
            tracing::error!("analyze request failed: {e}");
            let err = serde_json::json!({"error": format!("Error analyzing image: {e}")});
            (StatusCode::INTERNAL_SERVER_ERROR, Json(err))
        }
    }
}

/// POST /clear-history — unconditionally reset the conversation.
pub(super) async fn handle_clear_history(State(state): State<AppState>) -> impl IntoResponse {
    history::lock(&state.history).clear();
    Json(serde_json::json!({"success": true}))
}
