//! End-to-end web variant: real server on an ephemeral port, mocked vision
//! endpoint behind it.

use sousbot::gateway::{AppState, run_gateway_with_listener};
use sousbot::history::{self, SharedHistory, TurnRole};
use sousbot::prompt::{CONTINUATION_PROMPT, FIRST_LOOK_PROMPT};
use sousbot::vision::AnthropicVision;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALID_IMAGE_B64: &str = "ZmFrZS1qcGVnLWJ5dGVz";

async fn spawn_app(vision_base_url: &str) -> (String, SharedHistory) {
    let state = AppState {
        vision: Arc::new(AnthropicVision::with_base_url(
            "sk-ant-test",
            "claude-sonnet-4-20250514",
            1000,
            Some(vision_base_url),
        )),
        history: history::shared(),
    };
    let history = Arc::clone(&state.history);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        run_gateway_with_listener("127.0.0.1", listener, state)
            .await
            .unwrap();
    });

    (format!("http://{addr}"), history)
}

async fn mock_vision(reply: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{"type": "text", "text": reply}]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn analyze_returns_reply_and_appends_two_turns() {
    let vision = mock_vision("Add salt now").await;
    let (base, history) = spawn_app(&vision.uri()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({"image": VALID_IMAGE_B64}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Add salt now");

    let log = history::lock(&history);
    assert_eq!(log.len(), 2);
    assert_eq!(log.turns()[0].role, TurnRole::User);
    assert_eq!(log.turns()[0].content, "Image captured");
    assert_eq!(log.turns()[1].role, TurnRole::Assistant);
    assert_eq!(log.turns()[1].content, "Add salt now");
}

#[tokio::test]
async fn analyze_without_image_is_a_client_error() {
    let vision = mock_vision("unused").await;
    let (base, history) = spawn_app(&vision.uri()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("No image"));
    assert!(history::lock(&history).is_empty());
    assert!(vision.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn analyze_with_invalid_base64_is_a_client_error() {
    let vision = mock_vision("unused").await;
    let (base, history) = spawn_app(&vision.uri()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({"image": "!!! not base64 !!!"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("base64"));
    assert!(history::lock(&history).is_empty());
}

#[tokio::test]
async fn analyze_failure_maps_to_500_and_leaves_history_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded_error"))
        .mount(&server)
        .await;
    let (base, history) = spawn_app(&server.uri()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({"image": VALID_IMAGE_B64}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Error analyzing image"));
    assert!(error.contains("overloaded_error"));
    assert!(history::lock(&history).is_empty());
}

#[tokio::test]
async fn prompt_template_switches_after_first_exchange() {
    let vision = mock_vision("Chop the onions").await;
    let (base, _history) = spawn_app(&vision.uri()).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        client
            .post(format!("{base}/analyze"))
            .json(&serde_json::json!({"image": VALID_IMAGE_B64}))
            .send()
            .await
            .unwrap();
    }

    let requests = vision.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let prompt_of = |request: &wiremock::Request| {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        body["messages"][0]["content"][1]["text"]
            .as_str()
            .unwrap()
            .to_string()
    };
    assert_eq!(prompt_of(&requests[0]), FIRST_LOOK_PROMPT);
    assert_eq!(prompt_of(&requests[1]), CONTINUATION_PROMPT);
}

#[tokio::test]
async fn prompt_override_is_forwarded_verbatim() {
    let vision = mock_vision("Yes, flip it").await;
    let (base, _history) = spawn_app(&vision.uri()).await;

    reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({
            "image": VALID_IMAGE_B64,
            "prompt": "should I flip the pancake?"
        }))
        .send()
        .await
        .unwrap();

    let requests = vision.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["messages"][0]["content"][1]["text"],
        "should I flip the pancake?"
    );
}

#[tokio::test]
async fn data_url_prefix_sets_the_media_type() {
    let vision = mock_vision("Looks good").await;
    let (base, _history) = spawn_app(&vision.uri()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({
            "image": format!("data:image/png;base64,{VALID_IMAGE_B64}")
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let requests = vision.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        body["messages"][0]["content"][0]["source"]["media_type"],
        "image/png"
    );
    assert_eq!(
        body["messages"][0]["content"][0]["source"]["data"],
        VALID_IMAGE_B64
    );
}

#[tokio::test]
async fn clear_history_empties_the_store() {
    let vision = mock_vision("Simmer for ten minutes").await;
    let (base, history) = spawn_app(&vision.uri()).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{base}/analyze"))
        .json(&serde_json::json!({"image": VALID_IMAGE_B64}))
        .send()
        .await
        .unwrap();
    assert_eq!(history::lock(&history).len(), 2);

    let response = client
        .post(format!("{base}/clear-history"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert!(history::lock(&history).is_empty());
}

#[tokio::test]
async fn index_serves_the_ui_page() {
    let vision = mock_vision("unused").await;
    let (base, _history) = spawn_app(&vision.uri()).await;

    let response = reqwest::Client::new().get(&base).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let html = response.text().await.unwrap();
    assert!(html.contains("Cooking Assistant"));
    assert!(html.contains("/analyze"));
}
