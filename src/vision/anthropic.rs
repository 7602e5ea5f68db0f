use super::Vision;
use crate::capture::ImagePayload;
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MAX_API_ERROR_CHARS: usize = 200;

pub struct AnthropicVision {
    /// Pre-computed auth: `("Authorization", "Bearer <token>")` or `("x-api-key", "<key>")`.
    cached_auth: (&'static str, String),
    cached_messages_url: String,
    model: String,
    max_tokens: u32,
    client: Client,
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<InputContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InputContentBlock {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ImageSource {
    Base64 { media_type: String, data: String },
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Unsupported,
}

impl AnthropicVision {
    pub fn new(api_key: &str, model: impl Into<String>, max_tokens: u32) -> Self {
        Self::with_base_url(api_key, model, max_tokens, None)
    }

    pub fn with_base_url(
        api_key: &str,
        model: impl Into<String>,
        max_tokens: u32,
        base_url: Option<&str>,
    ) -> Self {
        let base = base_url
            .map_or("https://api.anthropic.com", |u| u.trim_end_matches('/'))
            .to_string();
        let key = api_key.trim();
        let cached_auth = if Self::is_setup_token(key) {
            ("Authorization", format!("Bearer {key}"))
        } else {
            ("x-api-key", key.to_string())
        };
        Self {
            cached_auth,
            cached_messages_url: format!("{base}/v1/messages"),
            model: model.into(),
            max_tokens,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn is_setup_token(token: &str) -> bool {
        token.starts_with("sk-ant-oat01-")
    }

    /// Exactly one user message: the image block first, the prompt second.
    fn build_request(&self, image: &ImagePayload, prompt: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![
                    InputContentBlock::Image {
                        source: ImageSource::Base64 {
                            media_type: image.media_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                    InputContentBlock::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        }
    }

    fn first_text(response: &MessagesResponse) -> Option<&str> {
        response.content.iter().find_map(|block| match block {
            ResponseContentBlock::Text { text } => Some(text.as_str()),
            ResponseContentBlock::Unsupported => None,
        })
    }

    fn shorten(body: &str) -> String {
        let trimmed = body.trim();
        if trimmed.len() <= MAX_API_ERROR_CHARS {
            trimmed.to_string()
        } else {
            let mut end = MAX_API_ERROR_CHARS;
            while !trimmed.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}…", &trimmed[..end])
        }
    }

    async fn call_api(&self, request: &MessagesRequest) -> Result<MessagesResponse, RemoteError> {
        let (auth_name, auth_value) = &self.cached_auth;

        let response = self
            .client
            .post(&self.cached_messages_url)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .header(*auth_name, auth_value)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.to_string()
            } else {
                Self::shorten(&body)
            };
            return Err(match status.as_u16() {
                401 | 403 => RemoteError::Auth(message),
                429 => RemoteError::RateLimited(message),
                code => RemoteError::Request {
                    status: code,
                    message,
                },
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Vision for AnthropicVision {
    async fn describe(
        &self,
        image: &ImagePayload,
        prompt: &str,
    ) -> Result<String, RemoteError> {
        let request = self.build_request(image, prompt);
        let response = self.call_api(&request).await?;
        Self::first_text(&response)
            .map(str::to_owned)
            .ok_or(RemoteError::MalformedResponse)
    }
}
