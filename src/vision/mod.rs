//! Remote vision service boundary.
//!
//! One trait seam so the driver loops and the gateway can be exercised with
//! test doubles; one concrete client for the Anthropic Messages API.

mod anthropic;

pub use anthropic::AnthropicVision;

use crate::capture::ImagePayload;
use crate::error::RemoteError;
use async_trait::async_trait;

#[async_trait]
pub trait Vision: Send + Sync {
    /// One synchronous exchange: send the image with the prompt, return the
    /// first text segment of the reply. No retries, no streaming.
    async fn describe(&self, image: &ImagePayload, prompt: &str)
    -> Result<String, RemoteError>;
}
