//! Capture Source boundary: whatever supplies a still image.
//!
//! The camera itself is an external collaborator. `CommandCapture` shells out
//! to a user-configured binary (`ffmpeg`, `imagesnap`, `fswebcam`, ...) that
//! writes one encoded frame to stdout; the web variant bypasses this module
//! entirely with browser-submitted uploads.

use crate::error::CaptureError;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::process::Command;

/// Encoded image bytes plus their declared media type. Ephemeral — built for
/// one dispatch and never stored.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub media_type: String,
    /// Base64-encoded image data.
    pub data: String,
}

impl ImagePayload {
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Capture one frame. Failure yields `None` (logged), never an error, so
    /// the driver loops simply skip the cycle.
    async fn capture(&self) -> Option<ImagePayload>;
}

/// Bring-your-own-camera-binary capture source.
pub struct CommandCapture {
    command: String,
    media_type: String,
}

impl CommandCapture {
    pub fn new(command: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            media_type: media_type.into(),
        }
    }

    async fn run(&self) -> Result<ImagePayload, CaptureError> {
        let parts: Vec<&str> = self.command.split_whitespace().collect();
        let Some((program, args)) = parts.split_first() else {
            return Err(CaptureError::NotConfigured);
        };

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(CaptureError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if output.stdout.is_empty() {
            return Err(CaptureError::Empty);
        }

        Ok(ImagePayload::new(
            self.media_type.clone(),
            BASE64.encode(&output.stdout),
        ))
    }
}

#[async_trait]
impl CaptureSource for CommandCapture {
    async fn capture(&self) -> Option<ImagePayload> {
        match self.run().await {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!("image capture failed: {e}");
                None
            }
        }
    }
}
