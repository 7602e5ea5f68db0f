//! Speech Output boundary.
//!
//! Synthesis is an external collaborator: `CommandSpeech` hands the reply to
//! a user-configured command (`say {text}`, `espeak {text}`, `piper ...`) and
//! waits for it to exit, which is the "blocks until playback completes"
//! contract. `NullSpeech` keeps the loops usable without any TTS installed.

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::process::Command;

#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speak `text`, resolving only after playback completes.
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Shells out to a configured synthesis command.
pub struct CommandSpeech {
    command: String,
}

impl CommandSpeech {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Split the template, substituting `{text}` per argument so the reply
    /// stays a single argv entry. Templates without the placeholder get the
    /// reply appended.
    fn build_argv(&self, text: &str) -> Vec<String> {
        let mut argv: Vec<String> = self
            .command
            .split_whitespace()
            .map(|part| part.replace("{text}", text))
            .collect();
        if !self.command.contains("{text}") {
            argv.push(text.to_string());
        }
        argv
    }
}

#[async_trait]
impl SpeechOutput for CommandSpeech {
    async fn speak(&self, text: &str) -> Result<()> {
        let argv = self.build_argv(text);
        let Some((program, args)) = argv.split_first() else {
            bail!("speech command is empty");
        };

        let status = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .status()
            .await?;
        if !status.success() {
            bail!("speech command exited with {status}");
        }
        Ok(())
    }
}

/// Print-only fallback when no speech command is configured.
pub struct NullSpeech;

#[async_trait]
impl SpeechOutput for NullSpeech {
    async fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}
