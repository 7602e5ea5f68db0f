//! Configuration for both variants, loaded from `~/.sousbot/config.toml`
//! with environment variables taking precedence over the file.

use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Value shipped in the generated config file; rejected at startup until the
/// user replaces it.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_ANTHROPIC_API_KEY_HERE";

fn default_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

/// Hard ceiling on model output, applied to every dispatch.
fn default_max_tokens() -> u32 {
    1000
}

fn default_interval_secs() -> u64 {
    30
}

fn default_capture_command() -> String {
    // One JPEG frame from the default V4L2 device to stdout. macOS users
    // typically swap in `imagesnap -q -` or similar.
    "ffmpeg -loglevel error -f v4l2 -i /dev/video0 -frames:v 1 -c:v mjpeg -f image2pipe -"
        .to_string()
}

fn default_media_type() -> String {
    "image/jpeg".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// External command that writes one encoded still image to stdout.
    pub command: String,
    /// Media type the command produces.
    pub media_type: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            command: default_capture_command(),
            media_type: default_media_type(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// External command that speaks its input, e.g. `say {text}` or
    /// `espeak {text}`. `{text}` is replaced with the reply; with no
    /// placeholder the reply is appended as the final argument. Unset means
    /// replies are printed only.
    pub command: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Anthropic API key. Environment variables override this value.
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Seconds between analyses in automatic mode.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    pub capture: CaptureConfig,
    pub speech: SpeechConfig,
    pub gateway: GatewayConfig,

    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: Some(PLACEHOLDER_API_KEY.to_string()),
            model: default_model(),
            max_tokens: default_max_tokens(),
            interval_secs: default_interval_secs(),
            capture: CaptureConfig::default(),
            speech: SpeechConfig::default(),
            gateway: GatewayConfig::default(),
            config_path: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load `~/.sousbot/config.toml`, writing a default file on first run.
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let sousbot_dir = home.join(".sousbot");
        let config_path = sousbot_dir.join("config.toml");

        if !sousbot_dir.exists() {
            fs::create_dir_all(&sousbot_dir).context("Failed to create .sousbot directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config = Self::from_toml(&contents)?;
            config.config_path = config_path;
            Ok(config)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply environment variable overrides to config.
    pub fn apply_env_overrides(&mut self) {
        // API key: SOUSBOT_API_KEY or ANTHROPIC_API_KEY
        if let Ok(key) =
            std::env::var("SOUSBOT_API_KEY").or_else(|_| std::env::var("ANTHROPIC_API_KEY"))
        {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }

        // Model: SOUSBOT_MODEL
        if let Ok(model) = std::env::var("SOUSBOT_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }

        // Gateway port: SOUSBOT_PORT or PORT
        if let Ok(port_str) = std::env::var("SOUSBOT_PORT").or_else(|_| std::env::var("PORT")) {
            if let Ok(port) = port_str.parse::<u16>() {
                self.gateway.port = port;
            }
        }

        // Gateway host: SOUSBOT_HOST or HOST
        if let Ok(host) = std::env::var("SOUSBOT_HOST").or_else(|_| std::env::var("HOST")) {
            if !host.is_empty() {
                self.gateway.host = host;
            }
        }

        // Automatic-mode interval: SOUSBOT_INTERVAL_SECS
        if let Ok(interval_str) = std::env::var("SOUSBOT_INTERVAL_SECS") {
            if let Ok(interval) = interval_str.parse::<u64>() {
                if interval > 0 {
                    self.interval_secs = interval;
                }
            }
        }
    }

    /// The credential every dispatch needs. Missing or placeholder values are
    /// fatal at startup.
    pub fn require_api_key(&self) -> std::result::Result<&str, ConfigError> {
        let key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.config_path.display().to_string()))?;
        if key == PLACEHOLDER_API_KEY {
            return Err(ConfigError::PlaceholderApiKey);
        }
        Ok(key)
    }
}
