use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `sousbot`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum SousError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Camera / capture boundary ───────────────────────────────────────
    #[error("capture: {0}")]
    Capture(#[from] CaptureError),

    // ── Remote vision service ───────────────────────────────────────────
    #[error("vision: {0}")]
    Remote(#[from] RemoteError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

/// Fatal at startup: the process exits with the diagnostic.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error(
        "no API key configured — set SOUSBOT_API_KEY or ANTHROPIC_API_KEY, \
         or add api_key to {0}"
    )]
    MissingApiKey(String),

    #[error("api_key is still the placeholder value — replace it with a real key")]
    PlaceholderApiKey,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Capture errors ─────────────────────────────────────────────────────────

/// Never fatal: the capture boundary logs these and yields no frame.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no capture command configured")]
    NotConfigured,

    #[error("capture command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("capture command produced no image data")]
    Empty,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Remote vision service errors ───────────────────────────────────────────

/// One variant per failure class of the single request/response exchange.
/// Nothing here is retried; the desktop loops speak the message, the web
/// handler maps it to HTTP 500.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("vision service authentication failed: {0}")]
    Auth(String),

    #[error("vision service rate-limited: {0}")]
    RateLimited(String),

    #[error("vision request failed (HTTP {status}): {message}")]
    Request { status: u16, message: String },

    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vision response contained no text segment")]
    MalformedResponse,
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, SousError>;
