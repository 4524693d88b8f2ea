//! Error types for the forward engine and its ambient CLI/config layers.

use thiserror::Error;

/// Errors surfaced by the core forward engine.
///
/// Disposition of each variant is documented on the engine methods that
/// produce it; see `ForwardEngine::forward` and its helpers.
#[derive(Debug, Clone, Error)]
pub enum ForwardError {
    #[error("iterator error: {0}")]
    Iter(String),

    #[error("cancelled")]
    Cancelled,

    #[error("failed to fetch album siblings: {0}")]
    AlbumFetchFailed(String),

    #[error("media cannot be converted: {0}")]
    ConvertFailed(&'static str),

    #[error("direct forward failed: {0}")]
    DirectSendFailed(String),

    #[error("clone send failed: {0}")]
    CloneSendFailed(String),

    #[error("cannot send an empty message")]
    EmptyMessage,

    #[error("rpc pool error: {0}")]
    Rpc(String),

    #[error("uploader error: {0}")]
    Upload(String),
}

impl ForwardError {
    /// Whether this error should terminate the run immediately rather than
    /// being reported through `OnDone` and absorbed by the loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ForwardError::Cancelled)
    }
}

/// Errors loading [`crate::config::ForwardConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    MissingField(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(s) => write!(f, "IO error: {s}"),
            ConfigError::Parse(s) => write!(f, "parse error: {s}"),
            ConfigError::MissingField(s) => write!(f, "missing required field: {s}"),
            ConfigError::InvalidValue(s) => write!(f, "invalid config value: {s}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level error for the `tg-forward` binary's exit-code path.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("forward run failed: {0}")]
    Forward(#[from] ForwardError),
}
