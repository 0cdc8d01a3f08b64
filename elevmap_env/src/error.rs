//! Error types for the environment abstraction layer.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// A point-cloud batch or map message failed to send/publish.
    #[error("transport error: {0}")]
    Transport(String),

    /// The source was closed (shutdown) with no further data.
    #[error("source closed")]
    Closed,

    /// A named frame has no known transform.
    #[error("unknown frame: {0}")]
    UnknownFrame(String),

    /// Configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl EnvError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
