//! Error types for the CIL proxy

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// CIL proxy error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration could not be written back out
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// Configuration is syntactically valid but unusable
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON command parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport has been deliberately closed (expected during shutdown)
    #[error("Transport not bound")]
    NotBound,

    /// Datagram too short or otherwise undecodable
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    /// Command cannot be rendered in the target dialect
    #[error("Translation failed: {0}")]
    Translation(String),

    /// Configured wire dialect is not known
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// Worker thread panicked
    #[error("Thread panic")]
    ThreadPanic,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for failures that are expected while the transport is closed
    pub fn is_not_bound(&self) -> bool {
        matches!(self, Error::NotBound)
    }
}
