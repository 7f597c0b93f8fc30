use thiserror::Error;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Graph config must name at least one peer")]
    NoPeers,

    #[error("Invalid peer \"{peer}\": {reason}")]
    InvalidPeer { peer: String, reason: String },

    #[error("Environment variable {var} is not valid unicode")]
    NotUnicode { var: String },

    #[error("Failed to parse graph config: {0}")]
    Parse(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to decode drag/drop event: {0}")]
    Event(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
