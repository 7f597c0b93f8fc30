//! GraphConfig — peer list used to open a [`Graph`](crate::reactive::Graph).
//!
//! A config is read once at startup (from JSON, from the environment, or the
//! built-in default) and handed to `Graph::connect`.

use std::env::VarError;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Relay peer used when nothing else is configured.
pub const DEFAULT_PEER: &str = "https://nw-gun-relay.herokuapp.com/gun";

/// Environment variable holding a comma-separated peer list.
pub const PEERS_ENV: &str = "CANVAS_SYNC_PEERS";

const ALLOWED_SCHEMES: [&str; 4] = ["http", "https", "ws", "wss"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Peer endpoint URLs, in preference order.
    pub peers: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            peers: vec![DEFAULT_PEER.to_string()],
        }
    }
}

impl GraphConfig {
    pub fn new(peers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            peers: peers.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a config from JSON of the shape `{"peers": ["https://..."]}`.
    ///
    /// The result is validated before it is returned.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the peer list from [`PEERS_ENV`], or fall back to the default
    /// when the variable is unset. A value that is not unicode is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(PEERS_ENV) {
            Ok(raw) => Self::from_peer_list(&raw),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode {
                var: PEERS_ENV.to_string(),
            }),
        }
    }

    /// Parse a comma-separated peer list. Blank entries are skipped.
    pub fn from_peer_list(raw: &str) -> Result<Self, ConfigError> {
        let config = Self::new(raw.split(',').map(str::trim).filter(|p| !p.is_empty()));
        config.validate()?;
        Ok(config)
    }

    /// Reject an empty peer list and peers without a supported URL scheme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peers.is_empty() {
            return Err(ConfigError::NoPeers);
        }
        for peer in &self.peers {
            validate_peer(peer)?;
        }
        Ok(())
    }
}

fn validate_peer(peer: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidPeer {
        peer: peer.to_string(),
        reason: reason.to_string(),
    };

    let (scheme, rest) = peer.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
    if !ALLOWED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return Err(invalid("scheme must be http, https, ws or wss"));
    }
    if rest.is_empty() || rest.starts_with('/') {
        return Err(invalid("missing host"));
    }
    Ok(())
}
