//! Configuration types for the signaling relay
//!
//! All upgrade and ICE server settings are explicit values handed to the
//! acceptor at construction time; there is no process-wide mutable state.

use serde::{Deserialize, Serialize};

/// Main configuration for the signaling relay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address to bind the HTTP/WebSocket listener to (e.g. "0.0.0.0:8080")
    pub bind_address: String,

    /// HTTP path that upgrades to the signaling channel
    pub signaling_path: String,

    /// Directory served for all non-signaling paths
    pub static_dir: String,

    /// STUN server URLs (at least one required)
    pub stun_servers: Vec<String>,

    /// TURN server configurations (optional)
    pub turn_servers: Vec<TurnServerConfig>,

    /// Origins allowed to open a signaling channel
    ///
    /// `Any` accepts every origin. This is a deliberate trust boundary:
    /// signaling clients are not authenticated.
    pub allowed_origins: AllowedOrigins,
}

/// TURN server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnServerConfig {
    /// TURN server URL (turn: or turns:)
    pub url: String,

    /// Username for TURN authentication
    pub username: String,

    /// Credential for TURN authentication
    pub credential: String,
}

/// Origin policy for the signaling channel
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllowedOrigins {
    /// Accept any origin (default)
    #[default]
    Any,
    /// Accept only the listed origins
    List(Vec<String>),
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            signaling_path: "/ws".to_string(),
            static_dir: "./static".to_string(),
            stun_servers: vec!["stun:stun.l.google.com:19302".to_string()],
            turn_servers: Vec::new(),
            allowed_origins: AllowedOrigins::Any,
        }
    }
}

impl RelayConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `bind_address` is not a parseable socket address
    /// - `signaling_path` is empty or does not start with '/'
    /// - `stun_servers` is empty
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(Error::InvalidConfig(format!(
                "bind_address is not a valid socket address: {}",
                self.bind_address
            )));
        }

        if !self.signaling_path.starts_with('/') {
            return Err(Error::InvalidConfig(format!(
                "signaling_path must start with '/', got {:?}",
                self.signaling_path
            )));
        }

        if self.stun_servers.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one STUN server is required".to_string(),
            ));
        }

        for url in &self.stun_servers {
            if !url.starts_with("stun:") && !url.starts_with("stuns:") {
                return Err(Error::InvalidConfig(format!(
                    "STUN server URL must start with stun: or stuns:, got {}",
                    url
                )));
            }
        }

        for turn in &self.turn_servers {
            if !turn.url.starts_with("turn:") && !turn.url.starts_with("turns:") {
                return Err(Error::InvalidConfig(format!(
                    "TURN server URL must start with turn: or turns:, got {}",
                    turn.url
                )));
            }
        }

        Ok(())
    }
}
