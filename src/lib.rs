//! WebRTC signaling relay
//!
//! This crate terminates WebRTC peer connections for browser clients:
//! the client connects over a WebSocket, sends an SDP offer, and the
//! server answers with its own peer endpoint, trickling ICE candidates
//! in both directions and observing the media tracks the client adds.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Browser client                                      │
//! │  ↓ (WebSocket, JSON frames)                          │
//! │  SignalingServer (axum: /ws upgrade, static files)   │
//! │  ├─ SignalingSession (negotiation state machine)     │
//! │  │   └─ dispatcher (frame + engine event loop)       │
//! │  └─ PeerEndpoint (server-side RTCPeerConnection)     │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! One session per connection; sessions share nothing but the validated
//! [`RelayConfig`].
//!
//! # Example
//!
//! ```
//! use rtc_relay::RelayConfig;
//!
//! let config = RelayConfig {
//!     bind_address: "127.0.0.1:9090".to_string(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod peer;
pub mod server;
pub mod signaling;

pub use config::{AllowedOrigins, RelayConfig, TurnServerConfig};
pub use error::{Error, Result};
pub use peer::{PeerEndpoint, PeerEvent, TrackCounts};
pub use server::SignalingServer;
pub use signaling::{
    IceCandidateDescriptor, NegotiationState, SdpType, SessionDescription, SignalingMessage,
    SignalingSession,
};

/// Get the version of this crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
