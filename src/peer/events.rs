//! Events handed off from the negotiation engine to the session
//!
//! The engine invokes its callbacks from internal tasks. Those callbacks
//! never touch the signaling channel directly; they push typed events into
//! a per-session channel that the dispatcher drains under the session's
//! write guard.

use crate::signaling::protocol::IceCandidateDescriptor;

/// Asynchronous event produced by the peer endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A new local ICE candidate was discovered
    ///
    /// The engine's end-of-candidates marker is filtered out before this
    /// event is produced and is never forwarded to the client.
    LocalCandidate(IceCandidateDescriptor),

    /// An inbound media track arrived on the peer connection
    TrackReceived {
        /// Media kind label ("audio" or "video")
        kind: String,
        /// Track identifier assigned by the remote peer
        id: String,
    },
}
