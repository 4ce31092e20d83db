//! JSON signaling protocol types
//!
//! Frames exchanged over the signaling channel are JSON objects tagged by a
//! `type` field, matching the shapes the browser's `RTCSessionDescription`
//! and `RTCIceCandidate.toJSON()` produce.

use serde::{Deserialize, Serialize};

/// Signaling message exchanged over the channel
///
/// Exactly one payload field is present per `type`; the tagged enum
/// representation enforces this at decode time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalingMessage {
    /// SDP offer from the remote client
    Offer {
        /// Offered session description
        sdp: SessionDescription,
    },

    /// SDP answer produced by the server-held peer endpoint
    Answer {
        /// Committed local session description
        sdp: SessionDescription,
    },

    /// Trickled ICE candidate, in either direction
    IceCandidate {
        /// Candidate descriptor, passed through opaquely
        candidate: IceCandidateDescriptor,
    },

    /// Client notification that it attached a new media track
    TrackAdded {
        /// Media kind label ("audio" or "video")
        kind: String,
    },

    /// Client notification that it removed a media track
    TrackRemoved {
        /// Media kind label ("audio" or "video")
        kind: String,
    },
}

/// Session description payload
///
/// Opaque to the relay beyond its type tag; only answers are authored by
/// this system, everything else is passed to the negotiation engine as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionDescription {
    /// Description type (offer/answer/pranswer/rollback)
    #[serde(rename = "type")]
    pub kind: SdpType,

    /// Textual description blob
    pub sdp: String,
}

/// Session description type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    /// Initial or renegotiation offer
    Offer,
    /// Final answer
    Answer,
    /// Provisional answer
    Pranswer,
    /// Roll back to the previous stable description
    Rollback,
}

/// ICE candidate descriptor
///
/// Pass-through payload; field names follow the browser's
/// `RTCIceCandidateInit` dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IceCandidateDescriptor {
    /// Candidate string ("candidate:...")
    pub candidate: String,

    /// Media stream identification tag
    #[serde(rename = "sdpMid", default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,

    /// Media-line index within the session description
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_mline_index: Option<u16>,

    /// ICE username fragment
    #[serde(
        rename = "usernameFragment",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub username_fragment: Option<String>,
}

impl SignalingMessage {
    /// Encode the message to a JSON frame
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| {
            crate::Error::Serialization(format!("Failed to serialize signaling message: {}", e))
        })
    }

    /// Decode a JSON frame into a message
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            crate::Error::Serialization(format!("Failed to deserialize signaling message: {}", e))
        })
    }
}
