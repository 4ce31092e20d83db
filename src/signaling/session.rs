//! Per-connection signaling session
//!
//! A session owns one client channel sink and one [`PeerEndpoint`] and
//! drives the negotiation state machine:
//!
//! ```text
//! Idle --offer received--> Negotiating --answer produced & sent--> Stable
//! ```
//!
//! `Stable` is not terminal; trickled candidates and track notifications
//! keep arriving for the life of the connection. All channel writes go
//! through the session's write guard, so inbound-frame handling and
//! engine-event forwarding never interleave mid-frame.

use crate::peer::{PeerEndpoint, PeerEvent};
use crate::signaling::protocol::SignalingMessage;
use crate::{Error, Result};
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Negotiation state marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// No negotiation in progress
    Idle,
    /// Local offer sent, awaiting remote answer (unused by the inbound flow)
    AwaitingAnswer,
    /// Remote offer received, answer being produced
    Negotiating,
    /// Offer/answer exchange complete
    Stable,
}

/// Signaling session for one accepted connection
pub struct SignalingSession<W> {
    /// Session identifier, for log correlation
    id: String,

    /// Current negotiation state
    state: NegotiationState,

    /// Server-side peer endpoint owned by this session
    endpoint: PeerEndpoint,

    /// Outbound channel sink behind the session's write guard
    sink: Arc<Mutex<W>>,
}

impl<W> SignalingSession<W>
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    /// Create a session over an accepted channel
    pub fn new(id: String, endpoint: PeerEndpoint, sink: W) -> Self {
        Self {
            id,
            state: NegotiationState::Idle,
            endpoint,
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    /// Get the session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the current negotiation state
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Dispatch one decoded inbound frame through the transition table
    ///
    /// Returns an error only for failures that are fatal to the session
    /// (write failures, encode failures). Candidate and negotiation
    /// failures are logged here and the session continues.
    pub async fn handle_message(&mut self, message: SignalingMessage) -> Result<()> {
        match message {
            SignalingMessage::Offer { sdp } => self.handle_offer(sdp).await,

            SignalingMessage::Answer { .. } => {
                // This flow never sends offers, so no answer is expected.
                warn!(session_id = %self.id, state = ?self.state, "Ignoring unexpected answer frame");
                Ok(())
            }

            SignalingMessage::IceCandidate { candidate } => {
                match self.endpoint.add_remote_candidate(&candidate).await {
                    Ok(()) => debug!(session_id = %self.id, "Added remote ICE candidate"),
                    // Non-fatal: candidate dropped, session unaffected.
                    Err(e) => warn!(session_id = %self.id, "Dropping remote ICE candidate: {}", e),
                }
                Ok(())
            }

            SignalingMessage::TrackAdded { kind } => {
                info!(session_id = %self.id, kind = %kind, "Client added track");
                Ok(())
            }

            SignalingMessage::TrackRemoved { kind } => {
                let counts = self.endpoint.track_counts().await;
                info!(
                    session_id = %self.id,
                    kind = %kind,
                    remaining_audio = counts.audio,
                    remaining_video = counts.video,
                    "Client removed track"
                );
                Ok(())
            }
        }
    }

    /// Forward one engine event onto the channel
    pub async fn handle_peer_event(&self, event: PeerEvent) -> Result<()> {
        match event {
            PeerEvent::LocalCandidate(candidate) => {
                debug!(session_id = %self.id, "Forwarding local ICE candidate");
                self.send_frame(&SignalingMessage::IceCandidate { candidate })
                    .await
            }
            PeerEvent::TrackReceived { kind, id } => {
                info!(session_id = %self.id, kind = %kind, track_id = %id, "Track received");
                Ok(())
            }
        }
    }

    async fn handle_offer(
        &mut self,
        sdp: crate::signaling::protocol::SessionDescription,
    ) -> Result<()> {
        match self.state {
            // Stable accepts a fresh offer: the client renegotiates after
            // adding a track, restarting the offer/answer flow.
            NegotiationState::Idle | NegotiationState::Stable => {}
            NegotiationState::Negotiating | NegotiationState::AwaitingAnswer => {
                warn!(
                    session_id = %self.id,
                    state = ?self.state,
                    "Ignoring offer while a negotiation is in flight"
                );
                return Ok(());
            }
        }

        self.state = NegotiationState::Negotiating;

        let answer = match self.endpoint.create_local_answer(&sdp).await {
            Ok(answer) => answer,
            Err(e) => {
                // Abandon the exchange and roll back so the client can
                // retry with a fresh offer.
                warn!(session_id = %self.id, "Offer abandoned: {}", e);
                self.state = NegotiationState::Idle;
                return Ok(());
            }
        };

        self.send_frame(&SignalingMessage::Answer { sdp: answer })
            .await?;
        self.state = NegotiationState::Stable;

        info!(session_id = %self.id, "Answer sent, negotiation stable");

        Ok(())
    }

    /// Serialize and write one frame under the session's write guard
    async fn send_frame(&self, message: &SignalingMessage) -> Result<()> {
        let json = message.to_json()?;
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(json))
            .await
            .map_err(|e| Error::Channel(format!("Failed to write frame: {}", e)))
    }

    /// Tear the session down, releasing the peer endpoint
    pub async fn close(&self) {
        self.endpoint.close().await;
        debug!(session_id = %self.id, "Session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::signaling::protocol::{IceCandidateDescriptor, SdpType, SessionDescription};
    use crate::signaling::test_util::{client_offer, CollectingSink};
    use tokio::sync::mpsc;

    async fn test_session(sink: CollectingSink) -> SignalingSession<CollectingSink> {
        let config = RelayConfig::default();
        let (event_tx, _event_rx) = mpsc::channel(16);
        let endpoint = PeerEndpoint::connect("session-test", &config, event_tx)
            .await
            .unwrap();
        SignalingSession::new("session-test".to_string(), endpoint, sink)
    }

    #[tokio::test]
    async fn test_offer_produces_exactly_one_answer_and_stable_state() {
        let sink = CollectingSink::default();
        let frames = sink.frames();
        let mut session = test_session(sink).await;
        assert_eq!(session.state(), NegotiationState::Idle);

        let offer = client_offer().await;
        session
            .handle_message(SignalingMessage::Offer { sdp: offer })
            .await
            .unwrap();

        assert_eq!(session.state(), NegotiationState::Stable);
        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 1);
        match &frames[0] {
            SignalingMessage::Answer { sdp } => assert_eq!(sdp.kind, SdpType::Answer),
            other => panic!("expected answer frame, got {:?}", other),
        }

        session.close().await;
    }

    #[tokio::test]
    async fn test_candidate_before_offer_is_logged_and_session_continues() {
        let sink = CollectingSink::default();
        let frames = sink.frames();
        let mut session = test_session(sink).await;

        let candidate = IceCandidateDescriptor {
            candidate: "candidate:1 1 UDP 2130706431 192.0.2.1 3478 typ host".to_string(),
            sdp_mline_index: Some(0),
            ..Default::default()
        };
        session
            .handle_message(SignalingMessage::IceCandidate { candidate })
            .await
            .unwrap();

        // Session still usable: a subsequent offer negotiates normally.
        assert_eq!(session.state(), NegotiationState::Idle);
        let offer = client_offer().await;
        session
            .handle_message(SignalingMessage::Offer { sdp: offer })
            .await
            .unwrap();
        assert_eq!(session.state(), NegotiationState::Stable);
        assert_eq!(frames.lock().unwrap().len(), 1);

        session.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_candidates_are_each_forwarded() {
        let sink = CollectingSink::default();
        let mut session = test_session(sink).await;

        let offer = client_offer().await;
        session
            .handle_message(SignalingMessage::Offer { sdp: offer })
            .await
            .unwrap();

        let candidate = IceCandidateDescriptor {
            candidate: "candidate:1 1 UDP 2130706431 127.0.0.1 54321 typ host".to_string(),
            sdp_mline_index: Some(0),
            ..Default::default()
        };
        // The session must not deduplicate; both are handed to the engine.
        for _ in 0..2 {
            session
                .handle_message(SignalingMessage::IceCandidate {
                    candidate: candidate.clone(),
                })
                .await
                .unwrap();
        }

        session.close().await;
    }

    #[tokio::test]
    async fn test_malformed_offer_rolls_back_to_idle() {
        let sink = CollectingSink::default();
        let frames = sink.frames();
        let mut session = test_session(sink).await;

        let offer = SessionDescription {
            kind: SdpType::Offer,
            sdp: "garbage".to_string(),
        };
        session
            .handle_message(SignalingMessage::Offer { sdp: offer })
            .await
            .unwrap();

        assert_eq!(session.state(), NegotiationState::Idle);
        assert!(frames.lock().unwrap().is_empty());

        // The client can retry with a valid offer.
        let offer = client_offer().await;
        session
            .handle_message(SignalingMessage::Offer { sdp: offer })
            .await
            .unwrap();
        assert_eq!(session.state(), NegotiationState::Stable);

        session.close().await;
    }

    #[tokio::test]
    async fn test_track_notifications_emit_no_frames() {
        let sink = CollectingSink::default();
        let frames = sink.frames();
        let mut session = test_session(sink).await;

        let offer = client_offer().await;
        session
            .handle_message(SignalingMessage::Offer { sdp: offer })
            .await
            .unwrap();

        session
            .handle_message(SignalingMessage::TrackAdded {
                kind: "video".to_string(),
            })
            .await
            .unwrap();
        session
            .handle_message(SignalingMessage::TrackRemoved {
                kind: "video".to_string(),
            })
            .await
            .unwrap();

        // Only the answer; track notifications are server-local logs.
        assert_eq!(frames.lock().unwrap().len(), 1);

        session.close().await;
    }

    #[tokio::test]
    async fn test_candidate_events_are_written_after_the_answer() {
        let sink = CollectingSink::default();
        let frames = sink.frames();
        let mut session = test_session(sink).await;

        let offer = client_offer().await;
        session
            .handle_message(SignalingMessage::Offer { sdp: offer })
            .await
            .unwrap();

        session
            .handle_peer_event(PeerEvent::LocalCandidate(IceCandidateDescriptor {
                candidate: "candidate:1 1 UDP 2130706431 192.0.2.1 3478 typ host".to_string(),
                ..Default::default()
            }))
            .await
            .unwrap();

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[0], SignalingMessage::Answer { .. }));
        assert!(matches!(frames[1], SignalingMessage::IceCandidate { .. }));

        session.close().await;
    }

    #[tokio::test]
    async fn test_track_received_event_emits_no_frame() {
        let sink = CollectingSink::default();
        let frames = sink.frames();
        let session = test_session(sink).await;

        session
            .handle_peer_event(PeerEvent::TrackReceived {
                kind: "audio".to_string(),
                id: "track-1".to_string(),
            })
            .await
            .unwrap();

        assert!(frames.lock().unwrap().is_empty());

        session.close().await;
    }
}
