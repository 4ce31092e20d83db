//! Peer endpoint adapter
//!
//! Wraps one server-held `RTCPeerConnection` behind the small surface the
//! signaling session needs: ingest a remote description, produce the
//! committed local answer, feed trickled candidates, and hand engine
//! callbacks off as [`PeerEvent`]s.

use crate::config::RelayConfig;
use crate::peer::events::PeerEvent;
use crate::signaling::protocol::{IceCandidateDescriptor, SdpType, SessionDescription};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// Server-side negotiation endpoint for one signaling session
pub struct PeerEndpoint {
    /// Session this endpoint belongs to, for log correlation
    session_id: String,

    /// Underlying WebRTC peer connection
    peer_connection: Arc<RTCPeerConnection>,
}

impl PeerEndpoint {
    /// Build the peer connection and wire its callbacks into `event_tx`
    ///
    /// Construction failure is a [`Error::Setup`]; the caller aborts the
    /// connection without entering the dispatch loop.
    pub async fn connect(
        session_id: &str,
        config: &RelayConfig,
        event_tx: mpsc::Sender<PeerEvent>,
    ) -> Result<Self> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| Error::Setup(format!("Failed to register codecs: {}", e)))?;

        let interceptor_registry = register_default_interceptors(Default::default(), &mut media_engine)
            .map_err(|e| Error::Setup(format!("Failed to register interceptors: {}", e)))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(interceptor_registry)
            .build();

        let ice_servers: Vec<RTCIceServer> = config
            .stun_servers
            .iter()
            .map(|url| RTCIceServer {
                urls: vec![url.clone()],
                ..Default::default()
            })
            .chain(config.turn_servers.iter().map(|turn| {
                #[allow(clippy::needless_update)]
                RTCIceServer {
                    urls: vec![turn.url.clone()],
                    username: turn.username.clone(),
                    credential: turn.credential.clone(),
                    ..Default::default()
                }
            }))
            .collect();

        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .map_err(|e| Error::Setup(format!("Failed to create peer connection: {}", e)))?,
        );

        let endpoint = Self {
            session_id: session_id.to_string(),
            peer_connection,
        };
        endpoint.wire_callbacks(event_tx);

        info!(session_id = %endpoint.session_id, "Peer endpoint created");

        Ok(endpoint)
    }

    /// Register the engine callbacks that feed the session's event channel
    fn wire_callbacks(&self, event_tx: mpsc::Sender<PeerEvent>) {
        let candidate_tx = event_tx.clone();
        let session_id = self.session_id.clone();
        self.peer_connection
            .on_ice_candidate(Box::new(move |candidate: Option<RTCIceCandidate>| {
                let candidate_tx = candidate_tx.clone();
                let session_id = session_id.clone();
                Box::pin(async move {
                    // None marks end-of-candidates; it is not forwarded.
                    let Some(candidate) = candidate else { return };
                    match candidate.to_json() {
                        Ok(init) => {
                            let event = PeerEvent::LocalCandidate(descriptor_from_init(init));
                            if candidate_tx.send(event).await.is_err() {
                                debug!(
                                    session_id = %session_id,
                                    "Session gone, dropping local ICE candidate"
                                );
                            }
                        }
                        Err(e) => {
                            warn!(
                                session_id = %session_id,
                                "Failed to convert local ICE candidate: {}", e
                            );
                        }
                    }
                })
            }));

        let track_tx = event_tx;
        let session_id = self.session_id.clone();
        self.peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let track_tx = track_tx.clone();
                let session_id = session_id.clone();
                Box::pin(async move {
                    let event = PeerEvent::TrackReceived {
                        kind: track.kind().to_string(),
                        id: track.id(),
                    };
                    if track_tx.send(event).await.is_err() {
                        debug!(session_id = %session_id, "Session gone, dropping track event");
                    }
                })
            },
        ));

        let session_id = self.session_id.clone();
        self.peer_connection
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                let session_id = session_id.clone();
                Box::pin(async move {
                    info!(session_id = %session_id, "Peer connection state: {}", state);
                })
            }));
    }

    /// Ingest a remote offer and produce the committed local answer
    ///
    /// The engine may rewrite the draft answer while committing it, so the
    /// returned description is read back from the connection rather than
    /// taken from the draft.
    pub async fn create_local_answer(
        &self,
        remote_offer: &SessionDescription,
    ) -> Result<SessionDescription> {
        let offer = to_engine_description(remote_offer)?;

        self.peer_connection
            .set_remote_description(offer)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to set remote description: {}", e)))?;

        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to create answer: {}", e)))?;

        self.peer_connection
            .set_local_description(answer)
            .await
            .map_err(|e| Error::Negotiation(format!("Failed to set local description: {}", e)))?;

        let local = self.peer_connection.local_description().await.ok_or_else(|| {
            Error::Negotiation("No local description after setting answer".to_string())
        })?;

        debug!(session_id = %self.session_id, "Created local answer");

        from_engine_description(&local)
    }

    /// Feed a trickled remote ICE candidate to the engine
    ///
    /// Failure (malformed candidate, or one arriving before any remote
    /// description) is non-fatal; the caller logs it and the session
    /// continues.
    pub async fn add_remote_candidate(&self, candidate: &IceCandidateDescriptor) -> Result<()> {
        self.peer_connection
            .add_ice_candidate(init_from_descriptor(candidate))
            .await
            .map_err(|e| Error::Candidate(format!("Failed to add ICE candidate: {}", e)))
    }

    /// Count live inbound tracks by kind, from the connection's current receivers
    pub async fn track_counts(&self) -> TrackCounts {
        let mut counts = TrackCounts::default();
        for receiver in self.peer_connection.get_receivers().await {
            for track in receiver.tracks().await {
                match track.kind() {
                    RTPCodecType::Audio => counts.audio += 1,
                    RTPCodecType::Video => counts.video += 1,
                    RTPCodecType::Unspecified => {}
                }
            }
        }
        counts
    }

    /// Release engine resources; idempotent
    pub async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!(session_id = %self.session_id, "Failed to close peer connection: {}", e);
        }
    }
}

/// Live inbound track counts per media kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackCounts {
    /// Remaining audio tracks
    pub audio: usize,
    /// Remaining video tracks
    pub video: usize,
}

fn to_engine_description(desc: &SessionDescription) -> Result<RTCSessionDescription> {
    let sdp = desc.sdp.clone();
    match desc.kind {
        SdpType::Offer => RTCSessionDescription::offer(sdp),
        SdpType::Answer => RTCSessionDescription::answer(sdp),
        SdpType::Pranswer => RTCSessionDescription::pranswer(sdp),
        SdpType::Rollback => {
            return Err(Error::Negotiation(
                "Rollback descriptions are not accepted over signaling".to_string(),
            ))
        }
    }
    .map_err(|e| Error::Negotiation(format!("Malformed session description: {}", e)))
}

fn from_engine_description(desc: &RTCSessionDescription) -> Result<SessionDescription> {
    let kind = match desc.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        RTCSdpType::Unspecified => {
            return Err(Error::Negotiation(
                "Engine produced a description without a type".to_string(),
            ))
        }
    };
    Ok(SessionDescription {
        kind,
        sdp: desc.sdp.clone(),
    })
}

fn descriptor_from_init(init: RTCIceCandidateInit) -> IceCandidateDescriptor {
    IceCandidateDescriptor {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_mline_index: init.sdp_mline_index,
        username_fragment: init.username_fragment,
    }
}

fn init_from_descriptor(descriptor: &IceCandidateDescriptor) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: descriptor.candidate.clone(),
        sdp_mid: descriptor.sdp_mid.clone(),
        sdp_mline_index: descriptor.sdp_mline_index,
        username_fragment: descriptor.username_fragment.clone(),
    }
}
