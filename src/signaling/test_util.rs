//! Shared helpers for session and dispatcher tests

use crate::signaling::protocol::{SdpType, SessionDescription, SignalingMessage};
use axum::extract::ws::Message;
use futures::Sink;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::peer_connection::configuration::RTCConfiguration;

/// Sink that decodes written text frames and records them for assertions
#[derive(Default)]
pub(crate) struct CollectingSink {
    frames: Arc<Mutex<Vec<SignalingMessage>>>,
}

impl CollectingSink {
    /// Handle to the recorded frames, valid after the sink is moved away
    pub(crate) fn frames(&self) -> Arc<Mutex<Vec<SignalingMessage>>> {
        Arc::clone(&self.frames)
    }
}

impl Sink<Message> for CollectingSink {
    type Error = Infallible;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: Message) -> Result<(), Infallible> {
        if let Message::Text(text) = item {
            let msg = SignalingMessage::from_json(&text).expect("test sink received invalid frame");
            self.get_mut().frames.lock().unwrap().push(msg);
        }
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }
}

/// Produce a valid browser-shaped offer from a throwaway client connection
pub(crate) async fn client_offer() -> SessionDescription {
    let mut media_engine = MediaEngine::default();
    media_engine.register_default_codecs().unwrap();
    let registry = register_default_interceptors(Default::default(), &mut media_engine).unwrap();
    let api = APIBuilder::new()
        .with_media_engine(media_engine)
        .with_interceptor_registry(registry)
        .build();

    let pc = api
        .new_peer_connection(RTCConfiguration::default())
        .await
        .unwrap();
    pc.create_data_channel("control", None).await.unwrap();
    let offer = pc.create_offer(None).await.unwrap();
    let sdp = offer.sdp.clone();
    pc.close().await.ok();

    SessionDescription {
        kind: SdpType::Offer,
        sdp,
    }
}
