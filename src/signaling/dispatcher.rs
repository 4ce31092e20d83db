//! Session dispatch loop
//!
//! Owns the read side of the signaling channel: decodes inbound frames,
//! feeds them to the session's state machine, and drains the peer
//! endpoint's event channel into outbound frames. Both sources funnel
//! through one task, so channel writes retain causal arrival order; the
//! session's write guard additionally keeps each frame atomic.

use crate::peer::PeerEvent;
use crate::signaling::protocol::SignalingMessage;
use crate::signaling::session::SignalingSession;
use crate::{Error, Result};
use axum::extract::ws::Message;
use futures::{Sink, Stream, StreamExt};
use std::fmt::Display;
use tokio::sync::mpsc;
use tracing::debug;

/// Drive one session until its channel closes or a fatal error occurs
///
/// Returns `Ok(())` on orderly channel close (local or remote) and
/// `Err(Error::Channel)` on read or decode failure. Either way the loop is
/// finished and the caller tears the session down; failures here are fatal
/// for this session only, never for the process.
pub async fn run<R, W, E>(
    session: &mut SignalingSession<W>,
    stream: &mut R,
    events: &mut mpsc::Receiver<PeerEvent>,
) -> Result<()>
where
    R: Stream<Item = std::result::Result<Message, E>> + Unpin,
    E: Display,
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    let mut events_open = true;

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                None => {
                    debug!(session_id = %session.id(), "Signaling channel closed");
                    return Ok(());
                }
                Some(Err(e)) => {
                    return Err(Error::Channel(format!("Failed to read frame: {}", e)));
                }
                Some(Ok(Message::Text(text))) => {
                    let message = SignalingMessage::from_json(&text)
                        .map_err(|e| Error::Channel(format!("Failed to decode frame: {}", e)))?;
                    session.handle_message(message).await?;
                }
                Some(Ok(Message::Close(_))) => {
                    debug!(session_id = %session.id(), "Close frame received");
                    return Ok(());
                }
                Some(Ok(Message::Binary(_))) => {
                    return Err(Error::Channel(
                        "Binary frame on a JSON signaling channel".to_string(),
                    ));
                }
                // Pings and pongs are answered by the transport layer.
                Some(Ok(_)) => {}
            },

            event = events.recv(), if events_open => match event {
                Some(event) => session.handle_peer_event(event).await?,
                None => events_open = false,
            },
        }
    }
}
