//! Server-side peer endpoint and its event hand-off types

mod endpoint;
mod events;

pub use endpoint::{PeerEndpoint, TrackCounts};
pub use events::PeerEvent;
