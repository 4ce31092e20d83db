//! Signaling protocol, session state machine, and dispatch loop

pub mod dispatcher;
pub mod protocol;
pub mod session;

#[cfg(test)]
pub(crate) mod test_util;

pub use protocol::{IceCandidateDescriptor, SdpType, SessionDescription, SignalingMessage};
pub use session::{NegotiationState, SignalingSession};
