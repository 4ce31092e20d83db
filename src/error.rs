//! Error types for the signaling relay

/// Result type alias using the relay Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while relaying signaling traffic
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signaling channel error (upgrade, read/write, frame decode)
    #[error("Channel error: {0}")]
    Channel(String),

    /// SDP negotiation error (description set failure, answer creation failure)
    #[error("Negotiation error: {0}")]
    Negotiation(String),

    /// ICE candidate error (malformed or out-of-order candidate)
    #[error("Candidate error: {0}")]
    Candidate(String),

    /// Peer endpoint construction failure
    #[error("Setup error: {0}")]
    Setup(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error terminates the session it occurred in
    ///
    /// Candidate errors are dropped and the session continues; negotiation
    /// errors abandon the current exchange but leave the channel open.
    pub fn is_fatal_for_session(&self) -> bool {
        !matches!(self, Error::Candidate(_) | Error::Negotiation(_))
    }

    /// Check if this error is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Channel("socket closed".to_string());
        assert_eq!(err.to_string(), "Channel error: socket closed");

        let err = Error::Candidate("bad candidate".to_string());
        assert_eq!(err.to_string(), "Candidate error: bad candidate");
    }

    #[test]
    fn test_error_is_fatal_for_session() {
        assert!(Error::Channel("test".to_string()).is_fatal_for_session());
        assert!(Error::Setup("test".to_string()).is_fatal_for_session());
        assert!(!Error::Candidate("test".to_string()).is_fatal_for_session());
        assert!(!Error::Negotiation("test".to_string()).is_fatal_for_session());
    }

    #[test]
    fn test_error_is_config_error() {
        assert!(Error::InvalidConfig("test".to_string()).is_config_error());
        assert!(!Error::Channel("test".to_string()).is_config_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }
}
