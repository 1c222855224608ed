use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForwardError>;

/// Errors raised before a request is issued.
///
/// Network failures never surface here; they are reported through
/// [`TransportError`] on the settle path and do not alter control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    #[error("key-down event carried an empty key identifier")]
    EmptyKey,

    #[error("invalid forwarder config: {message}")]
    InvalidConfig { message: String },
}

impl ForwardError {
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ForwardError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid(err.to_string())
    }
}

/// A keypress request that did not complete successfully.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced a response (offline, CORS, aborted, DNS...).
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The server answered with a non-success status.
    #[error("server answered with status {0}")]
    Status(u16),
}
