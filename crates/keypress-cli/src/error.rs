use keypress_core::ForwardError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("{failed} of {issued} keypress requests failed")]
    RequestsFailed { failed: u64, issued: u64 },
}

impl CliError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RequestsFailed { .. } => 3,
            Self::InvalidArgument { .. } | Self::BaseUrl(_) | Self::Forward(_) => 2,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CliError;
    use keypress_core::ForwardError;

    #[test]
    fn usage_errors_exit_with_two() {
        assert_eq!(CliError::invalid("no keys").exit_code(), 2);
        assert_eq!(CliError::from(ForwardError::EmptyKey).exit_code(), 2);
    }

    #[test]
    fn failed_requests_exit_with_three() {
        let error = CliError::RequestsFailed {
            failed: 2,
            issued: 5,
        };
        assert_eq!(error.exit_code(), 3);
        assert_eq!(error.to_string(), "2 of 5 keypress requests failed");
    }

    #[test]
    fn forward_errors_are_transparent() {
        assert_eq!(
            CliError::from(ForwardError::EmptyKey).to_string(),
            ForwardError::EmptyKey.to_string()
        );
    }
}
