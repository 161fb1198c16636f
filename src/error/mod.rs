//! Error types for registry authentication negotiation

use std::fmt;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Debug, Clone)]
pub enum TransportError {
    /// Probe failed on every permitted scheme
    ProbeFailed(String),
    /// 401 challenge with a scheme that is neither Basic nor Bearer
    UnrecognizedChallenge(String),
    /// Bearer challenge missing or carrying an unusable `realm`
    MalformedChallenge(String),
    /// The authenticator cannot produce the credentials a challenge requires
    AuthUnavailable(String),
    /// Token exchange failed (network, non-200 status, or unusable body)
    ExchangeFailed(String),
    /// Caller-requested abort
    Cancelled,
    /// Network related errors
    Network(String),
    /// Parse errors
    Parse(String),
    /// Validation errors
    Validation(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ProbeFailed(msg) => write!(f, "Registry probe failed: {}", msg),
            TransportError::UnrecognizedChallenge(msg) => {
                write!(f, "Unrecognized challenge: {}", msg)
            }
            TransportError::MalformedChallenge(msg) => write!(f, "Malformed challenge: {}", msg),
            TransportError::AuthUnavailable(msg) => {
                write!(f, "Authentication unavailable: {}", msg)
            }
            TransportError::ExchangeFailed(msg) => write!(f, "Token exchange failed: {}", msg),
            TransportError::Cancelled => write!(f, "Operation cancelled"),
            TransportError::Network(msg) => write!(f, "Network error: {}", msg),
            TransportError::Parse(msg) => write!(f, "Parse error: {}", msg),
            TransportError::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Parse(err.to_string())
    }
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        TransportError::Validation(err.to_string())
    }
}

impl From<crate::auth::AuthError> for TransportError {
    fn from(err: crate::auth::AuthError) -> Self {
        TransportError::AuthUnavailable(err.to_string())
    }
}
