//! Credential sources for registry authentication
//!
//! The [`Authenticator`] trait is the seam between this crate and whatever
//! stores credentials: a config file, a keychain helper, environment
//! variables. Negotiation queries it once per Bearer token exchange and on
//! every request under Basic authentication, so rotating credentials behind
//! the trait takes effect without re-probing the registry.

use crate::error::Result;
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("no credentials available: {0}")]
    Unavailable(String),
    #[error("credential lookup failed: {0}")]
    Lookup(String),
}

/// Credential material an [`Authenticator`] can produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// No credentials; exchanges proceed anonymously
    Anonymous,
    /// Username/password pair for Basic authentication or token exchange
    Basic { username: String, password: String },
    /// Pre-issued registry token, used as a Bearer token without an exchange
    Token(String),
}

impl Credential {
    /// Render this credential as an `Authorization` header value
    ///
    /// `Anonymous` has no header form and yields `None`.
    pub fn authorization_header(&self) -> Result<Option<HeaderValue>> {
        let raw = match self {
            Credential::Anonymous => return Ok(None),
            Credential::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                format!("Basic {}", encoded)
            }
            Credential::Token(token) => format!("Bearer {}", token),
        };

        let mut value = HeaderValue::from_str(&raw).map_err(|_| {
            crate::error::TransportError::Validation(
                "credentials contain characters not permitted in a header".to_string(),
            )
        })?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

/// External capability that supplies credentials for a registry
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authorization(&self) -> std::result::Result<Credential, AuthError>;
}

/// A fixed credential is its own authenticator
#[async_trait]
impl Authenticator for Credential {
    async fn authorization(&self) -> std::result::Result<Credential, AuthError> {
        Ok(self.clone())
    }
}

/// Static username/password configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl AuthConfig {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    pub fn has_auth(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

#[async_trait]
impl Authenticator for AuthConfig {
    async fn authorization(&self) -> std::result::Result<Credential, AuthError> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credential::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            (None, None) => Ok(Credential::Anonymous),
            _ => Err(AuthError::Unavailable(
                "username and password must be supplied together".to_string(),
            )),
        }
    }
}
