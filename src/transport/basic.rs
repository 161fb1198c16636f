//! Basic authentication decorator
//!
//! The authenticator is queried again on every request rather than cached, so
//! credential rotation takes effect on the next request without re-probing
//! the registry.

use crate::auth::{Authenticator, Credential};
use crate::error::{Result, TransportError};
use crate::transport::round_trip::RoundTrip;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use std::sync::Arc;

pub struct BasicTransport {
    inner: Box<dyn RoundTrip>,
    auth: Arc<dyn Authenticator>,
    target: String,
}

impl BasicTransport {
    pub fn new(inner: Box<dyn RoundTrip>, auth: Arc<dyn Authenticator>, target: &str) -> Self {
        Self {
            inner,
            auth,
            target: target.to_string(),
        }
    }
}

#[async_trait]
impl RoundTrip for BasicTransport {
    async fn round_trip(&self, mut request: reqwest::Request) -> Result<reqwest::Response> {
        let credential = self.auth.authorization().await?;
        if credential == Credential::Anonymous {
            return Err(TransportError::AuthUnavailable(format!(
                "registry {} requires basic authentication but no credentials are configured",
                self.target
            )));
        }

        if let Some(header) = credential.authorization_header()? {
            request.headers_mut().insert(AUTHORIZATION, header);
        }
        self.inner.round_trip(request).await
    }
}
