//! User-Agent tagging decorator

use crate::error::Result;
use crate::transport::round_trip::RoundTrip;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, USER_AGENT};

/// Default agent string, `registry-transport/<version>`
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Tags every request with a fixed `User-Agent` header
///
/// Reports `has_user_agent`, so the orchestrator adds it at most once per
/// chain. Callers that pre-wrap their transport with their own agent string
/// keep it.
pub struct UserAgentTransport {
    inner: Box<dyn RoundTrip>,
    agent: HeaderValue,
}

impl UserAgentTransport {
    pub fn new(inner: Box<dyn RoundTrip>, agent: &str) -> Self {
        let agent = if agent.is_empty() {
            DEFAULT_USER_AGENT
        } else {
            agent
        };
        let agent =
            HeaderValue::from_str(agent).unwrap_or(HeaderValue::from_static(DEFAULT_USER_AGENT));
        Self { inner, agent }
    }
}

#[async_trait]
impl RoundTrip for UserAgentTransport {
    async fn round_trip(&self, mut request: reqwest::Request) -> Result<reqwest::Response> {
        request.headers_mut().insert(USER_AGENT, self.agent.clone());
        self.inner.round_trip(request).await
    }

    fn has_user_agent(&self) -> bool {
        true
    }
}
