//! Transparent pass-through wrapper

use crate::error::Result;
use crate::transport::round_trip::RoundTrip;
use async_trait::async_trait;

/// Marks a fully negotiated transport
///
/// Adds strictly no behavior. Consumers receiving a `Wrapper` are opting out
/// of any further decoration (retries, logging, user-agent tagging); the
/// chain inside is complete.
pub struct Wrapper {
    inner: Box<dyn RoundTrip>,
}

impl Wrapper {
    pub fn new(inner: Box<dyn RoundTrip>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RoundTrip for Wrapper {
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        self.inner.round_trip(request).await
    }
}
