//! The request-sending capability every decorator wraps

use crate::error::Result;
use async_trait::async_trait;

/// A transport that sends one request and yields its response
///
/// This is the single seam the whole crate composes over: the caller's base
/// transport satisfies it, every decorator wraps an inner `RoundTrip`, and
/// [`negotiate`](crate::transport::negotiate) hands back another one. Inner
/// failures pass through decorators unchanged.
#[async_trait]
pub trait RoundTrip: Send + Sync {
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response>;

    /// Whether this transport already tags requests with a `User-Agent`
    ///
    /// Checked on the immediate wrapper only, so the orchestrator never
    /// double-wraps. Decorators that do not set the header keep the default.
    fn has_user_agent(&self) -> bool {
        false
    }
}

#[async_trait]
impl RoundTrip for reqwest::Client {
    async fn round_trip(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        Ok(self.execute(request).await?)
    }
}
