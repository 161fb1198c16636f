//! Scheme-selecting decorator
//!
//! The probe decides once whether the registry speaks HTTPS or plaintext
//! HTTP. Every subsequent request aimed at the registry is rewritten to that
//! scheme, whatever the caller's URL said, so a negotiated transport can
//! never silently downgrade or upgrade registry traffic. Requests to other
//! hosts (token realms, redirect targets) pass through untouched: the probe
//! result says nothing about them.

use crate::error::{Result, TransportError};
use crate::registry::{Registry, Scheme};
use crate::transport::round_trip::RoundTrip;
use async_trait::async_trait;
use url::Url;

pub struct SchemeTransport {
    inner: Box<dyn RoundTrip>,
    registry: Registry,
    scheme: Scheme,
}

impl SchemeTransport {
    pub fn new(inner: Box<dyn RoundTrip>, registry: Registry, scheme: Scheme) -> Self {
        Self {
            inner,
            registry,
            scheme,
        }
    }

    fn targets_registry(&self, url: &Url) -> bool {
        matches_host(self.registry.name(), url)
    }
}

#[async_trait]
impl RoundTrip for SchemeTransport {
    async fn round_trip(&self, mut request: reqwest::Request) -> Result<reqwest::Response> {
        if self.targets_registry(request.url())
            && request.url().scheme() != self.scheme.as_str()
            && request.url_mut().set_scheme(self.scheme.as_str()).is_err()
        {
            return Err(TransportError::Validation(format!(
                "cannot rewrite {} to {}",
                request.url(),
                self.scheme
            )));
        }
        self.inner.round_trip(request).await
    }
}

/// Whether a URL addresses the registry named by `name` (`host[:port]`)
fn matches_host(name: &str, url: &Url) -> bool {
    let Some(host) = url.host_str() else {
        return false;
    };
    match url.port() {
        Some(port) => format!("{}:{}", host, port) == name,
        None => host == name,
    }
}
