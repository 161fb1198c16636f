//! Bearer token decorator and OAuth2-style token exchange
//!
//! Holds the one piece of mutable state in a negotiated chain: the cached
//! token. The token is seeded before the decorator is handed to the caller,
//! attached to every request, and replaced through a single-flight refresh
//! when the registry answers 401. Exactly one refresh-and-retry per request;
//! a second 401 goes back to the caller untouched.

use crate::auth::{Authenticator, Credential};
use crate::context::CancelToken;
use crate::error::{Result, TransportError};
use crate::logging::Logger;
use crate::registry::Registry;
use crate::transport::round_trip::RoundTrip;
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Request, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use url::Url;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
    // Note: expires_in is part of the API response but not currently used
    #[allow(dead_code)]
    expires_in: Option<u64>,
}

#[derive(Debug)]
struct TokenState {
    token: String,
    generation: u64,
}

pub struct BearerTransport {
    inner: Box<dyn RoundTrip>,
    basic: Arc<dyn Authenticator>,
    registry: Registry,
    realm: Url,
    service: String,
    scopes: Vec<String>,
    token: RwLock<TokenState>,
    refresh_guard: Mutex<()>,
    ctx: CancelToken,
    output: Logger,
}

impl BearerTransport {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inner: Box<dyn RoundTrip>,
        basic: Arc<dyn Authenticator>,
        registry: Registry,
        realm: Url,
        service: String,
        scopes: Vec<String>,
        ctx: CancelToken,
        output: Logger,
    ) -> Self {
        Self {
            inner,
            basic,
            registry,
            realm,
            service,
            scopes,
            token: RwLock::new(TokenState {
                token: String::new(),
                generation: 0,
            }),
            refresh_guard: Mutex::new(()),
            ctx,
            output,
        }
    }

    /// Perform the initial exchange so no caller request ever goes out with
    /// an unset token
    pub(crate) async fn seed(&self) -> Result<()> {
        self.refresh(0).await?;
        Ok(())
    }

    /// Single-flight token refresh
    ///
    /// `observed_generation` is the generation the caller read before its
    /// request. If another caller already refreshed past it, the exchange is
    /// skipped and the winner's token reused; concurrent 401s cost one
    /// exchange between them. A failed exchange leaves the cached token
    /// untouched.
    async fn refresh(&self, observed_generation: u64) -> Result<String> {
        let _refresh = self.refresh_guard.lock().await;

        {
            let state = self.token.read().await;
            if state.generation != observed_generation {
                return Ok(state.token.clone());
            }
        }

        let token = self.exchange().await?;
        let mut state = self.token.write().await;
        state.token = token.clone();
        state.generation += 1;
        Ok(token)
    }

    /// Exchange credentials for a token at the challenge realm
    async fn exchange(&self) -> Result<String> {
        let credential = self.basic.authorization().await?;
        if let Credential::Token(token) = credential {
            // Pre-issued registry token, nothing to exchange.
            return Ok(token);
        }

        let url = Url::parse(&exchange_url(&self.realm, &self.service, &self.scopes))
            .map_err(|e| TransportError::ExchangeFailed(format!("invalid token URL: {}", e)))?;
        self.output.detail(&format!("Requesting token from: {}", url));

        let mut request = Request::new(Method::GET, url);
        if let Some(header) = credential.authorization_header()? {
            request.headers_mut().insert(AUTHORIZATION, header);
        }

        let response = match self.ctx.run(self.inner.round_trip(request)).await {
            Ok(response) => response,
            Err(TransportError::Cancelled) => return Err(TransportError::Cancelled),
            Err(err) => return Err(TransportError::ExchangeFailed(err.to_string())),
        };

        if !response.status().is_success() {
            return Err(TransportError::ExchangeFailed(format!(
                "token endpoint for {} returned status {}",
                self.registry.name(),
                response.status()
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            TransportError::ExchangeFailed(format!("unparseable token response: {}", e))
        })?;
        let token = body.token.or(body.access_token).ok_or_else(|| {
            TransportError::ExchangeFailed("token response contains no token".to_string())
        })?;

        self.output
            .detail(&format!("Token obtained (length: {} chars)", token.len()));
        Ok(token)
    }
}

#[async_trait]
impl RoundTrip for BearerTransport {
    async fn round_trip(&self, mut request: Request) -> Result<reqwest::Response> {
        let (token, generation) = {
            let state = self.token.read().await;
            (state.token.clone(), state.generation)
        };
        request
            .headers_mut()
            .insert(AUTHORIZATION, bearer_header(&token)?);

        let retry = request.try_clone();
        let response = self.inner.round_trip(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // One refresh, one retry. Requests whose body cannot be replayed
        // keep their original response.
        let Some(mut retry) = retry else {
            return Ok(response);
        };

        self.output
            .warning("Received 401 Unauthorized - attempting token refresh...");
        let fresh = self.refresh(generation).await?;
        retry
            .headers_mut()
            .insert(AUTHORIZATION, bearer_header(&fresh)?);
        self.inner.round_trip(retry).await
    }
}

fn bearer_header(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
        TransportError::Parse("bearer token is not a valid header value".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Build the token request URL: `realm?service=...&scope=...&scope=...`
///
/// Scope strings stay unencoded; `:` and `/` are legal query characters and
/// registries expect them verbatim.
fn exchange_url(realm: &Url, service: &str, scopes: &[String]) -> String {
    let mut url = realm.as_str().to_string();
    url.push(if url.contains('?') { '&' } else { '?' });
    url.push_str(&format!("service={}", service));
    for scope in scopes {
        url.push_str(&format!("&scope={}", scope));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_url_repeats_scope_parameters() {
        let realm = Url::parse("https://auth.example/token").unwrap();
        let scopes = vec![
            "repository:foo:pull".to_string(),
            "repository:bar:push".to_string(),
        ];
        assert_eq!(
            exchange_url(&realm, "registry.example", &scopes),
            "https://auth.example/token?service=registry.example&scope=repository:foo:pull&scope=repository:bar:push"
        );
    }

    #[test]
    fn exchange_url_extends_existing_query() {
        let realm = Url::parse("https://auth.example/token?tenant=a").unwrap();
        assert_eq!(
            exchange_url(&realm, "svc", &[]),
            "https://auth.example/token?tenant=a&service=svc"
        );
    }

    #[test]
    fn bearer_header_is_marked_sensitive() {
        let header = bearer_header("abc").unwrap();
        assert_eq!(header.to_str().ok(), Some("Bearer abc"));
        assert!(header.is_sensitive());
    }
}
