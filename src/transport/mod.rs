//! Authentication negotiation for Docker Registry API v2 and OCI registries
//!
//! [`negotiate`] probes a registry once, then composes a decorator chain
//! around the caller's base transport so every subsequent request carries the
//! right credentials: nothing for anonymous registries, an `Authorization:
//! Basic` header recomputed per request, or a cached Bearer token refreshed on
//! 401.

pub mod basic;
pub mod bearer;
pub mod ping;
pub mod round_trip;
pub mod scheme;
pub mod useragent;
pub mod wrapper;

pub use basic::BasicTransport;
pub use bearer::BearerTransport;
pub use ping::{Challenge, ChallengeKind, PingResponse, ping};
pub use round_trip::RoundTrip;
pub use scheme::SchemeTransport;
pub use useragent::{DEFAULT_USER_AGENT, UserAgentTransport};
pub use wrapper::Wrapper;

use crate::auth::Authenticator;
use crate::context::CancelToken;
use crate::error::{Result, TransportError};
use crate::logging::Logger;
use crate::registry::Registry;
use std::sync::Arc;
use url::Url;

/// Negotiate authentication with a registry and return a ready-to-use transport
///
/// The handshake:
///  1. Ping the registry version endpoint for the authentication challenge.
///  2a. 200 back: the scheme-selected transport is used as is.
///  2b. 401 with a Basic challenge: attach credentials on every round trip.
///  2c. 401 with a Bearer challenge: exchange credentials for a token at the
///      challenge realm, attach it on every round trip, refresh on 401s.
///      The initial exchange runs here, so the returned transport never sends
///      a request with an unset token.
///
/// Negotiation-time failures (probe, seed exchange) are fatal and returned to
/// the caller; nothing is retried at this layer.
pub async fn negotiate(
    ctx: &CancelToken,
    registry: &Registry,
    authenticator: Arc<dyn Authenticator>,
    transport: Box<dyn RoundTrip>,
    scopes: &[String],
    output: &Logger,
) -> Result<Wrapper> {
    output.verbose(&format!(
        "Negotiating authentication with {}",
        registry.name()
    ));
    let ping = ping::ping(ctx, registry, transport.as_ref(), output).await?;

    // Tag requests with a user agent unless the caller already did.
    let transport: Box<dyn RoundTrip> = if transport.has_user_agent() {
        transport
    } else {
        Box::new(UserAgentTransport::new(transport, DEFAULT_USER_AGENT))
    };

    // All registry traffic uses the scheme the probe discovered, never the
    // scheme embedded in an individual request URL.
    let transport: Box<dyn RoundTrip> = Box::new(SchemeTransport::new(
        transport,
        registry.clone(),
        ping.scheme,
    ));

    match ping.challenge.kind() {
        ChallengeKind::Anonymous => {
            output.detail("Registry requires no authentication");
            Ok(Wrapper::new(transport))
        }
        ChallengeKind::Basic => {
            output.detail("Registry requires basic authentication");
            Ok(Wrapper::new(Box::new(BasicTransport::new(
                transport,
                authenticator,
                registry.name(),
            ))))
        }
        ChallengeKind::Bearer => {
            // The realm tells us where to turn credentials into a token;
            // without it the exchange cannot proceed.
            let realm = ping.challenge.parameter("realm").ok_or_else(|| {
                TransportError::MalformedChallenge(format!(
                    "bearer challenge from {} is missing realm",
                    registry.name()
                ))
            })?;
            let realm = Url::parse(realm).map_err(|e| {
                TransportError::MalformedChallenge(format!("invalid realm {}: {}", realm, e))
            })?;
            let service = ping
                .challenge
                .parameter("service")
                .unwrap_or(registry.name())
                .to_string();

            let bearer = BearerTransport::new(
                transport,
                authenticator,
                registry.clone(),
                realm,
                service,
                scopes.to_vec(),
                ctx.clone(),
                output.clone(),
            );
            bearer.seed().await?;
            output.success("Bearer token obtained successfully");
            Ok(Wrapper::new(Box::new(bearer)))
        }
        ChallengeKind::Unknown(scheme) => Err(TransportError::UnrecognizedChallenge(format!(
            "unsupported authentication scheme from {}: {}",
            registry.name(),
            scheme
        ))),
    }
}
