//! Challenge prober for the registry version endpoint
//!
//! One GET to `/v2/` tells us everything negotiation needs: whether the
//! registry answers over HTTPS or plaintext HTTP, and which authentication
//! challenge (if any) it issues. The probe tries HTTPS first and falls back
//! to HTTP only for registries explicitly declared insecure.

use crate::context::CancelToken;
use crate::error::{Result, TransportError};
use crate::logging::Logger;
use crate::registry::{Registry, Scheme};
use crate::transport::round_trip::RoundTrip;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::{Method, Request, StatusCode};
use std::collections::HashMap;
use url::Url;

/// Kind of authentication challenge a registry issued
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeKind {
    /// 200 from the version endpoint, or a 401 without a challenge header
    Anonymous,
    Basic,
    Bearer,
    /// A scheme token this crate does not speak
    Unknown(String),
}

/// Parsed `WWW-Authenticate` challenge
#[derive(Debug, Clone)]
pub struct Challenge {
    kind: ChallengeKind,
    parameters: HashMap<String, String>,
}

impl Challenge {
    pub fn anonymous() -> Self {
        Self {
            kind: ChallengeKind::Anonymous,
            parameters: HashMap::new(),
        }
    }

    /// Parse a `WWW-Authenticate` header value
    ///
    /// Format: `<Scheme> key1="value1",key2="value2"`. The scheme token is
    /// case-insensitive; quoted parameter values may contain commas.
    pub fn parse(header: &str) -> Self {
        let header = header.trim();
        let (scheme, params) = match header.split_once(' ') {
            Some((scheme, rest)) => (scheme, rest),
            None => (header, ""),
        };

        let kind = match scheme.to_ascii_lowercase().as_str() {
            "basic" => ChallengeKind::Basic,
            "bearer" => ChallengeKind::Bearer,
            other => ChallengeKind::Unknown(other.to_string()),
        };

        Self {
            kind,
            parameters: parse_parameters(params),
        }
    }

    pub fn kind(&self) -> &ChallengeKind {
        &self.kind
    }

    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// Outcome of probing a registry: the scheme that answered plus its challenge
#[derive(Debug, Clone)]
pub struct PingResponse {
    pub scheme: Scheme,
    pub challenge: Challenge,
}

/// Probe the registry version endpoint and classify its challenge
pub async fn ping(
    ctx: &CancelToken,
    registry: &Registry,
    transport: &dyn RoundTrip,
    output: &Logger,
) -> Result<PingResponse> {
    let mut schemes = vec![Scheme::Https];
    if registry.allows_insecure() {
        schemes.push(Scheme::Http);
    }

    let mut last_failure: Option<TransportError> = None;
    for scheme in schemes {
        let url = Url::parse(&format!("{}://{}/v2/", scheme, registry.name()))?;
        output.verbose(&format!("Probing registry at {}", url));

        let request = Request::new(Method::GET, url.clone());
        let response = match ctx.run(transport.round_trip(request)).await {
            Ok(response) => response,
            Err(TransportError::Cancelled) => return Err(TransportError::Cancelled),
            Err(err) => {
                output.detail(&format!("{} attempt failed: {}", scheme, err));
                last_failure = Some(err);
                continue;
            }
        };

        let status = response.status();
        output.detail(&format!("Probe response status: {}", status));

        if status == StatusCode::OK {
            return Ok(PingResponse {
                scheme,
                challenge: Challenge::anonymous(),
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            // Some registries 401 the version endpoint without issuing a
            // challenge; they are treated as anonymous.
            let challenge = match response.headers().get(WWW_AUTHENTICATE) {
                Some(header) => {
                    let header = header.to_str().map_err(|e| {
                        TransportError::UnrecognizedChallenge(format!(
                            "unreadable WWW-Authenticate header: {}",
                            e
                        ))
                    })?;
                    Challenge::parse(header)
                }
                None => Challenge::anonymous(),
            };
            return Ok(PingResponse { scheme, challenge });
        }

        last_failure = Some(TransportError::ProbeFailed(format!(
            "unexpected status {} from {}",
            status, url
        )));
    }

    Err(match last_failure {
        Some(TransportError::ProbeFailed(msg)) => TransportError::ProbeFailed(msg),
        Some(err) => TransportError::ProbeFailed(err.to_string()),
        None => TransportError::ProbeFailed(format!("no scheme to probe {}", registry.name())),
    })
}

fn parse_parameters(input: &str) -> HashMap<String, String> {
    let mut parameters = HashMap::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut quoted = false;

    for c in input.chars() {
        match c {
            '=' if !in_value => in_value = true,
            '"' if in_value => quoted = !quoted,
            ',' if !quoted => {
                if in_value && !key.trim().is_empty() {
                    parameters.insert(key.trim().to_string(), value.clone());
                }
                key.clear();
                value.clear();
                in_value = false;
            }
            _ if in_value => value.push(c),
            _ => key.push(c),
        }
    }
    if in_value && !key.trim().is_empty() {
        parameters.insert(key.trim().to_string(), value);
    }

    parameters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bearer_challenge_with_parameters() {
        let challenge = Challenge::parse(
            r#"Bearer realm="https://auth.example/token",service="registry.example",scope="repository:foo:pull""#,
        );
        assert_eq!(challenge.kind(), &ChallengeKind::Bearer);
        assert_eq!(
            challenge.parameter("realm"),
            Some("https://auth.example/token")
        );
        assert_eq!(challenge.parameter("service"), Some("registry.example"));
        assert_eq!(challenge.parameter("scope"), Some("repository:foo:pull"));
    }

    #[test]
    fn scheme_token_is_case_insensitive() {
        assert_eq!(
            Challenge::parse(r#"BEARER realm="r""#).kind(),
            &ChallengeKind::Bearer
        );
        assert_eq!(
            Challenge::parse(r#"basic realm="registry""#).kind(),
            &ChallengeKind::Basic
        );
    }

    #[test]
    fn quoted_values_may_contain_commas() {
        let challenge = Challenge::parse(r#"Bearer realm="https://r",scope="a:b,c:d""#);
        assert_eq!(challenge.parameter("scope"), Some("a:b,c:d"));
        assert_eq!(challenge.parameter("realm"), Some("https://r"));
    }

    #[test]
    fn unknown_scheme_is_preserved() {
        let challenge = Challenge::parse("Negotiate");
        assert_eq!(
            challenge.kind(),
            &ChallengeKind::Unknown("negotiate".to_string())
        );
    }

    #[test]
    fn parameters_tolerate_whitespace() {
        let challenge = Challenge::parse(r#"Basic realm="registry", charset="UTF-8""#);
        assert_eq!(challenge.kind(), &ChallengeKind::Basic);
        assert_eq!(challenge.parameter("realm"), Some("registry"));
        assert_eq!(challenge.parameter("charset"), Some("UTF-8"));
    }
}
