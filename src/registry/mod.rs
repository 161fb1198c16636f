//! Registry identity and transport scheme
//!
//! A [`Registry`] is the canonical `host[:port]` form of a registry address
//! plus the scheme the caller declared for it. The declared scheme decides
//! whether the prober may fall back to plaintext HTTP when the HTTPS attempt
//! fails; the scheme actually used on the wire is always the one the probe
//! discovered.

use crate::error::{Result, TransportError};
use std::fmt;

/// Transport scheme for registry traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Https,
    Http,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a target registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    name: String,
    scheme: Scheme,
}

impl Registry {
    /// A registry reached over encrypted transport only
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self {
            name,
            scheme: Scheme::Https,
        })
    }

    /// A registry explicitly allowed to fall back to plaintext transport
    pub fn insecure(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self {
            name,
            scheme: Scheme::Http,
        })
    }

    /// Parse a registry address with an optional scheme prefix
    ///
    /// `http://` marks the registry insecure; `https://` and bare
    /// `host[:port]` addresses stay encrypted-only.
    pub fn parse(input: &str) -> Result<Self> {
        let (scheme, name) = if let Some(rest) = input.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else if let Some(rest) = input.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else {
            (Scheme::Https, input)
        };

        let name = name.trim_end_matches('/');
        Self::validate(name)?;
        Ok(Self {
            name: name.to_string(),
            scheme,
        })
    }

    fn validate(name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(TransportError::Validation(
                "registry address cannot be empty".to_string(),
            ));
        }
        if name.contains("://") || name.contains('/') {
            return Err(TransportError::Validation(format!(
                "registry address must be host[:port], got: {}",
                name
            )));
        }
        // Must form a valid URL authority
        url::Url::parse(&format!("https://{}/v2/", name))
            .map_err(|e| TransportError::Validation(format!("invalid registry {}: {}", name, e)))?;
        Ok(())
    }

    /// Canonical `host[:port]` form
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scheme the caller declared for this registry
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Whether probing may fall back to plaintext HTTP
    pub fn allows_insecure(&self) -> bool {
        self.scheme == Scheme::Http
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
