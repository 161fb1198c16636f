//! Registry Transport Library
//!
//! Negotiates HTTP authentication with OCI/Docker container registries and
//! decorates a base transport so every subsequent request carries the right
//! credentials. The registry decides the flow: no authentication, HTTP Basic,
//! or Bearer tokens obtained through an OAuth2-style exchange and refreshed
//! on 401.

pub mod auth;
pub mod context;
pub mod error;
pub mod logging;
pub mod registry;
pub mod transport;

pub use auth::{AuthConfig, AuthError, Authenticator, Credential};
pub use context::CancelToken;
pub use error::{Result, TransportError};
pub use logging::Logger;
pub use registry::{Registry, Scheme};
pub use transport::{RoundTrip, UserAgentTransport, Wrapper, negotiate};
