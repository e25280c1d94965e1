//! Error types for the DDNS system
//!
//! Every fatal outcome of a reconciliation run maps onto one variant here.
//! There is no "record not found" variant: a missing record routes the
//! reconciler to the create path.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing desired-state field
    #[error("Configuration error: {0}")]
    Config(String),

    /// All transport attempts exhausted
    #[error("Network error: {0}")]
    Network(String),

    /// The public address service returned something that is not an address
    #[error("Invalid {version} address from address service: {raw:?}")]
    InvalidAddress {
        /// "IPv4" or "IPv6"
        version: &'static str,
        /// The raw value exactly as received
        raw: String,
    },

    /// The zone could not be resolved by name
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// Token verification failed
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Create/update reported non-success
    #[error("Apply failed: {0}")]
    Apply(String),

    /// Provider returned an unsuccessful or malformed response to a lookup
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Cache or config file errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an invalid IPv4 address error
    pub fn invalid_ipv4(raw: impl Into<String>) -> Self {
        Self::InvalidAddress {
            version: "IPv4",
            raw: raw.into(),
        }
    }

    /// Create an invalid IPv6 address error
    pub fn invalid_ipv6(raw: impl Into<String>) -> Self {
        Self::InvalidAddress {
            version: "IPv6",
            raw: raw.into(),
        }
    }

    /// Create a zone-not-found error
    pub fn zone_not_found(msg: impl Into<String>) -> Self {
        Self::ZoneNotFound(msg.into())
    }

    /// Create an authorization error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    /// Create an apply error
    pub fn apply(msg: impl Into<String>) -> Self {
        Self::Apply(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error aborts before any network call could be made
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_address_carries_raw_value() {
        let err = Error::invalid_ipv4("1.2.3.256\n");
        let msg = err.to_string();
        assert!(msg.contains("IPv4"));
        assert!(msg.contains("1.2.3.256\\n"), "raw value must be shown verbatim: {msg}");
    }

    #[test]
    fn provider_error_names_provider() {
        let err = Error::provider("cloudflare", "result missing");
        assert_eq!(err.to_string(), "Provider error (cloudflare): result missing");
    }
}
