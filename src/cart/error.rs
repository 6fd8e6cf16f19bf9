//! Error types for the cart module.
//!
//! Every variant carries the context (URL, product, operation) needed to
//! report the failure without re-reading logs.

use thiserror::Error;

/// Errors that can occur while talking to the ordering site.
#[derive(Debug, Error)]
pub enum CartError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Response body was not the JSON structure the site normally returns.
    #[error("unexpected response body from {url}: {source}")]
    Decode {
        /// The URL whose body failed to parse.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Product name is not in the static catalog.
    #[error("unknown product: '{name}'")]
    UnknownProduct {
        /// The name that was looked up.
        name: String,
    },

    /// A mutating cart call was attempted before a CSRF token was obtained.
    #[error("no CSRF token in session; log in before calling {operation}")]
    MissingToken {
        /// The operation that needed the token.
        operation: &'static str,
    },

    /// The cached CSRF token cannot be sent as a header value.
    #[error("session CSRF token contains characters not allowed in a header")]
    InvalidToken,

    /// A captured session cookie cannot be stored in the cookie jar.
    #[error("captured cookie '{name}' cannot be sent: {reason}")]
    InvalidCookie {
        /// The cookie name as captured.
        name: String,
        /// What makes the name or value unusable.
        reason: &'static str,
    },

    /// The customization overlay for a product could not be fetched.
    #[error("customization options unavailable for product {product_code}")]
    CustomizationsUnavailable {
        /// The catalog code of the product.
        product_code: u32,
    },

    /// A sauce or addon variant code could not be read as an integer.
    #[error("option '{option}' has non-numeric variant code '{code}'")]
    InvalidOptionCode {
        /// The option name as shown on the site.
        option: String,
        /// The code as returned by the site.
        code: String,
    },

    /// The configured base URL or a derived endpoint URL is invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {reason}")]
    ClientBuild {
        /// Description of the failure.
        reason: String,
    },
}

impl CartError {
    /// Creates a network error from a reqwest error, mapping timeouts to [`CartError::Timeout`].
    pub fn from_transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an unknown-product error.
    pub fn unknown_product(name: impl Into<String>) -> Self {
        Self::UnknownProduct { name: name.into() }
    }

    /// Creates a missing-token error for the named operation.
    pub fn missing_token(operation: &'static str) -> Self {
        Self::MissingToken { operation }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an invalid option code error.
    pub fn invalid_option_code(option: impl Into<String>, code: impl Into<String>) -> Self {
        Self::InvalidOptionCode {
            option: option.into(),
            code: code.into(),
        }
    }

    /// Creates an invalid cookie error.
    pub fn invalid_cookie(name: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidCookie {
            name: name.into(),
            reason,
        }
    }

    /// Creates a client construction error.
    pub fn client_build(reason: impl Into<String>) -> Self {
        Self::ClientBuild {
            reason: reason.into(),
        }
    }
}

// No `From<reqwest::Error>` / `From<serde_json::Error>`: every variant needs the
// URL, which the source errors do not carry.
