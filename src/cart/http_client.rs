//! HTTP client construction and request header policy.
//!
//! Every request carries the same browser-like base header set, built once per
//! client from the configured base URL. Requests that need different headers
//! compose overrides on top; the base set is never mutated.

use std::sync::Arc;

use reqwest::Client;
use reqwest::cookie::Jar;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, ORIGIN, REFERER,
    USER_AGENT,
};
use url::Url;

use super::CartError;
use crate::config::ClientConfig;
use crate::user_agent::effective_user_agent;

/// Content type the site expects on form-style endpoints.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Header name used to echo the CSRF token on JSON requests.
const CSRF_HEADER: &str = "csrftoken";

/// Builds the immutable base header set for a site.
///
/// `Origin` and `Referer` are derived from `base_url` so the same policy works
/// against the live site and a local mock.
pub(crate) fn base_headers(base_url: &Url, user_agent: &str) -> Result<HeaderMap, CartError> {
    let origin_text = base_url.origin().ascii_serialization();
    let origin =
        HeaderValue::from_str(&origin_text).map_err(|_| CartError::invalid_url(&origin_text))?;
    let user_agent = HeaderValue::from_str(user_agent)
        .map_err(|_| CartError::client_build("user agent contains invalid header characters"))?;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, user_agent);
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    headers.insert(
        HeaderName::from_static("x-requested-with"),
        HeaderValue::from_static("XMLHttpRequest"),
    );
    headers.insert(ORIGIN, origin.clone());
    headers.insert(REFERER, origin);
    Ok(headers)
}

/// Per-request overrides for JSON submissions that carry the token as a header.
pub(crate) fn json_token_headers(token: &str) -> Result<HeaderMap, CartError> {
    let token = HeaderValue::from_str(token).map_err(|_| CartError::InvalidToken)?;
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(HeaderName::from_static(CSRF_HEADER), token);
    Ok(headers)
}

/// Builds the reqwest client that owns the session cookie jar.
///
/// # Errors
///
/// Returns [`CartError::ClientBuild`] when the user agent is not a valid
/// header value or reqwest rejects the configuration.
pub(crate) fn build_site_client(
    config: &ClientConfig,
    base_url: &Url,
    jar: Arc<Jar>,
) -> Result<Client, CartError> {
    let headers = base_headers(
        base_url,
        effective_user_agent(config.user_agent.as_deref()),
    )?;
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .gzip(true)
        .default_headers(headers)
        .cookie_provider(jar)
        .build()
        .map_err(|e| CartError::client_build(e.to_string()))
}
