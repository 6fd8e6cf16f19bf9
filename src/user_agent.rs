//! User-Agent strings for site traffic.
//!
//! The site serves its cart endpoints to browsers only, so requests carry a
//! desktop Firefox User-Agent unless the caller configures another one.

/// Browser User-Agent sent by default.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:78.0) Gecko/20100101 Firefox/78.0";

/// Returns the User-Agent to send, preferring a configured override.
#[must_use]
pub(crate) fn effective_user_agent(configured: Option<&str>) -> &str {
    configured
        .map(str::trim)
        .filter(|ua| !ua.is_empty())
        .unwrap_or(BROWSER_USER_AGENT)
}
