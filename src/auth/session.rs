//! Session credentials and captured-cookie mappings.

use std::collections::BTreeMap;
use std::fmt;
use std::io::BufRead;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use super::cookies::{CookieError, parse_netscape_cookies};
use super::token::TOKEN_NAME;

/// Username and password for credential login.
///
/// The password is redacted in Debug output.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The account username (email address on the site).
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Where the current session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No login has succeeded yet.
    #[default]
    Anonymous,
    /// Credential login returned HTTP 200.
    Authenticated,
    /// Cookies from a previously captured session were injected.
    CookieInjected,
}

/// Outcome of a credential login that reached the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStatus {
    /// The authentication endpoint answered 200.
    Authenticated,
    /// The authentication endpoint answered with another status.
    Rejected {
        /// HTTP status returned by the site.
        status: u16,
    },
}

impl LoginStatus {
    /// Whether the login succeeded.
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Cookie name/value pairs captured from an earlier session.
///
/// The `CSRFToken` entry doubles as the session token. Values are redacted in
/// Debug output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    entries: BTreeMap<String, String>,
}

impl SessionCookies {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a cookie.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Returns the value of a cookie.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Returns the CSRF token entry, if present.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.get(TOKEN_NAME)
    }

    /// Iterates over (name, value) pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a flat JSON object such as `{"CSRFToken": "...", "JSESSIONID": "..."}`.
    ///
    /// Numbers and booleans are stored in their JSON text form.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::InvalidJson`] for malformed JSON and
    /// [`CookieError::UnsupportedValue`] for nested or null values.
    pub fn from_json_str(json: &str) -> Result<Self, CookieError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(map) = value else {
            return Err(CookieError::UnsupportedValue {
                key: "<root>".to_string(),
            });
        };

        let mut cookies = Self::new();
        for (key, value) in map {
            let text = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => return Err(CookieError::UnsupportedValue { key }),
            };
            cookies.insert(key, text);
        }
        Ok(cookies)
    }

    /// Imports the cookies for `host` from a browser-exported `cookies.txt`.
    ///
    /// Cookies for other domains and cookies already expired are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError`] when the file cannot be read or has no valid lines.
    pub fn from_netscape_cookies(reader: impl BufRead, host: &str) -> Result<Self, CookieError> {
        let parsed = parse_netscape_cookies(reader)?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());

        let mut cookies = Self::new();
        let mut skipped = 0usize;
        for cookie in parsed.cookies {
            if !cookie.matches_host(host) || cookie.is_expired_at(now) {
                debug!(domain = %cookie.domain, name = %cookie.name, "skipping cookie");
                skipped += 1;
                continue;
            }
            cookies.insert(cookie.name.clone(), cookie.value());
        }
        info!(
            host,
            imported = cookies.len(),
            skipped,
            malformed = parsed.warnings.len(),
            "imported session cookies"
        );
        Ok(cookies)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SessionCookies {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl fmt::Debug for SessionCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.keys().map(|k| (k, "[REDACTED]")))
            .finish()
    }
}
