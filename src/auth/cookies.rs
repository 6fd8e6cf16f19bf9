//! Netscape cookie file parser.
//!
//! Browser extensions export cookies as `cookies.txt`: one cookie per line,
//! 7 TAB-separated fields (`domain`, `tailmatch`, `path`, `secure`, `expires`,
//! `name`, `value`). Parsed cookies feed [`SessionCookies`](super::SessionCookies)
//! for cookie-injection login.

use std::fmt;
use std::io::BufRead;

use tracing::{debug, instrument, warn};

/// A single parsed cookie from a Netscape-format cookie file.
///
/// The value is redacted in Debug output.
#[derive(Clone)]
pub struct CookieLine {
    /// The domain the cookie belongs to (e.g., `.tacobell.com`).
    pub domain: String,
    /// Whether subdomains should match.
    pub tailmatch: bool,
    /// The URL path scope for the cookie.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Unix timestamp for expiry (0 = session cookie).
    pub expires: u64,
    /// Cookie name.
    pub name: String,
    value: String,
}

impl CookieLine {
    /// Returns the cookie value. Avoid logging it.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this cookie would be sent to `host`.
    ///
    /// A leading dot or the tailmatch flag lets the cookie match subdomains.
    #[must_use]
    pub fn matches_host(&self, host: &str) -> bool {
        let bare = self.domain.strip_prefix('.').unwrap_or(&self.domain);
        if host.eq_ignore_ascii_case(bare) {
            return true;
        }
        let subdomains_allowed = self.tailmatch || self.domain.starts_with('.');
        subdomains_allowed
            && host.len() > bare.len()
            && host.to_ascii_lowercase().ends_with(&format!(".{}", bare.to_ascii_lowercase()))
    }

    /// Whether the cookie had expired at `now_unix`. Session cookies never expire here.
    #[must_use]
    pub fn is_expired_at(&self, now_unix: u64) -> bool {
        self.expires != 0 && self.expires <= now_unix
    }
}

impl fmt::Debug for CookieLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieLine")
            .field("domain", &self.domain)
            .field("tailmatch", &self.tailmatch)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("expires", &self.expires)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Errors that can occur while importing session cookies.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// A line in the cookie file has an invalid format.
    #[error("line {line_number}: {reason} (got: {content})")]
    InvalidLine {
        /// 1-based line number in the cookie file.
        line_number: usize,
        /// The offending line with its value redacted.
        content: String,
        /// Description of what was wrong.
        reason: String,
    },

    /// I/O error reading the cookie file.
    #[error("failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    /// No valid cookies found in a non-empty file.
    #[error("no valid cookies found in file ({malformed_count} lines failed to parse)")]
    NoCookiesFound {
        /// Number of malformed lines encountered.
        malformed_count: usize,
    },

    /// Session mapping given as JSON could not be parsed.
    #[error("session cookies are not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Session mapping JSON was valid but not a flat object of scalars.
    #[error("session cookie '{key}' must be a string, number or boolean")]
    UnsupportedValue {
        /// The offending key (`<root>` when the document is not an object).
        key: String,
    },
}

/// Cookies parsed from a file plus warnings about skipped lines.
#[derive(Debug)]
pub struct ParseResult {
    /// Successfully parsed cookies.
    pub cookies: Vec<CookieLine>,
    /// Skipped lines as (line number, reason).
    pub warnings: Vec<(usize, String)>,
}

/// Parses a Netscape-format cookie file.
///
/// Lines starting with `#` and blank lines are skipped, except the
/// `#HttpOnly_` prefix some exporters put in front of the domain.
///
/// # Errors
///
/// Returns [`CookieError::Io`] on read failure, or
/// [`CookieError::NoCookiesFound`] when data lines exist but none parse.
/// Individual malformed lines are reported as warnings.
#[instrument(level = "debug", skip(reader))]
pub fn parse_netscape_cookies(reader: impl BufRead) -> Result<ParseResult, CookieError> {
    let mut cookies = Vec::new();
    let mut warnings = Vec::new();
    let mut data_lines = 0;

    for (idx, line_result) in reader.lines().enumerate() {
        let line_number = idx + 1;
        let raw = line_result?;
        let line = raw.trim_end();
        let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);

        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        data_lines += 1;

        match parse_cookie_line(line, line_number) {
            Ok(cookie) => {
                debug!(line = line_number, domain = %cookie.domain, name = %cookie.name, "parsed cookie");
                cookies.push(cookie);
            }
            Err(e) => {
                warn!(line = line_number, reason = %e, "skipping malformed cookie line");
                warnings.push((line_number, e.to_string()));
            }
        }
    }

    if cookies.is_empty() && data_lines > 0 {
        return Err(CookieError::NoCookiesFound {
            malformed_count: warnings.len(),
        });
    }

    Ok(ParseResult { cookies, warnings })
}

fn parse_cookie_line(line: &str, line_number: usize) -> Result<CookieLine, CookieError> {
    let invalid = |reason: String| CookieError::InvalidLine {
        line_number,
        content: redact_line_for_error(line),
        reason,
    };

    let fields: Vec<&str> = line.split('\t').collect();
    let [domain, tailmatch, path, secure, expires, name, value] = fields[..] else {
        return Err(invalid(format!(
            "expected 7 TAB-separated fields, found {}",
            fields.len()
        )));
    };

    if domain.is_empty() {
        return Err(invalid("domain field is empty".to_string()));
    }
    if name.is_empty() {
        return Err(invalid("cookie name field is empty".to_string()));
    }
    let tailmatch = parse_flag(tailmatch).ok_or_else(|| {
        invalid(format!("tailmatch field must be TRUE or FALSE, got '{tailmatch}'"))
    })?;
    let secure = parse_flag(secure)
        .ok_or_else(|| invalid(format!("secure field must be TRUE or FALSE, got '{secure}'")))?;
    let expires = expires.parse::<u64>().map_err(|_| {
        invalid(format!(
            "expires field must be a non-negative integer, got '{expires}'"
        ))
    })?;

    Ok(CookieLine {
        domain: domain.to_string(),
        tailmatch,
        path: path.to_string(),
        secure,
        expires,
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "TRUE" => Some(true),
        "FALSE" => Some(false),
        _ => None,
    }
}

/// Replaces the value field (7th) of a cookie line for safe error messages.
fn redact_line_for_error(line: &str) -> String {
    match line.rsplit_once('\t') {
        Some((head, _value)) if line.split('\t').count() >= 7 => format!("{head}\t[REDACTED]"),
        _ => line.to_string(),
    }
}
