//! CSRF token discovery.
//!
//! The site issues its anti-forgery token as a `CSRFToken` cookie on the
//! login page and also embeds it in the page markup. Cart mutations must echo
//! it back as a query parameter or header.

use std::sync::LazyLock;

use regex::Regex;

/// Cookie, form field and header name of the token.
pub const TOKEN_NAME: &str = "CSRFToken";

/// `ACC.config.CSRFToken = "..."` in the storefront bootstrap script.
#[allow(clippy::expect_used)]
static SCRIPT_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"CSRFToken\s*=\s*["']([^"']+)["']"#).expect("script token regex is valid")
});

/// Hidden `<input name="CSRFToken" value="...">` in login and cart forms.
#[allow(clippy::expect_used)]
static INPUT_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name=["']CSRFToken["'][^>]*?value=["']([^"']+)["']"#)
        .expect("input token regex is valid")
});

/// Finds the token in a `Cookie` request header value (`a=b; CSRFToken=c`).
#[must_use]
pub fn token_from_cookie_header(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_NAME)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// Finds the token embedded in login page HTML.
#[must_use]
pub fn token_from_html(html: &str) -> Option<String> {
    [&*SCRIPT_TOKEN_PATTERN, &*INPUT_TOKEN_PATTERN]
        .into_iter()
        .find_map(|pattern| pattern.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_cookie_header_finds_token() {
        let header = "JSESSIONID=abc; CSRFToken=tok-123; anonymous-consents=%5B%5D";
        assert_eq!(token_from_cookie_header(header).as_deref(), Some("tok-123"));
    }

    #[test]
    fn test_token_from_cookie_header_absent_or_empty() {
        assert_eq!(token_from_cookie_header("JSESSIONID=abc"), None);
        assert_eq!(token_from_cookie_header("CSRFToken="), None);
        assert_eq!(token_from_cookie_header(""), None);
    }

    #[test]
    fn test_token_from_cookie_header_requires_exact_name() {
        assert_eq!(token_from_cookie_header("XCSRFToken=nope"), None);
    }

    #[test]
    fn test_token_from_html_script_config() {
        let html = r#"<script>ACC.config.CSRFToken = "d2a0c3f1-77";</script>"#;
        assert_eq!(token_from_html(html).as_deref(), Some("d2a0c3f1-77"));
    }

    #[test]
    fn test_token_from_html_hidden_input() {
        let html = r#"<form><input type="hidden" name="CSRFToken" value="form-tok" /></form>"#;
        assert_eq!(token_from_html(html).as_deref(), Some("form-tok"));
    }

    #[test]
    fn test_token_from_html_missing() {
        assert_eq!(token_from_html("<html><body>Sign in</body></html>"), None);
    }
}
