//! Login credentials, captured session cookies and CSRF token discovery.
//!
//! A session is established either from credentials or by injecting cookies
//! captured from a browser (a name/value mapping, a JSON object, or a
//! Netscape `cookies.txt` export).

mod cookies;
mod session;
mod token;

pub use cookies::{CookieError, CookieLine, ParseResult, parse_netscape_cookies};
pub use session::{Credentials, LoginStatus, SessionCookies, SessionState};
pub use token::{TOKEN_NAME, token_from_cookie_header, token_from_html};
