//! Session-backed client for the ordering site.
//!
//! [`TacoBellClient`] owns one cookie jar and one cached CSRF token. Login
//! populates both; cart calls read them.

use std::fmt;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::SET_COOKIE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;
use url::form_urlencoded;

use super::customize::{Customization, CustomizationOptions, build_composite_order};
use super::error::CartError;
use super::http_client::{build_site_client, json_token_headers};
use super::retry::{RetryDecision, RetryPolicy};
use crate::auth::{
    Credentials, LoginStatus, SessionCookies, SessionState, TOKEN_NAME, token_from_cookie_header,
    token_from_html,
};
use crate::catalog::product_code;
use crate::config::ClientConfig;

const LOGIN_PATH: &str = "login";
const AUTH_PATH: &str = "j_spring_security_check";
const CART_ADD_PATH: &str = "cart/add";
const CART_ADD_COMPOSITE_PATH: &str = "cart/add-composite";
const CART_SUBTOTAL_PATH: &str = "cart/miniCart/SUBTOTAL";

/// Price reported when the cart summary carries no `miniCartPrice`.
pub const EMPTY_CART_TOTAL: &str = "$0.00";

#[derive(Debug, Deserialize)]
struct MiniCart {
    #[serde(rename = "miniCartPrice")]
    price: Option<String>,
}

/// Client for the site's cart endpoints.
///
/// # Example
///
/// ```no_run
/// use tacobell_core::{ClientConfig, Credentials, TacoBellClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let creds = Credentials::new("me@example.com", "secret");
/// let client = TacoBellClient::connect(ClientConfig::default(), &creds, None).await?;
/// client.add_to_cart("Cheesy Roll Up").await?;
/// println!("total: {}", client.cart_total().await?);
/// # Ok(())
/// # }
/// ```
pub struct TacoBellClient {
    http: Client,
    jar: Arc<Jar>,
    base_url: Url,
    config: ClientConfig,
    token: Option<String>,
    state: SessionState,
}

impl fmt::Debug for TacoBellClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TacoBellClient")
            .field("base_url", &self.base_url.as_str())
            .field("state", &self.state)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl TacoBellClient {
    /// Builds an anonymous client without touching the network.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidUrl`] when `config.base_url` is not an
    /// absolute http(s) URL, or [`CartError::ClientBuild`] when the HTTP client
    /// cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, CartError> {
        let base_url = parse_base_url(&config.base_url)?;
        let jar = Arc::new(Jar::default());
        let http = build_site_client(&config, &base_url, Arc::clone(&jar))?;
        debug!(base_url = %base_url, "created site client");
        Ok(Self {
            http,
            jar,
            base_url,
            config,
            token: None,
            state: SessionState::Anonymous,
        })
    }

    /// Builds a client and establishes a session.
    ///
    /// With `session` the captured cookies are injected via
    /// [`login_config`](Self::login_config); otherwise the credentials are
    /// submitted via [`login`](Self::login). A rejected login is logged and
    /// the anonymous client is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] for construction or transport failures.
    #[instrument(skip(config, credentials, session), fields(username = credentials.username()))]
    pub async fn connect(
        config: ClientConfig,
        credentials: &Credentials,
        session: Option<&SessionCookies>,
    ) -> Result<Self, CartError> {
        let mut client = Self::new(config)?;
        match session {
            Some(cookies) => client.login_config(cookies).await?,
            None => {
                client.login(credentials).await?;
            }
        }
        Ok(client)
    }

    /// Logs in with a username and password.
    ///
    /// Fetches the login page to seed cookies and the CSRF token, then posts
    /// the credentials as a form.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] only for transport failures; a rejected login is
    /// reported as [`LoginStatus::Rejected`].
    #[instrument(skip(self, credentials), fields(username = credentials.username()))]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<LoginStatus, CartError> {
        let login_url = self.endpoint(LOGIN_PATH)?;
        let response = self.send(self.http.get(login_url.clone()), &login_url).await?;
        let from_set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(token_from_cookie_header);
        let page = response
            .text()
            .await
            .map_err(|e| CartError::from_transport(login_url.as_str(), e))?;

        let token = from_set_cookie
            .or_else(|| {
                self.cookie_header()
                    .as_deref()
                    .and_then(token_from_cookie_header)
            })
            .or_else(|| token_from_html(&page));
        if token.is_none() {
            warn!("login page issued no CSRF token; submitting credentials without one");
        }
        self.token = token;

        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("j_username", credentials.username())
            .append_pair("j_password", credentials.password());
        if let Some(token) = self.token.as_deref() {
            form.append_pair(TOKEN_NAME, token);
        }

        let auth_url = self.endpoint(AUTH_PATH)?;
        let response = self
            .send(self.http.post(auth_url.clone()).body(form.finish()), &auth_url)
            .await?;
        let status = response.status();
        if status == StatusCode::OK {
            self.state = SessionState::Authenticated;
            info!("logged in");
            Ok(LoginStatus::Authenticated)
        } else {
            warn!(status = status.as_u16(), "unable to login");
            Ok(LoginStatus::Rejected {
                status: status.as_u16(),
            })
        }
    }

    /// Restores a session from captured cookies instead of credentials.
    ///
    /// Every entry is added to the jar and the `CSRFToken` entry becomes the
    /// cached token. The login page is fetched once afterwards to refresh
    /// auxiliary cookies.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidCookie`] without touching the jar when an
    /// entry cannot be stored unchanged, or a transport error from the refresh.
    #[instrument(skip(self, session), fields(cookies = session.len()))]
    pub async fn login_config(&mut self, session: &SessionCookies) -> Result<(), CartError> {
        let cookies = session
            .iter()
            .map(|(name, value)| session_cookie_str(name, value))
            .collect::<Result<Vec<_>, _>>()?;
        for cookie in &cookies {
            self.jar.add_cookie_str(cookie, &self.base_url);
        }
        self.token = session.token().map(str::to_string);
        if self.token.is_none() {
            warn!("captured session has no {TOKEN_NAME} entry; cart calls will fail");
        }

        let login_url = self.endpoint(LOGIN_PATH)?;
        let response = self.send(self.http.get(login_url.clone()), &login_url).await?;
        debug!(status = response.status().as_u16(), "refreshed session cookies");

        self.state = SessionState::CookieInjected;
        info!("session restored from captured cookies");
        Ok(())
    }

    /// The cached CSRF token.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// How the current session was established.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.state
    }

    /// Whether a session has been established by either login path.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state != SessionState::Anonymous
    }

    /// The `Cookie` header the jar would send to the base URL.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.jar
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Adds one unmodified item to the cart.
    ///
    /// A 403 is retried per the configured [`RetryPolicy`]. Returns
    /// `Ok(false)` when every attempt was rejected with 403.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownProduct`] before any request for names not
    /// in the catalog, [`CartError::MissingToken`] without a session token, or
    /// a transport error.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_name: &str) -> Result<bool, CartError> {
        self.add_plain(product_name, &self.config.retry_policy, "add_to_cart")
            .await
    }

    /// Same as [`add_to_cart`](Self::add_to_cart) with a single attempt.
    ///
    /// # Errors
    ///
    /// See [`add_to_cart`](Self::add_to_cart).
    #[instrument(skip(self))]
    pub async fn add_to_cart_without_retry(&self, product_name: &str) -> Result<bool, CartError> {
        self.add_plain(
            product_name,
            &RetryPolicy::single_attempt(),
            "add_to_cart_without_retry",
        )
        .await
    }

    async fn add_plain(
        &self,
        product_name: &str,
        policy: &RetryPolicy,
        operation: &'static str,
    ) -> Result<bool, CartError> {
        let code = lookup_product(product_name)?;
        let token = self.require_token(operation)?;

        let endpoint = self.endpoint(CART_ADD_PATH)?;
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("productCodePost", &code.to_string())
            .append_pair(TOKEN_NAME, token);

        let mut attempt = 1;
        loop {
            let response = self.send(self.http.post(url.clone()), &endpoint).await?;
            let status = response.status();
            if status != StatusCode::FORBIDDEN {
                if status.is_success() {
                    info!(product = product_name, code, attempt, "added to cart");
                } else {
                    warn!(
                        product = product_name,
                        code,
                        status = status.as_u16(),
                        "unexpected status from cart/add; treating as added"
                    );
                }
                return Ok(true);
            }

            match policy.should_retry(attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        product = product_name,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "cart/add rejected with 403; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(product = product_name, attempt, %reason, "cart/add rejected with 403");
                    return Ok(false);
                }
            }
        }
    }

    /// Adds a customized item via the composite endpoint.
    ///
    /// Options are looked up fresh, scoped to the configured store. Returns
    /// `Ok(false)` on 403; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownProduct`], [`CartError::MissingToken`],
    /// [`CartError::CustomizationsUnavailable`] when the overlay lookup does
    /// not succeed, [`CartError::InvalidOptionCode`], or a transport error.
    #[instrument(skip(self, customization), fields(quantity = customization.quantity))]
    pub async fn add_to_cart_customized(
        &self,
        product_name: &str,
        customization: &Customization,
    ) -> Result<bool, CartError> {
        let code = lookup_product(product_name)?;
        let token = self.require_token("add_to_cart_customized")?;

        let options = self
            .get_customizations(code, self.config.store_id)
            .await?
            .ok_or(CartError::CustomizationsUnavailable { product_code: code })?;
        let order = build_composite_order(code, customization, &options)?;

        let url = self.endpoint(CART_ADD_COMPOSITE_PATH)?;
        let request = self
            .http
            .post(url.clone())
            .headers(json_token_headers(token)?)
            .json(&order);
        let status = self.send(request, &url).await?.status();
        if status == StatusCode::FORBIDDEN {
            warn!(product = product_name, code, "cart/add-composite rejected with 403");
            return Ok(false);
        }
        if !status.is_success() {
            warn!(
                product = product_name,
                code,
                status = status.as_u16(),
                "unexpected status from cart/add-composite; treating as added"
            );
        }
        info!(product = product_name, code, "added customized item to cart");
        Ok(true)
    }

    /// Reads the cart subtotal, e.g. `"$4.29"`.
    ///
    /// Returns [`EMPTY_CART_TOTAL`] when the summary has no price.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Decode`] when the body is not JSON, or a transport error.
    #[instrument(skip(self))]
    pub async fn cart_total(&self) -> Result<String, CartError> {
        let url = self.endpoint(CART_SUBTOTAL_PATH)?;
        let body = self.get_text(&url).await?;
        let summary: MiniCart =
            serde_json::from_str(&body).map_err(|e| CartError::decode(url.as_str(), e))?;
        Ok(summary
            .price
            .unwrap_or_else(|| EMPTY_CART_TOTAL.to_string()))
    }

    /// Fetches the customization overlay for a product code.
    ///
    /// Returns `Ok(None)` for any non-200 status.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Decode`] when a 200 body is not the expected JSON,
    /// or a transport error.
    #[instrument(skip(self))]
    pub async fn get_customizations(
        &self,
        product_code: u32,
        store_id: Option<u32>,
    ) -> Result<Option<CustomizationOptions>, CartError> {
        let mut url = self.endpoint(&format!("p/{product_code}/customizationOverlay"))?;
        if let Some(store) = store_id {
            url.query_pairs_mut().append_pair("store", &store.to_string());
        }

        let response = self.send(self.http.get(url.clone()), &url).await?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "no customization overlay");
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .map_err(|e| CartError::from_transport(url.as_str(), e))?;
        let options: CustomizationOptions =
            serde_json::from_str(&body).map_err(|e| CartError::decode(url.as_str(), e))?;
        debug!(
            includes = options.includes.len(),
            sauces = options.sauces.len(),
            addons = options.addons.len(),
            "fetched customization overlay"
        );
        Ok(Some(options))
    }

    /// Catalog lookup followed by [`get_customizations`](Self::get_customizations).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownProduct`] for names not in the catalog, or
    /// any error from `get_customizations`.
    pub async fn get_customizations_by_name(
        &self,
        product_name: &str,
        store_id: Option<u32>,
    ) -> Result<Option<CustomizationOptions>, CartError> {
        let code = lookup_product(product_name)?;
        self.get_customizations(code, store_id).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, CartError> {
        self.base_url
            .join(path)
            .map_err(|_| CartError::invalid_url(format!("{}{path}", self.base_url)))
    }

    fn require_token(&self, operation: &'static str) -> Result<&str, CartError> {
        self.token
            .as_deref()
            .ok_or_else(|| CartError::missing_token(operation))
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, CartError> {
        request
            .send()
            .await
            .map_err(|e| CartError::from_transport(url.as_str(), e))
    }

    async fn get_text(&self, url: &Url) -> Result<String, CartError> {
        self.send(self.http.get(url.clone()), url)
            .await?
            .text()
            .await
            .map_err(|e| CartError::from_transport(url.as_str(), e))
    }
}

fn lookup_product(product_name: &str) -> Result<u32, CartError> {
    product_code(product_name).ok_or_else(|| {
        warn!(product = product_name, "unknown product");
        CartError::unknown_product(product_name)
    })
}

/// Formats a captured cookie for the jar, rejecting entries the jar would
/// split or trim.
fn session_cookie_str(name: &str, value: &str) -> Result<String, CartError> {
    if name.is_empty() {
        return Err(CartError::invalid_cookie(name, "name is empty"));
    }
    if name.contains(['=', ';']) {
        return Err(CartError::invalid_cookie(name, "name contains '=' or ';'"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CartError::invalid_cookie(
            name,
            "name contains whitespace or control characters",
        ));
    }
    if value.contains(';') {
        return Err(CartError::invalid_cookie(name, "value contains ';'"));
    }
    if value.chars().any(char::is_control) {
        return Err(CartError::invalid_cookie(
            name,
            "value contains control characters",
        ));
    }
    if value.trim() != value {
        return Err(CartError::invalid_cookie(
            name,
            "value has leading or trailing whitespace",
        ));
    }
    Ok(format!("{name}={value}; Path=/"))
}

/// Parses the base URL, ensuring a trailing slash so endpoint joins append.
fn parse_base_url(raw: &str) -> Result<Url, CartError> {
    let mut url = Url::parse(raw.trim()).map_err(|_| CartError::invalid_url(raw))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(CartError::invalid_url(raw));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
