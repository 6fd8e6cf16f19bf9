#![allow(dead_code)]

pub mod socket_guard;

use std::time::Duration;

use tacobell_core::{ClientConfig, RetryPolicy, SessionCookies, TacoBellClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "tok-7f3a";

/// Config pointed at the mock site with millisecond retry delays.
pub fn mock_config(server: &MockServer) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(server.uri())
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5))
        .with_retry_policy(RetryPolicy::default().with_base_delay(Duration::from_millis(10)))
}

/// Serves the login page with no cookies; enough for `login_config` refreshes.
pub async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Sign in</html>"))
        .mount(server)
        .await;
}

/// A client with an injected session carrying [`TOKEN`].
pub async fn session_client(server: &MockServer) -> TacoBellClient {
    session_client_with(server, mock_config(server)).await
}

pub async fn session_client_with(server: &MockServer, config: ClientConfig) -> TacoBellClient {
    mount_login_page(server).await;
    let session: SessionCookies = [("CSRFToken", TOKEN), ("JSESSIONID", "sess-1")]
        .into_iter()
        .collect();
    let mut client = TacoBellClient::new(config).unwrap();
    client.login_config(&session).await.unwrap();
    client
}
