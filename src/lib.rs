//! Taco Bell ordering client.
//!
//! A thin async client for the site's unofficial web endpoints: log in with
//! credentials or captured cookies, look up customization options, add plain
//! or customized items to the cart and read the cart total.
//!
//! # Architecture
//!
//! - [`auth`] - credentials, captured session cookies, CSRF token discovery
//! - [`cart`] - the session-backed client and its cart operations
//! - [`catalog`] - static product name to code table
//! - [`config`] - client configuration and optional file defaults

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
mod user_agent;

// Re-export commonly used types
pub use auth::{Credentials, LoginStatus, SessionCookies, SessionState};
pub use cart::{
    CartError, Customization, CustomizationOptions, Modification, RetryDecision, RetryPolicy,
    TacoBellClient,
};
pub use catalog::{PRODUCTS, Product, product_code};
pub use config::ClientConfig;
pub use user_agent::BROWSER_USER_AGENT;
