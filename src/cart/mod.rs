//! Cart operations against the ordering site.
//!
//! This module provides [`TacoBellClient`], which holds the session cookie
//! jar and CSRF token and exposes the add-to-cart, customization and subtotal
//! endpoints.
//!
//! # Example
//!
//! ```no_run
//! use tacobell_core::{ClientConfig, Customization, TacoBellClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TacoBellClient::new(ClientConfig::default().with_store_id(4321))?;
//! let no_beef = Customization::new()
//!     .with_modification("Seasoned Beef", "MINUS")
//!     .with_sauce("Fire Sauce");
//! client.add_to_cart_customized("Beef Burrito", &no_beef).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod customize;
mod error;
mod http_client;
mod retry;

pub use client::{EMPTY_CART_TOTAL, TacoBellClient};
pub use customize::{
    CompositeOrder, Customization, CustomizationOption, CustomizationOptions, IncludeSelection,
    Modification, ModifierGroup, ModifierSelection, VariantOption, build_composite_order,
};
pub use error::CartError;
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryDecision, RetryPolicy};
