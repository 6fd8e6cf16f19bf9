//! Customization overlay types and composite order payloads.
//!
//! The site describes each product's options in three groups: `includes`
//! (components that come with the item and can be swapped, e.g. "no beef"),
//! and `sauces` / `addons` (extras that can be added). A customized add posts
//! a composite order naming the chosen variant codes.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::CartError;

/// Options returned by `p/<code>/customizationOverlay`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomizationOptions {
    /// Components included with the product.
    #[serde(default)]
    pub includes: Vec<CustomizationOption>,
    /// Sauces that can be added.
    #[serde(default)]
    pub sauces: Vec<CustomizationOption>,
    /// Other extras that can be added.
    #[serde(default)]
    pub addons: Vec<CustomizationOption>,
}

/// One component, sauce or addon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationOption {
    /// Display name (e.g. "Seasoned Beef").
    #[serde(default)]
    pub name: Option<String>,
    /// Selectable variants of this option.
    #[serde(default)]
    pub variant_options: Vec<VariantOption>,
}

/// A selectable variant with the code the cart endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOption {
    /// Variant code; the site sends either a string or a number.
    #[serde(deserialize_with = "code_from_string_or_number")]
    pub code: String,
    /// Modifier kind for included components (e.g. `MINUS`, `EXTRA`, `LIGHT`).
    #[serde(default)]
    pub modifier_type: Option<String>,
}

fn code_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCode {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawCode::deserialize(deserializer)? {
        RawCode::Text(text) => text,
        RawCode::Number(number) => number.to_string(),
    })
}

/// A requested change to an included component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    /// Component name as shown in `includes`.
    pub component: String,
    /// Variant modifier type to select (e.g. `MINUS`).
    pub modifier_type: String,
}

impl Modification {
    /// Creates a modification.
    #[must_use]
    pub fn new(component: impl Into<String>, modifier_type: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            modifier_type: modifier_type.into(),
        }
    }
}

/// Quantity and option choices for a customized add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customization {
    /// Number of items.
    pub quantity: u32,
    /// Changes to included components.
    pub modify: Vec<Modification>,
    /// Sauce names to add.
    pub sauces: Vec<String>,
    /// Addon names to add.
    pub addons: Vec<String>,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            quantity: 1,
            modify: Vec::new(),
            sauces: Vec::new(),
            addons: Vec::new(),
        }
    }
}

impl Customization {
    /// A single unmodified item.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Adds a change to an included component.
    #[must_use]
    pub fn with_modification(
        mut self,
        component: impl Into<String>,
        modifier_type: impl Into<String>,
    ) -> Self {
        self.modify.push(Modification::new(component, modifier_type));
        self
    }

    /// Adds a sauce by name.
    #[must_use]
    pub fn with_sauce(mut self, name: impl Into<String>) -> Self {
        self.sauces.push(name.into());
        self
    }

    /// Adds an addon by name.
    #[must_use]
    pub fn with_addon(mut self, name: impl Into<String>) -> Self {
        self.addons.push(name.into());
        self
    }
}

/// Body of `cart/add-composite`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeOrder {
    /// Product code as a string.
    pub base_product: String,
    /// Same as `base_product`.
    pub code: String,
    /// Quantity as a string.
    pub qty: String,
    /// Substitutions of included components.
    pub include_product: Vec<IncludeSelection>,
    /// Added sauces and addons.
    pub modifier_product: Vec<ModifierSelection>,
}

/// A substitution entry in `includeProduct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeSelection {
    /// Variant code as returned by the overlay.
    pub code: String,
    /// Always `included`.
    pub group: &'static str,
    /// Always 1.
    pub qty: u32,
}

/// Group of an additive modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierGroup {
    /// From the `sauces` list.
    Sauces,
    /// From the `addons` list.
    Addons,
}

/// An additive entry in `modifierProduct`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifierSelection {
    /// Numeric variant code.
    pub code: u64,
    /// Source group.
    pub group: ModifierGroup,
    /// Always 1.
    pub qty: u32,
}

/// Builds the composite order for `product_code` from the requested choices.
///
/// Requested names with no match in `options` are logged and skipped.
///
/// # Errors
///
/// Returns [`CartError::InvalidOptionCode`] when a matched sauce or addon has
/// a variant code that is not an unsigned integer.
pub fn build_composite_order(
    product_code: u32,
    customization: &Customization,
    options: &CustomizationOptions,
) -> Result<CompositeOrder, CartError> {
    let include_product = included_changes(&customization.modify, &options.includes);
    let mut modifier_product =
        modifiers(&customization.sauces, &options.sauces, ModifierGroup::Sauces)?;
    modifier_product.extend(modifiers(
        &customization.addons,
        &options.addons,
        ModifierGroup::Addons,
    )?);

    debug!(
        product_code,
        quantity = customization.quantity,
        includes = include_product.len(),
        modifiers = modifier_product.len(),
        "built composite order"
    );

    Ok(CompositeOrder {
        base_product: product_code.to_string(),
        code: product_code.to_string(),
        qty: customization.quantity.to_string(),
        include_product,
        modifier_product,
    })
}

fn included_changes(
    requested: &[Modification],
    includes: &[CustomizationOption],
) -> Vec<IncludeSelection> {
    let mut changes = Vec::new();
    for modification in requested {
        let before = changes.len();
        for included in includes
            .iter()
            .filter(|opt| opt.name.as_deref() == Some(modification.component.as_str()))
        {
            changes.extend(
                included
                    .variant_options
                    .iter()
                    .filter(|v| v.modifier_type.as_deref() == Some(&*modification.modifier_type))
                    .map(|v| IncludeSelection {
                        code: v.code.clone(),
                        group: "included",
                        qty: 1,
                    }),
            );
        }
        if changes.len() == before {
            warn!(
                component = %modification.component,
                modifier_type = %modification.modifier_type,
                "requested modification not offered for this product"
            );
        }
    }
    changes
}

fn modifiers(
    requested: &[String],
    available: &[CustomizationOption],
    group: ModifierGroup,
) -> Result<Vec<ModifierSelection>, CartError> {
    let mut selections = Vec::new();
    for option in available {
        let Some(name) = option.name.as_deref() else {
            continue;
        };
        if !requested.iter().any(|r| r == name) {
            continue;
        }
        let Some(variant) = option.variant_options.first() else {
            warn!(option = name, ?group, "option has no variants; skipping");
            continue;
        };
        let code = variant
            .code
            .trim()
            .parse::<u64>()
            .map_err(|_| CartError::invalid_option_code(name, &variant.code))?;
        selections.push(ModifierSelection {
            code,
            group,
            qty: 1,
        });
    }

    for name in requested {
        if !available.iter().any(|o| o.name.as_deref() == Some(name.as_str())) {
            warn!(option = %name, ?group, "requested option not offered for this product");
        }
    }
    Ok(selections)
}
