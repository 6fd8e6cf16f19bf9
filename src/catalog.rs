//! Static product catalog.
//!
//! The ordering site identifies menu items by an integer product code. The
//! catalog maps the names shown on the menu to those codes.

/// A menu item known to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    /// Name as shown on the menu.
    pub name: &'static str,
    /// Site product code (`productCodePost`).
    pub code: u32,
}

/// Every product the client can add to a cart.
pub const PRODUCTS: &[Product] = &[
    Product {
        name: "Loaded Nacho Taco",
        code: 24537,
    },
    Product {
        name: "Chicken Chipotle Melt",
        code: 28158,
    },
    Product {
        name: "Beef Burrito",
        code: 23149,
    },
    Product {
        name: "Cheesy Bean and Rice Burrito",
        code: 22283,
    },
    Product {
        name: "Cheesy Roll Up",
        code: 22152,
    },
    Product {
        name: "Chips and Nacho Cheese Sauce",
        code: 22500,
    },
    Product {
        name: "Cinnamon Twists",
        code: 22525,
    },
];

/// Looks up the product code for a menu name.
///
/// Matching is exact, including case.
#[must_use]
pub fn product_code(name: &str) -> Option<u32> {
    PRODUCTS
        .iter()
        .find(|product| product.name == name)
        .map(|product| product.code)
}

/// Looks up the menu name for a product code.
#[must_use]
pub fn product_name(code: u32) -> Option<&'static str> {
    PRODUCTS
        .iter()
        .find(|product| product.code == code)
        .map(|product| product.name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_product_code_cheesy_roll_up() {
        assert_eq!(product_code("Cheesy Roll Up"), Some(22152));
    }

    #[test]
    fn test_product_code_every_entry_resolves() {
        for product in PRODUCTS {
            assert_eq!(product_code(product.name), Some(product.code));
            assert_eq!(product_name(product.code), Some(product.name));
        }
    }

    #[test]
    fn test_product_code_unknown_name() {
        assert_eq!(product_code("Crunchwrap Supreme"), None);
    }

    #[test]
    fn test_product_code_is_case_sensitive() {
        assert_eq!(product_code("cheesy roll up"), None);
    }

    #[test]
    fn test_catalog_has_seven_unique_codes() {
        assert_eq!(PRODUCTS.len(), 7);
        let codes: HashSet<u32> = PRODUCTS.iter().map(|p| p.code).collect();
        assert_eq!(codes.len(), PRODUCTS.len(), "codes must be unique");
    }
}
