//! Catalog product types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tokoku_core::{Price, ProductId};

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub image: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewProduct {
    /// Check the fields an admin must supply.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        if self.price.is_negative() {
            return Err("price cannot be negative".to_string());
        }
        if self.price > Price::MAX {
            return Err(format!("price cannot exceed {}", Price::MAX));
        }
        if !self.price.is_storable() {
            return Err(format!(
                "price can have at most {} decimal places",
                Price::MAX_SCALE
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_validation() {
        let mut product: NewProduct =
            serde_json::from_str(r#"{"title":"Kopi Susu","price":25000}"#).unwrap();
        assert!(product.validate().is_ok());

        product.title = "   ".to_string();
        assert!(product.validate().is_err());

        product.title = "Kopi".to_string();
        product.price = Price::from_units(-1);
        assert_eq!(product.validate(), Err("price cannot be negative".to_string()));
    }

    #[test]
    fn test_price_must_fit_storage() {
        let mut product: NewProduct =
            serde_json::from_str(r#"{"title":"Emas","price":"999999999999.99"}"#).unwrap();
        assert!(product.validate().is_ok());

        product.price = Price::new(rust_decimal::Decimal::MAX);
        assert_eq!(
            product.validate(),
            Err("price cannot exceed 999999999999.99".to_string())
        );

        product.price = Price::from_units(1_000_000_000_000);
        assert!(product.validate().is_err());

        product.price = Price::new(rust_decimal::Decimal::new(12_345, 3));
        assert_eq!(
            product.validate(),
            Err("price can have at most 2 decimal places".to_string())
        );

        product.price = Price::new(rust_decimal::Decimal::new(12_340, 3));
        assert!(product.validate().is_ok());
    }
}
