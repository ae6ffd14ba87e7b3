//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - title: Kopi Susu Gula Aren
//!     price: "25000"
//!     image: /images/kopi-susu.jpg
//!     description: Iced coffee with palm sugar
//!   - title: Teh Tarik
//!     price: "18000"
//! ```
//!
//! Every entry is validated before anything is inserted.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use tokoku_storefront::db::{CatalogStore, PgProductRepository};
use tokoku_storefront::models::NewProduct;

use super::connect;

/// Seed file layout.
#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub products: Vec<NewProduct>,
}

/// Collect a message for every invalid entry.
fn validate_seed(seed: &ProductSeed) -> Vec<String> {
    seed.products
        .iter()
        .enumerate()
        .filter_map(|(i, product)| {
            product
                .validate()
                .err()
                .map(|msg| format!("product #{} ({:?}): {msg}", i + 1, product.title))
        })
        .collect()
}

/// Insert the products listed in `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any entry is
/// invalid, or an insert fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: ProductSeed = serde_yaml::from_str(&content)?;

    info!(products = seed.products.len(), "Parsed seed file");

    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = connect().await?;
    let repo = PgProductRepository::new(&pool);

    for product in &seed.products {
        let created = repo.create(product).await?;
        info!(id = %created.id, title = %created.title, price = %created.price, "Product created");
    }

    info!("Seeding complete! {} products inserted", seed.products.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_file_parses() {
        let seed: ProductSeed = serde_yaml::from_str(
            r#"
products:
  - title: Kopi Susu
    price: "25000"
    image: /images/kopi.jpg
  - title: Teh Tarik
    price: "18000"
    description: Pulled tea
"#,
        )
        .unwrap();

        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.products[1].description.as_deref(), Some("Pulled tea"));
        assert!(validate_seed(&seed).is_empty());
    }

    #[test]
    fn test_seed_validation_reports_each_entry() {
        let seed: ProductSeed = serde_yaml::from_str(
            r#"
products:
  - title: ""
    price: "1000"
  - title: Fine
    price: "1000"
  - title: Refund
    price: "-5"
"#,
        )
        .unwrap();

        let errors = validate_seed(&seed);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("product #1"));
        assert!(errors[1].starts_with("product #3"));
    }
}
