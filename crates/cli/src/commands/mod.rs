//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod orders;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use tokoku_storefront::db;

/// Errors shared by every command that needs the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect to the storefront database.
///
/// Reads `STOREFRONT_DATABASE_URL`, falling back to `DATABASE_URL`, after
/// loading `.env` if present.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = database_url(|key| std::env::var(key).ok())?;
    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&database_url).await?)
}

fn database_url(var: impl Fn(&str) -> Option<String>) -> Result<SecretString, ConnectError> {
    var("STOREFRONT_DATABASE_URL")
        .or_else(|| var("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or(ConnectError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_storefront_url_wins() {
        let url = database_url(env(&[
            ("DATABASE_URL", "postgres://generic"),
            ("STOREFRONT_DATABASE_URL", "postgres://storefront"),
        ]));
        assert_eq!(
            url.map(|u| u.expose_secret().to_string()).ok().as_deref(),
            Some("postgres://storefront")
        );
    }

    #[test]
    fn test_falls_back_to_database_url() {
        let url = database_url(env(&[("DATABASE_URL", "postgres://generic")]));
        assert_eq!(
            url.map(|u| u.expose_secret().to_string()).ok().as_deref(),
            Some("postgres://generic")
        );
    }

    #[test]
    fn test_missing_url_names_the_variable() {
        let err = database_url(env(&[])).map(|_| ()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variable: STOREFRONT_DATABASE_URL"
        );
    }
}
