//! Account profile: shipping address and phone number.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tokoku_core::UserId;

/// Longest accepted address, in characters.
pub const MAX_ADDRESS_CHARS: usize = 500;

/// Stored profile details for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(skip)]
    pub user_id: UserId,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A partial profile update. Omitted fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    /// Trim the supplied fields and check them.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message for the first invalid field, or when
    /// no field is supplied.
    pub fn normalize(self) -> Result<Self, String> {
        if self.address.is_none() && self.phone.is_none() {
            return Err("supply an address or a phone number".to_string());
        }

        let address = self.address.map(|a| a.trim().to_string());
        if let Some(address) = &address {
            if address.is_empty() {
                return Err("address cannot be blank".to_string());
            }
            if address.chars().count() > MAX_ADDRESS_CHARS {
                return Err(format!(
                    "address cannot be longer than {MAX_ADDRESS_CHARS} characters"
                ));
            }
        }

        let phone = self.phone.map(|p| p.trim().to_string());
        if let Some(phone) = &phone {
            validate_phone(phone)?;
        }

        Ok(Self { address, phone })
    }
}

/// Digits with optional `+`, spaces, dashes and parentheses; 6 to 15 digits.
fn validate_phone(phone: &str) -> Result<(), String> {
    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')');
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    if !phone.chars().all(allowed) || !(6..=15).contains(&digits) {
        return Err("phone number must contain 6 to 15 digits".to_string());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_fields() {
        let update: ProfileUpdate = serde_json::from_str(
            r#"{"address":"  Jl. Merdeka 1, Bandung ","phone":" 0812-3456-789 "}"#,
        )
        .unwrap();
        let update = update.normalize().unwrap();
        assert_eq!(update.address.as_deref(), Some("Jl. Merdeka 1, Bandung"));
        assert_eq!(update.phone.as_deref(), Some("0812-3456-789"));
    }

    #[test]
    fn test_partial_update_is_allowed() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"phone":"+62 812 345"}"#).unwrap();
        let update = update.normalize().unwrap();
        assert!(update.address.is_none());
        assert_eq!(update.phone.as_deref(), Some("+62 812 345"));
    }

    #[test]
    fn test_invalid_updates() {
        assert!(ProfileUpdate::default().normalize().is_err());

        let blank = ProfileUpdate {
            address: Some("   ".to_string()),
            phone: None,
        };
        assert_eq!(blank.normalize(), Err("address cannot be blank".to_string()));

        for phone in ["12345", "0812abc999", "1234567890123456"] {
            let update = ProfileUpdate {
                address: None,
                phone: Some(phone.to_string()),
            };
            assert!(update.normalize().is_err(), "{phone}");
        }
    }
}
