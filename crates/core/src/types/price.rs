//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An amount, line total or order total went past [`Price::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("amount exceeds the largest supported price ({max})", max = Price::MAX)]
pub struct PriceOverflow;

/// A monetary amount in the store currency.
///
/// Amounts are kept in the currency's standard unit (rupiah, dollars), never
/// in minor units, and serialize as decimal strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount the store persists: 999999999999.99 (`NUMERIC(14, 2)`).
    pub const MAX: Self = Self(Decimal::from_parts(276_447_231, 23_283, 0, false, 2));

    /// Decimal places an amount may carry.
    pub const MAX_SCALE: u32 = 2;

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount fits the persisted range and precision.
    #[must_use]
    pub fn is_storable(&self) -> bool {
        *self <= Self::MAX && self.0.normalize().scale() <= Self::MAX_SCALE
    }

    /// `self + rhs`, or `None` past [`Self::MAX`].
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .filter(|sum| *sum <= Self::MAX)
    }

    /// `self * quantity`, or `None` past [`Self::MAX`].
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self)
            .filter(|product| *product <= Self::MAX)
    }

    /// Sum of `prices`.
    ///
    /// # Errors
    ///
    /// Returns `PriceOverflow` if any partial sum passes [`Self::MAX`].
    pub fn checked_sum<I>(prices: I) -> Result<Self, PriceOverflow>
    where
        I: IntoIterator<Item = Self>,
    {
        prices
            .into_iter()
            .try_fold(Self::ZERO, |acc, price| acc.checked_add(price).ok_or(PriceOverflow))
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Render the amount for humans in the given currency, e.g. `Rp 250.000`.
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        let rounded = self.0.round_dp(currency.decimal_places());
        let text = format!("{:.*}", currency.decimal_places() as usize, rounded.abs());
        let (whole, frac) = text.split_once('.').map_or((text.as_str(), None), |(w, f)| (w, Some(f)));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(currency.group_separator());
            }
            grouped.push(ch);
        }

        let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
        match frac {
            Some(frac) => format!(
                "{sign}{}{grouped}{}{frac}",
                currency.symbol(),
                currency.decimal_separator()
            ),
            None => format!("{sign}{}{grouped}", currency.symbol()),
        }
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// ISO 4217 currency codes supported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    IDR,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::IDR => "Rp ",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// Number of decimals shown.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::IDR => 0,
            Self::USD | Self::EUR => 2,
        }
    }

    const fn group_separator(self) -> char {
        match self {
            Self::IDR | Self::EUR => '.',
            Self::USD => ',',
        }
    }

    const fn decimal_separator(self) -> char {
        match self {
            Self::IDR | Self::EUR => ',',
            Self::USD => '.',
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IDR" => Ok(Self::IDR),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_arithmetic() {
        let line = Price::from_units(100_000).checked_mul(2).unwrap();
        let total = line.checked_add(Price::from_units(50_000)).unwrap();
        assert_eq!(total, Price::from_units(250_000));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        assert_eq!(Price::checked_sum(std::iter::empty()), Ok(Price::ZERO));
    }

    #[test]
    fn test_max_is_column_limit() {
        assert_eq!(Price::MAX.to_string(), "999999999999.99");
        assert!(Price::MAX.is_storable());
    }

    #[test]
    fn test_overflow_is_reported_not_panicked() {
        let huge = Price::new(Decimal::MAX);
        assert_eq!(huge.checked_mul(2), None);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Price::checked_sum([huge, huge]), Err(PriceOverflow));

        assert_eq!(Price::MAX.checked_add(Price::new(Decimal::new(1, 2))), None);
        assert_eq!(Price::MAX.checked_mul(1), Some(Price::MAX));
        assert_eq!(
            Price::checked_sum([Price::MAX, Price::from_units(1)]),
            Err(PriceOverflow)
        );
    }

    #[test]
    fn test_storable_range_and_precision() {
        assert!(Price::from_units(25_000).is_storable());
        assert!(Price::new(Decimal::new(1_999, 2)).is_storable());
        assert!(Price::new(Decimal::new(19_900, 3)).is_storable());
        assert!(!Price::new(Decimal::new(1_999, 3)).is_storable());
        assert!(!Price::new(Decimal::MAX).is_storable());
        assert!(!Price::from_units(1_000_000_000_000).is_storable());
    }

    #[test]
    fn test_display_rupiah() {
        assert_eq!(Price::from_units(250_000).display(CurrencyCode::IDR), "Rp 250.000");
        assert_eq!(Price::from_units(999).display(CurrencyCode::IDR), "Rp 999");
        assert_eq!(Price::ZERO.display(CurrencyCode::IDR), "Rp 0");
    }

    #[test]
    fn test_display_dollars() {
        let price = Price::new(Decimal::new(123_456_789, 2));
        assert_eq!(price.display(CurrencyCode::USD), "$1,234,567.89");
    }

    #[test]
    fn test_negative_detection() {
        assert!(Price::from_units(-1).is_negative());
        assert!(!Price::ZERO.is_negative());
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("idr".parse::<CurrencyCode>(), Ok(CurrencyCode::IDR));
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
