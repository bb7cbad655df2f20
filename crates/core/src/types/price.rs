//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (dinars, not centimes).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, e.g. `4500 DA`, `120.50 DH` or `€45.50`.
    ///
    /// Whole amounts drop their decimals; anything else shows two places.
    #[must_use]
    pub fn display(&self) -> String {
        let amount = format_amount(self.amount);
        if self.currency_code.symbol_after() {
            format!("{amount} {}", self.currency_code.symbol())
        } else {
            format!("{}{amount}", self.currency_code.symbol())
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    if rounded.fract().is_zero() {
        rounded.normalize().to_string()
    } else {
        format!("{rounded:.2}")
    }
}

/// ISO 4217 currency codes the storefront can price in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Algerian dinar.
    #[default]
    DZD,
    /// Moroccan dirham.
    MAD,
    EUR,
    USD,
}

impl CurrencyCode {
    /// Every supported currency.
    pub const ALL: [Self; 4] = [Self::DZD, Self::MAD, Self::EUR, Self::USD];

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::DZD => "DA",
            Self::MAD => "DH",
            Self::EUR => "€",
            Self::USD => "$",
        }
    }

    /// ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DZD => "DZD",
            Self::MAD => "MAD",
            Self::EUR => "EUR",
            Self::USD => "USD",
        }
    }

    const fn symbol_after(self) -> bool {
        matches!(self, Self::DZD | Self::MAD)
    }
}

/// Error returned when a currency code is not supported.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct UnknownCurrency(pub String);

impl FromStr for CurrencyCode {
    type Err = UnknownCurrency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| UnknownCurrency(code.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_whole_amount_with_suffix_symbol() {
        let price = Price::new(Decimal::new(450_000, 2), CurrencyCode::DZD);
        assert_eq!(price.display(), "4500 DA");
    }

    #[test]
    fn test_display_fractional_amount() {
        let price = Price::new(Decimal::new(1205, 1), CurrencyCode::MAD);
        assert_eq!(price.display(), "120.50 DH");

        let price = Price::new(Decimal::new(4550, 2), CurrencyCode::EUR);
        assert_eq!(price.to_string(), "€45.50");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("dzd".parse::<CurrencyCode>().unwrap(), CurrencyCode::DZD);
        assert_eq!(" usd ".parse::<CurrencyCode>().unwrap(), CurrencyCode::USD);
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_currency_code_round_trips_through_from_str() {
        assert_eq!(CurrencyCode::default().code(), "DZD");
        for currency in CurrencyCode::ALL {
            assert_eq!(currency.code().parse::<CurrencyCode>().unwrap(), currency);
        }
    }
}
