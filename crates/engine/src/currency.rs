use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Currency of a recorded expense.
///
/// The ledger serves a family split between the Mainland and Hong Kong, with
/// the occasional on-chain payment, so the three currencies are modeled
/// explicitly instead of as free-form strings.
///
/// ## Minor units
///
/// Monetary values are stored as an `i64` number of **minor units** (see
/// `Money`). `minor_units()` returns how many decimal digits are used when
/// converting between:
/// - major units (human input/output, e.g. `10.50 HKD`)
/// - minor units (stored integers, e.g. `1050`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Cny,
    Hkd,
    Usdt,
}

impl Currency {
    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Cny => "CNY",
            Currency::Hkd => "HKD",
            Currency::Usdt => "USDT",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u8 {
        match self {
            Currency::Cny | Currency::Hkd | Currency::Usdt => 2,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CNY" => Ok(Currency::Cny),
            "HKD" => Ok(Currency::Hkd),
            "USDT" => Ok(Currency::Usdt),
            other => Err(LedgerError::UnknownCurrency(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!(Currency::try_from("cny").unwrap(), Currency::Cny);
        assert_eq!(Currency::try_from(" HKD ").unwrap(), Currency::Hkd);
        assert_eq!(Currency::try_from("usdt").unwrap(), Currency::Usdt);
        assert!(Currency::try_from("EUR").is_err());
    }
}
