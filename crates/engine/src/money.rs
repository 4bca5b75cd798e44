use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::{Currency, LedgerError};

/// Signed money amount represented as **integer minor units**.
///
/// Use this type for all monetary values in the ledger to avoid
/// floating-point drift. The currency is carried separately; `Money` is just
/// the magnitude.
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(20_000);
/// assert_eq!(amount.minor(), 20_000);
/// assert_eq!(amount.format(Currency::Cny), "200.00 CNY");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Converts a major-unit value (as produced by model output or a parsed
    /// numeric substring) into minor units, rounding to the currency's
    /// fraction digits.
    ///
    /// Rejects non-finite, negative, and overflowing values.
    pub fn from_major_f64(value: f64, currency: Currency) -> Result<Money, LedgerError> {
        if !value.is_finite() {
            return Err(LedgerError::InvalidAmount("amount is not finite".to_string()));
        }
        if value < 0.0 {
            return Err(LedgerError::InvalidAmount("amount must be >= 0".to_string()));
        }
        let scale = 10_i64.pow(u32::from(currency.minor_units())) as f64;
        let scaled = (value * scale).round();
        if scaled > i64::MAX as f64 {
            return Err(LedgerError::InvalidAmount("amount too large".to_string()));
        }
        Ok(Money(scaled as i64))
    }

    /// Renders the amount in major units with the currency code, e.g.
    /// `"12.50 HKD"`.
    #[must_use]
    pub fn format(self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = 10_u64.pow(u32::from(currency.minor_units()));
        let major = abs / scale;
        let frac = abs % scale;
        format!(
            "{sign}{major}.{frac:0width$} {code}",
            width = currency.minor_units() as usize,
            code = currency.code()
        )
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
