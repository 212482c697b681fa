// ============================================================================
// STELLAR-PAYMENTS - Amounts
// ============================================================================
// Stellar amounts are int64 stroops on the wire, decimal strings with up to
// seven fractional digits everywhere else.
// ============================================================================

use crate::error::PaymentError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stroops per whole unit
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

const DECIMALS: usize = 7;

/// A non-negative amount in stroops. Serializes as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(i64);

impl Amount {
    /// Largest representable amount ("922337203685.4775807")
    pub const MAX: Amount = Amount(i64::MAX);

    pub fn from_stroops(stroops: i64) -> Result<Self> {
        if stroops < 0 {
            return Err(PaymentError::InvalidAmount(format!("negative stroops: {}", stroops)));
        }
        Ok(Amount(stroops))
    }

    pub fn stroops(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiply by an integer factor, failing on overflow
    pub fn checked_mul(&self, factor: i64) -> Result<Self> {
        self.0
            .checked_mul(factor)
            .filter(|v| *v >= 0)
            .map(Amount)
            .ok_or_else(|| PaymentError::InvalidAmount(format!("{} × {} overflows", self, factor)))
    }
}

impl FromStr for Amount {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PaymentError::InvalidAmount(s.to_string());
        let trimmed = s.trim();

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > DECIMALS {
            return Err(PaymentError::InvalidAmount(format!(
                "{} has more than {} decimal places",
                s, DECIMALS
            )));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };

        let mut padded = fraction.to_string();
        padded.extend(std::iter::repeat('0').take(DECIMALS - fraction.len()));
        let fraction_value: i64 = padded.parse().map_err(|_| invalid())?;

        whole_value
            .checked_mul(STROOPS_PER_UNIT)
            .and_then(|v| v.checked_add(fraction_value))
            .map(Amount)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Amount {
    type Error = PaymentError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / STROOPS_PER_UNIT;
        let fraction = self.0 % STROOPS_PER_UNIT;

        if fraction == 0 {
            return write!(f, "{}", whole);
        }

        let digits = format!("{:07}", fraction);
        write!(f, "{}.{}", whole, digits.trim_end_matches('0'))
    }
}
