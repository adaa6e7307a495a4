//! # Fixed-Point Amounts
//!
//! Monetary values are signed integers of base units, 10^8 per coin.
//! Decimal text is parsed and rendered exactly; `0.1 + 0.2` is `0.3`.

use crate::errors::AmountError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

/// Base units per coin.
pub const COIN: i64 = 100_000_000;

/// Largest representable money supply, in base units.
pub const MAX_MONEY: i64 = 21_000_000 * COIN;

const DECIMALS: usize = 8;

/// A signed amount of base units.
///
/// Negative values appear on `send` ledger entries. Arithmetic is checked
/// and every checked constructor enforces `|amount| <= MAX_MONEY`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(0);

    /// Wrap a raw base-unit count without range checking.
    #[must_use]
    pub const fn from_base_units(units: i64) -> Self {
        Self(units)
    }

    /// Wrap a raw base-unit count, rejecting values outside the money range.
    pub fn checked_from_base_units(units: i64) -> Result<Self, AmountError> {
        let amount = Self(units);
        if amount.in_money_range() {
            Ok(amount)
        } else {
            Err(AmountError::OutOfRange(units))
        }
    }

    /// Raw base-unit count.
    #[must_use]
    pub const fn base_units(self) -> i64 {
        self.0
    }

    /// Whether `|self| <= MAX_MONEY`.
    #[must_use]
    pub fn in_money_range(self) -> bool {
        (-MAX_MONEY..=MAX_MONEY).contains(&self.0)
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, AmountError> {
        let units = self.0.checked_add(rhs.0).ok_or(AmountError::Overflow)?;
        Self::checked_from_base_units(units)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, AmountError> {
        let units = self.0.checked_sub(rhs.0).ok_or(AmountError::Overflow)?;
        Self::checked_from_base_units(units)
    }

    /// Sum an iterator of amounts with range checking after every step.
    pub fn checked_sum<I>(amounts: I) -> Result<Self, AmountError>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let coin = COIN.unsigned_abs();
        write!(f, "{sign}{}.{:08}", abs / coin, abs % coin)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(AmountError::Invalid(s.to_string()));
        }
        if frac_part.len() > DECIMALS {
            return Err(AmountError::TooPrecise(s.to_string()));
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| AmountError::Overflow)?
        };
        let mut fraction: i64 = 0;
        for (i, b) in frac_part.bytes().chain(std::iter::repeat(b'0')).enumerate() {
            if i == DECIMALS {
                break;
            }
            fraction = fraction * 10 + i64::from(b - b'0');
        }

        let units = whole
            .checked_mul(COIN)
            .and_then(|v| v.checked_add(fraction))
            .ok_or(AmountError::Overflow)?;
        Self::checked_from_base_units(if negative { -units } else { units })
    }
}
