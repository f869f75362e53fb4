//! Fixed-point credit amounts.
//!
//! Balances, wagers, and payouts are stored as integer cents so repeated
//! rounds never accumulate floating-point drift. Floats only appear at the
//! edges: payout multipliers and human-entered amounts.

use num_traits::cast::cast;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

const CENTS_PER_UNIT: i64 = 100;

/// Signed amount of in-game currency with two decimal places.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Credits(i64);

impl Credits {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn from_whole(units: i64) -> Self {
        Self(units.saturating_mul(CENTS_PER_UNIT))
    }

    /// Convert a decimal amount, rounding half away from zero to whole cents.
    /// Non-finite input maps to zero.
    #[must_use]
    pub fn from_major(amount: f64) -> Self {
        Self(round_f64_to_i64(amount * 100.0))
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub fn as_major(self) -> f64 {
        i64_to_f64(self.0) / 100.0
    }

    /// Multiply by `multiplier` and round once, half away from zero, to whole cents.
    #[must_use]
    pub fn scaled(self, multiplier: f64) -> Self {
        Self(round_f64_to_i64(i64_to_f64(self.0) * multiplier))
    }

    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 { Self::ZERO } else { self }
    }

    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    #[must_use]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl Add for Credits {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl AddAssign for Credits {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.saturating_add(rhs);
    }
}

impl Sub for Credits {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl Neg for Credits {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.saturating_neg())
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let whole = (magnitude / 100).to_string();
        let frac = magnitude % 100;
        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (idx, ch) in whole.chars().enumerate() {
            if idx > 0 && (whole.len() - idx) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        write!(f, "{sign}{grouped}.{frac:02}")
    }
}

/// Round half away from zero, saturating at the i64 range. Non-finite values map to 0.
fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let rounded = value.round();
    cast::<f64, i64>(rounded).unwrap_or(if rounded < 0.0 { i64::MIN } else { i64::MAX })
}

fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}
