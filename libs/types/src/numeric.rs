//! Fixed-point monetary amounts
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! An `Amount` is never negative: every subtraction is checked and yields
//! `None` instead of going below zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use thiserror::Error;

/// Rejected attempt to build a negative amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Amount must be non-negative, got {0}")]
pub struct NegativeAmount(pub Decimal);

/// Non-negative monetary amount (balances, prices, bids)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Create an amount, returning None if the value is negative
    pub fn new(value: Decimal) -> Option<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Whole-unit amount
    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    /// Parse an exact decimal string such as "12.50"
    pub fn parse(value: &str) -> Option<Self> {
        Decimal::from_str_exact(value).ok().and_then(Self::new)
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.0.is_zero()
    }

    /// Add with overflow protection
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Subtract, returning None on underflow below zero
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        if other.0 > self.0 {
            return None;
        }
        self.0.checked_sub(other.0).map(Amount)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = NegativeAmount;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value).ok_or(NegativeAmount(value))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        Amount(iter.map(|a| a.0).sum())
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
