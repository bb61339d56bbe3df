//! Engine configuration
//!
//! Defaults reproduce the plain rules; every field can be overridden from a
//! JSON document.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::numeric::Amount;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration document: {0}")]
    Parse(String),

    #[error("minimum_initial_price must be positive")]
    NonPositiveMinimumPrice,

    #[error("max_settlements_per_pass must be at least 1")]
    ZeroSettlementCap,

    #[error("bid_timestamp_step_nanos must be at least 1, got {0}")]
    NonPositiveTimestampStep(i64),
}

/// Auction engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Lowest accepted `initial_price` for a new auction
    pub minimum_initial_price: Amount,
    /// Upper bound on auctions settled by one pass; the rest are deferred
    pub max_settlements_per_pass: Option<usize>,
    /// Include bid amounts in log records. Off by default: bids are sealed.
    pub log_bid_amounts: bool,
    /// Nudge applied to a bid timestamp that would not be strictly after the
    /// previous bid on the same auction
    pub bid_timestamp_step_nanos: i64,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            minimum_initial_price: Amount::new(Decimal::new(1, 2)).unwrap_or(Amount::ZERO),
            max_settlements_per_pass: None,
            log_bid_amounts: false,
            bid_timestamp_step_nanos: 1,
        }
    }
}

impl AuctionConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: AuctionConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.minimum_initial_price.is_positive() {
            return Err(ConfigError::NonPositiveMinimumPrice);
        }
        if self.max_settlements_per_pass == Some(0) {
            return Err(ConfigError::ZeroSettlementCap);
        }
        if self.bid_timestamp_step_nanos < 1 {
            return Err(ConfigError::NonPositiveTimestampStep(
                self.bid_timestamp_step_nanos,
            ));
        }
        Ok(())
    }
}
