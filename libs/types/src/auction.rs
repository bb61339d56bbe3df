//! Sealed-bid auction records and their clock-derived lifecycle
//!
//! The lifecycle is never stored: it is computed from the clock and the
//! `settled_at` marker.
//!
//! ```text
//! SCHEDULED ──(opened_at)──▶ OPEN ──(closes_at)──▶ EXPIRED_PENDING_SETTLEMENT ──(settle)──▶ SETTLED
//! ```

use crate::errors::AuctionError;
use crate::ids::{AuctionId, ItemId, ParticipantId};
use crate::numeric::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an auction at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionState {
    /// Listed, but `opened_at` has not been reached
    Scheduled,
    /// Accepting bids
    Open,
    /// `closes_at` has passed; waiting for the settlement pass
    ExpiredPendingSettlement,
    /// Resolved (terminal)
    Settled,
}

impl AuctionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionState::Settled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub auction_id: AuctionId,
    pub owner: ParticipantId,
    pub item_id: ItemId,
    /// Minimum acceptable first bid
    pub initial_price: Amount,
    pub opened_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl Auction {
    /// Build a new, unsettled auction.
    ///
    /// Fails with `InvalidAuctionWindow` unless `closes_at > opened_at`.
    pub fn new(
        owner: ParticipantId,
        item_id: ItemId,
        initial_price: Amount,
        opened_at: DateTime<Utc>,
        closes_at: DateTime<Utc>,
    ) -> Result<Self, AuctionError> {
        if closes_at <= opened_at {
            return Err(AuctionError::InvalidAuctionWindow {
                opened_at: opened_at.to_rfc3339(),
                closes_at: closes_at.to_rfc3339(),
            });
        }
        Ok(Self {
            auction_id: AuctionId::new(),
            owner,
            item_id,
            initial_price,
            opened_at,
            closes_at,
            settled_at: None,
        })
    }

    pub fn state(&self, now: DateTime<Utc>) -> AuctionState {
        if self.settled_at.is_some() {
            AuctionState::Settled
        } else if now < self.opened_at {
            AuctionState::Scheduled
        } else if now < self.closes_at {
            AuctionState::Open
        } else {
            AuctionState::ExpiredPendingSettlement
        }
    }

    /// `opened_at <= now < closes_at` and not yet settled
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == AuctionState::Open
    }

    /// Bidding window is over (settled or not)
    pub fn has_closed(&self, now: DateTime<Utc>) -> bool {
        now >= self.closes_at
    }

    pub fn is_settled(&self) -> bool {
        self.settled_at.is_some()
    }

    /// Read model for listings
    pub fn summary(&self, item_name: impl Into<String>, now: DateTime<Utc>) -> AuctionSummary {
        AuctionSummary {
            auction_id: self.auction_id,
            owner_id: self.owner,
            item_id: self.item_id,
            item_name: item_name.into(),
            initial_price: self.initial_price,
            opened_at: self.opened_at,
            closes_at: self.closes_at,
            state: self.state(now),
        }
    }
}

/// Listing view of an auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: AuctionId,
    pub owner_id: ParticipantId,
    pub item_id: ItemId,
    pub item_name: String,
    pub initial_price: Amount,
    pub opened_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub state: AuctionState,
}
