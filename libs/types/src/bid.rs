//! Bid records
//!
//! Bids are immutable. A bidder raising their own offer appends a new bid;
//! the earlier one stays in the history but no longer holds escrow.

use crate::ids::{AuctionId, BidId, ItemId, ParticipantId};
use crate::numeric::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub bid_id: BidId,
    pub auction_id: AuctionId,
    pub bidder: ParticipantId,
    pub amount: Amount,
    /// Strictly increasing within one auction
    pub placed_at: DateTime<Utc>,
    /// 1-based insertion position within the auction
    pub sequence: u64,
}

impl Bid {
    pub fn new(
        auction_id: AuctionId,
        bidder: ParticipantId,
        amount: Amount,
        placed_at: DateTime<Utc>,
        sequence: u64,
    ) -> Self {
        Self {
            bid_id: BidId::new(),
            auction_id,
            bidder,
            amount,
            placed_at,
            sequence,
        }
    }

    /// Enrich with bidder and item details for listings
    pub fn record(
        &self,
        bidder_email: impl Into<String>,
        item_id: ItemId,
        item_name: impl Into<String>,
    ) -> BidRecord {
        BidRecord {
            bid_id: self.bid_id,
            bidder_id: self.bidder,
            bidder_email: bidder_email.into(),
            auction_id: self.auction_id,
            item_id,
            item_name: item_name.into(),
            amount: self.amount,
            placed_at: self.placed_at,
            sequence: self.sequence,
        }
    }
}

/// Bid as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub bid_id: BidId,
    pub bidder_id: ParticipantId,
    pub bidder_email: String,
    pub auction_id: AuctionId,
    pub item_id: ItemId,
    pub item_name: String,
    pub amount: Amount,
    pub placed_at: DateTime<Utc>,
    pub sequence: u64,
}
