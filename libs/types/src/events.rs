//! Auction events
//!
//! Immutable records emitted by state-changing operations once they commit.

use crate::auction::Auction;
use crate::ids::{AuctionId, BidId, ItemId, ParticipantId};
use crate::numeric::Amount;
use crate::settlement::SettlementOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item was listed and blocked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionCreated {
    pub auction_id: AuctionId,
    pub owner: ParticipantId,
    pub item_id: ItemId,
    pub initial_price: Amount,
    pub opened_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

/// A bid was accepted and its escrow debited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidPlaced {
    pub bid_id: BidId,
    pub auction_id: AuctionId,
    pub bidder: ParticipantId,
    pub amount: Amount,
    /// Escrow of the superseded bid credited back in the same unit of work
    pub released: Amount,
    pub placed_at: DateTime<Utc>,
}

/// An auction reached its terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSettled {
    pub auction_id: AuctionId,
    pub item_id: ItemId,
    pub winner: Option<ParticipantId>,
    pub price: Option<Amount>,
    pub refunded: Amount,
    pub settled_at: DateTime<Utc>,
}

impl From<&Auction> for AuctionCreated {
    fn from(auction: &Auction) -> Self {
        Self {
            auction_id: auction.auction_id,
            owner: auction.owner,
            item_id: auction.item_id,
            initial_price: auction.initial_price,
            opened_at: auction.opened_at,
            closes_at: auction.closes_at,
        }
    }
}

impl From<&SettlementOutcome> for AuctionSettled {
    fn from(outcome: &SettlementOutcome) -> Self {
        Self {
            auction_id: outcome.auction_id,
            item_id: outcome.item_id,
            winner: outcome.winner(),
            price: outcome.sale.as_ref().map(|s| s.price),
            refunded: outcome.total_refunded(),
            settled_at: outcome.settled_at,
        }
    }
}

/// Enum wrapper for all auction events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuctionEvent {
    AuctionCreated(AuctionCreated),
    BidPlaced(BidPlaced),
    AuctionSettled(AuctionSettled),
}

impl AuctionEvent {
    pub fn auction_id(&self) -> AuctionId {
        match self {
            AuctionEvent::AuctionCreated(e) => e.auction_id,
            AuctionEvent::BidPlaced(e) => e.auction_id,
            AuctionEvent::AuctionSettled(e) => e.auction_id,
        }
    }
}
