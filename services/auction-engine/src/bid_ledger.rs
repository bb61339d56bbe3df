//! Bid Ledger — sealed bid acceptance
//!
//! A bid is validated and applied under the auction's lock, then the
//! bidder's lock. Validation runs against the state left by every bid
//! serialized before it, and the escrow swap (credit back the bidder's
//! previous bid, debit the new one) commits in the same unit of work as the
//! bid record. Everything that can fail happens before the commit; after it
//! only the event append and logging remain.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use types::auction::Auction;
use types::bid::{Bid, BidRecord};
use types::errors::{AuctionError, EntityKind};
use types::events::{AuctionEvent, BidPlaced};
use types::ids::{AuctionId, ParticipantId};
use types::numeric::Amount;

use crate::config::AuctionConfig;
use crate::escrow::{self, EscrowDelta};
use crate::event_log::EventLog;
use crate::ledger::Ledger;
use crate::locks::LockRegistry;
use crate::store::{AuctionStore, UnitOfWork};

/// An accepted bid with the auction it was validated against
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedBid {
    pub bid: Bid,
    pub delta: EscrowDelta,
    pub auction: Auction,
    /// Read model resolved under the auction lock before the commit
    pub record: BidRecord,
}

#[derive(Debug)]
pub struct BidLedger<S> {
    store: Arc<S>,
    ledger: Arc<Ledger<S>>,
    auction_locks: Arc<LockRegistry<AuctionId>>,
    events: Arc<EventLog>,
    config: AuctionConfig,
}

impl<S: AuctionStore> BidLedger<S> {
    pub fn new(
        store: Arc<S>,
        ledger: Arc<Ledger<S>>,
        auction_locks: Arc<LockRegistry<AuctionId>>,
        events: Arc<EventLog>,
        config: AuctionConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            auction_locks,
            events,
            config,
        }
    }

    /// Place a sealed bid.
    ///
    /// Checks, first failure wins: auction, item and bidder exist, auction is open,
    /// amount reaches the initial price, amount beats the highest bid,
    /// balance covers the amount.
    pub fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder_id: ParticipantId,
        amount: Amount,
        now: DateTime<Utc>,
    ) -> Result<AcceptedBid, AuctionError> {
        if amount.is_zero() {
            return Err(self.rejected(
                auction_id,
                bidder_id,
                AuctionError::InvalidAmount {
                    reason: "bid amount must be positive".to_string(),
                },
            ));
        }

        let auction_lock = self.auction_locks.lock_one(auction_id);
        let _auction_guard = auction_lock.hold();
        let auction = self.auction(auction_id)?;
        let item = self
            .store
            .item(auction.item_id)?
            .ok_or_else(|| AuctionError::not_found(EntityKind::Item, auction.item_id))?;

        let bidder_lock = self.ledger.lock([bidder_id]);
        let _bidder_guard = bidder_lock.hold();
        let bidder = self.ledger.participant(bidder_id)?;

        let bids = self.store.bids_for_auction(auction_id)?;

        if !auction.is_open(now) {
            return Err(self.rejected(
                auction_id,
                bidder_id,
                AuctionError::AuctionClosed {
                    auction_id: auction_id.to_string(),
                },
            ));
        }
        if amount < auction.initial_price {
            return Err(self.rejected(auction_id, bidder_id, Self::too_low(amount)));
        }
        if escrow::highest_bid(&bids).is_some_and(|h| amount <= h.amount) {
            return Err(self.rejected(auction_id, bidder_id, Self::too_low(amount)));
        }
        if !escrow::covers(bidder.balance, amount) {
            return Err(self.rejected(
                auction_id,
                bidder_id,
                AuctionError::InsufficientBalance {
                    participant: bidder_id.to_string(),
                    required: amount.to_string(),
                    available: bidder.balance.to_string(),
                },
            ));
        }

        let previous = escrow::current_escrow(&bids, bidder_id);
        let delta = escrow::escrow_delta(previous, amount);
        let placed_at = self.next_timestamp(&bids, now);
        let bid = Bid::new(auction_id, bidder_id, amount, placed_at, bids.len() as u64 + 1);
        let record = bid.record(bidder.email, auction.item_id, item.name);

        let mut work = UnitOfWork::new();
        self.ledger.stage_credit(&mut work, bidder_id, delta.released);
        self.ledger.stage_debit(&mut work, bidder_id, delta.locked)?;
        work.append_bid(bid.clone());
        self.store.commit(work)?;
        self.events.append(AuctionEvent::BidPlaced(BidPlaced {
            bid_id: bid.bid_id,
            auction_id,
            bidder: bidder_id,
            amount,
            released: delta.released,
            placed_at,
        }));

        if self.config.log_bid_amounts {
            info!(
                auction_id = %auction_id,
                bidder = %bidder_id,
                sequence = bid.sequence,
                amount = %amount,
                released = %delta.released,
                "Bid accepted"
            );
        } else {
            info!(
                auction_id = %auction_id,
                bidder = %bidder_id,
                sequence = bid.sequence,
                "Bid accepted"
            );
        }

        Ok(AcceptedBid {
            bid,
            delta,
            auction,
            record,
        })
    }

    /// Bid history in insertion order
    pub fn bids(&self, auction_id: AuctionId) -> Result<(Auction, Vec<Bid>), AuctionError> {
        let auction = self.auction(auction_id)?;
        let bids = self.store.bids_for_auction(auction_id)?;
        Ok((auction, bids))
    }

    pub fn highest_bid(&self, auction_id: AuctionId) -> Result<Option<Bid>, AuctionError> {
        let (_, bids) = self.bids(auction_id)?;
        Ok(escrow::highest_bid(&bids).cloned())
    }

    pub fn current_escrow(
        &self,
        auction_id: AuctionId,
        bidder: ParticipantId,
    ) -> Result<Amount, AuctionError> {
        let (_, bids) = self.bids(auction_id)?;
        Ok(escrow::current_escrow(&bids, bidder))
    }

    fn auction(&self, auction_id: AuctionId) -> Result<Auction, AuctionError> {
        self.store
            .auction(auction_id)?
            .ok_or_else(|| AuctionError::not_found(EntityKind::Auction, auction_id))
    }

    /// `now`, nudged forward if it is not strictly after the last bid
    fn next_timestamp(&self, bids: &[Bid], now: DateTime<Utc>) -> DateTime<Utc> {
        match bids.last() {
            Some(last) if now <= last.placed_at => {
                last.placed_at + Duration::nanoseconds(self.config.bid_timestamp_step_nanos)
            }
            _ => now,
        }
    }

    fn too_low(amount: Amount) -> AuctionError {
        AuctionError::BidTooLow {
            offered: amount.to_string(),
        }
    }

    fn rejected(&self, auction_id: AuctionId, bidder: ParticipantId, err: AuctionError) -> AuctionError {
        debug!(
            auction_id = %auction_id,
            bidder = %bidder,
            reason = err.kind(),
            "Bid rejected"
        );
        err
    }
}
