//! Auction service — entry point for callers
//!
//! Wires the catalog, bid ledger and settlement engine over one store and
//! one clock, enriches results into read models, and exposes the event log
//! those components append to.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use types::auction::{Auction, AuctionState, AuctionSummary};
use types::bid::{Bid, BidRecord};
use types::errors::{AuctionError, EntityKind};
use types::events::{AuctionCreated, AuctionEvent};
use types::ids::{AuctionId, ItemId, ParticipantId};
use types::numeric::Amount;
use types::settlement::{SettlementOutcome, SettlementReport};

use crate::auction::{prepare_listing, ListingRequest};
use crate::bid_ledger::BidLedger;
use crate::catalog::AuctionCatalog;
use crate::clock::Clock;
use crate::config::{AuctionConfig, ConfigError};
use crate::escrow;
use crate::event_log::EventLog;
use crate::ledger::Ledger;
use crate::locks::LockRegistry;
use crate::settlement::SettlementEngine;
use crate::store::AuctionStore;

#[derive(Debug)]
pub struct AuctionService<S, C> {
    store: Arc<S>,
    clock: C,
    config: AuctionConfig,
    catalog: AuctionCatalog<S>,
    bids: BidLedger<S>,
    settlement: SettlementEngine<S>,
    auction_locks: Arc<LockRegistry<AuctionId>>,
    /// Emitted events log (append-only)
    events: Arc<EventLog>,
}

impl<S: AuctionStore, C: Clock> AuctionService<S, C> {
    /// Create a service with the default configuration
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self::build(store, clock, AuctionConfig::default())
    }

    /// Create a service with a custom configuration
    pub fn with_config(store: Arc<S>, clock: C, config: AuctionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(store, clock, config))
    }

    fn build(store: Arc<S>, clock: C, config: AuctionConfig) -> Self {
        let ledger = Arc::new(Ledger::new(Arc::clone(&store)));
        let auction_locks = Arc::new(LockRegistry::new());
        let events = Arc::new(EventLog::new());
        Self {
            catalog: AuctionCatalog::new(Arc::clone(&store)),
            bids: BidLedger::new(
                Arc::clone(&store),
                Arc::clone(&ledger),
                Arc::clone(&auction_locks),
                Arc::clone(&events),
                config.clone(),
            ),
            settlement: SettlementEngine::new(
                Arc::clone(&store),
                ledger,
                Arc::clone(&auction_locks),
                Arc::clone(&events),
                config.clone(),
            ),
            store,
            clock,
            config,
            auction_locks,
            events,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    // ───────────────────────── Listing ─────────────────────────

    /// List an owned, unblocked item for auction
    pub fn create_auction(
        &self,
        owner: ParticipantId,
        item_id: ItemId,
        initial_price: Amount,
        opens_at: DateTime<Utc>,
        closes_at: DateTime<Utc>,
    ) -> Result<AuctionId, AuctionError> {
        let listing = prepare_listing(
            self.store.as_ref(),
            &self.config,
            ListingRequest {
                owner,
                item_id,
                initial_price,
                opens_at,
                closes_at,
            },
        )?;
        // No bid can reach the new auction before its creation is logged.
        let auction_lock = self.auction_locks.lock_one(listing.auction.auction_id);
        let _auction_guard = auction_lock.hold();
        let auction = listing.commit(self.store.as_ref())?;
        self.events
            .append(AuctionEvent::AuctionCreated(AuctionCreated::from(&auction)));
        Ok(auction.auction_id)
    }

    // ───────────────────────── Bidding ─────────────────────────

    /// Place a sealed bid at the clock's current time
    pub fn place_bid(
        &self,
        auction_id: AuctionId,
        bidder: ParticipantId,
        amount: Amount,
    ) -> Result<BidRecord, AuctionError> {
        self.bids
            .place_bid(auction_id, bidder, amount, self.clock.now())
            .map(|accepted| accepted.record)
    }

    pub fn list_open_auctions_for_item(
        &self,
        item_id: ItemId,
    ) -> Result<Vec<AuctionSummary>, AuctionError> {
        self.catalog.open_for_item(item_id, self.clock.now())
    }

    /// Bid history of an auction, oldest first
    pub fn list_bids(&self, auction_id: AuctionId) -> Result<Vec<BidRecord>, AuctionError> {
        let (auction, bids) = self.bids.bids(auction_id)?;
        self.records(&auction, &bids)
    }

    pub fn highest_bid(&self, auction_id: AuctionId) -> Result<Option<BidRecord>, AuctionError> {
        let (auction, bids) = self.bids.bids(auction_id)?;
        match escrow::highest_bid(&bids) {
            Some(bid) => Ok(self
                .records(&auction, std::slice::from_ref(bid))?
                .pop()),
            None => Ok(None),
        }
    }

    pub fn current_escrow(
        &self,
        auction_id: AuctionId,
        bidder: ParticipantId,
    ) -> Result<Amount, AuctionError> {
        self.bids.current_escrow(auction_id, bidder)
    }

    pub fn auction_state(&self, auction_id: AuctionId) -> Result<AuctionState, AuctionError> {
        self.catalog.state_of(auction_id, self.clock.now())
    }

    pub fn auction_summary(&self, auction_id: AuctionId) -> Result<AuctionSummary, AuctionError> {
        self.catalog.summary(auction_id, self.clock.now())
    }

    // ───────────────────────── Settlement ─────────────────────────

    /// Settle one auction at the clock's current time
    pub fn settle(&self, auction_id: AuctionId) -> Result<SettlementOutcome, AuctionError> {
        self.settlement.settle(auction_id, self.clock.now())
    }

    /// Settle everything expired as of `now`
    pub fn run_settlement_pass(&self, now: DateTime<Utc>) -> Result<SettlementReport, AuctionError> {
        self.settlement.settle_all_expired(now)
    }

    /// Escrow currently held across unsettled auctions
    pub fn escrow_outstanding(&self) -> Result<Amount, AuctionError> {
        self.settlement.escrow_outstanding()
    }

    // ───────────────────────── Events ─────────────────────────

    pub fn events(&self) -> Vec<AuctionEvent> {
        self.events.snapshot()
    }

    pub fn drain_events(&self) -> Vec<AuctionEvent> {
        self.events.drain()
    }

    /// Events of one auction, in commit order
    pub fn auction_events(&self, auction_id: AuctionId) -> Vec<AuctionEvent> {
        self.events.for_auction(auction_id)
    }

    // ───────────────────────── Read models ─────────────────────────

    fn item_name(&self, item_id: ItemId) -> Result<String, AuctionError> {
        Ok(self
            .store
            .item(item_id)?
            .ok_or_else(|| AuctionError::not_found(EntityKind::Item, item_id))?
            .name)
    }

    fn records(&self, auction: &Auction, bids: &[Bid]) -> Result<Vec<BidRecord>, AuctionError> {
        let item_name = self.item_name(auction.item_id)?;
        let mut emails: HashMap<ParticipantId, String> = HashMap::new();
        let mut records = Vec::with_capacity(bids.len());
        for bid in bids {
            if !emails.contains_key(&bid.bidder) {
                let participant = self
                    .store
                    .participant(bid.bidder)?
                    .ok_or_else(|| AuctionError::not_found(EntityKind::Participant, bid.bidder))?;
                emails.insert(bid.bidder, participant.email);
            }
            let email = emails.get(&bid.bidder).cloned().unwrap_or_default();
            records.push(bid.record(email, auction.item_id, item_name.clone()));
        }
        Ok(records)
    }
}
