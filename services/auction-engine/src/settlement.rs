//! Settlement Engine — resolving expired auctions
//!
//! Settling one auction happens under its lock and the locks of every
//! current bidder, as a single unit of work:
//! 1. The highest current bid wins; its escrow is the sale price.
//! 2. One copy of the item moves from the owner to the winner.
//! 3. Every other current bid is refunded.
//! 4. The item is unblocked and the auction marked settled.
//!
//! With no bids only step 4 applies. `AuctionSettled` is appended to the
//! event log before the auction lock is released.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use types::errors::{AuctionError, StoreError};
use types::events::{AuctionEvent, AuctionSettled};
use types::ids::AuctionId;
use types::numeric::Amount;
use types::settlement::{Refund, Sale, SettlementFailure, SettlementOutcome, SettlementReport};

use crate::catalog::AuctionCatalog;
use crate::config::AuctionConfig;
use crate::escrow::{self, Release};
use crate::event_log::EventLog;
use crate::ledger::Ledger;
use crate::locks::LockRegistry;
use crate::store::{AuctionStore, UnitOfWork};

#[derive(Debug)]
pub struct SettlementEngine<S> {
    store: Arc<S>,
    ledger: Arc<Ledger<S>>,
    auction_locks: Arc<LockRegistry<AuctionId>>,
    catalog: AuctionCatalog<S>,
    events: Arc<EventLog>,
    config: AuctionConfig,
}

impl<S: AuctionStore> SettlementEngine<S> {
    pub fn new(
        store: Arc<S>,
        ledger: Arc<Ledger<S>>,
        auction_locks: Arc<LockRegistry<AuctionId>>,
        events: Arc<EventLog>,
        config: AuctionConfig,
    ) -> Self {
        Self {
            catalog: AuctionCatalog::new(Arc::clone(&store)),
            store,
            ledger,
            auction_locks,
            events,
            config,
        }
    }

    /// Settle one auction whose window has closed.
    ///
    /// Fails with `AuctionNotExpired` before `closes_at`, then with
    /// `AlreadySettled` on a settled auction. A failure changes nothing.
    pub fn settle(
        &self,
        auction_id: AuctionId,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome, AuctionError> {
        let auction_lock = self.auction_locks.lock_one(auction_id);
        let _auction_guard = auction_lock.hold();

        let auction = self.catalog.auction(auction_id)?;
        if !auction.has_closed(now) {
            return Err(AuctionError::AuctionNotExpired {
                auction_id: auction_id.to_string(),
                closes_at: auction.closes_at.to_rfc3339(),
            });
        }
        if auction.is_settled() {
            return Err(AuctionError::AlreadySettled {
                auction_id: auction_id.to_string(),
            });
        }

        let bids = self.store.bids_for_auction(auction_id)?;
        let releases = escrow::settlement_release(&bids);

        let bidder_lock = self.ledger.lock(releases.iter().map(|(bid, _)| bid.bidder));
        let _bidder_guards = bidder_lock.hold();

        let mut work = UnitOfWork::new();
        let mut sale = None;
        let mut refunds = Vec::new();
        for (bid, release) in &releases {
            match release {
                Release::Consume(price) => {
                    sale = Some(Sale {
                        winner: bid.bidder,
                        bid_id: bid.bid_id,
                        price: *price,
                    });
                }
                Release::Refund(amount) => {
                    self.ledger.stage_credit(&mut work, bid.bidder, *amount);
                    refunds.push(Refund {
                        participant: bid.bidder,
                        amount: *amount,
                    });
                }
            }
        }
        if let Some(sale) = &sale {
            work.remove_copies(auction.owner, auction.item_id, 1)
                .add_copies(sale.winner, auction.item_id, 1);
        }
        work.unblock_item(auction.item_id)
            .mark_settled(auction_id, now);
        self.store.commit(work)?;

        let outcome = SettlementOutcome {
            auction_id,
            item_id: auction.item_id,
            seller: auction.owner,
            sale,
            refunds,
            settled_at: now,
        };
        self.events
            .append(AuctionEvent::AuctionSettled(AuctionSettled::from(&outcome)));

        match (&outcome.sale, self.config.log_bid_amounts) {
            (Some(sale), true) => info!(
                auction_id = %auction_id,
                winner = %sale.winner,
                price = %sale.price,
                refunds = outcome.refunds.len(),
                "Auction settled with sale"
            ),
            (Some(sale), false) => info!(
                auction_id = %auction_id,
                winner = %sale.winner,
                refunds = outcome.refunds.len(),
                "Auction settled with sale"
            ),
            (None, _) => info!(auction_id = %auction_id, "Auction settled without bids"),
        }
        Ok(outcome)
    }

    /// Settle every auction expired as of `now`.
    ///
    /// A failing auction is recorded and skipped. With a per-pass cap the
    /// auctions that closed earliest go first and the rest are deferred.
    pub fn settle_all_expired(&self, now: DateTime<Utc>) -> Result<SettlementReport, AuctionError> {
        let expired = self.catalog.expired_pending(now)?;
        let cap = self.config.max_settlements_per_pass.unwrap_or(usize::MAX);
        let deferred = expired.len().saturating_sub(cap);

        let mut report = SettlementReport {
            deferred,
            ..SettlementReport::default()
        };
        for auction in expired.into_iter().take(cap) {
            match self.settle(auction.auction_id, now) {
                Ok(outcome) => report.settled.push(outcome),
                Err(err) => {
                    error!(
                        auction_id = %auction.auction_id,
                        reason = err.kind(),
                        error = %err,
                        "Settlement failed"
                    );
                    report.failures.push(SettlementFailure {
                        auction_id: auction.auction_id,
                        error: err,
                    });
                }
            }
        }

        if report.deferred > 0 {
            warn!(deferred = report.deferred, "Settlement pass hit its cap");
        }
        info!(
            settled = report.settled.len(),
            sales = report.sales(),
            failures = report.failures.len(),
            deferred = report.deferred,
            "Settlement pass complete"
        );
        Ok(report)
    }

    /// Sum of current escrow held by unsettled auctions
    pub fn escrow_outstanding(&self) -> Result<Amount, AuctionError> {
        let mut total = Amount::ZERO;
        for auction in self.store.unsettled_auctions()? {
            let bids = self.store.bids_for_auction(auction.auction_id)?;
            total = total
                .checked_add(escrow::total_escrow(&bids))
                .ok_or(AuctionError::Storage(StoreError::Overflow))?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::{open_auction, ListingRequest};
    use crate::bid_ledger::BidLedger;
    use crate::store::{InMemoryStore, Inventory, ParticipantDirectory};
    use chrono::{Duration, TimeZone};
    use types::ids::{ItemId, ParticipantId};
    use types::item::Item;
    use types::participant::Participant;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        events: Arc<EventLog>,
        bids: BidLedger<InMemoryStore>,
        engine: SettlementEngine<InMemoryStore>,
        owner: ParticipantId,
        item: ItemId,
        x: ParticipantId,
        y: ParticipantId,
    }

    fn fixture(config: AuctionConfig) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let owner = store
            .register_participant(Participant::new("Owner", "owner@example.com", Amount::ZERO))
            .unwrap();
        let x = store
            .register_participant(Participant::new("X", "x@example.com", Amount::from_u64(100)))
            .unwrap();
        let y = store
            .register_participant(Participant::new("Y", "y@example.com", Amount::from_u64(100)))
            .unwrap();
        let item = store.register_item(Item::new("Foil #9")).unwrap();
        store.grant_copies(owner, item, 1).unwrap();
        let ledger = Arc::new(Ledger::new(Arc::clone(&store)));
        let locks = Arc::new(LockRegistry::new());
        let events = Arc::new(EventLog::new());
        Fixture {
            bids: BidLedger::new(
                Arc::clone(&store),
                Arc::clone(&ledger),
                Arc::clone(&locks),
                Arc::clone(&events),
                config.clone(),
            ),
            engine: SettlementEngine::new(
                Arc::clone(&store),
                ledger,
                locks,
                Arc::clone(&events),
                config,
            ),
            store,
            events,
            owner,
            item,
            x,
            y,
        }
    }

    fn list(f: &Fixture, item: ItemId, hours: i64) -> AuctionId {
        open_auction(
            f.store.as_ref(),
            &AuctionConfig::default(),
            ListingRequest {
                owner: f.owner,
                item_id: item,
                initial_price: Amount::from_u64(10),
                opens_at: t0(),
                closes_at: t0() + Duration::hours(hours),
            },
        )
        .unwrap()
        .auction_id
    }

    fn balance(f: &Fixture, p: ParticipantId) -> Amount {
        f.store.participant(p).unwrap().unwrap().balance
    }

    #[test]
    fn test_settle_with_sale() {
        let f = fixture(AuctionConfig::default());
        let auction_id = list(&f, f.item, 1);
        let now = t0() + Duration::minutes(5);
        f.bids.place_bid(auction_id, f.x, Amount::from_u64(10), now).unwrap();
        f.bids.place_bid(auction_id, f.y, Amount::from_u64(15), now).unwrap();

        let outcome = f.engine.settle(auction_id, t0() + Duration::hours(1)).unwrap();
        assert_eq!(outcome.winner(), Some(f.y));
        assert_eq!(outcome.total_refunded(), Amount::from_u64(10));
        assert_eq!(balance(&f, f.x), Amount::from_u64(100));
        assert_eq!(balance(&f, f.y), Amount::from_u64(85));
        assert_eq!(f.store.holding(f.y, f.item).unwrap().unwrap().copies, 1);
        assert_eq!(f.store.holding(f.owner, f.item).unwrap().unwrap().copies, 0);
        assert!(!f.store.item(f.item).unwrap().unwrap().blocked);
        assert_eq!(f.engine.escrow_outstanding().unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_settle_without_bids() {
        let f = fixture(AuctionConfig::default());
        let auction_id = list(&f, f.item, 1);
        let outcome = f.engine.settle(auction_id, t0() + Duration::hours(2)).unwrap();
        assert!(!outcome.is_sale());
        assert!(outcome.refunds.is_empty());
        assert_eq!(f.store.holding(f.owner, f.item).unwrap().unwrap().copies, 1);
        assert!(!f.store.item(f.item).unwrap().unwrap().blocked);
    }

    #[test]
    fn test_settle_before_close() {
        let f = fixture(AuctionConfig::default());
        let auction_id = list(&f, f.item, 1);
        let err = f
            .engine
            .settle(auction_id, t0() + Duration::minutes(59))
            .unwrap_err();
        assert!(matches!(err, AuctionError::AuctionNotExpired { .. }));
        assert!(f.store.item(f.item).unwrap().unwrap().blocked);
    }

    #[test]
    fn test_settle_twice() {
        let f = fixture(AuctionConfig::default());
        let auction_id = list(&f, f.item, 1);
        f.bids
            .place_bid(auction_id, f.x, Amount::from_u64(20), t0())
            .unwrap();
        f.engine.settle(auction_id, t0() + Duration::hours(1)).unwrap();
        let err = f
            .engine
            .settle(auction_id, t0() + Duration::hours(2))
            .unwrap_err();
        assert!(matches!(err, AuctionError::AlreadySettled { .. }));
        assert_eq!(balance(&f, f.x), Amount::from_u64(80));
        assert_eq!(f.store.holding(f.x, f.item).unwrap().unwrap().copies, 1);

        // Expiry is checked before the settled marker.
        let err = f
            .engine
            .settle(auction_id, t0() + Duration::minutes(30))
            .unwrap_err();
        assert!(matches!(err, AuctionError::AuctionNotExpired { .. }));

        let settled = f
            .events
            .for_auction(auction_id)
            .into_iter()
            .filter(|e| matches!(e, AuctionEvent::AuctionSettled(_)))
            .count();
        assert_eq!(settled, 1);
    }

    #[test]
    fn test_pass_respects_cap() {
        let mut config = AuctionConfig::default();
        config.max_settlements_per_pass = Some(1);
        let f = fixture(config);
        let second = f.store.register_item(Item::new("Foil #10")).unwrap();
        f.store.grant_copies(f.owner, second, 1).unwrap();
        let first_id = list(&f, f.item, 1);
        let second_id = list(&f, second, 2);

        let report = f.engine.settle_all_expired(t0() + Duration::hours(3)).unwrap();
        assert_eq!(report.settled.len(), 1);
        assert_eq!(report.settled[0].auction_id, first_id);
        assert_eq!(report.deferred, 1);

        let report = f.engine.settle_all_expired(t0() + Duration::hours(3)).unwrap();
        assert_eq!(report.settled[0].auction_id, second_id);
        assert_eq!(report.deferred, 0);
    }

    #[test]
    fn test_pass_collects_failures() {
        let f = fixture(AuctionConfig::default());
        let auction_id = list(&f, f.item, 1);
        f.bids
            .place_bid(auction_id, f.x, Amount::from_u64(20), t0())
            .unwrap();
        // Owner's copy disappears before settlement.
        let mut work = UnitOfWork::new();
        work.remove_copies(f.owner, f.item, 1);
        f.store.commit(work).unwrap();

        let report = f.engine.settle_all_expired(t0() + Duration::hours(1)).unwrap();
        assert!(report.settled.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].error.kind(), "ITEM_NOT_OWNED");
        assert_eq!(balance(&f, f.x), Amount::from_u64(80));

        // Escrow stays held until the owner's copy is back.
        assert_eq!(f.engine.escrow_outstanding().unwrap(), Amount::from_u64(20));
        assert!(f.store.item(f.item).unwrap().unwrap().blocked);
        assert!(f
            .events
            .for_auction(auction_id)
            .iter()
            .all(|e| !matches!(e, AuctionEvent::AuctionSettled(_))));

        f.store.grant_copies(f.owner, f.item, 1).unwrap();
        let report = f.engine.settle_all_expired(t0() + Duration::hours(2)).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.settled[0].winner(), Some(f.x));
        assert_eq!(f.engine.escrow_outstanding().unwrap(), Amount::ZERO);
        assert_eq!(f.store.holding(f.x, f.item).unwrap().unwrap().copies, 1);
    }

    #[test]
    fn test_one_failure_does_not_stop_the_pass() {
        let f = fixture(AuctionConfig::default());
        let second = f.store.register_item(Item::new("Foil #11")).unwrap();
        f.store.grant_copies(f.owner, second, 1).unwrap();
        let failing = list(&f, f.item, 1);
        let healthy = list(&f, second, 2);

        let now = t0() + Duration::minutes(5);
        f.bids.place_bid(failing, f.x, Amount::from_u64(20), now).unwrap();
        f.bids.place_bid(healthy, f.x, Amount::from_u64(10), now).unwrap();
        f.bids.place_bid(healthy, f.y, Amount::from_u64(15), now).unwrap();
        assert_eq!(balance(&f, f.x), Amount::from_u64(70));

        let mut work = UnitOfWork::new();
        work.remove_copies(f.owner, f.item, 1);
        f.store.commit(work).unwrap();

        let report = f.engine.settle_all_expired(t0() + Duration::hours(3)).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].auction_id, failing);
        assert_eq!(report.settled.len(), 1);
        assert_eq!(report.settled[0].auction_id, healthy);
        assert_eq!(report.settled[0].winner(), Some(f.y));

        // x keeps the failing auction's escrow and gets the healthy one back.
        assert_eq!(balance(&f, f.x), Amount::from_u64(80));
        assert_eq!(balance(&f, f.y), Amount::from_u64(85));
        assert_eq!(f.store.holding(f.y, second).unwrap().unwrap().copies, 1);
        assert_eq!(f.store.holding(f.owner, second).unwrap().unwrap().copies, 0);
        assert!(!f.store.item(second).unwrap().unwrap().blocked);
        assert!(f.store.item(f.item).unwrap().unwrap().blocked);
    }
}
