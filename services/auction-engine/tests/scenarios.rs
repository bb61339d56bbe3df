//! Scenario tests
//!
//! End-to-end runs through `AuctionService` with a hand-driven clock:
//! - Outbid and refund at settlement
//! - Insufficient balance
//! - Late bid
//! - Auction without bids
//! - Raising one's own bid
//! - Idempotent settlement and unreachable ties

use std::sync::Arc;

use auction_engine::{AuctionService, InMemoryStore, ManualClock};
use chrono::{DateTime, Duration, TimeZone, Utc};
use types::auction::AuctionState;
use types::errors::AuctionError;
use types::ids::{AuctionId, ItemId, ParticipantId};
use types::item::Item;
use types::numeric::Amount;
use types::participant::Participant;

use auction_engine::store::{Inventory, ParticipantDirectory};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

struct House {
    service: AuctionService<InMemoryStore, Arc<ManualClock>>,
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
    owner: ParticipantId,
    item: ItemId,
}

impl House {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt::try_init();
        let store = Arc::new(InMemoryStore::new());
        let owner = store
            .register_participant(Participant::new("Owner", "owner@example.com", Amount::ZERO))
            .unwrap();
        let item = store.register_item(Item::new("Golden sticker #7")).unwrap();
        store.grant_copies(owner, item, 1).unwrap();
        let clock = Arc::new(ManualClock::new(t0()));
        let service = AuctionService::new(Arc::clone(&store), Arc::clone(&clock));
        Self {
            service,
            store,
            clock,
            owner,
            item,
        }
    }

    fn bidder(&self, name: &str, balance: u64) -> ParticipantId {
        self.store
            .register_participant(Participant::new(
                name,
                format!("{}@example.com", name.to_lowercase()),
                Amount::from_u64(balance),
            ))
            .unwrap()
    }

    /// One-day auction at initial price 10, open from t0
    fn list(&self) -> AuctionId {
        self.service
            .create_auction(
                self.owner,
                self.item,
                Amount::from_u64(10),
                t0(),
                t0() + Duration::days(1),
            )
            .unwrap()
    }

    fn balance(&self, p: ParticipantId) -> Amount {
        self.store.participant(p).unwrap().unwrap().balance
    }

    fn copies(&self, p: ParticipantId) -> u32 {
        self.store
            .holding(p, self.item)
            .unwrap()
            .map(|h| h.copies)
            .unwrap_or(0)
    }

    fn blocked(&self) -> bool {
        self.store.item(self.item).unwrap().unwrap().blocked
    }
}

// ─── Outbid scenario ───

#[test]
fn test_outbid_bidder_refunded_at_settlement() {
    let house = House::new();
    let x = house.bidder("X", 100);
    let y = house.bidder("Y", 100);
    let auction_id = house.list();

    house.clock.advance(Duration::hours(1));
    house.service.place_bid(auction_id, x, Amount::from_u64(10)).unwrap();
    assert_eq!(house.balance(x), Amount::from_u64(90));

    let err = house
        .service
        .place_bid(auction_id, x, Amount::from_u64(10))
        .unwrap_err();
    assert!(matches!(err, AuctionError::BidTooLow { .. }));

    house.service.place_bid(auction_id, y, Amount::from_u64(15)).unwrap();
    assert_eq!(house.balance(x), Amount::from_u64(90));
    assert_eq!(house.balance(y), Amount::from_u64(85));

    let report = house.service.run_settlement_pass(t0() + Duration::days(1)).unwrap();
    assert_eq!(report.settled.len(), 1);
    assert_eq!(report.settled[0].winner(), Some(y));
    assert_eq!(house.balance(y), Amount::from_u64(85));
    assert_eq!(house.balance(x), Amount::from_u64(100));
    assert_eq!(house.copies(y), 1);
    assert_eq!(house.copies(house.owner), 0);
    assert!(!house.blocked());
}

// ─── Insufficient balance ───

#[test]
fn test_insufficient_balance_changes_nothing() {
    let house = House::new();
    let poor = house.bidder("Poor", 5);
    let auction_id = house.list();

    let err = house
        .service
        .place_bid(auction_id, poor, Amount::from_u64(10))
        .unwrap_err();
    assert!(matches!(err, AuctionError::InsufficientBalance { .. }));
    assert_eq!(house.balance(poor), Amount::from_u64(5));
    assert!(house.service.list_bids(auction_id).unwrap().is_empty());
}

// ─── Late bid ───

#[test]
fn test_bid_after_close_rejected() {
    let house = House::new();
    let x = house.bidder("X", 100);
    let auction_id = house.list();

    house.clock.advance(Duration::days(1));
    let err = house
        .service
        .place_bid(auction_id, x, Amount::from_u64(50))
        .unwrap_err();
    assert!(matches!(err, AuctionError::AuctionClosed { .. }));
    assert_eq!(house.balance(x), Amount::from_u64(100));
    assert_eq!(
        house.service.auction_state(auction_id).unwrap(),
        AuctionState::ExpiredPendingSettlement
    );
}

// ─── No bids ───

#[test]
fn test_settlement_without_bids() {
    let house = House::new();
    let auction_id = house.list();
    assert!(house.blocked());

    let report = house.service.run_settlement_pass(t0() + Duration::days(2)).unwrap();
    assert_eq!(report.settled.len(), 1);
    assert!(!report.settled[0].is_sale());
    assert!(!house.blocked());
    assert_eq!(house.copies(house.owner), 1);

    house.clock.set(t0() + Duration::days(2));
    assert_eq!(
        house.service.auction_state(auction_id).unwrap(),
        AuctionState::Settled
    );
}

// ─── Raising one's own bid ───

#[test]
fn test_raise_nets_the_difference() {
    let house = House::new();
    let x = house.bidder("X", 100);
    let auction_id = house.list();

    house.service.place_bid(auction_id, x, Amount::from_u64(10)).unwrap();
    let before = house.balance(x);
    house.service.place_bid(auction_id, x, Amount::from_u64(20)).unwrap();
    let after = house.balance(x);

    assert_eq!(before.checked_sub(after), Some(Amount::from_u64(10)));
    assert_eq!(
        house.service.current_escrow(auction_id, x).unwrap(),
        Amount::from_u64(20)
    );
    assert_eq!(house.service.list_bids(auction_id).unwrap().len(), 2);
}

// ─── Settlement guards ───

#[test]
fn test_second_settlement_is_rejected() {
    let house = House::new();
    let x = house.bidder("X", 100);
    let auction_id = house.list();
    house.service.place_bid(auction_id, x, Amount::from_u64(30)).unwrap();

    house.clock.set(t0() + Duration::days(1));
    house.service.settle(auction_id).unwrap();
    let err = house.service.settle(auction_id).unwrap_err();
    assert!(matches!(err, AuctionError::AlreadySettled { .. }));
    assert_eq!(house.balance(x), Amount::from_u64(70));
    assert_eq!(house.copies(x), 1);

    let report = house.service.run_settlement_pass(t0() + Duration::days(3)).unwrap();
    assert!(report.settled.is_empty());
    assert!(report.failures.is_empty());
}

#[test]
fn test_settle_before_close_rejected() {
    let house = House::new();
    let auction_id = house.list();
    let err = house.service.settle(auction_id).unwrap_err();
    assert!(matches!(err, AuctionError::AuctionNotExpired { .. }));
    assert!(house.blocked());
}

#[test]
fn test_equal_highest_bids_cannot_be_created() {
    let house = House::new();
    let x = house.bidder("X", 100);
    let y = house.bidder("Y", 100);
    let auction_id = house.list();

    house.service.place_bid(auction_id, x, Amount::from_u64(25)).unwrap();
    let err = house
        .service
        .place_bid(auction_id, y, Amount::from_u64(25))
        .unwrap_err();
    assert!(matches!(err, AuctionError::BidTooLow { .. }));

    let highest = house.service.highest_bid(auction_id).unwrap().unwrap();
    assert_eq!(highest.bidder_id, x);
    assert_eq!(house.service.list_bids(auction_id).unwrap().len(), 1);
}

#[test]
fn test_bid_too_low_message_is_sealed() {
    let house = House::new();
    let x = house.bidder("X", 100);
    let y = house.bidder("Y", 100);
    let auction_id = house.list();
    house.service.place_bid(auction_id, x, Amount::from_u64(42)).unwrap();

    let err = house
        .service
        .place_bid(auction_id, y, Amount::from_u64(41))
        .unwrap_err();
    assert!(!err.to_string().contains("42"));
}

#[test]
fn test_relisting_after_settlement() {
    let house = House::new();
    let x = house.bidder("X", 100);
    let first = house.list();
    house.service.place_bid(first, x, Amount::from_u64(10)).unwrap();
    house.service.run_settlement_pass(t0() + Duration::days(1)).unwrap();

    // The winner now holds the item and may list it again.
    let relisted = house
        .service
        .create_auction(
            x,
            house.item,
            Amount::from_u64(12),
            t0() + Duration::days(1),
            t0() + Duration::days(2),
        )
        .unwrap();
    assert_ne!(relisted, first);
    assert!(house.blocked());
}
