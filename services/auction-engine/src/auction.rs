//! Auction listing
//!
//! Validates a listing against the owner's collection and blocks the item
//! for the lifetime of the auction. The block and the auction record are
//! committed together; a concurrent listing of the same item loses at commit
//! with `ItemAlreadyBlocked`.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use types::auction::Auction;
use types::errors::{AuctionError, EntityKind};
use types::ids::{ItemId, ParticipantId};
use types::numeric::Amount;

use crate::config::AuctionConfig;
use crate::store::{AuctionStore, UnitOfWork};

/// Parameters of a new auction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub owner: ParticipantId,
    pub item_id: ItemId,
    pub initial_price: Amount,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
}

/// A listing that passed validation and has not been committed yet
#[derive(Debug)]
pub struct PreparedListing {
    pub auction: Auction,
    work: UnitOfWork,
}

impl PreparedListing {
    /// Block the item and store the auction. A concurrent listing of the
    /// same item that committed first makes this fail with
    /// `ItemAlreadyBlocked`.
    pub fn commit<S: AuctionStore>(self, store: &S) -> Result<Auction, AuctionError> {
        store.commit(self.work)?;
        info!(
            auction_id = %self.auction.auction_id,
            owner = %self.auction.owner,
            item_id = %self.auction.item_id,
            closes_at = %self.auction.closes_at,
            "Auction created"
        );
        Ok(self.auction)
    }
}

/// Validate and commit in one step
pub fn open_auction<S: AuctionStore>(
    store: &S,
    config: &AuctionConfig,
    request: ListingRequest,
) -> Result<Auction, AuctionError> {
    prepare_listing(store, config, request)?.commit(store)
}

/// Checks run in order; the first failure wins:
/// window, price, owner, item, holding, block.
pub fn prepare_listing<S: AuctionStore>(
    store: &S,
    config: &AuctionConfig,
    request: ListingRequest,
) -> Result<PreparedListing, AuctionError> {
    let auction = Auction::new(
        request.owner,
        request.item_id,
        request.initial_price,
        request.opens_at,
        request.closes_at,
    )?;

    if !request.initial_price.is_positive() {
        return Err(AuctionError::InvalidAmount {
            reason: "initial price must be positive".to_string(),
        });
    }
    if request.initial_price < config.minimum_initial_price {
        return Err(AuctionError::InvalidAmount {
            reason: format!(
                "initial price {} is below the minimum {}",
                request.initial_price, config.minimum_initial_price
            ),
        });
    }

    store
        .participant(request.owner)?
        .ok_or_else(|| AuctionError::not_found(EntityKind::Participant, request.owner))?;
    let item = store
        .item(request.item_id)?
        .ok_or_else(|| AuctionError::not_found(EntityKind::Item, request.item_id))?;

    let holds = store
        .holding(request.owner, request.item_id)?
        .is_some_and(|h| h.holds_item());
    if !holds {
        return Err(AuctionError::ItemNotOwned {
            owner: request.owner.to_string(),
            item_id: request.item_id.to_string(),
        });
    }
    if item.blocked {
        warn!(item_id = %item.item_id, "Listing rejected: item already under auction");
        return Err(AuctionError::ItemAlreadyBlocked {
            item_id: item.item_id.to_string(),
        });
    }

    let mut work = UnitOfWork::new();
    work.block_item(item.item_id).insert_auction(auction.clone());
    Ok(PreparedListing { auction, work })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AuctionRepository, InMemoryStore, Inventory};
    use chrono::{Duration, TimeZone};
    use types::item::Item;
    use types::participant::Participant;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn setup() -> (InMemoryStore, ParticipantId, ItemId) {
        let store = InMemoryStore::new();
        let owner = store
            .register_participant(Participant::new("Ada", "ada@example.com", Amount::from_u64(0)))
            .unwrap();
        let item = store.register_item(Item::new("Foil #12")).unwrap();
        store.grant_copies(owner, item, 1).unwrap();
        (store, owner, item)
    }

    fn request(owner: ParticipantId, item_id: ItemId) -> ListingRequest {
        ListingRequest {
            owner,
            item_id,
            initial_price: Amount::from_u64(10),
            opens_at: t0(),
            closes_at: t0() + Duration::days(1),
        }
    }

    #[test]
    fn test_open_blocks_item() {
        let (store, owner, item) = setup();
        let auction = open_auction(&store, &AuctionConfig::default(), request(owner, item)).unwrap();
        assert!(store.item(item).unwrap().unwrap().blocked);
        assert_eq!(store.auction(auction.auction_id).unwrap(), Some(auction));
    }

    #[test]
    fn test_prepared_listing_writes_nothing_until_commit() {
        let (store, owner, item) = setup();
        let listing = prepare_listing(&store, &AuctionConfig::default(), request(owner, item)).unwrap();
        assert!(!store.item(item).unwrap().unwrap().blocked);
        assert!(store.auction(listing.auction.auction_id).unwrap().is_none());

        let auction = listing.commit(&store).unwrap();
        assert!(store.item(item).unwrap().unwrap().blocked);
        assert_eq!(store.auction(auction.auction_id).unwrap(), Some(auction));
    }

    #[test]
    fn test_second_listing_rejected() {
        let (store, owner, item) = setup();
        open_auction(&store, &AuctionConfig::default(), request(owner, item)).unwrap();
        let err = open_auction(&store, &AuctionConfig::default(), request(owner, item)).unwrap_err();
        assert!(matches!(err, AuctionError::ItemAlreadyBlocked { .. }));
        assert_eq!(store.auctions_for_item(item).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_window_checked_first() {
        let (store, _, _) = setup();
        let mut req = request(ParticipantId::new(), ItemId::new());
        req.closes_at = req.opens_at;
        let err = open_auction(&store, &AuctionConfig::default(), req).unwrap_err();
        assert!(matches!(err, AuctionError::InvalidAuctionWindow { .. }));
    }

    #[test]
    fn test_zero_price_rejected() {
        let (store, owner, item) = setup();
        let mut req = request(owner, item);
        req.initial_price = Amount::ZERO;
        let err = open_auction(&store, &AuctionConfig::default(), req).unwrap_err();
        assert!(matches!(err, AuctionError::InvalidAmount { .. }));
    }

    #[test]
    fn test_not_owned() {
        let (store, _, item) = setup();
        let stranger = store
            .register_participant(Participant::new("Bo", "bo@example.com", Amount::ZERO))
            .unwrap();
        let err = open_auction(&store, &AuctionConfig::default(), request(stranger, item)).unwrap_err();
        assert!(matches!(err, AuctionError::ItemNotOwned { .. }));
        assert!(!store.item(item).unwrap().unwrap().blocked);
    }

    #[test]
    fn test_unknown_owner_and_item() {
        let (store, owner, item) = setup();
        let err = open_auction(
            &store,
            &AuctionConfig::default(),
            request(ParticipantId::new(), item),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::NotFound {
                entity: EntityKind::Participant,
                ..
            }
        ));
        let err = open_auction(&store, &AuctionConfig::default(), request(owner, ItemId::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            AuctionError::NotFound {
                entity: EntityKind::Item,
                ..
            }
        ));
    }
}
