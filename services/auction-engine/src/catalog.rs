//! Auction catalog — read-side queries over auctions

use std::sync::Arc;

use chrono::{DateTime, Utc};
use types::auction::{Auction, AuctionState, AuctionSummary};
use types::errors::{AuctionError, EntityKind};
use types::ids::{AuctionId, ItemId};

use crate::store::AuctionStore;

#[derive(Debug)]
pub struct AuctionCatalog<S> {
    store: Arc<S>,
}

impl<S: AuctionStore> AuctionCatalog<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn auction(&self, auction_id: AuctionId) -> Result<Auction, AuctionError> {
        self.store
            .auction(auction_id)?
            .ok_or_else(|| AuctionError::not_found(EntityKind::Auction, auction_id))
    }

    /// Auctions of `item_id` accepting bids at `now`, soonest closing first
    pub fn open_for_item(
        &self,
        item_id: ItemId,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuctionSummary>, AuctionError> {
        let item = self
            .store
            .item(item_id)?
            .ok_or_else(|| AuctionError::not_found(EntityKind::Item, item_id))?;
        let mut open: Vec<AuctionSummary> = self
            .store
            .auctions_for_item(item_id)?
            .into_iter()
            .filter(|a| a.is_open(now))
            .map(|a| a.summary(item.name.clone(), now))
            .collect();
        open.sort_by_key(|s| (s.closes_at, s.auction_id));
        Ok(open)
    }

    /// Unsettled auctions whose window has closed, oldest first
    pub fn expired_pending(&self, now: DateTime<Utc>) -> Result<Vec<Auction>, AuctionError> {
        let mut expired: Vec<Auction> = self
            .store
            .unsettled_auctions()?
            .into_iter()
            .filter(|a| a.state(now) == AuctionState::ExpiredPendingSettlement)
            .collect();
        expired.sort_by_key(|a| (a.closes_at, a.auction_id));
        Ok(expired)
    }

    pub fn state_of(
        &self,
        auction_id: AuctionId,
        now: DateTime<Utc>,
    ) -> Result<AuctionState, AuctionError> {
        Ok(self.auction(auction_id)?.state(now))
    }

    pub fn summary(
        &self,
        auction_id: AuctionId,
        now: DateTime<Utc>,
    ) -> Result<AuctionSummary, AuctionError> {
        let auction = self.auction(auction_id)?;
        let item = self
            .store
            .item(auction.item_id)?
            .ok_or_else(|| AuctionError::not_found(EntityKind::Item, auction.item_id))?;
        Ok(auction.summary(item.name, now))
    }
}
