//! Storage collaborators
//!
//! Reads go through the four repository traits. Writes are batched into a
//! `UnitOfWork` and applied by `AuctionStore::commit`, which either applies
//! every mutation or none of them.

pub mod memory;
pub mod unit_of_work;

pub use memory::InMemoryStore;
pub use unit_of_work::{Mutation, UnitOfWork};

use types::auction::Auction;
use types::bid::Bid;
use types::errors::StoreError;
use types::ids::{AuctionId, ItemId, ParticipantId};
use types::item::{Holding, Item};
use types::participant::Participant;

pub trait ParticipantDirectory {
    fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError>;
}

pub trait Inventory {
    fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError>;

    fn holding(&self, owner: ParticipantId, item_id: ItemId) -> Result<Option<Holding>, StoreError>;
}

pub trait AuctionRepository {
    fn auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError>;

    fn auctions_for_item(&self, item_id: ItemId) -> Result<Vec<Auction>, StoreError>;

    /// Every auction without a `settled_at` marker, in any lifecycle state
    fn unsettled_auctions(&self) -> Result<Vec<Auction>, StoreError>;
}

pub trait BidRepository {
    /// Bids of one auction in insertion order
    fn bids_for_auction(&self, auction_id: AuctionId) -> Result<Vec<Bid>, StoreError>;
}

/// Full storage surface the engine runs against
pub trait AuctionStore:
    ParticipantDirectory + Inventory + AuctionRepository + BidRepository + Send + Sync
{
    fn commit(&self, work: UnitOfWork) -> Result<(), StoreError>;
}
