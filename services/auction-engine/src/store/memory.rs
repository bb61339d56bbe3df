//! In-memory store
//!
//! All records live behind a single `RwLock`. `commit` stages copies of the
//! records a unit of work touches, runs every mutation against the staged
//! copies, and only writes them back once all preconditions have held.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use types::auction::Auction;
use types::bid::Bid;
use types::errors::{EntityKind, StoreError};
use types::ids::{AuctionId, ItemId, ParticipantId};
use types::item::{Holding, Item};
use types::numeric::Amount;
use types::participant::Participant;

use super::{
    AuctionRepository, AuctionStore, BidRepository, Inventory, Mutation, ParticipantDirectory,
    UnitOfWork,
};

#[derive(Debug, Default)]
struct State {
    participants: HashMap<ParticipantId, Participant>,
    items: HashMap<ItemId, Item>,
    holdings: HashMap<(ParticipantId, ItemId), Holding>,
    auctions: HashMap<AuctionId, Auction>,
    /// Insertion-ordered bid history per auction
    bids: HashMap<AuctionId, Vec<Bid>>,
}

/// Records touched by one unit of work
#[derive(Debug, Default)]
struct Staged {
    participants: HashMap<ParticipantId, Participant>,
    items: HashMap<ItemId, Item>,
    holdings: HashMap<(ParticipantId, ItemId), Holding>,
    auctions: HashMap<AuctionId, Auction>,
    new_bids: Vec<Bid>,
}

/// Copy `key` from `committed` into `staged` on first touch
fn stage<'a, K, V>(
    staged: &'a mut HashMap<K, V>,
    committed: &HashMap<K, V>,
    key: K,
    entity: EntityKind,
) -> Result<&'a mut V, StoreError>
where
    K: Eq + Hash + Copy + Display,
    V: Clone,
{
    match staged.entry(key) {
        Entry::Occupied(e) => Ok(e.into_mut()),
        Entry::Vacant(e) => {
            let record = committed
                .get(&key)
                .cloned()
                .ok_or_else(|| StoreError::MissingRecord {
                    entity,
                    id: key.to_string(),
                })?;
            Ok(e.insert(record))
        }
    }
}

impl Staged {
    fn apply(&mut self, state: &State, mutation: Mutation) -> Result<(), StoreError> {
        match mutation {
            Mutation::Credit {
                participant,
                amount,
            } => {
                let p = stage(
                    &mut self.participants,
                    &state.participants,
                    participant,
                    EntityKind::Participant,
                )?;
                p.balance = p.balance.checked_add(amount).ok_or(StoreError::Overflow)?;
                p.version += 1;
            }
            Mutation::Debit {
                participant,
                amount,
            } => {
                let p = stage(
                    &mut self.participants,
                    &state.participants,
                    participant,
                    EntityKind::Participant,
                )?;
                let available = p.balance;
                p.balance =
                    available
                        .checked_sub(amount)
                        .ok_or_else(|| StoreError::InsufficientFunds {
                            participant: participant.to_string(),
                            required: amount.to_string(),
                            available: available.to_string(),
                        })?;
                p.version += 1;
            }
            Mutation::InsertAuction(auction) => {
                let id = auction.auction_id;
                if state.auctions.contains_key(&id) || self.auctions.contains_key(&id) {
                    return Err(StoreError::DuplicateRecord {
                        entity: EntityKind::Auction,
                        id: id.to_string(),
                    });
                }
                self.auctions.insert(id, auction);
            }
            Mutation::MarkSettled {
                auction_id,
                settled_at,
            } => {
                let auction = stage(
                    &mut self.auctions,
                    &state.auctions,
                    auction_id,
                    EntityKind::Auction,
                )?;
                if auction.settled_at.is_some() {
                    return Err(StoreError::AlreadySettled {
                        auction_id: auction_id.to_string(),
                    });
                }
                auction.settled_at = Some(settled_at);
            }
            Mutation::AppendBid(bid) => {
                stage(
                    &mut self.auctions,
                    &state.auctions,
                    bid.auction_id,
                    EntityKind::Auction,
                )?;
                let known = state
                    .bids
                    .get(&bid.auction_id)
                    .is_some_and(|bids| bids.iter().any(|b| b.bid_id == bid.bid_id))
                    || self.new_bids.iter().any(|b| b.bid_id == bid.bid_id);
                if known {
                    return Err(StoreError::DuplicateRecord {
                        entity: EntityKind::Bid,
                        id: bid.bid_id.to_string(),
                    });
                }
                self.new_bids.push(bid);
            }
            Mutation::BlockItem(item_id) => {
                let item = stage(&mut self.items, &state.items, item_id, EntityKind::Item)?;
                if item.blocked {
                    return Err(StoreError::ItemBlocked {
                        item_id: item_id.to_string(),
                    });
                }
                item.blocked = true;
            }
            Mutation::UnblockItem(item_id) => {
                let item = stage(&mut self.items, &state.items, item_id, EntityKind::Item)?;
                item.blocked = false;
            }
            Mutation::AddCopies {
                owner,
                item_id,
                copies,
            } => {
                stage(&mut self.items, &state.items, item_id, EntityKind::Item)?;
                let holding = self.holding_mut(state, owner, item_id);
                holding.copies = holding
                    .copies
                    .checked_add(copies)
                    .ok_or(StoreError::Overflow)?;
            }
            Mutation::RemoveCopies {
                owner,
                item_id,
                copies,
            } => {
                let holding = self.holding_mut(state, owner, item_id);
                holding.copies =
                    holding
                        .copies
                        .checked_sub(copies)
                        .ok_or_else(|| StoreError::HoldingUnderflow {
                            owner: owner.to_string(),
                            item_id: item_id.to_string(),
                        })?;
            }
        }
        Ok(())
    }

    /// Holdings are created on demand with zero copies
    fn holding_mut(&mut self, state: &State, owner: ParticipantId, item_id: ItemId) -> &mut Holding {
        self.holdings.entry((owner, item_id)).or_insert_with(|| {
            state
                .holdings
                .get(&(owner, item_id))
                .cloned()
                .unwrap_or_else(|| Holding::new(owner, item_id, 0))
        })
    }

    fn write_back(self, state: &mut State) {
        state.participants.extend(self.participants);
        state.items.extend(self.items);
        state.holdings.extend(self.holdings);
        state.auctions.extend(self.auctions);
        for bid in self.new_bids {
            state.bids.entry(bid.auction_id).or_default().push(bid);
        }
    }
}

/// Thread-safe in-memory implementation of every storage collaborator
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state.read().map_err(|_| StoreError::Unavailable {
            reason: "state lock poisoned".to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state.write().map_err(|_| StoreError::Unavailable {
            reason: "state lock poisoned".to_string(),
        })
    }

    // ───────────────────────── Seeding ─────────────────────────

    pub fn register_participant(&self, participant: Participant) -> Result<ParticipantId, StoreError> {
        let id = participant.participant_id;
        let mut state = self.write()?;
        if state.participants.contains_key(&id) {
            return Err(StoreError::DuplicateRecord {
                entity: EntityKind::Participant,
                id: id.to_string(),
            });
        }
        state.participants.insert(id, participant);
        Ok(id)
    }

    pub fn register_item(&self, item: Item) -> Result<ItemId, StoreError> {
        let id = item.item_id;
        let mut state = self.write()?;
        if state.items.contains_key(&id) {
            return Err(StoreError::DuplicateRecord {
                entity: EntityKind::Item,
                id: id.to_string(),
            });
        }
        state.items.insert(id, item);
        Ok(id)
    }

    /// Add copies of an existing item to a participant's collection
    pub fn grant_copies(
        &self,
        owner: ParticipantId,
        item_id: ItemId,
        copies: u32,
    ) -> Result<(), StoreError> {
        {
            let state = self.read()?;
            if !state.participants.contains_key(&owner) {
                return Err(StoreError::MissingRecord {
                    entity: EntityKind::Participant,
                    id: owner.to_string(),
                });
            }
        }
        let mut work = UnitOfWork::new();
        work.add_copies(owner, item_id, copies);
        self.commit(work)
    }

    // ───────────────────────── Snapshots ─────────────────────────

    pub fn participants(&self) -> Result<Vec<Participant>, StoreError> {
        let state = self.read()?;
        let mut all: Vec<Participant> = state.participants.values().cloned().collect();
        all.sort_by_key(|p| p.participant_id);
        Ok(all)
    }

    /// Sum of every participant's spendable balance
    pub fn total_balance(&self) -> Result<Amount, StoreError> {
        let state = self.read()?;
        Ok(state.participants.values().map(|p| p.balance).sum())
    }

    /// Total copies of `item_id` across all collections
    pub fn total_copies(&self, item_id: ItemId) -> Result<u64, StoreError> {
        let state = self.read()?;
        Ok(state
            .holdings
            .values()
            .filter(|h| h.item_id == item_id)
            .map(|h| u64::from(h.copies))
            .sum())
    }

    pub fn auctions(&self) -> Result<Vec<Auction>, StoreError> {
        let state = self.read()?;
        let mut all: Vec<Auction> = state.auctions.values().cloned().collect();
        all.sort_by_key(|a| a.auction_id);
        Ok(all)
    }
}

impl ParticipantDirectory for InMemoryStore {
    fn participant(&self, id: ParticipantId) -> Result<Option<Participant>, StoreError> {
        Ok(self.read()?.participants.get(&id).cloned())
    }
}

impl Inventory for InMemoryStore {
    fn item(&self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    fn holding(&self, owner: ParticipantId, item_id: ItemId) -> Result<Option<Holding>, StoreError> {
        Ok(self.read()?.holdings.get(&(owner, item_id)).cloned())
    }
}

impl AuctionRepository for InMemoryStore {
    fn auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        Ok(self.read()?.auctions.get(&id).cloned())
    }

    fn auctions_for_item(&self, item_id: ItemId) -> Result<Vec<Auction>, StoreError> {
        let state = self.read()?;
        let mut found: Vec<Auction> = state
            .auctions
            .values()
            .filter(|a| a.item_id == item_id)
            .cloned()
            .collect();
        found.sort_by_key(|a| a.auction_id);
        Ok(found)
    }

    fn unsettled_auctions(&self) -> Result<Vec<Auction>, StoreError> {
        let state = self.read()?;
        let mut found: Vec<Auction> = state
            .auctions
            .values()
            .filter(|a| a.settled_at.is_none())
            .cloned()
            .collect();
        found.sort_by_key(|a| a.auction_id);
        Ok(found)
    }
}

impl BidRepository for InMemoryStore {
    fn bids_for_auction(&self, auction_id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        Ok(self
            .read()?
            .bids
            .get(&auction_id)
            .cloned()
            .unwrap_or_default())
    }
}

impl AuctionStore for InMemoryStore {
    fn commit(&self, work: UnitOfWork) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let mut staged = Staged::default();
        for mutation in work.into_mutations() {
            staged.apply(&state, mutation)?;
        }
        staged.write_back(&mut state);
        Ok(())
    }
}
