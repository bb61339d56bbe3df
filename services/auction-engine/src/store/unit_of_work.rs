//! Batched writes
//!
//! Each mutation carries its own precondition (a debit may not overdraw, a
//! block may not hit an already blocked item, ...). The store checks all of
//! them before applying any.

use chrono::{DateTime, Utc};
use types::auction::Auction;
use types::bid::Bid;
use types::ids::{AuctionId, ItemId, ParticipantId};
use types::numeric::Amount;

#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Credit {
        participant: ParticipantId,
        amount: Amount,
    },
    /// Fails with `InsufficientFunds` if the balance would go negative
    Debit {
        participant: ParticipantId,
        amount: Amount,
    },
    InsertAuction(Auction),
    /// Fails with `AlreadySettled` if the marker is already set
    MarkSettled {
        auction_id: AuctionId,
        settled_at: DateTime<Utc>,
    },
    AppendBid(Bid),
    /// Fails with `ItemBlocked` if the item is already blocked
    BlockItem(ItemId),
    UnblockItem(ItemId),
    AddCopies {
        owner: ParticipantId,
        item_id: ItemId,
        copies: u32,
    },
    /// Fails with `HoldingUnderflow` if the owner holds fewer copies
    RemoveCopies {
        owner: ParticipantId,
        item_id: ItemId,
        copies: u32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    mutations: Vec<Mutation>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    pub fn credit(&mut self, participant: ParticipantId, amount: Amount) -> &mut Self {
        self.push(Mutation::Credit {
            participant,
            amount,
        })
    }

    pub fn debit(&mut self, participant: ParticipantId, amount: Amount) -> &mut Self {
        self.push(Mutation::Debit {
            participant,
            amount,
        })
    }

    pub fn insert_auction(&mut self, auction: Auction) -> &mut Self {
        self.push(Mutation::InsertAuction(auction))
    }

    pub fn mark_settled(&mut self, auction_id: AuctionId, settled_at: DateTime<Utc>) -> &mut Self {
        self.push(Mutation::MarkSettled {
            auction_id,
            settled_at,
        })
    }

    pub fn append_bid(&mut self, bid: Bid) -> &mut Self {
        self.push(Mutation::AppendBid(bid))
    }

    pub fn block_item(&mut self, item_id: ItemId) -> &mut Self {
        self.push(Mutation::BlockItem(item_id))
    }

    pub fn unblock_item(&mut self, item_id: ItemId) -> &mut Self {
        self.push(Mutation::UnblockItem(item_id))
    }

    pub fn add_copies(&mut self, owner: ParticipantId, item_id: ItemId, copies: u32) -> &mut Self {
        self.push(Mutation::AddCopies {
            owner,
            item_id,
            copies,
        })
    }

    pub fn remove_copies(
        &mut self,
        owner: ParticipantId,
        item_id: ItemId,
        copies: u32,
    ) -> &mut Self {
        self.push(Mutation::RemoveCopies {
            owner,
            item_id,
            copies,
        })
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Total (credited, debited) staged for `participant`
    pub fn staged_flows(&self, participant: ParticipantId) -> (Amount, Amount) {
        let credited = self
            .mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::Credit {
                    participant: p,
                    amount,
                } if *p == participant => Some(*amount),
                _ => None,
            })
            .sum();
        let debited = self
            .mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::Debit {
                    participant: p,
                    amount,
                } if *p == participant => Some(*amount),
                _ => None,
            })
            .sum();
        (credited, debited)
    }
}
