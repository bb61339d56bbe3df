//! Ledger — participant balances
//!
//! Owns the per-participant locks and stages credits and debits into a unit
//! of work. A staged debit is checked against the stored balance plus
//! whatever the same unit of work already credits or debits, so the commit
//! can never take a balance below zero.

use std::sync::Arc;

use types::errors::{AuctionError, EntityKind};
use types::ids::ParticipantId;
use types::numeric::Amount;
use types::participant::Participant;

use crate::locks::{LockRegistry, LockSet};
use crate::store::{AuctionStore, UnitOfWork};

#[derive(Debug)]
pub struct Ledger<S> {
    store: Arc<S>,
    locks: LockRegistry<ParticipantId>,
}

impl<S: AuctionStore> Ledger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: LockRegistry::new(),
        }
    }

    /// Locks for `participants`, acquired in ascending id order on `hold`
    pub fn lock(&self, participants: impl IntoIterator<Item = ParticipantId>) -> LockSet {
        self.locks.lock_set(participants)
    }

    pub fn participant(&self, id: ParticipantId) -> Result<Participant, AuctionError> {
        self.store
            .participant(id)?
            .ok_or_else(|| AuctionError::not_found(EntityKind::Participant, id))
    }

    pub fn balance_of(&self, id: ParticipantId) -> Result<Amount, AuctionError> {
        Ok(self.participant(id)?.balance)
    }

    /// Stage a credit. Zero amounts are skipped.
    pub fn stage_credit(&self, work: &mut UnitOfWork, participant: ParticipantId, amount: Amount) {
        if amount.is_positive() {
            work.credit(participant, amount);
        }
    }

    /// Stage a debit after checking it against the stored balance and the
    /// flows already staged for this participant.
    pub fn stage_debit(
        &self,
        work: &mut UnitOfWork,
        participant: ParticipantId,
        amount: Amount,
    ) -> Result<(), AuctionError> {
        if amount.is_zero() {
            return Ok(());
        }
        let balance = self.balance_of(participant)?;
        let (credited, debited) = work.staged_flows(participant);
        let projected = balance
            .checked_add(credited)
            .and_then(|b| b.checked_sub(debited))
            .unwrap_or(Amount::ZERO);
        if projected < amount {
            return Err(AuctionError::InsufficientBalance {
                participant: participant.to_string(),
                required: amount.to_string(),
                available: projected.to_string(),
            });
        }
        work.debit(participant, amount);
        Ok(())
    }
}
