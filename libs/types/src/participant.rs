//! Participant (collector) records
//!
//! A participant's `balance` is always the spendable amount: escrow for open
//! bids has already been debited from it.

use crate::ids::ParticipantId;
use crate::numeric::Amount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub participant_id: ParticipantId,
    pub name: String,
    pub email: String,
    pub balance: Amount,
    /// Bumped on every committed balance change
    pub version: u64,
}

impl Participant {
    pub fn new(name: impl Into<String>, email: impl Into<String>, balance: Amount) -> Self {
        Self {
            participant_id: ParticipantId::new(),
            name: name.into(),
            email: email.into(),
            balance,
            version: 0,
        }
    }

    /// Whether the spendable balance covers `amount`
    pub fn can_afford(&self, amount: Amount) -> bool {
        self.balance >= amount
    }
}
