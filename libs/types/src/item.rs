//! Collectible items and the holdings that record who owns copies of them

use crate::ids::{ItemId, ParticipantId};
use serde::{Deserialize, Serialize};

/// A catalog item. `blocked` is set while the item is listed in a
/// non-settled auction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub name: String,
    pub blocked: bool,
}

impl Item {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            item_id: ItemId::new(),
            name: name.into(),
            blocked: false,
        }
    }
}

/// Collection entry: how many copies of an item a participant holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub owner: ParticipantId,
    pub item_id: ItemId,
    pub copies: u32,
}

impl Holding {
    pub fn new(owner: ParticipantId, item_id: ItemId, copies: u32) -> Self {
        Self {
            owner,
            item_id,
            copies,
        }
    }

    /// Owner holds at least one copy
    pub fn holds_item(&self) -> bool {
        self.copies > 0
    }
}
