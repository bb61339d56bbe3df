//! Append-only log of committed changes
//!
//! Producers append while still holding the auction lock that serialized
//! the change, right after the store commit succeeds. Events of one auction
//! therefore appear in commit order, and nothing is logged for a change that
//! did not commit.

use std::sync::{Mutex, MutexGuard, PoisonError};

use types::events::AuctionEvent;
use types::ids::AuctionId;

#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<AuctionEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: AuctionEvent) {
        self.guard().push(event);
    }

    pub fn snapshot(&self) -> Vec<AuctionEvent> {
        self.guard().clone()
    }

    pub fn drain(&self) -> Vec<AuctionEvent> {
        std::mem::take(&mut *self.guard())
    }

    /// Events of one auction, in log order
    pub fn for_auction(&self, auction_id: AuctionId) -> Vec<AuctionEvent> {
        self.guard()
            .iter()
            .filter(|e| e.auction_id() == auction_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<AuctionEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
