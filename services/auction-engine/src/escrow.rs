//! Escrow rule
//!
//! Escrow is a real debit taken at bid time, so a participant's stored
//! balance is always their available balance. A bidder's escrow on one
//! auction is the amount of their latest bid there; earlier bids of theirs
//! are superseded and hold nothing.
//!
//! Everything here is pure: it reads bid histories and amounts and says what
//! has to move. The bid ledger and the settlement engine turn the answers
//! into ledger mutations.

use std::collections::HashMap;

use types::bid::Bid;
use types::ids::ParticipantId;
use types::numeric::Amount;

/// Funds moved by replacing `released` with `locked`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowDelta {
    /// Previously held escrow credited back
    pub released: Amount,
    /// New escrow debited
    pub locked: Amount,
}

impl EscrowDelta {
    /// Net reduction of the bidder's balance, if any
    pub fn net_debit(&self) -> Amount {
        self.locked.checked_sub(self.released).unwrap_or(Amount::ZERO)
    }
}

/// What settlement does with one bidder's current escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Winner: escrow becomes the sale price
    Consume(Amount),
    /// Everyone else: escrow goes back to the balance
    Refund(Amount),
}

pub fn escrow_delta(previous: Amount, next: Amount) -> EscrowDelta {
    EscrowDelta {
        released: previous,
        locked: next,
    }
}

/// Balance after replacing escrow `previous` with `next`; None if it would
/// go negative
pub fn available_after(balance: Amount, previous: Amount, next: Amount) -> Option<Amount> {
    balance.checked_add(previous)?.checked_sub(next)
}

/// Whether a stored balance covers a new bid
pub fn covers(balance: Amount, amount: Amount) -> bool {
    balance >= amount
}

/// Latest bid per bidder, ordered by sequence
pub fn current_bids(bids: &[Bid]) -> Vec<&Bid> {
    let mut latest: HashMap<ParticipantId, &Bid> = HashMap::new();
    for bid in bids {
        latest
            .entry(bid.bidder)
            .and_modify(|held| {
                if bid.sequence > held.sequence {
                    *held = bid;
                }
            })
            .or_insert(bid);
    }
    let mut current: Vec<&Bid> = latest.into_values().collect();
    current.sort_by_key(|b| b.sequence);
    current
}

/// Highest current bid. Equal amounts go to the earliest bid.
pub fn highest_bid(bids: &[Bid]) -> Option<&Bid> {
    current_bids(bids).into_iter().reduce(|best, bid| {
        if bid.amount > best.amount
            || (bid.amount == best.amount && (bid.placed_at, bid.sequence) < (best.placed_at, best.sequence))
        {
            bid
        } else {
            best
        }
    })
}

/// Amount `bidder` currently has escrowed in this history
pub fn current_escrow(bids: &[Bid], bidder: ParticipantId) -> Amount {
    bids.iter()
        .filter(|b| b.bidder == bidder)
        .max_by_key(|b| b.sequence)
        .map(|b| b.amount)
        .unwrap_or(Amount::ZERO)
}

/// Sum of every bidder's current escrow
pub fn total_escrow(bids: &[Bid]) -> Amount {
    current_bids(bids).into_iter().map(|b| b.amount).sum()
}

/// Release decision for every current bid, in sequence order
pub fn settlement_release(bids: &[Bid]) -> Vec<(&Bid, Release)> {
    let winner = highest_bid(bids).map(|b| b.bid_id);
    current_bids(bids)
        .into_iter()
        .map(|bid| {
            let release = if Some(bid.bid_id) == winner {
                Release::Consume(bid.amount)
            } else {
                Release::Refund(bid.amount)
            };
            (bid, release)
        })
        .collect()
}
