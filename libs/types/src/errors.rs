//! Error types for the auction house
//!
//! `AuctionError` is what callers see; `StoreError` is what storage
//! collaborators report. Storage failures that correspond to a business rule
//! (a debit that would go negative, an item that is already blocked) are
//! translated into the matching `AuctionError` kind.

use std::fmt;
use thiserror::Error;

/// Entity kinds referenced by not-found errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Participant,
    Item,
    Holding,
    Auction,
    Bid,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Participant => "Participant",
            EntityKind::Item => "Item",
            EntityKind::Holding => "Holding",
            EntityKind::Auction => "Auction",
            EntityKind::Bid => "Bid",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by auction operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuctionError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("Invalid auction window: opens at {opened_at}, closes at {closes_at}")]
    InvalidAuctionWindow { opened_at: String, closes_at: String },

    #[error("Participant {owner} does not hold item {item_id}")]
    ItemNotOwned { owner: String, item_id: String },

    #[error("Item {item_id} is already under auction")]
    ItemAlreadyBlocked { item_id: String },

    #[error("Auction {auction_id} is not open for bids")]
    AuctionClosed { auction_id: String },

    /// Carries only the offered amount: the current highest bid is sealed.
    #[error("Bid offer {offered} is too low")]
    BidTooLow { offered: String },

    #[error("Insufficient balance for participant {participant}: required {required}, available {available}")]
    InsufficientBalance {
        participant: String,
        required: String,
        available: String,
    },

    #[error("Auction {auction_id} has not expired: closes at {closes_at}")]
    AuctionNotExpired { auction_id: String, closes_at: String },

    #[error("Auction {auction_id} already settled")]
    AlreadySettled { auction_id: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl AuctionError {
    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        AuctionError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable kind, used in logs and settlement reports
    pub fn kind(&self) -> &'static str {
        match self {
            AuctionError::NotFound { .. } => "NOT_FOUND",
            AuctionError::InvalidAuctionWindow { .. } => "INVALID_AUCTION_WINDOW",
            AuctionError::ItemNotOwned { .. } => "ITEM_NOT_OWNED",
            AuctionError::ItemAlreadyBlocked { .. } => "ITEM_ALREADY_BLOCKED",
            AuctionError::AuctionClosed { .. } => "AUCTION_CLOSED",
            AuctionError::BidTooLow { .. } => "BID_TOO_LOW",
            AuctionError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            AuctionError::AuctionNotExpired { .. } => "AUCTION_NOT_EXPIRED",
            AuctionError::AlreadySettled { .. } => "ALREADY_SETTLED",
            AuctionError::InvalidAmount { .. } => "INVALID_AMOUNT",
            AuctionError::Storage(_) => "STORAGE",
        }
    }
}

/// Errors reported by storage collaborators when applying a unit of work.
///
/// A failed commit leaves the store untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{entity} record missing: {id}")]
    MissingRecord { entity: EntityKind, id: String },

    #[error("{entity} record already exists: {id}")]
    DuplicateRecord { entity: EntityKind, id: String },

    #[error("Debit would overdraw participant {participant}: required {required}, available {available}")]
    InsufficientFunds {
        participant: String,
        required: String,
        available: String,
    },

    #[error("Item {item_id} is already blocked")]
    ItemBlocked { item_id: String },

    #[error("Auction {auction_id} already marked settled")]
    AlreadySettled { auction_id: String },

    #[error("Participant {owner} has no copy of item {item_id} to give up")]
    HoldingUnderflow { owner: String, item_id: String },

    #[error("Arithmetic overflow in balance or holding update")]
    Overflow,

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<StoreError> for AuctionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingRecord { entity, id } => AuctionError::NotFound { entity, id },
            StoreError::InsufficientFunds {
                participant,
                required,
                available,
            } => AuctionError::InsufficientBalance {
                participant,
                required,
                available,
            },
            StoreError::ItemBlocked { item_id } => AuctionError::ItemAlreadyBlocked { item_id },
            StoreError::AlreadySettled { auction_id } => AuctionError::AlreadySettled { auction_id },
            StoreError::HoldingUnderflow { owner, item_id } => {
                AuctionError::ItemNotOwned { owner, item_id }
            }
            other => AuctionError::Storage(other),
        }
    }
}
