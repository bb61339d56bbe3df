//! Types library for the sealed-bid auction house
//!
//! This library provides the core type definitions shared by the auction
//! engine and the simulation tools.
//!
//! # Modules
//! - `ids`: Unique identifiers (ParticipantId, ItemId, AuctionId, BidId)
//! - `numeric`: Non-negative fixed-point `Amount`
//! - `participant`: Participants and their spendable balance
//! - `item`: Catalog items and holdings (collection entries)
//! - `auction`: Auction records and clock-derived lifecycle
//! - `bid`: Immutable bid records and their listing view
//! - `settlement`: Settlement outcomes and pass reports
//! - `events`: Auction event taxonomy
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod participant;
pub mod item;
pub mod auction;
pub mod bid;
pub mod settlement;
pub mod events;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::auction::*;
    pub use crate::bid::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::ids::*;
    pub use crate::item::*;
    pub use crate::numeric::*;
    pub use crate::participant::*;
    pub use crate::settlement::*;
}
