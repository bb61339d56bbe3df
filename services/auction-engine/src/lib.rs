//! Auction Engine Service
//!
//! Sealed-bid auctions of collectible items:
//! - Listing an owned item blocks it until settlement
//! - Bids are escrowed as real debits and superseded by the bidder's own raises
//! - Expired auctions are settled by a periodic pass that transfers the item
//!   to the highest bidder and refunds everyone else
//!
//! All writes go through a unit of work committed atomically by the store;
//! per-auction and per-participant locks serialize conflicting operations.

pub mod auction;
pub mod bid_ledger;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod escrow;
pub mod event_log;
pub mod ledger;
pub mod locks;
pub mod service;
pub mod settlement;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuctionConfig, ConfigError};
pub use event_log::EventLog;
pub use service::AuctionService;
pub use store::{AuctionStore, InMemoryStore, UnitOfWork};
