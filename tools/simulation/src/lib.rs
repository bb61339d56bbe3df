//! Simulation & Stress Testing Framework
//!
//! Deterministic, seeded market simulation for the sealed-bid auction
//! engine. Sellers list items, bidders place sealed offers against private
//! valuations, and periodic settlement passes resolve expired auctions while
//! money conservation is checked throughout.
//!
//! # Modules
//! - `bots` — Bidder and seller bots
//! - `scenario` — Tick-driven market runner and run report
//! - `metrics` — Listing, bid and settlement counters

pub mod bots;
pub mod metrics;
pub mod scenario;

pub use scenario::{run, AuctionSimulation, SimulationConfig, SimulationError, SimulationReport};

/// Crate version constant
pub const VERSION: &str = "1.0.0";
