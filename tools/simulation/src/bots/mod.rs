//! Simulation bots

pub mod bidder;
pub mod seller;
