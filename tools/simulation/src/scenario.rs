//! Auction market scenario
//!
//! Seeds a store with sellers, bidders and items, then steps a manual clock
//! tick by tick: sellers list, bidders place sealed offers, and every few
//! ticks a settlement pass runs. Money conservation is checked after every
//! pass.

use std::sync::Arc;
use std::time::Instant;

use auction_engine::store::{Inventory, ParticipantDirectory};
use auction_engine::{AuctionConfig, AuctionService, Clock, ConfigError, InMemoryStore, ManualClock};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use types::auction::AuctionState;
use types::errors::{AuctionError, StoreError};
use types::ids::{AuctionId, ItemId};
use types::item::Item;
use types::numeric::Amount;
use types::participant::Participant;

use crate::bots::bidder::{BidderBot, BidderConfig};
use crate::bots::seller::{SellerBot, SellerConfig};
use crate::metrics::SimMetrics;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Engine error: {0}")]
    Auction(#[from] AuctionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Scenario parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub seed: u64,
    pub sellers: usize,
    pub items_per_seller: usize,
    pub bidders: usize,
    /// Whole currency units each bidder starts with
    pub starting_balance: u64,
    pub ticks: u64,
    pub tick_minutes: i64,
    /// Run a settlement pass every this many ticks
    pub settle_every: u64,
    pub bidder: BidderConfig,
    pub seller: SellerConfig,
    pub engine: AuctionConfig,
}

impl SimulationConfig {
    /// Reject parameters the bots or the tick arithmetic cannot handle
    pub fn validate(&self) -> Result<(), SimulationError> {
        let seller = &self.seller;
        if seller.min_duration_ticks > seller.max_duration_ticks {
            return Err(SimulationError::InvalidScenario(format!(
                "duration range {}..={} is empty",
                seller.min_duration_ticks, seller.max_duration_ticks
            )));
        }
        if seller.min_price_cents > seller.max_price_cents {
            return Err(SimulationError::InvalidScenario(format!(
                "price range {}..={} is empty",
                seller.min_price_cents, seller.max_price_cents
            )));
        }
        let grace = seller.max_duration_ticks.checked_add(1).ok_or_else(|| {
            SimulationError::InvalidScenario("max_duration_ticks is too large".to_string())
        })?;
        self.span(grace)?;
        Ok(())
    }

    fn tick_length(&self) -> Result<Duration, SimulationError> {
        if self.tick_minutes <= 0 {
            return Err(SimulationError::InvalidScenario(format!(
                "tick_minutes must be positive, got {}",
                self.tick_minutes
            )));
        }
        Duration::try_minutes(self.tick_minutes).ok_or_else(|| {
            SimulationError::InvalidScenario(format!("tick of {} minutes", self.tick_minutes))
        })
    }

    /// Length of `ticks` consecutive ticks
    fn span(&self, ticks: u32) -> Result<Duration, SimulationError> {
        let factor = i32::try_from(ticks).map_err(|_| {
            SimulationError::InvalidScenario(format!("{} ticks do not fit a duration", ticks))
        })?;
        self.tick_length()?.checked_mul(factor).ok_or_else(|| {
            SimulationError::InvalidScenario(format!("{} ticks overflow a duration", ticks))
        })
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            sellers: 3,
            items_per_seller: 4,
            bidders: 8,
            starting_balance: 200,
            ticks: 200,
            tick_minutes: 10,
            settle_every: 5,
            bidder: BidderConfig::default(),
            seller: SellerConfig::default(),
            engine: AuctionConfig::default(),
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub metrics: SimMetrics,
    pub initial_total: Amount,
    pub final_balances: Amount,
    pub escrow_outstanding: Amount,
    /// Passes after which balances + escrow + sales differed from the start
    pub conservation_violations: u64,
    pub elapsed_ns: u64,
}

impl SimulationReport {
    pub fn conserved(&self) -> bool {
        self.conservation_violations == 0
    }
}

pub struct AuctionSimulation {
    config: SimulationConfig,
    service: AuctionService<InMemoryStore, Arc<ManualClock>>,
    store: Arc<InMemoryStore>,
    clock: Arc<ManualClock>,
    sellers: Vec<(SellerBot, Vec<ItemId>)>,
    bidders: Vec<BidderBot>,
    /// Every auction created, in creation order
    auctions: Vec<(AuctionId, Amount)>,
    metrics: SimMetrics,
    initial_total: Amount,
    conservation_violations: u64,
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

impl AuctionSimulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(epoch()));
        let service =
            AuctionService::with_config(Arc::clone(&store), Arc::clone(&clock), config.engine.clone())?;

        let mut sellers = Vec::with_capacity(config.sellers);
        for s in 0..config.sellers {
            let id = store.register_participant(Participant::new(
                format!("Seller {}", s),
                format!("seller{}@example.com", s),
                Amount::ZERO,
            ))?;
            let mut items = Vec::with_capacity(config.items_per_seller);
            for i in 0..config.items_per_seller {
                let item = store.register_item(Item::new(format!("Sticker {}-{}", s, i)))?;
                store.grant_copies(id, item, 1)?;
                items.push(item);
            }
            let bot = SellerBot::new(id, config.seller.clone(), config.seed.wrapping_add(s as u64));
            sellers.push((bot, items));
        }

        let mut bidders = Vec::with_capacity(config.bidders);
        for b in 0..config.bidders {
            let id = store.register_participant(Participant::new(
                format!("Bidder {}", b),
                format!("bidder{}@example.com", b),
                Amount::from_u64(config.starting_balance),
            ))?;
            bidders.push(BidderBot::new(
                id,
                config.bidder.clone(),
                config.seed.wrapping_mul(31).wrapping_add(1_000 + b as u64),
            ));
        }

        let initial_total = store.total_balance()?;
        Ok(Self {
            config,
            service,
            store,
            clock,
            sellers,
            bidders,
            auctions: Vec::new(),
            metrics: SimMetrics::new(),
            initial_total,
            conservation_violations: 0,
        })
    }

    pub fn run(mut self) -> Result<SimulationReport, SimulationError> {
        let start = Instant::now();
        for tick in 1..=self.config.ticks {
            self.step()?;
            if tick % self.config.settle_every.max(1) == 0 {
                self.settle()?;
            }
        }
        // Let everything still running close, then settle it.
        let grace = self
            .config
            .seller
            .max_duration_ticks
            .checked_add(1)
            .ok_or_else(|| {
                SimulationError::InvalidScenario("max_duration_ticks is too large".to_string())
            })?;
        self.clock.advance(self.config.span(grace)?);
        self.settle()?;

        let report = SimulationReport {
            metrics: self.metrics,
            initial_total: self.initial_total,
            final_balances: self.store.total_balance()?,
            escrow_outstanding: self.service.escrow_outstanding()?,
            conservation_violations: self.conservation_violations,
            elapsed_ns: start.elapsed().as_nanos() as u64,
        };
        info!(
            listed = report.metrics.auctions_listed,
            bids = report.metrics.bids_submitted,
            accepted = report.metrics.bids_accepted,
            sales = report.metrics.sales,
            conserved = report.conserved(),
            "Simulation finished"
        );
        Ok(report)
    }

    fn step(&mut self) -> Result<(), SimulationError> {
        let tick = self.config.tick_length()?;
        self.clock.advance(tick);
        self.metrics.ticks += 1;
        let now = self.clock.now();

        for s in 0..self.sellers.len() {
            let available = self.available_items(s)?;
            let (bot, _) = &mut self.sellers[s];
            if let Some(intent) = bot.decide(&available) {
                let closes_at = now + self.config.span(intent.duration_ticks)?;
                let result = self.service.create_auction(
                    bot.participant_id,
                    intent.item_id,
                    intent.initial_price,
                    now,
                    closes_at,
                );
                self.metrics.record_listing(&result);
                if let Ok(auction_id) = result {
                    self.auctions.push((auction_id, intent.initial_price));
                }
            }
        }

        let open = self.open_auctions()?;
        for b in 0..self.bidders.len() {
            let bidder_id = self.bidders[b].participant_id;
            let balance = self
                .store
                .participant(bidder_id)?
                .map(|p| p.balance)
                .unwrap_or(Amount::ZERO);
            let bot = &mut self.bidders[b];
            bot.retain(&open);
            if let Some((auction_id, offer)) = bot.decide(&open, balance) {
                let result = self.service.place_bid(auction_id, bidder_id, offer);
                self.metrics.record_bid(&result);
                bot.observe(auction_id);
            }
        }
        Ok(())
    }

    fn settle(&mut self) -> Result<(), SimulationError> {
        let report = self.service.run_settlement_pass(self.clock.now())?;
        self.metrics.record_settlement(&report);

        let balances = self.store.total_balance()?;
        let escrow = self.service.escrow_outstanding()?;
        let accounted = balances
            .checked_add(escrow)
            .and_then(|a| a.checked_add(self.metrics.sale_volume));
        if accounted != Some(self.initial_total) {
            self.conservation_violations += 1;
            warn!(
                balances = %balances,
                escrow = %escrow,
                sold = %self.metrics.sale_volume,
                initial = %self.initial_total,
                "Conservation check failed"
            );
        }
        Ok(())
    }

    /// Items seller `s` holds that are not under auction
    fn available_items(&self, s: usize) -> Result<Vec<ItemId>, SimulationError> {
        let (bot, items) = &self.sellers[s];
        let mut available = Vec::new();
        for item_id in items {
            let held = self
                .store
                .holding(bot.participant_id, *item_id)?
                .is_some_and(|h| h.holds_item());
            let blocked = self.store.item(*item_id)?.is_some_and(|i| i.blocked);
            if held && !blocked {
                available.push(*item_id);
            }
        }
        Ok(available)
    }

    fn open_auctions(&self) -> Result<Vec<(AuctionId, Amount)>, SimulationError> {
        let mut open = Vec::new();
        for (auction_id, price) in &self.auctions {
            if self.service.auction_state(*auction_id)? == AuctionState::Open {
                open.push((*auction_id, *price));
            }
        }
        Ok(open)
    }
}

/// Run one scenario end to end
pub fn run(config: SimulationConfig) -> Result<SimulationReport, SimulationError> {
    AuctionSimulation::new(config)?.run()
}
