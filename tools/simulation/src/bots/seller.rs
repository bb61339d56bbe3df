//! Seller bot — lists items from its collection

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{ItemId, ParticipantId};
use types::numeric::Amount;

/// Configuration for the seller bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerConfig {
    /// Probability of listing on a given tick (0.0 to 1.0)
    pub listing_probability: f64,
    /// Initial price range, in cents
    pub min_price_cents: i64,
    pub max_price_cents: i64,
    /// Auction length range, in ticks
    pub min_duration_ticks: u32,
    pub max_duration_ticks: u32,
}

impl Default for SellerConfig {
    fn default() -> Self {
        Self {
            listing_probability: 0.3,
            min_price_cents: 100,
            max_price_cents: 5_000,
            min_duration_ticks: 3,
            max_duration_ticks: 12,
        }
    }
}

/// Listing the seller wants to open this tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingIntent {
    pub item_id: ItemId,
    pub initial_price: Amount,
    pub duration_ticks: u32,
}

pub struct SellerBot {
    pub participant_id: ParticipantId,
    pub config: SellerConfig,
    pub listings_attempted: usize,
    rng: ChaCha8Rng,
}

impl SellerBot {
    pub fn new(participant_id: ParticipantId, config: SellerConfig, seed: u64) -> Self {
        Self {
            participant_id,
            config,
            listings_attempted: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// `available` holds items the seller owns and nobody has blocked
    pub fn decide(&mut self, available: &[ItemId]) -> Option<ListingIntent> {
        if available.is_empty() || !self.rng.gen_bool(self.config.listing_probability) {
            return None;
        }
        let item_id = available[self.rng.gen_range(0..available.len())];
        let cents = self
            .rng
            .gen_range(self.config.min_price_cents..=self.config.max_price_cents);
        let duration_ticks = self
            .rng
            .gen_range(self.config.min_duration_ticks..=self.config.max_duration_ticks);
        let initial_price = Amount::new(Decimal::new(cents, 2))?;
        self.listings_attempted += 1;
        Some(ListingIntent {
            item_id,
            initial_price,
            duration_ticks,
        })
    }
}
