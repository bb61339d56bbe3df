//! Bidder bot — private valuations and sealed raises
//!
//! The bot never sees other offers. It keeps a private valuation per
//! auction, starts at the initial price, and raises by a random step after
//! every attempt until the next offer would exceed its valuation.

use std::collections::HashMap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::ids::{AuctionId, ParticipantId};
use types::numeric::Amount;

/// Configuration for the bidder bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidderConfig {
    /// Probability of acting on a given tick (0.0 to 1.0)
    pub activity: f64,
    /// Valuation is the initial price marked up by up to this many percent
    pub max_markup_pct: u32,
    /// Raise step range, in cents
    pub min_raise_cents: i64,
    pub max_raise_cents: i64,
    /// Probability of submitting an offer the balance cannot cover
    pub overreach_ratio: f64,
}

impl Default for BidderConfig {
    fn default() -> Self {
        Self {
            activity: 0.6,
            max_markup_pct: 150,
            min_raise_cents: 50,
            max_raise_cents: 500,
            overreach_ratio: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
struct Intent {
    valuation: Amount,
    next_offer: Amount,
}

/// Bidder with deterministic seeded RNG.
pub struct BidderBot {
    pub participant_id: ParticipantId,
    pub config: BidderConfig,
    pub bids_submitted: usize,
    intents: HashMap<AuctionId, Intent>,
    rng: ChaCha8Rng,
}

impl BidderBot {
    /// Create a new bidder with a deterministic seed.
    pub fn new(participant_id: ParticipantId, config: BidderConfig, seed: u64) -> Self {
        Self {
            participant_id,
            config,
            bids_submitted: 0,
            intents: HashMap::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Pick an auction and an offer, or sit the tick out.
    ///
    /// `open` lists auctions currently taking bids with their initial price.
    pub fn decide(
        &mut self,
        open: &[(AuctionId, Amount)],
        balance: Amount,
    ) -> Option<(AuctionId, Amount)> {
        if open.is_empty() || !self.rng.gen_bool(self.config.activity) {
            return None;
        }
        let (auction_id, initial_price) = open[self.rng.gen_range(0..open.len())];
        let markup = self.rng.gen_range(0..=self.config.max_markup_pct);
        let intent = self.intents.entry(auction_id).or_insert_with(|| Intent {
            valuation: mark_up(initial_price, markup),
            next_offer: initial_price,
        });

        if intent.next_offer > intent.valuation {
            return None;
        }
        if intent.next_offer > balance && !self.rng.gen_bool(self.config.overreach_ratio) {
            return None;
        }
        self.bids_submitted += 1;
        Some((auction_id, intent.next_offer))
    }

    /// Move the next offer up after an attempt, accepted or not.
    pub fn observe(&mut self, auction_id: AuctionId) {
        let cents = self
            .rng
            .gen_range(self.config.min_raise_cents..=self.config.max_raise_cents);
        if let Some(intent) = self.intents.get_mut(&auction_id) {
            let step = Amount::new(Decimal::new(cents, 2)).unwrap_or(Amount::ZERO);
            intent.next_offer = intent.next_offer.checked_add(step).unwrap_or(intent.valuation);
        }
    }

    /// Forget auctions that no longer take bids
    pub fn retain(&mut self, open: &[(AuctionId, Amount)]) {
        self.intents
            .retain(|id, _| open.iter().any(|(open_id, _)| open_id == id));
    }
}

fn mark_up(price: Amount, pct: u32) -> Amount {
    let factor = Decimal::ONE + Decimal::new(i64::from(pct), 2);
    Amount::new((price.as_decimal() * factor).round_dp(2)).unwrap_or(price)
}
