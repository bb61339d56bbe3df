//! Simulation metrics
//!
//! Counts listings, bids (accepted and rejected by kind) and settlement
//! results. Everything here is deterministic for a given seed; wall-clock
//! timing lives in the run report instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use types::bid::BidRecord;
use types::errors::AuctionError;
use types::ids::AuctionId;
use types::numeric::Amount;
use types::settlement::SettlementReport;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimMetrics {
    pub ticks: u64,
    pub auctions_listed: u64,
    pub listings_rejected: u64,
    pub bids_submitted: u64,
    pub bids_accepted: u64,
    /// Rejected bids keyed by error kind
    pub rejections: BTreeMap<String, u64>,
    pub settlement_passes: u64,
    pub auctions_settled: u64,
    pub sales: u64,
    pub settlement_failures: u64,
    pub refunds_issued: u64,
    pub sale_volume: Amount,
    pub refunded_volume: Amount,
}

impl SimMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_listing(&mut self, result: &Result<AuctionId, AuctionError>) {
        match result {
            Ok(_) => self.auctions_listed += 1,
            Err(_) => self.listings_rejected += 1,
        }
    }

    pub fn record_bid(&mut self, result: &Result<BidRecord, AuctionError>) {
        self.bids_submitted += 1;
        match result {
            Ok(_) => self.bids_accepted += 1,
            Err(err) => *self.rejections.entry(err.kind().to_string()).or_insert(0) += 1,
        }
    }

    pub fn record_settlement(&mut self, report: &SettlementReport) {
        self.settlement_passes += 1;
        self.auctions_settled += report.settled.len() as u64;
        self.sales += report.sales() as u64;
        self.settlement_failures += report.failures.len() as u64;
        for outcome in &report.settled {
            self.refunds_issued += outcome.refunds.len() as u64;
            self.refunded_volume = self
                .refunded_volume
                .checked_add(outcome.total_refunded())
                .unwrap_or(self.refunded_volume);
        }
        self.sale_volume = self
            .sale_volume
            .checked_add(report.total_sale_value())
            .unwrap_or(self.sale_volume);
    }

    pub fn rejected(&self, kind: &str) -> u64 {
        self.rejections.get(kind).copied().unwrap_or(0)
    }

    /// Accepted share of submitted bids
    pub fn acceptance_rate(&self) -> f64 {
        if self.bids_submitted == 0 {
            return 0.0;
        }
        self.bids_accepted as f64 / self.bids_submitted as f64
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
