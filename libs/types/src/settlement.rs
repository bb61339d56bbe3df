//! Settlement outcomes and settlement-pass reports

use crate::errors::AuctionError;
use crate::ids::{AuctionId, BidId, ItemId, ParticipantId};
use crate::numeric::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Winning bid of a settled auction. The price is consumed, not refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub winner: ParticipantId,
    pub bid_id: BidId,
    pub price: Amount,
}

/// Escrow returned to a losing bidder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub participant: ParticipantId,
    pub amount: Amount,
}

/// Result of settling one auction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub auction_id: AuctionId,
    pub item_id: ItemId,
    pub seller: ParticipantId,
    /// None when no bid was ever placed
    pub sale: Option<Sale>,
    pub refunds: Vec<Refund>,
    pub settled_at: DateTime<Utc>,
}

impl SettlementOutcome {
    pub fn is_sale(&self) -> bool {
        self.sale.is_some()
    }

    pub fn winner(&self) -> Option<ParticipantId> {
        self.sale.as_ref().map(|s| s.winner)
    }

    pub fn total_refunded(&self) -> Amount {
        self.refunds.iter().map(|r| r.amount).sum()
    }
}

/// An auction the pass could not settle
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementFailure {
    pub auction_id: AuctionId,
    pub error: AuctionError,
}

/// Everything one settlement pass did
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettlementReport {
    pub settled: Vec<SettlementOutcome>,
    pub failures: Vec<SettlementFailure>,
    /// Expired auctions left for a later pass because of the per-pass cap
    pub deferred: usize,
}

impl SettlementReport {
    pub fn sales(&self) -> usize {
        self.settled.iter().filter(|o| o.is_sale()).count()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Sum of winning prices consumed by this pass
    pub fn total_sale_value(&self) -> Amount {
        self.settled
            .iter()
            .filter_map(|o| o.sale.as_ref().map(|s| s.price))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(sale: Option<Sale>, refunds: Vec<Refund>) -> SettlementOutcome {
        SettlementOutcome {
            auction_id: AuctionId::new(),
            item_id: ItemId::new(),
            seller: ParticipantId::new(),
            sale,
            refunds,
            settled_at: Utc::now(),
        }
    }

    #[test]
    fn test_outcome_totals() {
        let winner = ParticipantId::new();
        let o = outcome(
            Some(Sale {
                winner,
                bid_id: BidId::new(),
                price: Amount::from_u64(15),
            }),
            vec![
                Refund {
                    participant: ParticipantId::new(),
                    amount: Amount::from_u64(10),
                },
                Refund {
                    participant: ParticipantId::new(),
                    amount: Amount::from_u64(12),
                },
            ],
        );
        assert!(o.is_sale());
        assert_eq!(o.winner(), Some(winner));
        assert_eq!(o.total_refunded(), Amount::from_u64(22));
    }

    #[test]
    fn test_report_counts() {
        let report = SettlementReport {
            settled: vec![
                outcome(None, vec![]),
                outcome(
                    Some(Sale {
                        winner: ParticipantId::new(),
                        bid_id: BidId::new(),
                        price: Amount::from_u64(40),
                    }),
                    vec![],
                ),
            ],
            failures: vec![],
            deferred: 0,
        };
        assert_eq!(report.sales(), 1);
        assert_eq!(report.total_sale_value(), Amount::from_u64(40));
        assert!(report.is_clean());
    }
}
