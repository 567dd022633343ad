use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CashFlowHistory, Money};

/// Trailing-twelve-month aggregates derived from the quarterly history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtmMetrics {
    /// Per-quarter FCF over the full history, oldest first
    pub quarterly_fcf: Vec<Money>,
    pub ttm_operating_cf: Money,
    pub ttm_capex: Money,
    pub ttm_fcf: Money,
    pub ttm_net_income: Money,
    pub avg_quarterly_fcf: Money,
    /// Quarters actually summed: min(4, history length)
    pub window_quarters: usize,
}

/// Reduce the quarterly history to a TTM free-cash-flow baseline.
///
/// The window is the last min(4, len) quarters, so partial histories
/// still produce a baseline. An empty history yields all-zero metrics:
/// a degraded result, not an error — data-quality policing belongs to
/// the upstream provider.
pub fn aggregate_ttm(history: &CashFlowHistory) -> TtmMetrics {
    let quarterly_fcf: Vec<Money> = history
        .quarters
        .iter()
        .map(|q| q.operating_cash_flow + q.capex)
        .collect();

    let window = 4.min(history.quarters.len());
    let tail = &history.quarters[history.quarters.len() - window..];

    let ttm_operating_cf: Money = tail.iter().map(|q| q.operating_cash_flow).sum();
    let ttm_capex: Money = tail.iter().map(|q| q.capex).sum();
    let ttm_net_income: Money = tail.iter().map(|q| q.net_income).sum();
    let ttm_fcf = ttm_operating_cf + ttm_capex;

    let avg_quarterly_fcf = if window > 0 {
        ttm_fcf / Decimal::from(window as u32)
    } else {
        Decimal::ZERO
    };

    TtmMetrics {
        quarterly_fcf,
        ttm_operating_cf,
        ttm_capex,
        ttm_fcf,
        ttm_net_income,
        avg_quarterly_fcf,
        window_quarters: window,
    }
}
