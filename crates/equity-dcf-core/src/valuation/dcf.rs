use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{
    with_metadata, CashFlowHistory, CompanyFinancials, ComputationOutput, EsgProfile, Money,
    Multiple, Rate, ValuationAssumptions,
};
use crate::EquityDcfResult;

use super::historical::{aggregate_ttm, TtmMetrics};
use super::projection::project_cash_flows;
use super::terminal::{calculate_terminal_value, TerminalValueOutput};
use super::wacc::{calculate_wacc, WaccOutput};

#[cfg(feature = "scenarios")]
use crate::scenarios::sensitivity::{build_sensitivity, SensitivityOutput};
#[cfg(feature = "scenarios")]
use crate::scenarios::stress::{run_stress, StressOutput};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Complete input for one valuation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationInput {
    pub company: CompanyFinancials,
    #[serde(default)]
    pub history: CashFlowHistory,
    #[serde(default)]
    pub assumptions: ValuationAssumptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub esg: Option<EsgProfile>,
}

/// Buy/hold/sell classification from the upside percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Buy,
    Hold,
    Sell,
}

impl Verdict {
    /// Upside above 15% reads as a buy, below -10% as a sell.
    pub fn from_upside(upside_pct: Decimal) -> Self {
        if upside_pct > dec!(15) {
            Verdict::Buy
        } else if upside_pct > dec!(-10) {
            Verdict::Hold
        } else {
            Verdict::Sell
        }
    }
}

/// Aggregate result of one valuation run. Immutable once constructed;
/// every field is plain JSON-serializable data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationOutput {
    pub wacc: WaccOutput,
    pub historical: TtmMetrics,
    /// Projected FCF per forecast year
    pub projected_fcf: Vec<Money>,
    /// Present value of each projected year
    pub pv_fcf: Vec<Money>,
    pub terminal: TerminalValueOutput,
    /// Sum of discounted FCFs plus discounted terminal value
    pub enterprise_value_dcf: Money,
    /// EV(DCF) minus total debt plus cash
    pub equity_value: Money,
    pub intrinsic_value_per_share: Money,
    pub current_price: Money,
    pub upside_pct: Decimal,
    /// Simplified geometric-mean IRR against the market enterprise
    /// value, not a cash-flow root-find
    pub irr: Rate,
    pub ev_fcf_multiple: Multiple,
    pub verdict: Verdict,
    #[cfg(feature = "scenarios")]
    pub stress: StressOutput,
    #[cfg(feature = "scenarios")]
    pub sensitivity: SensitivityOutput,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full intrinsic valuation pipeline: WACC, TTM baseline,
/// projection, terminal value, discounting, equity bridge, and the
/// stress and sensitivity post-processing branches.
pub fn run_valuation(input: &ValuationInput) -> EquityDcfResult<ComputationOutput<ValuationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.company.validate()?;
    input.assumptions.validate()?;

    // --- Discount rate ---
    let wacc_out = calculate_wacc(&input.company, &input.assumptions, input.esg.as_ref())?;
    for w in &wacc_out.warnings {
        warnings.push(format!("[WACC] {w}"));
    }
    let wacc_result = wacc_out.result;
    let wacc = wacc_result.wacc;

    // --- TTM baseline ---
    let historical = aggregate_ttm(&input.history);
    if historical.window_quarters == 0 {
        warnings.push("No quarterly history; TTM baseline degraded to zero".into());
    }

    // --- Projection ---
    let projected_fcf = project_cash_flows(historical.ttm_fcf, &input.assumptions);
    let pv_fcf = discount_series(&projected_fcf, wacc);

    // --- Terminal value ---
    let final_fcf = projected_fcf.last().copied().unwrap_or(Decimal::ZERO);
    let terminal = calculate_terminal_value(
        final_fcf,
        wacc,
        input.assumptions.perpetual_growth_rate,
        input.assumptions.forecast_years,
    );
    if terminal.growth_clamped {
        warnings.push(format!(
            "Perpetual growth ({}) met or exceeded WACC ({wacc}); halved to {}",
            input.assumptions.perpetual_growth_rate, terminal.effective_growth_rate
        ));
    }

    // --- Enterprise value and equity bridge ---
    let pv_sum: Money = pv_fcf.iter().copied().sum();
    let enterprise_value_dcf = pv_sum + terminal.pv_terminal_value;
    let equity_value = enterprise_value_dcf - input.company.total_debt + input.company.cash;

    let intrinsic_value_per_share = if input.company.shares_outstanding > Decimal::ZERO {
        equity_value / input.company.shares_outstanding
    } else {
        Decimal::ZERO
    };

    let current_price = input.company.current_stock_price;
    let upside_pct = if current_price > Decimal::ZERO {
        (intrinsic_value_per_share - current_price) / current_price * dec!(100)
    } else {
        Decimal::ZERO
    };

    if enterprise_value_dcf > Decimal::ZERO {
        let tv_pct = terminal.pv_terminal_value / enterprise_value_dcf;
        if tv_pct > dec!(0.75) {
            warnings.push(format!(
                "Terminal value represents {:.1}% of enterprise value; consider extending the forecast period",
                tv_pct * dec!(100)
            ));
        }
    }

    // --- Return metrics against the market enterprise value ---
    let irr = simplified_irr(
        &projected_fcf,
        terminal.terminal_value,
        wacc_result.enterprise_value,
    );
    let ev_fcf_multiple = if historical.ttm_fcf > Decimal::ZERO {
        wacc_result.enterprise_value / historical.ttm_fcf
    } else {
        Decimal::ZERO
    };

    let verdict = Verdict::from_upside(upside_pct);

    // --- Post-processing branches over the base projection ---
    #[cfg(feature = "scenarios")]
    let stress = run_stress(
        &projected_fcf,
        &input.company,
        &input.assumptions,
        wacc,
        intrinsic_value_per_share,
    );
    #[cfg(feature = "scenarios")]
    let sensitivity = build_sensitivity(
        &projected_fcf,
        &input.company,
        wacc,
        input.assumptions.perpetual_growth_rate,
    );

    let output = ValuationOutput {
        wacc: wacc_result,
        historical,
        projected_fcf,
        pv_fcf,
        terminal,
        enterprise_value_dcf,
        equity_value,
        intrinsic_value_per_share,
        current_price,
        upside_pct,
        irr,
        ev_fcf_multiple,
        verdict,
        #[cfg(feature = "scenarios")]
        stress,
        #[cfg(feature = "scenarios")]
        sensitivity,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Intrinsic DCF (TTM FCF base, Gordon terminal)",
        &input.assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// End-of-year discount factor. A non-positive (1 + wacc) base has no
/// meaningful discounting; the factor degrades to zero.
pub(crate) fn discount_factor(wacc: Rate, year: u32) -> Decimal {
    let base = Decimal::ONE + wacc;
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    Decimal::ONE / base.powd(Decimal::from(year))
}

/// Present value of each element of a yearly series (year 1-indexed).
pub(crate) fn discount_series(series: &[Money], wacc: Rate) -> Vec<Money> {
    series
        .iter()
        .enumerate()
        .map(|(idx, fcf)| *fcf * discount_factor(wacc, idx as u32 + 1))
        .collect()
}

/// Simplified IRR: geometric mean return of (sum of projected FCF plus
/// terminal value) over the market enterprise value. Degrades to zero
/// for empty projections, non-positive EV, or a non-positive ratio.
fn simplified_irr(projected_fcf: &[Money], terminal_value: Money, enterprise_value: Money) -> Rate {
    if projected_fcf.is_empty() || enterprise_value <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let total_future_value: Money = projected_fcf.iter().copied().sum::<Money>() + terminal_value;
    let ratio = total_future_value / enterprise_value;
    if ratio <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let exponent = Decimal::ONE / Decimal::from(projected_fcf.len() as u32);
    ratio
        .checked_powd(exponent)
        .map(|v| v - Decimal::ONE)
        .unwrap_or(Decimal::ZERO)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
