use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{CompanyFinancials, Money, Rate};
use crate::valuation::dcf::{discount_factor, discount_series};

/// Multipliers applied to the base WACC for the discount-rate axis.
const WACC_MULTIPLIERS: [Decimal; 5] =
    [dec!(0.75), dec!(0.90), dec!(1.00), dec!(1.10), dec!(1.25)];

/// Absolute offsets applied to the base growth for the growth axis.
const GROWTH_OFFSETS: [Decimal; 5] =
    [dec!(-0.01), dec!(-0.005), dec!(0), dec!(0.005), dec!(0.01)];

/// 5x5 sweep of intrinsic value per share over (WACC, terminal growth)
/// perturbations. Cells where the Gordon denominator collapses are
/// `None` rather than clamped — the substitution safeguard belongs to
/// the headline valuation only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub base_wacc: Rate,
    pub base_growth: Rate,
    /// Discount-rate axis, ascending
    pub wacc_values: Vec<Rate>,
    /// Terminal-growth axis, ascending
    pub growth_values: Vec<Rate>,
    /// matrix[i][j] = per-share value at (wacc_values[i], growth_values[j])
    pub matrix: Vec<Vec<Option<Money>>>,
    /// Smallest valid cell, if any cell is valid
    pub min_value: Option<Money>,
    /// Largest valid cell, if any cell is valid
    pub max_value: Option<Money>,
}

/// Recompute intrinsic value per share across the fixed 5x5 grid,
/// always from the base projected series (the projection itself is not
/// re-grown per cell).
pub fn build_sensitivity(
    base_projected_fcf: &[Money],
    company: &CompanyFinancials,
    base_wacc: Rate,
    base_growth: Rate,
) -> SensitivityOutput {
    let wacc_values: Vec<Rate> = WACC_MULTIPLIERS.iter().map(|m| base_wacc * m).collect();
    let growth_values: Vec<Rate> = GROWTH_OFFSETS.iter().map(|o| base_growth + o).collect();

    let mut matrix: Vec<Vec<Option<Money>>> = Vec::with_capacity(wacc_values.len());
    let mut min_value: Option<Money> = None;
    let mut max_value: Option<Money> = None;

    for wacc in &wacc_values {
        let mut row = Vec::with_capacity(growth_values.len());
        for growth in &growth_values {
            let cell = cell_value(base_projected_fcf, company, *wacc, *growth);
            if let Some(v) = cell {
                min_value = Some(min_value.map_or(v, |m| m.min(v)));
                max_value = Some(max_value.map_or(v, |m| m.max(v)));
            }
            row.push(cell);
        }
        matrix.push(row);
    }

    SensitivityOutput {
        base_wacc,
        base_growth,
        wacc_values,
        growth_values,
        matrix,
        min_value,
        max_value,
    }
}

/// Per-share value for one (wacc, growth) cell, or `None` when the
/// cell is degenerate: non-positive WACC, growth at or above WACC, or
/// no shares to divide by.
fn cell_value(
    base_projected_fcf: &[Money],
    company: &CompanyFinancials,
    wacc: Rate,
    growth: Rate,
) -> Option<Money> {
    if wacc <= Decimal::ZERO
        || wacc <= growth
        || company.shares_outstanding <= Decimal::ZERO
    {
        return None;
    }

    let final_fcf = base_projected_fcf.last().copied().unwrap_or(Decimal::ZERO);
    let terminal_value = final_fcf * (Decimal::ONE + growth) / (wacc - growth);
    let pv_terminal =
        terminal_value * discount_factor(wacc, base_projected_fcf.len() as u32);

    let pv_sum: Money = discount_series(base_projected_fcf, wacc)
        .iter()
        .copied()
        .sum();
    let equity_value = pv_sum + pv_terminal - company.total_debt + company.cash;

    Some(equity_value / company.shares_outstanding)
}
