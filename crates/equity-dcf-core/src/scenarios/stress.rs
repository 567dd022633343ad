use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{CompanyFinancials, Money, Rate, ValuationAssumptions};
use crate::valuation::dcf::discount_series;
use crate::valuation::terminal::calculate_terminal_value;

/// Supply-chain disruptions bite hardest in the first two years.
const SUPPLY_CHAIN_YEARS: usize = 2;

/// Result of the stress overlay over the base projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressOutput {
    pub enabled: bool,
    pub base_projected_fcf: Vec<Money>,
    pub stressed_projected_fcf: Vec<Money>,
    /// Per-year carbon cost, reported separately from the stressed
    /// series; empty when the carbon overlay is off
    pub carbon_costs: Vec<Money>,
    pub base_intrinsic_value_per_share: Money,
    pub stressed_intrinsic_value_per_share: Money,
    /// Stressed vs. base value, in percent; zero when the base is zero
    pub delta_pct: Decimal,
    /// Human-readable description of the overlays applied
    pub notes: Vec<String>,
}

/// Apply the enabled stress overlays to the base projection and
/// re-value the company from the stressed series.
///
/// The discount rate is deliberately held at the base WACC: stress
/// models operating damage, not a repricing of capital. Disabled
/// stress is a no-op that echoes the base series with empty notes.
pub fn run_stress(
    base_projected_fcf: &[Money],
    company: &CompanyFinancials,
    assumptions: &ValuationAssumptions,
    wacc: Rate,
    base_intrinsic_value: Money,
) -> StressOutput {
    let settings = &assumptions.stress;

    if !settings.enabled {
        return StressOutput {
            enabled: false,
            base_projected_fcf: base_projected_fcf.to_vec(),
            stressed_projected_fcf: base_projected_fcf.to_vec(),
            carbon_costs: Vec::new(),
            base_intrinsic_value_per_share: base_intrinsic_value,
            stressed_intrinsic_value_per_share: base_intrinsic_value,
            delta_pct: Decimal::ZERO,
            notes: Vec::new(),
        };
    }

    let mut stressed: Vec<Money> = base_projected_fcf.to_vec();
    let mut carbon_costs: Vec<Money> = Vec::new();
    let mut notes: Vec<String> = Vec::new();

    if settings.supply_chain {
        let factor = Decimal::ONE
            - settings.supply_chain_revenue_hit_pct
            - settings.supply_chain_cogs_increase_pct;
        for fcf in stressed.iter_mut().take(SUPPLY_CHAIN_YEARS) {
            *fcf *= factor;
        }
        notes.push(format!(
            "Supply-chain shock: years 1-2 scaled by {factor} ({} revenue hit, {} COGS increase)",
            settings.supply_chain_revenue_hit_pct, settings.supply_chain_cogs_increase_pct
        ));
    }

    if settings.carbon_tax {
        // FCF stands in for revenue when sizing the carbon bill; crude
        // but consistent with the rest of the FCF-proxy model
        for (idx, base_fcf) in base_projected_fcf.iter().enumerate() {
            let cost = *base_fcf * settings.carbon_intensity * settings.carbon_tax_rate;
            stressed[idx] -= cost;
            carbon_costs.push(cost);
        }
        notes.push(format!(
            "Carbon tax: intensity {} tCO2e/$M at {} $M/t deducted each year",
            settings.carbon_intensity, settings.carbon_tax_rate
        ));
    }

    // Re-value from the stressed series at the unchanged base WACC
    let stressed_value = intrinsic_value_from_series(&stressed, company, assumptions, wacc);

    let delta_pct = if base_intrinsic_value.is_zero() {
        Decimal::ZERO
    } else {
        (stressed_value - base_intrinsic_value) / base_intrinsic_value * dec!(100)
    };

    StressOutput {
        enabled: true,
        base_projected_fcf: base_projected_fcf.to_vec(),
        stressed_projected_fcf: stressed,
        carbon_costs,
        base_intrinsic_value_per_share: base_intrinsic_value,
        stressed_intrinsic_value_per_share: stressed_value,
        delta_pct,
        notes,
    }
}

/// Intrinsic per-share value of a projected series: terminal value
/// (with the growth-halving safeguard), discounting, equity bridge,
/// zero-shares fallback.
fn intrinsic_value_from_series(
    series: &[Money],
    company: &CompanyFinancials,
    assumptions: &ValuationAssumptions,
    wacc: Rate,
) -> Money {
    let final_fcf = series.last().copied().unwrap_or(Decimal::ZERO);
    let terminal = calculate_terminal_value(
        final_fcf,
        wacc,
        assumptions.perpetual_growth_rate,
        series.len() as u32,
    );

    let pv_sum: Money = discount_series(series, wacc).iter().copied().sum();
    let enterprise_value = pv_sum + terminal.pv_terminal_value;
    let equity_value = enterprise_value - company.total_debt + company.cash;

    if company.shares_outstanding > Decimal::ZERO {
        equity_value / company.shares_outstanding
    } else {
        Decimal::ZERO
    }
}
