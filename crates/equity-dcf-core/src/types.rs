use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EquityDcfError;
use crate::EquityDcfResult;

/// All monetary values, in millions. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 18.5x EV/FCF)
pub type Multiple = Decimal;

/// Balance-sheet and market snapshot of the company being valued.
///
/// Used as denominators throughout the engine; zero shares or a zero
/// price degrade the dependent outputs to zero rather than erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyFinancials {
    /// Diluted shares outstanding, in millions
    pub shares_outstanding: Decimal,
    /// Last traded price per share
    pub current_stock_price: Money,
    /// Total interest-bearing debt
    pub total_debt: Money,
    /// Cash and equivalents
    pub cash: Money,
}

impl CompanyFinancials {
    pub fn validate(&self) -> EquityDcfResult<()> {
        if self.shares_outstanding < Decimal::ZERO {
            return Err(EquityDcfError::InvalidInput {
                field: "shares_outstanding".into(),
                reason: "Shares outstanding cannot be negative".into(),
            });
        }
        Ok(())
    }
}

/// One reported fiscal quarter of cash-flow data.
///
/// Contract: `capex` arrives already signed (non-positive, a cash
/// outflow), so quarterly FCF = `operating_cash_flow + capex`. Sign
/// normalization is the data provider's job, not the engine's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalQuarter {
    pub period_end: NaiveDate,
    pub operating_cash_flow: Money,
    pub capex: Money,
    pub net_income: Money,
}

/// Ordered (oldest first) quarterly cash-flow history. Read-only
/// snapshot per valuation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CashFlowHistory {
    pub quarters: Vec<FiscalQuarter>,
}

/// ESG score profile on a 0-100 scale. Absence of the profile disables
/// the cost-of-equity tilt regardless of settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsgProfile {
    pub total_esg: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environmental: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub social: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub governance: Option<Decimal>,
}

/// Controls for the ESG cost-of-equity tilt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EsgTiltSettings {
    /// Whether ESG scores modify the cost of equity
    pub enabled: bool,
    /// Maximum basis-point adjustment in either direction
    pub strength_bps: Decimal,
    /// Scores at or below this are "good": full negative adjustment
    pub threshold_good: Decimal,
    /// Scores at or above this are "bad": full positive adjustment
    pub threshold_bad: Decimal,
}

impl Default for EsgTiltSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strength_bps: dec!(100),
            threshold_good: dec!(20),
            threshold_bad: dec!(40),
        }
    }
}

/// Controls for the stress-scenario overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressSettings {
    /// Master switch; when false the stress pass is a no-op
    pub enabled: bool,
    /// Apply the supply-chain shock to years 1-2
    pub supply_chain: bool,
    /// Apply the carbon-tax drag to every forecast year
    pub carbon_tax: bool,
    /// Revenue lost to the supply-chain disruption
    pub supply_chain_revenue_hit_pct: Rate,
    /// Cost-of-goods inflation from re-routing supply
    pub supply_chain_cogs_increase_pct: Rate,
    /// Tonnes CO2e per $M of FCF (used as a revenue proxy)
    pub carbon_intensity: Decimal,
    /// Carbon price, $M per tonne CO2e
    pub carbon_tax_rate: Decimal,
}

impl Default for StressSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            supply_chain: true,
            carbon_tax: true,
            supply_chain_revenue_hit_pct: dec!(0.05),
            supply_chain_cogs_increase_pct: dec!(0.03),
            carbon_intensity: dec!(150),
            carbon_tax_rate: dec!(0.000085),
        }
    }
}

/// Forward-looking valuation assumptions. Immutable per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationAssumptions {
    /// Risk-free rate (e.g. 10-year government bond yield)
    pub risk_free_rate: Rate,
    /// Levered beta of equity
    pub beta: Decimal,
    /// Market risk premium over the risk-free rate
    pub market_risk_premium: Rate,
    /// Pre-tax cost of debt
    pub cost_of_debt: Rate,
    /// Marginal corporate tax rate
    pub tax_rate: Rate,
    /// Perpetual growth rate for the terminal value
    pub perpetual_growth_rate: Rate,
    /// One growth rate per forecast year; the last value is carried
    /// forward when the horizon exceeds the schedule
    pub revenue_growth_rates: Vec<Rate>,
    /// Explicit forecast horizon in years (>= 1)
    pub forecast_years: u32,
    #[serde(default)]
    pub esg: EsgTiltSettings,
    #[serde(default)]
    pub stress: StressSettings,
}

impl Default for ValuationAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: dec!(0.045),
            beta: dec!(1.15),
            market_risk_premium: dec!(0.08),
            cost_of_debt: dec!(0.05),
            tax_rate: dec!(0.21),
            perpetual_growth_rate: dec!(0.025),
            revenue_growth_rates: vec![
                dec!(0.06),
                dec!(0.055),
                dec!(0.05),
                dec!(0.045),
                dec!(0.04),
            ],
            forecast_years: 5,
            esg: EsgTiltSettings::default(),
            stress: StressSettings::default(),
        }
    }
}

impl ValuationAssumptions {
    pub fn validate(&self) -> EquityDcfResult<()> {
        if self.forecast_years == 0 {
            return Err(EquityDcfError::InvalidInput {
                field: "forecast_years".into(),
                reason: "Forecast horizon must be at least 1 year".into(),
            });
        }
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(EquityDcfError::InvalidInput {
                field: "tax_rate".into(),
                reason: "Tax rate must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
