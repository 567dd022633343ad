use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use equity_dcf_core::valuation::dcf::{run_valuation, ValuationInput};
use equity_dcf_core::valuation::wacc::calculate_wacc;
use equity_dcf_core::{CompanyFinancials, EsgProfile, ValuationAssumptions};

use crate::input;

/// Arguments for the WACC calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct WaccArgs {
    /// Shares outstanding, in millions
    #[arg(long)]
    pub shares: Option<Decimal>,

    /// Current stock price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Total debt, in millions
    #[arg(long)]
    pub debt: Option<Decimal>,

    /// Cash and equivalents, in millions
    #[arg(long)]
    pub cash: Option<Decimal>,

    /// Risk-free rate (e.g. 0.045 for 4.5%)
    #[arg(long)]
    pub risk_free_rate: Option<Decimal>,

    /// Levered beta
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Market risk premium (e.g. 0.08 for 8%)
    #[arg(long, alias = "mrp")]
    pub market_risk_premium: Option<Decimal>,

    /// Pre-tax cost of debt
    #[arg(long)]
    pub cost_of_debt: Option<Decimal>,

    /// Marginal corporate tax rate
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Total ESG score (0-100); enables the cost-of-equity tilt
    #[arg(long)]
    pub esg_score: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// JSON surface for `wacc --input` / piped stdin.
#[derive(Deserialize)]
struct WaccRequest {
    company: CompanyFinancials,
    #[serde(default)]
    assumptions: ValuationAssumptions,
    #[serde(default)]
    esg: Option<EsgProfile>,
}

/// Arguments for the full valuation pipeline
#[derive(Args)]
pub struct ValueArgs {
    /// Path to JSON input file with company, history, assumptions,
    /// and optional ESG profile
    #[arg(long)]
    pub input: Option<String>,

    /// Override the beta assumption
    #[arg(long)]
    pub beta: Option<Decimal>,

    /// Override the forecast horizon in years
    #[arg(long)]
    pub forecast_years: Option<u32>,

    /// Enable the stress-scenario overlay
    #[arg(long)]
    pub stress: bool,
}

pub fn run_wacc(args: WaccArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: WaccRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let mut assumptions = ValuationAssumptions::default();
        if let Some(rf) = args.risk_free_rate {
            assumptions.risk_free_rate = rf;
        }
        if let Some(beta) = args.beta {
            assumptions.beta = beta;
        }
        if let Some(mrp) = args.market_risk_premium {
            assumptions.market_risk_premium = mrp;
        }
        if let Some(kd) = args.cost_of_debt {
            assumptions.cost_of_debt = kd;
        }
        if let Some(tax) = args.tax_rate {
            assumptions.tax_rate = tax;
        }

        WaccRequest {
            company: CompanyFinancials {
                shares_outstanding: args.shares.ok_or("--shares is required (or provide --input)")?,
                current_stock_price: args.price.ok_or("--price is required (or provide --input)")?,
                total_debt: args.debt.unwrap_or(Decimal::ZERO),
                cash: args.cash.unwrap_or(Decimal::ZERO),
            },
            assumptions,
            esg: args.esg_score.map(|score| EsgProfile {
                total_esg: score,
                environmental: None,
                social: None,
                governance: None,
            }),
        }
    };

    let output = calculate_wacc(&request.company, &request.assumptions, request.esg.as_ref())?;
    Ok(serde_json::to_value(&output)?)
}

pub fn run_value(args: ValueArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut valuation_input: ValuationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input is required (or pipe JSON via stdin)".into());
    };

    if let Some(beta) = args.beta {
        valuation_input.assumptions.beta = beta;
    }
    if let Some(years) = args.forecast_years {
        valuation_input.assumptions.forecast_years = years;
    }
    if args.stress {
        valuation_input.assumptions.stress.enabled = true;
    }

    let output = run_valuation(&valuation_input)?;
    Ok(serde_json::to_value(&output)?)
}

pub fn run_defaults() -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::to_value(ValuationAssumptions::default())?)
}
