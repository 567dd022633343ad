use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{
    with_metadata, CompanyFinancials, ComputationOutput, EsgProfile, EsgTiltSettings, Money, Rate,
    ValuationAssumptions,
};
use crate::EquityDcfResult;

const BPS_PER_UNIT: Decimal = dec!(10000);

/// Output of the WACC calculation.
///
/// Carries its own formula trace (pre/post-tilt cost of equity, the
/// applied adjustment, capital-structure components) so explanation
/// layers need no side-channel state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccOutput {
    /// Weighted average cost of capital
    pub wacc: Rate,
    /// Cost of equity actually used (post ESG tilt)
    pub cost_of_equity: Rate,
    /// CAPM cost of equity before the ESG tilt
    pub ke_before_esg: Rate,
    /// Cost of equity after the ESG tilt and risk-free floor
    pub ke_after_esg: Rate,
    /// Applied tilt, as a decimal rate (negative = cheaper equity)
    pub esg_adjustment: Rate,
    /// After-tax cost of debt
    pub after_tax_cost_of_debt: Rate,
    pub equity_weight: Rate,
    pub debt_weight: Rate,
    pub market_cap: Money,
    /// Total debt minus cash; negative means a net cash position
    pub net_debt: Money,
    pub enterprise_value: Money,
}

/// Calculate the Weighted Average Cost of Capital using CAPM with an
/// optional ESG tilt on the cost of equity.
///
/// Ke = Rf + Beta * MRP, tilted by up to +/- strength based on the ESG
/// score, then floored at max(Rf, 0).
/// After-tax cost of debt: Kd_at = Kd * (1 - t)
/// WACC = Ke * We + Kd_at * Wd, with weights from market values.
///
/// Degenerate states (zero or negative enterprise value, net cash
/// positions) fall back by policy instead of erroring; callers that
/// feed WACC into a perpetuity must check positivity themselves.
pub fn calculate_wacc(
    financials: &CompanyFinancials,
    assumptions: &ValuationAssumptions,
    esg: Option<&EsgProfile>,
) -> EquityDcfResult<ComputationOutput<WaccOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    financials.validate()?;
    assumptions.validate()?;

    // --- Cost of equity (CAPM) ---
    let ke_before_esg =
        assumptions.risk_free_rate + assumptions.beta * assumptions.market_risk_premium;

    // --- ESG tilt ---
    let esg_adjustment = esg_tilt(&assumptions.esg, esg);
    let ke_floor = assumptions.risk_free_rate.max(Decimal::ZERO);
    let ke_after_esg = (ke_before_esg + esg_adjustment).max(ke_floor);
    if ke_before_esg + esg_adjustment < ke_floor {
        warnings.push(format!(
            "ESG-tilted cost of equity floored at the risk-free rate ({ke_floor})"
        ));
    }

    // --- Capital structure at market values ---
    let market_cap = financials.shares_outstanding * financials.current_stock_price;
    let net_debt = financials.total_debt - financials.cash;
    let enterprise_value = market_cap + net_debt;

    let (equity_weight, debt_weight) = if enterprise_value > Decimal::ZERO {
        (
            market_cap / enterprise_value,
            net_debt / enterprise_value,
        )
    } else {
        // All-equity fallback when the market EV is not meaningful
        warnings.push(format!(
            "Enterprise value is not positive ({enterprise_value}); treating the firm as all-equity"
        ));
        (Decimal::ONE, Decimal::ZERO)
    };

    // --- Blend ---
    let after_tax_cost_of_debt = assumptions.cost_of_debt * (Decimal::ONE - assumptions.tax_rate);
    let wacc = equity_weight * ke_after_esg + debt_weight * after_tax_cost_of_debt;

    if wacc <= Decimal::ZERO {
        warnings.push(format!(
            "WACC of {wacc} is not positive; perpetuity-based terminal values will degrade to zero"
        ));
    }
    if wacc > dec!(0.20) {
        warnings.push(format!(
            "WACC of {wacc} exceeds 20%; appropriate for high-risk situations only"
        ));
    }

    let output = WaccOutput {
        wacc,
        cost_of_equity: ke_after_esg,
        ke_before_esg,
        ke_after_esg,
        esg_adjustment,
        after_tax_cost_of_debt,
        equity_weight,
        debt_weight,
        market_cap,
        net_debt,
        enterprise_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "WACC via CAPM with ESG tilt",
        assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Piecewise-linear ESG adjustment to the cost of equity, in decimal
/// rate terms, bounded by [-strength, +strength].
///
/// Scores at or below the good threshold earn the full discount;
/// scores at or above the bad threshold pay the full premium; scores
/// between interpolate linearly. Returns zero when the tilt is
/// disabled, no profile is present, or the thresholds are degenerate
/// (bad <= good).
fn esg_tilt(settings: &EsgTiltSettings, profile: Option<&EsgProfile>) -> Rate {
    let score = match profile {
        Some(p) if settings.enabled => p.total_esg,
        _ => return Decimal::ZERO,
    };
    if settings.threshold_bad <= settings.threshold_good {
        return Decimal::ZERO;
    }

    let strength = settings.strength_bps / BPS_PER_UNIT;
    if score <= settings.threshold_good {
        -strength
    } else if score >= settings.threshold_bad {
        strength
    } else {
        let position =
            (score - settings.threshold_good) / (settings.threshold_bad - settings.threshold_good);
        -strength + position * dec!(2) * strength
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_financials() -> CompanyFinancials {
        CompanyFinancials {
            shares_outstanding: dec!(1000),
            current_stock_price: dec!(50),
            total_debt: dec!(12000),
            cash: dec!(4000),
        }
    }

    fn sample_assumptions() -> ValuationAssumptions {
        ValuationAssumptions {
            risk_free_rate: dec!(0.045),
            beta: dec!(1.15),
            market_risk_premium: dec!(0.08),
            cost_of_debt: dec!(0.05),
            tax_rate: dec!(0.21),
            ..Default::default()
        }
    }

    fn profile(score: Decimal) -> EsgProfile {
        EsgProfile {
            total_esg: score,
            environmental: None,
            social: None,
            governance: None,
        }
    }

    #[test]
    fn test_capm_cost_of_equity() {
        let result = calculate_wacc(&sample_financials(), &sample_assumptions(), None).unwrap();
        let out = &result.result;

        // Ke = 0.045 + 1.15 * 0.08 = 0.137
        assert_eq!(out.ke_before_esg, dec!(0.137));
        assert_eq!(out.esg_adjustment, Decimal::ZERO);
        assert_eq!(out.cost_of_equity, dec!(0.137));
    }

    #[test]
    fn test_weights_sum_to_one_when_ev_positive() {
        let result = calculate_wacc(&sample_financials(), &sample_assumptions(), None).unwrap();
        let out = &result.result;

        // Market cap = 50,000; net debt = 8,000; EV = 58,000
        assert_eq!(out.market_cap, dec!(50000));
        assert_eq!(out.net_debt, dec!(8000));
        assert_eq!(out.enterprise_value, dec!(58000));
        assert!(out.enterprise_value > Decimal::ZERO);
        assert_eq!(out.equity_weight + out.debt_weight, Decimal::ONE);
    }

    #[test]
    fn test_blended_wacc() {
        let result = calculate_wacc(&sample_financials(), &sample_assumptions(), None).unwrap();
        let out = &result.result;

        // Kd_at = 0.05 * 0.79 = 0.0395
        assert_eq!(out.after_tax_cost_of_debt, dec!(0.0395));
        let expected =
            out.equity_weight * dec!(0.137) + out.debt_weight * dec!(0.0395);
        assert_eq!(out.wacc, expected);
    }

    #[test]
    fn test_all_equity_fallback_when_ev_not_positive() {
        let financials = CompanyFinancials {
            shares_outstanding: dec!(100),
            current_stock_price: dec!(10),
            total_debt: dec!(500),
            cash: dec!(2000),
        };
        // Market cap 1,000; net debt -1,500; EV -500
        let result = calculate_wacc(&financials, &sample_assumptions(), None).unwrap();
        let out = &result.result;

        assert_eq!(out.enterprise_value, dec!(-500));
        assert_eq!(out.equity_weight, Decimal::ONE);
        assert_eq!(out.debt_weight, Decimal::ZERO);
        // All-equity WACC is just the cost of equity
        assert_eq!(out.wacc, out.cost_of_equity);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("all-equity")));
    }

    #[test]
    fn test_net_cash_position_is_representable() {
        let financials = CompanyFinancials {
            shares_outstanding: dec!(1000),
            current_stock_price: dec!(50),
            total_debt: dec!(1000),
            cash: dec!(5000),
        };
        // Net debt -4,000 but EV 46,000 still positive
        let result = calculate_wacc(&financials, &sample_assumptions(), None).unwrap();
        let out = &result.result;

        assert_eq!(out.net_debt, dec!(-4000));
        assert!(out.debt_weight < Decimal::ZERO);
        assert_eq!(out.equity_weight + out.debt_weight, Decimal::ONE);
    }

    #[test]
    fn test_esg_good_boundary_full_discount() {
        // Score exactly at the good threshold gets the full -strength
        let assumptions = sample_assumptions();
        let result = calculate_wacc(
            &sample_financials(),
            &assumptions,
            Some(&profile(dec!(20))),
        )
        .unwrap();
        let out = &result.result;

        assert_eq!(out.esg_adjustment, dec!(-0.01));
        assert_eq!(out.ke_after_esg, dec!(0.127));
    }

    #[test]
    fn test_esg_bad_boundary_full_premium() {
        let result = calculate_wacc(
            &sample_financials(),
            &sample_assumptions(),
            Some(&profile(dec!(40))),
        )
        .unwrap();
        assert_eq!(result.result.esg_adjustment, dec!(0.01));
    }

    #[test]
    fn test_esg_midpoint_interpolates_to_zero() {
        let result = calculate_wacc(
            &sample_financials(),
            &sample_assumptions(),
            Some(&profile(dec!(30))),
        )
        .unwrap();
        assert_eq!(result.result.esg_adjustment, Decimal::ZERO);
    }

    #[test]
    fn test_esg_interpolation_between_thresholds() {
        // Score 25 is 25% of the way from good (20) to bad (40):
        // adjustment = -0.01 + 0.25 * 0.02 = -0.005
        let result = calculate_wacc(
            &sample_financials(),
            &sample_assumptions(),
            Some(&profile(dec!(25))),
        )
        .unwrap();
        assert_eq!(result.result.esg_adjustment, dec!(-0.005));
    }

    #[test]
    fn test_esg_disabled_by_settings() {
        let mut assumptions = sample_assumptions();
        assumptions.esg.enabled = false;
        let result =
            calculate_wacc(&sample_financials(), &assumptions, Some(&profile(dec!(5)))).unwrap();
        assert_eq!(result.result.esg_adjustment, Decimal::ZERO);
    }

    #[test]
    fn test_esg_disabled_without_profile() {
        let result = calculate_wacc(&sample_financials(), &sample_assumptions(), None).unwrap();
        assert_eq!(result.result.esg_adjustment, Decimal::ZERO);
        assert_eq!(result.result.ke_after_esg, result.result.ke_before_esg);
    }

    #[test]
    fn test_esg_degenerate_thresholds_disable_tilt() {
        let mut assumptions = sample_assumptions();
        assumptions.esg.threshold_good = dec!(40);
        assumptions.esg.threshold_bad = dec!(40);
        let result =
            calculate_wacc(&sample_financials(), &assumptions, Some(&profile(dec!(10)))).unwrap();
        assert_eq!(result.result.esg_adjustment, Decimal::ZERO);
    }

    #[test]
    fn test_ke_floored_at_risk_free_rate() {
        let mut assumptions = sample_assumptions();
        // Tiny CAPM Ke, big negative tilt: floor must hold
        assumptions.beta = dec!(0.01);
        assumptions.esg.strength_bps = dec!(500);
        let result =
            calculate_wacc(&sample_financials(), &assumptions, Some(&profile(dec!(5)))).unwrap();
        let out = &result.result;

        assert_eq!(out.ke_after_esg, assumptions.risk_free_rate);
        assert!(result.warnings.iter().any(|w| w.contains("floored")));
    }

    #[test]
    fn test_negative_shares_rejected() {
        let mut financials = sample_financials();
        financials.shares_outstanding = dec!(-10);
        assert!(calculate_wacc(&financials, &sample_assumptions(), None).is_err());
    }

    #[test]
    fn test_methodology_string() {
        let result = calculate_wacc(&sample_financials(), &sample_assumptions(), None).unwrap();
        assert_eq!(result.methodology, "WACC via CAPM with ESG tilt");
    }
}
