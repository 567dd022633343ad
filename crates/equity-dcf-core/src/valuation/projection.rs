use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{Money, Rate, ValuationAssumptions};

/// Growth rate assumed when the schedule is empty.
const DEFAULT_GROWTH: Decimal = dec!(0.03);

/// Growth rate for a 1-indexed forecast year. Schedules shorter than
/// the horizon carry their last rate forward; an empty schedule falls
/// back to 3%.
pub fn growth_for_year(rates: &[Rate], year: u32) -> Rate {
    let idx = (year.saturating_sub(1)) as usize;
    if idx < rates.len() {
        rates[idx]
    } else if let Some(&last) = rates.last() {
        last
    } else {
        DEFAULT_GROWTH
    }
}

/// Extend the TTM baseline forward by compounding the per-year growth
/// schedule. Pure function of its inputs; length equals the forecast
/// horizon.
pub fn project_cash_flows(base_fcf: Money, assumptions: &ValuationAssumptions) -> Vec<Money> {
    let mut projected = Vec::with_capacity(assumptions.forecast_years as usize);
    let mut prev = base_fcf;

    for year in 1..=assumptions.forecast_years {
        let growth = growth_for_year(&assumptions.revenue_growth_rates, year);
        let fcf = prev * (Decimal::ONE + growth);
        projected.push(fcf);
        prev = fcf;
    }

    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn assumptions(rates: Vec<Rate>, years: u32) -> ValuationAssumptions {
        ValuationAssumptions {
            revenue_growth_rates: rates,
            forecast_years: years,
            ..Default::default()
        }
    }

    #[test]
    fn test_year_one_compounds_off_baseline() {
        let a = assumptions(vec![dec!(0.06), dec!(0.055), dec!(0.05), dec!(0.045), dec!(0.04)], 5);
        let projected = project_cash_flows(dec!(80), &a);

        assert_eq!(projected.len(), 5);
        // 80 * 1.06 = 84.8
        assert_eq!(projected[0], dec!(84.8));
    }

    #[test]
    fn test_five_year_compounding() {
        let a = assumptions(vec![dec!(0.06), dec!(0.055), dec!(0.05), dec!(0.045), dec!(0.04)], 5);
        let projected = project_cash_flows(dec!(80), &a);

        // 84.8 * 1.055 * 1.05 * 1.045 * 1.04
        let expected = dec!(84.8) * dec!(1.055) * dec!(1.05) * dec!(1.045) * dec!(1.04);
        assert_eq!(projected[4], expected);
        assert!((projected[4] - dec!(102.091)).abs() < dec!(0.001));
    }

    #[test]
    fn test_last_rate_carried_forward() {
        let a = assumptions(vec![dec!(0.08), dec!(0.06)], 4);
        let projected = project_cash_flows(dec!(100), &a);

        // Years 3-4 reuse the 6% rate
        assert_eq!(projected[2], projected[1] * dec!(1.06));
        assert_eq!(projected[3], projected[2] * dec!(1.06));
    }

    #[test]
    fn test_empty_schedule_defaults_to_three_percent() {
        let a = assumptions(vec![], 3);
        let projected = project_cash_flows(dec!(100), &a);

        assert_eq!(projected[0], dec!(103));
        assert_eq!(projected[1], dec!(106.09));
    }

    #[test]
    fn test_growth_for_year_lookup() {
        let rates = [dec!(0.10), dec!(0.05)];
        assert_eq!(growth_for_year(&rates, 1), dec!(0.10));
        assert_eq!(growth_for_year(&rates, 2), dec!(0.05));
        assert_eq!(growth_for_year(&rates, 7), dec!(0.05));
        assert_eq!(growth_for_year(&[], 1), dec!(0.03));
    }

    #[test]
    fn test_negative_baseline_still_projects() {
        // A cash-burning company: projection scales the negative base
        let a = assumptions(vec![dec!(0.05)], 2);
        let projected = project_cash_flows(dec!(-40), &a);
        assert_eq!(projected[0], dec!(-42));
    }
}
