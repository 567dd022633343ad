use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Gordon-growth terminal value with its formula trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalValueOutput {
    pub terminal_value: Money,
    pub pv_terminal_value: Money,
    /// Growth rate actually used; differs from the stated assumption
    /// when the clamp fired
    pub effective_growth_rate: Rate,
    /// True when the stated growth met or exceeded WACC and was halved
    /// to wacc * 0.5 — disclosed so explanation layers can report the
    /// substitution
    pub growth_clamped: bool,
}

/// Capitalize the final forecast year into a perpetuity and discount
/// it back over the explicit horizon.
///
/// When the stated growth rate is at or above WACC the perpetuity
/// denominator collapses, so the growth assumption is halved to
/// wacc * 0.5 and the substitution is recorded in the result. A
/// non-positive WACC makes the perpetuity meaningless; the result
/// degrades to a zero terminal value rather than erroring.
pub fn calculate_terminal_value(
    final_fcf: Money,
    wacc: Rate,
    perpetual_growth_rate: Rate,
    forecast_years: u32,
) -> TerminalValueOutput {
    if wacc <= Decimal::ZERO {
        return TerminalValueOutput {
            terminal_value: Decimal::ZERO,
            pv_terminal_value: Decimal::ZERO,
            effective_growth_rate: perpetual_growth_rate,
            growth_clamped: false,
        };
    }

    let (g, growth_clamped) = if wacc <= perpetual_growth_rate {
        (wacc * dec!(0.5), true)
    } else {
        (perpetual_growth_rate, false)
    };

    let terminal_value = final_fcf * (Decimal::ONE + g) / (wacc - g);
    let discount = (Decimal::ONE + wacc).powd(Decimal::from(forecast_years));
    let pv_terminal_value = terminal_value / discount;

    TerminalValueOutput {
        terminal_value,
        pv_terminal_value,
        effective_growth_rate: g,
        growth_clamped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_gordon_growth_reference_case() {
        // Final-year FCF from an 80 TTM base compounded through
        // [6%, 5.5%, 5%, 4.5%, 4%]
        let final_fcf = dec!(80) * dec!(1.06) * dec!(1.055) * dec!(1.05) * dec!(1.045) * dec!(1.04);
        let out = calculate_terminal_value(final_fcf, dec!(0.085), dec!(0.025), 5);

        // TV = finalFCF * 1.025 / 0.06
        let expected_tv = final_fcf * dec!(1.025) / dec!(0.06);
        assert_eq!(out.terminal_value, expected_tv);
        assert!((out.terminal_value - dec!(1744.05)).abs() < dec!(0.01));
        assert!(!out.growth_clamped);
        assert_eq!(out.effective_growth_rate, dec!(0.025));
    }

    #[test]
    fn test_pv_discounts_over_horizon() {
        let out = calculate_terminal_value(dec!(100), dec!(0.10), dec!(0.02), 5);

        let expected_tv = dec!(100) * dec!(1.02) / dec!(0.08);
        assert_eq!(out.terminal_value, expected_tv);
        // PV = TV / 1.1^5
        let ratio = out.terminal_value / out.pv_terminal_value;
        assert!((ratio - dec!(1.61051)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_growth_clamped_to_half_wacc() {
        // g >= wacc: effective growth must be wacc * 0.5, never the
        // stated assumption
        let out = calculate_terminal_value(dec!(100), dec!(0.04), dec!(0.05), 5);

        assert!(out.growth_clamped);
        assert_eq!(out.effective_growth_rate, dec!(0.02));
        let expected_tv = dec!(100) * dec!(1.02) / dec!(0.02);
        assert_eq!(out.terminal_value, expected_tv);
    }

    #[test]
    fn test_growth_equal_to_wacc_also_clamps() {
        let out = calculate_terminal_value(dec!(100), dec!(0.06), dec!(0.06), 5);
        assert!(out.growth_clamped);
        assert_eq!(out.effective_growth_rate, dec!(0.03));
    }

    #[test]
    fn test_non_positive_wacc_degrades_to_zero() {
        let out = calculate_terminal_value(dec!(100), Decimal::ZERO, dec!(0.025), 5);
        assert_eq!(out.terminal_value, Decimal::ZERO);
        assert_eq!(out.pv_terminal_value, Decimal::ZERO);
        assert!(!out.growth_clamped);

        let negative = calculate_terminal_value(dec!(100), dec!(-0.02), dec!(0.025), 5);
        assert_eq!(negative.terminal_value, Decimal::ZERO);
    }

    #[test]
    fn test_negative_final_fcf_produces_negative_tv() {
        // Perpetuity of a cash-burning terminal year is negative, not
        // an error
        let out = calculate_terminal_value(dec!(-50), dec!(0.09), dec!(0.02), 5);
        assert!(out.terminal_value < Decimal::ZERO);
        assert!(out.pv_terminal_value < Decimal::ZERO);
    }
}
