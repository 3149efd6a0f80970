// src/services/horizon.rs
//! Months needed to reach a target with a fixed monthly contribution.

use log::debug;

use crate::error::{CalcError, Result};
use crate::models::{HorizonInput, HorizonOutcome};
use crate::services::growth::monthly_rate;

/// Below this monthly rate the closed form is numerically useless.
const LINEAR_RATE_THRESHOLD: f64 = 1e-6;

/// Target used when the caller gives none: the first million.
pub const DEFAULT_TARGET: f64 = 1_000_000.0;

pub fn solve(input: &HorizonInput) -> Result<HorizonOutcome> {
    if !(input.percent_of_rate > 0.0) {
        return Err(CalcError::validation("Fill in the CDI percentage correctly"));
    }

    let r = monthly_rate(input.annual_rate_pct, input.percent_of_rate);
    let target = input.target_amount;
    let principal = input.principal;
    let contribution = input.monthly_contribution;

    if r <= LINEAR_RATE_THRESHOLD {
        let needed = target - principal;
        if needed <= 0.0 {
            return Ok(HorizonOutcome::AlreadyReached);
        }
        if contribution <= 0.0 {
            return Ok(HorizonOutcome::ContributionRequired);
        }
        return Ok(whole_months((needed / contribution).ceil()));
    }

    // FV(n) = I(1+r)^n + C((1+r)^n - 1)/r  =>  (1+r)^n = (M r + C) / (I r + C)
    let a = target * r + contribution;
    let b = principal * r + contribution;
    let ratio = a / b;
    debug!("Horizon solve: r={} A={} B={} A/B={}", r, a, b, ratio);

    if ratio <= 1.0 {
        return Ok(HorizonOutcome::PrincipalSufficient);
    }

    Ok(whole_months((ratio.ln() / (1.0 + r).ln()).ceil()))
}

fn whole_months(months: f64) -> HorizonOutcome {
    if months.is_finite() && months >= 0.0 {
        HorizonOutcome::Reached { months: months as u64 }
    } else {
        HorizonOutcome::DidNotConverge
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectionInput;
    use crate::services::growth::project;

    fn input(principal: f64, contribution: f64, annual_rate_pct: f64) -> HorizonInput {
        HorizonInput {
            principal,
            annual_rate_pct,
            percent_of_rate: 100.0,
            monthly_contribution: contribution,
            target_amount: DEFAULT_TARGET,
        }
    }

    #[test]
    fn test_closed_form_is_the_first_month_at_target() {
        let i = input(10_000.0, 2_000.0, 13.65);
        let months = match solve(&i).unwrap() {
            HorizonOutcome::Reached { months } => months as i64,
            other => panic!("{:?}", other),
        };

        let at = |m: i64| {
            project(&ProjectionInput {
                principal: i.principal,
                monthly_contribution: i.monthly_contribution,
                annual_rate_pct: i.annual_rate_pct,
                percent_of_rate: i.percent_of_rate,
                months: m,
            })
            .unwrap()
            .final_amount
        };
        assert!(at(months) >= DEFAULT_TARGET);
        assert!(at(months - 1) < DEFAULT_TARGET);
    }

    #[test]
    fn test_zero_rate_is_linear() {
        let outcome = solve(&input(0.0, 3_000.0, 0.0)).unwrap();
        // 1_000_000 / 3_000 = 333.33 -> 334
        assert_eq!(outcome, HorizonOutcome::Reached { months: 334 });
    }

    #[test]
    fn test_zero_rate_without_contribution() {
        assert_eq!(
            solve(&input(0.0, 0.0, 0.0)).unwrap(),
            HorizonOutcome::ContributionRequired
        );
        assert_eq!(
            solve(&input(2_000_000.0, 0.0, 0.0)).unwrap(),
            HorizonOutcome::AlreadyReached
        );
    }

    #[test]
    fn test_principal_above_target() {
        assert_eq!(
            solve(&input(2_000_000.0, 500.0, 13.65)).unwrap(),
            HorizonOutcome::PrincipalSufficient
        );
    }

    #[test]
    fn test_nothing_invested_does_not_converge() {
        // B = 0 makes A/B infinite
        assert_eq!(
            solve(&input(0.0, 0.0, 13.65)).unwrap(),
            HorizonOutcome::DidNotConverge
        );
    }

    #[test]
    fn test_validation() {
        let mut i = input(0.0, 100.0, 13.65);
        i.percent_of_rate = 0.0;
        assert!(matches!(solve(&i), Err(CalcError::Validation(_))));
    }
}
