// src/services/contribution.rs
//! Monthly contribution needed to reach a target over a fixed horizon.

use log::debug;

use crate::error::{CalcError, Result};
use crate::models::{ContributionInput, ContributionOutcome};
use crate::services::growth::{effective_annual_rate, monthly_rate};

pub fn solve(input: &ContributionInput) -> Result<ContributionOutcome> {
    if !(input.target_amount > 0.0) || input.months <= 0 || !(input.percent_of_rate > 0.0) {
        return Err(CalcError::validation(
            "Fill in the target amount, the CDI percentage and the period correctly",
        ));
    }

    let r = monthly_rate(input.annual_rate_pct, input.percent_of_rate);
    let n = input.months as f64;
    let growth = (1.0 + r).powf(n);

    let contribution = if r.abs() < 1e-12 {
        (input.target_amount - input.principal) / n
    } else {
        let numer = input.target_amount - input.principal * growth;
        let denom = (growth - 1.0) / r;
        numer / denom
    };
    debug!("Contribution solve: r={} n={} contribution={}", r, n, contribution);

    if !contribution.is_finite() {
        return Ok(ContributionOutcome::DidNotConverge);
    }

    if contribution <= 0.0 {
        return Ok(ContributionOutcome::AlreadyAchievable {
            projected_amount: input.principal * growth,
        });
    }

    Ok(ContributionOutcome::Required {
        monthly_contribution: contribution,
        monthly_rate_pct: r * 100.0,
        applied_annual_rate_pct: effective_annual_rate(input.annual_rate_pct, input.percent_of_rate) * 100.0,
        base_rate_pct: input.annual_rate_pct,
        months: input.months,
    })
}
