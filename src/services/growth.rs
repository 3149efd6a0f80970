// src/services/growth.rs
//! Future value of a deposit plus level monthly contributions.

use log::debug;

use crate::error::{CalcError, Result};
use crate::models::{ProjectionInput, ProjectionResult};

/// Annual rate actually earned, as a decimal: `percent_of_rate`% of the base rate.
pub fn effective_annual_rate(annual_rate_pct: f64, percent_of_rate: f64) -> f64 {
    (percent_of_rate / 100.0) * (annual_rate_pct / 100.0)
}

/// Monthly rate as a decimal, using simple division of the annual rate.
pub fn monthly_rate(annual_rate_pct: f64, percent_of_rate: f64) -> f64 {
    effective_annual_rate(annual_rate_pct, percent_of_rate) / 12.0
}

/// Accumulated value of `contribution` paid at the end of each of `months` periods.
pub fn fv_contributions(contribution: f64, rate: f64, months: f64) -> f64 {
    if rate == 0.0 {
        contribution * months
    } else {
        contribution * (((1.0 + rate).powf(months) - 1.0) / rate)
    }
}

pub fn project(input: &ProjectionInput) -> Result<ProjectionResult> {
    if input.percent_of_rate == 0.0 || !input.percent_of_rate.is_finite() || input.months <= 0 {
        return Err(CalcError::validation(
            "Fill in the CDI percentage and the period correctly",
        ));
    }

    let effective_annual = effective_annual_rate(input.annual_rate_pct, input.percent_of_rate);
    let r = effective_annual / 12.0;
    let n = input.months as f64;

    let from_principal = input.principal * (1.0 + r).powf(n);
    let from_contributions = fv_contributions(input.monthly_contribution, r, n);

    let final_amount = from_principal + from_contributions;
    let total_contributed = input.principal + input.monthly_contribution * n;
    debug!(
        "Projection: r={} n={} principal_fv={} contributions_fv={}",
        r, n, from_principal, from_contributions
    );

    Ok(ProjectionResult {
        total_contributed,
        final_amount,
        total_yield: final_amount - total_contributed,
        effective_annual_rate_pct: effective_annual * 100.0,
        monthly_rate: r,
    })
}
