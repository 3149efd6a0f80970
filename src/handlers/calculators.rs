// src/handlers/calculators.rs
//! Calculator commands: parse the form, run one solver, render the result.

use log::{error, info};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::models::{
    ContributionInput, ContributionOutcome, HorizonInput, HorizonOutcome, ProjectionInput,
    ShareOutcome, ShareSimulationInput,
};
use crate::services::format::{applied_rate, format_brl, format_pct, format_years};
use crate::services::parsing::{parse_decimal, parse_whole};
use crate::services::{contribution, growth, horizon, shares};
use crate::state::AppState;

/// Accept `"13,65"`, `13.65` or null for a form field.
fn text_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectionForm {
    #[serde(default, deserialize_with = "text_field")]
    pub principal: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub monthly_contribution: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub annual_rate: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub percent_of_rate: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub months: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SharesForm {
    #[serde(default, deserialize_with = "text_field")]
    pub share_value: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub dividend_per_share: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub initial_shares: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub monthly_share_contribution: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HorizonForm {
    #[serde(default, deserialize_with = "text_field")]
    pub principal: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub annual_rate: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub percent_of_rate: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub monthly_contribution: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub target_amount: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContributionForm {
    #[serde(default, deserialize_with = "text_field")]
    pub principal: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub annual_rate: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub percent_of_rate: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub target_amount: Option<String>,
    #[serde(default, deserialize_with = "text_field")]
    pub months: Option<String>,
}

/// One entry per calculator button.
#[derive(Debug)]
pub enum Command {
    Project(ProjectionForm),
    Shares(SharesForm),
    Horizon(HorizonForm),
    Contribution(ContributionForm),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Project(_) => "projection",
            Command::Shares(_) => "shares",
            Command::Horizon(_) => "horizon",
            Command::Contribution(_) => "contribution",
        }
    }
}

#[derive(Serialize)]
struct Rendered<T: Serialize> {
    result: T,
    display: Vec<String>,
}

fn rendered<T: Serialize>(result: T, display: Vec<String>) -> Json {
    warp::reply::json(&Rendered { result, display })
}

pub async fn dispatch(command: Command, state: AppState) -> Result<Json, Rejection> {
    info!("Handling {} calculation", command.name());

    let reply = match command {
        Command::Project(form) => project(form, &state).await,
        Command::Shares(form) => simulate_shares(form),
        Command::Horizon(form) => solve_horizon(form, &state).await,
        Command::Contribution(form) => solve_contribution(form, &state).await,
    };

    reply.map_err(|e| {
        error!("Calculation rejected: {}", e);
        warp::reject::custom(e)
    })
}

/// Rate typed into the form, else the provider's current CDI.
async fn annual_rate(field: &Option<String>, state: &AppState) -> Result<f64, ApiError> {
    match field.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(parse_decimal(Some(text))),
        _ => state
            .rates
            .current_rate()
            .await
            .ok_or_else(ApiError::rate_unavailable),
    }
}

fn field(value: &Option<String>) -> f64 {
    parse_decimal(value.as_deref())
}

async fn project(form: ProjectionForm, state: &AppState) -> Result<Json, ApiError> {
    let input = ProjectionInput {
        principal: field(&form.principal),
        monthly_contribution: field(&form.monthly_contribution),
        annual_rate_pct: annual_rate(&form.annual_rate, state).await?,
        percent_of_rate: field(&form.percent_of_rate),
        months: parse_whole(form.months.as_deref()),
    };
    let result = growth::project(&input).map_err(ApiError::from)?;

    let display = vec![
        format!("Total invested: {}", format_brl(result.total_contributed)),
        format!("Amount after {} months: {}", input.months, format_brl(result.final_amount)),
        format!(
            "Total yield: {} ({} p.a.)",
            format_brl(result.total_yield),
            format_pct(result.effective_annual_rate_pct, 3)
        ),
    ];
    Ok(rendered(result, display))
}

fn simulate_shares(form: SharesForm) -> Result<Json, ApiError> {
    let input = ShareSimulationInput {
        share_value: field(&form.share_value),
        dividend_per_share: field(&form.dividend_per_share),
        initial_shares: field(&form.initial_shares),
        monthly_share_contribution: field(&form.monthly_share_contribution),
    };
    let outcome = shares::simulate(&input).map_err(ApiError::from)?;

    let (headline, r) = match &outcome {
        ShareOutcome::Converged(r) => (
            format!(
                "Magic number reached in: {} months ({} years)",
                r.months_to_target,
                format_years(r.months_to_target as f64)
            ),
            r,
        ),
        ShareOutcome::CapExceeded(r) => (
            format!(
                "Magic number not reached within {} months ({} years)",
                r.months_to_target,
                format_years(r.months_to_target as f64)
            ),
            r,
        ),
    };

    let display = vec![
        headline,
        format!("Shares held: {:.2}", r.final_share_count),
        format!("Final monthly income: {}", format_brl(r.final_monthly_income)),
        format!("Total dividends received: {}", format_brl(r.total_dividends_received)),
        format!("Total invested: {}", format_brl(r.total_contributed)),
    ];
    Ok(rendered(outcome, display))
}

async fn solve_horizon(form: HorizonForm, state: &AppState) -> Result<Json, ApiError> {
    let target = match form.target_amount.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => parse_decimal(Some(text)),
        _ => horizon::DEFAULT_TARGET,
    };
    let input = HorizonInput {
        principal: field(&form.principal),
        annual_rate_pct: annual_rate(&form.annual_rate, state).await?,
        percent_of_rate: field(&form.percent_of_rate),
        monthly_contribution: field(&form.monthly_contribution),
        target_amount: target,
    };
    let outcome = horizon::solve(&input).map_err(ApiError::from)?;

    let line = match outcome {
        HorizonOutcome::Reached { months } => format!(
            "Estimated time to {}: {} months ({} years)",
            format_brl(target),
            months,
            format_years(months as f64)
        ),
        HorizonOutcome::AlreadyReached => "Target already reached!".to_string(),
        HorizonOutcome::ContributionRequired => {
            "A positive monthly contribution is required at this rate.".to_string()
        }
        HorizonOutcome::PrincipalSufficient => {
            "Target already reached or initial investment is too high.".to_string()
        }
        HorizonOutcome::DidNotConverge => "Calculation did not converge. Check the values.".to_string(),
    };
    Ok(rendered(outcome, vec![line]))
}

async fn solve_contribution(form: ContributionForm, state: &AppState) -> Result<Json, ApiError> {
    let input = ContributionInput {
        principal: field(&form.principal),
        annual_rate_pct: annual_rate(&form.annual_rate, state).await?,
        percent_of_rate: field(&form.percent_of_rate),
        target_amount: field(&form.target_amount),
        months: parse_whole(form.months.as_deref()),
    };
    let outcome = contribution::solve(&input).map_err(ApiError::from)?;

    let display = match outcome {
        ContributionOutcome::Required {
            monthly_contribution,
            monthly_rate_pct,
            base_rate_pct,
            months,
            ..
        } => vec![
            format!("Required monthly contribution: {}", format_brl(monthly_contribution)),
            format!(
                "Current CDI: {} • Applying: {} • {} p.m. • Term: {} months.",
                format_pct(base_rate_pct, 4),
                format_pct(applied_rate(base_rate_pct, input.percent_of_rate), 4),
                format_pct(monthly_rate_pct, 4),
                months
            ),
        ],
        ContributionOutcome::AlreadyAchievable { projected_amount } => vec![
            "Target already achieved with the initial investment.".to_string(),
            format!("Current projected amount: {}", format_brl(projected_amount)),
        ],
        ContributionOutcome::DidNotConverge => {
            vec!["Calculation did not converge. Check the values.".to_string()]
        }
    };
    Ok(rendered(outcome, display))
}
