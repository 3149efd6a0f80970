// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Duration, Utc};

/// Last CDI value seen, as persisted under the cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedRate {
    #[serde(rename = "valor")]
    pub value: f64,
    /// Reference date reported by the rate source (e.g. "17/10/2026")
    #[serde(rename = "data", default)]
    pub observed_at: Option<String>,
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub fetched_at: DateTime<Utc>,
}

impl CachedRate {
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at > ttl
    }
}

/// Rate as returned by a successful live fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchedRate {
    pub value: f64,
    pub observed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Live,
    Cache,
    /// No rate could be obtained; callers have to type one in.
    Manual,
}

/// What the rest of the application knows about the CDI right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSnapshot {
    pub rate: Option<f64>,
    pub source: RateSource,
    pub observed_at: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub stale: bool,
    pub warning: Option<String>,
}

impl RateSnapshot {
    pub fn manual(warning: Option<String>) -> Self {
        Self {
            rate: None,
            source: RateSource::Manual,
            observed_at: None,
            fetched_at: None,
            stale: false,
            warning,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionInput {
    pub principal: f64,
    pub monthly_contribution: f64,
    pub annual_rate_pct: f64,
    pub percent_of_rate: f64,
    pub months: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionResult {
    pub total_contributed: f64,
    pub final_amount: f64,
    pub total_yield: f64,
    pub effective_annual_rate_pct: f64,
    pub monthly_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShareSimulationInput {
    pub share_value: f64,
    pub dividend_per_share: f64,
    pub initial_shares: f64,
    pub monthly_share_contribution: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShareSimulationResult {
    pub months_to_target: u32,
    pub final_share_count: f64,
    pub final_monthly_income: f64,
    pub total_dividends_received: f64,
    pub total_contributed: f64,
    /// Shares needed for the magic number with no reinvestment at all
    pub theoretical_shares_needed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ShareOutcome {
    Converged(ShareSimulationResult),
    /// Iteration cap reached before income covered the share price
    CapExceeded(ShareSimulationResult),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonInput {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub percent_of_rate: f64,
    pub monthly_contribution: f64,
    pub target_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HorizonOutcome {
    Reached { months: u64 },
    AlreadyReached,
    /// Rate is effectively zero and no contribution was given
    ContributionRequired,
    /// Already reached, or the principal alone outgrows the contributions
    PrincipalSufficient,
    DidNotConverge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionInput {
    pub principal: f64,
    pub annual_rate_pct: f64,
    pub percent_of_rate: f64,
    pub target_amount: f64,
    pub months: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ContributionOutcome {
    Required {
        monthly_contribution: f64,
        monthly_rate_pct: f64,
        applied_annual_rate_pct: f64,
        base_rate_pct: f64,
        months: i64,
    },
    AlreadyAchievable { projected_amount: f64 },
    DidNotConverge,
}
