// src/services/shares.rs
//! "Magic number" simulation for income-paying fund shares (FIIs).
//!
//! Every month the dividends are reinvested at the share price, optionally
//! topped up by a fixed number of bought shares, until one month of income
//! pays for one new share.

use log::{debug, warn};

use crate::error::{CalcError, Result};
use crate::models::{ShareOutcome, ShareSimulationInput, ShareSimulationResult};

pub const MAX_MONTHS: u32 = 10_000;

/// Month-by-month accumulation state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShareAccumulator {
    pub share_count: f64,
    pub months_elapsed: u32,
    pub cumulative_dividends: f64,
    pub cumulative_contributed: f64,
    input: ShareSimulationInput,
}

impl ShareAccumulator {
    pub fn new(input: ShareSimulationInput) -> Result<Self> {
        if !(input.share_value > 0.0) || !(input.dividend_per_share > 0.0) || !(input.initial_shares > 0.0) {
            return Err(CalcError::validation("Fill in all share fields correctly"));
        }

        Ok(Self {
            share_count: input.initial_shares,
            months_elapsed: 0,
            cumulative_dividends: 0.0,
            cumulative_contributed: input.initial_shares * input.share_value,
            input,
        })
    }

    pub fn monthly_income(&self) -> f64 {
        self.share_count * self.input.dividend_per_share
    }

    pub fn target_reached(&self) -> bool {
        self.monthly_income() >= self.input.share_value
    }

    /// Advance one month. Returns false once the target is reached or the cap is hit.
    pub fn step(&mut self) -> bool {
        if self.target_reached() || self.months_elapsed >= MAX_MONTHS {
            return false;
        }

        self.months_elapsed += 1;

        let dividends = self.monthly_income();
        self.cumulative_dividends += dividends;
        self.share_count += dividends / self.input.share_value;

        let bought = self.input.monthly_share_contribution;
        if bought > 0.0 {
            self.share_count += bought;
            self.cumulative_contributed += bought * self.input.share_value;
        }

        true
    }

    fn result(&self) -> ShareSimulationResult {
        ShareSimulationResult {
            months_to_target: self.months_elapsed,
            final_share_count: self.share_count,
            final_monthly_income: self.monthly_income(),
            total_dividends_received: self.cumulative_dividends,
            total_contributed: self.cumulative_contributed,
            theoretical_shares_needed: (self.input.share_value / self.input.dividend_per_share).ceil(),
        }
    }
}

pub fn simulate(input: &ShareSimulationInput) -> Result<ShareOutcome> {
    let mut acc = ShareAccumulator::new(*input)?;
    while acc.step() {}

    let result = acc.result();
    if acc.target_reached() {
        debug!("Magic number reached after {} months", result.months_to_target);
        Ok(ShareOutcome::Converged(result))
    } else {
        warn!(
            "Share simulation stopped at the {} month cap with income {:.2} of {:.2}",
            MAX_MONTHS, result.final_monthly_income, input.share_value
        );
        Ok(ShareOutcome::CapExceeded(result))
    }
}
