// src/services/format.rs
//! Display strings for results. Values are rounded here and nowhere else.

use chrono::{DateTime, Utc};

/// Brazilian real, e.g. `R$ 1.234,56` (with a non-breaking space).
pub fn format_brl(value: f64) -> String {
    if !value.is_finite() {
        return "R$\u{a0}-".to_string();
    }

    let cents = (value.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$\u{a0}{},{:02}", sign, grouped, frac)
}

pub fn format_pct(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Months expressed in years with one decimal.
pub fn format_years(months: f64) -> String {
    format!("{:.1}", months / 12.0)
}

/// Share of the base rate actually earned, e.g. 110% of 13.65 = 15.015.
pub fn applied_rate(base_rate_pct: f64, percent_of_rate: f64) -> f64 {
    base_rate_pct * (percent_of_rate / 100.0)
}

/// How long ago a rate was fetched, in the coarsest fitting unit.
pub fn format_age(fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - fetched_at;
    if diff.num_seconds() < 60 {
        return "just now".to_string();
    }
    let mins = diff.num_minutes();
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hrs = mins / 60;
    if hrs < 24 {
        return format!("{}h ago", hrs);
    }
    format!("{}d ago", hrs / 24)
}
