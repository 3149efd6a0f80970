// src/handlers/rate.rs
use std::collections::HashMap;

use chrono::Utc;
use log::{error, info};
use serde::Serialize;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::models::RateSnapshot;
use crate::services::format::{applied_rate, format_age, format_pct};
use crate::services::parsing::parse_decimal;
use crate::state::AppState;

#[derive(Serialize)]
struct RateStatusResponse {
    #[serde(flatten)]
    snapshot: RateSnapshot,
    display: Option<String>,
    age: Option<String>,
}

fn render(snapshot: RateSnapshot) -> Json {
    let age = snapshot.fetched_at.map(|ts| format_age(ts, Utc::now()));
    let display = snapshot.rate.map(|r| format_pct(r, 4));
    warp::reply::json(&RateStatusResponse {
        snapshot,
        display,
        age,
    })
}

pub async fn get_rate(state: AppState) -> Result<Json, Rejection> {
    info!("Handling request to get the CDI rate");
    Ok(render(state.rates.snapshot().await))
}

pub async fn refresh_rate(state: AppState) -> Result<Json, Rejection> {
    info!("Handling request to refresh the CDI rate");
    Ok(render(state.rates.load().await))
}

pub async fn clear_cache(state: AppState) -> Result<Json, Rejection> {
    info!("Handling request to clear the CDI cache");
    let snapshot = state.rates.clear_and_reload().await.map_err(|e| {
        error!("Failed to clear CDI cache: {}", e);
        warp::reject::custom(ApiError::cache_error(format!("Error clearing cache: {}", e)))
    })?;
    Ok(render(snapshot))
}

#[derive(Serialize)]
struct AppliedRateResponse {
    base_rate_pct: f64,
    percent_of_rate: f64,
    applied_rate_pct: f64,
    display: String,
}

/// Base rate times the requested percentage, e.g. `?percent=110`.
pub async fn get_applied_rate(
    query: HashMap<String, String>,
    state: AppState,
) -> Result<Json, Rejection> {
    let base = match query.get("rate").map(|r| parse_decimal(Some(r.as_str()))) {
        Some(r) if r > 0.0 => r,
        _ => state
            .rates
            .current_rate()
            .await
            .ok_or_else(|| warp::reject::custom(ApiError::rate_unavailable()))?,
    };
    let percent = parse_decimal(query.get("percent").map(String::as_str));
    let applied = applied_rate(base, percent);

    let display = if percent > 0.0 {
        format!(
            "CDI base: {} | applying {}% = {}",
            format_pct(base, 4),
            percent,
            format_pct(applied, 4)
        )
    } else {
        format!("CDI base: {}", format_pct(base, 4))
    };

    Ok(warp::reply::json(&AppliedRateResponse {
        base_rate_pct: base,
        percent_of_rate: percent,
        applied_rate_pct: applied,
        display,
    }))
}
