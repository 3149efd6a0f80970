// src/routes.rs
use std::collections::HashMap;
use std::convert::Infallible;

use log::info;
use serde::de::DeserializeOwned;
use warp::http::StatusCode;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::calculators::{dispatch, Command};
use crate::handlers::error::ApiError;
use crate::handlers::rate::{clear_cache, get_applied_rate, get_rate, refresh_rate};
use crate::state::AppState;

/// Form bodies are tiny; anything bigger is a mistake.
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// JSON form body of at most `MAX_BODY_BYTES`.
fn form<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(body_error) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = StatusCode::BAD_REQUEST;
        message = body_error.to_string();
    } else {
        code = StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let rate_route = warp::path!("api" / "v1" / "cdi")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_rate);

    let applied_route = warp::path!("api" / "v1" / "cdi" / "applied")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(state_filter.clone())
        .and_then(get_applied_rate);

    let refresh_route = warp::path!("api" / "v1" / "cdi" / "refresh")
        .and(warp::post())
        .and(state_filter.clone())
        .and_then(refresh_rate);

    let clear_cache_route = warp::path!("api" / "v1" / "cdi" / "cache")
        .and(warp::delete())
        .and(state_filter.clone())
        .and_then(clear_cache);

    let projection_route = warp::path!("api" / "v1" / "projection")
        .and(warp::post())
        .and(form())
        .map(Command::Project)
        .and(state_filter.clone())
        .and_then(dispatch);

    let shares_route = warp::path!("api" / "v1" / "shares")
        .and(warp::post())
        .and(form())
        .map(Command::Shares)
        .and(state_filter.clone())
        .and_then(dispatch);

    let horizon_route = warp::path!("api" / "v1" / "horizon")
        .and(warp::post())
        .and(form())
        .map(Command::Horizon)
        .and(state_filter.clone())
        .and_then(dispatch);

    let contribution_route = warp::path!("api" / "v1" / "contribution")
        .and(warp::post())
        .and(form())
        .map(Command::Contribution)
        .and(state_filter.clone())
        .and_then(dispatch);

    info!("All routes configured successfully.");

    rate_route
        .or(applied_route)
        .or(refresh_route)
        .or(clear_cache_route)
        .or(projection_route)
        .or(shares_route)
        .or(horizon_route)
        .or(contribution_route)
        .recover(handle_rejection)
}
