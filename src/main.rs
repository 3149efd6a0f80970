use anyhow::Result;
use cdi_calculator::config::Settings;
use cdi_calculator::routes;
use cdi_calculator::state::AppState;
use dotenv::dotenv;
use log::info;
use std::net::SocketAddr;
use warp::Filter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize the logger
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let settings = Settings::from_env()?;
    info!("Using PORT: {}", settings.port);

    let addr: SocketAddr = ([0, 0, 0, 0], settings.port).into();
    info!("Will bind to: {}", addr);

    let state = AppState::from_settings(&settings);

    // Serve the cached CDI right away, refresh from the source in the background
    state.rates.load_cached().await;
    let rates = state.rates.clone();
    tokio::spawn(async move {
        let snapshot = rates.load().await;
        info!("Startup CDI refresh finished: {:?}", snapshot.source);
    });

    // Set up CORS
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "DELETE"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
