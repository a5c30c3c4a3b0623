//! `natal-chart` binary.
//!
//! Run with:
//!   RUST_LOG=debug natal-chart --renderer python3 --renderer-arg render_chart.py
//!
//! Try:
//!   curl -X POST http://localhost:8001/generate-chart \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"Ann","dateOfBirth":"1990-01-15","timeOfBirth":"14:30",
//!             "coordinates":{"lat":"40.7128","lon":"-74.0060"}}'

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use natal_chart::config::Config;
use natal_chart::{Server, app};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!(renderer = %config.renderer, args = ?config.renderer_args, "using external chart renderer");

    let renderer = Arc::new(config.renderer());
    match Server::bind(config.bind.clone()).serve(app(renderer)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(bind = %config.bind, "server error: {e}");
            ExitCode::FAILURE
        }
    }
}
