//! # natal-chart
//!
//! A small HTTP service that turns birth data into a natal chart SVG.
//!
//! ## The contract
//!
//! One endpoint, `POST /generate-chart`, takes
//!
//! ```json
//! {
//!   "name": "Ann",
//!   "dateOfBirth": "1990-01-15",
//!   "timeOfBirth": "14:30",
//!   "locationOfBirth": "New York, NY",
//!   "coordinates": { "lat": "40.7128", "lon": "-74.0060" }
//! }
//! ```
//!
//! validates it completely, asks the external charting library (behind
//! [`chart::ChartRenderer`]) for an SVG, and answers
//! `{"success": true, "svg": "...", "metadata": {...}}`.
//!
//! Validation failures are `400`, renderer failures `500`, unknown paths
//! `404`; all with a plain-text message. Every response carries
//! `Access-Control-Allow-Origin: *` and `OPTIONS` on any path is a CORS
//! pre-flight answer.
//!
//! The charting itself (ephemeris, houses, aspects, drawing) is not done
//! here.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use natal_chart::chart::CommandRenderer;
//! use natal_chart::{Server, app};
//!
//! #[tokio::main]
//! async fn main() {
//!     let renderer = Arc::new(CommandRenderer::new("natal-chart-render", Vec::new()));
//!     Server::bind("127.0.0.1:8001").serve(app(renderer)).await.unwrap();
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod chart;
pub mod config;
pub mod middleware;

use std::sync::Arc;

pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{RunningServer, Server};
pub use status::Status;

use chart::{ChartRenderer, ChartService, GENERATE_CHART_PATH};
use middleware::Cors;

/// The service's router: `POST /generate-chart` with a permissive CORS policy.
pub fn app(renderer: Arc<dyn ChartRenderer>) -> Router {
    let service = ChartService::new(renderer);

    Router::new()
        .post(GENERATE_CHART_PATH, move |req: Request| {
            let service = service.clone();
            async move { service.handle(req).await }
        })
        .cors(Cors::permissive())
}
