//! Success body of `POST /generate-chart`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::ChartRequest;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartResponse {
    pub success: bool,
    /// SVG text exactly as the renderer produced it.
    pub svg: String,
    pub metadata: ChartMetadata,
}

/// Echo of the request, after normalization, plus the generation time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// The name as sent, not the display-name fallback.
    pub name: Value,
    pub date_of_birth: String,
    pub time_of_birth: String,
    pub location_of_birth: Value,
    pub coordinates: Coordinates,
    pub generated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl ChartResponse {
    pub fn new(svg: String, request: ChartRequest, generated_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            svg,
            metadata: ChartMetadata {
                name: request.name,
                date_of_birth: request.date_of_birth,
                time_of_birth: request.time_of_birth,
                location_of_birth: request.location_of_birth,
                coordinates: Coordinates { lat: request.lat, lon: request.lon },
                generated_at,
            },
        }
    }
}
