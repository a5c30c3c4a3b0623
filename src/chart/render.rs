//! The chart-rendering collaborator, seen from this side of the seam.
//!
//! Everything astrological (ephemeris, houses, aspects, drawing) happens
//! behind [`ChartRenderer`]. The service only hands over a validated
//! [`ChartSubject`] and fixed [`RenderOptions`] and gets SVG text back.

use std::fmt::Debug;
use std::process::ExitStatus;
use std::string::FromUtf8Error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The person (or moment) a chart is drawn for.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSubject {
    /// Display name printed on the chart.
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Birth moment, interpreted as UTC.
    pub utc: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Visual parameters passed to the renderer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RenderOptions {
    pub theme: Theme,
    pub width: u32,
    pub height: u32,
}

/// Light theme on a 600×600 canvas. Not caller-configurable.
pub const NATAL_CHART_OPTIONS: RenderOptions = RenderOptions {
    theme: Theme::Light,
    width: 600,
    height: 600,
};

/// Why the collaborator could not produce a chart.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to start renderer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("renderer i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode renderer input: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("renderer failed ({status}): {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("renderer produced non-UTF-8 output")]
    InvalidOutput(#[from] FromUtf8Error),

    #[error("renderer produced no output")]
    Empty,

    #[error("renderer output is not SVG")]
    NotSvg,

    /// Free-form failure reported by an in-process renderer.
    #[error("{0}")]
    Other(String),
}

/// Produces an SVG chart for a subject.
///
/// Implementations are called once per request with no retained state
/// between calls, and are never called with unvalidated input.
#[async_trait]
pub trait ChartRenderer: Send + Sync + Debug {
    async fn render(
        &self,
        subject: &ChartSubject,
        options: &RenderOptions,
    ) -> Result<String, RenderError>;
}
