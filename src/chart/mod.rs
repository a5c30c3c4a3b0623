//! Natal chart endpoint.
//!
//! | Piece | Job |
//! |---|---|
//! | [`ChartRequest`] | ordered, short-circuiting validation of the JSON body |
//! | [`ChartRenderer`] | the seam to the external charting library |
//! | [`CommandRenderer`] | production renderer: an external program over stdio |
//! | [`ChartService`] | validate → render → [`ChartResponse`] |
//! | [`ApiError`] | 400 / 500 mapping |

mod command;
mod handler;
mod render;
mod request;
mod response;

pub use command::CommandRenderer;
pub use handler::{ApiError, ChartService};
pub use render::{ChartRenderer, ChartSubject, NATAL_CHART_OPTIONS, RenderError, RenderOptions, Theme};
pub use request::{ChartRequest, DEFAULT_CHART_NAME, ValidationError};
pub use response::{ChartMetadata, ChartResponse, Coordinates};

/// The one routed path.
pub const GENERATE_CHART_PATH: &str = "/generate-chart";
