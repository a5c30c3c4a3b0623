//! Validation of the `POST /generate-chart` body.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. body is JSON
//! 2. `name`, `dateOfBirth`, `timeOfBirth`, `coordinates` present (in that order)
//! 3. `coordinates.lat` and `coordinates.lon` present
//! 4. both coerce to finite numbers
//! 5. `"<dateOfBirth> <timeOfBirth>"` parses as `%Y-%m-%d %H:%M` with a
//!    four-digit year
//!
//! Only a fully validated [`ChartRequest`] can be turned into a
//! [`ChartSubject`] for the renderer.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::render::ChartSubject;

/// Display name used when the request's `name` is falsy.
pub const DEFAULT_CHART_NAME: &str = "Natal Chart";

/// Required top-level fields, in check order.
const REQUIRED_FIELDS: [&str; 4] = ["name", "dateOfBirth", "timeOfBirth", "coordinates"];

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Why a chart request was rejected. Each variant's text is the message
/// sent to the client.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Missing latitude or longitude")]
    MissingCoordinates,

    #[error("Invalid coordinate values")]
    InvalidCoordinates,

    #[error("Invalid date/time format: {0}")]
    InvalidDateTime(String),
}

/// A chart request that passed every check.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartRequest {
    /// `name` exactly as sent, echoed back in the metadata.
    pub name: Value,
    pub date_of_birth: String,
    pub time_of_birth: String,
    /// `locationOfBirth` as sent, or `""` when absent.
    pub location_of_birth: Value,
    pub lat: f64,
    pub lon: f64,
    pub utc: DateTime<Utc>,
}

impl ChartRequest {
    /// Parses and validates a raw request body.
    pub fn from_body(body: &[u8]) -> Result<Self, ValidationError> {
        let data: Value = serde_json::from_slice(body).map_err(ValidationError::InvalidJson)?;
        Self::from_value(&data)
    }

    /// Validates an already-parsed JSON document.
    pub fn from_value(data: &Value) -> Result<Self, ValidationError> {
        let empty = Map::new();
        let fields = data.as_object().unwrap_or(&empty);

        for field in REQUIRED_FIELDS {
            if !fields.contains_key(field) {
                return Err(ValidationError::MissingField(field));
            }
        }

        let coordinates = fields["coordinates"].as_object().unwrap_or(&empty);
        let (Some(lat), Some(lon)) = (coordinates.get("lat"), coordinates.get("lon")) else {
            return Err(ValidationError::MissingCoordinates);
        };
        let (Some(lat), Some(lon)) = (coerce_degrees(lat), coerce_degrees(lon)) else {
            return Err(ValidationError::InvalidCoordinates);
        };

        let date_of_birth = text(&fields["dateOfBirth"]).into_owned();
        let time_of_birth = text(&fields["timeOfBirth"]).into_owned();
        let utc = parse_birth_moment(&date_of_birth, &time_of_birth)?;

        Ok(Self {
            name: fields["name"].clone(),
            date_of_birth,
            time_of_birth,
            location_of_birth: fields
                .get("locationOfBirth")
                .cloned()
                .unwrap_or_else(|| Value::String(String::new())),
            lat,
            lon,
            utc,
        })
    }

    /// Name printed on the chart: the given name, or [`DEFAULT_CHART_NAME`]
    /// when it is falsy (`null`, `false`, `0`, `""`, `[]`, `{}`).
    pub fn display_name(&self) -> Cow<'_, str> {
        if is_falsy(&self.name) {
            Cow::Borrowed(DEFAULT_CHART_NAME)
        } else {
            text(&self.name)
        }
    }

    pub fn subject(&self) -> ChartSubject {
        ChartSubject {
            name: self.display_name().into_owned(),
            lat: self.lat,
            lon: self.lon,
            utc: self.utc,
        }
    }
}

/// Accepts JSON numbers, numeric strings (surrounding whitespace ignored)
/// and booleans (`1.0` / `0.0`). No range check: any finite value is a
/// valid degree.
fn coerce_degrees(value: &Value) -> Option<f64> {
    let degrees = match value {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    degrees.is_finite().then_some(degrees)
}

/// chrono's `%Y` takes any digit count and an optional sign; the year here
/// is exactly four digits.
fn parse_birth_moment(date: &str, time: &str) -> Result<DateTime<Utc>, ValidationError> {
    let year = date.split_once('-').map_or(date, |(year, _)| year);
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidDateTime(format!(
            "year must be four digits in {date:?}"
        )));
    }

    NaiveDateTime::parse_from_str(&format!("{date} {time}"), DATE_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| ValidationError::InvalidDateTime(e.to_string()))
}

/// Strings as-is; anything else as its JSON text.
fn text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
