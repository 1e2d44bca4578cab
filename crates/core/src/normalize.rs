//! Normalization helpers applied while parsing wire payloads.
//!
//! The backend is the source of truth for identifiers and dates; these
//! helpers only fill gaps (placeholder ids, default timestamps) and bring
//! the accepted date representations down to one canonical shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::CoreError;
use crate::types::{DateOnly, EntityId, Timestamp};

/// Naive date-time layouts accepted in addition to RFC 3339. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Generate a random version-4 identifier.
///
/// Only used as a placeholder for optimistic UI until the server assigns
/// the canonical id.
pub fn generate_id() -> EntityId {
    uuid::Uuid::new_v4().to_string()
}

/// Keep a server-provided id, or generate a placeholder when it is absent
/// or blank.
pub fn id_or_generate(id: Option<String>) -> EntityId {
    match id {
        Some(id) if !id.trim().is_empty() => id,
        _ => generate_id(),
    }
}

/// Parse any accepted date representation and truncate it to a calendar date.
///
/// RFC 3339 inputs are converted to UTC before truncation, so
/// `2024-02-15T23:30:00-02:00` becomes `2024-02-16`.
pub fn parse_date_only(raw: &str) -> Option<DateOnly> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    parse_timestamp(raw).map(|ts| ts.date_naive())
}

/// Parse an RFC 3339 timestamp, or a naive date-time interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Required date-only field.
pub fn require_date(
    entity: &'static str,
    field: &'static str,
    raw: Option<String>,
) -> Result<DateOnly, CoreError> {
    let raw = raw
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| CoreError::missing(entity, field))?;
    parse_date_only(&raw)
        .ok_or_else(|| CoreError::invalid(entity, field, format!("unrecognized date '{raw}'")))
}

/// Optional date-only field; blank strings count as absent.
pub fn optional_date(
    entity: &'static str,
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<DateOnly>, CoreError> {
    match raw.filter(|value| !value.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => parse_date_only(&raw).map(Some).ok_or_else(|| {
            CoreError::invalid(entity, field, format!("unrecognized date '{raw}'"))
        }),
    }
}

/// Optional timestamp field; blank strings count as absent.
pub fn optional_timestamp(
    entity: &'static str,
    field: &'static str,
    raw: Option<String>,
) -> Result<Option<Timestamp>, CoreError> {
    match raw.filter(|value| !value.trim().is_empty()) {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw).map(Some).ok_or_else(|| {
            CoreError::invalid(entity, field, format!("unrecognized timestamp '{raw}'"))
        }),
    }
}

/// Creation timestamp: the server value when present, otherwise now.
pub fn created_at_or_now(
    entity: &'static str,
    raw: Option<String>,
) -> Result<Timestamp, CoreError> {
    Ok(optional_timestamp(entity, "created_at", raw)?.unwrap_or_else(Utc::now))
}

/// Required non-blank string field.
pub fn require_text(
    entity: &'static str,
    field: &'static str,
    raw: Option<String>,
) -> Result<String, CoreError> {
    raw.filter(|value| !value.trim().is_empty())
        .ok_or_else(|| CoreError::missing(entity, field))
}

/// Optional string field; blank strings count as absent.
pub fn optional_text(raw: Option<String>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
}

/// Optional amount defaulting to zero.
pub fn amount_or_zero(raw: Option<f64>) -> f64 {
    raw.unwrap_or(0.0)
}

/// A scalar the backend sometimes sends as a JSON number and sometimes as a
/// string (citizenship numbers, ward numbers).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Render as text. Integral floats drop their fractional part.
    pub fn into_text(self) -> String {
        match self {
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) if f.fract() == 0.0 => format!("{}", f as i64),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Scalar::Float(_) => None,
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Optional text-like scalar; blank strings count as absent.
pub fn optional_scalar_text(raw: Option<Scalar>) -> Option<String> {
    optional_text(raw.map(Scalar::into_text))
}

/// Optional integer-like scalar.
pub fn optional_scalar_int(
    entity: &'static str,
    field: &'static str,
    raw: Option<Scalar>,
) -> Result<Option<i32>, CoreError> {
    match raw {
        None => Ok(None),
        Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(scalar) => scalar
            .as_int()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| CoreError::invalid(entity, field, "expected an integer")),
    }
}
