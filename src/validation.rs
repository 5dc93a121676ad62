use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/* ---------- error type ---------- */

/// A single violated constraint on a named payload field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Malformed or constraint-violating input. Carries every violated field,
/// not just the first, so the caller can fix the whole payload in one pass.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("validation failed on {} field(s)", .violations.len())]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: &str) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, message)],
        }
    }
}

/* ---------- raw payloads ---------- */

// Timestamps arrive as strings so that coercion failures are reported as
// per-field violations instead of a blanket deserialization error.
// Unknown keys are rejected at the boundary.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateEventPayload {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub all_day: Option<bool>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

// Sparse patch shape. For the nullable text fields the double Option
// distinguishes "absent, keep the stored value" from "null, clear it".
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateEventPayload {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub all_day: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/* ---------- normalized write requests ---------- */

/// A create request that satisfied every constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}

/// A sparse update: only `Some` fields are written, the rest keep their
/// stored values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub description: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

// Full replace reuses the create validator and writes every field.
impl From<NewEvent> for EventPatch {
    fn from(req: NewEvent) -> Self {
        EventPatch {
            title: Some(req.title),
            start: Some(req.start),
            end: Some(req.end),
            all_day: Some(req.all_day),
            description: Some(req.description),
            location: Some(req.location),
            color: Some(req.color),
        }
    }
}

/* ---------- validators ---------- */

pub fn validate_create(payload: CreateEventPayload) -> Result<NewEvent, ValidationError> {
    let mut violations = Vec::new();

    let title = match payload.title {
        Some(t) if !t.trim().is_empty() => Some(t),
        Some(_) => {
            violations.push(FieldViolation::new("title", "must be a non-empty string"));
            None
        }
        None => {
            violations.push(FieldViolation::new("title", "is required"));
            None
        }
    };

    let start = required_timestamp("start", payload.start, &mut violations);
    let end = required_timestamp("end", payload.end, &mut violations);

    if let (Some(s), Some(e)) = (start, end) {
        if e <= s {
            violations.push(FieldViolation::new("end", "end must be greater than start"));
        }
    }

    match (title, start, end) {
        (Some(title), Some(start), Some(end)) if violations.is_empty() => Ok(NewEvent {
            title,
            start,
            end,
            all_day: payload.all_day.unwrap_or(false),
            description: payload.description,
            location: payload.location,
            color: payload.color,
        }),
        _ => Err(ValidationError { violations }),
    }
}

pub fn validate_patch(payload: UpdateEventPayload) -> Result<EventPatch, ValidationError> {
    let mut violations = Vec::new();

    let title = match payload.title {
        Some(t) if t.trim().is_empty() => {
            violations.push(FieldViolation::new("title", "must be a non-empty string"));
            None
        }
        other => other,
    };

    let start = optional_timestamp("start", payload.start, &mut violations);
    let end = optional_timestamp("end", payload.end, &mut violations);

    // Both bounds in one patch must stay ordered. A lone bound is checked
    // against the stored row by the gateway, not here.
    if let (Some(s), Some(e)) = (start, end) {
        if e <= s {
            violations.push(FieldViolation::new("end", "end must be greater than start"));
        }
    }

    if !violations.is_empty() {
        return Err(ValidationError { violations });
    }

    Ok(EventPatch {
        title,
        start,
        end,
        all_day: payload.all_day,
        description: payload.description,
        location: payload.location,
        color: payload.color,
    })
}

/// Range bounds for the list query. Both present gives a filter pair, either
/// absent means no filter; an unparseable bound is a validation failure.
pub fn parse_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, ValidationError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Ok(None);
    };

    let mut violations = Vec::new();
    let s = parse_timestamp(start);
    if s.is_none() {
        violations.push(FieldViolation::new("start", "must be a valid timestamp"));
    }
    let e = parse_timestamp(end);
    if e.is_none() {
        violations.push(FieldViolation::new("end", "must be a valid timestamp"));
    }

    match (s, e) {
        (Some(s), Some(e)) => Ok(Some((s, e))),
        _ => Err(ValidationError { violations }),
    }
}

/* ---------- timestamp parsing ---------- */

// RFC 3339, with a date-only fallback (all-day events come from the UI as
// bare dates, taken as midnight UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

fn required_timestamp(
    field: &'static str,
    raw: Option<String>,
    violations: &mut Vec<FieldViolation>,
) -> Option<DateTime<Utc>> {
    match raw {
        Some(s) => match parse_timestamp(&s) {
            Some(dt) => Some(dt),
            None => {
                violations.push(FieldViolation::new(field, "must be a valid timestamp"));
                None
            }
        },
        None => {
            violations.push(FieldViolation::new(field, "is required"));
            None
        }
    }
}

fn optional_timestamp(
    field: &'static str,
    raw: Option<String>,
    violations: &mut Vec<FieldViolation>,
) -> Option<DateTime<Utc>> {
    match raw {
        Some(s) => match parse_timestamp(&s) {
            Some(dt) => Some(dt),
            None => {
                violations.push(FieldViolation::new(field, "must be a valid timestamp"));
                None
            }
        },
        None => None,
    }
}
