use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The sole persisted entity: one row per event, current state only.
///
/// `start`/`end` form a half-open interval `[start, end)` with `end > start`
/// enforced at write time and by a CHECK constraint in the schema.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    #[sqlx(rename = "start_at")]
    pub start: DateTime<Utc>,
    #[sqlx(rename = "end_at")]
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub description: Option<String>,
    pub location: Option<String>,
    pub color: Option<String>,
}
