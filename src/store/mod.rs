//! Event store gateway: the only component permitted to read or write the
//! durable store.

pub mod memory;
pub mod postgres;

pub use memory::MemoryEventStore;
pub use postgres::PgEventStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::Event;
use crate::validation::{EventPatch, NewEvent};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced id does not exist. Distinct from a validation problem.
    #[error("event not found")]
    NotFound,

    /// A patch merged with the stored row would invert the interval. Raised
    /// by `update` when only one of the two bounds is supplied and the other
    /// comes from the existing row.
    #[error("end must be greater than start")]
    InvalidInterval,

    /// Underlying persistence failure. Fatal per-request, never retried.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Five operations over the single `events` row set. Implementations own all
/// store access; nothing else caches or mutates Event records.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Insert a new event with a freshly generated id and return it.
    async fn create(&self, req: NewEvent) -> Result<Event, StoreError>;

    /// Fetch by id. Absence is an outcome, not an error.
    async fn get(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    /// With bounds: every event whose interval intersects `[start, end)`,
    /// using the half-open test `event.start < end AND event.end > start`,
    /// ascending by start. An event that merely touches a bound is excluded,
    /// so adjacent events never double-count across contiguous queries.
    /// Without bounds: all events, same order.
    async fn list_overlapping(
        &self,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Event>, StoreError>;

    /// Apply only the present fields of `patch`; absent fields keep their
    /// stored values. The `end > start` invariant is re-checked against the
    /// merged row before committing.
    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Event, StoreError>;

    /// Remove the event. `NotFound` when the id does not exist.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

// Merge helper shared by both implementations: the patched row that `update`
// writes, given the existing row. Checks the ordering invariant.
fn merge_patch(existing: Event, patch: EventPatch) -> Result<Event, StoreError> {
    let start = patch.start.unwrap_or(existing.start);
    let end = patch.end.unwrap_or(existing.end);
    if end <= start {
        return Err(StoreError::InvalidInterval);
    }

    Ok(Event {
        id: existing.id,
        title: patch.title.unwrap_or(existing.title),
        start,
        end,
        all_day: patch.all_day.unwrap_or(existing.all_day),
        description: patch.description.unwrap_or(existing.description),
        location: patch.location.unwrap_or(existing.location),
        color: patch.color.unwrap_or(existing.color),
    })
}
