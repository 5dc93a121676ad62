use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{merge_patch, EventStore, StoreError};
use crate::models::Event;
use crate::validation::{EventPatch, NewEvent};

const EVENT_COLUMNS: &str = "id, title, start_at, end_at, all_day, description, location, color";

/// Gateway over the `events` table. Holds the pool handle explicitly; there
/// is no global connection state.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn create(&self, req: NewEvent) -> Result<Event, StoreError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "INSERT INTO events (id, title, start_at, end_at, all_day, description, location, color)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&req.title)
        .bind(req.start)
        .bind(req.end)
        .bind(req.all_day)
        .bind(&req.description)
        .bind(&req.location)
        .bind(&req.color)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn list_overlapping(
        &self,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Event>, StoreError> {
        let events = match range {
            Some((start, end)) => {
                // Half-open overlap: boundary-touching rows are excluded
                sqlx::query_as::<_, Event>(&format!(
                    "SELECT {EVENT_COLUMNS} FROM events
                     WHERE start_at < $2 AND end_at > $1
                     ORDER BY start_at ASC"
                ))
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Event>(&format!(
                    "SELECT {EVENT_COLUMNS} FROM events ORDER BY start_at ASC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(events)
    }

    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Event, StoreError> {
        // Read-modify-write under a row lock so the invariant check and the
        // write are one atomic unit.
        let mut tx = self.pool.begin().await?;

        let existing = Self::fetch_for_update(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound)?;
        let merged = merge_patch(existing, patch)?;

        let updated = sqlx::query_as::<_, Event>(&format!(
            "UPDATE events
             SET title = $2, start_at = $3, end_at = $4, all_day = $5,
                 description = $6, location = $7, color = $8
             WHERE id = $1
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(merged.id)
        .bind(&merged.title)
        .bind(merged.start)
        .bind(merged.end)
        .bind(merged.all_day)
        .bind(&merged.description)
        .bind(&merged.location)
        .bind(&merged.color)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
