use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{merge_patch, EventStore, StoreError};
use crate::models::Event;
use crate::validation::{EventPatch, NewEvent};

/// In-memory store with the same contract as [`PgEventStore`], used as the
/// test double behind the explicit store handle.
///
/// [`PgEventStore`]: super::PgEventStore
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<Uuid, Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn create(&self, req: NewEvent) -> Result<Event, StoreError> {
        let event = Event {
            id: Uuid::new_v4(),
            title: req.title,
            start: req.start,
            end: req.end,
            all_day: req.all_day,
            description: req.description,
            location: req.location,
            color: req.color,
        };

        self.events.write().await.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn list_overlapping(
        &self,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().await;
        let mut matched: Vec<Event> = events
            .values()
            .filter(|e| match range {
                // Half-open overlap test, same as the SQL predicate
                Some((start, end)) => e.start < end && e.end > start,
                None => true,
            })
            .cloned()
            .collect();

        matched.sort_by_key(|e| e.start);
        Ok(matched)
    }

    async fn update(&self, id: Uuid, patch: EventPatch) -> Result<Event, StoreError> {
        let mut events = self.events.write().await;
        let existing = events.get(&id).cloned().ok_or(StoreError::NotFound)?;

        let merged = merge_patch(existing, patch)?;
        events.insert(id, merged.clone());
        Ok(merged)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        match self.events.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }
}
