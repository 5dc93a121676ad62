use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::validation::{self, CreateEventPayload, UpdateEventPayload};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event)
                .put(replace_event)
                .patch(patch_event)
                .delete(delete_event),
        )
}

// GET /api/events?start=...&end=...
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = validation::parse_range(params.start.as_deref(), params.end.as_deref())?;
    let events = state.store.list_overlapping(range).await?;
    Ok(Json(events))
}

// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateEventPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let req = validation::validate_create(payload)?;
    let event = state.store.create(req).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state.store.get(id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(event))
}

// PUT /api/events/{id}: full replace, validated like a create
async fn replace_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateEventPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let req = validation::validate_create(payload)?;
    let event = state.store.update(id, req.into()).await?;
    Ok(Json(event))
}

// PATCH /api/events/{id}: sparse update, omitted fields keep their values
async fn patch_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = validation::validate_patch(payload)?;
    let event = state.store.update(id, patch).await?;
    Ok(Json(event))
}

// DELETE /api/events/{id}
async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
