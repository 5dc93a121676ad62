use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use calendar_api::{controllers, store::MemoryEventStore, AppState};

fn app() -> Router {
    let state = AppState::new(Arc::new(MemoryEventStore::new()));
    Router::new()
        .nest("/api", controllers::routes())
        .with_state(state)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn create_then_get_round_trips() {
    let app = app();

    let (status, created) = request(
        &app,
        "POST",
        "/api/events",
        Some(json!({
            "title": "Checkup",
            "start": "2024-01-10T09:00:00Z",
            "end": "2024-01-10T09:30:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "Checkup");
    assert_eq!(created["allDay"], false);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = request(&app, "GET", &format!("/api/events/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn invalid_create_reports_every_field_and_persists_nothing() {
    let app = app();

    let (status, body) = request(
        &app,
        "POST",
        "/api/events",
        Some(json!({ "title": "", "start": "not-a-date" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");

    let fields: Vec<_> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "start", "end"]);

    let (status, events) = request(&app, "GET", "/api/events", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn inverted_interval_create_is_rejected() {
    let app = app();

    let (status, body) = request(
        &app,
        "POST",
        "/api/events",
        Some(json!({
            "title": "Backwards",
            "start": "2024-01-10T10:00:00Z",
            "end": "2024-01-10T09:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "end");
}

#[tokio::test]
async fn overlap_query_matches_partial_intersection_but_not_boundary_touch() {
    let app = app();

    let (status, _) = request(
        &app,
        "POST",
        "/api/events",
        Some(json!({
            "title": "Checkup",
            "start": "2024-01-10T09:00:00Z",
            "end": "2024-01-10T09:30:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Overlap, not containment
    let (status, events) = request(
        &app,
        "GET",
        "/api/events?start=2024-01-10T09:15:00Z&end=2024-01-10T09:45:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events[0]["title"], "Checkup");

    // Touching at the boundary only
    let (status, events) = request(
        &app,
        "GET",
        "/api/events?start=2024-01-10T09:30:00Z&end=2024-01-10T10:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(events.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn adjacent_events_never_double_count() {
    let app = app();

    for (title, start, end) in [
        ("A", "2024-01-10T09:00:00Z", "2024-01-10T10:00:00Z"),
        ("B", "2024-01-10T10:00:00Z", "2024-01-10T11:00:00Z"),
    ] {
        let (status, _) = request(
            &app,
            "POST",
            "/api/events",
            Some(json!({ "title": title, "start": start, "end": end })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, events) = request(
        &app,
        "GET",
        "/api/events?start=2024-01-10T09:00:00Z&end=2024-01-10T10:00:00Z",
        None,
    )
    .await;
    let titles: Vec<_> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["A"]);
}

#[tokio::test]
async fn bad_range_bound_is_rejected() {
    let app = app();
    let (status, body) = request(
        &app,
        "GET",
        "/api/events?start=yesterday&end=2024-01-10T10:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "start");
}

#[tokio::test]
async fn patch_preserves_untouched_fields() {
    let app = app();

    let (_, created) = request(
        &app,
        "POST",
        "/api/events",
        Some(json!({
            "title": "X",
            "start": "2024-01-10T09:00:00Z",
            "end": "2024-01-10T10:00:00Z",
            "color": "#fff"
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = request(
        &app,
        "PATCH",
        &format!("/api/events/{id}"),
        Some(json!({ "title": "Y" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Y");
    assert_eq!(updated["color"], "#fff");
    assert_eq!(updated["start"], created["start"]);
}

#[tokio::test]
async fn patch_that_would_invert_interval_is_rejected() {
    let app = app();

    let (_, created) = request(
        &app,
        "POST",
        "/api/events",
        Some(json!({
            "title": "X",
            "start": "2024-01-10T09:00:00Z",
            "end": "2024-01-10T10:00:00Z"
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    // Lone bound, checked against the stored row
    let (status, body) = request(
        &app,
        "PATCH",
        &format!("/api/events/{id}"),
        Some(json!({ "start": "2024-01-10T11:00:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "end");
}

#[tokio::test]
async fn put_replaces_every_field() {
    let app = app();

    let (_, created) = request(
        &app,
        "POST",
        "/api/events",
        Some(json!({
            "title": "Original",
            "start": "2024-01-10T09:00:00Z",
            "end": "2024-01-10T10:00:00Z",
            "description": "keep me?"
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, replaced) = request(
        &app,
        "PUT",
        &format!("/api/events/{id}"),
        Some(json!({
            "title": "Replaced",
            "start": "2024-01-11T09:00:00Z",
            "end": "2024-01-11T10:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["title"], "Replaced");
    assert_eq!(replaced["description"], Value::Null);
    assert_eq!(replaced["id"], created["id"]);
}

#[tokio::test]
async fn missing_ids_are_distinguishable_not_found() {
    let app = app();
    let id = "7f0e4e9c-1f6a-4a9e-9e2a-3f7a1a2b3c4d";

    let (status, body) = request(&app, "GET", &format!("/api/events/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");

    let (status, _) = request(
        &app,
        "PATCH",
        &format!("/api/events/{id}"),
        Some(json!({ "title": "Y" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(&app, "DELETE", &format!("/api/events/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = app();

    let (_, created) = request(
        &app,
        "POST",
        "/api/events",
        Some(json!({
            "title": "Gone",
            "start": "2024-01-10T09:00:00Z",
            "end": "2024-01-10T10:00:00Z"
        })),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = request(&app, "DELETE", &format!("/api/events/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = request(&app, "GET", &format!("/api/events/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
