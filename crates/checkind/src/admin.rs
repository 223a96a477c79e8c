// Admin event CRUD and face listing routes

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use checkin_core::api::{Ack, EventName, FaceSummary};
use checkin_core::{Event, EventId};

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/events", get(list_events).post(create_event))
        .route("/admin/events/:id", put(update_event).delete(delete_event))
        .route("/admin/faces", get(list_faces))
}

/// GET /admin/events - List all events
pub async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    Json(state.store.list_events().await)
}

/// POST /admin/events - Create an event
pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<EventName>,
) -> Result<Json<Ack>, ApiError> {
    let event = state.store.create_event(&req.name).await?;
    tracing::info!(id = %event.id, name = %event.name, "event created");

    Ok(Json(Ack {
        message: "Event created".into(),
        id: Some(event.id),
        name: Some(event.name),
    }))
}

/// PUT /admin/events/:id - Rename an event
pub async fn update_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<EventName>,
) -> Result<Json<Ack>, ApiError> {
    let event = state.store.rename_event(EventId(id), &req.name).await?;
    tracing::info!(id = %event.id, name = %event.name, "event renamed");

    Ok(Json(Ack {
        message: "Event updated".into(),
        id: Some(event.id),
        name: Some(event.name),
    }))
}

/// DELETE /admin/events/:id - Delete an event and its registrations
pub async fn delete_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Ack>, ApiError> {
    let removed_faces = state.store.delete_event(EventId(id)).await?;
    tracing::info!(id, removed_faces, "event deleted");

    Ok(Json(Ack {
        message: "Event deleted".into(),
        id: None,
        name: None,
    }))
}

/// GET /admin/faces - List registered faces
pub async fn list_faces(State(state): State<AppState>) -> Json<Vec<FaceSummary>> {
    Json(state.store.faces().await)
}
