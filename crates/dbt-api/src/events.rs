use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use dbt_types::api::{Claims, CreateEventRequest, EventQuery, EventReportRequest};
use dbt_types::{EventReport, Role};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_role;

/// GET /events?status=
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let events = tokio::task::spawn_blocking(move || state.db.list_events(query.status)).await??;
    Ok(Json(events))
}

/// POST /events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, &[Role::Panchayat, Role::Institute])?;

    let title = req.title.trim().to_string();
    let venue = req.venue.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("event title is required".into()));
    }
    if venue.is_empty() {
        return Err(ApiError::Validation("event venue is required".into()));
    }

    let id = Uuid::new_v4();
    let event = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        state.db.insert_event(id, claims.sub, &title, req.event_date, &venue)?;
        state
            .db
            .get_event(id)?
            .ok_or_else(|| anyhow::anyhow!("event {} missing after insert", id))
    })
    .await??;

    info!("Event {} scheduled for {} at {}", event.id, event.event_date, event.venue);
    Ok((StatusCode::CREATED, Json(event)))
}

/// POST /events/{id}/report
pub async fn submit_report(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<EventReportRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = req.summary.trim().to_string();
    if summary.is_empty() {
        return Err(ApiError::Validation("activity summary is required".into()));
    }
    if req.students_verified > req.total_attendees {
        return Err(ApiError::Validation(
            "students verified cannot exceed total attendees".into(),
        ));
    }

    let event = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let event = state
            .db
            .get_event(event_id)?
            .ok_or_else(|| ApiError::NotFound(format!("event {} not found", event_id)))?;
        if event.author_id != claims.sub && claims.role != Role::Admin {
            return Err(ApiError::Forbidden("only the organiser can report on an event".into()));
        }

        let report = EventReport {
            total_attendees: req.total_attendees,
            students_verified: req.students_verified,
            summary,
            reported_at: Utc::now(),
        };
        state
            .db
            .save_event_report(event_id, &report)?
            .ok_or_else(|| ApiError::NotFound(format!("event {} not found", event_id)))
    })
    .await??;

    info!("Report filed for event {}", event.id);
    Ok(Json(event))
}
