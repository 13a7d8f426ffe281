use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use dbt_types::Role;
use dbt_types::api::{Claims, SubmitTicketRequest, TicketQuery, TransitionRequest};
use dbt_workflow::{Actor, TicketWorkflow, WorkflowError};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::actor;

/// GET /tickets/mine
pub async fn mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != Role::Student {
        return Err(ApiError::Forbidden("only students have a verification ticket".into()));
    }
    let view = tokio::task::spawn_blocking(move || {
        TicketWorkflow::new(&state.db).current(&actor(&claims))
    })
    .await??;
    Ok(Json(view))
}

/// POST /tickets
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitTicketRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ticket = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        // The ticket carries the name from the profile, not the login name.
        let display_name = match state.db.get_profile(claims.sub)? {
            Some(profile) => profile.display_name,
            None => return Err(ApiError::Unauthorized),
        };
        let student = Actor {
            display_name,
            ..actor(&claims)
        };
        Ok(TicketWorkflow::new(&state.db).submit(&student, &req)?)
    })
    .await??;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /tickets?status=
pub async fn queue(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<TicketQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let tickets = tokio::task::spawn_blocking(move || {
        TicketWorkflow::new(&state.db).queue(&actor(&claims), query.status)
    })
    .await??;
    Ok(Json(tickets))
}

/// GET /tickets/{id}/history
pub async fn history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticket_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = tokio::task::spawn_blocking(move || {
        TicketWorkflow::new(&state.db).history(&actor(&claims), ticket_id)
    })
    .await??;
    Ok(Json(entries))
}

/// POST /tickets/{id}/verify
pub async fn verify(
    state: State<AppState>,
    claims: Extension<Claims>,
    path: Path<Uuid>,
    body: Option<Json<TransitionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    transition(state, claims, path, body, |wf, who, id, version| {
        wf.institute_verify(who, id, version)
    })
    .await
}

/// POST /tickets/{id}/reject. Institutes reject at the first review,
/// admins at the final one.
pub async fn reject(
    state: State<AppState>,
    claims: Extension<Claims>,
    path: Path<Uuid>,
    body: Option<Json<TransitionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    transition(state, claims, path, body, |wf, who, id, version| match who.role {
        Role::Admin => wf.admin_reject(who, id, version),
        _ => wf.institute_reject(who, id, version),
    })
    .await
}

/// POST /tickets/{id}/finalize
pub async fn finalize(
    state: State<AppState>,
    claims: Extension<Claims>,
    path: Path<Uuid>,
    body: Option<Json<TransitionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    transition(state, claims, path, body, |wf, who, id, version| {
        wf.admin_finalize(who, id, version)
    })
    .await
}

/// POST /tickets/{id}/reapply
pub async fn reapply(
    state: State<AppState>,
    claims: Extension<Claims>,
    path: Path<Uuid>,
    body: Option<Json<TransitionRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    transition(state, claims, path, body, |wf, who, id, version| {
        wf.reapply(who, id, version)
    })
    .await
}

type TransitionFn = fn(
    &TicketWorkflow<'_, dbt_db::Database>,
    &Actor,
    Uuid,
    Option<i64>,
) -> Result<dbt_types::Ticket, WorkflowError>;

async fn transition(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ticket_id): Path<Uuid>,
    body: Option<Json<TransitionRequest>>,
    apply: TransitionFn,
) -> Result<Json<dbt_types::Ticket>, ApiError> {
    let expected_version = body.and_then(|Json(req)| req.expected_version);
    let ticket = tokio::task::spawn_blocking(move || {
        let workflow = TicketWorkflow::new(&state.db);
        apply(&workflow, &actor(&claims), ticket_id, expected_version)
    })
    .await??;
    Ok(Json(ticket))
}
