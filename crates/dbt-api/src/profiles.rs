use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use dbt_types::Role;
use dbt_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_role;

/// GET /profiles/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let row = tokio::task::spawn_blocking(move || state.db.get_profile(claims.sub))
        .await??
        // The account behind a still-valid token is gone.
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(row.into_profile()?))
}

/// GET /profiles/{id}. Reviewers look up the student behind a ticket.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&claims, &[Role::Institute, Role::Admin])?;
    let row = tokio::task::spawn_blocking(move || state.db.get_profile(id))
        .await??
        .ok_or_else(|| ApiError::NotFound(format!("profile {} not found", id)))?;
    Ok(Json(row.into_profile()?))
}
