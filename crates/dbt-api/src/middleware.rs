use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use dbt_types::Role;
use dbt_types::api::Claims;
use dbt_workflow::Actor;

use crate::auth::{AppState, decode_token};
use crate::error::ApiError;

/// Extract and validate the JWT from the Authorization header and make the
/// claims available to handlers as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = decode_token(&state.jwt_secret, token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Reject callers whose role is not in `allowed`.
pub fn require_role(claims: &Claims, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&claims.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("{} accounts cannot do this", claims.role)))
    }
}

/// The workflow's view of the caller. The username stands in for the
/// display name where the profile is not loaded.
pub fn actor(claims: &Claims) -> Actor {
    Actor {
        id: claims.sub,
        role: claims.role,
        display_name: claims.username.clone(),
    }
}
