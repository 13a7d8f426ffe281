use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dbt_report::ReportError;
use dbt_types::TicketStatus;
use dbt_workflow::WorkflowError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Every handler failure, rendered as `{ "error": message, "code": kind }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("missing or invalid credentials")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("{message}")]
    Conflict {
        message: String,
        status: Option<TicketStatus>,
        version: Option<i64>,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidTransition(_) => "invalid_transition",
            ApiError::Conflict { .. } => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
            status: None,
            version: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                json!({ "error": "internal server error", "code": self.code() })
            }
            ApiError::Conflict {
                message,
                status: Some(current),
                version,
            } => json!({
                "error": message,
                "code": self.code(),
                "status": current,
                "version": version,
            }),
            other => json!({ "error": other.to_string(), "code": other.code() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Validation(e) => ApiError::Validation(e.to_string()),
            WorkflowError::InvalidTransition(e) => ApiError::InvalidTransition(e.to_string()),
            e @ WorkflowError::Forbidden { .. } => ApiError::Forbidden(e.to_string()),
            e @ WorkflowError::NotFound(_) => ApiError::NotFound(e.to_string()),
            WorkflowError::Conflict {
                ticket_id,
                status,
                version,
            } => ApiError::Conflict {
                message: format!("ticket {} was changed by someone else", ticket_id),
                status: Some(status),
                version: Some(version),
            },
            WorkflowError::Store(e) => ApiError::Internal(e),
        }
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(anyhow::anyhow!("spawn_blocking join error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbt_types::TicketAction;
    use dbt_workflow::{InvalidTransition, ValidationError};
    use uuid::Uuid;

    #[test]
    fn workflow_errors_map_to_distinct_statuses() {
        let cases = [
            (WorkflowError::Validation(ValidationError::AccountMismatch), StatusCode::BAD_REQUEST),
            (
                WorkflowError::InvalidTransition(InvalidTransition {
                    from: TicketStatus::Verified,
                    action: TicketAction::InstituteVerify,
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                WorkflowError::Forbidden {
                    role: dbt_types::Role::Student,
                    action: TicketAction::AdminFinalize,
                },
                StatusCode::FORBIDDEN,
            ),
            (WorkflowError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                WorkflowError::Conflict {
                    ticket_id: Uuid::nil(),
                    status: TicketStatus::PendingAdmin,
                    version: 2,
                },
                StatusCode::CONFLICT,
            ),
            (WorkflowError::Store(anyhow::anyhow!("disk full")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn internal_errors_are_not_leaked() {
        let response = ApiError::Internal(anyhow::anyhow!("secret path /var/db")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
