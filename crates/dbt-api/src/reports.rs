use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use uuid::Uuid;

use dbt_report::{ExportedFile, ImageAttachment, ReportFormat, ReportRequest, export};
use dbt_types::Event;
use dbt_types::api::{EventExportRequest, GuideRequest, MetricsReportRequest};

use crate::auth::AppState;
use crate::error::ApiError;

/// POST /events/{id}/export
pub async fn export_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<EventExportRequest>,
) -> Result<Response, ApiError> {
    let format: ReportFormat = req.format.parse()?;
    let file = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let event = state
            .db
            .get_event(event_id)?
            .ok_or_else(|| ApiError::NotFound(format!("event {} not found", event_id)))?;
        let mut request = event_report(&event);
        for photo in req.photos {
            request = request.image(ImageAttachment {
                name: photo.name,
                data: photo.data,
            });
        }
        Ok(export(&request, format, Utc::now())?)
    })
    .await??;
    file_response(file)
}

/// POST /reports/metrics
pub async fn export_metrics(Json(req): Json<MetricsReportRequest>) -> Result<Response, ApiError> {
    let format: ReportFormat = req.format.parse()?;
    let request = ReportRequest::metrics(req.title.trim(), &req.metrics);
    let file = tokio::task::spawn_blocking(move || export(&request, format, Utc::now())).await??;
    file_response(file)
}

/// POST /reports/guide. Guides are always paginated documents.
pub async fn export_guide(Json(req): Json<GuideRequest>) -> Result<Response, ApiError> {
    let request = ReportRequest::guide(req.title.trim(), &req.content);
    let file =
        tokio::task::spawn_blocking(move || export(&request, ReportFormat::Pdf, Utc::now())).await??;
    file_response(file)
}

/// Report lines for an event and, once filed, its outcome.
pub fn event_report(event: &Event) -> ReportRequest {
    let mut request = ReportRequest::new(format!("Event Report - {}", event.title))
        .line("Event", &event.title)
        .line("Date", event.event_date.format("%d %b %Y").to_string())
        .line("Venue", &event.venue)
        .line("Status", event.status.as_str());

    if let Some(report) = &event.report {
        request = request
            .line("Total Attendees", report.total_attendees.to_string())
            .line("Students Verified", report.students_verified.to_string())
            .line("Activity Summary", &report.summary)
            .line("Reported On", report.reported_at.format("%d %b %Y").to_string());
    }
    request
}

fn file_response(file: ExportedFile) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&content_disposition(&file.filename))
        .map_err(|e| anyhow::anyhow!("bad download filename {:?}: {}", file.filename, e))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(file.mime_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(file.bytes),
    )
        .into_response())
}

/// `attachment` with an ASCII `filename` for old clients and the exact name
/// as RFC 5987 `filename*`.
fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .filter(|c| !matches!(c, '"' | '\\'))
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}
