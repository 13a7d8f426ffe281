//! Report export for event reports, metric reports and guides.
//!
//! - `pdf`: paginated, header band on every page, one page per photo,
//!   "Page i of n" footers
//! - `spreadsheet` / `csv`: the same lines as flat rows

pub mod fonts;
pub mod format;
pub mod image;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod tabular;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

pub use format::ReportFormat;
pub use layout::{Document, lay_out};
pub use model::{ImageAttachment, ReportLine, ReportRequest, humanize_key};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unknown report format {0:?} (expected pdf, spreadsheet or csv)")]
    UnknownFormat(String),

    #[error("report title is empty")]
    EmptyTitle,
}

/// A generated file ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn export(
    request: &ReportRequest,
    format: ReportFormat,
    generated_at: DateTime<Utc>,
) -> Result<ExportedFile, ReportError> {
    if request.title.trim().is_empty() {
        return Err(ReportError::EmptyTitle);
    }

    let bytes = match format {
        ReportFormat::Pdf => pdf::render(&lay_out(request, generated_at)),
        ReportFormat::Spreadsheet => tabular::to_spreadsheet(request),
        ReportFormat::Csv => tabular::to_csv(request),
    };

    debug!(
        "Exported {:?} as {} ({} bytes, {} lines, {} photos)",
        request.title,
        format,
        bytes.len(),
        request.lines.len(),
        request.images.len()
    );

    Ok(ExportedFile {
        filename: format!("{}.{}", file_stem(&request.title), format.extension()),
        mime_type: format.mime_type(),
        bytes,
    })
}

const DEFAULT_STEM: &str = "report";

/// Title with whitespace runs collapsed to `_`. Quotes, path separators and
/// control characters are dropped; a title with nothing left becomes `report`.
pub fn file_stem(title: &str) -> String {
    let stem = title
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| !c.is_control() && !matches!(c, '"' | '/' | '\\'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn filenames_follow_title_and_format() {
        let request = ReportRequest::new("Monthly Progress  Report").line("Villages", "3");
        let pdf = export(&request, ReportFormat::Pdf, now()).unwrap();
        assert_eq!(pdf.filename, "Monthly_Progress_Report.pdf");
        assert_eq!(pdf.mime_type, "application/pdf");

        let csv = export(&request, ReportFormat::Csv, now()).unwrap();
        assert_eq!(csv.filename, "Monthly_Progress_Report.csv");
        assert_eq!(csv.bytes, b"Field,Value\r\nVillages,3\r\n");
    }

    #[test]
    fn flat_exports_ignore_images() {
        let request = ReportRequest::new("Camp").line("Venue", "Hall").image(ImageAttachment {
            name: "x.jpg".into(),
            data: "garbage".into(),
        });
        let file = export(&request, ReportFormat::Spreadsheet, now()).unwrap();
        assert_eq!(String::from_utf8(file.bytes).unwrap(), "Field\tValue\r\nVenue\tHall\r\n");
    }

    #[test]
    fn empty_title_is_rejected() {
        assert!(matches!(
            export(&ReportRequest::new("  "), ReportFormat::Pdf, now()),
            Err(ReportError::EmptyTitle)
        ));
    }

    #[test]
    fn file_stem_strips_separators() {
        assert_eq!(file_stem("a/b \"c\"  d"), "ab_c_d");
    }

    #[test]
    fn file_stem_drops_control_characters() {
        assert_eq!(file_stem("Camp\u{7f}One"), "CampOne");
        assert_eq!(file_stem("Day\u{1b}[2J  two"), "Day[2J_two");
        assert_eq!(file_stem("\u{7f} \"/\""), "report");
        assert_eq!(file_stem("Shivir पंचायत"), "Shivir_पंचायत");
    }
}
