use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BankDetails, Event, Role, Ticket, TicketAction, TicketStatus};
use crate::nav::{Page, TabEntry};

// -- JWT Claims --

/// JWT claims issued at login and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub display_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub district: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub landing: Page,
    pub token: String,
}

// -- Tickets --

/// The verification form as the student fills it in.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitTicketRequest {
    pub account_number: String,
    pub confirm_account_number: String,
    pub ifsc_code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionRequest {
    /// When set, the transition only applies if the ticket is still at this version.
    pub expected_version: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
}

/// What the student's verification tab renders.
#[derive(Debug, Clone, Serialize)]
pub struct StudentTicketView {
    pub ticket_id: Option<Uuid>,
    pub status: TicketStatus,
    pub bank: BankDetails,
    pub description: String,
    pub version: i64,
    pub can_reapply: bool,
    /// Student actions the current status allows.
    pub actions: Vec<TicketAction>,
}

impl StudentTicketView {
    pub fn empty() -> Self {
        Self {
            ticket_id: None,
            status: TicketStatus::NotSubmitted,
            bank: BankDetails::default(),
            description: String::new(),
            version: 0,
            can_reapply: false,
            actions: Vec::new(),
        }
    }

    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self {
            ticket_id: Some(ticket.id),
            status: ticket.status,
            bank: ticket.bank.clone(),
            description: ticket.description.clone(),
            version: ticket.version,
            can_reapply: ticket.status != TicketStatus::NotSubmitted,
            actions: Vec::new(),
        }
    }
}

// -- Events --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEventRequest {
    pub title: String,
    pub event_date: NaiveDate,
    pub venue: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventReportRequest {
    pub total_attendees: u32,
    pub students_verified: u32,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct EventQuery {
    pub status: Option<crate::models::EventStatus>,
}

// -- Reports --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PhotoUpload {
    pub name: String,
    /// Base64 image bytes, optionally as a `data:` URL.
    pub data: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventExportRequest {
    pub format: String,
    #[serde(default)]
    pub photos: Vec<PhotoUpload>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsReportRequest {
    pub title: String,
    pub format: String,
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuideRequest {
    pub title: String,
    pub content: String,
}

// -- Dashboard --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    Live,
    Demo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub not_submitted: u64,
    pub pending_institute: u64,
    pub pending_admin: u64,
    pub verified: u64,
    pub rejected: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: TicketStatus, count: u64) {
        match status {
            TicketStatus::NotSubmitted => self.not_submitted += count,
            TicketStatus::PendingInstitute => self.pending_institute += count,
            TicketStatus::PendingAdmin => self.pending_admin += count,
            TicketStatus::Verified => self.verified += count,
            TicketStatus::Rejected => self.rejected += count,
        }
    }

    pub fn total(&self) -> u64 {
        self.not_submitted + self.pending_institute + self.pending_admin + self.verified + self.rejected
    }
}

/// Enablement progress for one region (state, district or village).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStat {
    pub region: String,
    pub enabled: u64,
    pub pending: u64,
}

impl RegionStat {
    pub fn total(&self) -> u64 {
        self.enabled + self.pending
    }

    /// Whole-number percentage of enabled accounts, 0 for an empty region.
    pub fn percentage(&self) -> u64 {
        match self.total() {
            0 => 0,
            total => self.enabled * 100 / total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub origin: DataOrigin,
    pub tickets: StatusCounts,
    pub upcoming_events: Vec<Event>,
    pub completed_events: usize,
    pub regions: Vec<RegionStat>,
}

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub login: Page,
    /// Back target of the login page.
    pub login_back: Option<Page>,
    pub dashboard: Page,
    /// Whether the site header and footer frame the dashboard.
    pub shows_chrome: bool,
    pub tabs: Vec<TabEntry>,
}

// -- Quiz --

#[derive(Debug, Clone, Serialize)]
pub struct QuizQuestion {
    pub question: &'static str,
    pub options: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuizSubmission {
    /// Selected option per question, by question index.
    pub answers: Vec<Option<String>>,
}

#[derive(Debug, Serialize)]
pub struct QuizResult {
    pub score: usize,
    pub total: usize,
}
