use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Returned when a status, role or action string is not one we know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

// -- Profiles --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    #[serde(alias = "institution")]
    Institute,
    Panchayat,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Institute => "institute",
            Role::Panchayat => "panchayat",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "institute" | "institution" => Ok(Role::Institute),
            "panchayat" => Ok(Role::Panchayat),
            "admin" => Ok(Role::Admin),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub display_name: String,
    pub address: String,
    pub district: String,
    pub created_at: DateTime<Utc>,
}

// -- Tickets --

/// Verification status of a ticket.
///
/// `open` is what older rows carry for a freshly submitted request; it reads
/// back as `PendingInstitute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    NotSubmitted,
    #[serde(alias = "open")]
    PendingInstitute,
    PendingAdmin,
    Verified,
    Rejected,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 5] = [
        TicketStatus::NotSubmitted,
        TicketStatus::PendingInstitute,
        TicketStatus::PendingAdmin,
        TicketStatus::Verified,
        TicketStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::NotSubmitted => "not_submitted",
            TicketStatus::PendingInstitute => "pending_institute",
            TicketStatus::PendingAdmin => "pending_admin",
            TicketStatus::Verified => "verified",
            TicketStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_submitted" => Ok(TicketStatus::NotSubmitted),
            "pending_institute" | "open" => Ok(TicketStatus::PendingInstitute),
            "pending_admin" => Ok(TicketStatus::PendingAdmin),
            "verified" => Ok(TicketStatus::Verified),
            "rejected" => Ok(TicketStatus::Rejected),
            other => Err(ParseEnumError::new("ticket status", other)),
        }
    }
}

/// Every way a ticket can be moved. Each action belongs to exactly one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketAction {
    Submit,
    InstituteVerify,
    InstituteReject,
    AdminFinalize,
    AdminReject,
    Reapply,
}

impl TicketAction {
    pub const ALL: [TicketAction; 6] = [
        TicketAction::Submit,
        TicketAction::InstituteVerify,
        TicketAction::InstituteReject,
        TicketAction::AdminFinalize,
        TicketAction::AdminReject,
        TicketAction::Reapply,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TicketAction::Submit => "submit",
            TicketAction::InstituteVerify => "institute_verify",
            TicketAction::InstituteReject => "institute_reject",
            TicketAction::AdminFinalize => "admin_finalize",
            TicketAction::AdminReject => "admin_reject",
            TicketAction::Reapply => "reapply",
        }
    }

    pub fn role(self) -> Role {
        match self {
            TicketAction::Submit | TicketAction::Reapply => Role::Student,
            TicketAction::InstituteVerify | TicketAction::InstituteReject => Role::Institute,
            TicketAction::AdminFinalize | TicketAction::AdminReject => Role::Admin,
        }
    }
}

impl fmt::Display for TicketAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketAction {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TicketAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("ticket action", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_number: String,
    pub ifsc_code: String,
}

impl BankDetails {
    /// Account number reduced to its last four digits, as shown to reviewers.
    pub fn masked(&self) -> BankDetails {
        let digits: Vec<char> = self.account_number.chars().collect();
        let account_number = if digits.len() <= 4 {
            self.account_number.clone()
        } else {
            let tail: String = digits[digits.len() - 4..].iter().collect();
            format!("•••• {}", tail)
        };
        BankDetails {
            account_number,
            ifsc_code: self.ifsc_code.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub display_name: String,
    pub bank: BankDetails,
    pub description: String,
    pub status: TicketStatus,
    /// Bumped by every applied transition; used for conditional updates.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn masked(mut self) -> Ticket {
        self.bank = self.bank.masked();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketHistoryEntry {
    pub ticket_id: Uuid,
    pub action: TicketAction,
    pub from_status: TicketStatus,
    pub to_status: TicketStatus,
    pub actor_id: Uuid,
    pub version: i64,
    pub at: DateTime<Utc>,
}

// -- Events --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Completed,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(EventStatus::Scheduled),
            "completed" => Ok(EventStatus::Completed),
            other => Err(ParseEnumError::new("event status", other)),
        }
    }
}

/// Outcome of a camp or awareness session. Photos are never stored here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventReport {
    pub total_attendees: u32,
    pub students_verified: u32,
    pub summary: String,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub event_date: NaiveDate,
    pub venue: String,
    pub status: EventStatus,
    pub report: Option<EventReport>,
    pub created_at: DateTime<Utc>,
}
