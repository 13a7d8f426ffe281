//! Types shared by every DBT portal crate: persisted models, HTTP payloads and
//! the typed navigation surface.

pub mod api;
pub mod models;
pub mod nav;

pub use models::{
    BankDetails, Event, EventReport, EventStatus, Profile, Role, Ticket, TicketAction,
    TicketHistoryEntry, TicketStatus,
};
