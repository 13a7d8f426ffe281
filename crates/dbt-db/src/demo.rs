//! Demo data: the figures the dashboards show before any real activity,
//! and optional seed accounts for trying the portal out.
//!
//! Demo summaries are built in memory and never written to the live tables.

use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use dbt_types::api::{DashboardSummary, DataOrigin, RegionStat, StatusCounts};
use dbt_types::{Event, EventReport, EventStatus, Role};
use tracing::info;
use uuid::Uuid;

use crate::Database;
use crate::queries::NewProfile;

const STATES: [(&str, u64, u64); 5] = [
    ("Uttar Pradesh", 385_420, 45_230),
    ("Maharashtra", 342_180, 38_920),
    ("Bihar", 298_540, 51_460),
    ("West Bengal", 276_420, 33_580),
    ("Madhya Pradesh", 234_180, 25_820),
];

const VILLAGES: [(&str, u64, u64); 3] = [("Rampur", 68, 12), ("Khajuriya", 32, 8), ("Sultanpur", 18, 8)];

/// (title, venue, date, attendees, verified, summary)
type DemoEvent = (&'static str, &'static str, (i32, u32, u32), u32, u32, Option<&'static str>);

const EVENTS: [DemoEvent; 3] = [
    ("DBT Verification Camp", "Panchayat Bhawan", (2025, 12, 20), 85, 0, None),
    (
        "Awareness Session",
        "Community Hall",
        (2025, 11, 15),
        120,
        45,
        Some("Explained Aadhaar seeding and DBT enablement to students and parents."),
    ),
    (
        "Document Collection Drive",
        "Village Square",
        (2025, 10, 28),
        95,
        38,
        Some("Collected bank passbook copies and consent forms."),
    ),
];

/// Accounts created by [`seed`]: (username, role, display name, district).
pub const DEMO_ACCOUNTS: [(&str, Role, &str, &str); 4] = [
    ("admin", Role::Admin, "Ministry Administrator", ""),
    ("student", Role::Student, "Rahul Verma", "Varanasi"),
    ("institute", Role::Institute, "Government Degree College", "Varanasi"),
    ("panchayat", Role::Panchayat, "Rampur Gram Panchayat", "Varanasi"),
];

/// Fixed author id for demo events so repeated calls return identical data.
const DEMO_AUTHOR: Uuid = Uuid::from_u128(0x0000_0000_0000_4000_8000_0000_0000_0d37);

/// Dashboard figures shown when no live data exists. Admins see the
/// state-wise national view; everyone else the village view of one panchayat.
pub fn summary(role: Role) -> DashboardSummary {
    let (tickets, regions) = match role {
        Role::Admin => {
            let mut tickets = StatusCounts::default();
            let regions: Vec<RegionStat> = STATES
                .iter()
                .map(|&(region, enabled, pending)| region_stat(region, enabled, pending))
                .collect();
            for region in &regions {
                tickets.verified += region.enabled;
                tickets.pending_admin += region.pending;
            }
            (tickets, regions)
        }
        _ => {
            let tickets = StatusCounts {
                not_submitted: 10,
                pending_institute: 28,
                pending_admin: 0,
                verified: 118,
                rejected: 0,
            };
            let regions = VILLAGES
                .iter()
                .map(|&(region, enabled, pending)| region_stat(region, enabled, pending))
                .collect();
            (tickets, regions)
        }
    };

    let events = events();
    let completed_events = events.iter().filter(|e| e.status == EventStatus::Completed).count();
    let upcoming_events = events.into_iter().filter(|e| e.status == EventStatus::Scheduled).collect();

    DashboardSummary {
        origin: DataOrigin::Demo,
        tickets,
        upcoming_events,
        completed_events,
        regions,
    }
}

pub fn events() -> Vec<Event> {
    EVENTS
        .iter()
        .enumerate()
        .filter_map(|(i, &(title, venue, (y, m, d), attendees, verified, summary))| {
            let event_date = NaiveDate::from_ymd_opt(y, m, d)?;
            let created_at = Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).single()?;
            let report = match summary {
                Some(summary) => Some(EventReport {
                    total_attendees: attendees,
                    students_verified: verified,
                    summary: summary.to_string(),
                    reported_at: event_date.and_hms_opt(18, 0, 0)?.and_utc(),
                }),
                None => None,
            };
            Some(Event {
                id: Uuid::from_u128(0xd37_0000 + i as u128),
                author_id: DEMO_AUTHOR,
                title: title.to_string(),
                event_date,
                venue: venue.to_string(),
                status: if report.is_some() {
                    EventStatus::Completed
                } else {
                    EventStatus::Scheduled
                },
                report,
                created_at,
            })
        })
        .collect()
}

fn region_stat(region: &str, enabled: u64, pending: u64) -> RegionStat {
    RegionStat {
        region: region.to_string(),
        enabled,
        pending,
    }
}

/// Create the demo accounts that do not exist yet, all sharing one password
/// hash, and give the demo panchayat its scheduled camp. Returns how many
/// accounts were created.
pub fn seed(db: &Database, password_hash: &str) -> Result<usize> {
    let mut created = 0;
    for (username, role, display_name, district) in DEMO_ACCOUNTS {
        let id = Uuid::new_v4();
        let inserted = db.create_profile(&NewProfile {
            id,
            username,
            password_hash,
            role,
            display_name,
            address: "",
            district,
        })?;
        if !inserted {
            continue;
        }
        created += 1;

        if role == Role::Panchayat {
            for event in events().into_iter().filter(|e| e.status == EventStatus::Scheduled) {
                db.insert_event(Uuid::new_v4(), id, &event.title, event.event_date, &event.venue)?;
            }
        }
    }

    info!("Seeded {} demo accounts", created);
    Ok(created)
}
