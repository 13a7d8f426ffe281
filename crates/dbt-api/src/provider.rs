//! Where dashboard figures come from.
//!
//! Live figures are aggregated from the database; demo figures are the
//! static showcase numbers. Which one is served is decided by an explicit
//! [`DataPolicy`], and every summary says which origin it came from.

use std::fmt;
use std::str::FromStr;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use dbt_db::Database;
use dbt_types::api::{Claims, DashboardSummary, DataOrigin};
use dbt_types::{EventStatus, Role};
use thiserror::Error;
use tracing::debug;

use crate::auth::AppState;
use crate::error::ApiError;

pub trait DashboardSource {
    fn summary(&self, role: Role) -> anyhow::Result<DashboardSummary>;
}

pub struct LiveSource<'a> {
    db: &'a Database,
}

impl<'a> LiveSource<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

impl DashboardSource for LiveSource<'_> {
    fn summary(&self, _role: Role) -> anyhow::Result<DashboardSummary> {
        let tickets = self.db.ticket_counts()?;
        let upcoming_events = self.db.list_events(Some(EventStatus::Scheduled))?;
        let completed_events = self.db.list_events(Some(EventStatus::Completed))?.len();
        let regions = self.db.district_stats()?;
        Ok(DashboardSummary {
            origin: DataOrigin::Live,
            tickets,
            upcoming_events,
            completed_events,
            regions,
        })
    }
}

pub struct DemoSource;

impl DashboardSource for DemoSource {
    fn summary(&self, role: Role) -> anyhow::Result<DashboardSummary> {
        Ok(dbt_db::demo::summary(role))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataPolicy {
    Live,
    Demo,
    /// Live figures, or demo figures while nothing has been recorded yet.
    #[default]
    LiveOrDemo,
}

#[derive(Debug, Error)]
#[error("unknown data mode {0:?} (expected live, demo or live_or_demo)")]
pub struct UnknownDataMode(String);

impl FromStr for DataPolicy {
    type Err = UnknownDataMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(DataPolicy::Live),
            "demo" => Ok(DataPolicy::Demo),
            "live_or_demo" | "live-or-demo" => Ok(DataPolicy::LiveOrDemo),
            _ => Err(UnknownDataMode(s.to_string())),
        }
    }
}

impl fmt::Display for DataPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataPolicy::Live => "live",
            DataPolicy::Demo => "demo",
            DataPolicy::LiveOrDemo => "live_or_demo",
        })
    }
}

/// Nothing recorded at all: no tickets, no events, no regions.
fn is_empty(summary: &DashboardSummary) -> bool {
    summary.tickets.total() == 0
        && summary.upcoming_events.is_empty()
        && summary.completed_events == 0
        && summary.regions.is_empty()
}

/// Pick the summary according to `policy`. A live failure is returned as
/// an error; only an empty live result falls back to demo data.
pub fn resolve(
    policy: DataPolicy,
    live: &dyn DashboardSource,
    demo: &dyn DashboardSource,
    role: Role,
) -> anyhow::Result<DashboardSummary> {
    match policy {
        DataPolicy::Live => live.summary(role),
        DataPolicy::Demo => demo.summary(role),
        DataPolicy::LiveOrDemo => {
            let summary = live.summary(role)?;
            if is_empty(&summary) {
                debug!("No live data yet, serving demo dashboard for {}", role);
                demo.summary(role)
            } else {
                Ok(summary)
            }
        }
    }
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = tokio::task::spawn_blocking(move || {
        resolve(state.data_policy, &LiveSource::new(&state.db), &DemoSource, claims.role)
    })
    .await??;
    Ok(Json(summary))
}
