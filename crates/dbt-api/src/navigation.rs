use axum::{Extension, Json};

use dbt_types::api::{Claims, NavigationResponse};
use dbt_types::nav::{Page, tabs_for};

/// GET /navigation
pub async fn navigation(Extension(claims): Extension<Claims>) -> Json<NavigationResponse> {
    let login = Page::Login(claims.role);
    let dashboard = login.after_login();
    Json(NavigationResponse {
        login,
        login_back: login.back(),
        dashboard,
        shows_chrome: dashboard.shows_chrome(),
        tabs: tabs_for(claims.role),
    })
}

/// GET /health, liveness check (no auth).
pub async fn health() -> &'static str {
    "ok"
}
