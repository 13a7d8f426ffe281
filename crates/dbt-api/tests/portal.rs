mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use dbt_api::DataPolicy;
use dbt_types::Role;

#[tokio::test]
async fn health_is_public() {
    let app = TestApp::new();
    let (status, body) = app.get(None, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn register_login_and_me() {
    let app = TestApp::new();

    let (status, registered) = app
        .post(
            None,
            "/auth/register",
            json!({
                "username": "rahul",
                "password": "a-long-password",
                "role": "student",
                "display_name": "Rahul Verma",
                "district": "Varanasi",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(registered["token"].as_str().is_some());

    let (status, _) = app
        .post(
            None,
            "/auth/register",
            json!({ "username": "rahul", "password": "another-password", "role": "student", "display_name": "R" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(None, "/auth/login", json!({ "username": "rahul", "password": "wrong-password" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = app
        .post(None, "/auth/login", json!({ "username": "rahul", "password": "a-long-password" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["role"], "student");
    assert_eq!(login["landing"], "student");
    let token = login["token"].as_str().unwrap().to_string();

    let (status, me) = app.get(Some(&token), "/profiles/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["display_name"], "Rahul Verma");
    assert_eq!(me["district"], "Varanasi");
}

#[tokio::test]
async fn registration_rules() {
    let app = TestApp::new();

    let (status, _) = app
        .post(
            None,
            "/auth/register",
            json!({ "username": "root", "password": "a-long-password", "role": "admin", "display_name": "Root" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            None,
            "/auth/register",
            json!({ "username": "gp", "password": "short", "role": "panchayat", "display_name": "GP" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    // "institution" is accepted as an alias for institute.
    let (status, _) = app
        .post(
            None,
            "/auth/register",
            json!({ "username": "college", "password": "a-long-password", "role": "institution", "display_name": "GDC" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn profiles_are_visible_to_reviewers_only() {
    let app = TestApp::new();
    let student = app.account("rahul", Role::Student);
    let other = app.account("priya", Role::Student);
    let institute = app.account("college", Role::Institute);

    let uri = format!("/profiles/{}", student.id);
    let (status, profile) = app.get(Some(&institute.token), &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "rahul");
    assert!(profile.get("password").is_none());

    let (status, _) = app.get(Some(&other.token), &uri).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(Some(&institute.token), &format!("/profiles/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn navigation_follows_the_role() {
    let app = TestApp::new();
    let panchayat = app.account("gp", Role::Panchayat);
    let (status, nav) = app.get(Some(&panchayat.token), "/navigation").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nav["dashboard"], "panchayat");
    assert_eq!(nav["login"], "panchayat-login");
    assert_eq!(nav["login_back"], "landing");
    assert_eq!(nav["shows_chrome"], false);
    assert!(!nav["tabs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn events_lifecycle_and_permissions() {
    let app = TestApp::new();
    let panchayat = app.account("gp", Role::Panchayat);
    let other_gp = app.account("gp2", Role::Panchayat);
    let student = app.account("rahul", Role::Student);
    let admin = app.account("admin", Role::Admin);

    let body = json!({ "title": "DBT Verification Camp", "event_date": "2025-12-20", "venue": "Panchayat Bhawan" });
    let (status, _) = app.post(Some(&student.token), "/events", body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post(Some(&panchayat.token), "/events", json!({ "title": " ", "event_date": "2025-12-20", "venue": "Hall" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, event) = app.post(Some(&panchayat.token), "/events", body).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(event["status"], "scheduled");
    let report_uri = format!("/events/{}/report", event["id"].as_str().unwrap());

    let (status, _) = app
        .post(
            Some(&panchayat.token),
            &report_uri,
            json!({ "total_attendees": 10, "students_verified": 11, "summary": "Too many" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let report = json!({ "total_attendees": 85, "students_verified": 40, "summary": "Camp held" });
    let (status, _) = app.post(Some(&other_gp.token), &report_uri, report.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, event) = app.post(Some(&admin.token), &report_uri, report).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["report"]["students_verified"], 40);

    let (_, scheduled) = app.get(Some(&student.token), "/events?status=scheduled").await;
    assert!(scheduled.as_array().unwrap().is_empty());
    let (_, all) = app.get(Some(&student.token), "/events").await;
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn dashboard_reports_its_origin() {
    let app = TestApp::with_policy(DataPolicy::LiveOrDemo);
    let admin = app.account("admin", Role::Admin);

    let (status, summary) = app.get(Some(&admin.token), "/dashboard").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["origin"], "demo");
    assert_eq!(summary["regions"][0]["region"], "Uttar Pradesh");

    let student = app.account_in("rahul", Role::Student, "Varanasi");
    let (status, _) = app
        .post(
            Some(&student.token),
            "/tickets",
            json!({ "account_number": "123456789", "confirm_account_number": "123456789", "ifsc_code": "SBIN0001234" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, summary) = app.get(Some(&admin.token), "/dashboard").await;
    assert_eq!(summary["origin"], "live");
    assert_eq!(summary["tickets"]["pending_institute"], 1);
    assert_eq!(summary["regions"][0]["region"], "Varanasi");
    assert_eq!(summary["regions"][0]["pending"], 1);
}

#[tokio::test]
async fn live_policy_never_shows_demo_data() {
    let app = TestApp::with_policy(DataPolicy::Live);
    let admin = app.account("admin", Role::Admin);
    let (_, summary) = app.get(Some(&admin.token), "/dashboard").await;
    assert_eq!(summary["origin"], "live");
    assert_eq!(summary["regions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn quiz_scores_exact_matches() {
    let app = TestApp::new();
    let student = app.account("rahul", Role::Student);

    let (status, quiz) = app.get(Some(&student.token), "/quiz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quiz.as_array().unwrap().len(), 3);

    let (status, result) = app
        .post(
            Some(&student.token),
            "/quiz/score",
            json!({ "answers": ["Direct Benefit Transfer", null, "All of the above"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["score"], 2);
    assert_eq!(result["total"], 3);
}
