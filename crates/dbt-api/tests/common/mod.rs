#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use dbt_api::auth::{AppStateInner, create_token};
use dbt_api::{DataPolicy, router};
use dbt_db::Database;
use dbt_db::queries::NewProfile;
use dbt_types::Role;

pub const SECRET: &str = "integration-test-secret";

pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppStateInner>,
}

pub struct Account {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_policy(DataPolicy::Live)
    }

    pub fn with_policy(data_policy: DataPolicy) -> Self {
        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().expect("in-memory database"),
            jwt_secret: SECRET.to_string(),
            data_policy,
        });
        Self {
            app: router(state.clone()),
            state,
        }
    }

    /// Create an account directly in the database, skipping registration
    /// so admins can be made too.
    pub fn account(&self, username: &str, role: Role) -> Account {
        self.account_in(username, role, "Varanasi")
    }

    pub fn account_in(&self, username: &str, role: Role, district: &str) -> Account {
        let id = Uuid::new_v4();
        self.state
            .db
            .create_profile(&NewProfile {
                id,
                username,
                password_hash: "unused",
                role,
                display_name: &format!("{} (display)", username),
                address: "",
                district,
            })
            .expect("create profile");
        Account {
            id,
            token: create_token(SECRET, id, username, role).expect("token"),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.expect("router is infallible")
    }

    pub async fn get(&self, token: Option<&str>, uri: &str) -> (StatusCode, Value) {
        let response = self.send(build(Method::GET, uri, token, None)).await;
        json_of(response).await
    }

    pub async fn post(&self, token: Option<&str>, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self.send(build(Method::POST, uri, token, Some(body))).await;
        json_of(response).await
    }

    /// POST without a body.
    pub async fn post_empty(&self, token: Option<&str>, uri: &str) -> (StatusCode, Value) {
        let response = self.send(build(Method::POST, uri, token, None)).await;
        json_of(response).await
    }

    /// POST expecting a file back: (status, content type, disposition, bytes).
    pub async fn download(
        &self,
        token: &str,
        uri: &str,
        body: Value,
    ) -> (StatusCode, String, String, Vec<u8>) {
        let response = self.send(build(Method::POST, uri, Some(token), Some(body))).await;
        let status = response.status();
        let header_str = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        let content_type = header_str(header::CONTENT_TYPE);
        let disposition = header_str(header::CONTENT_DISPOSITION);
        let bytes = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, content_type, disposition, bytes)
    }
}

pub fn build(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn json_of(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}
