use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};
use uuid::Uuid;

use dbt_db::Database;
use dbt_db::queries::NewProfile;
use dbt_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use dbt_types::Role;
use dbt_types::nav::Page;

use crate::error::ApiError;
use crate::provider::DataPolicy;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub data_policy: DataPolicy,
}

const TOKEN_LIFETIME_DAYS: i64 = 30;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::Validation("username must be 3 to 32 characters".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::Validation("password must be at least 8 characters".into()));
    }
    if req.display_name.trim().is_empty() {
        return Err(ApiError::Validation("display name is required".into()));
    }
    // Admin accounts are only created by seeding.
    if req.role == Role::Admin {
        return Err(ApiError::Forbidden("admin accounts cannot self-register".into()));
    }

    let user_id = Uuid::new_v4();
    let role = req.role;
    let db_state = state.clone();
    let name = username.clone();
    tokio::task::spawn_blocking(move || -> Result<(), ApiError> {
        if db_state.db.username_taken(&name)? {
            return Err(ApiError::conflict(format!("username {:?} is taken", name)));
        }
        let password_hash = hash_password(&req.password)?;
        let created = db_state.db.create_profile(&NewProfile {
            id: user_id,
            username: &name,
            password_hash: &password_hash,
            role,
            display_name: req.display_name.trim(),
            address: req.address.trim(),
            district: req.district.trim(),
        })?;
        // A concurrent registration can win between the check and the insert.
        if !created {
            return Err(ApiError::conflict(format!("username {:?} is taken", name)));
        }
        Ok(())
    })
    .await??;

    let token = create_token(&state.jwt_secret, user_id, &username, role)?;
    info!("Registered {} as {}", username, role);

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let db_state = state.clone();
    let username = req.username.trim().to_string();
    let profile = tokio::task::spawn_blocking(move || db_state.db.get_profile_by_username(&username))
        .await??
        .ok_or(ApiError::Unauthorized)?;

    // Verify password
    let parsed_hash =
        PasswordHash::new(&profile.password).map_err(|e| anyhow::anyhow!("bad stored hash: {}", e))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| {
            warn!("Failed login for {}", profile.username);
            ApiError::Unauthorized
        })?;

    let profile = profile.into_profile()?;
    let token = create_token(&state.jwt_secret, profile.id, &profile.username, profile.role)?;

    Ok(Json(LoginResponse {
        user_id: profile.id,
        username: profile.username,
        role: profile.role,
        landing: Page::Login(profile.role).after_login(),
        token,
    }))
}

/// Argon2id hash in PHC string form.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub fn create_token(
    secret: &str,
    user_id: Uuid,
    username: &str,
    role: Role,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_LIFETIME_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_carry_the_role() {
        let id = Uuid::new_v4();
        let token = create_token("secret", id, "college", Role::Institute).unwrap();
        let claims = decode_token("secret", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Institute);

        assert!(matches!(decode_token("other", &token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn hashes_verify() {
        let hash = hash_password("correct horse").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"correct horse", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
    }
}
