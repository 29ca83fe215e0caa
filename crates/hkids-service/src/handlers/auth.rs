//! Authentication handlers: registration, login, current identity.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use hkids_core::{hash_password, verify_password, Role, User};
use hkids_store::Store;

use crate::auth::{issue_token, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// Public view of a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Account role.
    pub role: Role,
    /// Bound kid profile, for kid accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid_profile_id: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            kid_profile_id: user.kid_profile_id.map(|id| id.to_string()),
        }
    }
}

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Desired login name.
    pub username: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
    /// Requested role. Only "parent" is accepted; the sole admin account
    /// is the one seeded at schema initialization.
    pub role: Option<String>,
}

/// Register a new parent account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("username is required".into()));
    }
    if body.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "password must be at least 6 characters".into(),
        ));
    }
    if let Some(role) = body.role.as_deref() {
        if role != Role::Parent.as_str() {
            return Err(ApiError::BadRequest(format!(
                "only parent accounts can self-register, got role: {role}"
            )));
        }
    }

    let password_hash =
        hash_password(&body.password).map_err(|e| ApiError::Internal(e.to_string()))?;
    let user = User::new(username.to_string(), password_hash, Role::Parent);

    state.store.create_user(&user).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "account registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Signed bearer token.
    pub token: String,
    /// The authenticated account.
    pub user: UserResponse,
}

/// Verify credentials and issue a token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .store
        .get_user_by_username(&body.username)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    let token = issue_token(
        &user,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    tracing::info!(user_id = %user.id, username = %user.username, "login");

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

/// Return the authenticated account.
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("account not found".into()))?;

    Ok(Json(UserResponse::from(&user)))
}
