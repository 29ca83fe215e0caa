//! Kid profile and approval handlers.
//!
//! Profiles are owned exclusively by one parent; a profile belonging to
//! another parent is indistinguishable from a missing one (404).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use hkids_core::{CategoryId, KidProfile, KidProfileId, ParentApproval};
use hkids_store::{BookSummary, Store};

use crate::auth::ParentUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Profile create/update request.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    /// Display name.
    pub name: String,
    /// Stored avatar path, if any.
    pub avatar: Option<String>,
    /// The kid's age, if known.
    pub age: Option<i16>,
}

/// Approval decision request.
#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    /// Whether the profile may see books in the category.
    pub approved: bool,
}

/// Create a kid profile owned by the caller.
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    ParentUser(parent): ParentUser,
    Json(body): Json<ProfileRequest>,
) -> Result<(StatusCode, Json<KidProfile>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }

    let mut profile = KidProfile::new(parent.user_id, name.to_string());
    profile.avatar = body.avatar;
    profile.age = body.age;

    state.store.create_kid_profile(&profile).await?;

    tracing::info!(profile_id = %profile.id, parent_id = %parent.user_id, "kid profile created");

    Ok((StatusCode::CREATED, Json(profile)))
}

/// List the caller's kid profiles.
pub async fn list_profiles(
    State(state): State<Arc<AppState>>,
    ParentUser(parent): ParentUser,
) -> Result<Json<Vec<KidProfile>>, ApiError> {
    Ok(Json(state.store.list_kid_profiles(&parent.user_id).await?))
}

/// Update a profile owned by the caller.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    ParentUser(parent): ParentUser,
    Path(id): Path<KidProfileId>,
    Json(body): Json<ProfileRequest>,
) -> Result<Json<KidProfile>, ApiError> {
    let mut profile = owned_profile(&state, &parent.user_id, &id).await?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }
    profile.name = name.to_string();
    profile.avatar = body.avatar;
    profile.age = body.age;

    if !state.store.update_kid_profile(&profile).await? {
        return Err(ApiError::NotFound(format!("kid profile not found: {id}")));
    }

    Ok(Json(profile))
}

/// Delete a profile owned by the caller. Approvals cascade.
pub async fn delete_profile(
    State(state): State<Arc<AppState>>,
    ParentUser(parent): ParentUser,
    Path(id): Path<KidProfileId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    owned_profile(&state, &parent.user_id, &id).await?;

    if !state.store.delete_kid_profile(&id).await? {
        return Err(ApiError::NotFound(format!("kid profile not found: {id}")));
    }

    tracing::info!(profile_id = %id, parent_id = %parent.user_id, "kid profile deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Upsert an approval decision for one (profile, category) pair.
///
/// Re-submitting the same pair updates the decision in place.
pub async fn set_approval(
    State(state): State<Arc<AppState>>,
    ParentUser(parent): ParentUser,
    Path((id, category_id)): Path<(KidProfileId, CategoryId)>,
    Json(body): Json<ApprovalRequest>,
) -> Result<Json<ParentApproval>, ApiError> {
    owned_profile(&state, &parent.user_id, &id).await?;

    state
        .store
        .get_category(&category_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category not found: {category_id}")))?;

    let approval = ParentApproval {
        kid_profile_id: id,
        category_id,
        approved: body.approved,
        updated_at: Utc::now(),
    };

    state.store.set_approval(&approval).await?;

    tracing::info!(
        profile_id = %id,
        category_id = %category_id,
        approved = body.approved,
        "approval set"
    );

    Ok(Json(approval))
}

/// List a profile's approval decisions.
pub async fn list_approvals(
    State(state): State<Arc<AppState>>,
    ParentUser(parent): ParentUser,
    Path(id): Path<KidProfileId>,
) -> Result<Json<Vec<ParentApproval>>, ApiError> {
    owned_profile(&state, &parent.user_id, &id).await?;
    Ok(Json(state.store.list_approvals(&id).await?))
}

/// List published books in categories approved for a profile.
pub async fn list_approved_books(
    State(state): State<Arc<AppState>>,
    ParentUser(parent): ParentUser,
    Path(id): Path<KidProfileId>,
) -> Result<Json<Vec<BookSummary>>, ApiError> {
    owned_profile(&state, &parent.user_id, &id).await?;
    Ok(Json(state.store.list_approved_books(&id).await?))
}

/// Fetch a profile and verify the caller owns it.
async fn owned_profile(
    state: &AppState,
    parent_id: &hkids_core::UserId,
    id: &KidProfileId,
) -> Result<KidProfile, ApiError> {
    let profile = state
        .store
        .get_kid_profile(id)
        .await?
        .filter(|p| p.parent_id == *parent_id)
        .ok_or_else(|| ApiError::NotFound(format!("kid profile not found: {id}")))?;
    Ok(profile)
}
