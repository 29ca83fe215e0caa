//! Category handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use hkids_core::{Category, CategoryId};
use hkids_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Category create/update request.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    /// Unique display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

/// List all categories.
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.store.list_categories().await?))
}

/// Create a category.
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }

    let category = Category::new(name.to_string(), body.description);
    state.store.create_category(&category).await?;

    tracing::info!(category_id = %category.id, name = %category.name, "category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category's name and description.
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }

    let category = Category {
        id,
        name: name.to_string(),
        description: body.description,
    };

    let updated = state
        .store
        .update_category(&category)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("category not found: {id}")))?;

    Ok(Json(updated))
}

/// Delete a category. Books keep their rows with the category cleared.
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<CategoryId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.store.delete_category(&id).await? {
        return Err(ApiError::NotFound(format!("category not found: {id}")));
    }

    tracing::info!(category_id = %id, "category deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
