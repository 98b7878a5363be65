//! Preference Routes
//!
//! - GET /api/v1/preferences - Saved language, role and timeline selection
//! - PUT /api/v1/preferences - Replace them

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiJson, ApiResult};
use crate::api::state::AppState;
use crate::storage::Preferences;

/// GET /api/v1/preferences
pub async fn get_preferences(State(state): State<Arc<AppState>>) -> Json<Preferences> {
    Json(state.store.preferences().await)
}

/// PUT /api/v1/preferences
pub async fn put_preferences(
    State(state): State<Arc<AppState>>,
    ApiJson(prefs): ApiJson<Preferences>,
) -> ApiResult<Json<Preferences>> {
    let directory = state.store.directory().await;
    if let Some(unknown) = prefs
        .timeline_selected_providers
        .iter()
        .find(|id| directory.provider(**id).is_none())
    {
        return Err(ApiError::Validation(format!("Unknown provider: {}", unknown)));
    }

    Ok(Json(state.store.set_preferences(prefs).await?))
}
