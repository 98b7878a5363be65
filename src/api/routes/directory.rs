//! Patient and Provider Routes
//!
//! - GET /api/v1/patients - List patients (`?search=` on name or phone)
//! - POST /api/v1/patients - Register a patient
//! - GET /api/v1/providers - List providers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::dto::PatientListResponse;
use crate::api::error::{ApiJson, ApiResult};
use crate::api::state::AppState;
use crate::storage::{NewPatient, Patient, Provider};

#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub search: Option<String>,
}

/// GET /api/v1/patients
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PatientQuery>,
) -> Json<PatientListResponse> {
    let mut patients = state.store.patients().await;

    if let Some(needle) = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
    {
        patients.retain(|p| p.name.to_lowercase().contains(&needle) || p.phone.contains(&needle));
    }

    Json(PatientListResponse {
        total: patients.len(),
        patients,
    })
}

/// POST /api/v1/patients
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewPatient>,
) -> ApiResult<(StatusCode, Json<Patient>)> {
    let patient = state.store.add_patient(new).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// GET /api/v1/providers
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<Vec<Provider>> {
    Json(state.store.providers().await)
}
