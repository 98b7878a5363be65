//! Appointment Routes
//!
//! - GET /api/v1/appointments - Filtered list ranked by priority
//! - POST /api/v1/appointments - Book (409 on conflict unless `allowConflicts`)
//! - GET /api/v1/appointments/:id - Get one appointment
//! - PUT /api/v1/appointments/:id - Shallow merge update
//! - DELETE /api/v1/appointments/:id - Delete
//! - POST /api/v1/appointments/:id/status - Change status
//! - POST /api/v1/appointments/conflicts - Dry-run conflict check

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    AppointmentListResponse, BookingQuery, ConflictCheckResponse, DeleteResponse, ListQuery,
    StatusRequest,
};
use crate::api::error::{ApiJson, ApiResult};
use crate::api::state::AppState;
use crate::schedule::{filter_and_rank, score, ConflictCandidate, ScoredAppointment};
use crate::storage::{AppointmentDraft, AppointmentPatch};

/// GET /api/v1/appointments
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<AppointmentListResponse>> {
    let filter = query.to_filter()?;
    let snapshot = state.store.snapshot().await;

    let appointments = filter_and_rank(
        &snapshot.appointments,
        &filter,
        &snapshot.directory,
        state.now(),
    );

    Ok(Json(AppointmentListResponse {
        total: appointments.len(),
        appointments,
    }))
}

/// GET /api/v1/appointments/:id
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<ScoredAppointment>> {
    let appt = state.store.appointment(id).await?;
    Ok(Json(score(&appt, state.now())))
}

/// POST /api/v1/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Query(booking): Query<BookingQuery>,
    ApiJson(draft): ApiJson<AppointmentDraft>,
) -> ApiResult<(StatusCode, Json<ScoredAppointment>)> {
    let appt = state
        .store
        .create_appointment(draft, booking.allow_conflicts)
        .await?;
    Ok((StatusCode::CREATED, Json(score(&appt, state.now()))))
}

/// PUT /api/v1/appointments/:id
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(booking): Query<BookingQuery>,
    ApiJson(patch): ApiJson<AppointmentPatch>,
) -> ApiResult<Json<ScoredAppointment>> {
    let appt = state
        .store
        .update_appointment(id, patch, booking.allow_conflicts)
        .await?;
    Ok(Json(score(&appt, state.now())))
}

/// POST /api/v1/appointments/:id/status
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> ApiResult<Json<ScoredAppointment>> {
    let appt = state.store.set_status(id, req.status).await?;
    Ok(Json(score(&appt, state.now())))
}

/// DELETE /api/v1/appointments/:id
pub async fn delete_appointment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<Json<DeleteResponse>> {
    let removed = state.store.delete_appointment(id).await?;
    Ok(Json(DeleteResponse {
        deleted: removed.id,
    }))
}

/// POST /api/v1/appointments/conflicts
pub async fn check_conflicts(
    State(state): State<Arc<AppState>>,
    ApiJson(candidate): ApiJson<ConflictCandidate>,
) -> ApiResult<Json<ConflictCheckResponse>> {
    crate::storage::validate_range(candidate.date_start, candidate.date_end)?;
    let conflicts = state.store.check_conflicts(&candidate).await;
    Ok(Json(ConflictCheckResponse {
        has_conflicts: !conflicts.is_empty(),
        conflicts,
    }))
}
