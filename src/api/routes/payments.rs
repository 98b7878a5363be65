//! Payment Routes
//!
//! - GET /api/v1/payments - List payments (`?patientId=`, `?date=`)
//! - POST /api/v1/payments - Record a payment

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{PaymentQuery, PaymentResponse};
use crate::api::error::{ApiJson, ApiResult};
use crate::api::state::AppState;
use crate::storage::NewPayment;

/// GET /api/v1/payments
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PaymentQuery>,
) -> Json<Vec<PaymentResponse>> {
    let payments = state
        .store
        .payments()
        .await
        .into_iter()
        .filter(|p| query.patient_id.map_or(true, |id| p.patient_id == id))
        .filter(|p| query.date.map_or(true, |d| p.paid_date == d))
        .map(PaymentResponse::from)
        .collect();
    Json(payments)
}

/// POST /api/v1/payments
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    ApiJson(new): ApiJson<NewPayment>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    let payment = state.store.add_payment(new, state.now().date()).await?;
    Ok((StatusCode::CREATED, Json(payment.into())))
}
