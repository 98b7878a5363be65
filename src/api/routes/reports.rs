//! Daily Report Routes
//!
//! - GET /api/v1/reports - All stored reports
//! - POST /api/v1/reports - Generate (or regenerate) the report of `?date=`
//! - GET /api/v1/reports/:date - Stored report of a day
//! - GET /api/v1/reports/:date/csv - CSV download, generated if missing

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::api::dto::ReportQuery;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::report::DailyReport;

/// GET /api/v1/reports
pub async fn list_reports(State(state): State<Arc<AppState>>) -> Json<Vec<DailyReport>> {
    Json(state.store.daily_reports().await)
}

/// POST /api/v1/reports
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<(StatusCode, Json<DailyReport>)> {
    let date = query.date.unwrap_or_else(|| state.now().date());
    let report = state.store.generate_daily_report(date, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/reports/:date
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Json<DailyReport>> {
    state
        .store
        .daily_report(date)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No daily report for {}", date)))
}

/// GET /api/v1/reports/:date/csv
pub async fn download_csv(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
) -> ApiResult<Response> {
    let report = match state.store.daily_report(date).await {
        Some(report) => report,
        None => state.store.generate_daily_report(date, Utc::now()).await?,
    };

    let body = report.to_csv()?;
    let disposition = format!("attachment; filename=\"{}\"", report.csv_filename());

    tracing::info!(date = %date, rows = report.rows.len(), "Daily report exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
