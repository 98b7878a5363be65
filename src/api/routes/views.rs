//! View Routes
//!
//! Serve the view models; rendering is up to the client.
//!
//! - GET /api/v1/views/calendar - Month grid (`?month=YYYY-MM&selected=`)
//! - GET /api/v1/views/timeline - Provider grid (`?mode=day|week&date=&providers=`)
//! - POST /api/v1/views/timeline/quick-book - Draft from an empty slot
//! - GET /api/v1/views/dashboard - Daily counts and revenue
//! - GET /api/v1/views/queue - Waiting room by priority

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{parse_id_list, CalendarQuery, DateQuery, QuickBookRequest, TimelineQuery};
use crate::api::error::{ApiJson, ApiResult};
use crate::api::state::AppState;
use crate::i18n::Language;
use crate::schedule::YearMonth;
use crate::views::{
    build_dashboard, build_month, build_queue, build_timeline, quick_book, CalendarMonth,
    DashboardView, QueueView, QuickBook, TimelineView,
};

fn language(requested: Option<&str>, saved: Language) -> Language {
    requested.map(Language::parse_lenient).unwrap_or(saved)
}

/// GET /api/v1/views/calendar
pub async fn calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Json<CalendarMonth>> {
    let now = state.now();
    let month = match &query.month {
        Some(raw) => raw.parse::<YearMonth>()?,
        None => YearMonth::of(now.date()),
    };
    let snapshot = state.store.snapshot().await;
    let lang = language(query.lang.as_deref(), snapshot.preferences.language);

    Ok(Json(build_month(
        month,
        query.selected,
        now.date(),
        &snapshot.appointments,
        state.calendar.as_ref(),
        lang,
        now,
    )))
}

/// GET /api/v1/views/timeline
pub async fn timeline(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TimelineQuery>,
) -> ApiResult<Json<TimelineView>> {
    let now = state.now();
    let snapshot = state.store.snapshot().await;
    let prefs = &snapshot.preferences;

    let selected = match query.providers.as_deref() {
        Some(raw) => parse_id_list(Some(raw))?,
        None => prefs.timeline_selected_providers.clone(),
    };

    Ok(Json(build_timeline(
        query.mode(prefs.timeline_view_mode),
        query.date.unwrap_or_else(|| now.date()),
        &snapshot.directory.providers,
        &selected,
        &snapshot.appointments,
        &state.config.timeline,
        language(query.lang.as_deref(), prefs.language),
        now,
    )))
}

/// POST /api/v1/views/timeline/quick-book
pub async fn timeline_quick_book(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<QuickBookRequest>,
) -> ApiResult<Json<QuickBook>> {
    let snapshot = state.store.snapshot().await;
    let draft = quick_book(
        req.at,
        req.provider_id,
        &state.config.timeline,
        &snapshot.directory,
        &snapshot.appointments,
    )?;
    Ok(Json(draft))
}

/// GET /api/v1/views/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Json<DashboardView> {
    let now = state.now();
    let snapshot = state.store.snapshot().await;

    Json(build_dashboard(
        query.date.unwrap_or_else(|| now.date()),
        now,
        &snapshot.appointments,
        &snapshot.payments,
        &snapshot.directory.providers,
        language(query.lang.as_deref(), snapshot.preferences.language),
    ))
}

/// GET /api/v1/views/queue
pub async fn queue(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DateQuery>,
) -> Json<QueueView> {
    let now = state.now();
    let snapshot = state.store.snapshot().await;

    Json(build_queue(
        query.date.unwrap_or_else(|| now.date()),
        now,
        &snapshot.appointments,
        language(query.lang.as_deref(), snapshot.preferences.language),
    ))
}
