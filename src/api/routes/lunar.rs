//! Lunar Calendar Routes
//!
//! - GET /api/v1/lunar/date/:date - Lunar date of a Gregorian day
//! - GET /api/v1/lunar/holidays - Holidays of `?year=` (default this year)
//! - GET /api/v1/lunar/holy-days - Holy days of `?year=&month=`

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;

use crate::api::dto::{
    HolidayEntry, HolidayListResponse, HolyDaysQuery, HolyDaysResponse, LangQuery,
    LunarDateResponse, YearQuery,
};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::i18n::Language;

/// GET /api/v1/lunar/date/:date
pub async fn lunar_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<NaiveDate>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<LunarDateResponse>> {
    let lang = query.resolve(state.store.preferences().await.language);
    let info = state.calendar.gregorian_to_lunar(date)?;
    Ok(Json(LunarDateResponse {
        label: info.format(lang),
        info,
    }))
}

/// GET /api/v1/lunar/holidays
pub async fn holidays(
    State(state): State<Arc<AppState>>,
    Query(query): Query<YearQuery>,
) -> ApiResult<Json<HolidayListResponse>> {
    let year = query.year.unwrap_or_else(|| state.now().year());
    let lang = query
        .lang
        .as_deref()
        .map(Language::parse_lenient)
        .unwrap_or(state.store.preferences().await.language);

    let holidays = state
        .calendar
        .lunar_holidays_for_year(year)?
        .iter()
        .map(|(date, info)| HolidayEntry::new(*date, info, lang))
        .collect();

    Ok(Json(HolidayListResponse { year, holidays }))
}

/// GET /api/v1/lunar/holy-days
pub async fn holy_days(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HolyDaysQuery>,
) -> ApiResult<Json<HolyDaysResponse>> {
    let holy_days = state.calendar.holy_days_in_month(query.year, query.month)?;
    Ok(Json(HolyDaysResponse {
        year: query.year,
        month: query.month,
        holy_days,
    }))
}
