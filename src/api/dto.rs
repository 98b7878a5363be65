//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::i18n::Language;
use crate::lunar::{HolidayInfo, HolidayKind};
use crate::schedule::{AppointmentFilter, ScoredAppointment, YearMonth};
use crate::storage::{AppointmentStatus, DataOrigin, Patient, Payment, PaymentStatus, TimelineViewMode};

/// Split a comma separated query value, skipping blanks
fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Parse `1,3,4` into provider ids
pub fn parse_id_list(raw: Option<&str>) -> ApiResult<Vec<u32>> {
    raw.map(split_list)
        .into_iter()
        .flatten()
        .map(|s| {
            s.parse()
                .map_err(|_| ApiError::Validation(format!("Invalid provider id: {}", s)))
        })
        .collect()
}

// ============================================
// APPOINTMENT DTOs
// ============================================

/// Query for the filtered appointment list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// `YYYY-MM`
    pub month: Option<String>,
    /// Overrides `month`
    pub day: Option<NaiveDate>,
    /// Comma separated statuses
    pub status: Option<String>,
    /// Defaults to true unless `status` is given
    pub view_all: Option<bool>,
    /// Comma separated provider ids
    pub providers: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn to_filter(&self) -> ApiResult<AppointmentFilter> {
        let mut filter = AppointmentFilter::new();

        if let Some(month) = &self.month {
            filter = filter.month(month.parse::<YearMonth>()?);
        }
        if let Some(day) = self.day {
            filter = filter.day(day);
        }
        if let Some(raw) = &self.status {
            let statuses = split_list(raw)
                .map(str::parse::<AppointmentStatus>)
                .collect::<Result<Vec<_>, _>>()?;
            filter = filter.statuses(statuses);
        }
        if let Some(all) = self.view_all {
            filter = filter.view_all_types(all);
        }
        let providers = parse_id_list(self.providers.as_deref())?;
        if !providers.is_empty() {
            filter = filter.providers(providers);
        }
        if let Some(search) = &self.search {
            filter = filter.search(search.clone());
        }

        Ok(filter)
    }
}

/// Filtered, ranked appointment list
#[derive(Debug, Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<ScoredAppointment>,
    pub total: usize,
}

/// `?allowConflicts=true` books despite collisions
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    #[serde(default)]
    pub allow_conflicts: bool,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(alias = "type")]
    pub status: AppointmentStatus,
}

/// Deleted appointment response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// Result of a dry-run conflict check
#[derive(Debug, Serialize)]
pub struct ConflictCheckResponse {
    pub has_conflicts: bool,
    pub conflicts: Vec<crate::schedule::Conflict>,
}

// ============================================
// DIRECTORY & PAYMENT DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct PatientListResponse {
    pub patients: Vec<Patient>,
    pub total: usize,
}

/// Payment with its derived fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub balance: f64,
    pub status: PaymentStatus,
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            balance: payment.balance(),
            status: payment.payment_status(),
            payment,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuery {
    pub patient_id: Option<u32>,
    pub date: Option<NaiveDate>,
}

// ============================================
// VIEW DTOs
// ============================================

/// `?lang=kh`; falls back to the saved preference
#[derive(Debug, Default, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

impl LangQuery {
    pub fn resolve(&self, saved: Language) -> Language {
        self.lang
            .as_deref()
            .map(Language::parse_lenient)
            .unwrap_or(saved)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    /// `YYYY-MM`, defaults to the current month
    pub month: Option<String>,
    /// Day whose agenda is included
    pub selected: Option<NaiveDate>,
    pub lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub mode: Option<String>,
    pub date: Option<NaiveDate>,
    /// Comma separated ids; defaults to the saved selection
    pub providers: Option<String>,
    pub lang: Option<String>,
}

impl TimelineQuery {
    pub fn mode(&self, saved: TimelineViewMode) -> TimelineViewMode {
        self.mode
            .as_deref()
            .map(TimelineViewMode::parse_lenient)
            .unwrap_or(saved)
    }
}

/// Empty slot picked on the timeline
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickBookRequest {
    #[serde(with = "crate::storage::minute_format")]
    pub at: chrono::NaiveDateTime,
    pub provider_id: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
    pub lang: Option<String>,
}

// ============================================
// LUNAR DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HolyDaysQuery {
    pub year: i32,
    pub month: u32,
}

/// Lunar date with its formatted label
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LunarDateResponse {
    #[serde(flatten)]
    pub info: crate::lunar::LunarInfo,
    pub label: String,
}

/// One holiday day
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub kind: HolidayKind,
    pub name: String,
    pub day: u8,
    pub length: u8,
}

impl HolidayEntry {
    pub fn new(date: NaiveDate, info: &HolidayInfo, lang: Language) -> Self {
        Self {
            date,
            kind: info.kind,
            name: info.name(lang),
            day: info.day,
            length: info.length,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HolidayListResponse {
    pub year: i32,
    pub holidays: Vec<HolidayEntry>,
}

#[derive(Debug, Serialize)]
pub struct HolyDaysResponse {
    pub year: i32,
    pub month: u32,
    pub holy_days: Vec<NaiveDate>,
}

// ============================================
// REPORT DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    /// Defaults to today
    pub date: Option<NaiveDate>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub data_origin: DataOrigin,
    pub appointments: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_to_filter() {
        let query = ListQuery {
            month: Some("2024-05".to_string()),
            status: Some("arrived, walk-in".to_string()),
            providers: Some("1,3".to_string()),
            ..Default::default()
        };
        let filter = query.to_filter().unwrap();

        assert_eq!(filter.month, YearMonth::new(2024, 5));
        assert!(!filter.view_all_types);
        assert_eq!(filter.statuses.len(), 2);
        assert_eq!(filter.provider_ids, vec![1, 3]);
    }

    #[test]
    fn test_default_query_shows_everything() {
        let filter = ListQuery::default().to_filter().unwrap();
        assert!(filter.view_all_types);
        assert!(filter.month.is_none());
    }

    #[test]
    fn test_bad_values_rejected() {
        let query = ListQuery {
            status: Some("late".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.to_filter(), Err(ApiError::Validation(_))));

        assert!(parse_id_list(Some("1,x")).is_err());
        assert_eq!(parse_id_list(None).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_lang_resolution() {
        let query = LangQuery {
            lang: Some("kh".to_string()),
        };
        assert_eq!(query.resolve(Language::En), Language::Kh);
        assert_eq!(LangQuery::default().resolve(Language::Kh), Language::Kh);
    }
}
