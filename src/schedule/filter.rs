//! Filtering and ranking
//!
//! Narrows the appointment list the way the sidebar and calendar do: by
//! month or day, by status, by provider and by free text. Matches are
//! scored and ranked.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::schedule::priority::{rank, score, ScoredAppointment};
use crate::storage::{Appointment, AppointmentStatus, Directory, StorageError};

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl YearMonth {
    /// `None` for an invalid month or a year at or beyond the representable
    /// date range; the month grid also reaches into the neighbouring months.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let representable = year > NaiveDate::MIN.year() && year < NaiveDate::MAX.year();
        ((1..=12).contains(&month) && representable).then_some(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn days_in_month(&self) -> u32 {
        (self.next().first_day() - self.first_day()).num_days() as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::Validation(format!("Invalid month '{}', expected YYYY-MM", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

/// Active filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFilter {
    pub month: Option<YearMonth>,
    /// Takes precedence over `month`
    pub day: Option<NaiveDate>,
    pub statuses: BTreeSet<AppointmentStatus>,
    /// Ignore `statuses` and show every status
    pub view_all_types: bool,
    /// Empty means every provider
    pub provider_ids: Vec<u32>,
    pub search: Option<String>,
}

impl Default for AppointmentFilter {
    fn default() -> Self {
        Self {
            month: None,
            day: None,
            statuses: BTreeSet::new(),
            view_all_types: true,
            provider_ids: Vec::new(),
            search: None,
        }
    }
}

impl AppointmentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn month(mut self, month: YearMonth) -> Self {
        self.month = Some(month);
        self
    }

    pub fn day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    /// Restrict to the given statuses; turns off "view all types"
    pub fn statuses(mut self, statuses: impl IntoIterator<Item = AppointmentStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self.view_all_types = false;
        self
    }

    pub fn view_all_types(mut self, all: bool) -> Self {
        self.view_all_types = all;
        self
    }

    pub fn providers(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.provider_ids = ids.into_iter().collect();
        self
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    fn matches_date(&self, appt: &Appointment) -> bool {
        match (self.day, self.month) {
            (Some(day), _) => appt.date() == day,
            (None, Some(month)) => month.contains(appt.date()),
            (None, None) => true,
        }
    }

    fn matches_status(&self, appt: &Appointment) -> bool {
        self.view_all_types || self.statuses.contains(&appt.status)
    }

    fn matches_provider(&self, appt: &Appointment) -> bool {
        self.provider_ids.is_empty() || self.provider_ids.contains(&appt.provider_id)
    }

    fn matches_search(&self, appt: &Appointment, directory: &Directory) -> bool {
        let needle = match self.search.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return true,
        };

        let phone = directory.patient_phone(appt.patient_id).unwrap_or_default();
        [
            appt.patient_name.as_str(),
            appt.provider_name.as_str(),
            appt.title.as_str(),
            appt.treatment_category.as_str(),
            appt.notes.as_str(),
            phone,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Whether an appointment passes every filter
    pub fn matches(&self, appt: &Appointment, directory: &Directory) -> bool {
        self.matches_date(appt)
            && self.matches_status(appt)
            && self.matches_provider(appt)
            && self.matches_search(appt, directory)
    }
}

/// Matching appointments only, in their original order
pub fn filter_appointments<'a>(
    appointments: &'a [Appointment],
    filter: &AppointmentFilter,
    directory: &Directory,
) -> Vec<&'a Appointment> {
    appointments
        .iter()
        .filter(|a| filter.matches(a, directory))
        .collect()
}

/// Matching appointments, scored at `now` and ranked
pub fn filter_and_rank(
    appointments: &[Appointment],
    filter: &AppointmentFilter,
    directory: &Directory,
    now: NaiveDateTime,
) -> Vec<ScoredAppointment> {
    let mut scored: Vec<ScoredAppointment> = filter_appointments(appointments, filter, directory)
        .into_iter()
        .map(|a| score(a, now))
        .collect();
    rank(&mut scored);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{parse_minute, Patient};

    fn appt(id: u64, provider: u32, start: &str) -> Appointment {
        let start = parse_minute(start).unwrap();
        Appointment::new(id, 1, provider, start, start + chrono::Duration::minutes(30))
    }

    fn sample() -> Vec<Appointment> {
        vec![
            appt(1, 1, "2024-05-03 09:00").patient_name("Chea Sokha"),
            appt(2, 2, "2024-05-03 10:00").status(AppointmentStatus::Arrived),
            appt(3, 1, "2024-05-17 11:00").notes("Severe pain"),
            appt(4, 2, "2024-06-01 09:00").status(AppointmentStatus::Cancelled),
        ]
    }

    fn ids(scored: &[ScoredAppointment]) -> Vec<u64> {
        scored.iter().map(|s| s.appointment.id).collect()
    }

    fn now() -> NaiveDateTime {
        parse_minute("2024-05-01 08:00").unwrap()
    }

    #[test]
    fn test_year_month_parsing() {
        let ym: YearMonth = "2024-02".parse().unwrap();
        assert_eq!(ym, YearMonth { year: 2024, month: 2 });
        assert_eq!(ym.days_in_month(), 29);
        assert_eq!(ym.to_string(), "2024-02");
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("May".parse::<YearMonth>().is_err());
        assert_eq!(YearMonth::new(2024, 12).unwrap().next(), YearMonth::new(2025, 1).unwrap());
    }

    #[test]
    fn test_year_month_rejects_unrepresentable_years() {
        assert!("999999-01".parse::<YearMonth>().is_err());
        assert!(YearMonth::new(i32::MAX, 1).is_none());
        assert!(YearMonth::new(NaiveDate::MAX.year(), 1).is_none());

        let far = YearMonth::new(200000, 1).unwrap();
        assert_eq!(far.days_in_month(), 31);
        assert_eq!(far.first_day(), NaiveDate::from_ymd_opt(200000, 1, 1).unwrap());
    }

    #[test]
    fn test_month_filter() {
        let filter = AppointmentFilter::new().month(YearMonth::new(2024, 5).unwrap());
        let result = filter_and_rank(&sample(), &filter, &Directory::default(), now());
        let mut got = ids(&result);
        got.sort();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn test_day_overrides_month() {
        let filter = AppointmentFilter::new()
            .month(YearMonth::new(2024, 6).unwrap())
            .day(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());
        let result = filter_and_rank(&sample(), &filter, &Directory::default(), now());
        // arrived (50) ahead of scheduled (40)
        assert_eq!(ids(&result), vec![2, 1]);
    }

    #[test]
    fn test_status_set_and_view_all() {
        let directory = Directory::default();
        let only_cancelled = AppointmentFilter::new().statuses([AppointmentStatus::Cancelled]);
        assert_eq!(ids(&filter_and_rank(&sample(), &only_cancelled, &directory, now())), vec![4]);

        let none = AppointmentFilter::new().statuses([] as [AppointmentStatus; 0]);
        assert!(filter_and_rank(&sample(), &none, &directory, now()).is_empty());

        let all = none.view_all_types(true);
        assert_eq!(filter_and_rank(&sample(), &all, &directory, now()).len(), 4);
    }

    #[test]
    fn test_provider_filter() {
        let filter = AppointmentFilter::new().providers([2]);
        let mut got = ids(&filter_and_rank(&sample(), &filter, &Directory::default(), now()));
        got.sort();
        assert_eq!(got, vec![2, 4]);
    }

    #[test]
    fn test_search_matches_phone_and_text() {
        let directory = Directory::new(
            vec![Patient {
                id: 1,
                name: "Chea Sokha".to_string(),
                phone: "012 345 678".to_string(),
                gender: Default::default(),
                age: None,
            }],
            vec![],
        );

        let by_name = AppointmentFilter::new().search("sokha");
        assert_eq!(ids(&filter_and_rank(&sample(), &by_name, &directory, now())), vec![1]);

        let by_notes = AppointmentFilter::new().search("PAIN");
        assert_eq!(ids(&filter_and_rank(&sample(), &by_notes, &directory, now())), vec![3]);

        let by_phone = AppointmentFilter::new().search("345");
        assert_eq!(filter_and_rank(&sample(), &by_phone, &directory, now()).len(), 4);

        let blank = AppointmentFilter::new().search("  ");
        assert_eq!(filter_and_rank(&sample(), &blank, &directory, now()).len(), 4);
    }

    #[test]
    fn test_ranking_ties_break_on_start() {
        let appointments = vec![appt(5, 1, "2024-05-03 11:00"), appt(6, 1, "2024-05-03 09:00")];
        let result = filter_and_rank(&appointments, &AppointmentFilter::new(), &Directory::default(), now());
        assert_eq!(ids(&result), vec![6, 5]);
    }
}
