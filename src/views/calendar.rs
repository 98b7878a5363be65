//! Month calendar and day agenda

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::i18n::{month_name, number, status_label, weekday_name, Language};
use crate::lunar::{HolidayInfo, LunarCalendar};
use crate::schedule::{priority_score, YearMonth};
use crate::storage::{Appointment, AppointmentStatus};

/// One cell of the month grid
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub label: String,
    /// False for the leading and trailing days of neighbouring months
    pub in_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub lunar_label: Option<String>,
    pub is_holy_day: bool,
    pub holidays: Vec<String>,
    pub total: usize,
    pub status_counts: BTreeMap<AppointmentStatus, usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    pub appointment_id: u64,
    pub time: String,
    pub patient_name: String,
    pub provider_name: String,
    pub room_number: String,
    pub treatment_category: String,
    pub status: AppointmentStatus,
    pub status_label: &'static str,
    pub priority_score: u32,
}

/// Appointments of the selected day
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAgenda {
    pub date: NaiveDate,
    pub title: String,
    pub lunar_date: Option<String>,
    pub holidays: Vec<String>,
    pub items: Vec<AgendaItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub month: YearMonth,
    pub title: String,
    pub weekdays: Vec<&'static str>,
    pub weeks: Vec<Vec<CalendarDay>>,
    pub agenda: Option<DayAgenda>,
}

fn holidays_by_date(
    calendar: &dyn LunarCalendar,
    years: impl IntoIterator<Item = i32>,
) -> BTreeMap<NaiveDate, HolidayInfo> {
    let mut all = BTreeMap::new();
    for year in years {
        match calendar.lunar_holidays_for_year(year) {
            Ok(holidays) => all.extend(holidays),
            Err(e) => tracing::debug!(year, error = %e, "No lunar holidays for year"),
        }
    }
    all
}

fn day_title(date: NaiveDate, lang: Language) -> String {
    format!(
        "{} {} {} {}",
        weekday_name(date.weekday(), lang),
        number(date.day(), lang),
        month_name(date.month(), lang),
        number(date.year(), lang)
    )
}

/// Appointments of `date` for the agenda drawer, in start order
pub fn build_agenda(
    date: NaiveDate,
    appointments: &[Appointment],
    calendar: &dyn LunarCalendar,
    lang: Language,
    now: NaiveDateTime,
) -> DayAgenda {
    let mut day: Vec<&Appointment> = appointments.iter().filter(|a| a.date() == date).collect();
    day.sort_by(|a, b| a.date_start.cmp(&b.date_start).then(a.id.cmp(&b.id)));

    let holidays = holidays_by_date(calendar, [date.year()]);

    DayAgenda {
        date,
        title: day_title(date, lang),
        lunar_date: calendar.gregorian_to_lunar(date).ok().map(|l| l.format(lang)),
        holidays: holidays.get(&date).map(|h| vec![h.name(lang)]).unwrap_or_default(),
        items: day
            .into_iter()
            .map(|a| AgendaItem {
                appointment_id: a.id,
                time: format!("{}-{}", a.date_start.format("%H:%M"), a.date_end.format("%H:%M")),
                patient_name: a.patient_name.clone(),
                provider_name: a.provider_name.clone(),
                room_number: a.room_number.clone(),
                treatment_category: a.treatment_category.clone(),
                status: a.status,
                status_label: status_label(a.status, lang),
                priority_score: priority_score(a, now),
            })
            .collect(),
    }
}

/// Month grid starting on Sunday, with the agenda of `selected` when given
pub fn build_month(
    month: YearMonth,
    selected: Option<NaiveDate>,
    today: NaiveDate,
    appointments: &[Appointment],
    calendar: &dyn LunarCalendar,
    lang: Language,
    now: NaiveDateTime,
) -> CalendarMonth {
    let first = month.first_day();
    let lead = first.weekday().num_days_from_sunday() as i64;
    let grid_start = first - Duration::days(lead);
    let cells = lead + month.days_in_month() as i64;
    let weeks_needed = (cells + 6) / 7;

    let mut per_day: HashMap<NaiveDate, Vec<&Appointment>> = HashMap::new();
    for appt in appointments {
        per_day.entry(appt.date()).or_default().push(appt);
    }

    let last = grid_start + Duration::days(weeks_needed * 7 - 1);
    let mut years = vec![grid_start.year()];
    if last.year() != grid_start.year() {
        years.push(last.year());
    }
    let holidays = holidays_by_date(calendar, years);

    let weeks = (0..weeks_needed)
        .map(|w| {
            (0..7)
                .map(|d| {
                    let date = grid_start + Duration::days(w * 7 + d);
                    let day_appts = per_day.get(&date).map(Vec::as_slice).unwrap_or(&[]);

                    let mut status_counts = BTreeMap::new();
                    for a in day_appts {
                        *status_counts.entry(a.status).or_insert(0) += 1;
                    }

                    let lunar = calendar.gregorian_to_lunar(date).ok();
                    CalendarDay {
                        date,
                        label: number(date.day(), lang),
                        in_month: month.contains(date),
                        is_today: date == today,
                        is_selected: Some(date) == selected,
                        lunar_label: lunar.as_ref().map(|l| l.short_label(lang)),
                        is_holy_day: lunar.map(|l| l.is_holy_day).unwrap_or(false),
                        holidays: holidays.get(&date).map(|h| vec![h.name(lang)]).unwrap_or_default(),
                        total: day_appts.len(),
                        status_counts,
                    }
                })
                .collect()
        })
        .collect();

    CalendarMonth {
        month,
        title: format!("{} {}", month_name(month.month, lang), number(month.year, lang)),
        weekdays: [
            chrono::Weekday::Sun,
            chrono::Weekday::Mon,
            chrono::Weekday::Tue,
            chrono::Weekday::Wed,
            chrono::Weekday::Thu,
            chrono::Weekday::Fri,
            chrono::Weekday::Sat,
        ]
        .into_iter()
        .map(|d| weekday_name(d, lang))
        .collect(),
        weeks,
        agenda: selected.map(|date| build_agenda(date, appointments, calendar, lang, now)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lunar::KhmerCalendar;
    use crate::storage::parse_minute;

    fn appt(id: u64, start: &str, status: AppointmentStatus) -> Appointment {
        let start = parse_minute(start).unwrap();
        Appointment::new(id, 1, 1, start, start + Duration::minutes(30)).status(status)
    }

    fn now() -> NaiveDateTime {
        parse_minute("2024-05-22 08:00").unwrap()
    }

    #[test]
    fn test_month_grid_shape() {
        // May 2024 starts on a Wednesday and needs five rows
        let month = YearMonth::new(2024, 5).unwrap();
        let view = build_month(
            month,
            None,
            now().date(),
            &[],
            &KhmerCalendar,
            Language::En,
            now(),
        );
        assert_eq!(view.weeks.len(), 5);
        assert!(view.weeks.iter().all(|w| w.len() == 7));
        assert_eq!(view.weeks[0][0].date, NaiveDate::from_ymd_opt(2024, 4, 28).unwrap());
        assert!(!view.weeks[0][0].in_month);
        assert_eq!(view.weeks[0][3].label, "1");
        assert_eq!(view.title, "May 2024");
        assert_eq!(view.weekdays[0], "Sun");
    }

    #[test]
    fn test_six_row_month() {
        // June 2024 starts on a Saturday
        let view = build_month(
            YearMonth::new(2024, 6).unwrap(),
            None,
            now().date(),
            &[],
            &KhmerCalendar,
            Language::En,
            now(),
        );
        assert_eq!(view.weeks.len(), 6);
    }

    #[test]
    fn test_counts_lunar_and_holidays() {
        let appointments = vec![
            appt(1, "2024-05-22 09:00", AppointmentStatus::Scheduled),
            appt(2, "2024-05-22 10:00", AppointmentStatus::Scheduled),
            appt(3, "2024-05-22 11:00", AppointmentStatus::Cancelled),
        ];
        let visak = NaiveDate::from_ymd_opt(2024, 5, 22).unwrap();
        let view = build_month(
            YearMonth::new(2024, 5).unwrap(),
            Some(visak),
            visak,
            &appointments,
            &KhmerCalendar,
            Language::En,
            now(),
        );

        let cell = view.weeks.iter().flatten().find(|c| c.date == visak).unwrap();
        assert!(cell.is_today && cell.is_selected);
        assert_eq!(cell.total, 3);
        assert_eq!(cell.status_counts[&AppointmentStatus::Scheduled], 2);
        assert_eq!(cell.lunar_label.as_deref(), Some("15 Koeut"));
        assert!(cell.is_holy_day);
        assert_eq!(cell.holidays, vec!["Visakha Bochea".to_string()]);

        let agenda = view.agenda.unwrap();
        let ids: Vec<u64> = agenda.items.iter().map(|i| i.appointment_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(agenda.items[0].time, "09:00-09:30");
    }

    #[test]
    fn test_khmer_labels() {
        let view = build_month(
            YearMonth::new(2024, 5).unwrap(),
            None,
            now().date(),
            &[],
            &KhmerCalendar,
            Language::Kh,
            now(),
        );
        assert_eq!(view.title, "ឧសភា ២០២៤");
        assert_eq!(view.weeks[0][3].label, "១");
    }
}
