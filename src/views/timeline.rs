//! Provider timeline and quick-book
//!
//! Rows are fixed slots between opening and closing time. Day mode shows one
//! column per selected provider; week mode shows one column per day with the
//! selected providers' appointments.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::i18n::{number, status_label, weekday_name, Language};
use crate::schedule::{detect_conflicts, priority_score, Conflict, ConflictCandidate};
use crate::storage::{
    Appointment, AppointmentDraft, AppointmentStatus, Directory, Provider, StorageError,
    StorageResult, TimelineViewMode,
};

/// Clinic hours and slot size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSettings {
    pub opening_hour: u32,
    pub closing_hour: u32,
    pub slot_minutes: u32,
    pub default_duration_minutes: u32,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            opening_hour: 8,
            closing_hour: 18,
            slot_minutes: 30,
            default_duration_minutes: 30,
        }
    }
}

impl TimelineSettings {
    pub fn slot_count(&self) -> u32 {
        let open_minutes = self.closing_hour.saturating_sub(self.opening_hour) * 60;
        open_minutes / self.slot_minutes.max(1)
    }

    fn opening(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(self.opening_hour.min(23), 0, 0).unwrap_or_default())
    }

    /// Start of slot `index` on `date`
    pub fn slot_start(&self, date: NaiveDate, index: u32) -> NaiveDateTime {
        self.opening(date) + Duration::minutes((index * self.slot_minutes) as i64)
    }

    /// Slot containing `time`, if within opening hours
    pub fn slot_of(&self, time: NaiveDateTime) -> Option<u32> {
        let offset = (time - self.opening(time.date())).num_minutes();
        if offset < 0 {
            return None;
        }
        let index = (offset / self.slot_minutes.max(1) as i64) as u32;
        (index < self.slot_count()).then_some(index)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineSlot {
    pub index: u32,
    pub time: String,
}

/// An appointment placed on the grid
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineBlock {
    pub appointment_id: u64,
    pub patient_name: String,
    pub provider_id: u32,
    pub treatment_category: String,
    pub room_number: String,
    pub status: AppointmentStatus,
    pub status_label: &'static str,
    pub start: String,
    pub end: String,
    pub start_slot: u32,
    pub span: u32,
    pub color: String,
    pub priority_score: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineColumn {
    pub title: String,
    pub date: NaiveDate,
    /// Set in day mode
    pub provider_id: Option<u32>,
    pub blocks: Vec<TimelineBlock>,
    /// Appointments entirely outside opening hours
    pub hidden: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    pub mode: TimelineViewMode,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub slots: Vec<TimelineSlot>,
    pub columns: Vec<TimelineColumn>,
}

/// Providers to show; an empty selection means all of them
fn visible_providers<'a>(providers: &'a [Provider], selected: &[u32]) -> Vec<&'a Provider> {
    providers
        .iter()
        .filter(|p| selected.is_empty() || selected.contains(&p.id))
        .collect()
}

fn place(
    appt: &Appointment,
    settings: &TimelineSettings,
    color: &str,
    lang: Language,
    now: NaiveDateTime,
) -> Option<TimelineBlock> {
    let date = appt.date();
    let open = settings.opening(date);
    let close = settings.slot_start(date, settings.slot_count());
    if appt.date_end <= open || appt.date_start >= close {
        return None;
    }

    let slot = settings.slot_minutes.max(1) as i64;
    let start_offset = (appt.date_start.max(open) - open).num_minutes();
    let end_offset = (appt.date_end.min(close) - open).num_minutes();
    let start_slot = (start_offset / slot) as u32;
    let end_slot = ((end_offset + slot - 1) / slot) as u32;

    Some(TimelineBlock {
        appointment_id: appt.id,
        patient_name: appt.patient_name.clone(),
        provider_id: appt.provider_id,
        treatment_category: appt.treatment_category.clone(),
        room_number: appt.room_number.clone(),
        status: appt.status,
        status_label: status_label(appt.status, lang),
        start: appt.date_start.format("%H:%M").to_string(),
        end: appt.date_end.format("%H:%M").to_string(),
        start_slot,
        span: end_slot.saturating_sub(start_slot).max(1),
        color: color.to_string(),
        priority_score: priority_score(appt, now),
    })
}

#[allow(clippy::too_many_arguments)]
fn column<'a>(
    title: String,
    date: NaiveDate,
    provider_id: Option<u32>,
    appointments: impl Iterator<Item = &'a Appointment>,
    providers: &[Provider],
    settings: &TimelineSettings,
    lang: Language,
    now: NaiveDateTime,
) -> TimelineColumn {
    let mut blocks = Vec::new();
    let mut hidden = 0;
    for appt in appointments {
        let color = providers
            .iter()
            .find(|p| p.id == appt.provider_id)
            .map(|p| p.color.as_str())
            .unwrap_or("#9ca3af");
        match place(appt, settings, color, lang, now) {
            Some(block) => blocks.push(block),
            None => hidden += 1,
        }
    }
    blocks.sort_by(|a, b| a.start_slot.cmp(&b.start_slot).then(a.appointment_id.cmp(&b.appointment_id)));

    TimelineColumn {
        title,
        date,
        provider_id,
        blocks,
        hidden,
    }
}

/// Sunday starting the week that contains `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

#[allow(clippy::too_many_arguments)]
pub fn build_timeline(
    mode: TimelineViewMode,
    date: NaiveDate,
    providers: &[Provider],
    selected_providers: &[u32],
    appointments: &[Appointment],
    settings: &TimelineSettings,
    lang: Language,
    now: NaiveDateTime,
) -> TimelineView {
    let slots = (0..settings.slot_count())
        .map(|index| TimelineSlot {
            index,
            time: settings.slot_start(date, index).format("%H:%M").to_string(),
        })
        .collect();

    let visible = visible_providers(providers, selected_providers);

    let (start_date, end_date, columns) = match mode {
        TimelineViewMode::Day => {
            let columns = visible
                .iter()
                .map(|p| {
                    column(
                        p.name.clone(),
                        date,
                        Some(p.id),
                        appointments
                            .iter()
                            .filter(|a| a.provider_id == p.id && a.date() == date),
                        providers,
                        settings,
                        lang,
                        now,
                    )
                })
                .collect();
            (date, date, columns)
        }
        TimelineViewMode::Week => {
            let start = week_start(date);
            let ids: Vec<u32> = visible.iter().map(|p| p.id).collect();
            let columns = (0..7)
                .map(|offset| {
                    let day = start + Duration::days(offset);
                    column(
                        format!("{} {}", weekday_name(day.weekday(), lang), number(day.day(), lang)),
                        day,
                        None,
                        appointments
                            .iter()
                            .filter(|a| a.date() == day && ids.contains(&a.provider_id)),
                        providers,
                        settings,
                        lang,
                        now,
                    )
                })
                .collect();
            (start, start + Duration::days(6), columns)
        }
    };

    TimelineView {
        mode,
        start_date,
        end_date,
        slots,
        columns,
    }
}

/// A pre-filled booking built from an empty slot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickBook {
    pub draft: AppointmentDraft,
    /// Existing bookings the draft would collide with
    pub conflicts: Vec<Conflict>,
}

/// Build a draft for `provider_id` starting at the slot containing `at`
pub fn quick_book(
    at: NaiveDateTime,
    provider_id: u32,
    settings: &TimelineSettings,
    directory: &Directory,
    appointments: &[Appointment],
) -> StorageResult<QuickBook> {
    let provider = directory
        .provider(provider_id)
        .ok_or_else(|| StorageError::Validation(format!("Unknown provider: {}", provider_id)))?;

    let slot = settings.slot_of(at).ok_or_else(|| {
        StorageError::Validation(format!(
            "{} is outside opening hours ({:02}:00-{:02}:00)",
            at.format("%H:%M"),
            settings.opening_hour,
            settings.closing_hour
        ))
    })?;

    let start = settings.slot_start(at.date(), slot);
    let closing = settings.slot_start(at.date(), settings.slot_count());
    let end = (start + Duration::minutes(settings.default_duration_minutes.max(1) as i64)).min(closing);

    let draft = AppointmentDraft {
        patient_id: 0,
        patient_name: None,
        provider_id,
        provider_name: Some(provider.name.clone()),
        title: format!("{} {:02}:{:02}", provider.name, start.hour(), start.minute()),
        date_start: start,
        date_end: end,
        status: Some(AppointmentStatus::Scheduled),
        ..Default::default()
    };

    let conflicts = detect_conflicts(&ConflictCandidate::from(&draft), appointments);
    Ok(QuickBook { draft, conflicts })
}
