//! Waiting room queue

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::i18n::{status_label, Language};
use crate::schedule::{breakdown, PriorityBreakdown};
use crate::storage::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// 1-based place in line
    pub position: usize,
    pub appointment_id: u64,
    pub patient_name: String,
    pub provider_name: String,
    pub treatment_category: String,
    pub status: AppointmentStatus,
    pub status_label: &'static str,
    pub wait_minutes: i64,
    pub priority_score: u32,
    pub urgent: bool,
    pub breakdown: PriorityBreakdown,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub date: NaiveDate,
    pub waiting: Vec<QueueEntry>,
    pub in_treatment: Vec<QueueEntry>,
    pub average_wait_minutes: i64,
}

fn entry(appt: &Appointment, now: NaiveDateTime, lang: Language) -> QueueEntry {
    let parts = breakdown(appt, now);
    QueueEntry {
        position: 0,
        appointment_id: appt.id,
        patient_name: appt.patient_name.clone(),
        provider_name: appt.provider_name.clone(),
        treatment_category: appt.treatment_category.clone(),
        status: appt.status,
        status_label: status_label(appt.status, lang),
        wait_minutes: (now - appt.date_start).num_minutes().max(0),
        priority_score: parts.total(),
        urgent: parts.urgency > 0.0,
        breakdown: parts,
    }
}

/// Waiting patients of `date` by priority, and who is in the chair
pub fn build_queue(
    date: NaiveDate,
    now: NaiveDateTime,
    appointments: &[Appointment],
    lang: Language,
) -> QueueView {
    let today = appointments.iter().filter(|a| a.date() == date);

    let mut waiting: Vec<(NaiveDateTime, QueueEntry)> = today
        .clone()
        .filter(|a| a.status.is_waiting())
        .map(|a| (a.date_start, entry(a, now, lang)))
        .collect();
    waiting.sort_by(|(a_start, a), (b_start, b)| {
        b.priority_score
            .cmp(&a.priority_score)
            .then(a_start.cmp(b_start))
            .then(a.appointment_id.cmp(&b.appointment_id))
    });
    let waiting: Vec<QueueEntry> = waiting
        .into_iter()
        .enumerate()
        .map(|(i, (_, mut e))| {
            e.position = i + 1;
            e
        })
        .collect();

    let mut in_treatment: Vec<QueueEntry> = today
        .filter(|a| a.status == AppointmentStatus::InTreatment)
        .map(|a| entry(a, now, lang))
        .collect();
    in_treatment.sort_by_key(|e| std::cmp::Reverse(e.wait_minutes));

    let average_wait_minutes = if waiting.is_empty() {
        0
    } else {
        waiting.iter().map(|e| e.wait_minutes).sum::<i64>() / waiting.len() as i64
    };

    QueueView {
        date,
        waiting,
        in_treatment,
        average_wait_minutes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::parse_minute;
    use chrono::Duration;

    fn now() -> NaiveDateTime {
        parse_minute("2024-05-03 10:00").unwrap()
    }

    fn appt(id: u64, minutes_ago: i64, status: AppointmentStatus) -> Appointment {
        let start = now() - Duration::minutes(minutes_ago);
        Appointment::new(id, 1, 1, start, start + Duration::minutes(30)).status(status)
    }

    #[test]
    fn test_queue_ordering_and_positions() {
        let appointments = vec![
            appt(1, 10, AppointmentStatus::Arrived),
            appt(2, 45, AppointmentStatus::Arrived),
            appt(3, 5, AppointmentStatus::WalkIn).notes("Swelling"),
            appt(4, 20, AppointmentStatus::InTreatment),
            appt(5, 60, AppointmentStatus::Scheduled),
            appt(6, 30, AppointmentStatus::Completed),
        ];
        let view = build_queue(now().date(), now(), &appointments, Language::En);

        let ids: Vec<u64> = view.waiting.iter().map(|e| e.appointment_id).collect();
        // walk-in with swelling 130, arrived 45 min 140, arrived 10 min 70
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(view.waiting[0].position, 1);
        assert_eq!(view.waiting[0].wait_minutes, 45);
        assert!(view.waiting[1].urgent);

        assert_eq!(view.in_treatment.len(), 1);
        assert_eq!(view.in_treatment[0].appointment_id, 4);
        assert_eq!(view.average_wait_minutes, (45 + 5 + 10) / 3);
    }

    #[test]
    fn test_other_days_excluded() {
        let mut other = appt(1, 10, AppointmentStatus::Arrived);
        other.date_start -= Duration::days(1);
        other.date_end -= Duration::days(1);
        let view = build_queue(now().date(), now(), &[other], Language::En);
        assert!(view.waiting.is_empty());
        assert_eq!(view.average_wait_minutes, 0);
    }
}
