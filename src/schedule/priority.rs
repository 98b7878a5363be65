//! Priority scoring
//!
//! Urgency ranking for the waiting queue and the appointment sidebar. The
//! score is a fixed weighted sum; it only orders appointments and carries no
//! meaning on its own.

use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use crate::storage::{Appointment, AppointmentStatus};

/// Words in notes or treatment that flag an urgent visit
pub const URGENT_KEYWORDS: &[&str] = &["pain", "emergency", "urgent", "swelling", "bleeding", "severe"];

/// Points added when an urgent keyword is present
pub const URGENCY_BONUS: f64 = 100.0;
/// Cap on points earned from waiting in the clinic
pub const MAX_WAIT_POINTS: f64 = 120.0;
/// Points per minute of waiting
pub const WAIT_POINTS_PER_MINUTE: f64 = 2.0;
/// Age above which elderly patients get a bonus
pub const SENIOR_AGE: u32 = 65;
pub const SENIOR_BONUS: f64 = 30.0;
pub const VIP_BONUS: f64 = 20.0;

fn urgency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let alternation = URGENT_KEYWORDS
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!("(?i)(?:{})", alternation)).expect("urgency keywords form a valid regex")
    })
}

/// Case-insensitive substring match against the urgent keyword list
pub fn has_urgent_keyword(text: &str) -> bool {
    urgency_pattern().is_match(text)
}

/// Base points by status
pub fn base_score(status: AppointmentStatus) -> f64 {
    match status {
        AppointmentStatus::WalkIn => 30.0,
        AppointmentStatus::Scheduled => 40.0,
        AppointmentStatus::Arrived => 50.0,
        AppointmentStatus::Ready => 70.0,
        _ => 0.0,
    }
}

/// Each component of a priority score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBreakdown {
    pub base: f64,
    pub urgency: f64,
    pub wait: f64,
    pub lateness: f64,
    pub senior: f64,
    pub vip: f64,
}

impl PriorityBreakdown {
    /// Rounded total
    pub fn total(&self) -> u32 {
        let sum = self.base + self.urgency + self.wait + self.lateness + self.senior + self.vip;
        sum.max(0.0).round() as u32
    }
}

/// Minutes from `start` to `now`, negative when `start` is ahead
fn elapsed_minutes(start: NaiveDateTime, now: NaiveDateTime) -> f64 {
    (now - start).num_seconds() as f64 / 60.0
}

/// Compute every component of the score at `now`
pub fn breakdown(appt: &Appointment, now: NaiveDateTime) -> PriorityBreakdown {
    let mut parts = PriorityBreakdown {
        base: base_score(appt.status),
        ..Default::default()
    };

    if has_urgent_keyword(&appt.notes) || has_urgent_keyword(&appt.treatment_category) {
        parts.urgency = URGENCY_BONUS;
    }

    let elapsed = elapsed_minutes(appt.date_start, now);
    match appt.status {
        AppointmentStatus::Arrived | AppointmentStatus::Ready => {
            // Early arrivals count as zero wait rather than a penalty
            parts.wait = (elapsed.max(0.0) * WAIT_POINTS_PER_MINUTE).min(MAX_WAIT_POINTS);
        }
        AppointmentStatus::Scheduled if elapsed > 0.0 => {
            parts.lateness = elapsed;
        }
        _ => {}
    }

    if appt.patient_age.map(|age| age > SENIOR_AGE).unwrap_or(false) {
        parts.senior = SENIOR_BONUS;
    }
    if appt.vip {
        parts.vip = VIP_BONUS;
    }

    parts
}

/// Priority score of an appointment at `now`
pub fn priority_score(appt: &Appointment, now: NaiveDateTime) -> u32 {
    breakdown(appt, now).total()
}

/// An appointment paired with its score; the appointment itself is untouched
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAppointment {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub priority_score: u32,
}

/// Score an appointment without mutating it
pub fn score(appt: &Appointment, now: NaiveDateTime) -> ScoredAppointment {
    ScoredAppointment {
        appointment: appt.clone(),
        priority_score: priority_score(appt, now),
    }
}

/// Highest score first, then earliest start, then lowest id
pub fn rank(scored: &mut [ScoredAppointment]) {
    scored.sort_by(|a, b| {
        b.priority_score
            .cmp(&a.priority_score)
            .then_with(|| a.appointment.date_start.cmp(&b.appointment.date_start))
            .then_with(|| a.appointment.id.cmp(&b.appointment.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::parse_minute;
    use chrono::Duration;

    fn now() -> NaiveDateTime {
        parse_minute("2024-05-03 10:00").unwrap()
    }

    fn appt_started(minutes_ago: i64, status: AppointmentStatus) -> Appointment {
        let start = now() - Duration::minutes(minutes_ago);
        Appointment::new(1, 1, 1, start, start + Duration::minutes(30)).status(status)
    }

    #[test]
    fn test_base_scores() {
        assert_eq!(base_score(AppointmentStatus::WalkIn), 30.0);
        assert_eq!(base_score(AppointmentStatus::Arrived), 50.0);
        assert_eq!(base_score(AppointmentStatus::Ready), 70.0);
        assert_eq!(base_score(AppointmentStatus::Scheduled), 40.0);
        assert_eq!(base_score(AppointmentStatus::Completed), 0.0);
        assert_eq!(base_score(AppointmentStatus::Cancelled), 0.0);
    }

    #[test]
    fn test_scheduled_one_hour_late() {
        let appt = appt_started(60, AppointmentStatus::Scheduled);
        let parts = breakdown(&appt, now());
        assert_eq!(parts.lateness, 60.0);
        assert_eq!(priority_score(&appt, now()), 100);
    }

    #[test]
    fn test_arrived_45_minutes_ago() {
        let appt = appt_started(45, AppointmentStatus::Arrived);
        let parts = breakdown(&appt, now());
        assert_eq!(parts.wait, 90.0);
        assert_eq!(priority_score(&appt, now()), 140);
    }

    #[test]
    fn test_wait_is_monotonic_and_capped() {
        for status in [AppointmentStatus::Arrived, AppointmentStatus::Ready] {
            let mut previous = 0;
            for minutes in 0..200 {
                let score = priority_score(&appt_started(minutes, status), now());
                assert!(score >= previous, "score dropped at {} minutes", minutes);
                previous = score;
            }
            let capped = breakdown(&appt_started(500, status), now());
            assert_eq!(capped.wait, MAX_WAIT_POINTS);
        }
    }

    #[test]
    fn test_early_arrival_never_lowers_score() {
        let appt = appt_started(-20, AppointmentStatus::Arrived);
        assert_eq!(priority_score(&appt, now()), 50);
    }

    #[test]
    fn test_future_scheduled_has_no_lateness() {
        let appt = appt_started(-30, AppointmentStatus::Scheduled);
        assert_eq!(priority_score(&appt, now()), 40);
    }

    #[test]
    fn test_urgent_keywords_case_insensitive() {
        for text in ["Severe PAIN lower left", "Emergency", "gum swelling", "BLEEDING after extraction"] {
            let appt = appt_started(-30, AppointmentStatus::WalkIn).notes(text);
            assert!(priority_score(&appt, now()) >= 100 + 30, "{}", text);
        }

        let by_treatment = appt_started(-30, AppointmentStatus::Ready).treatment("Urgent extraction");
        assert!(priority_score(&by_treatment, now()) >= 170);

        let routine = appt_started(-30, AppointmentStatus::WalkIn).notes("routine cleaning");
        assert_eq!(priority_score(&routine, now()), 30);
    }

    #[test]
    fn test_senior_and_vip_bonus() {
        let appt = appt_started(-30, AppointmentStatus::Scheduled).age(70).vip(true);
        assert_eq!(priority_score(&appt, now()), 40 + 30 + 20);

        let exactly_65 = appt_started(-30, AppointmentStatus::Scheduled).age(65);
        assert_eq!(priority_score(&exactly_65, now()), 40);
    }

    #[test]
    fn test_score_does_not_mutate_and_rank_orders() {
        let late = appt_started(60, AppointmentStatus::Scheduled);
        let mut waiting = appt_started(10, AppointmentStatus::Arrived);
        waiting.id = 2;
        let mut tie = appt_started(60, AppointmentStatus::Scheduled);
        tie.id = 3;
        tie.date_start = tie.date_start + Duration::minutes(1);
        tie.date_end = tie.date_end + Duration::minutes(1);

        let before = late.clone();
        let mut scored = vec![score(&waiting, now()), score(&tie, now()), score(&late, now())];
        assert_eq!(late, before);

        rank(&mut scored);
        let ids: Vec<u64> = scored.iter().map(|s| s.appointment.id).collect();
        // 100 (late, earlier start) ahead of 99 (tie started a minute later), then 70
        assert_eq!(ids, vec![1, 3, 2]);
    }
}
