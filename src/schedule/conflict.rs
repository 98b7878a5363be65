//! Conflict detection
//!
//! Two appointments conflict when they fall on the same day, overlap as
//! half-open intervals, and share a provider or a (non-empty) room.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::storage::{minute_format, Appointment, AppointmentDraft};

/// What the two appointments share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Provider,
    Room,
}

/// An existing appointment that collides with a candidate slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub appointment_id: u64,
    pub patient_name: String,
    pub provider_name: String,
    pub room_number: String,
    #[serde(with = "minute_format")]
    pub date_start: NaiveDateTime,
    #[serde(with = "minute_format")]
    pub date_end: NaiveDateTime,
    pub kinds: Vec<ConflictKind>,
}

/// The slot being booked or moved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictCandidate {
    #[serde(with = "minute_format")]
    pub date_start: NaiveDateTime,
    #[serde(with = "minute_format")]
    pub date_end: NaiveDateTime,
    pub provider_id: u32,
    #[serde(default)]
    pub room_number: String,
    /// The appointment being edited, never reported against itself
    #[serde(default)]
    pub exclude_id: Option<u64>,
}

impl ConflictCandidate {
    pub fn new(date_start: NaiveDateTime, date_end: NaiveDateTime, provider_id: u32) -> Self {
        Self {
            date_start,
            date_end,
            provider_id,
            room_number: String::new(),
            exclude_id: None,
        }
    }

    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room_number = room.into();
        self
    }

    pub fn exclude(mut self, id: u64) -> Self {
        self.exclude_id = Some(id);
        self
    }
}

impl From<&Appointment> for ConflictCandidate {
    fn from(appt: &Appointment) -> Self {
        ConflictCandidate::new(appt.date_start, appt.date_end, appt.provider_id)
            .room(appt.room_number.clone())
            .exclude(appt.id)
    }
}

impl From<&AppointmentDraft> for ConflictCandidate {
    fn from(draft: &AppointmentDraft) -> Self {
        ConflictCandidate::new(draft.date_start, draft.date_end, draft.provider_id)
            .room(draft.room_number.clone())
    }
}

fn same_room(a: &str, b: &str) -> bool {
    let a = a.trim();
    !a.is_empty() && a.eq_ignore_ascii_case(b.trim())
}

/// Existing appointments that collide with `candidate`, in start order
pub fn detect_conflicts(candidate: &ConflictCandidate, existing: &[Appointment]) -> Vec<Conflict> {
    let day = candidate.date_start.date();

    let mut conflicts: Vec<Conflict> = existing
        .iter()
        .filter(|other| Some(other.id) != candidate.exclude_id)
        .filter(|other| other.status.occupies_slot())
        .filter(|other| other.date() == day)
        .filter(|other| other.overlaps(candidate.date_start, candidate.date_end))
        .filter_map(|other| {
            let mut kinds = Vec::new();
            if other.provider_id == candidate.provider_id {
                kinds.push(ConflictKind::Provider);
            }
            if same_room(&candidate.room_number, &other.room_number) {
                kinds.push(ConflictKind::Room);
            }
            if kinds.is_empty() {
                return None;
            }
            Some(Conflict {
                appointment_id: other.id,
                patient_name: other.patient_name.clone(),
                provider_name: other.provider_name.clone(),
                room_number: other.room_number.clone(),
                date_start: other.date_start,
                date_end: other.date_end,
                kinds,
            })
        })
        .collect();

    conflicts.sort_by(|a, b| a.date_start.cmp(&b.date_start).then(a.appointment_id.cmp(&b.appointment_id)));
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{parse_minute, AppointmentStatus};

    fn at(s: &str) -> NaiveDateTime {
        parse_minute(s).unwrap()
    }

    fn appt(id: u64, provider: u32, room: &str, start: &str, end: &str) -> Appointment {
        Appointment::new(id, 1, provider, at(start), at(end)).room(room)
    }

    #[test]
    fn test_provider_conflict_is_symmetric() {
        let a = appt(1, 1, "", "2024-05-03 10:00", "2024-05-03 10:45");
        let b = appt(2, 1, "", "2024-05-03 10:30", "2024-05-03 11:00");

        let ab = detect_conflicts(&ConflictCandidate::from(&a), &[b.clone()]);
        let ba = detect_conflicts(&ConflictCandidate::from(&b), &[a.clone()]);

        assert_eq!(ab.len(), 1);
        assert_eq!(ba.len(), 1);
        assert_eq!(ab[0].appointment_id, 2);
        assert_eq!(ba[0].appointment_id, 1);
        assert_eq!(ab[0].kinds, vec![ConflictKind::Provider]);
    }

    #[test]
    fn test_touching_intervals_do_not_conflict() {
        let existing = vec![appt(1, 1, "Room 1", "2024-05-03 10:00", "2024-05-03 10:30")];
        let candidate = ConflictCandidate::new(at("2024-05-03 10:30"), at("2024-05-03 11:00"), 1)
            .room("Room 1");
        assert!(detect_conflicts(&candidate, &existing).is_empty());
    }

    #[test]
    fn test_room_conflict_with_other_provider() {
        let existing = vec![appt(1, 2, "Room 1", "2024-05-03 10:00", "2024-05-03 10:30")];
        let candidate = ConflictCandidate::new(at("2024-05-03 10:15"), at("2024-05-03 10:45"), 1)
            .room("room 1");
        let conflicts = detect_conflicts(&candidate, &existing);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kinds, vec![ConflictKind::Room]);

        let no_room = ConflictCandidate::new(at("2024-05-03 10:15"), at("2024-05-03 10:45"), 1);
        assert!(detect_conflicts(&no_room, &existing).is_empty());
    }

    #[test]
    fn test_provider_and_room_tagged_together() {
        let existing = vec![appt(1, 1, "Room 2", "2024-05-03 09:00", "2024-05-03 12:00")];
        let candidate = ConflictCandidate::new(at("2024-05-03 10:00"), at("2024-05-03 10:30"), 1)
            .room("Room 2");
        let conflicts = detect_conflicts(&candidate, &existing);
        assert_eq!(conflicts[0].kinds, vec![ConflictKind::Provider, ConflictKind::Room]);
    }

    #[test]
    fn test_excludes_self_cancelled_and_other_days() {
        let existing = vec![
            appt(1, 1, "", "2024-05-03 10:00", "2024-05-03 10:30"),
            appt(2, 1, "", "2024-05-03 10:00", "2024-05-03 10:30").status(AppointmentStatus::Cancelled),
            appt(3, 1, "", "2024-05-03 10:00", "2024-05-03 10:30").status(AppointmentStatus::NoShow),
            appt(4, 1, "", "2024-05-04 10:00", "2024-05-04 10:30"),
        ];
        let candidate = ConflictCandidate::new(at("2024-05-03 10:00"), at("2024-05-03 10:30"), 1)
            .exclude(1);
        assert!(detect_conflicts(&candidate, &existing).is_empty());
    }
}
