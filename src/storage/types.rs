//! Core data types for the clinic store
//!
//! This module defines the records held by the store:
//! - `Appointment`: a booked slot for one patient with one provider
//! - `Patient` and `Provider`: the clinic directory
//! - `Payment`: money collected from a patient
//! - `Preferences`: UI selections persisted between sessions
//!
//! Wire names are camelCase so seed files written for the browser calendar
//! load unchanged.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::i18n::Language;
use crate::storage::error::{StorageError, StorageResult};

/// Name used whenever a patient or provider reference cannot be resolved.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Serde adapter for `"YYYY-MM-DD HH:MM"` timestamps.
pub mod minute_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M";

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_minute(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid date-time '{}', expected YYYY-MM-DD HH:MM",
                raw
            ))
        })
    }
}

/// Parse a local timestamp, accepting the stored format and its ISO variants.
pub fn parse_minute(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    let formats = [
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];

    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Appointment status, serialized as the `type` field
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    /// Booked, patient not yet in the clinic
    Scheduled,
    /// Patient checked in at the front desk
    Arrived,
    /// Chair prepared, patient can be called
    Ready,
    /// Patient in the chair
    InTreatment,
    /// Visit finished
    Completed,
    /// Finished, another visit has to be booked
    NeedsFollowup,
    /// Came in without a booking
    WalkIn,
    /// Did not come
    NoShow,
    /// Cancelled by patient or clinic
    Cancelled,
}

impl AppointmentStatus {
    /// All statuses in display order
    pub fn all() -> &'static [AppointmentStatus] {
        &[
            AppointmentStatus::Scheduled,
            AppointmentStatus::Arrived,
            AppointmentStatus::Ready,
            AppointmentStatus::InTreatment,
            AppointmentStatus::Completed,
            AppointmentStatus::NeedsFollowup,
            AppointmentStatus::WalkIn,
            AppointmentStatus::NoShow,
            AppointmentStatus::Cancelled,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Arrived => "arrived",
            AppointmentStatus::Ready => "ready",
            AppointmentStatus::InTreatment => "in-treatment",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NeedsFollowup => "needs-followup",
            AppointmentStatus::WalkIn => "walk-in",
            AppointmentStatus::NoShow => "no-show",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Cancelled and no-show appointments no longer occupy a chair or a room.
    pub fn occupies_slot(&self) -> bool {
        !matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Statuses that place the patient in the waiting queue
    pub fn is_waiting(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Arrived | AppointmentStatus::Ready | AppointmentStatus::WalkIn
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        AppointmentStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                StorageError::Validation(format!(
                    "Invalid appointment type: {}. Use one of: {}",
                    s,
                    AppointmentStatus::all()
                        .iter()
                        .map(|st| st.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// A booked appointment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: u64,
    pub patient_id: u32,
    #[serde(default)]
    pub patient_name: String,
    pub provider_id: u32,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default)]
    pub treatment_category: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub title: String,
    #[serde(with = "minute_format")]
    pub date_start: NaiveDateTime,
    #[serde(with = "minute_format")]
    pub date_end: NaiveDateTime,
    #[serde(rename = "type")]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    /// Rarely filled in; only used by priority scoring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_age: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub vip: bool,
}

impl Appointment {
    /// Create a scheduled appointment with the required fields
    pub fn new(
        id: u64,
        patient_id: u32,
        provider_id: u32,
        date_start: NaiveDateTime,
        date_end: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            patient_id,
            patient_name: String::new(),
            provider_id,
            provider_name: String::new(),
            treatment_category: String::new(),
            room_number: String::new(),
            title: String::new(),
            date_start,
            date_end,
            status: AppointmentStatus::Scheduled,
            notes: String::new(),
            patient_age: None,
            vip: false,
        }
    }

    /// Builder: set status
    pub fn status(mut self, status: AppointmentStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder: set patient display name
    pub fn patient_name(mut self, name: impl Into<String>) -> Self {
        self.patient_name = name.into();
        self
    }

    /// Builder: set provider display name
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Builder: set treatment category
    pub fn treatment(mut self, treatment: impl Into<String>) -> Self {
        self.treatment_category = treatment.into();
        self
    }

    /// Builder: set room
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room_number = room.into();
        self
    }

    /// Builder: set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder: set notes
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Builder: set patient age
    pub fn age(mut self, age: u32) -> Self {
        self.patient_age = Some(age);
        self
    }

    /// Builder: mark as VIP
    pub fn vip(mut self, vip: bool) -> Self {
        self.vip = vip;
        self
    }

    /// Calendar day of the appointment
    pub fn date(&self) -> NaiveDate {
        self.date_start.date()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.date_end - self.date_start).num_minutes()
    }

    /// Half-open overlap: touching intervals do not overlap
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start < self.date_end && end > self.date_start
    }

    /// Check the same-day and ordering invariants
    pub fn validate(&self) -> StorageResult<()> {
        validate_range(self.date_start, self.date_end)
    }
}

/// `start` and `end` must fall on the same day with `start < end`.
pub fn validate_range(start: NaiveDateTime, end: NaiveDateTime) -> StorageResult<()> {
    if start >= end {
        return Err(StorageError::Validation(format!(
            "Appointment must end after it starts ({} >= {})",
            start.format(minute_format::FORMAT),
            end.format(minute_format::FORMAT)
        )));
    }
    if start.date() != end.date() {
        return Err(StorageError::Validation(
            "Appointment must start and end on the same day".to_string(),
        ));
    }
    Ok(())
}

/// Fields supplied when booking a new appointment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDraft {
    pub patient_id: u32,
    /// Resolved from the directory when absent
    #[serde(default)]
    pub patient_name: Option<String>,
    pub provider_id: u32,
    /// Resolved from the directory when absent
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub treatment_category: String,
    #[serde(default)]
    pub room_number: String,
    #[serde(default)]
    pub title: String,
    #[serde(with = "minute_format")]
    pub date_start: NaiveDateTime,
    #[serde(with = "minute_format")]
    pub date_end: NaiveDateTime,
    #[serde(rename = "type", default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub patient_age: Option<u32>,
    #[serde(default)]
    pub vip: bool,
}

impl AppointmentDraft {
    /// Turn the draft into an appointment, resolving names from the directory
    pub fn into_appointment(self, id: u64, directory: &Directory) -> Appointment {
        let patient_name = self
            .patient_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| directory.patient_name(self.patient_id).to_string());
        let provider_name = self
            .provider_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| directory.provider_name(self.provider_id).to_string());

        Appointment {
            id,
            patient_id: self.patient_id,
            patient_name,
            provider_id: self.provider_id,
            provider_name,
            treatment_category: self.treatment_category,
            room_number: self.room_number,
            title: self.title,
            date_start: self.date_start,
            date_end: self.date_end,
            status: self.status.unwrap_or(AppointmentStatus::Scheduled),
            notes: self.notes,
            patient_age: self.patient_age,
            vip: self.vip,
        }
    }
}

/// Partial update applied as a shallow merge
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(default)]
    pub patient_id: Option<u32>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub provider_id: Option<u32>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub treatment_category: Option<String>,
    #[serde(default)]
    pub room_number: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, with = "optional_minute_format")]
    pub date_start: Option<NaiveDateTime>,
    #[serde(default, with = "optional_minute_format")]
    pub date_end: Option<NaiveDateTime>,
    #[serde(rename = "type", default)]
    pub status: Option<AppointmentStatus>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub patient_age: Option<u32>,
    #[serde(default)]
    pub vip: Option<bool>,
}

/// Serde adapter for optional `"YYYY-MM-DD HH:MM"` timestamps.
pub mod optional_minute_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
        match dt {
            Some(dt) => super::minute_format::serialize(dt, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => super::parse_minute(&s).map(Some).ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "invalid date-time '{}', expected YYYY-MM-DD HH:MM",
                    s
                ))
            }),
        }
    }
}

impl AppointmentPatch {
    /// Merge the supplied fields over `current`.
    ///
    /// Changing the patient or provider id without a name re-resolves the
    /// name from the directory.
    pub fn apply(&self, current: &Appointment, directory: &Directory) -> Appointment {
        let mut next = current.clone();

        if let Some(id) = self.patient_id {
            next.patient_id = id;
            if self.patient_name.is_none() {
                next.patient_name = directory.patient_name(id).to_string();
            }
        }
        if let Some(name) = &self.patient_name {
            next.patient_name = name.clone();
        }
        if let Some(id) = self.provider_id {
            next.provider_id = id;
            if self.provider_name.is_none() {
                next.provider_name = directory.provider_name(id).to_string();
            }
        }
        if let Some(name) = &self.provider_name {
            next.provider_name = name.clone();
        }
        if let Some(v) = &self.treatment_category {
            next.treatment_category = v.clone();
        }
        if let Some(v) = &self.room_number {
            next.room_number = v.clone();
        }
        if let Some(v) = &self.title {
            next.title = v.clone();
        }
        if let Some(v) = self.date_start {
            next.date_start = v;
        }
        if let Some(v) = self.date_end {
            next.date_end = v;
        }
        if let Some(v) = self.status {
            next.status = v;
        }
        if let Some(v) = &self.notes {
            next.notes = v.clone();
        }
        if let Some(v) = self.patient_age {
            next.patient_age = Some(v);
        }
        if let Some(v) = self.vip {
            next.vip = v;
        }

        next
    }

    /// Whether the merge can move the appointment in time, chair or room
    pub fn touches_schedule(&self) -> bool {
        self.date_start.is_some()
            || self.date_end.is_some()
            || self.provider_id.is_some()
            || self.room_number.is_some()
            || self.status.is_some()
    }
}

/// Patient gender as recorded at the front desk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    #[serde(other)]
    Other,
}

/// A clinic patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
}

/// Fields supplied when registering a patient
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub age: Option<u32>,
}

/// A dentist or hygienist who owns a timeline column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: u32,
    pub name: String,
    pub specialty: String,
    /// CSS color used for timeline blocks
    pub color: String,
}

/// Patients and providers, looked up by id equality
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub patients: Vec<Patient>,
    pub providers: Vec<Provider>,
}

impl Directory {
    pub fn new(patients: Vec<Patient>, providers: Vec<Provider>) -> Self {
        Self {
            patients,
            providers,
        }
    }

    pub fn patient(&self, id: u32) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn provider(&self, id: u32) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Patient name, or `"Unknown"` for a dangling reference
    pub fn patient_name(&self, id: u32) -> &str {
        self.patient(id).map(|p| p.name.as_str()).unwrap_or(UNKNOWN_NAME)
    }

    /// Provider name, or `"Unknown"` for a dangling reference
    pub fn provider_name(&self, id: u32) -> &str {
        self.provider(id)
            .map(|p| p.name.as_str())
            .unwrap_or(UNKNOWN_NAME)
    }

    pub fn patient_phone(&self, id: u32) -> Option<&str> {
        self.patient(id).map(|p| p.phone.as_str())
    }
}

/// How a payment was made
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
    #[serde(other)]
    Other,
}

/// Settlement state derived from the amounts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Unpaid,
}

/// Money collected from a patient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: u64,
    pub patient_id: u32,
    #[serde(default)]
    pub patient_name: String,
    pub total_amount: f64,
    pub paid_amount: f64,
    #[serde(default)]
    pub method: PaymentMethod,
    pub paid_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn balance(&self) -> f64 {
        (self.total_amount - self.paid_amount).max(0.0)
    }

    pub fn payment_status(&self) -> PaymentStatus {
        if self.paid_amount <= 0.0 {
            PaymentStatus::Unpaid
        } else if self.paid_amount + f64::EPSILON < self.total_amount {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        }
    }
}

/// Fields supplied when recording a payment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub patient_id: u32,
    #[serde(default)]
    pub patient_name: Option<String>,
    pub total_amount: f64,
    pub paid_amount: f64,
    #[serde(default)]
    pub method: PaymentMethod,
    /// Defaults to the day the payment is recorded
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

impl NewPayment {
    /// Reject the `NaN`/negative amounts the form used to let through
    pub fn validate(&self) -> StorageResult<()> {
        for (label, value) in [
            ("totalAmount", self.total_amount),
            ("paidAmount", self.paid_amount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(StorageError::Validation(format!(
                    "{} must be a non-negative number",
                    label
                )));
            }
        }
        if self.paid_amount > self.total_amount {
            return Err(StorageError::Validation(
                "paidAmount cannot exceed totalAmount".to_string(),
            ));
        }
        Ok(())
    }
}

/// Role selected at login, stored as a plain string
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Dentist,
    #[default]
    Receptionist,
    Assistant,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Dentist => "dentist",
            UserRole::Receptionist => "receptionist",
            UserRole::Assistant => "assistant",
        }
    }

    /// Parse a stored value, falling back to the default role
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "dentist" | "doctor" => UserRole::Dentist,
            "assistant" => UserRole::Assistant,
            _ => UserRole::Receptionist,
        }
    }
}

/// Timeline layout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimelineViewMode {
    /// One column per provider for a single day
    #[default]
    Day,
    /// One column per day of the week
    Week,
}

impl TimelineViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineViewMode::Day => "day",
            TimelineViewMode::Week => "week",
        }
    }

    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "week" => TimelineViewMode::Week,
            _ => TimelineViewMode::Day,
        }
    }
}

/// UI selections persisted between sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub language: Language,
    pub user_role: UserRole,
    pub timeline_view_mode: TimelineViewMode,
    /// Empty means every provider
    pub timeline_selected_providers: Vec<u32>,
}

/// Default length for appointments whose end time is missing.
///
/// Clipped to 23:59 of the start day so the range never crosses midnight.
pub fn default_end(start: NaiveDateTime, duration_minutes: i64) -> NaiveDateTime {
    let end = start + Duration::minutes(duration_minutes);
    if end.date() == start.date() {
        return end;
    }
    start.date().and_hms_opt(23, 59, 0).unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        parse_minute(s).unwrap()
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&AppointmentStatus::InTreatment).unwrap();
        assert_eq!(json, "\"in-treatment\"");

        let status: AppointmentStatus = serde_json::from_str("\"needs-followup\"").unwrap();
        assert_eq!(status, AppointmentStatus::NeedsFollowup);

        assert_eq!(
            "walk_in".parse::<AppointmentStatus>().unwrap(),
            AppointmentStatus::WalkIn
        );
        assert!("late".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_appointment_serialization() {
        let appt = Appointment::new(7, 1, 2, at("2024-05-03 09:00"), at("2024-05-03 09:30"))
            .patient_name("Sok Dara")
            .status(AppointmentStatus::Arrived);

        let json = serde_json::to_value(&appt).unwrap();
        assert_eq!(json["dateStart"], "2024-05-03 09:00");
        assert_eq!(json["type"], "arrived");
        assert_eq!(json["patientName"], "Sok Dara");
        assert!(json.get("vip").is_none());

        let restored: Appointment = serde_json::from_value(json).unwrap();
        assert_eq!(restored, appt);
    }

    #[test]
    fn test_parse_minute_variants() {
        assert!(parse_minute("2024-05-03 09:00").is_some());
        assert!(parse_minute("2024-05-03T09:00").is_some());
        assert!(parse_minute("2024-05-03 09:00:00").is_some());
        assert!(parse_minute("03/05/2024").is_none());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(at("2024-05-03 09:00"), at("2024-05-03 09:30")).is_ok());
        assert!(validate_range(at("2024-05-03 09:30"), at("2024-05-03 09:30")).is_err());
        assert!(validate_range(at("2024-05-03 23:30"), at("2024-05-04 00:30")).is_err());
    }

    #[test]
    fn test_default_end_clipped_at_midnight() {
        assert_eq!(default_end(at("2024-05-03 09:00"), 30), at("2024-05-03 09:30"));
        assert_eq!(default_end(at("2024-05-03 23:45"), 30), at("2024-05-03 23:59"));
        assert_eq!(default_end(at("2024-05-03 23:30"), 30), at("2024-05-03 23:59"));
    }

    #[test]
    fn test_overlap_is_half_open() {
        let appt = Appointment::new(1, 1, 1, at("2024-05-03 10:00"), at("2024-05-03 10:30"));
        assert!(!appt.overlaps(at("2024-05-03 10:30"), at("2024-05-03 11:00")));
        assert!(appt.overlaps(at("2024-05-03 10:15"), at("2024-05-03 10:45")));
    }

    #[test]
    fn test_patch_is_shallow_merge() {
        let directory = Directory::new(
            vec![],
            vec![Provider {
                id: 3,
                name: "Dr. Chan".to_string(),
                specialty: "Orthodontics".to_string(),
                color: "#3b82f6".to_string(),
            }],
        );
        let appt = Appointment::new(1, 1, 1, at("2024-05-03 10:00"), at("2024-05-03 10:30"))
            .notes("check crown")
            .provider_name("Dr. Old");

        let patch = AppointmentPatch {
            provider_id: Some(3),
            title: Some("Follow-up".to_string()),
            ..Default::default()
        };
        let merged = patch.apply(&appt, &directory);

        assert_eq!(merged.provider_id, 3);
        assert_eq!(merged.provider_name, "Dr. Chan");
        assert_eq!(merged.title, "Follow-up");
        assert_eq!(merged.notes, "check crown");
        assert_eq!(merged.date_start, appt.date_start);
    }

    #[test]
    fn test_unknown_references() {
        let directory = Directory::default();
        assert_eq!(directory.patient_name(42), UNKNOWN_NAME);
        assert_eq!(directory.provider_name(42), UNKNOWN_NAME);
    }

    #[test]
    fn test_payment_validation_and_status() {
        let mut new = NewPayment {
            patient_id: 1,
            patient_name: None,
            total_amount: 100.0,
            paid_amount: 40.0,
            method: PaymentMethod::Cash,
            paid_date: None,
        };
        assert!(new.validate().is_ok());

        new.paid_amount = f64::NAN;
        assert!(new.validate().is_err());

        new.paid_amount = 150.0;
        assert!(new.validate().is_err());

        let payment = Payment {
            id: 1,
            patient_id: 1,
            patient_name: "Sok Dara".to_string(),
            total_amount: 100.0,
            paid_amount: 40.0,
            method: PaymentMethod::Card,
            paid_date: NaiveDate::from_ymd_opt(2024, 5, 3).unwrap(),
            created_at: Utc::now(),
        };
        assert_eq!(payment.balance(), 60.0);
        assert_eq!(payment.payment_status(), PaymentStatus::Partial);
    }

    #[test]
    fn test_lenient_preference_parsing() {
        assert_eq!(UserRole::parse_lenient("Doctor"), UserRole::Dentist);
        assert_eq!(UserRole::parse_lenient("???"), UserRole::Receptionist);
        assert_eq!(TimelineViewMode::parse_lenient("WEEK"), TimelineViewMode::Week);
        assert_eq!(TimelineViewMode::parse_lenient(""), TimelineViewMode::Day);
    }
}
