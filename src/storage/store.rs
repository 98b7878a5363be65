//! Clinic store
//!
//! Holds every collection in memory behind a tokio `RwLock` and rewrites
//! the affected key on each mutation. A mutation is applied to a copy of the
//! collection, the copy is persisted, and only then swapped in, so a failed
//! write leaves memory untouched.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::i18n::Language;
use crate::report::DailyReport;
use crate::schedule::{detect_conflicts, Conflict, ConflictCandidate};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv::{KeyValueStore, StorageKey};
use crate::storage::seed::{
    decode_lenient, load_initial_data, seed_patients, seed_providers, seed_source_from, DataOrigin,
    InitialData,
};
use crate::storage::types::{
    Appointment, AppointmentDraft, AppointmentPatch, AppointmentStatus, Directory, NewPatient,
    NewPayment, Patient, Payment, Preferences, Provider, TimelineViewMode, UserRole,
};

/// Configuration for the clinic store
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding one file per storage key
    pub data_dir: PathBuf,
    /// File path or http(s) URL with startup data
    pub seed_source: Option<String>,
    /// Length given to appointments stored without an end time
    pub default_duration_minutes: i64,
    /// Timeout for fetching a seed URL
    pub seed_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dentacal_data"),
            seed_source: None,
            default_duration_minutes: 30,
            seed_timeout_ms: 5000,
        }
    }
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    pub fn seed_source(mut self, source: impl Into<String>) -> Self {
        self.seed_source = Some(source.into());
        self
    }
}

/// Monotonic id source: milliseconds since the epoch, bumped on collision
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn starting_after(last: u64) -> Self {
        Self {
            last: AtomicU64::new(last),
        }
    }

    pub fn next(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut current = self.last.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(current + 1);
            match self
                .last
                .compare_exchange(current, candidate, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return candidate,
                Err(actual) => current = actual,
            }
        }
    }

    /// Never hand out an id at or below `id`
    pub fn observe(&self, id: u64) {
        self.last.fetch_max(id, Ordering::SeqCst);
    }
}

struct StoreState {
    appointments: Vec<Appointment>,
    payments: Vec<Payment>,
    reports: Vec<DailyReport>,
    patients: Vec<Patient>,
    providers: Vec<Provider>,
    preferences: Preferences,
}

impl StoreState {
    fn directory(&self) -> Directory {
        Directory::new(self.patients.clone(), self.providers.clone())
    }

    fn position(&self, id: u64) -> StorageResult<usize> {
        self.appointments
            .iter()
            .position(|a| a.id == id)
            .ok_or(StorageError::AppointmentNotFound(id))
    }
}

/// A consistent copy of everything the views need
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub appointments: Vec<Appointment>,
    pub payments: Vec<Payment>,
    pub directory: Directory,
    pub preferences: Preferences,
}

/// Store statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub appointments: usize,
    pub payments: usize,
    pub patients: usize,
    pub providers: usize,
    pub daily_reports: usize,
    pub origin: DataOrigin,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Appointments: {}, Payments: {}, Patients: {}, Providers: {}, Reports: {}",
            self.appointments, self.payments, self.patients, self.providers, self.daily_reports
        )
    }
}

/// The clinic's state store
pub struct ClinicStore {
    config: StorageConfig,
    kv: KeyValueStore,
    ids: IdGenerator,
    origin: DataOrigin,
    state: RwLock<StoreState>,
}

impl ClinicStore {
    /// Open the data directory and load startup data
    pub async fn open(config: StorageConfig) -> StorageResult<Self> {
        Self::open_at(config, Local::now().naive_local()).await
    }

    /// Open with an explicit clock, used for the sample appointment's day
    pub async fn open_at(config: StorageConfig, now: NaiveDateTime) -> StorageResult<Self> {
        let kv = KeyValueStore::open(&config.data_dir)?;

        let source = match config.seed_source.as_deref().map(str::trim) {
            Some(location) if !location.is_empty() => Some(seed_source_from(
                location,
                Duration::from_millis(config.seed_timeout_ms),
            )?),
            _ => None,
        };

        let initial = load_initial_data(
            source.as_deref(),
            &kv,
            config.default_duration_minutes,
            now,
        )
        .await;

        let store = Self::from_parts(config, kv, initial);
        tracing::info!(
            data_dir = %store.config.data_dir.display(),
            "Clinic store opened"
        );
        Ok(store)
    }

    /// Build a store over already loaded data without consulting a seed
    pub fn with_data(
        config: StorageConfig,
        appointments: Vec<Appointment>,
        payments: Vec<Payment>,
    ) -> StorageResult<Self> {
        let kv = KeyValueStore::open(&config.data_dir)?;
        let initial = InitialData {
            appointments,
            payments,
            origin: DataOrigin::Persisted,
        };
        Ok(Self::from_parts(config, kv, initial))
    }

    fn from_parts(config: StorageConfig, kv: KeyValueStore, initial: InitialData) -> Self {
        let patients = load_collection::<Patient>(&kv, StorageKey::Patients, "patient")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(seed_patients);
        let providers = seed_providers();
        let reports =
            load_collection::<DailyReport>(&kv, StorageKey::DailyReports, "daily report")
                .unwrap_or_default();
        let preferences = load_preferences(&kv);

        let directory = Directory::new(patients.clone(), providers.clone());
        let highest = initial
            .appointments
            .iter()
            .map(|a| a.id)
            .chain(initial.payments.iter().map(|p| p.id))
            .max()
            .unwrap_or(0);
        let ids = IdGenerator::starting_after(highest);

        let appointments: Vec<Appointment> = initial
            .appointments
            .into_iter()
            .map(|mut appt| {
                if appt.id == 0 {
                    appt.id = ids.next();
                }
                if appt.patient_name.trim().is_empty() {
                    appt.patient_name = directory.patient_name(appt.patient_id).to_string();
                }
                if appt.provider_name.trim().is_empty() {
                    appt.provider_name = directory.provider_name(appt.provider_id).to_string();
                }
                appt
            })
            .collect();

        Self {
            config,
            kv,
            ids,
            origin: initial.origin,
            state: RwLock::new(StoreState {
                appointments,
                payments: initial.payments,
                reports,
                patients,
                providers,
                preferences,
            }),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Where the startup data came from
    pub fn origin(&self) -> &DataOrigin {
        &self.origin
    }

    // ---- appointments ----

    pub async fn appointments(&self) -> Vec<Appointment> {
        self.state.read().await.appointments.clone()
    }

    pub async fn appointment(&self, id: u64) -> StorageResult<Appointment> {
        let state = self.state.read().await;
        let idx = state.position(id)?;
        Ok(state.appointments[idx].clone())
    }

    /// Appointments of one day in start order
    pub async fn appointments_on(&self, date: NaiveDate) -> Vec<Appointment> {
        let state = self.state.read().await;
        let mut day: Vec<Appointment> = state
            .appointments
            .iter()
            .filter(|a| a.date() == date)
            .cloned()
            .collect();
        day.sort_by(|a, b| a.date_start.cmp(&b.date_start).then(a.id.cmp(&b.id)));
        day
    }

    pub async fn check_conflicts(&self, candidate: &ConflictCandidate) -> Vec<Conflict> {
        let state = self.state.read().await;
        detect_conflicts(candidate, &state.appointments)
    }

    /// Book a new appointment
    ///
    /// Fails with `Conflicts` when the slot collides with another booking,
    /// unless `allow_conflicts` is set.
    pub async fn create_appointment(
        &self,
        draft: AppointmentDraft,
        allow_conflicts: bool,
    ) -> StorageResult<Appointment> {
        let mut state = self.state.write().await;

        let directory = state.directory();
        let appt = draft.into_appointment(self.ids.next(), &directory);
        appt.validate()?;

        if !allow_conflicts && appt.status.occupies_slot() {
            let conflicts = detect_conflicts(&ConflictCandidate::from(&appt), &state.appointments);
            if !conflicts.is_empty() {
                return Err(StorageError::Conflicts(conflicts));
            }
        }

        let mut next = state.appointments.clone();
        next.push(appt.clone());
        self.kv.set_json(StorageKey::Appointments, &next)?;
        state.appointments = next;

        tracing::info!(
            id = appt.id,
            patient = %appt.patient_name,
            provider = %appt.provider_name,
            start = %appt.date_start,
            "Appointment created"
        );
        Ok(appt)
    }

    /// Merge `patch` over an existing appointment
    pub async fn update_appointment(
        &self,
        id: u64,
        patch: AppointmentPatch,
        allow_conflicts: bool,
    ) -> StorageResult<Appointment> {
        let mut state = self.state.write().await;
        let idx = state.position(id)?;

        let directory = state.directory();
        let updated = patch.apply(&state.appointments[idx], &directory);
        updated.validate()?;

        if !allow_conflicts && patch.touches_schedule() && updated.status.occupies_slot() {
            let conflicts =
                detect_conflicts(&ConflictCandidate::from(&updated), &state.appointments);
            if !conflicts.is_empty() {
                return Err(StorageError::Conflicts(conflicts));
            }
        }

        let mut next = state.appointments.clone();
        next[idx] = updated.clone();
        self.kv.set_json(StorageKey::Appointments, &next)?;
        state.appointments = next;

        tracing::info!(id, "Appointment updated");
        Ok(updated)
    }

    /// Move an appointment through the visit workflow
    pub async fn set_status(
        &self,
        id: u64,
        status: AppointmentStatus,
    ) -> StorageResult<Appointment> {
        let patch = AppointmentPatch {
            status: Some(status),
            ..Default::default()
        };
        // A status change never moves the slot, so it is not blocked by conflicts
        let updated = self.update_appointment(id, patch, true).await?;
        tracing::info!(id, status = %status, "Appointment status changed");
        Ok(updated)
    }

    pub async fn delete_appointment(&self, id: u64) -> StorageResult<Appointment> {
        let mut state = self.state.write().await;
        let idx = state.position(id)?;

        let mut next = state.appointments.clone();
        let removed = next.remove(idx);
        self.kv.set_json(StorageKey::Appointments, &next)?;
        state.appointments = next;

        tracing::info!(id, "Appointment deleted");
        Ok(removed)
    }

    // ---- directory ----

    pub async fn directory(&self) -> Directory {
        self.state.read().await.directory()
    }

    pub async fn patients(&self) -> Vec<Patient> {
        self.state.read().await.patients.clone()
    }

    pub async fn providers(&self) -> Vec<Provider> {
        self.state.read().await.providers.clone()
    }

    /// Register a patient; duplicates are accepted
    pub async fn add_patient(&self, new: NewPatient) -> StorageResult<Patient> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(StorageError::Validation(
                "Patient name is required".to_string(),
            ));
        }

        let mut state = self.state.write().await;

        let duplicate = state
            .patients
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name) && p.phone.trim() == new.phone.trim());
        if duplicate {
            tracing::warn!(name, phone = %new.phone, "Registering a duplicate patient");
        }

        let patient = Patient {
            id: state.patients.iter().map(|p| p.id).max().unwrap_or(0) + 1,
            name: name.to_string(),
            phone: new.phone.trim().to_string(),
            gender: new.gender,
            age: new.age,
        };

        let mut next = state.patients.clone();
        next.push(patient.clone());
        self.kv.set_json(StorageKey::Patients, &next)?;
        state.patients = next;

        tracing::info!(id = patient.id, name = %patient.name, "Patient registered");
        Ok(patient)
    }

    // ---- payments ----

    pub async fn payments(&self) -> Vec<Payment> {
        self.state.read().await.payments.clone()
    }

    /// Record a payment; `today` is used when no paid date is given
    pub async fn add_payment(&self, new: NewPayment, today: NaiveDate) -> StorageResult<Payment> {
        new.validate()?;

        let mut state = self.state.write().await;
        let patient_name = new
            .patient_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| state.directory().patient_name(new.patient_id).to_string());

        let payment = Payment {
            id: self.ids.next(),
            patient_id: new.patient_id,
            patient_name,
            total_amount: new.total_amount,
            paid_amount: new.paid_amount,
            method: new.method,
            paid_date: new.paid_date.unwrap_or(today),
            created_at: Utc::now(),
        };

        let mut next = state.payments.clone();
        next.push(payment.clone());
        self.kv.set_json(StorageKey::Payments, &next)?;
        state.payments = next;

        tracing::info!(
            id = payment.id,
            patient_id = payment.patient_id,
            paid = payment.paid_amount,
            "Payment recorded"
        );
        Ok(payment)
    }

    // ---- daily reports ----

    pub async fn daily_reports(&self) -> Vec<DailyReport> {
        self.state.read().await.reports.clone()
    }

    pub async fn daily_report(&self, date: NaiveDate) -> Option<DailyReport> {
        let state = self.state.read().await;
        state.reports.iter().find(|r| r.report_date == date).cloned()
    }

    /// Build the report for `date` from current data and store it
    pub async fn generate_daily_report(
        &self,
        date: NaiveDate,
        generated_at: DateTime<Utc>,
    ) -> StorageResult<DailyReport> {
        let mut state = self.state.write().await;
        let report = DailyReport::build(date, &state.appointments, &state.payments, generated_at);

        let mut next: Vec<DailyReport> = state
            .reports
            .iter()
            .filter(|r| r.report_date != date)
            .cloned()
            .collect();
        next.push(report.clone());
        next.sort_by_key(|r| r.report_date);
        self.kv.set_json(StorageKey::DailyReports, &next)?;
        state.reports = next;

        tracing::info!(date = %date, rows = report.rows.len(), "Daily report generated");
        Ok(report)
    }

    // ---- preferences ----

    pub async fn preferences(&self) -> Preferences {
        self.state.read().await.preferences.clone()
    }

    /// Save all preference keys.
    ///
    /// The keys live in separate files; if one write fails the keys already
    /// written are restored to the previous preferences and memory is left
    /// untouched.
    pub async fn set_preferences(&self, prefs: Preferences) -> StorageResult<Preferences> {
        let mut state = self.state.write().await;

        if let Err(e) = self.write_preferences(&prefs) {
            if let Err(rollback) = self.write_preferences(&state.preferences) {
                tracing::error!(error = %rollback, "Failed to restore previous preferences");
            }
            return Err(e);
        }
        state.preferences = prefs.clone();

        tracing::info!(language = prefs.language.code(), "Preferences saved");
        Ok(prefs)
    }

    fn write_preferences(&self, prefs: &Preferences) -> StorageResult<()> {
        self.kv.set_raw(StorageKey::Language, prefs.language.code())?;
        self.kv.set_raw(StorageKey::UserRole, prefs.user_role.as_str())?;
        self.kv
            .set_raw(StorageKey::TimelineViewMode, prefs.timeline_view_mode.as_str())?;
        self.kv.set_json(
            StorageKey::TimelineSelectedProviders,
            &prefs.timeline_selected_providers,
        )
    }

    // ---- whole-store views ----

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            appointments: state.appointments.clone(),
            payments: state.payments.clone(),
            directory: state.directory(),
            preferences: state.preferences.clone(),
        }
    }

    pub async fn stats(&self) -> StoreStats {
        let state = self.state.read().await;
        StoreStats {
            appointments: state.appointments.len(),
            payments: state.payments.len(),
            patients: state.patients.len(),
            providers: state.providers.len(),
            daily_reports: state.reports.len(),
            origin: self.origin.clone(),
        }
    }
}

/// Read a JSON collection record by record; `None` when missing or unreadable
fn load_collection<T: serde::de::DeserializeOwned>(
    kv: &KeyValueStore,
    key: StorageKey,
    what: &str,
) -> Option<Vec<T>> {
    match kv.get_json::<Vec<Value>>(key) {
        Ok(Some(values)) => Some(decode_lenient(values, what)),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(key = key.name(), error = %e, "Stored collection unreadable");
            None
        }
    }
}

fn load_preferences(kv: &KeyValueStore) -> Preferences {
    let raw = |key: StorageKey| kv.get_raw(key).ok().flatten();

    Preferences {
        language: raw(StorageKey::Language)
            .map(|s| Language::parse_lenient(&s))
            .unwrap_or_default(),
        user_role: raw(StorageKey::UserRole)
            .map(|s| UserRole::parse_lenient(&s))
            .unwrap_or_default(),
        timeline_view_mode: raw(StorageKey::TimelineViewMode)
            .map(|s| TimelineViewMode::parse_lenient(&s))
            .unwrap_or_default(),
        timeline_selected_providers: kv
            .get_json(StorageKey::TimelineSelectedProviders)
            .ok()
            .flatten()
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{parse_minute, Gender, PaymentMethod};
    use tempfile::tempdir;

    fn at(s: &str) -> NaiveDateTime {
        parse_minute(s).unwrap()
    }

    fn draft(provider: u32, room: &str, start: &str, end: &str) -> AppointmentDraft {
        AppointmentDraft {
            patient_id: 1,
            provider_id: provider,
            room_number: room.to_string(),
            treatment_category: "Cleaning".to_string(),
            date_start: at(start),
            date_end: at(end),
            ..Default::default()
        }
    }

    async fn empty_store(dir: &std::path::Path) -> ClinicStore {
        ClinicStore::with_data(StorageConfig::new(dir), vec![], vec![]).unwrap()
    }

    #[tokio::test]
    async fn test_create_resolves_names_and_persists() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;

        let appt = store
            .create_appointment(draft(2, "Room 1", "2024-05-03 09:00", "2024-05-03 09:30"), false)
            .await
            .unwrap();
        assert_eq!(appt.patient_name, "Chea Sokha");
        assert_eq!(appt.provider_name, "Dr. Chan Vannak");
        assert_eq!(appt.status, AppointmentStatus::Scheduled);
        assert!(dir.path().join("calendar-appointments.json").exists());

        let reopened = ClinicStore::open_at(StorageConfig::new(dir.path()), at("2024-05-03 08:00"))
            .await
            .unwrap();
        assert_eq!(reopened.origin(), &DataOrigin::Persisted);
        assert_eq!(reopened.appointments().await, vec![appt]);
    }

    #[tokio::test]
    async fn test_ids_are_unique_and_increasing() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;

        let mut last = 0;
        for i in 0..5 {
            let start = format!("2024-05-03 {:02}:00", 8 + i);
            let end = format!("2024-05-03 {:02}:30", 8 + i);
            let appt = store
                .create_appointment(draft(1, "", &start, &end), false)
                .await
                .unwrap();
            assert!(appt.id > last);
            last = appt.id;
        }
    }

    #[tokio::test]
    async fn test_conflicting_booking_rejected_unless_allowed() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;

        store
            .create_appointment(draft(1, "Room 1", "2024-05-03 10:00", "2024-05-03 10:30"), false)
            .await
            .unwrap();

        let err = store
            .create_appointment(draft(1, "Room 2", "2024-05-03 10:15", "2024-05-03 10:45"), false)
            .await
            .unwrap_err();
        match err {
            StorageError::Conflicts(conflicts) => assert_eq!(conflicts.len(), 1),
            other => panic!("expected conflicts, got {:?}", other),
        }
        assert_eq!(store.appointments().await.len(), 1);

        store
            .create_appointment(draft(1, "Room 2", "2024-05-03 10:15", "2024-05-03 10:45"), true)
            .await
            .unwrap();
        assert_eq!(store.appointments().await.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_range_rejected() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;
        let result = store
            .create_appointment(draft(1, "", "2024-05-03 10:00", "2024-05-03 09:00"), false)
            .await;
        assert!(matches!(result, Err(StorageError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_checks_conflicts_against_others_only() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;

        let a = store
            .create_appointment(draft(1, "", "2024-05-03 09:00", "2024-05-03 09:30"), false)
            .await
            .unwrap();
        store
            .create_appointment(draft(1, "", "2024-05-03 10:00", "2024-05-03 10:30"), false)
            .await
            .unwrap();

        // Stretching into itself is fine
        let stretched = AppointmentPatch {
            date_end: Some(at("2024-05-03 09:45")),
            ..Default::default()
        };
        store.update_appointment(a.id, stretched, false).await.unwrap();

        let overlapping = AppointmentPatch {
            date_end: Some(at("2024-05-03 10:15")),
            ..Default::default()
        };
        let result = store.update_appointment(a.id, overlapping, false).await;
        assert!(matches!(result, Err(StorageError::Conflicts(_))));
        assert_eq!(store.appointment(a.id).await.unwrap().date_end, at("2024-05-03 09:45"));
    }

    #[tokio::test]
    async fn test_status_and_delete() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;
        let appt = store
            .create_appointment(draft(1, "", "2024-05-03 09:00", "2024-05-03 09:30"), false)
            .await
            .unwrap();

        let arrived = store.set_status(appt.id, AppointmentStatus::Arrived).await.unwrap();
        assert_eq!(arrived.status, AppointmentStatus::Arrived);

        store.delete_appointment(appt.id).await.unwrap();
        assert!(matches!(
            store.appointment(appt.id).await,
            Err(StorageError::AppointmentNotFound(_))
        ));
        assert!(matches!(
            store.delete_appointment(appt.id).await,
            Err(StorageError::AppointmentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reload_drops_appointments_without_start() {
        let dir = tempdir().unwrap();
        let kv = KeyValueStore::open(dir.path()).unwrap();
        kv.set_json(
            StorageKey::Appointments,
            &serde_json::json!([
                {"id": 1, "patientId": 1, "providerId": 1, "dateStart": "2024-05-03 09:00", "dateEnd": "2024-05-03 09:30", "type": "scheduled"},
                {"id": 2, "patientId": 2, "providerId": 1, "dateEnd": "2024-05-03 11:00", "type": "scheduled"},
                {"id": 3, "patientId": 3, "providerId": 2, "dateStart": "2024-05-03 13:00", "type": "arrived"}
            ]),
        )
        .unwrap();

        let store = ClinicStore::open_at(StorageConfig::new(dir.path()), at("2024-05-03 08:00"))
            .await
            .unwrap();
        let appointments = store.appointments().await;
        let ids: Vec<u64> = appointments.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(appointments[1].date_end, at("2024-05-03 13:30"));
        assert_eq!(appointments[1].patient_name, "Mao Sreyleak");
    }

    #[tokio::test]
    async fn test_patients_and_payments() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;

        let patient = store
            .add_patient(NewPatient {
                name: "Sam Rithy".to_string(),
                phone: "099 000 111".to_string(),
                gender: Gender::Male,
                age: Some(70),
            })
            .await
            .unwrap();
        assert_eq!(patient.id, 6);
        assert!(store
            .add_patient(NewPatient {
                name: "  ".to_string(),
                phone: String::new(),
                gender: Gender::Other,
                age: None,
            })
            .await
            .is_err());

        let today = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let payment = store
            .add_payment(
                NewPayment {
                    patient_id: patient.id,
                    patient_name: None,
                    total_amount: 80.0,
                    paid_amount: 50.0,
                    method: PaymentMethod::Cash,
                    paid_date: None,
                },
                today,
            )
            .await
            .unwrap();
        assert_eq!(payment.patient_name, "Sam Rithy");
        assert_eq!(payment.paid_date, today);

        let reopened = empty_store(dir.path()).await;
        assert_eq!(reopened.patients().await.len(), 6);
    }

    #[tokio::test]
    async fn test_report_for_same_date_is_replaced() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;
        let day = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();

        store.generate_daily_report(day, Utc::now()).await.unwrap();
        store
            .create_appointment(draft(1, "", "2024-05-03 09:00", "2024-05-03 09:30"), false)
            .await
            .unwrap();
        store.generate_daily_report(day, Utc::now()).await.unwrap();

        let reports = store.daily_reports().await;
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].rows.len(), 1);
    }

    #[tokio::test]
    async fn test_preferences_round_trip() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;
        assert_eq!(store.preferences().await, Preferences::default());

        let prefs = Preferences {
            language: Language::Kh,
            user_role: UserRole::Dentist,
            timeline_view_mode: TimelineViewMode::Week,
            timeline_selected_providers: vec![1, 3],
        };
        store.set_preferences(prefs.clone()).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("calendar-language.txt")).unwrap();
        assert_eq!(raw, "kh");

        let reopened = empty_store(dir.path()).await;
        assert_eq!(reopened.preferences().await, prefs);
    }

    #[tokio::test]
    async fn test_failed_preference_write_restores_earlier_keys() {
        let dir = tempdir().unwrap();
        let store = empty_store(dir.path()).await;

        // A directory in place of the file makes the last key unwritable
        std::fs::create_dir(dir.path().join("timeline-selected-providers.json")).unwrap();

        let prefs = Preferences {
            language: Language::Kh,
            user_role: UserRole::Dentist,
            timeline_view_mode: TimelineViewMode::Week,
            timeline_selected_providers: vec![2],
        };
        assert!(store.set_preferences(prefs).await.is_err());

        assert_eq!(store.preferences().await, Preferences::default());
        let raw = std::fs::read_to_string(dir.path().join("calendar-language.txt")).unwrap();
        assert_eq!(raw, Preferences::default().language.code());
        let raw = std::fs::read_to_string(dir.path().join("timeline-view-mode.txt")).unwrap();
        assert_eq!(raw, Preferences::default().timeline_view_mode.as_str());
    }

    #[test]
    fn test_id_generator_never_repeats() {
        let ids = IdGenerator::starting_after(u64::MAX / 2);
        let a = ids.next();
        let b = ids.next();
        assert_eq!(a, u64::MAX / 2 + 1);
        assert_eq!(b, a + 1);
    }
}
