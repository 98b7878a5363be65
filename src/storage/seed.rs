//! Startup data
//!
//! The store boots from, in order:
//! 1. the configured seed source (a JSON file or an `http(s)` URL),
//! 2. the collections persisted in the data directory,
//! 3. a single sample appointment.
//!
//! Failures are logged and degrade to the next step; callers are never told
//! which source won beyond [`DataOrigin`].

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv::{KeyValueStore, StorageKey};
use crate::storage::types::{
    default_end, parse_minute, Appointment, AppointmentStatus, Gender, Patient, Payment, Provider,
};

/// Treatment categories offered by the booking form
pub const TREATMENT_CATEGORIES: &[&str] = &[
    "Consultation",
    "Cleaning",
    "Filling",
    "Root Canal",
    "Extraction",
    "Crown",
    "Orthodontics",
    "Implant",
    "Whitening",
    "Emergency",
];

/// Shape of the seed document
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SeedDocument {
    /// Kept as raw JSON so one malformed record does not sink the document
    #[serde(default)]
    pub appointments: Vec<Value>,
    #[serde(default)]
    pub payments: Vec<Value>,
}

/// Where the startup data came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "source", rename_all = "lowercase")]
pub enum DataOrigin {
    Seed(String),
    Persisted,
    Sample,
}

/// Decoded startup collections
#[derive(Debug, Clone)]
pub struct InitialData {
    pub appointments: Vec<Appointment>,
    pub payments: Vec<Payment>,
    pub origin: DataOrigin,
}

/// A place the seed document can be fetched from
#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Human-readable location for logs
    fn describe(&self) -> String;

    async fn fetch(&self) -> StorageResult<SeedDocument>;
}

/// Seed document on the local filesystem
pub struct FileSeed {
    path: PathBuf,
}

impl FileSeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SeedSource for FileSeed {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> StorageResult<SeedDocument> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let doc = serde_json::from_str(&content)?;
        Ok(doc)
    }
}

/// Seed document served over HTTP
pub struct HttpSeed {
    url: String,
    client: reqwest::Client,
}

impl HttpSeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Seed(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl SeedSource for HttpSeed {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> StorageResult<SeedDocument> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| StorageError::Seed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Seed(format!(
                "{} returned {}",
                self.url,
                response.status()
            )));
        }

        response
            .json::<SeedDocument>()
            .await
            .map_err(|e| StorageError::Seed(e.to_string()))
    }
}

/// Pick a seed source from its configured location
pub fn seed_source_from(location: &str, timeout: Duration) -> StorageResult<Box<dyn SeedSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpSeed::new(location, timeout)?))
    } else {
        Ok(Box::new(FileSeed::new(location)))
    }
}

/// Load startup data with the seed → persisted → sample fallback chain
pub async fn load_initial_data(
    source: Option<&dyn SeedSource>,
    kv: &KeyValueStore,
    default_duration_minutes: i64,
    now: NaiveDateTime,
) -> InitialData {
    if let Some(source) = source {
        match source.fetch().await {
            Ok(doc) => {
                let (appointments, dropped) =
                    decode_appointments(doc.appointments, default_duration_minutes);
                let payments = decode_lenient::<Payment>(doc.payments, "payment");
                if dropped > 0 {
                    tracing::warn!(dropped, "Dropped seed appointments without a usable time range");
                }
                tracing::info!(
                    source = %source.describe(),
                    appointments = appointments.len(),
                    payments = payments.len(),
                    "Loaded seed data"
                );
                return InitialData {
                    appointments,
                    payments,
                    origin: DataOrigin::Seed(source.describe()),
                };
            }
            Err(e) => {
                tracing::warn!(
                    source = %source.describe(),
                    error = %e,
                    "Seed data unavailable, falling back to persisted data"
                );
            }
        }
    }

    let (appointments, payments) = load_persisted(kv, default_duration_minutes);
    if !appointments.is_empty() || !payments.is_empty() {
        tracing::info!(
            appointments = appointments.len(),
            payments = payments.len(),
            "Loaded persisted data"
        );
        return InitialData {
            appointments,
            payments,
            origin: DataOrigin::Persisted,
        };
    }

    tracing::info!("No stored appointments, starting with a sample appointment");
    InitialData {
        appointments: vec![sample_appointment(now.date())],
        payments: Vec::new(),
        origin: DataOrigin::Sample,
    }
}

/// Read the persisted collections; unreadable files count as empty
pub fn load_persisted(
    kv: &KeyValueStore,
    default_duration_minutes: i64,
) -> (Vec<Appointment>, Vec<Payment>) {
    let appointments = match kv.get_json::<Vec<Value>>(StorageKey::Appointments) {
        Ok(Some(values)) => {
            let (appointments, dropped) = decode_appointments(values, default_duration_minutes);
            if dropped > 0 {
                tracing::warn!(dropped, "Dropped stored appointments without a usable time range");
            }
            appointments
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored appointments unreadable");
            Vec::new()
        }
    };

    let payments = match kv.get_json::<Vec<Value>>(StorageKey::Payments) {
        Ok(Some(values)) => decode_lenient::<Payment>(values, "payment"),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Stored payments unreadable");
            Vec::new()
        }
    };

    (appointments, payments)
}

/// Decode records one by one, skipping the ones that do not parse
pub fn decode_lenient<T: DeserializeOwned>(values: Vec<Value>, what: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "Skipping unreadable {}", what);
                None
            }
        })
        .collect()
}

/// Appointment as written by the browser: loose types, optional fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAppointment {
    #[serde(default, deserialize_with = "lenient_number")]
    id: Option<u64>,
    #[serde(default, deserialize_with = "lenient_number")]
    patient_id: Option<u64>,
    #[serde(default)]
    patient_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    provider_id: Option<u64>,
    #[serde(default)]
    provider_name: Option<String>,
    #[serde(default)]
    treatment_category: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    room_number: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date_start: Option<String>,
    #[serde(default)]
    date_end: Option<String>,
    #[serde(default, rename = "type")]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    patient_age: Option<u64>,
    #[serde(default)]
    vip: Option<bool>,
}

/// Numbers may arrive as JSON numbers or numeric strings
fn lenient_number<'de, D>(d: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Room numbers are sometimes stored as numbers
fn lenient_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl StoredAppointment {
    /// `None` when the record has no usable start time or time range
    fn into_appointment(self, default_duration_minutes: i64) -> Option<Appointment> {
        let date_start = self.date_start.as_deref().and_then(parse_minute)?;
        let date_end = self
            .date_end
            .as_deref()
            .and_then(parse_minute)
            .filter(|end| *end > date_start && end.date() == date_start.date())
            .unwrap_or_else(|| default_end(date_start, default_duration_minutes));
        if date_end <= date_start {
            tracing::warn!(
                id = self.id,
                start = %date_start,
                "Dropped stored appointment with no room for an end time"
            );
            return None;
        }

        let status = self
            .status
            .as_deref()
            .and_then(|s| s.parse::<AppointmentStatus>().ok())
            .unwrap_or(AppointmentStatus::Scheduled);

        let id = self.id.unwrap_or(0);
        Some(Appointment {
            id,
            patient_id: narrow_id(self.patient_id, id, "patientId"),
            patient_name: self.patient_name.unwrap_or_default(),
            provider_id: narrow_id(self.provider_id, id, "providerId"),
            provider_name: self.provider_name.unwrap_or_default(),
            treatment_category: self.treatment_category.unwrap_or_default(),
            room_number: self.room_number.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            date_start,
            date_end,
            status,
            notes: self.notes.unwrap_or_default(),
            patient_age: self.patient_age.and_then(|a| u32::try_from(a).ok()),
            vip: self.vip.unwrap_or(false),
        })
    }
}

/// Out-of-range references become 0, which resolves to "Unknown"
fn narrow_id(value: Option<u64>, appointment_id: u64, field: &'static str) -> u32 {
    let Some(value) = value else {
        return 0;
    };
    u32::try_from(value).unwrap_or_else(|_| {
        tracing::warn!(id = appointment_id, key = field, value, "Stored reference out of range");
        0
    })
}

/// Decode raw appointment records.
///
/// Records without a parseable `dateStart`, or starting too late in the day
/// to fit any end time, are dropped; the second value is
/// how many were dropped. Ids of 0 mean "missing" and are reassigned by the
/// store.
pub fn decode_appointments(
    values: Vec<Value>,
    default_duration_minutes: i64,
) -> (Vec<Appointment>, usize) {
    let total = values.len();
    let appointments: Vec<Appointment> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<StoredAppointment>(value).ok())
        .filter_map(|stored| stored.into_appointment(default_duration_minutes))
        .collect();
    let dropped = total - appointments.len();
    (appointments, dropped)
}

/// Providers on staff
pub fn seed_providers() -> Vec<Provider> {
    let provider = |id: u32, name: &str, specialty: &str, color: &str| Provider {
        id,
        name: name.to_string(),
        specialty: specialty.to_string(),
        color: color.to_string(),
    };

    vec![
        provider(1, "Dr. Sok Pisey", "General Dentistry", "#3b82f6"),
        provider(2, "Dr. Chan Vannak", "Orthodontics", "#10b981"),
        provider(3, "Dr. Lim Sophea", "Endodontics", "#f59e0b"),
        provider(4, "Dr. Keo Rithy", "Oral Surgery", "#ef4444"),
    ]
}

/// Patients known before any registration
pub fn seed_patients() -> Vec<Patient> {
    let patient = |id: u32, name: &str, phone: &str, gender: Gender| Patient {
        id,
        name: name.to_string(),
        phone: phone.to_string(),
        gender,
        age: None,
    };

    vec![
        patient(1, "Chea Sokha", "012 345 678", Gender::Female),
        patient(2, "Heng Dara", "017 222 901", Gender::Male),
        patient(3, "Mao Sreyleak", "093 456 120", Gender::Female),
        patient(4, "Nget Bunthoeun", "088 765 432", Gender::Male),
        patient(5, "Ouk Chanthy", "015 908 774", Gender::Female),
    ]
}

/// The single appointment shown when nothing else is available
pub fn sample_appointment(day: NaiveDate) -> Appointment {
    let start = day.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default());
    Appointment::new(1, 1, 1, start, default_end(start, 30))
        .patient_name("Chea Sokha")
        .provider_name("Dr. Sok Pisey")
        .treatment("Consultation")
        .room("Room 1")
        .title("Dental Checkup")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn now() -> NaiveDateTime {
        parse_minute("2024-05-03 08:00").unwrap()
    }

    #[test]
    fn test_decode_drops_missing_start() {
        let values = vec![
            json!({"id": 1, "patientId": 1, "providerId": 1,
                   "dateStart": "2024-05-03 09:00", "dateEnd": "2024-05-03 09:30",
                   "type": "arrived"}),
            json!({"id": 2, "patientId": 1, "providerId": 1}),
            json!({"id": 3, "patientId": "2", "providerId": 1, "roomNumber": 2,
                   "dateStart": "2024-05-03 10:00"}),
        ];

        let (appointments, dropped) = decode_appointments(values, 30);
        assert_eq!(dropped, 1);
        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[0].status, AppointmentStatus::Arrived);

        let third = &appointments[1];
        assert_eq!(third.patient_id, 2);
        assert_eq!(third.room_number, "2");
        assert_eq!(third.duration_minutes(), 30);
        assert_eq!(third.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_late_start_without_end_stays_on_same_day() {
        let values = vec![
            json!({"id": 1, "patientId": 1, "providerId": 1,
                   "dateStart": "2024-05-03 23:45", "type": "scheduled"}),
            json!({"id": 2, "patientId": 1, "providerId": 1,
                   "dateStart": "2024-05-03 23:59"}),
        ];

        let (appointments, dropped) = decode_appointments(values, 30);
        assert_eq!(dropped, 1);
        assert_eq!(appointments.len(), 1);

        let late = &appointments[0];
        assert_eq!(late.date_end, parse_minute("2024-05-03 23:59").unwrap());
        assert!(late.validate().is_ok());
    }

    #[test]
    fn test_out_of_range_references_become_unknown() {
        let values = vec![json!({
            "id": 7, "patientId": 4294967297u64, "providerId": 2,
            "patientAge": 99999999999u64,
            "dateStart": "2024-05-03 09:00", "dateEnd": "2024-05-03 09:30"
        })];

        let (appointments, dropped) = decode_appointments(values, 30);
        assert_eq!(dropped, 0);
        assert_eq!(appointments[0].patient_id, 0);
        assert_eq!(appointments[0].provider_id, 2);
        assert_eq!(appointments[0].patient_age, None);
    }

    #[tokio::test]
    async fn test_missing_seed_falls_back_to_persisted() {
        let dir = tempdir().unwrap();
        let kv = KeyValueStore::open(dir.path()).unwrap();
        let stored = vec![sample_appointment(now().date()).title("From disk")];
        kv.set_json(StorageKey::Appointments, &stored).unwrap();

        let seed = FileSeed::new(dir.path().join("missing.json"));
        let data = load_initial_data(Some(&seed), &kv, 30, now()).await;

        assert_eq!(data.origin, DataOrigin::Persisted);
        assert_eq!(data.appointments.len(), 1);
        assert_eq!(data.appointments[0].title, "From disk");
    }

    #[tokio::test]
    async fn test_empty_store_uses_sample() {
        let dir = tempdir().unwrap();
        let kv = KeyValueStore::open(dir.path()).unwrap();

        let data = load_initial_data(None, &kv, 30, now()).await;
        assert_eq!(data.origin, DataOrigin::Sample);
        assert_eq!(data.appointments.len(), 1);
        assert_eq!(data.appointments[0].date(), now().date());
    }

    #[tokio::test]
    async fn test_seed_file_wins() {
        let dir = tempdir().unwrap();
        let kv = KeyValueStore::open(dir.path()).unwrap();
        let seed_path = dir.path().join("appointments.json");
        std::fs::write(
            &seed_path,
            json!({
                "appointments": [
                    {"id": 10, "patientId": 3, "providerId": 2,
                     "dateStart": "2024-05-03 13:00", "dateEnd": "2024-05-03 14:00"}
                ],
                "payments": [
                    {"id": 1, "patientId": 3, "patientName": "Mao Sreyleak",
                     "totalAmount": 50.0, "paidAmount": 50.0, "method": "cash",
                     "paidDate": "2024-05-03", "createdAt": "2024-05-03T07:00:00Z"},
                    {"id": 2, "totalAmount": "oops"}
                ]
            })
            .to_string(),
        )
        .unwrap();

        let seed = FileSeed::new(&seed_path);
        let data = load_initial_data(Some(&seed), &kv, 30, now()).await;

        assert!(matches!(data.origin, DataOrigin::Seed(_)));
        assert_eq!(data.appointments.len(), 1);
        assert_eq!(data.payments.len(), 1);
    }

    #[test]
    fn test_seed_source_selection() {
        let http = seed_source_from("https://clinic.example/appointments.json", Duration::from_secs(5))
            .unwrap();
        assert_eq!(http.describe(), "https://clinic.example/appointments.json");

        let file = seed_source_from("appointments.json", Duration::from_secs(5)).unwrap();
        assert_eq!(file.describe(), "appointments.json");
    }
}
