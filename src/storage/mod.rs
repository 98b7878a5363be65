//! Clinic Store
//!
//! This module holds the clinic's persistent state:
//!
//! - **types**: Appointments, patients, providers, payments, preferences
//! - **kv**: One-file-per-key store standing in for browser local storage
//! - **seed**: Startup data (seed file or URL, persisted files, sample)
//! - **store**: The `ClinicStore` guarding all collections
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Startup:
//!   Seed source → (fail) → persisted files → (empty) → sample appointment
//!
//! Mutation:
//!   write lock → validate → conflict check → copy + change → write file → swap
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use dentacal::storage::{AppointmentDraft, ClinicStore, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ClinicStore::open(StorageConfig::new("./data")).await?;
//!
//!     let draft: AppointmentDraft = serde_json::from_str(r#"{
//!         "patientId": 1, "providerId": 1,
//!         "dateStart": "2024-05-03 09:00", "dateEnd": "2024-05-03 09:30"
//!     }"#)?;
//!     let appt = store.create_appointment(draft, false).await?;
//!     println!("Booked #{} for {}", appt.id, appt.patient_name);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod kv;
pub mod seed;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use kv::{KeyValueStore, StorageKey};
pub use seed::{
    load_initial_data, seed_patients, seed_providers, seed_source_from, DataOrigin, FileSeed,
    HttpSeed, InitialData, SeedDocument, SeedSource, TREATMENT_CATEGORIES,
};
pub use store::{ClinicStore, IdGenerator, StorageConfig, StoreSnapshot, StoreStats};
pub use types::{
    default_end, minute_format, parse_minute, validate_range, Appointment, AppointmentDraft,
    AppointmentPatch, AppointmentStatus, Directory, Gender, NewPatient, NewPayment, Patient,
    Payment, PaymentMethod, PaymentStatus, Preferences, Provider, TimelineViewMode, UserRole,
    UNKNOWN_NAME,
};
