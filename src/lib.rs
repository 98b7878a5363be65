//! # Dentacal
//!
//! Dental clinic scheduling: appointments, a priority-ranked waiting queue,
//! provider and room conflict checks, and a Khmer lunar calendar overlay.
//!
//! ## Features
//!
//! - **Clinic store**: appointments, payments, patients and daily reports
//!   persisted as one JSON file per key
//! - **Priority scoring**: status, urgency keywords, waiting time, age and VIP
//! - **Conflict detection**: same provider or same room, half-open intervals
//! - **Lunar calendar**: Chhankitek arithmetic, holy days and Khmer holidays
//! - **View models**: month calendar, provider timeline, dashboard, queue
//! - **Bilingual**: English and Khmer labels with Khmer numerals
//!
//! ## Modules
//!
//! - [`storage`]: Clinic store and data types
//! - [`schedule`]: Scoring, filtering and conflict detection
//! - [`lunar`]: Khmer lunar calendar
//! - [`views`]: View models for the front-end
//! - [`report`]: Daily report and CSV export
//! - [`i18n`]: English and Khmer labels
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dentacal::schedule::{filter_and_rank, AppointmentFilter};
//! use dentacal::storage::{ClinicStore, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ClinicStore::open(StorageConfig::new("./data")).await?;
//!     let snapshot = store.snapshot().await;
//!
//!     let now = chrono::Local::now().naive_local();
//!     let today = AppointmentFilter::new().day(now.date());
//!     for scored in filter_and_rank(&snapshot.appointments, &today, &snapshot.directory, now) {
//!         println!("{} {}", scored.priority_score, scored.appointment.patient_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod i18n;
pub mod lunar;
pub mod report;
pub mod schedule;
pub mod storage;
pub mod views;

// Re-export top-level types for convenience
pub use storage::{
    Appointment, AppointmentDraft, AppointmentPatch, AppointmentStatus, ClinicStore, Directory,
    Patient, Payment, Provider, StorageConfig, StorageError, StorageResult, StoreStats,
};

pub use schedule::{
    detect_conflicts, filter_and_rank, priority_score, AppointmentFilter, Conflict,
    ConflictCandidate, ConflictKind, ScoredAppointment, YearMonth,
};

pub use lunar::{KhmerCalendar, LunarCalendar, LunarError, LunarInfo, LunarResult};

pub use report::{DailyReport, ReportError};

pub use i18n::Language;

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{
    ApiConfig as ConfigApiConfig, ClinicConfig, Config, ConfigError, LoggingConfig,
    StorageConfig as ConfigStorageConfig,
};
