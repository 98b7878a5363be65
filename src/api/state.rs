//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Instant;

use crate::lunar::{KhmerCalendar, LunarCalendar};
use crate::storage::ClinicStore;
use crate::views::TimelineSettings;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Appointments, payments, directory and preferences
    pub store: Arc<ClinicStore>,
    /// Lunar overlay for calendar views
    pub calendar: Arc<dyn LunarCalendar>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Pinned clock for tests
    fixed_now: Option<NaiveDateTime>,
}

impl AppState {
    /// Create state with the Khmer calendar
    pub fn new(store: Arc<ClinicStore>, config: ApiConfig) -> Self {
        Self::with_calendar(store, Arc::new(KhmerCalendar::new()), config)
    }

    pub fn with_calendar(
        store: Arc<ClinicStore>,
        calendar: Arc<dyn LunarCalendar>,
        config: ApiConfig,
    ) -> Self {
        Self {
            store,
            calendar,
            config: Arc::new(config),
            start_time: Instant::now(),
            fixed_now: None,
        }
    }

    /// Pin "now" for scoring and queue waits
    pub fn with_clock(mut self, now: NaiveDateTime) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Clinic-local current time
    pub fn now(&self) -> NaiveDateTime {
        self.fixed_now
            .unwrap_or_else(|| Local::now().naive_local())
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins, empty for any
    pub cors_origins: Vec<String>,
    pub clinic_name: String,
    pub rooms: Vec<String>,
    pub timeline: TimelineSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            cors_origins: Vec::new(),
            clinic_name: "Dental Clinic".to_string(),
            rooms: Vec::new(),
            timeline: TimelineSettings::default(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&crate::config::Config> for ApiConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            host: config.api.host.clone(),
            port: config.api.port,
            cors_origins: config.api.cors_origins.clone(),
            clinic_name: config.clinic.name.clone(),
            rooms: config.clinic.rooms.clone(),
            timeline: config.timeline_settings(),
        }
    }
}
