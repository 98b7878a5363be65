//! Dentacal REST API
//!
//! HTTP API over the clinic store and view models, built with Axum.
//!
//! # Endpoints
//!
//! ## Appointments
//! - `GET /api/v1/appointments` - Filtered list ranked by priority
//! - `POST /api/v1/appointments` - Book an appointment
//! - `POST /api/v1/appointments/conflicts` - Dry-run conflict check
//! - `GET /api/v1/appointments/:id` - Get an appointment
//! - `PUT /api/v1/appointments/:id` - Update an appointment
//! - `DELETE /api/v1/appointments/:id` - Delete an appointment
//! - `POST /api/v1/appointments/:id/status` - Change status
//!
//! ## Directory & Payments
//! - `GET|POST /api/v1/patients`
//! - `GET /api/v1/providers`
//! - `GET|POST /api/v1/payments`
//!
//! ## Reports
//! - `GET|POST /api/v1/reports`
//! - `GET /api/v1/reports/:date`
//! - `GET /api/v1/reports/:date/csv`
//!
//! ## Views
//! - `GET /api/v1/views/calendar`
//! - `GET /api/v1/views/timeline`
//! - `POST /api/v1/views/timeline/quick-book`
//! - `GET /api/v1/views/dashboard`
//! - `GET /api/v1/views/queue`
//!
//! ## Lunar calendar
//! - `GET /api/v1/lunar/date/:date`
//! - `GET /api/v1/lunar/holidays`
//! - `GET /api/v1/lunar/holy-days`
//!
//! ## Preferences
//! - `GET|PUT /api/v1/preferences`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,no_run
//! use dentacal::api::{serve, ApiConfig, AppState};
//! use dentacal::storage::{ClinicStore, StorageConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(ClinicStore::open(StorageConfig::new("./data")).await?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(store, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiJson, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Appointment routes
        .route(
            "/appointments",
            get(routes::appointments::list_appointments)
                .post(routes::appointments::create_appointment),
        )
        .route(
            "/appointments/conflicts",
            post(routes::appointments::check_conflicts),
        )
        .route(
            "/appointments/:id",
            get(routes::appointments::get_appointment)
                .put(routes::appointments::update_appointment)
                .delete(routes::appointments::delete_appointment),
        )
        .route(
            "/appointments/:id/status",
            post(routes::appointments::set_status),
        )
        // Directory routes
        .route(
            "/patients",
            get(routes::directory::list_patients).post(routes::directory::create_patient),
        )
        .route("/providers", get(routes::directory::list_providers))
        // Payment routes
        .route(
            "/payments",
            get(routes::payments::list_payments).post(routes::payments::create_payment),
        )
        // Report routes
        .route(
            "/reports",
            get(routes::reports::list_reports).post(routes::reports::generate_report),
        )
        .route("/reports/:date", get(routes::reports::get_report))
        .route("/reports/:date/csv", get(routes::reports::download_csv))
        // View routes
        .route("/views/calendar", get(routes::views::calendar))
        .route("/views/timeline", get(routes::views::timeline))
        .route(
            "/views/timeline/quick-book",
            post(routes::views::timeline_quick_book),
        )
        .route("/views/dashboard", get(routes::views::dashboard))
        .route("/views/queue", get(routes::views::queue))
        // Lunar routes
        .route("/lunar/date/:date", get(routes::lunar::lunar_date))
        .route("/lunar/holidays", get(routes::lunar::holidays))
        .route("/lunar/holy-days", get(routes::lunar::holy_days))
        // Preference routes
        .route(
            "/preferences",
            get(routes::preferences::get_preferences).put(routes::preferences::put_preferences),
        );

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive without configured origins, otherwise limited to them
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Dentacal API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Dentacal API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
