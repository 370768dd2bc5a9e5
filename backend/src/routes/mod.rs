//! Route definitions for the Marine Research Platform

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/datasets", dataset_routes())
        .nest("/fisheries", fisheries_routes())
}

/// Dataset upload and management routes
fn dataset_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_datasets).post(handlers::create_dataset),
        )
        .route("/import", post(handlers::import_dataset))
        .route(
            "/:dataset_id",
            get(handlers::get_dataset).delete(handlers::delete_dataset),
        )
}

/// Fisheries analytics routes
fn fisheries_routes() -> Router<AppState> {
    Router::new()
        // CPUE
        .route("/cpue", post(handlers::calculate_cpue))
        .route("/cpue/timeseries", post(handlers::cpue_time_series))
        .route("/cpue/summary", post(handlers::cpue_summary))
        // Length frequency
        .route("/length-frequency", post(handlers::length_distribution))
        .route("/length-frequency/cohorts", post(handlers::identify_cohorts))
        .route("/length-frequency/growth", post(handlers::estimate_growth))
        .route("/length-frequency/length-weight", post(handlers::length_weight))
        .route("/length-frequency/maturity", post(handlers::maturity_ogive))
        .route("/length-frequency/extended", post(handlers::length_frequency_extended))
        // Stock assessment
        .route("/stock/mortality", post(handlers::estimate_mortality))
        .route("/stock/status", post(handlers::stock_status))
        .route("/stock/recruitment", post(handlers::recruitment))
        .route("/stock/summary", post(handlers::stock_summary))
        // Spatial and environmental
        .route("/spatial/grid", post(handlers::spatial_grid))
        .route("/spatial/depth", post(handlers::depth_distribution))
        .route("/spatial/environment", post(handlers::environment_correlation))
}
