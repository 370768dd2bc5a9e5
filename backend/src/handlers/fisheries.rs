//! HTTP handlers for fisheries analytics endpoints
//!
//! Every handler answers with the rounded JSON form of its result.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::error::AppResult;
use crate::services::fisheries::{
    EnvironmentRequest, FisheriesService, LengthRequest, SourceRequest, SpatialRequest,
    SpeciesRequest, StockRequest, StockSummaryRequest, TimeSeriesRequest,
};
use crate::services::presentation::present;
use crate::AppState;

fn service(state: &AppState) -> FisheriesService {
    FisheriesService::new(state.datasets.clone(), state.config.analytics.clone())
}

fn respond<T: Serialize>(state: &AppState, result: &T) -> AppResult<Json<Value>> {
    Ok(Json(present(result, state.config.analytics.presentation_decimals)?))
}

// ============================================================================
// CPUE
// ============================================================================

/// Aggregate CPUE, trend, and confidence interval of one species
pub async fn calculate_cpue(
    State(state): State<AppState>,
    Json(input): Json<SpeciesRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).cpue(input).await?;
    respond(&state, &result)
}

/// CPUE per month or year
pub async fn cpue_time_series(
    State(state): State<AppState>,
    Json(input): Json<TimeSeriesRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).cpue_time_series(input).await?;
    respond(&state, &result)
}

/// CPUE of every species, best first
pub async fn cpue_summary(
    State(state): State<AppState>,
    Json(input): Json<SourceRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).cpue_summary(input).await?;
    respond(&state, &result)
}

// ============================================================================
// Length frequency
// ============================================================================

pub async fn length_distribution(
    State(state): State<AppState>,
    Json(input): Json<LengthRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).length_distribution(input).await?;
    respond(&state, &result)
}

pub async fn identify_cohorts(
    State(state): State<AppState>,
    Json(input): Json<LengthRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).cohorts(input).await?;
    respond(&state, &result)
}

pub async fn estimate_growth(
    State(state): State<AppState>,
    Json(input): Json<SpeciesRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).growth(input).await?;
    respond(&state, &result)
}

pub async fn length_weight(
    State(state): State<AppState>,
    Json(input): Json<SpeciesRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).length_weight(input).await?;
    respond(&state, &result)
}

pub async fn maturity_ogive(
    State(state): State<AppState>,
    Json(input): Json<SpeciesRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).maturity_ogive(input).await?;
    respond(&state, &result)
}

/// Distribution, cohorts, growth, length-weight, and ogive in one response
pub async fn length_frequency_extended(
    State(state): State<AppState>,
    Json(input): Json<LengthRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).length_frequency_report(input).await?;
    respond(&state, &result)
}

// ============================================================================
// Stock assessment
// ============================================================================

pub async fn estimate_mortality(
    State(state): State<AppState>,
    Json(input): Json<StockRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).mortality(input).await?;
    respond(&state, &result)
}

pub async fn stock_status(
    State(state): State<AppState>,
    Json(input): Json<StockRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).stock_status(input).await?;
    respond(&state, &result)
}

pub async fn recruitment(
    State(state): State<AppState>,
    Json(input): Json<SpeciesRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).recruitment(input).await?;
    respond(&state, &result)
}

pub async fn stock_summary(
    State(state): State<AppState>,
    Json(input): Json<StockSummaryRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).stock_summary(input).await?;
    respond(&state, &result)
}

// ============================================================================
// Spatial
// ============================================================================

pub async fn spatial_grid(
    State(state): State<AppState>,
    Json(input): Json<SpatialRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).spatial_grid(input).await?;
    respond(&state, &result)
}

pub async fn depth_distribution(
    State(state): State<AppState>,
    Json(input): Json<SpatialRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).depth_distribution(input).await?;
    respond(&state, &result)
}

pub async fn environment_correlation(
    State(state): State<AppState>,
    Json(input): Json<EnvironmentRequest>,
) -> AppResult<Json<Value>> {
    let result = service(&state).environment_correlation(input).await?;
    respond(&state, &result)
}
