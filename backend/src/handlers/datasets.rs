//! HTTP handlers for dataset management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use shared::types::{PaginatedResponse, Pagination};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Dataset, DatasetSummary};
use crate::services::dataset::{CreateDatasetInput, DatasetService, ImportDatasetQuery};
use crate::AppState;

/// List dataset summaries, newest first
pub async fn list_datasets(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<DatasetSummary>>> {
    let service = DatasetService::new(state.datasets);
    Ok(Json(service.list(&pagination).await?))
}

/// Create a dataset from a JSON body
pub async fn create_dataset(
    State(state): State<AppState>,
    Json(input): Json<CreateDatasetInput>,
) -> AppResult<(StatusCode, Json<DatasetSummary>)> {
    let service = DatasetService::new(state.datasets);
    let summary = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Create a dataset from a CSV body
pub async fn import_dataset(
    State(state): State<AppState>,
    Query(query): Query<ImportDatasetQuery>,
    body: String,
) -> AppResult<(StatusCode, Json<DatasetSummary>)> {
    tracing::debug!(bytes = body.len(), dataset_type = %query.dataset_type, "CSV import");
    let service = DatasetService::new(state.datasets);
    let summary = service.import_csv(query, &body).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Get a dataset with its records
pub async fn get_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> AppResult<Json<Dataset>> {
    let service = DatasetService::new(state.datasets);
    Ok(Json(service.get(dataset_id).await?))
}

/// Delete a dataset and its records
pub async fn delete_dataset(
    State(state): State<AppState>,
    Path(dataset_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = DatasetService::new(state.datasets);
    service.delete(dataset_id).await?;
    tracing::info!(dataset_id = %dataset_id, "Dataset deleted");
    Ok(StatusCode::NO_CONTENT)
}
