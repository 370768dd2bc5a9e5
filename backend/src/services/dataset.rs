//! Dataset management service

use std::sync::Arc;

use serde::Deserialize;
use shared::types::{PaginatedResponse, Pagination};
use shared::validation::{
    validate_all, validate_catch_record, validate_dataset_contents, validate_dataset_name,
    validate_length_record,
};
use uuid::Uuid;

use super::import::{parse_catch_csv, parse_length_csv};
use crate::error::{AppError, AppResult};
use crate::models::{CatchRecord, Dataset, DatasetSummary, DatasetType, LengthRecord};
use crate::repository::DatasetRepository;

const ANONYMOUS_UPLOADER: &str = "anonymous";

/// Input for creating a dataset from JSON
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDatasetInput {
    pub name: String,
    pub dataset_type: DatasetType,
    pub uploaded_by: Option<String>,
    #[serde(default)]
    pub catch_records: Vec<CatchRecord>,
    #[serde(default)]
    pub length_records: Vec<LengthRecord>,
}

/// Query parameters of a CSV import
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDatasetQuery {
    pub name: String,
    pub dataset_type: DatasetType,
    pub uploaded_by: Option<String>,
}

#[derive(Clone)]
pub struct DatasetService {
    repo: Arc<dyn DatasetRepository>,
}

impl DatasetService {
    pub fn new(repo: Arc<dyn DatasetRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(
        &self,
        pagination: &Pagination,
    ) -> AppResult<PaginatedResponse<DatasetSummary>> {
        let summaries = self.repo.list().await?;
        Ok(PaginatedResponse::from_items(summaries, pagination))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Dataset> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Dataset".to_string()))
    }

    pub async fn create(&self, input: CreateDatasetInput) -> AppResult<DatasetSummary> {
        validate_all(&input.catch_records, validate_catch_record).map_err(|(i, e)| {
            AppError::validation(format!("catchRecords[{}]", i), e)
        })?;
        validate_all(&input.length_records, validate_length_record).map_err(|(i, e)| {
            AppError::validation(format!("lengthRecords[{}]", i), e)
        })?;

        self.store(
            &input.name,
            input.dataset_type,
            input.uploaded_by,
            input.catch_records,
            input.length_records,
        )
        .await
    }

    pub async fn import_csv(
        &self,
        query: ImportDatasetQuery,
        body: &str,
    ) -> AppResult<DatasetSummary> {
        let (catch_records, length_records) = match query.dataset_type {
            DatasetType::Catch => (parse_catch_csv(body)?, Vec::new()),
            DatasetType::Length => (Vec::new(), parse_length_csv(body)?),
            DatasetType::Mixed => {
                return Err(AppError::validation(
                    "datasetType",
                    "CSV import takes one record kind: catch or length",
                ))
            }
        };

        self.store(
            &query.name,
            query.dataset_type,
            query.uploaded_by,
            catch_records,
            length_records,
        )
        .await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("Dataset".to_string()))
        }
    }

    async fn store(
        &self,
        name: &str,
        dataset_type: DatasetType,
        uploaded_by: Option<String>,
        catch_records: Vec<CatchRecord>,
        length_records: Vec<LengthRecord>,
    ) -> AppResult<DatasetSummary> {
        validate_dataset_name(name).map_err(|e| AppError::validation("name", e))?;
        validate_dataset_contents(dataset_type, catch_records.len(), length_records.len())
            .map_err(|e| AppError::validation("datasetType", e))?;

        let uploaded_by = uploaded_by
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| ANONYMOUS_UPLOADER.to_string());

        let dataset = Dataset::new(
            name.trim(),
            dataset_type,
            uploaded_by,
            catch_records,
            length_records,
        );
        let summary = dataset.summary();
        let record_count = dataset.record_count();
        self.repo.put(dataset).await?;

        tracing::info!(
            dataset_id = %summary.id,
            dataset_type = %summary.dataset_type,
            records = record_count,
            "Dataset stored"
        );
        Ok(summary)
    }
}
