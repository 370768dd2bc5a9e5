//! PostgreSQL dataset store; records are kept as JSONB arrays

use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{duplicate, DatasetRepository};
use crate::error::{AppError, AppResult};
use crate::models::{CatchRecord, Dataset, DatasetSummary, DatasetType, LengthRecord};

#[derive(Clone)]
pub struct PostgresDatasetRepository {
    db: PgPool,
}

impl PostgresDatasetRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(Debug, FromRow)]
struct DatasetRow {
    id: Uuid,
    name: String,
    dataset_type: String,
    uploaded_by: String,
    created_at: DateTime<Utc>,
    catch_records: Json<Vec<CatchRecord>>,
    length_records: Json<Vec<LengthRecord>>,
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    id: Uuid,
    name: String,
    dataset_type: String,
    uploaded_by: String,
    created_at: DateTime<Utc>,
    catch_record_count: i32,
    length_record_count: i32,
}

fn parse_type(value: &str) -> AppResult<DatasetType> {
    DatasetType::from_str(value)
        .ok_or_else(|| AppError::Internal(format!("Unknown dataset type '{}' in storage", value)))
}

impl TryFrom<DatasetRow> for Dataset {
    type Error = AppError;

    fn try_from(row: DatasetRow) -> AppResult<Self> {
        Ok(Dataset {
            id: row.id,
            name: row.name,
            dataset_type: parse_type(&row.dataset_type)?,
            uploaded_by: row.uploaded_by,
            created_at: row.created_at,
            catch_records: row.catch_records.0,
            length_records: row.length_records.0,
        })
    }
}

impl TryFrom<SummaryRow> for DatasetSummary {
    type Error = AppError;

    fn try_from(row: SummaryRow) -> AppResult<Self> {
        Ok(DatasetSummary {
            id: row.id,
            name: row.name,
            dataset_type: parse_type(&row.dataset_type)?,
            uploaded_by: row.uploaded_by,
            created_at: row.created_at,
            catch_record_count: row.catch_record_count.max(0) as usize,
            length_record_count: row.length_record_count.max(0) as usize,
        })
    }
}

#[axum::async_trait]
impl DatasetRepository for PostgresDatasetRepository {
    async fn list(&self) -> AppResult<Vec<DatasetSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id, name, dataset_type, uploaded_by, created_at,
                   jsonb_array_length(catch_records) AS catch_record_count,
                   jsonb_array_length(length_records) AS length_record_count
            FROM datasets
            ORDER BY created_at DESC, id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(DatasetSummary::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Dataset>> {
        let row = sqlx::query_as::<_, DatasetRow>(
            r#"
            SELECT id, name, dataset_type, uploaded_by, created_at, catch_records, length_records
            FROM datasets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(Dataset::try_from).transpose()
    }

    async fn put(&self, dataset: Dataset) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO datasets (
                id, name, dataset_type, uploaded_by, created_at, catch_records, length_records
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(dataset.id)
        .bind(&dataset.name)
        .bind(dataset.dataset_type.as_str())
        .bind(&dataset.uploaded_by)
        .bind(dataset.created_at)
        .bind(Json(&dataset.catch_records))
        .bind(Json(&dataset.length_records))
        .execute(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(duplicate(dataset.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM datasets WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn is_available(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }
}
