//! Process-local dataset store

use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::{duplicate, DatasetRepository};
use crate::error::AppResult;
use crate::models::{Dataset, DatasetSummary};

/// Datasets held in memory for the life of the process
#[derive(Default)]
pub struct MemoryDatasetRepository {
    datasets: RwLock<HashMap<Uuid, Dataset>>,
}

impl MemoryDatasetRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[axum::async_trait]
impl DatasetRepository for MemoryDatasetRepository {
    async fn list(&self) -> AppResult<Vec<DatasetSummary>> {
        let datasets = self.datasets.read().await;
        let mut summaries: Vec<DatasetSummary> = datasets.values().map(Dataset::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(summaries)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Dataset>> {
        Ok(self.datasets.read().await.get(&id).cloned())
    }

    async fn put(&self, dataset: Dataset) -> AppResult<()> {
        let mut datasets = self.datasets.write().await;
        if datasets.contains_key(&dataset.id) {
            return Err(duplicate(dataset.id));
        }
        datasets.insert(dataset.id, dataset);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.datasets.write().await.remove(&id).is_some())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
