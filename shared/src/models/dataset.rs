//! Uploaded datasets, the unit of storage and deletion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CatchRecord, LengthRecord};

/// Kind of records a dataset holds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatasetType {
    Catch,
    Length,
    Mixed,
}

impl DatasetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetType::Catch => "catch",
            DatasetType::Length => "length",
            DatasetType::Mixed => "mixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "catch" => Some(DatasetType::Catch),
            "length" => Some(DatasetType::Length),
            "mixed" => Some(DatasetType::Mixed),
            _ => None,
        }
    }
}

impl std::fmt::Display for DatasetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named collection of records; owns its records exclusively
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: Uuid,
    pub name: String,
    pub dataset_type: DatasetType,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub catch_records: Vec<CatchRecord>,
    #[serde(default)]
    pub length_records: Vec<LengthRecord>,
}

impl Dataset {
    pub fn new(
        name: impl Into<String>,
        dataset_type: DatasetType,
        uploaded_by: impl Into<String>,
        catch_records: Vec<CatchRecord>,
        length_records: Vec<LengthRecord>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            dataset_type,
            uploaded_by: uploaded_by.into(),
            created_at: Utc::now(),
            catch_records,
            length_records,
        }
    }

    pub fn record_count(&self) -> usize {
        self.catch_records.len() + self.length_records.len()
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            id: self.id,
            name: self.name.clone(),
            dataset_type: self.dataset_type,
            uploaded_by: self.uploaded_by.clone(),
            created_at: self.created_at,
            catch_record_count: self.catch_records.len(),
            length_record_count: self.length_records.len(),
        }
    }
}

/// Listing view of a dataset without its records
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: Uuid,
    pub name: String,
    pub dataset_type: DatasetType,
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
    pub catch_record_count: usize,
    pub length_record_count: usize,
}
