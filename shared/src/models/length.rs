//! Length-frequency sample records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::optional_calendar_date;

/// Maturity stages counted as mature in the ogive
pub const MATURE_STAGES: &[&str] = &["mature", "spawning", "spent", "maturing"];

/// A single measured individual
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LengthRecord {
    pub species: String,
    /// Total length in cm
    pub length: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Free-text gonad stage, e.g. "immature", "spawning"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturity: Option<String>,
    #[serde(
        default,
        with = "optional_calendar_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    /// Age in years when the sample was aged directly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
}

impl LengthRecord {
    pub fn new(species: impl Into<String>, length: f64) -> Self {
        Self {
            species: species.into(),
            length,
            weight: None,
            maturity: None,
            date: None,
            age: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_maturity(mut self, maturity: impl Into<String>) -> Self {
        self.maturity = Some(maturity.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    /// `Some(true)` for mature stages, `Some(false)` for any other recorded stage
    pub fn is_mature(&self) -> Option<bool> {
        let stage = self.maturity.as_deref()?.trim();
        if stage.is_empty() {
            return None;
        }
        let stage = stage.to_lowercase();
        Some(MATURE_STAGES.contains(&stage.as_str()))
    }
}
