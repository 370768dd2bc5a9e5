//! Catch and effort records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{calendar_date, Location};

/// A single landing with its fishing effort
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatchRecord {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub species: String,
    /// Landed weight in kg
    pub catch_weight: f64,
    /// Effort units; treated as 1 when absent or zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl CatchRecord {
    pub fn new(date: NaiveDate, species: impl Into<String>, catch_weight: f64) -> Self {
        Self {
            date,
            species: species.into(),
            catch_weight,
            effort: None,
            location: None,
        }
    }

    pub fn with_effort(mut self, effort: f64) -> Self {
        self.effort = Some(effort);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Effort used as a divisor: the recorded effort when positive, otherwise 1
    pub fn effective_effort(&self) -> f64 {
        match self.effort {
            Some(e) if e.is_finite() && e > 0.0 => e,
            _ => 1.0,
        }
    }

    /// Catch per unit effort of this record alone
    pub fn cpue(&self) -> f64 {
        self.catch_weight / self.effective_effort()
    }

    /// Whether the record names a species at all
    pub fn has_species(&self) -> bool {
        !self.species.trim().is_empty()
    }

    pub fn depth(&self) -> Option<f64> {
        self.location.and_then(|l| l.depth)
    }
}
