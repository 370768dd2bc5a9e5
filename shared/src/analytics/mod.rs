//! Fisheries stock-assessment analytics
//!
//! Every function here is pure: it reads the records it is given and returns a
//! fresh, serialisable result. Estimators that lack data report an
//! [`InsufficientData`] marker rather than failing.

pub mod cpue;
pub mod length;
pub mod spatial;
pub mod stats;
pub mod stock;

pub use cpue::*;
pub use length::*;
pub use spatial::*;
pub use stock::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CatchRecord, LengthRecord};

/// Default length-class width in cm
pub const DEFAULT_BIN_SIZE: f64 = 5.0;

/// Caller errors raised by the analytics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("species is required")]
    MissingSpecies,

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Why an estimator produced no value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientData {
    pub required: usize,
    pub available: usize,
    pub reason: String,
}

impl InsufficientData {
    pub fn new(required: usize, available: usize, reason: impl Into<String>) -> Self {
        Self {
            required,
            available,
            reason: reason.into(),
        }
    }
}

pub(crate) fn require_species(species: &str) -> AnalyticsResult<&str> {
    if species.trim().is_empty() {
        Err(AnalyticsError::MissingSpecies)
    } else {
        Ok(species)
    }
}

pub(crate) fn require_bin_size(bin_size: f64) -> AnalyticsResult<f64> {
    if bin_size.is_finite() && bin_size > 0.0 {
        Ok(bin_size)
    } else {
        Err(AnalyticsError::InvalidParameter {
            name: "binSize",
            reason: format!("must be a positive number, got {}", bin_size),
        })
    }
}

/// Catch records of one species; exact, case-sensitive match
pub fn catch_for_species<'a>(records: &'a [CatchRecord], species: &str) -> Vec<&'a CatchRecord> {
    records.iter().filter(|r| r.species == species).collect()
}

/// Length records of one species; exact, case-sensitive match
pub fn lengths_for_species<'a>(
    records: &'a [LengthRecord],
    species: &str,
) -> Vec<&'a LengthRecord> {
    records.iter().filter(|r| r.species == species).collect()
}

/// Largest class index a histogram may hold
const MAX_CLASS_INDEX: f64 = 1e15;

/// Index of the length class holding `length`.
///
/// A bin size so small that the index leaves the representable range is
/// rejected rather than saturated.
pub(crate) fn bin_index(length: f64, bin_size: f64) -> AnalyticsResult<i64> {
    let idx = (length / bin_size).floor();
    if idx.is_finite() && idx.abs() <= MAX_CLASS_INDEX {
        Ok(idx as i64)
    } else {
        Err(AnalyticsError::InvalidParameter {
            name: "binSize",
            reason: format!("{} is too small for a length of {}", bin_size, length),
        })
    }
}

/// Midpoint label of a length class
pub(crate) fn bin_midpoint(index: i64, bin_size: f64) -> f64 {
    index as f64 * bin_size + bin_size / 2.0
}
