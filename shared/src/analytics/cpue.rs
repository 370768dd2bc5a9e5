//! Catch-per-unit-effort analysis

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::stats::{finite, mean, sample_std_dev};
use super::{catch_for_species, require_species, AnalyticsResult};
use crate::models::CatchRecord;
use crate::types::Period;

/// Relative change between halves that counts as a trend
pub const TREND_THRESHOLD: f64 = 0.10;

/// z-value of a two-sided 95 % interval
const Z_95: f64 = 1.96;

/// Direction of CPUE over the observation window
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trend::Increasing => write!(f, "increasing"),
            Trend::Decreasing => write!(f, "decreasing"),
            Trend::Stable => write!(f, "stable"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Aggregate CPUE of one species
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CpueResult {
    pub species: String,
    pub cpue: f64,
    pub total_catch: f64,
    pub total_effort: f64,
    pub record_count: usize,
    pub trend: Trend,
    /// Relative change of mean CPUE from the first to the second half
    pub trend_change: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence95: Option<ConfidenceInterval>,
}

/// One time-series bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// `YYYY-MM` or `YYYY`
    pub period: String,
    pub cpue: f64,
    pub catch: f64,
    pub effort: f64,
    pub sample_size: usize,
}

/// Dashboard row for one species
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesCpue {
    pub species: String,
    pub cpue: f64,
    pub total_catch: f64,
    pub record_count: usize,
}

/// Total catch over total effort, 0 when there is no effort
fn ratio(total_catch: f64, total_effort: f64) -> f64 {
    if total_effort > 0.0 {
        finite(total_catch / total_effort).unwrap_or(0.0)
    } else {
        0.0
    }
}

/// Classify a relative change against [`TREND_THRESHOLD`]
pub fn classify_trend(change: f64) -> Trend {
    if change > TREND_THRESHOLD {
        Trend::Increasing
    } else if change < -TREND_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Compare mean per-record CPUE of the chronological halves
fn half_change(chronological: &[&CatchRecord]) -> f64 {
    if chronological.len() < 2 {
        return 0.0;
    }
    let split = chronological.len() / 2;
    let first: Vec<f64> = chronological[..split].iter().map(|r| r.cpue()).collect();
    let second: Vec<f64> = chronological[split..].iter().map(|r| r.cpue()).collect();
    let (first_mean, second_mean) = (mean(&first), mean(&second));

    if first_mean > 0.0 {
        finite((second_mean - first_mean) / first_mean).unwrap_or(0.0)
    } else if second_mean > 0.0 {
        // Any catch after an empty first half is growth
        1.0
    } else {
        0.0
    }
}

/// CPUE, trend, and 95 % interval for one species.
///
/// Zero or missing effort counts as one unit. The interval is centred on the
/// aggregate CPUE with the standard error of per-record CPUE and is omitted
/// below two records.
pub fn calculate_cpue(records: &[CatchRecord], species: &str) -> AnalyticsResult<CpueResult> {
    let species = require_species(species)?;
    let mut filtered = catch_for_species(records, species);
    filtered.sort_by_key(|r| r.date);

    let total_catch: f64 = filtered.iter().map(|r| r.catch_weight).sum();
    let total_effort: f64 = filtered.iter().map(|r| r.effective_effort()).sum();
    let cpue = ratio(total_catch, total_effort);

    let trend_change = half_change(&filtered);

    let confidence95 = if filtered.len() >= 2 {
        let per_record: Vec<f64> = filtered.iter().map(|r| r.cpue()).collect();
        let standard_error = sample_std_dev(&per_record) / (per_record.len() as f64).sqrt();
        finite(standard_error).map(|se| ConfidenceInterval {
            lower: (cpue - Z_95 * se).max(0.0),
            upper: cpue + Z_95 * se,
        })
    } else {
        None
    };

    Ok(CpueResult {
        species: species.to_string(),
        cpue,
        total_catch,
        total_effort,
        record_count: filtered.len(),
        trend: classify_trend(trend_change),
        trend_change,
        confidence95,
    })
}

/// CPUE per monthly or yearly bucket, ascending by bucket key
pub fn calculate_cpue_time_series(
    records: &[CatchRecord],
    species: &str,
    period: Period,
) -> AnalyticsResult<Vec<TimeSeriesPoint>> {
    let species = require_species(species)?;

    let mut buckets: BTreeMap<String, (f64, f64, usize)> = BTreeMap::new();
    for record in catch_for_species(records, species) {
        let bucket = buckets
            .entry(period.bucket_key(record.date))
            .or_insert((0.0, 0.0, 0));
        bucket.0 += record.catch_weight;
        bucket.1 += record.effective_effort();
        bucket.2 += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|(period, (catch, effort, sample_size))| TimeSeriesPoint {
            period,
            cpue: ratio(catch, effort),
            catch,
            effort,
            sample_size,
        })
        .collect())
}

/// One row per distinct species, best CPUE first; blank species are skipped
pub fn get_cpue_summary(records: &[CatchRecord]) -> Vec<SpeciesCpue> {
    let mut by_species: HashMap<&str, (f64, f64, usize)> = HashMap::new();
    for record in records.iter().filter(|r| r.has_species()) {
        let entry = by_species
            .entry(record.species.as_str())
            .or_insert((0.0, 0.0, 0));
        entry.0 += record.catch_weight;
        entry.1 += record.effective_effort();
        entry.2 += 1;
    }

    let mut summary: Vec<SpeciesCpue> = by_species
        .into_iter()
        .map(|(species, (total_catch, total_effort, record_count))| SpeciesCpue {
            species: species.to_string(),
            cpue: ratio(total_catch, total_effort),
            total_catch,
            record_count,
        })
        .collect();

    summary.sort_by(|a, b| {
        b.cpue
            .total_cmp(&a.cpue)
            .then_with(|| a.species.cmp(&b.species))
    });
    summary
}
