//! Length-frequency analysis: distributions, cohorts, growth, and maturity

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stats::{finite, linear_regression, mean, median, std_dev};
use super::{
    bin_index, bin_midpoint, lengths_for_species, require_bin_size, require_species,
    AnalyticsResult, InsufficientData, DEFAULT_BIN_SIZE,
};
use crate::models::LengthRecord;

/// Smallest peak count reported as a cohort
pub const MIN_COHORT_COUNT: usize = 3;

/// Cohorts needed before a growth curve is fitted
pub const MIN_GROWTH_COHORTS: usize = 3;

/// Length-weight pairs needed for the log-linear fit
pub const MIN_LENGTH_WEIGHT_PAIRS: usize = 2;

/// Maturity ogive length-class width in cm
pub const OGIVE_BIN_SIZE: f64 = 5.0;

/// Staged individuals a length class needs to enter the ogive
pub const MIN_OGIVE_COUNT: usize = 3;

/// Multiplier on the largest observed length when L∞ must be assumed
pub const LINF_SAFETY_MARGIN: f64 = 1.05;

/// Tolerance on |b - 3| for isometric growth
const ISOMETRIC_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LengthBin {
    /// Class midpoint
    pub length_class: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LengthDistribution {
    pub species: String,
    pub bin_size: f64,
    /// Populated classes only, ascending
    pub bins: Vec<LengthBin>,
    pub sample_size: usize,
    pub mean_length: f64,
    pub median_length: f64,
    /// Class midpoint with the highest count; the smaller class wins ties
    pub mode: Option<f64>,
    pub standard_deviation: f64,
    pub min_length: f64,
    pub max_length: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cohort {
    pub length_class: f64,
    pub count: usize,
    pub mean_length: f64,
    /// Position among cohorts ordered by length, smallest is 0
    pub relative_age: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GrowthParameters {
    #[serde(rename = "Linf")]
    pub linf: f64,
    #[serde(rename = "K")]
    pub k: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t0: Option<f64>,
    pub r2: f64,
}

impl GrowthParameters {
    /// Expected length at age `t`
    pub fn length_at_age(&self, t: f64) -> f64 {
        self.linf * (1.0 - (-self.k * (t - self.t0.unwrap_or(0.0))).exp())
    }

    /// Inverse von Bertalanffy; `None` at or beyond L∞
    pub fn age_at_length(&self, length: f64) -> Option<f64> {
        if length >= self.linf || self.k <= 0.0 {
            return None;
        }
        finite(self.t0.unwrap_or(0.0) - (1.0 - length / self.linf).ln() / self.k)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GrowthMethod {
    /// Successive mean lengths, L(t+1) regressed on L(t)
    FordWalford,
    /// ln(L∞ - L) regressed on age with an assumed L∞
    LogLinear,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AgeSource {
    Direct,
    Cohort,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrowthEstimate {
    pub parameters: Option<GrowthParameters>,
    pub method: Option<GrowthMethod>,
    pub age_source: Option<AgeSource>,
    pub sample_size: usize,
    pub cohort_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insufficient_data: Option<InsufficientData>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AllometryType {
    Isometric,
    PositiveAllometric,
    NegativeAllometric,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LengthWeightFit {
    pub a: f64,
    pub b: f64,
    pub r2: f64,
    pub growth_type: AllometryType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LengthWeightResult {
    pub species: String,
    pub fit: Option<LengthWeightFit>,
    pub sample_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insufficient_data: Option<InsufficientData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OgivePoint {
    pub length_class: f64,
    pub percent_mature: f64,
    pub mature_count: usize,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaturityOgive {
    pub species: String,
    pub points: Vec<OgivePoint>,
    /// Length at 50 % maturity
    pub l50: Option<f64>,
    /// Individuals with a recorded maturity stage
    pub sample_size: usize,
}

/// Everything the extended length-frequency route reports
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LengthFrequencyReport {
    pub distribution: LengthDistribution,
    pub cohorts: Vec<Cohort>,
    pub growth: GrowthEstimate,
    pub length_weight: LengthWeightResult,
    pub maturity_ogive: MaturityOgive,
}

fn histogram(lengths: &[f64], bin_size: f64) -> AnalyticsResult<BTreeMap<i64, Vec<f64>>> {
    let mut bins: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for &length in lengths {
        bins.entry(bin_index(length, bin_size)?).or_default().push(length);
    }
    Ok(bins)
}

fn usable_lengths<'a>(records: impl IntoIterator<Item = &'a LengthRecord>) -> Vec<f64> {
    records
        .into_iter()
        .map(|r| r.length)
        .filter(|l| l.is_finite())
        .collect()
}

/// Binned length-frequency and descriptive statistics for one species
pub fn calculate_length_distribution(
    records: &[LengthRecord],
    species: &str,
    bin_size: f64,
) -> AnalyticsResult<LengthDistribution> {
    let species = require_species(species)?;
    let bin_size = require_bin_size(bin_size)?;
    let lengths = usable_lengths(lengths_for_species(records, species));

    let bins: Vec<LengthBin> = histogram(&lengths, bin_size)?
        .into_iter()
        .map(|(idx, members)| LengthBin {
            length_class: bin_midpoint(idx, bin_size),
            count: members.len(),
        })
        .collect();

    // max_by would keep the last of equal counts
    let mode = bins
        .iter()
        .fold(None::<&LengthBin>, |best, bin| match best {
            Some(b) if b.count >= bin.count => Some(b),
            _ => Some(bin),
        })
        .map(|b| b.length_class);

    let (min_length, max_length) = if lengths.is_empty() {
        (0.0, 0.0)
    } else {
        (
            lengths.iter().cloned().fold(f64::INFINITY, f64::min),
            lengths.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        )
    };

    Ok(LengthDistribution {
        species: species.to_string(),
        bin_size,
        bins,
        sample_size: lengths.len(),
        mean_length: mean(&lengths),
        median_length: median(&lengths),
        mode,
        standard_deviation: std_dev(&lengths),
        min_length,
        max_length,
    })
}

/// Local maxima of the length histogram with at least [`MIN_COHORT_COUNT`] members.
///
/// Empty classes between populated ones count as zero, so a class at either
/// end only has to exceed its single populated neighbour.
pub fn detect_cohorts(lengths: &[f64], bin_size: f64) -> AnalyticsResult<Vec<Cohort>> {
    let bins = histogram(lengths, bin_size)?;
    let count_at = |idx: Option<i64>| idx.and_then(|i| bins.get(&i)).map_or(0, Vec::len);

    let cohorts = bins
        .iter()
        .filter(|(idx, members)| {
            let count = members.len();
            count >= MIN_COHORT_COUNT
                && count > count_at(idx.checked_sub(1))
                && count > count_at(idx.checked_add(1))
        })
        .enumerate()
        .map(|(relative_age, (&idx, members))| Cohort {
            length_class: bin_midpoint(idx, bin_size),
            count: members.len(),
            mean_length: mean(members),
            relative_age,
        })
        .collect();
    Ok(cohorts)
}

/// Modal cohorts of one species at the default 5 cm class width
pub fn identify_cohorts(records: &[LengthRecord], species: &str) -> AnalyticsResult<Vec<Cohort>> {
    identify_cohorts_with_bin_size(records, species, DEFAULT_BIN_SIZE)
}

pub fn identify_cohorts_with_bin_size(
    records: &[LengthRecord],
    species: &str,
    bin_size: f64,
) -> AnalyticsResult<Vec<Cohort>> {
    let species = require_species(species)?;
    let bin_size = require_bin_size(bin_size)?;
    let lengths = usable_lengths(lengths_for_species(records, species));
    detect_cohorts(&lengths, bin_size)
}

/// Ford-Walford fit over consecutive ages; `None` unless 0 < b < 1
fn ford_walford(points: &[(f64, f64)]) -> Option<GrowthParameters> {
    let (lt, lt1): (Vec<f64>, Vec<f64>) = points
        .windows(2)
        .filter(|w| (w[1].0 - w[0].0 - 1.0).abs() < 1e-9)
        .map(|w| (w[0].1, w[1].1))
        .unzip();
    if lt.len() < 2 {
        return None;
    }

    let fit = linear_regression(&lt, &lt1)?;
    let b = fit.slope;
    if !(b > 0.0 && b < 1.0) || fit.intercept <= 0.0 {
        return None;
    }
    let k = finite(-b.ln())?;
    let linf = finite(fit.intercept / (1.0 - b))?;

    let (t, l) = points[0];
    let t0 = (l < linf)
        .then(|| t + (1.0 - l / linf).ln() / k)
        .and_then(finite);

    Some(GrowthParameters {
        linf,
        k,
        t0,
        r2: fit.r2,
    })
}

/// ln(L∞ - L) against age with L∞ taken from the largest observed length
fn log_linear(points: &[(f64, f64)], max_length: f64) -> Option<GrowthParameters> {
    let linf = max_length * LINF_SAFETY_MARGIN;
    if !(linf > 0.0) {
        return None;
    }
    let (ages, ys): (Vec<f64>, Vec<f64>) = points
        .iter()
        .filter(|(_, l)| *l < linf)
        .map(|&(t, l)| (t, (linf - l).ln()))
        .unzip();

    let fit = linear_regression(&ages, &ys)?;
    let k = -fit.slope;
    if !(k > 0.0) {
        return None;
    }
    let t0 = finite((fit.intercept - linf.ln()) / k);

    Some(GrowthParameters {
        linf,
        k,
        t0,
        r2: fit.r2,
    })
}

fn fit_growth(points: &[(f64, f64)], max_length: f64) -> Option<(GrowthParameters, GrowthMethod)> {
    ford_walford(points)
        .map(|p| (p, GrowthMethod::FordWalford))
        .or_else(|| log_linear(points, max_length).map(|p| (p, GrowthMethod::LogLinear)))
}

/// von Bertalanffy parameters from the records given.
///
/// Directly aged samples are used when they span at least three whole-year
/// ages; otherwise modal cohorts at `bin_size` stand in for annual age
/// classes. The Ford-Walford plot is tried first, then the log-linear fit
/// with an assumed L∞. Too little data yields an estimate without parameters.
pub fn estimate_growth_parameters(
    records: &[LengthRecord],
    bin_size: f64,
) -> AnalyticsResult<GrowthEstimate> {
    let bin_size = require_bin_size(bin_size)?;
    let lengths = usable_lengths(records);
    let sample_size = lengths.len();
    let max_length = lengths.iter().cloned().fold(0.0, f64::max);

    let mut by_age: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for record in records.iter().filter(|r| r.length.is_finite()) {
        if let Some(age) = record.age.filter(|a| a.is_finite() && *a >= 0.0) {
            by_age.entry(age.round() as i64).or_default().push(record.length);
        }
    }

    if by_age.len() >= MIN_GROWTH_COHORTS {
        let points: Vec<(f64, f64)> = by_age
            .iter()
            .map(|(&age, members)| (age as f64, mean(members)))
            .collect();
        if let Some((parameters, method)) = fit_growth(&points, max_length) {
            return Ok(GrowthEstimate {
                parameters: Some(parameters),
                method: Some(method),
                age_source: Some(AgeSource::Direct),
                sample_size,
                cohort_count: points.len(),
                insufficient_data: None,
            });
        }
    }

    let cohorts = detect_cohorts(&lengths, bin_size)?;
    let cohort_count = cohorts.len();
    if cohort_count < MIN_GROWTH_COHORTS {
        return Ok(GrowthEstimate {
            parameters: None,
            method: None,
            age_source: None,
            sample_size,
            cohort_count,
            insufficient_data: Some(InsufficientData::new(
                MIN_GROWTH_COHORTS,
                cohort_count,
                "growth fitting needs at least three modal cohorts or aged samples",
            )),
        });
    }

    let points: Vec<(f64, f64)> = cohorts
        .iter()
        .map(|c| (c.relative_age as f64, c.mean_length))
        .collect();

    let estimate = match fit_growth(&points, max_length) {
        Some((parameters, method)) => GrowthEstimate {
            parameters: Some(parameters),
            method: Some(method),
            age_source: Some(AgeSource::Cohort),
            sample_size,
            cohort_count,
            insufficient_data: None,
        },
        None => GrowthEstimate {
            parameters: None,
            method: None,
            age_source: Some(AgeSource::Cohort),
            sample_size,
            cohort_count,
            insufficient_data: Some(InsufficientData::new(
                MIN_GROWTH_COHORTS,
                cohort_count,
                "cohort mean lengths do not describe a growth curve",
            )),
        },
    };
    Ok(estimate)
}

/// `W = a * L^b` fitted on ln(W) = ln(a) + b ln(L)
pub fn calculate_length_weight(
    records: &[LengthRecord],
    species: &str,
) -> AnalyticsResult<LengthWeightResult> {
    let species = require_species(species)?;

    let (ln_l, ln_w): (Vec<f64>, Vec<f64>) = lengths_for_species(records, species)
        .into_iter()
        .filter_map(|r| {
            let w = r.weight?;
            (r.length > 0.0 && w > 0.0 && r.length.is_finite() && w.is_finite())
                .then(|| (r.length.ln(), w.ln()))
        })
        .unzip();
    let sample_size = ln_l.len();

    let fit = if sample_size >= MIN_LENGTH_WEIGHT_PAIRS {
        linear_regression(&ln_l, &ln_w).and_then(|reg| {
            let a = finite(reg.intercept.exp())?;
            let b = reg.slope;
            let growth_type = if (b - 3.0).abs() <= ISOMETRIC_TOLERANCE {
                AllometryType::Isometric
            } else if b > 3.0 {
                AllometryType::PositiveAllometric
            } else {
                AllometryType::NegativeAllometric
            };
            Some(LengthWeightFit {
                a,
                b,
                r2: reg.r2,
                growth_type,
            })
        })
    } else {
        None
    };

    let insufficient_data = fit.is_none().then(|| {
        InsufficientData::new(
            MIN_LENGTH_WEIGHT_PAIRS,
            sample_size,
            "length-weight fit needs at least two records with distinct lengths and a weight",
        )
    });

    Ok(LengthWeightResult {
        species: species.to_string(),
        fit,
        sample_size,
        insufficient_data,
    })
}

/// Percent mature per 5 cm class; classes with fewer than three staged fish are dropped
pub fn calculate_maturity_ogive(
    records: &[LengthRecord],
    species: &str,
) -> AnalyticsResult<MaturityOgive> {
    let species = require_species(species)?;

    let mut classes: BTreeMap<i64, (usize, usize)> = BTreeMap::new();
    let mut sample_size = 0;
    for record in lengths_for_species(records, species) {
        let Some(mature) = record.is_mature() else {
            continue;
        };
        if !record.length.is_finite() {
            continue;
        }
        sample_size += 1;
        let entry = classes
            .entry(bin_index(record.length, OGIVE_BIN_SIZE)?)
            .or_insert((0, 0));
        entry.1 += 1;
        if mature {
            entry.0 += 1;
        }
    }

    let points: Vec<OgivePoint> = classes
        .into_iter()
        .filter(|(_, (_, total))| *total >= MIN_OGIVE_COUNT)
        .map(|(idx, (mature_count, total_count))| OgivePoint {
            length_class: bin_midpoint(idx, OGIVE_BIN_SIZE),
            percent_mature: (mature_count as f64 / total_count as f64 * 100.0).round(),
            mature_count,
            total_count,
        })
        .collect();

    Ok(MaturityOgive {
        species: species.to_string(),
        l50: length_at_half_maturity(&points),
        points,
        sample_size,
    })
}

/// Interpolate the first crossing of 50 % between adjacent ogive points
pub fn length_at_half_maturity(points: &[OgivePoint]) -> Option<f64> {
    points.windows(2).find_map(|w| {
        let (lo, hi) = (&w[0], &w[1]);
        if lo.percent_mature < 50.0 && hi.percent_mature >= 50.0 {
            let span = hi.percent_mature - lo.percent_mature;
            finite(
                lo.length_class
                    + (50.0 - lo.percent_mature) * (hi.length_class - lo.length_class) / span,
            )
        } else {
            None
        }
    })
}

/// Distribution, cohorts, growth, length-weight, and ogive in one pass
pub fn analyze_length_frequency(
    records: &[LengthRecord],
    species: &str,
    bin_size: f64,
) -> AnalyticsResult<LengthFrequencyReport> {
    let distribution = calculate_length_distribution(records, species, bin_size)?;
    let cohorts = identify_cohorts_with_bin_size(records, species, bin_size)?;
    let filtered: Vec<LengthRecord> = lengths_for_species(records, species)
        .into_iter()
        .cloned()
        .collect();

    Ok(LengthFrequencyReport {
        distribution,
        cohorts,
        growth: estimate_growth_parameters(&filtered, bin_size)?,
        length_weight: calculate_length_weight(records, species)?,
        maturity_ogive: calculate_maturity_ogive(records, species)?,
    })
}
