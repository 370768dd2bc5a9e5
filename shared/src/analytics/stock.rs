//! Stock assessment: mortality, exploitation, sustainability, and recruitment

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::cpue::{calculate_cpue, classify_trend, CpueResult, Trend};
use super::length::{
    calculate_maturity_ogive, detect_cohorts, estimate_growth_parameters, GrowthParameters,
};
use super::stats::{finite, linear_regression, mean};
use super::{
    bin_index, catch_for_species, lengths_for_species, require_bin_size, require_species,
    AnalyticsError, AnalyticsResult, InsufficientData, DEFAULT_BIN_SIZE,
};
use crate::models::{CatchRecord, LengthRecord};

/// Mean water temperature (°C) assumed by Pauly's equation when none is given
pub const DEFAULT_TEMPERATURE_C: f64 = 25.0;

/// Length classes on the descending limb needed for a catch curve
pub const MIN_CATCH_CURVE_POINTS: usize = 3;

/// Dated recruits needed before a recruitment pattern is named
pub const MIN_RECRUITMENT_SAMPLES: usize = 5;

/// Recruit share of the length sample that scores a full recruitment index
pub const RECRUIT_BASELINE_FRACTION: f64 = 0.25;

/// Relative CPUE decline at or beyond which biomass counts as depleted
pub const DEPLETION_CHANGE: f64 = -0.3;

/// Exploitation rate bounds for the moderate band
pub const UNDEREXPLOITED_BELOW: f64 = 0.3;
pub const OVEREXPLOITED_ABOVE: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NaturalMortalityMethod {
    #[default]
    Pauly,
    Hoenig,
    Then,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TotalMortalityMethod {
    /// Length-converted catch curve
    CatchCurve,
    /// Beverton-Holt mean-length estimator
    BevertonHolt,
}

/// Caller overrides for [`estimate_mortality`]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MortalityOptions {
    /// Mean water temperature in °C for Pauly's equation
    #[serde(default)]
    pub average_temperature: Option<f64>,
    /// Estimator used as the operative M in F = Z - M
    #[serde(default)]
    pub natural_mortality_method: NaturalMortalityMethod,
    /// Skip the growth fit and use these parameters
    #[serde(default)]
    pub growth_parameters: Option<GrowthParameters>,
    #[serde(default)]
    pub bin_size: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct NaturalMortalityEstimates {
    pub pauly: Option<f64>,
    pub hoenig: Option<f64>,
    pub then: Option<f64>,
}

impl NaturalMortalityEstimates {
    pub fn get(&self, method: NaturalMortalityMethod) -> Option<f64> {
        match method {
            NaturalMortalityMethod::Pauly => self.pauly,
            NaturalMortalityMethod::Hoenig => self.hoenig,
            NaturalMortalityMethod::Then => self.then,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MortalityEstimate {
    pub species: String,
    /// Z
    pub total_mortality: Option<f64>,
    pub total_mortality_method: Option<TotalMortalityMethod>,
    pub natural_mortality_estimates: NaturalMortalityEstimates,
    /// The operative M
    pub natural_mortality: Option<f64>,
    pub operative_method: NaturalMortalityMethod,
    /// F = Z - M, floored at zero
    pub fishing_mortality: Option<f64>,
    /// E = F / Z
    pub exploitation_rate: Option<f64>,
    pub growth: Option<GrowthParameters>,
    pub temperature_used: f64,
    pub sample_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insufficient_data: Option<InsufficientData>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BiomassStatus {
    Healthy,
    Declining,
    Depleted,
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExploitationLevel {
    Underexploited,
    Moderate,
    Overexploited,
    Unknown,
}

/// Signals the sustainability score is built from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SustainabilityInputs {
    pub exploitation_rate: Option<f64>,
    /// Relative CPUE change between halves of the catch series
    pub cpue_change: Option<f64>,
    pub mean_length: Option<f64>,
    /// Length at maturity, the size threshold mean catch length is held to
    pub maturity_length: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockStatus {
    pub biomass_status: BiomassStatus,
    pub exploitation_level: ExploitationLevel,
    /// 0-100
    pub sustainability_score: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockAssessment {
    pub species: String,
    pub cpue: CpueResult,
    pub mortality: MortalityEstimate,
    pub mean_length: Option<f64>,
    pub maturity_length: Option<f64>,
    pub status: StockStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecruitmentPattern {
    Continuous,
    Seasonal,
    Pulsed,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecruitment {
    pub month: u32,
    pub recruits: usize,
    pub catch: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecruitmentAnalysis {
    pub species: String,
    pub pattern: RecruitmentPattern,
    /// 0-1 recruitment strength against [`RECRUIT_BASELINE_FRACTION`]
    pub index: f64,
    pub recruit_length_threshold: Option<f64>,
    pub recruit_count: usize,
    pub sample_size: usize,
    pub monthly: Vec<MonthlyRecruitment>,
    pub peak_recruitment_month: Option<u32>,
    pub peak_catch_month: Option<u32>,
    pub aligned_with_catch_peak: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insufficient_data: Option<InsufficientData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesStockSummary {
    pub species: String,
    pub cpue: f64,
    pub total_catch: f64,
    pub record_count: usize,
    pub trend: Trend,
    pub length_sample_size: usize,
    pub mortality: Option<MortalityEstimate>,
    pub stock_status: Option<StockStatus>,
}

// ============================================================================
// Natural mortality
// ============================================================================

/// Pauly (1980): ln M = -0.0066 - 0.279 ln L∞ + 0.6543 ln K + 0.4634 ln T
pub fn pauly_natural_mortality(linf: f64, k: f64, temperature: f64) -> Option<f64> {
    if linf <= 0.0 || k <= 0.0 || temperature <= 0.0 {
        return None;
    }
    finite((-0.0066 - 0.279 * linf.ln() + 0.6543 * k.ln() + 0.4634 * temperature.ln()).exp())
}

/// Hoenig (1983): ln M = 1.44 - 0.982 ln tmax
pub fn hoenig_natural_mortality(tmax: f64) -> Option<f64> {
    if tmax <= 0.0 {
        return None;
    }
    finite((1.44 - 0.982 * tmax.ln()).exp())
}

/// Then et al. (2015) growth-based: M = 4.118 K^0.73 L∞^-0.33
pub fn then_natural_mortality(linf: f64, k: f64) -> Option<f64> {
    if linf <= 0.0 || k <= 0.0 {
        return None;
    }
    finite(4.118 * k.powf(0.73) * linf.powf(-0.33))
}

/// Longevity as the age at 95 % of L∞, t0 + 3/K
pub fn estimate_max_age(growth: &GrowthParameters) -> Option<f64> {
    if growth.k <= 0.0 {
        return None;
    }
    let span = 3.0 / growth.k;
    let tmax = growth.t0.unwrap_or(0.0) + span;
    finite(if tmax > 0.0 { tmax } else { span })
}

pub fn natural_mortality_estimates(
    growth: &GrowthParameters,
    temperature: f64,
) -> NaturalMortalityEstimates {
    NaturalMortalityEstimates {
        pauly: pauly_natural_mortality(growth.linf, growth.k, temperature),
        hoenig: estimate_max_age(growth).and_then(hoenig_natural_mortality),
        then: then_natural_mortality(growth.linf, growth.k),
    }
}

// ============================================================================
// Total mortality
// ============================================================================

fn class_counts(lengths: &[f64], bin_size: f64) -> AnalyticsResult<BTreeMap<i64, usize>> {
    let mut counts = BTreeMap::new();
    for &l in lengths.iter().filter(|l| l.is_finite()) {
        *counts.entry(bin_index(l, bin_size)?).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Most populated class; the smallest wins a tie
fn modal_class(counts: &BTreeMap<i64, usize>) -> Option<i64> {
    counts
        .iter()
        .fold(None::<(i64, usize)>, |best, (&idx, &n)| match best {
            Some((_, top)) if top >= n => best,
            _ => Some((idx, n)),
        })
        .map(|(idx, _)| idx)
}

/// Length-converted catch curve.
///
/// Each length class right of the modal class is converted to a relative age
/// with the inverse growth curve; ln(N / Δt) regressed on age gives -Z.
pub fn catch_curve_mortality(
    lengths: &[f64],
    growth: &GrowthParameters,
    bin_size: f64,
) -> AnalyticsResult<Option<f64>> {
    let counts = class_counts(lengths, bin_size)?;
    let Some(mode_idx) = modal_class(&counts) else {
        return Ok(None);
    };

    let (ages, ys): (Vec<f64>, Vec<f64>) = counts
        .range((Bound::Excluded(mode_idx), Bound::Unbounded))
        .filter_map(|(&idx, &n)| {
            let lower = idx as f64 * bin_size;
            let upper = lower + bin_size;
            if upper >= growth.linf {
                return None;
            }
            let age = growth.age_at_length(lower + bin_size / 2.0)?;
            let dt = ((growth.linf - lower) / (growth.linf - upper)).ln() / growth.k;
            let y = finite((n as f64 / dt).ln())?;
            Some((age, y))
        })
        .unzip();

    if ages.len() < MIN_CATCH_CURVE_POINTS {
        return Ok(None);
    }
    Ok(linear_regression(&ages, &ys)
        .map(|fit| -fit.slope)
        .filter(|z| *z > 0.0))
}

/// Beverton-Holt: Z = K (L∞ - L̄) / (L̄ - L'), with L' the lower bound of the modal class
pub fn beverton_holt_mortality(
    lengths: &[f64],
    growth: &GrowthParameters,
    bin_size: f64,
) -> AnalyticsResult<Option<f64>> {
    let counts = class_counts(lengths, bin_size)?;
    let Some(mode_idx) = modal_class(&counts) else {
        return Ok(None);
    };
    let l_prime = mode_idx as f64 * bin_size;

    let fully_recruited: Vec<f64> = lengths.iter().cloned().filter(|&l| l >= l_prime).collect();
    if fully_recruited.len() < 2 {
        return Ok(None);
    }
    let l_mean = mean(&fully_recruited);
    if l_mean <= l_prime || l_mean >= growth.linf {
        return Ok(None);
    }
    Ok(finite(growth.k * (growth.linf - l_mean) / (l_mean - l_prime)).filter(|z| *z > 0.0))
}

// ============================================================================
// Mortality and exploitation
// ============================================================================

/// Z, the three M estimators, F, and E for one species.
///
/// Growth parameters come from the options when given, otherwise from the
/// species' length records. Missing growth or too few length classes leaves
/// the dependent fields empty and sets `insufficient_data`.
pub fn estimate_mortality(
    length_records: &[LengthRecord],
    species: &str,
    options: &MortalityOptions,
) -> AnalyticsResult<MortalityEstimate> {
    let species = require_species(species)?;
    let bin_size = require_bin_size(options.bin_size.unwrap_or(DEFAULT_BIN_SIZE))?;
    let temperature = match options.average_temperature {
        Some(t) if !t.is_finite() => {
            return Err(AnalyticsError::InvalidParameter {
                name: "averageTemperature",
                reason: "must be a finite number".to_string(),
            })
        }
        Some(t) => t,
        None => DEFAULT_TEMPERATURE_C,
    };

    let filtered: Vec<LengthRecord> = lengths_for_species(length_records, species)
        .into_iter()
        .cloned()
        .collect();
    let lengths: Vec<f64> = filtered.iter().map(|r| r.length).collect();
    let operative_method = options.natural_mortality_method;

    let mut estimate = MortalityEstimate {
        species: species.to_string(),
        total_mortality: None,
        total_mortality_method: None,
        natural_mortality_estimates: NaturalMortalityEstimates::default(),
        natural_mortality: None,
        operative_method,
        fishing_mortality: None,
        exploitation_rate: None,
        growth: None,
        temperature_used: temperature,
        sample_size: lengths.len(),
        insufficient_data: None,
    };

    let growth = match options.growth_parameters {
        Some(g) => Some(g),
        None => {
            let fitted = estimate_growth_parameters(&filtered, bin_size)?;
            if fitted.parameters.is_none() {
                estimate.insufficient_data = fitted.insufficient_data;
            }
            fitted.parameters
        }
    };
    let Some(growth) = growth else {
        return Ok(estimate);
    };

    estimate.growth = Some(growth);
    estimate.natural_mortality_estimates = natural_mortality_estimates(&growth, temperature);
    estimate.natural_mortality = estimate.natural_mortality_estimates.get(operative_method);

    let total = match catch_curve_mortality(&lengths, &growth, bin_size)? {
        Some(z) => Some((z, TotalMortalityMethod::CatchCurve)),
        None => beverton_holt_mortality(&lengths, &growth, bin_size)?
            .map(|z| (z, TotalMortalityMethod::BevertonHolt)),
    };

    let Some((z, method)) = total else {
        estimate.insufficient_data = Some(InsufficientData::new(
            MIN_CATCH_CURVE_POINTS,
            lengths.len(),
            "total mortality needs length classes beyond the modal class",
        ));
        return Ok(estimate);
    };

    estimate.total_mortality = Some(z);
    estimate.total_mortality_method = Some(method);
    if let Some(m) = estimate.natural_mortality {
        let f = (z - m).max(0.0);
        estimate.fishing_mortality = Some(f);
        estimate.exploitation_rate = Some(if z > 0.0 { f / z } else { 0.0 });
    }

    Ok(estimate)
}

// ============================================================================
// Stock status
// ============================================================================

pub fn classify_exploitation(exploitation_rate: Option<f64>) -> ExploitationLevel {
    match exploitation_rate {
        Some(e) if e < UNDEREXPLOITED_BELOW => ExploitationLevel::Underexploited,
        Some(e) if e <= OVEREXPLOITED_ABOVE => ExploitationLevel::Moderate,
        Some(_) => ExploitationLevel::Overexploited,
        None => ExploitationLevel::Unknown,
    }
}

pub fn classify_biomass(cpue_change: Option<f64>) -> BiomassStatus {
    match cpue_change {
        None => BiomassStatus::Unknown,
        Some(change) => match classify_trend(change) {
            Trend::Increasing | Trend::Stable => BiomassStatus::Healthy,
            Trend::Decreasing if change > DEPLETION_CHANGE => BiomassStatus::Declining,
            Trend::Decreasing => BiomassStatus::Depleted,
        },
    }
}

/// Weighted 0-100 score: exploitation 40, CPUE trend 30, size structure 30.
///
/// Unknown signals score half their weight. Higher exploitation never raises
/// the score; a rising CPUE never lowers it.
pub fn sustainability_score(inputs: &SustainabilityInputs) -> f64 {
    let exploitation = inputs
        .exploitation_rate
        .map_or(20.0, |e| 40.0 * (1.0 - e.clamp(0.0, 1.0)));
    let trend = inputs
        .cpue_change
        .map_or(15.0, |c| 15.0 * (1.0 + c.clamp(-1.0, 1.0)));
    let size = match (inputs.mean_length, inputs.maturity_length) {
        (Some(mean), Some(lm)) if lm > 0.0 => 30.0 * (mean / lm).clamp(0.0, 1.0),
        _ => 15.0,
    };
    (exploitation + trend + size).clamp(0.0, 100.0)
}

/// Status labels, score, and rule-based advice
pub fn classify_stock_status(inputs: &SustainabilityInputs) -> StockStatus {
    let biomass_status = classify_biomass(inputs.cpue_change);
    let exploitation_level = classify_exploitation(inputs.exploitation_rate);
    let mut recommendations = Vec::new();

    match (exploitation_level, inputs.exploitation_rate) {
        (ExploitationLevel::Overexploited, Some(e)) => recommendations.push(format!(
            "Reduce fishing effort: exploitation rate {:.2} exceeds the 0.5 optimum",
            e
        )),
        (ExploitationLevel::Moderate, _) => recommendations
            .push("Hold fishing effort at current levels; exploitation is near the optimum".into()),
        (ExploitationLevel::Underexploited, _) => recommendations.push(
            "Stock is lightly exploited; effort may be raised cautiously under monitoring".into(),
        ),
        _ => recommendations
            .push("Collect more length-frequency samples to estimate fishing mortality".into()),
    }

    match biomass_status {
        BiomassStatus::Depleted => recommendations
            .push("Introduce catch limits or seasonal closures to rebuild the stock".into()),
        BiomassStatus::Declining => recommendations.push(
            "Investigate the declining CPUE trend and consider precautionary catch limits".into(),
        ),
        BiomassStatus::Unknown => recommendations
            .push("Collect catch and effort data over several periods to track abundance".into()),
        BiomassStatus::Healthy => {}
    }

    if let (Some(mean), Some(lm)) = (inputs.mean_length, inputs.maturity_length) {
        if mean < lm {
            recommendations.push(format!(
                "Increase minimum landing size or mesh size: mean catch length {:.1} cm is below length at maturity {:.1} cm",
                mean, lm
            ));
        }
    }

    StockStatus {
        biomass_status,
        exploitation_level,
        sustainability_score: sustainability_score(inputs),
        recommendations,
    }
}

/// Froese & Binohlan (2000): log10 Lm = 0.8979 log10 L∞ - 0.0782
pub fn maturity_length_from_linf(linf: f64) -> Option<f64> {
    if linf <= 0.0 {
        return None;
    }
    finite(10f64.powf(0.8979 * linf.log10() - 0.0782))
}

/// CPUE, mortality, and status of one species
pub fn assess_stock_status(
    catch_records: &[CatchRecord],
    length_records: &[LengthRecord],
    species: &str,
    options: &MortalityOptions,
) -> AnalyticsResult<StockAssessment> {
    let cpue = calculate_cpue(catch_records, species)?;
    let mortality = estimate_mortality(length_records, species, options)?;

    let lengths: Vec<f64> = lengths_for_species(length_records, species)
        .iter()
        .map(|r| r.length)
        .collect();
    let mean_length = (!lengths.is_empty()).then(|| mean(&lengths));
    let maturity_length = calculate_maturity_ogive(length_records, species)?
        .l50
        .or_else(|| {
            mortality
                .growth
                .and_then(|g| maturity_length_from_linf(g.linf))
        });

    let inputs = SustainabilityInputs {
        exploitation_rate: mortality.exploitation_rate,
        cpue_change: (cpue.record_count >= 2).then_some(cpue.trend_change),
        mean_length,
        maturity_length,
    };

    Ok(StockAssessment {
        species: species.to_string(),
        status: classify_stock_status(&inputs),
        cpue,
        mortality,
        mean_length,
        maturity_length,
    })
}

// ============================================================================
// Recruitment
// ============================================================================

fn peak_month<T: PartialOrd + Copy + Default>(values: &[T]) -> Option<u32> {
    let mut best: Option<(usize, T)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v > T::default() && best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    best.map(|(i, _)| i as u32 + 1)
}

/// Recruitment pattern and strength from small fish in the length samples.
///
/// Recruits are fish below the upper bound of the smallest modal cohort (or
/// the lowest quarter of the length range when no cohort stands out). Their
/// month-of-year spread names the pattern: one month holding half of them is
/// pulsed, nine or more months with no three holding half is continuous,
/// anything else is seasonal.
pub fn analyze_recruitment(
    catch_records: &[CatchRecord],
    length_records: &[LengthRecord],
    species: &str,
) -> AnalyticsResult<RecruitmentAnalysis> {
    let species = require_species(species)?;
    let samples: Vec<&LengthRecord> = lengths_for_species(length_records, species)
        .into_iter()
        .filter(|r| r.length.is_finite())
        .collect();
    let lengths: Vec<f64> = samples.iter().map(|r| r.length).collect();

    let mut catch_by_month = [0.0f64; 12];
    for record in catch_for_species(catch_records, species) {
        catch_by_month[record.date.month0() as usize] += record.catch_weight;
    }

    let threshold = detect_cohorts(&lengths, DEFAULT_BIN_SIZE)?
        .first()
        .map(|c| c.length_class + DEFAULT_BIN_SIZE / 2.0)
        .or_else(|| {
            if lengths.is_empty() {
                return None;
            }
            let min = lengths.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = lengths.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            Some(min + 0.25 * (max - min))
        });

    let recruits: Vec<&LengthRecord> = match threshold {
        Some(t) => samples.iter().copied().filter(|r| r.length < t).collect(),
        None => Vec::new(),
    };

    let mut recruits_by_month = [0usize; 12];
    for recruit in &recruits {
        if let Some(date) = recruit.date {
            recruits_by_month[date.month0() as usize] += 1;
        }
    }
    let dated: usize = recruits_by_month.iter().sum();

    let index = if lengths.is_empty() {
        0.0
    } else {
        let fraction = recruits.len() as f64 / lengths.len() as f64;
        (fraction / RECRUIT_BASELINE_FRACTION).clamp(0.0, 1.0)
    };

    let (pattern, insufficient_data) = if dated < MIN_RECRUITMENT_SAMPLES {
        (
            RecruitmentPattern::Unknown,
            Some(InsufficientData::new(
                MIN_RECRUITMENT_SAMPLES,
                dated,
                "recruitment pattern needs dated samples of small fish",
            )),
        )
    } else {
        let mut sorted = recruits_by_month;
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let total = dated as f64;
        let peak_share = sorted[0] as f64 / total;
        let top3_share = sorted[..3].iter().sum::<usize>() as f64 / total;
        let active_months = recruits_by_month.iter().filter(|&&n| n > 0).count();

        let pattern = if peak_share >= 0.5 {
            RecruitmentPattern::Pulsed
        } else if active_months >= 9 && top3_share < 0.5 {
            RecruitmentPattern::Continuous
        } else {
            RecruitmentPattern::Seasonal
        };
        (pattern, None)
    };

    let peak_recruitment_month = peak_month(&recruits_by_month);
    let peak_catch_month = peak_month(&catch_by_month);

    Ok(RecruitmentAnalysis {
        species: species.to_string(),
        pattern,
        index,
        recruit_length_threshold: threshold,
        recruit_count: recruits.len(),
        sample_size: lengths.len(),
        monthly: (0..12)
            .map(|i| MonthlyRecruitment {
                month: i as u32 + 1,
                recruits: recruits_by_month[i],
                catch: catch_by_month[i],
            })
            .collect(),
        peak_recruitment_month,
        peak_catch_month,
        aligned_with_catch_peak: peak_recruitment_month.is_some()
            && peak_recruitment_month == peak_catch_month,
        insufficient_data,
    })
}

// ============================================================================
// Multi-species
// ============================================================================

/// Per-species pipeline over every species in the catch records.
///
/// Species without length samples keep their CPUE row with the mortality and
/// status fields empty.
pub fn get_multi_species_stock_summary(
    catch_records: &[CatchRecord],
    length_records: &[LengthRecord],
    options: &MortalityOptions,
) -> AnalyticsResult<Vec<SpeciesStockSummary>> {
    let species: BTreeSet<&str> = catch_records
        .iter()
        .filter(|r| r.has_species())
        .map(|r| r.species.as_str())
        .collect();

    species
        .into_iter()
        .map(|species| -> AnalyticsResult<SpeciesStockSummary> {
            let length_sample_size = lengths_for_species(length_records, species).len();
            let (cpue, mortality, stock_status) = if length_sample_size == 0 {
                (calculate_cpue(catch_records, species)?, None, None)
            } else {
                let assessment =
                    assess_stock_status(catch_records, length_records, species, options)?;
                (
                    assessment.cpue,
                    Some(assessment.mortality),
                    Some(assessment.status),
                )
            };

            Ok(SpeciesStockSummary {
                species: species.to_string(),
                cpue: cpue.cpue,
                total_catch: cpue.total_catch,
                record_count: cpue.record_count,
                trend: cpue.trend,
                length_sample_size,
                mortality,
                stock_status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn growth() -> GrowthParameters {
        GrowthParameters {
            linf: 100.0,
            k: 0.3,
            t0: Some(0.0),
            r2: 1.0,
        }
    }

    /// Length sample whose descending limb decays at the given Z
    fn catch_curve_sample(z: f64) -> Vec<LengthRecord> {
        let g = growth();
        let mut records = Vec::new();
        let mut peak = 0usize;
        for idx in 8..=13 {
            let lower = idx as f64 * 5.0;
            let mid = lower + 2.5;
            let age = g.age_at_length(mid).unwrap();
            let dt = ((g.linf - lower) / (g.linf - lower - 5.0)).ln() / g.k;
            let n = (20000.0 * dt * (-z * age).exp()).round() as usize;
            peak = peak.max(n);
            records.extend((0..n).map(|_| LengthRecord::new("X", mid)));
        }
        records.extend((0..peak + 500).map(|_| LengthRecord::new("X", 37.5)));
        records.extend((0..200).map(|_| LengthRecord::new("X", 32.5)));
        records
    }

    #[test]
    fn test_pauly_reference_value() {
        // L∞ 100, K 0.3, T 25
        let m = pauly_natural_mortality(100.0, 0.3, 25.0).unwrap();
        assert!((m - 0.5557).abs() < 1e-3);
        assert!(pauly_natural_mortality(100.0, 0.3, 0.0).is_none());
    }

    #[test]
    fn test_hoenig_and_then() {
        assert!((hoenig_natural_mortality(10.0).unwrap() - 0.4399).abs() < 1e-3);
        assert!((then_natural_mortality(100.0, 0.3).unwrap() - 0.3741).abs() < 1e-3);
        assert!(hoenig_natural_mortality(0.0).is_none());
        assert!((estimate_max_age(&growth()).unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_catch_curve_recovers_z() {
        let records = catch_curve_sample(0.8);
        let lengths: Vec<f64> = records.iter().map(|r| r.length).collect();
        let z = catch_curve_mortality(&lengths, &growth(), 5.0).unwrap().unwrap();
        assert!((z - 0.8).abs() < 0.02, "z = {}", z);
    }

    #[test]
    fn test_beverton_holt_when_catch_curve_is_short() {
        // Three equal classes: two beyond the mode is too few for a catch curve
        let mut records = Vec::new();
        for length in [12.0, 22.0, 32.0] {
            records.extend((0..4).map(|_| LengthRecord::new("X", length)));
        }
        let lengths: Vec<f64> = records.iter().map(|r| r.length).collect();
        assert_eq!(catch_curve_mortality(&lengths, &growth(), 5.0), Ok(None));

        let options = MortalityOptions {
            growth_parameters: Some(growth()),
            ..Default::default()
        };
        let estimate = estimate_mortality(&records, "X", &options).unwrap();

        // 0.3 * (100 - 22) / (22 - 10)
        assert_eq!(
            estimate.total_mortality_method,
            Some(TotalMortalityMethod::BevertonHolt)
        );
        assert!((estimate.total_mortality.unwrap() - 1.95).abs() < 1e-9);
        assert!(estimate.fishing_mortality.unwrap() > 0.0);
        assert!(estimate.insufficient_data.is_none());
    }

    #[test]
    fn test_mortality_rejects_bin_size_beyond_index_range() {
        let options = MortalityOptions {
            growth_parameters: Some(growth()),
            bin_size: Some(1e-300),
            ..Default::default()
        };
        let records = vec![LengthRecord::new("X", 10.0); 3];
        assert!(matches!(
            estimate_mortality(&records, "X", &options),
            Err(AnalyticsError::InvalidParameter { name: "binSize", .. })
        ));
    }

    #[test]
    fn test_mortality_with_supplied_growth() {
        let options = MortalityOptions {
            growth_parameters: Some(growth()),
            ..Default::default()
        };
        let estimate = estimate_mortality(&catch_curve_sample(1.2), "X", &options).unwrap();
        let z = estimate.total_mortality.unwrap();
        let m = estimate.natural_mortality.unwrap();
        assert_eq!(estimate.total_mortality_method, Some(TotalMortalityMethod::CatchCurve));
        assert_eq!(estimate.operative_method, NaturalMortalityMethod::Pauly);
        assert_eq!(Some(m), estimate.natural_mortality_estimates.pauly);
        assert!((estimate.fishing_mortality.unwrap() - (z - m)).abs() < 1e-12);
        assert!((estimate.exploitation_rate.unwrap() - (z - m) / z).abs() < 1e-12);
        assert_eq!(estimate.temperature_used, DEFAULT_TEMPERATURE_C);
    }

    #[test]
    fn test_mortality_operative_method_override() {
        let options = MortalityOptions {
            growth_parameters: Some(growth()),
            natural_mortality_method: NaturalMortalityMethod::Then,
            ..Default::default()
        };
        let estimate = estimate_mortality(&catch_curve_sample(1.2), "X", &options).unwrap();
        assert_eq!(estimate.natural_mortality, estimate.natural_mortality_estimates.then);
    }

    #[test]
    fn test_mortality_without_data_is_flagged() {
        let estimate = estimate_mortality(&[], "X", &MortalityOptions::default()).unwrap();
        assert!(estimate.total_mortality.is_none());
        assert!(estimate.exploitation_rate.is_none());
        assert!(estimate.insufficient_data.is_some());
    }

    #[test]
    fn test_mortality_rejects_non_finite_temperature() {
        let options = MortalityOptions {
            average_temperature: Some(f64::NAN),
            ..Default::default()
        };
        assert!(estimate_mortality(&[], "X", &options).is_err());
    }

    #[test]
    fn test_fishing_mortality_floors_at_zero() {
        // Slow decay: Z below Pauly's M for these growth parameters
        let options = MortalityOptions {
            growth_parameters: Some(growth()),
            ..Default::default()
        };
        let estimate = estimate_mortality(&catch_curve_sample(0.3), "X", &options).unwrap();
        assert_eq!(estimate.fishing_mortality, Some(0.0));
        assert_eq!(estimate.exploitation_rate, Some(0.0));
    }

    #[test]
    fn test_exploitation_levels() {
        assert_eq!(classify_exploitation(Some(0.1)), ExploitationLevel::Underexploited);
        assert_eq!(classify_exploitation(Some(0.3)), ExploitationLevel::Moderate);
        assert_eq!(classify_exploitation(Some(0.5)), ExploitationLevel::Moderate);
        assert_eq!(classify_exploitation(Some(0.51)), ExploitationLevel::Overexploited);
        assert_eq!(classify_exploitation(None), ExploitationLevel::Unknown);
    }

    #[test]
    fn test_biomass_status() {
        assert_eq!(classify_biomass(Some(0.2)), BiomassStatus::Healthy);
        assert_eq!(classify_biomass(Some(0.0)), BiomassStatus::Healthy);
        assert_eq!(classify_biomass(Some(-0.2)), BiomassStatus::Declining);
        assert_eq!(classify_biomass(Some(-0.4)), BiomassStatus::Depleted);
        assert_eq!(classify_biomass(None), BiomassStatus::Unknown);
    }

    #[test]
    fn test_overexploited_stock_gets_effort_advice() {
        let status = classify_stock_status(&SustainabilityInputs {
            exploitation_rate: Some(0.7),
            cpue_change: Some(-0.5),
            mean_length: Some(20.0),
            maturity_length: Some(30.0),
        });
        assert_eq!(status.exploitation_level, ExploitationLevel::Overexploited);
        assert_eq!(status.biomass_status, BiomassStatus::Depleted);
        assert!(status.recommendations[0].starts_with("Reduce fishing effort"));
        assert!(status
            .recommendations
            .iter()
            .any(|r| r.starts_with("Increase minimum landing size")));
        // 40*0.3 + 15*0.5 + 30*(2/3)
        assert!((status.sustainability_score - 39.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_bounds() {
        let best = sustainability_score(&SustainabilityInputs {
            exploitation_rate: Some(0.0),
            cpue_change: Some(3.0),
            mean_length: Some(50.0),
            maturity_length: Some(30.0),
        });
        assert_eq!(best, 100.0);
        assert_eq!(sustainability_score(&SustainabilityInputs::default()), 50.0);
    }

    #[test]
    fn test_maturity_length_proxy() {
        let lm = maturity_length_from_linf(100.0).unwrap();
        assert!((lm - 52.2).abs() < 0.1);
    }

    #[test]
    fn test_recruitment_pulsed() {
        let date = |m: u32| NaiveDate::from_ymd_opt(2024, m, 10).unwrap();
        let mut lengths = Vec::new();
        // Small fish: six in March, two in June
        for _ in 0..6 {
            lengths.push(LengthRecord::new("X", 11.0).with_date(date(3)));
        }
        for _ in 0..2 {
            lengths.push(LengthRecord::new("X", 12.0).with_date(date(6)));
        }
        for _ in 0..8 {
            lengths.push(LengthRecord::new("X", 31.0).with_date(date(9)));
        }
        let catches = vec![
            CatchRecord::new(date(3), "X", 900.0),
            CatchRecord::new(date(9), "X", 100.0),
        ];

        let analysis = analyze_recruitment(&catches, &lengths, "X").unwrap();
        assert_eq!(analysis.recruit_length_threshold, Some(15.0));
        assert_eq!(analysis.recruit_count, 8);
        assert_eq!(analysis.pattern, RecruitmentPattern::Pulsed);
        assert_eq!(analysis.index, 1.0);
        assert_eq!(analysis.peak_recruitment_month, Some(3));
        assert_eq!(analysis.peak_catch_month, Some(3));
        assert!(analysis.aligned_with_catch_peak);
        assert_eq!(analysis.monthly.len(), 12);
    }

    #[test]
    fn test_recruitment_continuous() {
        let mut lengths = Vec::new();
        for m in 1..=12 {
            let date = NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
            lengths.push(LengthRecord::new("X", 10.0).with_date(date));
            lengths.push(LengthRecord::new("X", 11.0).with_date(date));
            for _ in 0..6 {
                lengths.push(LengthRecord::new("X", 40.0).with_date(date));
            }
        }
        let analysis = analyze_recruitment(&[], &lengths, "X").unwrap();
        assert_eq!(analysis.pattern, RecruitmentPattern::Continuous);
        assert_eq!(analysis.recruit_count, 24);
        assert_eq!(analysis.index, 1.0);
        assert_eq!(analysis.peak_catch_month, None);
        assert!(!analysis.aligned_with_catch_peak);
    }

    #[test]
    fn test_recruitment_without_dates_is_unknown() {
        let lengths: Vec<LengthRecord> =
            (0..10).map(|i| LengthRecord::new("X", 10.0 + i as f64)).collect();
        let analysis = analyze_recruitment(&[], &lengths, "X").unwrap();
        assert_eq!(analysis.pattern, RecruitmentPattern::Unknown);
        assert!(analysis.insufficient_data.is_some());
    }

    #[test]
    fn test_multi_species_tolerates_missing_lengths() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let catches = vec![
            CatchRecord::new(date, "A", 100.0).with_effort(10.0),
            CatchRecord::new(date, "B", 50.0).with_effort(5.0),
        ];
        let lengths = catch_curve_sample(0.8)
            .into_iter()
            .map(|mut r| {
                r.species = "A".to_string();
                r
            })
            .collect::<Vec<_>>();
        let options = MortalityOptions {
            growth_parameters: Some(growth()),
            ..Default::default()
        };

        let summary = get_multi_species_stock_summary(&catches, &lengths, &options).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].species, "A");
        assert!(summary[0].mortality.is_some());
        assert!(summary[0].stock_status.is_some());
        assert_eq!(summary[1].species, "B");
        assert_eq!(summary[1].cpue, 10.0);
        assert!(summary[1].mortality.is_none());
        assert!(summary[1].stock_status.is_none());
    }
}
