//! Spatial, depth, and environmental aggregation of catch records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::stats::{finite, mean, pearson_correlation};
use super::{require_species, AnalyticsResult};
use crate::models::{CatchRecord, EnvironmentalPoint};
use crate::types::Location;
use crate::validation::MAX_DEPTH_M;

/// Grid cell edge in degrees
pub const GRID_RESOLUTION: f64 = 0.1;

/// Depth class width in metres
pub const DEPTH_BIN_SIZE: f64 = 25.0;

/// Environmental points further than this (degrees) are not matched
pub const MAX_MATCH_DISTANCE: f64 = 0.5;

/// Matched pairs needed before a correlation is reported
pub const MIN_CORRELATION_PAIRS: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridCell {
    pub lat: f64,
    pub lon: f64,
    pub cpue: f64,
    pub total_catch: f64,
    pub total_effort: f64,
    pub sample_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_depth: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    pub center_lat: f64,
    pub center_lon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpatialGrid {
    pub cells: Vec<GridCell>,
    pub bounds: Option<GridBounds>,
    pub resolution: f64,
    /// Records that carried a usable location
    pub record_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepthBin {
    pub depth_from: f64,
    pub depth_to: f64,
    pub total_catch: f64,
    pub count: usize,
    pub avg_catch: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DepthRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepthDistribution {
    pub bins: Vec<DepthBin>,
    pub total_samples: usize,
    pub depth_range: Option<DepthRange>,
    pub peak_bin: Option<DepthBin>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPoint {
    pub lat: f64,
    pub lon: f64,
    pub cpue: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sst: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chla: Option<f64>,
    pub distance: f64,
}

/// `None` is reported as `null` when too few pairs were matched
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Correlations {
    pub cpue_sst: Option<f64>,
    pub cpue_chla: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentCorrelation {
    pub matched_points: Vec<MatchedPoint>,
    pub matched_count: usize,
    pub correlations: Correlations,
}

fn usable_location(record: &CatchRecord) -> Option<Location> {
    record
        .location
        .filter(|l| l.lat.is_finite() && l.lon.is_finite())
}

fn species_filter<'a>(
    records: &'a [CatchRecord],
    species: Option<&str>,
) -> AnalyticsResult<Vec<&'a CatchRecord>> {
    match species {
        Some(species) => {
            let species = require_species(species)?;
            Ok(records.iter().filter(|r| r.species == species).collect())
        }
        None => Ok(records.iter().collect()),
    }
}

fn cell_key(coordinate: f64) -> i64 {
    (coordinate / GRID_RESOLUTION).round() as i64
}

#[derive(Default)]
struct CellAccumulator {
    catch: f64,
    effort: f64,
    count: usize,
    depths: Vec<f64>,
}

/// Catch and CPUE on a 0.1° grid, optionally for one species.
///
/// Records without a location are skipped. Cells come back ordered by
/// latitude, then longitude; the bounds span the populated cell centres.
pub fn spatial_cpue_grid(
    records: &[CatchRecord],
    species: Option<&str>,
) -> AnalyticsResult<SpatialGrid> {
    let mut cells: BTreeMap<(i64, i64), CellAccumulator> = BTreeMap::new();
    let mut record_count = 0;

    for record in species_filter(records, species)? {
        let Some(location) = usable_location(record) else {
            continue;
        };
        record_count += 1;
        let cell = cells
            .entry((cell_key(location.lat), cell_key(location.lon)))
            .or_default();
        cell.catch += record.catch_weight;
        cell.effort += record.effective_effort();
        cell.count += 1;
        if let Some(depth) = record.depth().filter(|d| d.is_finite()) {
            cell.depths.push(depth);
        }
    }

    let cells: Vec<GridCell> = cells
        .into_iter()
        .map(|((lat_key, lon_key), acc)| GridCell {
            lat: lat_key as f64 * GRID_RESOLUTION,
            lon: lon_key as f64 * GRID_RESOLUTION,
            cpue: if acc.effort > 0.0 {
                finite(acc.catch / acc.effort).unwrap_or(0.0)
            } else {
                0.0
            },
            total_catch: acc.catch,
            total_effort: acc.effort,
            sample_count: acc.count,
            avg_depth: (!acc.depths.is_empty()).then(|| mean(&acc.depths)),
        })
        .collect();

    let bounds = (!cells.is_empty()).then(|| {
        let lats = cells.iter().map(|c| c.lat);
        let lons = cells.iter().map(|c| c.lon);
        let min_lat = lats.clone().fold(f64::INFINITY, f64::min);
        let max_lat = lats.fold(f64::NEG_INFINITY, f64::max);
        let min_lon = lons.clone().fold(f64::INFINITY, f64::min);
        let max_lon = lons.fold(f64::NEG_INFINITY, f64::max);
        GridBounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            center_lat: (min_lat + max_lat) / 2.0,
            center_lon: (min_lon + max_lon) / 2.0,
        }
    });

    Ok(SpatialGrid {
        cells,
        bounds,
        resolution: GRID_RESOLUTION,
        record_count,
    })
}

/// Catch by 25 m depth class over depths from 0 to [`MAX_DEPTH_M`]; records
/// outside that range or without a depth are ignored
pub fn depth_distribution(
    records: &[CatchRecord],
    species: Option<&str>,
) -> AnalyticsResult<DepthDistribution> {
    let mut bins: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    let mut depths = Vec::new();

    for record in species_filter(records, species)? {
        let Some(depth) = record.depth().filter(|d| (0.0..=MAX_DEPTH_M).contains(d)) else {
            continue;
        };
        depths.push(depth);
        let bin = bins
            .entry((depth / DEPTH_BIN_SIZE).floor() as i64)
            .or_insert((0.0, 0));
        bin.0 += record.catch_weight;
        bin.1 += 1;
    }

    let bins: Vec<DepthBin> = bins
        .into_iter()
        .map(|(idx, (total_catch, count))| DepthBin {
            depth_from: idx as f64 * DEPTH_BIN_SIZE,
            depth_to: (idx + 1) as f64 * DEPTH_BIN_SIZE,
            total_catch,
            count,
            avg_catch: total_catch / count as f64,
        })
        .collect();

    // shallowest bin wins a tie
    let peak_bin = bins
        .iter()
        .fold(None::<&DepthBin>, |best, bin| match best {
            Some(b) if b.total_catch >= bin.total_catch => best,
            _ => Some(bin),
        })
        .cloned();

    let depth_range = (!depths.is_empty()).then(|| DepthRange {
        min: depths.iter().cloned().fold(f64::INFINITY, f64::min),
        max: depths.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    });

    Ok(DepthDistribution {
        total_samples: depths.len(),
        bins,
        depth_range,
        peak_bin,
    })
}

fn nearest_point<'a>(
    location: &Location,
    points: &'a [EnvironmentalPoint],
) -> Option<(&'a EnvironmentalPoint, f64)> {
    points
        .iter()
        .filter(|p| p.lat.is_finite() && p.lon.is_finite())
        .map(|p| (p, location.degree_distance(p.lat, p.lon)))
        .fold(None, |best: Option<(&EnvironmentalPoint, f64)>, cur| match best {
            Some(b) if b.1 <= cur.1 => Some(b),
            _ => Some(cur),
        })
}

fn correlate(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < MIN_CORRELATION_PAIRS {
        return None;
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().cloned().unzip();
    Some(pearson_correlation(&xs, &ys))
}

/// Pearson correlation of per-record CPUE with the nearest SST and chl-a.
///
/// A record matches the closest environmental point under
/// [`MAX_MATCH_DISTANCE`] degrees. Each covariate is correlated only over
/// the matches that carry it, and only from [`MIN_CORRELATION_PAIRS`] pairs.
pub fn environment_correlation(
    records: &[CatchRecord],
    environment: &[EnvironmentalPoint],
    species: Option<&str>,
) -> AnalyticsResult<EnvironmentCorrelation> {
    let matched_points: Vec<MatchedPoint> = species_filter(records, species)?
        .into_iter()
        .filter_map(|record| {
            let location = usable_location(record)?;
            let (point, distance) = nearest_point(&location, environment)?;
            (distance < MAX_MATCH_DISTANCE).then(|| MatchedPoint {
                lat: location.lat,
                lon: location.lon,
                cpue: record.cpue(),
                sst: point.sst.and_then(finite),
                chla: point.chla.and_then(finite),
                distance,
            })
        })
        .collect();

    let sst_pairs: Vec<(f64, f64)> = matched_points
        .iter()
        .filter_map(|m| m.sst.map(|sst| (m.cpue, sst)))
        .collect();
    let chla_pairs: Vec<(f64, f64)> = matched_points
        .iter()
        .filter_map(|m| m.chla.map(|chla| (m.cpue, chla)))
        .collect();

    Ok(EnvironmentCorrelation {
        matched_count: matched_points.len(),
        matched_points,
        correlations: Correlations {
            cpue_sst: correlate(&sst_pairs),
            cpue_chla: correlate(&chla_pairs),
        },
    })
}
