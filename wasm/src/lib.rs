//! WebAssembly module for the Marine Research Platform
//!
//! Provides client-side computation for:
//! - CPUE and CPUE time series
//! - Length-frequency distribution and maturity ogive
//! - Spatial CPUE grid
//! - Offline record validation
//!
//! Records cross the boundary as JSON arrays in the same shape the HTTP API
//! accepts; results come back as JSON strings.

use serde::Serialize;
use shared::analytics::{
    calculate_cpue, calculate_cpue_time_series, calculate_length_distribution,
    calculate_maturity_ogive, classify_exploitation, pauly_natural_mortality, spatial_cpue_grid,
};
use shared::models::{CatchRecord, LengthRecord};
use shared::types::Period;
use shared::validation::{validate_all, validate_catch_record, validate_length_record};
use wasm_bindgen::prelude::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::log_1(&JsValue::from_str("marine-research-wasm loaded"));
}

fn to_js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

fn parse_catch(records_json: &str) -> Result<Vec<CatchRecord>, String> {
    let records: Vec<CatchRecord> = serde_json::from_str(records_json)
        .map_err(|e| format!("Invalid catch records JSON: {}", e))?;
    validate_all(&records, validate_catch_record)
        .map_err(|(i, e)| format!("catchRecords[{}]: {}", i, e))?;
    Ok(records)
}

fn parse_lengths(records_json: &str) -> Result<Vec<LengthRecord>, String> {
    let records: Vec<LengthRecord> = serde_json::from_str(records_json)
        .map_err(|e| format!("Invalid length records JSON: {}", e))?;
    validate_all(&records, validate_length_record)
        .map_err(|(i, e)| format!("lengthRecords[{}]: {}", i, e))?;
    Ok(records)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Failed to serialize result: {}", e))
}

fn cpue_json(records_json: &str, species: &str) -> Result<String, String> {
    let records = parse_catch(records_json)?;
    let result = calculate_cpue(&records, species).map_err(|e| e.to_string())?;
    to_json(&result)
}

fn cpue_time_series_json(
    records_json: &str,
    species: &str,
    period: &str,
) -> Result<String, String> {
    let period: Period = serde_json::from_value(serde_json::Value::String(period.to_lowercase()))
        .map_err(|_| format!("Unknown period '{}', expected monthly or yearly", period))?;
    let records = parse_catch(records_json)?;
    let series = calculate_cpue_time_series(&records, species, period).map_err(|e| e.to_string())?;
    to_json(&series)
}

fn length_distribution_json(
    records_json: &str,
    species: &str,
    bin_size: f64,
) -> Result<String, String> {
    let records = parse_lengths(records_json)?;
    let distribution =
        calculate_length_distribution(&records, species, bin_size).map_err(|e| e.to_string())?;
    to_json(&distribution)
}

fn maturity_ogive_json(records_json: &str, species: &str) -> Result<String, String> {
    let records = parse_lengths(records_json)?;
    let ogive = calculate_maturity_ogive(&records, species).map_err(|e| e.to_string())?;
    to_json(&ogive)
}

fn spatial_grid_json(records_json: &str, species: Option<&str>) -> Result<String, String> {
    let records = parse_catch(records_json)?;
    let grid = spatial_cpue_grid(&records, species).map_err(|e| e.to_string())?;
    to_json(&grid)
}

fn first_invalid_index(records_json: &str) -> Result<i32, String> {
    let records: Vec<CatchRecord> = serde_json::from_str(records_json)
        .map_err(|e| format!("Invalid catch records JSON: {}", e))?;
    Ok(match validate_all(&records, validate_catch_record) {
        Ok(()) => -1,
        Err((i, _)) => i32::try_from(i).unwrap_or(i32::MAX),
    })
}

/// CPUE, trend, and confidence interval for one species
#[wasm_bindgen(js_name = calculateCpue)]
pub fn calculate_cpue_wasm(records_json: &str, species: &str) -> Result<String, JsValue> {
    cpue_json(records_json, species).map_err(to_js_error)
}

/// CPUE per `monthly` or `yearly` bucket
#[wasm_bindgen(js_name = calculateCpueTimeSeries)]
pub fn calculate_cpue_time_series_wasm(
    records_json: &str,
    species: &str,
    period: &str,
) -> Result<String, JsValue> {
    cpue_time_series_json(records_json, species, period).map_err(to_js_error)
}

#[wasm_bindgen(js_name = calculateLengthDistribution)]
pub fn calculate_length_distribution_wasm(
    records_json: &str,
    species: &str,
    bin_size: f64,
) -> Result<String, JsValue> {
    length_distribution_json(records_json, species, bin_size).map_err(to_js_error)
}

#[wasm_bindgen(js_name = calculateMaturityOgive)]
pub fn calculate_maturity_ogive_wasm(records_json: &str, species: &str) -> Result<String, JsValue> {
    maturity_ogive_json(records_json, species).map_err(to_js_error)
}

/// 0.1° CPUE grid; pass no species for all records
#[wasm_bindgen(js_name = spatialCpueGrid)]
pub fn spatial_cpue_grid_wasm(
    records_json: &str,
    species: Option<String>,
) -> Result<String, JsValue> {
    spatial_grid_json(records_json, species.as_deref()).map_err(to_js_error)
}

/// Pauly's natural mortality; undefined when an input is not positive
#[wasm_bindgen(js_name = paulyNaturalMortality)]
pub fn pauly_natural_mortality_wasm(linf: f64, k: f64, temperature: f64) -> Option<f64> {
    pauly_natural_mortality(linf, k, temperature)
}

/// Exploitation level label for an exploitation rate E = F / Z
#[wasm_bindgen(js_name = classifyExploitation)]
pub fn classify_exploitation_wasm(exploitation_rate: f64) -> String {
    let rate = exploitation_rate.is_finite().then_some(exploitation_rate);
    let level = classify_exploitation(rate);
    serde_json::to_value(level)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Index of the first invalid catch record, or -1 when all are valid.
/// Throws when the input is not a JSON array of catch records.
#[wasm_bindgen(js_name = firstInvalidCatchRecord)]
pub fn first_invalid_catch_record(records_json: &str) -> Result<i32, JsValue> {
    first_invalid_index(records_json).map_err(to_js_error)
}
