//! Validation utilities for the Marine Research Platform
//!
//! Records are checked once at ingestion so the analytics never see loose data.

use crate::models::{CatchRecord, DatasetType, EnvironmentalPoint, LengthRecord};
use crate::types::Location;

/// Deepest fishing depth accepted, in metres
pub const MAX_DEPTH_M: f64 = 12_000.0;

/// Longest fish length accepted, in cm
pub const MAX_LENGTH_CM: f64 = 5_000.0;

// ============================================================================
// Record Validations
// ============================================================================

/// Validate a species label is present
pub fn validate_species(species: &str) -> Result<(), &'static str> {
    if species.trim().is_empty() {
        return Err("Species is required");
    }
    Ok(())
}

/// Validate coordinates are within the valid lat/lon range
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), &'static str> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err("Latitude must be between -90 and 90");
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate a fishing location
pub fn validate_location(location: &Location) -> Result<(), &'static str> {
    validate_coordinates(location.lat, location.lon)?;
    if let Some(depth) = location.depth {
        if !depth.is_finite() || !(0.0..=MAX_DEPTH_M).contains(&depth) {
            return Err("Depth must be between 0 and 12000 metres");
        }
    }
    Ok(())
}

/// Validate a catch record
pub fn validate_catch_record(record: &CatchRecord) -> Result<(), &'static str> {
    validate_species(&record.species)?;
    if !record.catch_weight.is_finite() || record.catch_weight < 0.0 {
        return Err("Catch weight must be a non-negative number");
    }
    if let Some(effort) = record.effort {
        if !effort.is_finite() || effort < 0.0 {
            return Err("Effort must be a non-negative number");
        }
    }
    if let Some(location) = &record.location {
        validate_location(location)?;
    }
    Ok(())
}

/// Validate a length record
pub fn validate_length_record(record: &LengthRecord) -> Result<(), &'static str> {
    validate_species(&record.species)?;
    if !record.length.is_finite() || record.length <= 0.0 {
        return Err("Length must be a positive number");
    }
    if record.length > MAX_LENGTH_CM {
        return Err("Length must be at most 5000 cm");
    }
    if let Some(weight) = record.weight {
        if !weight.is_finite() || weight <= 0.0 {
            return Err("Weight must be a positive number");
        }
    }
    if let Some(age) = record.age {
        if !age.is_finite() || age < 0.0 {
            return Err("Age must be a non-negative number");
        }
    }
    Ok(())
}

/// Validate an environmental observation
pub fn validate_environmental_point(point: &EnvironmentalPoint) -> Result<(), &'static str> {
    validate_coordinates(point.lat, point.lon)?;
    if point.sst.map(|v| !v.is_finite()).unwrap_or(false) {
        return Err("Sea-surface temperature must be a finite number");
    }
    if point.chla.map(|v| !v.is_finite()).unwrap_or(false) {
        return Err("Chlorophyll-a must be a finite number");
    }
    Ok(())
}

/// Validate every record, reporting the index of the first failure
pub fn validate_all<T>(
    records: &[T],
    validate: impl Fn(&T) -> Result<(), &'static str>,
) -> Result<(), (usize, &'static str)> {
    records
        .iter()
        .enumerate()
        .try_for_each(|(i, r)| validate(r).map_err(|e| (i, e)))
}

// ============================================================================
// Dataset Validations
// ============================================================================

/// Validate dataset name
pub fn validate_dataset_name(name: &str) -> Result<(), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Dataset name is required");
    }
    if name.chars().count() > 200 {
        return Err("Dataset name must be at most 200 characters");
    }
    Ok(())
}

/// Validate that the record kinds match the declared dataset type
pub fn validate_dataset_contents(
    dataset_type: DatasetType,
    catch_count: usize,
    length_count: usize,
) -> Result<(), &'static str> {
    match dataset_type {
        DatasetType::Catch if length_count > 0 => {
            Err("A catch dataset cannot contain length records")
        }
        DatasetType::Length if catch_count > 0 => {
            Err("A length dataset cannot contain catch records")
        }
        _ if catch_count + length_count == 0 => Err("Dataset must contain at least one record"),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    // ========================================================================
    // Record Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_catch_record_valid() {
        let record = CatchRecord::new(date(), "Rastrelliger kanagurta", 120.0)
            .with_effort(4.0)
            .with_location(Location::with_depth(10.2, 75.8, 35.0));
        assert!(validate_catch_record(&record).is_ok());
    }

    #[test]
    fn test_validate_catch_record_zero_effort_allowed() {
        let record = CatchRecord::new(date(), "X", 10.0).with_effort(0.0);
        assert!(validate_catch_record(&record).is_ok());
    }

    #[test]
    fn test_validate_catch_record_invalid() {
        assert!(validate_catch_record(&CatchRecord::new(date(), " ", 10.0)).is_err());
        assert!(validate_catch_record(&CatchRecord::new(date(), "X", -1.0)).is_err());
        assert!(validate_catch_record(&CatchRecord::new(date(), "X", f64::NAN)).is_err());
        assert!(
            validate_catch_record(&CatchRecord::new(date(), "X", 1.0).with_effort(-2.0)).is_err()
        );
        assert!(validate_catch_record(
            &CatchRecord::new(date(), "X", 1.0).with_location(Location::new(95.0, 10.0))
        )
        .is_err());
    }

    #[test]
    fn test_validate_catch_record_depth_range() {
        let at_depth = |depth: f64| {
            CatchRecord::new(date(), "X", 1.0).with_location(Location::with_depth(10.0, 76.0, depth))
        };
        assert!(validate_catch_record(&at_depth(0.0)).is_ok());
        assert!(validate_catch_record(&at_depth(MAX_DEPTH_M)).is_ok());
        assert!(validate_catch_record(&at_depth(-5.0)).is_err());
        assert!(validate_catch_record(&at_depth(1e300)).is_err());
        assert!(validate_catch_record(&at_depth(f64::NAN)).is_err());
    }

    #[test]
    fn test_validate_length_record() {
        assert!(validate_length_record(&LengthRecord::new("X", 32.0).with_weight(410.0)).is_ok());
        assert!(validate_length_record(&LengthRecord::new("X", 0.0)).is_err());
        assert!(validate_length_record(&LengthRecord::new("X", 12.0).with_weight(0.0)).is_err());
        assert!(validate_length_record(&LengthRecord::new("X", 12.0).with_age(-1.0)).is_err());
        assert!(validate_length_record(&LengthRecord::new("", 12.0)).is_err());
        assert!(validate_length_record(&LengthRecord::new("X", MAX_LENGTH_CM)).is_ok());
        assert!(validate_length_record(&LengthRecord::new("X", 1e300)).is_err());
    }

    #[test]
    fn test_validate_environmental_point() {
        let point = EnvironmentalPoint::new(9.0, 76.0);
        assert!(validate_environmental_point(&point.clone().with_sst(28.4)).is_ok());
        assert!(validate_environmental_point(&EnvironmentalPoint::new(9.0, 200.0)).is_err());
        assert!(validate_environmental_point(&point.with_chla(f64::INFINITY)).is_err());
    }

    #[test]
    fn test_validate_all_reports_index() {
        let records = vec![
            LengthRecord::new("X", 10.0),
            LengthRecord::new("X", 11.0),
            LengthRecord::new("X", -3.0),
        ];
        let err = validate_all(&records, validate_length_record).unwrap_err();
        assert_eq!(err.0, 2);
    }

    // ========================================================================
    // Dataset Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_dataset_name() {
        assert!(validate_dataset_name("Kochi trawl survey 2024").is_ok());
        assert!(validate_dataset_name("   ").is_err());
        assert!(validate_dataset_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_dataset_contents() {
        assert!(validate_dataset_contents(DatasetType::Catch, 3, 0).is_ok());
        assert!(validate_dataset_contents(DatasetType::Catch, 3, 1).is_err());
        assert!(validate_dataset_contents(DatasetType::Length, 1, 5).is_err());
        assert!(validate_dataset_contents(DatasetType::Mixed, 2, 5).is_ok());
        assert!(validate_dataset_contents(DatasetType::Mixed, 0, 0).is_err());
    }
}
