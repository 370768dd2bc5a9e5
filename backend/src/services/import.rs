//! CSV parsing for dataset import
//!
//! Catch files carry `date,species,catchWeight,effort,lat,lon,depth`; length
//! files carry `species,length,weight,maturity,date,age`. Optional columns may
//! be absent or blank. Row numbers in errors count the header as row 1.

use serde::Deserialize;
use shared::types::{parse_calendar_date, Location};
use shared::validation::{validate_catch_record, validate_length_record};

use crate::error::{AppError, AppResult};
use crate::models::{CatchRecord, LengthRecord};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatchRow {
    date: String,
    species: String,
    catch_weight: f64,
    #[serde(default)]
    effort: Option<f64>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
    #[serde(default)]
    depth: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LengthRow {
    species: String,
    length: f64,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    maturity: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    age: Option<f64>,
}

fn reader(body: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(body.as_bytes())
}

fn row_error(row: usize, message: impl Into<String>) -> AppError {
    AppError::validation(format!("row {}", row), message)
}

fn parse_date(row: usize, value: &str) -> AppResult<chrono::NaiveDate> {
    parse_calendar_date(value)
        .ok_or_else(|| row_error(row, format!("Invalid date '{}', expected YYYY-MM-DD", value)))
}

pub fn parse_catch_csv(body: &str) -> AppResult<Vec<CatchRecord>> {
    let mut records = Vec::new();
    for (i, result) in reader(body).deserialize::<CatchRow>().enumerate() {
        let row = i + 2;
        let parsed = result.map_err(|e| row_error(row, e.to_string()))?;

        let mut record = CatchRecord::new(
            parse_date(row, &parsed.date)?,
            parsed.species,
            parsed.catch_weight,
        );
        record.effort = parsed.effort;
        record.location = match (parsed.lat, parsed.lon) {
            (Some(lat), Some(lon)) => Some(Location {
                lat,
                lon,
                depth: parsed.depth,
            }),
            (None, None) => None,
            _ => return Err(row_error(row, "lat and lon must be given together")),
        };

        validate_catch_record(&record).map_err(|e| row_error(row, e))?;
        records.push(record);
    }
    Ok(records)
}

pub fn parse_length_csv(body: &str) -> AppResult<Vec<LengthRecord>> {
    let mut records = Vec::new();
    for (i, result) in reader(body).deserialize::<LengthRow>().enumerate() {
        let row = i + 2;
        let parsed = result.map_err(|e| row_error(row, e.to_string()))?;

        let mut record = LengthRecord::new(parsed.species, parsed.length);
        record.weight = parsed.weight;
        record.maturity = parsed.maturity.filter(|m| !m.is_empty());
        record.age = parsed.age;
        record.date = match parsed.date.as_deref().filter(|d| !d.is_empty()) {
            Some(date) => Some(parse_date(row, date)?),
            None => None,
        };

        validate_length_record(&record).map_err(|e| row_error(row, e))?;
        records.push(record);
    }
    Ok(records)
}
