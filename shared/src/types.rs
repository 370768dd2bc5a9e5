//! Common types used across the platform

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Position of a fishing operation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    /// Fishing depth in metres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            depth: None,
        }
    }

    pub fn with_depth(lat: f64, lon: f64, depth: f64) -> Self {
        Self {
            lat,
            lon,
            depth: Some(depth),
        }
    }

    /// Euclidean distance in degree space
    pub fn degree_distance(&self, lat: f64, lon: f64) -> f64 {
        ((self.lat - lat).powi(2) + (self.lon - lon).powi(2)).sqrt()
    }
}

/// Time-series bucket granularity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Monthly,
    Yearly,
}

impl Period {
    /// Truncated bucket key: `YYYY-MM` for monthly, `YYYY` for yearly
    pub fn bucket_key(&self, date: NaiveDate) -> String {
        match self {
            Period::Monthly => date.format("%Y-%m").to_string(),
            Period::Yearly => date.format("%Y").to_string(),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Monthly => write!(f, "monthly"),
            Period::Yearly => write!(f, "yearly"),
        }
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Clamp to sane bounds and return (offset, limit)
    pub fn window(&self) -> (usize, usize) {
        let page = self.page.max(1) as usize;
        let per_page = self.per_page.clamp(1, 200) as usize;
        ((page - 1) * per_page, per_page)
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Slice an already ordered collection into one page
    pub fn from_items(items: Vec<T>, pagination: &Pagination) -> Self {
        let total_items = items.len() as u64;
        let (offset, limit) = pagination.window();
        let total_pages = ((total_items as usize + limit - 1) / limit) as u32;
        let data = items.into_iter().skip(offset).take(limit).collect();

        Self {
            data,
            pagination: PaginationMeta {
                page: pagination.page.max(1),
                per_page: limit as u32,
                total_items,
                total_pages,
            },
        }
    }
}

/// Parse a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Serde adapter for calendar dates that may arrive as timestamps
pub mod calendar_date {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m-%d").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_calendar_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid calendar date: {}", raw)))
    }
}

/// Optional variant of [`calendar_date`]
pub mod optional_calendar_date {
    use super::*;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_some(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_calendar_date(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid calendar date: {}", s))),
        }
    }
}
