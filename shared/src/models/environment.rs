//! Environmental covariates supplied alongside catch data

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::optional_calendar_date;

/// One observation of sea-surface conditions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentalPoint {
    pub lat: f64,
    pub lon: f64,
    /// Sea-surface temperature, °C
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sst: Option<f64>,
    /// Chlorophyll-a, mg/m³
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chla: Option<f64>,
    #[serde(
        default,
        with = "optional_calendar_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
}

impl EnvironmentalPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            sst: None,
            chla: None,
            date: None,
        }
    }

    pub fn with_sst(mut self, sst: f64) -> Self {
        self.sst = Some(sst);
        self
    }

    pub fn with_chla(mut self, chla: f64) -> Self {
        self.chla = Some(chla);
        self
    }
}
