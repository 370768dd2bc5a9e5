//! Fisheries analytics service
//!
//! Resolves the records a request refers to, fills parameter defaults from
//! configuration, and calls into `shared::analytics`.

use std::sync::Arc;

use serde::Deserialize;
use shared::analytics::{
    self, Cohort, CpueResult, DepthDistribution, EnvironmentCorrelation, GrowthEstimate,
    GrowthParameters, LengthDistribution, LengthFrequencyReport, LengthWeightResult,
    MaturityOgive, MortalityEstimate, MortalityOptions, NaturalMortalityMethod,
    RecruitmentAnalysis, SpatialGrid, SpeciesCpue, SpeciesStockSummary, StockAssessment,
    TimeSeriesPoint,
};
use shared::types::Period;
use shared::validation::{
    validate_all, validate_catch_record, validate_environmental_point, validate_length_record,
};
use uuid::Uuid;

use crate::config::AnalyticsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{CatchRecord, EnvironmentalPoint, LengthRecord};
use crate::repository::DatasetRepository;

/// Where a request's records come from; inline records win over a dataset
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSource {
    pub dataset_id: Option<Uuid>,
    pub catch_records: Option<Vec<CatchRecord>>,
    pub length_records: Option<Vec<LengthRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesRequest {
    #[serde(flatten)]
    pub source: RecordSource,
    pub species: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesRequest {
    #[serde(flatten)]
    pub source: RecordSource,
    pub species: String,
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRequest {
    #[serde(flatten)]
    pub source: RecordSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthRequest {
    #[serde(flatten)]
    pub source: RecordSource,
    pub species: String,
    pub bin_size: Option<f64>,
}

/// Optional overrides of the configured mortality defaults
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortalityParams {
    pub average_temperature: Option<f64>,
    pub natural_mortality_method: Option<NaturalMortalityMethod>,
    pub growth_parameters: Option<GrowthParameters>,
    pub bin_size: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    #[serde(flatten)]
    pub source: RecordSource,
    pub species: String,
    #[serde(flatten)]
    pub params: MortalityParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummaryRequest {
    #[serde(flatten)]
    pub source: RecordSource,
    #[serde(flatten)]
    pub params: MortalityParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialRequest {
    #[serde(flatten)]
    pub source: RecordSource,
    pub species: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRequest {
    #[serde(flatten)]
    pub source: RecordSource,
    pub species: Option<String>,
    #[serde(default)]
    pub environmental_data: Vec<EnvironmentalPoint>,
}

/// Records a request resolved to
#[derive(Debug, Default)]
pub struct ResolvedRecords {
    pub catch_records: Vec<CatchRecord>,
    pub length_records: Vec<LengthRecord>,
}

#[derive(Clone)]
pub struct FisheriesService {
    datasets: Arc<dyn DatasetRepository>,
    settings: AnalyticsConfig,
}

impl FisheriesService {
    pub fn new(datasets: Arc<dyn DatasetRepository>, settings: AnalyticsConfig) -> Self {
        Self { datasets, settings }
    }

    /// Inline records are validated here; stored datasets were validated on upload
    pub async fn resolve(&self, source: RecordSource) -> AppResult<ResolvedRecords> {
        if let Some(records) = &source.catch_records {
            validate_all(records, validate_catch_record)
                .map_err(|(i, e)| AppError::validation(format!("catchRecords[{}]", i), e))?;
        }
        if let Some(records) = &source.length_records {
            validate_all(records, validate_length_record)
                .map_err(|(i, e)| AppError::validation(format!("lengthRecords[{}]", i), e))?;
        }

        match (source.catch_records, source.length_records, source.dataset_id) {
            (None, None, None) => Err(AppError::ValidationError(
                "Request must include catchRecords, lengthRecords, or a datasetId".to_string(),
            )),
            (Some(catch_records), Some(length_records), _) => Ok(ResolvedRecords {
                catch_records,
                length_records,
            }),
            (catch_records, length_records, Some(id)) => {
                let dataset = self
                    .datasets
                    .get(id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Dataset".to_string()))?;
                Ok(ResolvedRecords {
                    catch_records: catch_records.unwrap_or(dataset.catch_records),
                    length_records: length_records.unwrap_or(dataset.length_records),
                })
            }
            (catch_records, length_records, None) => Ok(ResolvedRecords {
                catch_records: catch_records.unwrap_or_default(),
                length_records: length_records.unwrap_or_default(),
            }),
        }
    }

    fn bin_size(&self, requested: Option<f64>) -> f64 {
        requested.unwrap_or(self.settings.default_bin_size)
    }

    fn mortality_options(&self, params: MortalityParams) -> MortalityOptions {
        MortalityOptions {
            average_temperature: Some(
                params
                    .average_temperature
                    .unwrap_or(self.settings.default_temperature),
            ),
            natural_mortality_method: params
                .natural_mortality_method
                .unwrap_or(self.settings.natural_mortality_method),
            growth_parameters: params.growth_parameters,
            bin_size: Some(self.bin_size(params.bin_size)),
        }
    }

    // ========================================================================
    // CPUE
    // ========================================================================

    pub async fn cpue(&self, input: SpeciesRequest) -> AppResult<CpueResult> {
        let records = self.resolve(input.source).await?;
        tracing::debug!(records = records.catch_records.len(), species = %input.species, "CPUE");
        Ok(analytics::calculate_cpue(&records.catch_records, &input.species)?)
    }

    pub async fn cpue_time_series(
        &self,
        input: TimeSeriesRequest,
    ) -> AppResult<Vec<TimeSeriesPoint>> {
        let records = self.resolve(input.source).await?;
        tracing::debug!(
            records = records.catch_records.len(),
            period = %input.period,
            "CPUE time series"
        );
        Ok(analytics::calculate_cpue_time_series(
            &records.catch_records,
            &input.species,
            input.period,
        )?)
    }

    pub async fn cpue_summary(&self, input: SourceRequest) -> AppResult<Vec<SpeciesCpue>> {
        let records = self.resolve(input.source).await?;
        Ok(analytics::get_cpue_summary(&records.catch_records))
    }

    // ========================================================================
    // Length frequency
    // ========================================================================

    pub async fn length_distribution(&self, input: LengthRequest) -> AppResult<LengthDistribution> {
        let records = self.resolve(input.source).await?;
        tracing::debug!(
            records = records.length_records.len(),
            species = %input.species,
            "Length distribution"
        );
        Ok(analytics::calculate_length_distribution(
            &records.length_records,
            &input.species,
            self.bin_size(input.bin_size),
        )?)
    }

    pub async fn cohorts(&self, input: LengthRequest) -> AppResult<Vec<Cohort>> {
        let records = self.resolve(input.source).await?;
        Ok(analytics::identify_cohorts_with_bin_size(
            &records.length_records,
            &input.species,
            self.bin_size(input.bin_size),
        )?)
    }

    pub async fn growth(&self, input: SpeciesRequest) -> AppResult<GrowthEstimate> {
        let records = self.resolve(input.source).await?;
        if input.species.trim().is_empty() {
            return Err(analytics::AnalyticsError::MissingSpecies.into());
        }
        let samples: Vec<LengthRecord> =
            analytics::lengths_for_species(&records.length_records, &input.species)
                .into_iter()
                .cloned()
                .collect();
        Ok(analytics::estimate_growth_parameters(&samples, self.bin_size(None))?)
    }

    pub async fn length_weight(&self, input: SpeciesRequest) -> AppResult<LengthWeightResult> {
        let records = self.resolve(input.source).await?;
        Ok(analytics::calculate_length_weight(
            &records.length_records,
            &input.species,
        )?)
    }

    pub async fn maturity_ogive(&self, input: SpeciesRequest) -> AppResult<MaturityOgive> {
        let records = self.resolve(input.source).await?;
        Ok(analytics::calculate_maturity_ogive(
            &records.length_records,
            &input.species,
        )?)
    }

    pub async fn length_frequency_report(
        &self,
        input: LengthRequest,
    ) -> AppResult<LengthFrequencyReport> {
        let records = self.resolve(input.source).await?;
        tracing::debug!(
            records = records.length_records.len(),
            species = %input.species,
            "Extended length analysis"
        );
        Ok(analytics::analyze_length_frequency(
            &records.length_records,
            &input.species,
            self.bin_size(input.bin_size),
        )?)
    }

    // ========================================================================
    // Stock assessment
    // ========================================================================

    pub async fn mortality(&self, input: StockRequest) -> AppResult<MortalityEstimate> {
        let records = self.resolve(input.source).await?;
        let options = self.mortality_options(input.params);
        Ok(analytics::estimate_mortality(
            &records.length_records,
            &input.species,
            &options,
        )?)
    }

    pub async fn stock_status(&self, input: StockRequest) -> AppResult<StockAssessment> {
        let records = self.resolve(input.source).await?;
        let options = self.mortality_options(input.params);
        tracing::debug!(
            catch = records.catch_records.len(),
            lengths = records.length_records.len(),
            species = %input.species,
            "Stock status"
        );
        Ok(analytics::assess_stock_status(
            &records.catch_records,
            &records.length_records,
            &input.species,
            &options,
        )?)
    }

    pub async fn recruitment(&self, input: SpeciesRequest) -> AppResult<RecruitmentAnalysis> {
        let records = self.resolve(input.source).await?;
        Ok(analytics::analyze_recruitment(
            &records.catch_records,
            &records.length_records,
            &input.species,
        )?)
    }

    pub async fn stock_summary(
        &self,
        input: StockSummaryRequest,
    ) -> AppResult<Vec<SpeciesStockSummary>> {
        let records = self.resolve(input.source).await?;
        let options = self.mortality_options(input.params);
        Ok(analytics::get_multi_species_stock_summary(
            &records.catch_records,
            &records.length_records,
            &options,
        )?)
    }

    // ========================================================================
    // Spatial
    // ========================================================================

    pub async fn spatial_grid(&self, input: SpatialRequest) -> AppResult<SpatialGrid> {
        let records = self.resolve(input.source).await?;
        Ok(analytics::spatial_cpue_grid(
            &records.catch_records,
            input.species.as_deref(),
        )?)
    }

    pub async fn depth_distribution(&self, input: SpatialRequest) -> AppResult<DepthDistribution> {
        let records = self.resolve(input.source).await?;
        Ok(analytics::depth_distribution(
            &records.catch_records,
            input.species.as_deref(),
        )?)
    }

    pub async fn environment_correlation(
        &self,
        input: EnvironmentRequest,
    ) -> AppResult<EnvironmentCorrelation> {
        validate_all(&input.environmental_data, validate_environmental_point)
            .map_err(|(i, e)| AppError::validation(format!("environmentalData[{}]", i), e))?;
        let records = self.resolve(input.source).await?;
        tracing::debug!(
            records = records.catch_records.len(),
            environment = input.environmental_data.len(),
            "Environment correlation"
        );
        Ok(analytics::environment_correlation(
            &records.catch_records,
            &input.environmental_data,
            input.species.as_deref(),
        )?)
    }
}
