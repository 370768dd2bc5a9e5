//! Stock assessment tests
//!
//! Covers:
//! - Sustainability score never rises with exploitation
//! - Repeated assessments return identical results
//! - Mortality options and stock status classification

use chrono::NaiveDate;
use proptest::prelude::*;
use shared::{
    assess_stock_status, classify_stock_status, estimate_mortality,
    get_multi_species_stock_summary, pauly_natural_mortality, sustainability_score,
    then_natural_mortality, AnalyticsError, BiomassStatus, CatchRecord, ExploitationLevel,
    GrowthParameters, LengthRecord, MortalityOptions, NaturalMortalityMethod,
    SustainabilityInputs,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn known_growth() -> GrowthParameters {
    GrowthParameters {
        linf: 100.0,
        k: 0.3,
        t0: Some(0.0),
        r2: 1.0,
    }
}

/// Lengths spread over the descending limb so a catch curve can be fitted
fn length_sample(species: &str) -> Vec<LengthRecord> {
    let mut records = Vec::new();
    for (length, n) in [(22.0, 5), (32.0, 30), (42.0, 22), (52.0, 15), (62.0, 9), (72.0, 5)] {
        for _ in 0..n {
            records.push(LengthRecord::new(species, length));
        }
    }
    records
}

// ============================================================================
// Scenario Tests
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn supplied_growth_drives_natural_mortality() {
        let options = MortalityOptions {
            growth_parameters: Some(known_growth()),
            ..Default::default()
        };

        let estimate = estimate_mortality(&length_sample("X"), "X", &options).unwrap();

        assert_eq!(estimate.temperature_used, 25.0);
        assert_eq!(estimate.operative_method, NaturalMortalityMethod::Pauly);
        assert_eq!(estimate.natural_mortality, pauly_natural_mortality(100.0, 0.3, 25.0));
        assert_eq!(estimate.growth, Some(known_growth()));
        assert!(estimate.total_mortality.is_some());
    }

    #[test]
    fn operative_method_can_be_chosen() {
        let options = MortalityOptions {
            growth_parameters: Some(known_growth()),
            natural_mortality_method: NaturalMortalityMethod::Then,
            ..Default::default()
        };

        let estimate = estimate_mortality(&length_sample("X"), "X", &options).unwrap();

        assert_eq!(estimate.natural_mortality, then_natural_mortality(100.0, 0.3));
        assert_eq!(estimate.natural_mortality_estimates.then, estimate.natural_mortality);
    }

    #[test]
    fn fishing_mortality_is_never_negative() {
        let options = MortalityOptions {
            growth_parameters: Some(known_growth()),
            ..Default::default()
        };

        let estimate = estimate_mortality(&length_sample("X"), "X", &options).unwrap();

        if let (Some(f), Some(e)) = (estimate.fishing_mortality, estimate.exploitation_rate) {
            assert!(f >= 0.0);
            assert!((0.0..=1.0).contains(&e));
        }
    }

    #[test]
    fn non_finite_temperature_is_rejected() {
        let options = MortalityOptions {
            average_temperature: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(
            estimate_mortality(&length_sample("X"), "X", &options),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn no_lengths_reports_insufficient_data() {
        let estimate = estimate_mortality(&[], "X", &MortalityOptions::default()).unwrap();
        assert!(estimate.total_mortality.is_none());
        assert!(estimate.insufficient_data.is_some());
        assert_eq!(estimate.sample_size, 0);
    }

    #[test]
    fn heavy_fishing_on_falling_catches() {
        let status = classify_stock_status(&SustainabilityInputs {
            exploitation_rate: Some(0.8),
            cpue_change: Some(-0.5),
            mean_length: None,
            maturity_length: None,
        });

        assert_eq!(status.exploitation_level, ExploitationLevel::Overexploited);
        assert_eq!(status.biomass_status, BiomassStatus::Depleted);
        // 40 * 0.2 + 15 * 0.5 + 15
        assert!((status.sustainability_score - 30.5).abs() < 1e-9);
        assert!(status.recommendations.len() >= 2);
    }

    #[test]
    fn small_fish_prompt_mesh_advice() {
        let status = classify_stock_status(&SustainabilityInputs {
            exploitation_rate: Some(0.4),
            cpue_change: Some(0.0),
            mean_length: Some(20.0),
            maturity_length: Some(40.0),
        });

        assert_eq!(status.exploitation_level, ExploitationLevel::Moderate);
        assert_eq!(status.biomass_status, BiomassStatus::Healthy);
        assert!(status.recommendations.iter().any(|r| r.contains("mesh size")));
    }

    #[test]
    fn assessment_combines_cpue_and_mortality() {
        let catches = vec![
            CatchRecord::new(date(2024, 1, 10), "X", 500.0).with_effort(10.0),
            CatchRecord::new(date(2024, 2, 10), "X", 300.0).with_effort(10.0),
        ];
        let options = MortalityOptions {
            growth_parameters: Some(known_growth()),
            ..Default::default()
        };

        let assessment = assess_stock_status(&catches, &length_sample("X"), "X", &options).unwrap();

        assert_eq!(assessment.cpue.cpue, 40.0);
        // 50 -> 30 per unit effort
        assert_eq!(assessment.status.biomass_status, BiomassStatus::Depleted);
        assert!(assessment.mean_length.is_some());
        assert!(assessment.maturity_length.is_some());
    }

    #[test]
    fn summary_keeps_species_without_lengths() {
        let catches = vec![
            CatchRecord::new(date(2024, 1, 10), "B", 50.0),
            CatchRecord::new(date(2024, 1, 10), "A", 80.0),
        ];

        let summary =
            get_multi_species_stock_summary(&catches, &length_sample("A"), &MortalityOptions::default())
                .unwrap();

        let species: Vec<&str> = summary.iter().map(|s| s.species.as_str()).collect();
        assert_eq!(species, vec!["A", "B"]);
        assert!(summary[0].mortality.is_some());
        assert_eq!(summary[1].length_sample_size, 0);
        assert!(summary[1].mortality.is_none());
        assert!(summary[1].stock_status.is_none());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn optional_signal(range: std::ops::Range<f64>) -> impl Strategy<Value = Option<f64>> {
        prop::option::of(range)
    }

    fn catch_records_strategy() -> impl Strategy<Value = Vec<CatchRecord>> {
        prop::collection::vec(
            (1u32..=12, 1u32..=28, 0.0f64..2_000.0, 1.0f64..50.0)
                .prop_map(|(m, d, catch, effort)| {
                    CatchRecord::new(date(2024, m, d), "X", catch).with_effort(effort)
                }),
            0..30,
        )
    }

    fn length_records_strategy() -> impl Strategy<Value = Vec<LengthRecord>> {
        prop::collection::vec(
            (5.0f64..90.0).prop_map(|length| LengthRecord::new("X", length)),
            0..150,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// A higher exploitation rate never raises the score
        #[test]
        fn prop_score_monotonic_in_exploitation(
            e1 in 0.0f64..1.5,
            e2 in 0.0f64..1.5,
            cpue_change in optional_signal(-2.0..2.0),
            mean_length in optional_signal(1.0..120.0),
            maturity_length in optional_signal(1.0..120.0),
        ) {
            let (low, high) = if e1 <= e2 { (e1, e2) } else { (e2, e1) };
            let inputs = |e: f64| SustainabilityInputs {
                exploitation_rate: Some(e),
                cpue_change,
                mean_length,
                maturity_length,
            };

            let low_score = sustainability_score(&inputs(low));
            let high_score = sustainability_score(&inputs(high));
            prop_assert!(high_score <= low_score);
        }

        /// The score stays within 0-100 for any combination of signals
        #[test]
        fn prop_score_is_bounded(
            exploitation_rate in optional_signal(-1.0..2.0),
            cpue_change in optional_signal(-5.0..5.0),
            mean_length in optional_signal(0.0..200.0),
            maturity_length in optional_signal(0.0..200.0),
        ) {
            let score = sustainability_score(&SustainabilityInputs {
                exploitation_rate,
                cpue_change,
                mean_length,
                maturity_length,
            });
            prop_assert!((0.0..=100.0).contains(&score));
        }

        /// Same records, same assessment
        #[test]
        fn prop_assessment_is_idempotent(
            catches in catch_records_strategy(),
            lengths in length_records_strategy(),
        ) {
            let options = MortalityOptions::default();
            let first = assess_stock_status(&catches, &lengths, "X", &options).unwrap();
            let second = assess_stock_status(&catches.clone(), &lengths.clone(), "X", &options).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Mortality outputs are finite and E stays within [0, 1]
        #[test]
        fn prop_mortality_is_well_formed(lengths in length_records_strategy()) {
            let options = MortalityOptions {
                growth_parameters: Some(known_growth()),
                ..Default::default()
            };
            let estimate = estimate_mortality(&lengths, "X", &options).unwrap();

            if let Some(z) = estimate.total_mortality {
                prop_assert!(z.is_finite());
            }
            if let Some(e) = estimate.exploitation_rate {
                prop_assert!((0.0..=1.0).contains(&e));
            }
            prop_assert_eq!(estimate.sample_size, lengths.len());
        }
    }
}
