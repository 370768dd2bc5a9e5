//! Length-frequency analytics tests
//!
//! Covers:
//! - Histogram counts sum to the sample size
//! - Repeated calls return identical results
//! - Maturity ogive minimum class size

use proptest::prelude::*;
use shared::{
    analyze_length_frequency, calculate_length_distribution, calculate_maturity_ogive,
    identify_cohorts, identify_cohorts_with_bin_size, AnalyticsError, LengthRecord,
};

fn lengths(species: &str, values: &[f64]) -> Vec<LengthRecord> {
    values.iter().map(|&l| LengthRecord::new(species, l)).collect()
}

// ============================================================================
// Scenario Tests
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn four_lengths_fall_in_four_classes() {
        let records = lengths("X", &[38.0, 45.0, 52.0, 60.0]);

        let dist = calculate_length_distribution(&records, "X", 5.0).unwrap();

        let classes: Vec<f64> = dist.bins.iter().map(|b| b.length_class).collect();
        assert_eq!(classes, vec![37.5, 47.5, 52.5, 62.5]);
        assert!(dist.bins.iter().all(|b| b.count == 1));
        assert_eq!(dist.sample_size, 4);
        assert_eq!(dist.min_length, 38.0);
        assert_eq!(dist.max_length, 60.0);
    }

    #[test]
    fn two_fish_class_is_left_out_of_ogive() {
        let mut records = Vec::new();
        // 20-25 cm: two fish, both mature
        records.push(LengthRecord::new("X", 21.0).with_maturity("mature"));
        records.push(LengthRecord::new("X", 23.0).with_maturity("mature"));
        // 30-35 cm: three fish, one mature
        records.push(LengthRecord::new("X", 31.0).with_maturity("immature"));
        records.push(LengthRecord::new("X", 32.0).with_maturity("immature"));
        records.push(LengthRecord::new("X", 33.0).with_maturity("mature"));

        let ogive = calculate_maturity_ogive(&records, "X").unwrap();

        assert_eq!(ogive.points.len(), 1);
        assert_eq!(ogive.points[0].length_class, 32.5);
        assert_eq!(ogive.points[0].total_count, 3);
        assert_eq!(ogive.points[0].percent_mature, 33.0);
        assert_eq!(ogive.sample_size, 5);
    }

    #[test]
    fn ogive_interpolates_half_maturity() {
        let mut records = Vec::new();
        for (length, mature) in [(22.0, 0), (27.0, 2), (32.0, 4)] {
            for i in 0..4 {
                let stage = if i < mature { "mature" } else { "immature" };
                records.push(LengthRecord::new("X", length).with_maturity(stage));
            }
        }

        let ogive = calculate_maturity_ogive(&records, "X").unwrap();

        // 0 % at 22.5, 50 % at 27.5
        assert_eq!(ogive.l50, Some(27.5));
    }

    #[test]
    fn blank_species_is_rejected() {
        let records = lengths("X", &[10.0]);
        assert!(matches!(
            calculate_length_distribution(&records, "  ", 5.0),
            Err(AnalyticsError::MissingSpecies)
        ));
    }

    #[test]
    fn non_positive_bin_size_is_rejected() {
        let records = lengths("X", &[10.0]);
        assert!(matches!(
            calculate_length_distribution(&records, "X", 0.0),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn vanishing_bin_size_is_rejected() {
        let records = lengths("X", &[10.0, 10.0, 10.0]);
        assert!(matches!(
            identify_cohorts_with_bin_size(&records, "X", 1e-300),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
        assert!(matches!(
            calculate_length_distribution(&records, "X", 1e-300),
            Err(AnalyticsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn report_growth_matches_report_cohorts() {
        let mut values = vec![12.0; 6];
        values.extend(vec![27.0; 4]);
        values.extend(vec![42.0; 3]);
        let records = lengths("X", &values);

        for bin_size in [2.5, 5.0, 10.0] {
            let report = analyze_length_frequency(&records, "X", bin_size).unwrap();
            assert_eq!(report.growth.cohort_count, report.cohorts.len());
        }
    }

    #[test]
    fn cohorts_follow_histogram_peaks() {
        let mut values = vec![12.0; 6];
        values.extend([17.0, 18.0]);
        values.extend(vec![27.0; 4]);
        let records = lengths("X", &values);

        let cohorts = identify_cohorts(&records, "X").unwrap();
        let classes: Vec<f64> = cohorts.iter().map(|c| c.length_class).collect();
        assert_eq!(classes, vec![12.5, 27.5]);
        assert_eq!(cohorts[0].relative_age, 0);
        assert_eq!(cohorts[1].relative_age, 1);
    }

    #[test]
    fn report_without_weights_flags_length_weight() {
        let records = lengths("X", &[10.0, 11.0, 12.0]);
        let report = analyze_length_frequency(&records, "X", 5.0).unwrap();
        assert_eq!(report.distribution.sample_size, 3);
        assert!(report.length_weight.fit.is_none());
        assert!(report.length_weight.insufficient_data.is_some());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn length_records_strategy() -> impl Strategy<Value = Vec<LengthRecord>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["X", "Y"]),
                1.0f64..150.0,
                prop::option::of(prop::sample::select(vec!["mature", "immature", "unknown"])),
            )
                .prop_map(|(species, length, stage)| {
                    let record = LengthRecord::new(species, length);
                    match stage {
                        Some(stage) => record.with_maturity(stage),
                        None => record,
                    }
                }),
            1..120,
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Σ bin counts == sampleSize
        #[test]
        fn prop_bins_sum_to_sample_size(
            records in length_records_strategy(),
            bin_size in prop::sample::select(vec![1.0, 2.5, 5.0, 10.0]),
        ) {
            let dist = calculate_length_distribution(&records, "X", bin_size).unwrap();
            let total: usize = dist.bins.iter().map(|b| b.count).sum();
            prop_assert_eq!(total, dist.sample_size);
            prop_assert_eq!(dist.sample_size, records.iter().filter(|r| r.species == "X").count());
        }

        /// Bins ascend and the mean lies within the observed range
        #[test]
        fn prop_bins_ascend(records in length_records_strategy()) {
            let dist = calculate_length_distribution(&records, "X", 5.0).unwrap();
            for pair in dist.bins.windows(2) {
                prop_assert!(pair[0].length_class < pair[1].length_class);
            }
            if dist.sample_size > 0 {
                prop_assert!(dist.min_length <= dist.mean_length + 1e-9);
                prop_assert!(dist.mean_length <= dist.max_length + 1e-9);
            }
        }

        /// Ogive classes always hold at least three staged fish
        #[test]
        fn prop_ogive_classes_meet_minimum(records in length_records_strategy()) {
            let ogive = calculate_maturity_ogive(&records, "X").unwrap();
            for point in &ogive.points {
                prop_assert!(point.total_count >= 3);
                prop_assert!(point.mature_count <= point.total_count);
                prop_assert!((0.0..=100.0).contains(&point.percent_mature));
            }
        }

        /// Same records, same report
        #[test]
        fn prop_length_report_is_idempotent(records in length_records_strategy()) {
            let copy = records.clone();
            prop_assert_eq!(
                analyze_length_frequency(&records, "X", 5.0).unwrap(),
                analyze_length_frequency(&copy, "X", 5.0).unwrap()
            );
        }
    }
}
