use proptest::prelude::*;
use tempfile::TempDir;

use config_learn::config::CalibrationConfig;
use config_learn::learning::{CategoryThresholds, ThresholdCalibrator, acceptance_rate};
use config_learn::suggestions::SuggestionCategory;

fn outcome() -> impl Strategy<Value = (usize, usize)> {
    (0usize..50).prop_flat_map(|total| (Just(total), 0..=total))
}

proptest! {
    #[test]
    fn test_rate_stays_in_unit_interval((total, accepted) in outcome()) {
        let rate = acceptance_rate(total, accepted);
        prop_assert!((0.0..=1.0).contains(&rate));
    }

    #[test]
    fn test_thresholds_stay_in_bounds(runs in prop::collection::vec(outcome(), 1..30)) {
        let dir = TempDir::new().unwrap();
        let cfg = CalibrationConfig::default();
        let mut calibrator = ThresholdCalibrator::open(
            dir.path().join("thresholds.json"),
            cfg.clone(),
            CategoryThresholds { min_occurrences: 3, confidence_threshold: 0.7 },
        );
        for (total, accepted) in runs {
            calibrator.observe(total, accepted);
            for category in SuggestionCategory::all() {
                let t = calibrator.thresholds(*category);
                prop_assert!(t.min_occurrences >= cfg.min_occurrences_floor);
                prop_assert!(t.min_occurrences <= cfg.min_occurrences_ceiling);
                prop_assert!((0.0..=1.0).contains(&t.confidence_threshold));
                prop_assert!(t.confidence_threshold >= cfg.confidence_floor - 1e-9);
                prop_assert!(t.confidence_threshold <= cfg.confidence_ceiling + 1e-9);
            }
            prop_assert!(calibrator.state().history.len() <= cfg.history_limit);
        }
    }
}
