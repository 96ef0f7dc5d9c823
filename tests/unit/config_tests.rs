use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use config_learn::config::Config;
use config_learn::suggestions::SuggestionCategory;
use config_learn::test_utils::{TestCase, run_table_tests};

fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

fn parse(relative: &str) -> Config {
    let content = fs::read_to_string(fixture_path(relative)).expect("read fixture");
    toml::from_str(&content).expect("parse config")
}

#[test]
fn config_learning_from_fixture() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "default",
            input: "tests/fixtures/configs/default.toml",
            expected: (30u32, 10usize, 3u32, true, 6usize),
            should_panic: false,
        },
        TestCase {
            name: "custom",
            input: "tests/fixtures/configs/custom.toml",
            expected: (14u32, 5usize, 4u32, false, 3usize),
            should_panic: false,
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = parse(relative_path);
        (
            config.learning.analysis_window_days,
            config.learning.max_suggestions_per_category,
            config.learning.min_occurrences,
            config.learning.meta_learning,
            config.learning.categories.len(),
        )
    })
}

#[test]
fn config_rejections_and_calibration_from_fixture() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "default",
            input: "tests/fixtures/configs/default.toml",
            expected: (90u32, Duration::from_secs(30), 3usize, None),
            should_panic: false,
        },
        TestCase {
            name: "custom",
            input: "tests/fixtures/configs/custom.toml",
            expected: (
                30u32,
                Duration::from_secs(120),
                5usize,
                Some(PathBuf::from("inbox")),
            ),
            should_panic: false,
        },
    ];

    run_table_tests(cases, |relative_path| {
        let config = parse(relative_path);
        (
            config.rejections.retention_days,
            config.rejections.cache_ttl,
            config.calibration.rolling_window,
            config.paths.candidates_dir,
        )
    })
}

#[test]
fn custom_fixture_validates() {
    let config = parse("tests/fixtures/configs/custom.toml");
    config.validate().unwrap();
    assert!(config.learning.categories.contains(&SuggestionCategory::McpOptimization));
    assert!((config.calibration.confidence_step - 0.05).abs() < f64::EPSILON);
}

#[test]
fn category_names_parse_with_aliases() -> Result<(), String> {
    let cases = vec![
        TestCase {
            name: "snake",
            input: "cross_project_transfer",
            expected: Some(SuggestionCategory::CrossProjectTransfer),
            should_panic: false,
        },
        TestCase {
            name: "kebab",
            input: "mcp-optimization",
            expected: Some(SuggestionCategory::McpOptimization),
            should_panic: false,
        },
        TestCase {
            name: "unknown",
            input: "telepathy",
            expected: None,
            should_panic: false,
        },
    ];
    run_table_tests(cases, |name| name.parse::<SuggestionCategory>().ok())
}
