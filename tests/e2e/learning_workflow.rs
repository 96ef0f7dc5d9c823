//! E2E Scenario: collect, approve, apply and calibrate through the binary.

use super::fixture::E2EFixture;

const RULES: [&str; 5] = [
    "Bash(cargo test:*)",
    "Bash(cargo fmt:*)",
    "Bash(git status)",
    "Bash(ls:*)",
    "Bash(rg:*)",
];

fn setup(scenario: &str) -> E2EFixture {
    let mut fixture = E2EFixture::new(scenario);
    fixture.log_step("Seed permission candidates");
    fixture.add_permission_candidates(&RULES);
    fixture
}

fn project_arg(fixture: &E2EFixture) -> String {
    fixture.project.display().to_string()
}

#[test]
fn test_partial_approval_then_quit() {
    let mut fixture = setup("partial_approval_then_quit");
    let project = project_arg(&fixture);

    fixture.log_step("Approve 1, reject 2, approve 3, quit, confirm apply");
    let output = fixture.run_with_input(
        &["--robot", "run", "--project", &project],
        "y\nn\ny\nq\ny\n",
    );
    fixture.assert_success(&output, "run");

    let json = output.json();
    let summary = &json["data"]["summary"];
    assert_eq!(summary["approved"], 2);
    assert_eq!(summary["rejected"], 1);
    assert_eq!(summary["skipped"], 2);
    assert_eq!(summary["applied_ok"], 2);
    assert_eq!(summary["terminal"]["state"], "quit");

    fixture.log_step("Verify settings and rejection log");
    let settings = fixture
        .read_project(".claude/settings.local.json")
        .expect("settings written");
    assert!(settings.contains(RULES[0]));
    assert!(!settings.contains(RULES[1]));
    assert!(settings.contains(RULES[2]));
    assert!(!settings.contains(RULES[3]));

    let rejections = fixture.rejection_lines();
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0]["category"], "permission");
}

#[test]
fn test_end_of_input_is_interrupt() {
    let mut fixture = setup("end_of_input_is_interrupt");
    let project = project_arg(&fixture);

    fixture.log_step("Approve one suggestion, then close stdin");
    let output = fixture.run_with_input(&["--robot", "run", "--project", &project], "y\n");

    assert_eq!(output.exit_code, 130, "stderr:\n{}", output.stderr);
    let json = output.json();
    assert_eq!(json["data"]["summary"]["approved"], 1);
    assert_eq!(json["data"]["summary"]["terminal"]["state"], "interrupted");
    assert!(fixture.read_project(".claude/settings.local.json").is_none());
}

#[test]
fn test_non_interactive_records_outcome() {
    let mut fixture = setup("non_interactive_records_outcome");

    fixture.log_step("Run without prompting");
    let output = fixture.run(&["--robot", "run", "--non-interactive"]);
    fixture.assert_success(&output, "run");
    let json = output.json();
    assert_eq!(json["data"]["report"]["total_suggestions"], 5);
    assert!(json["data"]["approval"].is_null());

    fixture.log_step("Thresholds reflect one recorded run");
    let output = fixture.run(&["--robot", "thresholds", "show"]);
    fixture.assert_success(&output, "thresholds show");
    let history = output.json()["data"]["state"]["history"].clone();
    assert_eq!(history.as_array().map(Vec::len), Some(1));
    assert_eq!(history[0]["total_suggestions"], 5);
    assert_eq!(history[0]["accepted_count"], 0);
}

#[test]
fn test_rejected_suggestion_not_offered_again() {
    let mut fixture = setup("rejected_not_offered_again");
    let project = project_arg(&fixture);

    fixture.log_step("Reject the first suggestion and skip the rest");
    let output = fixture.run_with_input(&["run", "--project", &project], "n\ns\n");
    fixture.assert_success(&output, "run");

    fixture.log_step("List rejections");
    let output = fixture.run(&["--robot", "rejections", "list", "--category", "permission"]);
    fixture.assert_success(&output, "rejections list");
    assert_eq!(
        output.json()["data"]["records"].as_array().map(Vec::len),
        Some(1)
    );

    fixture.log_step("Next run sees four suggestions");
    let output = fixture.run(&["--robot", "run", "--non-interactive", "--no-meta-learning"]);
    fixture.assert_success(&output, "second run");
    assert_eq!(output.json()["data"]["report"]["total_suggestions"], 4);
}

#[test]
fn test_dry_run_writes_nothing() {
    let mut fixture = setup("dry_run_writes_nothing");
    let project = project_arg(&fixture);

    fixture.log_step("Approve everything in dry-run mode");
    let output = fixture.run_with_input(
        &["--robot", "run", "--dry-run", "--project", &project],
        "a\ny\n",
    );
    fixture.assert_success(&output, "dry run");
    let json = output.json();
    assert_eq!(json["data"]["summary"]["applied_ok"], 5);
    assert_eq!(json["data"]["summary"]["calibration"]["status"], "dry_run");
    assert!(fixture.read_project(".claude/settings.local.json").is_none());
    assert!(!fixture.data_root.join("thresholds.json").exists());
}

#[test]
fn test_threshold_overrides_filter_candidates() {
    let mut fixture = setup("threshold_overrides");

    fixture.log_step("Require more occurrences than any candidate has");
    let output = fixture.run(&[
        "--robot",
        "run",
        "--non-interactive",
        "--min-occurrences",
        "50",
    ]);
    fixture.assert_success(&output, "run");
    let json = output.json();
    assert_eq!(json["data"]["report"]["total_suggestions"], 0);
    assert_eq!(
        json["data"]["report"]["estimated_impact_summary"],
        "No improvements identified"
    );
}

#[test]
fn test_malformed_candidates_degrade_category() {
    let mut fixture = setup("malformed_candidates");
    std::fs::write(
        fixture.data_root.join("candidates/workflow.jsonl"),
        "not json\n",
    )
    .unwrap();

    fixture.log_step("Run with one broken analyzer output");
    let output = fixture.run(&["--robot", "run", "--non-interactive"]);
    fixture.assert_success(&output, "run");
    let json = output.json();
    assert_eq!(json["data"]["summary"]["sources_failed"], 1);
    assert_eq!(json["data"]["summary"]["degraded_categories"][0], "workflow");
    assert_eq!(json["data"]["report"]["total_suggestions"], 5);
    assert!(json["status"].get("partial").is_some());
}

#[test]
fn test_thresholds_reset() {
    let mut fixture = setup("thresholds_reset");

    for _ in 0..3 {
        let output = fixture.run(&["run", "--non-interactive"]);
        fixture.assert_success(&output, "run");
    }

    fixture.log_step("Reset calibration");
    let output = fixture.run(&["--robot", "thresholds", "reset", "--yes"]);
    fixture.assert_success(&output, "reset");
    let json = output.json();
    assert_eq!(json["data"]["state"]["history"].as_array().map(Vec::len), Some(0));
    assert_eq!(
        json["data"]["state"]["categories"]["permission"]["min_occurrences"],
        3
    );
}
