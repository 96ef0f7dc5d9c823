use std::collections::BTreeMap;

use config_learn::learning::{LearningReport, NO_IMPROVEMENTS};
use config_learn::suggestions::{McpAction, Priority, Suggestion, SuggestionCategory, SuggestionPayload};

fn permission(i: u32) -> Suggestion {
    Suggestion::new(
        format!("allow tool {i}"),
        Priority::HIGH,
        SuggestionPayload::Permission {
            rule: format!("Bash(tool{i})"),
            occurrences: i,
        },
    )
    .unwrap()
}

fn mcp(server: &str) -> Suggestion {
    Suggestion::new(
        format!("disable {server}"),
        Priority::MEDIUM,
        SuggestionPayload::McpOptimization {
            server: server.to_string(),
            action: McpAction::Disable,
            estimated_tokens: 1200,
        },
    )
    .unwrap()
}

#[test]
fn report_caps_each_category_and_joins_snippets() {
    let mut collected = BTreeMap::new();
    collected.insert(SuggestionCategory::Permission, (1..=4).map(permission).collect());
    collected.insert(SuggestionCategory::McpOptimization, vec![mcp("search")]);
    collected.insert(SuggestionCategory::Workflow, Vec::new());

    let report = LearningReport::consolidate(collected, 2, BTreeMap::new());

    assert_eq!(report.count(SuggestionCategory::Permission), 2);
    assert_eq!(report.total_suggestions, 3);
    assert_eq!(
        report.estimated_impact_summary,
        "2 permission rules would remove 3 approval prompts; 1 MCP server change could save ~1200 tokens per session"
    );
    let order: Vec<_> = report.suggestions().map(Suggestion::category).collect();
    assert_eq!(
        order,
        vec![
            SuggestionCategory::Permission,
            SuggestionCategory::Permission,
            SuggestionCategory::McpOptimization
        ]
    );
}

#[test]
fn empty_report_reads_no_improvements() {
    let mut collected = BTreeMap::new();
    collected.insert(SuggestionCategory::Permission, Vec::new());
    let mut insights = BTreeMap::new();
    insights.insert("system_health".to_string(), 0.5);

    let report = LearningReport::consolidate(collected, 10, insights);

    assert!(report.is_empty());
    assert_eq!(report.estimated_impact_summary, NO_IMPROVEMENTS);
    assert!((report.meta_insights["system_health"] - 0.5).abs() < f64::EPSILON);
}
