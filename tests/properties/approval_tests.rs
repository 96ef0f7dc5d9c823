use std::time::Duration;

use proptest::prelude::*;
use tempfile::TempDir;

use config_learn::learning::{ApprovalState, ApprovalWorkflow, RejectionMemory};
use config_learn::suggestions::{Priority, Suggestion, SuggestionPayload};
use config_learn::test_utils::ScriptedIo;

fn suggestions(n: usize) -> Vec<Suggestion> {
    (1..=n)
        .map(|i| {
            Suggestion::new(
                format!("allow tool {i}"),
                Priority::LOW,
                SuggestionPayload::Permission {
                    rule: format!("Bash(tool{i})"),
                    occurrences: 3,
                },
            )
            .unwrap()
        })
        .collect()
}

fn answers(total: usize) -> impl Strategy<Value = (usize, Vec<&'static str>)> {
    (Just(total), prop::collection::vec(prop::sample::select(vec!["y", "n", "a", "s", "q", "?"]), 0..total + 3))
}

proptest! {
    #[test]
    fn test_decisions_partition_suggestions((total, script) in (1usize..8).prop_flat_map(answers)) {
        let dir = TempDir::new().unwrap();
        let memory = RejectionMemory::new(dir.path().join("rejections.jsonl"), 90, Duration::ZERO);
        let items = suggestions(total);
        let mut io = ScriptedIo::new(script);

        let outcome = ApprovalWorkflow::new(&memory, "prop").run(&items, &mut io);

        prop_assert!(outcome.terminal.is_terminal());
        prop_assert_eq!(outcome.decisions.len() + outcome.unresolved.len(), total);
        prop_assert_eq!(
            memory.recent(90, None).unwrap().len(),
            outcome.rejected_count()
        );
        let positions: Vec<usize> = outcome
            .approved
            .iter()
            .map(|s| items.iter().position(|i| i == s).unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_skip_all_resolves_prefix(total in 1usize..10, at in 0usize..10) {
        let at = at % total;
        let dir = TempDir::new().unwrap();
        let memory = RejectionMemory::new(dir.path().join("rejections.jsonl"), 90, Duration::ZERO);
        let mut script = vec!["y"; at];
        script.push("s");

        let outcome = ApprovalWorkflow::new(&memory, "prop").run(&suggestions(total), &mut ScriptedIo::new(script));

        prop_assert_eq!(outcome.terminal, ApprovalState::Complete);
        prop_assert_eq!(outcome.decisions.len(), at);
        prop_assert_eq!(outcome.unresolved.len(), total - at);
    }

    #[test]
    fn test_approve_all_approves_everything(total in 1usize..10, at in 0usize..10) {
        let at = at % total;
        let dir = TempDir::new().unwrap();
        let memory = RejectionMemory::new(dir.path().join("rejections.jsonl"), 90, Duration::ZERO);
        let mut script = vec!["y"; at];
        script.push("a");

        let outcome = ApprovalWorkflow::new(&memory, "prop").run(&suggestions(total), &mut ScriptedIo::new(script));

        prop_assert_eq!(outcome.approved.len(), total);
        prop_assert!(outcome.unresolved.is_empty());
    }
}
