use proptest::prelude::*;

use config_learn::suggestions::{Fingerprint, Priority, Suggestion, SuggestionPayload};

fn permission(description: &str, rule: &str) -> Suggestion {
    Suggestion::new(
        description.to_string(),
        Priority::MEDIUM,
        SuggestionPayload::Permission {
            rule: rule.to_string(),
            occurrences: 3,
        },
    )
    .unwrap()
}

proptest! {
    #[test]
    fn test_fingerprint_deterministic(description in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,39}", rule in "[a-zA-Z][a-zA-Z():* ]{0,29}") {
        let first = permission(&description, &rule);
        let second = permission(&description, &rule);
        prop_assert_eq!(first.fingerprint(), second.fingerprint());
        prop_assert_eq!(first.fingerprint().as_str().len(), 32);
    }

    #[test]
    fn test_fingerprint_survives_serialization(description in "[a-z][a-z ]{0,39}", rule in "[a-z]{1,20}") {
        let original = permission(&description, &rule);
        let json = serde_json::to_string(&original).unwrap();
        let restored: Suggestion = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(original.fingerprint(), restored.fingerprint());
    }

    #[test]
    fn test_distinct_rules_distinct_fingerprints(a in "[a-z]{1,20}", b in "[a-z]{1,20}") {
        prop_assume!(a != b);
        let fa: Fingerprint = permission("allow", &a).fingerprint().clone();
        let fb: Fingerprint = permission("allow", &b).fingerprint().clone();
        prop_assert_ne!(fa, fb);
    }
}
