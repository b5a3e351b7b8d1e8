//! Property-based tests for manifest component filtering.
//!
//! These tests use proptest to generate random component lists and verify
//! that the board filter's invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::manifest::{filter_board_components, is_board_identifier};
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};

    /// Build a manifest document with a `component` list of the given ids.
    fn manifest_with_ids(ids: &[String]) -> Value {
        let components = ids
            .iter()
            .map(|id| {
                let mut entry = Mapping::new();
                entry.insert("id".into(), Value::String(id.clone()));
                Value::Mapping(entry)
            })
            .collect();
        let mut root = Mapping::new();
        root.insert("component".into(), Value::Sequence(components));
        root.insert("project_name".into(), "generated".into());
        Value::Mapping(root)
    }

    fn surviving_ids(doc: &Value) -> Vec<String> {
        doc["component"]
            .as_sequence()
            .map(|seq| {
                seq.iter()
                    .filter_map(|c| c.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    // ============================================================================
    // filter_board_components property tests
    // ============================================================================

    proptest! {
        /// Property: filtering is idempotent (a second pass removes nothing)
        #[test]
        fn filter_is_idempotent(
            ids in prop::collection::vec("[a-zA-Z][a-zA-Z0-9_]{0,12}", 0..10),
        ) {
            let mut doc = manifest_with_ids(&ids);
            filter_board_components(&mut doc);
            let after_first = surviving_ids(&doc);

            let removed_again = filter_board_components(&mut doc);
            prop_assert!(
                removed_again.is_empty(),
                "second pass removed {:?}",
                removed_again
            );
            prop_assert_eq!(surviving_ids(&doc), after_first);
        }

        /// Property: ids without a board prefix always survive
        #[test]
        fn neutral_ids_survive(
            ids in prop::collection::vec("[g-z][a-z0-9_]{0,12}", 1..10),
        ) {
            let mut doc = manifest_with_ids(&ids);
            let removed = filter_board_components(&mut doc);
            prop_assert!(removed.is_empty(), "removed neutral ids {:?}", removed);
            prop_assert_eq!(surviving_ids(&doc), ids);
        }

        /// Property: ids with a board prefix are removed whatever their case
        #[test]
        fn board_ids_are_removed(
            prefix in "(brd|BRD|Brd|bRD|efr32|EFR32|Efr32|eFR32)",
            rest in "[a-z0-9]{0,10}",
        ) {
            let id = format!("{}{}", prefix, rest);
            prop_assert!(is_board_identifier(&id));

            let mut doc = manifest_with_ids(&[id.clone()]);
            let removed = filter_board_components(&mut doc);
            prop_assert_eq!(removed, vec![id]);
            prop_assert!(surviving_ids(&doc).is_empty());
        }

        /// Property: removed and surviving ids partition the input list
        #[test]
        fn removed_plus_surviving_equals_input(
            ids in prop::collection::vec("[a-zA-Z][a-zA-Z0-9]{0,12}", 0..12),
        ) {
            let mut doc = manifest_with_ids(&ids);
            let removed = filter_board_components(&mut doc);
            let surviving = surviving_ids(&doc);

            prop_assert_eq!(removed.len() + surviving.len(), ids.len());
            for id in &removed {
                prop_assert!(is_board_identifier(id), "kept verdict wrong for '{}'", id);
            }
            for id in &surviving {
                prop_assert!(!is_board_identifier(id), "removal missed '{}'", id);
            }
        }

        /// Property: keys outside `component` are never touched
        #[test]
        fn other_keys_survive_filtering(
            ids in prop::collection::vec("(brd|BRD)[0-9]{1,4}", 1..6),
        ) {
            let mut doc = manifest_with_ids(&ids);
            filter_board_components(&mut doc);
            prop_assert_eq!(doc["project_name"].as_str(), Some("generated"));
        }
    }

    // ============================================================================
    // is_board_identifier property tests
    // ============================================================================

    proptest! {
        /// Property: the board verdict is deterministic
        #[test]
        fn verdict_is_deterministic(id in ".*") {
            prop_assert_eq!(is_board_identifier(&id), is_board_identifier(&id));
        }

        /// Property: ASCII case changes never change the board verdict
        #[test]
        fn verdict_is_case_insensitive(id in "[a-zA-Z0-9]{1,16}") {
            let upper = id.to_ascii_uppercase();
            let lower = id.to_ascii_lowercase();
            prop_assert_eq!(is_board_identifier(&upper), is_board_identifier(&lower));
        }

        /// Property: appending to a board id keeps it a board id
        #[test]
        fn board_prefix_is_sticky(suffix in "[a-zA-Z0-9_]*") {
            let brd_id = format!("brd{}", suffix);
            let efr32_id = format!("efr32{}", suffix);
            prop_assert!(is_board_identifier(&brd_id));
            prop_assert!(is_board_identifier(&efr32_id));
        }
    }
}
