//! Semantic three-way frontmatter merge
//!
//! The merge walks the key union and compares each side against the base,
//! where absence is itself a value. A key changed on one side takes that
//! side's value; a key changed on both sides to the same value takes it
//! cleanly; a key changed on both sides to different values takes the
//! server value and, when the key is tracked, records a field conflict.
//!
//! `labels` is special-cased as a set: each side's additions and removals
//! relative to the base apply independently, so label edits never conflict.
//! `modified_at` is stripped outright; the engine reassigns it after sync.

use crate::frontmatter::{FrontmatterMap, Value, CONFLICT_TRACKED_KEYS};
use std::collections::BTreeSet;

/// Result of a frontmatter merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The merged frontmatter
    pub merged: FrontmatterMap,
    /// Tracked keys where server and client changed to different values
    pub field_conflicts: Vec<String>,
}

/// Merge server and client frontmatter against an optional base
///
/// Without a base there is nothing to diff against, so the server map wins
/// wholesale and every tracked key the two sides disagree on is reported.
/// With a base, per-key three-way resolution applies as described in the
/// module docs.
///
/// `modified_at` never appears in the merged result. Conflicts are reported
/// in the tracked-key order, not encounter order.
pub fn merge_frontmatter(
    base: Option<&FrontmatterMap>,
    server: &FrontmatterMap,
    client: &FrontmatterMap,
) -> MergeOutcome {
    let mut field_conflicts = Vec::new();

    let merged = match base {
        None => {
            for key in CONFLICT_TRACKED_KEYS {
                let (s, c) = (server.get(key), client.get(key));
                if let (Some(s), Some(c)) = (s, c) {
                    if s != c {
                        field_conflicts.push(key.to_string());
                    }
                }
            }
            server
                .iter()
                .filter(|(key, _)| *key != "modified_at")
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect()
        }
        Some(base) => {
            let mut merged = FrontmatterMap::new();
            for key in union_keys(server, client) {
                if key == "modified_at" {
                    continue;
                }
                if key == "labels" {
                    if let Some(labels) = merge_labels(base, server, client) {
                        merged.set(key, labels);
                    }
                    continue;
                }

                let b = base.get(key);
                let s = server.get(key);
                let c = client.get(key);
                let winner = match (s != b, c != b) {
                    (false, false) => s,
                    (true, false) => s,
                    (false, true) => c,
                    (true, true) => {
                        if s != c && CONFLICT_TRACKED_KEYS.contains(&key) {
                            field_conflicts.push(key.to_string());
                        }
                        s
                    }
                };
                if let Some(value) = winner {
                    merged.set(key, value.clone());
                }
            }
            merged
        }
    };

    field_conflicts.sort_by_key(|key| {
        CONFLICT_TRACKED_KEYS
            .iter()
            .position(|tracked| tracked == key)
    });

    MergeOutcome {
        merged,
        field_conflicts,
    }
}

/// Key union: server keys in server order, then client-only keys
///
/// Keys present only in the base need no slot in the output; both sides
/// deleting a key keeps it deleted, and one side deleting it resolves
/// through the per-key comparison against absence.
fn union_keys<'a>(
    server: &'a FrontmatterMap,
    client: &'a FrontmatterMap,
) -> impl Iterator<Item = &'a str> {
    server
        .keys()
        .chain(client.keys().filter(|key| !server.contains(key)))
}

/// Merge `labels` as a set delta against the base
///
/// Each side's additions land and each side's removals stick, which is
/// equivalent to keeping the labels all three agree on plus each side's
/// additions. The result is sorted and deduplicated; an empty result means
/// the key is omitted.
fn merge_labels(
    base: &FrontmatterMap,
    server: &FrontmatterMap,
    client: &FrontmatterMap,
) -> Option<Value> {
    let items = |map: &FrontmatterMap| -> BTreeSet<String> {
        map.get("labels")
            .map(|value| value.as_items().into_iter().collect())
            .unwrap_or_default()
    };
    let (b, s, c) = (items(base), items(server), items(client));

    let mut merged: BTreeSet<String> = b.intersection(&s).cloned().collect();
    merged = merged.intersection(&c).cloned().collect();
    merged.extend(s.difference(&b).cloned());
    merged.extend(c.difference(&b).cloned());

    if merged.is_empty() {
        None
    } else {
        Some(Value::List(merged.into_iter().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> FrontmatterMap {
        let mut map = FrontmatterMap::new();
        for (key, value) in pairs {
            map.set(*key, Value::scalar(*value));
        }
        map
    }

    fn labels(items: &[&str]) -> Value {
        Value::list(items.iter().copied())
    }

    #[test]
    fn test_one_side_change_wins() {
        let base = map(&[("title", "Old"), ("author", "ana")]);
        let server = map(&[("title", "New"), ("author", "ana")]);
        let client = map(&[("title", "Old"), ("author", "ana")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert_eq!(outcome.merged.get("title"), Some(&Value::scalar("New")));
        assert!(outcome.field_conflicts.is_empty());
    }

    #[test]
    fn test_both_changed_same_value_is_clean() {
        let base = map(&[("title", "Old")]);
        let server = map(&[("title", "New")]);
        let client = map(&[("title", "New")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert_eq!(outcome.merged.get("title"), Some(&Value::scalar("New")));
        assert!(outcome.field_conflicts.is_empty());
    }

    #[test]
    fn test_divergent_tracked_key_server_wins_and_conflicts() {
        let base = map(&[("title", "Old")]);
        let server = map(&[("title", "Server Title")]);
        let client = map(&[("title", "Client Title")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert_eq!(
            outcome.merged.get("title"),
            Some(&Value::scalar("Server Title"))
        );
        assert_eq!(outcome.field_conflicts, vec!["title"]);
    }

    #[test]
    fn test_divergent_unrecognized_key_server_wins_silently() {
        let base = map(&[("series", "one")]);
        let server = map(&[("series", "two")]);
        let client = map(&[("series", "three")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert_eq!(outcome.merged.get("series"), Some(&Value::scalar("two")));
        assert!(outcome.field_conflicts.is_empty());
    }

    #[test]
    fn test_deletion_beats_no_change() {
        let base = map(&[("title", "Old"), ("author", "ana")]);
        let server = map(&[("title", "Old")]);
        let client = map(&[("title", "Old"), ("author", "ana")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert!(!outcome.merged.contains("author"));
        assert!(outcome.field_conflicts.is_empty());
    }

    #[test]
    fn test_delete_vs_change_is_a_conflict() {
        // Server deletes, client rewrites: both changed, values differ.
        let base = map(&[("title", "Old")]);
        let server = FrontmatterMap::new();
        let client = map(&[("title", "Rewritten")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert!(!outcome.merged.contains("title"));
        assert_eq!(outcome.field_conflicts, vec!["title"]);
    }

    #[test]
    fn test_addition_on_one_side_lands() {
        let base = map(&[("title", "Old")]);
        let server = map(&[("title", "Old")]);
        let client = map(&[("title", "Old"), ("author", "ana")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert_eq!(outcome.merged.get("author"), Some(&Value::scalar("ana")));
        assert!(outcome.field_conflicts.is_empty());
    }

    #[test]
    fn test_modified_at_never_survives() {
        let base = map(&[("modified_at", "2024-01-01")]);
        let server = map(&[("modified_at", "2024-02-02"), ("title", "T")]);
        let client = map(&[("modified_at", "2024-03-03"), ("title", "T")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert!(!outcome.merged.contains("modified_at"));
        assert!(outcome.field_conflicts.is_empty());

        let outcome = merge_frontmatter(None, &server, &client);
        assert!(!outcome.merged.contains("modified_at"));
    }

    #[test]
    fn test_labels_set_delta() {
        let mut base = FrontmatterMap::new();
        base.set("labels", labels(&["keep", "server-drops", "client-drops"]));
        let mut server = FrontmatterMap::new();
        server.set("labels", labels(&["keep", "client-drops", "server-adds"]));
        let mut client = FrontmatterMap::new();
        client.set("labels", labels(&["keep", "server-drops", "client-adds"]));

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert_eq!(
            outcome.merged.get("labels"),
            Some(&labels(&["client-adds", "keep", "server-adds"]))
        );
        assert!(outcome.field_conflicts.is_empty());
    }

    #[test]
    fn test_labels_never_conflict() {
        let mut base = FrontmatterMap::new();
        base.set("labels", labels(&["a"]));
        let mut server = FrontmatterMap::new();
        server.set("labels", labels(&["b"]));
        let mut client = FrontmatterMap::new();
        client.set("labels", labels(&["c"]));

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert!(outcome.field_conflicts.is_empty());
        assert_eq!(outcome.merged.get("labels"), Some(&labels(&["b", "c"])));
    }

    #[test]
    fn test_labels_empty_result_omitted() {
        let mut base = FrontmatterMap::new();
        base.set("labels", labels(&["only"]));
        let server = FrontmatterMap::new();
        let mut client = FrontmatterMap::new();
        client.set("labels", labels(&["only"]));

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert!(!outcome.merged.contains("labels"));
    }

    #[test]
    fn test_labels_result_sorted_and_deduped() {
        let base = FrontmatterMap::new();
        let mut server = FrontmatterMap::new();
        server.set("labels", labels(&["zebra", "apple"]));
        let mut client = FrontmatterMap::new();
        client.set("labels", labels(&["apple", "mango"]));

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert_eq!(
            outcome.merged.get("labels"),
            Some(&labels(&["apple", "mango", "zebra"]))
        );
    }

    #[test]
    fn test_no_base_server_wins_wholesale() {
        let server = map(&[("title", "S"), ("author", "ana")]);
        let client = map(&[("title", "C"), ("draft", "true")]);

        let outcome = merge_frontmatter(None, &server, &client);
        assert_eq!(outcome.merged.get("title"), Some(&Value::scalar("S")));
        assert_eq!(outcome.merged.get("author"), Some(&Value::scalar("ana")));
        assert!(!outcome.merged.contains("draft"));
        assert_eq!(outcome.field_conflicts, vec!["title"]);
    }

    #[test]
    fn test_conflicts_reported_in_tracked_key_order() {
        let base = map(&[("draft", "false"), ("title", "Old")]);
        let server = map(&[("draft", "true"), ("title", "S")]);
        let client = map(&[("draft", "maybe"), ("title", "C")]);

        let outcome = merge_frontmatter(Some(&base), &server, &client);
        assert_eq!(outcome.field_conflicts, vec!["title", "draft"]);
    }

    #[test]
    fn test_key_order_follows_server_then_client() {
        let base = FrontmatterMap::new();
        let base = Some(&base);
        let server = map(&[("title", "T"), ("author", "ana")]);
        let client = map(&[("title", "T"), ("draft", "true")]);

        let outcome = merge_frontmatter(base, &server, &client);
        let keys: Vec<&str> = outcome.merged.keys().collect();
        assert_eq!(keys, vec!["title", "author", "draft"]);
    }
}
