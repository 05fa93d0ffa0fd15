//! Idempotent merge of fetched records into an existing collection.

use std::collections::HashSet;

/// Concatenate `existing` and `incoming`, keeping only the last occurrence of
/// each key. Survivors keep their relative order in the concatenation.
///
/// `merge(e, [])` is `e` (less any duplicates `e` already had), merging the
/// same batch twice equals merging it once, and `merge([], i)` is a cold start.
pub fn merge<T, K, F>(existing: Vec<T>, incoming: Vec<T>, key_fn: F) -> Vec<T>
where
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K,
{
    let combined: Vec<T> = existing.into_iter().chain(incoming).collect();

    // Walk backwards so the first time a key is seen is its last occurrence
    let mut seen = HashSet::with_capacity(combined.len());
    let mut survivors: Vec<T> = combined
        .into_iter()
        .rev()
        .filter(|item| seen.insert(key_fn(item)))
        .collect();
    survivors.reverse();
    survivors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: &'static str,
        value: u32,
    }

    fn row(id: &'static str, value: u32) -> Row {
        Row { id, value }
    }

    fn by_id(r: &Row) -> &'static str {
        r.id
    }

    #[test]
    fn test_merge_with_empty_incoming_is_identity() {
        let existing = vec![row("a", 1), row("b", 2)];
        assert_eq!(merge(existing.clone(), Vec::new(), by_id), existing);
    }

    #[test]
    fn test_cold_start() {
        let incoming = vec![row("a", 1), row("b", 2)];
        assert_eq!(merge(Vec::new(), incoming.clone(), by_id), incoming);
    }

    #[test]
    fn test_incoming_wins() {
        let existing = vec![row("a", 1), row("b", 2), row("c", 3)];
        let incoming = vec![row("b", 20), row("d", 4)];

        let merged = merge(existing, incoming, by_id);
        assert_eq!(
            merged,
            vec![row("a", 1), row("c", 3), row("b", 20), row("d", 4)]
        );
    }

    #[test]
    fn test_later_incoming_wins_within_batch() {
        let merged = merge(Vec::new(), vec![row("a", 1), row("a", 2)], by_id);
        assert_eq!(merged, vec![row("a", 2)]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = vec![row("a", 1), row("b", 2)];
        let incoming = vec![row("b", 5), row("c", 6)];

        let once = merge(existing, incoming.clone(), by_id);
        let twice = merge(once.clone(), incoming, by_id);
        assert_eq!(once, twice);
    }
}
