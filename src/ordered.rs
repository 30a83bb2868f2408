//! Explicit sort-order discipline for id-keyed entities
//!
//! Entities carry an integer `sort_order`. Reordering takes a target
//! permutation (ordered list of ids) and rewrites every entity's key to its
//! 0-based position; entities the permutation does not name follow in their
//! previous relative order. Applying the same permutation twice is a no-op.

use std::collections::HashMap;

/// An entity with a stable id and an explicit sort key
pub trait SortKeyed {
    fn sort_id(&self) -> &str;
    fn sort_order(&self) -> i32;
    fn set_sort_order(&mut self, order: i32);
}

/// Key for a newly appended entity: `max + 1`, or 0 for an empty set
pub fn next_sort_order<T: SortKeyed>(items: &[T]) -> i32 {
    items
        .iter()
        .map(SortKeyed::sort_order)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

/// Stable sort by key; ties keep insertion order
pub fn sort_stable<T: SortKeyed>(items: &mut [T]) {
    items.sort_by_key(SortKeyed::sort_order);
}

/// Rewrite sort keys to follow `order`.
///
/// Unknown ids are ignored (they never resurrect removed entities) and a
/// repeated id only counts at its first position. Runs in O(n) over the
/// entities plus the permutation.
pub fn reorder<T, S>(items: Vec<T>, order: &[S]) -> Vec<T>
where
    T: SortKeyed,
    S: AsRef<str>,
{
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    // "previous relative order" means current key order, not vec position
    slots.sort_by_key(|slot| slot.as_ref().map(SortKeyed::sort_order));

    let index: HashMap<String, usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(i, slot)| slot.as_ref().map(|item| (item.sort_id().to_string(), i)))
        .collect();

    let mut result = Vec::with_capacity(slots.len());
    for id in order {
        if let Some(&i) = index.get(id.as_ref())
            && let Some(item) = slots[i].take()
        {
            result.push(item);
        }
    }
    result.extend(slots.into_iter().flatten());

    for (position, item) in result.iter_mut().enumerate() {
        item.set_sort_order(position as i32);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry {
        id: String,
        order: i32,
    }

    impl SortKeyed for Entry {
        fn sort_id(&self) -> &str {
            &self.id
        }
        fn sort_order(&self) -> i32 {
            self.order
        }
        fn set_sort_order(&mut self, order: i32) {
            self.order = order;
        }
    }

    fn entries(pairs: &[(&str, i32)]) -> Vec<Entry> {
        pairs.iter()
            .map(|(id, order)| Entry { id: id.to_string(), order: *order })
            .collect()
    }

    fn layout(items: &[Entry]) -> Vec<(String, i32)> {
        items.iter().map(|e| (e.id.clone(), e.order)).collect()
    }

    #[test]
    fn test_partial_permutation_appends_rest() {
        let items = entries(&[("c1", 0), ("c2", 1), ("c3", 2)]);
        let result = reorder(items, &["c3", "c1"]);
        assert_eq!(
            layout(&result),
            vec![("c3".into(), 0), ("c1".into(), 1), ("c2".into(), 2)]
        );
    }

    #[test]
    fn test_reorder_is_idempotent() {
        let items = entries(&[("a", 5), ("b", 9), ("c", 7), ("d", 1)]);
        let order = ["c", "a"];
        let once = reorder(items, &order);
        let twice = reorder(once.clone(), &order);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_ids_ignored() {
        let items = entries(&[("a", 0), ("b", 1)]);
        let result = reorder(items, &["ghost", "b", "deleted"]);
        assert_eq!(layout(&result), vec![("b".into(), 0), ("a".into(), 1)]);
    }

    #[test]
    fn test_duplicate_ids_count_once() {
        let items = entries(&[("a", 0), ("b", 1), ("c", 2)]);
        let result = reorder(items, &["b", "b", "a"]);
        assert_eq!(
            layout(&result),
            vec![("b".into(), 0), ("a".into(), 1), ("c".into(), 2)]
        );
    }

    #[test]
    fn test_unnamed_follow_previous_key_order() {
        // Vec position disagrees with key order; key order wins
        let items = entries(&[("z", 3), ("y", 1), ("x", 2), ("w", 0)]);
        let result = reorder(items, &["x"]);
        assert_eq!(
            layout(&result),
            vec![("x".into(), 0), ("w".into(), 1), ("y".into(), 2), ("z".into(), 3)]
        );
    }

    #[test]
    fn test_next_sort_order() {
        assert_eq!(next_sort_order::<Entry>(&[]), 0);
        assert_eq!(next_sort_order(&entries(&[("a", 4), ("b", 2)])), 5);
    }

    #[test]
    fn test_sort_stable_keeps_ties_in_insertion_order() {
        let mut items = entries(&[("late", 1), ("first", 0), ("tie", 1)]);
        sort_stable(&mut items);
        let ids: Vec<_> = items.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "late", "tie"]);
    }
}
