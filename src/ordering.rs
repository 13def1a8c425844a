//! Sibling ordering math. `display_order` is always a dense one-based
//! sequence per parent; the store feeds these functions the current ordered
//! id list inside a transaction and writes back the renumbered result, so the
//! sequence survives every insert, delete, and drag-and-drop move.

use std::collections::BTreeMap;
use uuid::Uuid;

/// Resolve a requested one-based insert position against the current sibling
/// count. None means append; out-of-range values clamp into `1..=len+1`.
pub fn clamp_position(len: usize, requested: Option<i64>) -> usize {
    match requested {
        None => len + 1,
        Some(p) => p.clamp(1, len as i64 + 1) as usize,
    }
}

/// Splice-and-reinsert: remove the element at `from`, then insert it at `to`
/// (both zero-based). Elements strictly between the two indexes shift by one
/// toward the vacated slot; nothing else changes relative order. Not a swap.
pub fn splice_move(ids: &mut Vec<Uuid>, from: usize, to: usize) {
    if from == to || from >= ids.len() {
        return;
    }
    let id = ids.remove(from);
    let to = to.min(ids.len());
    ids.insert(to, id);
}

/// Assign dense one-based orders to an id list.
pub fn renumber(ids: &[Uuid]) -> Vec<(Uuid, i32)> {
    ids.iter().enumerate().map(|(i, &id)| (id, i as i32 + 1)).collect()
}

/// The class invariant: orders are exactly `{1..N}`, in any arrangement.
pub fn is_dense(orders: &[i32]) -> bool {
    let mut sorted = orders.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, &o)| o == i as i32 + 1)
}

/// A reorder submission must name the current children exactly once each.
/// Multiset diff against the current list: `(missing, unexpected)` — ids the
/// submission dropped, and ids it names that are not (or no longer) children.
/// Both empty means the submission is a permutation and may be applied.
pub fn membership_diff(current: &[Uuid], submitted: &[Uuid]) -> (Vec<Uuid>, Vec<Uuid>) {
    let mut counts: BTreeMap<Uuid, i64> = BTreeMap::new();
    for &id in current {
        *counts.entry(id).or_default() += 1;
    }
    for &id in submitted {
        *counts.entry(id).or_default() -= 1;
    }
    let mut missing = Vec::new();
    let mut unexpected = Vec::new();
    for (id, n) in counts {
        for _ in 0..n.max(0) {
            missing.push(id);
        }
        for _ in 0..(-n).max(0) {
            unexpected.push(id);
        }
    }
    (missing, unexpected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn clamp_defaults_to_append() {
        assert_eq!(clamp_position(0, None), 1);
        assert_eq!(clamp_position(4, None), 5);
        assert_eq!(clamp_position(4, Some(2)), 2);
        assert_eq!(clamp_position(4, Some(99)), 5);
        assert_eq!(clamp_position(4, Some(0)), 1);
        assert_eq!(clamp_position(4, Some(-3)), 1);
    }

    #[test]
    fn move_last_to_front() {
        // [A,B,C,D], move D (index 3) to index 0 -> [D,A,B,C].
        let v = ids(4);
        let mut moved = v.clone();
        splice_move(&mut moved, 3, 0);
        assert_eq!(moved, vec![v[3], v[0], v[1], v[2]]);
        let orders: Vec<i32> = renumber(&moved).iter().map(|&(_, o)| o).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn move_forward_shifts_only_the_span() {
        // [A,B,C,D,E], move B (1) to index 3 -> [A,C,D,B,E].
        let v = ids(5);
        let mut moved = v.clone();
        splice_move(&mut moved, 1, 3);
        assert_eq!(moved, vec![v[0], v[2], v[3], v[1], v[4]]);
        // A and E keep their slots; only C and D shifted, by exactly one.
        assert_eq!(moved[0], v[0]);
        assert_eq!(moved[4], v[4]);
    }

    #[test]
    fn move_to_same_index_is_a_noop() {
        let v = ids(3);
        let mut moved = v.clone();
        splice_move(&mut moved, 1, 1);
        assert_eq!(moved, v);
    }

    #[test]
    fn out_of_range_source_is_ignored() {
        let v = ids(3);
        let mut moved = v.clone();
        splice_move(&mut moved, 7, 0);
        assert_eq!(moved, v);
    }

    #[test]
    fn removal_renumbers_densely() {
        // Delete the entity at order 2 of 4; survivors renumber to [1,2,3]
        // preserving relative order.
        let v = ids(4);
        let mut remaining = v.clone();
        remaining.remove(1);
        let renumbered = renumber(&remaining);
        assert_eq!(
            renumbered,
            vec![(v[0], 1), (v[2], 2), (v[3], 3)]
        );
        assert!(is_dense(&renumbered.iter().map(|&(_, o)| o).collect::<Vec<_>>()));
    }

    #[test]
    fn density_holds_under_mixed_operations() {
        let mut list = ids(1);
        // insert at front, append, move around, remove, in a fixed sequence
        list.insert(0, Uuid::new_v4());
        list.push(Uuid::new_v4());
        list.insert(clamp_position(list.len(), Some(2)) - 1, Uuid::new_v4());
        splice_move(&mut list, 3, 0);
        splice_move(&mut list, 0, 2);
        list.remove(1);
        let orders: Vec<i32> = renumber(&list).iter().map(|&(_, o)| o).collect();
        assert!(is_dense(&orders));
        assert_eq!(orders.len(), 3);
    }

    #[test]
    fn renumber_is_idempotent() {
        let v = ids(5);
        assert_eq!(renumber(&v), renumber(&v));
    }

    #[test]
    fn membership_diff_accepts_permutations() {
        let v = ids(3);
        let shuffled = vec![v[2], v[0], v[1]];
        assert_eq!(membership_diff(&v, &shuffled), (vec![], vec![]));
    }

    #[test]
    fn membership_diff_names_the_drifted_ids() {
        let v = ids(3);

        // sibling deleted under us: the dropped id is reported as missing
        let short = vec![v[2], v[0]];
        let (missing, unexpected) = membership_diff(&v, &short);
        assert_eq!(missing, vec![v[1]]);
        assert!(unexpected.is_empty());

        // unknown id smuggled in at the same cardinality: both sides named
        let foreign = Uuid::new_v4();
        let swapped = vec![foreign, v[1], v[2]];
        let (missing, unexpected) = membership_diff(&v, &swapped);
        assert_eq!(missing, vec![v[0]]);
        assert_eq!(unexpected, vec![foreign]);

        // duplicated id counts as both missing and unexpected
        let doubled = vec![v[0], v[0], v[2]];
        let (missing, unexpected) = membership_diff(&v, &doubled);
        assert_eq!(missing, vec![v[1]]);
        assert_eq!(unexpected, vec![v[0]]);
    }

    #[test]
    fn is_dense_spots_gaps_and_duplicates() {
        assert!(is_dense(&[1, 2, 3]));
        assert!(is_dense(&[3, 1, 2]));
        assert!(is_dense(&[]));
        assert!(!is_dense(&[1, 2, 4]));
        assert!(!is_dense(&[1, 2, 2]));
        assert!(!is_dense(&[0, 1, 2]));
    }
}
