//! Nearest-index search over a key sequence with gaps.
//!
//! Present keys strictly increase with the logical index, but any slot may be
//! empty. The search is a binary search that steps over empty slots by linear
//! probing instead of keeping a separate index of present slots.

use crate::core::{IndexedKeys, LogicalIndex, StrictRange, TimeKey};

type Candidate = (LogicalIndex, TimeKey);

/// Index of the present point whose key is closest to `target` within `bounds`.
///
/// `bounds` is first clipped to the source's slot extent. An empty slot at the
/// midpoint is replaced by the first present slot after it (up to the right
/// cursor), or failing that the last one before it, and the stand-in is
/// compared like a regular midpoint. Present points the search has stepped
/// past stay candidates: `below` is the last one with a smaller key, `above`
/// the first one with a larger key. The answer is always one of the two
/// points bracketing `target`.
///
/// When the window narrows to two slots, the slot on the target's side of the
/// midpoint is read to find the bracketing pair. `above` or `below` stands in
/// when that slot is empty, is the midpoint itself, or lies on the same side
/// of the target as the midpoint. Ties go to the lower index.
///
/// When the cursors cross or the open window turns out to be all gaps,
/// `above` and `below` are compared and ties go to `above`, which is where the
/// left cursor ends up.
///
/// Returns `None` when `bounds` is absent or holds no present point.
#[must_use]
pub fn nearest_index<S>(
    source: &S,
    target: TimeKey,
    bounds: Option<StrictRange>,
) -> Option<LogicalIndex>
where
    S: IndexedKeys + ?Sized,
{
    let bounds = bounds?.intersect(source.slot_extent()?)?;
    let mut left = bounds.left();
    let mut right = bounds.right();
    let mut below: Option<Candidate> = None;
    let mut above: Option<Candidate> = None;

    while left <= right {
        let probe = left + (right.abs_diff(left) / 2) as LogicalIndex;
        let (mid, mid_key) = match source.key_at(probe) {
            Some(key) => (probe, key),
            None => {
                if let Some(found) = probe_forward(source, probe, right) {
                    found
                } else if let Some(found) = probe_backward(source, left, probe) {
                    // Everything after the stand-in up to `right` is empty.
                    right = found.0;
                    found
                } else {
                    break;
                }
            }
        };

        if mid_key == target {
            return Some(mid);
        }
        if right.checked_sub(1) == Some(left) {
            let (lower, upper) = if mid_key < target {
                match present(source, right).filter(|_| mid < right) {
                    Some(next) if next.1 < target => (Some(next), above),
                    Some(next) => (Some((mid, mid_key)), Some(next)),
                    None => (Some((mid, mid_key)), above),
                }
            } else {
                match present(source, left).filter(|_| mid > left) {
                    Some(previous) if previous.1 > target => (below, Some(previous)),
                    Some(previous) => (Some(previous), Some((mid, mid_key))),
                    None => (below, Some((mid, mid_key))),
                }
            };
            return closer(target, lower, upper);
        }
        if mid_key < target {
            below = Some((mid, mid_key));
            match mid.checked_add(1) {
                Some(next) => left = next,
                None => break,
            }
        } else {
            above = Some((mid, mid_key));
            match mid.checked_sub(1) {
                Some(previous) => right = previous,
                None => break,
            }
        }
    }

    closer(target, above, below)
}

fn present<S>(source: &S, index: LogicalIndex) -> Option<Candidate>
where
    S: IndexedKeys + ?Sized,
{
    source.key_at(index).map(|key| (index, key))
}

/// First present slot in `(after, to]`.
fn probe_forward<S>(source: &S, after: LogicalIndex, to: LogicalIndex) -> Option<Candidate>
where
    S: IndexedKeys + ?Sized,
{
    (after..=to).skip(1).find_map(|index| present(source, index))
}

/// Last present slot in `[from, before)`.
fn probe_backward<S>(source: &S, from: LogicalIndex, before: LogicalIndex) -> Option<Candidate>
where
    S: IndexedKeys + ?Sized,
{
    (from..before).rev().find_map(|index| present(source, index))
}

/// Nearer of the two candidates to `target`; `preferred` wins ties.
fn closer(
    target: TimeKey,
    preferred: Option<Candidate>,
    other: Option<Candidate>,
) -> Option<LogicalIndex> {
    match (preferred, other) {
        (Some((preferred_index, preferred_key)), Some((other_index, other_key))) => {
            if distance(preferred_key, target) <= distance(other_key, target) {
                Some(preferred_index)
            } else {
                Some(other_index)
            }
        }
        (Some((index, _)), None) | (None, Some((index, _))) => Some(index),
        (None, None) => None,
    }
}

fn distance(key: TimeKey, target: TimeKey) -> f64 {
    (key.0 - target.0).abs()
}

#[cfg(test)]
mod tests {
    use ordered_float::OrderedFloat;

    use super::nearest_index;
    use crate::core::{IndexedKeys, LogicalIndex, StrictRange, TimeKey};

    struct Keys(Vec<Option<f64>>);

    impl IndexedKeys for Keys {
        fn key_at(&self, index: LogicalIndex) -> Option<TimeKey> {
            usize::try_from(index)
                .ok()
                .and_then(|i| self.0.get(i).copied().flatten())
                .map(OrderedFloat)
        }

        fn slot_extent(&self) -> Option<StrictRange> {
            let last = LogicalIndex::try_from(self.0.len()).ok()? - 1;
            StrictRange::try_new(0, last).ok()
        }
    }

    fn bounds(left: LogicalIndex, right: LogicalIndex) -> Option<StrictRange> {
        Some(StrictRange::try_new(left, right).expect("range"))
    }

    #[test]
    fn crossed_cursors_prefer_left_cursor_on_tie() {
        let keys = Keys(vec![Some(1.0), Some(5.0), Some(9.0)]);
        assert_eq!(nearest_index(&keys, OrderedFloat(7.0), bounds(0, 2)), Some(2));
    }

    #[test]
    fn open_two_candidate_window_prefers_lower_index_on_tie() {
        let keys = Keys(vec![Some(1.0), Some(3.0), Some(5.0), Some(7.0)]);
        // Window [2,3] with midpoint key 5 above the target: 3 and 5 bracket 4.
        assert_eq!(nearest_index(&keys, OrderedFloat(4.0), bounds(0, 3)), Some(1));
        assert_eq!(nearest_index(&keys, OrderedFloat(6.0), bounds(2, 3)), Some(2));
    }

    #[test]
    fn two_candidate_window_looks_back_past_its_left_edge() {
        let keys = Keys(vec![Some(0.0), Some(1.0), Some(2.0), Some(10.0), Some(20.0)]);
        assert_eq!(nearest_index(&keys, OrderedFloat(3.0), bounds(0, 4)), Some(2));
        assert_eq!(nearest_index(&keys, OrderedFloat(16.0), bounds(0, 4)), Some(4));
    }

    #[test]
    fn gap_at_midpoint_is_skipped() {
        let keys = Keys(vec![Some(1.0), None, Some(10.0)]);
        assert_eq!(nearest_index(&keys, OrderedFloat(1.0), bounds(0, 2)), Some(0));
        assert_eq!(nearest_index(&keys, OrderedFloat(9.0), bounds(0, 2)), Some(2));
        assert_eq!(nearest_index(&keys, OrderedFloat(4.0), bounds(0, 2)), Some(0));
    }

    #[test]
    fn trailing_gap_pulls_right_cursor_back() {
        let keys = Keys(vec![Some(1.0), Some(2.0), None, None, None]);
        assert_eq!(nearest_index(&keys, OrderedFloat(50.0), bounds(0, 4)), Some(1));
        assert_eq!(nearest_index(&keys, OrderedFloat(1.2), bounds(0, 4)), Some(0));
    }

    #[test]
    fn exhausted_gap_window_falls_back_to_eliminated_neighbours() {
        let keys = Keys(vec![
            Some(1.0),
            Some(2.0),
            Some(3.0),
            None,
            None,
            Some(10.0),
            Some(11.0),
        ]);
        assert_eq!(nearest_index(&keys, OrderedFloat(6.0), bounds(0, 6)), Some(2));
        assert_eq!(nearest_index(&keys, OrderedFloat(8.0), bounds(0, 6)), Some(5));
    }

    #[test]
    fn result_never_leaves_bounds() {
        let keys = Keys(vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!(nearest_index(&keys, OrderedFloat(100.0), bounds(0, 2)), Some(2));
        assert_eq!(nearest_index(&keys, OrderedFloat(-100.0), bounds(1, 3)), Some(1));
    }

    #[test]
    fn empty_or_missing_bounds_yield_none() {
        let keys = Keys(vec![None, None, None]);
        assert_eq!(nearest_index(&keys, OrderedFloat(1.0), bounds(0, 2)), None);
        assert_eq!(nearest_index(&keys, OrderedFloat(1.0), None), None);
    }

    #[test]
    fn two_slot_window_keeps_the_candidate_beyond_its_right_edge() {
        let keys = Keys(vec![Some(1.0), Some(2.0), Some(10.0), Some(20.0), Some(30.0)]);
        assert_eq!(nearest_index(&keys, OrderedFloat(8.0), bounds(0, 4)), Some(2));
        assert_eq!(nearest_index(&keys, OrderedFloat(5.0), bounds(0, 4)), Some(1));
    }

    #[test]
    fn two_slot_window_after_trailing_gaps_reads_its_left_slot() {
        let keys = Keys(vec![Some(1.0), Some(2.0), None, None, None]);
        assert_eq!(nearest_index(&keys, OrderedFloat(1.2), bounds(0, 4)), Some(0));
        assert_eq!(nearest_index(&keys, OrderedFloat(0.0), bounds(0, 4)), Some(0));
    }

    #[test]
    fn extreme_bounds_are_clipped_to_the_slots() {
        let keys = Keys(vec![Some(1.0), None, Some(10.0)]);
        let everything = bounds(LogicalIndex::MIN, LogicalIndex::MAX);
        assert_eq!(nearest_index(&keys, OrderedFloat(9.0), everything), Some(2));
        assert_eq!(nearest_index(&keys, OrderedFloat(-5.0), everything), Some(0));
        assert_eq!(nearest_index(&keys, OrderedFloat(9.0), bounds(3, LogicalIndex::MAX)), None);
        assert_eq!(nearest_index(&keys, OrderedFloat(9.0), bounds(LogicalIndex::MIN, -1)), None);
        assert_eq!(nearest_index(&Keys(Vec::new()), OrderedFloat(9.0), everything), None);
    }
}
