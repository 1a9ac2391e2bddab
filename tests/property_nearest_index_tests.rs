use chart_time_scale::core::{
    IndexedKeys, LogicalIndex, StrictRange, TimeKeyStrategy, TimePointTable, UnixTimestampStrategy,
    nearest_index,
};
use ordered_float::OrderedFloat;
use proptest::prelude::*;

fn build_table(steps: &[(i64, bool)]) -> TimePointTable<i64> {
    let mut table = TimePointTable::new();
    let mut time = 0;
    for &(increment, present) in steps {
        time += increment;
        if present {
            table
                .push(UnixTimestampStrategy.to_internal(&time))
                .expect("increasing keys");
        } else {
            table.push_gap();
        }
    }
    table
}

fn best_distance(table: &TimePointTable<i64>, bounds: StrictRange, target: i64) -> Option<f64> {
    (bounds.left()..=bounds.right())
        .filter_map(|index| table.key_at(index))
        .map(|key| (key.0 - target as f64).abs())
        .min_by(f64::total_cmp)
}

fn assert_minimal(
    table: &TimePointTable<i64>,
    bounds: StrictRange,
    target: i64,
) -> Result<(), TestCaseError> {
    let found = nearest_index(table, OrderedFloat(target as f64), Some(bounds));
    match best_distance(table, bounds, target) {
        None => prop_assert_eq!(found, None),
        Some(best) => {
            let index = found.expect("bounds hold a present point");
            prop_assert!(bounds.contains(index));
            let key = table.key_at(index).expect("result is a present point");
            prop_assert_eq!((key.0 - target as f64).abs(), best);
        }
    }
    Ok(())
}

fn window(len: usize, a: usize, b: usize) -> StrictRange {
    let last = len - 1;
    StrictRange::spanning(a.min(last) as LogicalIndex, b.min(last) as LogicalIndex)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1024))]

    #[test]
    fn nearest_index_minimises_key_distance_within_bounds(
        steps in prop::collection::vec((1i64..50, prop::bool::weighted(0.6)), 1..256),
        a in 0usize..256,
        b in 0usize..256,
        target in -100i64..13_000,
    ) {
        let table = build_table(&steps);
        assert_minimal(&table, window(steps.len(), a, b), target)?;
    }

    #[test]
    fn nearest_index_is_minimal_on_short_gapless_tables(
        increments in prop::collection::vec(1i64..40, 2..12),
        target in -10i64..500,
    ) {
        let steps: Vec<(i64, bool)> = increments.iter().map(|&step| (step, true)).collect();
        let table = build_table(&steps);
        assert_minimal(&table, window(steps.len(), 0, steps.len()), target)?;
    }

    #[test]
    fn nearest_index_is_minimal_on_long_gapless_tables(
        increments in prop::collection::vec(1i64..3_600, 2..512),
        target in -100i64..1_900_000,
    ) {
        let steps: Vec<(i64, bool)> = increments.iter().map(|&step| (step, true)).collect();
        let table = build_table(&steps);
        assert_minimal(&table, window(steps.len(), 0, steps.len()), target)?;
    }

    #[test]
    fn bounds_past_the_table_match_the_clipped_window(
        steps in prop::collection::vec((1i64..50, prop::bool::weighted(0.6)), 1..64),
        left in -1_000_000i64..0,
        right in 64i64..1_000_000,
        target in -100i64..3_300,
    ) {
        let table = build_table(&steps);
        let wide = StrictRange::try_new(left, right).expect("ordered bounds");
        let clipped = StrictRange::spanning(0, steps.len() as LogicalIndex - 1);
        prop_assert_eq!(
            nearest_index(&table, OrderedFloat(target as f64), Some(wide)),
            nearest_index(&table, OrderedFloat(target as f64), Some(clipped))
        );
    }
}
