//! Dense ordering of sibling rows.
//!
//! Columns within a board and tasks within a column carry an `order` that must
//! always be exactly `0..n`. The functions here only compute what has to change;
//! `db::repos::ordering` applies the result inside a transaction.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReindexError {
    #[error("The order must be between 0 and {max}.")]
    OutOfRange { order: i64, max: i32 },

    #[error("sibling orders are not dense: expected {expected}, found {found}")]
    NotDense { expected: i32, found: i32 },

    #[error("order {order} does not exist in a group of {count}")]
    Stale { order: i32, count: usize },
}

/// Batch adjustment applied to every sibling whose order lies in `from..=to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub from: i32,
    pub to: i32,
    pub delta: i32,
}

impl Shift {
    pub fn up(from: i32, to: i32) -> Self {
        Shift { from, to, delta: 1 }
    }

    pub fn down(from: i32, to: i32) -> Self {
        Shift { from, to, delta: -1 }
    }

    pub fn covers(&self, order: i32) -> bool {
        self.from <= order && order <= self.to
    }

    pub fn apply(&self, order: i32) -> i32 {
        if self.covers(order) {
            order + self.delta
        } else {
            order
        }
    }
}

/// Result of planning a move inside one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reorder {
    pub shift: Option<Shift>,
    pub order: i32,
}

/// Result of planning a move between two groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub source: Option<Shift>,
    pub destination: Option<Shift>,
    pub order: i32,
}

fn to_order(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

fn check_current(order: i32, count: usize) -> Result<(), ReindexError> {
    if order < 0 || order >= to_order(count) {
        return Err(ReindexError::Stale { order, count });
    }
    Ok(())
}

/// Validates a requested position against `0..=max`.
pub fn checked_position(requested: i64, max: i32) -> Result<i32, ReindexError> {
    if requested < 0 || requested > i64::from(max) {
        return Err(ReindexError::OutOfRange {
            order: requested,
            max,
        });
    }
    Ok(requested as i32)
}

/// Position assigned to a row appended to a group of `count` siblings.
pub fn append_order(count: usize) -> i32 {
    to_order(count)
}

/// Plans moving the row at `old` to `requested` in a group of `count` rows
/// (the moved row included).
pub fn plan_reorder(old: i32, requested: i64, count: usize) -> Result<Reorder, ReindexError> {
    check_current(old, count)?;
    let new = checked_position(requested, to_order(count) - 1)?;

    let shift = if new < old {
        Some(Shift::up(new, old - 1))
    } else if new > old {
        Some(Shift::down(old + 1, new))
    } else {
        None
    };

    Ok(Reorder { shift, order: new })
}

/// Plans moving the row at `old` out of a group of `source_count` rows into a
/// different group of `destination_count` rows. Without a requested position the
/// row lands at the end of the destination.
pub fn plan_transfer(
    old: i32,
    source_count: usize,
    requested: Option<i64>,
    destination_count: usize,
) -> Result<Transfer, ReindexError> {
    check_current(old, source_count)?;
    let end = to_order(destination_count);
    let new = match requested {
        Some(requested) => checked_position(requested, end)?,
        None => end,
    };

    let last = to_order(source_count) - 1;
    let source = (old < last).then(|| Shift::down(old + 1, last));
    let destination = (new < end).then(|| Shift::up(new, end - 1));

    Ok(Transfer {
        source,
        destination,
        order: new,
    })
}

/// Re-enumerates siblings after a deletion.
///
/// `siblings` must be sorted by current order. Returns only the rows whose
/// order changes, paired with their new order.
pub fn compact<K: Clone>(siblings: &[(K, i32)]) -> Vec<(K, i32)> {
    siblings
        .iter()
        .enumerate()
        .filter_map(|(index, (key, order))| {
            let wanted = to_order(index);
            (*order != wanted).then(|| (key.clone(), wanted))
        })
        .collect()
}

/// Checks that `orders` is a permutation of `0..n`.
pub fn check_dense(orders: impl IntoIterator<Item = i32>) -> Result<(), ReindexError> {
    let mut orders: Vec<i32> = orders.into_iter().collect();
    orders.sort_unstable();

    for (index, found) in orders.into_iter().enumerate() {
        let expected = to_order(index);
        if found != expected {
            return Err(ReindexError::NotDense { expected, found });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    type Group = Vec<(&'static str, i32)>;

    const NAMES: [&str; 12] = [
        "t0", "t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8", "t9", "t10", "t11",
    ];

    fn group(size: usize) -> Group {
        NAMES[..size].iter().enumerate().map(|(i, n)| (*n, i as i32)).collect()
    }

    fn order_of(group: &Group, key: &str) -> i32 {
        group.iter().find(|(k, _)| *k == key).map(|(_, o)| *o).unwrap()
    }

    fn sorted_keys(group: &Group) -> Vec<&'static str> {
        let mut sorted = group.clone();
        sorted.sort_by_key(|(_, order)| *order);
        sorted.into_iter().map(|(key, _)| key).collect()
    }

    fn reorder_in_memory(group: &mut Group, key: &str, requested: i64) -> Result<(), ReindexError> {
        let old = order_of(group, key);
        let plan = plan_reorder(old, requested, group.len())?;
        for (k, order) in group.iter_mut() {
            if *k == key {
                *order = plan.order;
            } else if let Some(shift) = plan.shift {
                *order = shift.apply(*order);
            }
        }
        Ok(())
    }

    fn transfer_in_memory(
        source: &mut Group,
        destination: &mut Group,
        key: &'static str,
        requested: Option<i64>,
    ) -> Result<(), ReindexError> {
        let old = order_of(source, key);
        let plan = plan_transfer(old, source.len(), requested, destination.len())?;
        source.retain(|(k, _)| *k != key);
        if let Some(shift) = plan.source {
            source.iter_mut().for_each(|(_, o)| *o = shift.apply(*o));
        }
        if let Some(shift) = plan.destination {
            destination.iter_mut().for_each(|(_, o)| *o = shift.apply(*o));
        }
        destination.push((key, plan.order));
        Ok(())
    }

    fn delete_in_memory(group: &mut Group, key: &str) {
        group.retain(|(k, _)| *k != key);
        group.sort_by_key(|(_, order)| *order);
        let changes = compact(group.as_slice());
        for (k, order) in changes {
            group.iter_mut().find(|(g, _)| *g == k).unwrap().1 = order;
        }
    }

    fn is_dense(group: &Group) -> bool {
        check_dense(group.iter().map(|(_, o)| *o)).is_ok()
    }

    #[test]
    fn test_moving_last_task_forward() {
        let mut tasks = group(4);
        reorder_in_memory(&mut tasks, "t3", 1).unwrap();

        assert_eq!(order_of(&tasks, "t1"), 2);
        assert_eq!(order_of(&tasks, "t2"), 3);
        assert_eq!(order_of(&tasks, "t3"), 1);
        assert_eq!(sorted_keys(&tasks), vec!["t0", "t3", "t1", "t2"]);
    }

    #[test]
    fn test_reorder_plans_range_shifts() {
        assert_eq!(
            plan_reorder(3, 1, 4).unwrap(),
            Reorder { shift: Some(Shift::up(1, 2)), order: 1 }
        );
        assert_eq!(
            plan_reorder(0, 2, 4).unwrap(),
            Reorder { shift: Some(Shift::down(1, 2)), order: 2 }
        );
        assert_eq!(plan_reorder(2, 2, 4).unwrap(), Reorder { shift: None, order: 2 });
    }

    #[test]
    fn test_reorder_rejects_out_of_range() {
        assert_eq!(
            plan_reorder(0, 4, 4),
            Err(ReindexError::OutOfRange { order: 4, max: 3 })
        );
        assert_eq!(
            plan_reorder(0, -1, 4),
            Err(ReindexError::OutOfRange { order: -1, max: 3 })
        );
    }

    #[test]
    fn test_reorder_rejects_stale_position() {
        assert_eq!(
            plan_reorder(5, 0, 3),
            Err(ReindexError::Stale { order: 5, count: 3 })
        );
    }

    #[test]
    fn test_transfer_defaults_to_end() {
        let plan = plan_transfer(1, 3, None, 2).unwrap();
        assert_eq!(plan.order, 2);
        assert_eq!(plan.source, Some(Shift::down(2, 2)));
        assert_eq!(plan.destination, None);
    }

    #[test]
    fn test_transfer_into_empty_group() {
        let plan = plan_transfer(0, 1, Some(0), 0).unwrap();
        assert_eq!(plan, Transfer { source: None, destination: None, order: 0 });
    }

    #[test]
    fn test_transfer_allows_one_past_end_only() {
        assert!(plan_transfer(0, 2, Some(3), 3).is_ok());
        assert_eq!(
            plan_transfer(0, 2, Some(4), 3),
            Err(ReindexError::OutOfRange { order: 4, max: 3 })
        );
    }

    #[test]
    fn test_compact_only_reports_changed_rows() {
        let survivors = vec![("a", 0), ("b", 2), ("c", 3)];
        assert_eq!(compact(&survivors), vec![("b", 1), ("c", 2)]);
        assert!(compact(&[("a", 0), ("b", 1)]).is_empty());
    }

    #[test]
    fn test_check_dense() {
        assert!(check_dense(vec![2, 0, 1]).is_ok());
        assert!(check_dense(Vec::new()).is_ok());
        assert_eq!(
            check_dense(vec![0, 1, 1]),
            Err(ReindexError::NotDense { expected: 2, found: 1 })
        );
        assert_eq!(
            check_dense(vec![0, 2]),
            Err(ReindexError::NotDense { expected: 1, found: 2 })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

        #[test]
        fn reorder_keeps_group_dense(size in 1usize..12, from in 0usize..12, to in 0i64..12) {
            let from = from % size;
            let to = to % size as i64;
            let mut tasks = group(size);
            let key = NAMES[from];

            reorder_in_memory(&mut tasks, key, to).unwrap();

            prop_assert!(is_dense(&tasks));
            prop_assert_eq!(order_of(&tasks, key), to as i32);

            let mut expected: Vec<&str> = NAMES[..size].to_vec();
            let moved = expected.remove(from);
            expected.insert(to as usize, moved);
            prop_assert_eq!(sorted_keys(&tasks), expected);
        }

        #[test]
        fn reorder_to_same_position_changes_nothing(size in 1usize..12, at in 0usize..12) {
            let at = at % size;
            let mut tasks = group(size);

            reorder_in_memory(&mut tasks, NAMES[at], at as i64).unwrap();

            prop_assert_eq!(tasks, group(size));
        }

        #[test]
        fn transfer_round_trip_restores_both_groups(
            source_size in 1usize..6,
            destination_size in 0usize..6,
            from in 0usize..6,
            to in 0usize..7,
        ) {
            let from = from % source_size;
            let to = (to % (destination_size + 1)) as i64;
            let mut source = group(source_size);
            let mut destination: Group = NAMES[6..6 + destination_size]
                .iter()
                .enumerate()
                .map(|(i, n)| (*n, i as i32))
                .collect();
            let original_source = sorted_keys(&source);
            let original_destination = sorted_keys(&destination);
            let key = NAMES[from];

            transfer_in_memory(&mut source, &mut destination, key, Some(to)).unwrap();
            prop_assert!(is_dense(&source));
            prop_assert!(is_dense(&destination));
            prop_assert_eq!(order_of(&destination, key), to as i32);

            transfer_in_memory(&mut destination, &mut source, key, Some(from as i64)).unwrap();
            prop_assert_eq!(sorted_keys(&source), original_source);
            prop_assert_eq!(sorted_keys(&destination), original_destination);
            prop_assert!(is_dense(&source));
        }

        #[test]
        fn transfer_shifts_exactly_the_affected_siblings(
            source_size in 1usize..6,
            destination_size in 0usize..6,
            from in 0usize..6,
            to in 0usize..7,
        ) {
            let from = from % source_size;
            let to = (to % (destination_size + 1)) as i32;
            let mut source = group(source_size);
            let mut destination: Group = NAMES[6..6 + destination_size]
                .iter()
                .enumerate()
                .map(|(i, n)| (*n, i as i32))
                .collect();
            let before_source = source.clone();
            let before_destination = destination.clone();

            transfer_in_memory(&mut source, &mut destination, NAMES[from], Some(i64::from(to))).unwrap();

            prop_assert_eq!(source.len(), source_size - 1);
            prop_assert_eq!(destination.len(), destination_size + 1);
            for (key, old) in before_source.iter().filter(|(k, _)| *k != NAMES[from]) {
                let expected = if *old > from as i32 { old - 1 } else { *old };
                prop_assert_eq!(order_of(&source, key), expected);
            }
            for (key, old) in &before_destination {
                let expected = if *old >= to { old + 1 } else { *old };
                prop_assert_eq!(order_of(&destination, key), expected);
            }
        }

        #[test]
        fn delete_compacts_survivors(size in 1usize..12, at in 0usize..12) {
            let at = at % size;
            let mut tasks = group(size);

            delete_in_memory(&mut tasks, NAMES[at]);

            prop_assert_eq!(tasks.len(), size - 1);
            prop_assert!(is_dense(&tasks));
            for (key, old) in group(size).into_iter().filter(|(k, _)| *k != NAMES[at]) {
                let expected = if old > at as i32 { old - 1 } else { old };
                prop_assert_eq!(order_of(&tasks, key), expected);
            }
        }
    }
}
