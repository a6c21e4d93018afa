//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Order-independent comparison of collections.
//!
//! Telemetry lists (LAG members, neighbor entries) come back in whatever order
//! the device reports them. These helpers compare a canonical sorted
//! representation instead, and are explicit about how duplicates count.

use std::collections::BTreeSet;

use itertools::Itertools;

/// Returns true if both collections hold the same elements with the same
/// multiplicities, regardless of order.
pub fn unordered_eq<'a, T>(
    a: impl IntoIterator<Item = &'a T>,
    b: impl IntoIterator<Item = &'a T>,
) -> bool
where
    T: Ord + 'a,
{
    a.into_iter().sorted().eq(b.into_iter().sorted())
}

/// Returns true if both collections hold the same distinct elements,
/// ignoring order and duplicates.
pub fn same_members<'a, T>(
    a: impl IntoIterator<Item = &'a T>,
    b: impl IntoIterator<Item = &'a T>,
) -> bool
where
    T: Ord + 'a,
{
    let a = a.into_iter().collect::<BTreeSet<_>>();
    let b = b.into_iter().collect::<BTreeSet<_>>();
    a == b
}

/// Returns true if every expected element is present in `actual`.
///
/// Duplicates in either collection are ignored.
pub fn contains_all<'a, T>(
    expected: impl IntoIterator<Item = &'a T>,
    actual: impl IntoIterator<Item = &'a T>,
) -> bool
where
    T: Ord + 'a,
{
    let actual = actual.into_iter().collect::<BTreeSet<_>>();
    expected.into_iter().all(|item| actual.contains(item))
}

/// Returns a copy of `items` with every occurrence of `item` removed.
pub fn without<T>(items: &[T], item: &T) -> Vec<T>
where
    T: Clone + PartialEq,
{
    items.iter().filter(|i| *i != item).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unordered_eq_ignores_order() {
        let a = ["eth1", "eth2", "eth3"];
        let b = ["eth3", "eth1", "eth2"];
        assert!(unordered_eq(&a, &b));
    }

    #[test]
    fn unordered_eq_counts_duplicates() {
        let a = ["eth1", "eth1", "eth2"];
        let b = ["eth1", "eth2", "eth2"];
        assert!(!unordered_eq(&a, &b));
        assert!(!unordered_eq(&a, &["eth1", "eth2"]));
    }

    #[test]
    fn same_members_ignores_duplicates() {
        let a = ["eth1", "eth1", "eth2"];
        let b = ["eth2", "eth1"];
        assert!(same_members(&a, &b));
        assert!(!same_members(&a, &["eth1"]));
    }

    #[test]
    fn contains_all_subset() {
        let expected = ["00:00:01:01:01:01"];
        let actual = ["00:00:02:02:02:02", "00:00:01:01:01:01"];
        assert!(contains_all(&expected, &actual));
        assert!(!contains_all(&actual, &expected));
        assert!(contains_all(&[] as &[&str], &actual));
    }

    #[test]
    fn without_removes_every_occurrence() {
        let items = vec!["eth1", "eth2", "eth1", "eth3"];
        assert_eq!(without(&items, &"eth1"), vec!["eth2", "eth3"]);
        assert_eq!(items.len(), 4);
    }
}
