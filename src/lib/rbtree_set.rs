use std::fmt::{self, Debug};

use compare::{Compare, Natural};

use crate::rbtree_core::RbTree;
use crate::rbtree_iter::{IntoIter, Iter};
use crate::rbtree_key::Identity;

/// An ordered set of values sorted by a comparator, `Natural` by default.
///
/// Backed by [`RbTree`] with the [`Identity`] key policy: every value is its
/// own key. Two values are considered the same element iff neither compares
/// less than the other.
#[derive(Clone)]
pub struct TreeSet<T, C = Natural<T>>
where
    C: Compare<T>,
{
    tree: RbTree<T, Identity, C>,
}

impl<T> TreeSet<T>
where
    T: Ord,
{
    /// Creates an empty set ordered by the natural order of its values.
    pub fn new() -> Self {
        TreeSet::with_cmp(compare::natural())
    }
}

impl<T, C> TreeSet<T, C>
where
    C: Compare<T>,
{
    /// Creates an empty set ordered by the given comparator.
    pub fn with_cmp(cmp: C) -> Self {
        TreeSet {
            tree: RbTree::new(cmp),
        }
    }

    /// Number of values in the set.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns true if the set contains no values.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Upper bound on the number of values the node allocator could ever
    /// satisfy.
    pub fn max_len(&self) -> usize {
        self.tree.max_len()
    }

    /// Borrows the comparator.
    pub fn key_comp(&self) -> &C {
        self.tree.key_comp()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Iterator over the values in sorted order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.tree.iter()
    }

    /// Smallest value, if any.
    pub fn first(&self) -> Option<&T> {
        self.tree.first()
    }

    /// Largest value, if any.
    pub fn last(&self) -> Option<&T> {
        self.tree.last()
    }

    /// Returns true if a value equivalent to `value` is present.
    pub fn contains<Q: ?Sized>(&self, value: &Q) -> bool
    where
        C: Compare<Q, T>,
    {
        self.tree.contains(value)
    }

    /// Borrows the stored value equivalent to `value`.
    pub fn get<Q: ?Sized>(&self, value: &Q) -> Option<&T>
    where
        C: Compare<Q, T>,
    {
        self.tree.find(value)
    }

    /// Number of stored values equivalent to `value` (0 or 1).
    pub fn count<Q: ?Sized>(&self, value: &Q) -> usize
    where
        C: Compare<Q, T>,
    {
        self.tree.count(value)
    }

    /// Adds `value` to the set. Returns whether it was inserted; an
    /// equivalent stored value stays untouched.
    pub fn insert(&mut self, value: T) -> bool {
        self.tree.insert_unique(value)
    }

    /// Removes the value equivalent to `value`; returns whether anything
    /// was removed.
    pub fn remove<Q: ?Sized>(&mut self, value: &Q) -> bool
    where
        C: Compare<Q, T>,
    {
        self.tree.erase_key(value) != 0
    }

    /// Removes and returns the stored value equivalent to `value`.
    pub fn take<Q: ?Sized>(&mut self, value: &Q) -> Option<T>
    where
        C: Compare<Q, T>,
    {
        self.tree.remove_value(value)
    }

    /// Iterator from the first value not less than `value` to the end.
    pub fn lower_bound<Q: ?Sized>(&self, value: &Q) -> Iter<'_, T>
    where
        C: Compare<Q, T>,
    {
        self.tree.lower_bound(value)
    }

    /// Iterator from the first value greater than `value` to the end.
    pub fn upper_bound<Q: ?Sized>(&self, value: &Q) -> Iter<'_, T>
    where
        C: Compare<Q, T>,
    {
        self.tree.upper_bound(value)
    }

    /// Iterator over the stored values equivalent to `value` (at most one).
    pub fn equal_range<Q: ?Sized>(&self, value: &Q) -> Iter<'_, T>
    where
        C: Compare<Q, T>,
    {
        self.tree.equal_range(value)
    }

    /// O(1) exchange of two sets' contents, comparators included.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }
}

impl<T, C> Default for TreeSet<T, C>
where
    C: Compare<T> + Default,
{
    fn default() -> Self {
        TreeSet::with_cmp(C::default())
    }
}

impl<T, C> Debug for TreeSet<T, C>
where
    T: Debug,
    C: Compare<T>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C> PartialEq for TreeSet<T, C>
where
    T: PartialEq,
    C: Compare<T>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T, C> Eq for TreeSet<T, C>
where
    T: Eq,
    C: Compare<T>,
{
}

impl<T, C> PartialOrd for TreeSet<T, C>
where
    T: PartialOrd,
    C: Compare<T>,
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T, C> Ord for TreeSet<T, C>
where
    T: Ord,
    C: Compare<T>,
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T, C> Extend<T> for TreeSet<T, C>
where
    C: Compare<T>,
{
    // Funnels through the end-position hint; values equivalent to a stored
    // one are dropped.
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.tree.insert_hint_end(value);
        }
    }
}

impl<T, C> FromIterator<T> for TreeSet<T, C>
where
    C: Compare<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = TreeSet::with_cmp(C::default());
        set.extend(iter);
        set
    }
}

impl<'a, T, C> IntoIterator for &'a TreeSet<T, C>
where
    C: Compare<T>,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T, C> IntoIterator for TreeSet<T, C>
where
    C: Compare<T>,
{
    type Item = T;
    type IntoIter = IntoIter<T, Identity, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet as StdBTreeSet;

    fn check<T, C>(set: &TreeSet<T, C>, context: &str)
    where
        C: Compare<T>,
    {
        if let Err(e) = set.tree.check_invariants() {
            panic!("red-black invariant violated ({}): {}", context, e);
        }
    }

    #[test]
    fn test_empty_set() {
        let set: TreeSet<u32> = TreeSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(!set.contains(&1));
        assert_eq!(set.iter().next(), None);
    }

    #[test]
    fn test_insert_and_contains() {
        let mut set = TreeSet::new();
        assert!(set.insert(3));
        assert!(set.insert(1));
        assert!(set.insert(2));
        // Duplicates report false and leave the stored value alone.
        assert!(!set.insert(2));
        assert_eq!(set.len(), 3);
        assert!(set.contains(&1));
        assert!(!set.contains(&4));
        check(&set, "after inserts");
    }

    #[test]
    fn test_sorted_iteration() {
        let set: TreeSet<u32> = [5, 2, 8, 1, 9, 3].into_iter().collect();
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 5, 8, 9]);
        assert_eq!(
            set.iter().rev().copied().collect::<Vec<_>>(),
            vec![9, 8, 5, 3, 2, 1]
        );
        assert_eq!(set.first(), Some(&1));
        assert_eq!(set.last(), Some(&9));
    }

    #[test]
    fn test_remove_and_take() {
        let mut set: TreeSet<u32> = [1, 2, 3].into_iter().collect();
        assert!(set.remove(&2));
        assert!(!set.remove(&2));
        assert_eq!(set.take(&3), Some(3));
        assert_eq!(set.take(&3), None);
        assert_eq!(set.len(), 1);
        check(&set, "after removals");
    }

    #[test]
    fn test_extend_keeps_existing() {
        let mut set: TreeSet<u32> = [1, 2, 3].into_iter().collect();
        set.extend([2, 3, 4, 5]);
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        check(&set, "after extend");
    }

    #[test]
    fn test_bounds() {
        let set: TreeSet<u32> = (1..=7).collect();
        assert_eq!(set.lower_bound(&4).next(), Some(&4));
        assert_eq!(set.upper_bound(&4).next(), Some(&5));
        assert_eq!(set.equal_range(&4).copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(set.count(&4), 1);
        assert_eq!(set.count(&0), 0);
    }

    #[test]
    fn test_equality_and_ordering() {
        let a: TreeSet<u32> = [1, 2, 3].into_iter().collect();
        let b: TreeSet<u32> = [3, 2, 1].into_iter().collect();
        let c: TreeSet<u32> = [1, 2, 4].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a < c);
    }

    #[test]
    fn test_swap_and_clear() {
        let mut a: TreeSet<u32> = [1, 2].into_iter().collect();
        let mut b: TreeSet<u32> = [10, 20, 30].into_iter().collect();
        a.swap(&mut b);
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 2);
        check(&a, "a after swap");
        check(&b, "b after swap");
        a.clear();
        assert!(a.is_empty());
        check(&a, "a after clear");
    }

    #[test]
    fn test_into_iter() {
        let set: TreeSet<u32> = [4, 1, 3, 2].into_iter().collect();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_debug_format() {
        let set: TreeSet<u32> = [2, 1].into_iter().collect();
        assert_eq!(format!("{:?}", set), "{1, 2}");
    }

    #[test]
    fn test_against_std() {
        let mut set = TreeSet::new();
        let mut std_set = StdBTreeSet::new();
        for k in [17u32, 3, 99, 3, 42, 8, 17, 0, 56, 23] {
            assert_eq!(set.insert(k), std_set.insert(k), "insert {}", k);
        }
        assert_eq!(
            set.iter().copied().collect::<Vec<_>>(),
            std_set.iter().copied().collect::<Vec<_>>()
        );
        for k in [3u32, 99, 1, 0] {
            assert_eq!(set.remove(&k), std_set.remove(&k), "remove {}", k);
            check(&set, &format!("after removing {}", k));
        }
        assert_eq!(
            set.iter().copied().collect::<Vec<_>>(),
            std_set.iter().copied().collect::<Vec<_>>()
        );
    }
}
