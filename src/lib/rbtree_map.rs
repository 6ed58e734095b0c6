//! An ordered map and set backed by a red-black tree.
//!
//! The balancing engine lives in [`RbTree`]; [`TreeMap`] and [`TreeSet`]
//! project keys out of it through the [`KeyOf`] policies. Ordering comes
//! from a caller-supplied comparator (`compare::Compare`), defaulting to the
//! natural order of the keys.
#![warn(missing_docs)]

use std::fmt::{self, Debug};
use std::iter::FusedIterator;
use std::mem;
use std::ops::Index;

use compare::{Compare, Natural};

mod rbtree_core;
mod rbtree_iter;
mod rbtree_key;
mod rbtree_node;
mod rbtree_set;

pub use rbtree_core::RbTree;
pub use rbtree_iter::{IntoIter, Iter, IterMut};
pub use rbtree_key::{FirstOfPair, Identity, KeyOf};
pub use rbtree_set::TreeSet;

/// An ordered map with keys sorted by a comparator, `Natural` by default.
///
/// Backed by [`RbTree`] with the [`FirstOfPair`] key policy: entries are
/// `(K, V)` pairs ordered by their first component. Lookups accept any `Q`
/// the comparator can weigh against `K`.
#[derive(Clone)]
pub struct TreeMap<K, V, C = Natural<K>>
where
    C: Compare<K>,
{
    tree: RbTree<(K, V), FirstOfPair, C>,
}

impl<K, V> TreeMap<K, V>
where
    K: Ord,
{
    /// Creates an empty map ordered by the natural order of its keys.
    pub fn new() -> Self {
        TreeMap::with_cmp(compare::natural())
    }
}

impl<K, V, C> TreeMap<K, V, C>
where
    C: Compare<K>,
{
    /// Creates an empty map ordered by the given comparator.
    pub fn with_cmp(cmp: C) -> Self {
        TreeMap {
            tree: RbTree::new(cmp),
        }
    }

    /// Number of entries in the map.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns true if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Upper bound on the number of entries the node allocator could ever
    /// satisfy.
    pub fn max_len(&self) -> usize {
        self.tree.max_len()
    }

    /// Borrows the key comparator.
    pub fn key_comp(&self) -> &C {
        self.tree.key_comp()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Iterator over the entries in key order.
    pub fn iter(&self) -> MapIter<'_, K, V> {
        MapIter {
            inner: self.tree.iter(),
        }
    }

    /// Iterator over the entries in key order with mutable values.
    pub fn iter_mut(&mut self) -> MapIterMut<'_, K, V> {
        MapIterMut {
            inner: self.tree.iter_mut(),
        }
    }

    /// Iterator over the keys in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Iterator over the values, ordered by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Entry with the smallest key, if any.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|p| (&p.0, &p.1))
    }

    /// Entry with the largest key, if any.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|p| (&p.0, &p.1))
    }

    /// Reference to the value stored under `key`.
    pub fn get<Q: ?Sized>(&self, key: &Q) -> Option<&V>
    where
        C: Compare<Q, K>,
    {
        self.tree.find(key).map(|p| &p.1)
    }

    /// The stored key-value pair equivalent to `key`.
    pub fn get_key_value<Q: ?Sized>(&self, key: &Q) -> Option<(&K, &V)>
    where
        C: Compare<Q, K>,
    {
        self.tree.find(key).map(|p| (&p.0, &p.1))
    }

    /// Mutable reference to the value stored under `key`.
    pub fn get_mut<Q: ?Sized>(&mut self, key: &Q) -> Option<&mut V>
    where
        C: Compare<Q, K>,
    {
        self.tree.find_mut(key).map(|p| &mut p.1)
    }

    /// Returns true if an entry equivalent to `key` is present.
    pub fn contains_key<Q: ?Sized>(&self, key: &Q) -> bool
    where
        C: Compare<Q, K>,
    {
        self.tree.contains(key)
    }

    /// Inserts `value` under `key`. If the key was already present its value
    /// is replaced and the old value returned; the stored key stays.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.tree.insert_pos((key, value)) {
            (_, None) => None,
            (pos, Some((_, value))) => {
                let slot = unsafe { (*pos).value.assume_init_mut() };
                Some(mem::replace(&mut slot.1, value))
            }
        }
    }

    /// Removes the entry equivalent to `key`, returning its value.
    pub fn remove<Q: ?Sized>(&mut self, key: &Q) -> Option<V>
    where
        C: Compare<Q, K>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes the entry equivalent to `key`, returning the stored pair.
    pub fn remove_entry<Q: ?Sized>(&mut self, key: &Q) -> Option<(K, V)>
    where
        C: Compare<Q, K>,
    {
        self.tree.remove_value(key)
    }

    /// Iterator from the first entry whose key is not less than `key` to
    /// the end of the map.
    pub fn lower_bound<Q: ?Sized>(&self, key: &Q) -> MapIter<'_, K, V>
    where
        C: Compare<Q, K>,
    {
        MapIter {
            inner: self.tree.lower_bound(key),
        }
    }

    /// Iterator from the first entry whose key is greater than `key` to the
    /// end of the map.
    pub fn upper_bound<Q: ?Sized>(&self, key: &Q) -> MapIter<'_, K, V>
    where
        C: Compare<Q, K>,
    {
        MapIter {
            inner: self.tree.upper_bound(key),
        }
    }

    /// Iterator over the entries whose key is equivalent to `key` (at most
    /// one).
    pub fn equal_range<Q: ?Sized>(&self, key: &Q) -> MapIter<'_, K, V>
    where
        C: Compare<Q, K>,
    {
        MapIter {
            inner: self.tree.equal_range(key),
        }
    }

    /// O(1) exchange of two maps' contents, comparators included.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }
}

impl<K, V, C> Default for TreeMap<K, V, C>
where
    C: Compare<K> + Default,
{
    fn default() -> Self {
        TreeMap::with_cmp(C::default())
    }
}

impl<K, V, C> Debug for TreeMap<K, V, C>
where
    K: Debug,
    V: Debug,
    C: Compare<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> PartialEq for TreeMap<K, V, C>
where
    K: PartialEq,
    V: PartialEq,
    C: Compare<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K, V, C> Eq for TreeMap<K, V, C>
where
    K: Eq,
    V: Eq,
    C: Compare<K>,
{
}

impl<K, V, C> PartialOrd for TreeMap<K, V, C>
where
    K: PartialOrd,
    V: PartialOrd,
    C: Compare<K>,
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K, V, C> Ord for TreeMap<K, V, C>
where
    K: Ord,
    V: Ord,
    C: Compare<K>,
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K, V, C, Q: ?Sized> Index<&Q> for TreeMap<K, V, C>
where
    C: Compare<K> + Compare<Q, K>,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, C> Extend<(K, V)> for TreeMap<K, V, C>
where
    C: Compare<K>,
{
    // Funnels through the end-position hint, so pre-sorted input links in
    // O(1) per entry. Duplicate keys replace the stored value.
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            if let (pos, Some((_, value))) = self.tree.insert_hint_end((k, v)) {
                let slot = unsafe { (*pos).value.assume_init_mut() };
                slot.1 = value;
            }
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for TreeMap<K, V, C>
where
    C: Compare<K> + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = TreeMap::with_cmp(C::default());
        map.extend(iter);
        map
    }
}

impl<'a, K, V, C> IntoIterator for &'a TreeMap<K, V, C>
where
    C: Compare<K>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = MapIter<'a, K, V>;

    fn into_iter(self) -> MapIter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut TreeMap<K, V, C>
where
    C: Compare<K>,
{
    type Item = (&'a K, &'a mut V);
    type IntoIter = MapIterMut<'a, K, V>;

    fn into_iter(self) -> MapIterMut<'a, K, V> {
        self.iter_mut()
    }
}

impl<K, V, C> IntoIterator for TreeMap<K, V, C>
where
    C: Compare<K>,
{
    type Item = (K, V);
    type IntoIter = IntoIter<(K, V), FirstOfPair, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

/// Borrowing iterator over a map's entries in key order.
pub struct MapIter<'a, K, V> {
    inner: Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for MapIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next().map(|p| (&p.0, &p.1))
    }
}

impl<'a, K, V> DoubleEndedIterator for MapIter<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a V)> {
        self.inner.next_back().map(|p| (&p.0, &p.1))
    }
}

impl<K, V> FusedIterator for MapIter<'_, K, V> {}

impl<K, V> Clone for MapIter<'_, K, V> {
    fn clone(&self) -> Self {
        MapIter {
            inner: self.inner.clone(),
        }
    }
}

/// Borrowing iterator over a map's entries with mutable values.
pub struct MapIterMut<'a, K, V> {
    inner: IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for MapIterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.inner.next().map(|p| (&p.0, &mut p.1))
    }
}

impl<'a, K, V> DoubleEndedIterator for MapIterMut<'a, K, V> {
    fn next_back(&mut self) -> Option<(&'a K, &'a mut V)> {
        self.inner.next_back().map(|p| (&p.0, &mut p.1))
    }
}

impl<K, V> FusedIterator for MapIterMut<'_, K, V> {}

/// Iterator over a map's keys in order.
pub struct Keys<'a, K, V> {
    inner: MapIter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }
}

impl<'a, K, V> DoubleEndedIterator for Keys<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over a map's values, ordered by key.
pub struct Values<'a, K, V> {
    inner: MapIter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<'a, K, V> DoubleEndedIterator for Values<'a, K, V> {
    fn next_back(&mut self) -> Option<&'a V> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}
