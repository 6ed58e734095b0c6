/// Projection from a stored value to the key the tree orders by.
///
/// Implementations must be pure: the same value always projects to the same
/// key, with no side effects. The tree stays value-agnostic beyond "has a
/// key, has a total order".
pub trait KeyOf<V> {
    /// The projected key type.
    type Key;

    /// Borrows the key out of a stored value.
    fn key(value: &V) -> &Self::Key;
}

/// Policy for sets: the stored value is its own key.
pub struct Identity;

impl<T> KeyOf<T> for Identity {
    type Key = T;

    #[inline]
    fn key(value: &T) -> &T {
        value
    }
}

/// Policy for maps: the key is the first component of a stored pair.
pub struct FirstOfPair;

impl<K, V> KeyOf<(K, V)> for FirstOfPair {
    type Key = K;

    #[inline]
    fn key(value: &(K, V)) -> &K {
        &value.0
    }
}
