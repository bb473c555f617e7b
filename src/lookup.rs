//! Keyed answers returned by batch resolvers.
//!
//! A batch resolver receives a [`KeySet`] and answers with "something keyed".
//! [`Lookup`] abstracts over that answer so callers can return whichever map
//! their data layer already produces.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use indexmap::{IndexMap, IndexSet};

/// Distinct keys handed to a batch resolver.
///
/// Each non-absent key appears exactly once. Iteration follows first-seen
/// order, which keeps resolver input deterministic, but callers must not rely
/// on any particular order.
pub type KeySet<K> = IndexSet<K>;

/// Read-only keyed access to a batch resolver's answer.
pub trait Lookup<K, V> {
    /// Returns the value stored for `key`, if any.
    fn lookup(&self, key: &K) -> Option<&V>;

    /// Returns true when the answer holds no entries at all.
    fn is_empty(&self) -> bool;

    /// Visits every stored value, whatever key it is stored under.
    fn for_each_value(&self, f: &mut dyn FnMut(&V));
}

impl<K, V, S> Lookup<K, V> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }

    fn for_each_value(&self, f: &mut dyn FnMut(&V)) {
        self.values().for_each(f);
    }
}

impl<K: Ord, V> Lookup<K, V> for BTreeMap<K, V> {
    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }

    fn for_each_value(&self, f: &mut dyn FnMut(&V)) {
        self.values().for_each(f);
    }
}

impl<K, V, S> Lookup<K, V> for IndexMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn lookup(&self, key: &K) -> Option<&V> {
        self.get(key)
    }

    fn is_empty(&self) -> bool {
        IndexMap::is_empty(self)
    }

    fn for_each_value(&self, f: &mut dyn FnMut(&V)) {
        self.values().for_each(f);
    }
}

/// `None` is a resolver saying "no data at all".
impl<K, V, M: Lookup<K, V>> Lookup<K, V> for Option<M> {
    fn lookup(&self, key: &K) -> Option<&V> {
        self.as_ref().and_then(|m| m.lookup(key))
    }

    fn is_empty(&self) -> bool {
        self.as_ref().is_none_or(<M as Lookup<K, V>>::is_empty)
    }

    fn for_each_value(&self, f: &mut dyn FnMut(&V)) {
        if let Some(m) = self {
            m.for_each_value(f);
        }
    }
}

impl<K, V, M: Lookup<K, V> + ?Sized> Lookup<K, V> for &M {
    fn lookup(&self, key: &K) -> Option<&V> {
        (**self).lookup(key)
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn for_each_value(&self, f: &mut dyn FnMut(&V)) {
        (**self).for_each_value(f);
    }
}
