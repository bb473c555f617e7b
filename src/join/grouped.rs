//! Direct one-to-many list join.
//!
//! Used when related rows carry the base item's key themselves (order lines
//! carrying the order id), so one batch resolver can answer key -> rows. This
//! is the one-to-one join with a list as the related value; items without an
//! entry are left alone rather than handed an empty list.

use std::hash::Hash;

use crate::join::one::{join_one, join_one_into, try_join_one, try_join_one_into};
use crate::lookup::{KeySet, Lookup};

/// Attach the related rows grouped under each item's key.
///
/// Pairs naturally with [`group_by`](crate::group_by) inside the resolver.
pub fn join_grouped<D, K, SD, M>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> M,
    attach: impl FnMut(&mut D, Vec<SD>),
) -> Vec<D>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, Vec<SD>>,
{
    join_one(items, extract, resolve, attach)
}

/// Fallible [`join_grouped`].
pub fn try_join_grouped<D, K, SD, M, E>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> Result<M, E>,
    attach: impl FnMut(&mut D, Vec<SD>),
) -> Result<Vec<D>, E>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, Vec<SD>>,
{
    try_join_one(items, extract, resolve, attach)
}

/// Converting [`join_grouped`].
pub fn join_grouped_into<D, K, SD, V, M>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> M,
    convert: impl FnMut(D) -> V,
    attach: impl FnMut(&mut V, Vec<SD>),
) -> Vec<V>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, Vec<SD>>,
{
    join_one_into(items, extract, resolve, convert, attach)
}

/// Fallible [`join_grouped_into`].
pub fn try_join_grouped_into<D, K, SD, V, M, E>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> Result<M, E>,
    convert: impl FnMut(D) -> V,
    attach: impl FnMut(&mut V, Vec<SD>),
) -> Result<Vec<V>, E>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, Vec<SD>>,
{
    try_join_one_into(items, extract, resolve, convert, attach)
}
