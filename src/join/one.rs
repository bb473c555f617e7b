//! One-to-one list join.

use std::convert::Infallible;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::error::into_ok;
use crate::keys::{extract_keys, fan_out};
use crate::lookup::{KeySet, Lookup};

/// Attach one related value to every item whose key resolves.
///
/// `resolve` is called once with the distinct keys, and not at all when the
/// input is empty or every key is absent. Items keep their order; items whose
/// key is absent or missing from the answer are left as they were.
///
/// ```rust
/// use std::collections::HashMap;
/// use batch_compose::join_one;
///
/// let rows = vec![(1, 10, ""), (2, 20, ""), (3, 10, "")];
/// let rows = join_one(
///     rows,
///     |(_, fk, _)| Some(*fk),
///     |keys| keys.into_iter().map(|k| (k, if k == 10 { "A" } else { "B" })).collect::<HashMap<_, _>>(),
///     |row, val| row.2 = val,
/// );
/// assert_eq!(rows, vec![(1, 10, "A"), (2, 20, "B"), (3, 10, "A")]);
/// ```
pub fn join_one<D, K, SD, M>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> M,
    attach: impl FnMut(&mut D, SD),
) -> Vec<D>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, SD>,
{
    into_ok(try_join_one(items, extract, |keys| Ok::<_, Infallible>(resolve(keys)), attach))
}

/// Fallible [`join_one`]. A resolver error is returned unchanged and no item
/// is touched.
pub fn try_join_one<D, K, SD, M, E>(
    mut items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> Result<M, E>,
    attach: impl FnMut(&mut D, SD),
) -> Result<Vec<D>, E>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, SD>,
{
    if items.is_empty() {
        trace!(op = "join_one", reason = "empty input", "join skipped");
        return Ok(items);
    }
    let (keys, distinct) = extract_keys(&items, extract);
    let Some(found) = resolve_batch("join_one", items.len(), distinct, resolve)? else {
        return Ok(items);
    };
    let attached = fan_out(&mut items, &keys, &found, attach);
    trace!(op = "join_one", attached, "batch attached");
    Ok(items)
}

/// Convert every item and attach one related value to each converted item
/// whose key resolves.
///
/// Output order matches input order. When no item carries a key the fully
/// converted list is returned without calling `resolve`.
pub fn join_one_into<D, K, SD, V, M>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> M,
    convert: impl FnMut(D) -> V,
    attach: impl FnMut(&mut V, SD),
) -> Vec<V>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, SD>,
{
    into_ok(try_join_one_into(
        items,
        extract,
        |keys| Ok::<_, Infallible>(resolve(keys)),
        convert,
        attach,
    ))
}

/// Fallible [`join_one_into`]. Items are converted only after the resolver
/// succeeds.
pub fn try_join_one_into<D, K, SD, V, M, E>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> Result<M, E>,
    convert: impl FnMut(D) -> V,
    attach: impl FnMut(&mut V, SD),
) -> Result<Vec<V>, E>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, SD>,
{
    if items.is_empty() {
        trace!(op = "join_one_into", reason = "empty input", "join skipped");
        return Ok(Vec::new());
    }
    let (keys, distinct) = extract_keys(&items, extract);
    let found = resolve_batch("join_one_into", items.len(), distinct, resolve)?;
    let mut views: Vec<V> = items.into_iter().map(convert).collect();
    if let Some(found) = found {
        let attached = fan_out(&mut views, &keys, &found, attach);
        trace!(op = "join_one_into", attached, "batch attached");
    }
    Ok(views)
}

/// Call `resolve` once with `distinct`, or return `None` without calling it
/// when there are no keys.
pub(crate) fn resolve_batch<K, M, E>(
    op: &'static str,
    items: usize,
    distinct: KeySet<K>,
    resolve: impl FnOnce(KeySet<K>) -> Result<M, E>,
) -> Result<Option<M>, E> {
    if distinct.is_empty() {
        trace!(op, reason = "no keys", "join skipped");
        return Ok(None);
    }
    debug!(op, items, distinct_keys = distinct.len(), "resolving batch");
    resolve(distinct).map(Some)
}
