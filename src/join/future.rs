//! Async list joins.
//!
//! Same contracts as the sync joins, with resolvers that return futures. Each
//! resolver future is created and awaited at most once per call, and the two
//! stages of the indirect join run strictly one after the other. The crate
//! does not pick a runtime: these are plain `async fn`s and need neither
//! `Send` nor `'static` closures.

use std::future::Future;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::keys::{extract_keys, fan_out, fan_out_linked, secondary_keys};
use crate::lookup::{KeySet, Lookup};

async fn resolve_batch_async<K, M, E, Fut>(
    op: &'static str,
    items: usize,
    distinct: KeySet<K>,
    resolve: impl FnOnce(KeySet<K>) -> Fut,
) -> Result<Option<M>, E>
where
    Fut: Future<Output = Result<M, E>>,
{
    if distinct.is_empty() {
        trace!(op, reason = "no keys", "join skipped");
        return Ok(None);
    }
    debug!(op, items, distinct_keys = distinct.len(), "resolving batch");
    resolve(distinct).await.map(Some)
}

async fn resolve_linked_async<K, SID, SD, L, M1, M2, E, Fut1, Fut2>(
    op: &'static str,
    items: usize,
    distinct: KeySet<K>,
    resolve_keys: impl FnOnce(KeySet<K>) -> Fut1,
    resolve_data: impl FnOnce(KeySet<SID>) -> Fut2,
) -> Result<Option<(M1, M2)>, E>
where
    SID: Eq + Hash + Clone,
    L: AsRef<[SID]>,
    M1: Lookup<K, L>,
    M2: Lookup<SID, SD>,
    Fut1: Future<Output = Result<M1, E>>,
    Fut2: Future<Output = Result<M2, E>>,
{
    let Some(links) = resolve_batch_async(op, items, distinct, resolve_keys).await? else {
        return Ok(None);
    };
    if links.is_empty() {
        trace!(op, reason = "no links", "join skipped");
        return Ok(None);
    }
    let sids = secondary_keys::<K, SID, L, M1>(&links);
    if sids.is_empty() {
        trace!(op, reason = "no secondary keys", "join skipped");
        return Ok(None);
    }
    debug!(op, secondary_keys = sids.len(), "resolving secondary batch");
    let data = resolve_data(sids).await?;
    if data.is_empty() {
        trace!(op, reason = "no related data", "join skipped");
        return Ok(None);
    }
    Ok(Some((links, data)))
}

/// Async [`join_one`](crate::join_one).
pub async fn join_one_async<D, K, SD, M, E, Fut>(
    mut items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> Fut,
    attach: impl FnMut(&mut D, SD),
) -> Result<Vec<D>, E>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, SD>,
    Fut: Future<Output = Result<M, E>>,
{
    if items.is_empty() {
        trace!(op = "join_one_async", reason = "empty input", "join skipped");
        return Ok(items);
    }
    let (keys, distinct) = extract_keys(&items, extract);
    if let Some(found) = resolve_batch_async("join_one_async", items.len(), distinct, resolve).await? {
        fan_out(&mut items, &keys, &found, attach);
    }
    Ok(items)
}

/// Async [`join_one_into`](crate::join_one_into).
pub async fn join_one_into_async<D, K, SD, V, M, E, Fut>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> Fut,
    convert: impl FnMut(D) -> V,
    attach: impl FnMut(&mut V, SD),
) -> Result<Vec<V>, E>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, SD>,
    Fut: Future<Output = Result<M, E>>,
{
    if items.is_empty() {
        trace!(op = "join_one_into_async", reason = "empty input", "join skipped");
        return Ok(Vec::new());
    }
    let (keys, distinct) = extract_keys(&items, extract);
    let found = resolve_batch_async("join_one_into_async", items.len(), distinct, resolve).await?;
    let mut views: Vec<V> = items.into_iter().map(convert).collect();
    if let Some(found) = found {
        fan_out(&mut views, &keys, &found, attach);
    }
    Ok(views)
}

/// Async [`join_grouped`](crate::join_grouped).
pub async fn join_grouped_async<D, K, SD, M, E, Fut>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> Fut,
    attach: impl FnMut(&mut D, Vec<SD>),
) -> Result<Vec<D>, E>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, Vec<SD>>,
    Fut: Future<Output = Result<M, E>>,
{
    join_one_async(items, extract, resolve, attach).await
}

/// Async [`join_grouped_into`](crate::join_grouped_into).
pub async fn join_grouped_into_async<D, K, SD, V, M, E, Fut>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve: impl FnOnce(KeySet<K>) -> Fut,
    convert: impl FnMut(D) -> V,
    attach: impl FnMut(&mut V, Vec<SD>),
) -> Result<Vec<V>, E>
where
    K: Eq + Hash + Clone,
    SD: Clone,
    M: Lookup<K, Vec<SD>>,
    Fut: Future<Output = Result<M, E>>,
{
    join_one_into_async(items, extract, resolve, convert, attach).await
}

/// Async [`join_many`](crate::join_many). `resolve_data` is only called after
/// the `resolve_keys` future has completed successfully.
pub async fn join_many_async<D, K, SID, SD, L, M1, M2, E, Fut1, Fut2>(
    mut items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve_keys: impl FnOnce(KeySet<K>) -> Fut1,
    resolve_data: impl FnOnce(KeySet<SID>) -> Fut2,
    attach: impl FnMut(&mut D, Vec<SD>),
) -> Result<Vec<D>, E>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
    L: AsRef<[SID]>,
    M1: Lookup<K, L>,
    M2: Lookup<SID, SD>,
    Fut1: Future<Output = Result<M1, E>>,
    Fut2: Future<Output = Result<M2, E>>,
{
    if items.is_empty() {
        trace!(op = "join_many_async", reason = "empty input", "join skipped");
        return Ok(items);
    }
    let (keys, distinct) = extract_keys(&items, extract);
    let resolved = resolve_linked_async(
        "join_many_async",
        items.len(),
        distinct,
        resolve_keys,
        resolve_data,
    )
    .await?;
    if let Some((links, data)) = resolved {
        fan_out_linked(&mut items, &keys, &links, &data, attach);
    }
    Ok(items)
}

/// Async [`join_many_into`](crate::join_many_into).
pub async fn join_many_into_async<D, K, SID, SD, V, L, M1, M2, E, Fut1, Fut2>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve_keys: impl FnOnce(KeySet<K>) -> Fut1,
    resolve_data: impl FnOnce(KeySet<SID>) -> Fut2,
    convert: impl FnMut(D) -> V,
    attach: impl FnMut(&mut V, Vec<SD>),
) -> Result<Vec<V>, E>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
    L: AsRef<[SID]>,
    M1: Lookup<K, L>,
    M2: Lookup<SID, SD>,
    Fut1: Future<Output = Result<M1, E>>,
    Fut2: Future<Output = Result<M2, E>>,
{
    if items.is_empty() {
        trace!(op = "join_many_into_async", reason = "empty input", "join skipped");
        return Ok(Vec::new());
    }
    let (keys, distinct) = extract_keys(&items, extract);
    let resolved = resolve_linked_async(
        "join_many_into_async",
        items.len(),
        distinct,
        resolve_keys,
        resolve_data,
    )
    .await?;
    let mut views: Vec<V> = items.into_iter().map(convert).collect();
    if let Some((links, data)) = resolved {
        fan_out_linked(&mut views, &keys, &links, &data, attach);
    }
    Ok(views)
}
