//! Indirect one-to-many list join.
//!
//! Base items reach their related entities through a bridge of secondary keys
//! (order -> order_item rows -> items). Two batched resolutions are chained:
//! primary keys to secondary-key lists, then the union of secondary keys to
//! entities.

use std::convert::Infallible;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::error::into_ok;
use crate::join::one::resolve_batch;
use crate::keys::{extract_keys, fan_out_linked, secondary_keys};
use crate::lookup::{KeySet, Lookup};

/// Attach, to every item, the related entities reachable through its
/// secondary keys.
///
/// `resolve_keys` is called once with the distinct primary keys and
/// `resolve_data` once with the distinct union of the secondary keys it
/// returned. Either stage answering with nothing leaves every item unchanged
/// and skips the remaining stage. Per item, the attached list follows the
/// item's secondary-key order, minus keys `resolve_data` did not return.
///
/// ```rust
/// use std::collections::HashMap;
/// use batch_compose::{join_many, KeySet};
///
/// let orders = vec![(1_u32, Vec::new())];
/// let orders = join_many(
///     orders,
///     |(id, _)| Some(*id),
///     |_: KeySet<u32>| HashMap::from([(1_u32, vec![11_u32, 22])]),
///     |_: KeySet<u32>| HashMap::from([(11_u32, "x"), (22, "y")]),
///     |(_, items), found| *items = found,
/// );
/// assert_eq!(orders[0].1, vec!["x", "y"]);
/// ```
pub fn join_many<D, K, SID, SD, L, M1, M2>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve_keys: impl FnOnce(KeySet<K>) -> M1,
    resolve_data: impl FnOnce(KeySet<SID>) -> M2,
    attach: impl FnMut(&mut D, Vec<SD>),
) -> Vec<D>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
    L: AsRef<[SID]>,
    M1: Lookup<K, L>,
    M2: Lookup<SID, SD>,
{
    into_ok(try_join_many(
        items,
        extract,
        |keys| Ok::<_, Infallible>(resolve_keys(keys)),
        |sids| Ok(resolve_data(sids)),
        attach,
    ))
}

/// Fallible [`join_many`]. An error from either stage is returned unchanged;
/// a stage-one error means `resolve_data` is never called.
pub fn try_join_many<D, K, SID, SD, L, M1, M2, E>(
    mut items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve_keys: impl FnOnce(KeySet<K>) -> Result<M1, E>,
    resolve_data: impl FnOnce(KeySet<SID>) -> Result<M2, E>,
    attach: impl FnMut(&mut D, Vec<SD>),
) -> Result<Vec<D>, E>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
    L: AsRef<[SID]>,
    M1: Lookup<K, L>,
    M2: Lookup<SID, SD>,
{
    if items.is_empty() {
        trace!(op = "join_many", reason = "empty input", "join skipped");
        return Ok(items);
    }
    let (keys, distinct) = extract_keys(&items, extract);
    let Some((links, data)) =
        resolve_linked("join_many", items.len(), distinct, resolve_keys, resolve_data)?
    else {
        return Ok(items);
    };
    let attached = fan_out_linked(&mut items, &keys, &links, &data, attach);
    trace!(op = "join_many", attached, "batch attached");
    Ok(items)
}

/// Convert every item and attach the related entities reachable through its
/// secondary keys to the converted item.
///
/// Whichever stage short-circuits, the result is the fully converted list in
/// input order.
pub fn join_many_into<D, K, SID, SD, V, L, M1, M2>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve_keys: impl FnOnce(KeySet<K>) -> M1,
    resolve_data: impl FnOnce(KeySet<SID>) -> M2,
    convert: impl FnMut(D) -> V,
    attach: impl FnMut(&mut V, Vec<SD>),
) -> Vec<V>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
    L: AsRef<[SID]>,
    M1: Lookup<K, L>,
    M2: Lookup<SID, SD>,
{
    into_ok(try_join_many_into(
        items,
        extract,
        |keys| Ok::<_, Infallible>(resolve_keys(keys)),
        |sids| Ok(resolve_data(sids)),
        convert,
        attach,
    ))
}

/// Fallible [`join_many_into`].
pub fn try_join_many_into<D, K, SID, SD, V, L, M1, M2, E>(
    items: Vec<D>,
    extract: impl FnMut(&D) -> Option<K>,
    resolve_keys: impl FnOnce(KeySet<K>) -> Result<M1, E>,
    resolve_data: impl FnOnce(KeySet<SID>) -> Result<M2, E>,
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
{
    if items.is_empty() {
        trace!(op = "join_many_into", reason = "empty input", "join skipped");
        return Ok(Vec::new());
    }
    let (keys, distinct) = extract_keys(&items, extract);
    let resolved =
        resolve_linked("join_many_into", items.len(), distinct, resolve_keys, resolve_data)?;
    let mut views: Vec<V> = items.into_iter().map(convert).collect();
    if let Some((links, data)) = resolved {
        let attached = fan_out_linked(&mut views, &keys, &links, &data, attach);
        trace!(op = "join_many_into", attached, "batch attached");
    }
    Ok(views)
}

/// Run both stages. `None` means some stage had nothing to offer and no item
/// should be touched.
pub(crate) fn resolve_linked<K, SID, SD, L, M1, M2, E>(
    op: &'static str,
    items: usize,
    distinct: KeySet<K>,
    resolve_keys: impl FnOnce(KeySet<K>) -> Result<M1, E>,
    resolve_data: impl FnOnce(KeySet<SID>) -> Result<M2, E>,
) -> Result<Option<(M1, M2)>, E>
where
    SID: Eq + Hash + Clone,
    L: AsRef<[SID]>,
    M1: Lookup<K, L>,
    M2: Lookup<SID, SD>,
{
    let Some(links) = resolve_batch(op, items, distinct, resolve_keys)? else {
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
    let data = resolve_data(sids)?;
    if data.is_empty() {
        trace!(op, reason = "no related data", "join skipped");
        return Ok(None);
    }
    Ok(Some((links, data)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    struct Order {
        oid: u32,
        items: Option<Vec<&'static str>>,
    }

    #[derive(Debug, PartialEq)]
    struct OrderView {
        oid: u32,
        names: Vec<&'static str>,
    }

    fn order(oid: u32) -> Order {
        Order { oid, items: None }
    }

    fn view(o: Order) -> OrderView {
        OrderView { oid: o.oid, names: Vec::new() }
    }

    fn bridge() -> HashMap<u32, Vec<u32>> {
        HashMap::from([(1, vec![11, 22]), (2, vec![11]), (3, vec![11, 22, 33])])
    }

    fn catalog() -> HashMap<u32, &'static str> {
        HashMap::from([(11, "item_11"), (22, "item_22"), (33, "item_33"), (44, "item_44")])
    }

    fn sorted<T: Ord + Copy>(keys: &KeySet<T>) -> Vec<T> {
        let mut v: Vec<T> = keys.iter().copied().collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_join_many_single_item() {
        let out = join_many(
            vec![order(1)],
            |o| Some(o.oid),
            |keys: KeySet<u32>| {
                assert_eq!(sorted(&keys), vec![1]);
                HashMap::from([(1_u32, vec![11_u32, 22])])
            },
            |sids: KeySet<u32>| {
                assert_eq!(sorted(&sids), vec![11, 22]);
                HashMap::from([(11_u32, "x"), (22, "y")])
            },
            |o, found| o.items = Some(found),
        );
        assert_eq!(out[0].items, Some(vec!["x", "y"]));
    }

    #[test]
    fn test_join_many_drops_missing_secondary_data() {
        let out = join_many(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| HashMap::from([(1_u32, vec![11_u32, 22])]),
            |_: KeySet<u32>| HashMap::from([(11_u32, "x")]),
            |o, found| o.items = Some(found),
        );
        assert_eq!(out[0].items, Some(vec!["x"]));
    }

    #[test]
    fn test_join_many_shared_secondary_keys_resolved_once() {
        let data_calls = Cell::new(0);
        let out = join_many(
            vec![order(1), order(2), order(3), order(1)],
            |o| Some(o.oid),
            |keys: KeySet<u32>| {
                assert_eq!(sorted(&keys), vec![1, 2, 3]);
                bridge()
            },
            |sids: KeySet<u32>| {
                data_calls.set(data_calls.get() + 1);
                assert_eq!(sorted(&sids), vec![11, 22, 33]);
                catalog()
            },
            |o, found| o.items = Some(found),
        );
        assert_eq!(data_calls.get(), 1);
        assert_eq!(out[0].items, Some(vec!["item_11", "item_22"]));
        assert_eq!(out[1].items, Some(vec!["item_11"]));
        assert_eq!(out[2].items, Some(vec!["item_11", "item_22", "item_33"]));
        assert_eq!(out[3].items, out[0].items);
    }

    #[test]
    fn test_join_many_fetches_every_listed_secondary_key() {
        let out = join_many(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| HashMap::from([(1_u32, vec![11_u32]), (9, vec![99])]),
            |sids: KeySet<u32>| {
                assert_eq!(sorted(&sids), vec![11, 99]);
                HashMap::from([(11_u32, "item_11"), (99, "item_99")])
            },
            |o, found| o.items = Some(found),
        );
        assert_eq!(out[0].items, Some(vec!["item_11"]));
    }

    #[test]
    fn test_join_many_empty_input() {
        let out = join_many(
            Vec::<Order>::new(),
            |o| Some(o.oid),
            |_: KeySet<u32>| -> HashMap<u32, Vec<u32>> { panic!("resolver must not run") },
            |_: KeySet<u32>| -> HashMap<u32, &'static str> { panic!("resolver must not run") },
            |o, found| o.items = Some(found),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_join_many_keeps_secondary_order() {
        let out = join_many(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| HashMap::from([(1_u32, vec![33_u32, 11, 22, 11])]),
            |_: KeySet<u32>| catalog(),
            |o, found| o.items = Some(found),
        );
        assert_eq!(out[0].items, Some(vec!["item_33", "item_11", "item_22", "item_11"]));
    }

    #[test]
    fn test_join_many_item_without_links_untouched() {
        let out = join_many(
            vec![order(1), order(9)],
            |o| Some(o.oid),
            |_: KeySet<u32>| bridge(),
            |_: KeySet<u32>| catalog(),
            |o, found| o.items = Some(found),
        );
        assert!(out[0].items.is_some());
        assert_eq!(out[1], order(9));
    }

    #[test]
    fn test_join_many_empty_links_skip_data_stage() {
        let out = join_many(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| HashMap::<u32, Vec<u32>>::new(),
            |_: KeySet<u32>| -> HashMap<u32, &'static str> { panic!("data stage must not run") },
            |o, found| o.items = Some(found),
        );
        assert_eq!(out, vec![order(1)]);
    }

    #[test]
    fn test_join_many_all_links_empty_skip_data_stage() {
        let out = join_many(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| HashMap::from([(1_u32, Vec::<u32>::new())]),
            |_: KeySet<u32>| -> HashMap<u32, &'static str> { panic!("data stage must not run") },
            |o, found| o.items = Some(found),
        );
        assert_eq!(out, vec![order(1)]);
    }

    #[test]
    fn test_join_many_empty_data_leaves_items() {
        let out = join_many(
            vec![order(1), order(2)],
            |o| Some(o.oid),
            |_: KeySet<u32>| bridge(),
            |_: KeySet<u32>| None::<HashMap<u32, &'static str>>,
            |o, found| o.items = Some(found),
        );
        assert_eq!(out, vec![order(1), order(2)]);
    }

    #[test]
    fn test_join_many_into_converts_at_every_short_circuit() {
        let no_keys = join_many_into(
            vec![order(1), order(2)],
            |_| None::<u32>,
            |_: KeySet<u32>| -> HashMap<u32, Vec<u32>> { panic!("no keys to resolve") },
            |_: KeySet<u32>| catalog(),
            view,
            |v, found| v.names = found,
        );
        assert_eq!(no_keys.iter().map(|v| v.oid).collect::<Vec<_>>(), vec![1, 2]);

        let no_links = join_many_into(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| None::<HashMap<u32, Vec<u32>>>,
            |_: KeySet<u32>| catalog(),
            view,
            |v, found| v.names = found,
        );
        assert_eq!(no_links, vec![OrderView { oid: 1, names: Vec::new() }]);

        let no_data = join_many_into(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| bridge(),
            |_: KeySet<u32>| HashMap::<u32, &'static str>::new(),
            view,
            |v, found| v.names = found,
        );
        assert_eq!(no_data, vec![OrderView { oid: 1, names: Vec::new() }]);
    }

    #[test]
    fn test_join_many_into_attaches_to_views() {
        let out = join_many_into(
            vec![order(3), order(2)],
            |o| Some(o.oid),
            |_: KeySet<u32>| bridge(),
            |_: KeySet<u32>| catalog(),
            view,
            |v, found| v.names = found,
        );
        assert_eq!(out[0].names, vec!["item_11", "item_22", "item_33"]);
        assert_eq!(out[1].names, vec!["item_11"]);
    }

    #[test]
    fn test_join_many_into_empty_input() {
        let out = join_many_into(
            Vec::<Order>::new(),
            |o| Some(o.oid),
            |_: KeySet<u32>| -> HashMap<u32, Vec<u32>> { panic!("resolver must not run") },
            |_: KeySet<u32>| -> HashMap<u32, &'static str> { panic!("resolver must not run") },
            view,
            |v, found| v.names = found,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_try_join_many_stage_one_error_skips_stage_two() {
        let out: Result<Vec<Order>, &str> = try_join_many(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| Err::<HashMap<u32, Vec<u32>>, _>("bridge down"),
            |_: KeySet<u32>| -> Result<HashMap<u32, &'static str>, &'static str> {
                panic!("data stage must not run")
            },
            |o, found| o.items = Some(found),
        );
        assert_eq!(out, Err("bridge down"));
    }

    #[test]
    fn test_try_join_many_into_stage_two_error() {
        let out = try_join_many_into(
            vec![order(1)],
            |o| Some(o.oid),
            |_: KeySet<u32>| Ok(bridge()),
            |_: KeySet<u32>| Err::<HashMap<u32, &'static str>, _>("catalog down"),
            view,
            |v, found| v.names = found,
        );
        assert_eq!(out, Err("catalog down"));
    }
}
