//! Key extraction, deduplication and the helpers resolvers lean on.
//!
//! Everything a join does before and after its resolver call lives here: one
//! pass over the items to pull keys out, a dedup into a [`KeySet`], and the
//! fan-out that hands each resolved value back to every item sharing its key.

use std::collections::HashMap;
use std::hash::Hash;

use crate::lookup::{KeySet, Lookup};

/// Collect the distinct, non-absent keys of `items`.
///
/// Items whose extractor returns `None` contribute nothing.
pub fn distinct_keys<D, K, F>(items: &[D], mut extract: F) -> KeySet<K>
where
    K: Eq + Hash,
    F: FnMut(&D) -> Option<K>,
{
    items.iter().filter_map(|item| extract(item)).collect()
}

/// Index a flat row list by key. When two rows share a key the later one wins.
///
/// Typical use is inside a one-to-one batch resolver:
///
/// ```rust
/// use batch_compose::index_by;
///
/// let users = vec![(1_u64, "ada"), (2, "grace")];
/// let by_id = index_by(users, |(id, _)| *id);
/// assert_eq!(by_id[&2].1, "grace");
/// ```
pub fn index_by<SD, K, I, F>(rows: I, mut key: F) -> HashMap<K, SD>
where
    I: IntoIterator<Item = SD>,
    K: Eq + Hash,
    F: FnMut(&SD) -> K,
{
    rows.into_iter().map(|row| (key(&row), row)).collect()
}

/// Group a flat row list by key, keeping row order within each group.
pub fn group_by<SD, K, I, F>(rows: I, mut key: F) -> HashMap<K, Vec<SD>>
where
    I: IntoIterator<Item = SD>,
    K: Eq + Hash,
    F: FnMut(&SD) -> K,
{
    let mut groups: HashMap<K, Vec<SD>> = HashMap::new();
    for row in rows {
        groups.entry(key(&row)).or_default().push(row);
    }
    groups
}

/// Keys of every item in input order (absent keys kept as `None`) plus the
/// distinct set. The extractor runs exactly once per item.
pub(crate) fn extract_keys<D, K, F>(items: &[D], mut extract: F) -> (Vec<Option<K>>, KeySet<K>)
where
    K: Eq + Hash + Clone,
    F: FnMut(&D) -> Option<K>,
{
    let per_item: Vec<Option<K>> = items.iter().map(|item| extract(item)).collect();
    let distinct: KeySet<K> = per_item.iter().flatten().cloned().collect();
    (per_item, distinct)
}

/// Union of every secondary-key list in the links map.
///
/// Lists the resolver returned for keys no item carries are included too.
pub(crate) fn secondary_keys<K, SID, L, M>(links: &M) -> KeySet<SID>
where
    SID: Eq + Hash + Clone,
    L: AsRef<[SID]>,
    M: Lookup<K, L>,
{
    let mut sids = KeySet::new();
    links.for_each_value(&mut |list| sids.extend(list.as_ref().iter().cloned()));
    sids
}

/// Resolve a secondary-key list against the data map, in list order,
/// silently skipping keys the data map does not hold.
pub(crate) fn gather<SID, SD, M>(sids: &[SID], data: &M) -> Vec<SD>
where
    SD: Clone,
    M: Lookup<SID, SD>,
{
    sids.iter().filter_map(|sid| data.lookup(sid).cloned()).collect()
}

/// Attach `found[key]` to every target whose key resolved. Returns how many
/// targets were enriched.
pub(crate) fn fan_out<T, K, SD, M, A>(
    targets: &mut [T],
    keys: &[Option<K>],
    found: &M,
    mut attach: A,
) -> usize
where
    SD: Clone,
    M: Lookup<K, SD>,
    A: FnMut(&mut T, SD),
{
    let mut attached = 0;
    for (target, key) in targets.iter_mut().zip(keys) {
        if let Some(value) = key.as_ref().and_then(|k| found.lookup(k)) {
            attach(target, value.clone());
            attached += 1;
        }
    }
    attached
}

/// Fan-out for the indirect join: each target whose primary key has a
/// secondary-key list receives the gathered related entities.
pub(crate) fn fan_out_linked<T, K, SID, SD, L, M1, M2, A>(
    targets: &mut [T],
    keys: &[Option<K>],
    links: &M1,
    data: &M2,
    mut attach: A,
) -> usize
where
    SD: Clone,
    L: AsRef<[SID]>,
    M1: Lookup<K, L>,
    M2: Lookup<SID, SD>,
    A: FnMut(&mut T, Vec<SD>),
{
    let mut attached = 0;
    for (target, key) in targets.iter_mut().zip(keys) {
        if let Some(sids) = key.as_ref().and_then(|k| links.lookup(k)) {
            attach(target, gather(sids.as_ref(), data));
            attached += 1;
        }
    }
    attached
}
