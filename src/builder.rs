//! Fluent builders for the list joins.
//!
//! The free functions take every closure up front, so a "missing" closure
//! cannot be expressed there. Builders hold each closure as an optional boxed
//! value, which makes the incomplete case representable and gives two ways to
//! handle it:
//! - [`build`](JoinOneBuilder::build) rejects it with
//!   [`ComposeError::MissingField`].
//! - [`run`](JoinOneBuilder::run) treats it as a no-op: in-place joins hand
//!   the items back untouched, converting joins return an empty list.
//!
//! # Example
//! ```rust
//! use std::collections::HashMap;
//! use batch_compose::{JoinOneBuilder, KeySet};
//!
//! let names: HashMap<u32, &str> = HashMap::from([(1, "ada")]);
//! let rows = JoinOneBuilder::new()
//!     .key(|row: &(u32, &'static str)| Some(row.0))
//!     .resolve(|keys: KeySet<u32>| {
//!         keys.iter().filter_map(|k| names.get(k).map(|n| (*k, *n))).collect()
//!     })
//!     .attach(|row, name| row.1 = name)
//!     .run(vec![(1, ""), (2, "")]);
//! assert_eq!(rows, vec![(1, "ada"), (2, "")]);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::error::{ComposeError, ComposeResult};
use crate::join::{join_many, join_many_into, join_one, join_one_into};
use crate::lookup::KeySet;

type Extract<'a, D, K> = Box<dyn FnMut(&D) -> Option<K> + 'a>;
type Resolve<'a, K, V> = Box<dyn FnOnce(KeySet<K>) -> HashMap<K, V> + 'a>;
type Attach<'a, T, SD> = Box<dyn FnMut(&mut T, SD) + 'a>;
type Convert<'a, D, V> = Box<dyn FnMut(D) -> V + 'a>;

fn require<T>(slot: Option<T>, field: &'static str) -> ComposeResult<T> {
    slot.ok_or(ComposeError::MissingField { field })
}

/// Builder for [`join_one`].
pub struct JoinOneBuilder<'a, D, K, SD> {
    extract: Option<Extract<'a, D, K>>,
    resolve: Option<Resolve<'a, K, SD>>,
    attach: Option<Attach<'a, D, SD>>,
}

impl<'a, D, K, SD> Default for JoinOneBuilder<'a, D, K, SD> {
    fn default() -> Self {
        Self {
            extract: None,
            resolve: None,
            attach: None,
        }
    }
}

impl<'a, D, K, SD> JoinOneBuilder<'a, D, K, SD>
where
    K: Eq + Hash + Clone,
    SD: Clone,
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key extractor; `None` marks an item without a related entity.
    #[must_use]
    pub fn key(mut self, extract: impl FnMut(&D) -> Option<K> + 'a) -> Self {
        self.extract = Some(Box::new(extract));
        self
    }

    /// Batch resolver, called at most once with the distinct keys.
    #[must_use]
    pub fn resolve(mut self, resolve: impl FnOnce(KeySet<K>) -> HashMap<K, SD> + 'a) -> Self {
        self.resolve = Some(Box::new(resolve));
        self
    }

    /// Attach step, called once per item whose key resolved.
    #[must_use]
    pub fn attach(mut self, attach: impl FnMut(&mut D, SD) + 'a) -> Self {
        self.attach = Some(Box::new(attach));
        self
    }

    /// Validate that every closure is present.
    pub fn build(self) -> ComposeResult<JoinOne<'a, D, K, SD>> {
        Ok(JoinOne {
            extract: require(self.extract, "key")?,
            resolve: require(self.resolve, "resolve")?,
            attach: require(self.attach, "attach")?,
        })
    }

    /// Run the join, or hand `items` back untouched if a closure is missing.
    pub fn run(self, items: Vec<D>) -> Vec<D> {
        match self.build() {
            Ok(join) => join.apply(items),
            Err(err) => {
                debug!(op = "join_one", error = %err, "join skipped");
                items
            }
        }
    }
}

/// A complete one-to-one join, ready to apply.
pub struct JoinOne<'a, D, K, SD> {
    extract: Extract<'a, D, K>,
    resolve: Resolve<'a, K, SD>,
    attach: Attach<'a, D, SD>,
}

impl<'a, D, K, SD> JoinOne<'a, D, K, SD>
where
    K: Eq + Hash + Clone,
    SD: Clone,
{
    /// See [`join_one`].
    pub fn apply(self, items: Vec<D>) -> Vec<D> {
        join_one(items, self.extract, self.resolve, self.attach)
    }
}

/// Builder for [`join_one_into`].
pub struct JoinOneIntoBuilder<'a, D, K, SD, V> {
    extract: Option<Extract<'a, D, K>>,
    resolve: Option<Resolve<'a, K, SD>>,
    convert: Option<Convert<'a, D, V>>,
    attach: Option<Attach<'a, V, SD>>,
}

impl<'a, D, K, SD, V> Default for JoinOneIntoBuilder<'a, D, K, SD, V> {
    fn default() -> Self {
        Self {
            extract: None,
            resolve: None,
            convert: None,
            attach: None,
        }
    }
}

impl<'a, D, K, SD, V> JoinOneIntoBuilder<'a, D, K, SD, V>
where
    K: Eq + Hash + Clone,
    SD: Clone,
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key extractor.
    #[must_use]
    pub fn key(mut self, extract: impl FnMut(&D) -> Option<K> + 'a) -> Self {
        self.extract = Some(Box::new(extract));
        self
    }

    /// Batch resolver.
    #[must_use]
    pub fn resolve(mut self, resolve: impl FnOnce(KeySet<K>) -> HashMap<K, SD> + 'a) -> Self {
        self.resolve = Some(Box::new(resolve));
        self
    }

    /// Conversion applied to every item.
    #[must_use]
    pub fn convert(mut self, convert: impl FnMut(D) -> V + 'a) -> Self {
        self.convert = Some(Box::new(convert));
        self
    }

    /// Attach step on the converted item.
    #[must_use]
    pub fn attach(mut self, attach: impl FnMut(&mut V, SD) + 'a) -> Self {
        self.attach = Some(Box::new(attach));
        self
    }

    /// Validate that every closure is present.
    pub fn build(self) -> ComposeResult<JoinOneInto<'a, D, K, SD, V>> {
        Ok(JoinOneInto {
            extract: require(self.extract, "key")?,
            resolve: require(self.resolve, "resolve")?,
            convert: require(self.convert, "convert")?,
            attach: require(self.attach, "attach")?,
        })
    }

    /// Run the join, or return an empty list if a closure is missing.
    pub fn run(self, items: Vec<D>) -> Vec<V> {
        match self.build() {
            Ok(join) => join.apply(items),
            Err(err) => {
                debug!(op = "join_one_into", error = %err, "join skipped");
                Vec::new()
            }
        }
    }
}

/// A complete converting one-to-one join.
pub struct JoinOneInto<'a, D, K, SD, V> {
    extract: Extract<'a, D, K>,
    resolve: Resolve<'a, K, SD>,
    convert: Convert<'a, D, V>,
    attach: Attach<'a, V, SD>,
}

impl<'a, D, K, SD, V> JoinOneInto<'a, D, K, SD, V>
where
    K: Eq + Hash + Clone,
    SD: Clone,
{
    /// See [`join_one_into`].
    pub fn apply(self, items: Vec<D>) -> Vec<V> {
        join_one_into(items, self.extract, self.resolve, self.convert, self.attach)
    }
}

/// Builder for [`join_many`].
pub struct JoinManyBuilder<'a, D, K, SID, SD> {
    extract: Option<Extract<'a, D, K>>,
    resolve_keys: Option<Resolve<'a, K, Vec<SID>>>,
    resolve_data: Option<Resolve<'a, SID, SD>>,
    attach: Option<Attach<'a, D, Vec<SD>>>,
}

impl<'a, D, K, SID, SD> Default for JoinManyBuilder<'a, D, K, SID, SD> {
    fn default() -> Self {
        Self {
            extract: None,
            resolve_keys: None,
            resolve_data: None,
            attach: None,
        }
    }
}

impl<'a, D, K, SID, SD> JoinManyBuilder<'a, D, K, SID, SD>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary key extractor.
    #[must_use]
    pub fn key(mut self, extract: impl FnMut(&D) -> Option<K> + 'a) -> Self {
        self.extract = Some(Box::new(extract));
        self
    }

    /// First stage: primary keys to secondary-key lists.
    #[must_use]
    pub fn resolve_keys(
        mut self,
        resolve: impl FnOnce(KeySet<K>) -> HashMap<K, Vec<SID>> + 'a,
    ) -> Self {
        self.resolve_keys = Some(Box::new(resolve));
        self
    }

    /// Second stage: secondary keys to related entities.
    #[must_use]
    pub fn resolve_data(mut self, resolve: impl FnOnce(KeySet<SID>) -> HashMap<SID, SD> + 'a) -> Self {
        self.resolve_data = Some(Box::new(resolve));
        self
    }

    /// Attach step, called with the gathered list.
    #[must_use]
    pub fn attach(mut self, attach: impl FnMut(&mut D, Vec<SD>) + 'a) -> Self {
        self.attach = Some(Box::new(attach));
        self
    }

    /// Validate that every closure is present.
    pub fn build(self) -> ComposeResult<JoinMany<'a, D, K, SID, SD>> {
        Ok(JoinMany {
            extract: require(self.extract, "key")?,
            resolve_keys: require(self.resolve_keys, "resolve_keys")?,
            resolve_data: require(self.resolve_data, "resolve_data")?,
            attach: require(self.attach, "attach")?,
        })
    }

    /// Run the join, or hand `items` back untouched if a closure is missing.
    pub fn run(self, items: Vec<D>) -> Vec<D> {
        match self.build() {
            Ok(join) => join.apply(items),
            Err(err) => {
                debug!(op = "join_many", error = %err, "join skipped");
                items
            }
        }
    }
}

/// A complete indirect one-to-many join.
pub struct JoinMany<'a, D, K, SID, SD> {
    extract: Extract<'a, D, K>,
    resolve_keys: Resolve<'a, K, Vec<SID>>,
    resolve_data: Resolve<'a, SID, SD>,
    attach: Attach<'a, D, Vec<SD>>,
}

impl<'a, D, K, SID, SD> JoinMany<'a, D, K, SID, SD>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
{
    /// See [`join_many`].
    pub fn apply(self, items: Vec<D>) -> Vec<D> {
        join_many(items, self.extract, self.resolve_keys, self.resolve_data, self.attach)
    }
}

/// Builder for [`join_many_into`].
pub struct JoinManyIntoBuilder<'a, D, K, SID, SD, V> {
    extract: Option<Extract<'a, D, K>>,
    resolve_keys: Option<Resolve<'a, K, Vec<SID>>>,
    resolve_data: Option<Resolve<'a, SID, SD>>,
    convert: Option<Convert<'a, D, V>>,
    attach: Option<Attach<'a, V, Vec<SD>>>,
}

impl<'a, D, K, SID, SD, V> Default for JoinManyIntoBuilder<'a, D, K, SID, SD, V> {
    fn default() -> Self {
        Self {
            extract: None,
            resolve_keys: None,
            resolve_data: None,
            convert: None,
            attach: None,
        }
    }
}

impl<'a, D, K, SID, SD, V> JoinManyIntoBuilder<'a, D, K, SID, SD, V>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
{
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Primary key extractor.
    #[must_use]
    pub fn key(mut self, extract: impl FnMut(&D) -> Option<K> + 'a) -> Self {
        self.extract = Some(Box::new(extract));
        self
    }

    /// First stage: primary keys to secondary-key lists.
    #[must_use]
    pub fn resolve_keys(
        mut self,
        resolve: impl FnOnce(KeySet<K>) -> HashMap<K, Vec<SID>> + 'a,
    ) -> Self {
        self.resolve_keys = Some(Box::new(resolve));
        self
    }

    /// Second stage: secondary keys to related entities.
    #[must_use]
    pub fn resolve_data(mut self, resolve: impl FnOnce(KeySet<SID>) -> HashMap<SID, SD> + 'a) -> Self {
        self.resolve_data = Some(Box::new(resolve));
        self
    }

    /// Conversion applied to every item.
    #[must_use]
    pub fn convert(mut self, convert: impl FnMut(D) -> V + 'a) -> Self {
        self.convert = Some(Box::new(convert));
        self
    }

    /// Attach step on the converted item.
    #[must_use]
    pub fn attach(mut self, attach: impl FnMut(&mut V, Vec<SD>) + 'a) -> Self {
        self.attach = Some(Box::new(attach));
        self
    }

    /// Validate that every closure is present.
    pub fn build(self) -> ComposeResult<JoinManyInto<'a, D, K, SID, SD, V>> {
        Ok(JoinManyInto {
            extract: require(self.extract, "key")?,
            resolve_keys: require(self.resolve_keys, "resolve_keys")?,
            resolve_data: require(self.resolve_data, "resolve_data")?,
            convert: require(self.convert, "convert")?,
            attach: require(self.attach, "attach")?,
        })
    }

    /// Run the join, or return an empty list if a closure is missing.
    pub fn run(self, items: Vec<D>) -> Vec<V> {
        match self.build() {
            Ok(join) => join.apply(items),
            Err(err) => {
                debug!(op = "join_many_into", error = %err, "join skipped");
                Vec::new()
            }
        }
    }
}

/// A complete converting indirect one-to-many join.
pub struct JoinManyInto<'a, D, K, SID, SD, V> {
    extract: Extract<'a, D, K>,
    resolve_keys: Resolve<'a, K, Vec<SID>>,
    resolve_data: Resolve<'a, SID, SD>,
    convert: Convert<'a, D, V>,
    attach: Attach<'a, V, Vec<SD>>,
}

impl<'a, D, K, SID, SD, V> JoinManyInto<'a, D, K, SID, SD, V>
where
    K: Eq + Hash + Clone,
    SID: Eq + Hash + Clone,
    SD: Clone,
{
    /// See [`join_many_into`].
    pub fn apply(self, items: Vec<D>) -> Vec<V> {
        join_many_into(
            items,
            self.extract,
            self.resolve_keys,
            self.resolve_data,
            self.convert,
            self.attach,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Order {
        oid: u32,
        user_id: Option<u32>,
        user_name: Option<String>,
        item_names: Vec<&'static str>,
    }

    fn orders() -> Vec<Order> {
        [(1, Some(1)), (2, Some(2)), (3, None), (4, Some(1))]
            .into_iter()
            .map(|(oid, user_id)| Order { oid, user_id, user_name: None, item_names: Vec::new() })
            .collect()
    }

    fn users(keys: &KeySet<u32>) -> HashMap<u32, String> {
        keys.iter()
            .filter_map(|k| match k {
                1 => Some((1, "zhangsan".to_string())),
                2 => Some((2, "lisi".to_string())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_build_reports_first_missing_field() {
        let result = JoinOneBuilder::<Order, u32, String>::new()
            .key(|o| o.user_id)
            .build();
        assert!(matches!(
            result,
            Err(ComposeError::MissingField { field: "resolve" })
        ));

        let result = JoinManyIntoBuilder::<Order, u32, u32, &str, u32>::new()
            .key(|o| Some(o.oid))
            .resolve_keys(|_| HashMap::new())
            .resolve_data(|_| HashMap::new())
            .attach(|_, _| {})
            .build();
        assert!(matches!(
            result,
            Err(ComposeError::MissingField { field: "convert" })
        ));
    }

    #[test]
    fn test_run_with_missing_attach_returns_items() {
        let input = orders();
        let out = JoinOneBuilder::<Order, u32, String>::new()
            .key(|o| o.user_id)
            .resolve(|keys| users(&keys))
            .run(input.clone());
        assert_eq!(out, input);
    }

    #[test]
    fn test_into_run_with_missing_field_is_empty() {
        let out = JoinOneIntoBuilder::<Order, u32, String, u32>::new()
            .key(|o| o.user_id)
            .resolve(|keys| users(&keys))
            .attach(|_, _| {})
            .run(orders());
        assert!(out.is_empty());
    }

    #[test]
    fn test_join_one_builder_applies() {
        let join = JoinOneBuilder::new()
            .key(|o: &Order| o.user_id)
            .resolve(|keys: KeySet<u32>| users(&keys))
            .attach(|o, name| o.user_name = Some(name))
            .build()
            .unwrap();
        let out = join.apply(orders());
        let names: Vec<_> = out.iter().map(|o| o.user_name.as_deref()).collect();
        assert_eq!(names, vec![Some("zhangsan"), Some("lisi"), None, Some("zhangsan")]);
    }

    #[test]
    fn test_join_one_into_builder_applies() {
        let out = JoinOneIntoBuilder::new()
            .key(|o: &Order| o.user_id)
            .resolve(|keys: KeySet<u32>| users(&keys))
            .convert(|o: Order| (o.oid, String::new()))
            .attach(|v: &mut (u32, String), name: String| v.1 = name)
            .run(orders());
        assert_eq!(out[1], (2, "lisi".to_string()));
        assert_eq!(out[2], (3, String::new()));
    }

    #[test]
    fn test_join_many_builders_apply() {
        let bridge = HashMap::from([(1_u32, vec![11_u32, 22]), (2, vec![11])]);
        let catalog = HashMap::from([(11_u32, "item_11"), (22, "item_22")]);

        let out = JoinManyBuilder::new()
            .key(|o: &Order| Some(o.oid))
            .resolve_keys(|_: KeySet<u32>| bridge.clone())
            .resolve_data(|_: KeySet<u32>| catalog.clone())
            .attach(|o: &mut Order, names| o.item_names = names)
            .run(orders());
        assert_eq!(out[0].item_names, vec!["item_11", "item_22"]);
        assert_eq!(out[1].item_names, vec!["item_11"]);
        assert!(out[2].item_names.is_empty());

        let counts = JoinManyIntoBuilder::new()
            .key(|o: &Order| Some(o.oid))
            .resolve_keys(|_: KeySet<u32>| bridge.clone())
            .resolve_data(|_: KeySet<u32>| catalog.clone())
            .convert(|o: Order| (o.oid, 0_usize))
            .attach(|v: &mut (u32, usize), names: Vec<&str>| v.1 = names.len())
            .run(orders());
        assert_eq!(counts, vec![(1, 2), (2, 1), (3, 0), (4, 0)]);
    }
}
