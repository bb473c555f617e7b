//! Single-item composition.
//!
//! These operations enrich one base item from one lookup. There is nothing to
//! batch, so they exist for API symmetry with the list joins: the same absence
//! rules apply and the same attach/convert closures can be reused between a
//! detail view and a list view.

use std::convert::Infallible;

use crate::error::into_ok;

/// Attach one related value to `item`.
///
/// Returns `item` unchanged when it is `None`, when its key is absent, or when
/// `resolve` finds nothing. `resolve` is not called for an absent key.
///
/// ```rust
/// use batch_compose::attach_one;
///
/// #[derive(Debug, PartialEq)]
/// struct Order { user_id: Option<u64>, user_name: Option<String> }
///
/// let order = Order { user_id: Some(7), user_name: None };
/// let order = attach_one(
///     Some(order),
///     |o| o.user_id,
///     |id| (id == 7).then(|| "ada".to_string()),
///     |o, name| o.user_name = Some(name),
/// );
/// assert_eq!(order.unwrap().user_name.as_deref(), Some("ada"));
/// ```
pub fn attach_one<D, K, SD>(
    item: Option<D>,
    extract: impl FnOnce(&D) -> Option<K>,
    resolve: impl FnOnce(K) -> Option<SD>,
    attach: impl FnOnce(&mut D, SD),
) -> Option<D> {
    into_ok(try_attach_one(item, extract, |key| Ok::<_, Infallible>(resolve(key)), attach))
}

/// Fallible [`attach_one`]: a resolver error is returned as-is.
pub fn try_attach_one<D, K, SD, E>(
    item: Option<D>,
    extract: impl FnOnce(&D) -> Option<K>,
    resolve: impl FnOnce(K) -> Result<Option<SD>, E>,
    attach: impl FnOnce(&mut D, SD),
) -> Result<Option<D>, E> {
    let Some(mut item) = item else {
        return Ok(None);
    };
    let Some(key) = extract(&item) else {
        return Ok(Some(item));
    };
    if let Some(related) = resolve(key)? {
        attach(&mut item, related);
    }
    Ok(Some(item))
}

/// Convert `item` and attach one related value to the converted shape.
///
/// The conversion always happens once `item` is present, whether or not the
/// key resolves. Only a `None` item yields `None`.
pub fn attach_one_into<D, K, SD, V>(
    item: Option<D>,
    extract: impl FnOnce(&D) -> Option<K>,
    resolve: impl FnOnce(K) -> Option<SD>,
    convert: impl FnOnce(D) -> V,
    attach: impl FnOnce(&mut V, SD),
) -> Option<V> {
    into_ok(try_attach_one_into(
        item,
        extract,
        |key| Ok::<_, Infallible>(resolve(key)),
        convert,
        attach,
    ))
}

/// Fallible [`attach_one_into`].
pub fn try_attach_one_into<D, K, SD, V, E>(
    item: Option<D>,
    extract: impl FnOnce(&D) -> Option<K>,
    resolve: impl FnOnce(K) -> Result<Option<SD>, E>,
    convert: impl FnOnce(D) -> V,
    attach: impl FnOnce(&mut V, SD),
) -> Result<Option<V>, E> {
    let Some(item) = item else {
        return Ok(None);
    };
    let key = extract(&item);
    let mut view = convert(item);
    if let Some(key) = key {
        if let Some(related) = resolve(key)? {
            attach(&mut view, related);
        }
    }
    Ok(Some(view))
}

/// Attach a list of related values to `item`.
///
/// A `None` from `resolve` means "no data": `attach` is not called. An empty
/// `Some(vec![])` is attached as an empty list.
pub fn attach_many<D, K, SD>(
    item: Option<D>,
    extract: impl FnOnce(&D) -> Option<K>,
    resolve: impl FnOnce(K) -> Option<Vec<SD>>,
    attach: impl FnOnce(&mut D, Vec<SD>),
) -> Option<D> {
    attach_one(item, extract, resolve, attach)
}

/// Fallible [`attach_many`].
pub fn try_attach_many<D, K, SD, E>(
    item: Option<D>,
    extract: impl FnOnce(&D) -> Option<K>,
    resolve: impl FnOnce(K) -> Result<Option<Vec<SD>>, E>,
    attach: impl FnOnce(&mut D, Vec<SD>),
) -> Result<Option<D>, E> {
    try_attach_one(item, extract, resolve, attach)
}

/// Convert `item` and attach a list of related values to the converted shape.
pub fn attach_many_into<D, K, SD, V>(
    item: Option<D>,
    extract: impl FnOnce(&D) -> Option<K>,
    resolve: impl FnOnce(K) -> Option<Vec<SD>>,
    convert: impl FnOnce(D) -> V,
    attach: impl FnOnce(&mut V, Vec<SD>),
) -> Option<V> {
    attach_one_into(item, extract, resolve, convert, attach)
}

/// Fallible [`attach_many_into`].
pub fn try_attach_many_into<D, K, SD, V, E>(
    item: Option<D>,
    extract: impl FnOnce(&D) -> Option<K>,
    resolve: impl FnOnce(K) -> Result<Option<Vec<SD>>, E>,
    convert: impl FnOnce(D) -> V,
    attach: impl FnOnce(&mut V, Vec<SD>),
) -> Result<Option<V>, E> {
    try_attach_one_into(item, extract, resolve, convert, attach)
}
