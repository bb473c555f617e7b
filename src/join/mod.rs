//! Batched list joins.
//!
//! Every join follows the same shape:
//! 1. Extract one key per item and dedup into a [`KeySet`](crate::KeySet).
//! 2. Call each resolver exactly once, or not at all when there is nothing to
//!    ask for.
//! 3. Fan the answer back out to the items (or their converted views) in
//!    input order.
//!
//! The `try_*` functions are the primitives. The infallible ones instantiate
//! them with [`Infallible`](std::convert::Infallible); the `*_async` functions
//! in [`future`] mirror them with awaited resolvers.

pub mod future;
pub mod grouped;
pub mod many;
pub mod one;

pub use future::{
    join_grouped_async, join_grouped_into_async, join_many_async, join_many_into_async,
    join_one_async, join_one_into_async,
};
pub use grouped::{join_grouped, join_grouped_into, try_join_grouped, try_join_grouped_into};
pub use many::{join_many, join_many_into, try_join_many, try_join_many_into};
pub use one::{join_one, join_one_into, try_join_one, try_join_one_into};
