//! # batch-compose - Batched view composition
//!
//! batch-compose assembles view objects from several related data sources
//! without the N+1 lookup pattern. Instead of fetching a related entity once
//! per base item, every join collects the keys of all items, deduplicates
//! them, asks a caller-supplied resolver once, and fans the answer back out.
//!
//! ## Core Concepts
//!
//! - **Base item (`D`)**: the record being enriched
//! - **Related item (`SD`)**: the record attached to it
//! - **Key (`K`)**: correlates the two; extractors return `Option<K>`
//! - **Secondary key (`SID`)**: bridge keys for indirect one-to-many joins
//! - **View (`V`)**: an optional converted shape enriched instead of `D`
//! - **Resolver**: caller code that does the actual fetching
//!
//! ## Operations
//!
//! | | one-to-one | one-to-many |
//! |---|---|---|
//! | single item | [`attach_one`] | [`attach_many`] |
//! | list | [`join_one`] | [`join_many`] (bridge keys), [`join_grouped`] (direct) |
//!
//! Each has an `_into` twin that converts items first and a `try_` twin for
//! fallible resolvers; list joins also have `_async` twins.
//!
//! ## Usage
//!
//! ```rust
//! use batch_compose::{index_by, join_one_into, KeySet};
//!
//! struct Order { oid: u64, user_id: Option<u64> }
//! #[derive(Clone)]
//! struct User { uid: u64, name: String }
//! struct OrderView { oid: u64, user_name: Option<String> }
//!
//! fn load_users(ids: &KeySet<u64>) -> Vec<User> {
//!     ids.iter().map(|&uid| User { uid, name: format!("user-{uid}") }).collect()
//! }
//!
//! let orders = vec![
//!     Order { oid: 1, user_id: Some(7) },
//!     Order { oid: 2, user_id: None },
//!     Order { oid: 3, user_id: Some(7) },
//! ];
//!
//! let views = join_one_into(
//!     orders,
//!     |o| o.user_id,
//!     |ids: KeySet<u64>| index_by(load_users(&ids), |u| u.uid),
//!     |o| OrderView { oid: o.oid, user_name: None },
//!     |v, user| v.user_name = Some(user.name),
//! );
//!
//! assert_eq!(views[0].user_name.as_deref(), Some("user-7"));
//! assert_eq!(views[1].user_name, None);
//! assert_eq!(views[2].oid, 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod error;
pub mod join;
pub mod keys;
pub mod lookup;
pub mod single;

// Re-export primary types at crate root for convenience
pub use builder::{
	JoinMany, JoinManyBuilder, JoinManyInto, JoinManyIntoBuilder, JoinOne, JoinOneBuilder,
	JoinOneInto, JoinOneIntoBuilder,
};
pub use error::{ComposeError, ComposeResult};
pub use join::{
	join_grouped, join_grouped_async, join_grouped_into, join_grouped_into_async, join_many,
	join_many_async, join_many_into, join_many_into_async, join_one, join_one_async, join_one_into,
	join_one_into_async, try_join_grouped, try_join_grouped_into, try_join_many,
	try_join_many_into, try_join_one, try_join_one_into,
};
pub use keys::{distinct_keys, group_by, index_by};
pub use lookup::{KeySet, Lookup};
pub use single::{
	attach_many, attach_many_into, attach_one, attach_one_into, try_attach_many,
	try_attach_many_into, try_attach_one, try_attach_one_into,
};
