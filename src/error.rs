//! Error types for batch-compose.
//!
//! Absence of data is never an error here: absent keys, empty maps and `None`
//! resolutions simply leave items unenriched. The only failure this crate
//! produces itself is an incomplete builder. Resolver failures belong to the
//! caller and are returned unchanged by the `try_*` and `*_async` operations.

use std::convert::Infallible;

use thiserror::Error;

/// Errors produced by the composition builders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// A builder was finished without one of its required closures.
    #[error("Required field '{field}' is missing")]
    MissingField {
        /// Name of the setter that was never called.
        field: &'static str,
    },
}

/// Result alias for builder validation.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Unwrap a result whose error type cannot be constructed.
pub(crate) fn into_ok<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
