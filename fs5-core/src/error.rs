//! Crate-wide error types.
//!
//! Failure containment follows one rule throughout the crate: anything
//! local to a single entity (one operation, one time series, one parametric
//! record) is contained at that entity's boundary — skipped, counted in
//! [`crate::diagnostics::Diagnostics`], and never allowed to abort sibling
//! entities. Errors opening a required file or setting up the session
//! propagate to the caller as [`Fs5Error`]. "Entity not found" is `None`,
//! never an error.

use crate::endian::ProbeError;
use crate::index::IndexError;
use crate::registry::RegistryError;
use crate::stream::StreamError;
use thiserror::Error;

/// Errors that can occur while decoding one logical record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// A declared count left the record shorter than its fields require
    #[error("truncated {what}")]
    Truncated { what: &'static str },

    /// Decoding a segment's parameter array consumed a different number of
    /// words than its status record declared
    #[error("word count mismatch: declared {declared}, consumed {consumed}")]
    WordCountMismatch { declared: usize, consumed: usize },

    /// A per-entity loop ran past its guard; the decode keeps whatever was
    /// accumulated before the guard tripped
    #[error("too many {what} (limit {limit})")]
    TooManyItems { what: &'static str, limit: usize },
}

/// Top-level errors surfaced by a session.
#[derive(Debug, Error)]
pub enum Fs5Error {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// A specialized Result type for session operations.
pub type Result<T> = std::result::Result<T, Fs5Error>;
