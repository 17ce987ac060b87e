//! Typed errors for RCMS construction, serialization and search.
//!
//! Construction-time errors are surfaced to the caller; once a tree is built
//! from a validated [`crate::rcms::Rcms`], traversal itself is total and
//! never produces an error (see `spec.md` §7).

use thiserror::Error;

use crate::coverage::RangeDomain;

/// Errors raised while building or searching an RCMS / journaled sequence tree.
#[derive(Error, Debug)]
pub enum JstError {
    /// A variant's coverage domain did not match the store's domain on insert.
    #[error("coverage domain mismatch: variant has {found:?}, store expects {expected:?}")]
    DomainMismatch {
        expected: RangeDomain,
        found: RangeDomain,
    },

    /// A variant at an existing position has a coverage intersection with a
    /// variant already present at the same low breakend.
    #[error("conflicting variant at position {position}: coverage overlaps an existing variant")]
    ConflictingVariant { position: u64 },

    /// A breakpoint lies partially or wholly outside the current source /
    /// journal range.
    #[error("breakpoint [{low}, {high}) is out of bounds for a sequence of length {source_len}")]
    OutOfBoundsBreakpoint {
        low: u64,
        high: u64,
        source_len: u64,
    },

    /// Fatal error while loading or saving an RCMS file.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// A user-supplied matcher reported a failure mid-traversal; the driver
    /// aborts and returns whatever partial results it had already reported.
    #[error("matcher failed: {0}")]
    MatcherFailure(String),
}

/// Errors specific to the on-disk RCMS file format (`spec.md` §6).
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("corrupt RCMS file: {0}")]
    Corrupt(String),

    #[error("unsupported RCMS file version {found}, expected {expected}")]
    Version { found: u32, expected: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, JstError>;
