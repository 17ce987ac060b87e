// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! A referentially compressed multisequence (RCMS) store and the lazy
//! journaled sequence tree (JST) built over it, for searching a pattern
//! against every distinct sample window of a pan-genome without ever
//! materializing a sample's full sequence.
//!
//! # Components
//!
//! - [`coverage`] — dense bit-vector sample coverage over a range domain.
//! - [`breakpoint`] — the shared `Breakpoint`/`BreakendKey`/`BreakendKind`
//!   data model.
//! - [`journal`] — a single sequence's edit log (splice-based, O(log n)
//!   random access).
//! - [`rcms`] — the referentially compressed multisequence itself: one
//!   source plus a breakend multimap and indel side-table.
//! - [`tree`] — the lazy sequence-tree algebra composed over an RCMS
//!   (`labelled`/`coloured`/`trim`/`prune`/`left_extend`/`merge`, plus
//!   `chunk`/`seek`/`stats`/`reverse`).
//! - [`matcher`] — the `Matcher`/`ResumableMatcher` contract plus two
//!   reference kernels.
//! - [`search`] — the single- and multi-threaded search drivers.
//! - [`io`] — the on-disk RCMS file format.
//! - [`ingest`] — a minimal FASTA + variant-TSV front end (not VCF).
//!
//! # Example
//!
//! ```rust,no_run
//! use jst_search::prelude::*;
//!
//! let rcms = Rcms::new(b"AAAABBBB".to_vec(), RangeDomain::new(0, 1));
//! let tree = SequenceTree::canonical(&rcms, 4);
//! let windows = tree.collect();
//! ```

pub mod breakpoint;
pub mod config;
pub mod coverage;
pub mod error;
pub mod ingest;
pub mod io;
pub mod journal;
pub mod matcher;
pub mod rcms;
pub mod search;
pub mod tree;

pub use error::{JstError, Result, SerializationError};
pub use rcms::Rcms;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::breakpoint::{BreakendKey, BreakendKind, Breakpoint};
    pub use crate::coverage::{BitCoverage, RangeDomain};
    pub use crate::error::{JstError, Result, SerializationError};
    pub use crate::journal::Journal;
    pub use crate::matcher::{ExactMatcher, HammingMatcher, Matcher, ResumableMatcher};
    pub use crate::rcms::Rcms;
    pub use crate::search::{polymorphic_sequence_searcher, polymorphic_sequence_searcher_multi_threaded, MatchPosition, SearchStats};
    pub use crate::tree::{Cargo, LabelKind, SequenceTree, TreePosition};
}
