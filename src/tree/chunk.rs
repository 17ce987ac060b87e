//! `chunk(size, overlap)` (`spec.md` §4.D.7): partitions the reference into
//! contiguous ranges, yielding a forest so the search driver's
//! multi-threaded mode can dispatch one [`super::SequenceTree`] per worker.
//!
//! Consecutive chunks overlap by `window - 1` bases so every window of
//! every sample is enumerated in exactly one chunk (`spec.md`'s "Formally:
//! a window whose reference-projection ends in `[chunk_i.end,
//! chunk_{i+1}.end)` is enumerated in chunk `i`" - the overlap tail is
//! produced by [`super::SequenceTree::ceiling`], not by literally
//! duplicating reference bytes between chunks here).

use crate::rcms::Rcms;

use super::SequenceTree;

/// Splits `rcms`'s reference into `chunk_size`-wide ranges `[lo, hi)` and
/// returns one unconfigured [`SequenceTree`] per range; callers apply the
/// same adaptor chain to each (`spec.md` §4.E: "composes the same adaptors
/// per-chunk").
pub fn chunk_tree(rcms: &Rcms, chunk_size: u32) -> Vec<SequenceTree<'_>> {
    let source_len = rcms.source().len() as u32;
    if source_len == 0 {
        return vec![SequenceTree::over_range(rcms, 0, 0)];
    }
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut lo = 0u32;
    while lo < source_len {
        let hi = (lo + chunk_size).min(source_len);
        chunks.push(SequenceTree::over_range(rcms, lo, hi));
        lo = hi;
    }
    chunks
}

/// `⌈|source| / n_threads⌉`-sized balanced chunking, used by the
/// multi-threaded search driver (`spec.md` §4.E).
pub fn balanced_chunk_size(source_len: u32, n_threads: usize) -> u32 {
    let n_threads = n_threads.max(1) as u32;
    source_len.div_ceil(n_threads).max(1)
}
