//! Component E: the search driver (`spec.md` §4.E, §5).
//!
//! Grounded in `original_source/libjst/libjst/detail/journal_sequence_tree_traverser.hpp`
//! for the single-threaded driver's shape (one composed canonical tree, one
//! matcher, hit callback driven off the traverser's branch/join events) and
//! the teacher's chromosome-parallel `rayon` work-stealing dispatch for the
//! multi-threaded one - here sharded by reference chunk instead of
//! chromosome, since a single RCMS plays the role the teacher gives a
//! per-chromosome interval group.

pub mod branch_stack;

use std::time::Instant;

use rayon::prelude::*;

use crate::coverage::BitCoverage;
use crate::matcher::Matcher;
use crate::rcms::Rcms;
use crate::tree::{chunk_tree, ControlFlow, SequenceTree, TreePosition};

pub use branch_stack::BranchGuard;

/// Where a match ended: the tree node it occurred in, the offset into that
/// node's label, and the set of samples the node's path is valid for
/// (`spec.md` §4.E "reports hits against the cargo that contains them").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPosition {
    pub tree_position: TreePosition,
    pub label_offset: usize,
    pub coverage: BitCoverage,
}

/// Summary of a completed search (`spec.md` §1 places application logging
/// out of scope; this plays the role the teacher's per-command `*Stats`
/// structs do).
#[derive(Debug, Clone)]
pub struct SearchStats {
    pub hits: usize,
    pub nodes_visited: usize,
    pub chunks_processed: usize,
    pub elapsed_secs: f64,
}

impl std::fmt::Display for SearchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hits={} nodes={} chunks={} elapsed={:.3}s",
            self.hits, self.nodes_visited, self.chunks_processed, self.elapsed_secs
        )
    }
}

/// Runs `matcher` over every window the canonical tree over `rcms` produces,
/// single-threaded, calling `on_hit` for each match end position
/// (`spec.md` §4.E `polymorphic_sequence_searcher`). `window` is the
/// matcher's required context width (`Matcher::window_size`); it drives
/// `trim`/`left_extend` sizing the same way for every chunk.
pub fn polymorphic_sequence_searcher<M: Matcher>(
    rcms: &Rcms,
    matcher: &M,
    mut on_hit: impl FnMut(MatchPosition),
) -> SearchStats {
    let start = Instant::now();
    let window = matcher.window_size().max(1) as u32;
    let tree = SequenceTree::canonical(rcms, window);

    let mut hits = 0usize;
    let mut nodes_visited = 0usize;
    tree.traverse(|cargo| {
        nodes_visited += 1;
        matcher.run(&cargo.sequence, &mut |end| {
            hits += 1;
            on_hit(MatchPosition {
                tree_position: cargo.position.clone(),
                label_offset: cargo.sequence.len() - end,
                coverage: cargo.coverage.clone().expect("canonical() always enables coloured()"),
            });
        });
        ControlFlow::Continue
    });

    SearchStats {
        hits,
        nodes_visited,
        chunks_processed: 1,
        elapsed_secs: start.elapsed().as_secs_f64(),
    }
}

/// The multi-threaded driver (`spec.md` §4.E, §6.1 "Concurrency & Resource
/// Model"): chunks the reference with [`chunk_tree`]/`balanced_chunk_size`
/// and runs one worker per chunk via `rayon`, mirroring
/// `crate::parallel::process_chromosomes`'s per-group dispatch but sharded
/// by reference range instead of by chromosome. `matcher` must be `Sync` so
/// each worker can share read-only access to it; callers needing per-worker
/// mutable matcher state should clone one per chunk instead (matchers here
/// are cheap value types - see `matcher.rs`).
pub fn polymorphic_sequence_searcher_multi_threaded<M: Matcher + Sync>(
    rcms: &Rcms,
    matcher: &M,
    n_threads: usize,
) -> (Vec<MatchPosition>, SearchStats) {
    let start = Instant::now();
    let window = matcher.window_size().max(1) as u32;
    let n_threads = if n_threads == 0 {
        crate::config::default_thread_count()
    } else {
        n_threads
    };

    let source_len = rcms.source().len() as u32;
    let chunk_size = crate::tree::chunk::balanced_chunk_size(source_len, n_threads);
    let chunks = chunk_tree(rcms, chunk_size);
    let chunks_processed = chunks.len();

    let per_chunk: Vec<(usize, Vec<MatchPosition>)> = chunks
        .into_par_iter()
        .map(|base_tree| {
            let tree = configure_like_canonical(base_tree, window);
            let mut local_hits = Vec::new();
            let mut local_nodes = 0usize;
            tree.traverse(|cargo| {
                local_nodes += 1;
                matcher.run(&cargo.sequence, &mut |end| {
                    local_hits.push(MatchPosition {
                        tree_position: cargo.position.clone(),
                        label_offset: cargo.sequence.len() - end,
                        coverage: cargo.coverage.clone().expect("canonical() always enables coloured()"),
                    });
                });
                ControlFlow::Continue
            });
            (local_nodes, local_hits)
        })
        .collect();

    let mut nodes_visited = 0usize;
    let mut hits = Vec::new();
    for (nodes, mut local_hits) in per_chunk {
        nodes_visited += nodes;
        hits.append(&mut local_hits);
    }

    let stats = SearchStats {
        hits: hits.len(),
        nodes_visited,
        chunks_processed,
        elapsed_secs: start.elapsed().as_secs_f64(),
    };
    (hits, stats)
}

/// Applies the same adaptor chain [`SequenceTree::canonical`] does, to a
/// tree already restricted to a chunk's range by [`chunk_tree`]
/// (`spec.md` §4.E: "composes the same adaptors per-chunk").
fn configure_like_canonical(tree: SequenceTree<'_>, window: u32) -> SequenceTree<'_> {
    let w1 = window.saturating_sub(1);
    tree.labelled(crate::tree::LabelKind::RootPath)
        .coloured()
        .trim(w1)
        .prune()
        .left_extend(w1)
        .merge()
}
