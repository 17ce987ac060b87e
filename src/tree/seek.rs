//! `tree.seek(pos) -> node` (`spec.md` §4.D.8).
//!
//! Rather than memoizing every visited node's position in a side table (as
//! `original_source/libjst/libjst/sequence_tree/volatile_tree.hpp`'s
//! `seek_position` cache does), a [`super::TreePosition`] here is already
//! the complete, self-sufficient list of branch decisions - replaying it
//! from the root deterministically reconstructs the same cargo in
//! `O(path-length)`, satisfying `spec.md` §8 property 7 without needing a
//! cache at all.

use crate::coverage::BitCoverage;

use super::{
    alt_next_cursor, branch_delta, is_sink, next_cursor_after, Cargo, Cursor, LabelKind,
    SequenceTree, TreePosition,
};

pub fn seek(tree: &SequenceTree<'_>, pos: &TreePosition) -> Cargo {
    let rcms = tree.rcms();
    let source_len = rcms.source().len() as u32;
    let (chunk_lo, chunk_hi) = tree.range();
    let window = tree.window();

    let mut path_buf: Vec<u8> = Vec::new();
    if let Some(w) = window {
        let w1 = w.saturating_sub(1);
        let ext = w1.min(chunk_lo);
        let start = (chunk_lo - ext) as usize;
        path_buf.extend_from_slice(&rcms.source()[start..chunk_lo as usize]);
    }
    let mut run_start = path_buf.len();
    let mut cursor = Cursor::Virtual(chunk_lo);
    let mut coverage = BitCoverage::full(rcms.coverage_domain());
    let mut distance_since_branch = 0u32;
    let mut bit_iter = pos.bits().iter().copied();
    let trim_window = window.map(|w| w.saturating_sub(1));
    let ceiling = chunk_hi.saturating_add(trim_window.unwrap_or(0)).min(source_len);

    loop {
        if is_sink(cursor, source_len) || cursor.position() >= ceiling {
            break;
        }
        if cursor.position() >= chunk_hi {
            let pos_now = cursor.position();
            let take = (ceiling - pos_now) as usize;
            path_buf.extend_from_slice(&rcms.source()[pos_now as usize..pos_now as usize + take]);
            break;
        }

        let nxt = next_cursor_after(rcms, cursor);
        let branch = branch_delta(rcms, cursor);
        let gap_full = (nxt.position() - cursor.position()) as usize;
        let ceiling_limit = (ceiling - cursor.position()) as usize;
        // Ceiling-capped gap, ignoring trim - what `merge()` consumes in
        // one step (`SequenceTree::advance_through_gap`'s merged branch).
        let consume = gap_full.min(ceiling_limit);
        let consume_clipped = consume < gap_full;
        // Trim-and-ceiling-capped gap - what a non-merging tree consumes
        // per step, splitting the run at the trim horizon.
        let allowed = trim_window
            .map(|w1| w1.saturating_sub(distance_since_branch) as usize)
            .unwrap_or(usize::MAX)
            .min(ceiling_limit);
        let ref_len = gap_full.min(allowed);
        let ref_label = &rcms.source()[cursor.position() as usize..cursor.position() as usize + ref_len];

        match branch {
            Some((key, delta)) => match bit_iter.next() {
                None => break,
                Some(true) => {
                    path_buf.extend_from_slice(delta.alt);
                    coverage.and(delta.coverage);
                    cursor = alt_next_cursor(rcms, key, &delta);
                    distance_since_branch = 0;
                    run_start = path_buf.len() - delta.alt.len();
                }
                Some(false) => {
                    // Mirrors `advance_through_gap`'s decline child: under
                    // `merge()` the step is never trim-clipped, only the
                    // ceiling bounds it.
                    if tree.merged() {
                        path_buf.extend_from_slice(&rcms.source()[cursor.position() as usize..cursor.position() as usize + consume]);
                        run_start = path_buf.len() - consume;
                    } else {
                        path_buf.extend_from_slice(ref_label);
                        run_start = path_buf.len() - ref_len;
                    }
                    coverage.and_not(delta.coverage);
                    cursor = nxt;
                    distance_since_branch = 0;
                }
            },
            None => {
                // `merge()` coalesces every non-branching run into one
                // cargo, so (mirroring `advance_through_gap`) the trim
                // horizon never truncates traversal here - only a non-
                // merging tree splits the run at the trim horizon, which
                // is harmless there since adjacent steps already produce
                // separate cargos (`spec.md` §3: a `TreePosition` must not
                // straddle two distinct merged cargos).
                if tree.merged() {
                    path_buf.extend_from_slice(&rcms.source()[cursor.position() as usize..cursor.position() as usize + consume]);
                    distance_since_branch += consume as u32;
                    if consume_clipped {
                        break;
                    }
                } else {
                    path_buf.extend_from_slice(ref_label);
                    if ref_len < gap_full {
                        break;
                    }
                    run_start = path_buf.len() - ref_len;
                    distance_since_branch = 0;
                }
                cursor = nxt;
            }
        }
    }

    let sequence = match tree_label_kind(tree) {
        LabelKind::RootPath => path_buf,
        LabelKind::Node => path_buf[run_start..].to_vec(),
    };
    Cargo {
        sequence,
        position: pos.clone(),
        coverage: tree_coloured(tree).then_some(coverage),
    }
}

// Small accessors so this module doesn't need `pub(crate)` fields on
// `TreeConfig` duplicated here.
fn tree_label_kind(tree: &SequenceTree<'_>) -> LabelKind {
    tree.label_kind()
}

fn tree_coloured(tree: &SequenceTree<'_>) -> bool {
    tree.coloured()
}
