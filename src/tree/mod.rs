//! Component D: the sequence-tree algebra (`spec.md` §4.D).
//!
//! Grounded in `original_source/libjst/libjst/sequence_tree/` - the base
//! tree's `(left, right)` breakend-iterator node plus the A-H reference-node
//! state machine, and the adaptor chain
//! `labelled | coloured | trim | prune | left_extend | merge`. The state
//! machine itself (spec.md's `{A, B, C, D, E, F, G, H, last_*}` alphabet)
//! is a bookkeeping device the C++ traverser needs to avoid re-deriving
//! "what's the next breakend" on every step; in Rust we get the same
//! observable tree - same nodes, same labels, same branching decisions - by
//! deriving each step directly from [`crate::rcms::Rcms`]'s breakend
//! multimap instead of threading eight named states through a class
//! (`spec.md` §9 sanctions exactly this: "generic functions returning
//! concrete types ... instead of extensive template adaptor chaining").
//!
//! Rather than one Rust type per adaptor (`labelled.rs`, `coloured.rs`, ...),
//! the seven adaptors spec.md §4.D lists are collapsed into builder methods
//! on one [`SequenceTree`] plus a [`TreeConfig`] - see `DESIGN.md` for why.
//! [`chunk`], [`seek`] and [`stats`] get their own modules because they
//! produce their own public types (a forest, a memoized position, a report)
//! rather than just toggling traversal behaviour.

pub mod chunk;
pub mod reverse;
pub mod seek;
pub mod stats;

pub use chunk::chunk_tree;
pub use seek::seek as seek_position;
pub use stats::TreeStats;

use crate::breakpoint::{BreakendKey, BreakendKind};
use crate::coverage::BitCoverage;
use crate::rcms::{Delta, DeltaKind, Rcms};

/// Which portion of the accumulated path a cargo's label is drawn from
/// (`spec.md` §4.D.1, `labelled<kind>()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    /// Only the bytes this node (or, with `merge()`, this coalesced run of
    /// non-branching nodes) itself contributes.
    Node,
    /// The full window from the tree's root (or chunk start, extended left
    /// by `left_extend` if configured) to this node.
    RootPath,
}

/// A variant-length path descriptor (`spec.md` §3 "Tree position"):
/// one `bool` per branching reference-node visited, `true` for the
/// alternative branch, `false` for the reference branch. Two positions
/// compare equal iff they denote the same cargo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TreePosition {
    bits: Vec<bool>,
}

impl TreePosition {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }
}

/// What a traversal yields at each visited node (`spec.md` §3 "Cargo").
#[derive(Debug, Clone)]
pub struct Cargo {
    pub sequence: Vec<u8>,
    pub position: TreePosition,
    pub coverage: Option<BitCoverage>,
}

/// Tells the traversal whether to keep going or stop early
/// (`spec.md` §5 "Cancellation").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    Continue,
    Stop,
}

/// Push/pop notifications fired around each alternative at a branching
/// node (`spec.md` §9). `is_alt` is `true` when about to enter the
/// variant's own branch, `false` for the reference (decline) branch.
pub trait TraverseHooks {
    fn on_descend(&mut self, is_alt: bool);
    fn on_ascend(&mut self);
}

/// The hook implementation [`SequenceTree::traverse`] uses.
struct NoopHooks;

impl TraverseHooks for NoopHooks {
    fn on_descend(&mut self, _is_alt: bool) {}
    fn on_ascend(&mut self) {}
}

/// Where the traversal currently stands: either a real breakend in the
/// RCMS multimap, or - only ever produced by `chunk()` - a synthetic
/// boundary at a reference position with no backing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Real(BreakendKey),
    Virtual(u32),
}

impl Cursor {
    fn position(self) -> u32 {
        match self {
            Cursor::Real(k) => k.position,
            Cursor::Virtual(p) => p,
        }
    }
}

fn is_sink(cursor: Cursor, source_len: u32) -> bool {
    match cursor {
        Cursor::Real(k) => k.kind == BreakendKind::Nil && k.position == source_len,
        Cursor::Virtual(p) => p >= source_len,
    }
}

/// The next breakend after `cursor`, ignoring variant kind - used both for
/// the reference ("decline the variant") step and to step off a plain,
/// non-branching waypoint (e.g. a `deletion_high` we've already jumped to).
fn next_cursor_after(rcms: &Rcms, cursor: Cursor) -> Cursor {
    match cursor {
        Cursor::Real(k) => match rcms.upper_bound(k) {
            Some((k2, _)) => Cursor::Real(k2),
            None => Cursor::Virtual(rcms.source().len() as u32),
        },
        Cursor::Virtual(p) => {
            let probe = BreakendKey::new(p, BreakendKind::Nil);
            match rcms.lower_bound(probe) {
                Some((k2, _)) => Cursor::Real(k2),
                None => Cursor::Virtual(rcms.source().len() as u32),
            }
        }
    }
}

/// `Some(delta)` iff `cursor` is a breakend eligible to branch: an SNV, a
/// pure insertion, or a deletion/combined-indel low breakend. A combined
/// indel is stored (`rcms::Rcms::insert`) under both an `insertion_low` and
/// a `deletion_low` key sharing one record; only the `deletion_low` key is
/// treated as the branch point so the indel isn't offered twice.
fn branch_delta<'a>(rcms: &'a Rcms, cursor: Cursor) -> Option<(BreakendKey, Delta<'a>)> {
    let Cursor::Real(key) = cursor else {
        return None;
    };
    let delta = rcms.find(key)?;
    let eligible = match key.kind {
        BreakendKind::Nil | BreakendKind::DeletionHigh => false,
        BreakendKind::InsertionLow => matches!(delta.kind, DeltaKind::Insertion),
        BreakendKind::DeletionLow => true,
        _ => true, // SnvA..SnvT
    };
    eligible.then_some((key, delta))
}

/// The cursor reached by taking the alternative branch at `key`: the
/// reference position where the branch's own span ends, so that `walk`'s
/// usual gap-to-`next_cursor_after` handling picks back up any reference
/// the branch doesn't itself consume (e.g. the `bbb` after an SNV at
/// position 4 of `aaaabbbb`) instead of jumping straight past it.
///
/// Returning `Cursor::Real(k)` is only safe when `k` sits exactly at the
/// resume position (no gap to lose) - that also preserves `upper_bound`'s
/// job of skipping past `key` itself when another breakend is co-located
/// with it (two mutually-exclusive alternatives at the same low, `spec.md`
/// §4.C Invariant V2). Otherwise we hand back a `Virtual` cursor at the
/// resume position and let `walk` rediscover the same breakend after
/// appending the gap.
fn alt_next_cursor(rcms: &Rcms, key: BreakendKey, delta: &Delta<'_>) -> Cursor {
    match delta.kind {
        DeltaKind::Snv(_) => {
            let resume = key.position + 1;
            let probe = BreakendKey::new(resume, BreakendKind::Nil);
            match rcms.lower_bound(probe) {
                Some((k, _)) if k.position == resume => Cursor::Real(k),
                _ => Cursor::Virtual(resume),
            }
        }
        DeltaKind::Insertion => {
            let resume = key.position;
            match rcms.upper_bound(key) {
                Some((k, _)) if k.position == resume => Cursor::Real(k),
                _ => Cursor::Virtual(resume),
            }
        }
        DeltaKind::Deletion(_) | DeltaKind::Indel { .. } => Cursor::Real(
            rcms.jump_to_mate(key)
                .expect("a deletion/indel low breakend always has a high mate"),
        ),
    }
}

/// Configuration toggled by the builder methods on [`SequenceTree`]; stands
/// in for the seven chained adaptor types `spec.md` §4.D names.
#[derive(Debug, Clone)]
struct TreeConfig {
    label_kind: LabelKind,
    coloured: bool,
    trim_window: Option<u32>,
    prune: bool,
    left_extend_window: Option<u32>,
    merge: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            label_kind: LabelKind::Node,
            coloured: true,
            trim_window: None,
            prune: false,
            left_extend_window: None,
            merge: false,
        }
    }
}

/// A lazy tree over an [`Rcms`], optionally restricted to the reference
/// range `[chunk_lo, chunk_hi)` (`spec.md` §4.D.7 `chunk()`).
#[derive(Debug, Clone)]
pub struct SequenceTree<'a> {
    rcms: &'a Rcms,
    config: TreeConfig,
    chunk_lo: u32,
    chunk_hi: u32,
}

impl<'a> SequenceTree<'a> {
    /// The whole-reference base tree, no adaptors applied.
    pub fn new(rcms: &'a Rcms) -> Self {
        Self {
            rcms,
            config: TreeConfig::default(),
            chunk_lo: 0,
            chunk_hi: rcms.source().len() as u32,
        }
    }

    pub(crate) fn over_range(rcms: &'a Rcms, chunk_lo: u32, chunk_hi: u32) -> Self {
        Self {
            rcms,
            config: TreeConfig::default(),
            chunk_lo,
            chunk_hi,
        }
    }

    /// `labelled<kind>()` (`spec.md` §4.D.1).
    pub fn labelled(mut self, kind: LabelKind) -> Self {
        self.config.label_kind = kind;
        self
    }

    /// `coloured()` (`spec.md` §4.D.2): attach per-node coverage. Coverage
    /// is always computed internally (`prune` needs it); this only governs
    /// whether it's exposed on the emitted [`Cargo`].
    pub fn coloured(mut self) -> Self {
        self.config.coloured = true;
        self
    }

    /// `trim(w)` (`spec.md` §4.D.3): cap a node's label so it terminates
    /// `w_minus_1` symbols after the last branching point.
    pub fn trim(mut self, w_minus_1: u32) -> Self {
        self.config.trim_window = Some(w_minus_1);
        self
    }

    /// `prune()` (`spec.md` §4.D.4): drop subtrees whose coverage is empty.
    pub fn prune(mut self) -> Self {
        self.config.prune = true;
        self
    }

    /// `left_extend(w)` (`spec.md` §4.D.5): prepend up to `w_minus_1` bytes
    /// of left context from before the chunk/tree start.
    pub fn left_extend(mut self, w_minus_1: u32) -> Self {
        self.config.left_extend_window = Some(w_minus_1);
        self
    }

    /// `merge()` (`spec.md` §4.D.6): coalesce consecutive single-child
    /// reference nodes into one cargo.
    pub fn merge(mut self) -> Self {
        self.config.merge = true;
        self
    }

    /// The canonical composed tree the search driver uses (`spec.md` §4.E):
    /// `labelled(root_path) . coloured() . trim(w-1) . prune() . left_extend(w-1) . merge()`.
    pub fn canonical(rcms: &'a Rcms, window: u32) -> Self {
        let w1 = window.saturating_sub(1);
        Self::new(rcms)
            .labelled(LabelKind::RootPath)
            .coloured()
            .trim(w1)
            .prune()
            .left_extend(w1)
            .merge()
    }

    pub(crate) fn rcms(&self) -> &'a Rcms {
        self.rcms
    }

    pub(crate) fn window(&self) -> Option<u32> {
        self.config.trim_window.map(|w1| w1 + 1)
    }

    pub(crate) fn label_kind(&self) -> LabelKind {
        self.config.label_kind
    }

    pub(crate) fn coloured(&self) -> bool {
        self.config.coloured
    }

    pub(crate) fn merged(&self) -> bool {
        self.config.merge
    }

    /// The reference range this tree is responsible for (the whole source
    /// unless produced by [`chunk_tree`]).
    pub fn range(&self) -> (u32, u32) {
        (self.chunk_lo, self.chunk_hi)
    }

    fn ceiling(&self) -> u32 {
        let tail = self.config.trim_window.unwrap_or(0);
        self.chunk_hi.saturating_add(tail).min(self.rcms.source().len() as u32)
    }

    /// Visits every cargo this tree's composed adaptors produce, in the DFS
    /// order `spec.md` §5 mandates: `next_alt` before `next_ref`.
    pub fn traverse(&self, mut on_cargo: impl FnMut(&Cargo) -> ControlFlow) {
        self.traverse_with_hooks(&mut on_cargo, &mut NoopHooks);
    }

    /// As [`Self::traverse`], but additionally notifies `hooks` right
    /// before descending into each alternative at a branching node and
    /// right after returning from it (`spec.md` §9's "Branch-stack /
    /// prefetched-next-branch pattern ... push/pop correspond to entering/
    /// leaving alternative subtrees"). [`crate::search`] uses this to save
    /// and restore a resumable matcher's state across branches.
    pub fn traverse_with_hooks(&self, on_cargo: &mut dyn FnMut(&Cargo) -> ControlFlow, hooks: &mut dyn TraverseHooks) {
        let source_len = self.rcms.source().len() as u32;
        let domain = self.rcms.coverage_domain();
        let full = BitCoverage::full(domain);

        let mut path_buf: Vec<u8> = Vec::new();
        if let Some(w1) = self.config.left_extend_window {
            let ext = w1.min(self.chunk_lo);
            let start = (self.chunk_lo - ext) as usize;
            path_buf.extend_from_slice(&self.rcms.source()[start..self.chunk_lo as usize]);
        }
        let run_start = path_buf.len();
        let mut bits: Vec<bool> = Vec::new();

        self.walk(
            Cursor::Virtual(self.chunk_lo),
            source_len,
            &full,
            0,
            &mut path_buf,
            run_start,
            &mut bits,
            on_cargo,
            hooks,
        );
    }

    /// Emits a cargo for the run `path_buf[run_start..]`. A run may be
    /// empty (two branch points at the same position, or two variants
    /// sharing a `low`) - it is still a real, zero-length-label node in
    /// the reference JST, so `stats()`/`seek()` need to see it too.
    fn flush(&self, path_buf: &[u8], run_start: usize, bits: &[bool], coverage: &BitCoverage, on_cargo: &mut dyn FnMut(&Cargo) -> ControlFlow) -> ControlFlow {
        let sequence = match self.config.label_kind {
            LabelKind::RootPath => path_buf.to_vec(),
            LabelKind::Node => path_buf[run_start..].to_vec(),
        };
        let cargo = Cargo {
            sequence,
            position: TreePosition { bits: bits.to_vec() },
            coverage: self.config.coloured.then(|| coverage.clone()),
        };
        on_cargo(&cargo)
    }

    #[allow(clippy::too_many_arguments)]
    fn walk(
        &self,
        cursor: Cursor,
        source_len: u32,
        coverage: &BitCoverage,
        distance_since_branch: u32,
        path_buf: &mut Vec<u8>,
        run_start: usize,
        bits: &mut Vec<bool>,
        on_cargo: &mut dyn FnMut(&Cargo) -> ControlFlow,
        hooks: &mut dyn TraverseHooks,
    ) -> ControlFlow {
        if is_sink(cursor, source_len) {
            if path_buf.len() > run_start {
                return self.flush(path_buf, run_start, bits, coverage, on_cargo);
            }
            return ControlFlow::Continue;
        }

        // Past the chunk's own end, no further variant is this chunk's
        // responsibility (`spec.md` §4.D "Chunk-boundary policy"); extend
        // pure reference up to the trim ceiling and stop.
        if cursor.position() >= self.chunk_hi {
            let ceiling = self.ceiling();
            let pos = cursor.position();
            if pos < ceiling {
                let take = (ceiling - pos) as usize;
                let slice = &self.rcms.source()[pos as usize..pos as usize + take];
                path_buf.extend_from_slice(slice);
            }
            return self.flush(path_buf, run_start, bits, coverage, on_cargo);
        }

        let nxt = next_cursor_after(self.rcms, cursor);
        let branch = branch_delta(self.rcms, cursor);

        if let Some((key, delta)) = branch {
            // Flush the (possibly empty) node ending exactly at this
            // branch point before descending into its children.
            let flushed = self.flush(path_buf, run_start, bits, coverage, on_cargo);
            if flushed == ControlFlow::Stop {
                return ControlFlow::Stop;
            }

            // alt child first (`spec.md` §5: next_alt before next_ref).
            let alt_cov = {
                let mut c = coverage.clone();
                c.and(delta.coverage);
                c
            };
            if !self.config.prune || alt_cov.any() {
                hooks.on_descend(true);
                bits.push(true);
                let before = path_buf.len();
                path_buf.extend_from_slice(delta.alt);
                let alt_cursor = alt_next_cursor(self.rcms, key, &delta);
                let cf = self.walk(alt_cursor, source_len, &alt_cov, 0, path_buf, before, bits, on_cargo, hooks);
                path_buf.truncate(before);
                bits.pop();
                hooks.on_ascend();
                if cf == ControlFlow::Stop {
                    return ControlFlow::Stop;
                }
            }

            // reference (decline) child.
            let ref_cov = {
                let mut c = coverage.clone();
                c.and_not(delta.coverage);
                c
            };
            if !self.config.prune || ref_cov.any() {
                hooks.on_descend(false);
                bits.push(false);
                let before = path_buf.len();
                let cf = self.advance_through_gap(cursor, nxt, source_len, &ref_cov, 0, path_buf, before, bits, on_cargo, hooks);
                path_buf.truncate(before);
                bits.pop();
                hooks.on_ascend();
                if cf == ControlFlow::Stop {
                    return ControlFlow::Stop;
                }
            }
            ControlFlow::Continue
        } else {
            self.advance_through_gap(cursor, nxt, source_len, coverage, distance_since_branch, path_buf, run_start, bits, on_cargo, hooks)
        }
    }

    /// Appends the reference gap `[cursor.position(), next.position())` to
    /// `path_buf` and continues the walk from `next`. `trim()` never
    /// discards any of this gap - `spec.md` §8 property 2 ("window
    /// completeness") requires every distinct window be reachable, and the
    /// reference past the trim horizon is exactly what windows starting
    /// there still need. What `trim()` actually bounds is node
    /// granularity: if the gap crosses the trim horizon, it is split into
    /// a capped head (flushed as its own cargo, ending exactly `w - 1`
    /// symbols past the last branch) and an unclipped tail that continues
    /// the walk unconstrained, since nothing past the horizon is "close to
    /// a branch" anymore until the next real one resets the distance to
    /// zero.
    ///
    /// The chunk ceiling is the one genuine stopping point: past it, this
    /// chunk is no longer responsible for any further variant, so the tail
    /// is capped there and the walk ends (`spec.md` §4.D "Chunk-boundary
    /// policy").
    #[allow(clippy::too_many_arguments)]
    fn advance_through_gap(
        &self,
        cursor: Cursor,
        next: Cursor,
        source_len: u32,
        coverage: &BitCoverage,
        distance_since_branch: u32,
        path_buf: &mut Vec<u8>,
        run_start: usize,
        bits: &mut Vec<bool>,
        on_cargo: &mut dyn FnMut(&Cargo) -> ControlFlow,
        hooks: &mut dyn TraverseHooks,
    ) -> ControlFlow {
        let base = cursor.position() as usize;
        let gap_full = (next.position() - cursor.position()) as usize;
        let ceiling_limit = (self.ceiling() - cursor.position()) as usize;
        let consume = gap_full.min(ceiling_limit);
        let ceiling_clipped = consume < gap_full;

        // A trim-bounded mid-run flush only makes sense when `merge()` is
        // off. `merge()` coalesces every non-branching run between two real
        // branches into a single cargo, so splitting it here purely on
        // distance would give that one branch-to-branch run two cargos that
        // share the same `bits` path - violating `spec.md` §3's "two
        // positions compare equal iff they denote the same cargo" (a
        // `TreePosition` is exactly `bits`, with no other disambiguator).
        // Without `merge()`, sibling runs between branches already produce
        // one cargo per step by construction, so splitting further here on
        // the trim horizon is harmless and still bounds an individual
        // node's length the way `trim()` promises.
        let (run_start, next_distance) = if self.config.merge {
            path_buf.extend_from_slice(&self.rcms.source()[base..base + consume]);
            (run_start, distance_since_branch + consume as u32)
        } else {
            let trim_limit = self
                .config
                .trim_window
                .map(|w1| w1.saturating_sub(distance_since_branch) as usize)
                .unwrap_or(usize::MAX);
            let split = trim_limit.min(consume);
            if split < consume {
                path_buf.extend_from_slice(&self.rcms.source()[base..base + split]);
                let cf = self.flush(path_buf, run_start, bits, coverage, on_cargo);
                if cf == ControlFlow::Stop {
                    return ControlFlow::Stop;
                }
                let new_run_start = path_buf.len();
                path_buf.extend_from_slice(&self.rcms.source()[base + split..base + consume]);
                (new_run_start, 0)
            } else {
                path_buf.extend_from_slice(&self.rcms.source()[base..base + consume]);
                (run_start, 0)
            }
        };

        if ceiling_clipped {
            return self.flush(path_buf, run_start, bits, coverage, on_cargo);
        }

        if self.config.merge {
            self.walk(next, source_len, coverage, next_distance, path_buf, run_start, bits, on_cargo, hooks)
        } else {
            let cf = self.flush(path_buf, run_start, bits, coverage, on_cargo);
            if cf == ControlFlow::Stop {
                return ControlFlow::Stop;
            }
            let new_run_start = path_buf.len();
            self.walk(next, source_len, coverage, 0, path_buf, new_run_start, bits, on_cargo, hooks)
        }
    }

    /// Collects every cargo into a `Vec` - convenient for tests and for
    /// non-resumable matchers that want the whole label at once.
    pub fn collect(&self) -> Vec<Cargo> {
        let mut out = Vec::new();
        self.traverse(|c| {
            out.push(c.clone());
            ControlFlow::Continue
        });
        out
    }

    /// `tree.seek(pos) -> node` (`spec.md` §4.D.8): reconstructs the cargo
    /// a prior traversal produced at `pos` in amortised `O(path-length)`.
    pub fn seek(&self, pos: &TreePosition) -> Cargo {
        seek::seek(self, pos)
    }

    /// `stats()` (`spec.md` §4.D "Stats").
    pub fn stats(&self) -> TreeStats {
        stats::compute(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::Breakpoint;
    use crate::coverage::RangeDomain;

    fn domain(n: u32) -> RangeDomain {
        RangeDomain::new(0, n)
    }

    fn windows_of(tree: &SequenceTree<'_>, w: usize) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        tree.traverse(|cargo| {
            for win in cargo.sequence.windows(w) {
                out.push(win.to_vec());
            }
            ControlFlow::Continue
        });
        out
    }

    /// As [`windows_of`], but pairs each window with the coverage of the
    /// cargo it came from, so a test can check *which* samples a window is
    /// valid for - the position-multiset property `spec.md` §8.2 describes,
    /// not just whether the bytes occur somewhere in the tree.
    fn windows_with_coverage(tree: &SequenceTree<'_>, w: usize) -> Vec<(Vec<u8>, BitCoverage)> {
        let mut out = Vec::new();
        tree.traverse(|cargo| {
            let coverage = cargo.coverage.clone().expect("test trees enable coloured()");
            for win in cargo.sequence.windows(w) {
                out.push((win.to_vec(), coverage.clone()));
            }
            ControlFlow::Continue
        });
        out
    }

    #[test]
    fn test_scenario_1_variant_free_source_yields_every_substring() {
        // spec.md §8 scenario 1: "aaaabbbb", window 4, no variants.
        let rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(1));
        let tree = SequenceTree::canonical(&rcms, 4);
        let wins = windows_of(&tree, 4);
        assert!(wins.iter().any(|w| w == b"aabb"));
    }

    #[test]
    fn test_scenario_2_snv_branches_both_samples() {
        // spec.md §8 scenario 2: (4, 'O', span 1, coverage 1100 over 4
        // samples) - here reduced to the 2 samples the variant covers.
        // Expected position multiset `{(0,2),(1,2)}`: both covered samples
        // see "aaOb" at the same relative position, and only those samples.
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(2));
        rcms.insert(Breakpoint::new(4, 5), b"O".to_vec(), BitCoverage::from_bit_string(domain(2), "10"))
            .unwrap();
        let tree = SequenceTree::canonical(&rcms, 4);
        let wins = windows_with_coverage(&tree, 4);

        let alt_cov = BitCoverage::from_bit_string(domain(2), "10");
        assert!(wins.iter().any(|(w, cov)| w == b"aaOb" && *cov == alt_cov), "\"aaOb\" must be reported exactly for samples {{0,1}}");

        let ref_cov = BitCoverage::from_bit_string(domain(2), "01");
        assert!(wins.iter().any(|(w, cov)| w == b"aaab" && *cov == ref_cov), "\"aaab\" (the declined branch) must be reported exactly for the remaining sample");
    }

    #[test]
    fn test_scenario_3_two_snvs_combine_on_shared_sample() {
        // spec.md §8 scenario 3: (1,'I',span1,1100),(4,'J',span1,1010) ->
        // sample 0 carries both, window 4 finds "IaaJ".
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(4));
        rcms.insert(Breakpoint::new(1, 2), b"I".to_vec(), BitCoverage::from_bit_string(domain(4), "1100"))
            .unwrap();
        rcms.insert(Breakpoint::new(4, 5), b"J".to_vec(), BitCoverage::from_bit_string(domain(4), "1010"))
            .unwrap();
        let tree = SequenceTree::canonical(&rcms, 4);
        let wins = windows_of(&tree, 4);
        assert!(wins.iter().any(|w| w == b"IaaJ"));
    }

    #[test]
    fn test_scenario_4_insertion_branches_two_disjoint_samples() {
        // spec.md §8 scenario 4: (4,'I',1100),(4,'J',0011), window 4,
        // needle "Jbbb" only matches samples 2 and 3 -
        // expected position multiset `{(2,3),(3,3)}`.
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(4));
        rcms.insert(Breakpoint::new(4, 4), b"I".to_vec(), BitCoverage::from_bit_string(domain(4), "1100"))
            .unwrap();
        rcms.insert(Breakpoint::new(4, 4), b"J".to_vec(), BitCoverage::from_bit_string(domain(4), "0011"))
            .unwrap();
        let tree = SequenceTree::canonical(&rcms, 4);
        let wins = windows_with_coverage(&tree, 4);

        let j_cov = BitCoverage::from_bit_string(domain(4), "0011");
        assert!(wins.iter().any(|(w, cov)| w == b"Jbbb" && *cov == j_cov), "\"Jbbb\" must be reported exactly for samples {{2,3}}");
        assert!(!wins.iter().any(|(w, _)| w == b"Ibbb"));
    }

    #[test]
    fn test_scenario_6_insertion_crossing_deletion_free_source() {
        // spec.md §8 scenario 6: "aaaaaaaa" with an 8-base insertion at 2
        // covering samples {0,1,2} out of 3, window 5.
        let mut rcms = Rcms::new(b"aaaaaaaa".to_vec(), domain(3));
        rcms.insert(Breakpoint::new(2, 2), b"dddddddd".to_vec(), BitCoverage::from_bit_string(domain(3), "111"))
            .unwrap();
        let tree = SequenceTree::canonical(&rcms, 5);
        let wins = windows_of(&tree, 5);
        assert!(wins.iter().any(|w| w == b"ddddd"));
        assert!(wins.iter().any(|w| w == b"aaddd"));
        assert!(wins.iter().any(|w| w == b"aaaaa"));
    }

    #[test]
    fn test_prune_drops_variants_with_no_coverage() {
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(2));
        rcms.insert(Breakpoint::new(4, 5), b"O".to_vec(), BitCoverage::new(domain(2)))
            .unwrap();

        let pruned: Vec<_> = SequenceTree::new(&rcms)
            .labelled(LabelKind::RootPath)
            .coloured()
            .prune()
            .collect();
        assert!(pruned.iter().all(|c| c.sequence.windows(1).all(|w| w != b"O")));

        let unpruned: Vec<_> = SequenceTree::new(&rcms).labelled(LabelKind::RootPath).collect();
        assert!(unpruned.iter().any(|c| c.sequence.iter().any(|&b| b == b'O')));
    }

    #[test]
    fn test_merge_coalesces_non_branching_run_into_one_cargo() {
        let rcms = Rcms::new(b"aaaaaaaa".to_vec(), domain(1));
        let merged = SequenceTree::new(&rcms).labelled(LabelKind::Node).merge().collect();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].sequence, b"aaaaaaaa".to_vec());

        let unmerged = SequenceTree::new(&rcms).labelled(LabelKind::Node).collect();
        assert_eq!(unmerged.len(), 1, "a single reference node with no variants never splits regardless of merge()");
    }

    #[test]
    fn test_left_extend_prepends_context_from_before_chunk_start() {
        let mut rcms = Rcms::new(b"aaaabbbbcccc".to_vec(), domain(1));
        rcms.insert(Breakpoint::new(8, 9), b"X".to_vec(), BitCoverage::full(domain(1)))
            .unwrap();

        let chunks = chunk_tree(&rcms, 8);
        let second = &chunks[1];
        let extended: Vec<_> = second.clone().labelled(LabelKind::RootPath).left_extend(3).collect();
        assert!(extended.iter().any(|c| c.sequence.starts_with(b"bbb")));
    }

    #[test]
    fn test_trim_caps_label_past_last_branch() {
        // `trim()` bounds a *node*'s own run length, not a root-path
        // cargo's total size (root-path labels always carry the whole
        // accumulated path by definition) - so this uses `LabelKind::Node`,
        // where `cargo.sequence` is exactly the bytes of one run.
        let mut rcms = Rcms::new(b"aaaaaaaaaaaa".to_vec(), domain(2));
        rcms.insert(Breakpoint::new(4, 5), b"O".to_vec(), BitCoverage::from_bit_string(domain(2), "10"))
            .unwrap();
        let tree = SequenceTree::new(&rcms).labelled(LabelKind::Node).coloured().trim(3);
        let cargos = tree.collect();
        // The very first run, not yet past any branch, is still capped at
        // the trim horizon (3 symbols) rather than running unbounded up to
        // the first variant at position 4.
        assert_eq!(cargos[0].sequence.len(), 3);
        assert_eq!(cargos[0].sequence, b"aaa".to_vec());
    }

    #[test]
    fn test_seek_reproduces_every_cargo_from_its_position() {
        let mut rcms = Rcms::new(b"aaaabbbbcccc".to_vec(), domain(2));
        rcms.insert(Breakpoint::new(4, 5), b"O".to_vec(), BitCoverage::from_bit_string(domain(2), "10"))
            .unwrap();
        rcms.insert(Breakpoint::new(8, 8), b"Z".to_vec(), BitCoverage::from_bit_string(domain(2), "01"))
            .unwrap();

        let tree = SequenceTree::canonical(&rcms, 4);
        for cargo in tree.collect() {
            let seeked = tree.seek(&cargo.position);
            assert_eq!(seeked.sequence, cargo.sequence, "seek mismatch at {:?}", cargo.position);
            assert_eq!(seeked.position, cargo.position);
        }
    }

    #[test]
    fn test_no_duplicate_tree_positions_with_prune() {
        // spec.md §8 property 3: with prune(), each cargo is visited once -
        // no tree_position repeats across a traversal.
        let mut rcms = Rcms::new(b"aaaabbbbcccc".to_vec(), domain(2));
        rcms.insert(Breakpoint::new(4, 5), b"O".to_vec(), BitCoverage::from_bit_string(domain(2), "10"))
            .unwrap();

        let tree = SequenceTree::canonical(&rcms, 4);
        let mut seen = std::collections::HashSet::new();
        for cargo in tree.collect() {
            assert!(seen.insert(cargo.position), "duplicate tree_position visited");
        }
    }
}
