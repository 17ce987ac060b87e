//! Reverse traversal (`spec.md` §4.D.9): enumerating the same multiset of
//! windows in reverse orientation over a mirrored RCMS, used by two-sided
//! seed extension.
//!
//! `original_source` doesn't ship a generic reverse tree adaptor either
//! (`volatile_tree_reverse_test.cpp`/`merged_tree_reverse_test.cpp` build
//! one ad hoc per test); here the mirroring lives on
//! [`crate::rcms::Rcms::to_reversed`] and this module is just the
//! one-line entry point a caller reaches for, so "search the reverse
//! tree" reads the same way as "search the forward tree"
//! (`spec.md` §8 property 5).

use crate::rcms::Rcms;

use super::SequenceTree;

/// Builds the canonical composed tree over `rcms`'s mirror image
/// (`Rcms::to_reversed`). Searching this tree with a reversed pattern
/// yields the mirror-image position set of searching the forward tree
/// with the forward pattern.
pub fn reversed_canonical(reversed_rcms: &Rcms, window: u32) -> SequenceTree<'_> {
    SequenceTree::canonical(reversed_rcms, window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::Breakpoint;
    use crate::coverage::{BitCoverage, RangeDomain};
    use crate::tree::ControlFlow;

    #[test]
    fn test_reverse_tree_mirrors_labels() {
        // Scenario 5 from spec.md §8 (source already given reversed there).
        let mut rcms = Rcms::new(b"AAAAGGGG".to_vec(), RangeDomain::new(0, 1));
        rcms.insert(Breakpoint::new(4, 5), b"C".to_vec(), BitCoverage::from_bit_string(RangeDomain::new(0, 1), "1"))
            .unwrap();
        rcms.insert(Breakpoint::new(6, 7), b"T".to_vec(), BitCoverage::from_bit_string(RangeDomain::new(0, 1), "1"))
            .unwrap();

        let reversed = rcms.to_reversed();
        let tree = reversed_canonical(&reversed, 4);
        let mut found_tgca = false;
        tree.traverse(|cargo| {
            if cargo.sequence.windows(4).any(|w| w == b"TGCA") {
                found_tgca = true;
            }
            ControlFlow::Continue
        });
        assert!(found_tgca, "reversed tree should contain the mirrored window TGCA");
    }
}
