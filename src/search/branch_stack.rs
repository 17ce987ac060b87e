//! Matcher-state capture/restore across branching (`spec.md` §4.E, §5).
//!
//! `spec.md` §9 calls this the "Branch-stack / prefetched-next-branch
//! pattern", "an explicit stack of `NodeState`s owned by the traverser;
//! push/pop correspond to entering/leaving alternative subtrees". Our
//! traversal is a plain recursive walk (see `crate::tree`), so the
//! traverser's own call stack already is that explicit stack; this module
//! is the one helper recursion needs: save a [`ResumableMatcher`]'s state
//! before descending into an alternative subtree, restore it on the way
//! back out, via an RAII guard so an early return (cancellation) can't
//! forget to pop.

use crate::matcher::ResumableMatcher;

/// Captures `matcher`'s state on construction and restores it when
/// dropped - the push/pop pair `spec.md` §4.E describes, scoped to a
/// lexical block instead of a manually-balanced stack.
pub struct BranchGuard<'m, M: ResumableMatcher> {
    matcher: &'m mut M,
    saved: M::State,
}

impl<'m, M: ResumableMatcher> BranchGuard<'m, M> {
    pub fn enter(matcher: &'m mut M) -> Self {
        let saved = matcher.capture();
        Self { matcher, saved }
    }

    pub fn matcher_mut(&mut self) -> &mut M {
        self.matcher
    }
}

impl<M: ResumableMatcher> Drop for BranchGuard<'_, M> {
    fn drop(&mut self) {
        self.matcher.restore(self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{ExactMatcher, Matcher};

    // A tiny resumable matcher with real, observable state (unlike
    // `ExactMatcher`'s unit state) to exercise capture/restore.
    #[derive(Clone)]
    struct CountingMatcher {
        inner: ExactMatcher,
        calls: usize,
    }

    impl Matcher for CountingMatcher {
        fn run(&self, haystack: &[u8], on_hit: &mut dyn FnMut(usize)) {
            self.inner.run(haystack, on_hit);
        }
        fn window_size(&self) -> usize {
            self.inner.window_size()
        }
    }

    impl ResumableMatcher for CountingMatcher {
        type State = usize;
        fn capture(&self) -> usize {
            self.calls
        }
        fn restore(&mut self, state: usize) {
            self.calls = state;
        }
    }

    #[test]
    fn test_branch_guard_restores_on_drop() {
        let mut m = CountingMatcher {
            inner: ExactMatcher::new(b"ab"),
            calls: 0,
        };
        {
            let mut guard = BranchGuard::enter(&mut m);
            guard.matcher_mut().calls += 5;
            assert_eq!(guard.matcher_mut().calls, 5);
        }
        assert_eq!(m.calls, 0);
    }
}
