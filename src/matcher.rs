//! The matcher contract (`spec.md` §4.E, §6.4) plus two reference
//! implementations so the search driver is exercisable end to end.
//!
//! `spec.md` §1 places the concrete string-matching kernels
//! (Horspool, Shift-Or, Myers bit-parallel, pigeonhole q-gram) out of
//! scope - "we specify only the contracts these matchers must satisfy".
//! [`ExactMatcher`] and [`HammingMatcher`] below are that one reference
//! kernel each for exact and bounded-mismatch search, grounded in the
//! bad-character-shift idea `spec.md` names as the minimal concrete
//! instance needed to drive and test [`crate::search`] - they are not a
//! stand-in for the named kernels themselves.

/// A value that can stream a haystack once, reporting a match end
/// position at each hit (`spec.md` §4.E, §6.4).
pub trait Matcher {
    /// Streams `haystack` once, calling `on_hit` with the haystack offset
    /// one past each match's last byte. Must be deterministic.
    fn run(&self, haystack: &[u8], on_hit: &mut dyn FnMut(usize));

    /// The minimal haystack length a match requires (`spec.md`: "plus 1
    /// for boundary" so chunk/trim sizing can bound context by `w - 1`).
    fn window_size(&self) -> usize;
}

/// A [`Matcher`] whose internal progress can be captured and restored
/// across branching (`spec.md` §4.E, §6.4). The search driver pushes state
/// before entering an alternative subtree and pops on the way out so each
/// subtree inherits its parent path's matcher state.
pub trait ResumableMatcher: Matcher {
    type State: Copy;

    fn capture(&self) -> Self::State;
    fn restore(&mut self, state: Self::State);
}

/// Exact search via a bad-character skip table (Horspool's idea, named in
/// `spec.md` §1 as one of the out-of-scope kernels; implemented here only
/// minimally as the driver's reference exact matcher).
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    pattern: Vec<u8>,
    skip: [usize; 256],
}

impl ExactMatcher {
    pub fn new(pattern: &[u8]) -> Self {
        assert!(!pattern.is_empty(), "matcher pattern must be non-empty");
        let m = pattern.len();
        let mut skip = [m; 256];
        for (i, &b) in pattern[..m - 1].iter().enumerate() {
            skip[b as usize] = m - 1 - i;
        }
        Self {
            pattern: pattern.to_vec(),
            skip,
        }
    }
}

impl Matcher for ExactMatcher {
    fn run(&self, haystack: &[u8], on_hit: &mut dyn FnMut(usize)) {
        let m = self.pattern.len();
        if haystack.len() < m {
            return;
        }
        let mut i = 0usize;
        while i + m <= haystack.len() {
            let window = &haystack[i..i + m];
            if window == self.pattern.as_slice() {
                on_hit(i + m);
            }
            let last = haystack[i + m - 1];
            i += self.skip[last as usize];
        }
    }

    fn window_size(&self) -> usize {
        self.pattern.len() + 1
    }
}

impl ResumableMatcher for ExactMatcher {
    type State = ();

    fn capture(&self) -> Self::State {}

    fn restore(&mut self, _state: Self::State) {}
}

/// Bounded-Hamming-distance approximate search.
#[derive(Debug, Clone)]
pub struct HammingMatcher {
    pattern: Vec<u8>,
    max_errors: usize,
}

impl HammingMatcher {
    pub fn new(pattern: &[u8], max_errors: usize) -> Self {
        assert!(!pattern.is_empty(), "matcher pattern must be non-empty");
        Self {
            pattern: pattern.to_vec(),
            max_errors,
        }
    }
}

impl Matcher for HammingMatcher {
    fn run(&self, haystack: &[u8], on_hit: &mut dyn FnMut(usize)) {
        let m = self.pattern.len();
        if haystack.len() < m {
            return;
        }
        for i in 0..=haystack.len() - m {
            let mismatches = haystack[i..i + m]
                .iter()
                .zip(self.pattern.iter())
                .filter(|(a, b)| !a.eq_ignore_ascii_case(b))
                .count();
            if mismatches <= self.max_errors {
                on_hit(i + m);
            }
        }
    }

    fn window_size(&self) -> usize {
        self.pattern.len() + 1
    }
}

impl ResumableMatcher for HammingMatcher {
    type State = ();

    fn capture(&self) -> Self::State {}

    fn restore(&mut self, _state: Self::State) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_matcher_finds_all_occurrences() {
        let m = ExactMatcher::new(b"aabb");
        let mut hits = Vec::new();
        m.run(b"aaaabbbb", &mut |end| hits.push(end));
        assert_eq!(hits, vec![6]);
    }

    #[test]
    fn test_exact_matcher_scenario_table_row2() {
        // spec.md §8 scenario 2: needle "aaOb" over "aaaaObbb".
        let m = ExactMatcher::new(b"aaOb");
        let mut hits = Vec::new();
        m.run(b"aaaaObbb", &mut |end| hits.push(end));
        assert_eq!(hits, vec![6]);
    }

    #[test]
    fn test_hamming_matcher_allows_bounded_mismatches() {
        let m = HammingMatcher::new(b"AACGT", 1);
        let mut hits = Vec::new();
        m.run(b"AACCT", &mut |end| hits.push(end));
        assert_eq!(hits, vec![5]);

        let strict = HammingMatcher::new(b"AACGT", 0);
        let mut none = Vec::new();
        strict.run(b"AACCT", &mut |end| none.push(end));
        assert!(none.is_empty());
    }

    #[test]
    fn test_matcher_ignores_haystack_shorter_than_window() {
        let m = ExactMatcher::new(b"abcdef");
        let mut hits = Vec::new();
        m.run(b"abc", &mut |end| hits.push(end));
        assert!(hits.is_empty());
    }
}
