//! Shared data model: breakpoints and breakends (`spec.md` §3).
//!
//! A [`Breakpoint`] is a half-open reference interval `[low, high)`.
//! `low == high` denotes a pure insertion point; `span = high - low` is the
//! number of reference bases the variant replaces (0 for insertion, 1 for
//! SNV, ≥1 for deletion/MNV). Every breakpoint contributes one or two
//! [`Breakend`]s to an [`crate::rcms::Rcms`]'s breakend multimap, ordered by
//! `(position, kind)`.

use std::cmp::Ordering;

/// A half-open reference interval `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Breakpoint {
    pub low: u32,
    pub high: u32,
}

impl Breakpoint {
    pub fn new(low: u32, high: u32) -> Self {
        assert!(low <= high, "breakpoint low must not exceed high");
        Self { low, high }
    }

    /// An insertion breakpoint: `low == high == position`.
    pub fn insertion_at(position: u32) -> Self {
        Self {
            low: position,
            high: position,
        }
    }

    /// The number of reference bases this breakpoint replaces.
    #[inline]
    pub fn span(&self) -> u32 {
        self.high - self.low
    }

    #[inline]
    pub fn is_insertion(&self) -> bool {
        self.span() == 0
    }
}

/// Which endpoint of a breakpoint a [`Breakend`] represents, and what kind
/// of delta it participates in. Ordering matches `spec.md` §4.D's
/// tie-breaking rule ("by position and kind"): at equal position, `Nil`
/// sentinels sort first, then SNVs, then insertion/deletion breakends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BreakendKind {
    /// Sentinel at the source's start (position 0) or end (`|source|`).
    Nil,
    /// SNV low breakend, substituted base encoded directly in the key.
    SnvA,
    SnvC,
    SnvG,
    SnvT,
    /// Low breakend of an insertion (insertions have no high breakend).
    InsertionLow,
    /// Low breakend of a deletion.
    DeletionLow,
    /// High breakend of a deletion.
    DeletionHigh,
}

impl BreakendKind {
    /// Encodes an SNV's substituted base as a breakend kind (`spec.md` §3).
    pub fn snv(alt: u8) -> Self {
        match alt.to_ascii_uppercase() {
            b'A' => BreakendKind::SnvA,
            b'C' => BreakendKind::SnvC,
            b'G' => BreakendKind::SnvG,
            b'T' => BreakendKind::SnvT,
            other => panic!("unsupported SNV alternate base {other:?}"),
        }
    }

    /// The substituted base this kind encodes, if it is an SNV kind.
    pub fn snv_base(&self) -> Option<u8> {
        match self {
            BreakendKind::SnvA => Some(b'A'),
            BreakendKind::SnvC => Some(b'C'),
            BreakendKind::SnvG => Some(b'G'),
            BreakendKind::SnvT => Some(b'T'),
            _ => None,
        }
    }

    #[inline]
    pub fn is_deletion(&self) -> bool {
        matches!(self, BreakendKind::DeletionLow | BreakendKind::DeletionHigh)
    }

    #[inline]
    pub fn is_insertion(&self) -> bool {
        matches!(self, BreakendKind::InsertionLow)
    }

    #[inline]
    pub fn is_snv(&self) -> bool {
        self.snv_base().is_some()
    }

    /// Serializes to the single-byte tag used by the on-disk format (`io.rs`).
    pub fn to_tag(self) -> u8 {
        match self {
            BreakendKind::Nil => 0,
            BreakendKind::SnvA => 1,
            BreakendKind::SnvC => 2,
            BreakendKind::SnvG => 3,
            BreakendKind::SnvT => 4,
            BreakendKind::InsertionLow => 5,
            BreakendKind::DeletionLow => 6,
            BreakendKind::DeletionHigh => 7,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => BreakendKind::Nil,
            1 => BreakendKind::SnvA,
            2 => BreakendKind::SnvC,
            3 => BreakendKind::SnvG,
            4 => BreakendKind::SnvT,
            5 => BreakendKind::InsertionLow,
            6 => BreakendKind::DeletionLow,
            7 => BreakendKind::DeletionHigh,
            _ => return None,
        })
    }
}

/// A breakend key: `(position, kind)`, the sort key of the RCMS's breakend
/// multimap (`spec.md` §3: "ordered by `(position, kind)`").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreakendKey {
    pub position: u32,
    pub kind: BreakendKind,
}

impl BreakendKey {
    pub fn new(position: u32, kind: BreakendKind) -> Self {
        Self { position, kind }
    }

    pub fn nil(position: u32) -> Self {
        Self {
            position,
            kind: BreakendKind::Nil,
        }
    }
}

impl PartialOrd for BreakendKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BreakendKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.kind.cmp(&other.kind))
    }
}
