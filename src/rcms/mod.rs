//! Component C: the Referentially Compressed Multisequence.
//!
//! Holds one immutable `source`, a `coverage_domain`, and a breakend
//! multimap ordered by `(position, kind)` (`spec.md` §3-§4.C). Grounded in
//! `original_source/libjst/libjst/sequence/compressed_multisequence.hpp`,
//! generalized from its CRTP/cereal-backed `std::map`-of-deltas into a plain
//! `BTreeMap<BreakendKey, Breakend>` plus an [`indel::IndelTable`] side-table
//! for everything that isn't a bare SNV.

pub mod delta;
mod indel;

use std::collections::BTreeMap;

use crate::breakpoint::{Breakpoint, BreakendKey, BreakendKind};
use crate::coverage::{BitCoverage, RangeDomain};
use crate::error::{JstError, Result};

pub use delta::{Delta, DeltaKind};
use indel::{IndelId, IndelRecord, IndelTable};

/// What a breakend key in the multimap links to: either an SNV's own
/// inline coverage, or an id into the indel side-table shared by
/// insertion/deletion/combined-indel breakends.
#[derive(Debug, Clone)]
enum Breakend {
    Nil,
    Snv { alt: u8, coverage: BitCoverage },
    Indel { id: IndelId },
}

/// The Referentially Compressed Multisequence.
#[derive(Debug, Clone)]
pub struct Rcms {
    source: Vec<u8>,
    domain: RangeDomain,
    full_coverage: BitCoverage,
    breakends: BTreeMap<BreakendKey, Breakend>,
    indels: IndelTable,
}

impl Rcms {
    /// Creates a store over `source` with no variants, inserting the two
    /// implicit `nil` sentinels at positions `0` and `|source|`.
    pub fn new(source: Vec<u8>, domain: RangeDomain) -> Self {
        let mut breakends = BTreeMap::new();
        breakends.insert(BreakendKey::nil(0), Breakend::Nil);
        breakends.insert(BreakendKey::nil(source.len() as u32), Breakend::Nil);
        Self {
            full_coverage: BitCoverage::full(domain),
            source,
            domain,
            breakends,
            indels: IndelTable::new(),
        }
    }

    /// The reference sequence.
    #[inline]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    #[inline]
    pub fn coverage_domain(&self) -> RangeDomain {
        self.domain
    }

    /// The number of variant breakends held (the two `nil` sentinels are
    /// not counted).
    pub fn size(&self) -> usize {
        self.breakends.len() - 2
    }

    /// Pre-sizes the indel side-table for an upcoming bulk-insert batch.
    pub fn reserve(&mut self, n: usize) {
        self.indels.reserve(n);
    }

    /// `true` iff some existing variant at `breakpoint.low` has a coverage
    /// intersection with `coverage` (`spec.md` §4.C, Invariant V2).
    pub fn has_conflicts(&self, breakpoint: Breakpoint, coverage: &BitCoverage) -> bool {
        let lo = BreakendKey::new(breakpoint.low, BreakendKind::Nil);
        let hi = BreakendKey::new(breakpoint.low, BreakendKind::DeletionHigh);
        self.breakends.range(lo..=hi).any(|(_, b)| match b {
            Breakend::Nil => false,
            Breakend::Snv { coverage: c, .. } => !c.intersection_is_empty(coverage),
            Breakend::Indel { id } => !self.indels.get(*id).coverage.intersection_is_empty(coverage),
        })
    }

    fn alloc_indel(&mut self, alt: Vec<u8>, low: u32, high: u32, coverage: BitCoverage) -> IndelId {
        self.indels.insert(IndelRecord {
            low,
            high,
            alt,
            coverage,
        })
    }

    /// Inserts a variant record, classifying it as SNV / insertion /
    /// deletion / combined indel per `spec.md` §4.C's encoding rules.
    /// Returns the breakend key a caller can use to re-find it (the
    /// `insertion_low`/`deletion_low`/`snv_*` key for its low breakend).
    pub fn insert(&mut self, breakpoint: Breakpoint, alt: Vec<u8>, coverage: BitCoverage) -> Result<BreakendKey> {
        if coverage.domain() != self.domain {
            return Err(JstError::DomainMismatch {
                expected: self.domain,
                found: coverage.domain(),
            });
        }
        if breakpoint.high as usize > self.source.len() {
            return Err(JstError::OutOfBoundsBreakpoint {
                low: breakpoint.low as u64,
                high: breakpoint.high as u64,
                source_len: self.source.len() as u64,
            });
        }
        if self.has_conflicts(breakpoint, &coverage) {
            return Err(JstError::ConflictingVariant {
                position: breakpoint.low as u64,
            });
        }

        let span = breakpoint.span();
        let key = if span == 0 {
            let id = self.alloc_indel(alt, breakpoint.low, breakpoint.low, coverage);
            let key = BreakendKey::new(breakpoint.low, BreakendKind::InsertionLow);
            self.breakends.insert(key, Breakend::Indel { id });
            key
        } else if alt.is_empty() {
            let id = self.alloc_indel(alt, breakpoint.low, breakpoint.high, coverage);
            let low_key = BreakendKey::new(breakpoint.low, BreakendKind::DeletionLow);
            let high_key = BreakendKey::new(breakpoint.high, BreakendKind::DeletionHigh);
            self.breakends.insert(low_key, Breakend::Indel { id });
            self.breakends.insert(high_key, Breakend::Indel { id });
            low_key
        } else if span == 1 && alt.len() == 1 {
            let key = BreakendKey::new(breakpoint.low, BreakendKind::snv(alt[0]));
            self.breakends.insert(key, Breakend::Snv { alt: alt[0], coverage });
            key
        } else {
            let id = self.alloc_indel(alt, breakpoint.low, breakpoint.high, coverage);
            let ins_key = BreakendKey::new(breakpoint.low, BreakendKind::InsertionLow);
            let low_key = BreakendKey::new(breakpoint.low, BreakendKind::DeletionLow);
            let high_key = BreakendKey::new(breakpoint.high, BreakendKind::DeletionHigh);
            self.breakends.insert(ins_key, Breakend::Indel { id });
            self.breakends.insert(low_key, Breakend::Indel { id });
            self.breakends.insert(high_key, Breakend::Indel { id });
            ins_key
        };
        Ok(key)
    }

    fn delta_for<'a>(&'a self, key: BreakendKey, b: &'a Breakend) -> Delta<'a> {
        match b {
            Breakend::Nil => Delta {
                breakpoint: Breakpoint::new(key.position, key.position),
                alt: &[],
                coverage: &self.full_coverage,
                kind: DeltaKind::Indel { span: 0 },
            },
            Breakend::Snv { alt, coverage } => Delta {
                breakpoint: Breakpoint::new(key.position, key.position + 1),
                alt: std::slice::from_ref(alt),
                coverage,
                kind: DeltaKind::Snv(*alt),
            },
            Breakend::Indel { id } => {
                let rec = self.indels.get(*id);
                let span = rec.high - rec.low;
                let kind = if rec.alt.is_empty() {
                    DeltaKind::Deletion(span)
                } else if span == 0 {
                    DeltaKind::Insertion
                } else {
                    DeltaKind::Indel { span }
                };
                Delta {
                    breakpoint: Breakpoint::new(rec.low, rec.high),
                    alt: &rec.alt,
                    coverage: &rec.coverage,
                    kind,
                }
            }
        }
    }

    /// The breakend key of the implicit sentinel at position 0.
    pub fn begin_key(&self) -> BreakendKey {
        BreakendKey::nil(0)
    }

    /// The breakend key of the implicit sentinel at `|source|`.
    pub fn end_key(&self) -> BreakendKey {
        BreakendKey::nil(self.source.len() as u32)
    }

    /// The delta at an exact breakend key, if one exists.
    pub fn find(&self, key: BreakendKey) -> Option<Delta<'_>> {
        self.breakends.get(&key).map(|b| self.delta_for(key, b))
    }

    /// The first breakend with key `>= key`.
    pub fn lower_bound(&self, key: BreakendKey) -> Option<(BreakendKey, Delta<'_>)> {
        self.breakends
            .range(key..)
            .next()
            .map(|(&k, b)| (k, self.delta_for(k, b)))
    }

    /// The first breakend with key `> key`.
    pub fn upper_bound(&self, key: BreakendKey) -> Option<(BreakendKey, Delta<'_>)> {
        use std::ops::Bound::Excluded;
        self.breakends
            .range((Excluded(key), std::ops::Bound::Unbounded))
            .next()
            .map(|(&k, b)| (k, self.delta_for(k, b)))
    }

    /// Iterates every breakend (including the two `nil` sentinels) in
    /// `(position, kind)` order.
    pub fn iter(&self) -> impl Iterator<Item = (BreakendKey, Delta<'_>)> {
        self.breakends.iter().map(|(&k, b)| (k, self.delta_for(k, b)))
    }

    /// Iterates exactly one `(breakpoint, alt, coverage)` triple per
    /// distinct variant - unlike [`Self::iter`], a combined indel's three
    /// breakend keys collapse back to the single record they share. Feeding
    /// every yielded triple through [`Self::insert`] in any order
    /// reconstructs an equivalent store; `io.rs` uses this for serialization.
    pub fn variants(&self) -> impl Iterator<Item = (Breakpoint, &[u8], &BitCoverage)> {
        let snvs = self.breakends.iter().filter_map(|(k, b)| match b {
            Breakend::Snv { alt, coverage } => Some((Breakpoint::new(k.position, k.position + 1), std::slice::from_ref(alt), coverage)),
            _ => None,
        });
        let indels = self
            .indels
            .iter()
            .map(|(_, rec)| (Breakpoint::new(rec.low, rec.high), rec.alt.as_slice(), &rec.coverage));
        snvs.chain(indels)
    }

    /// For a `deletion_low`/`deletion_high` breakend, the key of its mate;
    /// `None` for SNVs, insertions and the `nil` sentinels
    /// (`spec.md` §4.C, supplemented per §1.2 of the full spec).
    pub fn jump_to_mate(&self, key: BreakendKey) -> Option<BreakendKey> {
        let Breakend::Indel { id } = self.breakends.get(&key)? else {
            return None;
        };
        let rec = self.indels.get(*id);
        match key.kind {
            BreakendKind::DeletionLow => Some(BreakendKey::new(rec.high, BreakendKind::DeletionHigh)),
            BreakendKind::DeletionHigh => Some(BreakendKey::new(rec.low, BreakendKind::DeletionLow)),
            _ => None,
        }
    }

    /// Builds a mirror-image RCMS: source bytes reversed, every breakpoint
    /// flipped around `|source|`, and `deletion_low`/`deletion_high` roles
    /// swapped so the mirrored store's own invariants still hold
    /// (supplemented per the full spec §1.2; used for two-sided seed
    /// extension, `spec.md` §8 property 5 and §4.D.9).
    pub fn to_reversed(&self) -> Rcms {
        let n = self.source.len() as u32;
        let mut reversed_source = self.source.clone();
        reversed_source.reverse();
        let mut out = Rcms::new(reversed_source, self.domain);

        let mut id_map: rustc_hash::FxHashMap<IndelId, IndelId> = rustc_hash::FxHashMap::default();
        for (&old_id, rec) in self.indels.iter() {
            let new_low = n - rec.high;
            let new_high = n - rec.low;
            let mut alt = rec.alt.clone();
            alt.reverse();
            let new_id = out.alloc_indel(alt, new_low, new_high, rec.coverage.clone());
            id_map.insert(old_id, new_id);
        }

        for (key, b) in &self.breakends {
            match (key.kind, b) {
                (BreakendKind::Nil, _) => {}
                (_, Breakend::Snv { alt, coverage }) => {
                    let new_pos = n - 1 - key.position;
                    out.breakends.insert(
                        BreakendKey::new(new_pos, key.kind),
                        Breakend::Snv {
                            alt: *alt,
                            coverage: coverage.clone(),
                        },
                    );
                }
                (BreakendKind::InsertionLow, Breakend::Indel { id }) => {
                    let new_id = id_map[id];
                    let new_low = out.indels.get(new_id).low;
                    out.breakends
                        .insert(BreakendKey::new(new_low, BreakendKind::InsertionLow), Breakend::Indel { id: new_id });
                }
                (BreakendKind::DeletionLow, Breakend::Indel { id }) => {
                    let new_id = id_map[id];
                    let new_high = out.indels.get(new_id).high;
                    out.breakends.insert(
                        BreakendKey::new(new_high, BreakendKind::DeletionHigh),
                        Breakend::Indel { id: new_id },
                    );
                }
                (BreakendKind::DeletionHigh, Breakend::Indel { id }) => {
                    let new_id = id_map[id];
                    let new_low = out.indels.get(new_id).low;
                    out.breakends
                        .insert(BreakendKey::new(new_low, BreakendKind::DeletionLow), Breakend::Indel { id: new_id });
                }
                (_, Breakend::Nil) => unreachable!("Nil payload only ever keyed by BreakendKind::Nil"),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(n: u32) -> RangeDomain {
        RangeDomain::new(0, n)
    }

    fn cov(n: u32, bits: &str) -> BitCoverage {
        BitCoverage::from_bit_string(domain(n), bits)
    }

    #[test]
    fn test_new_has_only_sentinels() {
        let rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(4));
        assert_eq!(rcms.size(), 0);
        assert_eq!(rcms.find(rcms.begin_key()).unwrap().breakpoint.low, 0);
        assert_eq!(rcms.find(rcms.end_key()).unwrap().breakpoint.low, 8);
    }

    #[test]
    fn test_insert_snv() {
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(4));
        let key = rcms.insert(Breakpoint::new(4, 5), b"G".to_vec(), cov(4, "1100")).unwrap();
        assert_eq!(key.kind, BreakendKind::SnvG);
        let delta = rcms.find(key).unwrap();
        assert_eq!(delta.kind, DeltaKind::Snv(b'G'));
        assert_eq!(delta.alt, b"G");
    }

    #[test]
    fn test_insert_insertion() {
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(4));
        let key = rcms.insert(Breakpoint::insertion_at(1), b"I".to_vec(), cov(4, "1100")).unwrap();
        assert_eq!(key.kind, BreakendKind::InsertionLow);
        let delta = rcms.find(key).unwrap();
        assert!(matches!(delta.kind, DeltaKind::Insertion));
        assert_eq!(delta.alt, b"I");
    }

    #[test]
    fn test_insert_deletion_mate() {
        let mut rcms = Rcms::new(b"aaaaaaaa".to_vec(), domain(3));
        let low_key = rcms.insert(Breakpoint::new(2, 5), Vec::new(), cov(3, "111")).unwrap();
        let high_key = rcms.jump_to_mate(low_key).unwrap();
        assert_eq!(high_key, BreakendKey::new(5, BreakendKind::DeletionHigh));
        assert_eq!(rcms.jump_to_mate(high_key).unwrap(), low_key);
    }

    #[test]
    fn test_domain_mismatch_error() {
        let mut rcms = Rcms::new(b"aaaa".to_vec(), domain(4));
        let err = rcms.insert(Breakpoint::new(0, 1), b"X".to_vec(), cov(8, "11110000"));
        assert!(matches!(err, Err(JstError::DomainMismatch { .. })));
    }

    #[test]
    fn test_conflicting_variant_error() {
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(4));
        rcms.insert(Breakpoint::new(1, 2), b"I".to_vec(), cov(4, "1100")).unwrap();
        let err = rcms.insert(Breakpoint::new(1, 2), b"J".to_vec(), cov(4, "1000"));
        assert!(matches!(err, Err(JstError::ConflictingVariant { .. })));
    }

    #[test]
    fn test_non_conflicting_disjoint_coverage_at_same_position() {
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(4));
        rcms.insert(Breakpoint::new(1, 2), b"I".to_vec(), cov(4, "1100")).unwrap();
        assert!(rcms.insert(Breakpoint::new(1, 2), b"J".to_vec(), cov(4, "0011")).is_ok());
    }

    #[test]
    fn test_reserve_does_not_panic() {
        let mut rcms = Rcms::new(b"aaaa".to_vec(), domain(1));
        rcms.reserve(128);
    }

    #[test]
    fn test_invariant_r1_reconstructs_source() {
        let source = b"aaaabbbb".to_vec();
        let mut rcms = Rcms::new(source.clone(), domain(1));
        rcms.insert(Breakpoint::new(4, 5), b"O".to_vec(), cov(1, "1")).unwrap();

        let mut reconstructed = Vec::new();
        let mut prev_end = 0u32;
        for (key, delta) in rcms.iter() {
            if key.kind == BreakendKind::Nil {
                continue;
            }
            reconstructed.extend_from_slice(&source[prev_end as usize..delta.breakpoint.low as usize]);
            prev_end = delta.breakpoint.high;
        }
        reconstructed.extend_from_slice(&source[prev_end as usize..]);
        assert_eq!(reconstructed, source);
    }

    #[test]
    fn test_variants_yields_one_entry_per_combined_indel() {
        let mut rcms = Rcms::new(b"aaaaaaaa".to_vec(), domain(1));
        rcms.insert(Breakpoint::new(2, 5), b"XY".to_vec(), cov(1, "1")).unwrap();
        rcms.insert(Breakpoint::new(6, 7), b"Z".to_vec(), cov(1, "1")).unwrap();
        let variants: Vec<_> = rcms.variants().collect();
        assert_eq!(variants.len(), 2);
        assert!(variants.iter().any(|(bp, alt, _)| bp.low == 2 && bp.high == 5 && *alt == b"XY"));
    }

    #[test]
    fn test_to_reversed_mirrors_source_and_positions() {
        let mut rcms = Rcms::new(b"AAAAGGGG".to_vec(), domain(2));
        rcms.insert(Breakpoint::new(4, 5), b"C".to_vec(), cov(2, "10")).unwrap();
        rcms.insert(Breakpoint::new(6, 7), b"T".to_vec(), cov(2, "11")).unwrap();

        let reversed = rcms.to_reversed();
        assert_eq!(reversed.source(), b"GGGGAAAA");
        assert_eq!(reversed.size(), rcms.size());
    }
}
