//! On-disk RCMS file format (`spec.md` §6).
//!
//! A fixed binary layout written directly with `u32::to_le_bytes`/
//! `from_le_bytes` - no `serde`/`bincode` dependency, matching the teacher's
//! own zero-schema byte-level writers (its streaming BED writers emit
//! fields straight out with `itoa`/`ryu` rather than going through a
//! serialization framework). Layout, in order: magic, version, coverage
//! domain, source bytes, then one record per distinct variant
//! ([`crate::rcms::Rcms::variants`]).

use std::io::{Read, Write};

use crate::breakpoint::Breakpoint;
use crate::coverage::{BitCoverage, RangeDomain};
use crate::error::SerializationError;
use crate::rcms::Rcms;

const MAGIC: &[u8; 4] = b"JSTR";
const FORMAT_VERSION: u32 = 1;

type Result<T> = std::result::Result<T, SerializationError>;

fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn write_bytes<W: Write>(w: &mut W, bytes: &[u8]) -> Result<()> {
    write_u32(w, bytes.len() as u32)?;
    w.write_all(bytes)?;
    Ok(())
}

fn read_bytes<R: Read>(r: &mut R) -> Result<Vec<u8>> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Coverage is written as a set-index list rather than raw words, since
/// [`BitCoverage`] exposes `iter_set`/`from_indices` but not its packed
/// storage - fine here, coverage is a handful of bits per variant, not a
/// hot loop.
fn write_coverage<W: Write>(w: &mut W, coverage: &BitCoverage) -> Result<()> {
    write_u32(w, coverage.count() as u32)?;
    for idx in coverage.iter_set() {
        write_u32(w, idx)?;
    }
    Ok(())
}

fn read_coverage<R: Read>(r: &mut R, domain: RangeDomain) -> Result<BitCoverage> {
    let n = read_u32(r)? as usize;
    let mut indices = Vec::with_capacity(n);
    for _ in 0..n {
        indices.push(read_u32(r)?);
    }
    Ok(BitCoverage::from_indices(domain, indices))
}

/// Writes `rcms` to `w` in the layout spec.md §6 lists.
pub fn write_rcms<W: Write>(rcms: &Rcms, w: &mut W) -> Result<()> {
    w.write_all(MAGIC)?;
    write_u32(w, FORMAT_VERSION)?;

    let domain = rcms.coverage_domain();
    write_u32(w, domain.min)?;
    write_u32(w, domain.max)?;

    write_bytes(w, rcms.source())?;

    let variants: Vec<_> = rcms.variants().collect();
    write_u32(w, variants.len() as u32)?;
    for (breakpoint, alt, coverage) in variants {
        write_u32(w, breakpoint.low)?;
        write_u32(w, breakpoint.high)?;
        write_bytes(w, alt)?;
        write_coverage(w, coverage)?;
    }
    Ok(())
}

/// Reads an RCMS previously written by [`write_rcms`]. Every variant is
/// replayed through [`Rcms::insert`], so a file whose variants would
/// conflict under Invariant V2 (`spec.md` §4.C) is rejected the same way a
/// live construction would be rather than accepted silently.
pub fn read_rcms<R: Read>(r: &mut R) -> Result<Rcms> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(SerializationError::Corrupt("bad magic bytes".to_string()));
    }
    let version = read_u32(r)?;
    if version != FORMAT_VERSION {
        return Err(SerializationError::Version {
            found: version,
            expected: FORMAT_VERSION,
        });
    }

    let min = read_u32(r)?;
    let max = read_u32(r)?;
    let domain = RangeDomain::new(min, max);

    let source = read_bytes(r)?;
    let mut rcms = Rcms::new(source, domain);

    let n_variants = read_u32(r)? as usize;
    rcms.reserve(n_variants);
    for _ in 0..n_variants {
        let low = read_u32(r)?;
        let high = read_u32(r)?;
        let alt = read_bytes(r)?;
        let coverage = read_coverage(r, domain)?;
        rcms.insert(Breakpoint::new(low, high), alt, coverage)
            .map_err(|e| SerializationError::Corrupt(format!("variant [{low}, {high}) failed to reinsert: {e}")))?;
    }
    Ok(rcms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::RangeDomain;

    fn domain(n: u32) -> RangeDomain {
        RangeDomain::new(0, n)
    }

    #[test]
    fn test_round_trip_preserves_source_and_variants() {
        let mut rcms = Rcms::new(b"aaaabbbb".to_vec(), domain(2));
        rcms.insert(Breakpoint::new(4, 5), b"O".to_vec(), BitCoverage::from_bit_string(domain(2), "10"))
            .unwrap();
        rcms.insert(Breakpoint::new(2, 2), b"II".to_vec(), BitCoverage::from_bit_string(domain(2), "01"))
            .unwrap();

        let mut buf = Vec::new();
        write_rcms(&rcms, &mut buf).unwrap();

        let loaded = read_rcms(&mut buf.as_slice()).unwrap();
        assert_eq!(loaded.source(), rcms.source());
        assert_eq!(loaded.size(), rcms.size());
        assert_eq!(loaded.coverage_domain(), rcms.coverage_domain());
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let buf = vec![0u8; 16];
        let err = read_rcms(&mut buf.as_slice());
        assert!(matches!(err, Err(SerializationError::Corrupt(_))));
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&99u32.to_le_bytes());
        let err = read_rcms(&mut buf.as_slice());
        assert!(matches!(err, Err(SerializationError::Version { found: 99, expected: 1 })));
    }

    #[test]
    fn test_round_trip_via_tempfile() {
        let rcms = Rcms::new(b"ACGTACGT".to_vec(), domain(1));
        let mut file = tempfile::tempfile().unwrap();
        write_rcms(&rcms, &mut file).unwrap();

        use std::io::{Seek, SeekFrom};
        file.seek(SeekFrom::Start(0)).unwrap();
        let loaded = read_rcms(&mut file).unwrap();
        assert_eq!(loaded.source(), rcms.source());
    }
}
