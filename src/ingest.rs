//! Minimal FASTA + variant-TSV ingestion front end.
//!
//! `spec.md` §1/§6 places real VCF ingestion (symbolic/BND/`*` alleles,
//! INFO/FORMAT fields, multi-allelic sites) out of scope for this crate -
//! "an external front end produces the breakpoint/alt/coverage triples this
//! crate consumes". This module is that external front end's minimal
//! stand-in, just enough to exercise `index`/`search` end to end: a
//! single-record FASTA for the reference and a flat variant-TSV for the
//! breakpoints. Grounded in the teacher's zero-allocation byte-level style
//! (its streaming BED readers scan lines with `memchr` rather than going
//! through `BufRead::lines`'s per-line `String` allocation); the one
//! difference from those readers is that this front end takes the whole
//! file in memory (ingested sources are single chromosomes, not streamed
//! genome-wide BED).

use memchr::memchr;
use thiserror::Error;

use crate::breakpoint::Breakpoint;
use crate::coverage::{BitCoverage, RangeDomain};

/// Errors specific to ingestion - distinct from [`crate::error::JstError`]
/// since parsing an external file format is a collaborator concern with its
/// own failure modes, not part of the core RCMS error taxonomy.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("input is not valid UTF-8 at byte {0}")]
    NotUtf8(usize),

    #[error("FASTA input has no records")]
    EmptyFasta,

    #[error("FASTA input has more than one record; ingest.rs only supports a single reference sequence")]
    MultiRecordFasta,

    #[error("variant line {line}: expected 4 tab-separated fields (pos, ref_len, alt, coverage_bits), got {found}")]
    MalformedVariantLine { line: usize, found: usize },

    #[error("variant line {line}: {field} {value:?} is not a valid unsigned integer")]
    BadInteger { line: usize, field: &'static str, value: String },

    #[error("variant line {line}: coverage string length {found} does not match sample count {expected}")]
    CoverageLengthMismatch { line: usize, found: usize, expected: usize },

    #[error("variant line {line}: unsupported allele {allele:?} (only plain SNV/insertion/deletion/MNV records are accepted)")]
    UnsupportedAllele { line: usize, allele: String },
}

type Result<T> = std::result::Result<T, IngestError>;

/// Splits `input` into lines without the trailing `\n` (`\r` trimmed too),
/// via `memchr` instead of allocating a `String` per line.
fn lines(mut input: &[u8]) -> impl Iterator<Item = &[u8]> {
    std::iter::from_fn(move || {
        if input.is_empty() {
            return None;
        }
        match memchr(b'\n', input) {
            Some(i) => {
                let mut line = &input[..i];
                if line.last() == Some(&b'\r') {
                    line = &line[..line.len() - 1];
                }
                input = &input[i + 1..];
                Some(line)
            }
            None => {
                let line = input;
                input = &[];
                Some(line)
            }
        }
    })
}

fn to_str(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| IngestError::NotUtf8(e.valid_up_to()))
}

/// Parses a single-record FASTA into its raw sequence bytes, uppercased,
/// with newlines stripped. Headers after the first (`>`) are rejected per
/// [`IngestError::MultiRecordFasta`] - full multi-contig handling belongs to
/// the real VCF/FASTA front end spec.md defers out of scope.
pub fn read_fasta(input: &[u8]) -> Result<Vec<u8>> {
    let mut sequence = Vec::new();
    let mut seen_header = false;
    for line in lines(input) {
        if line.is_empty() {
            continue;
        }
        if line[0] == b'>' {
            if seen_header {
                return Err(IngestError::MultiRecordFasta);
            }
            seen_header = true;
            continue;
        }
        sequence.extend(line.iter().map(|b| b.to_ascii_uppercase()));
    }
    if !seen_header {
        return Err(IngestError::EmptyFasta);
    }
    Ok(sequence)
}

/// Parses a multi-record FASTA (e.g. a read set queried against an index)
/// into `(header, sequence)` pairs, in file order. Unlike [`read_fasta`],
/// any number of records is accepted - the single-reference restriction is
/// specific to ingesting the tree's own source.
pub fn read_fasta_records(input: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    let mut records = Vec::new();
    let mut current: Option<(String, Vec<u8>)> = None;
    for line in lines(input) {
        if line.is_empty() {
            continue;
        }
        if line[0] == b'>' {
            if let Some(rec) = current.take() {
                records.push(rec);
            }
            let header = to_str(&line[1..])?.to_string();
            current = Some((header, Vec::new()));
        } else if let Some((_, seq)) = current.as_mut() {
            seq.extend(line.iter().map(|b| b.to_ascii_uppercase()));
        }
    }
    if let Some(rec) = current.take() {
        records.push(rec);
    }
    Ok(records)
}

/// One variant-TSV record, already validated but not yet inserted into an
/// [`crate::rcms::Rcms`].
pub struct VariantRecord {
    pub breakpoint: Breakpoint,
    pub alt: Vec<u8>,
    pub coverage: BitCoverage,
}

/// Parses a tab-separated variant file: one `pos\tref_len\talt\tcoverage_bits`
/// record per line (`spec.md` §6.3). `pos` is 0-based; `ref_len == 0` and a
/// non-empty `alt` denotes a pure insertion, `alt` of `"-"` or empty with
/// `ref_len > 0` denotes a pure deletion, anything else an MNV/combined
/// indel. `coverage_bits` is a string of `'0'`/`'1'` one character per
/// sample, matching [`BitCoverage::from_bit_string`].
pub fn read_variant_tsv(input: &[u8], domain: RangeDomain) -> Result<Vec<VariantRecord>> {
    let mut out = Vec::new();
    for (idx, line) in lines(input).enumerate() {
        let line_no = idx + 1;
        let line = to_str(line)?.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != 4 {
            return Err(IngestError::MalformedVariantLine {
                line: line_no,
                found: fields.len(),
            });
        }

        let pos = parse_u32(fields[0], line_no, "pos")?;
        let ref_len = parse_u32(fields[1], line_no, "ref_len")?;
        let allele = fields[2];
        let coverage_bits = fields[3];

        let alt: Vec<u8> = match allele {
            "-" | "" => Vec::new(),
            other => {
                if !other.bytes().all(|b| matches!(b.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T' | b'N')) {
                    return Err(IngestError::UnsupportedAllele {
                        line: line_no,
                        allele: other.to_string(),
                    });
                }
                other.bytes().map(|b| b.to_ascii_uppercase()).collect()
            }
        };

        if coverage_bits.len() != domain.len() {
            return Err(IngestError::CoverageLengthMismatch {
                line: line_no,
                found: coverage_bits.len(),
                expected: domain.len(),
            });
        }
        let coverage = BitCoverage::from_bit_string(domain, coverage_bits);

        out.push(VariantRecord {
            breakpoint: Breakpoint::new(pos, pos + ref_len),
            alt,
            coverage,
        });
    }
    Ok(out)
}

fn parse_u32(value: &str, line: usize, field: &'static str) -> Result<u32> {
    value.parse::<u32>().map_err(|_| IngestError::BadInteger {
        line,
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fasta_strips_header_and_newlines() {
        let input = b">chr1 test sequence\nACGT\nacgt\n";
        let seq = read_fasta(input).unwrap();
        assert_eq!(seq, b"ACGTACGT".to_vec());
    }

    #[test]
    fn test_read_fasta_rejects_multi_record() {
        let input = b">chr1\nACGT\n>chr2\nTTTT\n";
        let err = read_fasta(input);
        assert!(matches!(err, Err(IngestError::MultiRecordFasta)));
    }

    #[test]
    fn test_read_fasta_rejects_empty_input() {
        let err = read_fasta(b"");
        assert!(matches!(err, Err(IngestError::EmptyFasta)));
    }

    #[test]
    fn test_read_fasta_records_parses_multiple_reads() {
        let input = b">read1\nACGT\n>read2\nTTTT\nGG\n";
        let records = read_fasta_records(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ("read1".to_string(), b"ACGT".to_vec()));
        assert_eq!(records[1], ("read2".to_string(), b"TTTTGG".to_vec()));
    }

    #[test]
    fn test_read_variant_tsv_parses_snv_insertion_deletion() {
        let domain = RangeDomain::new(0, 2);
        let input = b"4\t1\tO\t10\n2\t0\tII\t01\n6\t2\t-\t11\n";
        let records = read_variant_tsv(input, domain).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].breakpoint, Breakpoint::new(4, 5));
        assert_eq!(records[0].alt, b"O");
        assert_eq!(records[1].breakpoint, Breakpoint::new(2, 2));
        assert_eq!(records[1].alt, b"II");
        assert_eq!(records[2].breakpoint, Breakpoint::new(6, 8));
        assert!(records[2].alt.is_empty());
    }

    #[test]
    fn test_read_variant_tsv_skips_comments_and_blank_lines() {
        let domain = RangeDomain::new(0, 1);
        let input = b"# a comment\n\n4\t1\tG\t1\n";
        let records = read_variant_tsv(input, domain).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_read_variant_tsv_rejects_bad_field_count() {
        let domain = RangeDomain::new(0, 1);
        let err = read_variant_tsv(b"4\t1\tG\n", domain);
        assert!(matches!(err, Err(IngestError::MalformedVariantLine { .. })));
    }

    #[test]
    fn test_read_variant_tsv_rejects_unsupported_allele() {
        let domain = RangeDomain::new(0, 1);
        let err = read_variant_tsv(b"4\t1\t<DEL>\t1\n", domain);
        assert!(matches!(err, Err(IngestError::UnsupportedAllele { .. })));
    }

    #[test]
    fn test_read_variant_tsv_rejects_coverage_length_mismatch() {
        let domain = RangeDomain::new(0, 2);
        let err = read_variant_tsv(b"4\t1\tG\t1\n", domain);
        assert!(matches!(err, Err(IngestError::CoverageLengthMismatch { .. })));
    }
}
