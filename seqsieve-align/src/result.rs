use std::io::Write;

use crate::banded::LocalAlignment;

/// Everything the alignment stage reports about one accepted (query, target) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentResult {
    pub target_key: u32,
    pub raw_score: i32,
    pub bit_score: f64,
    /// identical positions over the alignment length, in [0, 1]
    pub seq_identity: f64,
    pub e_value: f64,
    pub query_start: usize,
    pub query_end: usize,
    pub target_start: usize,
    pub target_end: usize,
    pub alignment_length: usize,
    /// aligned query span over the query length, in [0, 1]
    pub query_coverage: f64,
    /// aligned target span over the target length, in [0, 1]
    pub target_coverage: f64,
    pub gap_opens: usize,
    pub gap_extends: usize,
    /// `M`/`I`/`D` steps; empty when backtraces are disabled
    pub backtrace: String,
}

impl AlignmentResult {
    /// Fills in the derived statistics for an accepted local alignment.
    pub fn from_alignment(target_key: u32, alignment: &LocalAlignment, bit_score: f64,
                          e_value: f64, query_length: usize, target_length: usize,
                          keep_backtrace: bool) -> AlignmentResult {
        let aligned_q = alignment.query_end - alignment.query_start + 1;
        let aligned_t = alignment.target_end - alignment.target_start + 1;
        AlignmentResult {
            target_key,
            raw_score: alignment.score,
            bit_score,
            seq_identity: alignment.n_identical as f64 / alignment.alignment_length.max(1) as f64,
            e_value,
            query_start: alignment.query_start,
            query_end: alignment.query_end,
            target_start: alignment.target_start,
            target_end: alignment.target_end,
            alignment_length: alignment.alignment_length,
            query_coverage: aligned_q as f64 / query_length.max(1) as f64,
            target_coverage: aligned_t as f64 / target_length.max(1) as f64,
            gap_opens: alignment.gap_opens,
            gap_extends: alignment.gap_extends,
            backtrace: if keep_backtrace { alignment.backtrace.clone() } else { String::new() },
        }
    }
}

/// Serializes results into one alignment record:
/// `target-key\tbit-score\tseq-id\te-value\tq-start\tq-end\tt-start\tt-end\talignment-length\tbacktrace` lines.
pub fn write_results(buffer: &mut Vec<u8>, results: &[AlignmentResult]) {
    buffer.clear();
    for r in results {
        writeln!(buffer, "{}\t{:.1}\t{:.3}\t{:.3e}\t{}\t{}\t{}\t{}\t{}\t{}",
                 r.target_key, r.bit_score, r.seq_identity, r.e_value,
                 r.query_start, r.query_end, r.target_start, r.target_end,
                 r.alignment_length, r.backtrace)
            .expect("writing into a Vec can't fail");
    }
}
