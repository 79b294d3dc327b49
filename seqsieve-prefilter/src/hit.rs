use std::io::Write;

use log::warn;

/// A single prefilter match: a target that accumulated enough k-mer similarity.
///
/// The diagonal is `(query position − target position) mod 256`, the seed the aligner
/// centers its band on. In count-only scoring the diagonal is reported as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// database key of the target sequence
    pub target_key: u32,
    /// accumulated prefilter score
    pub score: u32,
    /// 8-bit diagonal of the best-scoring ungapped line
    pub diagonal: u8,
}

impl Hit {
    /// Recovers a signed band offset from the 8-bit diagonal; values above 127 wrap to
    /// negative offsets.
    pub fn signed_diagonal(&self) -> i32 {
        if self.diagonal > 127 { self.diagonal as i32 - 256 } else { self.diagonal as i32 }
    }
}

/// Serializes hits into one prefilter result record: `target-key\tscore\tdiagonal` lines.
pub fn write_hits(buffer: &mut Vec<u8>, hits: &[Hit]) {
    buffer.clear();
    for hit in hits {
        writeln!(buffer, "{}\t{}\t{}", hit.target_key, hit.score, hit.diagonal)
            .expect("writing into a Vec can't fail");
    }
}

/// Parses a prefilter result record back into hits.
///
/// A malformed line is a data-quality problem, not a fatal one: it is logged and
/// skipped, and parsing continues with the next line.
pub fn parse_hits(record: &[u8]) -> Vec<Hit> {
    let mut hits = Vec::new();
    for line in record.split(|&b| b == b'\n') {
        if line.is_empty() { continue; }
        match parse_hit_line(line) {
            Some(hit) => hits.push(hit),
            None => warn!("skipping malformed prefilter line: '{}'", String::from_utf8_lossy(line)),
        }
    }
    hits
}

fn parse_hit_line(line: &[u8]) -> Option<Hit> {
    let text = std::str::from_utf8(line).ok()?;
    let mut fields = text.split('\t');
    let target_key = fields.next()?.trim().parse::<u32>().ok()?;
    let score = fields.next()?.trim().parse::<u32>().ok()?;
    let diagonal = fields.next()?.trim().parse::<u8>().ok()?;
    Some(Hit { target_key, score, diagonal })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_survive_a_round_trip() {
        let hits = vec![
            Hit { target_key: 17, score: 250, diagonal: 3 },
            Hit { target_key: 4, score: 9, diagonal: 255 },
        ];
        let mut buffer = Vec::new();
        write_hits(&mut buffer, &hits);
        assert_eq!(parse_hits(&buffer), hits);
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let record = b"17\t250\t3\nnot\ta-number\tx\n4\t9\t255\n";
        let hits = parse_hits(record);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].target_key, 4);
    }

    #[test]
    fn diagonal_wraps_to_signed_offsets() {
        assert_eq!(Hit { target_key: 0, score: 0, diagonal: 3 }.signed_diagonal(), 3);
        assert_eq!(Hit { target_key: 0, score: 0, diagonal: 255 }.signed_diagonal(), -1);
    }
}
