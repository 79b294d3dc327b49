use log::debug;

use seqsieve_seq::scoring::SubstitutionMatrix;
use seqsieve_seq::{KmerIterator, KmerWindow, Sequence, ALPHABET_SIZE, ANY_RESIDUE};

use crate::hit::Hit;
use crate::index_table::IndexTable;
use crate::kmer_generator::KmerGenerator;
use crate::query_score::{CountScoreTable, DiagonalScoreTable};

/// Which scratch table a matcher accumulates into; selected once per phase, never
/// branched on inside the posting-list loops.
pub enum ScoreTable {
    /// saturating 16-bit score accumulation per target
    Count(CountScoreTable),
    /// 8-bit match counting per (target, diagonal) cell
    Diagonal(DiagonalScoreTable),
}

impl ScoreTable {
    /// Allocates the scratch for one worker over a split of `n_targets`
    pub fn new(diagonal_scoring: bool, n_targets: usize) -> ScoreTable {
        if diagonal_scoring {
            ScoreTable::Diagonal(DiagonalScoreTable::new(n_targets))
        } else {
            ScoreTable::Count(CountScoreTable::new(n_targets))
        }
    }
}

/// Per-thread scorer: matches one query at a time against the index table.
///
/// For every query k-mer the matcher expands the set of sufficiently similar k-mers,
/// walks their posting lists and accumulates per-target evidence in its scratch table;
/// a final scan extracts the highest-scoring targets. All buffers are reused between
/// queries, so the hot loop never allocates.
pub struct QueryMatcher<'a> {
    index: &'a IndexTable,
    generator: &'a KmerGenerator<'a>,
    window: &'a KmerWindow,
    matrix: &'a SubstitutionMatrix,
    kmer_thr: i32,
    max_hits: usize,
    min_hit_score: u32,
    bias_correction: bool,
    table: ScoreTable,
    similar: Vec<(usize, i32)>,
    kmer: Vec<u8>,
}

impl<'a> QueryMatcher<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(index: &'a IndexTable, generator: &'a KmerGenerator<'a>, window: &'a KmerWindow,
               matrix: &'a SubstitutionMatrix, kmer_thr: i32, max_hits: usize,
               min_hit_score: u32, bias_correction: bool, diagonal_scoring: bool) -> QueryMatcher<'a> {
        QueryMatcher {
            index, generator, window, matrix, kmer_thr, max_hits, min_hit_score,
            bias_correction,
            table: ScoreTable::new(diagonal_scoring, index.n_targets()),
            similar: Vec::new(),
            kmer: vec![0; window.k()],
        }
    }

    /// Matches one query and returns its hits, sorted descending by score with ties
    /// broken by ascending target key and truncated to `max_hits`.
    ///
    /// When `exclude_key` is set (a self-search without identical hits), that target is
    /// left out of the result.
    pub fn match_query(&mut self, query: &Sequence, exclude_key: Option<u32>) -> Vec<Hit> {

        if query.len() < self.window.span() { return Vec::new(); }

        let mut kmers_scored = 0usize;
        let mut entries_walked = 0usize;
        for (pos, _code) in KmerIterator::new(query.codes(), self.window) {
            // --- gather the informative residues of this window
            for (slot, &offset) in self.kmer.iter_mut().zip(self.window.positions()) {
                *slot = query.codes()[pos + offset];
            }
            let mut similar = std::mem::take(&mut self.similar);
            self.generator.similar_kmers(&self.kmer, self.kmer_thr, &mut similar);
            kmers_scored += similar.len();
            match &mut self.table {
                ScoreTable::Count(table) => {
                    for &(code, score) in &similar {
                        let postings = self.index.list(code);
                        entries_walked += postings.len();
                        let score = score.max(0) as u16;
                        for entry in postings {
                            table.add(entry.seq_id, score);
                        }
                    }
                }
                ScoreTable::Diagonal(table) => {
                    for &(code, _score) in &similar {
                        let postings = self.index.list(code);
                        entries_walked += postings.len();
                        let diagonal_base = pos as u8;
                        for entry in postings {
                            table.add(entry.seq_id, diagonal_base.wrapping_sub(entry.position));
                        }
                    }
                }
            }
            self.similar = similar;
        }
        debug!("query {}: {} similar k-mers scored, {} postings walked",
               query.key(), kmers_scored, entries_walked);

        // --- diagonal scoring accumulates counts, not scores; the expectation only
        //     applies to the count variant
        let bias = if self.bias_correction && matches!(self.table, ScoreTable::Count(_)) {
            composition_bias(query, self.matrix, self.window.k())
        } else {
            0
        };
        let mut hits = self.extract_hits(bias, exclude_key);
        hits.sort_by(|a, b| b.score.cmp(&a.score).then(a.target_key.cmp(&b.target_key)));
        hits.truncate(self.max_hits);
        match &mut self.table {
            ScoreTable::Count(table) => table.reset(),
            ScoreTable::Diagonal(table) => table.reset(),
        }

        hits
    }

    fn extract_hits(&self, bias: u32, exclude_key: Option<u32>) -> Vec<Hit> {
        let mut hits = Vec::new();
        match &self.table {
            ScoreTable::Count(table) => {
                for &seq_id in table.touched() {
                    let score = table.score(seq_id).saturating_sub(bias);
                    if score < self.min_hit_score { continue; }
                    let target_key = self.index.key_of(seq_id);
                    if exclude_key == Some(target_key) { continue; }
                    hits.push(Hit { target_key, score, diagonal: 0 });
                }
            }
            ScoreTable::Diagonal(table) => {
                for &seq_id in table.touched() {
                    let score = table.score(seq_id);
                    if score < self.min_hit_score { continue; }
                    let target_key = self.index.key_of(seq_id);
                    if exclude_key == Some(target_key) { continue; }
                    hits.push(Hit { target_key, score, diagonal: table.diagonal(seq_id) });
                }
            }
        }
        hits
    }
}

/// Expected score of one k-mer under the query's own residue composition, clamped at
/// zero. Compositionally biased queries (poly-A stretches, low-complexity regions)
/// accumulate background score everywhere; subtracting this expectation removes it.
pub fn composition_bias(query: &Sequence, matrix: &SubstitutionMatrix, k: usize) -> u32 {
    if query.is_empty() { return 0; }

    let mut counts = [0u32; ALPHABET_SIZE];
    for &code in query.codes() {
        counts[code as usize] += 1;
    }
    let length = query.len() as f64;

    let mut expected_total = 0.0;
    for &code in query.codes() {
        if code == ANY_RESIDUE { continue; }
        let mut expected = 0.0;
        for (other, &count) in counts.iter().enumerate() {
            if count == 0 { continue; }
            expected += count as f64 / length
                * matrix.score_by_index(code, other as u8) as f64;
        }
        expected_total += expected;
    }
    let per_kmer = expected_total / length * k as f64;
    if per_kmer <= 0.0 { 0 } else { per_kmer.round() as u32 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn biased_queries_pay_a_correction() {
        let matrix = SubstitutionMatrix::blosum62();
        let alphabet = matrix.alphabet();
        let poly_a = Sequence::from_payload(1, b"AAAAAAAAAA", alphabet);
        let diverse = Sequence::from_payload(2, b"MKTWYCHRDE", alphabet);

        let biased = composition_bias(&poly_a, &matrix, 4);
        let unbiased = composition_bias(&diverse, &matrix, 4);
        // --- a poly-A query expects S(A,A) on every position of every k-mer
        assert_eq!(biased, 16);
        assert!(unbiased < biased);
    }
}
