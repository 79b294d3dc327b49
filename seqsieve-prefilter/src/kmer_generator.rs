use seqsieve_seq::scoring::ExtendedSubstitutionMatrix;
use seqsieve_seq::ALPHABET_SIZE;

/// Fragment widths a k-mer of size `k` is split into; every fragment is 2 or 3 wide so
/// the two extended tables cover all supported sizes.
pub fn fragment_widths(k: usize) -> Vec<usize> {
    match k {
        2 => vec![2],
        3 => vec![3],
        4 => vec![2, 2],
        5 => vec![3, 2],
        6 => vec![3, 3],
        7 => vec![3, 2, 2],
        _ => panic!("no fragment decomposition for k = {}", k),
    }
}

/// Whether k-mers of size `k` need the extended 3-mer table
pub fn needs_three_mers(k: usize) -> bool {
    fragment_widths(k).contains(&3)
}

/// Expands one query k-mer into all k-mers whose similarity reaches a threshold.
///
/// The query k-mer is split into 2- and 3-wide fragments; for every fragment the
/// [`ExtendedSubstitutionMatrix`](ExtendedSubstitutionMatrix) supplies its most similar
/// fragment codes sorted descending. The cartesian combination is walked with
/// branch-and-bound pruning: as soon as the partial score plus the best possible
/// remainder drops below the threshold, the (sorted) row is abandoned.
pub struct KmerGenerator<'a> {
    widths: Vec<usize>,
    tables: Vec<&'a ExtendedSubstitutionMatrix>,
}

impl<'a> KmerGenerator<'a> {
    /// Creates a generator for k-mers of size `k`.
    ///
    /// The 3-mer table may be omitted for sizes whose decomposition is all 2-wide
    /// (k = 2 and k = 4); for any other size it must be present.
    pub fn new(k: usize, two_mers: &'a ExtendedSubstitutionMatrix,
               three_mers: Option<&'a ExtendedSubstitutionMatrix>) -> KmerGenerator<'a> {
        let widths = fragment_widths(k);
        let tables = widths.iter()
            .map(|&w| match w {
                2 => two_mers,
                _ => three_mers.expect("k-mer size needs the extended 3-mer table"),
            })
            .collect();
        KmerGenerator { widths, tables }
    }

    /// K-mer size this generator expands
    pub fn k(&self) -> usize { self.widths.iter().sum() }

    /// Expands `kmer` (residue codes, length k) into `(code, score)` pairs with
    /// similarity ≥ `threshold`, appended to `out`. The query k-mer itself is included
    /// whenever its self-score reaches the threshold.
    pub fn similar_kmers(&self, kmer: &[u8], threshold: i32, out: &mut Vec<(usize, i32)>) {
        debug_assert_eq!(kmer.len(), self.k());
        out.clear();

        // --- fragment codes of the query k-mer
        let mut fragment_codes = Vec::with_capacity(self.widths.len());
        let mut offset = 0;
        for &w in &self.widths {
            let mut code = 0usize;
            for &residue in &kmer[offset..offset + w] {
                code = code * ALPHABET_SIZE + residue as usize;
            }
            fragment_codes.push(code);
            offset += w;
        }

        // --- best achievable score from fragment i onwards, for pruning
        let n = self.widths.len();
        let mut best_tail = vec![0i32; n + 1];
        for i in (0..n).rev() {
            best_tail[i] = best_tail[i + 1] + self.tables[i].best_score(fragment_codes[i]) as i32;
        }

        self.combine(0, 0, 0, threshold, &fragment_codes, &best_tail, out);
    }

    fn combine(&self, depth: usize, partial_code: usize, partial_score: i32, threshold: i32,
               fragment_codes: &[usize], best_tail: &[i32], out: &mut Vec<(usize, i32)>) {
        if depth == self.widths.len() {
            out.push((partial_code, partial_score));
            return;
        }
        let shift = ALPHABET_SIZE.pow(self.widths[depth] as u32);
        for &(code, score) in self.tables[depth].similar(fragment_codes[depth]) {
            // --- rows are sorted descending: nothing below can reach the threshold
            if partial_score + score as i32 + best_tail[depth + 1] < threshold { break; }
            self.combine(depth + 1, partial_code * shift + code as usize,
                         partial_score + score as i32, threshold, fragment_codes, best_tail, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqsieve_seq::scoring::SubstitutionMatrix;
    use seqsieve_seq::{Alphabet, KmerWindow};

    fn full_two_mer_table(matrix: &SubstitutionMatrix) -> ExtendedSubstitutionMatrix {
        ExtendedSubstitutionMatrix::new(matrix, 2, ALPHABET_SIZE * ALPHABET_SIZE)
    }

    #[test]
    fn self_kmer_is_generated_at_its_self_score() {
        let matrix = SubstitutionMatrix::blosum62();
        let two = full_two_mer_table(&matrix);
        let generator = KmerGenerator::new(4, &two, None);

        let alphabet = Alphabet::new();
        let kmer = alphabet.encode(b"WCHW");
        let self_score = matrix.score_codes(&kmer, &kmer);

        let mut similar = Vec::new();
        generator.similar_kmers(&kmer, self_score, &mut similar);

        let window = KmerWindow::contiguous(4).unwrap();
        let self_code = window.pack(&kmer);
        // --- every residue of WCHW scores strictly best against itself, so the
        //     expansion at the self-score threshold is the k-mer alone
        assert_eq!(similar, vec![(self_code, self_score)]);
    }

    #[test]
    fn lowering_the_threshold_grows_the_expansion() {
        let matrix = SubstitutionMatrix::blosum62();
        let two = full_two_mer_table(&matrix);
        let generator = KmerGenerator::new(4, &two, None);

        let alphabet = Alphabet::new();
        let kmer = alphabet.encode(b"MKTI");
        let self_score = matrix.score_codes(&kmer, &kmer);

        let mut strict = Vec::new();
        let mut permissive = Vec::new();
        generator.similar_kmers(&kmer, self_score, &mut strict);
        generator.similar_kmers(&kmer, self_score - 6, &mut permissive);

        assert!(permissive.len() > strict.len());
        for entry in &strict {
            assert!(permissive.contains(entry));
        }
    }

    #[test]
    fn every_generated_kmer_reaches_the_threshold() {
        let matrix = SubstitutionMatrix::blosum62();
        let two = full_two_mer_table(&matrix);
        let generator = KmerGenerator::new(4, &two, None);
        let window = KmerWindow::contiguous(4).unwrap();

        let alphabet = Alphabet::new();
        let kmer = alphabet.encode(b"ACDE");
        let threshold = matrix.score_codes(&kmer, &kmer) - 4;

        let mut similar = Vec::new();
        generator.similar_kmers(&kmer, threshold, &mut similar);
        assert!(!similar.is_empty());
        for &(code, score) in &similar {
            assert!(score >= threshold);
            // --- the reported score is the true positional similarity
            assert_eq!(score, matrix.score_codes(&kmer, &window.unpack(code)));
        }
    }
}
