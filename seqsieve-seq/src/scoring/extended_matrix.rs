use log::debug;

use crate::alphabet::ALPHABET_SIZE;
use crate::scoring::SubstitutionMatrix;

/// Precomputed table of the most similar w-mers for every w-mer of a small width.
///
/// For each of the |Σ|^w codes the table keeps the `top_n` highest-scoring codes,
/// sorted descending by similarity with ties broken by ascending code. Query k-mers are
/// split into fragments of width 2 and 3, and the fragments' rows are combined into
/// similar k-mers without rescoring residue pairs.
///
/// # Example
/// ```
/// use seqsieve_seq::scoring::{ExtendedSubstitutionMatrix, SubstitutionMatrix};
/// let matrix = SubstitutionMatrix::blosum62();
/// let two_mers = ExtendedSubstitutionMatrix::new(&matrix, 2, 40);
/// // the most similar 2-mer of any 2-mer is itself
/// let code = 0usize;                       // "AA"
/// assert_eq!(two_mers.similar(code)[0].0 as usize, code);
/// ```
pub struct ExtendedSubstitutionMatrix {
    width: usize,
    rows: Vec<Vec<(u32, i16)>>,
}

impl ExtendedSubstitutionMatrix {
    /// Builds the table for w-mers of a given `width`, keeping `top_n` entries per row.
    ///
    /// The build scores every pair of w-mer codes once; widths above 3 are not supported
    /// because the engine always splits k-mers into 2- and 3-wide fragments.
    pub fn new(matrix: &SubstitutionMatrix, width: usize, top_n: usize) -> ExtendedSubstitutionMatrix {
        assert!(width == 2 || width == 3, "extended tables exist for widths 2 and 3 only");

        let n_codes = ALPHABET_SIZE.pow(width as u32);
        let top_n = top_n.clamp(1, n_codes);
        let mut codes: Vec<Vec<u8>> = Vec::with_capacity(n_codes);
        for code in 0..n_codes {
            codes.push(unpack(code, width));
        }

        let ordering = |x: &(u32, i16), y: &(u32, i16)| y.1.cmp(&x.1).then(x.0.cmp(&y.0));
        let mut rows: Vec<Vec<(u32, i16)>> = Vec::with_capacity(n_codes);
        for a in 0..n_codes {
            let mut row: Vec<(u32, i16)> = (0..n_codes)
                .map(|b| (b as u32, matrix.score_codes(&codes[a], &codes[b]) as i16))
                .collect();
            if top_n < n_codes {
                row.select_nth_unstable_by(top_n - 1, ordering);
                row.truncate(top_n);
            }
            row.sort_by(ordering);
            rows.push(row);
        }
        debug!("extended {}-mer table built: {} rows, {} entries each", width, n_codes, top_n.min(n_codes));

        ExtendedSubstitutionMatrix { width, rows }
    }

    /// Width of the w-mers this table covers
    pub fn width(&self) -> usize { self.width }

    /// The `top_n` most similar codes for a given w-mer code, sorted descending by score
    pub fn similar(&self, code: usize) -> &[(u32, i16)] { &self.rows[code] }

    /// Highest similarity score in a row, i.e. the self-score of the w-mer
    pub fn best_score(&self, code: usize) -> i16 { self.rows[code][0].1 }
}

/// Unpacks a base-|Σ| w-mer code into residue codes
fn unpack(mut code: usize, width: usize) -> Vec<u8> {
    let mut residues = vec![0u8; width];
    for i in (0..width).rev() {
        residues[i] = (code % ALPHABET_SIZE) as u8;
        code /= ALPHABET_SIZE;
    }
    residues
}
