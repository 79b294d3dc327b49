use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader};

use crate::alphabet::{Alphabet, ALPHABET_SIZE, ANY_RESIDUE};
use crate::errors::ScoringError;
use crate::errors::ScoringError::{CantParseNCBIEntry, FileNotFound, IncorrectNCBIFormat, ReadingError};

/// Karlin-Altschul parameters of a scoring system, used to turn raw alignment scores
/// into bit scores and expectation values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KarlinAltschul {
    /// scale of the scoring system
    pub lambda: f64,
    /// search-space constant
    pub k: f64,
}

/// Holds an amino acid substitution matrix (aka similarity matrix)
///
/// The matrix is indexed by the codes of the reduced [`Alphabet`](crate::Alphabet), so
/// residue codes obtained from the codec address rows and columns directly. Such a
/// matrix can be loaded from an external file in the NCBI format; BLOSUM62 is embedded.
///
/// # Example
/// ```
/// use seqsieve_seq::scoring::SubstitutionMatrix;
/// let blosum62 = SubstitutionMatrix::blosum62();
/// assert_eq!(blosum62.score_by_aa(b'C', b'C'), 9);
/// assert_eq!(blosum62.score_by_aa(b'W', b'W'), 11);
/// ```
pub struct SubstitutionMatrix {
    score: [[i16; ALPHABET_SIZE]; ALPHABET_SIZE],
    alphabet: Alphabet,
    ka: KarlinAltschul,
}

impl SubstitutionMatrix {
    fn new() -> SubstitutionMatrix {
        SubstitutionMatrix {
            score: [[0; ALPHABET_SIZE]; ALPHABET_SIZE],
            alphabet: Alphabet::new(),
            // --- gapped BLOSUM62 defaults; overridden by with_ka()
            ka: KarlinAltschul { lambda: 0.267, k: 0.041 },
        }
    }

    /// Loads the BLOSUM62 matrix shipped with this crate
    pub fn blosum62() -> SubstitutionMatrix {
        let data = include_str!("../../data/BLOSUM62");
        let mut m = SubstitutionMatrix::ncbi_matrix_from_buffer(BufReader::new(data.as_bytes()))
            .expect("the embedded BLOSUM62 matrix must parse");
        m.ka = KarlinAltschul { lambda: 0.267, k: 0.041 };
        m
    }

    #[inline(always)]
    /// Provides the score for a given pair of alphabet codes according to this [SubstitutionMatrix]
    pub fn score_by_index(&self, code_i: u8, code_j: u8) -> i16 {
        self.score[code_i as usize][code_j as usize]
    }

    #[inline(always)]
    /// Provides the score for a given pair of amino acids specified by their single-letter codes
    pub fn score_by_aa(&self, aa_letter_i: u8, aa_letter_j: u8) -> i16 {
        self.score_by_index(self.alphabet.encode_residue(aa_letter_i),
                            self.alphabet.encode_residue(aa_letter_j))
    }

    /// Sums the positional scores of two equally long code strings.
    ///
    /// This is the k-mer similarity used by the extended substitution tables and the
    /// prefilter: the similarity of a k-mer to itself is its self-score.
    pub fn score_codes(&self, a: &[u8], b: &[u8]) -> i32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter().zip(b.iter())
            .map(|(&x, &y)| self.score_by_index(x, y) as i32)
            .sum()
    }

    /// The alphabet this matrix is indexed by
    pub fn alphabet(&self) -> &Alphabet { &self.alphabet }

    /// Karlin-Altschul parameters attached to this matrix
    pub fn ka(&self) -> KarlinAltschul { self.ka }

    /// Replaces the Karlin-Altschul parameters, e.g. for a custom gap cost model
    pub fn with_ka(mut self, ka: KarlinAltschul) -> SubstitutionMatrix {
        self.ka = ka;
        self
    }

    /// Loads a [SubstitutionMatrix] from data in the NCBI format.
    ///
    /// Rows and columns are mapped onto the canonical alphabet order; entries for the
    /// ``'B'``, ``'J'``, ``'Z'`` and ``'*'`` symbols are not loaded, the ``'X'`` column
    /// fills the ambiguity scores.
    pub fn ncbi_matrix_from_buffer<R: BufRead>(reader: R) -> Result<SubstitutionMatrix, ScoringError> {

        let mut m = SubstitutionMatrix::new();
        let mut rows_loaded = 0usize;
        for line in reader.lines() {
            let line = match line {
                Ok(l) => { l }
                Err(_) => { return Err(ReadingError) }
            };
            if line.starts_with('#') || line.starts_with(' ') { continue; }
            let values: Vec<&str> = line.split_whitespace().collect();
            let n_values = values.len();
            if n_values < 23 { return Err(IncorrectNCBIFormat { line: line.clone() }) }
            let letter = values[0].as_bytes()[0];
            let i = m.alphabet.encode_residue(letter) as usize;
            // --- rows for B, Z, X, '*' all encode as the ambiguity code; skip them
            if i == ANY_RESIDUE as usize { continue; }
            for j in 1..21 {
                let value = match values[j].parse::<i16>() {
                    Ok(val) => { val }
                    Err(_) => {
                        return Err(CantParseNCBIEntry { line: line.clone(), value: values[j].to_string() })
                    }
                };
                m.score[i][j - 1] = value;
                m.score[j - 1][i] = value;
            }
            // --- n_values - 2 is the index of the 'X' column
            let x_value = match values[n_values - 2].parse::<i16>() {
                Ok(val) => { val }
                Err(_) => {
                    return Err(CantParseNCBIEntry { line: line.clone(), value: values[n_values - 2].to_string() })
                }
            };
            m.score[i][ANY_RESIDUE as usize] = x_value;
            m.score[ANY_RESIDUE as usize][i] = x_value;
            rows_loaded += 1;
            if rows_loaded == 20 { break }
        }
        m.score[ANY_RESIDUE as usize][ANY_RESIDUE as usize] = -1;

        Ok(m)
    }

    /// Loads a [SubstitutionMatrix] from a file in the NCBI format.
    ///
    /// This method simply opens the ``file_name`` file for reading and calls
    /// [ncbi_matrix_from_buffer()](SubstitutionMatrix::ncbi_matrix_from_buffer()).
    pub fn ncbi_matrix_from_file(file_name: &str) -> Result<SubstitutionMatrix, ScoringError> {

        let file = match File::open(file_name) {
            Ok(f) => { f }
            Err(_) => { return Err(FileNotFound { file_name: file_name.to_string() }) }
        };
        SubstitutionMatrix::ncbi_matrix_from_buffer(BufReader::new(file))
    }
}

impl Display for SubstitutionMatrix {
    /// Displays a [SubstitutionMatrix] as a table in the canonical alphabet order
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "   A  R  N  D  C  Q  E  G  H  I  L  K  M  F  P  S  T  W  Y  V  X\n")?;
        for i in 0..ALPHABET_SIZE {
            write!(f, "{}", self.alphabet.decode(i as u8))?;
            for j in 0..ALPHABET_SIZE {
                write!(f, "{:3}", self.score[i][j])?;
            }
            write!(f, "\n")?;
        }
        Ok(())
    }
}
