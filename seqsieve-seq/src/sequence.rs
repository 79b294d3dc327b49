use crate::alphabet::Alphabet;

#[derive(Debug, Clone, PartialEq)]
/// A database sequence encoded over the reduced alphabet.
///
/// Residues are stored as alphabet codes in a `Vec<u8>`, never as raw ASCII; the
/// database key identifies the sequence across all pipeline stages.
///
/// # Example
/// ```
/// use seqsieve_seq::{Alphabet, Sequence};
/// let alphabet = Alphabet::new();
/// let seq = Sequence::from_payload(42, b"MKTII", &alphabet);
/// assert_eq!(seq.key(), 42);
/// assert_eq!(seq.len(), 5);
/// assert_eq!(seq.to_string(&alphabet), "MKTII");
/// ```
pub struct Sequence {
    key: u32,
    codes: Vec<u8>,
}

impl Sequence {
    /// Encodes a raw database record into a sequence
    pub fn from_payload(key: u32, payload: &[u8], alphabet: &Alphabet) -> Sequence {
        Sequence { key, codes: alphabet.encode(payload) }
    }

    /// Wraps already-encoded residue codes
    pub fn from_codes(key: u32, codes: Vec<u8>) -> Sequence { Sequence { key, codes } }

    /// Returns the database key of this sequence
    pub fn key(&self) -> u32 { self.key }

    /// Returns the number of residues
    pub fn len(&self) -> usize { self.codes.len() }

    pub fn is_empty(&self) -> bool { self.codes.is_empty() }

    /// Returns the residue codes
    pub fn codes(&self) -> &[u8] { &self.codes }

    /// Returns a copy of this sequence with the residue order reversed.
    ///
    /// Reversed sequences keep their composition but lose their k-mer structure, which
    /// makes them the background model of the k-mer threshold calibration.
    pub fn reversed(&self) -> Sequence {
        let mut codes = self.codes.clone();
        codes.reverse();
        Sequence { key: self.key, codes }
    }

    /// Decodes this sequence back into a residue string
    pub fn to_string(&self, alphabet: &Alphabet) -> String {
        self.codes.iter().map(|&c| alphabet.decode(c)).collect()
    }
}
