use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::alphabet::ALPHABET_SIZE;
use crate::errors::SequenceError;

/// Largest supported k-mer size; 21^7 still fits comfortably in a table index
pub const MAX_KMER_SIZE: usize = 7;

/// Default spaced seed masks, one per k-mer size that ships with a spaced pattern.
///
/// A mask is a deployment parameter; these defaults are only used when the
/// configuration does not provide one.
static DEFAULT_SPACED_MASKS: Lazy<HashMap<usize, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (4, "110101"),
        (5, "1101011"),
        (6, "110101101"),
        (7, "1101101101"),
    ])
});

/// Shape of the k-mer window: which positions of a residue window contribute to the code.
///
/// A contiguous window uses `k` adjacent positions; a spaced window selects the `k`
/// informative positions through a `'1'`/`'0'` mask such as `"110101101"`. Either way a
/// k-mer code is the base-21 packing of the selected residue codes, so two distinct
/// k-mers never collide for a fixed (k, mask) choice.
///
/// # Example
/// ```
/// use seqsieve_seq::KmerWindow;
/// let contiguous = KmerWindow::contiguous(4).unwrap();
/// assert_eq!(contiguous.span(), 4);
/// let spaced = KmerWindow::spaced("110101").unwrap();
/// assert_eq!(spaced.k(), 4);
/// assert_eq!(spaced.span(), 6);
/// assert_eq!(spaced.code_space(), contiguous.code_space());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerWindow {
    positions: Vec<usize>,
    span: usize,
}

impl KmerWindow {
    /// Creates a contiguous window of `k` positions
    pub fn contiguous(k: usize) -> Result<KmerWindow, SequenceError> {
        if k < 1 || k > MAX_KMER_SIZE {
            return Err(SequenceError::KmerSizeOutOfRange { k, max: MAX_KMER_SIZE });
        }
        Ok(KmerWindow { positions: (0..k).collect(), span: k })
    }

    /// Creates a spaced window from a mask string.
    ///
    /// The mask must consist of `'1'` and `'0'` characters only and must begin and end
    /// with `'1'`; the number of `'1'`s is the k-mer size.
    pub fn spaced(mask: &str) -> Result<KmerWindow, SequenceError> {
        let invalid = |reason: &str| SequenceError::InvalidSpacedMask {
            mask: mask.to_string(), reason: reason.to_string() };
        if mask.is_empty() || mask.bytes().any(|b| b != b'0' && b != b'1') {
            return Err(invalid("only '0' and '1' characters are allowed"));
        }
        if !mask.starts_with('1') || !mask.ends_with('1') {
            return Err(invalid("a mask must begin and end with an informative position"));
        }
        let positions: Vec<usize> = mask.bytes().enumerate()
            .filter(|(_, b)| *b == b'1')
            .map(|(i, _)| i)
            .collect();
        let k = positions.len();
        if k > MAX_KMER_SIZE {
            return Err(SequenceError::KmerSizeOutOfRange { k, max: MAX_KMER_SIZE });
        }
        Ok(KmerWindow { span: mask.len(), positions })
    }

    /// Creates the default spaced window for a given `k`, falling back to a contiguous
    /// window when no spaced pattern is shipped for that size.
    pub fn default_spaced(k: usize) -> Result<KmerWindow, SequenceError> {
        match DEFAULT_SPACED_MASKS.get(&k) {
            Some(mask) => KmerWindow::spaced(mask),
            None => KmerWindow::contiguous(k),
        }
    }

    /// Number of informative positions, i.e. the k-mer size
    pub fn k(&self) -> usize { self.positions.len() }

    /// Total window width, including non-informative positions
    pub fn span(&self) -> usize { self.span }

    /// Size of the k-mer code range: |Σ|^k
    pub fn code_space(&self) -> usize { ALPHABET_SIZE.pow(self.k() as u32) }

    /// Offsets of the informative positions within the window
    pub fn positions(&self) -> &[usize] { &self.positions }

    #[inline]
    /// Packs the informative residues of a window starting at `codes[0]` into a k-mer code
    pub fn pack(&self, codes: &[u8]) -> usize {
        let mut code = 0usize;
        for &p in &self.positions {
            code = code * ALPHABET_SIZE + codes[p] as usize;
        }
        code
    }

    /// Unpacks a k-mer code into its `k` residue codes
    pub fn unpack(&self, mut code: usize) -> Vec<u8> {
        let k = self.k();
        let mut residues = vec![0u8; k];
        for i in (0..k).rev() {
            residues[i] = (code % ALPHABET_SIZE) as u8;
            code /= ALPHABET_SIZE;
        }
        residues
    }
}

/// Number of windows a sequence of `length` residues offers to a window of `span` positions
pub fn overlapping_kmers(length: usize, span: usize) -> usize {
    if length >= span { length - span + 1 } else { 0 }
}

/// Lazy iterator over the k-mer codes of an encoded sequence.
///
/// Yields `(start_position, code)` pairs for all `length − span + 1` windows; a sequence
/// shorter than the window yields nothing.
///
/// # Example
/// ```
/// use seqsieve_seq::{Alphabet, KmerIterator, KmerWindow};
/// let alphabet = Alphabet::new();
/// let codes = alphabet.encode(b"AAAA");
/// let window = KmerWindow::contiguous(4).unwrap();
/// let kmers: Vec<(usize, usize)> = KmerIterator::new(&codes, &window).collect();
/// assert_eq!(kmers, vec![(0, 0)]);
/// ```
pub struct KmerIterator<'a> {
    codes: &'a [u8],
    window: &'a KmerWindow,
    pos: usize,
}

impl<'a> KmerIterator<'a> {
    pub fn new(codes: &'a [u8], window: &'a KmerWindow) -> KmerIterator<'a> {
        KmerIterator { codes, window, pos: 0 }
    }
}

impl<'a> Iterator for KmerIterator<'a> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos + self.window.span() > self.codes.len() { return None; }
        let code = self.window.pack(&self.codes[self.pos..]);
        let pos = self.pos;
        self.pos += 1;
        Some((pos, code))
    }
}
