use log::{debug, info};

use seqsieve_db::DbReader;
use seqsieve_seq::{overlapping_kmers, Alphabet, KmerIterator, KmerWindow};

/// One posting of the inverted index: which target contains a k-mer, and where.
///
/// The sequence id is split-local, so scratch tables of the matcher stay as small as the
/// split. The position is kept modulo 256; it seeds the diagonal of the hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// split-local target id in `[0, n_targets)`
    pub seq_id: u32,
    /// k-mer start position in the target, modulo 256
    pub position: u8,
}

/// Inverted k-mer index over one split of the target database.
///
/// Stored as a bucket offset array of length |Σ|^k + 1 and a flat entries array;
/// `entries[offsets[c]..offsets[c+1]]` holds all occurrences of k-mer code `c`.
/// Built by two-pass counting; lookups are O(1).
pub struct IndexTable {
    offsets: Vec<u64>,
    entries: Vec<IndexEntry>,
    keys: Vec<u32>,
    from: usize,
}

impl IndexTable {
    /// Builds the index over targets `[from, to)` (ordinal ids of `reader`).
    ///
    /// Pass one counts the occurrences of every k-mer code, pass two fills the entries
    /// array through per-bucket write cursors.
    pub fn build(reader: &DbReader, alphabet: &Alphabet, window: &KmerWindow,
                 from: usize, to: usize) -> IndexTable {

        let n_codes = window.code_space();
        let mut counts = vec![0u64; n_codes + 1];
        let mut keys = Vec::with_capacity(to - from);

        // ---------- pass 1: count occurrences per k-mer code
        let mut total_expected: u64 = 0;
        for id in from..to {
            let codes = alphabet.encode(reader.entry(id));
            keys.push(reader.key_at(id));
            total_expected += overlapping_kmers(codes.len(), window.span()) as u64;
            for (_pos, code) in KmerIterator::new(&codes, window) {
                counts[code] += 1;
            }
        }

        // ---------- exclusive prefix sum turns counts into bucket offsets
        let mut offsets = counts;
        let mut running: u64 = 0;
        for slot in offsets.iter_mut() {
            let count = *slot;
            *slot = running;
            running += count;
        }
        debug_assert_eq!(running, total_expected);

        // ---------- pass 2: fill entries through per-bucket cursors
        let mut cursors: Vec<u64> = offsets[..n_codes].to_vec();
        let mut entries = vec![IndexEntry { seq_id: 0, position: 0 }; running as usize];
        for id in from..to {
            let codes = alphabet.encode(reader.entry(id));
            let seq_id = (id - from) as u32;
            for (pos, code) in KmerIterator::new(&codes, window) {
                entries[cursors[code] as usize] = IndexEntry { seq_id, position: pos as u8 };
                cursors[code] += 1;
            }
        }
        info!("index table over {} targets: {} k-mer entries in {} buckets",
              to - from, running, n_codes);
        debug!("average bucket fill: {:.3}", running as f64 / n_codes as f64);

        IndexTable { offsets, entries, keys, from }
    }

    /// Returns all occurrences of a k-mer code. O(1).
    #[inline(always)]
    pub fn list(&self, code: usize) -> &[IndexEntry] {
        let begin = self.offsets[code] as usize;
        let end = self.offsets[code + 1] as usize;
        &self.entries[begin..end]
    }

    /// Number of targets covered by this split
    pub fn n_targets(&self) -> usize { self.keys.len() }

    /// Total number of postings in the index
    pub fn n_entries(&self) -> usize { self.entries.len() }

    /// First ordinal id of the split within the target database
    pub fn from(&self) -> usize { self.from }

    /// Database key of a split-local target id
    #[inline(always)]
    pub fn key_of(&self, seq_id: u32) -> u32 { self.keys[seq_id as usize] }

    /// Estimated memory footprint of an index over `n_entries` postings and
    /// `code_space` buckets, in bytes
    pub fn memory_needed(n_entries: usize, code_space: usize) -> usize {
        n_entries * std::mem::size_of::<IndexEntry>() + (code_space + 1) * std::mem::size_of::<u64>()
    }
}
