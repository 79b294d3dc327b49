use std::fs::File;
use std::io::{BufRead, BufReader};
use memmap2::Mmap;

use crate::errors::DbError;

/// Decides in which order a [`DbReader`](DbReader) presents its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Keep the on-disk order, which is sorted by key
    NoSort,
    /// Reorder records by increasing data offset for streaming reads
    LinearAccess,
    /// Reorder records by descending payload length for load balancing
    SortByLength,
    /// Load only the index; record data is not memory-mapped
    IndexOnly,
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    key: u32,
    offset: u64,
    /// record length on disk, including the terminating `'\0'`
    length: u64,
}

/// Read-only view of an indexed database: a data file plus a `key offset length` index.
///
/// Records are looked up in O(1) by ordinal id and in O(log n) by key. The data file is
/// memory-mapped, so [`entry()`](DbReader::entry) returns a slice into the mapped region
/// without copying. A reader can be shared between threads once opened.
///
/// # Example
/// ```no_run
/// use seqsieve_db::{AccessMode, DbReader};
/// let reader = DbReader::open("targets", "targets.index", AccessMode::NoSort).unwrap();
/// for id in 0..reader.size() {
///     let residues = reader.entry(id);
///     println!("{} has {} residues", reader.key_at(id), residues.len());
/// }
/// ```
pub struct DbReader {
    data_name: String,
    entries: Vec<IndexEntry>,
    /// ordinals sorted by key; used for `id_of()` when the access mode reordered `entries`
    key_order: Vec<u32>,
    data: Option<Mmap>,
}

impl DbReader {
    /// Opens a database for reading.
    ///
    /// The index file is parsed and validated: keys must be strictly increasing, record
    /// ranges must lie inside the data file and the data file must end with a `'\0'`
    /// sentinel. Unless `mode` is [`IndexOnly`](AccessMode::IndexOnly), the data file is
    /// memory-mapped.
    pub fn open(data_name: &str, index_name: &str, mode: AccessMode) -> Result<DbReader, DbError> {

        let index_file = File::open(index_name).map_err(|e| DbError::FileNotFound {
            file_name: index_name.to_string(), source: e })?;
        let mut entries: Vec<IndexEntry> = Vec::new();
        for (line_no, line) in BufReader::new(index_file).lines().enumerate() {
            let line = line?;
            if line.is_empty() { continue; }
            let mut tokens = line.split_whitespace();
            let triple = (tokens.next(), tokens.next(), tokens.next());
            let entry = match triple {
                (Some(k), Some(o), Some(l)) => {
                    match (k.parse::<u32>(), o.parse::<u64>(), l.parse::<u64>()) {
                        // --- a record is at least its '\0' terminator long
                        (Ok(key), Ok(offset), Ok(length)) if length >= 1 =>
                            IndexEntry { key, offset, length },
                        _ => return Err(DbError::MalformedIndex {
                            file_name: index_name.to_string(), line_no: line_no + 1, line }),
                    }
                }
                _ => return Err(DbError::MalformedIndex {
                    file_name: index_name.to_string(), line_no: line_no + 1, line }),
            };
            if let Some(prev) = entries.last() {
                if entry.key <= prev.key {
                    return Err(DbError::UnsortedIndex {
                        file_name: index_name.to_string(), line_no: line_no + 1 });
                }
            }
            entries.push(entry);
        }

        let data_file = File::open(data_name).map_err(|e| DbError::FileNotFound {
            file_name: data_name.to_string(), source: e })?;
        let data_size = data_file.metadata()?.len();
        for e in &entries {
            if e.offset + e.length > data_size {
                return Err(DbError::RecordOutsideData {
                    file_name: data_name.to_string(), key: e.key,
                    offset: e.offset, end: e.offset + e.length, data_size });
            }
        }

        let data = match mode {
            AccessMode::IndexOnly => None,
            _ => {
                let map = unsafe { Mmap::map(&data_file) }.map_err(|e| DbError::MmapFailed {
                    file_name: data_name.to_string(), source: e })?;
                if map.len() > 0 && map[map.len() - 1] != b'\0' {
                    return Err(DbError::MissingTerminator { file_name: data_name.to_string() });
                }
                Some(map)
            }
        };

        match mode {
            AccessMode::NoSort | AccessMode::IndexOnly => {}
            AccessMode::LinearAccess => entries.sort_by_key(|e| e.offset),
            AccessMode::SortByLength => entries.sort_by(
                |a, b| b.length.cmp(&a.length).then(a.key.cmp(&b.key))),
        }
        let mut key_order: Vec<u32> = (0..entries.len() as u32).collect();
        key_order.sort_by_key(|&i| entries[i as usize].key);

        Ok(DbReader { data_name: data_name.to_string(), entries, key_order, data })
    }

    /// Opens the pair of files `db_name` and `db_name.index`.
    pub fn open_db(db_name: &str, mode: AccessMode) -> Result<DbReader, DbError> {
        DbReader::open(db_name, &format!("{}.index", db_name), mode)
    }

    /// Returns the number of records in this database
    pub fn size(&self) -> usize { self.entries.len() }

    /// Returns the key of a record given its ordinal id
    pub fn key_at(&self, id: usize) -> u32 { self.entries[id].key }

    /// Returns the payload length of a record, excluding the `'\0'` terminator
    pub fn length_at(&self, id: usize) -> usize { self.entries[id].length.saturating_sub(1) as usize }

    /// Returns the ordinal id of a record given its key, if present
    pub fn id_of(&self, key: u32) -> Option<usize> {
        self.key_order
            .binary_search_by_key(&key, |&i| self.entries[i as usize].key)
            .ok()
            .map(|rank| self.key_order[rank] as usize)
    }

    /// Returns the payload of a record given its ordinal id, excluding the `'\0'` terminator.
    ///
    /// Panics if `id` is out of range or the database was opened with
    /// [`IndexOnly`](AccessMode::IndexOnly) access; use [`get()`](DbReader::get) for a
    /// checked lookup by key.
    pub fn entry(&self, id: usize) -> &[u8] {
        let e = &self.entries[id];
        let data = self.data.as_ref().expect("data file was not mapped (IndexOnly access)");
        let end = (e.offset + e.length) as usize;
        &data[e.offset as usize..end.saturating_sub(1)]
    }

    /// Returns the payload of a record together with its `'\0'` terminator
    pub fn raw_entry(&self, id: usize) -> &[u8] {
        let e = &self.entries[id];
        let data = self.data.as_ref().expect("data file was not mapped (IndexOnly access)");
        &data[e.offset as usize..(e.offset + e.length) as usize]
    }

    /// Returns the payload of the record stored under a given key
    pub fn get(&self, key: u32) -> Option<&[u8]> {
        self.id_of(key).map(|id| self.entry(id))
    }

    /// Total number of payload bytes over all records, excluding terminators.
    ///
    /// For a sequence database this is the total residue count, which drives the
    /// by-residue domain decomposition of a distributed run.
    pub fn total_residues(&self) -> u64 {
        self.entries.iter().map(|e| e.length.saturating_sub(1)).sum()
    }

    /// Name of the data file this reader was opened on
    pub fn data_name(&self) -> &str { &self.data_name }

    /// Iterates over `(key, payload)` pairs in the reader's record order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u8])> {
        (0..self.size()).map(move |id| (self.key_at(id), self.entry(id)))
    }
}
