use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
/// Errors that may be thrown while opening, reading or writing an indexed database
pub enum DbError {
    #[error("The file: {file_name} can't be opened: {source}")]
    /// The file: {file_name} can't be opened
    FileNotFound {
        /// name of the missing file
        file_name: String,
        source: std::io::Error,
    },
    #[error("Line {line_no} of the index file {file_name} is not a `key offset length` triple: '{line}'")]
    /// A line of an index file can't be parsed into a (key, offset, length) triple
    MalformedIndex {
        /// name of the offending index file
        file_name: String,
        /// 1-based line number
        line_no: usize,
        /// the offending line
        line: String,
    },
    #[error("Keys in the index file {file_name} are not sorted or not unique near line {line_no}")]
    /// Index keys must be strictly increasing
    UnsortedIndex {
        file_name: String,
        line_no: usize,
    },
    #[error("Record {key} of {file_name} spans bytes {offset}..{end} but the data file has only {data_size} bytes")]
    /// A record range points outside the data file
    RecordOutsideData {
        file_name: String,
        key: u32,
        offset: u64,
        end: u64,
        data_size: u64,
    },
    #[error("The data file {file_name} does not end with a '\\0' record terminator")]
    /// Every record of a data file must be terminated, including the last one
    MissingTerminator {
        file_name: String,
    },
    #[error("Can't memory-map the data file {file_name}: {source}")]
    /// Memory-mapping a data file failed
    MmapFailed {
        file_name: String,
        source: std::io::Error,
    },
    #[error("The key {key} was written more than once")]
    /// Keys of a written database must be unique
    DuplicateKey {
        key: u32,
    },
    #[error("General I/O error occurred while processing a database")]
    /// I/O error occurred while reading or writing a database
    Io(#[from] std::io::Error),
}
