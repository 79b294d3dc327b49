use displaydoc::Display;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
/// Errors that may be thrown while encoding sequences or iterating k-mers
pub enum SequenceError {
    #[error("The k-mer size {k} is outside the supported range 1..={max}")]
    /// The k-mer size {k} is outside the supported range
    KmerSizeOutOfRange {
        /// requested k-mer size
        k: usize,
        /// largest supported k-mer size
        max: usize,
    },
    #[error("The spaced seed mask '{mask}' is invalid: {reason}")]
    /// The spaced seed mask {mask} is invalid
    InvalidSpacedMask {
        /// the offending mask string
        mask: String,
        /// what exactly is wrong with it
        reason: String,
    },
    #[error("General I/O error occurred while reading a sequence file")]
    /// I/O error occurred while reading a sequence file
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Display, PartialEq)]
#[non_exhaustive]
/// Errors that may be thrown while loading or using a substitution matrix
pub enum ScoringError {
    /// The file: {file_name} can't be opened for reading
    FileNotFound {
        /// name of the missing file
        file_name: String,
    },
    /// Reading error occurred while reading a substitution matrix
    ReadingError,
    /// The following line of a NCBI matrix file is not formatted correctly: {line}
    IncorrectNCBIFormat {
        /// the incorrectly formatted line that broke the code
        line: String,
    },
    /// The following entry: {value} found in line can't be parsed to i16 type; the problematic line was: {line}
    CantParseNCBIEntry {
        /// the incorrectly formatted line that broke the code
        line: String,
        value: String,
    },
}
