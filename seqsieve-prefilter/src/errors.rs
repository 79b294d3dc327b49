use thiserror::Error;

use seqsieve_db::DbError;
use seqsieve_seq::{ScoringError, SequenceError};

#[derive(Debug, Error)]
#[non_exhaustive]
/// Errors that may be thrown while building the k-mer index or running the prefilter
pub enum PrefilterError {
    #[error("Invalid prefilter configuration: {reason}")]
    /// The prefilter configuration is contradictory or out of range
    InvalidConfig {
        /// what exactly is wrong
        reason: String,
    },
    #[error("The prefilter needs at least {required} bytes of memory even at the maximum split count, but the budget is {budget} bytes")]
    /// No split count satisfies the memory budget
    MemoryBudgetExceeded {
        /// bytes needed at the maximum split count
        required: usize,
        /// configured budget in bytes
        budget: usize,
    },
    #[error("Database error in the prefilter stage")]
    /// A database could not be opened, read or written
    Db(#[from] DbError),
    #[error("Sequence error in the prefilter stage")]
    /// A k-mer window could not be constructed
    Sequence(#[from] SequenceError),
    #[error("Scoring error in the prefilter stage")]
    /// A substitution matrix could not be loaded
    Scoring(#[from] ScoringError),
    #[error("General I/O error occurred in the prefilter stage")]
    /// I/O error occurred while reading or writing prefilter artifacts
    Io(#[from] std::io::Error),
}
