use thiserror::Error;

use seqsieve_db::DbError;
use seqsieve_seq::ScoringError;

#[derive(Debug, Error)]
#[non_exhaustive]
/// Errors that may be thrown while aligning prefilter candidates
pub enum AlignError {
    #[error("Invalid alignment configuration: {reason}")]
    /// The alignment configuration is contradictory or out of range
    InvalidConfig {
        /// what exactly is wrong
        reason: String,
    },
    #[error("The key {key} from a result record does not exist in the database {db_name}")]
    /// A result record references a sequence that the database does not hold
    MissingSequence {
        /// database that was searched
        db_name: String,
        /// the unresolvable key
        key: u32,
    },
    #[error("Database error in the alignment stage")]
    /// A database could not be opened, read or written
    Db(#[from] DbError),
    #[error("Scoring error in the alignment stage")]
    /// A substitution matrix could not be loaded
    Scoring(#[from] ScoringError),
}
