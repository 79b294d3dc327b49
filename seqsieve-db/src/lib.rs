//! Fixed-record on-disk stores used by every stage of the search pipeline.
//!
//! An indexed database is a pair of plain files: a *data* file of `'\0'`-terminated
//! records and an *index* file of `key offset length` triples sorted by key. This crate
//! provides:
//!  - [`DbReader`](crate::DbReader) with memory-mapped, zero-copy record access and
//!    four [`AccessMode`](crate::AccessMode)s controlling the record order,
//!  - [`DbWriter`](crate::DbWriter) building a database from per-thread append-only
//!    shards that are concatenated and re-indexed on close,
//!  - [`merge_databases()`](crate::merge_databases) which concatenates split results
//!    per key into a single database.
//!
//! Readers may be shared freely between threads once opened; each shard writer belongs
//! to exactly one thread.

mod errors;
mod merge;
mod reader;
mod writer;

pub use errors::DbError;
pub use merge::merge_databases;
pub use reader::{AccessMode, DbReader};
pub use writer::{DbWriter, ShardWriter};
