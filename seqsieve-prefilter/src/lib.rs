//! The k-mer prefilter: fast candidate selection before alignment.
//!
//! For every query the prefilter enumerates the targets sharing enough similar k-mers
//! and scores them by accumulation, either summing k-mer similarities per target or
//! counting matches per (target, diagonal) cell. The stage is built from:
//!  - [`IndexTable`](crate::IndexTable), the inverted k-mer index over one target split,
//!  - [`KmerGenerator`](crate::KmerGenerator), which expands a query k-mer into all
//!    sufficiently similar k-mers via the extended substitution tables,
//!  - [`QueryMatcher`](crate::QueryMatcher), the per-thread hot loop,
//!  - [`calibrate_kmer_threshold()`](crate::calibrate_kmer_threshold), the deterministic
//!    threshold calibration against reversed queries,
//!  - [`run_prefilter()`](crate::run_prefilter), the driver: memory-driven split
//!    planning, parallel matching, one result record per query.

mod calibration;
mod errors;
mod hit;
mod index_table;
mod kmer_generator;
mod matcher;
mod meta;
mod prefiltering;
mod query_score;

pub use calibration::calibrate_kmer_threshold;
pub use errors::PrefilterError;
pub use hit::{parse_hits, write_hits, Hit};
pub use meta::{read_prefilter_meta, write_prefilter_meta, PrefilterMeta};
pub use index_table::{IndexEntry, IndexTable};
pub use kmer_generator::{fragment_widths, needs_three_mers, KmerGenerator};
pub use matcher::{composition_bias, QueryMatcher, ScoreTable};
pub use prefiltering::{decompose_by_residues, kmer_threshold, run_prefilter,
                       PrefilterConfig, SplitMode};
pub use query_score::{CountScoreTable, DiagonalScoreTable};
