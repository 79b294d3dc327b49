//! Gapped local alignment of the candidates that survived the prefilter.
//!
//! The stage provides:
//!  - [`BandedAligner`](crate::BandedAligner), banded Smith-Waterman with affine gap
//!    costs and a compact `M`/`I`/`D` backtrace,
//!  - [`bit_score()`](crate::bit_score) and [`e_value()`](crate::e_value), the Karlin-
//!    Altschul statistics derived from the scoring matrix metadata,
//!  - [`run_alignment()`](crate::run_alignment), the driver walking every query's hit
//!    list in prefilter rank order under the accept/reject caps and writing one
//!    alignment record per query.

mod alignment;
mod banded;
mod errors;
mod result;
mod stats;

pub use alignment::{run_alignment, AlignConfig};
pub use banded::{BandedAligner, LocalAlignment};
pub use errors::AlignError;
pub use result::{write_results, AlignmentResult};
pub use stats::{bit_score, e_value};
