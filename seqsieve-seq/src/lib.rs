//! Sequences over a reduced residue alphabet, k-mer iteration and substitution machinery.
//!
//! This crate provides the sequence-level building blocks of the search pipeline:
//!  - [`Alphabet`](crate::Alphabet) maps raw ASCII residues to the 20+1 letter reduced
//!    alphabet and back,
//!  - [`Sequence`](crate::Sequence) stores a database sequence as alphabet codes
//!    together with its database key,
//!  - [`KmerWindow`](crate::KmerWindow) and [`KmerIterator`](crate::KmerIterator)
//!    enumerate contiguous or spaced k-mer codes with collision-free base-21 packing,
//!  - [`SubstitutionMatrix`](crate::scoring::SubstitutionMatrix) loads NCBI-format
//!    scoring matrices (BLOSUM62 embedded) with Karlin-Altschul metadata, and
//!    [`ExtendedSubstitutionMatrix`](crate::scoring::ExtendedSubstitutionMatrix) keeps
//!    the top-N most similar 2-mers and 3-mers per code.

mod alphabet;
mod errors;
mod kmer;
pub mod scoring;
mod sequence;

pub use alphabet::{Alphabet, ALPHABET_SIZE, ANY_RESIDUE};
pub use errors::{ScoringError, SequenceError};
pub use kmer::{overlapping_kmers, KmerIterator, KmerWindow, MAX_KMER_SIZE};
pub use sequence::Sequence;
