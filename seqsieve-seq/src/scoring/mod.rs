//! Substitution machinery: residue scoring matrices and extended w-mer similarity tables.

mod extended_matrix;
mod substitution_matrix;

pub use extended_matrix::ExtendedSubstitutionMatrix;
pub use substitution_matrix::{KarlinAltschul, SubstitutionMatrix};
