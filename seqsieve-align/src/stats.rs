use seqsieve_seq::scoring::KarlinAltschul;

/// Turns a raw alignment score into a bit score: `(λ·S − ln K) / ln 2`.
pub fn bit_score(ka: KarlinAltschul, raw_score: i32) -> f64 {
    (ka.lambda * raw_score as f64 - ka.k.ln()) / std::f64::consts::LN_2
}

/// Expectation value of a raw score against a search space of `query_length` times the
/// total residue count of the target database: `K·m·N·exp(−λ·S)`.
pub fn e_value(ka: KarlinAltschul, raw_score: i32, query_length: usize, db_residues: u64) -> f64 {
    ka.k * query_length as f64 * db_residues as f64 * (-ka.lambda * raw_score as f64).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOSUM62_KA: KarlinAltschul = KarlinAltschul { lambda: 0.267, k: 0.041 };

    #[test]
    fn higher_raw_scores_give_higher_bits_and_lower_evalues() {
        let weak = bit_score(BLOSUM62_KA, 20);
        let strong = bit_score(BLOSUM62_KA, 60);
        assert!(strong > weak);

        let weak_e = e_value(BLOSUM62_KA, 20, 100, 1_000_000);
        let strong_e = e_value(BLOSUM62_KA, 60, 100, 1_000_000);
        assert!(strong_e < weak_e);
        assert!(strong_e > 0.0);
    }

    #[test]
    fn evalue_scales_with_the_search_space() {
        let small = e_value(BLOSUM62_KA, 40, 100, 1_000);
        let large = e_value(BLOSUM62_KA, 40, 100, 1_000_000);
        assert!((large / small - 1000.0).abs() < 1e-6);
    }
}
