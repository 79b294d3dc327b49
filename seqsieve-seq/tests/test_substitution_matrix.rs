use seqsieve_seq::scoring::{ExtendedSubstitutionMatrix, SubstitutionMatrix};
use seqsieve_seq::{Alphabet, ScoringError, ALPHABET_SIZE, ANY_RESIDUE};

#[test]
fn blosum62_well_known_entries() {

    let m = SubstitutionMatrix::blosum62();
    assert_eq!(m.score_by_aa(b'A', b'A'), 4);
    assert_eq!(m.score_by_aa(b'W', b'W'), 11);
    assert_eq!(m.score_by_aa(b'W', b'A'), -3);
    assert_eq!(m.score_by_aa(b'R', b'K'), 2);
    assert_eq!(m.score_by_aa(b'X', b'X'), -1);
    assert_eq!(m.score_by_aa(b'A', b'X'), 0);
}

#[test]
fn matrix_is_symmetric_and_self_scores_dominate() {

    let m = SubstitutionMatrix::blosum62();
    for i in 0..ALPHABET_SIZE as u8 {
        for j in 0..ALPHABET_SIZE as u8 {
            assert_eq!(m.score_by_index(i, j), m.score_by_index(j, i));
            if i != ANY_RESIDUE && j != ANY_RESIDUE {
                assert!(m.score_by_index(i, i) >= m.score_by_index(i, j),
                        "self-similarity of {} must dominate", i);
            }
        }
    }
}

#[test]
fn kmer_similarity_is_a_positional_sum() {

    let m = SubstitutionMatrix::blosum62();
    let alphabet = Alphabet::new();
    let a = alphabet.encode(b"MKT");
    let b = alphabet.encode(b"MRT");
    let expected = (m.score_by_aa(b'M', b'M') + m.score_by_aa(b'K', b'R')
        + m.score_by_aa(b'T', b'T')) as i32;
    assert_eq!(m.score_codes(&a, &b), expected);
}

#[test]
fn truncated_ncbi_file_is_rejected() {

    let broken = "   A  R  N\nA  4 -1 -2\n";
    let result = SubstitutionMatrix::ncbi_matrix_from_buffer(broken.as_bytes());
    assert!(matches!(result, Err(ScoringError::IncorrectNCBIFormat { .. })));
}

#[test]
fn extended_table_rows_are_sorted_and_self_first() {

    let m = SubstitutionMatrix::blosum62();
    let table = ExtendedSubstitutionMatrix::new(&m, 2, 50);
    let alphabet = Alphabet::new();
    let wg = alphabet.encode(b"WG");
    let code = wg[0] as usize * ALPHABET_SIZE + wg[1] as usize;

    let row = table.similar(code);
    assert_eq!(row.len(), 50);
    assert_eq!(row[0].0 as usize, code);
    assert_eq!(row[0].1 as i32, m.score_codes(&wg, &wg));
    for pair in row.windows(2) {
        assert!(pair[0].1 >= pair[1].1);
    }
}
