use tempfile::TempDir;

use seqsieve_db::{AccessMode, DbReader, DbWriter};
use seqsieve_prefilter::{calibrate_kmer_threshold, IndexTable, KmerGenerator};
use seqsieve_seq::scoring::{ExtendedSubstitutionMatrix, SubstitutionMatrix};
use seqsieve_seq::{Alphabet, KmerWindow, ALPHABET_SIZE};

fn write_db(dir: &TempDir, name: &str, records: &[(u32, &[u8])]) -> String {
    let db = dir.path().join(name).to_str().unwrap().to_string();
    let mut writer = DbWriter::open_db(&db, 1).unwrap();
    for (key, data) in records {
        writer.shards_mut()[0].write_record(*key, data).unwrap();
    }
    writer.close().unwrap();
    db
}

#[test]
fn calibration_is_deterministic_for_a_fixed_seed() {

    let dir = TempDir::new().unwrap();
    let queries = write_db(&dir, "q", &[
        (1, b"MKTIIALSYIFCLVFA"), (2, b"AAAAAAAAAAAA"), (3, b"IALSYMKTIWWHH"),
        (4, b"DDEEKKRRHHNNQQ"), (5, b"GGPPSSTTCCVV"),
    ]);
    let targets = write_db(&dir, "t", &[
        (10, b"MKTIIALSYIFCLVFA"), (11, b"AAAAAAAAAAAA"), (12, b"WWHHIALSYMKTI"),
        (13, b"QQNNHHRRKKEEDD"), (14, b"VVCCTTSSPPGG"),
    ]);

    let qdbr = DbReader::open_db(&queries, AccessMode::NoSort).unwrap();
    let tdbr = DbReader::open_db(&targets, AccessMode::NoSort).unwrap();
    let alphabet = Alphabet::new();
    let window = KmerWindow::contiguous(4).unwrap();
    let matrix = SubstitutionMatrix::blosum62();
    let two = ExtendedSubstitutionMatrix::new(&matrix, 2, ALPHABET_SIZE * ALPHABET_SIZE);
    let generator = KmerGenerator::new(4, &two, None);
    let index = IndexTable::build(&tdbr, &alphabet, &window, 0, tdbr.size());

    let first = calibrate_kmer_threshold(&index, &qdbr, &alphabet, &window, &generator,
                                         4, 4.0, 24, 42);
    let second = calibrate_kmer_threshold(&index, &qdbr, &alphabet, &window, &generator,
                                          4, 4.0, 24, 42);
    assert_eq!(first, second);
    assert!(first >= 1 && first <= 24);

    // --- a higher sensitivity never raises the calibrated threshold
    let sensitive = calibrate_kmer_threshold(&index, &qdbr, &alphabet, &window, &generator,
                                             4, 7.5, 24, 42);
    assert!(sensitive <= first);
}
