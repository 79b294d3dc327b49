use tempfile::TempDir;

use seqsieve_align::{run_alignment, AlignConfig, AlignError};
use seqsieve_db::{AccessMode, DbReader, DbWriter};
use seqsieve_prefilter::{run_prefilter, PrefilterConfig};

fn write_db(dir: &TempDir, name: &str, records: &[(u32, &[u8])]) -> String {
    let db = dir.path().join(name).to_str().unwrap().to_string();
    let mut writer = DbWriter::open_db(&db, 1).unwrap();
    for (key, data) in records {
        writer.shards_mut()[0].write_record(*key, data).unwrap();
    }
    writer.close().unwrap();
    db
}

fn prefilter_config() -> PrefilterConfig {
    PrefilterConfig {
        kmer_size: 4,
        spaced: false,
        kmer_score: 24,
        bias_correction: false,
        max_hits_per_query: 1000,
        ..PrefilterConfig::default()
    }
}

fn permissive_align_config() -> AlignConfig {
    AlignConfig { max_evalue: 1.0e9, ..AlignConfig::default() }
}

#[test]
fn tiny_pipeline_accepts_the_identical_target() {

    let dir = TempDir::new().unwrap();
    let queries = write_db(&dir, "q", &[(1, b"AAAA")]);
    let targets = write_db(&dir, "t", &[(10, b"AAAA"), (20, b"CCCC")]);
    let pref = dir.path().join("pref").to_str().unwrap().to_string();
    let aln = dir.path().join("aln").to_str().unwrap().to_string();

    run_prefilter(&queries, &targets, &pref, &prefilter_config()).unwrap();
    run_alignment(&queries, &targets, &pref, &aln, &permissive_align_config()).unwrap();

    let reader = DbReader::open_db(&aln, AccessMode::NoSort).unwrap();
    let record = String::from_utf8(reader.get(1).unwrap().to_vec()).unwrap();
    let lines: Vec<&str> = record.lines().collect();
    assert_eq!(lines.len(), 1);

    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(fields[0], "10");
    // --- identity 1.000, full-length coordinates and an all-match backtrace
    assert_eq!(fields[2], "1.000");
    assert_eq!(&fields[4..9], &["0", "3", "0", "3", "4"]);
    assert_eq!(fields[9], "MMMM");
}

#[test]
fn empty_prefilter_records_stay_empty() {

    let dir = TempDir::new().unwrap();
    let queries = write_db(&dir, "q", &[(1, b"AAAA")]);
    let targets = write_db(&dir, "t", &[(10, b"WWWW")]);
    let pref = dir.path().join("pref").to_str().unwrap().to_string();
    let aln = dir.path().join("aln").to_str().unwrap().to_string();

    run_prefilter(&queries, &targets, &pref, &prefilter_config()).unwrap();
    run_alignment(&queries, &targets, &pref, &aln, &permissive_align_config()).unwrap();

    let reader = DbReader::open_db(&aln, AccessMode::NoSort).unwrap();
    assert_eq!(reader.get(1).unwrap(), b"");
}

#[test]
fn accepted_alignments_stop_at_the_cap() {

    let dir = TempDir::new().unwrap();
    let queries = write_db(&dir, "q", &[(1, b"MKTIIALSY")]);
    let mut target_records: Vec<(u32, Vec<u8>)> = Vec::new();
    for key in 0..20u32 {
        target_records.push((key + 10, b"MKTIIALSY".to_vec()));
    }
    let borrowed: Vec<(u32, &[u8])> = target_records.iter()
        .map(|(key, data)| (*key, data.as_slice()))
        .collect();
    let targets = write_db(&dir, "t", &borrowed);
    let pref = dir.path().join("pref").to_str().unwrap().to_string();
    let aln = dir.path().join("aln").to_str().unwrap().to_string();

    run_prefilter(&queries, &targets, &pref, &prefilter_config()).unwrap();

    let config = AlignConfig { max_accept: 5, max_rejected: 3, ..permissive_align_config() };
    run_alignment(&queries, &targets, &pref, &aln, &config).unwrap();

    let reader = DbReader::open_db(&aln, AccessMode::NoSort).unwrap();
    let record = String::from_utf8(reader.get(1).unwrap().to_vec()).unwrap();
    assert_eq!(record.lines().count(), 5);
}

#[test]
fn rejections_stop_a_hopeless_query() {

    let dir = TempDir::new().unwrap();
    let queries = write_db(&dir, "q", &[(1, b"MKTIIALSY")]);
    let targets = write_db(&dir, "t", &[
        (10, b"MKTIIALSY"), (11, b"MKTIIALSY"), (12, b"MKTIIALSY"), (13, b"MKTIIALSY"),
    ]);
    let pref = dir.path().join("pref").to_str().unwrap().to_string();
    let aln = dir.path().join("aln").to_str().unwrap().to_string();

    run_prefilter(&queries, &targets, &pref, &prefilter_config()).unwrap();

    // --- an unreachable score threshold rejects everything; the walk stops after two
    let config = AlignConfig { min_score: 1_000_000, max_rejected: 2,
                               ..permissive_align_config() };
    run_alignment(&queries, &targets, &pref, &aln, &config).unwrap();

    let reader = DbReader::open_db(&aln, AccessMode::NoSort).unwrap();
    assert_eq!(reader.get(1).unwrap(), b"");
}

#[test]
fn unknown_target_keys_are_fatal() {

    let dir = TempDir::new().unwrap();
    let queries = write_db(&dir, "q", &[(1, b"AAAA")]);
    let targets = write_db(&dir, "t", &[(10, b"AAAA")]);
    // --- a prefilter record referencing a key the target database does not hold
    let pref = write_db(&dir, "pref", &[(1, b"999\t16\t0\n")]);
    let aln = dir.path().join("aln").to_str().unwrap().to_string();

    let result = run_alignment(&queries, &targets, &pref, &aln, &permissive_align_config());
    match result {
        Err(AlignError::MissingSequence { key, .. }) => assert_eq!(key, 999),
        other => panic!("expected MissingSequence, got {:?}", other.err()),
    }
}

#[test]
fn banding_falls_back_to_a_wide_band_for_count_mode_results() {

    let dir = TempDir::new().unwrap();
    let queries = write_db(&dir, "q", &[(1, b"MKTIIALSY")]);
    // --- the homolog sits four residues in; count-mode hits report diagonal 0
    let targets = write_db(&dir, "t", &[(10, b"GGGGMKTIIALSY")]);
    let pref = dir.path().join("pref").to_str().unwrap().to_string();
    let aln = dir.path().join("aln").to_str().unwrap().to_string();

    let mut pconfig = prefilter_config();
    pconfig.kmer_score = 22;
    run_prefilter(&queries, &targets, &pref, &pconfig).unwrap();

    // --- a band of width 1 around diagonal 0 would miss the alignment entirely;
    //     the metadata downgrades the request to a wide band
    let config = AlignConfig { banded: true, band_half_width: 1, ..permissive_align_config() };
    run_alignment(&queries, &targets, &pref, &aln, &config).unwrap();

    let reader = DbReader::open_db(&aln, AccessMode::NoSort).unwrap();
    let record = String::from_utf8(reader.get(1).unwrap().to_vec()).unwrap();
    let fields: Vec<&str> = record.lines().next().unwrap().split('\t').collect();
    assert_eq!(&fields[4..9], &["0", "8", "4", "12", "9"]);
}

#[test]
fn banded_alignment_uses_the_prefilter_diagonal() {

    let dir = TempDir::new().unwrap();
    let queries = write_db(&dir, "q", &[(1, b"MKTIIALSY")]);
    let targets = write_db(&dir, "t", &[(10, b"GGMKTIIALSY")]);
    let pref = dir.path().join("pref").to_str().unwrap().to_string();
    let aln = dir.path().join("aln").to_str().unwrap().to_string();

    let mut pconfig = prefilter_config();
    pconfig.kmer_score = 22;
    pconfig.diagonal_scoring = true;
    run_prefilter(&queries, &targets, &pref, &pconfig).unwrap();

    let config = AlignConfig { banded: true, band_half_width: 2, ..permissive_align_config() };
    run_alignment(&queries, &targets, &pref, &aln, &config).unwrap();

    let reader = DbReader::open_db(&aln, AccessMode::NoSort).unwrap();
    let record = String::from_utf8(reader.get(1).unwrap().to_vec()).unwrap();
    let fields: Vec<&str> = record.lines().next().unwrap().split('\t').collect();
    // --- the full-length alignment sits two residues into the target
    assert_eq!(&fields[4..9], &["0", "8", "2", "10", "9"]);
}
