use std::sync::Mutex;

use log::{debug, info, warn};

use seqsieve_db::{AccessMode, DbReader, DbWriter};
use seqsieve_prefilter::{parse_hits, read_prefilter_meta};
use seqsieve_seq::scoring::SubstitutionMatrix;
use seqsieve_seq::Alphabet;

use crate::banded::BandedAligner;
use crate::errors::AlignError;
use crate::result::{write_results, AlignmentResult};
use crate::stats::{bit_score, e_value};

/// Immutable configuration of an alignment run.
#[derive(Debug, Clone)]
pub struct AlignConfig {
    /// cost of opening a gap (covers its first position); negative
    pub gap_open: i32,
    /// cost of every further gap position; negative
    pub gap_extend: i32,
    /// center the band on the prefilter diagonal; off means a full-width band.
    /// Honored only when the prefilter metadata confirms diagonal scoring, because
    /// count-mode hits all report diagonal 0
    pub banded: bool,
    /// diagonals on each side of the band center
    pub band_half_width: usize,
    /// stop a query after this many accepted alignments
    pub max_accept: usize,
    /// stop a query after this many rejected alignments
    pub max_rejected: usize,
    /// acceptance thresholds
    pub min_score: i32,
    pub min_seq_id: f64,
    pub min_coverage: f64,
    pub max_evalue: f64,
    /// keep the `M`/`I`/`D` backtrace in the result records
    pub with_backtrace: bool,
    /// worker threads; 0 picks the number of cores
    pub threads: usize,
    /// NCBI-format substitution matrix file; `None` uses the embedded BLOSUM62
    pub matrix_file: Option<String>,
}

impl Default for AlignConfig {
    fn default() -> AlignConfig {
        AlignConfig {
            gap_open: -11,
            gap_extend: -1,
            banded: false,
            band_half_width: 16,
            max_accept: 300,
            max_rejected: usize::MAX,
            min_score: 0,
            min_seq_id: 0.0,
            min_coverage: 0.0,
            max_evalue: 1.0e-3,
            with_backtrace: true,
            threads: 1,
            matrix_file: None,
        }
    }
}

/// The alignment stage: for every query, walks its prefilter hits in rank order, runs
/// banded Smith-Waterman against each target and writes the accepted alignments.
///
/// Per query two counters bound the work: an alignment passing all thresholds counts as
/// accepted, any other as rejected, and the walk stops as soon as `max_accept` or
/// `max_rejected` is reached, so a query never costs more than
/// `max_accept + max_rejected` alignments.
///
/// # Example
/// ```no_run
/// use seqsieve_align::{run_alignment, AlignConfig};
/// let config = AlignConfig { max_accept: 100, threads: 8, ..AlignConfig::default() };
/// run_alignment("queries", "targets", "pref_results", "alignments", &config).unwrap();
/// ```
pub fn run_alignment(query_db: &str, target_db: &str, prefilter_db: &str, out_db: &str,
                     config: &AlignConfig) -> Result<(), AlignError> {

    if config.gap_open >= 0 || config.gap_extend >= 0 {
        return Err(AlignError::InvalidConfig {
            reason: "gap penalties must be negative".to_string() });
    }
    if config.max_accept == 0 {
        return Err(AlignError::InvalidConfig {
            reason: "at least one accepted alignment must be allowed".to_string() });
    }
    let threads = if config.threads == 0 { num_cpus::get() } else { config.threads };
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()
        .map_err(|e| AlignError::InvalidConfig {
            reason: format!("can't build the worker pool: {}", e) })?;

    let matrix = match &config.matrix_file {
        Some(file) => SubstitutionMatrix::ncbi_matrix_from_file(file)?,
        None => SubstitutionMatrix::blosum62(),
    };
    let alphabet = Alphabet::new();

    // --- banding is only sound when the upstream run produced real diagonals
    let banded = if config.banded {
        match read_prefilter_meta(prefilter_db) {
            Some(meta) if meta.diagonal_scoring => true,
            Some(_) => {
                warn!("the prefilter ran without diagonal scoring; using a wide band \
                       instead of the requested banding");
                false
            }
            None => {
                warn!("no prefilter metadata next to {}; using a wide band instead of \
                       the requested banding", prefilter_db);
                false
            }
        }
    } else {
        false
    };

    let qdbr = DbReader::open_db(query_db, AccessMode::NoSort)?;
    let tdbr = DbReader::open_db(target_db, AccessMode::NoSort)?;
    let pref = DbReader::open_db(prefilter_db, AccessMode::LinearAccess)?;
    let db_residues = tdbr.total_residues();
    info!("aligning candidates of {} queries against {} target residues",
          pref.size(), db_residues);

    let n_records = pref.size();
    let mut writer = DbWriter::open_db(out_db, threads)?;
    let chunk = n_records.div_ceil(threads.max(1)).max(1);
    let failure: Mutex<Option<AlignError>> = Mutex::new(None);

    pool.scope(|scope| {
        for (t, shard) in writer.shards_mut().iter_mut().enumerate() {
            let from = (t * chunk).min(n_records);
            let to = ((t + 1) * chunk).min(n_records);
            let failure = &failure;
            let matrix = &matrix;
            let alphabet = &alphabet;
            let qdbr = &qdbr;
            let tdbr = &tdbr;
            let pref = &pref;
            scope.spawn(move |_| {
                let mut aligner = BandedAligner::new(matrix, config.gap_open, config.gap_extend);
                let mut record = Vec::new();
                for id in from..to {
                    let query_key = pref.key_at(id);
                    match align_one_query(&mut aligner, matrix, alphabet, qdbr, tdbr,
                                          query_key, pref.entry(id), db_residues, banded,
                                          config) {
                        Ok(results) => {
                            write_results(&mut record, &results);
                            if let Err(e) = shard.write_record(query_key, &record) {
                                *failure.lock().unwrap() = Some(AlignError::Db(e));
                                return;
                            }
                        }
                        Err(e) => {
                            *failure.lock().unwrap() = Some(e);
                            return;
                        }
                    }
                }
            });
        }
    });

    if let Some(error) = failure.into_inner().unwrap() {
        return Err(error);
    }
    writer.close()?;
    info!("alignment finished: results in {}", out_db);

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn align_one_query(aligner: &mut BandedAligner<'_>, matrix: &SubstitutionMatrix,
                   alphabet: &Alphabet, qdbr: &DbReader, tdbr: &DbReader, query_key: u32,
                   prefilter_record: &[u8], db_residues: u64, banded: bool,
                   config: &AlignConfig) -> Result<Vec<AlignmentResult>, AlignError> {

    let hits = parse_hits(prefilter_record);
    if hits.is_empty() { return Ok(Vec::new()); }

    let query_raw = qdbr.get(query_key).ok_or_else(|| AlignError::MissingSequence {
        db_name: qdbr.data_name().to_string(), key: query_key })?;
    let query = alphabet.encode(query_raw);
    let ka = matrix.ka();

    let mut results = Vec::new();
    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for hit in &hits {
        if accepted >= config.max_accept || rejected >= config.max_rejected { break; }

        let target_raw = tdbr.get(hit.target_key).ok_or_else(|| AlignError::MissingSequence {
            db_name: tdbr.data_name().to_string(), key: hit.target_key })?;
        let target = alphabet.encode(target_raw);

        let (center, half_width) = if banded {
            (hit.signed_diagonal(), config.band_half_width)
        } else {
            (0, query.len().max(target.len()))
        };
        let alignment = aligner.align(&query, &target, center, half_width);

        let passed = match &alignment {
            None => false,
            Some(alignment) => {
                let evalue = e_value(ka, alignment.score, query.len(), db_residues);
                let result = AlignmentResult::from_alignment(
                    hit.target_key, alignment, bit_score(ka, alignment.score), evalue,
                    query.len(), target.len(), config.with_backtrace);
                let ok = alignment.score >= config.min_score
                    && result.seq_identity >= config.min_seq_id
                    && result.query_coverage >= config.min_coverage
                    && result.target_coverage >= config.min_coverage
                    && evalue <= config.max_evalue;
                if ok { results.push(result); }
                ok
            }
        };
        if passed { accepted += 1; } else { rejected += 1; }
    }
    debug!("query {}: {} candidates, {} accepted, {} rejected",
           query_key, hits.len(), accepted, rejected);

    Ok(results)
}
