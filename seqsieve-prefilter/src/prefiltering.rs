use std::fs;
use std::sync::Mutex;

use log::{debug, info, warn};

use seqsieve_db::{merge_databases, AccessMode, DbError, DbReader, DbWriter};
use seqsieve_seq::scoring::{ExtendedSubstitutionMatrix, SubstitutionMatrix};
use seqsieve_seq::{Alphabet, KmerWindow, Sequence, ALPHABET_SIZE, MAX_KMER_SIZE};

use crate::calibration::calibrate_kmer_threshold;
use crate::errors::PrefilterError;
use crate::hit::write_hits;
use crate::index_table::IndexTable;
use crate::kmer_generator::{needs_three_mers, KmerGenerator};
use crate::matcher::QueryMatcher;
use crate::meta::{write_prefilter_meta, PrefilterMeta};
use crate::query_score::{CountScoreTable, DiagonalScoreTable};

/// How a database range is cut into independently processed splits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// split the target range; each split gets its own index table
    Target,
    /// split the query range; the full index is built once
    Query,
}

/// Immutable configuration of a prefilter run.
#[derive(Debug, Clone)]
pub struct PrefilterConfig {
    /// k-mer size; the engine default is 6, tests may go lower
    pub kmer_size: usize,
    /// use a spaced k-mer window instead of a contiguous one
    pub spaced: bool,
    /// spaced seed mask; `None` picks the default pattern for `kmer_size`
    pub spaced_mask: Option<String>,
    /// base k-mer similarity score; upper bound of the threshold calibration
    pub kmer_score: i32,
    /// sensitivity setting; higher finds more distant homologs and runs slower
    pub sensitivity: f64,
    /// calibrate the k-mer threshold against reversed queries instead of the static mapping
    pub calibrate: bool,
    /// queries sampled by the calibration
    pub calibration_sample: usize,
    /// seed of the calibration sample
    pub seed: u64,
    /// hits kept per query
    pub max_hits_per_query: usize,
    /// minimum accumulated score a hit must reach
    pub min_hit_score: u32,
    /// count matches per (target, diagonal) cell instead of summing scores per target
    pub diagonal_scoring: bool,
    /// subtract the per-query compositional background expectation
    pub bias_correction: bool,
    /// report the query itself when query and target databases are the same
    pub include_identical: bool,
    /// worker threads; 0 picks the number of cores
    pub threads: usize,
    /// split count; 0 chooses the smallest count that fits the memory budget
    pub split: usize,
    pub split_mode: SplitMode,
    /// peak memory budget in bytes
    pub max_memory: usize,
    /// NCBI-format substitution matrix file; `None` uses the embedded BLOSUM62
    pub matrix_file: Option<String>,
    /// extended-table entries kept per 2-mer
    pub top_n_2mers: usize,
    /// extended-table entries kept per 3-mer
    pub top_n_3mers: usize,
    /// rank of this process in a distributed run
    pub rank: usize,
    /// number of processes in a distributed run
    pub world_size: usize,
}

impl Default for PrefilterConfig {
    fn default() -> PrefilterConfig {
        PrefilterConfig {
            kmer_size: 6,
            spaced: true,
            spaced_mask: None,
            kmer_score: 30,
            sensitivity: 4.0,
            calibrate: false,
            calibration_sample: 100,
            seed: 42,
            max_hits_per_query: 300,
            min_hit_score: 1,
            diagonal_scoring: false,
            bias_correction: true,
            include_identical: false,
            threads: 1,
            split: 0,
            split_mode: SplitMode::Target,
            max_memory: 4 * 1024 * 1024 * 1024,
            matrix_file: None,
            top_n_2mers: ALPHABET_SIZE * ALPHABET_SIZE,
            top_n_3mers: 800,
            rank: 0,
            world_size: 1,
        }
    }
}

/// Static sensitivity mapping used when calibration is off: every sensitivity step
/// lowers the threshold by two score units below the base k-mer score.
pub fn kmer_threshold(sensitivity: f64, kmer_score: i32) -> i32 {
    kmer_score - (2.0 * sensitivity).round() as i32
}

/// Cuts `[0, weights.len())` into `world_size` contiguous ranges of approximately equal
/// total weight and returns the range owned by `rank`. Sequence lengths as weights give
/// every rank a comparable residue workload regardless of record count.
pub fn decompose_by_residues(weights: &[u64], rank: usize, world_size: usize) -> (usize, usize) {
    debug_assert!(rank < world_size);

    let n = weights.len();
    let total: u64 = weights.iter().sum();
    if total == 0 || world_size == 1 {
        // --- fall back to an even count decomposition
        let per_rank = n.div_ceil(world_size);
        return ((rank * per_rank).min(n), ((rank + 1) * per_rank).min(n));
    }

    let boundary = |r: usize| -> usize {
        if r == 0 { return 0; }
        if r >= world_size { return n; }
        let want = total as u128 * r as u128 / world_size as u128;
        let mut acc: u128 = 0;
        for (i, &w) in weights.iter().enumerate() {
            if acc >= want { return i; }
            acc += w as u128;
        }
        n
    };
    (boundary(rank), boundary(rank + 1))
}

/// The prefilter stage: builds the k-mer index over the target range, matches every
/// query against it in parallel and writes one result record per query.
///
/// # Example
/// ```no_run
/// use seqsieve_prefilter::{run_prefilter, PrefilterConfig};
/// let config = PrefilterConfig { kmer_size: 6, threads: 8, ..PrefilterConfig::default() };
/// run_prefilter("queries", "targets", "pref_results", &config).unwrap();
/// ```
pub fn run_prefilter(query_db: &str, target_db: &str, out_db: &str,
                     config: &PrefilterConfig) -> Result<(), PrefilterError> {

    validate(config)?;
    let threads = if config.threads == 0 { num_cpus::get() } else { config.threads };
    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()
        .map_err(|e| PrefilterError::InvalidConfig {
            reason: format!("can't build the worker pool: {}", e) })?;

    let matrix = match &config.matrix_file {
        Some(file) => SubstitutionMatrix::ncbi_matrix_from_file(file)?,
        None => SubstitutionMatrix::blosum62(),
    };
    let window = make_window(config)?;
    let alphabet = Alphabet::new();

    let qdbr = DbReader::open_db(query_db, AccessMode::NoSort)?;
    let tdbr = DbReader::open_db(target_db, AccessMode::NoSort)?;
    let same_db = query_db == target_db;
    info!("prefilter: {} queries against {} targets (k = {}, span = {})",
          qdbr.size(), tdbr.size(), window.k(), window.span());

    // ---------- this rank's share of the target range, weighted by residues
    let target_lengths: Vec<u64> = (0..tdbr.size()).map(|id| tdbr.length_at(id) as u64).collect();
    let (rank_from, rank_to) = decompose_by_residues(&target_lengths, config.rank, config.world_size);
    debug!("rank {}/{} owns targets {}..{}", config.rank, config.world_size, rank_from, rank_to);

    // ---------- extended similarity tables; built once, shared by every worker
    let two_mers = ExtendedSubstitutionMatrix::new(&matrix, 2, config.top_n_2mers);
    let three_mers = if needs_three_mers(window.k()) {
        Some(ExtendedSubstitutionMatrix::new(&matrix, 3, config.top_n_3mers))
    } else {
        None
    };
    let generator = KmerGenerator::new(window.k(), &two_mers, three_mers.as_ref());

    // ---------- too-short sequences are flagged once and skipped downstream
    let not_empty: Vec<bool> = (0..qdbr.size()).map(|id| qdbr.length_at(id) >= window.span()).collect();
    let empty = not_empty.iter().filter(|&&flag| !flag).count();
    if empty > 0 {
        warn!("{} query sequences are shorter than the k-mer window and will produce empty records", empty);
    }

    let splits = plan_splits(config, &window, &target_lengths, rank_from, rank_to,
                             qdbr.size(), threads)?;
    info!("running {} split(s) with {} threads", splits.len(), threads);

    let mut kmer_thr = if config.calibrate { None } else {
        Some(kmer_threshold(config.sensitivity, config.kmer_score))
    };

    let mut split_outputs: Vec<String> = Vec::new();
    for (i, split) in splits.iter().enumerate() {
        let index = IndexTable::build(&tdbr, &alphabet, &window, split.target_from, split.target_to);
        let thr = *kmer_thr.get_or_insert_with(|| {
            calibrate_kmer_threshold(&index, &qdbr, &alphabet, &window, &generator,
                                     config.calibration_sample, config.sensitivity,
                                     config.kmer_score, config.seed)
        });
        debug!("split {}: targets {}..{}, queries {}..{}, k-mer threshold {}",
               i, split.target_from, split.target_to, split.query_from, split.query_to, thr);

        let out_name = if splits.len() == 1 { out_db.to_string() }
                       else { format!("{}_tmp_split_{}", out_db, i) };
        run_split(&pool, &qdbr, split, &index, &generator, &window, &matrix, &alphabet,
                  &not_empty, thr, threads, same_db, config, &out_name)?;
        split_outputs.push(out_name);
    }

    if split_outputs.len() > 1 {
        merge_databases(out_db, &split_outputs)?;
        for name in &split_outputs {
            fs::remove_file(name)?;
            fs::remove_file(format!("{}.index", name))?;
        }
    }
    // --- record the scoring mode; the aligner must not trust count-mode diagonals
    write_prefilter_meta(out_db, &PrefilterMeta { diagonal_scoring: config.diagonal_scoring })
        .map_err(DbError::from)?;
    info!("prefilter finished: results in {}", out_db);

    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Split {
    target_from: usize,
    target_to: usize,
    query_from: usize,
    query_to: usize,
}

fn validate(config: &PrefilterConfig) -> Result<(), PrefilterError> {
    if config.kmer_size < 2 || config.kmer_size > MAX_KMER_SIZE {
        return Err(PrefilterError::InvalidConfig {
            reason: format!("k-mer size {} is outside 2..={}", config.kmer_size, MAX_KMER_SIZE) });
    }
    if config.world_size == 0 || config.rank >= config.world_size {
        return Err(PrefilterError::InvalidConfig {
            reason: format!("rank {} is outside a world of size {}", config.rank, config.world_size) });
    }
    if config.max_hits_per_query == 0 {
        return Err(PrefilterError::InvalidConfig {
            reason: "at least one hit per query must be allowed".to_string() });
    }
    Ok(())
}

fn make_window(config: &PrefilterConfig) -> Result<KmerWindow, PrefilterError> {
    if !config.spaced {
        return Ok(KmerWindow::contiguous(config.kmer_size)?);
    }
    let window = match &config.spaced_mask {
        Some(mask) => KmerWindow::spaced(mask)?,
        None => KmerWindow::default_spaced(config.kmer_size)?,
    };
    if window.k() != config.kmer_size {
        return Err(PrefilterError::InvalidConfig {
            reason: format!("the spaced mask has {} informative positions but the k-mer size is {}",
                            window.k(), config.kmer_size) });
    }
    Ok(window)
}

/// Picks the split count that keeps the peak memory below the budget and lays out the
/// split ranges. Target splitting shrinks both the index and the per-thread scratch;
/// query splitting bounds the result volume but not the memory, so it never runs with
/// an automatic split count above one.
fn plan_splits(config: &PrefilterConfig, window: &KmerWindow, target_lengths: &[u64],
               rank_from: usize, rank_to: usize, n_queries: usize,
               threads: usize) -> Result<Vec<Split>, PrefilterError> {

    let span = window.span() as u64;
    let rank_lengths = &target_lengths[rank_from..rank_to];
    let n_targets = rank_to - rank_from;
    let total_entries: u64 = rank_lengths.iter()
        .map(|&len| if len >= span { len - span + 1 } else { 0 })
        .sum();

    let extended_bytes = ALPHABET_SIZE.pow(2) * config.top_n_2mers * 8
        + if needs_three_mers(window.k()) { ALPHABET_SIZE.pow(3) * config.top_n_3mers * 8 } else { 0 };
    let memory_needed = |split: usize| -> usize {
        let split_targets = n_targets.div_ceil(split.max(1)).max(1);
        let split_entries = (total_entries as usize).div_ceil(split.max(1));
        let scratch = if config.diagonal_scoring {
            DiagonalScoreTable::memory_needed(split_targets)
        } else {
            CountScoreTable::memory_needed(split_targets)
        };
        IndexTable::memory_needed(split_entries, window.code_space())
            + threads * scratch + extended_bytes
    };

    let n_splits = match (config.split, config.split_mode) {
        (0, SplitMode::Target) => {
            let max_splits = n_targets.max(1);
            let mut chosen = None;
            for s in 1..=max_splits {
                if memory_needed(s) <= config.max_memory { chosen = Some(s); break; }
            }
            chosen.ok_or_else(|| PrefilterError::MemoryBudgetExceeded {
                required: memory_needed(max_splits), budget: config.max_memory })?
        }
        (0, SplitMode::Query) => {
            if memory_needed(1) > config.max_memory {
                return Err(PrefilterError::MemoryBudgetExceeded {
                    required: memory_needed(1), budget: config.max_memory });
            }
            1
        }
        (s, _) => {
            let per_split = match config.split_mode {
                SplitMode::Target => memory_needed(s),
                SplitMode::Query => memory_needed(1),
            };
            if per_split > config.max_memory {
                return Err(PrefilterError::MemoryBudgetExceeded {
                    required: per_split, budget: config.max_memory });
            }
            s
        }
    };
    debug!("split count {}: ~{} MB peak", n_splits, memory_needed(
        if config.split_mode == SplitMode::Target { n_splits } else { 1 }) / (1024 * 1024));

    let mut splits = Vec::with_capacity(n_splits);
    match config.split_mode {
        SplitMode::Target => {
            for s in 0..n_splits {
                let (from, to) = decompose_by_residues(rank_lengths, s, n_splits);
                splits.push(Split {
                    target_from: rank_from + from, target_to: rank_from + to,
                    query_from: 0, query_to: n_queries,
                });
            }
        }
        SplitMode::Query => {
            let per_split = n_queries.div_ceil(n_splits.max(1)).max(1);
            for s in 0..n_splits {
                splits.push(Split {
                    target_from: rank_from, target_to: rank_to,
                    query_from: (s * per_split).min(n_queries),
                    query_to: ((s + 1) * per_split).min(n_queries),
                });
            }
        }
    }

    Ok(splits)
}

#[allow(clippy::too_many_arguments)]
fn run_split(pool: &rayon::ThreadPool, qdbr: &DbReader, split: &Split, index: &IndexTable,
             generator: &KmerGenerator<'_>, window: &KmerWindow, matrix: &SubstitutionMatrix,
             alphabet: &Alphabet, not_empty: &[bool], kmer_thr: i32, threads: usize,
             same_db: bool, config: &PrefilterConfig, out_name: &str) -> Result<(), PrefilterError> {

    let n_queries = split.query_to - split.query_from;
    let mut writer = DbWriter::open_db(out_name, threads)?;
    let chunk = n_queries.div_ceil(threads.max(1)).max(1);
    let failure: Mutex<Option<PrefilterError>> = Mutex::new(None);

    pool.scope(|scope| {
        for (t, shard) in writer.shards_mut().iter_mut().enumerate() {
            let from = split.query_from + (t * chunk).min(n_queries);
            let to = split.query_from + ((t + 1) * chunk).min(n_queries);
            let failure = &failure;
            scope.spawn(move |_| {
                let mut matcher = QueryMatcher::new(index, generator, window, matrix, kmer_thr,
                                                    config.max_hits_per_query, config.min_hit_score,
                                                    config.bias_correction, config.diagonal_scoring);
                let mut record = Vec::new();
                for qid in from..to {
                    let key = qdbr.key_at(qid);
                    let hits = if not_empty[qid] {
                        let query = Sequence::from_payload(key, qdbr.entry(qid), alphabet);
                        let exclude = if same_db && !config.include_identical { Some(key) } else { None };
                        matcher.match_query(&query, exclude)
                    } else {
                        Vec::new()
                    };
                    write_hits(&mut record, &hits);
                    if let Err(e) = shard.write_record(key, &record) {
                        *failure.lock().unwrap() = Some(PrefilterError::Db(e));
                        return;
                    }
                }
            });
        }
    });

    if let Some(error) = failure.into_inner().unwrap() {
        return Err(error);
    }
    writer.close()?;
    debug!("split written to {}", out_name);

    Ok(())
}
