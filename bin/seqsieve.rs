use std::env;

use clap::{Parser, Subcommand};
use log::error;

use seqsieve_align::{run_alignment, AlignConfig};
use seqsieve_db::merge_databases;
use seqsieve_prefilter::{run_prefilter, PrefilterConfig, SplitMode};

mod stats;
use stats::{result2stats, Statistic};

#[derive(Parser)]
#[clap(name = "seqsieve", version, author)]
#[clap(about = "Many-against-many protein sequence search", long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
    /// be more verbose and log program actions on the screen
    #[clap(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Select candidate targets for every query with the k-mer prefilter
    Prefilter(PrefilterArgs),
    /// Align every query to its prefilter candidates with banded Smith-Waterman
    Align(AlignArgs),
    /// Merge split result databases into one, concatenating records per key
    Mergedbs(MergedbsArgs),
    /// Compute one statistic per result record
    Result2stats(StatsArgs),
}

#[derive(Parser, Debug)]
struct PrefilterArgs {
    /// query sequence database
    query_db: String,
    /// target sequence database
    target_db: String,
    /// prefilter result database to create
    out_db: String,
    /// k-mer size
    #[clap(short = 'k', long, default_value = "6")]
    kmer_size: usize,
    /// use a contiguous k-mer window instead of a spaced one
    #[clap(long, action)]
    no_spaced: bool,
    /// spaced seed mask, e.g. 110101101; overrides the default pattern
    #[clap(long)]
    spaced_mask: Option<String>,
    /// base k-mer similarity score, the upper bound of the threshold calibration
    #[clap(long, default_value = "30")]
    kmer_score: i32,
    /// sensitivity; higher finds more distant homologs and runs slower
    #[clap(short = 's', long, default_value = "4.0")]
    sensitivity: f64,
    /// calibrate the k-mer threshold on reversed queries instead of the static mapping
    #[clap(long, action)]
    calibrate: bool,
    /// seed of the calibration sample
    #[clap(long, default_value = "42")]
    seed: u64,
    /// maximum hits kept per query
    #[clap(long, default_value = "300")]
    max_seqs: usize,
    /// count matches per diagonal instead of summing k-mer scores per target;
    /// required upstream of `align --banded`
    #[clap(long, action)]
    diag_score: bool,
    /// disable the compositional bias correction
    #[clap(long, action)]
    no_bias_corr: bool,
    /// report the query itself when searching a database against itself
    #[clap(long, action)]
    include_identical: bool,
    /// worker threads; 0 uses all cores
    #[clap(short = 't', long, default_value = "0")]
    threads: usize,
    /// split count; 0 picks the smallest count that fits the memory budget
    #[clap(long, default_value = "0")]
    split: usize,
    /// split the query range instead of the target range
    #[clap(long, action)]
    split_by_query: bool,
    /// peak memory budget in MB
    #[clap(long, default_value = "4096")]
    max_memory_mb: usize,
    /// substitution matrix in the NCBI format; the default is BLOSUM62
    #[clap(long)]
    matrix: Option<String>,
}

#[derive(Parser, Debug)]
struct AlignArgs {
    /// query sequence database
    query_db: String,
    /// target sequence database
    target_db: String,
    /// prefilter result database
    prefilter_db: String,
    /// alignment result database to create
    out_db: String,
    /// gap opening penalty
    #[clap(long, default_value = "-11", short = 'o', allow_hyphen_values = true)]
    gap_open: i32,
    /// gap extension penalty
    #[clap(long, default_value = "-1", short = 'e', allow_hyphen_values = true)]
    gap_extend: i32,
    /// center the alignment band on the prefilter diagonal; needs a prefilter run
    /// with --diag-score, otherwise a wide band is used
    #[clap(long, action)]
    banded: bool,
    /// diagonals on each side of the band center
    #[clap(long, default_value = "16")]
    band_width: usize,
    /// stop a query after this many accepted alignments
    #[clap(long, default_value = "300")]
    max_accept: usize,
    /// stop a query after this many rejected alignments; 0 means unlimited
    #[clap(long, default_value = "0")]
    max_rejected: usize,
    /// minimum raw alignment score
    #[clap(long, default_value = "0")]
    min_score: i32,
    /// minimum sequence identity in [0, 1]
    #[clap(long, default_value = "0.0")]
    min_seq_id: f64,
    /// minimum query and target coverage in [0, 1]
    #[clap(short = 'c', long, default_value = "0.0")]
    min_coverage: f64,
    /// maximum expectation value
    #[clap(long, default_value = "1e-3")]
    max_evalue: f64,
    /// drop the backtrace column from the result records
    #[clap(long, action)]
    no_backtrace: bool,
    /// worker threads; 0 uses all cores
    #[clap(short = 't', long, default_value = "0")]
    threads: usize,
    /// substitution matrix in the NCBI format; the default is BLOSUM62
    #[clap(long)]
    matrix: Option<String>,
}

#[derive(Parser, Debug)]
struct MergedbsArgs {
    /// merged database to create
    out_db: String,
    /// split result databases, merged in the given order
    #[clap(required = true, num_args = 1..)]
    input_dbs: Vec<String>,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// query sequence database
    query_db: String,
    /// target sequence database
    target_db: String,
    /// result database to compute the statistic over
    result_db: String,
    /// statistics database to create
    out_db: String,
    /// which statistic to compute
    #[clap(long, value_enum, default_value = "linecount")]
    stat: Statistic,
}

fn main() {
    let cli = Cli::parse();
    if env::var("RUST_LOG").is_err() { env::set_var("RUST_LOG", "info") }
    if cli.verbose { env::set_var("RUST_LOG", "debug"); }
    env_logger::init();

    if let Err(message) = run(cli.command) {
        error!("{}", message);
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Prefilter(args) => prefilter(args),
        Command::Align(args) => align(args),
        Command::Mergedbs(args) => {
            merge_databases(&args.out_db, &args.input_dbs).map_err(|e| e.to_string())
        }
        Command::Result2stats(args) => result2stats(&args.query_db, &args.target_db,
                                                    &args.result_db, &args.out_db, args.stat),
    }
}

/// Worker count resolution: an explicit option wins, then the well-known environment
/// variable, then all cores.
fn resolve_threads(option: usize) -> usize {
    if option > 0 { return option; }
    match env::var("SEQSIEVE_NUM_THREADS") {
        Ok(value) => value.parse().unwrap_or(0),
        Err(_) => 0,
    }
}

/// Rank and world size of a distributed run, provided by the launcher through the
/// environment; a plain invocation is rank 0 of 1.
fn rank_and_world() -> (usize, usize) {
    let rank = env::var("SEQSIEVE_RANK").ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(0);
    let world = env::var("SEQSIEVE_WORLD_SIZE").ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(1);
    (rank, world)
}

fn prefilter(args: PrefilterArgs) -> Result<(), String> {
    let (rank, world_size) = rank_and_world();
    let config = PrefilterConfig {
        kmer_size: args.kmer_size,
        spaced: !args.no_spaced,
        spaced_mask: args.spaced_mask,
        kmer_score: args.kmer_score,
        sensitivity: args.sensitivity,
        calibrate: args.calibrate,
        seed: args.seed,
        max_hits_per_query: args.max_seqs,
        diagonal_scoring: args.diag_score,
        bias_correction: !args.no_bias_corr,
        include_identical: args.include_identical,
        threads: resolve_threads(args.threads),
        split: args.split,
        split_mode: if args.split_by_query { SplitMode::Query } else { SplitMode::Target },
        max_memory: args.max_memory_mb * 1024 * 1024,
        matrix_file: args.matrix,
        rank,
        world_size,
        ..PrefilterConfig::default()
    };
    // --- each rank writes the output it owns; the launcher merges the per-rank results
    let out_db = if world_size > 1 { format!("{}_{}", args.out_db, rank) } else { args.out_db };
    run_prefilter(&args.query_db, &args.target_db, &out_db, &config).map_err(|e| e.to_string())
}

fn align(args: AlignArgs) -> Result<(), String> {
    let config = AlignConfig {
        gap_open: args.gap_open,
        gap_extend: args.gap_extend,
        banded: args.banded,
        band_half_width: args.band_width,
        max_accept: args.max_accept,
        max_rejected: if args.max_rejected == 0 { usize::MAX } else { args.max_rejected },
        min_score: args.min_score,
        min_seq_id: args.min_seq_id,
        min_coverage: args.min_coverage,
        max_evalue: args.max_evalue,
        with_backtrace: !args.no_backtrace,
        threads: resolve_threads(args.threads),
        matrix_file: args.matrix,
    };
    run_alignment(&args.query_db, &args.target_db, &args.prefilter_db, &args.out_db, &config)
        .map_err(|e| e.to_string())
}
