use log::{debug, info};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use seqsieve_db::DbReader;
use seqsieve_seq::{Alphabet, KmerIterator, KmerWindow, Sequence};

use crate::index_table::IndexTable;
use crate::kmer_generator::KmerGenerator;
use crate::query_score::CountScoreTable;

/// What the calibration measured at one candidate threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationStatistics {
    /// similar k-mers generated per query position
    pub kmers_per_position: f64,
    /// probability that a generated k-mer matches a given target position
    pub match_probability: f64,
    /// targets hit on two or more positions, per query
    pub doublets_per_query: f64,
    /// targets hit at all, per query
    pub hits_per_query: f64,
}

/// Calibrates the k-mer similarity threshold for a sensitivity setting.
///
/// A sample of queries is drawn deterministically from `queries`, each sequence is
/// reversed (same composition without conserved k-mer structure, the background model) and
/// matched against the index at candidate thresholds walking down from `kmer_score`.
/// The first threshold whose measured background hits-per-query enters the
/// sensitivity-dependent target band wins; if none does, the calibration floor of 1 is
/// returned. The walk is single-threaded and, for a fixed seed, deterministic.
pub fn calibrate_kmer_threshold(index: &IndexTable, queries: &DbReader, alphabet: &Alphabet,
                                window: &KmerWindow, generator: &KmerGenerator<'_>,
                                sample_size: usize, sensitivity: f64, kmer_score: i32,
                                seed: u64) -> i32 {

    let n_queries = queries.size();
    if n_queries == 0 || index.n_targets() == 0 { return kmer_score; }

    let mut rng = SmallRng::seed_from_u64(seed);
    let amount = sample_size.min(n_queries);
    let mut sampled: Vec<usize> = rand::seq::index::sample(&mut rng, n_queries, amount).into_vec();
    sampled.sort_unstable();

    let reversed: Vec<Sequence> = sampled.iter()
        .map(|&id| Sequence::from_payload(queries.key_at(id), queries.entry(id), alphabet).reversed())
        .collect();

    let target_band = hits_per_query_target(sensitivity);
    info!("calibrating k-mer threshold on {} reversed queries, target band {:.1} hits/query",
          reversed.len(), target_band);

    let mut threshold = kmer_score;
    loop {
        let stats = measure(index, &reversed, window, generator, threshold);
        debug!("threshold {}: {:.2} k-mers/pos, p_match {:.2e}, {:.1} doublets/query, {:.1} hits/query",
               threshold, stats.kmers_per_position, stats.match_probability,
               stats.doublets_per_query, stats.hits_per_query);
        if stats.hits_per_query >= target_band || threshold <= 1 {
            info!("k-mer threshold calibrated to {} ({:.1} hits/query)", threshold, stats.hits_per_query);
            return threshold;
        }
        threshold -= 1;
    }
}

/// Background hits a query should collect at a given sensitivity
fn hits_per_query_target(sensitivity: f64) -> f64 {
    10.0 * (sensitivity - 4.0).exp2()
}

fn measure(index: &IndexTable, reversed: &[Sequence], window: &KmerWindow,
           generator: &KmerGenerator<'_>, threshold: i32) -> CalibrationStatistics {

    let mut table = CountScoreTable::new(index.n_targets());
    let mut similar: Vec<(usize, i32)> = Vec::new();
    let mut kmer = vec![0u8; window.k()];

    let mut positions = 0u64;
    let mut generated = 0u64;
    let mut matches = 0u64;
    let mut hits = 0u64;
    let mut doublets = 0u64;
    for query in reversed {
        for (pos, _code) in KmerIterator::new(query.codes(), window) {
            for (slot, &offset) in kmer.iter_mut().zip(window.positions()) {
                *slot = query.codes()[pos + offset];
            }
            positions += 1;
            generator.similar_kmers(&kmer, threshold, &mut similar);
            generated += similar.len() as u64;
            for &(code, _score) in &similar {
                for entry in index.list(code) {
                    table.add(entry.seq_id, 1);
                    matches += 1;
                }
            }
        }
        hits += table.touched().len() as u64;
        doublets += table.touched().iter().filter(|&&id| table.score(id) >= 2).count() as u64;
        table.reset();
    }

    let n_queries = reversed.len().max(1) as f64;
    let positions_f = positions.max(1) as f64;
    CalibrationStatistics {
        kmers_per_position: generated as f64 / positions_f,
        match_probability: matches as f64 / (positions_f * index.n_entries().max(1) as f64),
        doublets_per_query: doublets as f64 / n_queries,
        hits_per_query: hits as f64 / n_queries,
    }
}
