use clap::ValueEnum;
use log::{info, warn};

use seqsieve_db::{AccessMode, DbReader, DbWriter};

/// Statistics computable over a result database, one value per record line or per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Statistic {
    /// lines per result record
    Linecount,
    /// mean of the first numeric column
    Mean,
    /// sum of the first integer column
    Sum,
    /// residue count of each referenced sequence
    Seqlen,
    /// first line of each referenced sequence record
    Firstline,
}

/// Computes one statistic per result record, the post-processing companion of the
/// search pipeline. Malformed values in a record are logged and skipped; the cursor
/// always advances to the next line.
pub fn result2stats(query_db: &str, target_db: &str, result_db: &str, out_db: &str,
                    stat: Statistic) -> Result<(), String> {
    let results = DbReader::open_db(result_db, AccessMode::LinearAccess)
        .map_err(|e| e.to_string())?;
    let mut writer = DbWriter::open_db(out_db, 1).map_err(|e| e.to_string())?;

    let sequence_dbs = match stat {
        Statistic::Seqlen | Statistic::Firstline => {
            let qdbr = DbReader::open_db(query_db, AccessMode::NoSort).map_err(|e| e.to_string())?;
            let tdbr = DbReader::open_db(target_db, AccessMode::NoSort).map_err(|e| e.to_string())?;
            Some((qdbr, tdbr))
        }
        _ => None,
    };

    for id in 0..results.size() {
        let key = results.key_at(id);
        let record = results.entry(id);
        let output = match stat {
            Statistic::Linecount => {
                format!("{}\n", record.iter().filter(|&&b| b == b'\n').count())
            }
            Statistic::Mean => {
                let (sum, count) = fold_numeric_lines(record, key);
                format!("{}\n", sum / count.max(1) as f64)
            }
            Statistic::Sum => {
                let (sum, _count) = fold_numeric_lines(record, key);
                format!("{}\n", sum as u64)
            }
            Statistic::Seqlen | Statistic::Firstline => {
                let (qdbr, tdbr) = sequence_dbs.as_ref().expect("sequence readers were opened");
                sequence_wise(record, key, qdbr, tdbr, stat)?
            }
        };
        writer.shards_mut()[0].write_record(key, output.as_bytes())
            .map_err(|e| e.to_string())?;
    }
    writer.close().map_err(|e| e.to_string())?;
    info!("statistics written to {}", out_db);

    Ok(())
}

/// Sums the leading numeric value of every line. A line whose first field does not
/// parse is reported and skipped, never retried in place.
fn fold_numeric_lines(record: &[u8], key: u32) -> (f64, usize) {
    let mut sum = 0.0;
    let mut count = 0usize;
    for line in record.split(|&b| b == b'\n') {
        if line.is_empty() { continue; }
        let text = String::from_utf8_lossy(line);
        match text.split_whitespace().next().and_then(|field| field.parse::<f64>().ok()) {
            Some(value) => {
                sum += value;
                count += 1;
            }
            None => warn!("invalid value in entry {}: '{}'", key, text),
        }
    }
    (sum, count)
}

/// One output line per result line: the first line looks the key up in the query
/// database, every further line in the target database.
fn sequence_wise(record: &[u8], record_key: u32, qdbr: &DbReader, tdbr: &DbReader,
                 stat: Statistic) -> Result<String, String> {
    let mut output = String::new();
    let mut lines_used = 0usize;
    for line in record.split(|&b| b == b'\n') {
        if line.is_empty() { continue; }
        let text = String::from_utf8_lossy(line);
        let key = match text.split('\t').next().and_then(|field| field.trim().parse::<u32>().ok()) {
            Some(key) => key,
            None => {
                warn!("invalid key in entry {}: '{}'", record_key, text);
                continue;
            }
        };
        let reader = if lines_used == 0 { qdbr } else { tdbr };
        let payload = match reader.get(key) {
            Some(payload) => payload,
            None => return Err(format!("the key {} from entry {} does not exist in {}",
                                       key, record_key, reader.data_name())),
        };
        match stat {
            Statistic::Seqlen => {
                let length = payload.iter()
                    .take_while(|&&b| b.is_ascii_alphabetic() || b == b'*')
                    .count();
                output.push_str(&format!("{}\n", length));
            }
            Statistic::Firstline => {
                let first = payload.split(|&b| b == b'\n').next().unwrap_or(b"");
                output.push_str(&format!("{}\n", String::from_utf8_lossy(first)));
            }
            _ => unreachable!("sequence_wise only handles per-sequence statistics"),
        }
        lines_used += 1;
    }
    Ok(output)
}
