use std::collections::BTreeSet;

use log::info;

use crate::errors::DbError;
use crate::reader::{AccessMode, DbReader};
use crate::writer::DbWriter;

/// Merges split result databases into a single database.
///
/// The output key set is the sorted union of the input key sets; the record stored under
/// each key is the concatenation of that key's records over the inputs, in input order.
/// Merging a single database therefore reproduces it byte for byte.
///
/// # Example
/// ```no_run
/// use seqsieve_db::merge_databases;
/// merge_databases("results", &["results_0".to_string(), "results_1".to_string()]).unwrap();
/// ```
pub fn merge_databases(out_db: &str, input_dbs: &[String]) -> Result<(), DbError> {

    let mut readers = Vec::with_capacity(input_dbs.len());
    for name in input_dbs {
        readers.push(DbReader::open_db(name, AccessMode::NoSort)?);
    }

    // --- sorted union of all keys
    let mut keys: BTreeSet<u32> = BTreeSet::new();
    for reader in &readers {
        for id in 0..reader.size() {
            keys.insert(reader.key_at(id));
        }
    }

    let mut writer = DbWriter::open_db(out_db, 1)?;
    let mut buffer: Vec<u8> = Vec::new();
    let shard = &mut writer.shards_mut()[0];
    for key in &keys {
        buffer.clear();
        for reader in &readers {
            if let Some(record) = reader.get(*key) {
                buffer.extend_from_slice(record);
            }
        }
        shard.write_record(*key, &buffer)?;
    }
    writer.close()?;
    info!("{} records merged from {} databases into {}", keys.len(), input_dbs.len(), out_db);

    Ok(())
}
