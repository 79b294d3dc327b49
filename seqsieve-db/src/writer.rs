use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use log::debug;

use crate::errors::DbError;

/// Append-only writer for one shard of a database under construction.
///
/// A shard is a temporary data file owned by exactly one worker thread. Offsets recorded
/// here are shard-local; [`DbWriter::close()`](DbWriter::close) rewrites them to global
/// positions when the shards are concatenated.
pub struct ShardWriter {
    data_name: String,
    out: BufWriter<File>,
    entries: Vec<(u32, u64, u64)>,
    written: u64,
}

impl ShardWriter {
    fn create(data_name: String) -> Result<ShardWriter, DbError> {
        let file = File::create(&data_name).map_err(|e| DbError::FileNotFound {
            file_name: data_name.clone(), source: e })?;
        Ok(ShardWriter { data_name, out: BufWriter::new(file), entries: Vec::new(), written: 0 })
    }

    /// Appends a record to this shard and terminates it with a `'\0'`.
    pub fn write_record(&mut self, key: u32, data: &[u8]) -> Result<(), DbError> {
        self.out.write_all(data)?;
        self.out.write_all(b"\0")?;
        let length = data.len() as u64 + 1;
        self.entries.push((key, self.written, length));
        self.written += length;
        Ok(())
    }

    /// Number of records written into this shard so far
    pub fn records_written(&self) -> usize { self.entries.len() }
}

/// Builds an indexed database from one or more append-only shards.
///
/// Open a writer with as many shards as worker threads, hand each worker its
/// [`ShardWriter`](ShardWriter) via [`shards_mut()`](DbWriter::shards_mut), and call
/// [`close()`](DbWriter::close) after the workers have joined. Closing concatenates the
/// shard files in thread order, rewrites shard-local offsets to global positions and
/// writes the index file sorted by key.
///
/// # Example
/// ```no_run
/// use seqsieve_db::DbWriter;
/// let mut writer = DbWriter::open("results", "results.index", 1).unwrap();
/// writer.shards_mut()[0].write_record(42, b"17\t250\t3\n").unwrap();
/// writer.close().unwrap();
/// ```
pub struct DbWriter {
    data_name: String,
    index_name: String,
    shards: Vec<ShardWriter>,
}

impl DbWriter {
    /// Creates a writer with `n_shards` temporary shard files next to `data_name`.
    pub fn open(data_name: &str, index_name: &str, n_shards: usize) -> Result<DbWriter, DbError> {
        let mut shards = Vec::with_capacity(n_shards);
        for i in 0..n_shards {
            shards.push(ShardWriter::create(format!("{}_tmp_{}", data_name, i))?);
        }
        Ok(DbWriter { data_name: data_name.to_string(), index_name: index_name.to_string(), shards })
    }

    /// Creates a writer for the pair of files `db_name` and `db_name.index`.
    pub fn open_db(db_name: &str, n_shards: usize) -> Result<DbWriter, DbError> {
        DbWriter::open(db_name, &format!("{}.index", db_name), n_shards)
    }

    /// The shard writers, one per worker thread; disjoint `&mut` borrows may be
    /// distributed over scoped threads.
    pub fn shards_mut(&mut self) -> &mut [ShardWriter] { &mut self.shards }

    /// Concatenates the shards, writes the key-sorted index file and removes the
    /// temporary shard files. Consumes the writer.
    pub fn close(self) -> Result<(), DbError> {

        let out_file = File::create(&self.data_name).map_err(|e| DbError::FileNotFound {
            file_name: self.data_name.clone(), source: e })?;
        let mut out = BufWriter::new(out_file);

        // ---------- concatenate shard data in thread order, globalizing the offsets
        let mut index: Vec<(u32, u64, u64)> = Vec::new();
        let mut base: u64 = 0;
        let mut shard_names: Vec<String> = Vec::new();
        for mut shard in self.shards {
            shard.out.flush()?;
            shard_names.push(shard.data_name.clone());
            let mut shard_file = File::open(&shard.data_name)?;
            let copied = io::copy(&mut shard_file, &mut out)?;
            if copied != shard.written {
                return Err(DbError::Io(io::Error::new(io::ErrorKind::WriteZero,
                    format!("short copy of shard {}: {} of {} bytes", shard.data_name, copied, shard.written))));
            }
            for (key, offset, length) in shard.entries {
                index.push((key, offset + base, length));
            }
            base += shard.written;
        }
        out.flush()?;

        index.sort_by_key(|&(key, _, _)| key);
        for pair in index.windows(2) {
            if pair[0].0 == pair[1].0 { return Err(DbError::DuplicateKey { key: pair[0].0 }); }
        }

        let index_file = File::create(&self.index_name).map_err(|e| DbError::FileNotFound {
            file_name: self.index_name.clone(), source: e })?;
        let mut index_out = BufWriter::new(index_file);
        for (key, offset, length) in &index {
            writeln!(index_out, "{}\t{}\t{}", key, offset, length)?;
        }
        index_out.flush()?;

        for name in shard_names {
            fs::remove_file(&name)?;
        }
        debug!("{} records written to {}", index.len(), self.data_name);

        Ok(())
    }
}
