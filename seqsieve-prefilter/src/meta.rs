use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};

/// How a prefilter result database was produced.
///
/// The prefilter writes this next to its output as a `.meta` sidecar file of
/// `key\tvalue` lines; the alignment stage consults it before centering its band on the
/// reported diagonals, which are meaningless when the prefilter ran in count-only mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefilterMeta {
    /// whether the hits carry real diagonals from per-diagonal match counting
    pub diagonal_scoring: bool,
}

fn meta_name(db_name: &str) -> String { format!("{}.meta", db_name) }

/// Writes the sidecar metadata file next to a prefilter result database.
pub fn write_prefilter_meta(db_name: &str, meta: &PrefilterMeta) -> io::Result<()> {
    let mut out = File::create(meta_name(db_name))?;
    writeln!(out, "diagonal_scoring\t{}", meta.diagonal_scoring as u8)?;
    Ok(())
}

/// Reads the sidecar metadata of a prefilter result database.
///
/// Returns `None` when the sidecar is missing or unreadable, e.g. for a database
/// produced by an older run or assembled by hand; callers must then assume nothing
/// about the hit diagonals.
pub fn read_prefilter_meta(db_name: &str) -> Option<PrefilterMeta> {
    let file = File::open(meta_name(db_name)).ok()?;
    let mut diagonal_scoring = None;
    for line in BufReader::new(file).lines() {
        let line = line.ok()?;
        let mut fields = line.split('\t');
        if let (Some("diagonal_scoring"), Some(value)) = (fields.next(), fields.next()) {
            diagonal_scoring = Some(value.trim() == "1");
        }
    }
    diagonal_scoring.map(|diagonal_scoring| PrefilterMeta { diagonal_scoring })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn meta_round_trips_and_tolerates_absence() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("pref").to_str().unwrap().to_string();

        assert_eq!(read_prefilter_meta(&db), None);

        write_prefilter_meta(&db, &PrefilterMeta { diagonal_scoring: true }).unwrap();
        assert_eq!(read_prefilter_meta(&db), Some(PrefilterMeta { diagonal_scoring: true }));

        write_prefilter_meta(&db, &PrefilterMeta { diagonal_scoring: false }).unwrap();
        assert_eq!(read_prefilter_meta(&db), Some(PrefilterMeta { diagonal_scoring: false }));
    }
}
