//! CSV export of match results

use crate::output::MatchResult;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Column names, in row order
pub const HEADER: [&str; 4] = ["Domain", "URL", "Matched Word", "Timestamp"];

const SEP: char = ',';

fn needs_quotes(field: &str) -> bool {
    field.contains(SEP) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes a single CSV row, quoting fields per RFC 4180
pub fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> io::Result<()> {
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", SEP)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\r\n")
}

/// Writes the header and one row per result, in the given order
pub fn write_results<W: Write>(w: &mut W, results: &[MatchResult]) -> io::Result<()> {
    write_row(w, &HEADER)?;
    for result in results {
        write_row(w, &result.to_row())?;
    }
    w.flush()
}

/// Creates (or truncates) `path` and writes the results to it as UTF-8 CSV
pub fn write_results_csv(path: impl AsRef<Path>, results: &[MatchResult]) -> io::Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write_results(&mut writer, results)?;
    tracing::info!("Saved {} result(s) to {}", results.len(), path.display());
    Ok(())
}
