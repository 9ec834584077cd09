use crate::ConfigError;
use std::path::Path;

/// Loads a newline-separated list of entries from a UTF-8 text file
///
/// Surrounding whitespace is trimmed and blank lines are skipped, so the
/// domain and word lists may be edited by hand without care for trailing
/// spaces or empty lines. A leading byte order mark is ignored.
pub fn load_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::List {
        path: path.display().to_string(),
        source,
    })?;

    Ok(parse_list(&content))
}

/// Splits list text into trimmed, non-empty entries
pub fn parse_list(content: &str) -> Vec<String> {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
