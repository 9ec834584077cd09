use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const SAMPLE_DOMAINS: &[&str] = &["example.com", "wikipedia.org"];
pub const SAMPLE_WORDS: &[&str] = &["বাংলাদেশ", "আমাদের", "সফটওয়্যার"];

pub const DOMAIN_LIST_FILE: &str = "domain_list.txt";
pub const WORD_LIST_FILE: &str = "word_list.txt";

/// Writes `domain_list.txt` and `word_list.txt` into `dir`
///
/// Existing files are overwritten. Returns the two paths written.
pub fn create_sample_files(dir: &Path) -> io::Result<(PathBuf, PathBuf)> {
    let domains = dir.join(DOMAIN_LIST_FILE);
    let words = dir.join(WORD_LIST_FILE);

    fs::write(&domains, SAMPLE_DOMAINS.join("\n"))?;
    fs::write(&words, SAMPLE_WORDS.join("\n"))?;

    tracing::info!(
        "Sample files '{}' and '{}' created",
        domains.display(),
        words.display()
    );
    Ok((domains, words))
}
