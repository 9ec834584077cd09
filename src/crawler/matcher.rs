//! Whole-word matching over Unicode text
//!
//! Both the page text and the target words are brought to NFC first, so a
//! word typed with a precomposed letter still matches a page that uses the
//! decomposed sequence (and the other way round). An occurrence counts only
//! when it starts and ends on a UAX #29 word boundary: vowel signs, virama
//! and joiners attach to the letters around them, so `বাংলাদেশ` inside
//! `বাংলাদেশে` is not a match.

use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Matches a fixed list of target words against page text
#[derive(Debug, Clone)]
pub struct WordMatcher {
    /// (word as given, NFC form)
    words: Vec<(String, String)>,
}

impl WordMatcher {
    /// Creates a matcher for `words`
    ///
    /// Surrounding whitespace is trimmed, empty entries are dropped and
    /// entries equal after normalization are kept once, first spelling wins.
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let words = words
            .into_iter()
            .filter_map(|word| {
                let word = word.as_ref().trim();
                let normalized: String = word.nfc().collect();
                (!normalized.is_empty() && seen.insert(normalized.clone()))
                    .then(|| (word.to_string(), normalized))
            })
            .collect();

        Self { words }
    }

    /// Target words in input order, as given
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|(word, _)| word.as_str())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns the distinct target words that occur in `text` as whole words
    ///
    /// Words are returned once each, in the order they were given.
    ///
    /// ```
    /// use word_ripple::crawler::WordMatcher;
    ///
    /// let matcher = WordMatcher::new(["বাংলাদেশ"]);
    /// assert_eq!(matcher.find_matches("বাংলাদেশ একটি দেশ।"), vec!["বাংলাদেশ"]);
    /// assert!(matcher.find_matches("আমরা বাংলাদেশে থাকি।").is_empty());
    /// ```
    pub fn find_matches(&self, text: &str) -> Vec<String> {
        if self.words.is_empty() || text.is_empty() {
            return Vec::new();
        }

        let text: String = text.nfc().collect();
        let boundaries = word_boundaries(&text);

        self.words
            .iter()
            .filter(|(_, normalized)| occurs_as_word(&text, &boundaries, normalized))
            .map(|(word, _)| word.clone())
            .collect()
    }
}

/// Returns the set of distinct `words` occurring in `text` as whole words
pub fn match_words(text: &str, words: &[String]) -> HashSet<String> {
    WordMatcher::new(words).find_matches(text).into_iter().collect()
}

/// Marks every byte offset of `text` that is a UAX #29 word boundary
fn word_boundaries(text: &str) -> Vec<bool> {
    let mut boundaries = vec![false; text.len() + 1];
    for (offset, _) in text.split_word_bound_indices() {
        boundaries[offset] = true;
    }
    boundaries[text.len()] = true;
    boundaries
}

fn occurs_as_word(text: &str, boundaries: &[bool], word: &str) -> bool {
    boundaries.iter().enumerate().any(|(start, &is_boundary)| {
        is_boundary
            && text[start..].starts_with(word)
            && boundaries[start + word.len()]
    })
}
