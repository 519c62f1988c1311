//! Sentence segmentation.
//!
//! Boundaries follow the Unicode sentence rules (UAX #29), so terminal
//! punctuation and paragraph breaks both end a sentence. Each sentence has
//! its internal whitespace collapsed to single spaces; sentences that are
//! only whitespace are dropped.

use unicode_segmentation::UnicodeSegmentation;

/// Split `text` into ordered, whitespace-normalized sentences.
///
/// Empty or whitespace-only input yields no sentences; any other input
/// yields at least one.
pub fn segment(text: &str) -> Vec<String> {
    text.split_sentence_bounds()
        .map(normalize_whitespace)
        .filter(|s| !s.is_empty())
        .collect()
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
