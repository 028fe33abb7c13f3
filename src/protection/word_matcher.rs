// Banned-word matching.
//
// Plain substring matching on the lowercased message text. Not token aware:
// a banned "bad" also catches "badly". Words are scanned in sorted order so
// the reported match is stable across runs.

use super::protection_models::BannedWordSet;

/// Return the first banned word found in `text`, if any.
/// The set holds lowercase entries; the text is lowercased once here.
pub fn first_match<'a>(text: &str, banned_words: &'a BannedWordSet) -> Option<&'a str> {
    if banned_words.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    banned_words
        .iter()
        .find(|word| !word.is_empty() && lowered.contains(word.as_str()))
        .map(|word| word.as_str())
}
