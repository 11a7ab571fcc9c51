use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::{canonical_combining_class, is_combining_mark};

/// Folds a title into the key used to match books across spreadsheets.
///
/// Accents are removed by decomposing the text and dropping the combining
/// marks that attach to a base letter, and the result is lower-cased. Spacing
/// vowel signs, spaces and punctuation are kept.
pub fn normalize(s: &str) -> String {
    // Lower-casing first keeps the function idempotent for characters such as
    // 'İ' whose lowercase form carries a combining mark.
    s.to_lowercase()
        .nfd()
        .filter(|ch| !is_accent(*ch))
        .collect()
}

fn is_accent(ch: char) -> bool {
    is_combining_mark(ch) && canonical_combining_class(ch) != 0
}
