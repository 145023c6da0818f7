//! Text Normalizer
//!
//! Canonicalizes raw chat input into a comparable lowercase form and a token
//! sequence. Both functions are pure and total.
//!
//! - Lowercase, Unicode compatibility decomposition with combining marks dropped
//! - German `ä ö ü ß` are kept as letters
//! - Everything outside `a-z 0-9 ä ö ü ß . - /` becomes a space
//! - Whitespace collapsed and trimmed

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Minimum token length kept by [`tokenize`]
pub const MIN_TOKEN_CHARS: usize = 2;

/// Normalize raw text for comparison
///
/// Idempotent: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());

    // NFC first so that a decomposed "a + U+0308" is recognised as ä
    for ch in text.nfc().flat_map(char::to_lowercase) {
        if is_kept_letter(ch) {
            folded.push(ch);
            continue;
        }
        for decomposed in ch.nfkd().filter(|c| !is_combining_mark(*c)) {
            for lower in decomposed.to_lowercase() {
                folded.push(if is_allowed(lower) { lower } else { ' ' });
            }
        }
    }

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize, then split on whitespace, hyphen and slash
///
/// Tokens shorter than [`MIN_TOKEN_CHARS`] are dropped. Dots at the edges of a
/// token are trimmed ("nr." → "nr") while inner dots survive ("13.500").
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(|c: char| c.is_whitespace() || c == '-' || c == '/')
        .map(|t| t.trim_matches('.'))
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Whitespace-collapsed, trimmed text with the original casing
///
/// Trigger parsers match on this form so extracted arguments (a city, a
/// topic) keep the spelling the user typed.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible length in grapheme clusters
pub fn visible_len(text: &str) -> usize {
    text.trim().graphemes(true).count()
}

pub fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}

fn is_kept_letter(c: char) -> bool {
    matches!(c, 'ä' | 'ö' | 'ü' | 'ß')
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || is_kept_letter(c) || matches!(c, '.' | '-' | '/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_punctuation() {
        assert_eq!(normalize("  Hallo,   WELT!! "), "hallo welt");
        assert_eq!(normalize("Bestell-Nr. 505.02"), "bestell-nr. 505.02");
        assert_eq!(normalize("L/B 120/60"), "l/b 120/60");
    }

    #[test]
    fn test_keeps_german_letters() {
        assert_eq!(normalize("Flächenspachtel GRÖßE Übergröße"), "flächenspachtel größe übergröße");
        // decomposed input composes back to the kept letter
        assert_eq!(normalize("Fla\u{0308}che"), "fläche");
    }

    #[test]
    fn test_strips_other_diacritics() {
        assert_eq!(normalize("Café Crème"), "cafe creme");
        assert_eq!(normalize("Señor Ñandú"), "senor nandu");
        assert_eq!(normalize("ﬁne"), "fine");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Bestell-Nr. 505.02",
            "Wie ist das Wetter morgen in München?",
            "Café ﬁne Straße ẞ",
            "what is 256+256",
            "  \t\n ",
            "🚀 Rocket-Kelle / 12×40 €",
            "A\u{0308}rger",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Bestell-Nr. 505.02"), vec!["bestell", "nr", "505.02"]);
        assert_eq!(tokenize("gm"), vec!["gm"]);
        assert_eq!(tokenize("a b cd"), vec!["cd"]);
        assert_eq!(tokenize("Zahn/Spachtel-Set"), vec!["zahn", "spachtel", "set"]);
        assert!(tokenize("?!").is_empty());
    }

    #[test]
    fn test_visible_len() {
        assert_eq!(visible_len(" hi "), 2);
        assert_eq!(visible_len("ä"), 1);
        assert_eq!(visible_len("👍🏽"), 1);
    }

    #[test]
    fn test_collapse_whitespace_keeps_case() {
        assert_eq!(collapse_whitespace("  weather   in Berlin "), "weather in Berlin");
    }
}
