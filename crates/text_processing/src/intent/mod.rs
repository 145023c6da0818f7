//! Intent predicates
//!
//! Pure text predicates used by the router. The product predicates consult a
//! [`Lexicon`] snapshot passed in by the caller; nothing here holds state.
//!
//! # Example
//!
//! ```
//! use catalog_chat_text_processing::intent::{is_likely_product, looks_like_order_number};
//! use catalog_chat_text_processing::LexiconStore;
//!
//! let store = LexiconStore::with_default_hints();
//! let lexicon = store.snapshot();
//!
//! assert!(looks_like_order_number("13.500"));
//! assert!(is_likely_product("Flächenspachtel 280 mm", &lexicon));
//! assert!(!is_likely_product("hi", &lexicon));
//! ```

mod patterns;
pub mod triggers;

use crate::lexicon::Lexicon;
use crate::normalize::{has_digit, normalize, tokenize, visible_len};

use patterns::{
    BRANDS, CHIT_CHAT, COMMAND_WORDS, ORDER_NUMBER_EXACT, ORDER_NUMBER_FRAGMENT, SMALL_TALK,
    STOPWORDS, TOOL_SUFFIX,
};

/// Messages this short without a digit are never treated as content
pub const MIN_CONTENT_CHARS: usize = 3;

/// Longest single hyphenated/slashed token accepted as an article code
pub const MAX_CODE_TOKEN_CHARS: usize = 32;

/// True for greetings, thanks, jokes, poems and bare command words
pub fn is_utility_or_chit_chat(text: &str) -> bool {
    let trimmed = text.trim();
    if visible_len(trimmed) <= MIN_CONTENT_CHARS && !has_digit(trimmed) {
        return true;
    }
    if COMMAND_WORDS.contains(trimmed.to_lowercase().as_str()) {
        return true;
    }

    let normalized = normalize(trimmed);
    let matched = SMALL_TALK.is_match(&normalized) || CHIT_CHAT.is_match(&normalized);
    if matched {
        tracing::debug!(text = %trimmed, "Chit-chat detected");
    }
    matched
}

/// Digits-and-dots only, or a grouped fragment like "505.02" anywhere
pub fn looks_like_order_number(text: &str) -> bool {
    let trimmed = text.trim();
    (ORDER_NUMBER_EXACT.is_match(trimmed) && has_digit(trimmed))
        || ORDER_NUMBER_FRAGMENT.is_match(trimmed)
}

/// Token-level product evidence
///
/// False when no tokens survive or all of them are stopwords. True on a
/// lexicon hit, a single hyphenated or slashed code, a compound ending in a
/// tool word, or a brand name.
pub fn seems_product_by_tokens(text: &str, lexicon: &Lexicon) -> bool {
    let tokens = tokenize(text);
    if tokens.is_empty() || tokens.iter().all(|t| STOPWORDS.contains(t.as_str())) {
        return false;
    }

    if let Some(hit) = tokens.iter().find(|t| lexicon.contains(t)) {
        tracing::debug!(token = %hit, "Lexicon hit");
        return true;
    }

    let trimmed = text.trim();
    let single_code = !trimmed.contains(char::is_whitespace)
        && trimmed.contains(|c: char| c == '-' || c == '/')
        && trimmed.chars().count() <= MAX_CODE_TOKEN_CHARS
        && trimmed.chars().any(char::is_alphanumeric);
    if single_code {
        return true;
    }

    let normalized = normalize(trimmed);
    TOOL_SUFFIX.is_match(&normalized) || BRANDS.is_match(&normalized)
}

/// Order-number shape or token-level product evidence
pub fn is_likely_product(text: &str, lexicon: &Lexicon) -> bool {
    let trimmed = text.trim();
    if visible_len(trimmed) <= MIN_CONTENT_CHARS && !has_digit(trimmed) {
        return false;
    }
    looks_like_order_number(trimmed) || seems_product_by_tokens(trimmed, lexicon)
}
