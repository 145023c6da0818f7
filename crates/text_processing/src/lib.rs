//! Text processing for chat message classification
//!
//! This crate provides the pure, synchronous building blocks of the router:
//! - **Normalization**: lowercase, diacritic folding, token splitting
//! - **Lexicon**: product vocabulary with atomic snapshot swaps
//! - **Arithmetic**: safe evaluation of "what is 256+256"
//! - **Intent predicates**: chit-chat, order numbers, product evidence, triggers
//!
//! # Example
//!
//! ```
//! use catalog_chat_text_processing::{normalize, try_evaluate};
//!
//! assert_eq!(normalize("Bestell-Nr. 505.02!"), "bestell-nr. 505.02");
//! assert_eq!(try_evaluate("2*(128+64)"), Some(384.0));
//! ```

pub mod arithmetic;
pub mod intent;
pub mod lexicon;
pub mod normalize;

pub use arithmetic::{evaluate, format_number, try_evaluate, EvalError};
pub use intent::{
    is_likely_product, is_utility_or_chit_chat, looks_like_order_number, seems_product_by_tokens,
};
pub use lexicon::{mine_tokens, Lexicon, LexiconStats, LexiconStore, DEFAULT_HINTS};
pub use normalize::{collapse_whitespace, normalize, tokenize};
