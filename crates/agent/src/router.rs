//! Fixed-priority intent router
//!
//! The router is one ordered table of rules. Each rule is a pure function of
//! the message context; the first rule returning `Some` claims the message and
//! nothing below it is consulted. Messages no rule claims become
//! [`Intent::ChitChatFallback`].
//!
//! Order matters:
//! - explicit commands come first so they always win;
//! - all utility triggers run before product detection, so "Wetter in Berlin"
//!   never reaches the catalog even when "berlin" is a lexicon token;
//! - the capital pattern runs before arithmetic and encyclopedia because it
//!   shares the "what is" surface;
//! - arithmetic runs before encyclopedia so "what is 2+2" is computed.

use std::sync::Arc;

use catalog_chat_core::Intent;
use catalog_chat_text_processing::intent::triggers;
use catalog_chat_text_processing::{
    collapse_whitespace, is_likely_product, is_utility_or_chit_chat, tokenize, try_evaluate,
    Lexicon, LexiconStore,
};

/// Everything a rule may look at for one message
pub struct MessageContext<'a> {
    /// Whitespace-collapsed text with the original casing
    pub cased: String,
    /// Lexicon snapshot taken once for this message
    pub lexicon: &'a Lexicon,
}

impl<'a> MessageContext<'a> {
    pub fn new(raw: &'a str, lexicon: &'a Lexicon) -> Self {
        Self {
            cased: collapse_whitespace(raw),
            lexicon,
        }
    }
}

pub type Rule = fn(&MessageContext<'_>) -> Option<Intent>;

/// Rules in priority order
pub const PRIORITY: &[(&str, Rule)] = &[
    ("rebuild_index", rebuild_index),
    ("explicit_catalog_search", explicit_catalog_search),
    ("weather", weather),
    ("news", news),
    ("web_search", web_search),
    ("capital_lookup", capital_lookup),
    ("arithmetic", arithmetic),
    ("encyclopedia", encyclopedia),
    ("catalog_product", catalog_product),
];

fn rebuild_index(ctx: &MessageContext<'_>) -> Option<Intent> {
    triggers::rebuild(&ctx.cased)
}

fn explicit_catalog_search(ctx: &MessageContext<'_>) -> Option<Intent> {
    triggers::catalog_command(&ctx.cased)
}

fn weather(ctx: &MessageContext<'_>) -> Option<Intent> {
    triggers::weather(&ctx.cased)
}

fn news(ctx: &MessageContext<'_>) -> Option<Intent> {
    triggers::news(&ctx.cased)
}

fn web_search(ctx: &MessageContext<'_>) -> Option<Intent> {
    triggers::web_search(&ctx.cased)
}

fn capital_lookup(ctx: &MessageContext<'_>) -> Option<Intent> {
    triggers::capital(&ctx.cased)
}

fn arithmetic(ctx: &MessageContext<'_>) -> Option<Intent> {
    try_evaluate(&ctx.cased).map(|value| Intent::Arithmetic { value })
}

/// Questions about trade vocabulary ("Was ist der Preis der Flächenspachtel?")
/// are left to the catalog
fn encyclopedia(ctx: &MessageContext<'_>) -> Option<Intent> {
    triggers::encyclopedia_unless(&ctx.cased, |topic| {
        tokenize(topic).iter().any(|t| ctx.lexicon.is_hint(t))
    })
}

/// Conversational text is never promoted to the product channel
fn catalog_product(ctx: &MessageContext<'_>) -> Option<Intent> {
    if is_utility_or_chit_chat(&ctx.cased) || !is_likely_product(&ctx.cased, ctx.lexicon) {
        return None;
    }
    Some(Intent::CatalogProduct {
        query: ctx.cased.clone(),
    })
}

/// Classify one message against a lexicon snapshot
///
/// Returns the name of the claiming rule alongside the intent.
pub fn classify(text: &str, lexicon: &Lexicon) -> (&'static str, Intent) {
    let ctx = MessageContext::new(text, lexicon);
    PRIORITY
        .iter()
        .find_map(|(name, rule)| rule(&ctx).map(|intent| (*name, intent)))
        .unwrap_or(("chit_chat_fallback", Intent::ChitChatFallback))
}

/// Router bound to the shared lexicon store
#[derive(Clone)]
pub struct IntentRouter {
    lexicon: Arc<LexiconStore>,
}

impl IntentRouter {
    pub fn new(lexicon: Arc<LexiconStore>) -> Self {
        Self { lexicon }
    }

    pub fn lexicon(&self) -> &Arc<LexiconStore> {
        &self.lexicon
    }

    /// Assign exactly one intent to `text`
    pub fn route(&self, text: &str) -> Intent {
        let snapshot = self.lexicon.snapshot();
        let (rule, intent) = classify(text, &snapshot);
        tracing::debug!(rule, intent = intent.kind().as_str(), "Message routed");
        intent
    }
}
