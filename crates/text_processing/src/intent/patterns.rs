//! Compiled word lists and patterns shared by the predicates and triggers

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Words that carry no product meaning on their own
pub static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // German
        "der", "die", "das", "den", "dem", "des", "ein", "eine", "einen", "einem", "einer",
        "und", "oder", "aber", "ist", "sind", "war", "bin", "bist", "hat", "habe", "haben",
        "hast", "ich", "du", "er", "sie", "es", "wir", "ihr", "mir", "mich", "dir", "dich",
        "uns", "euch", "mein", "dein", "sein", "für", "mit", "von", "vom", "zum", "zur", "im",
        "am", "an", "auf", "aus", "bei", "nach", "über", "unter", "vor", "wie", "was", "wer",
        "wo", "wann", "warum", "welche", "welcher", "welches", "ja", "nein", "nicht", "kein",
        "keine", "auch", "noch", "schon", "mal", "doch", "gerne", "bitte", "danke", "hallo",
        "hi", "hey", "moin", "servus", "tschüss", "ok", "okay", "gut", "sehr", "so", "dann",
        "heute", "morgen", "jetzt", "hier", "da", "gibt", "geht", "gehts", "kann", "können",
        "könnt", "soll", "sollte", "will", "möchte", "brauche", "suche",
        // English
        "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "be", "am", "i",
        "you", "he", "she", "it", "we", "they", "me", "my", "your", "to", "of", "in", "on",
        "at", "for", "with", "from", "by", "about", "how", "what", "who", "where", "when",
        "why", "which", "yes", "no", "not", "do", "does", "did", "have", "has", "can",
        "could", "would", "should", "will", "please", "thanks", "thank", "hello", "hey",
        "good", "morning", "evening", "night", "today", "tomorrow", "now", "there", "this",
        "that", "up", "going", "doing", "fine", "need", "want", "looking",
    ]
    .into_iter()
    .collect()
});

/// Messages that are entirely a greeting, thanks or farewell (normalized text)
pub static SMALL_TALK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"hi|hallo|hello|hey|heya|hej|yo|moin|moin moin|servus|grüß gott|grüezi|huhu|",
        r"good (?:morning|afternoon|evening|night)|guten (?:morgen|tag|abend)|gute nacht|gm|gn|",
        r"thanks|thank you|thx|ty|danke|danke schön|danke sehr|dankeschön|vielen dank|merci|",
        r"bye|goodbye|see you|ciao|tschüss|tschau|bis bald|bis später|",
        r"ok|okay|alles klar|super|cool|top",
        r")(?: (?:there|all|everyone|zusammen|leute|bot|du|ihr|dir|you|a lot|so much|sehr|nochmal))*$"
    ))
    .expect("valid regex")
});

/// Conversational questions and creative requests anywhere in the message
pub static CHIT_CHAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:",
        r"how are you|how are u|how s it going|how is it going|what s up|whats up|sup|",
        r"wie geht s|wie gehts|wie geht es (?:dir|ihnen|euch)|was geht|alles gut|",
        r"who are you|wer bist du|what can you do|was kannst du",
        r")\b|",
        r"\b(?:tell|write|give|make|erzähl|erzähle|erzählen|schreib|schreibe|mach)\b.*\b(?:joke|poem|story|song|witz|gedicht|geschichte|lied|reim)\b|",
        r"^(?:joke|poem|witz|gedicht)$"
    ))
    .expect("valid regex")
});

/// Bare command words that are utility triggers by themselves (lowercased raw text)
pub static COMMAND_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "/rebuild", "/reindex", "!rebuild", "!reindex", "/weather", "/wetter", "/news",
        "/nachrichten", "/search", "/web", "/google", "/wiki", "/help", "/hilfe", "/start",
        "weather", "wetter", "news", "nachrichten", "wiki", "help", "hilfe",
    ]
    .into_iter()
    .collect()
});

/// Digits and dots only
pub static ORDER_NUMBER_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d.]+$").expect("valid regex"));

/// Grouped order-number fragment such as "505.02" or "13.500"
pub static ORDER_NUMBER_FRAGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,3}\.\d{2,3}\b").expect("valid regex"));

/// Compound nouns ending in a tool word ("Flächenspachtel", "Glättekelle")
pub static TOOL_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w{2,}(?:spachtel|kelle|traufel|glätter|pinsel|bürste|roller|quast|messer|brett|eimer|schaber|säge|zange|rührer|leiste|klinge)\b")
        .expect("valid regex")
});

/// Brand and trade names
pub static BRANDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:kellen|storch|pajarito|oxxo|rubi|collomix|nespoli|festool|hilti|knauf|makita|bosch|würth|mafell|kaufmann)\b")
        .expect("valid regex")
});
