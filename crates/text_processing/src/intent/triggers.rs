//! Trigger parsers for the command and utility intents
//!
//! Each parser inspects whitespace-collapsed text with its original casing, so
//! extracted arguments keep the user's spelling. They are independent of the
//! product predicates and of each other; the router decides which one wins.

use catalog_chat_core::Intent;
use once_cell::sync::Lazy;
use regex::Regex;

use super::patterns::{ORDER_NUMBER_EXACT, ORDER_NUMBER_FRAGMENT};

static REBUILD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[/!](?:rebuild|reindex|index)(?:\s+(?:index|katalog|catalog))?|rebuild index|katalog neu laden|index neu aufbauen)\s*$")
        .expect("valid regex")
});

static CATALOG_COMMAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[/!](?:katalog|catalog|produkt|product|search-catalog|suche-katalog)(?:$|[:\s]+(.*)$)")
        .expect("valid regex")
});

static WEATHER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^/(?:weather|wetter)\b|\b(?:weather|wetter|forecast|wettervorhersage|wetterbericht|temperature|temperatur)\b)")
        .expect("valid regex")
});

static TOMORROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:tomorrow|morgen)\b").expect("valid regex"));

static THIS_MORNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:heute|guten)\s+morgen\b").expect("valid regex"));

static TIME_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:heute\s+morgen|heute\s+abend|today|tonight|tomorrow|now|right now|heute|morgen|jetzt|gerade)\b")
        .expect("valid regex")
});

static CITY_AFTER_PREPOSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in|für|fuer|for|at)\s+(?:(?:in|für|fuer|for|at)\s+)*(.+)$")
        .expect("valid regex")
});

const WEATHER_FILLER: &[&str] = &[
    "/weather", "/wetter", "weather", "wetter", "forecast", "wettervorhersage",
    "wetterbericht", "temperature", "temperatur", "the", "das", "der", "die", "wie",
    "ist", "is", "what", "whats", "what's", "how", "how's", "hows", "s", "please",
    "bitte", "show", "me", "zeig", "mir", "gib", "give", "current", "aktuelle",
    "aktuell", "like", "wird", "will", "be", "it", "es", "and", "und",
];

static NEWS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^/(?:news|nachrichten)\b|\b(?:news|nachrichten|headlines|schlagzeilen)\b)")
        .expect("valid regex")
});

static NEWS_TOPIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^/(?:news|nachrichten)\s+|\b(?:about|on|regarding|zu|zum|zur|über|ueber)\s+)(.+)$")
        .expect("valid regex")
});

static WEB_SEARCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:/search|/web|/google|google|search the web for|search for|search|web search|websuche|suche im (?:web|internet) nach|im internet suchen)\s*:?\s+(.+)$")
        .expect("valid regex")
});

static CAPITAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:capital(?:\s+city)?\s+of|hauptstadt\s+(?:von|of))\s+(.+)$")
        .expect("valid regex")
});

static ENCYCLOPEDIA_EXPLICIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:/wiki|/wikipedia|wiki|wikipedia)\s*:?\s+(.+)$").expect("valid regex")
});

static ENCYCLOPEDIA_QUESTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:who\s+is|who\s+was|who\s+were|what\s+is|what\s+are|what\s+was|",
        r"wer\s+ist|wer\s+war|wer\s+sind|was\s+ist|was\s+sind|was\s+war|",
        r"tell\s+me\s+about|erzähl(?:e)?\s+mir\s+(?:etwas\s+|was\s+)?über)\s+(.+)$"
    ))
    .expect("valid regex")
});

static LEADING_ARTICLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:the|a|an|der|die|das|ein|eine|einen)\s+").expect("valid regex")
});

/// `/rebuild`, `/reindex` and friends
pub fn rebuild(text: &str) -> Option<Intent> {
    REBUILD.is_match(text).then_some(Intent::RebuildIndex)
}

/// `/katalog <query>`; the query may be empty
pub fn catalog_command(text: &str) -> Option<Intent> {
    let caps = CATALOG_COMMAND.captures(text)?;
    let query = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
    Some(Intent::ExplicitCatalogSearch {
        query: query.to_string(),
    })
}

/// Weather request with an optional city and a tomorrow flag
pub fn weather(text: &str) -> Option<Intent> {
    if !WEATHER.is_match(text) {
        return None;
    }
    let tomorrow = TOMORROW.is_match(text) && !THIS_MORNING.is_match(text);
    Some(Intent::Weather {
        city: weather_city(text),
        tomorrow,
    })
}

fn weather_city(text: &str) -> Option<String> {
    let without_time = TIME_WORDS.replace_all(text, " ");
    let without_time = without_time.split_whitespace().collect::<Vec<_>>().join(" ");

    if let Some(caps) = CITY_AFTER_PREPOSITION.captures(&without_time) {
        if let Some(city) = caps.get(1).and_then(|m| clean_argument(m.as_str())) {
            return Some(city);
        }
    }

    // "Wetter Hamburg", "Berlin weather"
    let rest: Vec<&str> = without_time
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '/' && c != '-'))
        .filter(|w| !w.is_empty())
        .filter(|w| !WEATHER_FILLER.contains(&w.to_lowercase().as_str()))
        .collect();
    clean_argument(&rest.join(" "))
}

/// News request with an optional topic
pub fn news(text: &str) -> Option<Intent> {
    if !NEWS.is_match(text) {
        return None;
    }
    let topic = NEWS_TOPIC
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| clean_argument(m.as_str()));
    Some(Intent::News { topic })
}

pub fn web_search(text: &str) -> Option<Intent> {
    let caps = WEB_SEARCH.captures(text)?;
    let query = clean_argument(caps.get(1)?.as_str())?;
    Some(Intent::WebSearch { query })
}

/// "capital of France", "Hauptstadt von Spanien"
pub fn capital(text: &str) -> Option<Intent> {
    let caps = CAPITAL.captures(text)?;
    let country = clean_argument(caps.get(1)?.as_str())?;
    Some(Intent::CapitalLookup {
        country: strip_article(&country),
    })
}

/// `/wiki <topic>` or a "who is" / "what is" question
///
/// Question forms whose topic carries an order number are left alone so that
/// "was ist 505.02" still reaches the catalog.
pub fn encyclopedia(text: &str) -> Option<Intent> {
    encyclopedia_unless(text, |_| false)
}

/// Like [`encyclopedia`], but a question whose topic satisfies `defer` is
/// left alone too. The explicit `/wiki` form is never deferred.
pub fn encyclopedia_unless(text: &str, defer: impl Fn(&str) -> bool) -> Option<Intent> {
    if let Some(caps) = ENCYCLOPEDIA_EXPLICIT.captures(text) {
        let topic = clean_argument(caps.get(1)?.as_str())?;
        return Some(Intent::Encyclopedia { topic });
    }

    let caps = ENCYCLOPEDIA_QUESTION.captures(text)?;
    let topic = strip_article(&clean_argument(caps.get(1)?.as_str())?);
    if topic.is_empty() || mentions_order_number(&topic) || defer(&topic) {
        return None;
    }
    Some(Intent::Encyclopedia { topic })
}

fn mentions_order_number(text: &str) -> bool {
    text.split_whitespace()
        .any(|w| ORDER_NUMBER_EXACT.is_match(w) && w.contains(|c: char| c.is_ascii_digit()))
        || ORDER_NUMBER_FRAGMENT.is_match(text)
}

fn strip_article(text: &str) -> String {
    LEADING_ARTICLE.replace(text, "").trim().to_string()
}

/// Trim surrounding whitespace and punctuation; `None` if nothing is left
fn clean_argument(text: &str) -> Option<String> {
    let cleaned = text
        .trim()
        .trim_matches(|c: char| c.is_whitespace() || "?!.,;:\"'„“”".contains(c))
        .trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild() {
        assert_eq!(rebuild("/rebuild"), Some(Intent::RebuildIndex));
        assert_eq!(rebuild("/REINDEX"), Some(Intent::RebuildIndex));
        assert_eq!(rebuild("!reindex katalog"), Some(Intent::RebuildIndex));
        assert_eq!(rebuild("rebuild my house"), None);
        assert_eq!(rebuild("/rebuilding"), None);
    }

    #[test]
    fn test_catalog_command() {
        assert_eq!(
            catalog_command("/katalog Glättekelle 505.02"),
            Some(Intent::ExplicitCatalogSearch {
                query: "Glättekelle 505.02".to_string()
            })
        );
        assert_eq!(
            catalog_command("/catalog"),
            Some(Intent::ExplicitCatalogSearch {
                query: String::new()
            })
        );
        assert_eq!(catalog_command("/katalogisieren"), None);
        assert_eq!(catalog_command("katalog bitte"), None);
    }

    #[test]
    fn test_weather_city_and_tomorrow() {
        assert_eq!(
            weather("weather in Berlin tomorrow"),
            Some(Intent::Weather {
                city: Some("Berlin".to_string()),
                tomorrow: true
            })
        );
        assert_eq!(
            weather("Wie ist das Wetter morgen in München?"),
            Some(Intent::Weather {
                city: Some("München".to_string()),
                tomorrow: true
            })
        );
        assert_eq!(
            weather("wetter"),
            Some(Intent::Weather {
                city: None,
                tomorrow: false
            })
        );
        assert_eq!(
            weather("Wetter Hamburg"),
            Some(Intent::Weather {
                city: Some("Hamburg".to_string()),
                tomorrow: false
            })
        );
        assert_eq!(
            weather("weather for New York"),
            Some(Intent::Weather {
                city: Some("New York".to_string()),
                tomorrow: false
            })
        );
    }

    #[test]
    fn test_weather_this_morning_is_not_tomorrow() {
        let intent = weather("Wetter heute morgen in Köln");
        assert_eq!(
            intent,
            Some(Intent::Weather {
                city: Some("Köln".to_string()),
                tomorrow: false
            })
        );
    }

    #[test]
    fn test_weather_needs_whole_word() {
        assert_eq!(weather("wetterfeste Kelle"), None);
    }

    #[test]
    fn test_news() {
        assert_eq!(weather("news"), None);
        assert_eq!(news("news"), Some(Intent::News { topic: None }));
        assert_eq!(
            news("Nachrichten über Fußball"),
            Some(Intent::News {
                topic: Some("Fußball".to_string())
            })
        );
        assert_eq!(
            news("/news Technologie"),
            Some(Intent::News {
                topic: Some("Technologie".to_string())
            })
        );
        assert_eq!(news("Neuheiten im Sortiment"), None);
    }

    #[test]
    fn test_web_search() {
        assert_eq!(
            web_search("search for rust async traits"),
            Some(Intent::WebSearch {
                query: "rust async traits".to_string()
            })
        );
        assert_eq!(
            web_search("/google Öffnungszeiten Baumarkt"),
            Some(Intent::WebSearch {
                query: "Öffnungszeiten Baumarkt".to_string()
            })
        );
        assert_eq!(web_search("search"), None);
        assert_eq!(web_search("Suche Spachtel"), None);
    }

    #[test]
    fn test_capital() {
        assert_eq!(
            capital("What is the capital of France?"),
            Some(Intent::CapitalLookup {
                country: "France".to_string()
            })
        );
        assert_eq!(
            capital("Was ist die Hauptstadt von Spanien"),
            Some(Intent::CapitalLookup {
                country: "Spanien".to_string()
            })
        );
        assert_eq!(
            capital("capital of the Netherlands"),
            Some(Intent::CapitalLookup {
                country: "Netherlands".to_string()
            })
        );
        assert_eq!(capital("capital letters"), None);
    }

    #[test]
    fn test_encyclopedia() {
        assert_eq!(
            encyclopedia("/wiki Albert Einstein"),
            Some(Intent::Encyclopedia {
                topic: "Albert Einstein".to_string()
            })
        );
        assert_eq!(
            encyclopedia("Wer ist Angela Merkel?"),
            Some(Intent::Encyclopedia {
                topic: "Angela Merkel".to_string()
            })
        );
        assert_eq!(
            encyclopedia("was ist ein Vulkan"),
            Some(Intent::Encyclopedia {
                topic: "Vulkan".to_string()
            })
        );
    }

    #[test]
    fn test_encyclopedia_leaves_order_numbers_alone() {
        assert_eq!(encyclopedia("was ist 505.02"), None);
        assert_eq!(encyclopedia("what is the price of 13.500?"), None);
    }

    #[test]
    fn test_encyclopedia_unless_defers_questions_only() {
        let is_tool = |topic: &str| topic.to_lowercase().contains("kelle");
        assert_eq!(encyclopedia_unless("Was ist eine Glättekelle?", is_tool), None);
        assert_eq!(
            encyclopedia_unless("/wiki Glättekelle", is_tool),
            Some(Intent::Encyclopedia {
                topic: "Glättekelle".to_string()
            })
        );
        assert_eq!(
            encyclopedia_unless("Was ist ein Vulkan?", is_tool),
            Some(Intent::Encyclopedia {
                topic: "Vulkan".to_string()
            })
        );
    }

    #[test]
    fn test_clean_argument() {
        assert_eq!(clean_argument("  „Berlin“?! "), Some("Berlin".to_string()));
        assert_eq!(clean_argument(" ?! "), None);
    }
}
