//! User-facing reply texts

use catalog_chat_catalog::LookupFailure;
use catalog_chat_tools::IntegrationError;

/// Sent when a handler crashes or a collaborator fails without detail
pub const GENERIC_FAILURE: &str = "Konnte keine Informationen abrufen.";

pub const EMPTY_CATALOG_QUERY: &str =
    "Bitte gib einen Suchbegriff an, z. B. „/katalog Glättkelle 280 mm“.";

/// The explicit "no catalog hit" reply for catalog-bound messages
pub fn catalog_not_found(query: &str) -> String {
    format!("❌ Kein Katalogtreffer für „{}“.", query)
}

pub fn catalog_failure(query: &str, failure: &LookupFailure) -> String {
    match failure {
        LookupFailure::EmptyQuery => EMPTY_CATALOG_QUERY.to_string(),
        _ => catalog_not_found(query),
    }
}

pub fn arithmetic(value: &str) -> String {
    format!("🧮 Ergebnis: {}", value)
}

pub fn rebuilt(entries: usize, tokens: usize) -> String {
    format!(
        "✅ Katalogindex neu aufgebaut: {} Einträge, {} Lexikon-Tokens.",
        entries, tokens
    )
}

pub fn rebuild_failed(reason: &str) -> String {
    format!("❌ Neuaufbau des Katalogindex fehlgeschlagen: {}", reason)
}

/// Short reply for a failed utility call
pub fn utility_failure(err: &IntegrationError) -> String {
    match err {
        IntegrationError::Timeout(_) => {
            "⏱️ Der Dienst hat nicht rechtzeitig geantwortet.".to_string()
        },
        IntegrationError::NotFound(what) => format!("Dazu habe ich nichts gefunden ({}).", what),
        IntegrationError::NotConfigured(_) => "Dieser Dienst ist nicht eingerichtet.".to_string(),
        IntegrationError::RateLimited => {
            "Der Dienst ist gerade ausgelastet, bitte später erneut versuchen.".to_string()
        },
        _ => GENERIC_FAILURE.to_string(),
    }
}
