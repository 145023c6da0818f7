//! Encyclopedia summaries via the Wikipedia REST API

use std::time::Duration;

use async_trait::async_trait;
use catalog_chat_config::IntegrationsConfig;
use catalog_chat_core::{UtilityKind, UtilityRequest};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{client, get_json, with_segment};
use crate::{IntegrationError, UtilityTool};

/// Summaries longer than this are cut at a sentence end
const MAX_EXTRACT_CHARS: usize = 600;

pub struct EncyclopediaClient {
    client: Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: PageUrl,
}

#[derive(Debug, Deserialize)]
struct PageUrl {
    page: String,
}

impl EncyclopediaClient {
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            client: client(Duration::from_millis(config.timeout_ms))?,
            base: config
                .encyclopedia_endpoint
                .replace("{lang}", &config.encyclopedia_language),
        })
    }
}

#[async_trait]
impl UtilityTool for EncyclopediaClient {
    fn kind(&self) -> UtilityKind {
        UtilityKind::Encyclopedia
    }

    async fn fetch(&self, request: &UtilityRequest) -> Result<String, IntegrationError> {
        let UtilityRequest::Encyclopedia { topic } = request else {
            return Err(IntegrationError::InvalidRequest("expected encyclopedia request".into()));
        };
        let title = page_title(topic);
        if title.is_empty() {
            return Err(IntegrationError::InvalidRequest("empty topic".into()));
        }

        let url = with_segment(&self.base, &title)?;
        let summary: Summary = get_json(self.client.get(url), "encyclopedia").await?;

        if summary.extract.trim().is_empty() {
            return Err(IntegrationError::NotFound(topic.clone()));
        }
        if summary.kind == "disambiguation" {
            tracing::debug!(topic = %topic, "Encyclopedia returned a disambiguation page");
        }

        let mut reply = format!("📚 {}: {}", summary.title, shorten(summary.extract.trim()));
        if let Some(urls) = summary.content_urls {
            reply.push('\n');
            reply.push_str(&urls.desktop.page);
        }
        Ok(reply)
    }
}

/// Page titles use underscores and a capitalised first letter
fn page_title(topic: &str) -> String {
    let joined = topic.split_whitespace().collect::<Vec<_>>().join("_");
    let mut chars = joined.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn shorten(extract: &str) -> String {
    if extract.chars().count() <= MAX_EXTRACT_CHARS {
        return extract.to_string();
    }
    let cut: String = extract.chars().take(MAX_EXTRACT_CHARS).collect();
    match cut.rfind(". ") {
        Some(end) => cut[..=end].to_string(),
        None => format!("{}…", cut.trim_end()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    #[test]
    fn test_page_title() {
        assert_eq!(page_title("albert  einstein"), "Albert_einstein");
        assert_eq!(page_title("Ägypten"), "Ägypten");
        assert_eq!(page_title("  "), "");
    }

    #[test]
    fn test_shorten_at_sentence() {
        let long = "Satz eins. ".repeat(100);
        let short = shorten(&long);
        assert!(short.ends_with('.'));
        assert!(short.chars().count() <= MAX_EXTRACT_CHARS);
        assert_eq!(shorten("Kurz."), "Kurz.");
    }

    #[tokio::test]
    async fn test_fetch_summary_and_not_found() {
        let router = Router::new().route(
            "/de/summary/:title",
            get(|Path(title): Path<String>| async move {
                if title == "Berliner_Mauer" {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "type": "standard",
                            "title": "Berliner Mauer",
                            "extract": "Die Berliner Mauer war ein Grenzbefestigungssystem.",
                            "content_urls": { "desktop": { "page": "https://de.wikipedia.org/wiki/Berliner_Mauer" } }
                        })),
                    )
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({ "type": "not_found" })))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = IntegrationsConfig {
            encyclopedia_endpoint: format!("http://127.0.0.1:{}/{{lang}}/summary", addr.port()),
            encyclopedia_language: "de".into(),
            timeout_ms: 2_000,
            ..IntegrationsConfig::default()
        };
        let client = EncyclopediaClient::from_config(&config).unwrap();

        let reply = client
            .fetch(&UtilityRequest::Encyclopedia {
                topic: "Berliner Mauer".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            reply,
            "📚 Berliner Mauer: Die Berliner Mauer war ein Grenzbefestigungssystem.\nhttps://de.wikipedia.org/wiki/Berliner_Mauer"
        );

        let err = client
            .fetch(&UtilityRequest::Encyclopedia {
                topic: "Quatschwort".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::NotFound(_)));
    }
}
