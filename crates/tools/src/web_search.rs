//! Web search via DuckDuckGo instant answers

use std::time::Duration;

use async_trait::async_trait;
use catalog_chat_config::IntegrationsConfig;
use catalog_chat_core::{UtilityKind, UtilityRequest};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{client, get_json};
use crate::{IntegrationError, UtilityTool};

const MAX_RELATED: usize = 3;

pub struct WebSearchClient {
    client: Client,
    endpoint: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    /// Usually a string, occasionally a structured widget
    #[serde(default)]
    answer: serde_json::Value,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a topic or a named group of topics
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL", default)]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl RelatedTopic {
    fn flatten<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        match self {
            Self::Topic { text, first_url } => out.push((text.as_str(), first_url.as_str())),
            Self::Group { topics } => topics.iter().for_each(|t| t.flatten(out)),
        }
    }
}

impl WebSearchClient {
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            client: client(Duration::from_millis(config.timeout_ms))?,
            endpoint: config.web_search_endpoint.clone(),
        })
    }
}

#[async_trait]
impl UtilityTool for WebSearchClient {
    fn kind(&self) -> UtilityKind {
        UtilityKind::WebSearch
    }

    async fn fetch(&self, request: &UtilityRequest) -> Result<String, IntegrationError> {
        let UtilityRequest::WebSearch { query } = request else {
            return Err(IntegrationError::InvalidRequest("expected web search request".into()));
        };

        let request = self.client.get(&self.endpoint).query(&[
            ("q", query.as_str()),
            ("format", "json"),
            ("no_html", "1"),
            ("skip_disambig", "1"),
        ]);
        let answer: InstantAnswer = get_json(request, "web search").await?;

        format_answer(query, &answer)
            .ok_or_else(|| IntegrationError::NotFound(format!("Suchergebnis für {}", query)))
    }
}

fn format_answer(query: &str, answer: &InstantAnswer) -> Option<String> {
    if let Some(direct) = answer.answer.as_str().map(str::trim).filter(|a| !a.is_empty()) {
        return Some(format!("🔎 {}", direct));
    }

    if !answer.abstract_text.trim().is_empty() {
        let heading = if answer.heading.is_empty() {
            query
        } else {
            answer.heading.as_str()
        };
        let mut reply = format!("🔎 {}: {}", heading, answer.abstract_text.trim());
        if !answer.abstract_url.is_empty() {
            reply.push('\n');
            reply.push_str(&answer.abstract_url);
        }
        return Some(reply);
    }

    let mut related = Vec::new();
    for topic in &answer.related_topics {
        topic.flatten(&mut related);
    }
    if related.is_empty() {
        return None;
    }

    let lines: Vec<String> = related
        .into_iter()
        .take(MAX_RELATED)
        .map(|(text, url)| {
            if url.is_empty() {
                format!("• {}", text)
            } else {
                format!("• {} ({})", text, url)
            }
        })
        .collect();
    Some(format!("🔎 Ergebnisse für „{}“:\n{}", query, lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_abstract_preferred() {
        let answer: InstantAnswer = serde_json::from_value(json!({
            "Heading": "Rust",
            "AbstractText": "Rust ist eine Programmiersprache.",
            "AbstractURL": "https://de.wikipedia.org/wiki/Rust",
            "RelatedTopics": [{ "Text": "ignored", "FirstURL": "x" }]
        }))
        .unwrap();
        assert_eq!(
            format_answer("rust", &answer).unwrap(),
            "🔎 Rust: Rust ist eine Programmiersprache.\nhttps://de.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn test_related_topics_flattened() {
        let answer: InstantAnswer = serde_json::from_value(json!({
            "RelatedTopics": [
                { "Text": "Eins", "FirstURL": "https://a" },
                { "Name": "Gruppe", "Topics": [
                    { "Text": "Zwei", "FirstURL": "https://b" },
                    { "Text": "Drei", "FirstURL": "" },
                    { "Text": "Vier", "FirstURL": "https://d" }
                ]}
            ]
        }))
        .unwrap();
        assert_eq!(
            format_answer("zahlen", &answer).unwrap(),
            "🔎 Ergebnisse für „zahlen“:\n• Eins (https://a)\n• Zwei (https://b)\n• Drei"
        );
    }

    #[test]
    fn test_empty_answer() {
        assert!(format_answer("nichts", &InstantAnswer::default()).is_none());
    }

    #[tokio::test]
    async fn test_fetch_passes_query() {
        let router = Router::new().route(
            "/",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "Heading": params.get("q").cloned().unwrap_or_default(),
                    "AbstractText": "Treffer",
                    "AbstractURL": ""
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = IntegrationsConfig {
            web_search_endpoint: format!("http://127.0.0.1:{}/", addr.port()),
            timeout_ms: 2_000,
            ..IntegrationsConfig::default()
        };
        let client = WebSearchClient::from_config(&config).unwrap();
        let reply = client
            .fetch(&UtilityRequest::WebSearch {
                query: "beste Kelle".into(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "🔎 beste Kelle: Treffer");
    }
}
