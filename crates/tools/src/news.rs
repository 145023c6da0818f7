//! Headlines via NewsAPI top-headlines

use std::time::Duration;

use async_trait::async_trait;
use catalog_chat_config::IntegrationsConfig;
use catalog_chat_core::{UtilityKind, UtilityRequest};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{client, get_json};
use crate::{IntegrationError, UtilityTool};

const MAX_HEADLINES: usize = 5;

pub struct NewsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    country: String,
}

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(default)]
    name: Option<String>,
}

impl NewsClient {
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            client: client(Duration::from_millis(config.timeout_ms))?,
            endpoint: config.news_endpoint.clone(),
            api_key: config.news_api_key.clone().filter(|k| !k.is_empty()),
            country: config.news_country.clone(),
        })
    }
}

#[async_trait]
impl UtilityTool for NewsClient {
    fn kind(&self) -> UtilityKind {
        UtilityKind::News
    }

    async fn fetch(&self, request: &UtilityRequest) -> Result<String, IntegrationError> {
        let UtilityRequest::News { topic } = request else {
            return Err(IntegrationError::InvalidRequest("expected news request".into()));
        };
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| IntegrationError::NotConfigured("news API key".into()))?;

        let page_size = MAX_HEADLINES.to_string();
        let mut params = vec![
            ("country", self.country.as_str()),
            ("pageSize", page_size.as_str()),
        ];
        if let Some(topic) = topic.as_deref() {
            params.push(("q", topic));
        }

        let request = self
            .client
            .get(&self.endpoint)
            .header("X-Api-Key", api_key)
            .query(&params);
        let response: HeadlinesResponse = get_json(request, "news").await?;

        let lines: Vec<String> = response
            .articles
            .iter()
            .filter_map(|article| {
                let title = article.title.as_deref()?.trim();
                if title.is_empty() || title == "[Removed]" {
                    return None;
                }
                Some(match article.source.as_ref().and_then(|s| s.name.as_deref()) {
                    Some(source) if !title.ends_with(source) => format!("{} ({})", title, source),
                    _ => title.to_string(),
                })
            })
            .take(MAX_HEADLINES)
            .enumerate()
            .map(|(i, line)| format!("{}. {}", i + 1, line))
            .collect();

        if lines.is_empty() {
            return Err(IntegrationError::NotFound(match topic {
                Some(t) => format!("Nachrichten zu {}", t),
                None => "Nachrichten".into(),
            }));
        }

        let header = match topic {
            Some(t) => format!("📰 Schlagzeilen zu „{}“:", t),
            None => "📰 Aktuelle Schlagzeilen:".to_string(),
        };
        Ok(format!("{}\n{}", header, lines.join("\n")))
    }
}
