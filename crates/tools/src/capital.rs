//! Capital cities via REST Countries
//!
//! German country names are not indexed by `/name`, so a miss there is
//! retried against `/translation`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use catalog_chat_config::IntegrationsConfig;
use catalog_chat_core::{UtilityKind, UtilityRequest};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{client, get_json, with_segment};
use crate::{IntegrationError, UtilityTool};

const FIELDS: &str = "name,capital,translations";

pub struct CapitalClient {
    client: Client,
    base: String,
}

#[derive(Debug, Deserialize)]
struct Country {
    name: CountryName,
    #[serde(default)]
    capital: Vec<String>,
    #[serde(default)]
    translations: HashMap<String, CountryName>,
}

#[derive(Debug, Deserialize)]
struct CountryName {
    common: String,
}

impl Country {
    fn german_name(&self) -> &str {
        self.translations
            .get("deu")
            .map(|n| n.common.as_str())
            .unwrap_or(&self.name.common)
    }

    fn matches(&self, query: &str) -> bool {
        self.name.common.eq_ignore_ascii_case(query)
            || self.german_name().to_lowercase() == query.to_lowercase()
    }
}

impl CapitalClient {
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            client: client(Duration::from_millis(config.timeout_ms))?,
            base: config.countries_endpoint.trim_end_matches('/').to_string(),
        })
    }

    async fn lookup(&self, path: &str, country: &str) -> Result<Vec<Country>, IntegrationError> {
        let url = with_segment(&format!("{}/{}", self.base, path), country)?;
        let request = self.client.get(url).query(&[("fields", FIELDS)]);
        get_json(request, "countries").await
    }
}

#[async_trait]
impl UtilityTool for CapitalClient {
    fn kind(&self) -> UtilityKind {
        UtilityKind::Capital
    }

    async fn fetch(&self, request: &UtilityRequest) -> Result<String, IntegrationError> {
        let UtilityRequest::Capital { country } = request else {
            return Err(IntegrationError::InvalidRequest("expected capital request".into()));
        };
        let country = country.trim();
        if country.is_empty() {
            return Err(IntegrationError::InvalidRequest("empty country".into()));
        }

        let countries = match self.lookup("name", country).await {
            Ok(found) if !found.is_empty() => found,
            Ok(_) | Err(IntegrationError::NotFound(_)) => {
                tracing::debug!(country, "Retrying capital lookup by translation");
                self.lookup("translation", country).await?
            },
            Err(e) => return Err(e),
        };

        let best = countries
            .iter()
            .find(|c| c.matches(country))
            .or_else(|| countries.first())
            .ok_or_else(|| IntegrationError::NotFound(country.to_string()))?;

        match best.capital.as_slice() {
            [] => Err(IntegrationError::NotFound(format!(
                "Hauptstadt von {}",
                best.german_name()
            ))),
            [single] => Ok(format!(
                "🏛️ Die Hauptstadt von {} ist {}.",
                best.german_name(),
                single
            )),
            many => Ok(format!(
                "🏛️ Die Hauptstädte von {} sind {}.",
                best.german_name(),
                many.join(", ")
            )),
        }
    }
}
