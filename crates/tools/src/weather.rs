//! Weather via Open-Meteo
//!
//! Two calls: geocode the city, then fetch a two-day daily forecast and
//! pick today or tomorrow.

use std::time::Duration;

use async_trait::async_trait;
use catalog_chat_config::IntegrationsConfig;
use catalog_chat_core::{UtilityKind, UtilityRequest};
use reqwest::Client;
use serde::Deserialize;

use crate::http::{client, get_json};
use crate::{IntegrationError, UtilityTool};

pub struct WeatherClient {
    client: Client,
    geocoding_endpoint: String,
    forecast_endpoint: String,
    default_city: String,
}

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Clone, Deserialize)]
struct Place {
    name: String,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Daily,
}

#[derive(Debug, Deserialize)]
struct Daily {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<u8>>,
}

impl WeatherClient {
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            client: client(Duration::from_millis(config.timeout_ms))?,
            geocoding_endpoint: config.geocoding_endpoint.clone(),
            forecast_endpoint: config.forecast_endpoint.clone(),
            default_city: config.default_weather_city.clone(),
        })
    }

    async fn geocode(&self, city: &str) -> Result<Place, IntegrationError> {
        let request = self.client.get(&self.geocoding_endpoint).query(&[
            ("name", city),
            ("count", "1"),
            ("language", "de"),
            ("format", "json"),
        ]);
        let response: GeocodingResponse = get_json(request, "geocoding").await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| IntegrationError::NotFound(format!("Ort {}", city)))
    }

    async fn forecast(&self, place: &Place) -> Result<Daily, IntegrationError> {
        let request = self.client.get(&self.forecast_endpoint).query(&[
            ("latitude", place.latitude.to_string()),
            ("longitude", place.longitude.to_string()),
            (
                "daily",
                "weathercode,temperature_2m_max,temperature_2m_min,precipitation_sum".to_string(),
            ),
            ("timezone", "auto".to_string()),
            ("forecast_days", "2".to_string()),
        ]);
        let response: ForecastResponse = get_json(request, "forecast").await?;
        Ok(response.daily)
    }
}

#[async_trait]
impl UtilityTool for WeatherClient {
    fn kind(&self) -> UtilityKind {
        UtilityKind::Weather
    }

    async fn fetch(&self, request: &UtilityRequest) -> Result<String, IntegrationError> {
        let UtilityRequest::Weather { city, tomorrow } = request else {
            return Err(IntegrationError::InvalidRequest("expected weather request".into()));
        };
        let city = city.as_deref().unwrap_or(&self.default_city);

        let place = self.geocode(city).await?;
        let daily = self.forecast(&place).await?;
        tracing::debug!(city = %place.name, tomorrow, "Weather forecast fetched");

        format_day(&place, &daily, if *tomorrow { 1 } else { 0 })
    }
}

fn format_day(place: &Place, daily: &Daily, index: usize) -> Result<String, IntegrationError> {
    let missing = || IntegrationError::InvalidResponse("forecast day missing".into());
    let date = daily.time.get(index).ok_or_else(missing)?;
    let max = daily.temperature_2m_max.get(index).copied().flatten().ok_or_else(missing)?;
    let min = daily.temperature_2m_min.get(index).copied().flatten().ok_or_else(missing)?;
    let rain = daily.precipitation_sum.get(index).copied().flatten();
    let code = daily.weathercode.get(index).copied().flatten();

    let day = if index == 0 { "heute" } else { "morgen" };
    let location = match &place.country {
        Some(country) => format!("{} ({})", place.name, country),
        None => place.name.clone(),
    };

    let mut reply = format!("🌤️ Wetter in {} {}, {}:", location, day, date);
    if let Some(code) = code {
        reply.push_str(&format!(" {},", describe(code)));
    }
    reply.push_str(&format!(" {:.1} bis {:.1} °C", min, max));
    if let Some(rain) = rain {
        reply.push_str(&format!(", Niederschlag {:.1} mm", rain));
    }
    Ok(reply)
}

/// WMO weather interpretation codes
fn describe(code: u8) -> &'static str {
    match code {
        0 => "klar",
        1 | 2 => "teilweise bewölkt",
        3 => "bedeckt",
        45 | 48 => "Nebel",
        51..=57 => "Nieselregen",
        61..=67 => "Regen",
        71..=77 => "Schnee",
        80..=82 => "Regenschauer",
        85 | 86 => "Schneeschauer",
        95..=99 => "Gewitter",
        _ => "wechselhaft",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://127.0.0.1:{}", addr.port())
    }

    fn mock() -> Router {
        Router::new()
            .route(
                "/geo",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    if params.get("name").map(String::as_str) == Some("Atlantis") {
                        Json(json!({}))
                    } else {
                        Json(json!({ "results": [{
                            "name": params.get("name").cloned().unwrap_or_default(),
                            "latitude": 52.52,
                            "longitude": 13.41,
                            "country": "Deutschland"
                        }]}))
                    }
                }),
            )
            .route(
                "/forecast",
                get(|| async {
                    Json(json!({ "daily": {
                        "time": ["2026-10-15", "2026-10-16"],
                        "weathercode": [3, 61],
                        "temperature_2m_max": [14.2, 11.0],
                        "temperature_2m_min": [6.0, 5.5],
                        "precipitation_sum": [0.0, 4.3]
                    }}))
                }),
            )
    }

    async fn weather_client() -> WeatherClient {
        let base = serve(mock()).await;
        let config = IntegrationsConfig {
            geocoding_endpoint: format!("{}/geo", base),
            forecast_endpoint: format!("{}/forecast", base),
            default_weather_city: "Berlin".into(),
            timeout_ms: 2_000,
            ..IntegrationsConfig::default()
        };
        WeatherClient::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_today_with_default_city() {
        let client = weather_client().await;
        let reply = client
            .fetch(&UtilityRequest::Weather {
                city: None,
                tomorrow: false,
            })
            .await
            .unwrap();
        assert_eq!(
            reply,
            "🌤️ Wetter in Berlin (Deutschland) heute, 2026-10-15: bedeckt, 6.0 bis 14.2 °C, Niederschlag 0.0 mm"
        );
    }

    #[tokio::test]
    async fn test_tomorrow() {
        let client = weather_client().await;
        let reply = client
            .fetch(&UtilityRequest::Weather {
                city: Some("Hamburg".into()),
                tomorrow: true,
            })
            .await
            .unwrap();
        assert!(reply.contains("Hamburg"));
        assert!(reply.contains("morgen, 2026-10-16: Regen"));
        assert!(reply.contains("4.3 mm"));
    }

    #[tokio::test]
    async fn test_unknown_city() {
        let client = weather_client().await;
        let err = client
            .fetch(&UtilityRequest::Weather {
                city: Some("Atlantis".into()),
                tomorrow: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::NotFound(_)));
    }

    #[test]
    fn test_describe_codes() {
        assert_eq!(describe(0), "klar");
        assert_eq!(describe(63), "Regen");
        assert_eq!(describe(96), "Gewitter");
    }
}
