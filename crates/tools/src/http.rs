//! Shared HTTP plumbing for the utility clients

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::IntegrationError;

const USER_AGENT: &str = concat!("catalog-chat/", env!("CARGO_PKG_VERSION"));

/// Build a client with the integration timeout applied
pub fn client(timeout: Duration) -> Result<Client, IntegrationError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| IntegrationError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and decode a JSON body, mapping HTTP status to errors
pub async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    what: &str,
) -> Result<T, IntegrationError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, what, &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| IntegrationError::InvalidResponse(format!("{}: {}", what, e)))
}

fn status_error(status: StatusCode, what: &str, body: &str) -> IntegrationError {
    match status {
        StatusCode::NOT_FOUND => IntegrationError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            IntegrationError::AuthFailed(format!("{} ({})", what, status))
        },
        StatusCode::TOO_MANY_REQUESTS => IntegrationError::RateLimited,
        StatusCode::BAD_REQUEST => IntegrationError::InvalidRequest(format!("{}: {}", what, body)),
        _ => IntegrationError::ConnectionFailed(format!("{} returned {}", what, status)),
    }
}

/// Append one percent-encoded path segment to a base URL
pub fn with_segment(base: &str, segment: &str) -> Result<Url, IntegrationError> {
    let mut url = Url::parse(base)
        .map_err(|e| IntegrationError::InvalidRequest(format!("Bad endpoint {}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| IntegrationError::InvalidRequest(format!("Endpoint cannot take a path: {}", base)))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_segment_encodes() {
        let url = with_segment("https://de.wikipedia.org/api/rest_v1/page/summary", "Albert Einstein").unwrap();
        assert_eq!(
            url.as_str(),
            "https://de.wikipedia.org/api/rest_v1/page/summary/Albert%20Einstein"
        );

        let url = with_segment("https://restcountries.com/v3.1/name/", "Côte").unwrap();
        assert_eq!(url.as_str(), "https://restcountries.com/v3.1/name/C%C3%B4te");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "x", ""),
            IntegrationError::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "x", ""),
            IntegrationError::RateLimited
        ));
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "x", ""),
            IntegrationError::AuthFailed(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY, "x", ""),
            IntegrationError::ConnectionFailed(_)
        ));
    }
}
