//! HTTP Endpoints
//!
//! Inbound webhook for the message transport plus admin and health routes.

use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use catalog_chat_core::InboundMessage;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::state::AppState;

const LOCAL_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.config.server.cors_origins,
        state.config.server.cors_enabled,
    );
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        // Transport webhook
        .route("/api/messages", post(receive_message))
        // Admin
        .route("/admin/rebuild-index", post(rebuild_index))
        // Health and metrics
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        .with_state(state)
}

fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(%origin, "Invalid CORS origin");
                None
            })
        })
        .collect();

    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if parsed_origins.is_empty() {
        tracing::info!(origin = LOCAL_ORIGIN, "No usable CORS origins configured, defaulting to localhost");
        return base.allow_origin(HeaderValue::from_static(LOCAL_ORIGIN));
    }

    tracing::info!(origins = parsed_origins.len(), "CORS configured");
    base.allow_origin(parsed_origins).allow_credentials(true)
}

/// Dispatch one transport message; 204 when it was dropped before routing
async fn receive_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> Response {
    match state.dispatcher.dispatch(&message).await {
        Some(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn rebuild_index(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.dispatcher.rebuild_index().await;
    tracing::info!(status = ?outcome.status, "Admin rebuild requested");
    Json(outcome)
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'static str,
    version: &'static str,
    environment: String,
    catalog_backend: &'a str,
    catalog_entries: Option<usize>,
    lexicon_mined: usize,
    lexicon_hints: usize,
    fallback_model: Option<&'a str>,
    utilities: usize,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let dispatcher = &state.dispatcher;
    let lexicon = dispatcher.lexicon_stats();

    let body = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: format!("{:?}", state.config.environment).to_lowercase(),
        catalog_backend: dispatcher.catalog().backend_name(),
        catalog_entries: dispatcher.catalog().entry_count(),
        lexicon_mined: lexicon.mined,
        lexicon_hints: lexicon.hints,
        fallback_model: dispatcher.fallback_model(),
        utilities: dispatcher.utility_count(),
    };

    Json(serde_json::to_value(body).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use catalog_chat_agent::{Collaborators, Dispatcher};
    use catalog_chat_catalog::CatalogGateway;
    use catalog_chat_config::Settings;
    use catalog_chat_core::{CatalogBackend, CatalogHit, LexiconSource, Result, SearchMode};
    use catalog_chat_text_processing::LexiconStore;
    use catalog_chat_tools::UtilityRegistry;
    use tower::ServiceExt;

    struct StaticCatalog;

    #[async_trait]
    impl CatalogBackend for StaticCatalog {
        async fn search(&self, query: &str, _mode: SearchMode) -> Result<Option<CatalogHit>> {
            if query.contains("505.02") {
                return Ok(Some(CatalogHit::new("* Glättkelle\n  Bestell-Nr.: 505.02")));
            }
            Ok(None)
        }

        async fn rebuild(&self) -> Result<usize> {
            Ok(7)
        }

        fn name(&self) -> &str {
            "static"
        }

        fn entry_count(&self) -> Option<usize> {
            Some(7)
        }
    }

    struct Records;

    impl LexiconSource for Records {
        fn record_texts(&self) -> Result<Vec<String>> {
            Ok(vec!["Glättkelle Edelstahl 505.02".to_string()])
        }
    }

    fn test_state() -> AppState {
        let settings = Settings::default();
        let lexicon = Arc::new(LexiconStore::with_default_hints());
        let dispatcher = Dispatcher::new(
            Collaborators {
                lexicon,
                lexicon_source: Arc::new(Records),
                catalog: Arc::new(CatalogGateway::new(Arc::new(StaticCatalog), &settings.catalog)),
                utilities: Arc::new(UtilityRegistry::new(Duration::from_secs(1))),
                fallback: None,
            },
            &settings.transport,
            &settings.fallback,
        );
        AppState::new(settings, dispatcher)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_message_with_order_number_returns_catalog_reply() {
        let app = create_router(test_state());
        let response = app
            .oneshot(post_json(
                "/api/messages",
                serde_json::json!({"sender": "49170@s.whatsapp.net", "text": "505.02"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["intent"], "catalog_product");
        assert_eq!(body["status"], "answered");
        assert!(body["reply"].as_str().unwrap().contains("Glättkelle"));
    }

    #[tokio::test]
    async fn test_own_message_is_dropped() {
        let app = create_router(test_state());
        let response = app
            .oneshot(post_json(
                "/api/messages",
                serde_json::json!({"sender": "me", "text": "505.02", "from_me": true}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_greeting_without_fallback_is_acknowledged() {
        let app = create_router(test_state());
        let response = app
            .oneshot(post_json(
                "/api/messages",
                serde_json::json!({"sender": "49170", "text": "Hallo"}),
            ))
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["intent"], "chit_chat_fallback");
        assert_eq!(body["status"], "acknowledged");
    }

    #[tokio::test]
    async fn test_rebuild_and_health() {
        let state = test_state();
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_json("/admin/rebuild-index", serde_json::json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "answered");
        assert!(body["reply"].as_str().unwrap().contains("7 Einträge"));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["catalog_backend"], "static");
        assert_eq!(body["catalog_entries"], 7);
        assert!(body["lexicon_mined"].as_u64().unwrap() > 0);
        assert!(body["fallback_model"].is_null());
    }

    #[tokio::test]
    async fn test_metrics_disabled_returns_not_found() {
        let app = create_router(test_state());
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_layer_tolerates_invalid_origins() {
        let _ = build_cors_layer(&["bad\norigin".to_string()], true);
        let _ = build_cors_layer(&["https://shop.example".to_string()], true);
        let _ = build_cors_layer(&[], false);
    }
}
