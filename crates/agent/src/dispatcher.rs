//! Per-message dispatcher
//!
//! Routes one inbound message, runs exactly one handler for it and always
//! produces one outcome for a message that reached dispatch. The handler runs
//! in its own task so a panic is contained and answered with a generic reply.

use std::sync::Arc;
use std::time::Instant;

use catalog_chat_catalog::{build_backend, clean_query, CatalogGateway};
use catalog_chat_config::{FallbackConfig, Settings, TransportConfig};
use catalog_chat_core::{
    DispatchOutcome, GenerativeModel, InboundMessage, Intent, IntentKind, LexiconSource,
    UtilityRequest,
};
use catalog_chat_llm::{build_fallback, LlmError};
use catalog_chat_text_processing::{format_number, LexiconStats, LexiconStore};
use catalog_chat_tools::UtilityRegistry;

use crate::replies;
use crate::router::IntentRouter;
use crate::AgentError;

/// External collaborators the handlers talk to
pub struct Collaborators {
    pub lexicon: Arc<LexiconStore>,
    pub lexicon_source: Arc<dyn LexiconSource>,
    pub catalog: Arc<CatalogGateway>,
    pub utilities: Arc<UtilityRegistry>,
    /// `None` when the generative fallback is disabled
    pub fallback: Option<Arc<dyn GenerativeModel>>,
}

struct Handlers {
    lexicon: Arc<LexiconStore>,
    lexicon_source: Arc<dyn LexiconSource>,
    catalog: Arc<CatalogGateway>,
    utilities: Arc<UtilityRegistry>,
    fallback: Option<Arc<dyn GenerativeModel>>,
    disabled_reply: String,
}

pub struct Dispatcher {
    router: IntentRouter,
    handlers: Arc<Handlers>,
    drop_own: bool,
    drop_group: bool,
}

impl Dispatcher {
    pub fn new(
        collaborators: Collaborators,
        transport: &TransportConfig,
        fallback: &FallbackConfig,
    ) -> Self {
        let Collaborators {
            lexicon,
            lexicon_source,
            catalog,
            utilities,
            fallback: model,
        } = collaborators;

        Self {
            router: IntentRouter::new(Arc::clone(&lexicon)),
            handlers: Arc::new(Handlers {
                lexicon,
                lexicon_source,
                catalog,
                utilities,
                fallback: model,
                disabled_reply: fallback.disabled_reply.clone(),
            }),
            drop_own: transport.drop_own_messages,
            drop_group: transport.drop_group_messages,
        }
    }

    /// Wire every collaborator from settings and build the initial lexicon
    pub fn from_settings(settings: &Settings) -> Result<Self, AgentError> {
        let handles = build_backend(&settings.catalog)?;

        let lexicon = Arc::new(LexiconStore::with_default_hints());
        lexicon.rebuild(handles.lexicon_source.as_ref());

        let catalog = Arc::new(CatalogGateway::new(handles.backend, &settings.catalog));
        let utilities = Arc::new(UtilityRegistry::from_config(&settings.integrations)?);
        let fallback = match build_fallback(&settings.fallback) {
            Ok(model) => model,
            Err(LlmError::Configuration(reason)) => {
                tracing::warn!(%reason, "Generative fallback unavailable, chit-chat gets the fixed reply");
                None
            },
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            backend = catalog.backend_name(),
            entries = ?catalog.entry_count(),
            lexicon_mined = lexicon.stats().mined,
            fallback_enabled = fallback.is_some(),
            "Dispatcher initialized"
        );

        Ok(Self::new(
            Collaborators {
                lexicon,
                lexicon_source: handles.lexicon_source,
                catalog,
                utilities,
                fallback,
            },
            &settings.transport,
            &settings.fallback,
        ))
    }

    pub fn router(&self) -> &IntentRouter {
        &self.router
    }

    pub fn lexicon_stats(&self) -> LexiconStats {
        self.handlers.lexicon.stats()
    }

    pub fn catalog(&self) -> &Arc<CatalogGateway> {
        &self.handlers.catalog
    }

    /// Model answering chit-chat, `None` when the fallback is disabled
    pub fn fallback_model(&self) -> Option<&str> {
        self.handlers.fallback.as_ref().map(|m| m.model_name())
    }

    pub fn utility_count(&self) -> usize {
        self.handlers.utilities.len()
    }

    /// Classify and answer one message
    ///
    /// Returns `None` only for messages dropped before classification (own
    /// messages, multi-party threads, empty text).
    pub async fn dispatch(&self, message: &InboundMessage) -> Option<DispatchOutcome> {
        if !message.should_dispatch(self.drop_own, self.drop_group) {
            tracing::debug!(
                sender = %message.sender,
                from_me = message.from_me,
                is_group = message.is_group,
                "Message dropped before dispatch"
            );
            return None;
        }

        let started = Instant::now();
        let intent = self.router.route(&message.text);
        let kind = intent.kind();
        let outcome = self.run(intent, message.text.clone()).await;

        let elapsed = started.elapsed();
        metrics::counter!("catalog_chat_messages_total", "intent" => kind.as_str()).increment(1);
        metrics::histogram!("catalog_chat_dispatch_seconds", "intent" => kind.as_str())
            .record(elapsed.as_secs_f64());
        tracing::info!(
            sender = %message.sender,
            intent = kind.as_str(),
            status = ?outcome.status,
            latency_ms = elapsed.as_millis() as u64,
            "Message dispatched"
        );

        Some(outcome)
    }

    /// Run the rebuild intent directly (admin surface)
    pub async fn rebuild_index(&self) -> DispatchOutcome {
        self.run(Intent::RebuildIndex, String::new()).await
    }

    async fn run(&self, intent: Intent, text: String) -> DispatchOutcome {
        let kind = intent.kind();
        let handlers = Arc::clone(&self.handlers);
        let task = tokio::spawn(async move { handlers.handle(intent, &text).await });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(intent = kind.as_str(), error = %e, "Handler crashed");
                DispatchOutcome::failed(kind, replies::GENERIC_FAILURE)
            },
        }
    }
}

impl Handlers {
    async fn handle(&self, intent: Intent, text: &str) -> DispatchOutcome {
        let kind = intent.kind();
        match intent {
            Intent::RebuildIndex => self.rebuild().await,
            Intent::ExplicitCatalogSearch { query } | Intent::CatalogProduct { query } => {
                self.catalog(kind, &query).await
            },
            Intent::Arithmetic { value } => {
                DispatchOutcome::answered(kind, replies::arithmetic(&format_number(value)))
            },
            Intent::ChitChatFallback => self.chit_chat(text).await,
            other => match other.utility_request() {
                Some(request) => self.utility(kind, &request).await,
                None => DispatchOutcome::failed(kind, replies::GENERIC_FAILURE),
            },
        }
    }

    async fn rebuild(&self) -> DispatchOutcome {
        let kind = IntentKind::RebuildIndex;
        let entries = match self.catalog.rebuild().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Catalog rebuild failed");
                return DispatchOutcome::failed(kind, replies::rebuild_failed(&e.to_string()));
            },
        };

        let lexicon = Arc::clone(&self.lexicon);
        let source = Arc::clone(&self.lexicon_source);
        let tokens = match tokio::task::spawn_blocking(move || lexicon.rebuild(source.as_ref())).await
        {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(error = %e, "Lexicon rebuild task failed");
                return DispatchOutcome::failed(kind, replies::rebuild_failed(&e.to_string()));
            },
        };

        tracing::info!(entries, tokens, "Catalog index and lexicon rebuilt");
        DispatchOutcome::answered(kind, replies::rebuilt(entries, tokens))
    }

    /// Catalog-bound handler: a failure is an explicit "not found", never the fallback
    async fn catalog(&self, kind: IntentKind, query: &str) -> DispatchOutcome {
        match self.catalog.lookup(query).await {
            Ok(text) => DispatchOutcome::answered(kind, text),
            Err(failure) => {
                metrics::counter!("catalog_chat_catalog_misses_total").increment(1);
                let shown = clean_query(query);
                tracing::info!(
                    intent = kind.as_str(),
                    query = %shown,
                    reason = %failure,
                    "No catalog hit"
                );
                DispatchOutcome::not_found(kind, replies::catalog_failure(&shown, &failure))
            },
        }
    }

    async fn utility(&self, kind: IntentKind, request: &UtilityRequest) -> DispatchOutcome {
        match self.utilities.execute(request).await {
            Ok(reply) => DispatchOutcome::answered(kind, reply),
            Err(e) => DispatchOutcome::failed(kind, replies::utility_failure(&e)),
        }
    }

    async fn chit_chat(&self, text: &str) -> DispatchOutcome {
        let kind = IntentKind::ChitChatFallback;
        let Some(model) = &self.fallback else {
            return DispatchOutcome::acknowledged(kind, self.disabled_reply.clone());
        };

        match model.complete(text.trim()).await {
            Ok(reply) if !reply.trim().is_empty() => DispatchOutcome::answered(kind, reply.trim()),
            Ok(_) => DispatchOutcome::failed(kind, replies::GENERIC_FAILURE),
            Err(e) => {
                tracing::warn!(model = model.model_name(), error = %e, "Fallback failed");
                DispatchOutcome::failed(kind, replies::GENERIC_FAILURE)
            },
        }
    }
}
