//! Inbound message and dispatch outcome types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::intent::IntentKind;

/// A single message delivered by the transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Message id (generated when the transport does not supply one)
    #[serde(default = "new_message_id")]
    pub id: String,
    /// Sender address as reported by the transport
    pub sender: String,
    /// Raw message text
    pub text: String,
    /// Authored by this process itself
    #[serde(default)]
    pub from_me: bool,
    /// Originates from a multi-party thread
    #[serde(default)]
    pub is_group: bool,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl InboundMessage {
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            sender: sender.into(),
            text: text.into(),
            from_me: false,
            is_group: false,
            received_at: Utc::now(),
        }
    }

    /// Whether the message should reach classification at all
    ///
    /// Own messages and multi-party threads are dropped before dispatch, as
    /// are messages without any visible text.
    pub fn should_dispatch(&self, drop_own: bool, drop_group: bool) -> bool {
        if drop_own && self.from_me {
            return false;
        }
        if drop_group && self.is_group {
            return false;
        }
        !self.text.trim().is_empty()
    }
}

/// How the handler resolved the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Handler produced an answer
    Answered,
    /// Catalog-bound message without a catalog hit
    NotFound,
    /// Collaborator failure or handler crash, rendered as a short reply
    Failed,
    /// Fixed acknowledgement (fallback disabled)
    Acknowledged,
}

/// The one reply produced for one inbound message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub reply: String,
    pub intent: IntentKind,
    pub status: OutcomeStatus,
}

impl DispatchOutcome {
    pub fn answered(intent: IntentKind, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            intent,
            status: OutcomeStatus::Answered,
        }
    }

    pub fn not_found(intent: IntentKind, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            intent,
            status: OutcomeStatus::NotFound,
        }
    }

    pub fn failed(intent: IntentKind, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            intent,
            status: OutcomeStatus::Failed,
        }
    }

    pub fn acknowledged(intent: IntentKind, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            intent,
            status: OutcomeStatus::Acknowledged,
        }
    }
}
