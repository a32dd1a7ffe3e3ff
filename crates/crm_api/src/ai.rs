//! Typed payloads and calls for the assistant (`/ai/*`) endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::client::Gateway;
use crate::error::GatewayError;
use crate::url::{encode_path_segment, QueryParams};

pub const CHAT_PATH: &str = "/ai/chat";
pub const SUGGESTIONS_PATH: &str = "/ai/suggestions";
pub const GENERATE_OFFER_PATH: &str = "/ai/generate-offer";
pub const GENERATE_EMAIL_PATH: &str = "/ai/generate-email";
pub const ANALYZE_CLIENT_PATH: &str = "/ai/analyze-client";
pub const HISTORY_PATH: &str = "/ai/history";

/// Speaker of one history entry sent upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// Structured instruction embedded in an assistant reply.
///
/// `kind` is kept as the raw wire string so kinds added by the backend later
/// still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub payload: Map<String, Value>,
}

impl AssistantAction {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            label: None,
            payload: Map::new(),
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Payload field rendered as a path segment. Numbers and strings qualify.
    pub fn payload_str(&self, key: &str) -> Option<String> {
        match self.payload.get(key)? {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub actions: Vec<AssistantAction>,
}

/// One proactive hint shown before the user asks anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProactiveSuggestion {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<AssistantAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionsSnapshot {
    #[serde(default)]
    pub suggestions: Vec<ProactiveSuggestion>,
    /// Dashboard counters; shape is owned by the backend.
    #[serde(default)]
    pub stats: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDraftRequest {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDraftItem {
    pub description: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit_price: f64,
}

fn default_quantity() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub items: Vec<OfferDraftItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
}

impl OfferDraft {
    pub fn total(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.quantity * item.unit_price)
            .sum()
    }
}

/// The fixed set of email drafts the assistant can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailIntent {
    FollowUp,
    OfferSent,
    PaymentReminder,
    ThankYou,
}

impl EmailIntent {
    pub const ALL: [EmailIntent; 4] = [
        Self::FollowUp,
        Self::OfferSent,
        Self::PaymentReminder,
        Self::ThankYou,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "follow_up" => Self::FollowUp,
            "offer_sent" => Self::OfferSent,
            "payment_reminder" => Self::PaymentReminder,
            "thank_you" => Self::ThankYou,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FollowUp => "follow_up",
            Self::OfferSent => "offer_sent",
            Self::PaymentReminder => "payment_reminder",
            Self::ThankYou => "thank_you",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDraftRequest {
    pub intent: EmailIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl EmailDraftRequest {
    pub fn new(intent: EmailIntent) -> Self {
        Self {
            intent,
            client_id: None,
            offer_id: None,
            context: None,
        }
    }

    pub fn for_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn for_offer(mut self, offer_id: impl Into<String>) -> Self {
        self.offer_id = Some(offer_id.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientAnalysis {
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl Gateway {
    /// `POST /ai/chat`.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, GatewayError> {
        self.post(CHAT_PATH, request).await?.into_result()
    }

    /// `GET /ai/suggestions`.
    pub async fn suggestions(&self) -> Result<SuggestionsSnapshot, GatewayError> {
        self.get(SUGGESTIONS_PATH, QueryParams::new())
            .await?
            .into_result()
    }

    /// `POST /ai/generate-offer`.
    pub async fn generate_offer(
        &self,
        request: &OfferDraftRequest,
    ) -> Result<OfferDraft, GatewayError> {
        self.post(GENERATE_OFFER_PATH, request).await?.into_result()
    }

    /// `POST /ai/generate-email`.
    pub async fn generate_email(
        &self,
        request: &EmailDraftRequest,
    ) -> Result<EmailDraft, GatewayError> {
        self.post(GENERATE_EMAIL_PATH, request).await?.into_result()
    }

    /// `GET /ai/analyze-client/{client_id}`.
    pub async fn analyze_client(&self, client_id: &str) -> Result<ClientAnalysis, GatewayError> {
        let segment = encode_path_segment(client_id.trim());
        let path = format!("{ANALYZE_CLIENT_PATH}/{segment}");
        self.get(&path, QueryParams::new()).await?.into_result()
    }

    /// `DELETE /ai/history`.
    pub async fn clear_history(&self) -> Result<(), GatewayError> {
        self.delete::<Value>(HISTORY_PATH).await?.into_optional()?;
        Ok(())
    }
}
