//! Request gateway for the quote-desk CRM backend.
//!
//! Every data operation funnels through [`Gateway`]: it builds URLs (dropping
//! empty query parameters), attaches a freshly acquired bearer credential,
//! parses the uniform [`Envelope`] and classifies failures into
//! [`GatewayError`] codes. It performs exactly one attempt per call.
//!
//! The crate contains no conversation state; see the `assistant` crate for
//! that.

pub mod ai;
pub mod client;
pub mod config;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod headers;
pub mod url;

pub use ai::{
    AssistantAction, ChatReply, ChatRequest, ChatRole, ClientAnalysis, EmailDraft,
    EmailDraftRequest, EmailIntent, HistoryEntry, OfferDraft, OfferDraftItem, OfferDraftRequest,
    ProactiveSuggestion, SuggestionsSnapshot,
};
pub use client::{Download, Gateway, RequestOptions};
pub use config::GatewayConfig;
pub use credentials::{
    CredentialSource, EnvCredential, NoCredential, SharedCredential, StaticCredential,
};
pub use envelope::{Envelope, EnvelopeError, ListMeta, Page};
pub use error::{ErrorCode, GatewayError, GatewayInitError};
pub use self::url::{encode_path_segment, QueryParams};

pub use reqwest::Method;
