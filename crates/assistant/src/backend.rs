use std::future::Future;

use crm_api::{
    ChatReply, ChatRequest, ClientAnalysis, EmailDraft, EmailDraftRequest, Gateway,
    GatewayError, OfferDraft, OfferDraftRequest, SuggestionsSnapshot,
};

/// The AI endpoints the assistant drives.
///
/// [`Gateway`] is the production implementation. Tests substitute scripted
/// backends to control reply timing and outcomes.
pub trait AssistantBackend: Send + Sync + 'static {
    fn chat(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, GatewayError>> + Send;

    fn suggestions(&self) -> impl Future<Output = Result<SuggestionsSnapshot, GatewayError>> + Send;

    fn generate_offer(
        &self,
        request: OfferDraftRequest,
    ) -> impl Future<Output = Result<OfferDraft, GatewayError>> + Send;

    fn generate_email(
        &self,
        request: EmailDraftRequest,
    ) -> impl Future<Output = Result<EmailDraft, GatewayError>> + Send;

    fn analyze_client(
        &self,
        client_id: String,
    ) -> impl Future<Output = Result<ClientAnalysis, GatewayError>> + Send;

    fn clear_history(&self) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

impl AssistantBackend for Gateway {
    fn chat(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, GatewayError>> + Send {
        async move { Gateway::chat(self, &request).await }
    }

    fn suggestions(&self) -> impl Future<Output = Result<SuggestionsSnapshot, GatewayError>> + Send {
        Gateway::suggestions(self)
    }

    fn generate_offer(
        &self,
        request: OfferDraftRequest,
    ) -> impl Future<Output = Result<OfferDraft, GatewayError>> + Send {
        async move { Gateway::generate_offer(self, &request).await }
    }

    fn generate_email(
        &self,
        request: EmailDraftRequest,
    ) -> impl Future<Output = Result<EmailDraft, GatewayError>> + Send {
        async move { Gateway::generate_email(self, &request).await }
    }

    fn analyze_client(
        &self,
        client_id: String,
    ) -> impl Future<Output = Result<ClientAnalysis, GatewayError>> + Send {
        async move { Gateway::analyze_client(self, &client_id).await }
    }

    fn clear_history(&self) -> impl Future<Output = Result<(), GatewayError>> + Send {
        Gateway::clear_history(self)
    }
}
