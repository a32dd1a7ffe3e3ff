#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::{self, Future};
use std::sync::{Mutex, MutexGuard};

use assistant::AssistantBackend;
use crm_api::{
    ChatReply, ChatRequest, ClientAnalysis, EmailDraft, EmailDraftRequest, GatewayError,
    OfferDraft, OfferDraftRequest, SuggestionsSnapshot,
};

/// Backend that answers chat turns from a queue and fails everything else
/// unless a canned value is set.
#[derive(Default)]
pub struct CannedBackend {
    chat: Mutex<VecDeque<Result<ChatReply, GatewayError>>>,
    suggestions: Mutex<Option<Result<SuggestionsSnapshot, GatewayError>>>,
    email: Mutex<Option<Result<EmailDraft, GatewayError>>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub email_requests: Mutex<Vec<EmailDraftRequest>>,
    pub clear_calls: Mutex<usize>,
}

impl CannedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(self, reply: Result<ChatReply, GatewayError>) -> Self {
        lock_unpoisoned(&self.chat).push_back(reply);
        self
    }

    pub fn with_suggestions(self, snapshot: Result<SuggestionsSnapshot, GatewayError>) -> Self {
        *lock_unpoisoned(&self.suggestions) = Some(snapshot);
        self
    }

    pub fn with_email(self, draft: Result<EmailDraft, GatewayError>) -> Self {
        *lock_unpoisoned(&self.email) = Some(draft);
        self
    }

    pub fn chat_messages(&self) -> Vec<String> {
        lock_unpoisoned(&self.chat_requests)
            .iter()
            .map(|request| request.message.clone())
            .collect()
    }
}

fn unscripted<T>() -> Result<T, GatewayError> {
    Err(GatewayError::network("no canned reply"))
}

impl AssistantBackend for CannedBackend {
    fn chat(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, GatewayError>> + Send {
        lock_unpoisoned(&self.chat_requests).push(request);
        let reply = lock_unpoisoned(&self.chat)
            .pop_front()
            .unwrap_or_else(unscripted);
        future::ready(reply)
    }

    fn suggestions(
        &self,
    ) -> impl Future<Output = Result<SuggestionsSnapshot, GatewayError>> + Send {
        let snapshot = lock_unpoisoned(&self.suggestions)
            .clone()
            .unwrap_or_else(unscripted);
        future::ready(snapshot)
    }

    fn generate_offer(
        &self,
        _request: OfferDraftRequest,
    ) -> impl Future<Output = Result<OfferDraft, GatewayError>> + Send {
        future::ready(unscripted())
    }

    fn generate_email(
        &self,
        request: EmailDraftRequest,
    ) -> impl Future<Output = Result<EmailDraft, GatewayError>> + Send {
        lock_unpoisoned(&self.email_requests).push(request);
        let draft = lock_unpoisoned(&self.email).clone().unwrap_or_else(unscripted);
        future::ready(draft)
    }

    fn analyze_client(
        &self,
        _client_id: String,
    ) -> impl Future<Output = Result<ClientAnalysis, GatewayError>> + Send {
        future::ready(unscripted())
    }

    fn clear_history(&self) -> impl Future<Output = Result<(), GatewayError>> + Send {
        *lock_unpoisoned(&self.clear_calls) += 1;
        future::ready(Ok(()))
    }
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
