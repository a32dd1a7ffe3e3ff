#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use assistant::AssistantBackend;
use crm_api::{
    ChatReply, ChatRequest, ClientAnalysis, EmailDraft, EmailDraftRequest, ErrorCode,
    GatewayError, OfferDraft, OfferDraftRequest, SuggestionsSnapshot,
};
use tokio::sync::oneshot;

type Outcome<T> = Result<T, GatewayError>;

/// What the backend does with the next call of one endpoint.
pub enum Step<T> {
    Ready(Outcome<T>),
    Deferred(oneshot::Receiver<Outcome<T>>),
    Stall,
}

struct Script<T> {
    steps: Mutex<VecDeque<Step<T>>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
        }
    }
}

impl<T> Script<T> {
    fn push(&self, step: Step<T>) {
        lock_unpoisoned(&self.steps).push_back(step);
    }

    fn defer(&self) -> oneshot::Sender<Outcome<T>> {
        let (sender, receiver) = oneshot::channel();
        self.push(Step::Deferred(receiver));
        sender
    }

    fn next(&self) -> Option<Step<T>> {
        lock_unpoisoned(&self.steps).pop_front()
    }
}

async fn play<T>(step: Option<Step<T>>) -> Outcome<T> {
    match step {
        None => Err(GatewayError::network("no scripted reply")),
        Some(Step::Ready(outcome)) => outcome,
        Some(Step::Deferred(receiver)) => match receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(GatewayError::network("scripted reply dropped")),
        },
        Some(Step::Stall) => std::future::pending().await,
    }
}

/// Backend whose replies are queued per endpoint by the test.
#[derive(Default)]
pub struct ScriptedBackend {
    chat: Script<ChatReply>,
    suggestions: Script<SuggestionsSnapshot>,
    offers: Script<OfferDraft>,
    emails: Script<EmailDraft>,
    analyses: Script<ClientAnalysis>,
    clears: Script<()>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    offer_requests: Mutex<Vec<OfferDraftRequest>>,
    email_requests: Mutex<Vec<EmailDraftRequest>>,
    analyzed_clients: Mutex<Vec<String>>,
    clear_calls: Mutex<usize>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chat(&self, outcome: Outcome<ChatReply>) {
        self.chat.push(Step::Ready(outcome));
    }

    pub fn defer_chat(&self) -> oneshot::Sender<Outcome<ChatReply>> {
        self.chat.defer()
    }

    pub fn stall_chat(&self) {
        self.chat.push(Step::Stall);
    }

    pub fn push_suggestions(&self, outcome: Outcome<SuggestionsSnapshot>) {
        self.suggestions.push(Step::Ready(outcome));
    }

    pub fn push_offer(&self, outcome: Outcome<OfferDraft>) {
        self.offers.push(Step::Ready(outcome));
    }

    pub fn defer_offer(&self) -> oneshot::Sender<Outcome<OfferDraft>> {
        self.offers.defer()
    }

    pub fn push_email(&self, outcome: Outcome<EmailDraft>) {
        self.emails.push(Step::Ready(outcome));
    }

    pub fn push_analysis(&self, outcome: Outcome<ClientAnalysis>) {
        self.analyses.push(Step::Ready(outcome));
    }

    pub fn push_clear(&self, outcome: Outcome<()>) {
        self.clears.push(Step::Ready(outcome));
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        lock_unpoisoned(&self.chat_requests).clone()
    }

    pub fn offer_requests(&self) -> Vec<OfferDraftRequest> {
        lock_unpoisoned(&self.offer_requests).clone()
    }

    pub fn email_requests(&self) -> Vec<EmailDraftRequest> {
        lock_unpoisoned(&self.email_requests).clone()
    }

    pub fn analyzed_clients(&self) -> Vec<String> {
        lock_unpoisoned(&self.analyzed_clients).clone()
    }

    pub fn clear_calls(&self) -> usize {
        *lock_unpoisoned(&self.clear_calls)
    }
}

impl AssistantBackend for ScriptedBackend {
    fn chat(&self, request: ChatRequest) -> impl Future<Output = Outcome<ChatReply>> + Send {
        lock_unpoisoned(&self.chat_requests).push(request);
        play(self.chat.next())
    }

    fn suggestions(&self) -> impl Future<Output = Outcome<SuggestionsSnapshot>> + Send {
        play(self.suggestions.next())
    }

    fn generate_offer(
        &self,
        request: OfferDraftRequest,
    ) -> impl Future<Output = Outcome<OfferDraft>> + Send {
        lock_unpoisoned(&self.offer_requests).push(request);
        play(self.offers.next())
    }

    fn generate_email(
        &self,
        request: EmailDraftRequest,
    ) -> impl Future<Output = Outcome<EmailDraft>> + Send {
        lock_unpoisoned(&self.email_requests).push(request);
        play(self.emails.next())
    }

    fn analyze_client(&self, client_id: String) -> impl Future<Output = Outcome<ClientAnalysis>> + Send {
        lock_unpoisoned(&self.analyzed_clients).push(client_id);
        play(self.analyses.next())
    }

    fn clear_history(&self) -> impl Future<Output = Outcome<()>> + Send {
        *lock_unpoisoned(&self.clear_calls) += 1;
        play(self.clears.next())
    }
}

pub fn reply(message: &str) -> ChatReply {
    ChatReply {
        message: message.to_string(),
        suggestions: Vec::new(),
        actions: Vec::new(),
    }
}

pub fn backend_error(code: &str, http_status: u16, message: &str) -> GatewayError {
    GatewayError::new(message, ErrorCode::parse(code), http_status)
}

/// Yields to the scheduler until `condition` holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..1_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition was not reached");
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
