use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crm_api::{
    ClientAnalysis, EmailDraft, EmailDraftRequest, GatewayError, HistoryEntry, OfferDraft,
    OfferDraftRequest, SuggestionsSnapshot,
};
use tracing::{debug, warn};

use crate::backend::AssistantBackend;
use crate::busy::BusyFlag;
use crate::conversation::{Conversation, ConversationMessage, MessageId, TurnOutcome};

/// Single-shot calls that run beside the chat, each with its own busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuxOperation {
    Suggestions,
    GenerateOffer,
    GenerateEmail,
    AnalyzeClient,
    ClearHistory,
}

impl AuxOperation {
    pub const ALL: [AuxOperation; 5] = [
        AuxOperation::Suggestions,
        AuxOperation::GenerateOffer,
        AuxOperation::GenerateEmail,
        AuxOperation::AnalyzeClient,
        AuxOperation::ClearHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suggestions => "suggestions",
            Self::GenerateOffer => "generate_offer",
            Self::GenerateEmail => "generate_email",
            Self::AnalyzeClient => "analyze_client",
            Self::ClearHistory => "clear_history",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Suggestions => 0,
            Self::GenerateOffer => 1,
            Self::GenerateEmail => 2,
            Self::AnalyzeClient => 3,
            Self::ClearHistory => 4,
        }
    }
}

#[derive(Debug, Default)]
struct AuxState {
    busy: BusyFlag,
    last_error: Mutex<Option<GatewayError>>,
}

#[derive(Debug)]
struct Shared<B> {
    backend: B,
    conversation: Mutex<Conversation>,
    aux: [AuxState; 5],
    snapshot: Mutex<Option<SuggestionsSnapshot>>,
}

/// Conversation driver bound to one backend.
///
/// Cloning is cheap and every clone drives the same log, so a front end can
/// hand copies to spawned tasks.
#[derive(Debug)]
pub struct Assistant<B> {
    shared: Arc<Shared<B>>,
}

impl<B> Clone for Assistant<B> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B: AssistantBackend> Assistant<B> {
    pub fn new(backend: B) -> Self {
        Self {
            shared: Arc::new(Shared {
                backend,
                conversation: Mutex::new(Conversation::new()),
                aux: Default::default(),
                snapshot: Mutex::new(None),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.shared.backend
    }

    /// Sends `text` as a chat turn and settles its placeholder.
    ///
    /// Never fails: a backend error is folded into the placeholder as a
    /// fallback message. Surrounding whitespace is trimmed before the text is
    /// logged and sent; whitespace-only input is ignored and yields `None`.
    /// If the returned future is dropped early the placeholder settles as
    /// cancelled.
    pub async fn submit(&self, text: &str) -> Option<MessageId> {
        let turn = self.lock_conversation().begin_turn(text)?;
        let placeholder_id = turn.placeholder_id;
        let mut pending = PendingTurn {
            conversation: &self.shared.conversation,
            placeholder_id,
            settled: false,
        };

        debug!(
            placeholder_id,
            history_len = turn.request.history.len(),
            "submitting chat turn"
        );
        let result = self.shared.backend.chat(turn.request).await;
        if let Err(error) = &result {
            warn!(
                placeholder_id,
                code = %error.code,
                http_status = error.http_status,
                "chat turn failed: {}",
                error.message
            );
        }

        pending.settle(TurnOutcome::from(result));
        Some(placeholder_id)
    }

    /// Snapshot of the ordered log.
    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.lock_conversation().messages().to_vec()
    }

    pub fn message(&self, id: MessageId) -> Option<ConversationMessage> {
        self.lock_conversation().message(id).cloned()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_conversation().history()
    }

    /// True while a chat turn awaits its reply, including a turn whose
    /// placeholder was already cleared from the log.
    pub fn is_busy(&self) -> bool {
        self.lock_conversation().is_busy()
    }

    pub fn is_busy_op(&self, operation: AuxOperation) -> bool {
        self.aux(operation).busy.is_busy()
    }

    /// Error from the most recent call of `operation`, cleared when the next
    /// call starts.
    pub fn last_error(&self, operation: AuxOperation) -> Option<GatewayError> {
        lock_unpoisoned(&self.aux(operation).last_error).clone()
    }

    pub fn dismiss_error(&self, operation: AuxOperation) {
        lock_unpoisoned(&self.aux(operation).last_error).take();
    }

    /// Last successfully fetched suggestions snapshot.
    pub fn suggestions_snapshot(&self) -> Option<SuggestionsSnapshot> {
        lock_unpoisoned(&self.shared.snapshot).clone()
    }

    pub async fn fetch_suggestions(&self) -> Result<SuggestionsSnapshot, GatewayError> {
        let snapshot = self
            .run_aux(AuxOperation::Suggestions, self.shared.backend.suggestions())
            .await?;
        *lock_unpoisoned(&self.shared.snapshot) = Some(snapshot.clone());
        Ok(snapshot)
    }

    pub async fn generate_offer(
        &self,
        description: &str,
        client_id: Option<&str>,
    ) -> Result<OfferDraft, GatewayError> {
        let request = OfferDraftRequest {
            description: description.trim().to_string(),
            client_id: client_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        };
        self.run_aux(
            AuxOperation::GenerateOffer,
            self.shared.backend.generate_offer(request),
        )
        .await
    }

    pub async fn generate_email(
        &self,
        request: EmailDraftRequest,
    ) -> Result<EmailDraft, GatewayError> {
        self.run_aux(
            AuxOperation::GenerateEmail,
            self.shared.backend.generate_email(request),
        )
        .await
    }

    pub async fn analyze_client(&self, client_id: &str) -> Result<ClientAnalysis, GatewayError> {
        self.run_aux(
            AuxOperation::AnalyzeClient,
            self.shared.backend.analyze_client(client_id.trim().to_string()),
        )
        .await
    }

    /// Empties the log, then tells the backend to forget the history.
    ///
    /// The local clear always happens. A failed backend notification is only
    /// logged.
    pub async fn clear(&self) {
        self.lock_conversation().clear();

        let _busy = self.aux(AuxOperation::ClearHistory).busy.enter();
        if let Err(error) = self.shared.backend.clear_history().await {
            warn!(
                code = %error.code,
                http_status = error.http_status,
                "failed to clear remote chat history: {}",
                error.message
            );
        }
    }

    async fn run_aux<T>(
        &self,
        operation: AuxOperation,
        call: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        let state = self.aux(operation);
        let _busy = state.busy.enter();
        lock_unpoisoned(&state.last_error).take();

        let result = call.await;
        if let Err(error) = &result {
            debug!(
                operation = operation.as_str(),
                code = %error.code,
                "auxiliary call failed"
            );
            *lock_unpoisoned(&state.last_error) = Some(error.clone());
        }
        result
    }

    fn aux(&self, operation: AuxOperation) -> &AuxState {
        &self.shared.aux[operation.index()]
    }

    fn lock_conversation(&self) -> MutexGuard<'_, Conversation> {
        lock_unpoisoned(&self.shared.conversation)
    }
}

/// Settles a placeholder exactly once, as cancelled if dropped unsettled.
struct PendingTurn<'a> {
    conversation: &'a Mutex<Conversation>,
    placeholder_id: MessageId,
    settled: bool,
}

impl PendingTurn<'_> {
    fn settle(&mut self, outcome: TurnOutcome) {
        self.settled = true;
        let applied = lock_unpoisoned(self.conversation).finish_turn(self.placeholder_id, outcome);
        if !applied {
            debug!(
                placeholder_id = self.placeholder_id,
                "dropping reply for a cleared turn"
            );
        }
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }

        warn!(placeholder_id = self.placeholder_id, "chat turn abandoned");
        self.settle(TurnOutcome::Failed(GatewayError::cancelled()));
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
