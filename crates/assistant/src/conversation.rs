//! Ordered conversation log and its reducer transitions.
//!
//! The log is append-only except for one transition: a pending assistant
//! placeholder is resolved in place, at the same id and list position, to
//! either `Resolved` or `Failed`. Nothing moves a message back to `Pending`.

use std::collections::BTreeSet;

use crm_api::{AssistantAction, ChatReply, ChatRequest, ErrorCode, GatewayError, HistoryEntry};
use time::OffsetDateTime;

pub use crm_api::ChatRole as Role;

pub type MessageId = u64;

pub const GENERIC_FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while answering. Please try again.";
pub const NETWORK_FAILURE_MESSAGE: &str =
    "I couldn't reach the server. Check your connection and try again.";
pub const CANCELLED_MESSAGE: &str = "This request was cancelled before an answer arrived.";

/// Lifecycle of one log entry.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageState {
    /// A user message. Never pending.
    Delivered,
    /// An assistant placeholder awaiting its reply.
    Pending,
    Resolved {
        suggestions: Vec<String>,
        actions: Vec<AssistantAction>,
    },
    /// The reply failed; `code` is kept for diagnostics and never displayed.
    Failed { code: ErrorCode },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationMessage {
    id: MessageId,
    role: Role,
    content: String,
    timestamp: OffsetDateTime,
    state: MessageState,
}

impl ConversationMessage {
    fn user(id: MessageId, content: String) -> Self {
        Self {
            id,
            role: Role::User,
            content,
            timestamp: OffsetDateTime::now_utc(),
            state: MessageState::Delivered,
        }
    }

    fn placeholder(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            timestamp: OffsetDateTime::now_utc(),
            state: MessageState::Pending,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    pub fn state(&self) -> &MessageState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, MessageState::Pending)
    }

    pub fn suggestions(&self) -> &[String] {
        match &self.state {
            MessageState::Resolved { suggestions, .. } => suggestions,
            _ => &[],
        }
    }

    pub fn actions(&self) -> &[AssistantAction] {
        match &self.state {
            MessageState::Resolved { actions, .. } => actions,
            _ => &[],
        }
    }

    pub fn error_code(&self) -> Option<&ErrorCode> {
        match &self.state {
            MessageState::Failed { code } => Some(code),
            _ => None,
        }
    }
}

/// How a chat turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Replied(ChatReply),
    Failed(GatewayError),
}

impl From<Result<ChatReply, GatewayError>> for TurnOutcome {
    fn from(result: Result<ChatReply, GatewayError>) -> Self {
        match result {
            Ok(reply) => Self::Replied(reply),
            Err(error) => Self::Failed(error),
        }
    }
}

/// A chat turn that was accepted by [`Conversation::begin_turn`] and still
/// needs its backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub user_id: MessageId,
    /// Correlation key for [`Conversation::finish_turn`].
    pub placeholder_id: MessageId,
    pub request: ChatRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    log: Vec<ConversationMessage>,
    next_id: MessageId,
    in_flight: BTreeSet<MessageId>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            next_id: 1,
            in_flight: BTreeSet::new(),
        }
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.log
    }

    pub fn message(&self, id: MessageId) -> Option<&ConversationMessage> {
        self.log.iter().find(|message| message.id == id)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// True while at least one chat turn awaits its reply.
    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Upstream history: `{role, content}` of every settled message, in log
    /// order. Pending placeholders carry no content and are left out.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.log
            .iter()
            .filter(|message| !message.is_pending())
            .map(|message| HistoryEntry {
                role: message.role,
                content: message.content.clone(),
            })
            .collect()
    }

    /// Appends the user message and its pending placeholder.
    ///
    /// Surrounding whitespace is trimmed: the stored user message and the
    /// outgoing request carry the same trimmed text. Returns `None`, leaving
    /// the conversation untouched, when `text` is blank.
    /// The returned request's history is the log as it stood before this turn.
    pub fn begin_turn(&mut self, text: &str) -> Option<ChatTurn> {
        let message = text.trim();
        if message.is_empty() {
            return None;
        }

        let history = self.history();
        let user_id = self.mint_id();
        let placeholder_id = self.mint_id();

        self.log
            .push(ConversationMessage::user(user_id, message.to_string()));
        self.log.push(ConversationMessage::placeholder(placeholder_id));
        self.in_flight.insert(placeholder_id);

        Some(ChatTurn {
            user_id,
            placeholder_id,
            request: ChatRequest {
                message: message.to_string(),
                history,
            },
        })
    }

    /// Settles the placeholder `placeholder_id` in place and clears its busy
    /// mark.
    ///
    /// Returns `false` when no pending message with that id exists (it was
    /// cleared, or already settled); the log is left untouched in that case.
    pub fn finish_turn(&mut self, placeholder_id: MessageId, outcome: TurnOutcome) -> bool {
        self.in_flight.remove(&placeholder_id);

        let Some(message) = self
            .log
            .iter_mut()
            .find(|message| message.id == placeholder_id)
        else {
            return false;
        };

        if !message.is_pending() {
            return false;
        }

        let (content, state) = fold_outcome(outcome);
        message.content = content;
        message.state = state;
        true
    }

    /// Empties the log. Ids keep increasing; turns still in flight stay busy
    /// until their replies arrive and are then dropped.
    pub fn clear(&mut self) {
        self.log.clear();
    }

    fn mint_id(&mut self) -> MessageId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Turns a chat outcome into the placeholder's final content and state.
pub fn fold_outcome(outcome: TurnOutcome) -> (String, MessageState) {
    match outcome {
        TurnOutcome::Replied(reply) => (
            reply.message,
            MessageState::Resolved {
                suggestions: reply.suggestions,
                actions: reply.actions,
            },
        ),
        TurnOutcome::Failed(error) => {
            let content = fallback_message(&error);
            (content, MessageState::Failed { code: error.code })
        }
    }
}

/// User-facing text shown in place of a failed reply.
pub fn fallback_message(error: &GatewayError) -> String {
    match &error.code {
        ErrorCode::Network => NETWORK_FAILURE_MESSAGE.to_string(),
        ErrorCode::Cancelled => CANCELLED_MESSAGE.to_string(),
        _ if !error.message.trim().is_empty() => error.message.trim().to_string(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}
