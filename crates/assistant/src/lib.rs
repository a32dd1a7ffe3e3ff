//! Conversation state for the quote-desk assistant.
//!
//! [`Conversation`] is the synchronous reducer: it owns the ordered message
//! log, mints ids, and resolves each pending assistant placeholder in place.
//! [`Assistant`] drives it against an [`AssistantBackend`] (normally the
//! `crm_api` gateway) and runs the auxiliary single-shot calls, each behind
//! its own busy flag.
//!
//! Chat failures never escape [`Assistant::submit`]; they become the
//! placeholder's content and keep their error code on the message.
//!
//! [`actions`] turns structured reply actions into navigation targets.

pub mod actions;
pub mod backend;
pub mod busy;
pub mod conversation;
pub mod session;

pub use actions::{navigation_target, resolve, ActionKind, Navigator};
pub use backend::AssistantBackend;
pub use busy::{BusyFlag, BusyGuard};
pub use conversation::{
    fallback_message, ChatTurn, Conversation, ConversationMessage, MessageId, MessageState, Role,
    TurnOutcome,
};
pub use session::{Assistant, AuxOperation};
