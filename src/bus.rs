//! Conversation visibility bus and the context that carries it.
//!
//! The bus is an explicitly constructed object handed down through
//! [`UiContext`]; there is no process-global instance. Reads outside a scope
//! that provides it fail with [`ContextError::MissingProvider`].

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

/// What every component sees of the assistant panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityState {
    pub is_open: bool,
    /// Single-slot mailbox. A second send before consumption overwrites.
    pub pending_quick_message: Option<String>,
}

/// Shared open/closed flag plus the quick-message slot.
///
/// Clones share one state. Every mutation that changes the state notifies
/// subscribers; no-op mutations do not.
#[derive(Debug, Clone)]
pub struct VisibilityBus {
    sender: Arc<watch::Sender<VisibilityState>>,
}

impl Default for VisibilityBus {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityBus {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(VisibilityState::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn state(&self) -> VisibilityState {
        self.sender.borrow().clone()
    }

    pub fn is_open(&self) -> bool {
        self.sender.borrow().is_open
    }

    pub fn pending_quick_message(&self) -> Option<String> {
        self.sender.borrow().pending_quick_message.clone()
    }

    /// Receiver that observes every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<VisibilityState> {
        self.sender.subscribe()
    }

    pub fn open(&self) {
        self.set_open(true);
    }

    pub fn close(&self) {
        self.set_open(false);
    }

    pub fn toggle(&self) {
        self.sender.send_modify(|state| state.is_open = !state.is_open);
    }

    /// Queues `text` for the panel and opens it.
    pub fn send_quick_message(&self, text: impl Into<String>) {
        let text = text.into();
        self.sender.send_if_modified(|state| {
            let changed = !state.is_open || state.pending_quick_message.as_ref() != Some(&text);
            state.is_open = true;
            state.pending_quick_message = Some(text);
            changed
        });
    }

    pub fn clear_quick_message(&self) {
        self.take_quick_message();
    }

    /// Consumes the pending quick message, if any.
    pub fn take_quick_message(&self) -> Option<String> {
        let mut taken = None;
        self.sender.send_if_modified(|state| {
            taken = state.pending_quick_message.take();
            taken.is_some()
        });
        taken
    }

    fn set_open(&self, open: bool) {
        self.sender.send_if_modified(|state| {
            let changed = state.is_open != open;
            state.is_open = open;
            changed
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("{0} was read outside a scope that provides it")]
    MissingProvider(&'static str),
}

/// Shared services available to a subtree of the front end.
///
/// Components receive a context from their parent and pass [`UiContext::child`]
/// further down; a scope provides a service with `with_*`.
#[derive(Debug, Clone, Default)]
pub struct UiContext {
    visibility: Option<VisibilityBus>,
}

impl UiContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visibility(mut self, bus: VisibilityBus) -> Self {
        self.visibility = Some(bus);
        self
    }

    /// Context for a nested component; inherits everything provided so far.
    pub fn child(&self) -> Self {
        self.clone()
    }

    pub fn visibility(&self) -> Result<&VisibilityBus, ContextError> {
        self.visibility
            .as_ref()
            .ok_or(ContextError::MissingProvider("VisibilityBus"))
    }
}
