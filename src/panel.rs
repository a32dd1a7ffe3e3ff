use assistant::{Assistant, AssistantBackend, MessageId};
use tracing::debug;

use crate::bus::{ContextError, UiContext, VisibilityBus};

/// The conversation panel: feeds quick messages from the bus into the
/// assistant whenever the panel is open.
#[derive(Debug)]
pub struct AssistantPanel<B> {
    assistant: Assistant<B>,
    bus: VisibilityBus,
}

impl<B: AssistantBackend> AssistantPanel<B> {
    /// Fails when `ctx` does not provide a visibility bus.
    pub fn new(ctx: &UiContext, assistant: Assistant<B>) -> Result<Self, ContextError> {
        let bus = ctx.visibility()?.clone();
        Ok(Self { assistant, bus })
    }

    pub fn assistant(&self) -> &Assistant<B> {
        &self.assistant
    }

    pub fn bus(&self) -> &VisibilityBus {
        &self.bus
    }

    /// Submits the pending quick message if the panel is open.
    ///
    /// The slot is emptied before the turn starts, so the same message is never
    /// sent twice.
    pub async fn pump_quick_message(&self) -> Option<MessageId> {
        if !self.bus.is_open() {
            return None;
        }

        let text = self.bus.take_quick_message()?;
        debug!(len = text.len(), "submitting quick message");
        self.assistant.submit(&text).await
    }

    /// Pumps quick messages on every bus change. Runs until the future is
    /// dropped, since the panel keeps its own bus handle alive.
    pub async fn watch(&self) {
        let mut changes = self.bus.subscribe();
        loop {
            self.pump_quick_message().await;
            if changes.changed().await.is_err() {
                return;
            }
        }
    }
}
