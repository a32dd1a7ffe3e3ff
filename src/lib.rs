//! Terminal front end for the quote-desk CRM assistant.
//!
//! Wiring, from the bottom up:
//! - `crm_api::Gateway` talks to the backend.
//! - `assistant::Assistant` owns the conversation log.
//! - [`VisibilityBus`] carries the panel's open flag and the quick-message
//!   slot, handed to components through [`UiContext`].
//! - [`AssistantPanel`] feeds quick messages into the assistant.
//! - [`Shell`] maps input lines and slash commands onto all of the above.

pub mod bus;
pub mod commands;
pub mod config;
pub mod logging;
pub mod panel;
pub mod shell;
pub mod transcript;

pub use bus::{ContextError, UiContext, VisibilityBus, VisibilityState};
pub use commands::{parse_slash_command, SlashCommand};
pub use config::EnvConfig;
pub use panel::AssistantPanel;
pub use shell::{Flow, Reply, Shell};
