//! Line-oriented front end over the panel and the bus.

use assistant::{resolve, AssistantBackend, AuxOperation, MessageId, Role};
use crm_api::{EmailDraftRequest, GatewayError};

use crate::commands::{parse_slash_command, SlashCommand, HELP_TEXT};
use crate::panel::AssistantPanel;
use crate::transcript;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Output of one handled line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub flow: Flow,
}

impl Reply {
    fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            flow: Flow::Continue,
        }
    }

    fn line(line: impl Into<String>) -> Self {
        Self::lines(vec![line.into()])
    }

    fn quiet() -> Self {
        Self::lines(Vec::new())
    }
}

pub struct Shell<B> {
    panel: AssistantPanel<B>,
    /// Targets sent to the router so far, in order.
    visited: Vec<String>,
}

impl<B: AssistantBackend> Shell<B> {
    pub fn new(panel: AssistantPanel<B>) -> Self {
        Self {
            panel,
            visited: Vec::new(),
        }
    }

    pub fn panel(&self) -> &AssistantPanel<B> {
        &self.panel
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub async fn handle_line(&mut self, line: &str) -> Reply {
        let Some(command) = parse_slash_command(line) else {
            if !self.panel.bus().is_open() {
                self.panel.bus().open();
            }
            let placeholder_id = self.panel.assistant().submit(line).await;
            return self.turn_reply(placeholder_id);
        };

        let assistant = self.panel.assistant();
        let bus = self.panel.bus();
        match command {
            SlashCommand::Help => Reply::line(HELP_TEXT),
            SlashCommand::Open => {
                bus.open();
                let placeholder_id = self.panel.pump_quick_message().await;
                let mut reply = self.turn_reply(placeholder_id);
                reply.lines.insert(0, "Assistant opened.".to_string());
                reply
            }
            SlashCommand::Close => {
                bus.close();
                Reply::line("Assistant closed.")
            }
            SlashCommand::Clear => {
                assistant.clear().await;
                Reply::line("Conversation cleared.")
            }
            SlashCommand::Suggestions => match assistant.fetch_suggestions().await {
                Ok(snapshot) => Reply::line(transcript::render_suggestions(&snapshot)),
                Err(error) => failure(AuxOperation::Suggestions, &error),
            },
            SlashCommand::Offer { description } => {
                match assistant.generate_offer(&description, None).await {
                    Ok(draft) => Reply::line(transcript::render_offer(&draft)),
                    Err(error) => failure(AuxOperation::GenerateOffer, &error),
                }
            }
            SlashCommand::Email { intent, client_id } => {
                let mut request = EmailDraftRequest::new(intent);
                if let Some(client_id) = client_id {
                    request = request.for_client(client_id);
                }
                match assistant.generate_email(request).await {
                    Ok(draft) => Reply::line(transcript::render_email(&draft)),
                    Err(error) => failure(AuxOperation::GenerateEmail, &error),
                }
            }
            SlashCommand::Analyze { client_id } => {
                match assistant.analyze_client(&client_id).await {
                    Ok(analysis) => Reply::line(transcript::render_analysis(&analysis)),
                    Err(error) => failure(AuxOperation::AnalyzeClient, &error),
                }
            }
            SlashCommand::Ask { text } => {
                bus.send_quick_message(text);
                let placeholder_id = self.panel.pump_quick_message().await;
                self.turn_reply(placeholder_id)
            }
            SlashCommand::Go { index } => self.follow_action(index),
            SlashCommand::Quit => Reply {
                lines: Vec::new(),
                flow: Flow::Quit,
            },
            SlashCommand::Usage(usage) => Reply::line(format!("usage: {usage}")),
            SlashCommand::Unknown(command) => {
                Reply::line(format!("Unknown command {command}. Try /help."))
            }
        }
    }

    fn turn_reply(&self, placeholder_id: Option<MessageId>) -> Reply {
        let Some(placeholder_id) = placeholder_id else {
            return Reply::quiet();
        };

        match self.panel.assistant().message(placeholder_id) {
            Some(message) => Reply::line(transcript::render_message(&message)),
            None => Reply::quiet(),
        }
    }

    /// Follows action `index` (1-based) of the latest assistant reply.
    fn follow_action(&mut self, index: usize) -> Reply {
        let latest = self
            .panel
            .assistant()
            .messages()
            .into_iter()
            .rev()
            .find(|message| message.role() == Role::Assistant && !message.is_pending());

        let action = latest.and_then(|message| {
            let position = index.checked_sub(1)?;
            message.actions().get(position).cloned()
        });
        let Some(action) = action else {
            return Reply::line(format!("No action {index} on the last reply."));
        };

        match resolve(&action, &mut self.visited) {
            Some(target) => Reply::line(format!("-> {target}")),
            None => Reply::line(format!("Cannot follow action {index}.")),
        }
    }
}

fn failure(operation: AuxOperation, error: &GatewayError) -> Reply {
    Reply::line(format!(
        "{} failed: {} ({})",
        operation.as_str(),
        error.message,
        error.code
    ))
}
