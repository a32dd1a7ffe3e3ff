//! Plain-text rendering of conversation state for the terminal.

use assistant::{ConversationMessage, MessageState, Role};
use crm_api::{ClientAnalysis, EmailDraft, OfferDraft, SuggestionsSnapshot};

pub const PENDING_TEXT: &str = "...";

pub fn render_message(message: &ConversationMessage) -> String {
    let timestamp = message.timestamp();
    let speaker = match message.role() {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let content = match message.state() {
        MessageState::Pending => PENDING_TEXT,
        _ => message.content(),
    };

    let mut out = format!(
        "[{:02}:{:02}] {speaker}: {content}",
        timestamp.hour(),
        timestamp.minute()
    );

    for suggestion in message.suggestions() {
        out.push_str("\n  - ");
        out.push_str(suggestion);
    }
    for (index, action) in message.actions().iter().enumerate() {
        let label = action.label.as_deref().unwrap_or(&action.kind);
        out.push_str(&format!("\n  [{}] {label}", index + 1));
    }
    out
}

pub fn render_suggestions(snapshot: &SuggestionsSnapshot) -> String {
    if snapshot.suggestions.is_empty() {
        return "No suggestions right now.".to_string();
    }

    snapshot
        .suggestions
        .iter()
        .map(|suggestion| {
            let mut line = format!("* {}", suggestion.title);
            if let Some(priority) = &suggestion.priority {
                line.push_str(&format!(" ({priority})"));
            }
            if let Some(description) = &suggestion.description {
                line.push_str(&format!("\n  {description}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_offer(draft: &OfferDraft) -> String {
    let mut out = format!("Offer draft: {}", draft.title);
    for item in &draft.items {
        out.push_str(&format!(
            "\n  {} x {} @ {:.2}",
            item.quantity, item.description, item.unit_price
        ));
    }
    out.push_str(&format!("\n  total {:.2}", draft.total()));
    if let Some(notes) = &draft.notes {
        out.push_str(&format!("\n  notes: {notes}"));
    }
    out
}

pub fn render_email(draft: &EmailDraft) -> String {
    format!("Subject: {}\n\n{}", draft.subject, draft.body)
}

pub fn render_analysis(analysis: &ClientAnalysis) -> String {
    let mut out = analysis.summary.clone();
    if let Some(risk_level) = &analysis.risk_level {
        out.push_str(&format!("\nrisk: {risk_level}"));
    }
    if let Some(score) = analysis.score {
        out.push_str(&format!("\nscore: {score}"));
    }
    for (heading, entries) in [
        ("risks", &analysis.risks),
        ("opportunities", &analysis.opportunities),
        ("recommendations", &analysis.recommendations),
    ] {
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{heading}:"));
        for entry in entries {
            out.push_str(&format!("\n  - {entry}"));
        }
    }
    out
}
