use crm_api::EmailIntent;

pub const HELP_TEXT: &str = "\
Commands:
  /help                      show this help
  /open, /close              show or hide the assistant panel
  /clear                     clear the conversation
  /suggestions               fetch proactive suggestions
  /offer <description>       draft an offer
  /email <intent> [clientId] draft an email (follow_up, offer_sent, payment_reminder, thank_you)
  /analyze <clientId>        analyze a client
  /ask <text>                queue a quick message for the assistant
  /go <n>                    follow action <n> of the last reply
  /quit                      exit
Anything else is sent to the assistant.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Open,
    Close,
    Clear,
    Suggestions,
    Offer { description: String },
    Email {
        intent: EmailIntent,
        client_id: Option<String>,
    },
    Analyze { client_id: String },
    Ask { text: String },
    Go { index: usize },
    Quit,
    /// Known command with missing or malformed arguments.
    Usage(&'static str),
    Unknown(String),
}

/// `None` when `input` is not a slash command and should be chatted.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/open" => SlashCommand::Open,
        "/close" => SlashCommand::Close,
        "/clear" => SlashCommand::Clear,
        "/suggestions" => SlashCommand::Suggestions,
        "/offer" if rest.is_empty() => SlashCommand::Usage("/offer <description>"),
        "/offer" => SlashCommand::Offer {
            description: rest.to_string(),
        },
        "/email" => parse_email(rest),
        "/analyze" => match rest.split_whitespace().next() {
            Some(client_id) => SlashCommand::Analyze {
                client_id: client_id.to_string(),
            },
            None => SlashCommand::Usage("/analyze <clientId>"),
        },
        "/ask" if rest.is_empty() => SlashCommand::Usage("/ask <text>"),
        "/ask" => SlashCommand::Ask {
            text: rest.to_string(),
        },
        "/go" => match rest.parse::<usize>() {
            Ok(index) if index > 0 => SlashCommand::Go { index },
            _ => SlashCommand::Usage("/go <n>"),
        },
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}

fn parse_email(rest: &str) -> SlashCommand {
    const USAGE: &str = "/email <intent> [clientId]";

    let mut words = rest.split_whitespace();
    let Some(intent) = words.next().and_then(EmailIntent::parse) else {
        return SlashCommand::Usage(USAGE);
    };

    SlashCommand::Email {
        intent,
        client_id: words.next().map(str::to_string),
    }
}
