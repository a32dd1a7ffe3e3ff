use std::io;

use assistant::Assistant;
use quote_desk::{logging, AssistantPanel, EnvConfig, Flow, Shell, UiContext, VisibilityBus};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = EnvConfig::from_env();
    logging::init(&config);

    let gateway = config.build_gateway().map_err(io::Error::other)?;
    println!("quote-desk assistant on {}. Type /help for commands.", gateway.base_url());

    let ctx = UiContext::new().with_visibility(VisibilityBus::new());
    let panel = AssistantPanel::new(&ctx.child(), Assistant::new(gateway))
        .map_err(io::Error::other)?;
    let mut shell = Shell::new(panel);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = shell.handle_line(&line).await;
        for line in &reply.lines {
            println!("{line}");
        }
        if reply.flow == Flow::Quit {
            break;
        }
    }

    Ok(())
}
