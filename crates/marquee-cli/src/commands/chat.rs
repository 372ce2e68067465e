use anyhow::Result;
use cliclack::{input, spinner};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::provider_from_env;
use crate::prompt::{print, print_notice, print_status};
use marquee::conversation::{Conversation, Turn};
use marquee::dispatcher::Dispatcher;
use marquee::lookup::Catalog;
use marquee::session::FileSessionStore;

pub async fn run(session_id: Option<String>, catalog: Option<PathBuf>) -> Result<()> {
    let catalog = match catalog {
        Some(path) => Catalog::from_file(path)?,
        None => {
            tracing::warn!("no catalog given, movie lookups will come back empty");
            Catalog::default()
        }
    };

    let store = Arc::new(FileSessionStore::in_config_dir()?);
    let conversation = Conversation::new(
        provider_from_env()?,
        Dispatcher::new(Arc::new(catalog)),
        store.clone(),
    );

    let session_id = session_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let session_file = store.session_file(&session_id)?;
    let mut session = conversation.open_session(&session_id).await?;
    print_status(&format!(
        "Starting session {}. Recording to {}",
        session.id,
        session_file.display()
    ));
    println!(
        "Ask about movies and showtimes {}\n",
        style("- type \"exit\" to end the session").dim()
    );

    loop {
        let message_text: String = input("Message:").placeholder("").interact()?;
        let message_text = message_text.trim();
        if message_text.is_empty() {
            continue;
        }
        if message_text.eq_ignore_ascii_case("exit") {
            break;
        }

        let spin = spinner();
        spin.start("awaiting reply");

        let outcome = tokio::select! {
            turn = conversation.reply(&mut session, message_text, |token| {
                tracing::trace!(token, "reply fragment");
            }) => Some(turn),
            _ = tokio::signal::ctrl_c() => None,
        };
        spin.stop("");

        match outcome {
            Some(Ok(Turn::Reply(text))) => print(&text)?,
            Some(Ok(Turn::Notice(text))) => print_notice(&text),
            Some(Ok(Turn::AwaitingFinalization(_))) => {
                print_notice("Ticket purchase confirmed. Completing the purchase is not available yet.")
            }
            Some(Err(e)) => print_notice(&format!("Error: {}", e)),
            None => print_notice("Interrupted: the conversation is back to before your last message."),
        }
    }

    print_status(&format!(
        "Closing session. Recorded to {}",
        session_file.display()
    ));
    Ok(())
}
