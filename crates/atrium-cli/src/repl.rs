//! Interactive chat with one persona.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::io;

use anyhow::Result;
use atrium_application::{ChatUseCase, SendOutcome};
use atrium_core::AtriumError;
use atrium_core::chat::MessageRole;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio_util::sync::CancellationToken;

use crate::context::ClientContext;
use crate::render::StreamPrinter;

const COMMANDS: &[&str] = &["/help", "/history", "/reset", "/quit"];

/// rustyline helper: slash-command completion, hints and highlighting.
#[derive(Clone, Default)]
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ChatHelper {}

pub async fn run(ctx: &ClientContext, persona_id: &str) -> Result<()> {
    let display_name = match ctx.persona_client().find(persona_id).await {
        Ok(Some(persona)) => persona.name,
        Ok(None) => {
            eprintln!(
                "{}",
                format!("Unknown persona '{}'. Run `atrium personas` to list them.", persona_id).red()
            );
            return Ok(());
        }
        Err(e) => {
            // Chat may still work; the relay decides
            tracing::warn!(error = %e, "Could not fetch persona catalog");
            persona_id.to_string()
        }
    };

    let chat = ctx.chat_usecase().await?;
    chat.open_conversation(persona_id).await?;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!("{}", format!("=== Chatting with {} ===", display_name).bright_magenta().bold());
    println!(
        "{}",
        "Type a message, '/help' for commands, Ctrl-C to stop a reply, Ctrl-D to exit.".bright_black()
    );
    println!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match trimmed {
                    "/quit" | "/exit" => break,
                    "/help" => print_help(),
                    "/history" => print_history(&chat, persona_id).await,
                    "/reset" => match chat.reset(persona_id).await {
                        Ok(()) => println!("{}", "Conversation cleared.".green()),
                        Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                    },
                    message => send(&chat, persona_id, &display_name, message).await?,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

/// Sends one message and renders the reply while it streams.
async fn send(chat: &ChatUseCase, persona_id: &str, display_name: &str, text: &str) -> Result<()> {
    let mut events = chat.subscribe().await;
    let mut printer = StreamPrinter::new(io::stdout(), persona_id, display_name);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let send = chat.send_message(persona_id, text, cancel);
    tokio::pin!(send);
    let result = loop {
        tokio::select! {
            result = &mut send => break result,
            Some(event) = events.recv() => printer.apply(&event)?,
        }
    };
    interrupt.abort();
    while let Some(event) = events.try_recv() {
        printer.apply(&event)?;
    }

    match result {
        Ok(SendOutcome::Cancelled(_)) => println!("{}", "(reply stopped)".bright_black()),
        Ok(_) => {}
        Err(AtriumError::StreamInProgress { .. }) => {
            eprintln!("{}", "A reply is still streaming.".yellow());
        }
        // Already rendered from the Failed event
        Err(e) => tracing::debug!(error = %e, "Send failed"),
    }
    Ok(())
}

async fn print_history(chat: &ChatUseCase, persona_id: &str) {
    for message in chat.history(persona_id).await {
        let label = match message.role {
            MessageRole::User => "you".green(),
            MessageRole::Assistant => persona_id.bright_magenta(),
            MessageRole::System => "system".bright_black(),
        };
        println!("{} {}", label, message.content);
    }
}

fn print_help() {
    println!("{}", "/history  show this conversation".bright_black());
    println!("{}", "/reset    clear this conversation".bright_black());
    println!("{}", "/quit     leave the chat".bright_black());
}
