//! Conversation with one profile, either a single message or an interactive loop.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arcspec_config::Profile;
use arcspec_core::{ChunkSink, Parser};
use tracing::{debug, info};

use super::AppContext;

/// Input parameters for the Chat command strategy.
pub struct ChatInput {
    pub context: AppContext,
    /// Profile file name, friendly name or list index
    pub profile: String,
    /// Single message to send (non-interactive mode)
    pub message: Option<String>,
}

/// Sends messages to the profile's parser and prints the replies.
///
/// Streamed fragments are printed as they arrive; the parser still records only
/// the assembled reply.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let profile = input.context.profile(&input.profile)?;
        let mut parser = input.context.create_parser(&profile)?;

        let streamed = Arc::new(AtomicBool::new(false));
        parser.set_chunk_sink(stdout_sink(Arc::clone(&streamed)));

        if let Some(message) = input.message {
            let reply = parser.chat(&message).await?;
            print_reply(&reply, &streamed);
            return Ok(());
        }

        run_interactive(&profile, parser.as_mut(), &streamed).await
    }
}

/// Sink printing fragments to stdout and raising `streamed`.
fn stdout_sink(streamed: Arc<AtomicBool>) -> ChunkSink {
    Box::new(move |chunk: &str| {
        print!("{chunk}");
        if let Err(e) = io::stdout().flush() {
            debug!("Failed to flush streamed chunk: {e}");
        }
        streamed.store(true, Ordering::Relaxed);
    })
}

/// Print `reply` unless its fragments were already streamed to stdout.
fn print_reply(reply: &str, streamed: &AtomicBool) {
    if streamed.swap(false, Ordering::Relaxed) {
        println!();
    } else {
        println!("{reply}");
    }
}

fn print_help() {
    println!("Commands:");
    println!("  quit, exit, q  leave the conversation");
    println!("  clear          forget the conversation (the persona is kept)");
    println!("  info           show model and history information");
    println!("  help           show this help");
    println!();
}

async fn run_interactive(
    profile: &Profile,
    parser: &mut dyn Parser,
    streamed: &AtomicBool,
) -> anyhow::Result<()> {
    println!("Chatting with {profile}. Type 'help' for commands, 'exit' to quit.\n");
    if let Some(intro) = profile.schema.introduction.as_deref() {
        println!("{intro}\n");
    }

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input.to_ascii_lowercase().as_str() {
            "" => {}
            "quit" | "exit" | "q" => break,
            "clear" => {
                parser.clear_history();
                println!("History cleared.\n");
            }
            "info" => println!("{}\n", serde_json::to_string_pretty(&parser.model_info())?),
            "help" => print_help(),
            _ => match parser.chat(input).await {
                Ok(reply) => {
                    println!();
                    print_reply(&reply, streamed);
                    println!();
                }
                Err(e) => eprintln!("Error: {e}"),
            },
        }
    }

    let summary = parser.history_summary();
    info!(
        "Conversation ended: {} messages, {} estimated tokens",
        summary.message_count, summary.total_tokens
    );
    Ok(())
}
