#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod command;

use command::{
    AppContext, ChatInput, ChatStrategy, CommandStrategy, InfoStrategy, InitStrategy,
    ListStrategy, ParsersStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "arcspec")]
#[command(about = "Chat with configurable LLM backends", long_about = None)]
struct Cli {
    /// Directory holding `<name>.ai.json` profiles [default: ~/arcspec/configs]
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Directory scanned for parser manifests [default: ~/arcspec/parsers]
    #[arg(long, global = true)]
    parsers_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available profiles
    List,
    /// List registered parser backends
    Parsers,
    /// Show model information for a profile
    Info {
        /// Profile file name, friendly name or list index
        #[arg(short, long)]
        profile: String,
    },
    /// Chat with a profile
    Chat {
        /// Profile file name, friendly name or list index
        #[arg(short, long)]
        profile: String,

        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));

    // Logs go to stderr so replies on stdout stay clean.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    match cli.command {
        Commands::Version => VersionStrategy.execute(()).await,
        Commands::Init => {
            let context = AppContext::paths(cli.config_dir, cli.parsers_dir)?;
            InitStrategy.execute(context).await
        }
        Commands::List => {
            let context = AppContext::paths(cli.config_dir, cli.parsers_dir)?;
            ListStrategy.execute(context).await
        }
        Commands::Parsers => {
            let context = AppContext::load(cli.config_dir, cli.parsers_dir)?;
            ParsersStrategy.execute(context).await
        }
        Commands::Info { profile } => {
            let context = AppContext::load(cli.config_dir, cli.parsers_dir)?;
            InfoStrategy.execute((context, profile)).await
        }
        Commands::Chat { profile, message } => {
            let context = AppContext::load(cli.config_dir, cli.parsers_dir)?;
            ChatStrategy
                .execute(ChatInput {
                    context,
                    profile,
                    message,
                })
                .await
        }
    }
}
