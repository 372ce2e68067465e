use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod prompt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the movie assistant
    Chat {
        /// Session to resume; a new one is started when omitted
        #[arg(short, long)]
        session: Option<String>,

        /// JSON file with the movies and showtimes to serve
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Work through the milestones in <artifacts>/plan.md
    Build {
        /// Directory holding plan.md, index.html and style.css
        #[arg(short, long)]
        artifacts: PathBuf,

        /// Milestones to complete before stopping
        #[arg(long, default_value_t = 1)]
        steps: usize,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("marquee=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Chat { session, catalog } => commands::chat::run(session, catalog).await,
        Command::Build { artifacts, steps } => commands::build::run(artifacts, steps).await,
    }
}
