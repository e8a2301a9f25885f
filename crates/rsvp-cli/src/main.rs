use std::path::PathBuf;

use clap::Parser;

mod shell;

/// Stand-in for the chat router: drives one in-memory calendar store from
/// line commands. State lives for the life of the process.
#[derive(Parser)]
#[command(name = "rsvp-cli", version, about = "RSVP event-coordination shell")]
struct Cli {
    /// Path to a TOML core configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Read commands from a file instead of stdin.
    #[arg(long)]
    script: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = shell::run(cli.config.as_deref(), cli.script.as_deref()).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
