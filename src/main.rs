// src/main.rs — notebook entry point

use clap::Parser;

use research_notebook::cli::{ask, generate, index, Cli, Commands};
use research_notebook::infra::config::Config;
use research_notebook::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (respects RUST_LOG)
    logger::init_logging(if cli.verbose { "info" } else { "warn" });

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no config.toml)
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Generate(args) => generate::run_generate(args, &config).await,
        Commands::Index(args) => index::run_index(args, &config).await,
        Commands::Ask(args) => ask::run_ask(args, &config).await,
    }
}
