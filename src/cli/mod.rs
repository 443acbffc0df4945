// src/cli/mod.rs — CLI definition (clap derive)

pub mod ask;
pub mod generate;
pub mod index;
pub mod progress;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "notebook",
    about = "Weekly research notebook generator",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at info level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the weekly notebook and refine it with the checker loop
    Generate(GenerateArgs),
    /// Index a PDF into a new collection
    Index(IndexArgs),
    /// Ask questions about an indexed collection
    Ask(AskArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Repository URL (https://github.com/<owner>/<repo>)
    #[arg(long)]
    pub repo_url: String,

    /// Branch to read commits from
    #[arg(long)]
    pub branch: String,

    /// Take the N most recent commits instead of a date range
    #[arg(long, conflicts_with_all = ["date_start", "date_end"])]
    pub commits: Option<u32>,

    /// First day of the range (YYYY-MM-DD); requires --date-end
    #[arg(long, requires = "date_end")]
    pub date_start: Option<String>,

    /// Last day of the range (YYYY-MM-DD); requires --date-start
    #[arg(long, requires = "date_start")]
    pub date_end: Option<String>,

    /// File with one reference URL per line
    #[arg(long)]
    pub reference_file: PathBuf,

    /// Free-form notes file
    #[arg(long)]
    pub metadata_file: PathBuf,

    /// Critique/revise rounds (overrides config)
    #[arg(long)]
    pub checker_iterations: Option<u32>,

    /// Directory for iteration_<n>.md files (overrides config)
    #[arg(long)]
    pub output_folder: Option<PathBuf>,

    /// Also summarize each revised draft
    #[arg(long)]
    pub summarize: bool,

    /// GitHub token (falls back to GITHUB_TOKEN)
    #[arg(long)]
    pub gh_token: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// PDF to index
    #[arg(long)]
    pub pdf: PathBuf,

    /// Name of the collection to create
    #[arg(long)]
    pub collection: String,

    /// Database path (overrides config)
    #[arg(long)]
    pub database: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    /// Collection to query
    #[arg(long)]
    pub collection: String,

    /// Database path (overrides config)
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Pages retrieved per question (overrides config)
    #[arg(long)]
    pub n_results: Option<usize>,

    /// Let the model call search_documentation itself
    #[arg(long)]
    pub tools: bool,

    /// Question to ask; interactive when omitted
    #[arg(trailing_var_arg = true)]
    pub question: Vec<String>,
}
