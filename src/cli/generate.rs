// src/cli/generate.rs — `notebook generate`: assemble, refine, write

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use super::progress::terminal_progress;
use super::GenerateArgs;
use crate::core::pipeline::{NotebookPipeline, NotebookRequest};
use crate::core::types::LoopConfig;
use crate::core::writer::write_rounds;
use crate::infra::config::Config;
use crate::provider::gateway::ProviderGateway;
use crate::provider::openai::OpenAIProvider;
use crate::sources::github::{parse_date, CommitQuery, CommitSelection, GithubClient};
use crate::sources::references::{load_reference_links, HttpReferenceFetcher};

pub fn commit_query(args: &GenerateArgs) -> anyhow::Result<CommitQuery> {
    let parse = |s: &Option<String>| -> anyhow::Result<Option<NaiveDate>> {
        Ok(s.as_deref().map(parse_date).transpose()?)
    };
    let selection = CommitSelection::from_parts(
        args.commits,
        parse(&args.date_start)?,
        parse(&args.date_end)?,
    )?;
    Ok(CommitQuery {
        repo_url: args.repo_url.clone(),
        branch: args.branch.clone(),
        selection,
    })
}

/// CLI flags override the `[refinement]` section.
pub fn loop_config(args: &GenerateArgs, config: &Config) -> LoopConfig {
    let mut lc = LoopConfig::from(&config.refinement);
    if let Some(n) = args.checker_iterations {
        lc.iterations = n;
    }
    if args.summarize {
        lc.summarize = true;
    }
    lc
}

pub fn output_dir(args: &GenerateArgs, config: &Config) -> PathBuf {
    args.output_folder
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.refinement.output_dir))
}

fn github_token(args: &GenerateArgs) -> anyhow::Result<String> {
    args.gh_token
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("No GitHub token. Pass --gh-token or set GITHUB_TOKEN."))
}

pub async fn run_generate(args: GenerateArgs, config: &Config) -> anyhow::Result<()> {
    let query = commit_query(&args)?;
    let reference_links = load_reference_links(&args.reference_file)?;
    let token = github_token(&args)?;

    let provider = Arc::new(OpenAIProvider::from_env(&config.model.provider_url)?);
    let gateway = ProviderGateway::from_config(provider, &config.model);

    let loop_cfg = loop_config(&args, config);
    tracing::info!(
        repo = %query.repo_url,
        branch = %query.branch,
        selection = ?query.selection,
        iterations = loop_cfg.iterations,
        summarize = loop_cfg.summarize,
        model = gateway.model(),
        "Generating notebook"
    );

    let pipeline = NotebookPipeline::new(
        Arc::new(GithubClient::new(token, &config.github)),
        Arc::new(HttpReferenceFetcher::new(config.references.excerpt_chars)),
        Arc::new(gateway),
        loop_cfg,
    )
    .with_progress(terminal_progress());

    let request = NotebookRequest {
        commits: query,
        reference_links,
        notes_path: args.metadata_file.clone(),
    };
    let outcome = pipeline.run(&request).await?;

    let dir = output_dir(&args, config);
    let written = write_rounds(&dir, &outcome.rounds)?;
    for path in &written {
        eprintln!("Saved {}", path.display());
    }

    println!("{}", outcome.final_response());
    Ok(())
}
