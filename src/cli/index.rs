// src/cli/index.rs — `notebook index`: PDF into a new collection

use std::path::PathBuf;
use std::sync::Arc;

use super::IndexArgs;
use crate::infra::config::Config;
use crate::provider::openai::OpenAIProvider;
use crate::rag::ingest::extract_pdf_pages;
use crate::rag::DocumentIndex;

pub fn database_path(flag: Option<&PathBuf>, config: &Config) -> PathBuf {
    flag.cloned()
        .unwrap_or_else(|| config.rag.database_path())
}

pub async fn run_index(args: IndexArgs, config: &Config) -> anyhow::Result<()> {
    let provider = Arc::new(OpenAIProvider::from_env(&config.model.provider_url)?);
    let db_path = database_path(args.database.as_ref(), config);
    let index = DocumentIndex::open(&db_path, provider, &config.model.embedding_model)?;

    // Check before the (slow) extraction.
    if index.collection_exists(&args.collection)? {
        anyhow::bail!(
            "Collection '{}' already exists in {}",
            args.collection,
            db_path.display()
        );
    }

    let pdf = args.pdf.clone();
    let pages = tokio::task::spawn_blocking(move || extract_pdf_pages(&pdf)).await??;
    eprintln!("Extracted {} page(s) from {}", pages.len(), args.pdf.display());

    let source = args
        .pdf
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.pdf.display().to_string());

    let report = index
        .ingest(&args.collection, &source, &pages, config.rag.chunk_chars)
        .await?;

    println!(
        "Indexed '{}': {} page(s), {} chunk(s) -> {}",
        report.collection,
        report.pages,
        report.chunks,
        db_path.display()
    );
    Ok(())
}
