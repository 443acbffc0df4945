// src/core/writer.rs — Persist refinement rounds as Markdown files

use std::path::{Path, PathBuf};

use super::types::RoundRecord;
use crate::infra::errors::NotebookError;

/// Markdown document for a single round.
pub fn render_round(record: &RoundRecord) -> String {
    let mut out = format!("# Iteration {}\n\n", record.round);
    out.push_str("## Initial Response\n");
    out.push_str(&record.before);
    out.push_str("\n\n## Checker Response\n");
    out.push_str(&record.critique);
    out.push_str("\n\n## Revised Response\n");
    out.push_str(&record.revised);
    out.push_str("\n\n");
    if let Some(summary) = &record.summary {
        out.push_str("## Summary\n");
        out.push_str(summary);
        out.push_str("\n\n");
    }
    out
}

/// Write `iteration_<n>.md` for every round into `dir`, creating it if needed.
/// Returns the written paths in round order.
pub fn write_rounds(dir: &Path, rounds: &[RoundRecord]) -> Result<Vec<PathBuf>, NotebookError> {
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(rounds.len());
    for record in rounds {
        let path = dir.join(format!("iteration_{}.md", record.round));
        std::fs::write(&path, render_round(record))?;
        tracing::info!(path = %path.display(), "Iteration saved");
        written.push(path);
    }
    Ok(written)
}
