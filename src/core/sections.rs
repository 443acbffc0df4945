// src/core/sections.rs — Notebook sections and refinement-step templates
//
// Each builder returns one Template: a fixed instruction body plus bindings
// holding data that was fetched before construction. Rendering never fetches.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;

use super::template::Template;
use crate::infra::errors::NotebookError;
use crate::sources::github::{CommitQuery, CommitSource};
use crate::sources::notes::read_text_file;
use crate::sources::references::ReferenceFetcher;

const GENERAL_INSTRUCTIONS: &str = "\
You are helping a research group write its weekly research notebook. The group is an
undergraduate machine learning team. From the data below, write a Markdown notebook that
gives a detailed summary of the work done this week.

You will receive three kinds of data:

- GitHub data: the commit history of the team's repository together with the diff of every
  changed file. Summarize the programming work and explain the concepts and ideas that the
  code implements.

- References: articles and papers the team relied on. Every machine learning idea that shows
  up in the repository should be defined and tied back to where and how it was used in the
  code. Use the references for the technical detail.

- Meta notes: the personal notes of the researcher. They describe what was hard to
  understand, what caught their attention and ideas they wanted to record. Give these notes
  a lot of weight.

Markdown formatting instructions:

- Start with a level-one heading naming the week.
- Use one level-two heading per topic and keep related commits together.
- Put code identifiers and file names in backticks and quote short code excerpts in fenced
  blocks.
- Close with a section listing open questions for next week.
";

const GITHUB_INSTRUCTIONS: &str = "\
The following data comes from the GitHub REST API for one branch of the team's repository.

Repository URL: {REPO_URL}
Branch: {BRANCH}
Number of commits: {COMMIT_COUNT}

Data:
{GH_DATA}
";

const REFERENCES_INSTRUCTIONS: &str = "\
The following references were provided by the researcher. Each entry has the page title, its
URL and an excerpt of its text. Entries that could not be fetched are marked as errors; ignore
them rather than guessing their content.

References:
{REFERENCES}
";

const NOTES_INSTRUCTIONS: &str = "\
The following are the researcher's own notes for the week:

{NOTES}
";

const CRITIQUE_INSTRUCTIONS: &str = "\
You are reviewing a draft of a weekly research notebook. The draft was written following
these instructions:

<instructions>
{INSTRUCTIONS}
</instructions>

<draft>
{RESPONSE}
</draft>

Check the draft against the instructions. Point out technical mistakes, concepts that are
mentioned but never explained, commits or notes that were ignored and formatting problems.
Give a numbered list of concrete corrections.
";

const REVISION_INSTRUCTIONS: &str = "\
Here is a draft of a weekly research notebook:

<draft>
{RESPONSE}
</draft>

A reviewer left this critique:

<critique>
{CRITIQUE}
</critique>

Rewrite the notebook applying every correction in the critique. Return only the revised
Markdown notebook.
";

const SUMMARY_INSTRUCTIONS: &str = "\
{RESPONSE}

Using the notebook above, list the main topics discussed in the references and the concepts
implemented in the code. Finish with three questions the team should answer next week.
";

/// General notebook instructions. Rendered verbatim.
pub fn instructions_section() -> Template {
    Template::new(GENERAL_INSTRUCTIONS)
}

/// Commit history of one branch. Any fetch failure aborts the section.
pub async fn github_section(
    source: &dyn CommitSource,
    query: &CommitQuery,
) -> Result<Template, NotebookError> {
    let commits = source.fetch_commits(query).await?;

    let data = if commits.is_empty() {
        "No commits found for the selected range.".to_string()
    } else {
        commits
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    };

    Ok(Template::new(GITHUB_INSTRUCTIONS)
        .bind("REPO_URL", query.repo_url.as_str())
        .bind("BRANCH", query.branch.as_str())
        .bind("COMMIT_COUNT", commits.len().to_string())
        .bind("GH_DATA", data))
}

/// Scraped references. A link that fails to fetch becomes an inline error
/// marker; the section itself never fails.
pub async fn references_section(fetcher: &dyn ReferenceFetcher, links: &[String]) -> Template {
    let results = join_all(links.iter().map(|url| fetcher.fetch_reference(url))).await;

    let entries: Vec<String> = links
        .iter()
        .zip(results)
        .map(|(url, result)| match result {
            Ok(r) => format!("### {}\nSource: {}\n\n{}", r.title, url, r.excerpt),
            Err(e) => {
                tracing::warn!(url = %url, "Reference fetch failed: {}", e);
                reference_error_marker(url, &e)
            }
        })
        .collect();

    Template::new(REFERENCES_INSTRUCTIONS).bind("REFERENCES", entries.join("\n\n"))
}

/// Inline text that stands in for a reference that could not be fetched.
pub fn reference_error_marker(url: &str, err: &NotebookError) -> String {
    format!("[error fetching {}: {}]", url, err)
}

/// The researcher's notes file. Missing or empty files abort the section.
pub fn notes_section(path: &Path) -> Result<Template, NotebookError> {
    let notes = read_text_file(path)?;
    Ok(Template::new(NOTES_INSTRUCTIONS).bind("NOTES", notes))
}

/// Critique of `response` against the general instructions only.
pub fn critique_template(instructions: Arc<Template>, response: &str) -> Template {
    Template::new(CRITIQUE_INSTRUCTIONS)
        .bind("INSTRUCTIONS", instructions)
        .bind("RESPONSE", response)
}

pub fn revision_template(response: &str, critique: &str) -> Template {
    Template::new(REVISION_INSTRUCTIONS)
        .bind("RESPONSE", response)
        .bind("CRITIQUE", critique)
}

pub fn summary_template(response: &str) -> Template {
    Template::new(SUMMARY_INSTRUCTIONS).bind("RESPONSE", response)
}
