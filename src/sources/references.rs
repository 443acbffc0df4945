// src/sources/references.rs — Reference links: loading, fetching, HTML extraction

use std::path::Path;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::infra::errors::NotebookError;
use crate::util::truncate_str;

const COLLABORATOR: &str = "references";

/// Title and leading text of a scraped page.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub title: String,
    pub excerpt: String,
}

#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    async fn fetch_reference(&self, url: &str) -> Result<Reference, NotebookError>;
}

/// Read one link per line, skipping blank lines.
pub fn load_reference_links(path: &Path) -> Result<Vec<String>, NotebookError> {
    if !path.is_file() {
        return Err(NotebookError::fetch(
            COLLABORATOR,
            format!("Reference links file {} does not exist", path.display()),
        ));
    }
    let content = std::fs::read_to_string(path)?;
    let links: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();
    if links.is_empty() {
        return Err(NotebookError::fetch(
            COLLABORATOR,
            format!("No valid links found in {}", path.display()),
        ));
    }
    Ok(links)
}

/// Pull the `<title>` and the paragraph text out of an HTML page.
/// Falls back to the whole body text when the page has no paragraphs.
pub fn parse_reference_html(html: &str, excerpt_chars: usize) -> Reference {
    let doc = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let paragraphs: Vec<String> = Selector::parse("p")
        .map(|sel| {
            doc.select(&sel)
                .map(|el| collapse_whitespace(&el.text().collect::<String>()))
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let text = if paragraphs.is_empty() {
        Selector::parse("body")
            .ok()
            .and_then(|sel| doc.select(&sel).next())
            .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
            .unwrap_or_default()
    } else {
        paragraphs.join("\n\n")
    };

    Reference {
        title,
        excerpt: truncate_str(&text, excerpt_chars).to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fetches pages over HTTP and extracts them with [`parse_reference_html`].
pub struct HttpReferenceFetcher {
    client: reqwest::Client,
    excerpt_chars: usize,
}

impl HttpReferenceFetcher {
    pub fn new(excerpt_chars: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            excerpt_chars,
        }
    }
}

#[async_trait]
impl ReferenceFetcher for HttpReferenceFetcher {
    async fn fetch_reference(&self, url: &str) -> Result<Reference, NotebookError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NotebookError::fetch(COLLABORATOR, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotebookError::fetch(
                COLLABORATOR,
                format!("status code {}", status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| NotebookError::fetch(COLLABORATOR, e.to_string()))?;

        let reference = parse_reference_html(&body, self.excerpt_chars);
        if reference.excerpt.is_empty() {
            return Err(NotebookError::fetch(COLLABORATOR, "no text content found"));
        }
        Ok(reference)
    }
}
