// src/rag/ingest.rs — PDF text extraction and chunking

use std::path::Path;

use crate::infra::errors::NotebookError;

/// Text of one PDF page. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfPage {
    pub number: u32,
    pub text: String,
}

/// Extract text page by page. Pages with no extractable text are skipped.
/// Blocking: call from `spawn_blocking` inside async code.
pub fn extract_pdf_pages(path: &Path) -> Result<Vec<PdfPage>, NotebookError> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| NotebookError::fetch("pdf", format!("{}: {e}", path.display())))?;

    let mut pages = Vec::new();
    for number in doc.get_pages().keys().copied() {
        let text = match doc.extract_text(&[number]) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(page = number, "Text extraction failed: {e}");
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }
        pages.push(PdfPage { number, text });
    }

    if pages.is_empty() {
        return Err(NotebookError::fetch(
            "pdf",
            format!("{}: no extractable text", path.display()),
        ));
    }
    Ok(pages)
}

/// Split text into whitespace-delimited chunks of at most `max_chars`
/// characters. A single word longer than the limit becomes its own chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        let needed = if current.is_empty() {
            word_chars
        } else {
            current_chars + 1 + word_chars
        };

        if needed > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_chars += 1;
        }
        current.push_str(word);
        current_chars += word_chars;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("one two  three", 100), vec!["one two three"]);
    }

    #[test]
    fn test_splits_on_whitespace() {
        let chunks = chunk_text("aaa bbb ccc ddd", 7);
        assert_eq!(chunks, vec!["aaa bbb", "ccc ddd"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
    }

    #[test]
    fn test_long_word_own_chunk() {
        assert_eq!(
            chunk_text("a supercalifragilistic b", 5),
            vec!["a", "supercalifragilistic", "b"]
        );
    }

    #[test]
    fn test_blank_text_no_chunks() {
        assert!(chunk_text(" \n\t ", 10).is_empty());
    }

    #[test]
    fn test_missing_pdf_is_fetch_error() {
        let err = extract_pdf_pages(Path::new("/nonexistent/manual.pdf")).unwrap_err();
        assert!(matches!(err, NotebookError::Fetch { .. }));
    }
}
