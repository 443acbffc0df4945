// src/sources/notes.rs — Free-text notes file

use std::path::Path;

use crate::infra::errors::NotebookError;

/// Read a notes file. Missing, unreadable or blank files are errors.
pub fn read_text_file(path: &Path) -> Result<String, NotebookError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        NotebookError::fetch("notes", format!("cannot read {}: {}", path.display(), e))
    })?;
    if content.trim().is_empty() {
        return Err(NotebookError::fetch(
            "notes",
            format!("{} is empty", path.display()),
        ));
    }
    Ok(content)
}
