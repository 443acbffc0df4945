// src/infra/paths.rs — Config and data locations
//
// NOTEBOOK_HOME overrides everything: config.toml lives directly under it and
// data under $NOTEBOOK_HOME/data. Otherwise config uses ~/.research-notebook/
// and data uses the platform data dir.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

fn notebook_home() -> Option<PathBuf> {
    std::env::var_os("NOTEBOOK_HOME").map(PathBuf::from)
}

/// Configuration directory. Falls back to the working directory when no home
/// directory can be determined.
pub fn config_dir() -> PathBuf {
    if let Some(home) = notebook_home() {
        return home;
    }
    BaseDirs::new()
        .map(|b| b.home_dir().join(".research-notebook"))
        .unwrap_or_else(|| PathBuf::from(".research-notebook"))
}

pub fn data_dir() -> PathBuf {
    if let Some(home) = notebook_home() {
        return home.join("data");
    }
    ProjectDirs::from("", "", "research-notebook")
        .map(|p| p.data_local_dir().to_path_buf())
        .unwrap_or_else(|| config_dir().join("data"))
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Default location of the document index database.
pub fn rag_db_path() -> PathBuf {
    data_dir().join("rag.db")
}
