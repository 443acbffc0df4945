// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::paths;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub refinement: RefinementConfig,

    #[serde(default)]
    pub github: GithubConfig,

    #[serde(default)]
    pub references: ReferencesConfig,

    #[serde(default)]
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider_url: String,
    pub model: String,
    pub embedding_model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Deadline applied to each completion call.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            embedding_model: "text-embedding-3-small".into(),
            temperature: None,
            max_tokens: None,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    pub iterations: u32,
    pub summarize: bool,
    pub output_dir: String,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            summarize: false,
            output_dir: "notebook_iterations".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub api_url: String,
    pub per_page: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".into(),
            per_page: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencesConfig {
    pub excerpt_chars: usize,
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            excerpt_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Database path; defaults to the data dir when unset.
    #[serde(default)]
    pub database: Option<String>,
    pub chunk_chars: usize,
    pub n_results: usize,
    pub agent_model: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            database: None,
            chunk_chars: 4000,
            n_results: 3,
            agent_model: "gpt-4o".into(),
        }
    }
}

impl RagConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::rag_db_path)
    }
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}
