// src/core/pipeline.rs — Notebook assembly: sections in, refined notebook out

use std::path::PathBuf;
use std::sync::Arc;

use super::refinement::Refiner;
use super::sections::{github_section, instructions_section, notes_section, references_section};
use super::template::Template;
use super::types::{LoopConfig, ProgressEvent, RefinementOutcome};
use crate::infra::errors::NotebookError;
use crate::provider::gateway::CompletionGateway;
use crate::sources::github::{CommitQuery, CommitSource};
use crate::sources::references::ReferenceFetcher;

/// Inputs for one notebook run.
#[derive(Debug, Clone)]
pub struct NotebookRequest {
    pub commits: CommitQuery,
    pub reference_links: Vec<String>,
    pub notes_path: PathBuf,
}

/// The merged prompt plus the instruction section it started from.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub instructions: Arc<Template>,
    pub document: Template,
}

/// Owns the collaborator handles for a run. Nothing is global: callers build
/// the clients and pass them in.
pub struct NotebookPipeline {
    commits: Arc<dyn CommitSource>,
    references: Arc<dyn ReferenceFetcher>,
    gateway: Arc<dyn CompletionGateway>,
    config: LoopConfig,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

impl NotebookPipeline {
    pub fn new(
        commits: Arc<dyn CommitSource>,
        references: Arc<dyn ReferenceFetcher>,
        gateway: Arc<dyn CompletionGateway>,
        config: LoopConfig,
    ) -> Self {
        Self {
            commits,
            references,
            gateway,
            config,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    /// Build every section and merge them in notebook order: instructions,
    /// GitHub data, references, notes.
    pub async fn assemble(&self, request: &NotebookRequest) -> Result<AssembledPrompt, NotebookError> {
        let instructions = Arc::new(instructions_section());

        // Cheap local check first so a bad notes path fails before any network I/O.
        let notes = notes_section(&request.notes_path)?;
        let github = github_section(self.commits.as_ref(), &request.commits).await?;
        let references =
            references_section(self.references.as_ref(), &request.reference_links).await;

        let document = instructions
            .merge(&github)
            .merge(&references)
            .merge(&notes);

        tracing::info!(
            links = request.reference_links.len(),
            body_chars = document.body().len(),
            "Notebook prompt assembled",
        );

        Ok(AssembledPrompt {
            instructions,
            document,
        })
    }

    /// Assemble the prompt and run the refinement loop over it.
    pub async fn run(self, request: &NotebookRequest) -> Result<RefinementOutcome, NotebookError> {
        let prompt = self.assemble(request).await?;

        let mut refiner = Refiner::new(self.gateway, self.config);
        if let Some(cb) = self.on_progress {
            refiner = refiner.with_progress(cb);
        }
        refiner.run(&prompt.document, prompt.instructions).await
    }
}
