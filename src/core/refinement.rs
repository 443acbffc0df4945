// src/core/refinement.rs — Generate, critique, revise

use std::sync::Arc;

use super::sections::{critique_template, revision_template, summary_template};
use super::template::Template;
use super::types::*;
use crate::infra::errors::NotebookError;
use crate::provider::gateway::CompletionGateway;
use crate::util::preview;

/// Drives the fixed-length refinement loop.
///
/// Every gateway call is awaited before the next one is issued; round `i + 1`
/// starts from the revision produced by round `i`. There is no convergence
/// check: the loop always runs the configured number of rounds.
pub struct Refiner {
    gateway: Arc<dyn CompletionGateway>,
    config: LoopConfig,
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

impl Refiner {
    pub fn new(gateway: Arc<dyn CompletionGateway>, config: LoopConfig) -> Self {
        Self {
            gateway,
            config,
            on_progress: None,
        }
    }

    /// Set a callback for progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    async fn call(&self, template: &Template, calls: &mut u32) -> Result<String, NotebookError> {
        let prompt = template.render()?;
        *calls += 1;
        self.gateway.complete(&prompt).await
    }

    /// Run the loop.
    ///
    /// `document` is the fully merged notebook prompt; `instructions` is the
    /// general-instructions section alone, which the critique step checks
    /// drafts against.
    pub async fn run(
        &self,
        document: &Template,
        instructions: Arc<Template>,
    ) -> Result<RefinementOutcome, NotebookError> {
        let mut calls = 0u32;

        let initial = self.call(document, &mut calls).await?;
        tracing::info!(chars = initial.len(), "Initial notebook generated");
        self.emit(ProgressEvent::Generated {
            chars: initial.len(),
        });

        let total = self.config.iterations;
        let mut rounds = Vec::with_capacity(total as usize);
        let mut current = initial.clone();

        for round in 1..=total {
            self.emit(ProgressEvent::RoundStart { round, total });

            let critique = self
                .call(&critique_template(instructions.clone(), &current), &mut calls)
                .await?;
            tracing::debug!(round, critique = %preview(&critique, 80), "Critique received");
            self.emit(ProgressEvent::Critiqued {
                round,
                chars: critique.len(),
            });

            let revised = self
                .call(&revision_template(&current, &critique), &mut calls)
                .await?;
            self.emit(ProgressEvent::Revised {
                round,
                chars: revised.len(),
            });

            let summary = if self.config.summarize {
                let s = self.call(&summary_template(&revised), &mut calls).await?;
                self.emit(ProgressEvent::Summarized {
                    round,
                    chars: s.len(),
                });
                Some(s)
            } else {
                None
            };

            tracing::info!(round, total, "Refinement round complete");

            let before = std::mem::replace(&mut current, revised.clone());
            rounds.push(RoundRecord {
                round,
                before,
                critique,
                revised,
                summary,
            });
        }

        self.emit(ProgressEvent::Complete {
            rounds: total,
            calls,
        });

        Ok(RefinementOutcome { initial, rounds })
    }
}
