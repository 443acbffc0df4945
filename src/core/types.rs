// src/core/types.rs — Refinement loop domain types

use serde::{Deserialize, Serialize};

use crate::infra::config::RefinementConfig;

/// Artifacts of one critique/revise round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: u32,
    /// Response the round started from.
    pub before: String,
    pub critique: String,
    pub revised: String,
    pub summary: Option<String>,
}

/// Everything the loop produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementOutcome {
    /// Response to the merged notebook prompt, before any critique.
    pub initial: String,
    pub rounds: Vec<RoundRecord>,
}

impl RefinementOutcome {
    /// Latest revision, or the initial response when no rounds ran.
    pub fn final_response(&self) -> &str {
        self.rounds
            .last()
            .map(|r| r.revised.as_str())
            .unwrap_or(&self.initial)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoopConfig {
    pub iterations: u32,
    pub summarize: bool,
}

impl From<&RefinementConfig> for LoopConfig {
    fn from(c: &RefinementConfig) -> Self {
        Self {
            iterations: c.iterations,
            summarize: c.summarize,
        }
    }
}

/// Lifecycle events emitted while the loop runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Generated { chars: usize },
    RoundStart { round: u32, total: u32 },
    Critiqued { round: u32, chars: usize },
    Revised { round: u32, chars: usize },
    Summarized { round: u32, chars: usize },
    Complete { rounds: u32, calls: u32 },
}
