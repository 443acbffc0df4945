// src/core/mod.rs — Prompt composition and the refinement loop

pub mod pipeline;
pub mod refinement;
pub mod sections;
pub mod template;
pub mod types;
pub mod writer;
