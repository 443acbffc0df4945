// src/lib.rs — Library root for the research notebook generator

pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
pub mod rag;
pub mod sources;
pub mod util;
