// src/sources/mod.rs — External data the notebook sections are built from

pub mod github;
pub mod notes;
pub mod references;
