// src/rag/mod.rs — Document index over PDF pages

pub mod assistant;
pub mod embeddings;
pub mod ingest;
pub mod schema;
pub mod store;
pub mod tools;

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::infra::errors::NotebookError;
use crate::provider::ModelProvider;
use ingest::{chunk_text, PdfPage};
use store::{PageChunk, PageStore, ScoredChunk};

/// Number of chunks sent per embedding request.
const EMBED_BATCH: usize = 64;

/// Summary of an ingest run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub collection: String,
    pub pages: usize,
    pub chunks: usize,
}

/// Owns the SQLite store and the embedding backend.
///
/// The store sits behind a sync mutex; the lock is never held across an
/// embedding call.
pub struct DocumentIndex {
    store: Mutex<PageStore>,
    provider: Arc<dyn ModelProvider>,
    embedding_model: String,
}

impl DocumentIndex {
    /// Open (or create) the database at the given path.
    pub fn open(
        path: &Path,
        provider: Arc<dyn ModelProvider>,
        embedding_model: impl Into<String>,
    ) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::run_migrations(&conn)?;
        Ok(Self::with_connection(conn, provider, embedding_model))
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory(
        provider: Arc<dyn ModelProvider>,
        embedding_model: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::run_migrations(&conn)?;
        Ok(Self::with_connection(conn, provider, embedding_model))
    }

    fn with_connection(
        conn: Connection,
        provider: Arc<dyn ModelProvider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            store: Mutex::new(PageStore::new(conn)),
            provider,
            embedding_model: embedding_model.into(),
        }
    }

    fn with_store<T>(
        &self,
        f: impl FnOnce(&PageStore) -> Result<T, NotebookError>,
    ) -> Result<T, NotebookError> {
        let guard = self
            .store
            .lock()
            .map_err(|_| NotebookError::Other(anyhow::anyhow!("page store lock poisoned")))?;
        f(&guard)
    }

    pub fn collection_exists(&self, name: &str) -> Result<bool, NotebookError> {
        self.with_store(|s| s.collection_exists(name))
    }

    pub fn list_collections(&self) -> Result<Vec<store::CollectionInfo>, NotebookError> {
        self.with_store(|s| s.list_collections())
    }

    /// Chunk, embed and store `pages` as a new collection. Fails with
    /// `CollectionExists` before any embedding call if the name is taken.
    /// Nothing is written unless every chunk embedded.
    pub async fn ingest(
        &self,
        collection: &str,
        source: &str,
        pages: &[PdfPage],
        chunk_chars: usize,
    ) -> Result<IngestReport, NotebookError> {
        if self.collection_exists(collection)? {
            return Err(NotebookError::CollectionExists {
                name: collection.into(),
            });
        }

        let chunks: Vec<PageChunk> = pages
            .iter()
            .flat_map(|page| {
                chunk_text(&page.text, chunk_chars)
                    .into_iter()
                    .enumerate()
                    .map(move |(i, content)| PageChunk {
                        id: PageChunk::make_id(collection, page.number, i as u32),
                        collection: collection.to_string(),
                        page: page.number,
                        chunk_index: i as u32,
                        source: source.to_string(),
                        content,
                    })
            })
            .collect();

        let mut embeddings = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(EMBED_BATCH) {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let vectors = self.provider.embed(&self.embedding_model, &texts).await?;
            embeddings.extend(vectors);
            tracing::debug!(done = embeddings.len(), total = chunks.len(), "Embedded chunks");
        }

        self.with_store(|s| {
            let tx = s.conn().unchecked_transaction()?;
            s.create_collection(collection, source)?;
            for (chunk, embedding) in chunks.iter().zip(&embeddings) {
                s.insert_chunk(chunk, embedding)?;
            }
            tx.commit()?;
            Ok(())
        })?;

        tracing::info!(
            collection,
            pages = pages.len(),
            chunks = chunks.len(),
            "Collection indexed"
        );

        Ok(IngestReport {
            collection: collection.to_string(),
            pages: pages.len(),
            chunks: chunks.len(),
        })
    }

    /// Embed `query` and return the `n_results` closest chunks.
    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        n_results: usize,
    ) -> Result<Vec<ScoredChunk>, NotebookError> {
        // Fail on an unknown collection before paying for an embedding.
        if !self.collection_exists(collection)? {
            return Err(NotebookError::CollectionNotFound {
                name: collection.into(),
            });
        }

        let mut vectors = self.provider.embed(&self.embedding_model, &[query]).await?;
        let query_vec = vectors.pop().ok_or_else(|| NotebookError::Provider {
            provider: self.provider.id().to_string(),
            message: "no embedding returned for query".into(),
            retriable: false,
        })?;

        self.with_store(|s| s.top_k(collection, &query_vec, n_results))
    }
}

/// Render search hits as page-labelled passages.
pub fn format_hits(hits: &[ScoredChunk]) -> String {
    if hits.is_empty() {
        return "No matching pages.".into();
    }
    hits.iter()
        .map(|h| format!("[page {}]\n{}", h.chunk.page, h.chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct page numbers of the hits, in hit order.
pub fn hit_pages(hits: &[ScoredChunk]) -> Vec<u32> {
    let mut pages = Vec::new();
    for h in hits {
        if !pages.contains(&h.chunk.page) {
            pages.push(h.chunk.page);
        }
    }
    pages
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::provider::{ChatRequest, ChatResponse};
    use async_trait::async_trait;

    /// Embeds text as keyword counts over a tiny fixed vocabulary.
    pub struct KeywordEmbedder;

    pub const VOCAB: [&str; 4] = ["install", "config", "error", "network"];

    pub fn keyword_vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCAB
            .iter()
            .map(|w| lower.matches(w).count() as f32)
            .collect()
    }

    #[async_trait]
    impl ModelProvider for KeywordEmbedder {
        fn id(&self) -> &str {
            "keywords"
        }

        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, NotebookError> {
            Err(NotebookError::Provider {
                provider: "keywords".into(),
                message: "chat not supported".into(),
                retriable: false,
            })
        }

        async fn embed(&self, _model: &str, texts: &[&str]) -> Result<Vec<Vec<f32>>, NotebookError> {
            Ok(texts.iter().map(|t| keyword_vector(t)).collect())
        }
    }

    pub fn page(number: u32, text: &str) -> PdfPage {
        PdfPage {
            number,
            text: text.into(),
        }
    }
}
