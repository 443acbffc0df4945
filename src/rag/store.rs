// src/rag/store.rs — SQLite operations for collections and page chunks

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::embeddings::{cosine_similarity, decode_vector, encode_vector};
use crate::infra::errors::NotebookError;

/// A stored slice of a PDF page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageChunk {
    pub id: String,
    pub collection: String,
    pub page: u32,
    pub chunk_index: u32,
    pub source: String,
    pub content: String,
}

impl PageChunk {
    pub fn make_id(collection: &str, page: u32, chunk_index: u32) -> String {
        format!("{collection}:page:{page}:{chunk_index}")
    }
}

/// A chunk with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: PageChunk,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub name: String,
    pub source: String,
    pub created_at: String,
    pub chunk_count: u32,
}

pub struct PageStore {
    conn: Connection,
}

impl PageStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    // -- Collections --

    pub fn create_collection(&self, name: &str, source: &str) -> Result<(), NotebookError> {
        if self.collection_exists(name)? {
            return Err(NotebookError::CollectionExists { name: name.into() });
        }
        self.conn.execute(
            "INSERT INTO collections (name, source, created_at) VALUES (?1, ?2, ?3)",
            params![name, source, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn collection_exists(&self, name: &str) -> Result<bool, NotebookError> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM collections WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn delete_collection(&self, name: &str) -> Result<(), NotebookError> {
        // Explicit chunk delete so this works without the foreign_keys pragma.
        self.conn
            .execute("DELETE FROM chunks WHERE collection = ?1", params![name])?;
        let removed = self
            .conn
            .execute("DELETE FROM collections WHERE name = ?1", params![name])?;
        if removed == 0 {
            return Err(NotebookError::CollectionNotFound { name: name.into() });
        }
        Ok(())
    }

    pub fn list_collections(&self) -> Result<Vec<CollectionInfo>, NotebookError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name, c.source, c.created_at, COUNT(k.id)
             FROM collections c LEFT JOIN chunks k ON k.collection = c.name
             GROUP BY c.name ORDER BY c.name",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CollectionInfo {
                name: row.get(0)?,
                source: row.get(1)?,
                created_at: row.get(2)?,
                chunk_count: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // -- Chunks --

    pub fn insert_chunk(&self, chunk: &PageChunk, embedding: &[f32]) -> Result<(), NotebookError> {
        self.conn.execute(
            "INSERT INTO chunks (id, collection, page, chunk_index, source, content, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                chunk.id,
                chunk.collection,
                chunk.page,
                chunk.chunk_index,
                chunk.source,
                chunk.content,
                encode_vector(embedding),
            ],
        )?;
        Ok(())
    }

    pub fn count_chunks(&self, collection: &str) -> Result<u32, NotebookError> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM chunks WHERE collection = ?1",
            params![collection],
            |r| r.get(0),
        )?)
    }

    fn load_embedded(&self, collection: &str) -> Result<Vec<(PageChunk, Vec<f32>)>, NotebookError> {
        if !self.collection_exists(collection)? {
            return Err(NotebookError::CollectionNotFound {
                name: collection.into(),
            });
        }
        let mut stmt = self.conn.prepare(
            "SELECT id, collection, page, chunk_index, source, content, embedding
             FROM chunks WHERE collection = ?1 ORDER BY page, chunk_index",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            let blob: Vec<u8> = row.get(6)?;
            Ok((
                PageChunk {
                    id: row.get(0)?,
                    collection: row.get(1)?,
                    page: row.get(2)?,
                    chunk_index: row.get(3)?,
                    source: row.get(4)?,
                    content: row.get(5)?,
                },
                decode_vector(&blob),
            ))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Chunks of a collection in page order.
    pub fn chunks_for_collection(&self, collection: &str) -> Result<Vec<PageChunk>, NotebookError> {
        Ok(self
            .load_embedded(collection)?
            .into_iter()
            .map(|(chunk, _)| chunk)
            .collect())
    }

    /// Rank every chunk of the collection against `query` and keep the best `k`.
    /// Ties keep page order.
    pub fn top_k(
        &self,
        collection: &str,
        query: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredChunk>, NotebookError> {
        let mut scored: Vec<ScoredChunk> = self
            .load_embedded(collection)?
            .into_iter()
            .map(|(chunk, embedding)| ScoredChunk {
                score: cosine_similarity(query, &embedding),
                chunk,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }
}
