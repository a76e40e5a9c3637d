//! SQLite-backed vector store.
//!
//! Rows live in a single `chunks` table; embeddings are stored as
//! little-endian `f32` BLOBs and cosine similarity is computed in-process
//! during the scan. Insertion order is the row id, which also serves as the
//! stable tie-breaker for equal similarities.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use tokio_rusqlite::Connection;

use super::{StoreStats, VectorStore};
use crate::types::{RagError, RetrievedChunk, TextChunk};

#[derive(Clone)]
pub struct SqliteVectorStore {
    conn: Connection,
}

impl SqliteVectorStore {
    /// Opens (creating if needed) the database file at `path`.
    ///
    /// Call [`initialize`](VectorStore::initialize) before first use.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RagError> {
        let conn = Connection::open(path)
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// Opens an in-memory database, for tests and ephemeral indexes.
    pub async fn open_in_memory() -> Result<Self, RagError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;
        Ok(Self { conn })
    }

    /// Dimensionality of the stored vectors, if any row exists.
    async fn stored_dimensions(&self) -> Result<Option<usize>, RagError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn
                    .prepare("SELECT length(embedding) FROM chunks ORDER BY id LIMIT 1")
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let mut rows = stmt
                    .query([])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let row = rows.next().map_err(tokio_rusqlite::Error::Rusqlite)?;
                match row {
                    Some(row) => {
                        let bytes: i64 = row.get(0).map_err(tokio_rusqlite::Error::Rusqlite)?;
                        Ok(Some(bytes as usize / 4))
                    }
                    None => Ok(None),
                }
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * 4);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn initialize(&self) -> Result<(), RagError> {
        self.conn
            .call(|conn| {
                conn.execute_batch(
                    "CREATE TABLE IF NOT EXISTS chunks (
                         id INTEGER PRIMARY KEY AUTOINCREMENT,
                         source TEXT NOT NULL,
                         heading TEXT,
                         content TEXT NOT NULL,
                         token_count INTEGER NOT NULL,
                         embedding BLOB NOT NULL
                     );
                     CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);",
                )
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn clear(&self) -> Result<(), RagError> {
        self.conn
            .call(|conn| {
                conn.execute("DELETE FROM chunks", [])
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn save_batch(&self, records: Vec<(TextChunk, Vec<f32>)>) -> Result<(), RagError> {
        if records.is_empty() {
            return Ok(());
        }

        // Validate dimensionality up front so a bad batch never touches the
        // table; the insert itself runs in one transaction.
        let dimensions = records[0].1.len();
        for (_, vector) in &records {
            if vector.len() != dimensions {
                return Err(RagError::VectorDimension {
                    got: vector.len(),
                    want: dimensions,
                });
            }
        }
        if let Some(stored) = self.stored_dimensions().await? {
            if stored != dimensions {
                return Err(RagError::VectorDimension {
                    got: dimensions,
                    want: stored,
                });
            }
        }

        let count = records.len();
        self.conn
            .call(move |conn| {
                let tx = conn
                    .transaction()
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                {
                    let mut stmt = tx
                        .prepare(
                            "INSERT INTO chunks (source, heading, content, token_count, embedding) \
                             VALUES (?1, ?2, ?3, ?4, ?5)",
                        )
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                    for (chunk, vector) in &records {
                        stmt.execute((
                            &chunk.source_id,
                            &chunk.heading_context,
                            &chunk.text,
                            chunk.token_count as i64,
                            encode_vector(vector),
                        ))
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                    }
                }
                tx.commit().map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(())
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))?;

        debug!(chunks = count, "saved batch");
        Ok(())
    }

    async fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<RetrievedChunk>, RagError> {
        // A wrong-dimension query must be a visible error, not a scan that
        // scores every row 0.0.
        if let Some(stored) = self.stored_dimensions().await? {
            if query.len() != stored {
                return Err(RagError::VectorDimension {
                    got: query.len(),
                    want: stored,
                });
            }
        }

        let query = query.to_vec();
        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT source, heading, content, token_count, embedding \
                         FROM chunks ORDER BY id",
                    )
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let rows = stmt
                    .query_map([], |row| {
                        let chunk = TextChunk {
                            source_id: row.get(0)?,
                            heading_context: row.get(1)?,
                            text: row.get(2)?,
                            token_count: row.get::<_, i64>(3)? as usize,
                        };
                        let embedding: Vec<u8> = row.get(4)?;
                        Ok((chunk, decode_vector(&embedding)))
                    })
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut scored = Vec::new();
                for row in rows {
                    let (chunk, vector) = row.map_err(tokio_rusqlite::Error::Rusqlite)?;
                    let similarity = cosine_similarity(&query, &vector);
                    scored.push(RetrievedChunk { chunk, similarity });
                }

                // Stable sort keeps insertion order for equal similarities.
                scored.sort_by(|a, b| {
                    b.similarity
                        .partial_cmp(&a.similarity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                scored.truncate(top_k);
                Ok(scored)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn stats(&self) -> Result<StoreStats, RagError> {
        self.conn
            .call(|conn| {
                let total: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut stmt = conn
                    .prepare("SELECT DISTINCT source FROM chunks ORDER BY source")
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map([], |row| row.get::<_, String>(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;

                let mut files = Vec::new();
                for row in rows {
                    files.push(row.map_err(tokio_rusqlite::Error::Rusqlite)?);
                }

                Ok(StoreStats {
                    total_chunks: total as usize,
                    sources: files.len(),
                    files,
                })
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.conn
            .call(|conn| {
                let count: i64 = conn
                    .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                Ok(count as usize)
            })
            .await
            .map_err(|err| RagError::Storage(err.to_string()))
    }
}
