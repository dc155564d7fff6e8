//! In-memory vector index with brute-force cosine similarity search.
//!
//! All searches are O(n) over the indexed chunks, which is adequate for a
//! support-document corpus. Similarity search proper belongs to an external
//! service; this index backs the local retriever.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

use helpdesk_core::error::HelpdeskError;

/// Provenance and text of one indexed chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedChunk {
    pub source_document: String,
    pub chunk_index: usize,
    pub content: String,
}

/// A single hit returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// The ID of the matching entry.
    pub id: Uuid,
    /// Cosine similarity score.
    pub score: f64,
    pub chunk: IndexedChunk,
}

#[derive(Debug, Clone)]
struct VectorEntry {
    embedding: Vec<f32>,
    chunk: IndexedChunk,
}

/// In-memory vector index, thread-safe via an interior RwLock.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Arc<RwLock<HashMap<Uuid, VectorEntry>>>,
}

impl VectorIndex {
    /// Create a new empty vector index.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a chunk embedding. Overwrites any existing entry with the same ID.
    pub fn insert(
        &self,
        id: Uuid,
        embedding: Vec<f32>,
        chunk: IndexedChunk,
    ) -> Result<(), HelpdeskError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| HelpdeskError::Retrieval(format!("Lock poisoned: {}", e)))?;
        entries.insert(id, VectorEntry { embedding, chunk });
        Ok(())
    }

    /// Search for the k nearest neighbors to the query vector by cosine similarity.
    ///
    /// Results are sorted by descending score; ties fall back to document
    /// name and chunk index so the order is stable.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, HelpdeskError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| HelpdeskError::Retrieval(format!("Lock poisoned: {}", e)))?;

        let mut scored: Vec<SearchHit> = entries
            .iter()
            .map(|(id, entry)| SearchHit {
                id: *id,
                score: cosine_similarity(query, &entry.embedding),
                chunk: entry.chunk.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.chunk.source_document.cmp(&b.chunk.source_document))
                .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
        });
        scored.truncate(k);

        Ok(scored)
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<(), HelpdeskError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| HelpdeskError::Retrieval(format!("Lock poisoned: {}", e)))?;
        entries.clear();
        Ok(())
    }

    /// Return the number of chunks currently stored in the index.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Return true if the index contains no chunks.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude or the lengths differ.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}
