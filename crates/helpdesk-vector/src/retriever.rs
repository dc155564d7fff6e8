//! Retrieval gateway: ranked context chunks for a query.
//!
//! `Retriever` is the seam the orchestrator depends on. `LocalRetriever`
//! implements it over the corpus directory, building its index lazily on
//! first use. Any failure on the retrieval path degrades to an empty result
//! rather than an error.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use helpdesk_core::config::RetrievalConfig;
use helpdesk_core::error::HelpdeskError;
use helpdesk_core::types::ContextChunk;

use crate::chunker::chunk_text;
use crate::corpus::{load_documents, Document};
use crate::embedding::{EmbeddingService, HashingEmbedding};
use crate::index::{IndexedChunk, VectorIndex};

/// Source of scored context chunks.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `top_k` chunks, best match first.
    ///
    /// Never fails: an empty index or an unavailable backend yields an
    /// empty vector.
    async fn retrieve(&self, query: &str, top_k: usize) -> Vec<ContextChunk>;

    /// Number of chunks currently indexed, if known.
    fn indexed_chunks(&self) -> usize {
        0
    }
}

/// Where the local retriever gets its documents from.
#[derive(Debug, Clone)]
enum CorpusSource {
    Directory(PathBuf),
    Documents(Vec<Document>),
}

/// Retriever over a local document corpus.
pub struct LocalRetriever<E: EmbeddingService = HashingEmbedding> {
    source: CorpusSource,
    max_chars: usize,
    min_score: f64,
    embedder: E,
    index: VectorIndex,
    ready: OnceCell<usize>,
}

impl LocalRetriever<HashingEmbedding> {
    /// Retriever over `config.docs_dir` using the hashing embedding.
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(
            PathBuf::from(&config.docs_dir),
            HashingEmbedding::new(config.embedding_dim),
            config.chunk_max_chars,
            config.min_score,
        )
    }
}

impl<E: EmbeddingService> LocalRetriever<E> {
    /// Retriever over the documents in `docs_dir`.
    pub fn new(docs_dir: PathBuf, embedder: E, max_chars: usize, min_score: f64) -> Self {
        Self::with_source(CorpusSource::Directory(docs_dir), embedder, max_chars, min_score)
    }

    /// Retriever over an in-memory set of documents.
    pub fn from_documents(
        documents: Vec<Document>,
        embedder: E,
        max_chars: usize,
        min_score: f64,
    ) -> Self {
        Self::with_source(
            CorpusSource::Documents(documents),
            embedder,
            max_chars,
            min_score,
        )
    }

    fn with_source(source: CorpusSource, embedder: E, max_chars: usize, min_score: f64) -> Self {
        Self {
            source,
            max_chars,
            min_score,
            embedder,
            index: VectorIndex::new(),
            ready: OnceCell::new(),
        }
    }

    /// Build the index now instead of on the first query.
    ///
    /// Returns the number of indexed chunks. A failed build is retried on
    /// the next call.
    pub async fn warm_up(&self) -> Result<usize, HelpdeskError> {
        self.ready
            .get_or_try_init(|| self.build_index())
            .await
            .copied()
    }

    async fn build_index(&self) -> Result<usize, HelpdeskError> {
        let documents = match &self.source {
            CorpusSource::Documents(docs) => docs.clone(),
            CorpusSource::Directory(dir) => {
                let dir = dir.clone();
                tokio::task::spawn_blocking(move || load_documents(&dir))
                    .await
                    .map_err(|e| {
                        HelpdeskError::Retrieval(format!("Corpus load task panicked: {}", e))
                    })??
            }
        };

        self.index.clear()?;
        let mut count = 0usize;
        for doc in &documents {
            for (chunk_index, content) in chunk_text(&doc.text, self.max_chars)
                .into_iter()
                .enumerate()
            {
                let embedding = match self.embedder.embed(&content).await {
                    Ok(embedding) => embedding,
                    Err(e) => {
                        warn!(
                            document = %doc.name,
                            chunk_index,
                            error = %e,
                            "Skipping chunk that could not be embedded"
                        );
                        continue;
                    }
                };
                self.index.insert(
                    Uuid::new_v4(),
                    embedding,
                    IndexedChunk {
                        source_document: doc.name.clone(),
                        chunk_index,
                        content,
                    },
                )?;
                count += 1;
            }
        }

        info!(
            documents = documents.len(),
            chunks = count,
            "Retrieval index built"
        );
        Ok(count)
    }
}

#[async_trait]
impl<E: EmbeddingService> Retriever for LocalRetriever<E> {
    async fn retrieve(&self, query: &str, top_k: usize) -> Vec<ContextChunk> {
        if top_k == 0 {
            return Vec::new();
        }

        match self.warm_up().await {
            Ok(0) => {
                debug!("Retrieval index is empty");
                return Vec::new();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Retrieval index unavailable");
                return Vec::new();
            }
        }

        let query_vec = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                debug!(error = %e, "Query could not be embedded");
                return Vec::new();
            }
        };

        let hits = match self.index.search(&query_vec, top_k) {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "Vector search failed");
                return Vec::new();
            }
        };

        hits.into_iter()
            .filter(|hit| hit.score > self.min_score)
            .map(|hit| ContextChunk {
                source_document: hit.chunk.source_document,
                chunk_index: hit.chunk.chunk_index,
                content: hit.chunk.content,
                relevance_score: hit.score,
            })
            .collect()
    }

    fn indexed_chunks(&self) -> usize {
        self.index.len()
    }
}
