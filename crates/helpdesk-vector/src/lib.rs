//! Helpdesk vector crate - chunking, corpus loading, embedding, index and retrieval.
//!
//! Documents are split into bounded chunks, embedded, and held in an
//! in-memory cosine index behind the `Retriever` trait that the chat
//! orchestrator consumes.

pub mod chunker;
pub mod corpus;
pub mod embedding;
pub mod index;
pub mod retriever;

pub use chunker::{chunk_text, DEFAULT_MAX_CHARS};
pub use corpus::{load_documents, Document};
pub use embedding::{EmbeddingService, HashingEmbedding};
pub use index::{IndexedChunk, SearchHit, VectorIndex};
pub use retriever::{LocalRetriever, Retriever};
