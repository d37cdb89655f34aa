//! # MIE Core
//!
//! The memory graph engine behind MIE: typed nodes and edges persisted in an
//! embedded datalog store (CozoDB) with an HNSW vector index for semantic
//! retrieval.
//!
//! The engine is layered leaf-first: the [`storage`] substrate wrapper and
//! [`schema`] declarations at the bottom, [`ids`] and the [`embeddings`]
//! pipeline above them, then the [`writer`], [`reader`], and [`conflicts`]
//! operators, and finally the [`client::MemoryClient`] facade that wires the
//! whole engine behind one shareable handle.

pub mod client;
pub mod conflicts;
pub mod embeddings;
pub mod error;
pub mod ids;
pub mod reader;
pub mod schema;
pub mod storage;
pub mod types;
pub mod writer;

pub use client::{ClientConfig, MemoryClient};
pub use conflicts::ConflictDetector;
pub use embeddings::{
    create_provider, mock_embedding, CloudProvider, EmbeddingGenerator, EmbeddingProvider,
    LocalProvider, MockProvider,
};
pub use error::{MemoryError, Result};
pub use ids::{new_node_id, node_type_for_id, now_unix, prefix_for};
pub use reader::Reader;
pub use types::*;
pub use writer::Writer;
