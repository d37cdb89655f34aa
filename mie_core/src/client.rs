//! Client facade over the memory graph engine.
//!
//! One [`MemoryClient`] per process: it opens the substrate, ensures the
//! schema and vector indexes, wires the writer, reader, and conflict
//! detector, and exposes the whole engine API behind a single handle that is
//! safe to share across tasks.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::conflicts::ConflictDetector;
use crate::embeddings::{create_provider, EmbeddingGenerator};
use crate::error::Result;
use crate::reader::Reader;
use crate::schema;
use crate::storage::Substrate;
use crate::types::{
    Conflict, ConflictOptions, Decision, Entity, EntityWithRole, Event, ExportData, ExportOptions,
    Fact, GraphStats, Invalidation, ListOptions, Node, SearchResult, StoreDecisionRequest,
    StoreEntityRequest, StoreEventRequest, StoreFactRequest, StoreTopicRequest, Topic,
};
use crate::writer::Writer;

const DEFAULT_DIMENSIONS: usize = 768;
const DEFAULT_WORKERS: usize = 4;

/// Configuration for opening a [`MemoryClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Substrate engine: `mem`, `sqlite`, or `rocksdb`.
    pub storage_engine: String,
    /// Substrate target: a directory for rocksdb, a file for sqlite,
    /// ignored for mem.
    pub storage_path: String,
    pub embedding_enabled: bool,
    pub embedding_provider: String,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub embedding_api_key: String,
    pub embedding_dimensions: usize,
    pub embedding_workers: usize,
}

/// Shared access point to the MIE memory graph.
pub struct MemoryClient {
    substrate: Arc<Substrate>,
    writer: Writer,
    reader: Reader,
    detector: ConflictDetector,
    config: ClientConfig,
    embeddings_enabled: bool,
}

impl MemoryClient {
    /// Open the substrate, ensure the schema, and assemble the engine.
    ///
    /// A provider that cannot be constructed degrades to a client without
    /// embeddings rather than failing startup.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let dimensions = if config.embedding_dimensions == 0 {
            DEFAULT_DIMENSIONS
        } else {
            config.embedding_dimensions
        };
        let workers = if config.embedding_workers == 0 {
            DEFAULT_WORKERS
        } else {
            config.embedding_workers
        };

        let substrate = Arc::new(Substrate::open(
            &config.storage_engine,
            &config.storage_path,
        )?);
        schema::ensure_schema(&substrate, dimensions)?;

        let embedder = if config.embedding_enabled {
            schema::ensure_hnsw_indexes(&substrate, dimensions)?;
            match create_provider(
                &config.embedding_provider,
                &config.embedding_base_url,
                &config.embedding_model,
                &config.embedding_api_key,
                dimensions,
            ) {
                Ok(provider) => Some(Arc::new(EmbeddingGenerator::new(
                    provider, dimensions, workers,
                ))),
                Err(e) => {
                    tracing::warn!(
                        "cannot create embedding provider, continuing without embeddings: {e}"
                    );
                    None
                }
            }
        } else {
            None
        };

        let embeddings_enabled = embedder.is_some();
        let writer = Writer::new(substrate.clone(), embedder.clone());
        let reader = Reader::new(substrate.clone(), embedder);
        let detector = ConflictDetector::new(reader.clone());

        Ok(Self {
            substrate,
            writer,
            reader,
            detector,
            config,
            embeddings_enabled,
        })
    }

    /// Whether the embedding pipeline is configured and usable.
    pub fn embeddings_enabled(&self) -> bool {
        self.embeddings_enabled
    }

    /// Execute a raw CozoScript query. Debugging surface only.
    pub fn raw_query(&self, script: &str) -> Result<cozo::NamedRows> {
        self.substrate.run_raw(script)
    }

    // --- Write operations ---

    pub async fn store_fact(&self, req: StoreFactRequest) -> Result<Fact> {
        self.writer.store_fact(req).await
    }

    pub async fn store_decision(&self, req: StoreDecisionRequest) -> Result<Decision> {
        self.writer.store_decision(req).await
    }

    pub async fn store_entity(&self, req: StoreEntityRequest) -> Result<Entity> {
        self.writer.store_entity(req).await
    }

    pub async fn store_event(&self, req: StoreEventRequest) -> Result<Event> {
        self.writer.store_event(req).await
    }

    pub async fn store_topic(&self, req: StoreTopicRequest) -> Result<Topic> {
        self.writer.store_topic(req).await
    }

    pub async fn invalidate_fact(
        &self,
        old_fact_id: &str,
        new_fact_id: &str,
        reason: &str,
    ) -> Result<()> {
        self.writer
            .invalidate_fact(old_fact_id, new_fact_id, reason)
            .await
    }

    pub async fn add_relationship(
        &self,
        edge: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<()> {
        self.writer.add_relationship(edge, fields).await
    }

    pub async fn update_description(&self, node_id: &str, new_description: &str) -> Result<()> {
        self.writer.update_description(node_id, new_description).await
    }

    pub async fn update_status(&self, node_id: &str, new_status: &str) -> Result<()> {
        self.writer.update_status(node_id, new_status).await
    }

    pub async fn increment_counter(&self, key: &str) -> Result<()> {
        self.writer.increment_counter(key).await
    }

    // --- Read operations ---

    pub async fn semantic_search(
        &self,
        query: &str,
        node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.reader.semantic_search(query, node_types, limit).await
    }

    pub async fn exact_search(
        &self,
        query: &str,
        node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        self.reader.exact_search(query, node_types, limit).await
    }

    pub async fn get_node(&self, node_id: &str) -> Result<Node> {
        self.reader.get_node(node_id).await
    }

    pub async fn list_nodes(&self, opts: ListOptions) -> Result<(Vec<Node>, usize)> {
        self.reader.list_nodes(opts).await
    }

    pub async fn find_entity_by_name(&self, name: &str) -> Result<Option<Entity>> {
        self.reader.find_entity_by_name(name).await
    }

    // --- Graph traversal ---

    pub async fn related_entities(&self, fact_id: &str) -> Result<Vec<Entity>> {
        self.reader.related_entities(fact_id).await
    }

    pub async fn facts_about_entity(&self, entity_id: &str) -> Result<Vec<Fact>> {
        self.reader.facts_about_entity(entity_id).await
    }

    pub async fn decision_entities(&self, decision_id: &str) -> Result<Vec<EntityWithRole>> {
        self.reader.decision_entities(decision_id).await
    }

    pub async fn entity_decisions(&self, entity_id: &str) -> Result<Vec<Decision>> {
        self.reader.entity_decisions(entity_id).await
    }

    pub async fn invalidation_chain(&self, fact_id: &str) -> Result<Vec<Invalidation>> {
        self.reader.invalidation_chain(fact_id).await
    }

    // --- Conflict detection ---

    pub async fn detect_conflicts(&self, opts: ConflictOptions) -> Result<Vec<Conflict>> {
        self.detector.detect_conflicts(opts).await
    }

    pub async fn check_new_fact_conflicts(
        &self,
        content: &str,
        category: &str,
    ) -> Result<Vec<Conflict>> {
        self.detector.check_new_fact_conflicts(content, category).await
    }

    // --- Stats and export ---

    pub async fn get_stats(&self) -> Result<GraphStats> {
        let mut stats = self.reader.get_stats().await?;
        stats.storage_engine = self.config.storage_engine.clone();
        stats.storage_path = self.config.storage_path.clone();
        Ok(stats)
    }

    pub async fn export_graph(&self, opts: ExportOptions) -> Result<ExportData> {
        self.reader.export_graph(opts).await
    }

    /// Re-insert an export envelope, preserving ids and timestamps.
    /// Embeddings are regenerated (not replayed) when the pipeline is
    /// enabled, via the regular store path of each row's text projection.
    pub async fn import_graph(&self, data: &ExportData) -> Result<usize> {
        let mut imported = 0;

        for fact in &data.facts {
            self.writer.put_fact(fact)?;
            imported += 1;
        }
        for decision in &data.decisions {
            self.writer.put_decision(decision)?;
            imported += 1;
        }
        for entity in &data.entities {
            self.writer.put_entity(entity)?;
            imported += 1;
        }
        for event in &data.events {
            self.writer.put_event(event)?;
            imported += 1;
        }
        for topic in &data.topics {
            self.writer.put_topic(topic)?;
            imported += 1;
        }

        for (edge_name, rows) in &data.relationships {
            for row in rows {
                let Some(obj) = row.as_object() else { continue };
                let field = |key: &str| {
                    obj.get(key)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string()
                };
                if edge_name == "invalidates" {
                    self.writer.put_invalidation(
                        &field("new_fact_id"),
                        &field("old_fact_id"),
                        &field("reason"),
                    )?;
                    continue;
                }
                let mut fields = BTreeMap::new();
                for (key, value) in obj {
                    if let Some(s) = value.as_str() {
                        fields.insert(key.clone(), s.to_string());
                    }
                }
                if let Err(e) = self.writer.add_relationship(edge_name, &fields).await {
                    tracing::warn!("skipping {edge_name} edge on import: {e}");
                }
            }
        }

        Ok(imported)
    }
}
