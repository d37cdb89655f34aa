//! The engine seam consumed by the tool operations.
//!
//! [`Querier`] abstracts over the memory engine so tools can be exercised
//! against a mock in tests. [`mie_core::MemoryClient`] is the production
//! implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;

use mie_core::{
    Conflict, ConflictOptions, Decision, Entity, EntityWithRole, Event, ExportData, ExportOptions,
    Fact, GraphStats, Invalidation, ListOptions, MemoryClient, Node, Result, SearchResult,
    StoreDecisionRequest, StoreEntityRequest, StoreEventRequest, StoreFactRequest,
    StoreTopicRequest, Topic,
};

/// Everything a tool operation may ask of the memory graph.
#[async_trait]
pub trait Querier: Send + Sync {
    // Write operations
    async fn store_fact(&self, req: StoreFactRequest) -> Result<Fact>;
    async fn store_decision(&self, req: StoreDecisionRequest) -> Result<Decision>;
    async fn store_entity(&self, req: StoreEntityRequest) -> Result<Entity>;
    async fn store_event(&self, req: StoreEventRequest) -> Result<Event>;
    async fn store_topic(&self, req: StoreTopicRequest) -> Result<Topic>;
    async fn invalidate_fact(
        &self,
        old_fact_id: &str,
        new_fact_id: &str,
        reason: &str,
    ) -> Result<()>;
    async fn add_relationship(&self, edge: &str, fields: &BTreeMap<String, String>) -> Result<()>;

    // Read operations
    async fn semantic_search(
        &self,
        query: &str,
        node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;
    async fn exact_search(
        &self,
        query: &str,
        node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;
    async fn get_node(&self, node_id: &str) -> Result<Node>;
    async fn list_nodes(&self, opts: ListOptions) -> Result<(Vec<Node>, usize)>;
    async fn find_entity_by_name(&self, name: &str) -> Result<Option<Entity>>;

    // Graph traversal
    async fn related_entities(&self, fact_id: &str) -> Result<Vec<Entity>>;
    async fn facts_about_entity(&self, entity_id: &str) -> Result<Vec<Fact>>;
    async fn decision_entities(&self, decision_id: &str) -> Result<Vec<EntityWithRole>>;
    async fn entity_decisions(&self, entity_id: &str) -> Result<Vec<Decision>>;
    async fn invalidation_chain(&self, fact_id: &str) -> Result<Vec<Invalidation>>;

    // Update operations
    async fn update_description(&self, node_id: &str, new_description: &str) -> Result<()>;
    async fn update_status(&self, node_id: &str, new_status: &str) -> Result<()>;

    // Conflict detection
    async fn detect_conflicts(&self, opts: ConflictOptions) -> Result<Vec<Conflict>>;
    async fn check_new_fact_conflicts(&self, content: &str, category: &str)
        -> Result<Vec<Conflict>>;

    // Stats and export
    async fn get_stats(&self) -> Result<GraphStats>;
    async fn export_graph(&self, opts: ExportOptions) -> Result<ExportData>;

    // Metrics
    async fn increment_counter(&self, key: &str) -> Result<()>;

    // Configuration
    fn embeddings_enabled(&self) -> bool;
}

#[async_trait]
impl Querier for MemoryClient {
    async fn store_fact(&self, req: StoreFactRequest) -> Result<Fact> {
        MemoryClient::store_fact(self, req).await
    }

    async fn store_decision(&self, req: StoreDecisionRequest) -> Result<Decision> {
        MemoryClient::store_decision(self, req).await
    }

    async fn store_entity(&self, req: StoreEntityRequest) -> Result<Entity> {
        MemoryClient::store_entity(self, req).await
    }

    async fn store_event(&self, req: StoreEventRequest) -> Result<Event> {
        MemoryClient::store_event(self, req).await
    }

    async fn store_topic(&self, req: StoreTopicRequest) -> Result<Topic> {
        MemoryClient::store_topic(self, req).await
    }

    async fn invalidate_fact(
        &self,
        old_fact_id: &str,
        new_fact_id: &str,
        reason: &str,
    ) -> Result<()> {
        MemoryClient::invalidate_fact(self, old_fact_id, new_fact_id, reason).await
    }

    async fn add_relationship(&self, edge: &str, fields: &BTreeMap<String, String>) -> Result<()> {
        MemoryClient::add_relationship(self, edge, fields).await
    }

    async fn semantic_search(
        &self,
        query: &str,
        node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        MemoryClient::semantic_search(self, query, node_types, limit).await
    }

    async fn exact_search(
        &self,
        query: &str,
        node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        MemoryClient::exact_search(self, query, node_types, limit).await
    }

    async fn get_node(&self, node_id: &str) -> Result<Node> {
        MemoryClient::get_node(self, node_id).await
    }

    async fn list_nodes(&self, opts: ListOptions) -> Result<(Vec<Node>, usize)> {
        MemoryClient::list_nodes(self, opts).await
    }

    async fn find_entity_by_name(&self, name: &str) -> Result<Option<Entity>> {
        MemoryClient::find_entity_by_name(self, name).await
    }

    async fn related_entities(&self, fact_id: &str) -> Result<Vec<Entity>> {
        MemoryClient::related_entities(self, fact_id).await
    }

    async fn facts_about_entity(&self, entity_id: &str) -> Result<Vec<Fact>> {
        MemoryClient::facts_about_entity(self, entity_id).await
    }

    async fn decision_entities(&self, decision_id: &str) -> Result<Vec<EntityWithRole>> {
        MemoryClient::decision_entities(self, decision_id).await
    }

    async fn entity_decisions(&self, entity_id: &str) -> Result<Vec<Decision>> {
        MemoryClient::entity_decisions(self, entity_id).await
    }

    async fn invalidation_chain(&self, fact_id: &str) -> Result<Vec<Invalidation>> {
        MemoryClient::invalidation_chain(self, fact_id).await
    }

    async fn update_description(&self, node_id: &str, new_description: &str) -> Result<()> {
        MemoryClient::update_description(self, node_id, new_description).await
    }

    async fn update_status(&self, node_id: &str, new_status: &str) -> Result<()> {
        MemoryClient::update_status(self, node_id, new_status).await
    }

    async fn detect_conflicts(&self, opts: ConflictOptions) -> Result<Vec<Conflict>> {
        MemoryClient::detect_conflicts(self, opts).await
    }

    async fn check_new_fact_conflicts(
        &self,
        content: &str,
        category: &str,
    ) -> Result<Vec<Conflict>> {
        MemoryClient::check_new_fact_conflicts(self, content, category).await
    }

    async fn get_stats(&self) -> Result<GraphStats> {
        MemoryClient::get_stats(self).await
    }

    async fn export_graph(&self, opts: ExportOptions) -> Result<ExportData> {
        MemoryClient::export_graph(self, opts).await
    }

    async fn increment_counter(&self, key: &str) -> Result<()> {
        MemoryClient::increment_counter(self, key).await
    }

    fn embeddings_enabled(&self) -> bool {
        MemoryClient::embeddings_enabled(self)
    }
}
