//! Typed parameter records for the tool operations.
//!
//! Tool inputs arrive as unstructured argument objects; they are decoded into
//! these records at the protocol boundary and nothing downstream touches the
//! raw bags. The `JsonSchema` derives feed the MCP tool input schemas.

use schemars::JsonSchema;
use serde::Deserialize;

/// One relationship to create after storing a node.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct RelationshipSpec {
    /// Relationship type: fact_entity, fact_topic, decision_topic,
    /// decision_entity, event_decision, or entity_topic.
    pub edge: String,
    /// Target node ID.
    pub target_id: Option<String>,
    /// 0-based index of another item in the same bulk batch to link to
    /// (alternative to target_id; bulk store only).
    pub target_ref: Option<usize>,
    /// Role description (for decision_entity edges).
    pub role: Option<String>,
}

/// Parameters for `mie_store`, and for each item of `mie_bulk_store`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct StoreParams {
    /// Type of memory node to store: fact, decision, entity, event, or topic.
    #[serde(rename = "type", default)]
    pub node_type: String,
    /// Fact content text (required for type=fact).
    pub content: Option<String>,
    /// Fact category: personal, professional, preference, technical,
    /// relationship, or general.
    pub category: Option<String>,
    /// Confidence level (0.0-1.0).
    pub confidence: Option<f64>,
    /// Decision or event title (required for type=decision, type=event).
    pub title: Option<String>,
    /// Decision rationale (required for type=decision).
    pub rationale: Option<String>,
    /// JSON array of alternatives considered (for decisions).
    pub alternatives: Option<String>,
    /// Decision context.
    pub context: Option<String>,
    /// Entity or topic name (required for type=entity, type=topic).
    pub name: Option<String>,
    /// Entity kind: person, company, project, product, technology, place, or
    /// other (required for type=entity).
    pub kind: Option<String>,
    /// Description for entity, event, or topic.
    pub description: Option<String>,
    /// Event date in ISO format, e.g. 2026-02-05 (required for type=event).
    pub event_date: Option<String>,
    /// Agent identifier (e.g. 'claude', 'cursor').
    pub source_agent: Option<String>,
    /// Conversation reference or identifier.
    pub source_conversation: Option<String>,
    /// Relationships to create after storing.
    pub relationships: Option<Vec<RelationshipSpec>>,
    /// ID of a fact this node invalidates.
    pub invalidates: Option<String>,
}

/// Parameters for `mie_bulk_store`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct BulkStoreParams {
    /// Memory nodes to store, in order (max 50). Relationships may reference
    /// other items in the batch by index via target_ref.
    pub items: Vec<StoreParams>,
}

/// Parameters for `mie_query`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct QueryParams {
    /// Search query: natural language for semantic mode, exact text for
    /// exact mode.
    pub query: String,
    /// Search mode: semantic, exact, or graph.
    pub mode: Option<String>,
    /// Node types to search (default: fact, decision, entity, event).
    pub node_types: Option<Vec<String>>,
    /// Maximum number of results (1-50, default 10).
    pub limit: Option<i64>,
    /// Node ID to traverse from (graph mode).
    pub node_id: Option<String>,
    /// Traversal: related_entities, related_facts, facts_about_entity,
    /// entity_decisions, decision_entities, or invalidation_chain (graph mode).
    pub traversal: Option<String>,
}

/// Parameters for `mie_update`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct UpdateParams {
    /// ID of the node to modify.
    pub node_id: String,
    /// Action: invalidate, update_description, or update_status.
    pub action: String,
    /// Why this change is being made (required for invalidate).
    pub reason: Option<String>,
    /// ID of the new fact that replaces the invalidated one.
    pub replacement_id: Option<String>,
    /// New value for update_description or update_status.
    pub new_value: Option<String>,
}

/// Parameters for `mie_list`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListParams {
    /// Type of memory nodes to list.
    pub node_type: String,
    /// Filter facts by category.
    pub category: Option<String>,
    /// Filter entities by kind.
    pub kind: Option<String>,
    /// Filter decisions by status (active, superseded, reversed).
    pub status: Option<String>,
    /// Only include valid facts (default true).
    pub valid_only: Option<bool>,
    /// Maximum rows (1-100, default 20).
    pub limit: Option<i64>,
    /// Pagination offset.
    pub offset: Option<i64>,
    /// Sort field (created_at, updated_at, name).
    pub sort_by: Option<String>,
    /// Sort order: asc or desc (default desc).
    pub sort_order: Option<String>,
}

/// Parameters for `mie_conflicts`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ConflictsParams {
    /// Limit the conflict scan to one category.
    pub category: Option<String>,
    /// Similarity threshold (0.0-1.0, default 0.85). Higher is stricter.
    pub threshold: Option<f64>,
    /// Maximum conflict pairs to return (1-50, default 10).
    pub limit: Option<i64>,
}

/// Parameters for `mie_export`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ExportParams {
    /// Export format: json or datalog.
    pub format: Option<String>,
    /// Include embedding vectors (can be very large).
    pub include_embeddings: Option<bool>,
    /// Node types to export (default: all).
    pub node_types: Option<Vec<String>>,
}

/// Parameters for `mie_analyze`.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct AnalyzeParams {
    /// Conversation fragment or information to analyze for potential
    /// memory storage.
    pub content: String,
    /// Type of content being analyzed: conversation, statement, decision,
    /// or event. Focuses the related-memory search.
    pub content_type: Option<String>,
}
