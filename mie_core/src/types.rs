//! Core data types for the MIE memory graph.
//!
//! Defines the five node variants (fact, decision, entity, event, topic),
//! the tagged [`Node`] wrapper, store request records, and the result types
//! shared across search, traversal, conflict detection, and export.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Allowed fact categories. Unknown values are coerced to `general` at write time.
pub const FACT_CATEGORIES: &[&str] = &[
    "personal",
    "professional",
    "preference",
    "technical",
    "relationship",
    "general",
];

/// Allowed entity kinds. Unknown values are rejected at write time.
pub const ENTITY_KINDS: &[&str] = &[
    "person",
    "company",
    "project",
    "product",
    "technology",
    "place",
    "other",
];

/// Allowed decision statuses.
pub const DECISION_STATUSES: &[&str] = &["active", "superseded", "reversed"];

/// Node variants that carry an embedding side relation. Topics are never embedded.
pub const EMBEDDABLE_NODE_TYPES: &[&str] = &["fact", "decision", "entity", "event"];

/// All node variants, in canonical order.
pub const ALL_NODE_TYPES: &[&str] = &["fact", "decision", "entity", "event", "topic"];

/// A personal truth or piece of knowledge.
///
/// Facts are never deleted; superseded facts are marked `valid = false` and
/// linked to their replacement through the invalidation relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub content: String,
    pub category: String,
    pub confidence: f64,
    pub source_agent: String,
    pub source_conversation: String,
    pub valid: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A choice with rationale and considered alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub title: String,
    pub rationale: String,
    pub alternatives: String,
    pub context: String,
    pub source_agent: String,
    pub source_conversation: String,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A person, company, project, product, technology, or place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub description: String,
    pub source_agent: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A dated occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub source_agent: String,
    pub source_conversation: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A recurring theme. Names are canonicalized to lower case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A node of any variant, tagged with its discriminator.
///
/// The discriminator travels as `node_type` on the wire and as the identifier
/// prefix in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node_type", rename_all = "lowercase")]
pub enum Node {
    Fact(Fact),
    Decision(Decision),
    Entity(Entity),
    Event(Event),
    Topic(Topic),
}

impl Node {
    /// The node's identifier.
    pub fn id(&self) -> &str {
        match self {
            Node::Fact(f) => &f.id,
            Node::Decision(d) => &d.id,
            Node::Entity(e) => &e.id,
            Node::Event(e) => &e.id,
            Node::Topic(t) => &t.id,
        }
    }

    /// The wire discriminator for this variant.
    pub fn node_type(&self) -> &'static str {
        match self {
            Node::Fact(_) => "fact",
            Node::Decision(_) => "decision",
            Node::Entity(_) => "entity",
            Node::Event(_) => "event",
            Node::Topic(_) => "topic",
        }
    }

    pub fn as_fact(&self) -> Option<&Fact> {
        match self {
            Node::Fact(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_decision(&self) -> Option<&Decision> {
        match self {
            Node::Decision(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Node::Entity(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Node::Event(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_topic(&self) -> Option<&Topic> {
        match self {
            Node::Topic(t) => Some(t),
            _ => None,
        }
    }
}

/// An entity together with its role in a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityWithRole {
    #[serde(flatten)]
    pub entity: Entity,
    pub role: String,
}

/// One link in an invalidation chain, hydrated with both fact contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invalidation {
    pub new_fact_id: String,
    pub old_fact_id: String,
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub old_content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub new_content: String,
}

// --- Store request records ---

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreFactRequest {
    pub content: String,
    pub category: String,
    pub confidence: f64,
    pub source_agent: String,
    pub source_conversation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDecisionRequest {
    pub title: String,
    pub rationale: String,
    pub alternatives: String,
    pub context: String,
    pub source_agent: String,
    pub source_conversation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreEntityRequest {
    pub name: String,
    pub kind: String,
    pub description: String,
    pub source_agent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreEventRequest {
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub source_agent: String,
    pub source_conversation: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreTopicRequest {
    pub name: String,
    pub description: String,
}

// --- Search and listing ---

/// A single search hit from semantic or exact search.
///
/// `distance` is the raw index distance; similarity rendering is up to the
/// caller. Exact-search hits carry distance `0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub node_type: String,
    pub id: String,
    pub content: String,
    pub detail: String,
    pub distance: f64,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

/// Options for listing nodes of one variant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    pub node_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub valid_only: bool,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub sort_by: String,
    #[serde(default)]
    pub sort_order: String,
}

// --- Conflict detection ---

/// Two potentially contradicting facts and their embedding similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub fact_a: Fact,
    pub fact_b: Fact,
    pub similarity: f64,
}

/// Options for a conflict scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictOptions {
    #[serde(default)]
    pub category: String,
    pub threshold: f64,
    pub limit: usize,
}

impl Default for ConflictOptions {
    fn default() -> Self {
        Self {
            category: String::new(),
            threshold: 0.85,
            limit: 10,
        }
    }
}

// --- Stats and export ---

/// Memory graph statistics and usage counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_facts: usize,
    pub valid_facts: usize,
    pub invalidated_facts: usize,
    pub total_decisions: usize,
    pub active_decisions: usize,
    pub total_entities: usize,
    pub total_events: usize,
    pub total_topics: usize,
    pub total_edges: usize,
    pub total_queries: usize,
    pub total_stores: usize,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_query_at: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub last_store_at: i64,
    pub schema_version: String,
    pub storage_engine: String,
    pub storage_path: String,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// Options for a graph export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub include_embeddings: bool,
    #[serde(default)]
    pub node_types: Vec<String>,
}

/// The versioned export envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportData {
    pub version: String,
    pub exported_at: String,
    pub stats: BTreeMap<String, usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decisions: Vec<Decision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<Topic>,
    #[serde(
        default,
        rename = "relationships",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub relationships: BTreeMap<String, Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub embeddings: BTreeMap<String, Vec<f64>>,
}
