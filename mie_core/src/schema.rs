//! Relation declarations and idempotent schema setup.
//!
//! All relations live under the `mie_` namespace. Schema creation consults
//! `::relations` and only creates what is missing; the embedding dimension is
//! fixed the first time an embedding relation is created and never altered
//! afterwards.

use cozo::DataValue;
use std::collections::HashSet;

use crate::error::Result;
use crate::storage::Substrate;

/// Version stamp written into `mie_meta` on first initialization.
pub const SCHEMA_VERSION: &str = "1";

/// Node relations, `(name, column spec)`.
const NODE_TABLES: &[(&str, &str)] = &[
    (
        "mie_fact",
        "{ id: String => content: String, category: String, confidence: Float, source_agent: String, source_conversation: String, valid: Bool, created_at: Int, updated_at: Int }",
    ),
    (
        "mie_decision",
        "{ id: String => title: String, rationale: String, alternatives: String, context: String, source_agent: String, source_conversation: String, status: String, created_at: Int, updated_at: Int }",
    ),
    (
        "mie_entity",
        "{ id: String => name: String, kind: String, description: String, source_agent: String, created_at: Int, updated_at: Int }",
    ),
    (
        "mie_event",
        "{ id: String => title: String, description: String, event_date: String, source_agent: String, source_conversation: String, created_at: Int, updated_at: Int }",
    ),
    (
        "mie_topic",
        "{ id: String => name: String, description: String, created_at: Int, updated_at: Int }",
    ),
];

/// Edge relations, `(name, column spec)`. The invalidation relation is keyed
/// by `(new, old)` so replays of the same invalidation are idempotent.
const EDGE_TABLES: &[(&str, &str)] = &[
    ("mie_fact_entity", "{ fact_id: String, entity_id: String }"),
    ("mie_fact_topic", "{ fact_id: String, topic_id: String }"),
    (
        "mie_decision_topic",
        "{ decision_id: String, topic_id: String }",
    ),
    (
        "mie_decision_entity",
        "{ decision_id: String, entity_id: String => role: String }",
    ),
    (
        "mie_event_decision",
        "{ event_id: String, decision_id: String }",
    ),
    ("mie_entity_topic", "{ entity_id: String, topic_id: String }"),
    (
        "mie_invalidates",
        "{ new_fact_id: String, old_fact_id: String => reason: String }",
    ),
];

/// Relationship names accepted by `add_relationship`, with their column order.
/// Columns after the first two are optional attributes.
pub const RELATIONSHIP_EDGES: &[(&str, &[&str])] = &[
    ("fact_entity", &["fact_id", "entity_id"]),
    ("fact_topic", &["fact_id", "topic_id"]),
    ("decision_topic", &["decision_id", "topic_id"]),
    ("decision_entity", &["decision_id", "entity_id", "role"]),
    ("event_decision", &["event_id", "decision_id"]),
    ("entity_topic", &["entity_id", "topic_id"]),
];

/// All edge tables with their column lists, for stats and export.
pub const ALL_EDGE_TABLES: &[(&str, &[&str])] = &[
    ("mie_fact_entity", &["fact_id", "entity_id"]),
    ("mie_fact_topic", &["fact_id", "topic_id"]),
    ("mie_decision_topic", &["decision_id", "topic_id"]),
    ("mie_decision_entity", &["decision_id", "entity_id", "role"]),
    ("mie_event_decision", &["event_id", "decision_id"]),
    ("mie_entity_topic", &["entity_id", "topic_id"]),
    ("mie_invalidates", &["new_fact_id", "old_fact_id", "reason"]),
];

/// Column order for `add_relationship` field maps, or `None` for an unknown
/// edge name.
pub fn edge_columns(edge: &str) -> Option<&'static [&'static str]> {
    RELATIONSHIP_EDGES
        .iter()
        .find(|(name, _)| *name == edge)
        .map(|(_, cols)| *cols)
}

/// The node relation for a variant name.
pub fn node_table(node_type: &str) -> Option<&'static str> {
    match node_type {
        "fact" => Some("mie_fact"),
        "decision" => Some("mie_decision"),
        "entity" => Some("mie_entity"),
        "event" => Some("mie_event"),
        "topic" => Some("mie_topic"),
        _ => None,
    }
}

/// Hydration column list for a variant, shared by list, get, and export.
pub fn node_columns(node_type: &str) -> &'static str {
    match node_type {
        "fact" => "id, content, category, confidence, source_agent, source_conversation, valid, created_at, updated_at",
        "decision" => "id, title, rationale, alternatives, context, source_agent, source_conversation, status, created_at, updated_at",
        "entity" => "id, name, kind, description, source_agent, created_at, updated_at",
        "event" => "id, title, description, event_date, source_agent, source_conversation, created_at, updated_at",
        "topic" => "id, name, description, created_at, updated_at",
        _ => "id",
    }
}

fn existing_relations(substrate: &Substrate) -> Result<HashSet<String>> {
    let rows = substrate.query("::relations")?;
    let name_col = rows
        .headers
        .iter()
        .position(|h| h == "name")
        .unwrap_or(0);
    Ok(rows
        .rows
        .iter()
        .filter_map(|row| match row.get(name_col) {
            Some(DataValue::Str(s)) => Some(s.to_string()),
            _ => None,
        })
        .collect())
}

/// Create any missing node, edge, embedding, and metadata relations.
///
/// Embedding relations created here fix the vector dimension permanently;
/// relations that already exist are left untouched, whatever their dimension.
pub fn ensure_schema(substrate: &Substrate, dimensions: usize) -> Result<()> {
    let existing = existing_relations(substrate)?;

    for (name, spec) in NODE_TABLES.iter().chain(EDGE_TABLES) {
        if !existing.contains(*name) {
            substrate.execute(&format!(":create {name} {spec}"))?;
        }
    }

    for variant in crate::types::EMBEDDABLE_NODE_TYPES {
        let rel = format!("mie_{variant}_embedding");
        if !existing.contains(&rel) {
            substrate.execute(&format!(
                ":create {rel} {{ {variant}_id: String => embedding: <F32; {dimensions}> }}"
            ))?;
        }
    }

    if !existing.contains("mie_meta") {
        substrate.execute(":create mie_meta { key: String => value: String }")?;
        substrate.execute(&format!(
            "?[key, value] <- [['schema_version', '{SCHEMA_VERSION}']] :put mie_meta {{key => value}}"
        ))?;
    }

    Ok(())
}

/// Create the HNSW index on each embedding relation that does not have one.
/// Only called when the embedding pipeline is enabled.
pub fn ensure_hnsw_indexes(substrate: &Substrate, dimensions: usize) -> Result<()> {
    for variant in crate::types::EMBEDDABLE_NODE_TYPES {
        let rel = format!("mie_{variant}_embedding");
        let idx = format!("{variant}_embedding_idx");

        let has_index = substrate
            .query(&format!("::indices {rel}"))
            .map(|rows| {
                rows.rows.iter().flatten().any(
                    |v| matches!(v, DataValue::Str(s) if s.as_str().contains(idx.as_str())),
                )
            })
            .unwrap_or(false);
        if has_index {
            continue;
        }

        substrate.execute(&format!(
            "::hnsw create {rel}:{idx} {{ dim: {dimensions}, m: 50, dtype: F32, fields: [embedding], distance: Cosine, ef_construction: 200 }}"
        ))?;
    }
    Ok(())
}
