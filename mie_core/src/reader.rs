//! Read path: semantic search, exact search, listing, point lookup, fixed
//! traversals, statistics, and export.
//!
//! Semantic search queries the per-variant HNSW index with a widened
//! candidate pool (`k = 5 * limit`, `ef: 200`), joins against the node
//! relation to hydrate fields, merges across variants by ascending distance,
//! and truncates to the requested limit. A variant whose index is missing is
//! skipped with a warning, never fatal.

use std::sync::Arc;

use cozo::DataValue;
use serde_json::json;

use crate::embeddings::EmbeddingGenerator;
use crate::error::{MemoryError, Result};
use crate::ids::node_type_for_id;
use crate::schema::{node_columns, node_table, ALL_EDGE_TABLES};
use crate::storage::{
    str_lit, value_bool, value_f64, value_i64, value_str, value_usize, vector_lit, Substrate,
};
use crate::types::{
    Decision, Entity, EntityWithRole, Event, ExportData, ExportOptions, Fact, GraphStats,
    Invalidation, ListOptions, Node, SearchResult, Topic, ALL_NODE_TYPES,
};

const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_LIST_LIMIT: usize = 20;

/// Handles all queries against the memory graph.
#[derive(Clone)]
pub struct Reader {
    substrate: Arc<Substrate>,
    embedder: Option<Arc<EmbeddingGenerator>>,
}

impl Reader {
    pub fn new(substrate: Arc<Substrate>, embedder: Option<Arc<EmbeddingGenerator>>) -> Self {
        Self {
            substrate,
            embedder,
        }
    }

    pub(crate) fn embedder(&self) -> Option<&Arc<EmbeddingGenerator>> {
        self.embedder.as_ref()
    }

    pub(crate) fn substrate_query(&self, script: &str) -> Result<cozo::NamedRows> {
        self.substrate.query(script)
    }

    // --- Semantic search ---

    /// Vector-similarity search across the requested node variants.
    pub async fn semantic_search(
        &self,
        query: &str,
        node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let embedder = self.embedder.as_ref().ok_or(MemoryError::EmbeddingsDisabled)?;
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };

        let query_vec = embedder.generate_query(query).await?;
        let vec_expr = format!("vec({})", vector_lit(&query_vec));
        let k = limit * 5;

        let node_types = normalized_types(node_types, &["fact", "decision", "entity", "event"]);
        let mut results = Vec::new();

        for nt in &node_types {
            let script = match nt.as_str() {
                "fact" => format!(
                    "?[id, content, category, confidence, distance] := \
                     ~mie_fact_embedding:fact_embedding_idx {{ fact_id | query: q, k: {k}, ef: 200, bind_distance: distance }}, \
                     q = {vec_expr}, \
                     *mie_fact {{ id: fact_id, content, category, confidence, valid }}, \
                     valid = true, \
                     id = fact_id \
                     :order distance \
                     :limit {limit}"
                ),
                "decision" => format!(
                    "?[id, title, rationale, status, distance] := \
                     ~mie_decision_embedding:decision_embedding_idx {{ decision_id | query: q, k: {k}, ef: 200, bind_distance: distance }}, \
                     q = {vec_expr}, \
                     *mie_decision {{ id: decision_id, title, rationale, status }}, \
                     id = decision_id \
                     :order distance \
                     :limit {limit}"
                ),
                "entity" => format!(
                    "?[id, name, kind, description, distance] := \
                     ~mie_entity_embedding:entity_embedding_idx {{ entity_id | query: q, k: {k}, ef: 200, bind_distance: distance }}, \
                     q = {vec_expr}, \
                     *mie_entity {{ id: entity_id, name, kind, description }}, \
                     id = entity_id \
                     :order distance \
                     :limit {limit}"
                ),
                "event" => format!(
                    "?[id, title, description, event_date, distance] := \
                     ~mie_event_embedding:event_embedding_idx {{ event_id | query: q, k: {k}, ef: 200, bind_distance: distance }}, \
                     q = {vec_expr}, \
                     *mie_event {{ id: event_id, title, description, event_date }}, \
                     id = event_id \
                     :order distance \
                     :limit {limit}"
                ),
                _ => continue,
            };

            let rows = match self.substrate.query(&script) {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!("semantic search failed for type {nt}: {e}");
                    continue;
                }
            };
            for row in &rows.rows {
                results.push(search_result_from_row(nt, row, true));
            }
        }

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(limit);
        Ok(results)
    }

    // --- Exact search ---

    /// Substring match (case-sensitive, as stored) over the primary text
    /// fields of each variant. Facts are filtered to `valid = true`.
    pub async fn exact_search(
        &self,
        query: &str,
        node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let limit = if limit == 0 { DEFAULT_SEARCH_LIMIT } else { limit };
        let needle = str_lit(query);

        let node_types = normalized_types(node_types, ALL_NODE_TYPES);
        let mut results = Vec::new();

        for nt in &node_types {
            let script = match nt.as_str() {
                "fact" => format!(
                    "?[id, content, category, confidence] := \
                     *mie_fact {{ id, content, category, confidence, valid }}, \
                     valid = true, \
                     str_includes(content, {needle}) \
                     :limit {limit}"
                ),
                "decision" => format!(
                    "?[id, title, rationale, status] := \
                     *mie_decision {{ id, title, rationale, status }}, \
                     or(str_includes(title, {needle}), str_includes(rationale, {needle})) \
                     :limit {limit}"
                ),
                "entity" => format!(
                    "?[id, name, kind, description] := \
                     *mie_entity {{ id, name, kind, description }}, \
                     or(str_includes(name, {needle}), str_includes(description, {needle})) \
                     :limit {limit}"
                ),
                "event" => format!(
                    "?[id, title, description, event_date] := \
                     *mie_event {{ id, title, description, event_date }}, \
                     or(str_includes(title, {needle}), str_includes(description, {needle})) \
                     :limit {limit}"
                ),
                "topic" => format!(
                    "?[id, name, description] := \
                     *mie_topic {{ id, name, description }}, \
                     or(str_includes(name, {needle}), str_includes(description, {needle})) \
                     :limit {limit}"
                ),
                _ => continue,
            };

            let rows = match self.substrate.query(&script) {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::warn!("exact search failed for type {nt}: {e}");
                    continue;
                }
            };
            for row in &rows.rows {
                results.push(search_result_from_row(nt, row, false));
            }
        }

        results.truncate(limit);
        Ok(results)
    }

    // --- Listing ---

    /// Paginated list of one variant with per-variant filters, plus the total
    /// count matching those filters.
    pub async fn list_nodes(&self, opts: ListOptions) -> Result<(Vec<Node>, usize)> {
        let table = node_table(&opts.node_type).ok_or_else(|| {
            MemoryError::invalid_argument(format!("unknown node type: {}", opts.node_type))
        })?;
        let columns = node_columns(&opts.node_type);
        let limit = if opts.limit == 0 { DEFAULT_LIST_LIMIT } else { opts.limit };

        let conditions = list_conditions(&opts);
        let cond = if conditions.is_empty() {
            String::new()
        } else {
            format!(", {}", conditions.join(", "))
        };

        // Unknown sort columns fall back to created_at.
        let sort_by = if columns.split(", ").any(|c| c == opts.sort_by) {
            opts.sort_by.as_str()
        } else {
            "created_at"
        };
        let order = if opts.sort_order == "asc" {
            sort_by.to_string()
        } else {
            format!("-{sort_by}")
        };

        let script = format!(
            "?[{columns}] := *{table} {{ {columns} }}{cond} :order {order} :limit {limit} :offset {}",
            opts.offset
        );
        let rows = self.substrate.query(&script)?;

        let total = self.count_nodes(table, &conditions)?;

        let nodes = rows
            .rows
            .iter()
            .filter_map(|row| node_from_row(&opts.node_type, row))
            .collect();
        Ok((nodes, total))
    }

    fn count_nodes(&self, table: &str, conditions: &[String]) -> Result<usize> {
        // The count query must bind every column the conditions mention.
        let mut bound = vec!["id".to_string()];
        for cond in conditions {
            if let Some(pos) = cond.find(" = ") {
                bound.push(cond[..pos].trim().to_string());
            }
        }
        let cond = if conditions.is_empty() {
            String::new()
        } else {
            format!(", {}", conditions.join(", "))
        };
        let script = format!(
            "?[count(id)] := *{table} {{ {} }}{cond}",
            bound.join(", ")
        );
        let rows = self.substrate.query(&script)?;
        Ok(rows
            .rows
            .first()
            .map(|r| value_usize(&r[0]))
            .unwrap_or(0))
    }

    // --- Point lookup ---

    /// Fetch a single node, detecting the variant from the identifier prefix.
    /// Unprefixed identifiers fall back to scanning every variant.
    pub async fn get_node(&self, node_id: &str) -> Result<Node> {
        if let Some(nt) = node_type_for_id(node_id) {
            return self
                .get_node_as(node_id, nt)?
                .ok_or_else(|| MemoryError::not_found(format!("node {node_id:?} not found")));
        }

        for nt in ALL_NODE_TYPES {
            if let Some(node) = self.get_node_as(node_id, nt)? {
                return Ok(node);
            }
        }
        Err(MemoryError::not_found(format!("node {node_id:?} not found")))
    }

    fn get_node_as(&self, node_id: &str, node_type: &str) -> Result<Option<Node>> {
        let table = node_table(node_type).ok_or_else(|| {
            MemoryError::invalid_argument(format!("unknown node type: {node_type}"))
        })?;
        let columns = node_columns(node_type);
        let rows = self.substrate.query(&format!(
            "?[{columns}] := *{table} {{ {columns} }}, id = {}",
            str_lit(node_id)
        ))?;
        Ok(rows.rows.first().and_then(|row| node_from_row(node_type, row)))
    }

    pub(crate) fn get_fact(&self, fact_id: &str) -> Result<Option<Fact>> {
        let cols = node_columns("fact");
        let rows = self.substrate.query(&format!(
            "?[{cols}] := *mie_fact{{{cols}}}, id = {}",
            str_lit(fact_id)
        ))?;
        Ok(rows.rows.first().and_then(|r| fact_from_row(r)))
    }

    /// Case-insensitive entity lookup by name. Used by the analyze flow to
    /// recognize entities mentioned in a fragment.
    pub async fn find_entity_by_name(&self, name: &str) -> Result<Option<Entity>> {
        let cols = node_columns("entity");
        let rows = self.substrate.query(&format!(
            "?[{cols}] := *mie_entity {{ {cols} }}, lname = lowercase(name), lname = {} :limit 1",
            str_lit(&name.to_lowercase())
        ))?;
        Ok(rows.rows.first().and_then(|r| entity_from_row(r)))
    }

    // --- Fixed traversals (single joins) ---

    /// Entities adjacent to a fact through `fact_entity`.
    pub async fn related_entities(&self, fact_id: &str) -> Result<Vec<Entity>> {
        let cols = node_columns("entity");
        let rows = self.substrate.query(&format!(
            "?[{cols}] := \
             *mie_fact_entity {{ fact_id, entity_id }}, \
             fact_id = {}, \
             *mie_entity {{ id: entity_id, name, kind, description, source_agent, created_at, updated_at }}, \
             id = entity_id",
            str_lit(fact_id)
        ))?;
        Ok(rows.rows.iter().filter_map(|r| entity_from_row(r)).collect())
    }

    /// Facts adjacent to an entity through `fact_entity`.
    pub async fn facts_about_entity(&self, entity_id: &str) -> Result<Vec<Fact>> {
        let cols = node_columns("fact");
        let rows = self.substrate.query(&format!(
            "?[{cols}] := \
             *mie_fact_entity {{ fact_id, entity_id }}, \
             entity_id = {}, \
             *mie_fact {{ id: fact_id, content, category, confidence, source_agent, source_conversation, valid, created_at, updated_at }}, \
             id = fact_id",
            str_lit(entity_id)
        ))?;
        Ok(rows.rows.iter().filter_map(|r| fact_from_row(r)).collect())
    }

    /// Entities involved in a decision, with their role.
    pub async fn decision_entities(&self, decision_id: &str) -> Result<Vec<EntityWithRole>> {
        let rows = self.substrate.query(&format!(
            "?[id, name, kind, description, source_agent, created_at, updated_at, role] := \
             *mie_decision_entity {{ decision_id, entity_id, role }}, \
             decision_id = {}, \
             *mie_entity {{ id: entity_id, name, kind, description, source_agent, created_at, updated_at }}, \
             id = entity_id",
            str_lit(decision_id)
        ))?;
        Ok(rows
            .rows
            .iter()
            .filter_map(|r| {
                let entity = entity_from_row(&r[..7])?;
                Some(EntityWithRole {
                    entity,
                    role: value_str(&r[7]),
                })
            })
            .collect())
    }

    /// Decisions involving an entity.
    pub async fn entity_decisions(&self, entity_id: &str) -> Result<Vec<Decision>> {
        let cols = node_columns("decision");
        let rows = self.substrate.query(&format!(
            "?[{cols}] := \
             *mie_decision_entity {{ decision_id, entity_id }}, \
             entity_id = {}, \
             *mie_decision {{ id: decision_id, title, rationale, alternatives, context, source_agent, source_conversation, status, created_at, updated_at }}, \
             id = decision_id",
            str_lit(entity_id)
        ))?;
        Ok(rows.rows.iter().filter_map(|r| decision_from_row(r)).collect())
    }

    /// Invalidation rows touching a fact on either side, hydrated with both
    /// contents. Two rules unioned because each side binds differently.
    pub async fn invalidation_chain(&self, fact_id: &str) -> Result<Vec<Invalidation>> {
        let id = str_lit(fact_id);
        let rows = self.substrate.query(&format!(
            "?[new_fact_id, old_fact_id, reason, old_content, new_content] := \
             *mie_invalidates {{ new_fact_id, old_fact_id, reason }}, \
             new_fact_id = {id}, \
             *mie_fact {{ id: old_fact_id, content: old_content }}, \
             *mie_fact {{ id: new_fact_id, content: new_content }}; \
             ?[new_fact_id, old_fact_id, reason, old_content, new_content] := \
             *mie_invalidates {{ new_fact_id, old_fact_id, reason }}, \
             old_fact_id = {id}, \
             *mie_fact {{ id: old_fact_id, content: old_content }}, \
             *mie_fact {{ id: new_fact_id, content: new_content }}"
        ))?;
        Ok(rows
            .rows
            .iter()
            .map(|r| Invalidation {
                new_fact_id: value_str(&r[0]),
                old_fact_id: value_str(&r[1]),
                reason: value_str(&r[2]),
                old_content: value_str(&r[3]),
                new_content: value_str(&r[4]),
            })
            .collect())
    }

    // --- Statistics ---

    /// Count every node and edge relation and read the metadata counters.
    /// Individual count failures degrade to zero with a warning.
    pub async fn get_stats(&self) -> Result<GraphStats> {
        let mut stats = GraphStats::default();

        let counts: &mut [(&str, &mut usize)] = &mut [
            ("?[count(id)] := *mie_fact { id }", &mut stats.total_facts),
            (
                "?[count(id)] := *mie_fact { id, valid }, valid = true",
                &mut stats.valid_facts,
            ),
            (
                "?[count(id)] := *mie_fact { id, valid }, valid = false",
                &mut stats.invalidated_facts,
            ),
            (
                "?[count(id)] := *mie_decision { id }",
                &mut stats.total_decisions,
            ),
            (
                "?[count(id)] := *mie_decision { id, status }, status = 'active'",
                &mut stats.active_decisions,
            ),
            (
                "?[count(id)] := *mie_entity { id }",
                &mut stats.total_entities,
            ),
            ("?[count(id)] := *mie_event { id }", &mut stats.total_events),
            ("?[count(id)] := *mie_topic { id }", &mut stats.total_topics),
        ];
        for (script, dest) in counts.iter_mut() {
            match self.substrate.query(script) {
                Ok(rows) => {
                    if let Some(row) = rows.rows.first() {
                        **dest = value_usize(&row[0]);
                    }
                }
                Err(e) => tracing::warn!("stats query failed: {e}"),
            }
        }

        let mut total_edges = 0;
        for (table, cols) in ALL_EDGE_TABLES {
            let script = format!(
                "?[count({})] := *{table} {{ {} }}",
                cols[0],
                cols.join(", ")
            );
            if let Ok(rows) = self.substrate.query(&script) {
                if let Some(row) = rows.rows.first() {
                    total_edges += value_usize(&row[0]);
                }
            }
        }
        stats.total_edges = total_edges;

        for key in [
            "schema_version",
            "total_queries",
            "total_stores",
            "last_query_at",
            "last_store_at",
        ] {
            let script = format!("?[value] := *mie_meta {{ key, value }}, key = '{key}'");
            let value = match self.substrate.query(&script) {
                Ok(rows) => match rows.rows.first() {
                    Some(row) => value_str(&row[0]),
                    None => continue,
                },
                Err(_) => continue,
            };
            match key {
                "schema_version" => stats.schema_version = value,
                "total_queries" => stats.total_queries = value.parse().unwrap_or(0),
                "total_stores" => stats.total_stores = value.parse().unwrap_or(0),
                "last_query_at" => stats.last_query_at = value.parse().unwrap_or(0),
                "last_store_at" => stats.last_store_at = value.parse().unwrap_or(0),
                _ => {}
            }
        }

        Ok(stats)
    }

    // --- Export ---

    /// Dump the selected variants into the versioned export envelope.
    pub async fn export_graph(&self, opts: ExportOptions) -> Result<ExportData> {
        let mut export = ExportData {
            version: "1".to_string(),
            exported_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            ..Default::default()
        };

        let node_types = normalized_types(&opts.node_types, ALL_NODE_TYPES);
        for nt in &node_types {
            let table = node_table(nt).unwrap_or_default();
            let columns = node_columns(nt);
            let rows = self
                .substrate
                .query(&format!("?[{columns}] := *{table} {{ {columns} }}"))?;

            match nt.as_str() {
                "fact" => {
                    export.facts = rows.rows.iter().filter_map(|r| fact_from_row(r)).collect();
                    export.stats.insert("facts".into(), export.facts.len());
                }
                "decision" => {
                    export.decisions = rows.rows.iter().filter_map(|r| decision_from_row(r)).collect();
                    export.stats.insert("decisions".into(), export.decisions.len());
                }
                "entity" => {
                    export.entities = rows.rows.iter().filter_map(|r| entity_from_row(r)).collect();
                    export.stats.insert("entities".into(), export.entities.len());
                }
                "event" => {
                    export.events = rows.rows.iter().filter_map(|r| event_from_row(r)).collect();
                    export.stats.insert("events".into(), export.events.len());
                }
                "topic" => {
                    export.topics = rows.rows.iter().filter_map(|r| topic_from_row(r)).collect();
                    export.stats.insert("topics".into(), export.topics.len());
                }
                _ => {}
            }
        }

        // Edges only make sense when every endpoint variant is present.
        if node_types.len() == ALL_NODE_TYPES.len() {
            for (table, cols) in ALL_EDGE_TABLES {
                let script = format!(
                    "?[{}] := *{table} {{ {} }}",
                    cols.join(", "),
                    cols.join(", ")
                );
                let rows = self.substrate.query(&script)?;
                if rows.rows.is_empty() {
                    continue;
                }
                let edge_name = table.trim_start_matches("mie_").to_string();
                let mut entries = Vec::with_capacity(rows.rows.len());
                for row in &rows.rows {
                    let mut obj = serde_json::Map::new();
                    for (i, col) in cols.iter().enumerate() {
                        obj.insert(col.to_string(), json!(value_str(&row[i])));
                    }
                    entries.push(serde_json::Value::Object(obj));
                }
                export.relationships.insert(edge_name, entries);
            }
        }

        if opts.include_embeddings {
            for variant in crate::types::EMBEDDABLE_NODE_TYPES {
                if !node_types.iter().any(|nt| nt == variant) {
                    continue;
                }
                let script = format!(
                    "?[{variant}_id, embedding] := *mie_{variant}_embedding {{ {variant}_id, embedding }}"
                );
                let rows = match self.substrate.query(&script) {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::warn!("embedding export failed for {variant}: {e}");
                        continue;
                    }
                };
                for row in &rows.rows {
                    let id = value_str(&row[0]);
                    if let DataValue::Vec(v) = &row[1] {
                        let vector: Vec<f64> = match v {
                            cozo::Vector::F32(arr) => arr.iter().map(|x| *x as f64).collect(),
                            cozo::Vector::F64(arr) => arr.iter().copied().collect(),
                        };
                        export.embeddings.insert(id, vector);
                    }
                }
            }
        }

        Ok(export)
    }
}

fn normalized_types(requested: &[String], fallback: &[&str]) -> Vec<String> {
    if requested.is_empty() {
        fallback.iter().map(|s| s.to_string()).collect()
    } else {
        requested.to_vec()
    }
}

fn list_conditions(opts: &ListOptions) -> Vec<String> {
    let mut conditions = Vec::new();
    match opts.node_type.as_str() {
        "fact" => {
            if !opts.category.is_empty() {
                conditions.push(format!("category = {}", str_lit(&opts.category)));
            }
            if opts.valid_only {
                conditions.push("valid = true".to_string());
            }
        }
        "decision" => {
            if !opts.status.is_empty() {
                conditions.push(format!("status = {}", str_lit(&opts.status)));
            }
        }
        "entity" => {
            if !opts.kind.is_empty() {
                conditions.push(format!("kind = {}", str_lit(&opts.kind)));
            }
        }
        _ => {}
    }
    conditions
}

// --- Row hydration ---

pub(crate) fn fact_from_row(row: &[DataValue]) -> Option<Fact> {
    if row.len() < 9 {
        return None;
    }
    Some(Fact {
        id: value_str(&row[0]),
        content: value_str(&row[1]),
        category: value_str(&row[2]),
        confidence: value_f64(&row[3]),
        source_agent: value_str(&row[4]),
        source_conversation: value_str(&row[5]),
        valid: value_bool(&row[6]),
        created_at: value_i64(&row[7]),
        updated_at: value_i64(&row[8]),
    })
}

pub(crate) fn decision_from_row(row: &[DataValue]) -> Option<Decision> {
    if row.len() < 10 {
        return None;
    }
    Some(Decision {
        id: value_str(&row[0]),
        title: value_str(&row[1]),
        rationale: value_str(&row[2]),
        alternatives: value_str(&row[3]),
        context: value_str(&row[4]),
        source_agent: value_str(&row[5]),
        source_conversation: value_str(&row[6]),
        status: value_str(&row[7]),
        created_at: value_i64(&row[8]),
        updated_at: value_i64(&row[9]),
    })
}

pub(crate) fn entity_from_row(row: &[DataValue]) -> Option<Entity> {
    if row.len() < 7 {
        return None;
    }
    Some(Entity {
        id: value_str(&row[0]),
        name: value_str(&row[1]),
        kind: value_str(&row[2]),
        description: value_str(&row[3]),
        source_agent: value_str(&row[4]),
        created_at: value_i64(&row[5]),
        updated_at: value_i64(&row[6]),
    })
}

pub(crate) fn event_from_row(row: &[DataValue]) -> Option<Event> {
    if row.len() < 8 {
        return None;
    }
    Some(Event {
        id: value_str(&row[0]),
        title: value_str(&row[1]),
        description: value_str(&row[2]),
        event_date: value_str(&row[3]),
        source_agent: value_str(&row[4]),
        source_conversation: value_str(&row[5]),
        created_at: value_i64(&row[6]),
        updated_at: value_i64(&row[7]),
    })
}

pub(crate) fn topic_from_row(row: &[DataValue]) -> Option<Topic> {
    if row.len() < 5 {
        return None;
    }
    Some(Topic {
        id: value_str(&row[0]),
        name: value_str(&row[1]),
        description: value_str(&row[2]),
        created_at: value_i64(&row[3]),
        updated_at: value_i64(&row[4]),
    })
}

fn node_from_row(node_type: &str, row: &[DataValue]) -> Option<Node> {
    match node_type {
        "fact" => fact_from_row(row).map(Node::Fact),
        "decision" => decision_from_row(row).map(Node::Decision),
        "entity" => entity_from_row(row).map(Node::Entity),
        "event" => event_from_row(row).map(Node::Event),
        "topic" => topic_from_row(row).map(Node::Topic),
        _ => None,
    }
}

/// Build a search hit from a per-variant result row. Semantic rows carry a
/// trailing distance column; exact rows do not.
fn search_result_from_row(node_type: &str, row: &[DataValue], with_distance: bool) -> SearchResult {
    let distance = if with_distance && row.len() > 4 {
        value_f64(&row[row.len() - 1])
    } else {
        0.0
    };

    match node_type {
        "fact" => SearchResult {
            node_type: "fact".into(),
            id: value_str(&row[0]),
            content: value_str(&row[1]),
            detail: value_str(&row[2]),
            distance,
            metadata: json!({
                "category": value_str(&row[2]),
                "confidence": value_f64(&row[3]),
            }),
        },
        "decision" => SearchResult {
            node_type: "decision".into(),
            id: value_str(&row[0]),
            content: value_str(&row[1]),
            detail: value_str(&row[2]),
            distance,
            metadata: json!({
                "status": value_str(&row[3]),
            }),
        },
        "entity" => SearchResult {
            node_type: "entity".into(),
            id: value_str(&row[0]),
            content: value_str(&row[1]),
            detail: value_str(&row[3]),
            distance,
            metadata: json!({
                "kind": value_str(&row[2]),
            }),
        },
        "event" => SearchResult {
            node_type: "event".into(),
            id: value_str(&row[0]),
            content: value_str(&row[1]),
            detail: value_str(&row[2]),
            distance,
            metadata: json!({
                "event_date": value_str(&row[3]),
            }),
        },
        _ => SearchResult {
            node_type: "topic".into(),
            id: value_str(&row[0]),
            content: value_str(&row[1]),
            detail: if row.len() > 2 { value_str(&row[2]) } else { String::new() },
            distance,
            metadata: serde_json::Value::Null,
        },
    }
}
