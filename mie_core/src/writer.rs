//! Write path: node upserts, invalidation, relationship edges, in-place
//! updates, and metadata counters.
//!
//! Every store call captures a single timestamp and applies it to both
//! `created_at` and `updated_at`. The node row is published first; the
//! embedding row follows as an independent operation, and an embedding
//! failure never fails the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::embeddings::{
    decision_projection, entity_projection, event_projection, fact_projection, EmbeddingGenerator,
};
use crate::error::{MemoryError, Result};
use crate::ids::{
    new_node_id, now_unix, DECISION_PREFIX, ENTITY_PREFIX, EVENT_PREFIX, FACT_PREFIX, TOPIC_PREFIX,
};
use crate::reader::{decision_from_row, entity_from_row, fact_from_row};
use crate::schema::{edge_columns, node_columns};
use crate::storage::{float_lit, str_lit, vector_lit, Substrate};
use crate::types::{
    Decision, Entity, Event, Fact, StoreDecisionRequest, StoreEntityRequest, StoreEventRequest,
    StoreFactRequest, StoreTopicRequest, Topic, DECISION_STATUSES, ENTITY_KINDS, FACT_CATEGORIES,
};

/// Handles all mutations of the memory graph.
pub struct Writer {
    substrate: Arc<Substrate>,
    embedder: Option<Arc<EmbeddingGenerator>>,
}

impl Writer {
    pub fn new(substrate: Arc<Substrate>, embedder: Option<Arc<EmbeddingGenerator>>) -> Self {
        Self {
            substrate,
            embedder,
        }
    }

    // --- Store operations ---

    /// Store a new fact. Invalid categories coerce to `general` and
    /// out-of-range confidence to `0.8`; facts are born valid.
    pub async fn store_fact(&self, req: StoreFactRequest) -> Result<Fact> {
        let category = if FACT_CATEGORIES.contains(&req.category.as_str()) {
            req.category
        } else {
            "general".to_string()
        };
        let confidence = if req.confidence > 0.0 && req.confidence <= 1.0 {
            req.confidence
        } else {
            0.8
        };

        let now = now_unix();
        let fact = Fact {
            id: new_node_id(FACT_PREFIX),
            content: req.content,
            category,
            confidence,
            source_agent: req.source_agent,
            source_conversation: req.source_conversation,
            valid: true,
            created_at: now,
            updated_at: now,
        };

        self.put_fact(&fact)?;
        self.materialize_embedding("fact", &fact.id, &fact_projection(&fact.content))
            .await;
        Ok(fact)
    }

    /// Store a new decision with status `active`.
    pub async fn store_decision(&self, req: StoreDecisionRequest) -> Result<Decision> {
        let now = now_unix();
        let decision = Decision {
            id: new_node_id(DECISION_PREFIX),
            title: req.title,
            rationale: req.rationale,
            alternatives: req.alternatives,
            context: req.context,
            source_agent: req.source_agent,
            source_conversation: req.source_conversation,
            status: "active".to_string(),
            created_at: now,
            updated_at: now,
        };

        self.put_decision(&decision)?;
        self.materialize_embedding(
            "decision",
            &decision.id,
            &decision_projection(&decision.title, &decision.rationale),
        )
        .await;
        Ok(decision)
    }

    /// Store a new entity. Unknown kinds are rejected.
    pub async fn store_entity(&self, req: StoreEntityRequest) -> Result<Entity> {
        if !ENTITY_KINDS.contains(&req.kind.as_str()) {
            return Err(MemoryError::invalid_argument(format!(
                "invalid entity kind {:?}. Must be one of: {}",
                req.kind,
                ENTITY_KINDS.join(", ")
            )));
        }

        let now = now_unix();
        let entity = Entity {
            id: new_node_id(ENTITY_PREFIX),
            name: req.name,
            kind: req.kind,
            description: req.description,
            source_agent: req.source_agent,
            created_at: now,
            updated_at: now,
        };

        self.put_entity(&entity)?;
        self.materialize_embedding(
            "entity",
            &entity.id,
            &entity_projection(&entity.name, &entity.description),
        )
        .await;
        Ok(entity)
    }

    /// Store a new event.
    pub async fn store_event(&self, req: StoreEventRequest) -> Result<Event> {
        let now = now_unix();
        let event = Event {
            id: new_node_id(EVENT_PREFIX),
            title: req.title,
            description: req.description,
            event_date: req.event_date,
            source_agent: req.source_agent,
            source_conversation: req.source_conversation,
            created_at: now,
            updated_at: now,
        };

        self.put_event(&event)?;
        self.materialize_embedding(
            "event",
            &event.id,
            &event_projection(&event.title, &event.description),
        )
        .await;
        Ok(event)
    }

    /// Store a new topic. Names are canonicalized to lower case; topics carry
    /// no embedding.
    pub async fn store_topic(&self, req: StoreTopicRequest) -> Result<Topic> {
        let now = now_unix();
        let topic = Topic {
            id: new_node_id(TOPIC_PREFIX),
            name: req.name.to_lowercase(),
            description: req.description,
            created_at: now,
            updated_at: now,
        };

        self.put_topic(&topic)?;
        Ok(topic)
    }

    // --- Invalidation ---

    /// Mark `old_fact_id` invalid and record the `(new, old, reason)` link.
    /// Replaying the same invalidation converges to the same state.
    pub async fn invalidate_fact(
        &self,
        old_fact_id: &str,
        new_fact_id: &str,
        reason: &str,
    ) -> Result<()> {
        let mut old = self
            .fetch_fact(old_fact_id)?
            .ok_or_else(|| MemoryError::not_found(format!("fact {old_fact_id:?} not found")))?;
        self.fetch_fact(new_fact_id)?
            .ok_or_else(|| MemoryError::not_found(format!("fact {new_fact_id:?} not found")))?;

        old.valid = false;
        old.updated_at = now_unix();
        self.put_fact(&old)?;

        self.substrate.execute(&format!(
            "?[new_fact_id, old_fact_id, reason] <- [[{}, {}, {}]] :put mie_invalidates {{new_fact_id, old_fact_id => reason}}",
            str_lit(new_fact_id),
            str_lit(old_fact_id),
            str_lit(reason),
        ))
    }

    // --- Relationships ---

    /// Insert one edge row. The edge name must be one of the six relationship
    /// edges, and all non-attribute fields must be present. Endpoint existence
    /// is not verified; callers are expected to have just created them.
    pub async fn add_relationship(
        &self,
        edge: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<()> {
        let cols = edge_columns(edge).ok_or_else(|| {
            MemoryError::invalid_argument(format!("unknown relationship type {edge:?}"))
        })?;

        let mut values = Vec::with_capacity(cols.len());
        for (i, col) in cols.iter().enumerate() {
            match fields.get(*col) {
                Some(v) => values.push(str_lit(v)),
                // Attribute columns beyond the two endpoints default to empty.
                None if i >= 2 => values.push(str_lit("")),
                None => {
                    return Err(MemoryError::invalid_argument(format!(
                        "missing field {col:?} for relationship {edge:?}"
                    )))
                }
            }
        }

        let head = cols.join(", ");
        let spec = if cols.len() > 2 {
            format!("{} => {}", cols[..2].join(", "), cols[2..].join(", "))
        } else {
            head.clone()
        };
        self.substrate.execute(&format!(
            "?[{head}] <- [[{}]] :put mie_{edge} {{{spec}}}",
            values.join(", ")
        ))
    }

    // --- In-place updates ---

    /// Replace an entity's description. Valid for entity nodes only.
    pub async fn update_description(&self, node_id: &str, new_description: &str) -> Result<()> {
        if !node_id.starts_with(ENTITY_PREFIX) {
            return Err(MemoryError::invalid_argument(
                "update_description is only valid for entity nodes",
            ));
        }
        let mut entity = self
            .fetch_entity(node_id)?
            .ok_or_else(|| MemoryError::not_found(format!("entity {node_id:?} not found")))?;
        entity.description = new_description.to_string();
        entity.updated_at = now_unix();
        self.put_entity(&entity)
    }

    /// Change a decision's status. Valid for decision nodes only.
    pub async fn update_status(&self, node_id: &str, new_status: &str) -> Result<()> {
        if !node_id.starts_with(DECISION_PREFIX) {
            return Err(MemoryError::invalid_argument(
                "update_status is only valid for decision nodes",
            ));
        }
        if !DECISION_STATUSES.contains(&new_status) {
            return Err(MemoryError::invalid_argument(format!(
                "invalid status {:?}. Must be one of: {}",
                new_status,
                DECISION_STATUSES.join(", ")
            )));
        }
        let mut decision = self
            .fetch_decision(node_id)?
            .ok_or_else(|| MemoryError::not_found(format!("decision {node_id:?} not found")))?;
        decision.status = new_status.to_string();
        decision.updated_at = now_unix();
        self.put_decision(&decision)
    }

    // --- Counters ---

    /// Increment a metadata counter and refresh its `last_*_at` companion.
    /// Read-then-write; concurrent increments may lose updates, which is
    /// acceptable for observational counters.
    pub async fn increment_counter(&self, key: &str) -> Result<()> {
        let current = self
            .substrate
            .query(&format!(
                "?[value] := *mie_meta{{key: {}, value}}",
                str_lit(key)
            ))
            .ok()
            .and_then(|rows| rows.rows.first().map(|r| crate::storage::value_str(&r[0])))
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        self.substrate.execute(&format!(
            "?[key, value] <- [[{}, '{}']] :put mie_meta {{key => value}}",
            str_lit(key),
            current + 1
        ))?;

        let ts_key = match key {
            "total_queries" => Some("last_query_at"),
            "total_stores" => Some("last_store_at"),
            _ => None,
        };
        if let Some(ts_key) = ts_key {
            // Best effort; a lost timestamp never fails the operation.
            let _ = self.substrate.execute(&format!(
                "?[key, value] <- [['{ts_key}', '{}']] :put mie_meta {{key => value}}",
                now_unix()
            ));
        }
        Ok(())
    }

    // --- Raw row puts (also used by the import path) ---

    /// Insert or replace a fact row exactly as given.
    pub fn put_fact(&self, f: &Fact) -> Result<()> {
        self.substrate.execute(&format!(
            "?[id, content, category, confidence, source_agent, source_conversation, valid, created_at, updated_at] <- \
             [[{}, {}, {}, {}, {}, {}, {}, {}, {}]] \
             :put mie_fact {{id => content, category, confidence, source_agent, source_conversation, valid, created_at, updated_at}}",
            str_lit(&f.id),
            str_lit(&f.content),
            str_lit(&f.category),
            float_lit(f.confidence),
            str_lit(&f.source_agent),
            str_lit(&f.source_conversation),
            f.valid,
            f.created_at,
            f.updated_at,
        ))
    }

    /// Insert or replace a decision row exactly as given.
    pub fn put_decision(&self, d: &Decision) -> Result<()> {
        self.substrate.execute(&format!(
            "?[id, title, rationale, alternatives, context, source_agent, source_conversation, status, created_at, updated_at] <- \
             [[{}, {}, {}, {}, {}, {}, {}, {}, {}, {}]] \
             :put mie_decision {{id => title, rationale, alternatives, context, source_agent, source_conversation, status, created_at, updated_at}}",
            str_lit(&d.id),
            str_lit(&d.title),
            str_lit(&d.rationale),
            str_lit(&d.alternatives),
            str_lit(&d.context),
            str_lit(&d.source_agent),
            str_lit(&d.source_conversation),
            str_lit(&d.status),
            d.created_at,
            d.updated_at,
        ))
    }

    /// Insert or replace an entity row exactly as given.
    pub fn put_entity(&self, e: &Entity) -> Result<()> {
        self.substrate.execute(&format!(
            "?[id, name, kind, description, source_agent, created_at, updated_at] <- \
             [[{}, {}, {}, {}, {}, {}, {}]] \
             :put mie_entity {{id => name, kind, description, source_agent, created_at, updated_at}}",
            str_lit(&e.id),
            str_lit(&e.name),
            str_lit(&e.kind),
            str_lit(&e.description),
            str_lit(&e.source_agent),
            e.created_at,
            e.updated_at,
        ))
    }

    /// Insert or replace an event row exactly as given.
    pub fn put_event(&self, e: &Event) -> Result<()> {
        self.substrate.execute(&format!(
            "?[id, title, description, event_date, source_agent, source_conversation, created_at, updated_at] <- \
             [[{}, {}, {}, {}, {}, {}, {}, {}]] \
             :put mie_event {{id => title, description, event_date, source_agent, source_conversation, created_at, updated_at}}",
            str_lit(&e.id),
            str_lit(&e.title),
            str_lit(&e.description),
            str_lit(&e.event_date),
            str_lit(&e.source_agent),
            str_lit(&e.source_conversation),
            e.created_at,
            e.updated_at,
        ))
    }

    /// Insert or replace a topic row exactly as given.
    pub fn put_topic(&self, t: &Topic) -> Result<()> {
        self.substrate.execute(&format!(
            "?[id, name, description, created_at, updated_at] <- [[{}, {}, {}, {}, {}]] \
             :put mie_topic {{id => name, description, created_at, updated_at}}",
            str_lit(&t.id),
            str_lit(&t.name),
            str_lit(&t.description),
            t.created_at,
            t.updated_at,
        ))
    }

    /// Insert or replace an invalidation row exactly as given. Import path only.
    pub fn put_invalidation(&self, new_id: &str, old_id: &str, reason: &str) -> Result<()> {
        self.substrate.execute(&format!(
            "?[new_fact_id, old_fact_id, reason] <- [[{}, {}, {}]] :put mie_invalidates {{new_fact_id, old_fact_id => reason}}",
            str_lit(new_id),
            str_lit(old_id),
            str_lit(reason),
        ))
    }

    // --- Internals ---

    /// Publish the embedding row for a just-written node. Failures are logged
    /// and swallowed: the node stays queryable without its vector.
    async fn materialize_embedding(&self, variant: &str, id: &str, text: &str) {
        let Some(embedder) = &self.embedder else {
            return;
        };

        let vector = match embedder.generate(text).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("embedding generation failed for {id}: {e}; node stored without vector");
                return;
            }
        };

        let script = format!(
            "?[{variant}_id, embedding] := {variant}_id = {}, embedding = vec({}) \
             :put mie_{variant}_embedding {{{variant}_id => embedding}}",
            str_lit(id),
            vector_lit(&vector),
        );
        if let Err(e) = self.substrate.execute(&script) {
            tracing::warn!("cannot store embedding row for {id}: {e}");
        }
    }

    fn fetch_fact(&self, id: &str) -> Result<Option<Fact>> {
        let cols = node_columns("fact");
        let rows = self.substrate.query(&format!(
            "?[{cols}] := *mie_fact{{{cols}}}, id = {}",
            str_lit(id)
        ))?;
        Ok(rows.rows.first().and_then(|r| fact_from_row(r)))
    }

    fn fetch_entity(&self, id: &str) -> Result<Option<Entity>> {
        let cols = node_columns("entity");
        let rows = self.substrate.query(&format!(
            "?[{cols}] := *mie_entity{{{cols}}}, id = {}",
            str_lit(id)
        ))?;
        Ok(rows.rows.first().and_then(|r| entity_from_row(r)))
    }

    fn fetch_decision(&self, id: &str) -> Result<Option<Decision>> {
        let cols = node_columns("decision");
        let rows = self.substrate.query(&format!(
            "?[{cols}] := *mie_decision{{{cols}}}, id = {}",
            str_lit(id)
        ))?;
        Ok(rows.rows.first().and_then(|r| decision_from_row(r)))
    }
}
