//! Tool-operation tests over a mock `Querier`, exercising validation,
//! rendering, and the bulk two-phase flow without a real database.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use mie_tools::{
    analyze, bulk_store, conflicts, list, query, status, store, update, AnalyzeParams,
    BulkStoreParams, ConflictsParams, ListParams, QueryParams, Querier, RelationshipSpec,
    StoreParams, UpdateParams,
};

use mie_core::{
    Conflict, ConflictOptions, Decision, Entity, EntityWithRole, Event, ExportData, ExportOptions,
    Fact, GraphStats, Invalidation, ListOptions, MemoryError, Node, Result, SearchResult,
    StoreDecisionRequest, StoreEntityRequest, StoreEventRequest, StoreFactRequest,
    StoreTopicRequest, Topic, ENTITY_KINDS,
};

/// In-memory stand-in for the engine, recording every write it sees.
#[derive(Default)]
struct MockQuerier {
    embeddings: bool,
    next_id: AtomicUsize,
    facts: Mutex<Vec<Fact>>,
    entities: Mutex<Vec<Entity>>,
    relationships: Mutex<Vec<(String, BTreeMap<String, String>)>>,
    invalidations: Mutex<Vec<(String, String, String)>>,
    counters: Mutex<BTreeMap<String, usize>>,
    search_results: Mutex<Vec<SearchResult>>,
    conflict_results: Mutex<Vec<Conflict>>,
}

impl MockQuerier {
    fn new() -> Self {
        Self {
            embeddings: true,
            ..Default::default()
        }
    }

    fn without_embeddings() -> Self {
        Self::default()
    }

    fn alloc_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}mock{n:012}")
    }

    fn counter(&self, key: &str) -> usize {
        *self.counters.lock().unwrap().get(key).unwrap_or(&0)
    }

    fn recorded_relationships(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.relationships.lock().unwrap().clone()
    }

    fn with_search_results(self, results: Vec<SearchResult>) -> Self {
        *self.search_results.lock().unwrap() = results;
        self
    }
}

fn sample_fact(id: &str, content: &str) -> Fact {
    Fact {
        id: id.into(),
        content: content.into(),
        category: "general".into(),
        confidence: 0.8,
        source_agent: "test".into(),
        source_conversation: String::new(),
        valid: true,
        created_at: 1_700_000_000,
        updated_at: 1_700_000_000,
    }
}

#[async_trait]
impl Querier for MockQuerier {
    async fn store_fact(&self, req: StoreFactRequest) -> Result<Fact> {
        let fact = Fact {
            id: self.alloc_id("fact:"),
            content: req.content,
            category: req.category,
            confidence: req.confidence,
            source_agent: req.source_agent,
            source_conversation: req.source_conversation,
            valid: true,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        };
        self.facts.lock().unwrap().push(fact.clone());
        Ok(fact)
    }

    async fn store_decision(&self, req: StoreDecisionRequest) -> Result<Decision> {
        Ok(Decision {
            id: self.alloc_id("dec:"),
            title: req.title,
            rationale: req.rationale,
            alternatives: req.alternatives,
            context: req.context,
            source_agent: req.source_agent,
            source_conversation: req.source_conversation,
            status: "active".into(),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        })
    }

    async fn store_entity(&self, req: StoreEntityRequest) -> Result<Entity> {
        if !ENTITY_KINDS.contains(&req.kind.as_str()) {
            return Err(MemoryError::invalid_argument(format!(
                "invalid entity kind {:?}",
                req.kind
            )));
        }
        let entity = Entity {
            id: self.alloc_id("ent:"),
            name: req.name,
            kind: req.kind,
            description: req.description,
            source_agent: req.source_agent,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        };
        self.entities.lock().unwrap().push(entity.clone());
        Ok(entity)
    }

    async fn store_event(&self, req: StoreEventRequest) -> Result<Event> {
        Ok(Event {
            id: self.alloc_id("evt:"),
            title: req.title,
            description: req.description,
            event_date: req.event_date,
            source_agent: req.source_agent,
            source_conversation: req.source_conversation,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        })
    }

    async fn store_topic(&self, req: StoreTopicRequest) -> Result<Topic> {
        Ok(Topic {
            id: self.alloc_id("top:"),
            name: req.name.to_lowercase(),
            description: req.description,
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        })
    }

    async fn invalidate_fact(
        &self,
        old_fact_id: &str,
        new_fact_id: &str,
        reason: &str,
    ) -> Result<()> {
        if old_fact_id.contains("missing") {
            return Err(MemoryError::not_found(format!(
                "fact {old_fact_id:?} not found"
            )));
        }
        self.invalidations.lock().unwrap().push((
            old_fact_id.to_string(),
            new_fact_id.to_string(),
            reason.to_string(),
        ));
        Ok(())
    }

    async fn add_relationship(&self, edge: &str, fields: &BTreeMap<String, String>) -> Result<()> {
        self.relationships
            .lock()
            .unwrap()
            .push((edge.to_string(), fields.clone()));
        Ok(())
    }

    async fn semantic_search(
        &self,
        _query: &str,
        _node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if !self.embeddings {
            return Err(MemoryError::EmbeddingsDisabled);
        }
        let mut results = self.search_results.lock().unwrap().clone();
        results.truncate(limit);
        Ok(results)
    }

    async fn exact_search(
        &self,
        query: &str,
        _node_types: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let mut results: Vec<SearchResult> = self
            .facts
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.valid && f.content.contains(query))
            .map(|f| SearchResult {
                node_type: "fact".into(),
                id: f.id.clone(),
                content: f.content.clone(),
                detail: f.category.clone(),
                distance: 0.0,
                metadata: serde_json::Value::Null,
            })
            .collect();
        results.truncate(limit);
        Ok(results)
    }

    async fn get_node(&self, node_id: &str) -> Result<Node> {
        self.facts
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == node_id)
            .cloned()
            .map(Node::Fact)
            .ok_or_else(|| MemoryError::not_found(format!("node {node_id:?} not found")))
    }

    async fn list_nodes(&self, opts: ListOptions) -> Result<(Vec<Node>, usize)> {
        let facts = self.facts.lock().unwrap();
        let matching: Vec<Node> = facts
            .iter()
            .filter(|f| !opts.valid_only || f.valid)
            .cloned()
            .map(Node::Fact)
            .collect();
        let total = matching.len();
        Ok((matching.into_iter().take(opts.limit).collect(), total))
    }

    async fn find_entity_by_name(&self, name: &str) -> Result<Option<Entity>> {
        Ok(self
            .entities
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn related_entities(&self, _fact_id: &str) -> Result<Vec<Entity>> {
        Ok(Vec::new())
    }

    async fn facts_about_entity(&self, _entity_id: &str) -> Result<Vec<Fact>> {
        Ok(self.facts.lock().unwrap().clone())
    }

    async fn decision_entities(&self, _decision_id: &str) -> Result<Vec<EntityWithRole>> {
        Ok(Vec::new())
    }

    async fn entity_decisions(&self, _entity_id: &str) -> Result<Vec<Decision>> {
        Ok(Vec::new())
    }

    async fn invalidation_chain(&self, fact_id: &str) -> Result<Vec<Invalidation>> {
        Ok(self
            .invalidations
            .lock()
            .unwrap()
            .iter()
            .filter(|(old, new, _)| old == fact_id || new == fact_id)
            .map(|(old, new, reason)| Invalidation {
                new_fact_id: new.clone(),
                old_fact_id: old.clone(),
                reason: reason.clone(),
                old_content: String::new(),
                new_content: String::new(),
            })
            .collect())
    }

    async fn update_description(&self, node_id: &str, _new_description: &str) -> Result<()> {
        if !node_id.starts_with("ent:") {
            return Err(MemoryError::invalid_argument(
                "update_description is only valid for entity nodes",
            ));
        }
        Ok(())
    }

    async fn update_status(&self, _node_id: &str, new_status: &str) -> Result<()> {
        if !["active", "superseded", "reversed"].contains(&new_status) {
            return Err(MemoryError::invalid_argument(format!(
                "invalid status {new_status:?}"
            )));
        }
        Ok(())
    }

    async fn detect_conflicts(&self, _opts: ConflictOptions) -> Result<Vec<Conflict>> {
        if !self.embeddings {
            return Err(MemoryError::EmbeddingsDisabled);
        }
        Ok(self.conflict_results.lock().unwrap().clone())
    }

    async fn check_new_fact_conflicts(
        &self,
        _content: &str,
        _category: &str,
    ) -> Result<Vec<Conflict>> {
        if !self.embeddings {
            return Err(MemoryError::EmbeddingsDisabled);
        }
        Ok(Vec::new())
    }

    async fn get_stats(&self) -> Result<GraphStats> {
        Ok(GraphStats {
            total_facts: self.facts.lock().unwrap().len(),
            valid_facts: self.facts.lock().unwrap().iter().filter(|f| f.valid).count(),
            total_queries: self.counter("total_queries"),
            total_stores: self.counter("total_stores"),
            schema_version: "1".into(),
            storage_engine: "mem".into(),
            storage_path: String::new(),
            ..Default::default()
        })
    }

    async fn export_graph(&self, _opts: ExportOptions) -> Result<ExportData> {
        Ok(ExportData {
            version: "1".into(),
            exported_at: "2026-01-01T00:00:00Z".into(),
            facts: self.facts.lock().unwrap().clone(),
            ..Default::default()
        })
    }

    async fn increment_counter(&self, key: &str) -> Result<()> {
        *self.counters.lock().unwrap().entry(key.to_string()).or_insert(0) += 1;
        Ok(())
    }

    fn embeddings_enabled(&self) -> bool {
        self.embeddings
    }
}

// --- store ---

#[tokio::test]
async fn store_requires_type() {
    let mock = MockQuerier::new();
    let result = store(&mock, StoreParams::default()).await;
    assert!(result.is_error);
    assert!(result.text.contains("type"));
}

#[tokio::test]
async fn store_fact_without_content_names_the_field() {
    let mock = MockQuerier::new();
    let result = store(
        &mock,
        StoreParams {
            node_type: "fact".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("content"));
}

#[tokio::test]
async fn store_fact_succeeds_and_counts() {
    let mock = MockQuerier::new();
    let result = store(
        &mock,
        StoreParams {
            node_type: "fact".into(),
            content: Some("The sky is blue".into()),
            category: Some("general".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(!result.is_error, "{}", result.text);
    assert!(result.text.contains("Stored fact [fact:"));
    assert!(result.text.contains("The sky is blue"));
    assert_eq!(mock.counter("total_stores"), 1);
}

#[tokio::test]
async fn store_rejects_unknown_type() {
    let mock = MockQuerier::new();
    let result = store(
        &mock,
        StoreParams {
            node_type: "memory".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("Invalid type"));
}

#[tokio::test]
async fn store_entity_surfaces_engine_rejection() {
    let mock = MockQuerier::new();
    let result = store(
        &mock,
        StoreParams {
            node_type: "entity".into(),
            name: Some("Acme".into()),
            kind: Some("conglomerate".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("invalid entity kind"));
}

#[tokio::test]
async fn store_skips_invalid_relationship_edges() {
    let mock = MockQuerier::new();
    let result = store(
        &mock,
        StoreParams {
            node_type: "fact".into(),
            content: Some("linked fact".into()),
            relationships: Some(vec![
                RelationshipSpec {
                    edge: "fact_entity".into(),
                    target_id: Some("ent:abc".into()),
                    ..Default::default()
                },
                RelationshipSpec {
                    edge: "fact_banana".into(),
                    target_id: Some("ent:abc".into()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("fact_entity -> [ent:abc]"));
    assert!(result.text.contains("Skipped invalid edge type: fact_banana"));
    assert_eq!(mock.recorded_relationships().len(), 1);
}

#[tokio::test]
async fn store_invalidates_must_reference_a_fact() {
    let mock = MockQuerier::new();
    let result = store(
        &mock,
        StoreParams {
            node_type: "fact".into(),
            content: Some("replacement".into()),
            invalidates: Some("ent:notafact".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("must reference a fact ID"));
}

// --- bulk store ---

#[tokio::test]
async fn bulk_store_resolves_target_refs() {
    let mock = MockQuerier::new();
    let result = bulk_store(
        &mock,
        BulkStoreParams {
            items: vec![
                StoreParams {
                    node_type: "entity".into(),
                    name: Some("Kraklabs".into()),
                    kind: Some("company".into()),
                    ..Default::default()
                },
                StoreParams {
                    node_type: "fact".into(),
                    content: Some("User works at Kraklabs".into()),
                    relationships: Some(vec![RelationshipSpec {
                        edge: "fact_entity".into(),
                        target_ref: Some(0),
                        ..Default::default()
                    }]),
                    ..Default::default()
                },
            ],
        },
    )
    .await;
    assert!(!result.is_error, "{}", result.text);
    assert!(result.text.contains("Stored 2 items: 1 facts, 1 entitys"));

    let rels = mock.recorded_relationships();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].0, "fact_entity");
    // The edge's entity endpoint is the id assigned to item 0.
    assert!(rels[0].1["entity_id"].starts_with("ent:"));
    assert_eq!(mock.counter("total_stores"), 2);
}

#[tokio::test]
async fn bulk_store_drops_out_of_range_and_failed_refs() {
    let mock = MockQuerier::new();
    let result = bulk_store(
        &mock,
        BulkStoreParams {
            items: vec![
                // This item fails: entity without kind.
                StoreParams {
                    node_type: "entity".into(),
                    name: Some("Nameless".into()),
                    ..Default::default()
                },
                StoreParams {
                    node_type: "fact".into(),
                    content: Some("points at broken and missing items".into()),
                    relationships: Some(vec![
                        RelationshipSpec {
                            edge: "fact_entity".into(),
                            target_ref: Some(0),
                            ..Default::default()
                        },
                        RelationshipSpec {
                            edge: "fact_entity".into(),
                            target_ref: Some(42),
                            ..Default::default()
                        },
                    ]),
                    ..Default::default()
                },
            ],
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("Errors (1)"));
    assert!(result.text.contains("item[0]"));
    // Both dangling references were silently dropped.
    assert!(mock.recorded_relationships().is_empty());
    assert_eq!(mock.counter("total_stores"), 1);
}

#[tokio::test]
async fn bulk_store_bounds_batch_size() {
    let mock = MockQuerier::new();
    let result = bulk_store(&mock, BulkStoreParams { items: Vec::new() }).await;
    assert!(result.is_error);
    assert!(result.text.contains("non-empty"));

    let items = vec![
        StoreParams {
            node_type: "topic".into(),
            name: Some("t".into()),
            ..Default::default()
        };
        51
    ];
    let result = bulk_store(&mock, BulkStoreParams { items }).await;
    assert!(result.is_error);
    assert!(result.text.contains("Too many items: 51"));
}

#[tokio::test]
async fn bulk_store_applies_invalidations() {
    let mock = MockQuerier::new();
    let result = bulk_store(
        &mock,
        BulkStoreParams {
            items: vec![StoreParams {
                node_type: "fact".into(),
                content: Some("corrected value".into()),
                invalidates: Some("fact:oldoldoldoldold".into()),
                ..Default::default()
            }],
        },
    )
    .await;
    assert!(!result.is_error, "{}", result.text);
    let invalidations = mock.invalidations.lock().unwrap().clone();
    assert_eq!(invalidations.len(), 1);
    assert_eq!(invalidations[0].0, "fact:oldoldoldoldold");
    assert!(invalidations[0].2.starts_with("Replaced by fact:"));
}

// --- query ---

#[tokio::test]
async fn query_requires_query_text() {
    let mock = MockQuerier::new();
    let result = query(&mock, QueryParams::default()).await;
    assert!(result.is_error);
    assert!(result.text.contains("query"));
}

#[tokio::test]
async fn query_rejects_unknown_mode() {
    let mock = MockQuerier::new();
    let result = query(
        &mock,
        QueryParams {
            query: "anything".into(),
            mode: Some("fuzzy".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("Invalid mode"));
}

#[tokio::test]
async fn semantic_query_requires_embeddings() {
    let mock = MockQuerier::without_embeddings();
    let result = query(
        &mock,
        QueryParams {
            query: "anything".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("embeddings"));
    assert_eq!(mock.counter("total_queries"), 0);
}

#[tokio::test]
async fn semantic_query_renders_similarity() {
    let mock = MockQuerier::new().with_search_results(vec![SearchResult {
        node_type: "fact".into(),
        id: "fact:aaa".into(),
        content: "User prefers Rust".into(),
        detail: "preference".into(),
        distance: 0.1,
        metadata: serde_json::Value::Null,
    }]);
    let result = query(
        &mock,
        QueryParams {
            query: "language preference".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("90%"));
    assert!(result.text.contains("[fact:aaa]"));
    assert_eq!(mock.counter("total_queries"), 1);
}

#[tokio::test]
async fn exact_query_finds_stored_fact() {
    let mock = MockQuerier::new();
    store(
        &mock,
        StoreParams {
            node_type: "fact".into(),
            content: Some("Acme Corp ships on Fridays".into()),
            ..Default::default()
        },
    )
    .await;

    let result = query(
        &mock,
        QueryParams {
            query: "Acme Corp".into(),
            mode: Some("exact".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("Acme Corp ships on Fridays"));
}

#[tokio::test]
async fn graph_query_validates_arguments() {
    let mock = MockQuerier::new();
    let result = query(
        &mock,
        QueryParams {
            query: "fact:abc".into(),
            mode: Some("graph".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("node_id"));

    let result = query(
        &mock,
        QueryParams {
            query: "fact:abc".into(),
            mode: Some("graph".into()),
            node_id: Some("fact:abc".into()),
            traversal: Some("teleport".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("Invalid traversal type"));
}

#[tokio::test]
async fn graph_query_renders_invalidation_chain() {
    let mock = MockQuerier::new();
    mock.invalidations.lock().unwrap().push((
        "fact:old".into(),
        "fact:new".into(),
        "Incorrect temperature".into(),
    ));

    let result = query(
        &mock,
        QueryParams {
            query: "fact:old".into(),
            mode: Some("graph".into()),
            node_id: Some("fact:old".into()),
            traversal: Some("invalidation_chain".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("[fact:new] -> [fact:old]"));
    assert!(result.text.contains("Incorrect temperature"));
}

// --- update ---

#[tokio::test]
async fn update_validates_action_and_arguments() {
    let mock = MockQuerier::new();

    let result = update(
        &mock,
        UpdateParams {
            node_id: "fact:abc".into(),
            action: "delete".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("Invalid action"));

    let result = update(
        &mock,
        UpdateParams {
            node_id: "fact:abc".into(),
            action: "invalidate".into(),
            reason: Some("outdated".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("replacement_id"));
}

#[tokio::test]
async fn update_invalidate_round_trip() {
    let mock = MockQuerier::new();
    let result = update(
        &mock,
        UpdateParams {
            node_id: "fact:old".into(),
            action: "invalidate".into(),
            reason: Some("Incorrect temperature".into()),
            replacement_id: Some("fact:new".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("Invalidated fact [fact:old]"));
    let invalidations = mock.invalidations.lock().unwrap().clone();
    assert_eq!(
        invalidations[0],
        (
            "fact:old".to_string(),
            "fact:new".to_string(),
            "Incorrect temperature".to_string()
        )
    );
}

#[tokio::test]
async fn update_status_propagates_validation() {
    let mock = MockQuerier::new();
    let result = update(
        &mock,
        UpdateParams {
            node_id: "dec:abc".into(),
            action: "update_status".into(),
            new_value: Some("abandoned".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(result.is_error);
    assert!(result.text.contains("invalid status"));
}

// --- list ---

#[tokio::test]
async fn list_renders_rows_and_total() {
    let mock = MockQuerier::new();
    mock.facts
        .lock()
        .unwrap()
        .push(sample_fact("fact:one", "The sky is blue"));

    let result = list(
        &mock,
        ListParams {
            node_type: "fact".into(),
            ..Default::default()
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("(1 of 1 shown)"));
    assert!(result.text.contains("The sky is blue"));
}

#[tokio::test]
async fn list_requires_node_type() {
    let mock = MockQuerier::new();
    let result = list(&mock, ListParams::default()).await;
    assert!(result.is_error);
    assert!(result.text.contains("node_type"));
}

// --- conflicts ---

#[tokio::test]
async fn conflicts_requires_embeddings() {
    let mock = MockQuerier::without_embeddings();
    let result = conflicts(&mock, ConflictsParams::default()).await;
    assert!(result.is_error);
    assert!(result.text.contains("embeddings"));
}

#[tokio::test]
async fn conflicts_renders_pairs() {
    let mock = MockQuerier::new();
    mock.conflict_results.lock().unwrap().push(Conflict {
        fact_a: sample_fact("fact:aaa", "Gateway listens on 8080"),
        fact_b: sample_fact("fact:bbb", "Gateway listens on 8081"),
        similarity: 0.93,
    });

    let result = conflicts(&mock, ConflictsParams::default()).await;
    assert!(!result.is_error);
    assert!(result.text.contains("93% similar"));
    assert!(result.text.contains("[fact:aaa]"));
    assert!(result.text.contains("[fact:bbb]"));
}

// --- status ---

#[tokio::test]
async fn status_renders_all_sections() {
    let mock = MockQuerier::new();
    mock.facts
        .lock()
        .unwrap()
        .push(sample_fact("fact:one", "present"));
    mock.increment_counter("total_stores").await.unwrap();

    let result = status(&mock).await;
    assert!(!result.is_error);
    assert!(result.text.contains("### Graph Statistics"));
    assert!(result.text.contains("- Facts: 1 (1 valid, 0 invalidated)"));
    assert!(result.text.contains("- Embeddings: enabled"));
    assert!(result.text.contains("### Health"));
    assert!(result.text.contains("### Usage"));
}

// --- analyze ---

#[tokio::test]
async fn analyze_requires_content() {
    let mock = MockQuerier::new();
    let result = analyze(&mock, AnalyzeParams::default()).await;
    assert!(result.is_error);
    assert!(result.text.contains("content"));
}

#[tokio::test]
async fn analyze_is_read_only_and_falls_back_to_exact() {
    let mock = MockQuerier::without_embeddings();
    mock.facts
        .lock()
        .unwrap()
        .push(sample_fact("fact:one", "User works at Kraklabs"));

    let result = analyze(
        &mock,
        AnalyzeParams {
            content: "Kraklabs".into(),
            content_type: None,
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("User works at Kraklabs"));
    assert!(result.text.contains("Evaluation guide"));
    // Analyze never counts as a store or query.
    assert_eq!(mock.counter("total_stores"), 0);
    assert_eq!(mock.counter("total_queries"), 0);
}

#[tokio::test]
async fn analyze_recognizes_known_entities() {
    let mock = MockQuerier::new();
    store(
        &mock,
        StoreParams {
            node_type: "entity".into(),
            name: Some("Kraklabs".into()),
            kind: Some("company".into()),
            ..Default::default()
        },
    )
    .await;

    let result = analyze(
        &mock,
        AnalyzeParams {
            content: "We discussed the Kraklabs deployment pipeline".into(),
            content_type: Some("conversation".into()),
        },
    )
    .await;
    assert!(!result.is_error);
    assert!(result.text.contains("Known entities mentioned"));
    assert!(result.text.contains("Kraklabs -> [ent:"));
}
