//! End-to-end engine tests over the in-memory substrate with the mock
//! embedding provider.

use std::collections::BTreeMap;
use std::collections::HashSet;

use mie_core::{
    ClientConfig, ConflictOptions, ExportOptions, ListOptions, MemoryClient, StoreDecisionRequest,
    StoreEntityRequest, StoreEventRequest, StoreFactRequest, StoreTopicRequest,
};

fn mem_client() -> MemoryClient {
    MemoryClient::open(ClientConfig {
        storage_engine: "mem".into(),
        storage_path: String::new(),
        embedding_enabled: true,
        embedding_provider: "mock".into(),
        embedding_dimensions: 64,
        embedding_workers: 2,
        ..Default::default()
    })
    .expect("open mem client")
}

fn mem_client_without_embeddings() -> MemoryClient {
    MemoryClient::open(ClientConfig {
        storage_engine: "mem".into(),
        storage_path: String::new(),
        embedding_enabled: false,
        ..Default::default()
    })
    .expect("open mem client")
}

fn fact_request(content: &str, category: &str) -> StoreFactRequest {
    StoreFactRequest {
        content: content.into(),
        category: category.into(),
        confidence: 0.9,
        source_agent: "test".into(),
        source_conversation: String::new(),
    }
}

#[tokio::test]
async fn fact_round_trip_and_listing() {
    let client = mem_client();

    let fact = client
        .store_fact(fact_request("The sky is blue", "general"))
        .await
        .expect("store fact");
    assert!(fact.id.starts_with("fact:"));
    assert!(fact.valid);
    assert_eq!(fact.created_at, fact.updated_at);

    let node = client.get_node(&fact.id).await.expect("get node");
    assert_eq!(node.as_fact().expect("fact node"), &fact);

    let (nodes, total) = client
        .list_nodes(ListOptions {
            node_type: "fact".into(),
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(total, 1);
    assert_eq!(nodes.len(), 1);
    assert!(nodes[0]
        .as_fact()
        .map(|f| f.content.contains("The sky is blue"))
        .unwrap_or(false));
}

#[tokio::test]
async fn fact_input_coercion_policy() {
    let client = mem_client();

    let fact = client
        .store_fact(StoreFactRequest {
            content: "User prefers dark mode".into(),
            category: "not-a-category".into(),
            confidence: 7.5,
            source_agent: "test".into(),
            source_conversation: String::new(),
        })
        .await
        .expect("store fact");
    assert_eq!(fact.category, "general");
    assert!((fact.confidence - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn entity_kind_is_strict_but_fact_category_is_not() {
    let client = mem_client();

    let err = client
        .store_entity(StoreEntityRequest {
            name: "Acme Corp".into(),
            kind: "conglomerate".into(),
            description: String::new(),
            source_agent: "test".into(),
        })
        .await
        .expect_err("invalid kind");
    assert_eq!(err.kind(), "invalid-argument");

    let entity = client
        .store_entity(StoreEntityRequest {
            name: "Acme Corp".into(),
            kind: "company".into(),
            description: String::new(),
            source_agent: "test".into(),
        })
        .await
        .expect("store entity");
    assert!(entity.id.starts_with("ent:"));
}

#[tokio::test]
async fn exact_search_finds_stored_entity() {
    let client = mem_client();
    client
        .store_entity(StoreEntityRequest {
            name: "Acme Corp".into(),
            kind: "company".into(),
            description: String::new(),
            source_agent: "test".into(),
        })
        .await
        .expect("store entity");

    let results = client
        .exact_search("Acme Corp", &["entity".to_string()], 10)
        .await
        .expect("exact search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].node_type, "entity");
    assert_eq!(results[0].content, "Acme Corp");
}

#[tokio::test]
async fn exact_search_skips_invalidated_facts() {
    let client = mem_client();
    let a = client
        .store_fact(fact_request("Coffee machine is on floor 3", "general"))
        .await
        .expect("store a");
    let b = client
        .store_fact(fact_request("Coffee machine moved to floor 2", "general"))
        .await
        .expect("store b");
    client
        .invalidate_fact(&a.id, &b.id, "Machine moved")
        .await
        .expect("invalidate");

    let results = client
        .exact_search("Coffee machine", &["fact".to_string()], 10)
        .await
        .expect("exact search");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, b.id);
}

#[tokio::test]
async fn invalidation_chain_round_trip() {
    let client = mem_client();

    let a = client
        .store_fact(fact_request("Water freezes at 10 degrees Celsius", "technical"))
        .await
        .expect("store a");
    let b = client
        .store_fact(fact_request("Water freezes at 0 degrees Celsius", "technical"))
        .await
        .expect("store b");

    client
        .invalidate_fact(&a.id, &b.id, "Incorrect temperature")
        .await
        .expect("invalidate");

    let old = client.get_node(&a.id).await.expect("get old");
    assert!(!old.as_fact().expect("fact").valid);

    let (nodes, _) = client
        .list_nodes(ListOptions {
            node_type: "fact".into(),
            valid_only: true,
            ..Default::default()
        })
        .await
        .expect("list valid");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].id(), b.id);

    let chain = client.invalidation_chain(&a.id).await.expect("chain");
    assert_eq!(chain.len(), 1);
    assert_eq!(chain[0].new_fact_id, b.id);
    assert_eq!(chain[0].old_fact_id, a.id);
    assert_eq!(chain[0].reason, "Incorrect temperature");
    assert_eq!(chain[0].old_content, "Water freezes at 10 degrees Celsius");

    // Replay converges to the same single chain row.
    client
        .invalidate_fact(&a.id, &b.id, "Incorrect temperature")
        .await
        .expect("replay invalidate");
    let chain = client.invalidation_chain(&b.id).await.expect("chain from new side");
    assert_eq!(chain.len(), 1);
}

#[tokio::test]
async fn invalidate_unknown_fact_is_not_found() {
    let client = mem_client();
    let b = client
        .store_fact(fact_request("Replacement", "general"))
        .await
        .expect("store");
    let err = client
        .invalidate_fact("fact:doesnotexist0000", &b.id, "r")
        .await
        .expect_err("missing old");
    assert_eq!(err.kind(), "not-found");
}

#[tokio::test]
async fn traversal_symmetry_between_fact_and_entity() {
    let client = mem_client();

    let entity = client
        .store_entity(StoreEntityRequest {
            name: "Kraklabs".into(),
            kind: "company".into(),
            description: String::new(),
            source_agent: "test".into(),
        })
        .await
        .expect("store entity");
    let fact = client
        .store_fact(fact_request("User works at Kraklabs", "professional"))
        .await
        .expect("store fact");

    let mut fields = BTreeMap::new();
    fields.insert("fact_id".to_string(), fact.id.clone());
    fields.insert("entity_id".to_string(), entity.id.clone());
    client
        .add_relationship("fact_entity", &fields)
        .await
        .expect("add edge");

    let entities = client.related_entities(&fact.id).await.expect("related entities");
    assert!(entities.iter().any(|e| e.id == entity.id));

    let facts = client
        .facts_about_entity(&entity.id)
        .await
        .expect("facts about entity");
    assert!(facts.iter().any(|f| f.id == fact.id));

    // Re-inserting the same edge is idempotent.
    client
        .add_relationship("fact_entity", &fields)
        .await
        .expect("re-add edge");
    let entities = client.related_entities(&fact.id).await.expect("related entities");
    assert_eq!(entities.len(), 1);
}

#[tokio::test]
async fn decision_entity_traversal_carries_role() {
    let client = mem_client();

    let decision = client
        .store_decision(StoreDecisionRequest {
            title: "Adopt CozoDB".into(),
            rationale: "Embedded datalog with vector search".into(),
            alternatives: "[]".into(),
            context: String::new(),
            source_agent: "test".into(),
            source_conversation: String::new(),
        })
        .await
        .expect("store decision");
    assert!(decision.id.starts_with("dec:"));
    assert_eq!(decision.status, "active");

    let entity = client
        .store_entity(StoreEntityRequest {
            name: "CozoDB".into(),
            kind: "technology".into(),
            description: String::new(),
            source_agent: "test".into(),
        })
        .await
        .expect("store entity");

    let mut fields = BTreeMap::new();
    fields.insert("decision_id".to_string(), decision.id.clone());
    fields.insert("entity_id".to_string(), entity.id.clone());
    fields.insert("role".to_string(), "selected technology".to_string());
    client
        .add_relationship("decision_entity", &fields)
        .await
        .expect("add edge");

    let entities = client
        .decision_entities(&decision.id)
        .await
        .expect("decision entities");
    assert_eq!(entities.len(), 1);
    assert_eq!(entities[0].entity.id, entity.id);
    assert_eq!(entities[0].role, "selected technology");

    let decisions = client
        .entity_decisions(&entity.id)
        .await
        .expect("entity decisions");
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].id, decision.id);
}

#[tokio::test]
async fn entity_lookup_by_name_is_case_insensitive() {
    let client = mem_client();
    client
        .store_entity(StoreEntityRequest {
            name: "Kraklabs".into(),
            kind: "company".into(),
            description: String::new(),
            source_agent: "test".into(),
        })
        .await
        .expect("store entity");

    let found = client
        .find_entity_by_name("kraklabs")
        .await
        .expect("lookup");
    assert_eq!(found.expect("entity").name, "Kraklabs");

    let missing = client.find_entity_by_name("unseen").await.expect("lookup");
    assert!(missing.is_none());
}

#[tokio::test]
async fn unknown_relationship_is_rejected() {
    let client = mem_client();
    let err = client
        .add_relationship("fact_banana", &BTreeMap::new())
        .await
        .expect_err("unknown edge");
    assert_eq!(err.kind(), "invalid-argument");

    let err = client
        .add_relationship("fact_entity", &BTreeMap::new())
        .await
        .expect_err("missing fields");
    assert_eq!(err.kind(), "invalid-argument");
    assert!(err.to_string().contains("fact_id"));
}

#[tokio::test]
async fn updates_are_variant_scoped() {
    let client = mem_client();

    let entity = client
        .store_entity(StoreEntityRequest {
            name: "Acme".into(),
            kind: "company".into(),
            description: "old".into(),
            source_agent: "test".into(),
        })
        .await
        .expect("store entity");
    client
        .update_description(&entity.id, "new description")
        .await
        .expect("update description");
    let node = client.get_node(&entity.id).await.expect("get entity");
    assert_eq!(node.as_entity().expect("entity").description, "new description");

    let decision = client
        .store_decision(StoreDecisionRequest {
            title: "T".into(),
            rationale: "R".into(),
            alternatives: "[]".into(),
            context: String::new(),
            source_agent: "test".into(),
            source_conversation: String::new(),
        })
        .await
        .expect("store decision");
    client
        .update_status(&decision.id, "superseded")
        .await
        .expect("update status");
    let node = client.get_node(&decision.id).await.expect("get decision");
    assert_eq!(node.as_decision().expect("decision").status, "superseded");

    let err = client
        .update_status(&decision.id, "abandoned")
        .await
        .expect_err("bad status");
    assert_eq!(err.kind(), "invalid-argument");

    let err = client
        .update_description(&decision.id, "nope")
        .await
        .expect_err("wrong variant");
    assert_eq!(err.kind(), "invalid-argument");
}

#[tokio::test]
async fn topic_names_are_canonicalized() {
    let client = mem_client();
    let topic = client
        .store_topic(StoreTopicRequest {
            name: "Distributed Systems".into(),
            description: String::new(),
        })
        .await
        .expect("store topic");
    assert!(topic.id.starts_with("top:"));
    assert_eq!(topic.name, "distributed systems");
}

#[tokio::test]
async fn counters_are_monotonic() {
    let client = mem_client();
    for _ in 0..5 {
        client
            .increment_counter("total_stores")
            .await
            .expect("increment");
    }
    let stats = client.get_stats().await.expect("stats");
    assert!(stats.total_stores >= 5);
    assert!(stats.last_store_at > 0);
    assert_eq!(stats.schema_version, "1");
}

#[tokio::test]
async fn semantic_search_is_deterministic_with_mock() {
    let client = mem_client();
    for content in [
        "User prefers Rust for systems work",
        "User prefers Python for scripting",
        "The deployment target is Kubernetes",
    ] {
        client
            .store_fact(fact_request(content, "technical"))
            .await
            .expect("store");
    }

    let types = vec!["fact".to_string()];
    let first = client
        .semantic_search("What language does the user prefer?", &types, 5)
        .await
        .expect("search 1");
    let second = client
        .semantic_search("What language does the user prefer?", &types, 5)
        .await
        .expect("search 2");

    assert!(!first.is_empty());
    let ids1: Vec<_> = first.iter().map(|r| (&r.id, r.distance.to_bits())).collect();
    let ids2: Vec<_> = second.iter().map(|r| (&r.id, r.distance.to_bits())).collect();
    assert_eq!(ids1, ids2);

    for pair in first.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[tokio::test]
async fn semantic_search_requires_embeddings() {
    let client = mem_client_without_embeddings();
    let err = client
        .semantic_search("anything", &[], 5)
        .await
        .expect_err("disabled");
    assert_eq!(err.kind(), "embeddings-disabled");

    let err = client
        .detect_conflicts(ConflictOptions::default())
        .await
        .expect_err("disabled");
    assert_eq!(err.kind(), "embeddings-disabled");
}

#[tokio::test]
async fn conflict_detection_finds_single_pair() {
    let client = mem_client();

    client
        .store_fact(fact_request("The API gateway listens on port 8080", "technical"))
        .await
        .expect("store a");
    client
        .store_fact(fact_request("The API gateway listens on port 8081", "technical"))
        .await
        .expect("store b");
    client
        .store_fact(fact_request("User enjoys hiking on weekends", "personal"))
        .await
        .expect("store unrelated");

    let conflicts = client
        .detect_conflicts(ConflictOptions {
            category: "technical".into(),
            threshold: 0.85,
            limit: 10,
        })
        .await
        .expect("detect");

    assert_eq!(conflicts.len(), 1);
    let conflict = &conflicts[0];
    assert!(conflict.similarity >= 0.85);
    assert!(conflict.fact_a.id < conflict.fact_b.id);
    assert_eq!(conflict.fact_a.category, "technical");
    assert_eq!(conflict.fact_b.category, "technical");

    // No pair appears twice.
    let mut seen = HashSet::new();
    for c in &conflicts {
        assert!(seen.insert((c.fact_a.id.clone(), c.fact_b.id.clone())));
    }
}

#[tokio::test]
async fn check_new_fact_conflicts_flags_near_duplicates() {
    let client = mem_client();
    client
        .store_fact(fact_request("Standup happens at 9am every morning", "professional"))
        .await
        .expect("store");

    let conflicts = client
        .check_new_fact_conflicts("Standup happens at 8am every morning", "professional")
        .await
        .expect("check");
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].similarity >= 0.85);

    let conflicts = client
        .check_new_fact_conflicts("Completely unrelated gardening trivia", "professional")
        .await
        .expect("check");
    assert!(conflicts.is_empty());
}

#[tokio::test]
async fn list_supports_filters_and_pagination() {
    let client = mem_client();
    for i in 0..7 {
        client
            .store_fact(fact_request(
                &format!("technical fact number {i}"),
                "technical",
            ))
            .await
            .expect("store");
    }
    client
        .store_fact(fact_request("a personal fact", "personal"))
        .await
        .expect("store");

    let (nodes, total) = client
        .list_nodes(ListOptions {
            node_type: "fact".into(),
            category: "technical".into(),
            limit: 3,
            ..Default::default()
        })
        .await
        .expect("list");
    assert_eq!(total, 7);
    assert_eq!(nodes.len(), 3);

    let (page2, _) = client
        .list_nodes(ListOptions {
            node_type: "fact".into(),
            category: "technical".into(),
            limit: 3,
            offset: 6,
            ..Default::default()
        })
        .await
        .expect("list page 2");
    assert_eq!(page2.len(), 1);

    // Unknown sort columns fall back to created_at rather than failing.
    let (nodes, _) = client
        .list_nodes(ListOptions {
            node_type: "fact".into(),
            sort_by: "nonexistent_column".into(),
            ..Default::default()
        })
        .await
        .expect("list with bad sort");
    assert_eq!(nodes.len(), 8);
}

#[tokio::test]
async fn get_node_unknown_id_is_not_found() {
    let client = mem_client();
    let err = client
        .get_node("fact:zzzzzzzzzzzzzzzz")
        .await
        .expect_err("missing");
    assert_eq!(err.kind(), "not-found");

    let err = client.get_node("mystery").await.expect_err("unprefixed");
    assert_eq!(err.kind(), "not-found");
}

#[tokio::test]
async fn export_covers_nodes_edges_and_embeddings() {
    let client = mem_client();

    let fact = client
        .store_fact(fact_request("Exported fact", "general"))
        .await
        .expect("store fact");
    let entity = client
        .store_entity(StoreEntityRequest {
            name: "Exported entity".into(),
            kind: "project".into(),
            description: String::new(),
            source_agent: "test".into(),
        })
        .await
        .expect("store entity");
    client
        .store_event(StoreEventRequest {
            title: "v1 release".into(),
            description: String::new(),
            event_date: "2026-01-15".into(),
            source_agent: "test".into(),
            source_conversation: String::new(),
        })
        .await
        .expect("store event");

    let mut fields = BTreeMap::new();
    fields.insert("fact_id".to_string(), fact.id.clone());
    fields.insert("entity_id".to_string(), entity.id.clone());
    client
        .add_relationship("fact_entity", &fields)
        .await
        .expect("edge");

    let export = client
        .export_graph(ExportOptions {
            include_embeddings: true,
            ..Default::default()
        })
        .await
        .expect("export");

    assert_eq!(export.version, "1");
    assert!(!export.exported_at.is_empty());
    assert_eq!(export.stats["facts"], 1);
    assert_eq!(export.stats["entities"], 1);
    assert_eq!(export.stats["events"], 1);
    assert_eq!(export.relationships["fact_entity"].len(), 1);
    assert!(export.embeddings.contains_key(&fact.id));

    // A filtered export omits edges and other variants.
    let partial = client
        .export_graph(ExportOptions {
            node_types: vec!["fact".to_string()],
            ..Default::default()
        })
        .await
        .expect("partial export");
    assert_eq!(partial.facts.len(), 1);
    assert!(partial.entities.is_empty());
    assert!(partial.relationships.is_empty());
}

#[tokio::test]
async fn import_replays_an_export() {
    let source = mem_client();
    let fact = source
        .store_fact(fact_request("Fact to migrate", "general"))
        .await
        .expect("store");
    let export = source
        .export_graph(ExportOptions::default())
        .await
        .expect("export");

    let target = mem_client();
    let imported = target.import_graph(&export).await.expect("import");
    assert_eq!(imported, 1);

    let node = target.get_node(&fact.id).await.expect("get imported");
    let imported_fact = node.as_fact().expect("fact");
    assert_eq!(imported_fact.content, "Fact to migrate");
    assert_eq!(imported_fact.created_at, fact.created_at);
}

#[tokio::test]
async fn sqlite_engine_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("index.db");
    let config = ClientConfig {
        storage_engine: "sqlite".into(),
        storage_path: db_path.to_string_lossy().into_owned(),
        embedding_enabled: true,
        embedding_provider: "mock".into(),
        embedding_dimensions: 32,
        embedding_workers: 1,
        ..Default::default()
    };

    let fact_id = {
        let client = MemoryClient::open(config.clone()).expect("open");
        let fact = client
            .store_fact(fact_request("Persisted fact", "general"))
            .await
            .expect("store");
        fact.id
    };

    let client = MemoryClient::open(config).expect("reopen");
    let node = client.get_node(&fact_id).await.expect("get after reopen");
    assert_eq!(node.as_fact().expect("fact").content, "Persisted fact");
}
