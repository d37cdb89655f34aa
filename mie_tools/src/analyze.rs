//! The `mie_analyze` operation: a read-only helper that surfaces memory
//! related to a conversation fragment so the agent can decide what to persist.

use crate::params::AnalyzeParams;
use crate::{similarity_percent, truncate, Querier, ToolResult};

const RELATED_LIMIT: usize = 5;
const MAX_ENTITY_LOOKUPS: usize = 8;

/// Surface related memories and near-duplicates for a fragment, plus a short
/// evaluation guide. Never writes and never touches the usage counters.
pub async fn analyze(client: &dyn Querier, params: AnalyzeParams) -> ToolResult {
    if params.content.is_empty() {
        return ToolResult::error("Missing required parameter: content");
    }

    let node_types = search_focus(params.content_type.as_deref());
    let mut out = String::from("## Memory Analysis\n\n");

    let related = if client.embeddings_enabled() {
        client
            .semantic_search(&params.content, &node_types, RELATED_LIMIT)
            .await
    } else {
        client
            .exact_search(&params.content, &node_types, RELATED_LIMIT)
            .await
    };

    match related {
        Ok(results) if results.is_empty() => {
            out.push_str("### Related existing memories\n_None found._\n\n");
        }
        Ok(results) => {
            out.push_str("### Related existing memories\n");
            for r in &results {
                out.push_str(&format!(
                    "- [{}] ({}) {:?}\n",
                    r.id,
                    r.node_type,
                    truncate(&r.content, 100)
                ));
            }
            out.push('\n');
        }
        Err(e) => {
            out.push_str(&format!("### Related existing memories\n_Search failed: {e}_\n\n"));
        }
    }

    let known = known_entities(client, &params.content).await;
    if !known.is_empty() {
        out.push_str("### Known entities mentioned\n");
        for (name, entity) in &known {
            out.push_str(&format!(
                "- {name} -> [{}] ({}) {}\n",
                entity.id,
                entity.kind,
                truncate(&entity.description, 80)
            ));
        }
        out.push_str(
            "\nLink new facts to these entities with a fact_entity relationship \
             instead of creating duplicates.\n\n",
        );
    }

    if client.embeddings_enabled() {
        if let Ok(conflicts) = client.check_new_fact_conflicts(&params.content, "").await {
            if !conflicts.is_empty() {
                out.push_str("### Potential conflicts with stored facts\n");
                for c in &conflicts {
                    out.push_str(&format!(
                        "- [{}] {:?} ({}% similar)\n",
                        c.fact_b.id,
                        truncate(&c.fact_b.content, 100),
                        similarity_percent(1.0 - c.similarity)
                    ));
                }
                out.push_str(
                    "\nIf the new information supersedes one of these, store it with \
                     `invalidates` set to the old fact ID.\n\n",
                );
            }
        }
    }

    out.push_str(
        "### Evaluation guide\n\
         Worth storing:\n\
         - Decisions with rationale and the alternatives that were considered\n\
         - Stable facts about the user, their projects, and conventions\n\
         - Entities: people, companies, projects, technologies in play\n\
         - Events with dates: releases, migrations, incidents\n\
         - Preferences and working style\n\
         \n\
         Skip:\n\
         - Transient debugging detail and one-off troubleshooting\n\
         - Code snippets (store the decision, not the code)\n\
         - Anything the user asked not to remember\n\
         \n\
         Use mie_store for a single item or mie_bulk_store for several related \
         items (link them with target_ref).\n",
    );

    ToolResult::ok(out)
}

/// Look up capitalized words of the fragment against stored entity names.
/// Bounded to a handful of lookups; misses are silently skipped.
async fn known_entities(
    client: &dyn Querier,
    content: &str,
) -> Vec<(String, mie_core::Entity)> {
    let mut candidates: Vec<&str> = content
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && w.chars().next().is_some_and(|c| c.is_uppercase()))
        .collect();
    candidates.dedup();
    candidates.truncate(MAX_ENTITY_LOOKUPS);

    let mut found: Vec<(String, mie_core::Entity)> = Vec::new();
    for word in candidates {
        if let Ok(Some(entity)) = client.find_entity_by_name(word).await {
            if !found.iter().any(|(_, e)| e.id == entity.id) {
                found.push((word.to_string(), entity));
            }
        }
    }
    found
}

/// Which variants to search, given the declared content type.
fn search_focus(content_type: Option<&str>) -> Vec<String> {
    let focus: &[&str] = match content_type {
        Some("decision") => &["decision", "entity", "fact"],
        Some("event") => &["event", "decision", "fact"],
        Some("statement") => &["fact", "entity"],
        _ => &["fact", "decision", "entity"],
    };
    focus.iter().map(|s| s.to_string()).collect()
}
