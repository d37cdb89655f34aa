//! The `mie_query` operation: semantic, exact, and graph retrieval.

use std::collections::BTreeMap;

use mie_core::SearchResult;

use crate::params::QueryParams;
use crate::{similarity_indicator, similarity_percent, truncate, Querier, ToolResult};

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;

/// Read from the memory graph in one of the three retrieval modes.
pub async fn query(client: &dyn Querier, params: QueryParams) -> ToolResult {
    if params.query.is_empty() {
        return ToolResult::error("Missing required parameter: query");
    }

    let mode = params.mode.as_deref().unwrap_or("semantic");
    let node_types = params.node_types.clone().unwrap_or_else(|| {
        ["fact", "decision", "entity", "event"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    });
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;

    let result = match mode {
        "semantic" => semantic_mode(client, &params.query, &node_types, limit).await,
        "exact" => exact_mode(client, &params.query, &node_types, limit).await,
        "graph" => graph_mode(client, &params).await,
        _ => {
            return ToolResult::error(format!(
                "Invalid mode {mode:?}. Must be one of: semantic, exact, graph"
            ))
        }
    };

    // Usage counter on success only; never fails the main operation.
    if !result.is_error {
        let _ = client.increment_counter("total_queries").await;
    }
    result
}

async fn semantic_mode(
    client: &dyn Querier,
    query: &str,
    node_types: &[String],
    limit: usize,
) -> ToolResult {
    if !client.embeddings_enabled() {
        return ToolResult::error(
            "Semantic search requires embeddings to be enabled. Enable in config or use mode=exact.",
        );
    }

    let results = match client.semantic_search(query, node_types, limit).await {
        Ok(results) => results,
        Err(e) => return ToolResult::error(format!("Semantic search failed: {e}")),
    };

    if results.is_empty() {
        return ToolResult::ok(format!(
            "## Memory Search Results for: {query:?}\n\n_No results found._\n"
        ));
    }

    let mut out = format!("## Memory Search Results for: {query:?}\n\n");
    render_grouped(&mut out, &results, node_types, true);
    ToolResult::ok(out)
}

async fn exact_mode(
    client: &dyn Querier,
    query: &str,
    node_types: &[String],
    limit: usize,
) -> ToolResult {
    let results = match client.exact_search(query, node_types, limit).await {
        Ok(results) => results,
        Err(e) => return ToolResult::error(format!("Exact search failed: {e}")),
    };

    if results.is_empty() {
        return ToolResult::ok(format!(
            "## Exact Search Results for: {query:?}\n\n_No results found._\n"
        ));
    }

    let mut out = format!("## Exact Search Results for: {query:?}\n\n");
    render_grouped(&mut out, &results, node_types, false);
    ToolResult::ok(out)
}

fn type_label(node_type: &str) -> &'static str {
    match node_type {
        "fact" => "Facts",
        "decision" => "Decisions",
        "entity" => "Entities",
        "event" => "Events",
        _ => "Topics",
    }
}

fn render_grouped(
    out: &mut String,
    results: &[SearchResult],
    node_types: &[String],
    with_similarity: bool,
) {
    let mut grouped: BTreeMap<&str, Vec<&SearchResult>> = BTreeMap::new();
    for r in results {
        grouped.entry(r.node_type.as_str()).or_default().push(r);
    }

    for nt in node_types {
        let Some(items) = grouped.get(nt.as_str()) else {
            continue;
        };
        out.push_str(&format!("### {} ({} results)\n", type_label(nt), items.len()));
        for (i, item) in items.iter().enumerate() {
            if with_similarity {
                out.push_str(&format!(
                    "{}. {} {}% [{}] {:?}\n",
                    i + 1,
                    similarity_indicator(item.distance),
                    similarity_percent(item.distance),
                    item.id,
                    truncate(&item.content, 100)
                ));
            } else {
                out.push_str(&format!(
                    "{}. [{}] {:?}\n",
                    i + 1,
                    item.id,
                    truncate(&item.content, 100)
                ));
            }
            if !item.detail.is_empty() {
                out.push_str(&format!("   {}\n", item.detail));
            }
        }
        out.push('\n');
    }
}

async fn graph_mode(client: &dyn Querier, params: &QueryParams) -> ToolResult {
    let Some(node_id) = params.node_id.as_deref().filter(|s| !s.is_empty()) else {
        return ToolResult::error("node_id is required for graph mode");
    };
    let Some(traversal) = params.traversal.as_deref().filter(|s| !s.is_empty()) else {
        return ToolResult::error("traversal is required for graph mode");
    };

    let mut out = format!("## Graph Traversal: {traversal} from [{node_id}]\n\n");

    let rendered = match traversal {
        "related_entities" => render_related_entities(client, &mut out, node_id).await,
        "related_facts" | "facts_about_entity" => {
            render_related_facts(client, &mut out, node_id).await
        }
        "invalidation_chain" => render_invalidation_chain(client, &mut out, node_id).await,
        "decision_entities" => render_decision_entities(client, &mut out, node_id).await,
        "entity_decisions" => render_entity_decisions(client, &mut out, node_id).await,
        _ => {
            return ToolResult::error(format!(
                "Invalid traversal type {traversal:?}. Must be one of: related_entities, \
                 related_facts, invalidation_chain, decision_entities, facts_about_entity, \
                 entity_decisions"
            ))
        }
    };

    match rendered {
        Ok(()) => ToolResult::ok(out),
        Err(e) => ToolResult::error(format!("Traversal failed: {e}")),
    }
}

async fn render_related_entities(
    client: &dyn Querier,
    out: &mut String,
    node_id: &str,
) -> mie_core::Result<()> {
    let entities = client.related_entities(node_id).await?;
    if entities.is_empty() {
        out.push_str("_No related entities found._\n");
        return Ok(());
    }
    for (i, e) in entities.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {:?} (kind: {})\n",
            i + 1,
            e.id,
            e.name,
            e.kind
        ));
        if !e.description.is_empty() {
            out.push_str(&format!("   {}\n", truncate(&e.description, 100)));
        }
    }
    Ok(())
}

async fn render_related_facts(
    client: &dyn Querier,
    out: &mut String,
    node_id: &str,
) -> mie_core::Result<()> {
    let facts = client.facts_about_entity(node_id).await?;
    if facts.is_empty() {
        out.push_str("_No related facts found._\n");
        return Ok(());
    }
    for (i, f) in facts.iter().enumerate() {
        let valid_str = if f.valid { "valid" } else { "invalidated" };
        out.push_str(&format!(
            "{}. [{}] {:?} (category: {}, confidence: {:.1}, {valid_str})\n",
            i + 1,
            f.id,
            truncate(&f.content, 100),
            f.category,
            f.confidence
        ));
    }
    Ok(())
}

async fn render_invalidation_chain(
    client: &dyn Querier,
    out: &mut String,
    node_id: &str,
) -> mie_core::Result<()> {
    let chain = client.invalidation_chain(node_id).await?;
    if chain.is_empty() {
        out.push_str("_No invalidation chain found._\n");
        return Ok(());
    }
    for (i, inv) in chain.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] -> [{}]\n   Reason: {}\n",
            i + 1,
            inv.new_fact_id,
            inv.old_fact_id,
            inv.reason
        ));
        if !inv.old_content.is_empty() {
            out.push_str(&format!("   Old: {:?}\n", truncate(&inv.old_content, 80)));
        }
        if !inv.new_content.is_empty() {
            out.push_str(&format!("   New: {:?}\n", truncate(&inv.new_content, 80)));
        }
    }
    Ok(())
}

async fn render_decision_entities(
    client: &dyn Querier,
    out: &mut String,
    node_id: &str,
) -> mie_core::Result<()> {
    let entities = client.decision_entities(node_id).await?;
    if entities.is_empty() {
        out.push_str("_No related entities found for this decision._\n");
        return Ok(());
    }
    for (i, e) in entities.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {:?} (kind: {}, role: {})\n",
            i + 1,
            e.entity.id,
            e.entity.name,
            e.entity.kind,
            e.role
        ));
    }
    Ok(())
}

async fn render_entity_decisions(
    client: &dyn Querier,
    out: &mut String,
    node_id: &str,
) -> mie_core::Result<()> {
    let decisions = client.entity_decisions(node_id).await?;
    if decisions.is_empty() {
        out.push_str("_No related decisions found for this entity._\n");
        return Ok(());
    }
    for (i, d) in decisions.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {:?} (status: {})\n",
            i + 1,
            d.id,
            truncate(&d.title, 100),
            d.status
        ));
    }
    Ok(())
}
