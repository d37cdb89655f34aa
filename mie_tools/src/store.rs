//! The `mie_store` operation: write one node plus optional relationships
//! and invalidation.

use std::collections::BTreeMap;

use mie_core::{
    StoreDecisionRequest, StoreEntityRequest, StoreEventRequest, StoreFactRequest,
    StoreTopicRequest,
};

use crate::params::{RelationshipSpec, StoreParams};
use crate::{truncate, Querier, ToolResult};

/// Store a new node and any relationships riding along with it.
pub async fn store(client: &dyn Querier, params: StoreParams) -> ToolResult {
    if params.node_type.is_empty() {
        return ToolResult::error("Missing required parameter: type");
    }

    let (node_id, summary) = match store_node(client, &params).await {
        Ok(Some(pair)) => pair,
        Ok(None) => {
            return ToolResult::error(format!(
                "Invalid type {:?}. Must be one of: fact, decision, entity, event, topic",
                params.node_type
            ))
        }
        Err(e) => {
            return ToolResult::error(format!("Failed to store {}: {e}", params.node_type))
        }
    };

    let invalidation_msg =
        match handle_invalidation(client, params.invalidates.as_deref(), &node_id).await {
            Ok(msg) => msg,
            Err(e) => return ToolResult::error(e),
        };

    let rel_msg = match &params.relationships {
        Some(rels) => store_relationships(client, &node_id, rels).await,
        None => String::new(),
    };

    // Usage counter; never fails the main operation.
    let _ = client.increment_counter("total_stores").await;

    let mut output = format!("Stored {} [{node_id}]\n{summary}", params.node_type);
    if !rel_msg.is_empty() {
        output.push_str("\n\nRelationships created:\n");
        output.push_str(&rel_msg);
    }
    if !invalidation_msg.is_empty() {
        output.push('\n');
        output.push_str(&invalidation_msg);
    }

    ToolResult::ok(output)
}

/// Dispatch one item to its store operation. Returns `Ok(None)` for an
/// unknown type and `Err` with the raw engine or validation message on
/// failure; bulk store reuses this with its own error framing.
pub(crate) async fn store_node(
    client: &dyn Querier,
    params: &StoreParams,
) -> Result<Option<(String, String)>, String> {
    let source_agent = params
        .source_agent
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    let source_conversation = params.source_conversation.clone().unwrap_or_default();

    match params.node_type.as_str() {
        "fact" => {
            let content = params.content.clone().unwrap_or_default();
            if content.is_empty() {
                return Err("content is required for fact type".to_string());
            }
            let fact = client
                .store_fact(StoreFactRequest {
                    content,
                    category: params
                        .category
                        .clone()
                        .unwrap_or_else(|| "general".to_string()),
                    confidence: params.confidence.unwrap_or(0.8),
                    source_agent,
                    source_conversation,
                })
                .await
                .map_err(|e| e.to_string())?;
            let summary = format!(
                "Content: {:?}\nCategory: {} | Confidence: {:.1} | Source: {}",
                truncate(&fact.content, 100),
                fact.category,
                fact.confidence,
                fact.source_agent
            );
            Ok(Some((fact.id, summary)))
        }

        "decision" => {
            let title = params.title.clone().unwrap_or_default();
            if title.is_empty() {
                return Err("title is required for decision type".to_string());
            }
            let rationale = params.rationale.clone().unwrap_or_default();
            if rationale.is_empty() {
                return Err("rationale is required for decision type".to_string());
            }
            let decision = client
                .store_decision(StoreDecisionRequest {
                    title,
                    rationale,
                    alternatives: params
                        .alternatives
                        .clone()
                        .unwrap_or_else(|| "[]".to_string()),
                    context: params.context.clone().unwrap_or_default(),
                    source_agent,
                    source_conversation,
                })
                .await
                .map_err(|e| e.to_string())?;
            let summary = format!(
                "Title: {:?}\nRationale: {}\nStatus: {} | Source: {}",
                truncate(&decision.title, 100),
                truncate(&decision.rationale, 100),
                decision.status,
                decision.source_agent
            );
            Ok(Some((decision.id, summary)))
        }

        "entity" => {
            let name = params.name.clone().unwrap_or_default();
            if name.is_empty() {
                return Err("name is required for entity type".to_string());
            }
            let kind = params.kind.clone().unwrap_or_default();
            if kind.is_empty() {
                return Err("kind is required for entity type".to_string());
            }
            let entity = client
                .store_entity(StoreEntityRequest {
                    name,
                    kind,
                    description: params.description.clone().unwrap_or_default(),
                    source_agent,
                })
                .await
                .map_err(|e| e.to_string())?;
            let mut summary = format!(
                "Name: {:?}\nKind: {} | Source: {}",
                entity.name, entity.kind, entity.source_agent
            );
            if !entity.description.is_empty() {
                summary.push_str(&format!(
                    "\nDescription: {}",
                    truncate(&entity.description, 100)
                ));
            }
            Ok(Some((entity.id, summary)))
        }

        "event" => {
            let title = params.title.clone().unwrap_or_default();
            if title.is_empty() {
                return Err("title is required for event type".to_string());
            }
            let event_date = params.event_date.clone().unwrap_or_default();
            if event_date.is_empty() {
                return Err("event_date is required for event type".to_string());
            }
            let event = client
                .store_event(StoreEventRequest {
                    title,
                    description: params.description.clone().unwrap_or_default(),
                    event_date,
                    source_agent,
                    source_conversation,
                })
                .await
                .map_err(|e| e.to_string())?;
            let summary = format!(
                "Title: {:?}\nDate: {} | Source: {}",
                truncate(&event.title, 100),
                event.event_date,
                event.source_agent
            );
            Ok(Some((event.id, summary)))
        }

        "topic" => {
            let name = params.name.clone().unwrap_or_default();
            if name.is_empty() {
                return Err("name is required for topic type".to_string());
            }
            let topic = client
                .store_topic(StoreTopicRequest {
                    name,
                    description: params.description.clone().unwrap_or_default(),
                })
                .await
                .map_err(|e| e.to_string())?;
            let mut summary = format!("Name: {:?}", topic.name);
            if !topic.description.is_empty() {
                summary.push_str(&format!(
                    "\nDescription: {}",
                    truncate(&topic.description, 100)
                ));
            }
            Ok(Some((topic.id, summary)))
        }

        _ => Ok(None),
    }
}

/// Apply an `invalidates` reference, if any. Returns the rendered note on
/// success or a complete error message on failure.
pub(crate) async fn handle_invalidation(
    client: &dyn Querier,
    invalidates: Option<&str>,
    node_id: &str,
) -> Result<String, String> {
    let Some(old_id) = invalidates.filter(|s| !s.is_empty()) else {
        return Ok(String::new());
    };
    if !old_id.starts_with("fact:") {
        return Err(format!(
            "invalidates must reference a fact ID (got {old_id:?})"
        ));
    }
    let reason = format!("Replaced by {node_id}");
    client
        .invalidate_fact(old_id, node_id, &reason)
        .await
        .map_err(|e| format!("Failed to invalidate fact {old_id}: {e}"))?;
    Ok(format!("\nInvalidated: [{old_id}]\nReason: {reason}"))
}

/// Create the requested edges from a freshly stored node. Returns one line
/// per attempt; bad edge names and per-edge failures are noted, not fatal.
pub(crate) async fn store_relationships(
    client: &dyn Querier,
    source_node_id: &str,
    rels: &[RelationshipSpec],
) -> String {
    let mut out = String::new();
    for rel in rels {
        let Some(target_id) = rel.target_id.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        if rel.edge.is_empty() {
            continue;
        }

        let Some(fields) = build_edge_fields(&rel.edge, source_node_id, target_id, rel.role.as_deref())
        else {
            out.push_str(&format!("- Skipped invalid edge type: {}\n", rel.edge));
            continue;
        };

        match client.add_relationship(&rel.edge, &fields).await {
            Ok(()) => out.push_str(&format!("- {} -> [{target_id}]\n", rel.edge)),
            Err(e) => out.push_str(&format!("- Failed {} -> [{target_id}]: {e}\n", rel.edge)),
        }
    }
    out
}

/// Map an edge name onto its field map, with the stored node as the source
/// endpoint. Returns `None` for unknown edge names.
fn build_edge_fields(
    edge: &str,
    source_id: &str,
    target_id: &str,
    role: Option<&str>,
) -> Option<BTreeMap<String, String>> {
    let mut fields = BTreeMap::new();
    match edge {
        "fact_entity" => {
            fields.insert("fact_id".into(), source_id.into());
            fields.insert("entity_id".into(), target_id.into());
        }
        "fact_topic" => {
            fields.insert("fact_id".into(), source_id.into());
            fields.insert("topic_id".into(), target_id.into());
        }
        "decision_topic" => {
            fields.insert("decision_id".into(), source_id.into());
            fields.insert("topic_id".into(), target_id.into());
        }
        "decision_entity" => {
            fields.insert("decision_id".into(), source_id.into());
            fields.insert("entity_id".into(), target_id.into());
            if let Some(role) = role.filter(|r| !r.is_empty()) {
                fields.insert("role".into(), role.into());
            }
        }
        "event_decision" => {
            fields.insert("event_id".into(), source_id.into());
            fields.insert("decision_id".into(), target_id.into());
        }
        "entity_topic" => {
            fields.insert("entity_id".into(), source_id.into());
            fields.insert("topic_id".into(), target_id.into());
        }
        _ => return None,
    }
    Some(fields)
}
