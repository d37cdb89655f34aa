//! The `mie_bulk_store` operation: a two-phase batch write with intra-batch
//! reference resolution and partial-success semantics.

use crate::params::{BulkStoreParams, RelationshipSpec};
use crate::store::{handle_invalidation, store_node, store_relationships};
use crate::{Querier, ToolResult};

/// Upper bound on items per batch.
pub const MAX_BULK_ITEMS: usize = 50;

struct BulkItem {
    node_id: String,
    node_type: String,
}

/// Store up to [`MAX_BULK_ITEMS`] nodes, then wire their relationships and
/// invalidations. Item failures are recorded and never abort the batch.
pub async fn bulk_store(client: &dyn Querier, params: BulkStoreParams) -> ToolResult {
    if params.items.is_empty() {
        return ToolResult::error("items must be a non-empty array");
    }
    if params.items.len() > MAX_BULK_ITEMS {
        return ToolResult::error(format!(
            "Too many items: {} (max {MAX_BULK_ITEMS})",
            params.items.len()
        ));
    }

    // Phase A: store every node, remembering the id assigned per index.
    let mut stored: Vec<Option<BulkItem>> = Vec::with_capacity(params.items.len());
    let mut errors: Vec<String> = Vec::new();
    let mut type_counts: Vec<(&str, usize)> = Vec::new();

    for (i, item) in params.items.iter().enumerate() {
        if item.node_type.is_empty() {
            errors.push(format!("item[{i}]: missing required parameter: type"));
            stored.push(None);
            continue;
        }
        match store_node(client, item).await {
            Ok(Some((node_id, _summary))) => {
                count_type(&mut type_counts, &item.node_type);
                stored.push(Some(BulkItem {
                    node_id,
                    node_type: item.node_type.clone(),
                }));
            }
            Ok(None) => {
                errors.push(format!("item[{i}]: invalid type {:?}", item.node_type));
                stored.push(None);
            }
            Err(e) => {
                errors.push(format!("item[{i}] ({}): {e}", item.node_type));
                stored.push(None);
            }
        }
    }

    // Phase B: invalidations and relationships for the items that made it,
    // resolving target_ref indexes against the Phase A ids.
    let mut rel_messages: Vec<String> = Vec::new();
    for (i, item) in params.items.iter().enumerate() {
        let Some(entry) = &stored[i] else { continue };

        match handle_invalidation(client, item.invalidates.as_deref(), &entry.node_id).await {
            Ok(msg) if !msg.is_empty() => rel_messages.push(format!("item[{i}]{msg}")),
            Ok(_) => {}
            Err(e) => errors.push(format!("item[{i}] invalidation: {e}")),
        }

        if let Some(rels) = &item.relationships {
            let resolved = resolve_batch_refs(rels, &stored);
            let msg = store_relationships(client, &entry.node_id, &resolved).await;
            if !msg.is_empty() {
                rel_messages.push(format!("item[{i}]:\n{msg}"));
            }
        }
    }

    // Phase C: render the structured outcome.
    let total_stored: usize = type_counts.iter().map(|(_, c)| c).sum();
    let parts: Vec<String> = ordered_counts(&type_counts)
        .into_iter()
        .map(|(nt, c)| format!("{c} {nt}s"))
        .collect();

    let mut out = format!("Stored {total_stored} items: {}\n", parts.join(", "));

    for _ in 0..total_stored {
        let _ = client.increment_counter("total_stores").await;
    }

    out.push_str("\nIDs:\n");
    for (i, entry) in stored.iter().enumerate() {
        if let Some(entry) = entry {
            out.push_str(&format!(
                "  [{i}] {} [{}]\n",
                entry.node_type, entry.node_id
            ));
        }
    }

    if !rel_messages.is_empty() {
        out.push_str("\nRelationships:\n");
        for msg in &rel_messages {
            out.push_str(msg);
        }
    }

    if !errors.is_empty() {
        out.push_str(&format!("\nErrors ({}):\n", errors.len()));
        for e in &errors {
            out.push_str(&format!("  - {e}\n"));
        }
    }

    ToolResult::ok(out)
}

fn count_type<'a>(counts: &mut Vec<(&'a str, usize)>, node_type: &str) {
    let node_type = match node_type {
        "fact" => "fact",
        "decision" => "decision",
        "entity" => "entity",
        "event" => "event",
        _ => "topic",
    };
    for (nt, c) in counts.iter_mut() {
        if *nt == node_type {
            *c += 1;
            return;
        }
    }
    counts.push((node_type, 1));
}

fn ordered_counts<'a>(counts: &[(&'a str, usize)]) -> Vec<(&'a str, usize)> {
    let mut out = Vec::new();
    for nt in ["fact", "decision", "entity", "event", "topic"] {
        if let Some((_, c)) = counts.iter().find(|(name, _)| *name == nt) {
            out.push((nt, *c));
        }
    }
    out
}

/// Replace `target_ref` index references with the ids assigned in Phase A.
/// Out-of-range references and references to failed items are dropped.
fn resolve_batch_refs(
    rels: &[RelationshipSpec],
    stored: &[Option<BulkItem>],
) -> Vec<RelationshipSpec> {
    let mut resolved = Vec::with_capacity(rels.len());
    for rel in rels {
        match rel.target_ref {
            Some(idx) => {
                let Some(Some(target)) = stored.get(idx) else {
                    continue;
                };
                resolved.push(RelationshipSpec {
                    edge: rel.edge.clone(),
                    target_id: Some(target.node_id.clone()),
                    target_ref: None,
                    role: rel.role.clone(),
                });
            }
            None => resolved.push(rel.clone()),
        }
    }
    resolved
}
