//! The `mie_export` operation: dump the graph as JSON or as replayable
//! CozoScript.

use mie_core::storage::{float_lit, str_lit};
use mie_core::{ExportData, ExportOptions};

use crate::params::ExportParams;
use crate::{Querier, ToolResult};

/// Export the selected node variants in the versioned envelope.
pub async fn export(client: &dyn Querier, params: ExportParams) -> ToolResult {
    let format = params.format.as_deref().unwrap_or("json");
    if format != "json" && format != "datalog" {
        return ToolResult::error(format!(
            "Invalid format {format:?}. Must be one of: json, datalog"
        ));
    }

    let opts = ExportOptions {
        format: format.to_string(),
        include_embeddings: params.include_embeddings.unwrap_or(false),
        node_types: params.node_types.clone().unwrap_or_default(),
    };

    let data = match client.export_graph(opts).await {
        Ok(data) => data,
        Err(e) => return ToolResult::error(format!("Export failed: {e}")),
    };

    match format {
        "datalog" => ToolResult::ok(render_datalog(&data)),
        _ => match serde_json::to_string_pretty(&data) {
            Ok(json) => ToolResult::ok(json),
            Err(e) => ToolResult::error(format!("Cannot encode export: {e}")),
        },
    }
}

/// Render the export as CozoScript `:put` batches, one block per non-empty
/// relation, replayable against a freshly initialized database.
fn render_datalog(data: &ExportData) -> String {
    let mut out = format!("# MIE export v{} at {}\n", data.version, data.exported_at);

    if !data.facts.is_empty() {
        let rows: Vec<String> = data
            .facts
            .iter()
            .map(|f| {
                format!(
                    "[{}, {}, {}, {}, {}, {}, {}, {}, {}]",
                    str_lit(&f.id),
                    str_lit(&f.content),
                    str_lit(&f.category),
                    float_lit(f.confidence),
                    str_lit(&f.source_agent),
                    str_lit(&f.source_conversation),
                    f.valid,
                    f.created_at,
                    f.updated_at
                )
            })
            .collect();
        out.push_str(&put_block(
            "mie_fact",
            "id, content, category, confidence, source_agent, source_conversation, valid, created_at, updated_at",
            "id => content, category, confidence, source_agent, source_conversation, valid, created_at, updated_at",
            &rows,
        ));
    }

    if !data.decisions.is_empty() {
        let rows: Vec<String> = data
            .decisions
            .iter()
            .map(|d| {
                format!(
                    "[{}, {}, {}, {}, {}, {}, {}, {}, {}, {}]",
                    str_lit(&d.id),
                    str_lit(&d.title),
                    str_lit(&d.rationale),
                    str_lit(&d.alternatives),
                    str_lit(&d.context),
                    str_lit(&d.source_agent),
                    str_lit(&d.source_conversation),
                    str_lit(&d.status),
                    d.created_at,
                    d.updated_at
                )
            })
            .collect();
        out.push_str(&put_block(
            "mie_decision",
            "id, title, rationale, alternatives, context, source_agent, source_conversation, status, created_at, updated_at",
            "id => title, rationale, alternatives, context, source_agent, source_conversation, status, created_at, updated_at",
            &rows,
        ));
    }

    if !data.entities.is_empty() {
        let rows: Vec<String> = data
            .entities
            .iter()
            .map(|e| {
                format!(
                    "[{}, {}, {}, {}, {}, {}, {}]",
                    str_lit(&e.id),
                    str_lit(&e.name),
                    str_lit(&e.kind),
                    str_lit(&e.description),
                    str_lit(&e.source_agent),
                    e.created_at,
                    e.updated_at
                )
            })
            .collect();
        out.push_str(&put_block(
            "mie_entity",
            "id, name, kind, description, source_agent, created_at, updated_at",
            "id => name, kind, description, source_agent, created_at, updated_at",
            &rows,
        ));
    }

    if !data.events.is_empty() {
        let rows: Vec<String> = data
            .events
            .iter()
            .map(|e| {
                format!(
                    "[{}, {}, {}, {}, {}, {}, {}, {}]",
                    str_lit(&e.id),
                    str_lit(&e.title),
                    str_lit(&e.description),
                    str_lit(&e.event_date),
                    str_lit(&e.source_agent),
                    str_lit(&e.source_conversation),
                    e.created_at,
                    e.updated_at
                )
            })
            .collect();
        out.push_str(&put_block(
            "mie_event",
            "id, title, description, event_date, source_agent, source_conversation, created_at, updated_at",
            "id => title, description, event_date, source_agent, source_conversation, created_at, updated_at",
            &rows,
        ));
    }

    if !data.topics.is_empty() {
        let rows: Vec<String> = data
            .topics
            .iter()
            .map(|t| {
                format!(
                    "[{}, {}, {}, {}, {}]",
                    str_lit(&t.id),
                    str_lit(&t.name),
                    str_lit(&t.description),
                    t.created_at,
                    t.updated_at
                )
            })
            .collect();
        out.push_str(&put_block(
            "mie_topic",
            "id, name, description, created_at, updated_at",
            "id => name, description, created_at, updated_at",
            &rows,
        ));
    }

    for (edge_name, entries) in &data.relationships {
        if entries.is_empty() {
            continue;
        }
        let Some(first) = entries[0].as_object() else {
            continue;
        };
        let cols: Vec<&String> = first.keys().collect();
        let head: Vec<String> = cols.iter().map(|c| c.to_string()).collect();
        let rows: Vec<String> = entries
            .iter()
            .filter_map(|entry| {
                let obj = entry.as_object()?;
                let vals: Vec<String> = cols
                    .iter()
                    .map(|c| str_lit(obj.get(*c).and_then(|v| v.as_str()).unwrap_or_default()))
                    .collect();
                Some(format!("[{}]", vals.join(", ")))
            })
            .collect();
        let spec = match edge_name.as_str() {
            "decision_entity" => "decision_id, entity_id => role".to_string(),
            "invalidates" => "new_fact_id, old_fact_id => reason".to_string(),
            _ => head.join(", "),
        };
        out.push_str(&put_block(
            &format!("mie_{edge_name}"),
            &head.join(", "),
            &spec,
            &rows,
        ));
    }

    out
}

fn put_block(table: &str, head: &str, spec: &str, rows: &[String]) -> String {
    format!(
        "\n?[{head}] <- [\n    {}\n] :put {table} {{{spec}}}\n",
        rows.join(",\n    ")
    )
}
