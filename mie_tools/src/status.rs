//! The `mie_status` operation: graph health and statistics digest.

use crate::{Querier, ToolResult};

/// Render graph statistics, configuration, health, and usage sections.
pub async fn status(client: &dyn Querier) -> ToolResult {
    let stats = match client.get_stats().await {
        Ok(stats) => stats,
        Err(e) => return ToolResult::error(format!("Failed to get graph stats: {e}")),
    };

    let mut out = String::from("## MIE Memory Status\n\n");

    out.push_str("### Graph Statistics\n");
    out.push_str(&format!(
        "- Facts: {} ({} valid, {} invalidated)\n",
        stats.total_facts, stats.valid_facts, stats.invalidated_facts
    ));
    out.push_str(&format!(
        "- Decisions: {} ({} active, {} other)\n",
        stats.total_decisions,
        stats.active_decisions,
        stats.total_decisions.saturating_sub(stats.active_decisions)
    ));
    out.push_str(&format!("- Entities: {}\n", stats.total_entities));
    out.push_str(&format!("- Events: {}\n", stats.total_events));
    out.push_str(&format!("- Topics: {}\n", stats.total_topics));
    out.push_str(&format!("- Relationships: {} edges total\n", stats.total_edges));

    out.push_str("\n### Configuration\n");
    if !stats.storage_engine.is_empty() {
        out.push_str(&format!("- Storage: {}", stats.storage_engine));
        if !stats.storage_path.is_empty() {
            out.push_str(&format!(" ({})", stats.storage_path));
        }
        out.push('\n');
    }
    if client.embeddings_enabled() {
        out.push_str("- Embeddings: enabled\n");
    } else {
        out.push_str("- Embeddings: disabled\n");
    }
    if !stats.schema_version.is_empty() {
        out.push_str(&format!("- Schema version: {}\n", stats.schema_version));
    }

    out.push_str("\n### Health\n");
    let total_nodes = stats.total_facts
        + stats.total_decisions
        + stats.total_entities
        + stats.total_events
        + stats.total_topics;
    if total_nodes > 0 {
        out.push_str(&format!("- Database accessible ({total_nodes} total nodes)\n"));
    } else {
        out.push_str("- Database accessible (empty graph)\n");
    }
    if client.embeddings_enabled() {
        out.push_str("- Embeddings enabled\n");
    } else {
        out.push_str("- Embeddings disabled (semantic search unavailable)\n");
    }

    if stats.total_queries > 0 || stats.total_stores > 0 {
        out.push_str("\n### Usage\n");
        out.push_str(&format!("- Total queries: {}\n", stats.total_queries));
        out.push_str(&format!("- Total stores: {}\n", stats.total_stores));
        if stats.last_query_at > 0 {
            out.push_str(&format!("- Last query: {}\n", format_ts(stats.last_query_at)));
        }
        if stats.last_store_at > 0 {
            out.push_str(&format!("- Last store: {}\n", format_ts(stats.last_store_at)));
        }
    }

    ToolResult::ok(out)
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}
