//! The `mie_list` operation: filtered, sorted, paginated node listing.

use mie_core::{ListOptions, Node};

use crate::params::ListParams;
use crate::{truncate, Querier, ToolResult};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// List nodes of one variant with a count footer.
pub async fn list(client: &dyn Querier, params: ListParams) -> ToolResult {
    if params.node_type.is_empty() {
        return ToolResult::error("Missing required parameter: node_type");
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;
    let offset = params.offset.unwrap_or(0).max(0) as usize;

    let opts = ListOptions {
        node_type: params.node_type.clone(),
        category: params.category.clone().unwrap_or_default(),
        kind: params.kind.clone().unwrap_or_default(),
        status: params.status.clone().unwrap_or_default(),
        valid_only: params.valid_only.unwrap_or(true),
        limit,
        offset,
        sort_by: params.sort_by.clone().unwrap_or_default(),
        sort_order: params.sort_order.clone().unwrap_or_default(),
    };

    let (nodes, total) = match client.list_nodes(opts).await {
        Ok(result) => result,
        Err(e) => return ToolResult::error(format!("Failed to list nodes: {e}")),
    };

    let mut out = format!(
        "## Memory List: {} ({} of {total} shown)\n\n",
        params.node_type, nodes.len()
    );
    if nodes.is_empty() {
        out.push_str("_No matching nodes found._\n");
        return ToolResult::ok(out);
    }

    for (i, node) in nodes.iter().enumerate() {
        out.push_str(&render_node_line(i + offset + 1, node));
    }

    if total > offset + nodes.len() {
        out.push_str(&format!(
            "\n_{} more; use offset={} for the next page._\n",
            total - offset - nodes.len(),
            offset + nodes.len()
        ));
    }

    ToolResult::ok(out)
}

fn render_node_line(position: usize, node: &Node) -> String {
    match node {
        Node::Fact(f) => {
            let valid_str = if f.valid { "valid" } else { "invalidated" };
            format!(
                "{position}. [{}] {:?} ({}, confidence: {:.1}, {valid_str})\n",
                f.id,
                truncate(&f.content, 100),
                f.category,
                f.confidence
            )
        }
        Node::Decision(d) => format!(
            "{position}. [{}] {:?} (status: {})\n",
            d.id,
            truncate(&d.title, 100),
            d.status
        ),
        Node::Entity(e) => format!(
            "{position}. [{}] {:?} (kind: {})\n",
            e.id, e.name, e.kind
        ),
        Node::Event(e) => format!(
            "{position}. [{}] {:?} (date: {})\n",
            e.id,
            truncate(&e.title, 100),
            e.event_date
        ),
        Node::Topic(t) => format!("{position}. [{}] {:?}\n", t.id, t.name),
    }
}
