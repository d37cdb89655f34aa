//! The `mie_conflicts` operation: scan for semantically near-duplicate facts.

use mie_core::{ConflictOptions, MemoryError};

use crate::params::ConflictsParams;
use crate::{truncate, Querier, ToolResult};

/// Report pairs of valid same-category facts above the similarity threshold.
pub async fn conflicts(client: &dyn Querier, params: ConflictsParams) -> ToolResult {
    let defaults = ConflictOptions::default();
    let opts = ConflictOptions {
        category: params.category.clone().unwrap_or_default(),
        threshold: params.threshold.unwrap_or(defaults.threshold),
        limit: params
            .limit
            .map(|l| l.clamp(1, 50) as usize)
            .unwrap_or(defaults.limit),
    };
    let threshold = opts.threshold;

    let found = match client.detect_conflicts(opts).await {
        Ok(found) => found,
        Err(MemoryError::EmbeddingsDisabled) => {
            return ToolResult::error(
                "Conflict detection requires embeddings to be enabled. Enable in config.",
            )
        }
        Err(e) => return ToolResult::error(format!("Conflict detection failed: {e}")),
    };

    if found.is_empty() {
        return ToolResult::ok(format!(
            "## Potential Conflicts\n\n_No conflicting facts found above {:.0}% similarity._\n",
            threshold * 100.0
        ));
    }

    let mut out = format!("## Potential Conflicts ({} found)\n\n", found.len());
    for (i, conflict) in found.iter().enumerate() {
        out.push_str(&format!(
            "{}. {:.0}% similar ({})\n   A: [{}] {:?}\n   B: [{}] {:?}\n",
            i + 1,
            conflict.similarity * 100.0,
            conflict.fact_a.category,
            conflict.fact_a.id,
            truncate(&conflict.fact_a.content, 100),
            conflict.fact_b.id,
            truncate(&conflict.fact_b.content, 100),
        ));
    }
    out.push_str(
        "\nReview each pair; invalidate the outdated fact with mie_update (action: invalidate).\n",
    );

    ToolResult::ok(out)
}
