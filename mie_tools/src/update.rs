//! The `mie_update` operation: invalidate a fact, update an entity
//! description, or change a decision status.

use crate::params::UpdateParams;
use crate::{Querier, ToolResult};

/// Modify an existing node through one of the three supported actions.
pub async fn update(client: &dyn Querier, params: UpdateParams) -> ToolResult {
    if params.node_id.is_empty() {
        return ToolResult::error("Missing required parameter: node_id");
    }
    if params.action.is_empty() {
        return ToolResult::error("Missing required parameter: action");
    }

    match params.action.as_str() {
        "invalidate" => {
            let Some(replacement_id) = params.replacement_id.as_deref().filter(|s| !s.is_empty())
            else {
                return ToolResult::error("replacement_id is required for invalidate");
            };
            let Some(reason) = params.reason.as_deref().filter(|s| !s.is_empty()) else {
                return ToolResult::error("reason is required for invalidate");
            };
            match client
                .invalidate_fact(&params.node_id, replacement_id, reason)
                .await
            {
                Ok(()) => ToolResult::ok(format!(
                    "Invalidated fact [{}]\nReplaced by: [{replacement_id}]\nReason: {reason}",
                    params.node_id
                )),
                Err(e) => {
                    ToolResult::error(format!("Failed to invalidate fact {}: {e}", params.node_id))
                }
            }
        }

        "update_description" => {
            let Some(new_value) = params.new_value.as_deref().filter(|s| !s.is_empty()) else {
                return ToolResult::error("new_value is required for update_description");
            };
            match client.update_description(&params.node_id, new_value).await {
                Ok(()) => ToolResult::ok(format!("Updated description of [{}]", params.node_id)),
                Err(e) => ToolResult::error(format!(
                    "Failed to update description of {}: {e}",
                    params.node_id
                )),
            }
        }

        "update_status" => {
            let Some(new_value) = params.new_value.as_deref().filter(|s| !s.is_empty()) else {
                return ToolResult::error("new_value is required for update_status");
            };
            match client.update_status(&params.node_id, new_value).await {
                Ok(()) => ToolResult::ok(format!(
                    "Updated status of [{}] to {new_value}",
                    params.node_id
                )),
                Err(e) => ToolResult::error(format!(
                    "Failed to update status of {}: {e}",
                    params.node_id
                )),
            }
        }

        other => ToolResult::error(format!(
            "Invalid action {other:?}. Must be one of: invalidate, update_description, update_status"
        )),
    }
}
