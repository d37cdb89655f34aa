//! MCP (Model Context Protocol) server for MIE.
//!
//! Exposes the memory graph to AI agents over stdio JSON-RPC:
//! - `mie_analyze` — surface related memory for a conversation fragment
//! - `mie_store` / `mie_bulk_store` — persist nodes and relationships
//! - `mie_query` — semantic, exact, and graph retrieval
//! - `mie_update` — invalidation and in-place updates
//! - `mie_list` — filtered listing
//! - `mie_conflicts` — contradiction scan
//! - `mie_export` — full graph export
//! - `mie_status` — health and statistics
//!
//! plus the `mie://context/recent` resource with a plain-text digest of the
//! latest facts, decisions, and entities.

use std::sync::Arc;

use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};

use mie_core::{ListOptions, MemoryClient};
use mie_tools::{
    AnalyzeParams, BulkStoreParams, ConflictsParams, ExportParams, ListParams, QueryParams,
    StoreParams, ToolResult, UpdateParams,
};

const RECENT_CONTEXT_URI: &str = "mie://context/recent";

/// Instructions sent to agents on initialize.
const MIE_INSTRUCTIONS: &str = "\
MIE (Memory Intelligence Engine) gives you persistent memory across \
conversations. Use it to remember facts, decisions, entities, events, and \
topics about the user and their projects.

## When to capture memory

At the end of meaningful conversations, call mie_analyze with a summary of \
what was discussed. It identifies what is worth storing and returns related \
existing memories. Then use mie_store or mie_bulk_store to persist.

## When to query memory

Before answering questions about past decisions, user preferences, project \
context, or previously discussed topics, query MIE first with mie_query.

## What to store

- Architecture and design decisions (with rationale and alternatives)
- Technology choices and preferences
- Project facts (team structure, conventions, deployment targets)
- Important events (releases, migrations, incidents)
- Entities: people, companies, projects, technologies the user works with

## What NOT to store

- Transient debugging details or one-off troubleshooting steps
- Code snippets or file contents (store the decision, not the code)
- Information the user explicitly asks you not to remember

## Importing from files or git history

When asked to import knowledge from files or a repository's history, read \
the sources with your own tools, extract facts, decisions, entities, and \
events yourself, and persist them with mie_bulk_store. Link items in the \
same batch with target_ref (0-based index into the items array) instead of \
node IDs.";

fn into_call_result(result: ToolResult) -> CallToolResult {
    if result.is_error {
        CallToolResult::error(vec![Content::text(result.text)])
    } else {
        CallToolResult::success(vec![Content::text(result.text)])
    }
}

/// The MIE MCP server wrapping a shared memory client.
#[derive(Clone)]
pub struct MieMcpServer {
    client: Arc<MemoryClient>,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MieMcpServer {
    pub fn new(client: Arc<MemoryClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        name = "mie_analyze",
        description = "Analyze a conversation fragment for potential memory storage. Returns related existing memory and an evaluation guide for deciding what to persist. Call at the end of meaningful conversations or when noticing something worth remembering."
    )]
    async fn analyze(
        &self,
        params: Parameters<AnalyzeParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            mie_tools::analyze(self.client.as_ref(), params.0).await,
        ))
    }

    #[tool(
        name = "mie_store",
        description = "Store a new memory node (fact, decision, entity, event, or topic) in the memory graph, optionally with relationships to existing nodes and an invalidation of a superseded fact."
    )]
    async fn store(&self, params: Parameters<StoreParams>) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            mie_tools::store(self.client.as_ref(), params.0).await,
        ))
    }

    #[tool(
        name = "mie_bulk_store",
        description = "Store multiple memory nodes in a single call (max 50). Preferred over repeated mie_store calls when importing. Supports intra-batch relationships via target_ref (0-based index into the items array)."
    )]
    async fn bulk_store(
        &self,
        params: Parameters<BulkStoreParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            mie_tools::bulk_store(self.client.as_ref(), params.0).await,
        ))
    }

    #[tool(
        name = "mie_query",
        description = "Search the memory graph. Modes: 'semantic' (natural language similarity), 'exact' (substring match), 'graph' (traverse relationships from a node via node_id and traversal)."
    )]
    async fn query(&self, params: Parameters<QueryParams>) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            mie_tools::query(self.client.as_ref(), params.0).await,
        ))
    }

    #[tool(
        name = "mie_update",
        description = "Update or invalidate existing memory nodes. Facts are invalidated into a chain (old fact marked invalid, linked to its replacement); entities get description updates; decisions get status changes."
    )]
    async fn update(&self, params: Parameters<UpdateParams>) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            mie_tools::update(self.client.as_ref(), params.0).await,
        ))
    }

    #[tool(
        name = "mie_list",
        description = "List memory nodes with filtering, pagination, and sorting."
    )]
    async fn list(&self, params: Parameters<ListParams>) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            mie_tools::list(self.client.as_ref(), params.0).await,
        ))
    }

    #[tool(
        name = "mie_conflicts",
        description = "Detect potentially contradicting facts: pairs that are semantically similar but may disagree. Use to keep memory consistent."
    )]
    async fn conflicts(
        &self,
        params: Parameters<ConflictsParams>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            mie_tools::conflicts(self.client.as_ref(), params.0).await,
        ))
    }

    #[tool(
        name = "mie_export",
        description = "Export the memory graph for backup or migration, as JSON or replayable datalog."
    )]
    async fn export(&self, params: Parameters<ExportParams>) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(
            mie_tools::export(self.client.as_ref(), params.0).await,
        ))
    }

    #[tool(
        name = "mie_status",
        description = "Display memory graph health and statistics: node counts, configuration, and usage."
    )]
    async fn status(&self) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(mie_tools::status(self.client.as_ref()).await))
    }
}

#[tool_handler]
impl ServerHandler for MieMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: "mie".to_string(),
                title: Some("MIE Memory Intelligence Engine".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(MIE_INSTRUCTIONS.to_string()),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let mut resource = RawResource::new(RECENT_CONTEXT_URI, "Recent memory context");
        resource.description =
            Some("Latest facts, decisions, and entities from the memory graph".to_string());
        resource.mime_type = Some("text/plain".to_string());
        Ok(ListResourcesResult {
            resources: vec![resource.no_annotation()],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        if request.uri != RECENT_CONTEXT_URI {
            return Err(McpError::resource_not_found(
                "unknown resource",
                Some(serde_json::json!({ "uri": request.uri })),
            ));
        }
        let text = recent_context(&self.client).await;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}

/// Plain-text digest of the most recent facts, decisions, and entities.
async fn recent_context(client: &MemoryClient) -> String {
    let mut out = String::from("# Recent Memory Context\n\n");
    let base_len = out.len();

    if let Ok((facts, _)) = client
        .list_nodes(ListOptions {
            node_type: "fact".into(),
            valid_only: true,
            limit: 5,
            sort_by: "created_at".into(),
            sort_order: "desc".into(),
            ..Default::default()
        })
        .await
    {
        if !facts.is_empty() {
            out.push_str("## Recent Facts\n");
            for node in &facts {
                if let Some(f) = node.as_fact() {
                    out.push_str(&format!("- [{}] {}\n", f.category, f.content));
                }
            }
            out.push('\n');
        }
    }

    if let Ok((decisions, _)) = client
        .list_nodes(ListOptions {
            node_type: "decision".into(),
            limit: 3,
            sort_by: "created_at".into(),
            sort_order: "desc".into(),
            ..Default::default()
        })
        .await
    {
        if !decisions.is_empty() {
            out.push_str("## Recent Decisions\n");
            for node in &decisions {
                if let Some(d) = node.as_decision() {
                    out.push_str(&format!("- {}: {}\n", d.title, d.rationale));
                }
            }
            out.push('\n');
        }
    }

    if let Ok((entities, _)) = client
        .list_nodes(ListOptions {
            node_type: "entity".into(),
            limit: 5,
            sort_by: "created_at".into(),
            sort_order: "desc".into(),
            ..Default::default()
        })
        .await
    {
        if !entities.is_empty() {
            out.push_str("## Known Entities\n");
            for node in &entities {
                if let Some(e) = node.as_entity() {
                    let desc = if e.description.is_empty() {
                        &e.kind
                    } else {
                        &e.description
                    };
                    out.push_str(&format!("- {} ({desc})\n", e.name));
                }
            }
            out.push('\n');
        }
    }

    if out.len() == base_len {
        out.push_str("No memories stored yet.\n");
    }
    out
}
