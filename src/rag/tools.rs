// src/rag/tools.rs — search_documentation tool for the assistant

use serde_json::json;

use super::{format_hits, hit_pages, DocumentIndex};
use crate::provider::{ToolCall, ToolDef};

pub const SEARCH_TOOL: &str = "search_documentation";

/// Upper bound on `n_results` a model may request.
const MAX_TOOL_RESULTS: usize = 10;

pub fn search_tool_def() -> ToolDef {
    ToolDef {
        name: SEARCH_TOOL.into(),
        description: "Search the indexed documentation and return the most relevant pages".into(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "What to look for" },
                "n_results": { "type": "integer", "description": "Number of pages to return (default 3)" }
            },
            "required": ["query"]
        }),
    }
}

/// Result of dispatching one tool call.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub content: String,
    pub pages: Vec<u32>,
}

/// Run a tool call against the index. Failures are reported back to the
/// model as text, never raised.
pub async fn dispatch_tool_call(
    index: &DocumentIndex,
    collection: &str,
    call: &ToolCall,
    default_n: usize,
) -> ToolOutput {
    if call.name != SEARCH_TOOL {
        return ToolOutput {
            content: format!("Error: unknown tool '{}'", call.name),
            pages: Vec::new(),
        };
    }

    let Some(query) = call.arguments.get("query").and_then(|v| v.as_str()) else {
        return ToolOutput {
            content: "Error: missing required argument 'query'".into(),
            pages: Vec::new(),
        };
    };
    let n = call
        .arguments
        .get("n_results")
        .and_then(|v| v.as_u64())
        .map(|n| (n as usize).clamp(1, MAX_TOOL_RESULTS))
        .unwrap_or(default_n);

    tracing::debug!(query, n, "search_documentation");
    match index.search(collection, query, n).await {
        Ok(hits) => ToolOutput {
            content: format_hits(&hits),
            pages: hit_pages(&hits),
        },
        Err(e) => ToolOutput {
            content: format!("Error: {e}"),
            pages: Vec::new(),
        },
    }
}
