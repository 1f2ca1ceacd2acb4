//! Tool contract for the gateway
//!
//! Declares the `search`, `read` and `recommend` tools with their JSON input
//! schemas and dispatches calls by name.

use crate::client::Gateway;
use crate::error::GatewayError;
use crate::types::{ReadRequest, RecommendRequest, SearchRequest};
use crate::{READ_DESCRIPTION, RECOMMEND_DESCRIPTION, SEARCH_DESCRIPTION, TOOL_LLMTXT};
use schemars::schema_for;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Name of the search tool
pub const SEARCH_TOOL: &str = "search";
/// Name of the read tool
pub const READ_TOOL: &str = "read";
/// Name of the recommend tool
pub const RECOMMEND_TOOL: &str = "recommend";

/// Declaration of one tool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

/// Result of a tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Markdown text, from `read`
    Text(String),
    /// Structured records, from `search` and `recommend`
    Json(serde_json::Value),
}

impl ToolOutput {
    fn json<T: Serialize>(value: &T) -> Result<Self, GatewayError> {
        serde_json::to_value(value)
            .map(ToolOutput::Json)
            .map_err(|e| GatewayError::InvalidPayload(e.to_string()))
    }

    /// Render as text, pretty-printing JSON
    pub fn into_text(self) -> String {
        match self {
            ToolOutput::Text(text) => text,
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}

/// The gateway exposed as a set of named tools
#[derive(Clone, Default)]
pub struct Tool {
    gateway: Gateway,
}

impl Tool {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Get full documentation (llmtxt)
    pub fn llmtxt(&self) -> &'static str {
        TOOL_LLMTXT
    }

    /// Declarations for every tool, in a stable order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: SEARCH_TOOL,
                description: SEARCH_DESCRIPTION,
                input_schema: schema_value(schema_for!(SearchRequest)),
            },
            ToolDefinition {
                name: READ_TOOL,
                description: READ_DESCRIPTION,
                input_schema: schema_value(schema_for!(ReadRequest)),
            },
            ToolDefinition {
                name: RECOMMEND_TOOL,
                description: RECOMMEND_DESCRIPTION,
                input_schema: schema_value(schema_for!(RecommendRequest)),
            },
        ]
    }

    /// Call a tool by name with JSON arguments
    pub async fn call(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, GatewayError> {
        match name {
            SEARCH_TOOL => {
                let req: SearchRequest = parse_arguments(arguments)?;
                ToolOutput::json(&self.gateway.search(req).await?)
            }
            READ_TOOL => {
                let req: ReadRequest = parse_arguments(arguments)?;
                Ok(ToolOutput::Text(self.gateway.read(req).await?))
            }
            RECOMMEND_TOOL => {
                let req: RecommendRequest = parse_arguments(arguments)?;
                ToolOutput::json(&self.gateway.recommend(req).await?)
            }
            other => Err(GatewayError::InvalidArgument(format!(
                "Unknown tool: {}",
                other
            ))),
        }
    }
}

fn schema_value(schema: schemars::schema::RootSchema) -> serde_json::Value {
    serde_json::to_value(schema).unwrap_or_default()
}

fn parse_arguments<T: DeserializeOwned>(arguments: serde_json::Value) -> Result<T, GatewayError> {
    serde_json::from_value(arguments).map_err(|e| GatewayError::InvalidArgument(e.to_string()))
}
