//! Client-side seam over an MCP session.
//!
//! The orchestrator talks to the tool host through the `McpServer` trait, which
//! is implemented for any running `rmcp` client session. Tests substitute a
//! stub implementation.

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ErrorCode, GetPromptRequestParam, GetPromptResult,
    Prompt, RawContent, ReadResourceRequestParam, ReadResourceResult, Resource, ResourceContents,
    Tool,
};
use rmcp::service::{RoleClient, RunningService, ServiceError};
use rmcp::ClientHandler;
use serde_json::Value;
use std::ops::Deref;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("MCP error: {0}")]
    Mcp(String),
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}

/// The protocol session as seen by the orchestrator.
#[async_trait]
pub trait McpServer: Send + Sync {
    /// List available tools.
    async fn list_tools(&self) -> Result<Vec<Tool>, McpError>;

    /// Execute a tool.
    async fn call_tool(&self, name: String, args: Value) -> Result<CallToolResult, McpError>;

    /// List available resources.
    async fn list_resources(&self) -> Result<Vec<Resource>, McpError>;

    /// Read a resource by URI.
    async fn read_resource(&self, uri: String) -> Result<ReadResourceResult, McpError>;

    /// List available prompts.
    async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError>;

    /// Get a prompt by name.
    async fn get_prompt(
        &self,
        name: String,
        args: Option<serde_json::Map<String, Value>>,
    ) -> Result<GetPromptResult, McpError>;
}

#[async_trait]
impl<S: ClientHandler + Send + Sync> McpServer for RunningService<RoleClient, S> {
    async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        let result = self
            .deref()
            .list_tools(None)
            .await
            .map_err(|e| McpError::Mcp(e.to_string()))?;
        Ok(result.tools)
    }

    async fn call_tool(&self, name: String, args: Value) -> Result<CallToolResult, McpError> {
        let params = CallToolRequestParam {
            name: name.into(),
            arguments: args.as_object().cloned(),
        };

        self.deref()
            .call_tool(params)
            .await
            .map_err(|e| McpError::Mcp(e.to_string()))
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
        let result = self
            .deref()
            .list_resources(None)
            .await
            .map_err(|e| McpError::Mcp(e.to_string()))?;
        Ok(result.resources)
    }

    async fn read_resource(&self, uri: String) -> Result<ReadResourceResult, McpError> {
        let params = ReadResourceRequestParam { uri: uri.clone() };
        self.deref()
            .read_resource(params)
            .await
            .map_err(|e| map_resource_error(uri, e))
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
        let result = self
            .deref()
            .list_prompts(None)
            .await
            .map_err(|e| McpError::Mcp(e.to_string()))?;
        Ok(result.prompts)
    }

    async fn get_prompt(
        &self,
        name: String,
        args: Option<serde_json::Map<String, Value>>,
    ) -> Result<GetPromptResult, McpError> {
        let params = GetPromptRequestParam {
            name: name.into(),
            arguments: args,
        };
        self.deref()
            .get_prompt(params)
            .await
            .map_err(|e| McpError::Mcp(e.to_string()))
    }
}

fn map_resource_error(uri: String, e: ServiceError) -> McpError {
    match e {
        ServiceError::McpError(data) if data.code == ErrorCode::RESOURCE_NOT_FOUND => {
            McpError::ResourceNotFound(uri)
        }
        other => McpError::Mcp(other.to_string()),
    }
}

/// First text content part of a tool result, if any.
pub fn first_tool_text(result: &CallToolResult) -> Option<&str> {
    result.content.iter().find_map(|content| match &content.raw {
        RawContent::Text(text_content) => Some(text_content.text.as_str()),
        _ => None,
    })
}

/// First text payload of a resource read, if any.
pub fn first_resource_text(result: &ReadResourceResult) -> Option<&str> {
    result.contents.iter().find_map(|content| match content {
        ResourceContents::TextResourceContents { text, .. } => Some(text.as_str()),
        _ => None,
    })
}
