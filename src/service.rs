//! MCP tool/resource host.
//!
//! Exposes the arithmetic tools, the SQL `query` tool, the schema resource,
//! a static resource, a templated greeting resource, and two reusable
//! prompts. Tool dispatch is a closed table: the router only routes names it
//! knows, and arguments are deserialized against the declared parameter
//! schema before any handler runs.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        AnnotateAble, CallToolResult, Content, ErrorData, GetPromptRequestParam, GetPromptResult,
        ListPromptsResult, ListResourcesResult, PaginatedRequestParam, Prompt, PromptArgument,
        PromptMessage, PromptMessageRole, RawResource, ReadResourceRequestParam,
        ReadResourceResult, Resource,
        ResourceContents, ServerCapabilities, ServerInfo,
    },
    schemars,
    service::{RequestContext, RoleServer},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::Deserialize;
use serde_json::json;

use crate::{db, schema};

pub const SCHEMA_URI: &str = "resource://schema";
pub const STATIC_URI: &str = "resource://static-info";
pub const GREETING_PREFIX: &str = "greeting://";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MathArgs {
    #[schemars(description = "First operand")]
    pub a: i64,
    #[schemars(description = "Second operand")]
    pub b: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct QueryArgs {
    #[schemars(description = "The SQL statement to execute")]
    pub sql: String,
}

/// The tool/resource host backing the assistant.
#[derive(Clone)]
pub struct AssistantService {
    database_url: String,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AssistantService {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Add two numbers")]
    fn add(&self, Parameters(MathArgs { a, b }): Parameters<MathArgs>) -> String {
        tracing::info!("adding {} and {}", a, b);
        (a + b).to_string()
    }

    #[tool(description = "Subtract two numbers")]
    fn subtract(&self, Parameters(MathArgs { a, b }): Parameters<MathArgs>) -> String {
        tracing::info!("subtracting {} and {}", a, b);
        (a - b).to_string()
    }

    #[tool(description = "Multiply two numbers")]
    fn multiply(&self, Parameters(MathArgs { a, b }): Parameters<MathArgs>) -> String {
        tracing::info!("multiplying {} and {}", a, b);
        (a * b).to_string()
    }

    /// Read-only by convention only: the SQL runs verbatim inside a
    /// transaction that is always rolled back, with no statement inspection.
    #[tool(name = "query", description = "Run a read-only SQL query")]
    async fn query(
        &self,
        Parameters(QueryArgs { sql }): Parameters<QueryArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        let rows = db::run_query(&self.database_url, &sql)
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(rows)]))
    }
}

#[tool_handler]
impl ServerHandler for AssistantService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "voxsql-server".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            instructions: Some(
                "Arithmetic and SQL tools plus a database schema resource for a \
                 voice-style assistant."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let mut schema_resource = RawResource::new(SCHEMA_URI, "schema");
        schema_resource.description =
            Some("Schema of the connected database as JSON".to_string());
        schema_resource.mime_type = Some("application/json".to_string());

        let mut static_resource = RawResource::new(STATIC_URI, "static-info");
        static_resource.description = Some("Static resource data".to_string());
        static_resource.mime_type = Some("text/plain".to_string());

        Ok(ListResourcesResult {
            resources: vec![
                schema_resource.no_annotation(),
                static_resource.no_annotation(),
            ],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let uri = request.uri;

        if uri == SCHEMA_URI {
            tracing::debug!("introspecting database schema");
            let snapshot = schema::introspect(&self.database_url)
                .await
                .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
            let text = serde_json::to_string_pretty(&snapshot)
                .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
            return Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(text, uri)],
            });
        }

        if uri == STATIC_URI {
            return Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(
                    "Any static data can be returned",
                    uri,
                )],
            });
        }

        if let Some(name) = uri.strip_prefix(GREETING_PREFIX) {
            let greeting = format!("Hello, {}!", name);
            return Ok(ReadResourceResult {
                contents: vec![ResourceContents::text(greeting, uri)],
            });
        }

        Err(ErrorData::resource_not_found(
            format!("resource not found: {}", uri),
            Some(json!({ "uri": uri })),
        ))
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, ErrorData> {
        Ok(ListPromptsResult {
            prompts: vec![
                Prompt::new(
                    "review_code",
                    Some("Ask for a review of a piece of code"),
                    Some(vec![PromptArgument {
                        name: "code".to_string(),
                        title: None,
                        description: Some("The code to review".to_string()),
                        required: Some(true),
                    }]),
                ),
                Prompt::new(
                    "debug_error",
                    Some("Start a debugging conversation for an error"),
                    Some(vec![PromptArgument {
                        name: "error".to_string(),
                        title: None,
                        description: Some("The error message to debug".to_string()),
                        required: Some(true),
                    }]),
                ),
            ],
            next_cursor: None,
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, ErrorData> {
        let args = request.arguments.unwrap_or_default();
        let arg = |key: &str| {
            args.get(key)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };

        match request.name.as_str() {
            "review_code" => Ok(GetPromptResult {
                description: Some("Code review request".to_string()),
                messages: vec![PromptMessage::new_text(
                    PromptMessageRole::User,
                    format!("Please review this code:\n\n{}", arg("code")),
                )],
            }),
            "debug_error" => Ok(GetPromptResult {
                description: Some("Debugging conversation".to_string()),
                messages: vec![
                    PromptMessage::new_text(
                        PromptMessageRole::User,
                        "I'm seeing this error:".to_string(),
                    ),
                    PromptMessage::new_text(PromptMessageRole::User, arg("error")),
                    PromptMessage::new_text(
                        PromptMessageRole::Assistant,
                        "I'll help debug that. What have you tried so far?".to_string(),
                    ),
                ],
            }),
            other => Err(ErrorData::invalid_params(
                format!("prompt not found: {}", other),
                None,
            )),
        }
    }
}
