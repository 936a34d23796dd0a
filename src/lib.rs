//! # voxsql - voice-style Postgres assistant
//!
//! Wires a text/voice assistant to a tool-calling LLM (Google Gemini) and a
//! Postgres database over the Model Context Protocol.
//!
//! ## Architecture
//!
//! Two processes share this library:
//!
//! 1. **Host** (`voxsql-server`): an MCP server exposing arithmetic tools, a
//!    read-only-by-convention `query` tool, and a live database schema
//!    resource.
//! 2. **Orchestrator** (`voxsql-client`): a REPL that, per user line, fetches
//!    the schema resource, asks Gemini to draft a SQL-oriented response, asks
//!    it again to pick and invoke a tool, then asks it to rephrase the result
//!    in plain spoken language.
//!
//! ### Core Types
//!
//! - **`Client`**: trait for making requests to LLM providers.
//! - **`Provider`**: factory trait for creating clients.
//! - **`McpServer`**: the protocol session as seen by the orchestrator.
//! - **`AssistantService`**: the rmcp server handler backing the host.
//! - **`Orchestrator`**: the per-turn state machine.
//!
//! ## Example
//! ```no_run
//! use voxsql::orchestrator::{Orchestrator, TurnLog};
//! use voxsql::providers::{Gemini, Provider};
//! use rmcp::transport::StreamableHttpClientTransport;
//! use rmcp::ServiceExt;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Gemini::create("your-api-key".into(), "gemini-2.0-flash".into());
//! let transport = StreamableHttpClientTransport::from_uri("http://127.0.0.1:8000/mcp");
//! let session = ().serve(transport).await?;
//!
//! let orchestrator = Orchestrator::connect(client, Box::new(session)).await?;
//! let mut log = TurnLog::default();
//! let reply = orchestrator.run_turn("how many employees are on sick leave", &mut log).await?;
//! println!("{}", reply);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod mcp;
pub mod model;
pub mod options;
pub mod orchestrator;
pub mod providers;
pub mod schema;
pub mod service;

pub use client::{Client, ClientError};
pub use mcp::{McpError, McpServer};
pub use model::{Message, Part, Response};
pub use orchestrator::{Orchestrator, TurnError, TurnLog};
pub use service::AssistantService;

// Re-export rmcp for convenience
pub use rmcp;
