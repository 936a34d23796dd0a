//! Three-step turn orchestration.
//!
//! One turn: fetch the schema resource, ask the model to draft a SQL-oriented
//! response, ask it again to pick and invoke a tool, then ask it a third time
//! to rephrase the result in plain spoken language. Every call is a single
//! blocking request; a failure at any step aborts the turn and the caller's
//! loop continues.

use std::collections::VecDeque;

use rmcp::model::Tool;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{Client, ClientError};
use crate::mcp::{first_resource_text, first_tool_text, McpError, McpServer};
use crate::model::Message;
use crate::service::SCHEMA_URI;

/// Fixed domain hint embedded in the SQL-drafting prompt.
const LEAVE_TYPE_HINT: &str = "The leave_type column contains Sick, Vacation, Personal, Comp Off";

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("schema resource unavailable: {0}")]
    Resource(McpError),
    #[error("tool invocation failed: {0}")]
    Tool(McpError),
    #[error("LLM request failed: {0}")]
    Llm(#[from] ClientError),
}

/// Bounded append-only diagnostic log of prompts and raw model responses.
///
/// Entries are never read back into prompts; once the retention cap is
/// reached the oldest entry is dropped.
#[derive(Debug)]
pub struct TurnLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl TurnLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.into());
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TurnLog {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Drives one user turn at a time against an LLM client and an MCP session.
pub struct Orchestrator<C: Client> {
    client: C,
    server: Box<dyn McpServer>,
    tools: Vec<Tool>,
}

impl<C: Client> Orchestrator<C> {
    /// Build an orchestrator, fetching the host's tool list once up front.
    pub async fn connect(client: C, server: Box<dyn McpServer>) -> Result<Self, McpError> {
        let tools = server.list_tools().await?;
        info!("connected to tool host with {} tools", tools.len());
        Ok(Self {
            client,
            server,
            tools,
        })
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Run one full turn for a non-empty user input.
    pub async fn run_turn(
        &self,
        user_input: &str,
        log: &mut TurnLog,
    ) -> Result<String, TurnError> {
        let schema = self.fetch_schema().await?;
        let draft = self.draft_response(user_input, &schema, log).await?;
        let tool_result = self.invoke_tool(&draft, log).await?;
        self.rephrase(user_input, &tool_result, log).await
    }

    /// Step 1 of the turn: read the schema resource. No LLM call has been
    /// made yet when this fails.
    async fn fetch_schema(&self) -> Result<String, TurnError> {
        let result = self
            .server
            .read_resource(SCHEMA_URI.to_string())
            .await
            .map_err(TurnError::Resource)?;

        match first_resource_text(&result) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(TurnError::Resource(McpError::Mcp(
                "schema resource returned no content".to_string(),
            ))),
        }
    }

    /// Step 2: ask the model for a SQL-oriented response, with the full tool
    /// list declared. A function call in this response is recorded but not
    /// executed; only the text moves forward.
    async fn draft_response(
        &self,
        user_input: &str,
        schema: &str,
        log: &mut TurnLog,
    ) -> Result<String, TurnError> {
        let prompt = format!(
            "You are an intelligent agent. Based on the user input, generate the \
             appropriate SQL query. Here is the database schema. Understand it \
             carefully:\n\n{hint}\nSchema: {schema}\n\nHere is the user \
             input:\n\nUser Input: {input}",
            hint = LEAVE_TYPE_HINT,
            schema = schema,
            input = user_input,
        );

        let response = self
            .client
            .request(vec![Message::user(prompt)], self.tools.clone())
            .await?;

        let text = response.text();
        log.push(text.clone());

        if let Some((name, args)) = response.function_call() {
            debug!("draft step produced a function call (not executed): {}", name);
            log.push(format!("draft function call (unused): {} {}", name, args));
        }

        Ok(text)
    }

    /// Step 3: ask the model to pick a tool for the drafted intent and invoke
    /// whatever it picks; fall back to the raw text when it picks nothing.
    async fn invoke_tool(&self, intent: &str, log: &mut TurnLog) -> Result<String, TurnError> {
        let prompt = format!(
            "You are an intelligent agent. Based on the user input, decide which \
             tool to call and return the response. User Input: {}",
            intent,
        );

        let response = self
            .client
            .request(vec![Message::user(prompt)], self.tools.clone())
            .await?;

        log.push(response.text());

        if let Some((name, args)) = response.function_call() {
            info!("invoking tool {}", name);
            let result = self
                .server
                .call_tool(name.to_string(), args.clone())
                .await
                .map_err(TurnError::Tool)?;

            if let Some(text) = first_tool_text(&result) {
                return Ok(text.to_string());
            }
        }

        Ok(response.text())
    }

    /// Step 4: no tools declared; the model explains the result in plain
    /// spoken language for voice output.
    async fn rephrase(
        &self,
        user_input: &str,
        result: &str,
        log: &mut TurnLog,
    ) -> Result<String, TurnError> {
        let prompt = format!(
            "You are a helpful assistant. Your job is to explain database query \
             results in simple, spoken English, as if you're talking to someone \
             who doesn't know anything about databases. Don't use any technical \
             or SQL terms. Just describe the information clearly and naturally, \
             like you're explaining it in a conversation.\n\n\
             Previous context: {input}\n\n\
             New query result: {result}\n\n\
             Please explain this in plain, natural language suitable for voice \
             output.",
            input = user_input,
            result = result,
        );

        log.push(prompt.clone());

        let response = self.client.request(vec![Message::user(prompt)], vec![]).await?;
        let text = response.text();
        log.push(text.clone());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_log_drops_oldest_past_capacity() {
        let mut log = TurnLog::new(2);
        log.push("one");
        log.push("two");
        log.push("three");

        let entries: Vec<&str> = log.entries().collect();
        assert_eq!(entries, ["two", "three"]);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn turn_log_capacity_is_at_least_one() {
        let mut log = TurnLog::new(0);
        log.push("only");
        log.push("latest");
        assert_eq!(log.entries().collect::<Vec<_>>(), ["latest"]);
    }
}
