use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rmcp::model::{
    CallToolResult, Content, GetPromptResult, Prompt, ReadResourceResult, Resource,
    ResourceContents, Tool,
};
use serde_json::{json, Value};
use voxsql::client::{Client, ClientError};
use voxsql::mcp::{McpError, McpServer};
use voxsql::model::{FinishReason, Message, Part, Response};
use voxsql::options::{ModelOptions, TransportOptions};
use voxsql::orchestrator::{Orchestrator, TurnError, TurnLog};

#[derive(Clone)]
struct MockClient {
    responses: Arc<Mutex<Vec<Response>>>,
    requests: Arc<Mutex<Vec<(Vec<Message>, usize)>>>,
}

impl MockClient {
    fn new(responses: Vec<Response>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Client for MockClient {
    type ModelProvider = ();

    async fn request(
        &self,
        messages: Vec<Message>,
        tools: Vec<Tool>,
    ) -> Result<Response, ClientError> {
        self.requests.lock().unwrap().push((messages, tools.len()));
        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            Err(ClientError::ProviderError(
                "No more mock responses".to_string(),
            ))
        }
    }

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        unimplemented!()
    }

    fn transport_options(&self) -> &TransportOptions {
        unimplemented!()
    }
}

struct StubHost {
    schema_unavailable: Arc<AtomicBool>,
    tool_unavailable: Arc<AtomicBool>,
    tool_calls: Arc<Mutex<Vec<(String, Value)>>>,
    tool_reply: String,
}

impl StubHost {
    fn new(tool_reply: &str) -> Self {
        Self {
            schema_unavailable: Arc::new(AtomicBool::new(false)),
            tool_unavailable: Arc::new(AtomicBool::new(false)),
            tool_calls: Arc::new(Mutex::new(Vec::new())),
            tool_reply: tool_reply.to_string(),
        }
    }
}

#[async_trait]
impl McpServer for StubHost {
    async fn list_tools(&self) -> Result<Vec<Tool>, McpError> {
        Ok(Vec::new())
    }

    async fn call_tool(&self, name: String, args: Value) -> Result<CallToolResult, McpError> {
        if self.tool_unavailable.load(Ordering::SeqCst) {
            return Err(McpError::Mcp("tool host unreachable".to_string()));
        }
        self.tool_calls.lock().unwrap().push((name, args));
        Ok(CallToolResult::success(vec![Content::text(
            self.tool_reply.clone(),
        )]))
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, McpError> {
        Ok(Vec::new())
    }

    async fn read_resource(&self, uri: String) -> Result<ReadResourceResult, McpError> {
        if self.schema_unavailable.load(Ordering::SeqCst) {
            return Err(McpError::Mcp("database unreachable".to_string()));
        }
        let schema = json!({
            "employees": {"columns": [
                {"name": "id", "type": "integer", "nullable": false, "default": null, "constraint": "PRIMARY KEY"},
                {"name": "leave_type", "type": "text", "nullable": true, "default": null, "constraint": null}
            ]}
        });
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(schema.to_string(), uri)],
        })
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>, McpError> {
        Ok(Vec::new())
    }

    async fn get_prompt(
        &self,
        name: String,
        _args: Option<serde_json::Map<String, Value>>,
    ) -> Result<GetPromptResult, McpError> {
        Err(McpError::Mcp(format!("no prompt: {}", name)))
    }
}

fn text_response(text: &str) -> Response {
    Response {
        data: vec![Message::Assistant(vec![Part::Text(text.to_string())])],
        usage: None,
        finish: FinishReason::Stop,
    }
}

fn function_call_response(name: &str, args: Value) -> Response {
    Response {
        data: vec![Message::Assistant(vec![Part::FunctionCall {
            id: None,
            name: name.to_string(),
            arguments: args,
        }])],
        usage: None,
        finish: FinishReason::ToolCalls,
    }
}

#[tokio::test]
async fn full_turn_invokes_tool_and_rephrases() {
    let client = MockClient::new(vec![
        text_response("SELECT COUNT(*) FROM employees WHERE leave_type = 'Sick'"),
        function_call_response(
            "query",
            json!({"sql": "SELECT COUNT(*) FROM employees WHERE leave_type = 'Sick'"}),
        ),
        text_response("Three people are out sick right now."),
    ]);

    let host = StubHost::new(r#"[{"count": 3}]"#);
    let tool_calls = host.tool_calls.clone();

    let orchestrator = Orchestrator::connect(client.clone(), Box::new(host))
        .await
        .unwrap();
    let mut log = TurnLog::default();

    let reply = orchestrator
        .run_turn("how many employees are on sick leave", &mut log)
        .await
        .unwrap();

    assert_eq!(reply, "Three people are out sick right now.");
    assert!(!reply.to_uppercase().contains("SELECT"));
    assert_eq!(client.request_count(), 3);

    let calls = tool_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "query");
    assert!(calls[0].1["sql"].as_str().unwrap().contains("leave_type"));

    // The rephrase call declares no tools.
    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[2].1, 0);

    assert!(!log.is_empty());
}

#[tokio::test]
async fn draft_step_function_call_is_not_executed() {
    // Step 1 returns both text and a function call; only step 2's call runs.
    let draft = Response {
        data: vec![Message::Assistant(vec![
            Part::Text("SELECT COUNT(*) FROM employees".to_string()),
            Part::FunctionCall {
                id: None,
                name: "query".to_string(),
                arguments: json!({"sql": "SELECT COUNT(*) FROM employees"}),
            },
        ])],
        usage: None,
        finish: FinishReason::Stop,
    };

    let client = MockClient::new(vec![
        draft,
        function_call_response("query", json!({"sql": "SELECT COUNT(*) FROM employees"})),
        text_response("There are five employees."),
    ]);

    let host = StubHost::new(r#"[{"count": 5}]"#);
    let tool_calls = host.tool_calls.clone();

    let orchestrator = Orchestrator::connect(client, Box::new(host)).await.unwrap();
    let mut log = TurnLog::default();

    orchestrator.run_turn("how many employees", &mut log).await.unwrap();

    assert_eq!(tool_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn falls_back_to_text_when_no_tool_is_picked() {
    let client = MockClient::new(vec![
        text_response("That question does not need the database."),
        text_response("I can answer directly: two plus two is four."),
        text_response("Two plus two makes four."),
    ]);

    let host = StubHost::new("unused");
    let tool_calls = host.tool_calls.clone();

    let orchestrator = Orchestrator::connect(client.clone(), Box::new(host))
        .await
        .unwrap();
    let mut log = TurnLog::default();

    let reply = orchestrator.run_turn("what is two plus two", &mut log).await.unwrap();

    assert_eq!(reply, "Two plus two makes four.");
    assert!(tool_calls.lock().unwrap().is_empty());
    assert_eq!(client.request_count(), 3);
}

#[tokio::test]
async fn tool_failure_aborts_turn_and_next_turn_succeeds() {
    let client = MockClient::new(vec![
        // First turn: aborted when the tool invocation fails after two calls.
        text_response("SELECT COUNT(*) FROM employees"),
        function_call_response("query", json!({"sql": "SELECT COUNT(*) FROM employees"})),
        // Second turn: runs to completion.
        text_response("SELECT COUNT(*) FROM employees"),
        function_call_response("query", json!({"sql": "SELECT COUNT(*) FROM employees"})),
        text_response("There are five employees."),
    ]);

    let host = StubHost::new(r#"[{"count": 5}]"#);
    let unavailable = host.tool_unavailable.clone();
    let tool_calls = host.tool_calls.clone();
    unavailable.store(true, Ordering::SeqCst);

    let orchestrator = Orchestrator::connect(client.clone(), Box::new(host))
        .await
        .unwrap();
    let mut log = TurnLog::default();

    let err = orchestrator
        .run_turn("how many employees", &mut log)
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Tool(_)));
    assert_eq!(client.request_count(), 2);
    assert!(tool_calls.lock().unwrap().is_empty());

    unavailable.store(false, Ordering::SeqCst);
    let reply = orchestrator
        .run_turn("how many employees", &mut log)
        .await
        .unwrap();
    assert_eq!(reply, "There are five employees.");
    assert_eq!(tool_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn llm_failure_aborts_turn_and_next_turn_succeeds() {
    let client = MockClient::new(vec![]);

    let host = StubHost::new("unused");
    let tool_calls = host.tool_calls.clone();

    let orchestrator = Orchestrator::connect(client.clone(), Box::new(host))
        .await
        .unwrap();
    let mut log = TurnLog::default();

    let err = orchestrator
        .run_turn("how many employees", &mut log)
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Llm(_)));
    assert!(tool_calls.lock().unwrap().is_empty());

    client.responses.lock().unwrap().extend([
        text_response("That question does not need the database."),
        text_response("Two plus two is four."),
        text_response("Two plus two makes four."),
    ]);

    let reply = orchestrator
        .run_turn("what is two plus two", &mut log)
        .await
        .unwrap();
    assert_eq!(reply, "Two plus two makes four.");
}

#[tokio::test]
async fn schema_failure_aborts_turn_before_any_llm_call() {
    let client = MockClient::new(vec![
        text_response("SELECT COUNT(*) FROM employees WHERE leave_type = 'Sick'"),
        function_call_response(
            "query",
            json!({"sql": "SELECT COUNT(*) FROM employees WHERE leave_type = 'Sick'"}),
        ),
        text_response("Three people are out sick right now."),
    ]);

    let host = StubHost::new(r#"[{"count": 3}]"#);
    let unavailable = host.schema_unavailable.clone();
    unavailable.store(true, Ordering::SeqCst);

    let orchestrator = Orchestrator::connect(client.clone(), Box::new(host))
        .await
        .unwrap();
    let mut log = TurnLog::default();

    let err = orchestrator
        .run_turn("how many employees are on sick leave", &mut log)
        .await
        .unwrap_err();

    assert!(matches!(err, TurnError::Resource(_)));
    assert_eq!(client.request_count(), 0);

    // The very next turn succeeds once the database is back.
    unavailable.store(false, Ordering::SeqCst);
    let reply = orchestrator
        .run_turn("how many employees are on sick leave", &mut log)
        .await
        .unwrap();
    assert_eq!(reply, "Three people are out sick right now.");
    assert_eq!(client.request_count(), 3);
}
