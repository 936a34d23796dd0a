//! Host tests over an in-memory transport: a real rmcp client session talks
//! to `AssistantService` through a duplex pipe, so registration, dispatch,
//! and argument validation are exercised end to end. Database-backed paths
//! (`query`, the schema resource) are covered by the live-DB tests in the
//! library crate.

use rmcp::ServiceExt;
use serde_json::json;
use voxsql::mcp::{first_resource_text, first_tool_text, McpError, McpServer};
use voxsql::service::AssistantService;

async fn connect_host() -> impl McpServer {
    let service = AssistantService::new("postgres://unused@localhost/unused");
    let (client_transport, server_transport) = tokio::io::duplex(4096);

    tokio::spawn(async move {
        let running = service
            .serve(server_transport)
            .await
            .expect("failed to start server");
        running.waiting().await.ok();
    });

    ().serve(client_transport).await.expect("failed to connect")
}

#[tokio::test]
async fn lists_the_registered_tools() {
    let host = connect_host().await;
    let tools = host.list_tools().await.unwrap();

    let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_ref()).collect();
    names.sort();
    assert_eq!(names, ["add", "multiply", "query", "subtract"]);

    let query = tools.iter().find(|t| t.name == "query").unwrap();
    assert_eq!(query.description.as_deref(), Some("Run a read-only SQL query"));
}

#[tokio::test]
async fn arithmetic_tools_compute_their_operations() {
    let host = connect_host().await;

    for (tool, a, b, expected) in [
        ("add", 2, 3, "5"),
        ("add", -4, 6, "2"),
        ("subtract", 7, 5, "2"),
        ("subtract", 5, 7, "-2"),
        ("multiply", 6, 7, "42"),
        ("multiply", -3, 3, "-9"),
    ] {
        let result = host
            .call_tool(tool.to_string(), json!({"a": a, "b": b}))
            .await
            .unwrap();
        assert_eq!(first_tool_text(&result), Some(expected), "{}({}, {})", tool, a, b);
    }
}

#[tokio::test]
async fn unknown_tool_is_rejected_before_execution() {
    let host = connect_host().await;
    let err = host
        .call_tool("divide".to_string(), json!({"a": 1, "b": 2}))
        .await;
    assert!(err.is_err());
}

#[tokio::test]
async fn missing_required_argument_is_rejected() {
    let host = connect_host().await;
    let err = host.call_tool("add".to_string(), json!({"a": 1})).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn static_resource_returns_its_payload() {
    let host = connect_host().await;

    let resources = host.list_resources().await.unwrap();
    let uris: Vec<&str> = resources.iter().map(|r| r.uri.as_str()).collect();
    assert!(uris.contains(&"resource://schema"));
    assert!(uris.contains(&"resource://static-info"));

    let result = host
        .read_resource("resource://static-info".to_string())
        .await
        .unwrap();
    assert_eq!(
        first_resource_text(&result),
        Some("Any static data can be returned")
    );
}

#[tokio::test]
async fn greeting_template_substitutes_the_name() {
    let host = connect_host().await;
    let result = host
        .read_resource("greeting://Alice".to_string())
        .await
        .unwrap();
    assert_eq!(first_resource_text(&result), Some("Hello, Alice!"));
}

#[tokio::test]
async fn unregistered_resource_is_not_found() {
    let host = connect_host().await;
    let err = host
        .read_resource("resource://no-such-thing".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::ResourceNotFound(_)));
}

#[tokio::test]
async fn prompts_render_their_arguments() {
    let host = connect_host().await;

    let prompts = host.list_prompts().await.unwrap();
    let names: Vec<&str> = prompts.iter().map(|p| p.name.as_str()).collect();
    assert!(names.contains(&"review_code"));
    assert!(names.contains(&"debug_error"));

    let review = prompts.iter().find(|p| p.name == "review_code").unwrap();
    let declared = review.arguments.as_ref().unwrap();
    assert_eq!(declared.len(), 1);
    assert_eq!(declared[0].name, "code");
    assert_eq!(declared[0].required, Some(true));

    let mut args = serde_json::Map::new();
    args.insert("code".to_string(), json!("fn main() {}"));
    let result = host
        .get_prompt("review_code".to_string(), Some(args))
        .await
        .unwrap();
    assert_eq!(result.messages.len(), 1);

    let mut args = serde_json::Map::new();
    args.insert("error".to_string(), json!("borrow of moved value"));
    let result = host
        .get_prompt("debug_error".to_string(), Some(args))
        .await
        .unwrap();
    assert_eq!(result.messages.len(), 3);
}
