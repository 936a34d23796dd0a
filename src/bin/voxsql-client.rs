//! Orchestrator REPL process.
//!
//! Reads one question per line, runs a three-step LLM turn against the tool
//! host, and prints the spoken-style reply. A failed turn is reported and the
//! loop continues; an empty line is skipped without any LLM call.

use std::io::{self, BufRead, Write};

use anyhow::Context;
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;
use voxsql::config::ClientConfig;
use voxsql::orchestrator::{Orchestrator, TurnLog};
use voxsql::providers::{Gemini, Provider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClientConfig::from_env().context("client configuration")?;

    let client = Gemini::create(config.api_key, config.model);
    let transport = StreamableHttpClientTransport::from_uri(config.server_url.clone());
    let session = ()
        .serve(transport)
        .await
        .with_context(|| format!("connect to tool host at {}", config.server_url))?;

    let orchestrator = Orchestrator::connect(client, Box::new(session))
        .await
        .context("fetch tool list")?;
    let mut log = TurnLog::default();

    let stdin = io::stdin();
    loop {
        print!("Enter your question: ");
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match orchestrator.run_turn(input, &mut log).await {
            Ok(reply) => println!("Reply: {}", reply),
            Err(e) => eprintln!("Turn failed: {}", e),
        }
    }

    Ok(())
}
