//! Process configuration from the environment.
//!
//! Server: `DATABASE_URL` (required), `VOXSQL_BIND` (default `127.0.0.1:8000`).
//! Client: `GEMINI_API_KEY` (required), `VOXSQL_SERVER_URL` (default
//! `http://127.0.0.1:8000/mcp`), `VOXSQL_MODEL` (default `gemini-2.0-flash`).

use std::net::SocketAddr;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000/mcp";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn with_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Configuration for the tool/resource host process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let bind_raw = with_default("VOXSQL_BIND", DEFAULT_BIND);
        let bind = bind_raw.parse().map_err(|_| ConfigError::InvalidVar {
            name: "VOXSQL_BIND",
            value: bind_raw,
        })?;
        Ok(Self { database_url, bind })
    }
}

/// Configuration for the orchestrator process.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub server_url: String,
    pub model: String,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required("GEMINI_API_KEY")?,
            server_url: with_default("VOXSQL_SERVER_URL", DEFAULT_SERVER_URL),
            model: with_default("VOXSQL_MODEL", DEFAULT_MODEL),
        })
    }
}
