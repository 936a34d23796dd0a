//! Conversation data model shared by the LLM client and the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a conversation participant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single piece of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Part {
    /// Plain text.
    Text(String),
    /// A function call requested by the model.
    FunctionCall {
        id: Option<String>,
        name: String,
        arguments: Value,
    },
    /// The result of a function call, fed back to the model.
    FunctionResponse {
        id: Option<String>,
        name: String,
        response: Value,
    },
}

/// A conversation message: a role with an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    User(Vec<Part>),
    Assistant(Vec<Part>),
    System(Vec<Part>),
}

impl Message {
    /// Convenience constructor for a single-part user text message.
    pub fn user(text: impl Into<String>) -> Self {
        Message::User(vec![Part::Text(text.into())])
    }

    pub fn role(&self) -> Role {
        match self {
            Message::User(_) => Role::User,
            Message::Assistant(_) => Role::Assistant,
            Message::System(_) => Role::System,
        }
    }

    pub fn parts(&self) -> &[Part] {
        match self {
            Message::User(parts) | Message::Assistant(parts) | Message::System(parts) => parts,
        }
    }

    pub fn parts_mut(&mut self) -> &mut Vec<Part> {
        match self {
            Message::User(parts) | Message::Assistant(parts) | Message::System(parts) => parts,
        }
    }

    /// Concatenated text content of this message, if any.
    pub fn content(&self) -> Option<String> {
        let text: Vec<&str> = self
            .parts()
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text.join(""))
        }
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
}

/// Why the model stopped generating.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinishReason {
    Stop,
    OutputTokens,
    ContentFilter,
    ToolCalls,
}

/// A complete (non-streaming) model response.
#[derive(Debug, Clone)]
pub struct Response {
    /// Messages produced by the model, in order.
    pub data: Vec<Message>,
    pub usage: Option<Usage>,
    pub finish: FinishReason,
}

impl Response {
    /// All text parts of the response concatenated, in order.
    pub fn text(&self) -> String {
        self.data
            .iter()
            .filter_map(|m| m.content())
            .collect::<Vec<_>>()
            .join("")
    }

    /// The first function call in the response, if the model requested one.
    pub fn function_call(&self) -> Option<(&str, &Value)> {
        self.data.iter().flat_map(|m| m.parts()).find_map(|p| match p {
            Part::FunctionCall { name, arguments, .. } => Some((name.as_str(), arguments)),
            _ => None,
        })
    }
}
