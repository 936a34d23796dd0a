//! Google Gemini API client implementation.
//!
//! Implements the `Client` trait against Gemini's `generateContent` endpoint.
//! See: <https://ai.google.dev/api/rest>

use async_trait::async_trait;
use nonempty::NonEmpty;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;

use crate::client::{Client, ClientError};
use crate::model::{FinishReason, Message, Part, Response, Role, Usage};
use crate::options::{ModelOptions, TransportOptions};

/// Gemini-specific model options.
/// Currently empty, but can be extended with Gemini-specific parameters
/// like `top_k`, `safety_settings`, etc.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiModel {}

/// Gemini client using HTTP transport.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model_options: ModelOptions<GeminiModel>,
    transport_options: TransportOptions,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(
        api_key: String,
        base_url: String,
        model_options: ModelOptions<GeminiModel>,
        transport_options: TransportOptions,
    ) -> Self {
        Self {
            api_key,
            base_url,
            model_options,
            transport_options,
        }
    }

    /// Handle Gemini error responses.
    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(body) {
            ClientError::ProviderError(format!(
                "Gemini error ({}): {}",
                error_resp.error.code, error_resp.error.message
            ))
        } else {
            ClientError::ProviderError(format!("HTTP {}: {}", status, body))
        }
    }
}

/// Build a reqwest client honoring the transport timeout and proxy.
fn http_client(options: &TransportOptions) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();

    match options {
        TransportOptions::Http { timeout, proxy, .. } => {
            if let Some(t) = timeout {
                builder = builder.timeout(*t);
            }
            if let Some(url) = proxy {
                builder = builder.proxy(reqwest::Proxy::all(url)?);
            }
        }
    }

    builder.build()
}

impl GeminiRequest {
    fn new(
        messages: Vec<Message>,
        model_options: &ModelOptions<GeminiModel>,
        tool_defs: Vec<rmcp::model::Tool>,
    ) -> Self {
        let contents = messages.into_iter().map(Into::into).collect();

        let tools = if tool_defs.is_empty() {
            None
        } else {
            Some(vec![GeminiTool {
                function_declarations: tool_defs
                    .iter()
                    .map(|def| GeminiFunctionDeclaration {
                        name: def.name.to_string(),
                        description: def
                            .description
                            .as_ref()
                            .map(|d| d.to_string())
                            .unwrap_or_default(),
                        parameters_json_schema: Value::Object((*def.input_schema).clone()),
                    })
                    .collect(),
            }])
        };

        GeminiRequest {
            contents,
            generation_config: Some(GeminiGenerationConfig {
                temperature: model_options.temperature,
                top_p: model_options.top_p,
                max_output_tokens: model_options.max_tokens,
            }),
            tools,
        }
    }
}

impl From<Role> for GeminiRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => GeminiRole::User,
            Role::Assistant => GeminiRole::Model,
            // Gemini has no dedicated system role in `contents`.
            Role::System => GeminiRole::User,
        }
    }
}

impl From<Message> for GeminiContent {
    fn from(msg: Message) -> Self {
        let role = msg.role().into();

        let parts = msg
            .parts()
            .iter()
            .map(|part| match part {
                Part::Text(text) => GeminiPart::Text { text: text.clone() },
                Part::FunctionCall { name, arguments, .. } => GeminiPart::FunctionCall {
                    function_call: FunctionCall {
                        name: name.clone(),
                        args: arguments.clone(),
                    },
                },
                Part::FunctionResponse { name, response, .. } => GeminiPart::FunctionResponse {
                    function_response: FunctionResponse {
                        name: name.clone(),
                        response: response.clone(),
                    },
                },
            })
            .collect();

        GeminiContent { role, parts }
    }
}

impl From<GeminiPart> for Message {
    fn from(part: GeminiPart) -> Self {
        match part {
            GeminiPart::Text { text } => Message::Assistant(vec![Part::Text(text)]),
            GeminiPart::FunctionCall { function_call } => {
                Message::Assistant(vec![Part::FunctionCall {
                    id: None,
                    name: function_call.name,
                    arguments: function_call.args,
                }])
            }
            GeminiPart::FunctionResponse { function_response } => {
                Message::User(vec![Part::FunctionResponse {
                    id: None,
                    name: function_response.name,
                    response: function_response.response,
                }])
            }
        }
    }
}

impl From<GeminiResponse> for Response {
    fn from(gemini_resp: GeminiResponse) -> Self {
        let finish_reason = gemini_resp
            .candidates
            .last()
            .finish_reason
            .unwrap_or(GeminiFinishReason::Stop)
            .into();
        let parts = gemini_resp
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts.into_iter());

        Response {
            data: parts.map(|part| part.into()).collect(),
            usage: gemini_resp.usage_metadata.map(|u| u.into()),
            finish: finish_reason,
        }
    }
}

#[async_trait]
impl Client for GeminiClient {
    type ModelProvider = GeminiModel;

    async fn request(
        &self,
        messages: Vec<Message>,
        tools: Vec<rmcp::model::Tool>,
    ) -> Result<Response, ClientError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model_options.model, self.api_key
        );

        let request_body = GeminiRequest::new(messages, &self.model_options, tools);
        if let Ok(body) = serde_json::to_string(&request_body) {
            tracing::debug!("Gemini request body: {}", body);
        }

        let mut req = http_client(&self.transport_options)?
            .post(&url)
            .header(CONTENT_TYPE, "application/json");

        if let TransportOptions::Http {
            headers: Some(extra),
            ..
        } = &self.transport_options
        {
            for (key, value) in extra {
                req = req.header(key, value);
            }
        }

        let response = req.json(&request_body).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Gemini response ({} bytes): {}", body.len(), body);

        if !status.is_success() {
            return Err(Self::handle_error_response(status, &body));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)?;
        Ok(gemini_response.into())
    }

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.model_options
    }

    fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }
}

// --- Gemini API Request/Response Types ---

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: Option<GeminiGenerationConfig>,
    tools: Option<Vec<GeminiTool>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters_json_schema: Value,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum GeminiRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    role: GeminiRole,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        function_call: FunctionCall,
    },
    FunctionResponse {
        function_response: FunctionResponse,
    },
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: NonEmpty<GeminiCandidate>,
    #[allow(dead_code)]
    model_version: Option<String>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum GeminiFinishReason {
    Stop,
    MaxTokens,
    Safety,
    Language,
    Blocklist,
    ProhibitedContent,
    MalformedFunctionCall,
    UnexpectedToolCall,
    TooManyToolCalls,
    #[serde(other)]
    Other,
}

impl From<GeminiFinishReason> for FinishReason {
    fn from(reason: GeminiFinishReason) -> Self {
        match reason {
            GeminiFinishReason::Stop => FinishReason::Stop,
            GeminiFinishReason::MaxTokens => FinishReason::OutputTokens,
            GeminiFinishReason::Safety
            | GeminiFinishReason::Language
            | GeminiFinishReason::Blocklist
            | GeminiFinishReason::ProhibitedContent => FinishReason::ContentFilter,
            GeminiFinishReason::MalformedFunctionCall
            | GeminiFinishReason::UnexpectedToolCall
            | GeminiFinishReason::TooManyToolCalls => FinishReason::ToolCalls,
            GeminiFinishReason::Other => FinishReason::Stop,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
    finish_reason: Option<GeminiFinishReason>,
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    prompt_token_count: u32,
    candidates_token_count: Option<u32>,
}

impl From<GeminiUsageMetadata> for Usage {
    fn from(u: GeminiUsageMetadata) -> Self {
        Usage {
            prompt_tokens: Some(u.prompt_token_count),
            completion_tokens: u.candidates_token_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiError {
    code: u32,
    message: String,
}
