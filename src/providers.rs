//! LLM provider implementations.

use crate::client::Client;
use crate::options::{ModelOptions, TransportOptions};

/// Trait for LLM providers that can create configured clients.
pub trait Provider {
    /// The client type produced by this provider.
    type Client: Client;

    /// Create a new client with the given API key and model.
    fn create(api_key: String, model: String) -> Self::Client;

    /// Create a new client with custom options.
    fn create_with_options(
        api_key: String,
        model_options: ModelOptions<<Self::Client as Client>::ModelProvider>,
        transport_options: TransportOptions,
    ) -> Self::Client;
}

pub mod gemini;

// Re-export for convenience
pub use gemini::{Gemini, GeminiClient, GeminiModel};
