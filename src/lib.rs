pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod search;
pub mod web;

use async_openai::{config::OpenAIConfig, Client as OpenAIClient};

pub use error::{GeneratorError, Result, TemplateError};

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_SEARCH_REQUEST: &str = "search_request";
pub const TARGET_PIPELINE: &str = "pipeline";

/// A chat-completion client bound to one provider's endpoint and credential.
#[derive(Clone, Debug)]
pub enum LLMClient {
    Groq(OpenAIClient<OpenAIConfig>),
    OpenAI(OpenAIClient<OpenAIConfig>),
}

/// Everything needed to call the model for one run.
#[derive(Clone, Debug)]
pub struct LLMParams<C = LLMClient> {
    pub llm_client: C,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}
