use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client as OpenAIClient;
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::{Provider, ProviderKind, Settings};
use crate::environment::get_env_var_or;
use crate::error::{GeneratorError, Result};
use crate::{LLMClient, LLMParams, TARGET_LLM_REQUEST};

/// One completion call as it goes over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Sends the prompt and waits for the whole completion.
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

impl LLMClient {
    /// Builds a client for the provider's default endpoint, or the one named by
    /// `GROQ_API_BASE` / `OPENAI_API_BASE`.
    pub fn from_provider(provider: &Provider) -> Self {
        let kind = provider.kind();
        let api_base = get_env_var_or(kind.api_base_var(), kind.api_base());
        Self::with_api_base(provider, &api_base)
    }

    pub fn with_api_base(provider: &Provider, api_base: &str) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(api_base.trim_end_matches('/'))
            .with_api_key(provider.api_key());
        // Rate-limited calls fail immediately instead of being retried.
        let no_retry = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        let client = OpenAIClient::with_config(config).with_backoff(no_retry);
        match provider {
            Provider::Groq { .. } => LLMClient::Groq(client),
            Provider::OpenAI { .. } => LLMClient::OpenAI(client),
        }
    }

    fn inner(&self) -> &OpenAIClient<OpenAIConfig> {
        match self {
            LLMClient::Groq(client) | LLMClient::OpenAI(client) => client,
        }
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    fn provider(&self) -> ProviderKind {
        match self {
            LLMClient::Groq(_) => ProviderKind::Groq,
            LLMClient::OpenAI(_) => ProviderKind::OpenAI,
        }
    }

    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let provider = self.provider();
        let to_error = |e: async_openai::error::OpenAIError| GeneratorError::Llm {
            provider,
            message: e.to_string(),
        };

        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt)
            .build()
            .map_err(to_error)?;
        let messages: Vec<ChatCompletionRequestMessage> = vec![message.into()];
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(request.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .build()
            .map_err(to_error)?;

        let response = self
            .inner()
            .chat()
            .create(chat_request)
            .await
            .map_err(to_error)?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

impl LLMParams<LLMClient> {
    /// Binds the selected provider to a model from its own list and the current settings.
    pub fn new(provider: &Provider, model: Option<&str>, settings: &Settings) -> Result<Self> {
        let model = provider.kind().select_model(model)?;
        Ok(Self {
            llm_client: LLMClient::from_provider(provider),
            model,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }
}

impl<C: TextGenerator> LLMParams<C> {
    pub fn provider(&self) -> ProviderKind {
        self.llm_client.provider()
    }
}

/// Sends `prompt` with the model, temperature and token limit from `params`.
///
/// Failures are returned, not retried.
pub async fn generate_llm_response<C: TextGenerator>(
    prompt: &str,
    params: &LLMParams<C>,
) -> Result<String> {
    let provider = params.provider();
    let request = CompletionRequest {
        model: &params.model,
        prompt,
        temperature: params.temperature,
        max_tokens: params.max_tokens,
    };

    info!(target: TARGET_LLM_REQUEST, "Sending {} chars to {} ({}, temperature {}, max {} tokens)",
        prompt.len(), provider, params.model, params.temperature, params.max_tokens);
    debug!(target: TARGET_LLM_REQUEST, "Prompt: {}", prompt);

    match params.llm_client.complete(&request).await {
        Ok(text) => {
            debug!(target: TARGET_LLM_REQUEST, "{} response received: {}", provider, text);
            Ok(text)
        }
        Err(e) => {
            error!(target: TARGET_LLM_REQUEST, "{} request failed: {}", provider, e);
            Err(e)
        }
    }
}
