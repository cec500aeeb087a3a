//! Model, search and credential settings for a single generation run.

use std::fmt;

use clap::ValueEnum;
use tracing::warn;

use crate::environment::get_env_secret;
use crate::error::{GeneratorError, Result};

pub const TEMPERATURE_RANGE: (f32, f32) = (0.0, 1.0);
pub const MAX_TOKENS_RANGE: (u32, u32) = (50, 5000);
pub const SEARCH_RESULTS_RANGE: (usize, usize) = (1, 7);

pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 3500;
pub const DEFAULT_SEARCH_RESULTS: usize = 2;

const GROQ_MODELS: &[&str] = &["llama3-70b-8192", "llama-3.1-70b-versatile"];
const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini"];

/// The hosted model services the generator can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Groq,
    #[value(name = "openai")]
    OpenAI,
}

impl ProviderKind {
    /// Model identifiers selectable for this provider; the first is the default.
    pub fn models(self) -> &'static [&'static str] {
        match self {
            ProviderKind::Groq => GROQ_MODELS,
            ProviderKind::OpenAI => OPENAI_MODELS,
        }
    }

    pub fn default_model(self) -> &'static str {
        self.models()[0]
    }

    pub fn api_base(self) -> &'static str {
        match self {
            ProviderKind::Groq => "https://api.groq.com/openai/v1",
            ProviderKind::OpenAI => "https://api.openai.com/v1",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn key_var(self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::OpenAI => "OPENAI_API_KEY",
        }
    }

    /// Environment variable that may point the client at a different endpoint.
    pub fn api_base_var(self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_API_BASE",
            ProviderKind::OpenAI => "OPENAI_API_BASE",
        }
    }

    /// Resolves the requested model, falling back to the provider default.
    pub fn select_model(self, requested: Option<&str>) -> Result<String> {
        let Some(model) = requested.map(str::trim).filter(|m| !m.is_empty()) else {
            return Ok(self.default_model().to_string());
        };
        if self.models().contains(&model) {
            Ok(model.to_string())
        } else {
            Err(GeneratorError::UnsupportedModel {
                provider: self,
                model: model.to_string(),
                choices: self.models().join(", "),
            })
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Groq => write!(f, "Groq"),
            ProviderKind::OpenAI => write!(f, "OpenAI"),
        }
    }
}

/// A provider that has a credential and can therefore be called.
#[derive(Clone, PartialEq, Eq)]
pub enum Provider {
    Groq { api_key: String },
    OpenAI { api_key: String },
}

impl Provider {
    /// Builds the provider for `kind` when its credential is present.
    ///
    /// A missing key leaves generation unavailable; it is reported as a warning, not an error.
    pub fn select(kind: ProviderKind, credentials: &Credentials) -> Option<Provider> {
        let key = match kind {
            ProviderKind::Groq => credentials.groq.clone(),
            ProviderKind::OpenAI => credentials.openai.clone(),
        };
        match key {
            Some(api_key) => Some(match kind {
                ProviderKind::Groq => Provider::Groq { api_key },
                ProviderKind::OpenAI => Provider::OpenAI { api_key },
            }),
            None => {
                warn!("{} API key not set. Content generation is disabled.", kind);
                None
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Groq { .. } => ProviderKind::Groq,
            Provider::OpenAI { .. } => ProviderKind::OpenAI,
        }
    }

    pub fn api_key(&self) -> &str {
        match self {
            Provider::Groq { api_key } | Provider::OpenAI { api_key } => api_key,
        }
    }

    pub fn models(&self) -> &'static [&'static str] {
        self.kind().models()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// API keys for the two model providers and the search service.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub openai: Option<String>,
    pub groq: Option<String>,
    pub tavily: Option<String>,
}

impl Credentials {
    /// Reads `OPENAI_API_KEY`, `GROQ_API_KEY` and `TAVILY_API_KEY`; blank values count as unset.
    pub fn from_env() -> Self {
        Self {
            openai: get_env_secret(ProviderKind::OpenAI.key_var()),
            groq: get_env_secret(ProviderKind::Groq.key_var()),
            tavily: get_env_secret("TAVILY_API_KEY"),
        }
    }

    /// Replaces any credential for which an explicit value was given.
    pub fn with_overrides(
        mut self,
        openai: Option<String>,
        groq: Option<String>,
        tavily: Option<String>,
    ) -> Self {
        if let Some(key) = non_blank(openai) {
            self.openai = Some(key);
        }
        if let Some(key) = non_blank(groq) {
            self.groq = Some(key);
        }
        if let Some(key) = non_blank(tavily) {
            self.tavily = Some(key);
        }
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |key: &Option<String>| if key.is_some() { "[REDACTED]" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("openai", &redact(&self.openai))
            .field("groq", &redact(&self.groq))
            .field("tavily", &redact(&self.tavily))
            .finish()
    }
}

/// Sampling and retrieval knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub temperature: f32,
    pub max_tokens: u32,
    pub search_results: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            search_results: DEFAULT_SEARCH_RESULTS,
        }
    }
}

impl Settings {
    /// Checks every value against its allowed range.
    pub fn validate(&self) -> Result<()> {
        let (min, max) = TEMPERATURE_RANGE;
        if !(min..=max).contains(&self.temperature) {
            return Err(out_of_range("temperature", min, max, self.temperature));
        }
        let (min, max) = MAX_TOKENS_RANGE;
        if !(min..=max).contains(&self.max_tokens) {
            return Err(out_of_range("max_tokens", min, max, self.max_tokens));
        }
        let (min, max) = SEARCH_RESULTS_RANGE;
        if !(min..=max).contains(&self.search_results) {
            return Err(out_of_range("search_results", min, max, self.search_results));
        }
        Ok(())
    }
}

fn out_of_range<T: ToString>(name: &'static str, min: T, max: T, value: T) -> GeneratorError {
    GeneratorError::InvalidSetting {
        name,
        min: min.to_string(),
        max: max.to_string(),
        value: value.to_string(),
    }
}
