//! Error types shared by the context resolver, prompt assembler and generation invoker.

use thiserror::Error;

use crate::config::ProviderKind;
use crate::prompt::GenerationMode;

/// Failures while substituting placeholders into a prompt template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template references a placeholder that no value was supplied for.
    #[error("template references `{{{name}}}` but no value was supplied for it")]
    MissingVariable { name: String },

    #[error("empty placeholder `{{}}` at byte {offset}")]
    EmptyPlaceholder { offset: usize },

    /// A single `{` or `}` that is neither escaped nor part of a placeholder.
    #[error("unmatched `{brace}` at byte {offset}; write `{brace}{brace}` for a literal brace")]
    UnbalancedBrace { brace: char, offset: usize },
}

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("{provider} request failed: {message}")]
    Llm {
        provider: ProviderKind,
        message: String,
    },

    #[error("search request failed: {0}")]
    Search(String),

    #[error("failed to load {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("invalid URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("model `{model}` is not offered by {provider} (choose one of: {choices})")]
    UnsupportedModel {
        provider: ProviderKind,
        model: String,
        choices: String,
    },

    #[error("{name} must be between {min} and {max}, got {value}")]
    InvalidSetting {
        name: &'static str,
        min: String,
        max: String,
        value: String,
    },

    #[error("context source `{context_source}` cannot be used with {mode}")]
    UnsupportedSource {
        context_source: &'static str,
        mode: GenerationMode,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
