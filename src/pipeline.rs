//! One generation run: resolve context, assemble the prompt, invoke the model.
//!
//! A run either produces a [`Generation`], stops early with a [`Suppression`] when some input
//! or credential is missing, or fails with a [`GeneratorError`]. Nothing is kept between runs.

use std::fmt;

use tracing::{debug, info, warn};

use crate::config::ProviderKind;
use crate::context::{self, ContextBlob, ContextSource, ContextSourceKind, SourceFailure};
use crate::error::{GeneratorError, Result};
use crate::llm::{generate_llm_response, TextGenerator};
use crate::prompt::{self, GenerationMode};
use crate::search::Retriever;
use crate::web::PageLoader;
use crate::{LLMParams, TARGET_PIPELINE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ResolvingContext,
    AssemblingPrompt,
    InvokingModel,
    DisplayingResult,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ResolvingContext => "resolving context",
            Stage::AssemblingPrompt => "assembling prompt",
            Stage::InvokingModel => "invoking model",
            Stage::DisplayingResult => "displaying result",
        };
        f.write_str(name)
    }
}

/// What the user asked for on this run.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    /// Edited template text; the mode's default template is used when `None`.
    pub template: Option<String>,
    pub source: ContextSource,
    pub topic: Option<String>,
}

impl GenerationRequest {
    pub fn new(mode: GenerationMode, source: ContextSource) -> Self {
        Self {
            mode,
            template: None,
            source,
            topic: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    fn template_body(&self) -> &str {
        self.template
            .as_deref()
            .unwrap_or(self.mode.template().body)
    }
}

#[derive(Debug, Clone)]
pub struct Generation {
    pub mode: GenerationMode,
    pub provider: ProviderKind,
    pub model: String,
    pub context: ContextBlob,
    pub prompt: String,
    pub text: String,
}

impl Generation {
    /// URLs that were skipped while building the context.
    pub fn warnings(&self) -> &[SourceFailure] {
        &self.context.failures
    }
}

/// Why a run stopped before calling the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suppression {
    MissingModelCredential(ProviderKind),
    MissingSearchCredential,
    MissingTopic,
    EmptyContext(ContextSourceKind),
    NoUsableUrls(Vec<SourceFailure>),
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suppression::MissingModelCredential(kind) => {
                write!(f, "Please provide {} API Key ({}).", kind, kind.key_var())
            }
            Suppression::MissingSearchCredential => {
                write!(f, "Please provide Tavily API Key (TAVILY_API_KEY).")
            }
            Suppression::MissingTopic => write!(f, "Please enter a topic to generate SEO content."),
            Suppression::EmptyContext(ContextSourceKind::Search) => {
                write!(f, "Search returned no content for this topic.")
            }
            Suppression::EmptyContext(ContextSourceKind::Manual) => {
                write!(f, "Please enter the context information.")
            }
            Suppression::EmptyContext(ContextSourceKind::Urls) => write!(f, "Please enter valid URLs."),
            Suppression::NoUsableUrls(failures) => {
                write!(f, "None of the URLs could be loaded:")?;
                for failure in failures {
                    write!(f, "\n  - {}", failure)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Generated(Generation),
    Suppressed(Suppression),
}

/// The collaborators for a run. Capabilities whose credential is missing are `None`.
pub struct Generator<C, R, L> {
    provider: ProviderKind,
    llm: Option<LLMParams<C>>,
    retriever: Option<R>,
    loader: L,
}

impl<C, R, L> Generator<C, R, L>
where
    C: TextGenerator,
    R: Retriever,
    L: PageLoader,
{
    pub fn new(
        provider: ProviderKind,
        llm: Option<LLMParams<C>>,
        retriever: Option<R>,
        loader: L,
    ) -> Self {
        Self {
            provider,
            llm,
            retriever,
            loader,
        }
    }

    /// Whether the selected provider has a credential.
    pub fn can_generate(&self) -> bool {
        self.llm.is_some()
    }

    pub fn can_search(&self) -> bool {
        self.retriever.is_some()
    }

    /// Runs the request through every stage, calling the model at most once.
    pub async fn run(&self, request: &GenerationRequest) -> Result<Outcome> {
        let mut stage = Stage::Idle;

        if request.source == ContextSource::Search && !request.mode.allows_search() {
            return Err(GeneratorError::UnsupportedSource {
                context_source: ContextSourceKind::Search.name(),
                mode: request.mode,
            });
        }

        let Some(llm) = &self.llm else {
            return Ok(suppress(Suppression::MissingModelCredential(self.provider)));
        };

        let topic = request
            .topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        if request.mode.takes_topic() && topic.is_none() {
            return Ok(suppress(Suppression::MissingTopic));
        }

        advance(&mut stage, Stage::ResolvingContext);
        let context = match &request.source {
            ContextSource::Search => {
                let Some(retriever) = &self.retriever else {
                    return Ok(suppress(Suppression::MissingSearchCredential));
                };
                context::resolve_search(retriever, topic.unwrap_or_default()).await?
            }
            ContextSource::Manual { text } => context::resolve_manual(text),
            ContextSource::Urls { list } => context::resolve_urls(&self.loader, list).await,
        };

        if context.is_empty() {
            let reason = if context.failures.is_empty() {
                Suppression::EmptyContext(request.source.kind())
            } else {
                Suppression::NoUsableUrls(context.failures)
            };
            return Ok(suppress(reason));
        }

        advance(&mut stage, Stage::AssemblingPrompt);
        let prompt = prompt::assemble(request.mode, request.template_body(), &context.text, topic)?;

        advance(&mut stage, Stage::InvokingModel);
        let text = generate_llm_response(&prompt, llm).await?;

        advance(&mut stage, Stage::DisplayingResult);
        info!(target: TARGET_PIPELINE, "Generated {} chars of '{}' content", text.len(), request.mode);

        Ok(Outcome::Generated(Generation {
            mode: request.mode,
            provider: llm.provider(),
            model: llm.model.clone(),
            context,
            prompt,
            text,
        }))
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!(target: TARGET_PIPELINE, "{} -> {}", stage, next);
    *stage = next;
}

fn suppress(reason: Suppression) -> Outcome {
    warn!(target: TARGET_PIPELINE, "Generation suppressed: {}", reason);
    Outcome::Suppressed(reason)
}
