//! # newsforge
//!
//! Writes news and SEO articles from search results, pasted text or web pages.
//!
//! ```text
//! # Rewrite a pasted article with Groq
//! GROQ_API_KEY=... newsforge generate --mode single-source --context "Test haberi."
//!
//! # SEO content about a topic, sourced from web search
//! newsforge generate --mode seo --source search --topic "Arda Güler" --show-context
//!
//! # Edit a template before using it
//! newsforge templates show rewrite > rewrite.txt
//! newsforge generate --mode rewrite --template-file rewrite.txt --source urls --urls "https://a, https://b"
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use tracing::debug;

use newsforge::config::{
    Credentials, Provider, ProviderKind, Settings, DEFAULT_MAX_TOKENS, DEFAULT_SEARCH_RESULTS,
    DEFAULT_TEMPERATURE, SEARCH_RESULTS_RANGE, TEMPERATURE_RANGE,
};
use newsforge::context::{ContextSource, ContextSourceKind};
use newsforge::environment::load_dotenv;
use newsforge::logging::configure_logging;
use newsforge::pipeline::{Generation, GenerationRequest, Generator, Outcome};
use newsforge::prompt::{placeholders, GenerationMode};
use newsforge::search::TavilyRetriever;
use newsforge::web::WebPageLoader;
use newsforge::LLMParams;

#[derive(Parser)]
#[clap(name = "newsforge", version, about = "Generate news and SEO articles with a hosted LLM")]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve context, fill the template and generate content
    Generate(GenerateArgs),

    /// List the built-in templates or print one for editing
    Templates {
        #[clap(subcommand)]
        action: TemplateAction,
    },

    /// List the models each provider offers
    Models {
        #[clap(long, value_enum)]
        provider: Option<ProviderKind>,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    List,
    Show {
        #[clap(value_enum)]
        mode: GenerationMode,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Kind of content to write
    #[clap(long, value_enum)]
    mode: GenerationMode,

    /// Where the context comes from (search is only available for seo)
    #[clap(long, value_enum, default_value = "manual")]
    source: ContextSourceKind,

    /// Topic for seo content; also the search query
    #[clap(long)]
    topic: Option<String>,

    /// Context text for the manual source
    #[clap(long, conflicts_with = "context_file")]
    context: Option<String>,

    /// Read manual context from a file, or from stdin with `-`
    #[clap(long)]
    context_file: Option<PathBuf>,

    /// Comma-separated URLs for the urls source
    #[clap(long)]
    urls: Option<String>,

    /// Use an edited template instead of the built-in one
    #[clap(long)]
    template_file: Option<PathBuf>,

    #[clap(long, value_enum, default_value = "groq")]
    provider: ProviderKind,

    /// Model id; defaults to the provider's first model
    #[clap(long)]
    model: Option<String>,

    #[clap(long, default_value_t = DEFAULT_TEMPERATURE, value_parser = parse_temperature)]
    temperature: f32,

    #[clap(long, default_value_t = DEFAULT_MAX_TOKENS, value_parser = clap::value_parser!(u32).range(50..=5000))]
    max_tokens: u32,

    /// Number of search results to use as context
    #[clap(long, default_value_t = DEFAULT_SEARCH_RESULTS, value_parser = parse_search_results)]
    search_results: usize,

    /// Overrides OPENAI_API_KEY
    #[clap(long)]
    openai_api_key: Option<String>,

    /// Overrides GROQ_API_KEY
    #[clap(long)]
    groq_api_key: Option<String>,

    /// Overrides TAVILY_API_KEY
    #[clap(long)]
    tavily_api_key: Option<String>,

    /// Print the context that was sent to the model
    #[clap(long)]
    show_context: bool,

    /// Print the assembled prompt
    #[clap(long)]
    show_prompt: bool,
}

fn parse_temperature(raw: &str) -> std::result::Result<f32, String> {
    let value: f32 = raw.parse().map_err(|e| format!("{}", e))?;
    let (min, max) = TEMPERATURE_RANGE;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be between {} and {}", min, max))
    }
}

fn parse_search_results(raw: &str) -> std::result::Result<usize, String> {
    let value: usize = raw.parse().map_err(|e| format!("{}", e))?;
    let (min, max) = SEARCH_RESULTS_RANGE;
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(format!("must be between {} and {}", min, max))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    configure_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate(args) => generate(args).await,
        Command::Templates { action } => {
            list_templates(action);
            Ok(ExitCode::SUCCESS)
        }
        Command::Models { provider } => {
            list_models(provider);
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn generate(args: GenerateArgs) -> Result<ExitCode> {
    let settings = Settings {
        temperature: args.temperature,
        max_tokens: args.max_tokens,
        search_results: args.search_results,
    };
    settings.validate()?;

    let credentials = Credentials::from_env().with_overrides(
        args.openai_api_key.clone(),
        args.groq_api_key.clone(),
        args.tavily_api_key.clone(),
    );
    debug!("Using credentials {:?}", credentials);

    let llm = match Provider::select(args.provider, &credentials) {
        Some(provider) => Some(LLMParams::new(&provider, args.model.as_deref(), &settings)?),
        None => None,
    };
    let retriever = if args.source == ContextSourceKind::Search {
        TavilyRetriever::from_credential(credentials.tavily.as_deref(), settings.search_results)?
    } else {
        None
    };
    let generator = Generator::new(args.provider, llm, retriever, WebPageLoader::new()?);

    let mut request = GenerationRequest::new(args.mode, context_source(&args)?);
    if let Some(topic) = &args.topic {
        request = request.with_topic(topic.as_str());
    }
    if let Some(path) = &args.template_file {
        request = request.with_template(read_text(path)?);
    }

    let template = args.mode.template();
    if generator.can_generate() {
        eprintln!("{}", template.progress_message.dimmed());
    }

    match generator.run(&request).await? {
        Outcome::Generated(generation) => {
            print_generation(&generation, template.result_heading, &args);
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Suppressed(reason) => {
            eprintln!("{} {}", "warning:".yellow().bold(), reason);
            Ok(ExitCode::from(2))
        }
    }
}

fn context_source(args: &GenerateArgs) -> Result<ContextSource> {
    Ok(match args.source {
        ContextSourceKind::Search => ContextSource::Search,
        ContextSourceKind::Manual => {
            let text = match (&args.context, &args.context_file) {
                (Some(text), _) => text.clone(),
                (None, Some(path)) => read_text(path)?,
                (None, None) => String::new(),
            };
            ContextSource::Manual { text }
        }
        ContextSourceKind::Urls => ContextSource::Urls {
            list: args.urls.clone().unwrap_or_default(),
        },
    })
}

fn read_text(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_generation(generation: &Generation, heading: &str, args: &GenerateArgs) {
    for failure in generation.warnings() {
        eprintln!("{} skipped {}", "warning:".yellow().bold(), failure);
    }

    if args.show_prompt {
        println!("{}", "Prompt:".bold());
        println!("{}\n", generation.prompt);
    }

    println!("{}", heading.bold());
    println!("{}", generation.text);

    if args.show_context {
        println!("\n{}", "Context Details".bold());
        println!("{}", generation.context.text);
    }
    debug!("Generated with {} / {}", generation.provider, generation.model);
}

fn list_templates(action: TemplateAction) {
    match action {
        TemplateAction::List => {
            for mode in GenerationMode::ALL {
                let name = mode
                    .to_possible_value()
                    .map(|v| v.get_name().to_string())
                    .unwrap_or_default();
                println!(
                    "{} {:<36} {{{}}}",
                    format!("{:<14}", name).bold(),
                    mode.template().label,
                    placeholders(mode.template().body).join("}, {")
                );
            }
        }
        TemplateAction::Show { mode } => print!("{}", mode.template().body),
    }
}

fn list_models(provider: Option<ProviderKind>) {
    let kinds = match provider {
        Some(kind) => vec![kind],
        None => vec![ProviderKind::Groq, ProviderKind::OpenAI],
    };
    for kind in kinds {
        println!("{} ({})", kind.to_string().bold(), kind.key_var());
        for model in kind.models() {
            let marker = if *model == kind.default_model() { " (default)" } else { "" };
            println!("  {}{}", model, marker);
        }
    }
}
