//! Prompt templates for the five content genres and their assembly.

mod render;

use std::fmt;

use clap::ValueEnum;

pub use render::{placeholders, render};

use crate::error::TemplateError;

pub const CONTEXT_PLACEHOLDER: &str = "context";
pub const TOPIC_PLACEHOLDER: &str = "topic";

/// The kinds of article the generator can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum GenerationMode {
    /// SEO copy about a topic.
    #[value(name = "seo")]
    SeoContent,
    /// A new article rewritten from one source text.
    #[value(name = "single-source")]
    SingleSourceNews,
    /// One article synthesised from several source texts.
    #[value(name = "multi-source")]
    MultiSourceNews,
    /// A news piece built from an opinion column.
    #[value(name = "column")]
    ColumnToNews,
    /// A full rewrite of an existing article.
    #[value(name = "rewrite")]
    RewriteNews,
}

/// A fixed prompt and the strings shown alongside it.
#[derive(Debug)]
pub struct Template {
    pub mode: GenerationMode,
    pub label: &'static str,
    pub body: &'static str,
    pub result_heading: &'static str,
    pub progress_message: &'static str,
}

static SEO_CONTENT: Template = Template {
    mode: GenerationMode::SeoContent,
    label: "SEO Content Generator",
    body: include_str!("templates/seo_content.txt"),
    result_heading: "Generated SEO Content:",
    progress_message: "Generating SEO content...",
};

static SINGLE_SOURCE_NEWS: Template = Template {
    mode: GenerationMode::SingleSourceNews,
    label: "BİR METİNDEN HABER YAZMA",
    body: include_str!("templates/single_source_news.txt"),
    result_heading: "Generated Content:",
    progress_message: "Generating content...",
};

static MULTI_SOURCE_NEWS: Template = Template {
    mode: GenerationMode::MultiSourceNews,
    label: "BİRDEN FAZLA METİNDEN HABER YAZMA",
    body: include_str!("templates/multi_source_news.txt"),
    result_heading: "Generated Content:",
    progress_message: "Generating content...",
};

static COLUMN_TO_NEWS: Template = Template {
    mode: GenerationMode::ColumnToNews,
    label: "KÖŞE YAZISINDAN HABER YAZMA",
    body: include_str!("templates/column_to_news.txt"),
    result_heading: "Generated Content:",
    progress_message: "Generating content...",
};

static REWRITE_NEWS: Template = Template {
    mode: GenerationMode::RewriteNews,
    label: "HABERİ YENİDEN YAZMA",
    body: include_str!("templates/rewrite_news.txt"),
    result_heading: "Generated Content:",
    progress_message: "Generating content...",
};

impl GenerationMode {
    pub const ALL: [GenerationMode; 5] = [
        GenerationMode::SeoContent,
        GenerationMode::SingleSourceNews,
        GenerationMode::MultiSourceNews,
        GenerationMode::ColumnToNews,
        GenerationMode::RewriteNews,
    ];

    pub fn template(self) -> &'static Template {
        match self {
            GenerationMode::SeoContent => &SEO_CONTENT,
            GenerationMode::SingleSourceNews => &SINGLE_SOURCE_NEWS,
            GenerationMode::MultiSourceNews => &MULTI_SOURCE_NEWS,
            GenerationMode::ColumnToNews => &COLUMN_TO_NEWS,
            GenerationMode::RewriteNews => &REWRITE_NEWS,
        }
    }

    /// Only SEO content is written about an explicit topic.
    pub fn takes_topic(self) -> bool {
        matches!(self, GenerationMode::SeoContent)
    }

    /// Web search needs a topic to query, so it is limited to the topic-driven mode.
    pub fn allows_search(self) -> bool {
        self.takes_topic()
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template().label)
    }
}

/// Fills `body` with the context, and with the topic for modes that take one.
///
/// `body` is the default template text or a user-edited version of it.
pub fn assemble(
    mode: GenerationMode,
    body: &str,
    context: &str,
    topic: Option<&str>,
) -> Result<String, TemplateError> {
    let mut vars = vec![(CONTEXT_PLACEHOLDER, context)];
    if mode.takes_topic() {
        if let Some(topic) = topic {
            vars.push((TOPIC_PLACEHOLDER, topic));
        }
    }
    render(body, &vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_references_context() {
        for mode in GenerationMode::ALL {
            let names = placeholders(mode.template().body);
            assert!(
                names.contains(&CONTEXT_PLACEHOLDER.to_string()),
                "{:?} has no context placeholder",
                mode
            );
            assert_eq!(mode.template().mode, mode);
        }
    }

    #[test]
    fn test_only_seo_template_takes_topic() {
        for mode in GenerationMode::ALL {
            let names = placeholders(mode.template().body);
            assert_eq!(
                names.contains(&TOPIC_PLACEHOLDER.to_string()),
                mode.takes_topic(),
                "{:?}",
                mode
            );
        }
    }

    #[test]
    fn test_default_templates_render() {
        for mode in GenerationMode::ALL {
            let prompt = assemble(mode, mode.template().body, "Test haberi.", Some("Konu")).unwrap();
            assert!(prompt.contains("Context: Test haberi."));
        }
        let seo = assemble(
            GenerationMode::SeoContent,
            SEO_CONTENT.body,
            "ctx",
            Some("Arda Güler"),
        )
        .unwrap();
        assert!(seo.contains("Konu: Arda Güler"));
    }

    #[test]
    fn test_topic_is_not_offered_to_news_modes() {
        let err = assemble(
            GenerationMode::RewriteNews,
            "{context} {topic}",
            "ctx",
            Some("ignored"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingVariable {
                name: "topic".to_string()
            }
        );
    }

    #[test]
    fn test_edited_template_is_used() {
        let prompt = assemble(
            GenerationMode::SingleSourceNews,
            "Kısa yaz: {context}",
            "metin",
            None,
        )
        .unwrap();
        assert_eq!(prompt, "Kısa yaz: metin");
    }
}
