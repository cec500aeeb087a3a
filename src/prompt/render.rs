//! Placeholder substitution for prompt templates.
//!
//! Templates use `{name}` placeholders and `{{` / `}}` for literal braces. Substitution is a
//! single left-to-right pass over the template: inserted values are never scanned again, so
//! brace sequences inside fetched or pasted context end up in the prompt verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::TemplateError;

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}|[{}]").expect("placeholder pattern is valid")
});

/// Substitutes every placeholder in `template` with its value from `vars`.
pub fn render(template: &str, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
    let extra: usize = vars.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut last = 0;

    for caps in TOKEN.captures_iter(template) {
        let Some(token) = caps.get(0) else {
            continue;
        };
        out.push_str(&template[last..token.start()]);
        match token.as_str() {
            "{{" => out.push('{'),
            "}}" => out.push('}'),
            "{" => {
                return Err(TemplateError::UnbalancedBrace {
                    brace: '{',
                    offset: token.start(),
                })
            }
            "}" => {
                return Err(TemplateError::UnbalancedBrace {
                    brace: '}',
                    offset: token.start(),
                })
            }
            _ => {
                let name = caps.get(1).map_or("", |m| m.as_str()).trim();
                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder {
                        offset: token.start(),
                    });
                }
                let value = vars
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| TemplateError::MissingVariable {
                        name: name.to_string(),
                    })?;
                out.push_str(value);
            }
        }
        last = token.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}

/// Names of the placeholders `template` references, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in TOKEN.captures_iter(template) {
        if let Some(name) = caps.get(1).map(|m| m.as_str().trim()) {
            if !name.is_empty() && !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_substitution() {
        assert_eq!(
            render("X: {context}", &[("context", "hello")]).unwrap(),
            "X: hello"
        );
    }

    #[test]
    fn test_multiple_placeholders_and_repeats() {
        let rendered = render(
            "Context: {context}\n\nKonu: {topic}\n{topic}",
            &[("context", "metin"), ("topic", "Arda Güler")],
        )
        .unwrap();
        assert_eq!(rendered, "Context: metin\n\nKonu: Arda Güler\nArda Güler");
    }

    #[test]
    fn test_injected_placeholders_are_not_expanded() {
        let rendered = render(
            "{context} / {topic}",
            &[("context", "{topic} and {{x}} and }"), ("topic", "T")],
        )
        .unwrap();
        assert_eq!(rendered, "{topic} and {{x}} and } / T");
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(
            render("{{literal}} {context}", &[("context", "c")]).unwrap(),
            "{literal} c"
        );
    }

    #[test]
    fn test_missing_variable() {
        let err = render("{context} {author}", &[("context", "c")]).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingVariable {
                name: "author".to_string()
            }
        );
    }

    #[test]
    fn test_malformed_braces() {
        assert_eq!(
            render("a {} b", &[]).unwrap_err(),
            TemplateError::EmptyPlaceholder { offset: 2 }
        );
        assert_eq!(
            render("a { b", &[]).unwrap_err(),
            TemplateError::UnbalancedBrace {
                brace: '{',
                offset: 2
            }
        );
        assert_eq!(
            render("a } b", &[]).unwrap_err(),
            TemplateError::UnbalancedBrace {
                brace: '}',
                offset: 2
            }
        );
    }

    #[test]
    fn test_unicode_text_survives() {
        let template = "Başlık: {context} — ğüşöçı";
        assert_eq!(
            render(template, &[("context", "İstanbul")]).unwrap(),
            "Başlık: İstanbul — ğüşöçı"
        );
    }

    #[test]
    fn test_placeholders_listed_once() {
        assert_eq!(
            placeholders("{context} {{skip}} {topic} {context}"),
            vec!["context".to_string(), "topic".to_string()]
        );
    }
}
