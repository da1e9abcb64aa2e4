//! Text filters restricting the candidate pool.
//!
//! A filter is a regex matched against element text. Prefixing it with
//! `CONTEXT=` matches against context fields instead: `CONTEXT=source:news`
//! targets the `source` field, `CONTEXT=news` tries every field. Patterns that
//! fail to compile are matched as literal substrings.

use std::collections::BTreeMap;

use regex::Regex;

/// Reserved prefix switching a filter to context fields.
pub const CONTEXT_PREFIX: &str = "CONTEXT=";

#[derive(Clone, Debug)]
enum Matcher {
    Pattern(Regex),
    Literal(String),
}

impl Matcher {
    fn build(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => Matcher::Pattern(regex),
            Err(err) => {
                tracing::debug!("Filter {pattern:?} is not a valid regex ({err}); matching literally");
                Matcher::Literal(pattern.to_string())
            }
        }
    }

    fn is_match(&self, haystack: &str) -> bool {
        match self {
            Matcher::Pattern(regex) => regex.is_match(haystack),
            Matcher::Literal(needle) => haystack.contains(needle.as_str()),
        }
    }
}

#[derive(Clone, Debug)]
enum Target {
    Text,
    AnyContext,
    ContextField(String),
}

/// Compiled form of the free-text filter string.
#[derive(Clone, Debug)]
pub struct ElementFilter {
    target: Target,
    matcher: Option<Matcher>,
}

impl ElementFilter {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let Some(rest) = raw.strip_prefix(CONTEXT_PREFIX) else {
            return Self {
                target: Target::Text,
                matcher: (!raw.is_empty()).then(|| Matcher::build(raw)),
            };
        };
        let (target, pattern) = match rest.split_once(':') {
            Some((field, pattern)) if is_field_name(field) => {
                (Target::ContextField(field.to_string()), pattern)
            }
            _ => (Target::AnyContext, rest),
        };
        Self {
            target,
            matcher: (!pattern.is_empty()).then(|| Matcher::build(pattern)),
        }
    }

    /// True when the filter lets every element through.
    pub fn is_pass_through(&self) -> bool {
        self.matcher.is_none()
    }

    pub fn matches(&self, text: &str, context: &BTreeMap<String, String>) -> bool {
        let Some(matcher) = &self.matcher else {
            return true;
        };
        match &self.target {
            Target::Text => matcher.is_match(text),
            Target::AnyContext => context.values().any(|value| matcher.is_match(value)),
            Target::ContextField(field) => context
                .get(field)
                .is_some_and(|value| matcher.is_match(value)),
        }
    }
}

fn is_field_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
