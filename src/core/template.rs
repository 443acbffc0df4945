// src/core/template.rs — Composable prompt templates

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while rendering a template.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Variable '{name}' is not defined")]
    UndefinedVariable { name: String },
}

/// A value bound to a placeholder: literal text or a nested template.
///
/// Nested templates are shared through `Arc`, so merging two templates
/// copies the handle rather than the subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Text(String),
    Template(Arc<Template>),
}

impl Binding {
    fn resolve(&self) -> Result<String, TemplateError> {
        match self {
            Binding::Text(s) => Ok(s.clone()),
            Binding::Template(t) => t.render(),
        }
    }
}

impl From<String> for Binding {
    fn from(s: String) -> Self {
        Binding::Text(s)
    }
}

impl From<&str> for Binding {
    fn from(s: &str) -> Self {
        Binding::Text(s.to_string())
    }
}

impl From<Template> for Binding {
    fn from(t: Template) -> Self {
        Binding::Template(Arc::new(t))
    }
}

impl From<Arc<Template>> for Binding {
    fn from(t: Arc<Template>) -> Self {
        Binding::Template(t)
    }
}

pub type Bindings = BTreeMap<String, Binding>;

/// Instruction text with `{NAME}` placeholders plus the values that fill them.
///
/// When `bindings` is `None` the body is rendered verbatim and no
/// placeholder scanning happens at all.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Template {
    body: String,
    bindings: Option<Bindings>,
}

impl Template {
    /// A template rendered verbatim.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            bindings: None,
        }
    }

    pub fn with_bindings(body: impl Into<String>, bindings: Bindings) -> Self {
        Self {
            body: body.into(),
            bindings: Some(bindings),
        }
    }

    /// Return a copy with one more binding. Turns a verbatim template into a
    /// substituting one.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Binding>) -> Self {
        self.bindings
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn bindings(&self) -> Option<&Bindings> {
        self.bindings.as_ref()
    }

    /// Expand the template into its final text.
    pub fn render(&self) -> Result<String, TemplateError> {
        let Some(bindings) = &self.bindings else {
            return Ok(self.body.clone());
        };

        let mut values: BTreeMap<&str, String> = BTreeMap::new();
        for (name, binding) in bindings {
            values.insert(name.as_str(), binding.resolve()?);
        }

        substitute(&self.body, &values)
    }

    /// Concatenate bodies with a single space and union the bindings,
    /// `other` winning on key collisions.
    pub fn merge(&self, other: &Template) -> Template {
        let body = format!("{} {}", self.body, other.body);

        let bindings = match (&self.bindings, &other.bindings) {
            (None, None) => None,
            (left, right) => {
                let mut merged = left.clone().unwrap_or_default();
                if let Some(right) = right {
                    for (k, v) in right {
                        merged.insert(k.clone(), v.clone());
                    }
                }
                Some(merged)
            }
        };

        Template { body, bindings }
    }

    /// Merge a sequence left to right. Returns `None` for an empty sequence.
    pub fn merge_all<'a>(parts: impl IntoIterator<Item = &'a Template>) -> Option<Template> {
        let mut iter = parts.into_iter();
        let first = iter.next()?.clone();
        Some(iter.fold(first, |acc, t| acc.merge(t)))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Single left-to-right pass over `body`. Substituted values are never
/// rescanned, so braces inside bound text come through untouched.
fn substitute(body: &str, values: &BTreeMap<&str, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        // `{` followed by a name and a closing brace is a placeholder;
        // anything else is literal text.
        let inner = &tail[1..];
        match inner.find('}') {
            Some(end) if end > 0 && inner[..end].chars().all(is_name_char) => {
                let name = &inner[..end];
                let value = values
                    .get(name)
                    .ok_or_else(|| TemplateError::UndefinedVariable {
                        name: name.to_string(),
                    })?;
                out.push_str(value);
                rest = &inner[end + 1..];
            }
            _ => {
                out.push('{');
                rest = inner;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}
