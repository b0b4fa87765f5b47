//! Flat `{{ variable }}` interpolation for listing markup.
//!
//! Only substitution is supported: no conditionals, loops or filters.
//! Substituted values are inserted verbatim and never re-scanned.

use std::collections::HashMap;

use thiserror::Error;

/// Template rendering errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Missing required variable.
    #[error("missing required variable: {0}")]
    MissingVariable(String),

    /// Variable the caller never provides.
    #[error("unknown variable {name} in template {template}")]
    UnknownVariable { template: String, name: String },

    /// Invalid template syntax.
    #[error("invalid template syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type for template operations.
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Template context with variables for interpolation.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a variable into the context.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    /// Create context with initial variables.
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a variable value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }
}

/// A placeholder found in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Variable name.
    pub name: &'a str,
    /// Written as `{{ name? }}`; renders empty when unset.
    pub optional: bool,
}

/// A named piece of markup with `{{ variable }}` placeholders.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    content: String,
}

impl Template {
    /// Create a new template with the given name and content.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Get the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// List every placeholder in order of appearance.
    pub fn placeholders(&self) -> Result<Vec<Placeholder<'_>>> {
        let mut found = Vec::new();
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            let end = rest[start..]
                .find("}}")
                .ok_or_else(|| self.unclosed())?;
            found.push(parse_placeholder(&rest[start + 2..start + end]));
            rest = &rest[start + end + 2..];
        }

        Ok(found)
    }

    /// Fail unless every placeholder is one of `allowed`.
    pub fn check_variables(&self, allowed: &[&str]) -> Result<()> {
        for placeholder in self.placeholders()? {
            if !allowed.contains(&placeholder.name) {
                return Err(TemplateError::UnknownVariable {
                    template: self.name.clone(),
                    name: placeholder.name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Render the template with the given context.
    ///
    /// Replaces all `{{ variable }}` placeholders with values from context.
    pub fn render(&self, context: &TemplateContext) -> Result<String> {
        let mut result = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            let end = rest[start..]
                .find("}}")
                .ok_or_else(|| self.unclosed())?;
            let placeholder = parse_placeholder(&rest[start + 2..start + end]);

            result.push_str(&rest[..start]);
            match context.get(placeholder.name) {
                Some(value) => result.push_str(value),
                None if placeholder.optional => {}
                None => {
                    return Err(TemplateError::MissingVariable(
                        placeholder.name.to_string(),
                    ));
                }
            }
            rest = &rest[start + end + 2..];
        }

        result.push_str(rest);
        Ok(result)
    }

    fn unclosed(&self) -> TemplateError {
        TemplateError::InvalidSyntax(format!("unclosed {{{{ delimiter in {}", self.name))
    }
}

fn parse_placeholder(inner: &str) -> Placeholder<'_> {
    let name = inner.trim();
    match name.strip_suffix('?') {
        Some(stripped) => Placeholder {
            name: stripped.trim_end(),
            optional: true,
        },
        None => Placeholder {
            name,
            optional: false,
        },
    }
}
