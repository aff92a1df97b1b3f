//! Configuration for template rendering

use serde::Deserialize;

/// Escaping applied to `{{key}}` substitutions
///
/// `{{{key}}}` and `{{& key}}` are never escaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// Substitute the string form unchanged
    #[default]
    None,
    /// HTML entity escaping, as classic Mustache engines do
    Html,
    /// Escape for placement inside a JSON string literal
    Json,
}

impl EscapeMode {
    pub fn apply(self, value: &str) -> String {
        match self {
            EscapeMode::None => value.to_string(),
            EscapeMode::Html => escape_html(value),
            EscapeMode::Json => escape_json(value),
        }
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_json(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Configuration options for rendering
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Escaping for `{{key}}` substitutions
    pub escape: EscapeMode,
}

impl RenderConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the escaping mode
    pub fn with_escape(mut self, escape: EscapeMode) -> Self {
        self.escape = escape;
        self
    }
}
