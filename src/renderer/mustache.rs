//! Logic-less template evaluation
//!
//! Walks a compiled [`Template`] against a scope stack. The root scope is the
//! render context; sections push the looked-up value (or each list element)
//! and names that are missing from the innermost scope are looked up in the
//! enclosing ones.

use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::parser::{parse, KeyPath, Node, Spanned, Template};

use super::config::RenderConfig;
use super::context::RenderContext;

/// Renders template text against a [`RenderContext`]
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Parse template text, labelling syntax errors with `name`
    pub fn compile(&self, name: &str, source: &str) -> Result<Template> {
        parse(source).map_err(|errors| EngineError::TemplateSyntax {
            name: name.to_string(),
            template: source.to_string(),
            errors,
        })
    }

    /// Compile and render template text in one step
    pub fn render(&self, source: &str, ctx: &RenderContext) -> Result<String> {
        self.render_named("<inline>", source, ctx)
    }

    /// Like [`Renderer::render`], naming the template in syntax errors
    pub fn render_named(&self, name: &str, source: &str, ctx: &RenderContext) -> Result<String> {
        let template = self.compile(name, source)?;
        Ok(self.render_template(&template, ctx))
    }

    /// Render an already compiled template
    pub fn render_template(&self, template: &Template, ctx: &RenderContext) -> String {
        let root = ctx.to_value();
        let mut scopes = vec![&root];
        let mut out = String::new();
        self.render_nodes(&template.nodes, &mut scopes, &mut out);
        out
    }

    fn render_nodes<'v>(
        &self,
        nodes: &[Spanned<Node>],
        scopes: &mut Vec<&'v Value>,
        out: &mut String,
    ) {
        for node in nodes {
            match &node.node {
                Node::Text(text) => out.push_str(text),
                Node::Variable { key, escaped } => {
                    if let Some(value) = lookup(scopes, key) {
                        let text = stringify(value);
                        if *escaped {
                            out.push_str(&self.config.escape.apply(&text));
                        } else {
                            out.push_str(&text);
                        }
                    }
                }
                Node::Section {
                    key,
                    inverted: true,
                    children,
                } => {
                    if !lookup(scopes, key).is_some_and(is_truthy) {
                        self.render_nodes(children, scopes, out);
                    }
                }
                Node::Section {
                    key,
                    inverted: false,
                    children,
                } => match lookup(scopes, key) {
                    Some(Value::Array(items)) => {
                        for item in items {
                            scopes.push(item);
                            self.render_nodes(children, scopes, out);
                            scopes.pop();
                        }
                    }
                    Some(value) if is_truthy(value) => {
                        scopes.push(value);
                        self.render_nodes(children, scopes, out);
                        scopes.pop();
                    }
                    _ => {}
                },
            }
        }
    }
}

/// Resolve a key against the scope stack, innermost first
fn lookup<'v>(scopes: &[&'v Value], key: &KeyPath) -> Option<&'v Value> {
    match key {
        KeyPath::Implicit => scopes.last().copied(),
        KeyPath::Dotted(segments) => {
            let (first, rest) = segments.split_first()?;
            let mut current = scopes.iter().rev().find_map(|scope| {
                let scope: &'v Value = *scope;
                scope.as_object().and_then(|map| map.get(first))
            })?;
            for segment in rest {
                current = current.as_object()?.get(segment)?;
            }
            Some(current)
        }
    }
}

/// Mustache truthiness: null, false, "" and [] are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Number(_) | Value::Object(_) => true,
    }
}

/// String form of a substituted value
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        composite => composite.to_string(),
    }
}
