//! Error types for template parsing, loading and dispatch

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::dispatch::BackendError;
use crate::parser::lexer::Token;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Crate-wide result type
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let mut buf = Vec::new();
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };

                let written = Report::build(ReportKind::Error, filename, span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((filename, span.clone()))
                            .with_message(format!("{}{}", message, expected_str))
                            .with_color(Color::Red),
                    )
                    .finish()
                    .write((filename, Source::from(source)), &mut buf);
                if written.is_err() {
                    return self.to_string();
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl<'a> From<chumsky::error::Rich<'a, Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, Token>) -> Self {
        use chumsky::error::{RichPattern, RichReason};

        #[allow(unreachable_patterns)]
        let message = match err.reason() {
            RichReason::ExpectedFound { .. } => match err.found() {
                Some(tok) => format!("Unexpected {}", tok),
                None => "Unexpected end of template".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
            _ => "Unexpected input".to_string(),
        };

        #[allow(unreachable_patterns)]
        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_expected(tok)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of template".to_string()),
                _ => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Describe an expected token class rather than the concrete token that was built
fn format_expected(tok: &Token) -> String {
    match tok {
        Token::SectionClose(_) => "closing tag".to_string(),
        Token::Text(_) => "text".to_string(),
        other => other.to_string(),
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by the query template engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Template resource, named template within a group, or group definition absent
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A resource exists but could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Group definition failed to parse or is structurally invalid
    #[error("invalid template group '{operation_type}': {message}")]
    Config {
        operation_type: String,
        message: String,
    },

    /// Malformed template text
    #[error("template syntax error in '{name}': {}", format_parse_errors(.errors))]
    TemplateSyntax {
        name: String,
        template: String,
        errors: Vec<ParseError>,
    },

    /// Parameters could not be converted into a render context
    #[error("cannot convert query parameters: {message}")]
    Serialization { message: String },

    /// `queryType` outside the recognised set
    #[error("unsupported query type '{kind}' for template '{template}'")]
    UnsupportedQueryKind { kind: String, template: String },

    /// Backend failure, passed through unchanged
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl EngineError {
    /// Create a not-found error
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Create a group configuration error
    pub fn config(operation_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            operation_type: operation_type.into(),
            message: message.into(),
        }
    }

    /// Create a parameter conversion error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether the caller, rather than the deployment, is responsible
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::NotFound { .. } | EngineError::Serialization { .. }
        )
    }

    /// Source-annotated report for template syntax errors
    pub fn report(&self) -> Option<String> {
        match self {
            EngineError::TemplateSyntax {
                name,
                template,
                errors,
            } => Some(
                errors
                    .iter()
                    .map(|e| e.format(template, name))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}
