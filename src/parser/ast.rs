//! Syntax tree for parsed query templates

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A context lookup key: either the implicit iterator `.` or a dotted name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPath {
    /// `{{.}}` - the current scope value itself
    Implicit,
    /// `{{a}}` or `{{a.b.c}}`
    Dotted(Vec<String>),
}

impl KeyPath {
    /// Parse the body of a tag into a key path
    ///
    /// Returns None for empty names, empty segments (`a..b`), whitespace, braces
    /// and names starting with a tag sigil.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == "." {
            return Some(KeyPath::Implicit);
        }
        if raw.is_empty() || raw.starts_with(&['#', '^', '/', '&', '!', '>', '='][..]) {
            return None;
        }

        let mut segments = Vec::new();
        for segment in raw.split('.') {
            let valid = !segment.is_empty()
                && !segment
                    .chars()
                    .any(|c| c.is_whitespace() || c == '{' || c == '}');
            if !valid {
                return None;
            }
            segments.push(segment.to_string());
        }
        Some(KeyPath::Dotted(segments))
    }

    /// Convenience constructor for a single-segment key
    pub fn name(name: impl Into<String>) -> Self {
        KeyPath::Dotted(vec![name.into()])
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPath::Implicit => write!(f, "."),
            KeyPath::Dotted(segments) => write!(f, "{}", segments.join(".")),
        }
    }
}

/// A piece of template structure
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text copied to the output
    Text(String),
    /// `{{key}}` (escaped) or `{{{key}}}` / `{{& key}}` (raw)
    Variable { key: KeyPath, escaped: bool },
    /// `{{#key}}...{{/key}}` or, when inverted, `{{^key}}...{{/key}}`
    Section {
        key: KeyPath,
        inverted: bool,
        children: Vec<Spanned<Node>>,
    },
}

/// Root AST node - a compiled template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub nodes: Vec<Spanned<Node>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_path_parse() {
        assert_eq!(KeyPath::parse("."), Some(KeyPath::Implicit));
        assert_eq!(KeyPath::parse(" userId "), Some(KeyPath::name("userId")));
        assert_eq!(
            KeyPath::parse("grade.score"),
            Some(KeyPath::Dotted(vec!["grade".into(), "score".into()]))
        );
    }

    #[test]
    fn test_key_path_rejects_invalid() {
        assert_eq!(KeyPath::parse(""), None);
        assert_eq!(KeyPath::parse("a..b"), None);
        assert_eq!(KeyPath::parse("has space"), None);
        assert_eq!(KeyPath::parse(">partial"), None);
        assert_eq!(KeyPath::parse("a{b"), None);
    }

    #[test]
    fn test_key_path_accepts_any_visible_name() {
        assert_eq!(KeyPath::parse("@timestamp"), Some(KeyPath::name("@timestamp")));
        assert_eq!(
            KeyPath::parse("grade.nota_ñ"),
            Some(KeyPath::Dotted(vec!["grade".into(), "nota_ñ".into()]))
        );
    }

    #[test]
    fn test_key_path_display() {
        assert_eq!(KeyPath::parse("a.b").unwrap().to_string(), "a.b");
        assert_eq!(KeyPath::Implicit.to_string(), ".");
    }
}
