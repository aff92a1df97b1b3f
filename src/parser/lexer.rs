//! Lexer for logic-less query templates using logos
//!
//! Everything outside `{{ ... }}` is literal text. Tags are recognised by their
//! sigil; any other `{{ ... }}` content lexes as [`Token::Unknown`] so the parser
//! can report it instead of silently passing it through.
//!
//! Section, inverted, close and comment tags that are the only thing on their
//! line are "standalone": the line's indentation and newline are removed along
//! with the tag, so block-structured templates render without blank lines.

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Section tags
    #[regex(r"\{\{#[^}]*\}\}", |lex| tag_body(lex.slice(), 3, 2))]
    SectionOpen(String),
    #[regex(r"\{\{\^[^}]*\}\}", |lex| tag_body(lex.slice(), 3, 2))]
    InvertedOpen(String),
    #[regex(r"\{\{/[^}]*\}\}", |lex| tag_body(lex.slice(), 3, 2))]
    SectionClose(String),

    // Substitutions
    #[regex(r"\{\{\{[^}]*\}\}\}", |lex| tag_body(lex.slice(), 3, 3))]
    #[regex(r"\{\{&[^}]*\}\}", |lex| tag_body(lex.slice(), 3, 2))]
    Unescaped(String),
    #[regex(r"\{\{[ \t]*[^ \t\r\n#^/{&!>=}][^ \t\r\n}]*[ \t]*\}\}", |lex| tag_body(lex.slice(), 2, 2))]
    Variable(String),

    // Comments, dropped after standalone lines are stripped
    #[regex(r"\{\{!([^}]|\}[^}])*\}\}")]
    Comment,

    // Anything else between braces is not part of the supported language
    #[regex(r"\{\{[^}]*\}\}", |lex| lex.slice().to_string(), priority = 1)]
    Unknown(String),
    #[regex(r"\{\{[^}]*", |lex| lex.slice().to_string(), priority = 1)]
    Unclosed(String),

    // Literal text, including lone opening braces from the JSON body
    #[regex(r"[^{]+", |lex| lex.slice().to_string())]
    #[token("{", |lex| lex.slice().to_string())]
    Text(String),
}

/// Strip the tag delimiters and surrounding whitespace
fn tag_body(slice: &str, open: usize, close: usize) -> String {
    slice[open..slice.len() - close].trim().to_string()
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::SectionOpen(name) => write!(f, "'{{{{#{}}}}}'", name),
            Token::InvertedOpen(name) => write!(f, "'{{{{^{}}}}}'", name),
            Token::SectionClose(name) => write!(f, "'{{{{/{}}}}}'", name),
            Token::Unescaped(name) => write!(f, "'{{{{{{{}}}}}}}'", name),
            Token::Variable(name) => write!(f, "'{{{{{}}}}}'", name),
            Token::Comment => write!(f, "comment"),
            Token::Unknown(raw) => write!(f, "unknown tag '{}'", raw),
            Token::Unclosed(raw) => write!(f, "unclosed tag '{}'", raw),
            Token::Text(_) => write!(f, "text"),
        }
    }
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    let tokens: Vec<_> = Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
        .collect();

    strip_standalone(tokens)
        .into_iter()
        .filter(|(tok, _)| !matches!(tok, Token::Comment))
}

fn is_block_tag(tok: &Token) -> bool {
    matches!(
        tok,
        Token::SectionOpen(_) | Token::InvertedOpen(_) | Token::SectionClose(_) | Token::Comment
    )
}

fn is_blank(s: &str) -> bool {
    s.chars().all(|c| matches!(c, ' ' | '\t' | '\r'))
}

/// Only whitespace precedes token `i` on its line
fn starts_line(tokens: &[(Token, Span)], i: usize) -> bool {
    if i == 0 {
        return true;
    }
    match &tokens[i - 1].0 {
        Token::Text(text) => match text.rfind('\n') {
            Some(pos) => is_blank(&text[pos + 1..]),
            // Adjacent text tokens only split at '{', so this must open the input
            None => i == 1 && is_blank(text),
        },
        _ => false,
    }
}

/// Only whitespace follows token `i` on its line
fn ends_line(tokens: &[(Token, Span)], i: usize) -> bool {
    match tokens.get(i + 1) {
        None => true,
        Some((Token::Text(text), _)) => match text.find('\n') {
            Some(pos) => is_blank(&text[..pos]),
            None => i + 2 == tokens.len() && is_blank(text),
        },
        Some(_) => false,
    }
}

/// Remove the indentation and line ending around standalone block tags
///
/// Decisions are made against the unmodified token list, so a text token
/// shared by two standalone lines is trimmed from both ends.
fn strip_standalone(tokens: Vec<(Token, Span)>) -> Vec<(Token, Span)> {
    let mut keep: Vec<(usize, usize)> = tokens
        .iter()
        .map(|(tok, _)| match tok {
            Token::Text(text) => (0, text.len()),
            _ => (0, 0),
        })
        .collect();

    for i in 0..tokens.len() {
        if !is_block_tag(&tokens[i].0) || !starts_line(&tokens, i) || !ends_line(&tokens, i) {
            continue;
        }
        if i > 0 {
            if let Token::Text(text) = &tokens[i - 1].0 {
                keep[i - 1].1 = text.rfind('\n').map_or(0, |pos| pos + 1);
            }
        }
        if let Some((Token::Text(text), _)) = tokens.get(i + 1) {
            keep[i + 1].0 = text.find('\n').map_or(text.len(), |pos| pos + 1);
        }
    }

    tokens
        .into_iter()
        .zip(keep)
        .filter_map(|((tok, span), (start, end))| match tok {
            Token::Text(text) => {
                let end = end.max(start);
                (start < end).then(|| {
                    (
                        Token::Text(text[start..end].to_string()),
                        span.start + start..span.start + end,
                    )
                })
            }
            other => Some((other, span)),
        })
        .collect()
}
