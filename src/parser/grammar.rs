//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse template source into a compiled [`Template`]
pub fn parse(input: &str) -> Result<Template, Vec<crate::ParseError>> {
    let len = input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    template_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn key_path<'a>(raw: &str, span: SimpleSpan) -> Result<KeyPath, Rich<'a, Token>> {
    KeyPath::parse(raw).ok_or_else(|| {
        Rich::custom(
            span,
            format!(
                "'{}' is not a valid key. Expected '.' or dotted names without whitespace",
                raw
            ),
        )
    })
}

fn template_parser<'a, I>() -> impl Parser<'a, I, Template, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let node = recursive(|node| {
        let text = select! {
            Token::Text(s) => Node::Text(s),
        };

        let variable = select! {
            Token::Variable(name) => (name, true),
            Token::Unescaped(name) => (name, false),
        }
        .try_map(|(name, escaped), span: SimpleSpan| {
            key_path(&name, span).map(|key| Node::Variable { key, escaped })
        });

        let open = select! {
            Token::SectionOpen(name) => (name, false),
            Token::InvertedOpen(name) => (name, true),
        };

        let close = select! {
            Token::SectionClose(name) => name,
        };

        // A section must be closed by a tag carrying the same name
        let section = open
            .then(node.repeated().collect::<Vec<_>>())
            .then(close)
            .try_map(|(((name, inverted), children), closed), span: SimpleSpan| {
                if name != closed {
                    return Err(Rich::custom(
                        span,
                        format!(
                            "section '{}' is closed by '{{{{/{}}}}}'",
                            name, closed
                        ),
                    ));
                }
                let key = key_path(&name, span)?;
                Ok(Node::Section {
                    key,
                    inverted,
                    children,
                })
            });

        choice((text, variable, section))
            .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
            .boxed()
    });

    // A template is a list of nodes
    node.repeated()
        .collect()
        .then_ignore(end())
        .map(|nodes| Template { nodes })
}
