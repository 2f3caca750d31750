//! Recursive descent parsers for stream and task definitions.
//!
//! Both parsers walk a [`Tokens`] cursor and stop at the first syntax error.
//! The `--name=value` argument grammar is shared and lives here; the
//! dialect specific grammars are in [`stream`] and [`task`].
//!
//! Whitespace is not tokenized, so the parsers check token adjacency to
//! tell `--name=value` apart from `-- name = value`, which is rejected.

mod stream;
mod task;

pub use stream::parse_stream;
pub use task::parse_task;

use crate::{
    ast::{ArgumentNode, unquote},
    cursor::Tokens,
    error::{ErrorCode, Result},
    span::Span,
    tokens::{Token, TokenKind},
};

/// Parse the `--name=value` arguments that follow an app name.
pub(crate) fn eat_app_args(tokens: &mut Tokens<'_>) -> Result<Vec<ArgumentNode>> {
    let mut args = Vec::new();
    if let Some(dashes) = tokens.peek().filter(|t| t.is_kind(TokenKind::DoubleMinus))
        && tokens.is_next_adjacent()
    {
        return Err(ErrorCode::E119.diagnostic(dashes.span, &[]));
    }

    while tokens.peek_kind(TokenKind::DoubleMinus) {
        let dashes = tokens.next()?;
        reject_gap(tokens, TokenKind::Identifier, ErrorCode::E101)?;
        let (name, _) = eat_dotted_name(tokens)?;
        reject_gap(tokens, TokenKind::Equals, ErrorCode::E102)?;
        tokens.eat(TokenKind::Equals)?;
        reject_gap(tokens, TokenKind::Identifier, ErrorCode::E103)?;

        let (value, value_token) = eat_arg_value(tokens)?;
        tokens.checkpoint();
        args.push(ArgumentNode::new(
            name,
            value,
            Span::new(dashes.start()..value_token.end()),
        ));
    }
    Ok(args)
}

/// Fail with `code` when the next token has `kind` but is separated from the
/// previous token by whitespace.
fn reject_gap(tokens: &Tokens<'_>, kind: TokenKind, code: ErrorCode) -> Result<()> {
    match tokens.peek() {
        Some(token) if token.is_kind(kind) && !tokens.is_next_adjacent() => {
            Err(code.diagnostic(token.span, &[]))
        }
        _ => Ok(()),
    }
}

/// Parse `name(.name)*` with no whitespace around the dots.
pub(crate) fn eat_dotted_name(tokens: &mut Tokens<'_>) -> Result<(String, Span)> {
    let first = tokens.next()?;
    if !first.is_kind(TokenKind::Identifier) {
        return Err(ErrorCode::E111.diagnostic(first.span, &["identifier", first.text()]));
    }
    let mut name = first.data.to_string();
    let mut span = first.span;

    while let Some(dot) = tokens.peek().filter(|t| t.is_kind(TokenKind::Dot)) {
        if !tokens.is_next_adjacent() {
            return Err(ErrorCode::E145.diagnostic(dot.span, &[]));
        }
        tokens.next()?;
        reject_gap(tokens, TokenKind::Identifier, ErrorCode::E145)?;
        let part = tokens.eat(TokenKind::Identifier)?;
        name.push('.');
        name.push_str(part.data);
        span = span.union(part.span);
    }
    Ok((name, span))
}

/// Parse an argument value. Quoted values are returned unquoted.
fn eat_arg_value<'a>(tokens: &mut Tokens<'a>) -> Result<(String, Token<'a>)> {
    let token = tokens.next()?;
    match token.kind {
        TokenKind::Identifier => Ok((token.data.to_string(), token)),
        TokenKind::LiteralString => Ok((unquote(token.data), token)),
        _ => Err(ErrorCode::E105.diagnostic(token.span, &[token.text()])),
    }
}
