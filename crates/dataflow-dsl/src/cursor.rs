//! A cursor over a token stream for the recursive descent parsers.
//!
//! The cursor owns the lookahead rules shared by both dialects: adjacency
//! checks between tokens, the checkpoint (the offset up to which the input
//! is known to be well formed) and the errors raised when the input ends
//! early or a token of the wrong kind shows up.

use crate::{
    error::{ErrorCode, Result},
    span::Span,
    tokens::{Token, TokenKind, TokenStream},
};

/// Position-tracking view of a [`TokenStream`].
#[derive(Debug, Clone)]
pub(crate) struct Tokens<'a> {
    expression: &'a str,
    tokens: Vec<Token<'a>>,
    line_breaks: Vec<usize>,
    position: usize,
    last_good: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(stream: TokenStream<'a>) -> Self {
        Self {
            expression: stream.expression,
            tokens: stream.tokens,
            line_breaks: stream.line_breaks,
            position: 0,
            last_good: 0,
        }
    }

    pub fn expression(&self) -> &'a str {
        self.expression
    }

    pub fn tokens(&self) -> &[Token<'a>] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn decrement_position(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    pub fn has_next(&self) -> bool {
        self.position < self.tokens.len()
    }

    pub fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.position).copied()
    }

    /// The token `offset` places away from the current one.
    pub fn peek_at(&self, offset: isize) -> Option<Token<'a>> {
        let index = self.position.checked_add_signed(offset)?;
        self.tokens.get(index).copied()
    }

    /// The token before the current one.
    pub fn previous(&self) -> Option<Token<'a>> {
        self.peek_at(-1)
    }

    pub fn peek_kind(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|token| token.is_kind(kind))
    }

    /// Whether the token `distance` places ahead has the given kind.
    pub fn look_ahead(&self, distance: usize, kind: TokenKind) -> bool {
        self.tokens
            .get(self.position + distance)
            .is_some_and(|token| token.is_kind(kind))
    }

    /// Consume the next token if it has the given kind.
    pub fn eat_if(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        let token = self.peek().filter(|token| token.is_kind(kind))?;
        self.position += 1;
        Some(token)
    }

    /// Consume the next token.
    ///
    /// # Errors
    ///
    /// `E112` at the end of the definition when the input is exhausted.
    pub fn next(&mut self) -> Result<Token<'a>> {
        match self.peek() {
            Some(token) => {
                self.position += 1;
                Ok(token)
            }
            None => Err(self.out_of_data()),
        }
    }

    /// Consume the next token, which must have the given kind.
    ///
    /// # Errors
    ///
    /// `E112` when the input is exhausted, `E111` when the token differs.
    pub fn eat(&mut self, kind: TokenKind) -> Result<Token<'a>> {
        let token = self.next()?;
        if !token.is_kind(kind) {
            let expected = kind.to_string();
            return Err(ErrorCode::E111.diagnostic(token.span, &[&expected, token.text()]));
        }
        Ok(token)
    }

    /// Whether the next token starts exactly where the previous one ended.
    pub fn is_next_adjacent(&self) -> bool {
        if self.position == 0 {
            return false;
        }
        match (self.previous(), self.peek()) {
            (Some(previous), Some(next)) => previous.end() == next.start(),
            _ => false,
        }
    }

    /// Record that everything consumed so far is well formed.
    pub fn checkpoint(&mut self) {
        self.last_good = self.position;
    }

    /// Offset in the definition up to which parsing succeeded.
    pub fn checkpoint_offset(&self) -> usize {
        self.last_good
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map_or(0, Token::end)
    }

    /// Zero based line of a token.
    pub fn line_of(&self, token: &Token<'_>) -> usize {
        self.line_breaks
            .iter()
            .take_while(|offset| **offset < token.start())
            .count()
    }

    /// Whether any remaining token has the given kind.
    pub fn any_remaining(&self, kind: TokenKind) -> bool {
        self.tokens[self.position..]
            .iter()
            .any(|token| token.is_kind(kind))
    }

    /// The text of the remaining tokens, used when reporting leftover input.
    pub fn remaining_text(&self) -> &'a str {
        self.peek()
            .map_or("", |token| &self.expression[token.start()..])
    }

    /// The error raised when the definition ends too early.
    pub fn out_of_data(&self) -> crate::error::Diagnostic {
        let end = self.expression.len();
        ErrorCode::E112.diagnostic(Span::new(end..end), &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Dialect, tokenize};

    fn cursor(expression: &str, dialect: Dialect) -> Tokens<'_> {
        Tokens::new(tokenize(expression, dialect).unwrap())
    }

    #[test]
    fn test_next_and_peek() {
        let mut tokens = cursor("a | b", Dialect::Stream);

        assert_eq!(tokens.peek().map(|t| t.data), Some("a"));
        assert_eq!(tokens.peek_at(1).map(|t| t.kind), Some(TokenKind::Pipe));
        assert!(tokens.peek_at(-1).is_none());
        assert!(tokens.look_ahead(2, TokenKind::Identifier));

        tokens.next().unwrap();
        assert!(tokens.eat_if(TokenKind::Gt).is_none());
        assert!(tokens.eat_if(TokenKind::Pipe).is_some());
        assert_eq!(tokens.previous().map(|t| t.kind), Some(TokenKind::Pipe));
    }

    #[test]
    fn test_next_out_of_data() {
        let mut tokens = cursor("abc", Dialect::Stream);
        tokens.next().unwrap();

        let err = tokens.next().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E112));
        assert_eq!(err.position(), Some(3));
    }

    #[test]
    fn test_eat_wrong_kind() {
        let mut tokens = cursor("a > b", Dialect::Stream);
        tokens.next().unwrap();

        let err = tokens.eat(TokenKind::Pipe).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E111));
        assert_eq!(err.position(), Some(2));
        assert_eq!(err.message(), "Unexpected token.  Expected 'pipe' but was '>'");
    }

    #[test]
    fn test_adjacency() {
        let mut tokens = cursor("a:b c", Dialect::Stream);
        assert!(!tokens.is_next_adjacent());

        tokens.next().unwrap();
        assert!(tokens.is_next_adjacent());
        tokens.next().unwrap();
        tokens.next().unwrap();
        assert!(!tokens.is_next_adjacent());
        tokens.next().unwrap();
        assert!(!tokens.is_next_adjacent());
    }

    #[test]
    fn test_checkpoint_offset() {
        let mut tokens = cursor("time | log", Dialect::Stream);
        assert_eq!(tokens.checkpoint_offset(), 0);

        tokens.next().unwrap();
        tokens.checkpoint();
        tokens.next().unwrap();
        assert_eq!(tokens.checkpoint_offset(), 4);
    }

    #[test]
    fn test_line_of() {
        let tokens = cursor("a\nb && c\nd", Dialect::Task);
        let lines: Vec<_> = tokens.tokens().iter().map(|t| tokens.line_of(t)).collect();

        assert_eq!(lines, vec![0, 1, 1, 1, 2]);
    }

    #[test]
    fn test_remaining() {
        let mut tokens = cursor("a > b | c", Dialect::Stream);
        tokens.next().unwrap();

        assert!(tokens.any_remaining(TokenKind::Pipe));
        assert_eq!(tokens.remaining_text(), "> b | c");
        assert_eq!(tokens.len(), 5);

        tokens.decrement_position();
        assert_eq!(tokens.position(), 0);
    }
}
