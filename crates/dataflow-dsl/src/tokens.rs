//! Token types shared by the stream and task tokenizers.

use std::fmt;

use crate::span::Span;

/// The closed set of token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Payload carrying
    Identifier,
    LiteralString,

    // Operators
    DoubleMinus, // --
    Equals,      // =
    And,         // &
    AndAnd,      // &&
    Pipe,        // |
    DoublePipe,  // ||
    Arrow,       // ->

    // Punctuation
    OpenParen,  // (
    CloseParen, // )
    Colon,      // :
    Gt,         // >
    Lt,         // <
    SemiColon,  // ;
    Dot,        // .
    Star,       // *
    Slash,      // /
    Hash,       // #
    Reference,  // @

    Newline,
}

impl TokenKind {
    /// The fixed text of the kind, empty for payload carrying kinds.
    pub fn chars(&self) -> &'static str {
        match self {
            TokenKind::Identifier | TokenKind::LiteralString => "",
            TokenKind::DoubleMinus => "--",
            TokenKind::Equals => "=",
            TokenKind::And => "&",
            TokenKind::AndAnd => "&&",
            TokenKind::Pipe => "|",
            TokenKind::DoublePipe => "||",
            TokenKind::Arrow => "->",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::Colon => ":",
            TokenKind::Gt => ">",
            TokenKind::Lt => "<",
            TokenKind::SemiColon => ";",
            TokenKind::Dot => ".",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Hash => "#",
            TokenKind::Reference => "@",
            TokenKind::Newline => "\n",
        }
    }

    pub fn has_payload(&self) -> bool {
        matches!(self, TokenKind::Identifier | TokenKind::LiteralString)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "identifier",
            TokenKind::LiteralString => "literal_string",
            TokenKind::DoubleMinus => "double_minus",
            TokenKind::Equals => "equals",
            TokenKind::And => "and",
            TokenKind::AndAnd => "andand",
            TokenKind::Pipe => "pipe",
            TokenKind::DoublePipe => "doublepipe",
            TokenKind::Arrow => "arrow",
            TokenKind::OpenParen => "open_paren",
            TokenKind::CloseParen => "close_paren",
            TokenKind::Colon => "colon",
            TokenKind::Gt => "gt",
            TokenKind::Lt => "lt",
            TokenKind::SemiColon => "semicolon",
            TokenKind::Dot => "dot",
            TokenKind::Star => "star",
            TokenKind::Slash => "slash",
            TokenKind::Hash => "hash",
            TokenKind::Reference => "reference",
            TokenKind::Newline => "newline",
        };
        f.write_str(name)
    }
}

/// A token with the source text it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub data: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, data: &'a str, span: Span) -> Self {
        Self { kind, data, span }
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn start(&self) -> usize {
        self.span.start()
    }

    pub fn end(&self) -> usize {
        self.span.end()
    }

    /// The text to show for this token in a message.
    pub fn text(&self) -> &'a str {
        if self.kind.has_payload() {
            self.data
        } else {
            self.kind.chars()
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind.has_payload() {
            write!(f, "{}({})", self.kind, self.data)?;
        } else {
            write!(f, "{}", self.kind)?;
        }
        write!(f, "[{}]", self.span)
    }
}

/// The output of a tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream<'a> {
    pub expression: &'a str,
    pub tokens: Vec<Token<'a>>,
    /// Offsets of every line break, recorded by the task tokenizer.
    pub line_breaks: Vec<usize>,
}
