//! Tokenizers for stream and task definitions.
//!
//! Both dialects share the identifier, quoted literal and argument value
//! rules and differ in the operators they accept. The public entry point is
//! [`tokenize`]; a lexical error is fatal and reported at its exact offset.
//!
//! After an `=`, a value that starts right away is lexed in a relaxed mode
//! that runs up to the next `|`, `;`, `>`, whitespace or line break outside
//! of quotes. This lets expressions such as `payload.matches('a b')` be
//! passed without extra quoting.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, not, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{none_of, one_of, take_while},
};

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    span::Span,
    tokens::{Token, TokenKind, TokenStream},
};

/// The two definition languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `source | processor | sink` pipelines.
    Stream,
    /// Composed task flows, splits and transitions.
    Task,
}

const IS_DIGIT: u8 = 0x01;
const IS_ALPHA: u8 = 0x02;

/// Character classes of the ASCII range, indexed by byte value.
const CHAR_FLAGS: [u8; 256] = build_char_flags();

const fn build_char_flags() -> [u8; 256] {
    let mut flags = [0u8; 256];
    let mut ch = 0;
    while ch < 256 {
        let byte = ch as u8;
        if byte.is_ascii_digit() {
            flags[ch] |= IS_DIGIT;
        }
        if byte.is_ascii_alphabetic() {
            flags[ch] |= IS_ALPHA;
        }
        ch += 1;
    }
    flags
}

fn has_flag(ch: char, flag: u8) -> bool {
    let code = ch as u32;
    code < 256 && CHAR_FLAGS[code as usize] & flag != 0
}

fn is_identifier_part(ch: char) -> bool {
    has_flag(ch, IS_ALPHA | IS_DIGIT) || matches!(ch, '_' | '$' | '-')
}

fn is_identifier_start(ch: char, dialect: Dialect) -> bool {
    has_flag(ch, IS_ALPHA | IS_DIGIT) || ch == '_' || (dialect == Dialect::Task && ch == '$')
}

fn is_quote(ch: char) -> bool {
    ch == '\'' || ch == '"'
}

/// Whitespace as far as the relaxed value rule is concerned.
fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\r' | '\n')
}

fn is_arg_value_terminator(ch: char, quote_open: bool) -> bool {
    !quote_open && matches!(ch, '|' | ';' | ' ' | '\t' | '>' | '\r' | '\n')
}

/// Returns `true` if `name` is usable as a stream or task name.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if has_flag(first, IS_ALPHA) || first == '_' || first == '$' => {
            chars.all(is_identifier_part)
        }
        _ => false,
    }
}

/// Rich diagnostic information for lexer errors.
///
/// Attached to winnow errors via `.context()`; converted to a [`Diagnostic`]
/// reported at `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    insert: Option<&'static str>,
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<'a, O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// What a single lexing step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Token(TokenKind),
    Whitespace,
    LineBreak,
}

/// An identifier. In a task definition a `-` directly followed by `>` is
/// the start of an arrow, so `0->next` lexes as `0`, `->`, `next`.
fn identifier<'a>(input: &mut Input<'a>, dialect: Dialect) -> IResult<'a, Lexeme> {
    let start = one_of(move |c: char| is_identifier_start(c, dialect));
    match dialect {
        Dialect::Stream => (start, take_while(0.., is_identifier_part))
            .value(Lexeme::Token(TokenKind::Identifier))
            .parse_next(input),
        Dialect::Task => (
            start,
            repeat::<_, _, (), _, _>(
                0..,
                alt((
                    one_of(|c: char| c != '-' && is_identifier_part(c)).void(),
                    ('-', not('>')).void(),
                )),
            ),
        )
            .value(Lexeme::Token(TokenKind::Identifier))
            .parse_next(input),
    }
}

/// A quoted literal. The quote character doubled is an escaped quote.
fn quoted_literal<'a>(input: &mut Input<'a>, quote: char, code: ErrorCode) -> IResult<'a, Lexeme> {
    let start = input.current_token_start();
    (
        quote,
        cut_err(terminated(
            repeat::<_, _, (), _, _>(0.., alt(((quote, quote).void(), none_of([quote]).void()))),
            quote,
        ))
        .context(LexerDiagnostic {
            code,
            insert: None,
            start,
        }),
    )
        .value(Lexeme::Token(TokenKind::LiteralString))
        .parse_next(input)
}

fn string_literal<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    alt((
        |i: &mut Input<'a>| quoted_literal(i, '\'', ErrorCode::E107),
        |i: &mut Input<'a>| quoted_literal(i, '"', ErrorCode::E106),
    ))
    .parse_next(input)
}

/// A character of a two character operator that must come in pairs.
fn paired<'a>(
    input: &mut Input<'a>,
    first: char,
    second: char,
    kind: TokenKind,
    code: ErrorCode,
    insert: Option<&'static str>,
) -> IResult<'a, Lexeme> {
    let start = input.current_token_start();
    preceded(
        first,
        cut_err(second).context(LexerDiagnostic {
            code,
            insert,
            start,
        }),
    )
    .value(Lexeme::Token(kind))
    .parse_next(input)
}

fn whitespace<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    take_while(1.., [' ', '\t', '\r'])
        .value(Lexeme::Whitespace)
        .parse_next(input)
}

/// A backslash is only meaningful inside quotes.
fn escape<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    let start = input.current_token_start();
    let backslash: IResult<'a, char> = '\\'.parse_next(input);
    backslash?;
    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        LexerDiagnostic {
            code: ErrorCode::E114,
            insert: None,
            start,
        },
    )))
}

fn stream_operator<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    alt((
        |i: &mut Input<'a>| paired(i, '-', '-', TokenKind::DoubleMinus, ErrorCode::E108, Some("-")),
        "||".value(Lexeme::Token(TokenKind::DoublePipe)),
        '|'.value(Lexeme::Token(TokenKind::Pipe)),
        '&'.value(Lexeme::Token(TokenKind::And)),
        '='.value(Lexeme::Token(TokenKind::Equals)),
        '>'.value(Lexeme::Token(TokenKind::Gt)),
        ':'.value(Lexeme::Token(TokenKind::Colon)),
        ';'.value(Lexeme::Token(TokenKind::SemiColon)),
        '.'.value(Lexeme::Token(TokenKind::Dot)),
    ))
    .parse_next(input)
}

fn stream_punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    alt((
        '@'.value(Lexeme::Token(TokenKind::Reference)),
        '*'.value(Lexeme::Token(TokenKind::Star)),
        '/'.value(Lexeme::Token(TokenKind::Slash)),
        '#'.value(Lexeme::Token(TokenKind::Hash)),
        '\n'.value(Lexeme::Token(TokenKind::Newline)),
    ))
    .parse_next(input)
}

fn stream_lexeme<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    alt((
        |i: &mut Input<'a>| identifier(i, Dialect::Stream),
        string_literal,
        stream_operator,
        stream_punctuation,
        whitespace,
        escape,
    ))
    .parse_next(input)
}

fn task_operator<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    alt((
        "--".value(Lexeme::Token(TokenKind::DoubleMinus)),
        |i: &mut Input<'a>| paired(i, '-', '>', TokenKind::Arrow, ErrorCode::E152, None),
        |i: &mut Input<'a>| paired(i, '&', '&', TokenKind::AndAnd, ErrorCode::E150, None),
        |i: &mut Input<'a>| paired(i, '|', '|', TokenKind::DoublePipe, ErrorCode::E151, None),
        '='.value(Lexeme::Token(TokenKind::Equals)),
    ))
    .parse_next(input)
}

fn task_punctuation<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    alt((
        '('.value(Lexeme::Token(TokenKind::OpenParen)),
        ')'.value(Lexeme::Token(TokenKind::CloseParen)),
        '<'.value(Lexeme::Token(TokenKind::Lt)),
        '>'.value(Lexeme::Token(TokenKind::Gt)),
        ':'.value(Lexeme::Token(TokenKind::Colon)),
        ';'.value(Lexeme::Token(TokenKind::SemiColon)),
        '*'.value(Lexeme::Token(TokenKind::Star)),
        '.'.value(Lexeme::Token(TokenKind::Dot)),
        '\n'.value(Lexeme::LineBreak),
    ))
    .parse_next(input)
}

fn task_lexeme<'a>(input: &mut Input<'a>) -> IResult<'a, Lexeme> {
    alt((
        |i: &mut Input<'a>| identifier(i, Dialect::Task),
        string_literal,
        task_operator,
        task_punctuation,
        whitespace,
        escape,
    ))
    .parse_next(input)
}

/// Length and kind of a relaxed argument value at the start of `rest`.
///
/// The first character is always part of the value. A value wrapped by a
/// single pair of matching quotes is a literal, anything else an identifier.
fn scan_arg_value(rest: &str) -> std::result::Result<(usize, TokenKind), ErrorCode> {
    let chars: Vec<(usize, char)> = rest.char_indices().collect();
    let mut index = 0;
    let mut quote_open = false;
    let mut closed_count = 0;
    let mut quote_in_use = None;

    if let Some(&(_, first)) = chars.first()
        && is_quote(first)
    {
        quote_open = true;
        quote_in_use = Some(first);
        index = 1;
    }

    while let Some(&(_, ch)) = chars.get(index) {
        let toggles = match quote_in_use {
            Some(quote) => ch == quote,
            None => is_quote(ch),
        };
        if toggles {
            let escaped = quote_in_use == Some('\'')
                && chars.get(index + 1).is_some_and(|&(_, next)| next == '\'');
            if escaped {
                index += 1;
            } else {
                quote_open = !quote_open;
                if !quote_open {
                    closed_count += 1;
                }
            }
        }
        index += 1;
        match chars.get(index) {
            Some(&(_, next)) if !is_arg_value_terminator(next, quote_open) => {}
            _ => break,
        }
    }

    let len = chars.get(index).map_or(rest.len(), |&(offset, _)| offset);
    match quote_in_use {
        Some('"') if closed_count == 0 => return Err(ErrorCode::E106),
        Some(_) if closed_count == 0 => return Err(ErrorCode::E107),
        _ => {}
    }

    let value = &rest[..len];
    let wrapped = value.len() > 1
        && value
            .chars()
            .next()
            .is_some_and(|first| is_quote(first) && value.ends_with(first));
    if closed_count == 1 && wrapped {
        Ok((len, TokenKind::LiteralString))
    } else {
        Ok((len, TokenKind::Identifier))
    }
}

/// Lexer that accumulates tokens and line breaks.
struct Lexer<'a> {
    expression: &'a str,
    dialect: Dialect,
    tokens: Vec<Token<'a>>,
    line_breaks: Vec<usize>,
}

impl<'a> Lexer<'a> {
    fn new(expression: &'a str, dialect: Dialect) -> Self {
        Self {
            expression,
            dialect,
            tokens: Vec::new(),
            line_breaks: Vec::new(),
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        let data = &self.expression[start..end];
        self.tokens.push(Token::new(kind, data, Span::new(start..end)));
    }

    fn tokenize(&mut self, mut input: Input<'a>) -> Result<()> {
        let mut after_equals = false;
        while !input.is_empty() {
            if std::mem::take(&mut after_equals) {
                let rest: &'a str = *input;
                match rest.chars().next() {
                    Some(ch @ ('|' | ';' | '>')) => {
                        let start = input.current_token_start();
                        return Err(ErrorCode::E105
                            .diagnostic(Span::new(start..start + 1), &[&ch.to_string()]));
                    }
                    Some(ch) if !is_whitespace(ch) => self.arg_value(&mut input)?,
                    _ => {}
                }
                continue;
            }

            let start = input.current_token_start();
            let lexeme = match self.dialect {
                Dialect::Stream => stream_lexeme(&mut input),
                Dialect::Task => task_lexeme(&mut input),
            }
            .map_err(|err| self.convert_err_mode(err, start, input.current_token_start()))?;
            let end = input.current_token_start();

            match lexeme {
                Lexeme::Token(kind) => {
                    after_equals = kind == TokenKind::Equals;
                    self.push(kind, start, end);
                }
                Lexeme::LineBreak => self.line_breaks.push(start),
                Lexeme::Whitespace => {}
            }
        }
        Ok(())
    }

    fn arg_value(&mut self, input: &mut Input<'a>) -> Result<()> {
        let start = input.current_token_start();
        let rest: &'a str = **input;
        match scan_arg_value(rest) {
            Ok((len, kind)) => {
                input.next_slice(len);
                self.push(kind, start, start + len);
                Ok(())
            }
            Err(code) => Err(code.diagnostic(Span::new(start..start + 1), &[])),
        }
    }

    /// Convert a winnow error into a diagnostic.
    ///
    /// Falls back to the dialect's "unexpected data" code, citing the
    /// offending character, when no context is attached.
    fn convert_err_mode(
        &self,
        err: ErrMode<ContextError<LexerDiagnostic>>,
        start: usize,
        error_pos: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            insert,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start + 1));
            let inserts: Vec<&str> = insert.iter().copied().collect();
            return code.diagnostic(span, &inserts);
        }

        let unexpected = self.expression[start..].chars().next().unwrap_or_default();
        let span = Span::new(start..start + unexpected.len_utf8());
        let code = match self.dialect {
            Dialect::Stream => ErrorCode::E115,
            Dialect::Task => ErrorCode::E162,
        };
        code.diagnostic(span, &[&unexpected.to_string()])
    }

    fn finish(self) -> TokenStream<'a> {
        TokenStream {
            expression: self.expression,
            tokens: self.tokens,
            line_breaks: self.line_breaks,
        }
    }
}

/// Tokenize a definition in the given dialect.
///
/// # Errors
///
/// Returns the diagnostic of the first lexical error.
pub fn tokenize(expression: &str, dialect: Dialect) -> Result<TokenStream<'_>> {
    let mut lexer = Lexer::new(expression, dialect);
    lexer.tokenize(LocatingSlice::new(expression))?;
    let stream = lexer.finish();
    log::trace!(dialect:?, tokens = stream.tokens.len(); "Tokenized definition");
    Ok(stream)
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Identifiers accepted by both dialects.
    fn identifier_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z_][a-zA-Z0-9_$-]{0,16}"
    }

    /// Argument values without quotes or terminators.
    fn plain_value_strategy() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9.+()*/_-]{1,20}"
    }

    // ===================
    // Property Test Functions
    // ===================

    fn check_identifier_round_trip(id: &str) -> std::result::Result<(), TestCaseError> {
        for dialect in [Dialect::Stream, Dialect::Task] {
            let stream = tokenize(id, dialect);
            prop_assert!(stream.is_ok(), "failed to tokenize `{id}`: {stream:?}");
            let stream = stream.unwrap();
            prop_assert_eq!(stream.tokens.len(), 1);
            prop_assert_eq!(stream.tokens[0].data, id);
        }
        Ok(())
    }

    fn check_plain_value_is_one_token(
        name: &str,
        value: &str,
    ) -> std::result::Result<(), TestCaseError> {
        let source = format!("app --{name}={value} | log");
        let stream = tokenize(&source, Dialect::Stream);
        prop_assert!(stream.is_ok(), "failed to tokenize `{source}`: {stream:?}");
        let stream = stream.unwrap();
        prop_assert_eq!(stream.tokens[4].data, value);
        prop_assert_eq!(stream.tokens[5].kind, TokenKind::Pipe);
        Ok(())
    }

    fn check_spans_cover_data(source: &str) -> std::result::Result<(), TestCaseError> {
        if let Ok(stream) = tokenize(source, Dialect::Task) {
            for token in &stream.tokens {
                prop_assert_eq!(&source[token.start()..token.end()], token.data);
            }
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn identifiers_tokenize(id in identifier_strategy()) {
            check_identifier_round_trip(&id)?;
        }

        #[test]
        fn plain_values_are_single_tokens(
            name in identifier_strategy(),
            value in plain_value_strategy(),
        ) {
            check_plain_value_is_one_token(&name, &value)?;
        }

        #[test]
        fn spans_cover_data(source in "[a-z<>|&:;() '=-]{0,30}") {
            check_spans_cover_data(&source)?;
        }
    }
}
