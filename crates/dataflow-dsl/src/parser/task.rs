//! Composed task definition parser.
//!
//! ```text
//! task       := sequence ((';' | line break) sequence)*
//! sequence   := node ('&&' node)*
//! node       := '(' sequence ')' | [label ':'] (split | app)
//! split      := '<' sequence ('||' sequence)* '>'
//! app        := name argument* transition*
//! transition := (exit code | '*' | quoted status) '->' (':' label | [label ':'] app)
//! ```
//!
//! Nested flows are flattened, so `(a && b) && c` is one flow of three apps.

use super::eat_app_args;
use crate::{
    ast::{FlowNode, SplitNode, TaskAppNode, TaskElement, TaskNode, TransitionNode, TransitionTarget},
    cursor::Tokens,
    error::{DiagnosticCollector, ErrorCode, ParseError, Result},
    lexer::{Dialect, is_valid_name, tokenize},
    span::{Span, Spanned},
    tokens::{Token, TokenKind},
    validate::validate_task,
};

/// Parse a composed task definition.
///
/// With `in_app_mode` apps may carry `--name=value` arguments; otherwise the
/// definition only references apps and arguments are rejected. With
/// `validate` the parsed tree is checked by
/// [`validate_task`](crate::validate::validate_task) and every problem found
/// is reported together.
///
/// An empty definition parses to a task without sequences.
///
/// # Errors
///
/// Returns a [`ParseError`] with the first syntax error, or with all
/// validation errors.
pub fn parse_task(
    name: Option<&str>,
    dsl: &str,
    in_app_mode: bool,
    validate: bool,
) -> std::result::Result<TaskNode, ParseError> {
    let stream = tokenize(dsl, Dialect::Task)
        .map_err(|diag| ParseError::from(diag).with_source(dsl, 0))?;
    let mut parser = TaskParser {
        tokens: Tokens::new(stream),
        in_app_mode,
    };
    let node = parser.parse(name).map_err(|diag| {
        ParseError::from(diag).with_source(dsl, parser.tokens.checkpoint_offset())
    })?;

    if validate {
        let mut collector = DiagnosticCollector::new();
        for diagnostic in validate_task(&node) {
            collector.emit(diagnostic);
        }
        collector
            .finish()
            .map_err(|err| err.with_source(dsl, 0))?;
    }

    log::debug!(
        sequences = node.sequences.len(),
        composed = node.is_composed();
        "Parsed task definition"
    );
    Ok(node)
}

struct TaskParser<'a> {
    tokens: Tokens<'a>,
    in_app_mode: bool,
}

impl<'a> TaskParser<'a> {
    fn parse(&mut self, name: Option<&str>) -> Result<TaskNode> {
        let sequences = self.eat_sequences()?;
        if let Some(name) = name
            && !is_valid_name(name)
        {
            return Err(ErrorCode::E123.diagnostic(Span::new(0..0), &[name]));
        }
        if let Some(token) = self.tokens.peek() {
            return Err(ErrorCode::E163.diagnostic(token.span, &[token.text()]));
        }
        Ok(TaskNode {
            name: name.map(str::to_string),
            dsl: self.tokens.expression().trim().to_string(),
            sequences,
        })
    }

    fn eat_sequences(&mut self) -> Result<Vec<FlowNode>> {
        if !self.tokens.has_next() {
            return Ok(Vec::new());
        }
        let mut sequences = vec![self.parse_task_node()?];
        while self.tokens.has_next()
            && (self.next_token_is_on_new_line()
                || self.tokens.eat_if(TokenKind::SemiColon).is_some())
        {
            sequences.push(self.parse_task_node()?);
        }
        Ok(sequences)
    }

    fn next_token_is_on_new_line(&self) -> bool {
        match (self.tokens.previous(), self.tokens.peek()) {
            (Some(last), Some(next)) => self.tokens.line_of(&next) > self.tokens.line_of(&last),
            _ => false,
        }
    }

    fn parse_task_node(&mut self) -> Result<FlowNode> {
        if self.tokens.eat_if(TokenKind::OpenParen).is_some() {
            let inner = self.parse_task_node()?;
            self.tokens.eat(TokenKind::CloseParen)?;
            return self.parse_flow(inner.series);
        }

        let label = self.maybe_eat_label()?;
        if label.is_some() {
            if let Some(paren) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::OpenParen)) {
                return Err(ErrorCode::E155.diagnostic(paren.span, &[]));
            }
            if let Some(second) = self.maybe_eat_label()? {
                return Err(ErrorCode::E156.diagnostic(second.span, &[]));
            }
        }

        let first = if self.tokens.peek_kind(TokenKind::Lt) {
            let mut split = self.parse_split()?;
            split.label = label.map(spanned);
            TaskElement::Split(split)
        } else {
            let mut app = self.eat_task_app(true)?;
            app.label = label.map(spanned);
            TaskElement::App(app)
        };
        self.parse_flow(vec![first])
    }

    /// Continue a flow with `&& node` for as long as there is one.
    fn parse_flow(&mut self, mut series: Vec<TaskElement>) -> Result<FlowNode> {
        while self.tokens.eat_if(TokenKind::AndAnd).is_some() {
            let next = self.parse_task_node()?;
            series.extend(next.series);
        }
        let span = series
            .iter()
            .map(TaskElement::span)
            .reduce(|span, next| span.union(next))
            .unwrap_or_default();
        Ok(FlowNode { series, span })
    }

    fn parse_split(&mut self) -> Result<SplitNode> {
        let lt = self.tokens.eat(TokenKind::Lt)?;
        let mut flows = vec![self.parse_task_node()?];
        while self.tokens.eat_if(TokenKind::DoublePipe).is_some() {
            flows.push(self.parse_task_node()?);
        }
        let gt = self.tokens.eat(TokenKind::Gt)?;
        Ok(SplitNode {
            label: None,
            flows,
            span: Span::new(lt.start()..gt.end()),
        })
    }

    fn maybe_eat_label(&mut self) -> Result<Option<Token<'a>>> {
        let is_label = self.tokens.peek_kind(TokenKind::Identifier)
            && self
                .tokens
                .peek_at(1)
                .is_some_and(|t| t.is_kind(TokenKind::Colon));
        if !is_label {
            return Ok(None);
        }
        let label = self.tokens.next()?;
        self.tokens.eat(TokenKind::Colon)?;
        Ok(Some(label))
    }

    fn eat_task_app(&mut self, transitions_allowed: bool) -> Result<TaskAppNode> {
        let name = self.tokens.next()?;
        if !name.is_kind(TokenKind::Identifier) {
            return Err(ErrorCode::E118.diagnostic(name.span, &[name.text()]));
        }
        self.tokens.checkpoint();

        let arguments = if self.in_app_mode {
            eat_app_args(&mut self.tokens)?
        } else {
            if let Some(dashes) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::DoubleMinus)) {
                return Err(ErrorCode::E168.diagnostic(dashes.span, &[]));
            }
            Vec::new()
        };
        let transitions = if transitions_allowed {
            self.maybe_eat_transitions()?
        } else {
            Vec::new()
        };

        let end = transitions
            .last()
            .map(|transition| transition.span.end())
            .or_else(|| arguments.last().map(|arg| arg.span.end()))
            .unwrap_or(name.end());
        Ok(TaskAppNode {
            label: None,
            name: spanned(name),
            arguments,
            transitions,
            span: Span::new(name.start()..end),
        })
    }

    fn maybe_eat_transitions(&mut self) -> Result<Vec<TransitionNode>> {
        let mut transitions = Vec::new();
        loop {
            if let Some(arrow) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::Arrow)) {
                return Err(ErrorCode::E157.diagnostic(arrow.span, &[]));
            }
            let Some(status) = self.tokens.peek() else {
                break;
            };
            if !matches!(
                status.kind,
                TokenKind::Identifier | TokenKind::LiteralString | TokenKind::Star
            ) {
                break;
            }
            let arrow_follows = self
                .tokens
                .peek_at(1)
                .is_some_and(|t| t.is_kind(TokenKind::Arrow));
            if !arrow_follows {
                // An identifier here may start the next sequence.
                if status.is_kind(TokenKind::Identifier) {
                    break;
                }
                return Err(ErrorCode::E153.diagnostic(status.span, &[]));
            }
            self.tokens.next()?;
            self.tokens.next()?;

            let target = if self.tokens.eat_if(TokenKind::Colon).is_some() {
                TransitionTarget::Label(spanned(self.tokens.eat(TokenKind::Identifier)?))
            } else {
                let label = self.maybe_eat_label()?;
                let mut app = self.eat_task_app(false)?;
                app.label = label.map(spanned);
                TransitionTarget::App(app)
            };

            let transition = TransitionNode::new(
                spanned(status),
                status.is_kind(TokenKind::LiteralString),
                target,
            );
            if transition.exit_code_check
                && transition.status_to_check != "*"
                && transition.status_to_check.parse::<i32>().is_err()
            {
                return Err(
                    ErrorCode::E154.diagnostic(status.span, &[&transition.status_to_check])
                );
            }
            transitions.push(transition);
        }
        Ok(transitions)
    }
}

fn spanned(token: Token<'_>) -> Spanned<String> {
    Spanned::new(token.data.to_string(), token.span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(dsl: &str) -> TaskNode {
        parse_task(Some("test"), dsl, true, true).unwrap()
    }

    fn check_error(dsl: &str, code: ErrorCode, position: usize) -> ParseError {
        let err = parse_task(Some("test"), dsl, true, true).unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(code), "for {dsl}: {}", diag.message());
        assert_eq!(err.position(), position, "for {dsl}");
        err
    }

    fn first_app(task: &TaskNode) -> &TaskAppNode {
        match &task.sequences[0].series[0] {
            TaskElement::App(app) => app,
            TaskElement::Split(split) => panic!("expected an app, found {}", split.stringify(false)),
        }
    }

    #[test]
    fn test_single_app() {
        let task = parse("gemfire-cq");
        assert_eq!(first_app(&task).stringify(true), "gemfire-cq:0>10");

        let task = parse("foo --name=value --x=y");
        let app = first_app(&task);
        assert_eq!(app.arguments.len(), 2);
        assert_eq!(app.span, Span::new(0..22));
    }

    #[test]
    fn test_argument_values() {
        let cases = [
            ("transform --expression=--payload", "--payload"),
            (
                "transform --expression='new StringBuilder(payload).reverse()'",
                "new StringBuilder(payload).reverse()",
            ),
            ("transform --expression=\"'Hello, world!'\"", "'Hello, world!'"),
            ("transform --expression='''Hello, world!'''", "'Hello, world!'"),
            ("filter --expression=\"payload == 'foo'\"", "payload == 'foo'"),
            (
                "transform --expression='payload.replace(\"abc\", '''')'",
                "payload.replace(\"abc\", '')",
            ),
        ];
        for (dsl, expected) in cases {
            assert_eq!(first_app(&parse(dsl)).arguments[0].value, expected, "for {dsl}");
        }
    }

    #[test]
    fn test_flows_and_splits() {
        assert_eq!(parse("FooApp  &&  BarApp").stringify(true), "FooApp:0>6 && BarApp:12>18");
        assert_eq!(parse("<FooApp || BarApp>").to_dsl(), "<FooApp || BarApp>");

        let task = parse("(aaa: appA && appB) && appC");
        assert_eq!(task.sequences[0].series.len(), 3);
        assert_eq!(task.start().and_then(FlowNode::label).map(Spanned::as_str), Some("aaa"));

        let task = parse("outer:<aaa: appA || bbb: appB>");
        match &task.sequences[0].series[0] {
            TaskElement::Split(split) => {
                assert_eq!(split.label.as_ref().map(Spanned::as_str), Some("outer"));
                assert_eq!(split.flows.len(), 2);
                assert_eq!(split.span, Span::new(6..30));
            }
            TaskElement::App(_) => panic!("expected a split"),
        }
    }

    #[test]
    fn test_line_breaks_inside_a_flow() {
        for dsl in [
            "FooApp &&\nBarApp",
            "FooApp\n&& BarApp",
            "FooApp\n&&\nBarApp",
            "<FooApp ||\nBarApp>",
            "<\nFooApp ||\nBarApp\n>",
        ] {
            assert_eq!(parse(dsl).sequences.len(), 1, "for {dsl:?}");
        }

        let task = parse_task(None, "FooApp\n 0\n->:a\n 1->:b\n &&\nBarApp 2->:c 3->:d", true, false)
            .unwrap();
        assert_eq!(task.sequences.len(), 1);
        assert_eq!(first_app(&task).transitions.len(), 2);
    }

    #[test]
    fn test_sequences() {
        let task = parse_task(None, "appA;appB", false, false).unwrap();
        assert_eq!(task.sequences.len(), 2);

        let task = parse("appA\n  0->:foo\n  *->appB\n  && appE;foo: appC && appD");
        assert_eq!(task.sequences.len(), 2);
        assert_eq!(task.sequences[0].series.len(), 2);
        assert!(task.sequence_with_label("foo").is_some());
    }

    #[test]
    fn test_transitions() {
        let task = parse("App1 0->App2 'abc' ->   App3");
        let app = first_app(&task);
        assert_eq!(app.transitions.len(), 2);
        assert!(app.transitions[0].exit_code_check);
        assert_eq!(app.transitions[1].status_to_check, "abc");
        assert_eq!(app.transitions[1].span, Span::new(13..28));

        let task = parse("App1 *->App2 '*'->App3");
        let app = first_app(&task);
        assert!(app.transitions[0].exit_code_check);
        assert!(!app.transitions[1].exit_code_check);

        let task = parse("t1: timestamp 'FAILED'->t2: timestamp && t3: timestamp");
        let target = first_app(&task).transitions[0].target_app().unwrap();
        assert_eq!(target.label(), Some("t2"));
        assert_eq!(target.name(), "timestamp");
    }

    #[test]
    fn test_app_mode() {
        let err = parse_task(Some("foo"), "appA --p1=v1", false, true).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E168));
        assert_eq!(err.position(), 5);

        assert!(parse_task(Some("foo"), "appA --p1=v1", true, true).is_ok());
    }

    #[test]
    fn test_empty_definition() {
        let task = parse_task(None, "", true, true).unwrap();
        assert!(task.sequences.is_empty());
        assert!(task.start().is_none());
    }

    #[test]
    fn test_task_names() {
        assert!(parse_task(Some("foo-bar"), "task", true, true).is_ok());
        assert!(parse_task(Some("foo_bar"), "task", true, true).is_ok());

        let err = parse_task(Some("foo.bar"), "task", true, true).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E123));
        assert_eq!(err.position(), 0);
    }

    #[test]
    fn test_syntax_errors() {
        check_error("transform --expression=''Hello, world!''", ErrorCode::E162, 37);
        check_error(".", ErrorCode::E118, 0);
        check_error(";", ErrorCode::E118, 0);
        check_error("foo bar=yyy", ErrorCode::E163, 4);
        check_error("foo bar", ErrorCode::E163, 4);
        check_error("|", ErrorCode::E151, 0);
        check_error("<aa | bb>", ErrorCode::E151, 4);
        check_error("<aa ||| bb>", ErrorCode::E151, 6);
        check_error("aa  &&&& bb", ErrorCode::E118, 6);
        check_error("<a || b> rubbish", ErrorCode::E163, 9);
        check_error("foo ||->bar", ErrorCode::E163, 4);
    }

    #[test]
    fn test_argument_errors() {
        check_error("aaa --bbb= --ccc=ddd", ErrorCode::E105, 11);
        check_error("aaa --bbb=; --ccc=ddd", ErrorCode::E105, 10);
        check_error("foo --", ErrorCode::E112, 6);
        check_error("foo --bar", ErrorCode::E112, 9);
        check_error("foo --bar=", ErrorCode::E112, 10);
        check_error("foo -- name=value", ErrorCode::E101, 7);
        check_error("foo --name =value", ErrorCode::E102, 11);
        check_error("foo --name= value", ErrorCode::E103, 12);
        check_error("foo --name.=value", ErrorCode::E111, 11);
        check_error("timestamp --format='YYYY", ErrorCode::E107, 19);
        check_error("timestamp --format=\"YYYY", ErrorCode::E106, 19);
    }

    #[test]
    fn test_label_errors() {
        check_error("aaa: (appA)", ErrorCode::E155, 5);
        check_error("aaa: bbb: appA", ErrorCode::E156, 5);
        check_error("aaa: >", ErrorCode::E118, 5);
        check_error("aaa: &&", ErrorCode::E118, 5);
        check_error("aaa:: appA", ErrorCode::E118, 4);
    }

    #[test]
    fn test_transition_errors() {
        check_error("App1 ->", ErrorCode::E157, 5);
        check_error("App1 0->x ->", ErrorCode::E157, 10);
        check_error("App1 ->xx", ErrorCode::E157, 5);
        check_error("App1 xx->", ErrorCode::E112, 9);
        check_error("App1 'xx' App2", ErrorCode::E153, 5);

        let err = check_error("appA BROKEN->$FAIL", ErrorCode::E154, 5);
        assert_eq!(
            err.diagnostics()[0].message(),
            "transition conditions must be quoted literals, numerics or '*' but 'BROKEN' is not"
        );
        check_error("appA\n BROKEN->$FAIL", ErrorCode::E154, 6);
        check_error("A abc->B", ErrorCode::E154, 2);
    }

    #[test]
    fn test_checkpoint() {
        let err = parse_task(None, "appA && appB --p1", true, true).unwrap_err();
        assert_eq!(err.checkpoint(), 12);
        assert_eq!(err.position(), 17);
    }

    #[test]
    fn test_validation_problems_are_reported_together() {
        let err = parse_task(
            None,
            "<1: jdbchdfs-local && spark-client && timestamp || spark-cluster && \
             spark-cluster && timestamp || spark-yarn>",
            true,
            true,
        )
        .unwrap_err();
        let positions: Vec<_> = err
            .diagnostics()
            .iter()
            .map(|diag| (diag.code(), diag.position()))
            .collect();
        assert_eq!(
            positions,
            vec![
                (Some(ErrorCode::E166), Some(68)),
                (Some(ErrorCode::E166), Some(85)),
            ]
        );
        assert_eq!(err.to_string(), format!("{} (+1 more)", err.diagnostics()[0]));
    }
}
