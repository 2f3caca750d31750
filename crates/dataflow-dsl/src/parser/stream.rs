//! Stream definition parser.
//!
//! ```text
//! stream      := [name '='] [source '>'] apps ['>' sink]
//! apps        := app (('|' | '||') app)*
//! app         := [label ':'] name argument*
//! source/sink := ':' destination argument* | prefix ':' channel
//! ```
//!
//! `:in > :out` with no app in between gets a `bridge` app.

use indexmap::IndexMap;

use super::eat_app_args;
use crate::{
    ast::{AppNode, ChannelNode, ChannelType, StreamNode},
    cursor::Tokens,
    error::{ErrorCode, ParseError, Result},
    lexer::{Dialect, is_valid_name, tokenize},
    span::{Span, Spanned},
    tokens::{Token, TokenKind},
};

const BRIDGE_APP: &str = "bridge";

/// Parse a stream definition.
///
/// `name` is the name the stream is registered under. It must be a legal
/// name and must not be the name of one of the stream's apps.
///
/// # Errors
///
/// Returns a [`ParseError`] with the diagnostic of the first problem.
pub fn parse_stream(name: Option<&str>, dsl: &str) -> std::result::Result<StreamNode, ParseError> {
    let stream = tokenize(dsl, Dialect::Stream)
        .map_err(|diag| ParseError::from(diag).with_source(dsl, 0))?;
    let mut parser = StreamParser {
        tokens: Tokens::new(stream),
    };
    let node = parser.parse(name).map_err(|diag| {
        ParseError::from(diag).with_source(dsl, parser.tokens.checkpoint_offset())
    })?;
    log::debug!(apps = node.apps.len(); "Parsed stream definition");
    Ok(node)
}

struct StreamParser<'a> {
    tokens: Tokens<'a>,
}

impl<'a> StreamParser<'a> {
    fn parse(&mut self, name: Option<&str>) -> Result<StreamNode> {
        let node = self.eat_stream()?;

        for stream_name in [node.name(), name].into_iter().flatten() {
            if !is_valid_name(stream_name) {
                return Err(ErrorCode::E122.diagnostic(Span::new(0..0), &[stream_name]));
            }
        }
        check_unique_labels(&node)?;
        if let Some(name) = name
            && node.apps.iter().any(|app| app.name() == name)
        {
            let position = node.dsl.find(name).unwrap_or_default();
            return Err(ErrorCode::E130.diagnostic(
                Span::new(position..position + name.len()),
                &[name],
            ));
        }
        if let Some(token) = self.tokens.peek() {
            return Err(ErrorCode::E104.diagnostic(token.span, &[token.text()]));
        }
        Ok(node)
    }

    fn eat_stream(&mut self) -> Result<StreamNode> {
        let name = self.eat_stream_name()?;
        let source = self.eat_source()?;

        let bridge = source.is_some()
            && (self.looks_like_destination() || self.looks_like_channel())
            && !self.tokens.any_remaining(TokenKind::Pipe);
        let apps = if bridge {
            // Step back onto the '>' so the sink is parsed as usual.
            self.tokens.decrement_position();
            let gt = self.tokens.peek().ok_or_else(|| self.tokens.out_of_data())?;
            vec![AppNode {
                label: None,
                name: Spanned::new(BRIDGE_APP.to_string(), gt.span),
                arguments: Vec::new(),
                unbound: false,
                span: gt.span,
            }]
        } else {
            self.eat_app_list(source.is_some())?
        };
        let sink = self.eat_sink()?;

        if let Some(token) = self.tokens.peek() {
            let after_gt = self
                .tokens
                .previous()
                .is_some_and(|previous| previous.is_kind(TokenKind::Gt));
            let code = if !apps.is_empty() && sink.is_none() && after_gt {
                ErrorCode::E133
            } else {
                ErrorCode::E100
            };
            return Err(code.diagnostic(token.span, &[token.text()]));
        }

        Ok(StreamNode {
            name,
            dsl: self.tokens.expression().to_string(),
            apps,
            source,
            sink,
        })
    }

    /// `name =` at the start of the definition.
    fn eat_stream_name(&mut self) -> Result<Option<String>> {
        if !self.tokens.look_ahead(1, TokenKind::Equals) {
            return Ok(None);
        }
        match self.tokens.next()? {
            name if name.is_kind(TokenKind::Identifier) => {
                self.tokens.next()?;
                Ok(Some(name.data.to_string()))
            }
            other => Err(ErrorCode::E122.diagnostic(other.span, &[other.text()])),
        }
    }

    /// A source endpoint, recognized by a `>` ahead of the first `|`.
    fn eat_source(&mut self) -> Result<Option<ChannelNode>> {
        let gt_before_pipe = self.tokens.tokens()[self.tokens.position()..]
            .iter()
            .find(|token| token.is_kind(TokenKind::Gt) || token.is_kind(TokenKind::Pipe))
            .is_some_and(|token| token.is_kind(TokenKind::Gt));
        if !gt_before_pipe {
            return Ok(None);
        }

        let channel = if self.tokens.peek_kind(TokenKind::Colon) {
            self.eat_destination()?
        } else if self.looks_like_channel() {
            self.eat_channel(true)?
        } else {
            return Ok(None);
        };
        self.tokens.eat(TokenKind::Gt)?;
        Ok(Some(channel))
    }

    fn eat_sink(&mut self) -> Result<Option<ChannelNode>> {
        if self.tokens.eat_if(TokenKind::Gt).is_none() {
            return Ok(None);
        }
        if self.tokens.peek_kind(TokenKind::Colon) {
            self.eat_destination().map(Some)
        } else if self.looks_like_channel() {
            self.eat_channel(false).map(Some)
        } else {
            Ok(None)
        }
    }

    /// A `:` right after a `>`.
    fn looks_like_destination(&self) -> bool {
        self.tokens.peek_kind(TokenKind::Colon)
            && self
                .tokens
                .previous()
                .is_some_and(|previous| previous.is_kind(TokenKind::Gt))
    }

    /// `prefix:name` with no whitespace, which an app label never is.
    fn looks_like_channel(&self) -> bool {
        match (
            self.tokens.peek(),
            self.tokens.peek_at(1),
            self.tokens.peek_at(2),
        ) {
            (Some(prefix), Some(colon), Some(next)) => {
                prefix.is_kind(TokenKind::Identifier)
                    && colon.is_kind(TokenKind::Colon)
                    && prefix.end() == colon.start()
                    && colon.end() == next.start()
            }
            _ => false,
        }
    }

    fn eat_app_list(&mut self, source_specified: bool) -> Result<Vec<AppNode>> {
        let mut apps = vec![self.eat_app()?];
        let mut used_pipe = false;
        let mut used_double_pipe: Option<Token<'a>> = None;

        while let Some(token) = self.tokens.peek() {
            match token.kind {
                TokenKind::Pipe => {
                    if used_double_pipe.is_some() {
                        return Err(ErrorCode::E169.diagnostic(token.span, &[]));
                    }
                    used_pipe = true;
                }
                TokenKind::DoublePipe => {
                    if source_specified {
                        return Err(ErrorCode::E170.diagnostic(token.span, &[]));
                    }
                    if used_pipe {
                        return Err(ErrorCode::E169.diagnostic(token.span, &[]));
                    }
                    if used_double_pipe.is_none() {
                        used_double_pipe = Some(token);
                    }
                }
                _ => break,
            }
            self.tokens.next()?;
            apps.push(self.eat_app()?);
        }

        let followed_by_sink = self.tokens.peek_kind(TokenKind::Gt);
        if followed_by_sink && let Some(double_pipe) = used_double_pipe {
            return Err(ErrorCode::E170.diagnostic(double_pipe.span, &[]));
        }
        let unbound = !source_specified && !followed_by_sink && !used_pipe;
        for app in &mut apps {
            app.unbound = unbound;
        }
        Ok(apps)
    }

    fn eat_app(&mut self) -> Result<AppNode> {
        if let Some(colon) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::Colon))
            && self.tokens.len() == 1
        {
            return Err(ErrorCode::E148.diagnostic(colon.span, &[]));
        }
        let mut name = self.tokens.next()?;
        if !name.is_kind(TokenKind::Identifier) {
            return Err(ErrorCode::E118.diagnostic(name.span, &[name.text()]));
        }

        let mut label = None;
        if let Some(colon) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::Colon)) {
            if self.tokens.is_next_adjacent() {
                self.tokens.next()?;
                if let Some(next) = self.tokens.peek()
                    && self.tokens.is_next_adjacent()
                {
                    return Err(ErrorCode::E147.diagnostic(next.span, &[]));
                }
                label = Some(name);
                name = self.tokens.eat(TokenKind::Identifier)?;
                if self.tokens.peek_kind(TokenKind::Colon) && self.tokens.is_next_adjacent() {
                    return Err(ErrorCode::E156.diagnostic(name.span, &[]));
                }
            } else if let Some(next) = self.tokens.peek_at(1)
                && next.is_kind(TokenKind::Identifier)
                && colon.end() != next.start()
            {
                return Err(ErrorCode::E140.diagnostic(colon.span, &[]));
            }
        }

        self.tokens.checkpoint();
        let arguments = eat_app_args(&mut self.tokens)?;
        let start = label.map_or(name.start(), |label| label.start());
        let end = arguments.last().map_or(name.end(), |arg| arg.span.end());
        Ok(AppNode {
            label: label.map(spanned),
            name: spanned(name),
            arguments,
            unbound: false,
            span: Span::new(start..end),
        })
    }

    /// `:name.part` with optional arguments.
    fn eat_destination(&mut self) -> Result<ChannelNode> {
        let colon = self.tokens.eat(TokenKind::Colon)?;
        let first = match self.tokens.peek() {
            Some(token) if is_destination_component(&token) => token,
            Some(token) => {
                return Err(ErrorCode::E171.diagnostic(token.span, &[token.text()]));
            }
            None => {
                let at = colon.start();
                return Err(ErrorCode::E112.diagnostic(Span::new(at..at), &[]));
            }
        };
        self.tokens.next()?;

        let mut name = first.text().to_string();
        let mut span = first.span;
        span = self.eat_adjacent_components(&mut name, span)?;
        while let Some(dot) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::Dot)) {
            if !self.tokens.is_next_adjacent() {
                return Err(ErrorCode::E139.diagnostic(dot.span, &[]));
            }
            self.tokens.next()?;
            name.push('.');
            match self.tokens.peek() {
                Some(next) if !self.tokens.is_next_adjacent() => {
                    return Err(ErrorCode::E139.diagnostic(next.span, &[]));
                }
                Some(_) => {}
                None => return Err(self.tokens.out_of_data()),
            }
            span = self.eat_adjacent_components(&mut name, span)?;
        }

        let arguments = eat_app_args(&mut self.tokens)?;
        Ok(ChannelNode {
            channel_type: ChannelType::Destination,
            components: vec![name],
            index_components: Vec::new(),
            arguments,
            span,
        })
    }

    fn eat_adjacent_components(&mut self, name: &mut String, mut span: Span) -> Result<Span> {
        while self.tokens.is_next_adjacent()
            && self.tokens.peek().is_some_and(|t| is_destination_component(&t))
        {
            let token = self.tokens.next()?;
            name.push_str(token.text());
            span = span.union(token.span);
        }
        Ok(span)
    }

    /// `queue:name`, `topic:name` or `tap:scope:name(.index)*`.
    fn eat_channel(&mut self, tap_allowed: bool) -> Result<ChannelNode> {
        let prefix = self.tokens.eat(TokenKind::Identifier)?;
        let is_tap = prefix.data.eq_ignore_ascii_case("tap");
        let legal = prefix.data.eq_ignore_ascii_case("queue")
            || prefix.data.eq_ignore_ascii_case("topic")
            || (tap_allowed && is_tap);
        if !legal {
            let code = if tap_allowed {
                ErrorCode::E134
            } else {
                ErrorCode::E172
            };
            return Err(code.diagnostic(prefix.span, &[prefix.data]));
        }

        let mut scope_components = vec![prefix];
        while let Some(colon) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::Colon)) {
            if !self.tokens.is_next_adjacent() {
                return Err(ErrorCode::E139.diagnostic(colon.span, &[]));
            }
            self.tokens.next()?;
            self.reject_channel_gap()?;
            scope_components.push(self.tokens.eat(TokenKind::Identifier)?);
        }

        let mut index_components = Vec::new();
        if let Some(dot) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::Dot)) {
            if !is_tap {
                return Err(ErrorCode::E131.diagnostic(dot.span, &[]));
            }
            if scope_components.len() < 3 {
                return Err(ErrorCode::E141.diagnostic(prefix.span, &[]));
            }
            let scope = scope_components[1].data.to_ascii_lowercase();
            if !matches!(scope.as_str(), "stream" | "task" | "job") {
                return Err(ErrorCode::E132.diagnostic(dot.span, &[]));
            }
            while let Some(dot) = self.tokens.peek().filter(|t| t.is_kind(TokenKind::Dot)) {
                if !self.tokens.is_next_adjacent() {
                    return Err(ErrorCode::E139.diagnostic(dot.span, &[]));
                }
                self.tokens.next()?;
                self.reject_channel_gap()?;
                index_components.push(self.tokens.eat(TokenKind::Identifier)?);
            }
        }

        let channel_type = if is_tap {
            if scope_components.len() < 3 {
                return Err(ErrorCode::E141.diagnostic(prefix.span, &[]));
            }
            let scope = scope_components[1];
            match scope.data.to_ascii_lowercase().as_str() {
                "stream" => ChannelType::TapStream,
                "task" => ChannelType::TapTask,
                "job" => ChannelType::TapJob,
                "queue" => ChannelType::TapQueue,
                "topic" => ChannelType::TapTopic,
                _ => return Err(ErrorCode::E142.diagnostic(scope.span, &[scope.data])),
            }
        } else if prefix.data.eq_ignore_ascii_case("queue") {
            ChannelType::Queue
        } else {
            ChannelType::Topic
        };

        let skip = if is_tap { 2 } else { 1 };
        let last = index_components
            .last()
            .or(scope_components.last())
            .map_or(prefix.end(), Token::end);
        Ok(ChannelNode {
            channel_type,
            components: scope_components[skip..]
                .iter()
                .map(|token| token.data.to_string())
                .collect(),
            index_components: index_components
                .iter()
                .map(|token| token.data.to_string())
                .collect(),
            arguments: Vec::new(),
            span: Span::new(prefix.start()..last),
        })
    }

    fn reject_channel_gap(&self) -> Result<()> {
        match self.tokens.peek() {
            Some(next) if !self.tokens.is_next_adjacent() => {
                Err(ErrorCode::E139.diagnostic(next.span, &[]))
            }
            Some(_) => Ok(()),
            None => Err(self.tokens.out_of_data()),
        }
    }
}

fn is_destination_component(token: &Token<'_>) -> bool {
    matches!(
        token.kind,
        TokenKind::Identifier | TokenKind::Star | TokenKind::Slash | TokenKind::Hash
    )
}

fn spanned(token: Token<'_>) -> Spanned<String> {
    Spanned::new(token.data.to_string(), token.span)
}

/// Every app must be reachable by a distinct label or, without one, name.
fn check_unique_labels(node: &StreamNode) -> Result<()> {
    let mut seen: IndexMap<&str, &AppNode> = IndexMap::new();
    for (index, app) in node.apps.iter().enumerate() {
        let (previous_index, previous) = seen.insert_full(app.label_name(), app);
        if let Some(previous) = previous {
            let previous_index = previous_index.to_string();
            let index = index.to_string();
            return Err(ErrorCode::E143
                .diagnostic(
                    app.span,
                    &[
                        app.label_name(),
                        previous.name(),
                        &previous_index,
                        app.name(),
                        &index,
                    ],
                )
                .with_secondary_label(previous.span, "first used here"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(dsl: &str) -> StreamNode {
        parse_stream(None, dsl).unwrap()
    }

    fn check_error(dsl: &str, code: ErrorCode, position: usize) -> ParseError {
        let err = parse_stream(None, dsl).unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(code), "for {dsl}: {}", diag.message());
        assert_eq!(err.position(), position, "for {dsl}");
        err
    }

    #[test]
    fn test_single_app() {
        assert_eq!(
            parse("gemfire-cq").stringify(true),
            "[(AppNode:gemfire-cq:0>10)]"
        );
        assert_eq!(parse("mystream = foo").stringify(true), "[mystream = (AppNode:foo:11>14)]");
        assert_eq!(
            parse("foo --name=value").stringify(true),
            "[(AppNode:foo --name=value:0>16)]"
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            parse("label: http").stringify(true),
            "[((Label:label:0>5) AppNode:http:0>11)]"
        );
        assert_eq!(
            parse("http | foo: bar | file").stringify(false),
            "[(AppNode:http)((Label:foo) AppNode:bar)(AppNode:file)]"
        );
    }

    #[test]
    fn test_destinations() {
        assert_eq!(
            parse(":foobar > file").stringify(true),
            "[(foobar:1>7)>(AppNode:file:10>14)]"
        );
        assert_eq!(parse("http > :foo").stringify(true), "[(AppNode:http:0>4)>(foo:8>11)]");
        assert_eq!(
            parse(":test --group=test > file").stringify(true),
            "[(test:1>5 --group=test)>(AppNode:file:21>25)]"
        );

        let node = parse(":a.b/c#* > log");
        assert_eq!(node.source_destination_name().as_deref(), Some("a.b/c#*"));
    }

    #[test]
    fn test_bridge() {
        let node = parse(":bar > :boo");
        assert_eq!(node.stringify(true), "[(bar:1>4)>(AppNode:bridge:5>6)>(boo:8>11)]");
        assert!(!node.apps[0].unbound);

        let node = parse("queue:orders > topic:audit");
        assert_eq!(node.apps[0].name(), "bridge");
        assert_eq!(node.sink_destination_name().as_deref(), Some("audit"));
    }

    #[test]
    fn test_channels() {
        let node = parse("tap:stream:foo.bar > log");
        let source = node.source.as_ref().unwrap();
        assert_eq!(source.channel_type, ChannelType::TapStream);
        assert_eq!(source.to_string(), "tap:stream:foo.bar");
        assert_eq!(source.span, Span::new(0..18));

        let node = parse("time > queue:ticks");
        let sink = node.sink.as_ref().unwrap();
        assert_eq!(sink.channel_type, ChannelType::Queue);
        assert_eq!(sink.name(), "ticks");

        assert_eq!(
            parse("tap:topic:foo > log").source.unwrap().channel_type,
            ChannelType::TapTopic
        );
    }

    #[test]
    fn test_channel_errors() {
        check_error("foo:bar > log", ErrorCode::E134, 0);
        check_error("log > tap:stream:foo", ErrorCode::E172, 6);
        check_error("log > foo:bar", ErrorCode::E172, 6);
        check_error("tap:stream > log", ErrorCode::E141, 0);
        check_error("tap:stream.foo > log", ErrorCode::E141, 0);
        check_error("tap:queue:foo.bar > log", ErrorCode::E132, 13);
        check_error("queue:foo.bar > log", ErrorCode::E131, 9);
        check_error("tap:wibble:foo > log", ErrorCode::E142, 4);
        check_error("queue:foo :bar > log", ErrorCode::E139, 10);
    }

    #[test]
    fn test_argument_values() {
        let node = parse("transform --expression='hi'+payload");
        assert_eq!(node.apps[0].arguments[0].value, "'hi'+payload");

        let node = parse("foo --param1=payload+'hi'--param2='foobar'");
        assert_eq!(node.apps[0].arguments[0].value, "payload+'hi'--param2='foobar'");

        let node = parse("http --contentType='text/plain|charset=UTF-8' | log");
        assert_eq!(node.apps[0].arguments[0].value, "text/plain|charset=UTF-8");

        let node = parse("foo --expression='''hi'''");
        assert_eq!(node.apps[0].arguments[0].value, "'hi'");

        let node = parse("foo --bar='a\nb'");
        assert_eq!(node.apps[0].arguments[0].value, "a\nb");

        assert_eq!(parse("aaa --bbb=ccc,").stringify(false), "[(AppNode:aaa --bbb=ccc,)]");
    }

    #[test]
    fn test_unbound_apps() {
        let node = parse("aaa || bbb");
        assert!(node.apps.iter().all(|app| app.unbound));

        let node = parse("aaa | bbb");
        assert!(node.apps.iter().all(|app| !app.unbound));

        assert!(parse("aaa").apps[0].unbound);
        assert!(!parse(":in > aaa").apps[0].unbound);
        assert!(!parse("aaa > :out").apps[0].unbound);
    }

    #[test]
    fn test_app_list_errors() {
        check_error(":aaa > fff||bbb", ErrorCode::E170, 10);
        check_error("fff||bbb > :zzz", ErrorCode::E170, 3);
        check_error("aaa | bbb|| ccc", ErrorCode::E169, 9);
        check_error("aaa || bbb| ccc", ErrorCode::E169, 10);
        check_error("aaa --bbb=ccc||", ErrorCode::E112, 15);
        check_error("foo||", ErrorCode::E112, 5);
        check_error("foo --aaa=\"bbb\" ||", ErrorCode::E112, 18);
    }

    #[test]
    fn test_argument_errors() {
        check_error("aaa --bbb= --ccc=ddd", ErrorCode::E105, 11);
        check_error("aaa --bbb=\n --ccc=ddd", ErrorCode::E105, 10);
        check_error("aaa --bbb=|", ErrorCode::E105, 10);
        check_error(
            "foo | transform --expression=new StringBuilder(payload).reverse() | bar",
            ErrorCode::E115,
            46,
        );
        check_error("foo |  transform --expression=''Hello, world!'' | bar", ErrorCode::E115, 44);
    }

    #[test]
    fn test_trailing_data() {
        let err = check_error("http > :test value", ErrorCode::E100, 13);
        assert_eq!(
            err.diagnostics()[0].message(),
            "Found unexpected data after stream definition: 'value'"
        );
        check_error("trigger > :myjob   too", ErrorCode::E100, 19);
        check_error("foo bar", ErrorCode::E100, 4);
        check_error("http | foo :bar | file", ErrorCode::E100, 11);
        check_error("foo > bar", ErrorCode::E133, 6);
    }

    #[test]
    fn test_destination_errors() {
        check_error(":boo .xx > file", ErrorCode::E139, 5);
        check_error(":boo. xx > file", ErrorCode::E139, 6);
        check_error(":boo.xx. yy > file", ErrorCode::E139, 9);
        check_error(":boo.xx .yy > file", ErrorCode::E139, 8);
        check_error("::foo > *", ErrorCode::E171, 1);
        check_error(":foo > :", ErrorCode::E112, 7);
        check_error(":foo >", ErrorCode::E112, 6);
    }

    #[test]
    fn test_app_name_errors() {
        check_error(".", ErrorCode::E118, 0);
        check_error(";", ErrorCode::E118, 0);
        check_error("|", ErrorCode::E118, 0);
        check_error(":foo | bar", ErrorCode::E118, 0);
        check_error(":foo > --2323", ErrorCode::E118, 7);
        check_error(":foo > *", ErrorCode::E118, 7);
        check_error(":foo > (", ErrorCode::E115, 7);
        check_error(":", ErrorCode::E148, 0);
    }

    #[test]
    fn test_label_errors() {
        check_error("http | foo: goggle: bar | file", ErrorCode::E156, 12);
        check_error("http | foo:bar | file", ErrorCode::E147, 11);
        check_error("http | foo : bar | file", ErrorCode::E140, 11);
    }

    #[test]
    fn test_duplicate_labels() {
        let err = check_error("xxx: http | xxx: file", ErrorCode::E143, 12);
        assert_eq!(
            err.diagnostics()[0].message(),
            "label 'xxx' should be unique but app 'http' (at position 0) and app 'file' \
             (at position 1) both use it"
        );

        let err = check_error(
            "xxx: http | yyy: filter | transform | xxx: transform | file",
            ErrorCode::E143,
            38,
        );
        assert!(err.diagnostics()[0].message().contains("app 'http' (at position 0)"));
        assert!(err.diagnostics()[0].message().contains("(at position 3)"));

        let err = check_error("http | filter | transform | transform | file", ErrorCode::E143, 28);
        assert!(err.diagnostics()[0].message().contains("(at position 2)"));
    }

    #[test]
    fn test_stream_names() {
        check_error("( = http | file", ErrorCode::E115, 0);
        check_error("* = http | file", ErrorCode::E122, 0);
        for name in ["foo.bar", "-bar", ".bar", "foo-.-bar", "0foobar", "foo%bar"] {
            let err = parse_stream(Some(name), "http | log").unwrap_err();
            assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E122), "for {name}");
            assert_eq!(err.position(), 0);
        }
        assert!(parse_stream(Some("my-stream_1"), "http | log").is_ok());
    }

    #[test]
    fn test_stream_name_matching_app() {
        let err = parse_stream(Some("log"), "http | log").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E130));
        assert_eq!(err.position(), 7);
    }

    #[test]
    fn test_checkpoint_in_error() {
        let err = parse_stream(None, "time | log --level").unwrap_err();
        assert_eq!(err.checkpoint(), 10);
        assert_eq!(err.position(), 18);
    }
}
