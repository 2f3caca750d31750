//! Stream definition nodes.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::push_position;
use crate::span::{Span, Spanned};

/// A `--name=value` argument. Quoted values are stored unquoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentNode {
    pub name: String,
    pub value: String,
    pub span: Span,
}

impl ArgumentNode {
    pub fn new(name: impl Into<String>, value: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            span,
        }
    }
}

impl fmt::Display for ArgumentNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}={}", self.name, self.value)
    }
}

/// An app in a stream, such as `filter --expression=true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppNode {
    pub label: Option<Spanned<String>>,
    pub name: Spanned<String>,
    pub arguments: Vec<ArgumentNode>,
    /// Set for apps of a `a || b` list, which are deployed without bindings.
    pub unbound: bool,
    pub span: Span,
}

impl AppNode {
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_ref().map(Spanned::as_str)
    }

    /// The label when one is given, else the app name.
    pub fn label_name(&self) -> &str {
        self.label().unwrap_or_else(|| self.name())
    }

    /// Arguments by name. A repeated name keeps its last value.
    pub fn arguments_as_map(&self) -> IndexMap<String, String> {
        self.arguments
            .iter()
            .map(|arg| (arg.name.clone(), arg.value.clone()))
            .collect()
    }

    pub fn stringify(&self, include_positions: bool) -> String {
        let mut rendered = String::from("(");
        if let Some(label) = &self.label {
            rendered.push_str("(Label:");
            rendered.push_str(label.as_str());
            if include_positions {
                push_position(&mut rendered, label.span());
            }
            rendered.push_str(") ");
        }
        rendered.push_str("AppNode:");
        rendered.push_str(self.name());
        for arg in &self.arguments {
            rendered.push(' ');
            rendered.push_str(&arg.to_string());
        }
        if include_positions {
            push_position(&mut rendered, self.span);
        }
        rendered.push(')');
        rendered
    }
}

impl fmt::Display for AppNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = self.label() {
            write!(f, "{label}: ")?;
        }
        write!(f, "{}", self.name())?;
        for arg in &self.arguments {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a source or sink endpoint of a stream refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// A named destination, `:orders.valid`.
    Destination,
    Queue,
    Topic,
    TapStream,
    TapTask,
    TapJob,
    TapQueue,
    TapTopic,
}

impl ChannelType {
    /// The text written before the channel name.
    pub fn prefix(&self) -> &'static str {
        match self {
            ChannelType::Destination => ":",
            ChannelType::Queue => "queue:",
            ChannelType::Topic => "topic:",
            ChannelType::TapStream => "tap:stream:",
            ChannelType::TapTask => "tap:task:",
            ChannelType::TapJob => "tap:job:",
            ChannelType::TapQueue => "tap:queue:",
            ChannelType::TapTopic => "tap:topic:",
        }
    }

    pub fn is_tap(&self) -> bool {
        matches!(
            self,
            ChannelType::TapStream
                | ChannelType::TapTask
                | ChannelType::TapJob
                | ChannelType::TapQueue
                | ChannelType::TapTopic
        )
    }
}

/// A stream endpoint: a named destination or a prefixed channel.
///
/// For a destination `components` holds the whole name, dots included. For
/// a channel it holds the colon separated parts after the prefix and tap
/// scope, and `index_components` the dotted parts that follow them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelNode {
    pub channel_type: ChannelType,
    pub components: Vec<String>,
    pub index_components: Vec<String>,
    pub arguments: Vec<ArgumentNode>,
    pub span: Span,
}

impl ChannelNode {
    /// The name used when binding apps to this endpoint.
    pub fn name(&self) -> String {
        if self.channel_type == ChannelType::Destination {
            return self.components.concat();
        }
        let mut name = self.components.join(":");
        if !self.index_components.is_empty() {
            name.push('.');
            name.push_str(&self.index_components.join("."));
        }
        name
    }

    pub fn arguments_as_map(&self) -> IndexMap<String, String> {
        self.arguments
            .iter()
            .map(|arg| (arg.name.clone(), arg.value.clone()))
            .collect()
    }

    pub fn stringify(&self, include_positions: bool) -> String {
        let mut rendered = String::from("(");
        if self.channel_type != ChannelType::Destination {
            rendered.push_str(self.channel_type.prefix());
        }
        rendered.push_str(&self.name());
        if include_positions {
            push_position(&mut rendered, self.span);
        }
        for arg in &self.arguments {
            rendered.push(' ');
            rendered.push_str(&arg.to_string());
        }
        rendered.push(')');
        rendered
    }
}

impl fmt::Display for ChannelNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.channel_type.prefix(), self.name())?;
        for arg in &self.arguments {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// A parsed stream definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamNode {
    /// The name given inline as `name = ...`, or passed to the parser.
    pub name: Option<String>,
    pub dsl: String,
    pub apps: Vec<AppNode>,
    pub source: Option<ChannelNode>,
    pub sink: Option<ChannelNode>,
}

impl StreamNode {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn apps(&self) -> &[AppNode] {
        &self.apps
    }

    pub fn source_destination_name(&self) -> Option<String> {
        self.source.as_ref().map(ChannelNode::name)
    }

    pub fn sink_destination_name(&self) -> Option<String> {
        self.sink.as_ref().map(ChannelNode::name)
    }

    /// The app with the given label, or with the given name when it has none.
    pub fn app(&self, label_or_name: &str) -> Option<&AppNode> {
        self.apps
            .iter()
            .find(|app| app.label_name() == label_or_name)
    }

    /// Position of the app with the given label or name.
    pub fn index_of_label(&self, label_or_name: &str) -> Option<usize> {
        self.apps
            .iter()
            .position(|app| app.label_name() == label_or_name)
    }

    pub fn stringify(&self, include_positions: bool) -> String {
        let mut rendered = String::from("[");
        if let Some(name) = &self.name {
            rendered.push_str(name);
            rendered.push_str(" = ");
        }
        if let Some(source) = &self.source {
            rendered.push_str(&source.stringify(include_positions));
            rendered.push('>');
        }
        for app in &self.apps {
            rendered.push_str(&app.stringify(include_positions));
        }
        if let Some(sink) = &self.sink {
            rendered.push('>');
            rendered.push_str(&sink.stringify(include_positions));
        }
        rendered.push(']');
        rendered
    }
}

impl fmt::Display for StreamNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, range: std::ops::Range<usize>) -> AppNode {
        AppNode {
            label: None,
            name: Spanned::new(name.to_string(), Span::new(range.clone())),
            arguments: Vec::new(),
            unbound: false,
            span: Span::new(range),
        }
    }

    #[test]
    fn test_app_stringify() {
        let mut node = app("foo", 0..16);
        node.arguments
            .push(ArgumentNode::new("name", "value", Span::new(4..16)));

        assert_eq!(node.stringify(true), "(AppNode:foo --name=value:0>16)");
        assert_eq!(node.stringify(false), "(AppNode:foo --name=value)");
        assert_eq!(node.to_string(), "foo --name=value");
    }

    #[test]
    fn test_labeled_app_stringify() {
        let mut node = app("http", 0..11);
        node.name = Spanned::new("http".to_string(), Span::new(7..11));
        node.label = Some(Spanned::new("label".to_string(), Span::new(0..5)));

        assert_eq!(node.stringify(true), "((Label:label:0>5) AppNode:http:0>11)");
        assert_eq!(node.label_name(), "label");
        assert_eq!(node.to_string(), "label: http");
    }

    #[test]
    fn test_channel_names() {
        let destination = ChannelNode {
            channel_type: ChannelType::Destination,
            components: vec!["orders.valid".to_string()],
            index_components: Vec::new(),
            arguments: Vec::new(),
            span: Span::new(1..13),
        };
        assert_eq!(destination.name(), "orders.valid");
        assert_eq!(destination.to_string(), ":orders.valid");
        assert_eq!(destination.stringify(true), "(orders.valid:1>13)");

        let tap = ChannelNode {
            channel_type: ChannelType::TapStream,
            components: vec!["foo".to_string()],
            index_components: vec!["bar".to_string()],
            arguments: Vec::new(),
            span: Span::new(0..18),
        };
        assert_eq!(tap.name(), "foo.bar");
        assert_eq!(tap.to_string(), "tap:stream:foo.bar");
        assert!(tap.channel_type.is_tap());
    }

    #[test]
    fn test_stream_lookup() {
        let stream = StreamNode {
            name: Some("ticks".to_string()),
            dsl: "time | log".to_string(),
            apps: vec![app("time", 0..4), app("log", 7..10)],
            source: None,
            sink: None,
        };

        assert_eq!(stream.index_of_label("log"), Some(1));
        assert_eq!(stream.app("time").map(AppNode::name), Some("time"));
        assert!(stream.app("file").is_none());
        assert_eq!(stream.to_string(), "[ticks = (AppNode:time)(AppNode:log)]");
    }
}
