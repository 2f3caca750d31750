//! Executable graphs of composed tasks.
//!
//! A [`Graph`] is what a composed task definition lowers to: task apps become
//! [`Node`]s and the order they run in becomes [`Link`]s. Every graph has a
//! synthetic `START` node that links to the first apps and an `END` node that
//! the last apps link to. Parallel flows that meet again without an app in
//! between are joined by a `SYNC` node.
//!
//! Links carrying a transition name are only followed when the app exits with
//! that status. `$END` and `$FAIL` transition targets are ordinary nodes named
//! after the target.
//!
//! Graphs are built with [`TaskNode::to_graph`](crate::ast::TaskNode::to_graph),
//! serialize to and from JSON with serde, and turn back into definition text
//! with [`Graph::to_dsl_text`].
//!
//! # Example
//!
//! ```
//! use dataflow_dsl::parse_task;
//!
//! let task = parse_task(None, "appA 'fail'->appB", false, true).unwrap();
//! let graph = task.to_graph().unwrap();
//!
//! assert_eq!(
//!     graph.to_verbose_string(),
//!     "[0:START][1:appA][2:appB][3:END][0-1][fail:1-2][1-3][2-3]"
//! );
//! assert_eq!(graph.to_dsl_text().unwrap(), "appA 'fail'->appB");
//! ```

mod dsl_text;
mod generator;

pub(crate) use generator::generate;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorCode;

/// Name of the node every graph starts at.
pub const START_NODE: &str = "START";

/// Name of the node every graph finishes at.
pub const END_NODE: &str = "END";

/// Name of the node joining parallel flows.
pub const SYNC_NODE: &str = "SYNC";

/// Name of the node a graph fails at.
pub const FAIL_NODE: &str = "FAIL";

/// Link property holding the exit status a transition checks.
pub const TRANSITION_NAME: &str = "transitionName";

// =============================================================================
// Errors
// =============================================================================

/// Errors raised while lowering a task into a graph or rendering a graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A transition targets a label that no secondary sequence defines.
    #[error("{}", unresolved_label_message(.label))]
    UnresolvedLabel { label: String },

    /// Inlining a sequence would inline the same sequence again.
    #[error("sequence '{label}' is reached again through its own transitions")]
    RecursiveSequence { label: String },

    #[error("Graph is malformed: {0}")]
    Malformed(String),
}

impl GraphError {
    /// The stable code for errors that have one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            GraphError::UnresolvedLabel { .. } => Some(ErrorCode::E173),
            GraphError::RecursiveSequence { .. } | GraphError::Malformed(_) => None,
        }
    }
}

fn unresolved_label_message(label: &str) -> String {
    format!("{}: {}", ErrorCode::E173, ErrorCode::E173.format(&[label]))
}

// =============================================================================
// Graph structure
// =============================================================================

/// A step of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, String>,
}

impl Node {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            label: None,
            properties: IndexMap::new(),
        }
    }

    pub fn with_label(mut self, label: Option<impl Into<String>>) -> Self {
        self.label = label.map(Into::into);
        self
    }

    pub fn with_properties(mut self, properties: IndexMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    pub fn is_start(&self) -> bool {
        self.name == START_NODE
    }

    pub fn is_end(&self) -> bool {
        self.name == END_NODE
    }

    pub fn is_sync(&self) -> bool {
        self.name == SYNC_NODE
    }
}

/// A directed edge between two nodes, optionally guarded by an exit status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, String>,
}

impl Link {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            properties: IndexMap::new(),
        }
    }

    /// A link taken when the `from` app exits with `transition_name`.
    pub fn with_transition(
        from: impl Into<String>,
        to: impl Into<String>,
        transition_name: impl Into<String>,
    ) -> Self {
        let mut link = Self::new(from, to);
        link.properties
            .insert(TRANSITION_NAME.to_string(), transition_name.into());
        link
    }

    pub fn transition_name(&self) -> Option<&str> {
        self.properties.get(TRANSITION_NAME).map(String::as_str)
    }

    pub fn has_transition(&self) -> bool {
        self.transition_name().is_some()
    }
}

/// Nodes and links of a lowered composed task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        Self { nodes, links }
    }

    /// The graph of an empty definition, `START` straight to `END`.
    pub fn trivial() -> Self {
        Self::new(
            vec![Node::new("0", START_NODE), Node::new("1", END_NODE)],
            vec![Link::new("0", "1")],
        )
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Compact rendering used to pin graphs down in tests:
    /// `[id:label:name:k=v]...` for nodes, then `[transition:from-to]...`.
    pub fn to_verbose_string(&self) -> String {
        let mut rendered = String::new();
        for node in &self.nodes {
            rendered.push('[');
            rendered.push_str(&node.id);
            rendered.push(':');
            if let Some(label) = &node.label {
                rendered.push_str(label);
                rendered.push(':');
            }
            rendered.push_str(&node.name);
            for (key, value) in &node.properties {
                rendered.push_str(&format!(":{key}={value}"));
            }
            rendered.push(']');
        }
        for link in &self.links {
            rendered.push('[');
            if let Some(transition) = link.transition_name() {
                rendered.push_str(transition);
                rendered.push(':');
            }
            rendered.push_str(&format!("{}-{}]", link.from, link.to));
        }
        rendered
    }

    /// Render the graph back into composed task definition text.
    ///
    /// Nodes only reachable through a transition and that lead somewhere
    /// else are emitted as extra `&&` steps after the main walk.
    pub fn to_dsl_text(&self) -> Result<String, GraphError> {
        dsl_text::write(self)
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph: nodes=#{} links=#{}",
            self.nodes.len(),
            self.links.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivial_graph() {
        let graph = Graph::trivial();
        assert_eq!(graph.to_verbose_string(), "[0:START][1:END][0-1]");
        assert_eq!(graph.to_string(), "Graph: nodes=#2 links=#1");
    }

    #[test]
    fn test_verbose_string() {
        let graph = Graph::new(
            vec![
                Node::new("0", START_NODE),
                Node::new("1", "timestamp")
                    .with_label(Some("t1"))
                    .with_properties(IndexMap::from([
                        ("format".to_string(), "yyyy".to_string()),
                        ("a".to_string(), "b".to_string()),
                    ])),
                Node::new("2", "$END"),
                Node::new("3", END_NODE),
            ],
            vec![
                Link::new("0", "1"),
                Link::with_transition("1", "2", "FAILED"),
                Link::new("1", "3"),
            ],
        );

        assert_eq!(
            graph.to_verbose_string(),
            "[0:START][1:t1:timestamp:format=yyyy:a=b][2:$END][3:END][0-1][FAILED:1-2][1-3]"
        );
    }

    #[test]
    fn test_link_transition() {
        let link = Link::with_transition("1", "2", "0");
        assert!(link.has_transition());
        assert_eq!(link.transition_name(), Some("0"));
        assert!(!Link::new("1", "2").has_transition());
    }

    #[test]
    fn test_json_shape() {
        let graph = Graph::new(
            vec![Node::new("0", START_NODE), Node::new("1", END_NODE)],
            vec![Link::with_transition("0", "1", "x")],
        );

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nodes": [{"id": "0", "name": "START"}, {"id": "1", "name": "END"}],
                "links": [{"from": "0", "to": "1", "properties": {"transitionName": "x"}}],
            })
        );

        let back: Graph = serde_json::from_value(json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn test_unresolved_label_message() {
        let err = GraphError::UnresolvedLabel {
            label: "two".to_string(),
        };
        assert_eq!(err.code(), Some(ErrorCode::E173));
        assert_eq!(
            err.to_string(),
            "173E: no sequence defines the label 'two' targeted by a transition"
        );
    }
}
