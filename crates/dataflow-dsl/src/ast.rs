//! Syntax trees for stream and task definitions.
//!
//! Every node records the byte range it was parsed from. Leaf values that
//! errors need to point at, such as app names and labels, are wrapped in
//! [`Spanned`](crate::Spanned); composite nodes carry a [`Span`](crate::Span)
//! covering their children.
//!
//! Nodes render in two ways. `Display` gives the definition text form, and
//! `stringify(true)` adds `:start>end` offsets, which is what the tests use to
//! pin the parsers' output down.

mod stream;
mod task;

pub use stream::{AppNode, ArgumentNode, ChannelNode, ChannelType, StreamNode};
pub use task::{
    END, FAIL, FlowNode, SplitNode, TaskApp, TaskAppNode, TaskElement, TaskNode, TransitionNode,
    TransitionTarget,
};

pub(crate) use task::unquote;

use crate::span::Span;

/// Appends `:start>end` to a rendered node.
fn push_position(rendered: &mut String, span: Span) {
    rendered.push_str(&format!(":{}>{}", span.start(), span.end()));
}
