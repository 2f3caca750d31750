//! Walking composed task trees.
//!
//! [`TaskNode::accept`](crate::ast::TaskNode::accept) drives a [`TaskVisitor`]
//! through the tree. Each node kind gets a `pre_visit_*` hook that can skip
//! the node and its children by returning `false`, a `visit_*` hook, and a
//! `post_visit_*` hook once the children are done. Apps that are the target
//! of a transition are reported through [`TaskVisitor::visit_transition`]
//! only, never as task apps of their own.
//!
//! # Example
//!
//! ```
//! use dataflow_dsl::{ast::TaskAppNode, parse_task, visitor::TaskVisitor};
//!
//! #[derive(Default)]
//! struct Names(Vec<String>);
//!
//! impl TaskVisitor for Names {
//!     fn visit_task_app(&mut self, task_app: &TaskAppNode) {
//!         self.0.push(task_app.name().to_string());
//!     }
//! }
//!
//! let task = parse_task(None, "<a || b> && c", false, true).unwrap();
//! let mut names = Names::default();
//! task.accept(&mut names);
//! assert_eq!(names.0, ["a", "b", "c"]);
//! ```

use crate::ast::{FlowNode, SplitNode, TaskAppNode, TransitionNode};

/// Callbacks for a walk over a composed task.
///
/// Every method has an empty default so implementations only override the
/// hooks they need.
pub trait TaskVisitor {
    fn start_visit(&mut self, _task_name: Option<&str>, _dsl: &str) {}

    fn end_visit(&mut self) {}

    /// Called with the first flow of each sequence; `0` is the primary one.
    fn pre_visit_sequence(&mut self, _first: &FlowNode, _sequence_number: usize) -> bool {
        true
    }

    fn post_visit_sequence(&mut self, _first: &FlowNode, _sequence_number: usize) {}

    fn pre_visit_flow(&mut self, _flow: &FlowNode) -> bool {
        true
    }

    fn visit_flow(&mut self, _flow: &FlowNode) {}

    fn post_visit_flow(&mut self, _flow: &FlowNode) {}

    fn pre_visit_split(&mut self, _split: &SplitNode) -> bool {
        true
    }

    fn visit_split(&mut self, _split: &SplitNode) {}

    fn post_visit_split(&mut self, _split: &SplitNode) {}

    fn pre_visit_task_app(&mut self, _task_app: &TaskAppNode) -> bool {
        true
    }

    fn visit_task_app(&mut self, _task_app: &TaskAppNode) {}

    fn post_visit_task_app(&mut self, _task_app: &TaskAppNode) {}

    fn pre_visit_transition(&mut self, _transition: &TransitionNode) -> bool {
        true
    }

    fn visit_transition(&mut self, _transition: &TransitionNode) {}

    fn post_visit_transition(&mut self, _transition: &TransitionNode) {}
}
