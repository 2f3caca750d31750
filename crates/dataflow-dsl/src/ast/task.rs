//! Composed task definition nodes.
//!
//! A [`TaskNode`] holds one or more sequences. The first is where execution
//! starts; the others are only reachable through label transitions such as
//! `0->:cleanup`. Each sequence is a [`FlowNode`] whose elements run one
//! after the other, and a [`SplitNode`] runs its flows in parallel.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::{ArgumentNode, push_position};
use crate::{
    graph::{self, Graph, GraphError},
    span::{Span, Spanned},
    visitor::TaskVisitor,
};

/// Transition target that ends the composed task successfully.
pub const END: &str = "$END";

/// Transition target that ends the composed task as failed.
pub const FAIL: &str = "$FAIL";

/// A parsed task definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskNode {
    pub name: Option<String>,
    pub dsl: String,
    pub sequences: Vec<FlowNode>,
}

impl TaskNode {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The primary sequence.
    pub fn start(&self) -> Option<&FlowNode> {
        self.sequences.first()
    }

    pub fn sequence_with_label(&self, label: &str) -> Option<&FlowNode> {
        self.sequences
            .iter()
            .find(|sequence| sequence.label().is_some_and(|l| l.as_str() == label))
    }

    /// Whether this is more than a single app without transitions.
    pub fn is_composed(&self) -> bool {
        self.single_app().is_none_or(TaskAppNode::has_transitions)
    }

    /// The app of a task that is not composed.
    pub fn task_app(&self) -> Option<&TaskAppNode> {
        self.single_app().filter(|app| !app.has_transitions())
    }

    fn single_app(&self) -> Option<&TaskAppNode> {
        match self.sequences.as_slice() {
            [sequence] => match sequence.series.as_slice() {
                [TaskElement::App(app)] => Some(app),
                _ => None,
            },
            _ => None,
        }
    }

    /// Every app in the definition, including those only reached through a
    /// transition, in visiting order.
    pub fn task_apps(&self) -> Vec<TaskApp> {
        let mut collector = TaskAppsCollector::default();
        self.accept(&mut collector);
        collector.task_apps
    }

    /// The definition text in canonical form.
    pub fn to_dsl(&self) -> String {
        self.stringify(false)
    }

    /// The definition with every app replaced by its executable name
    /// `taskName-labelOrName` and arguments dropped.
    pub fn to_executable_dsl(&self) -> String {
        let mut visitor = ExecutableDslVisitor::default();
        self.accept(&mut visitor);
        visitor.dsl
    }

    /// Lower the definition into its executable graph, inlining the
    /// secondary sequences that label transitions jump to.
    pub fn to_graph(&self) -> Result<Graph, GraphError> {
        graph::generate(self)
    }

    pub fn stringify(&self, include_positions: bool) -> String {
        self.sequences
            .iter()
            .map(|sequence| sequence.stringify(include_positions))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Walk the tree, sequence by sequence.
    pub fn accept<V: TaskVisitor + ?Sized>(&self, visitor: &mut V) {
        visitor.start_visit(self.name(), &self.dsl);
        for (number, sequence) in self.sequences.iter().enumerate() {
            if visitor.pre_visit_sequence(sequence, number) {
                sequence.accept(visitor);
                visitor.post_visit_sequence(sequence, number);
            }
        }
        visitor.end_visit();
    }
}

impl fmt::Display for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dsl())
    }
}

/// Elements that run one after the other, `a && b && <c || d>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowNode {
    pub series: Vec<TaskElement>,
    pub span: Span,
}

impl FlowNode {
    /// The label of the first element, which names the flow.
    pub fn label(&self) -> Option<&Spanned<String>> {
        self.series.first().and_then(TaskElement::label)
    }

    pub fn stringify(&self, include_positions: bool) -> String {
        self.series
            .iter()
            .map(|element| element.stringify(include_positions))
            .collect::<Vec<_>>()
            .join(" && ")
    }

    pub fn accept<V: TaskVisitor + ?Sized>(&self, visitor: &mut V) {
        if !visitor.pre_visit_flow(self) {
            return;
        }
        visitor.visit_flow(self);
        for element in &self.series {
            match element {
                TaskElement::App(app) => app.accept(visitor),
                TaskElement::Split(split) => split.accept(visitor),
            }
        }
        visitor.post_visit_flow(self);
    }
}

/// One step of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskElement {
    App(TaskAppNode),
    Split(SplitNode),
}

impl TaskElement {
    pub fn label(&self) -> Option<&Spanned<String>> {
        match self {
            TaskElement::App(app) => app.label.as_ref(),
            TaskElement::Split(split) => split.label.as_ref(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TaskElement::App(app) => app.span,
            TaskElement::Split(split) => split.span,
        }
    }

    pub fn stringify(&self, include_positions: bool) -> String {
        match self {
            TaskElement::App(app) => app.stringify(include_positions),
            TaskElement::Split(split) => split.stringify(include_positions),
        }
    }
}

/// Flows that run in parallel, `<a || b && c>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitNode {
    pub label: Option<Spanned<String>>,
    pub flows: Vec<FlowNode>,
    pub span: Span,
}

impl SplitNode {
    pub fn stringify(&self, include_positions: bool) -> String {
        let mut rendered = String::new();
        if let Some(label) = &self.label {
            rendered.push_str(label.as_str());
            rendered.push_str(": ");
        }
        rendered.push('<');
        let flows: Vec<_> = self
            .flows
            .iter()
            .map(|flow| flow.stringify(include_positions))
            .collect();
        rendered.push_str(&flows.join(" || "));
        rendered.push('>');
        rendered
    }

    pub fn accept<V: TaskVisitor + ?Sized>(&self, visitor: &mut V) {
        if !visitor.pre_visit_split(self) {
            return;
        }
        visitor.visit_split(self);
        for flow in &self.flows {
            flow.accept(visitor);
        }
        visitor.post_visit_split(self);
    }
}

/// A task app with its arguments and outgoing transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskAppNode {
    pub label: Option<Spanned<String>>,
    pub name: Spanned<String>,
    pub arguments: Vec<ArgumentNode>,
    pub transitions: Vec<TransitionNode>,
    pub span: Span,
}

impl TaskAppNode {
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

    pub fn has_transitions(&self) -> bool {
        !self.transitions.is_empty()
    }

    pub fn arguments_as_map(&self) -> IndexMap<String, String> {
        self.arguments
            .iter()
            .map(|arg| (arg.name.clone(), arg.value.clone()))
            .collect()
    }

    pub fn stringify(&self, include_positions: bool) -> String {
        let mut rendered = String::new();
        if let Some(label) = self.label() {
            rendered.push_str(label);
            rendered.push_str(": ");
        }
        rendered.push_str(self.name());
        for arg in &self.arguments {
            rendered.push(' ');
            rendered.push_str(&arg.to_string());
        }
        for transition in &self.transitions {
            rendered.push(' ');
            rendered.push_str(&transition.stringify(include_positions));
        }
        if include_positions {
            push_position(&mut rendered, self.span);
        }
        rendered
    }

    pub fn accept<V: TaskVisitor + ?Sized>(&self, visitor: &mut V) {
        if !visitor.pre_visit_task_app(self) {
            return;
        }
        visitor.visit_task_app(self);
        for transition in &self.transitions {
            transition.accept(visitor);
        }
        visitor.post_visit_task_app(self);
    }
}

/// Where a transition leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum TransitionTarget {
    /// `0->other`, an app defined in place.
    App(TaskAppNode),
    /// `0->:label`, the labeled app or sequence.
    Label(Spanned<String>),
}

/// `status->target` on a task app.
///
/// An unquoted status (`0`, `*`) is checked against the exit code; a quoted
/// one (`'FAILED'`) against the exit status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionNode {
    /// The status as written, quotes included.
    pub status: Spanned<String>,
    /// The status with quotes removed.
    pub status_to_check: String,
    pub exit_code_check: bool,
    pub target: TransitionTarget,
    pub span: Span,
}

impl TransitionNode {
    pub fn new(status: Spanned<String>, quoted: bool, target: TransitionTarget) -> Self {
        let status_to_check = if quoted {
            unquote(status.as_str())
        } else {
            status.as_str().to_string()
        };
        let end = match &target {
            TransitionTarget::App(app) => app.span.end(),
            TransitionTarget::Label(label) => label.span().end(),
        };
        let span = Span::new(status.span().start()..end);
        Self {
            status,
            status_to_check,
            exit_code_check: !quoted,
            target,
            span,
        }
    }

    /// The status as it appears in executable definitions: exit codes bare,
    /// exit statuses in single quotes.
    pub fn status_dsl_form(&self) -> String {
        if self.exit_code_check {
            self.status_to_check.clone()
        } else {
            format!("'{}'", self.status_to_check)
        }
    }

    pub fn target_app(&self) -> Option<&TaskAppNode> {
        match &self.target {
            TransitionTarget::App(app) => Some(app),
            TransitionTarget::Label(_) => None,
        }
    }

    pub fn target_label(&self) -> Option<&Spanned<String>> {
        match &self.target {
            TransitionTarget::App(_) => None,
            TransitionTarget::Label(label) => Some(label),
        }
    }

    pub fn is_end_transition(&self) -> bool {
        self.target_app().is_some_and(|app| app.name() == END)
    }

    pub fn is_fail_transition(&self) -> bool {
        self.target_app().is_some_and(|app| app.name() == FAIL)
    }

    /// Whether the target is `$END` or `$FAIL`.
    pub fn is_special_transition(&self) -> bool {
        self.is_end_transition() || self.is_fail_transition()
    }

    /// The target as definition text, `:label` or the app.
    pub fn target_dsl_text(&self) -> String {
        match &self.target {
            TransitionTarget::App(app) => app.stringify(false),
            TransitionTarget::Label(label) => format!(":{}", label.as_str()),
        }
    }

    pub fn stringify(&self, include_positions: bool) -> String {
        let target = match &self.target {
            TransitionTarget::App(app) => app.stringify(include_positions),
            TransitionTarget::Label(label) => format!(":{}", label.as_str()),
        };
        format!("{}->{}", self.status.as_str(), target)
    }

    pub fn accept<V: TaskVisitor + ?Sized>(&self, visitor: &mut V) {
        if !visitor.pre_visit_transition(self) {
            return;
        }
        visitor.visit_transition(self);
        visitor.post_visit_transition(self);
    }
}

/// Strip the enclosing quotes of a literal and collapse doubled quotes.
pub(crate) fn unquote(literal: &str) -> String {
    let mut chars = literal.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && (open == '\'' || open == '"') => {
            let doubled = format!("{open}{open}");
            chars.as_str().replace(&doubled, &open.to_string())
        }
        _ => literal.to_string(),
    }
}

/// An app of a composed task as it gets registered for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskApp {
    pub task_name: Option<String>,
    pub name: String,
    pub label: Option<String>,
    pub arguments: IndexMap<String, String>,
}

impl TaskApp {
    fn new(task_name: Option<&str>, app: &TaskAppNode) -> Self {
        Self {
            task_name: task_name.map(str::to_string),
            name: app.name().to_string(),
            label: app.label().map(str::to_string),
            arguments: app.arguments_as_map(),
        }
    }

    /// `taskName-labelOrName`, the name the app runs under.
    pub fn executable_dsl_name(&self) -> String {
        executable_name(
            self.task_name.as_deref(),
            self.label.as_deref().unwrap_or(&self.name),
        )
    }
}

fn executable_name(task_name: Option<&str>, label_or_name: &str) -> String {
    format!("{}-{}", task_name.unwrap_or_default(), label_or_name)
}

#[derive(Default)]
struct TaskAppsCollector {
    task_name: Option<String>,
    task_apps: Vec<TaskApp>,
}

impl TaskVisitor for TaskAppsCollector {
    fn start_visit(&mut self, task_name: Option<&str>, _dsl: &str) {
        self.task_name = task_name.map(str::to_string);
    }

    fn visit_task_app(&mut self, task_app: &TaskAppNode) {
        self.task_apps
            .push(TaskApp::new(self.task_name.as_deref(), task_app));
    }

    fn visit_transition(&mut self, transition: &TransitionNode) {
        if let Some(app) = transition.target_app() {
            self.task_apps
                .push(TaskApp::new(self.task_name.as_deref(), app));
        }
    }
}

/// Where the executable rendering is within the current flow or split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecutableState {
    StartOfFlow,
    StartOfSplit,
    InFlow,
    InSplit,
}

#[derive(Default)]
struct ExecutableDslVisitor {
    task_name: Option<String>,
    dsl: String,
    state: Vec<ExecutableState>,
}

impl ExecutableDslVisitor {
    fn replace_top(&mut self, state: ExecutableState) {
        self.state.pop();
        self.state.push(state);
    }

    fn executable_name(&self, app: &TaskAppNode) -> String {
        executable_name(self.task_name.as_deref(), app.label_name())
    }
}

impl TaskVisitor for ExecutableDslVisitor {
    fn start_visit(&mut self, task_name: Option<&str>, _dsl: &str) {
        self.task_name = task_name.map(str::to_string);
    }

    fn pre_visit_flow(&mut self, _flow: &FlowNode) -> bool {
        if self.state.last() == Some(&ExecutableState::InSplit) {
            self.dsl.push_str(" || ");
        }
        self.state.push(ExecutableState::StartOfFlow);
        true
    }

    fn post_visit_flow(&mut self, _flow: &FlowNode) {
        self.state.pop();
        if self.state.last() == Some(&ExecutableState::StartOfSplit) {
            self.replace_top(ExecutableState::InSplit);
        }
    }

    fn pre_visit_split(&mut self, _split: &SplitNode) -> bool {
        match self.state.last() {
            Some(ExecutableState::StartOfFlow) => self.replace_top(ExecutableState::InFlow),
            Some(ExecutableState::InFlow) => self.dsl.push_str(" && "),
            _ => {}
        }
        self.state.push(ExecutableState::StartOfSplit);
        self.dsl.push('<');
        true
    }

    fn post_visit_split(&mut self, _split: &SplitNode) {
        self.dsl.push('>');
        self.state.pop();
    }

    fn visit_task_app(&mut self, task_app: &TaskAppNode) {
        match self.state.last() {
            Some(ExecutableState::StartOfFlow) => self.replace_top(ExecutableState::InFlow),
            Some(ExecutableState::InFlow) => self.dsl.push_str(" && "),
            _ => {}
        }
        let name = self.executable_name(task_app);
        self.dsl.push_str(&name);

        for transition in &task_app.transitions {
            self.dsl.push(' ');
            self.dsl.push_str(&transition.status_dsl_form());
            self.dsl.push_str("->");
            match &transition.target {
                TransitionTarget::App(app) => {
                    let target = self.executable_name(app);
                    self.dsl.push_str(&target);
                }
                TransitionTarget::Label(label) => {
                    self.dsl.push(':');
                    self.dsl.push_str(label.as_str());
                }
            }
        }
    }
}
