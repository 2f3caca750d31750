//! Lowering of composed task trees into graphs.
//!
//! The generator walks the task with a stack of contexts, one per flow or
//! split being visited. A context tracks the node its elements start from
//! and the dangling nodes that whatever comes next must link from.
//!
//! Each sequence is lowered on its own. Transitions to a label that is not
//! defined in the same flow are left outstanding; once every sequence is
//! lowered, the secondary sequence with that label is copied into the
//! primary one with fresh node ids. Its `START` links then leave from the
//! transition's app and its `END` links continue wherever the flow holding
//! the transition continued.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::{END_NODE, Graph, GraphError, Link, Node, START_NODE, SYNC_NODE};
use crate::{
    ast::{FlowNode, SplitNode, TaskAppNode, TaskNode, TransitionNode, TransitionTarget},
    visitor::TaskVisitor,
};

/// Lower a parsed task into its graph.
pub(crate) fn generate(task: &TaskNode) -> Result<Graph, GraphError> {
    let mut generator = GraphGenerator::default();
    task.accept(&mut generator);
    let graph = generator.finish()?;
    log::debug!(
        nodes = graph.nodes.len(),
        links = graph.links.len();
        "Generated task graph"
    );
    Ok(graph)
}

type FlowId = usize;

/// A label transition waiting for its flow to finish.
#[derive(Debug, Clone)]
struct PendingTransition {
    /// Node the transition leaves from.
    node: String,
    state: String,
    label: String,
}

/// A label transition that has to be resolved against another sequence.
#[derive(Debug, Clone)]
struct OutstandingTransition {
    node: String,
    state: String,
    label: String,
    /// The node its flow ended with, where inlined `END` links continue.
    last_node: String,
    flow: FlowId,
    /// Secondary sequences inlined to produce this transition.
    via: Vec<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum ContextKind {
    #[default]
    Flow,
    Split,
}

#[derive(Debug, Default)]
struct Context {
    kind: ContextKind,
    flow: FlowId,
    start: String,
    dangling: Vec<String>,
    /// Transition targets created in a flow; they end it alongside the
    /// dangling nodes.
    other_exits: Vec<String>,
    pending: Vec<PendingTransition>,
    /// Transition target nodes by reuse key.
    reusable: IndexMap<String, String>,
    /// Labeled app nodes by label.
    labeled: IndexMap<String, String>,
}

impl Context {
    fn flow(flow: FlowId, start: String) -> Self {
        Self {
            kind: ContextKind::Flow,
            flow,
            start,
            ..Self::default()
        }
    }

    fn split(start: String) -> Self {
        Self {
            kind: ContextKind::Split,
            start,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct ContextStack {
    frames: Vec<Context>,
    /// Stands in when nothing is pushed; only reachable by a broken walk.
    empty: Context,
}

impl ContextStack {
    fn push(&mut self, context: Context) {
        self.frames.push(context);
    }

    fn pop(&mut self) -> Context {
        self.frames.pop().unwrap_or_default()
    }

    fn top(&mut self) -> &mut Context {
        match self.frames.last_mut() {
            Some(context) => context,
            None => &mut self.empty,
        }
    }
}

#[derive(Debug, Default)]
struct Sequence {
    label: Option<String>,
    nodes: Vec<Node>,
    links: Vec<Link>,
    outstanding: Vec<OutstandingTransition>,
    labeled_in_flow: IndexMap<FlowId, IndexMap<String, String>>,
    primary_flow: Option<FlowId>,
}

#[derive(Debug, Default)]
struct GraphGenerator {
    next_node: usize,
    next_flow: FlowId,
    contexts: ContextStack,
    current: Sequence,
    sequences: Vec<Sequence>,
    /// Id of the app whose transitions are being visited.
    current_app: String,
}

impl GraphGenerator {
    fn next_id(&mut self) -> String {
        let id = self.next_node.to_string();
        self.next_node += 1;
        id
    }

    fn next_flow(&mut self) -> FlowId {
        let flow = self.next_flow;
        self.next_flow += 1;
        flow
    }

    /// The node for `key` in the current flow, created by `make` when the
    /// flow has none yet. Returns whether it was created.
    fn find_or_make(&mut self, key: String, make: impl FnOnce(String) -> Node) -> (String, bool) {
        if let Some(id) = self.contexts.top().reusable.get(&key) {
            return (id.clone(), false);
        }
        let id = self.next_id();
        self.current.nodes.push(make(id.clone()));
        self.contexts.top().reusable.insert(key, id.clone());
        (id, true)
    }

    fn finish(mut self) -> Result<Graph, GraphError> {
        let mut sequences = std::mem::take(&mut self.sequences).into_iter();
        let Some(mut main) = sequences.next() else {
            return Ok(Graph::trivial());
        };
        let secondary: Vec<Sequence> = sequences.collect();

        loop {
            link_labeled_targets(&mut main);
            let Some(first) = main.outstanding.first() else {
                break;
            };
            let (flow, label) = (first.flow, first.label.clone());
            let (group, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut main.outstanding)
                .into_iter()
                .partition(|target| target.flow == flow && target.label == label);
            main.outstanding = rest;

            if main.label.as_deref() == Some(label.as_str()) {
                return Err(GraphError::RecursiveSequence { label });
            }
            let Some(index) = secondary
                .iter()
                .position(|sequence| sequence.label.as_deref() == Some(label.as_str()))
            else {
                return Err(GraphError::UnresolvedLabel { label });
            };
            if group.iter().any(|target| target.via.contains(&index)) {
                return Err(GraphError::RecursiveSequence { label });
            }
            log::trace!(label = label.as_str(), transitions = group.len(); "Inlining sequence");
            self.inline(&mut main, &secondary[index], index, &group);
        }

        Ok(Graph::new(main.nodes, main.links))
    }

    /// Copy `sequence` into `main` for the transitions in `group`, which all
    /// leave the same flow for the same label.
    fn inline(
        &mut self,
        main: &mut Sequence,
        sequence: &Sequence,
        index: usize,
        group: &[OutstandingTransition],
    ) {
        let (Some(start), Some(end), Some(first)) =
            (sequence.nodes.first(), sequence.nodes.last(), group.first())
        else {
            return;
        };

        // The tail of the inlined sequence carries on where the flow of the
        // transition point does. Transitions out of that point only apply to
        // its own exit status, including the ones that lead into this sequence.
        let continuations: Vec<String> = main
            .links
            .iter()
            .filter(|existing| existing.from == first.last_node && !existing.has_transition())
            .map(|existing| existing.to.clone())
            .collect();

        let mut ids: HashMap<&str, String> = HashMap::new();
        for node in &sequence.nodes {
            if node.id == start.id || node.id == end.id {
                continue;
            }
            let id = self.next_id();
            ids.insert(&node.id, id.clone());
            // The label named the sequence, which is gone once inlined.
            main.nodes
                .push(Node::new(id, node.name.clone()).with_properties(node.properties.clone()));
        }

        for link in &sequence.links {
            if link.from == start.id {
                let Some(to) = ids.get(link.to.as_str()) else {
                    continue;
                };
                for target in group {
                    main.links.push(Link::with_transition(
                        target.node.clone(),
                        to.clone(),
                        target.state.clone(),
                    ));
                }
            } else if link.to == end.id {
                let Some(from) = ids.get(link.from.as_str()) else {
                    continue;
                };
                main.links.extend(
                    continuations
                        .iter()
                        .map(|to| Link::new(from.clone(), to.clone())),
                );
            } else if let (Some(from), Some(to)) =
                (ids.get(link.from.as_str()), ids.get(link.to.as_str()))
            {
                main.links.push(Link {
                    from: from.clone(),
                    to: to.clone(),
                    properties: link.properties.clone(),
                });
            }
        }

        for loose in &sequence.outstanding {
            let Some(node) = ids.get(loose.node.as_str()) else {
                continue;
            };
            let mut via = first.via.clone();
            via.push(index);
            main.outstanding.push(OutstandingTransition {
                node: node.clone(),
                state: loose.state.clone(),
                label: loose.label.clone(),
                last_node: first.last_node.clone(),
                flow: first.flow,
                via,
            });
        }

        for (flow, labels) in &sequence.labeled_in_flow {
            let mapped: IndexMap<String, String> = labels
                .iter()
                .filter_map(|(label, id)| ids.get(id.as_str()).map(|new| (label.clone(), new.clone())))
                .collect();
            if sequence.primary_flow == Some(*flow) {
                main.labeled_in_flow
                    .entry(first.flow)
                    .or_default()
                    .extend(mapped);
            } else {
                main.labeled_in_flow.insert(*flow, mapped);
            }
        }
    }
}

/// Resolve outstanding transitions whose label is now known in their flow.
fn link_labeled_targets(main: &mut Sequence) {
    let outstanding = std::mem::take(&mut main.outstanding);
    for target in outstanding {
        let resolved = main
            .labeled_in_flow
            .get(&target.flow)
            .and_then(|labels| labels.get(&target.label));
        match resolved {
            Some(id) => main
                .links
                .push(Link::with_transition(target.node, id.clone(), target.state)),
            None => main.outstanding.push(target),
        }
    }
}

/// `label>name:k=v...` with arguments sorted, so equal targets share a node.
fn reuse_key(app: &TaskAppNode) -> String {
    let mut key = String::new();
    if let Some(label) = app.label() {
        key.push_str(label);
        key.push('>');
    }
    key.push_str(app.name());
    let mut arguments: Vec<_> = app.arguments_as_map().into_iter().collect();
    arguments.sort();
    for (name, value) in arguments {
        key.push_str(&format!(":{name}={value}"));
    }
    key
}

fn app_node(id: String, app: &TaskAppNode) -> Node {
    Node::new(id, app.name())
        .with_label(app.label())
        .with_properties(app.arguments_as_map())
}

impl TaskVisitor for GraphGenerator {
    fn pre_visit_sequence(&mut self, first: &FlowNode, _sequence_number: usize) -> bool {
        let start = self.next_id();
        let flow = self.next_flow();
        self.current = Sequence {
            label: first.label().map(|label| label.as_str().to_string()),
            nodes: vec![Node::new(start.clone(), START_NODE)],
            ..Sequence::default()
        };
        self.contexts.push(Context::flow(flow, start));
        true
    }

    fn post_visit_sequence(&mut self, _first: &FlowNode, _sequence_number: usize) {
        let end = self.next_id();
        let finished = self.contexts.pop();
        for from in finished.dangling {
            self.current.links.push(Link::new(from, end.clone()));
        }
        self.current.nodes.push(Node::new(end, END_NODE));
        self.sequences.push(std::mem::take(&mut self.current));
    }

    fn pre_visit_flow(&mut self, _flow: &FlowNode) -> bool {
        let flow = self.next_flow();
        if self.current.primary_flow.is_none() {
            self.current.primary_flow = Some(flow);
        }
        let start = self.contexts.top().start.clone();
        self.contexts.push(Context::flow(flow, start));
        true
    }

    fn post_visit_flow(&mut self, _flow: &FlowNode) {
        let finished = self.contexts.pop();
        let last_node = finished
            .dangling
            .first()
            .cloned()
            .unwrap_or_else(|| finished.start.clone());
        for pending in finished.pending {
            self.current.outstanding.push(OutstandingTransition {
                node: pending.node,
                state: pending.state,
                label: pending.label,
                last_node: last_node.clone(),
                flow: finished.flow,
                via: Vec::new(),
            });
        }
        self.current
            .labeled_in_flow
            .insert(finished.flow, finished.labeled);

        let parent = self.contexts.top();
        parent.dangling.extend(finished.dangling);
        parent.dangling.extend(finished.other_exits);
    }

    fn pre_visit_split(&mut self, _split: &SplitNode) -> bool {
        let context = self.contexts.top();
        let open = context.dangling.clone();
        let mut start = open
            .first()
            .cloned()
            .unwrap_or_else(|| context.start.clone());
        if open.len() > 1 {
            let sync = self.next_id();
            self.current.nodes.push(Node::new(sync.clone(), SYNC_NODE));
            for from in open {
                self.current.links.push(Link::new(from, sync.clone()));
            }
            start = sync;
        }
        self.contexts.push(Context::split(start));
        true
    }

    fn post_visit_split(&mut self, _split: &SplitNode) {
        let finished = self.contexts.pop();
        self.contexts.top().dangling = finished.dangling;
    }

    fn visit_task_app(&mut self, task_app: &TaskAppNode) {
        let id = self.next_id();
        self.current_app = id.clone();
        self.current.nodes.push(app_node(id.clone(), task_app));

        let context = self.contexts.top();
        if let Some(label) = task_app.label() {
            context.labeled.insert(label.to_string(), id.clone());
        }
        match context.kind {
            ContextKind::Flow => {
                if let Some(label) = task_app.label() {
                    let (matched, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut context.pending)
                        .into_iter()
                        .partition(|pending| pending.label == label);
                    context.pending = rest;
                    for pending in matched {
                        self.current.links.push(Link::with_transition(
                            pending.node,
                            id.clone(),
                            pending.state,
                        ));
                    }
                }
                if context.dangling.is_empty() {
                    self.current
                        .links
                        .push(Link::new(context.start.clone(), id.clone()));
                } else {
                    for from in &context.dangling {
                        self.current.links.push(Link::new(from.clone(), id.clone()));
                    }
                }
                context.dangling = vec![id];
            }
            ContextKind::Split => {
                self.current
                    .links
                    .push(Link::new(context.start.clone(), id.clone()));
                context.dangling.push(id);
            }
        }
    }

    fn visit_transition(&mut self, transition: &TransitionNode) {
        let from = self.current_app.clone();
        let state = transition.status_to_check.clone();
        match &transition.target {
            TransitionTarget::App(app) if transition.is_special_transition() => {
                let name = app.name();
                let (id, _) = self.find_or_make(name.to_string(), |id| Node::new(id, name));
                self.current
                    .links
                    .push(Link::with_transition(from, id, state));
            }
            TransitionTarget::App(app) => {
                let (id, created) = self.find_or_make(reuse_key(app), |id| app_node(id, app));
                self.current
                    .links
                    .push(Link::with_transition(from, id.clone(), state));
                if created {
                    let context = self.contexts.top();
                    match context.kind {
                        ContextKind::Flow => context.other_exits.push(id),
                        ContextKind::Split => context.dangling.push(id),
                    }
                }
            }
            TransitionTarget::Label(label) => {
                let context = self.contexts.top();
                match context.labeled.get(label.as_str()) {
                    Some(id) => {
                        let id = id.clone();
                        self.current
                            .links
                            .push(Link::with_transition(from, id, state));
                    }
                    None => context.pending.push(PendingTransition {
                        node: from,
                        state,
                        label: label.as_str().to_string(),
                    }),
                }
            }
        }
    }
}
