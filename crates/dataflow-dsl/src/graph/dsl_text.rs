//! Rendering graphs back into composed task definitions.
//!
//! The writer walks links from `START`. A node with one outgoing link
//! continues the current flow with `&&`; several plain links open a split
//! that closes at the first node all of its branches reach. Branches of a
//! wider split that meet earlier than that are nested splits of their own.
//! Transition links are written on the app they leave from as
//! `'status'->target`.
//!
//! Graphs coming from JSON can be anything, so the walk refuses graphs with
//! cycles or links to unknown nodes up front.

use super::{END_NODE, FAIL_NODE, Graph, GraphError, START_NODE};
use crate::ast::{END, FAIL};

type NodeIndex = usize;
type LinkIndex = usize;

pub(super) fn write(graph: &Graph) -> Result<String, GraphError> {
    let writer = DslWriter::new(graph)?;
    writer.write()
}

struct DslWriter<'g> {
    graph: &'g Graph,
    /// Link endpoints resolved to node indices.
    endpoints: Vec<(NodeIndex, NodeIndex)>,
    text: String,
    unvisited: Vec<NodeIndex>,
    unfollowed: Vec<LinkIndex>,
}

impl<'g> DslWriter<'g> {
    fn new(graph: &'g Graph) -> Result<Self, GraphError> {
        let index_of = |id: &str| {
            graph
                .nodes
                .iter()
                .position(|node| node.id == id)
                .ok_or_else(|| GraphError::Malformed(format!("link refers to unknown node '{id}'")))
        };
        let endpoints = graph
            .links
            .iter()
            .map(|link| Ok((index_of(&link.from)?, index_of(&link.to)?)))
            .collect::<Result<Vec<_>, GraphError>>()?;

        let writer = Self {
            graph,
            endpoints,
            text: String::new(),
            unvisited: (0..graph.nodes.len()).collect(),
            unfollowed: (0..graph.links.len()).collect(),
        };
        writer.check_acyclic()?;
        Ok(writer)
    }

    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut incoming = vec![0usize; self.graph.nodes.len()];
        for &(_, to) in &self.endpoints {
            incoming[to] += 1;
        }
        let mut ready: Vec<NodeIndex> = (0..incoming.len()).filter(|&n| incoming[n] == 0).collect();
        let mut seen = 0;
        while let Some(node) = ready.pop() {
            seen += 1;
            for &(from, to) in &self.endpoints {
                if from == node {
                    incoming[to] -= 1;
                    if incoming[to] == 0 {
                        ready.push(to);
                    }
                }
            }
        }
        if seen == incoming.len() {
            Ok(())
        } else {
            Err(GraphError::Malformed("graph contains a cycle".to_string()))
        }
    }

    fn node_named(&self, name: &str) -> Option<NodeIndex> {
        self.graph.nodes.iter().position(|node| node.name == name)
    }

    fn target(&self, link: LinkIndex) -> NodeIndex {
        self.endpoints[link].1
    }

    fn write(mut self) -> Result<String, GraphError> {
        let (Some(start), Some(end)) = (self.node_named(START_NODE), self.node_named(END_NODE))
        else {
            return Err(GraphError::Malformed(
                "problems finding START and END nodes".to_string(),
            ));
        };
        self.mark_visited(start);
        self.mark_visited(end);
        if let Some(fail) = self.node_named(FAIL_NODE) {
            self.mark_visited(fail);
        }

        let to_follow = self.links_from(start, false);
        self.follow_links(to_follow, None, false)?;

        // Nodes only reachable through transitions that go on somewhere.
        while let Some(head) = self.find_head() {
            self.mark_visited(head);
            let to_follow = self.links_from(head, false);
            if !to_follow.is_empty() {
                self.text.push_str(" && ");
                self.print_node(head);
                self.follow_links(to_follow, None, false)?;
            }
        }
        Ok(self.text)
    }

    fn mark_visited(&mut self, node: NodeIndex) {
        self.unvisited.retain(|&n| n != node);
    }

    fn mark_followed(&mut self, link: LinkIndex) {
        self.unfollowed.retain(|&l| l != link);
    }

    /// Walk back from the first unvisited node over unfollowed links.
    fn find_head(&self) -> Option<NodeIndex> {
        let mut candidate = *self.unvisited.first()?;
        let mut changed = true;
        while changed {
            changed = false;
            for &link in &self.unfollowed {
                let (from, to) = self.endpoints[link];
                if to == candidate {
                    candidate = from;
                    changed = true;
                }
            }
        }
        Some(candidate)
    }

    fn follow_links(
        &mut self,
        mut to_follow: Vec<LinkIndex>,
        terminate_at: Option<NodeIndex>,
        in_nested_split: bool,
    ) -> Result<(), GraphError> {
        while !to_follow.is_empty() {
            if to_follow.len() == 1 {
                let link = to_follow[0];
                if Some(self.target(link)) != terminate_at {
                    if !self.text.is_empty() {
                        self.text.push_str(" && ");
                    }
                    self.follow_link(link, terminate_at)?;
                }
                break;
            }

            if !in_nested_split && !self.text.is_empty() {
                self.text.push_str(" && ");
            }
            self.text.push('<');
            let end_of_split = self.find_end_of_split(&to_follow)?;
            if to_follow.len() > 2 {
                let nested = self.find_nested_splits(&to_follow, end_of_split)?;
                for (i, (nested_end, nested_links)) in nested.iter().enumerate() {
                    self.follow_links(nested_links.clone(), Some(*nested_end), true)?;
                    to_follow.retain(|link| !nested_links.contains(link));
                    self.text.push_str(" && ");
                    self.follow_node(*nested_end, Some(end_of_split))?;
                    if i + 1 < nested.len() {
                        self.text.push_str(" || ");
                    }
                }
                if !to_follow.is_empty() && !nested.is_empty() {
                    self.text.push_str(" || ");
                }
            }
            for (i, &link) in to_follow.iter().enumerate() {
                if i > 0 {
                    self.text.push_str(" || ");
                }
                self.follow_link(link, Some(end_of_split))?;
            }
            self.text.push('>');

            let end_node = &self.graph.nodes[end_of_split];
            if end_node.is_end() || Some(end_of_split) == terminate_at {
                break;
            }
            self.mark_visited(end_of_split);
            if !end_node.is_sync() {
                self.text.push_str(" && ");
                self.print_node(end_of_split);
                let mut transitions = self.links_from(end_of_split, false);
                self.print_transitions(&mut transitions, None);
            }
            to_follow = self.plain_links_from(end_of_split, false);
        }
        Ok(())
    }

    fn follow_link(
        &mut self,
        link: LinkIndex,
        finish_at: Option<NodeIndex>,
    ) -> Result<(), GraphError> {
        self.mark_followed(link);
        self.follow_node(self.target(link), finish_at)
    }

    fn follow_node(
        &mut self,
        node: NodeIndex,
        finish_at: Option<NodeIndex>,
    ) -> Result<(), GraphError> {
        let mut to_follow = self.links_from(node, false);

        // An app whose transitions branch off and then meet again with its
        // plain successor needs a split of its own, or whatever follows
        // the meeting point would only run after the plain path.
        let mut common_target = None;
        if to_follow.len() > 1 && self.all_transitions_but_one(&to_follow) {
            let ordered = self.transitions_first(&to_follow);
            if let Ok(target) = self.find_end_of_split(&ordered)
                && !self.graph.nodes[target].is_end()
                && finish_at != Some(target)
            {
                common_target = Some(target);
            }
        }

        match common_target {
            Some(target) => {
                self.text.push('<');
                self.print_node(node);
                self.print_transitions(&mut to_follow, Some(target));
                self.text.push('>');
            }
            None => {
                self.print_node(node);
                self.print_transitions(&mut to_follow, finish_at);
            }
        }
        self.follow_links(to_follow, finish_at, false)
    }

    fn print_node(&mut self, node: NodeIndex) {
        self.mark_visited(node);
        let graph_node = &self.graph.nodes[node];
        if let Some(label) = &graph_node.label {
            self.text.push_str(label);
            self.text.push_str(": ");
        }
        self.text.push_str(&graph_node.name);
        self.print_properties(node);
    }

    fn print_properties(&mut self, node: NodeIndex) {
        for (key, value) in &self.graph.nodes[node].properties {
            let value = if value.contains(' ') && !value.starts_with('\'') {
                format!("'{value}'")
            } else {
                value.clone()
            };
            self.text.push_str(&format!(" --{key}={value}"));
        }
    }

    /// Write the transition links of `to_follow` and drop them from it.
    fn print_transitions(&mut self, to_follow: &mut Vec<LinkIndex>, finish_at: Option<NodeIndex>) {
        let mut plain = Vec::new();
        for link in std::mem::take(to_follow) {
            let Some(status) = self.graph.links[link].transition_name() else {
                plain.push(link);
                continue;
            };
            let status = if status.parse::<i32>().is_err() && !status.starts_with('\'') {
                format!("'{status}'")
            } else {
                status.to_string()
            };

            let target = self.target(link);
            let target_node = &self.graph.nodes[target];
            let target_name = match target_node.name.as_str() {
                FAIL_NODE => FAIL.to_string(),
                END_NODE => END.to_string(),
                name => match &target_node.label {
                    Some(label) => format!("{label}: {name}"),
                    None => name.to_string(),
                },
            };
            self.text.push_str(&format!(" {status}->{target_name}"));
            self.print_properties(target);
            self.mark_followed(link);

            let onward = self.links_from(target, false);
            if onward.is_empty() || self.all_link_to(&onward, finish_at) {
                self.mark_visited(target);
            }
        }
        *to_follow = plain;
    }

    fn all_link_to(&self, links: &[LinkIndex], node: Option<NodeIndex>) -> bool {
        node.is_some_and(|node| links.iter().all(|&link| self.target(link) == node))
    }

    fn all_transitions_but_one(&self, links: &[LinkIndex]) -> bool {
        self.count_plain(links) == 1
    }

    /// Transition links first, in reverse, then plain links in order.
    fn transitions_first(&self, links: &[LinkIndex]) -> Vec<LinkIndex> {
        let mut ordered = Vec::with_capacity(links.len());
        for &link in links {
            if self.graph.links[link].has_transition() {
                ordered.insert(0, link);
            } else {
                ordered.push(link);
            }
        }
        ordered
    }

    fn count_plain(&self, links: &[LinkIndex]) -> usize {
        links
            .iter()
            .filter(|&&link| !self.graph.links[link].has_transition())
            .count()
    }

    /// Outgoing links of `node`. Plain links to `END` are only included
    /// with `include_end`.
    fn links_from(&self, node: NodeIndex, include_end: bool) -> Vec<LinkIndex> {
        (0..self.graph.links.len())
            .filter(|&link| {
                let (from, to) = self.endpoints[link];
                from == node
                    && (include_end
                        || !(self.graph.nodes[to].is_end()
                            && self.graph.links[link].properties.is_empty()))
            })
            .collect()
    }

    /// Outgoing links of `node` without a transition, or with the `'*'`
    /// catch-all.
    fn plain_links_from(&self, node: NodeIndex, include_end: bool) -> Vec<LinkIndex> {
        (0..self.graph.links.len())
            .filter(|&link| {
                let (from, to) = self.endpoints[link];
                if from != node {
                    return false;
                }
                match self.graph.links[link].transition_name() {
                    None => include_end || !self.graph.nodes[to].is_end(),
                    Some(status) => status == "'*'",
                }
            })
            .collect()
    }

    /// Whether `candidate` is reachable by taking `link`.
    fn found_in_chain(&self, link: LinkIndex, candidate: NodeIndex) -> bool {
        self.reachable(self.target(link), candidate)
    }

    fn reachable(&self, from: NodeIndex, candidate: NodeIndex) -> bool {
        let mut seen = vec![false; self.graph.nodes.len()];
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == candidate {
                return true;
            }
            if std::mem::replace(&mut seen[node], true) {
                continue;
            }
            stack.extend(self.links_from(node, true).into_iter().map(|l| self.target(l)));
        }
        false
    }

    /// Whether `b` comes after `a`.
    fn is_successor(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.links_from(a, true)
            .into_iter()
            .any(|link| self.found_in_chain(link, b))
    }

    /// The next node on the way down from `node`, skipping over any split
    /// that starts there.
    fn step_forward(&self, node: NodeIndex) -> Result<Option<NodeIndex>, GraphError> {
        let mut links = self.links_from(node, true);
        match links.len() {
            0 => Ok(None),
            1 => Ok(Some(self.target(links[0]))),
            _ if self.count_plain(&links) <= 1 => Ok(Some(self.target(links[0]))),
            _ => {
                let mut next = node;
                while self.count_plain(&links) > 1 {
                    next = self.find_end_of_split(&links)?;
                    links = self.links_from(next, true);
                }
                Ok(Some(next))
            }
        }
    }

    /// The first node on the path of the first link that every other link
    /// leads to as well.
    fn find_end_of_split(&self, to_follow: &[LinkIndex]) -> Result<NodeIndex, GraphError> {
        let Some((&first, rest)) = to_follow.split_first() else {
            return Err(GraphError::Malformed("split without branches".to_string()));
        };
        let mut candidate = Some(self.target(first));
        while let Some(node) = candidate {
            if rest.iter().all(|&link| self.found_in_chain(link, node)) {
                return Ok(node);
            }
            candidate = self.step_forward(node)?;
        }
        Err(GraphError::Malformed("unable to find end of split".to_string()))
    }

    /// Links that reach `node` besides `known`, followed by `known`.
    fn links_reaching(
        &self,
        links: &[LinkIndex],
        known: LinkIndex,
        node: NodeIndex,
    ) -> Option<Vec<LinkIndex>> {
        let mut reaching: Vec<LinkIndex> = links
            .iter()
            .copied()
            .filter(|&link| link != known && self.found_in_chain(link, node))
            .collect();
        if reaching.is_empty() {
            return None;
        }
        reaching.push(known);
        Some(reaching)
    }

    /// Groups of links in a split that meet before its end, keyed by where
    /// they meet, earliest meeting point first.
    fn find_nested_splits(
        &self,
        to_follow: &[LinkIndex],
        end: NodeIndex,
    ) -> Result<Vec<(NodeIndex, Vec<LinkIndex>)>, GraphError> {
        let mut nested: Vec<(NodeIndex, Vec<LinkIndex>)> = Vec::new();
        for &link in to_follow {
            let mut successor = Some(self.target(link));
            while let Some(node) = successor
                && node != end
            {
                if let Some(common) = self.links_reaching(to_follow, link, node) {
                    let mut insert = true;
                    let mut shorter = None;
                    for (known_end, known_links) in &nested {
                        if same_links(known_links, &common) {
                            if self.is_successor(*known_end, node) {
                                insert = false;
                            } else {
                                shorter = Some(*known_end);
                            }
                        }
                    }
                    if insert {
                        if let Some(shorter) = shorter {
                            nested.retain(|(known_end, _)| *known_end != shorter);
                        }
                        match nested.iter_mut().find(|(known_end, _)| *known_end == node) {
                            Some(entry) => entry.1 = common,
                            None => nested.push((node, common)),
                        }
                    }
                }
                successor = self.step_forward(node)?;
            }
        }

        // Stable insertion sort, a meeting point goes before those after it.
        let mut sorted: Vec<(NodeIndex, Vec<LinkIndex>)> = Vec::with_capacity(nested.len());
        for entry in nested {
            let mut at = sorted.len();
            while at > 0 && sorted[at - 1].0 != entry.0 && self.is_successor(entry.0, sorted[at - 1].0)
            {
                at -= 1;
            }
            sorted.insert(at, entry);
        }
        Ok(sorted)
    }
}

fn same_links(a: &[LinkIndex], b: &[LinkIndex]) -> bool {
    a.iter().all(|link| b.contains(link)) && b.iter().all(|link| a.contains(link))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{graph::Link, graph::Node, parse_task};

    fn round_trip(dsl: &str) -> String {
        let task = parse_task(Some("test"), dsl, true, true).unwrap();
        task.to_graph().unwrap().to_dsl_text().unwrap()
    }

    fn assert_round_trip(dsl: &str) {
        assert_eq!(round_trip(dsl), dsl);
    }

    #[test]
    fn test_flows_and_splits() {
        for dsl in [
            "AppA",
            "AppA && AppB",
            "<AppA || AppB>",
            "<AppA && AppB || AppC>",
            "<AppA || AppB && AppC>",
            "<AppA && AppB || foo: AppB && AppC>",
            "AppA && <AppB || AppC>",
            "AppA && <AppB || AppC> && AppD",
            "<AppA || AppB> && <AppC || AppD>",
            "<AppA && AppB || AppC> && <AppD || AppE && AppF>",
            "<foojob || bbb && ccc>",
            "<a || b> && c",
            "a && <b || c>",
            "a-b-c && d-e-f",
        ] {
            assert_round_trip(dsl);
        }
    }

    #[test]
    fn test_transitions() {
        for dsl in [
            "AppA 0->AppE && AppB",
            "AppA 0->AppE && AppB && AppC",
            "AppA 0->AppE && AppB && <AppC || AppD>",
            "aaa 'FOO'->XXX 'B'->bbb1 '*'->ccc1 && bbb2 && ccc2",
            "<Foo 'failed'->Kill || Bar>",
            "<AppA 'failed'->Kill || AppB> && AppC",
            "aaa '*'->$END && bbb",
            "aaa '*'->$END && <bbb || ccc>",
            "aaa '*'->$END && bbb && ccc",
            "<a || b> && foo && <c || d>",
            "<a || b> && foo 'wibble'->$END && <c || d>",
            "<a || b> && foo 'wibble'->$FAIL && <c || d>",
            "aaa 'COMPLETED'->kill1 'FOO'->kill2",
            "aaa 'COMPLETED'->kill && bbb && ccc",
            "aaa 'COMPLETED'->kill1 && bbb 'COMPLETED'->kill2 && ccc",
            "aaa 'COMPLETED'->x: kill 'FOO'->bar && bbb 'COMPLETED'->y: kill && ccc",
            "<aaa 'COMPLETED'->kill || bbb> && ccc",
            "foo 'oranges'->$END",
        ] {
            assert_round_trip(dsl);
        }
    }

    #[test]
    fn test_nested_splits() {
        for dsl in [
            "<aaa || ccc || ddd> && eee",
            "<aaa || bbb && <ccc || ddd>> && eee",
            "<aaa && <bbb || ccc> && foo || ddd && eee> && fff",
            "<aaa && <bbb || ccc> || ddd && eee> && fff",
            "<aaa || bbb && <ccc || ddd>> && <eee || fff>",
            "<aaa || bbb && <ccc || ddd>> && <eee || fff> && <ggg || hhh>",
            "<aaa && fff || bbb && ggg && <ccc || ddd>> && eee && hhh && iii && <jjj || kkk && lll>",
            "<<AA || BB> && CC || <DD || EE> && FF && GG || HH>",
        ] {
            assert_round_trip(dsl);
        }
    }

    #[test]
    fn test_normalized_forms() {
        assert_eq!(round_trip("<AppA>"), "AppA");
        assert_eq!(round_trip("<AppA> && AppB"), "AppA && AppB");
        assert_eq!(round_trip("<AppA 99 -> AppC> && AppB"), "<AppA 99->AppC> && AppB");
    }

    #[test]
    fn test_transition_branches_that_meet_again() {
        assert_round_trip(
            "<Import: timestamp 'Error2'->T2: timestamp 'Error'->T1: timestamp> && Backwards: timestamp",
        );
        assert_round_trip(
            "Import: timestamp 'Error2'->T2: timestamp 'Error'->T1: timestamp && Backwards: timestamp",
        );
    }

    #[test]
    fn test_properties() {
        assert_round_trip("timestamp --format=aabbcc");
        assert_round_trip(
            "t1: timestamp --format=aabbcc 'FAILED'->t2: timestamp --format=ddeeff && t3: timestamp --format=gghhii",
        );
    }

    #[test]
    fn test_edited_graph() {
        let task = parse_task(
            None,
            "eee: timestamp --format=ttt 'FAILED'->QQQQQ: timestamp --format=NOT-IN-TEXT && ooo: timestamp --format=yyyy",
            true,
            true,
        )
        .unwrap();
        let mut graph = task.to_graph().unwrap();
        graph.nodes[2].properties.insert("format".to_string(), "zzz".to_string());

        assert_eq!(
            graph.to_dsl_text().unwrap(),
            "eee: timestamp --format=ttt 'FAILED'->QQQQQ: timestamp --format=zzz && ooo: timestamp --format=yyyy"
        );
    }

    #[test]
    fn test_node_reachable_only_by_transition() {
        let graph = Graph::new(
            vec![
                Node::new("0", START_NODE),
                Node::new("1", "aa"),
                Node::new("2", "bb"),
                Node::new("3", "cc"),
                Node::new("4", END_NODE),
            ],
            vec![
                Link::new("0", "1"),
                Link::with_transition("1", "2", "foo"),
                Link::new("1", "4"),
                Link::new("2", "3"),
                Link::new("3", "4"),
            ],
        );

        assert_eq!(graph.to_dsl_text().unwrap(), "aa 'foo'->bb && bb && cc");
    }

    #[test]
    fn test_malformed_graphs() {
        let no_end = Graph::new(vec![Node::new("0", START_NODE)], Vec::new());
        assert!(matches!(no_end.to_dsl_text(), Err(GraphError::Malformed(_))));

        let dangling = Graph::new(
            vec![Node::new("0", START_NODE), Node::new("1", END_NODE)],
            vec![Link::new("0", "7")],
        );
        assert!(matches!(dangling.to_dsl_text(), Err(GraphError::Malformed(_))));

        let cyclic = Graph::new(
            vec![
                Node::new("0", START_NODE),
                Node::new("1", "a"),
                Node::new("2", "b"),
                Node::new("3", END_NODE),
            ],
            vec![
                Link::new("0", "1"),
                Link::new("1", "2"),
                Link::new("2", "1"),
                Link::new("2", "3"),
            ],
        );
        assert_eq!(
            cyclic.to_dsl_text(),
            Err(GraphError::Malformed("graph contains a cycle".to_string()))
        );
    }
}
