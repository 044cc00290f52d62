use std::cell::OnceCell;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Write};
use std::ops::RangeInclusive;
use bit_set::BitSet;
use crate::regex::{Regex, EPSILON};
use crate::regex::Regex::*;

/// NFA node ids are allocated from 1 in construction order.
pub type NodeId = usize;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Label {
    Epsilon,
    Symbol(char),
}

impl From<char> for Label {
    fn from(c: char) -> Label {
        if c == EPSILON {
            Label::Epsilon
        } else {
            Label::Symbol(c)
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Label::Epsilon => f.write_char(EPSILON),
            Label::Symbol(c) => f.write_char(c),
        }
    }
}

/// All the labels leading from one node to another, in insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NfaEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub labels: Vec<Label>,
}

impl NfaEdge {
    /// The labels joined with commas, e.g. `a,b`.
    pub fn label_text(&self) -> String {
        let mut out = String::new();
        for (i, label) in self.labels.iter().enumerate() {
            if i != 0 {
                out.push(',');
            }
            out.push_str(&label.to_string());
        }
        out
    }
}

impl fmt::Display for NfaEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.from, self.to, self.label_text())
    }
}

/// A Thompson NFA with a single start and a single accepting node.
/// Immutable once built; epsilon closures are computed on first request.
#[derive(Clone, Debug)]
pub struct Nfa {
    start: NodeId,
    accept: NodeId,
    edges: Vec<NfaEdge>,
    moves: HashMap<(NodeId, Label), Vec<NodeId>>,
    alphabet: BTreeSet<char>,
    closures: Vec<OnceCell<BitSet>>,
}

/// Pending work for `Builder::build`. Every `Visit` leaves exactly one end
/// node on the result stack.
enum Task<'a> {
    Visit(&'a Regex, NodeId, Option<NodeId>, bool),
    /// Builds the right side of a concatenation from the left side's end.
    ConcatRight(&'a Regex, NodeId, Option<NodeId>, bool),
    /// Drops the end of a union's left branch.
    Discard,
    /// Replaces the end of a union's right branch with the shared end.
    Join(NodeId),
    /// Adds a star's exit edge once its body is built.
    Exit(NodeId, Option<NodeId>),
}

// every task that pops was preceded by a visit that pushed
fn pop_end(ends: &mut Vec<NodeId>) -> NodeId {
    ends.pop().unwrap_or(0)
}

struct Builder {
    edges: Vec<NfaEdge>,
    edge_index: HashMap<(NodeId, NodeId), usize>,
    moves: HashMap<(NodeId, Label), Vec<NodeId>>,
    // indexed by node id, slot 0 unused
    has_outgoing: Vec<bool>,
}

impl Builder {
    fn new() -> Builder {
        Builder {
            edges: Vec::new(),
            edge_index: HashMap::new(),
            moves: HashMap::new(),
            has_outgoing: vec![false],
        }
    }

    fn new_node(&mut self) -> NodeId {
        self.has_outgoing.push(false);
        self.has_outgoing.len() - 1
    }

    fn new_edge(&mut self, from: NodeId, to: NodeId, label: Label) {
        match self.edge_index.entry((from, to)) {
            Entry::Occupied(view) => {
                let labels = &mut self.edges[*view.get()].labels;
                if !labels.contains(&label) {
                    labels.push(label);
                }
            }
            Entry::Vacant(view) => {
                view.insert(self.edges.len());
                self.edges.push(NfaEdge { from, to, labels: vec![label] });
            }
        }
        let targets = self.moves.entry((from, label)).or_insert_with(Vec::new);
        if !targets.contains(&to) {
            targets.push(to);
        }
        self.has_outgoing[from] = true;
    }

    /// Builds the fragment for `re` starting at `s`, ending at `t` when one
    /// is given, and returns its end node. `exclusive` says whether a star
    /// may hang its loop directly on `s`: it must not when `s` is shared
    /// with a sibling branch or lies inside an enclosing loop body.
    ///
    /// Walks the tree with an explicit task stack. Nodes and edges are
    /// created in the same order as a left-to-right recursive descent.
    fn build(&mut self, re: &Regex, s: NodeId, t: Option<NodeId>, exclusive: bool) -> NodeId {
        let mut tasks = vec![Task::Visit(re, s, t, exclusive)];
        let mut ends = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Visit(&Literal(c), s, None, _) if c == EPSILON => ends.push(s),
                Task::Visit(&Literal(c), s, t, _) => {
                    let t = match t {
                        Some(t) => t,
                        None => self.new_node(),
                    };
                    self.new_edge(s, t, Label::from(c));
                    ends.push(t);
                }
                Task::Visit(&Concat(ref l, ref r), s, t, exclusive) => {
                    tasks.push(Task::ConcatRight(r, s, t, exclusive));
                    tasks.push(Task::Visit(l, s, None, exclusive));
                }
                Task::ConcatRight(r, s, t, exclusive) => {
                    let mid = pop_end(&mut ends);
                    tasks.push(Task::Visit(r, mid, t, mid != s || exclusive));
                }
                Task::Visit(&Union(ref l, ref r), s, t, _) => {
                    let end = match t {
                        Some(t) => t,
                        None => self.new_node(),
                    };
                    tasks.push(Task::Join(end));
                    tasks.push(Task::Visit(r, s, Some(end), false));
                    tasks.push(Task::Discard);
                    tasks.push(Task::Visit(l, s, Some(end), false));
                }
                Task::Discard => {
                    pop_end(&mut ends);
                }
                Task::Join(end) => {
                    pop_end(&mut ends);
                    ends.push(end);
                }
                Task::Visit(&Star(ref x), s, t, exclusive) => {
                    let anchor = if exclusive && !self.has_outgoing[s] {
                        s
                    } else {
                        let anchor = self.new_node();
                        self.new_edge(s, anchor, Label::Epsilon);
                        anchor
                    };
                    tasks.push(Task::Exit(anchor, t));
                    tasks.push(Task::Visit(x, anchor, Some(anchor), false));
                }
                Task::Exit(anchor, t) => {
                    pop_end(&mut ends);
                    if let Some(t) = t {
                        self.new_edge(anchor, t, Label::Epsilon);
                    }
                    ends.push(anchor);
                }
            }
        }
        pop_end(&mut ends)
    }

    fn finish(self, start: NodeId, accept: NodeId) -> Nfa {
        let alphabet = self.moves.keys()
            .filter_map(|&(_, label)| match label {
                Label::Symbol(c) => Some(c),
                Label::Epsilon => None,
            })
            .collect();
        Nfa {
            start,
            accept,
            closures: vec![OnceCell::new(); self.has_outgoing.len()],
            edges: self.edges,
            moves: self.moves,
            alphabet,
        }
    }
}

impl Nfa {
    /// Thompson's construction. The start node is always 1.
    pub fn from_regex(re: &Regex) -> Nfa {
        let mut builder = Builder::new();
        let start = builder.new_node();
        let accept = builder.build(re, start, None, true);
        builder.finish(start, accept)
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn accept(&self) -> NodeId {
        self.accept
    }

    pub fn node_count(&self) -> usize {
        self.closures.len() - 1
    }

    pub fn nodes(&self) -> RangeInclusive<NodeId> {
        1..=self.node_count()
    }

    /// One record per (from, to) pair, in creation order.
    pub fn edges(&self) -> &[NfaEdge] {
        &self.edges
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    /// Nodes reached from `node` by one edge labelled `symbol`.
    pub fn move_on(&self, node: NodeId, symbol: char) -> &[NodeId] {
        self.targets(node, Label::Symbol(symbol))
    }

    fn targets(&self, node: NodeId, label: Label) -> &[NodeId] {
        self.moves.get(&(node, label)).map(|v| &v[..]).unwrap_or(&[])
    }

    /// Nodes reachable from `node` through epsilon edges, `node` included.
    pub fn epsilon_closure(&self, node: NodeId) -> &BitSet {
        self.closures[node].get_or_init(|| {
            let mut closure = BitSet::with_capacity(self.closures.len());
            let mut stack = vec![node];
            closure.insert(node);
            while let Some(next) = stack.pop() {
                for &target in self.targets(next, Label::Epsilon) {
                    if closure.insert(target) {
                        stack.push(target);
                    }
                }
            }
            closure
        })
    }
}

impl fmt::Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "start: {}, accept: {}", self.start, self.accept)?;
        for edge in &self.edges {
            writeln!(f, "{}", edge)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nfa(s: &str) -> Nfa {
        Nfa::from_regex(&s.parse().unwrap())
    }

    fn edge(from: NodeId, to: NodeId, labels: &[char]) -> NfaEdge {
        NfaEdge { from, to, labels: labels.iter().map(|&c| Label::from(c)).collect() }
    }

    fn closure(nfa: &Nfa, node: NodeId) -> Vec<NodeId> {
        nfa.epsilon_closure(node).iter().collect()
    }

    #[test]
    fn test_literal() {
        let x = nfa("a");
        assert_eq!(x.node_count(), 2);
        assert_eq!((x.start(), x.accept()), (1, 2));
        assert_eq!(x.edges(), &[edge(1, 2, &['a'])]);
        assert_eq!(x.move_on(1, 'a'), &[2]);
        assert_eq!(x.move_on(2, 'a'), &[] as &[NodeId]);
    }

    #[test]
    fn test_star_self_loop() {
        let x = nfa("a*");
        assert_eq!(x.node_count(), 1);
        assert_eq!((x.start(), x.accept()), (1, 1));
        assert_eq!(x.edges(), &[edge(1, 1, &['a'])]);
    }

    #[test]
    fn test_union_merges_labels() {
        let x = nfa("a|b");
        assert_eq!(x.node_count(), 2);
        assert_eq!(x.edges(), &[edge(1, 2, &['a', 'b'])]);
        assert_eq!(x.edges()[0].to_string(), "1 2 a,b");

        let x = nfa("a|a");
        assert_eq!(x.edges(), &[edge(1, 2, &['a'])]);
    }

    #[test]
    fn test_star_with_exit() {
        let x = nfa("(a|b)*abb");
        assert_eq!(x.node_count(), 4);
        assert_eq!(x.edges(), &[
            edge(1, 1, &['a', 'b']),
            edge(1, 2, &['a']),
            edge(2, 3, &['b']),
            edge(3, 4, &['b']),
        ]);
        assert_eq!(x.move_on(1, 'a'), &[1, 2]);

        let x = nfa("(ab*)*");
        assert_eq!(x.edges(), &[
            edge(1, 2, &['a']),
            edge(2, 2, &['b']),
            edge(2, 1, &[EPSILON]),
        ]);
        assert_eq!(x.accept(), 1);
        assert_eq!(closure(&x, 2), vec![1, 2]);
    }

    #[test]
    fn test_shared_anchor_gets_fresh_node() {
        let x = nfa("a*b*");
        assert_eq!(x.edges(), &[
            edge(1, 1, &['a']),
            edge(1, 2, &[EPSILON]),
            edge(2, 2, &['b']),
        ]);
        assert_eq!(x.accept(), 2);

        let x = nfa("a*|b");
        assert_eq!(x.edges(), &[
            edge(1, 3, &[EPSILON]),
            edge(3, 3, &['a']),
            edge(3, 2, &[EPSILON]),
            edge(1, 2, &['b']),
        ]);
        assert_eq!(closure(&x, 1), vec![1, 2, 3]);
    }

    #[test]
    fn test_epsilon_literal() {
        let x = Nfa::from_regex(&Regex::Literal(EPSILON));
        assert_eq!(x.node_count(), 1);
        assert!(x.edges().is_empty());
        assert!(x.alphabet().is_empty());

        let x = nfa("a|ε");
        assert_eq!(x.edges(), &[edge(1, 2, &['a', EPSILON])]);
        assert_eq!(closure(&x, 1), vec![1, 2]);
        assert_eq!(x.alphabet().iter().collect::<Vec<_>>(), vec![&'a']);
    }

    #[test]
    fn test_node_order() {
        let x = nfa("ab(c|d)");
        assert_eq!(x.nodes().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(x.edges(), &[
            edge(1, 2, &['a']),
            edge(2, 3, &['b']),
            edge(3, 4, &['c', 'd']),
        ]);
    }
}
