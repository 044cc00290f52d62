use std::fmt::{self, Write};
use crate::dfa::{Dfa, State};
use crate::error::{Error, Result};
use crate::nfa::Nfa;

/// Everything a renderer needs to draw an automaton: node labels, the
/// start and accepting subsets of them, and `(from, to, label)` edges.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagram {
    pub nodes: Vec<String>,
    pub start: Vec<String>,
    pub accepting: Vec<String>,
    pub edges: Vec<(String, String, String)>,
}

impl Diagram {
    pub fn from_nfa(nfa: &Nfa) -> Diagram {
        Diagram {
            nodes: nfa.nodes().map(|n| n.to_string()).collect(),
            start: vec![nfa.start().to_string()],
            accepting: vec![nfa.accept().to_string()],
            edges: nfa.edges().iter()
                .map(|e| (e.from.to_string(), e.to.to_string(), e.label_text()))
                .collect(),
        }
    }

    /// Labels DFA states 1-based.
    pub fn from_dfa(dfa: &Dfa) -> Result<Diagram> {
        if dfa.is_empty() {
            return Err(Error::Precondition("cannot export a DFA with no states"));
        }
        let label = |id: usize| (id + 1).to_string();
        let flagged = |f: fn(&State) -> bool| -> Vec<String> {
            dfa.states().iter().enumerate()
                .filter(|&(_, s)| f(s))
                .map(|(id, _)| label(id))
                .collect()
        };
        Ok(Diagram {
            nodes: (0..dfa.len()).map(label).collect(),
            start: flagged(|s| s.start),
            accepting: flagged(|s| s.accepting),
            edges: dfa.transitions().iter()
                .map(|t| (label(t.from), label(t.to), t.symbol.to_string()))
                .collect(),
        })
    }
}

/// The renderer side of a `Diagram`.
pub trait Exporter {
    fn export<W: Write>(&self, diagram: &Diagram, out: &mut W) -> fmt::Result;

    fn export_string(&self, diagram: &Diagram) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.export(diagram, &mut out);
        out
    }
}

/// Graphviz DOT text: the start node drawn blue, accepting nodes doubled
/// and red.
#[derive(Clone, Debug)]
pub struct Dot {
    pub name: String,
}

impl Dot {
    pub fn new(name: &str) -> Dot {
        Dot { name: name.to_owned() }
    }
}

/// A DOT double-quoted string, with `"` and `\` escaped.
struct Quoted<'a>(&'a str);

impl<'a> fmt::Display for Quoted<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_char('"')?;
        for c in self.0.chars() {
            if c == '"' || c == '\\' {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        f.write_char('"')
    }
}

impl Exporter for Dot {
    fn export<W: Write>(&self, diagram: &Diagram, out: &mut W) -> fmt::Result {
        writeln!(out, "digraph {} {{", Quoted(&self.name))?;
        writeln!(out, "  rankdir=LR;")?;
        for node in &diagram.nodes {
            let mut attrs = Vec::new();
            if diagram.start.contains(node) {
                attrs.push("color=blue");
            }
            if diagram.accepting.contains(node) {
                attrs.push("peripheries=2");
                if !diagram.start.contains(node) {
                    attrs.push("color=red");
                }
            }
            if attrs.is_empty() {
                writeln!(out, "  {};", Quoted(node))?;
            } else {
                writeln!(out, "  {} [{}];", Quoted(node), attrs.join(", "))?;
            }
        }
        for &(ref from, ref to, ref label) in &diagram.edges {
            writeln!(out, "  {} -> {} [label={}];", Quoted(from), Quoted(to), Quoted(label))?;
        }
        writeln!(out, "}}")
    }
}
