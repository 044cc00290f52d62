use bit_set::BitSet;
use crate::dfa::{Dfa, State, StateId, Transition};
use crate::error::{Error, Result};

/// Symmetric relation over unordered pairs of distinct states, stored as
/// a lower triangle. A set entry means "provably distinguishable".
struct DistinguishTable {
    marks: Vec<bool>,
}

impl DistinguishTable {
    fn new(states: usize) -> Self {
        DistinguishTable {
            marks: vec![false; states * states.saturating_sub(1) / 2],
        }
    }

    fn index(i: StateId, j: StateId) -> usize {
        let (hi, lo) = if i > j { (i, j) } else { (j, i) };
        hi * (hi - 1) / 2 + lo
    }

    fn get(&self, i: StateId, j: StateId) -> bool {
        i != j && self.marks[Self::index(i, j)]
    }

    fn mark(&mut self, i: StateId, j: StateId) {
        self.marks[Self::index(i, j)] = true;
    }
}

/// Union-find whose representatives are always the smallest member.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        DisjointSet { parent: (0..len).collect() }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a < b {
            self.parent[b] = a;
        } else if b < a {
            self.parent[a] = b;
        }
    }
}

impl Dfa {
    /// Merges indistinguishable states by table filling.
    ///
    /// Each resulting state holds the set of original state indices it
    /// replaces. Classes are numbered by their smallest member, so the class
    /// of the start state comes first.
    pub fn minimize(&self) -> Result<Dfa> {
        if self.is_empty() {
            return Err(Error::Precondition("cannot minimize a DFA with no states"));
        }
        let n = self.len();
        let states = self.states();

        let mut table = DistinguishTable::new(n);
        for i in 0..n {
            for j in 0..i {
                if states[i].accepting != states[j].accepting {
                    table.mark(i, j);
                }
            }
        }

        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..n {
                for j in 0..i {
                    if table.get(i, j) {
                        continue;
                    }
                    let split = self.alphabet().iter().any(|&symbol| {
                        match (self.transition(i, symbol), self.transition(j, symbol)) {
                            (Some(p), Some(q)) => table.get(p, q),
                            (None, None) => false,
                            _ => true,
                        }
                    });
                    if split {
                        table.mark(i, j);
                        changed = true;
                    }
                }
            }
        }

        let mut classes = DisjointSet::new(n);
        for i in 0..n {
            for j in 0..i {
                if !table.get(i, j) {
                    classes.union(i, j);
                }
            }
        }

        let mut representatives = Vec::new();
        let mut class_of = vec![0; n];
        for i in 0..n {
            // roots are class minima, so a root is numbered before its members
            let root = classes.find(i);
            if root == i {
                class_of[i] = representatives.len();
                representatives.push(i);
            } else {
                class_of[i] = class_of[root];
            }
        }

        let mut members = vec![BitSet::with_capacity(n); representatives.len()];
        for i in 0..n {
            members[class_of[i]].insert(i);
        }

        let mut transitions = Vec::new();
        for (class, &rep) in representatives.iter().enumerate() {
            for &symbol in self.alphabet() {
                if let Some(to) = self.transition(rep, symbol) {
                    transitions.push(Transition { from: class, to: class_of[to], symbol });
                }
            }
        }
        let states = representatives.iter()
            .zip(members)
            .map(|(&rep, members)| State {
                members,
                start: states[rep].start,
                accepting: states[rep].accepting,
            })
            .collect();

        Ok(Dfa::new(self.alphabet().to_vec(), states, transitions)?)
    }
}
