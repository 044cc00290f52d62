use std::collections::{HashMap, HashSet};
use std::fmt;
use bit_set::BitSet;
use indexmap::IndexSet;
use crate::error::InvariantViolation;
use crate::nfa::Nfa;

/// DFA state indices are 0-based positions in the state table; they are
/// printed 1-based.
pub type StateId = usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    /// NFA nodes for a determinized automaton, original state indices for a
    /// minimized one.
    pub members: BitSet,
    pub start: bool,
    pub accepting: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub symbol: char,
}

#[derive(Clone, Debug, Default)]
pub struct Dfa {
    alphabet: Vec<char>,
    states: Vec<State>,
    transitions: Vec<Transition>,
    table: HashMap<(StateId, char), StateId>,
}

impl Dfa {
    /// Assembles a DFA, checking that state sets are unique and that every
    /// (state, symbol) pair has at most one transition.
    pub fn new(alphabet: Vec<char>, states: Vec<State>, transitions: Vec<Transition>)
               -> Result<Dfa, InvariantViolation> {
        let mut seen = HashMap::new();
        for (id, state) in states.iter().enumerate() {
            if let Some(&other) = seen.get(&state.members) {
                return Err(InvariantViolation::DuplicateState(other, id));
            }
            seen.insert(&state.members, id);
        }

        let mut table = HashMap::new();
        for t in &transitions {
            if t.from >= states.len() || t.to >= states.len() {
                return Err(InvariantViolation::DanglingTransition(t.from, t.symbol));
            }
            if table.insert((t.from, t.symbol), t.to).is_some() {
                return Err(InvariantViolation::Nondeterministic(t.from, t.symbol));
            }
        }

        Ok(Dfa {
            alphabet: alphabet,
            states: states,
            transitions: transitions,
            table: table,
        })
    }

    /// Subset construction.
    ///
    /// Pending state sets are kept on a stack, so states are numbered in
    /// depth-first discovery order, and symbols are tried in alphabet order.
    /// Both orders are part of the output.
    pub fn from_nfa(nfa: &Nfa) -> Result<Dfa, InvariantViolation> {
        let alphabet: Vec<char> = nfa.alphabet().iter().cloned().collect();
        let start = nfa.epsilon_closure(nfa.start()).clone();

        let mut finalized = IndexSet::new();
        let mut seen = HashSet::new();
        let mut pending = vec![start.clone()];
        let mut moves = Vec::new();
        seen.insert(start);

        while let Some(current) = pending.pop() {
            if finalized.contains(&current) {
                continue;
            }
            let from = finalized.len();
            for &symbol in &alphabet {
                let mut next = BitSet::with_capacity(nfa.node_count() + 1);
                for node in current.iter() {
                    for &target in nfa.move_on(node, symbol) {
                        next.union_with(nfa.epsilon_closure(target));
                    }
                }
                if next.is_empty() {
                    continue;
                }
                if seen.insert(next.clone()) {
                    pending.push(next.clone());
                }
                moves.push((from, next, symbol));
            }
            finalized.insert(current);
        }

        let mut transitions = Vec::with_capacity(moves.len());
        for (from, next, symbol) in moves {
            match finalized.get_index_of(&next) {
                Some(to) => transitions.push(Transition { from, to, symbol }),
                None => return Err(InvariantViolation::DanglingTransition(from, symbol)),
            }
        }
        let states = finalized.into_iter()
            .enumerate()
            .map(|(id, members)| State {
                start: id == 0,
                accepting: members.contains(nfa.accept()),
                members,
            })
            .collect();

        Dfa::new(alphabet, states, transitions)
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn start(&self) -> Option<StateId> {
        self.states.iter().position(|s| s.start)
    }

    pub fn transition(&self, from: StateId, symbol: char) -> Option<StateId> {
        self.table.get(&(from, symbol)).cloned()
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (id, state) in self.states.iter().enumerate() {
            write!(f, "{} {:?}", id + 1, state.members.iter().collect::<Vec<_>>())?;
            if state.start {
                write!(f, " start")?;
            }
            if state.accepting {
                write!(f, " accepting")?;
            }
            writeln!(f)?;
        }
        for t in &self.transitions {
            writeln!(f, "{} {} {}", t.from + 1, t.to + 1, t.symbol)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regex::{Regex, EPSILON};

    fn dfa(s: &str) -> Dfa {
        Dfa::from_nfa(&Nfa::from_regex(&s.parse().unwrap())).unwrap()
    }

    fn members(dfa: &Dfa) -> Vec<Vec<usize>> {
        dfa.states().iter().map(|s| s.members.iter().collect()).collect()
    }

    fn set(items: &[usize]) -> BitSet {
        items.iter().cloned().collect()
    }

    #[test]
    fn test_single_symbol() {
        let d = dfa("a");
        assert_eq!(members(&d), vec![vec![1], vec![2]]);
        assert_eq!(d.transitions(), &[Transition { from: 0, to: 1, symbol: 'a' }]);
        assert!(d.states()[0].start && !d.states()[0].accepting);
        assert!(!d.states()[1].start && d.states()[1].accepting);
        assert_eq!(d.to_string(), "1 [1] start\n2 [2] accepting\n1 2 a\n");
    }

    #[test]
    fn test_depth_first_numbering() {
        let d = dfa("(a|b)*abb");
        assert_eq!(members(&d), vec![vec![1], vec![1, 2], vec![1, 3], vec![1, 4]]);
        assert_eq!(d.transition(0, 'a'), Some(1));
        assert_eq!(d.transition(0, 'b'), Some(0));
        assert_eq!(d.transition(1, 'b'), Some(2));
        assert_eq!(d.transition(2, 'b'), Some(3));
        assert_eq!(d.transition(3, 'b'), Some(0));
        assert_eq!(d.transition(3, 'a'), Some(1));
        assert_eq!(d.states().iter().filter(|s| s.accepting).count(), 1);
        assert!(d.states()[3].accepting);

        // the last state discovered from the start is finalized first
        let d = dfa("ab|ba");
        assert_eq!(members(&d), vec![vec![1], vec![4], vec![2], vec![3]]);
        assert_eq!(d.transition(0, 'a'), Some(3));
        assert_eq!(d.transition(0, 'b'), Some(1));
        assert_eq!(d.transition(1, 'a'), Some(2));
        assert_eq!(d.transition(3, 'b'), Some(2));
    }

    #[test]
    fn test_start_state_accepting() {
        let d = dfa("a*");
        assert_eq!(d.len(), 1);
        assert!(d.states()[0].start && d.states()[0].accepting);
        assert_eq!(d.transition(0, 'a'), Some(0));
    }

    #[test]
    fn test_empty_alphabet() {
        let d = Dfa::from_nfa(&Nfa::from_regex(&Regex::Literal(EPSILON))).unwrap();
        assert_eq!(d.len(), 1);
        assert!(d.transitions().is_empty());
        assert!(d.states()[0].start && d.states()[0].accepting);
        assert_eq!(d.start(), Some(0));
    }

    #[test]
    fn test_deterministic() {
        for s in &["(a|b)*abb", "a*b*", "(ab|a)*b", "(a|ab)(c|bcd)(d*)"] {
            let d = dfa(s);
            let mut pairs = HashSet::new();
            for t in d.transitions() {
                assert!(pairs.insert((t.from, t.symbol)), "{}: {:?}", s, t);
            }
        }
    }

    #[test]
    fn test_invariants() {
        let state = |items: &[usize]| State { members: set(items), start: false, accepting: false };
        assert_eq!(Dfa::new(vec!['a'], vec![state(&[1]), state(&[1])], vec![]).unwrap_err(),
                   InvariantViolation::DuplicateState(0, 1));
        assert_eq!(Dfa::new(vec!['a'], vec![state(&[1]), state(&[2])], vec![
            Transition { from: 0, to: 1, symbol: 'a' },
            Transition { from: 0, to: 0, symbol: 'a' },
        ]).unwrap_err(), InvariantViolation::Nondeterministic(0, 'a'));
        assert_eq!(Dfa::new(vec!['a'], vec![state(&[1])], vec![
            Transition { from: 0, to: 3, symbol: 'a' },
        ]).unwrap_err(), InvariantViolation::DanglingTransition(0, 'a'));
    }
}
