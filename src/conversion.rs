use std::collections::BTreeSet;
use crate::dfa::Dfa;
use crate::error::Result;
use crate::export::Diagram;
use crate::nfa::Nfa;
use crate::regex::{self, Regex};

/// One regex-to-automaton conversion. Owns every structure built along the
/// way; the DFA is built on first use and replaced in place by
/// `minimize`.
#[derive(Clone, Debug)]
pub struct Conversion {
    regex: String,
    ast: Regex,
    alphabet: BTreeSet<char>,
    nfa: Nfa,
    dfa: Option<Dfa>,
}

impl Conversion {
    /// Parses `regex` and builds its NFA. Fails on malformed input.
    pub fn new(regex: &str) -> Result<Conversion> {
        let (ast, alphabet) = regex::parse(regex)?;
        let nfa = Nfa::from_regex(&ast);
        Ok(Conversion {
            regex: regex.to_owned(),
            ast,
            alphabet,
            nfa,
            dfa: None,
        })
    }

    pub fn regex(&self) -> &str {
        &self.regex
    }

    pub fn ast(&self) -> &Regex {
        &self.ast
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    pub fn dfa(&mut self) -> Result<&Dfa> {
        let dfa = match self.dfa.take() {
            Some(dfa) => dfa,
            None => Dfa::from_nfa(&self.nfa)?,
        };
        Ok(self.dfa.insert(dfa))
    }

    /// Minimizes the cached DFA, building it first if needed.
    pub fn minimize(&mut self) -> Result<&Dfa> {
        let minimal = self.dfa()?.minimize()?;
        Ok(self.dfa.insert(minimal))
    }

    pub fn nfa_diagram(&self) -> Diagram {
        Diagram::from_nfa(&self.nfa)
    }

    pub fn dfa_diagram(&mut self) -> Result<Diagram> {
        Diagram::from_dfa(self.dfa()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::regex::ParseError;

    #[test]
    fn test_lazy_dfa() {
        let mut c = Conversion::new("a").unwrap();
        assert!(c.dfa.is_none());
        assert_eq!(c.alphabet().iter().collect::<Vec<_>>(), vec![&'a']);
        assert_eq!(c.dfa().unwrap().len(), 2);
        assert!(c.dfa.is_some());
    }

    #[test]
    fn test_minimize_in_place() {
        let mut c = Conversion::new("ab|cb").unwrap();
        assert_eq!(c.minimize().unwrap().len(), 3);
        assert_eq!(c.dfa().unwrap().len(), 3);
        assert_eq!(c.dfa_diagram().unwrap().nodes.len(), 3);
        // the NFA is untouched
        assert_eq!(c.nfa().node_count(), 4);
    }

    #[test]
    fn test_syntax_error() {
        match Conversion::new("(a|b") {
            Err(Error::Syntax(ParseError::UnexpectedChar(_, '(', 0))) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(Conversion::new("").unwrap_err(),
                   Error::Syntax(ParseError::UnexpectedEof("empty expression", 0)));
        assert_eq!(Conversion::new("εε").unwrap_err(), Error::Syntax(ParseError::EmptyAlphabet(2)));
    }
}
