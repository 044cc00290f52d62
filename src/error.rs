use std::{error, fmt, result};
use crate::regex::ParseError;

/// A broken DFA invariant. Never produced by a correct construction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Two recorded states share the same underlying set.
    DuplicateState(usize, usize),
    /// A state has more than one transition on a symbol.
    Nondeterministic(usize, char),
    /// A transition leaves or enters a state outside the state table.
    DanglingTransition(usize, char),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            InvariantViolation::DuplicateState(a, b) =>
                write!(f, "states {} and {} hold the same set", a + 1, b + 1),
            InvariantViolation::Nondeterministic(s, c) =>
                write!(f, "state {} has several transitions on `{}`", s + 1, c),
            InvariantViolation::DanglingTransition(s, c) =>
                write!(f, "transition from state {} on `{}` leads nowhere", s + 1, c),
        }
    }
}

impl error::Error for InvariantViolation {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Syntax(ParseError),
    Invariant(InvariantViolation),
    /// An operation needed an automaton that was never built.
    Precondition(&'static str),
}

pub type Result<T> = result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Syntax(ref e) => write!(f, "syntax error: {}", e),
            Error::Invariant(ref e) => write!(f, "invariant violated: {}", e),
            Error::Precondition(s) => write!(f, "precondition failed: {}", s),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Syntax(ref e) => Some(e),
            Error::Invariant(ref e) => Some(e),
            Error::Precondition(_) => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Error {
        Error::Syntax(e)
    }
}

impl From<InvariantViolation> for Error {
    fn from(e: InvariantViolation) -> Error {
        Error::Invariant(e)
    }
}
