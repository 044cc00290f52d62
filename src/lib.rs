//! Regular expressions to minimal DFAs: a two-stack parser, Thompson's
//! construction, subset construction and table-filling minimization.
extern crate bit_set;
extern crate indexmap;

pub use conversion::Conversion;
pub use dfa::{Dfa, State, StateId, Transition};
pub use error::{Error, InvariantViolation, Result};
pub use export::{Diagram, Dot, Exporter};
pub use nfa::{Label, Nfa, NfaEdge, NodeId};
pub use regex::{ParseError, Regex, EPSILON};
pub mod conversion;
pub mod dfa;
pub mod error;
pub mod export;
mod minimize;
pub mod nfa;
pub mod regex;
