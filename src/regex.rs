use std::collections::BTreeSet;
use std::fmt::{self, Write};
use std::{mem, str};
use self::Regex::*;

/// The empty-string marker. Accepted in input, never part of an alphabet.
pub const EPSILON: char = '\u{03B5}';

/// A regular expression over `char` symbols.
///
/// Concatenation and union chains nest to the right, so a long flat
/// expression is a deep tree. Every walk over it, dropping included, uses
/// an explicit stack.
#[derive(PartialOrd, Ord, PartialEq, Eq, Clone, Hash)]
pub enum Regex {
    /// A single symbol, or `EPSILON` for the empty string.
    Literal(char),
    /// Matches the left expression followed by the right one.
    Concat(Box<Regex>, Box<Regex>),
    /// Matches either side.
    Union(Box<Regex>, Box<Regex>),
    /// Kleene closure. Matches zero or more repetitions of the contained regex.
    Star(Box<Regex>),
}

impl Regex {
    pub fn concat(lhs: Regex, rhs: Regex) -> Regex {
        Concat(Box::new(lhs), Box::new(rhs))
    }

    pub fn union(lhs: Regex, rhs: Regex) -> Regex {
        Union(Box::new(lhs), Box::new(rhs))
    }

    pub fn star(inner: Regex) -> Regex {
        Star(Box::new(inner))
    }

    /// The symbols used by the expression, excluding `EPSILON`.
    pub fn alphabet(&self) -> BTreeSet<char> {
        let mut out = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(re) = stack.pop() {
            match *re {
                Literal(c) => {
                    if c != EPSILON {
                        out.insert(c);
                    }
                }
                Concat(ref l, ref r) | Union(ref l, ref r) => {
                    stack.push(r);
                    stack.push(l);
                }
                Star(ref x) => stack.push(x),
            }
        }
        out
    }

    /// Moves every non-leaf child out onto `out`, leaving `EPSILON` behind.
    fn take_children(&mut self, out: &mut Vec<Regex>) {
        fn take(child: &mut Regex, out: &mut Vec<Regex>) {
            if let Literal(_) = *child {
                return;
            }
            out.push(mem::replace(child, Literal(EPSILON)));
        }
        match *self {
            Literal(_) => {}
            Concat(ref mut l, ref mut r) | Union(ref mut l, ref mut r) => {
                take(l, out);
                take(r, out);
            }
            Star(ref mut x) => take(x, out),
        }
    }

    /// Writes the expression token by token. `expand` pushes the tokens of
    /// a non-literal node onto the stack in reverse order.
    fn write_flat<'a>(&'a self, f: &mut fmt::Formatter,
                      literal: fn(char, &mut fmt::Formatter) -> fmt::Result,
                      expand: fn(&'a Regex, &mut Vec<Token<'a>>)) -> fmt::Result {
        let mut stack = vec![Token::Expr(self)];
        while let Some(token) = stack.pop() {
            match token {
                Token::Text(s) => f.write_str(s)?,
                Token::Expr(&Literal(c)) => literal(c, f)?,
                Token::Expr(re) => expand(re, &mut stack),
            }
        }
        Ok(())
    }
}

impl Drop for Regex {
    fn drop(&mut self) {
        let mut stack = Vec::new();
        self.take_children(&mut stack);
        while let Some(mut re) = stack.pop() {
            re.take_children(&mut stack);
        }
    }
}

enum Token<'a> {
    Expr(&'a Regex),
    Text(&'static str),
}

fn push_child<'a>(stack: &mut Vec<Token<'a>>, re: &'a Regex, parens: bool) {
    if parens {
        stack.push(Token::Text(")"));
        stack.push(Token::Expr(re));
        stack.push(Token::Text("("));
    } else {
        stack.push(Token::Expr(re));
    }
}

/// Prints the expression in a form the parser reads back to the same tree.
/// Union and concatenation group to the right, so only left-nested chains
/// and lower-precedence children need parentheses.
impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_flat(f, |c, f| f.write_char(c), |re, stack| match *re {
            Literal(_) => {}
            Union(ref l, ref r) => {
                push_child(stack, r, false);
                stack.push(Token::Text("|"));
                push_child(stack, l, matches!(**l, Union(..)));
            }
            Concat(ref l, ref r) => {
                push_child(stack, r, matches!(**r, Union(..)));
                push_child(stack, l, matches!(**l, Union(..) | Concat(..)));
            }
            Star(ref x) => {
                stack.push(Token::Text("*"));
                push_child(stack, x, matches!(**x, Union(..) | Concat(..)));
            }
        })
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_flat(f, |c, f| write!(f, "Literal({:?})", c), |re, stack| match *re {
            Literal(_) => {}
            Concat(ref l, ref r) | Union(ref l, ref r) => {
                stack.push(Token::Text(")"));
                stack.push(Token::Expr(r));
                stack.push(Token::Text(", "));
                stack.push(Token::Expr(l));
                stack.push(Token::Text(if let Concat(..) = *re { "Concat(" } else { "Union(" }));
            }
            Star(ref x) => {
                stack.push(Token::Text(")"));
                stack.push(Token::Expr(x));
                stack.push(Token::Text("Star("));
            }
        })
    }
}

/*
regex  : term
       : term '|' regex
term   : factor
       : factor term
factor : atom
       : factor '*'
atom   : SYMBOL
       : '(' regex ')'
*/
/// A malformed expression. Positions are 0-based character indices.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedEof(&'static str, usize),
    UnexpectedChar(&'static str, char, usize),
    EmptyAlphabet(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ParseError::UnexpectedEof(s, pos) => write!(f, "{} at {}", s, pos),
            ParseError::UnexpectedChar(s, c, pos) => write!(f, "{}: `{}` at {}", s, c, pos),
            ParseError::EmptyAlphabet(pos) => write!(f, "expression uses no symbols at {}", pos),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Op {
    Concat,
    Union,
    Open,
}

impl Op {
    fn symbol(self) -> char {
        match self {
            Op::Concat => '.',
            Op::Union => '|',
            Op::Open => '(',
        }
    }
}

struct Parser {
    input: Vec<char>,
    operands: Vec<Regex>,
    operators: Vec<(Op, usize)>,
    alphabet: BTreeSet<char>,
}

type Res<T> = Result<T, ParseError>;

impl Parser {
    /// Concatenation has no operator character, so one is pushed whenever
    /// the next character can start a new factor.
    fn concat_next(&mut self, pos: usize) {
        match self.input.get(pos + 1) {
            Some(&c) if c != '*' && c != '|' && c != ')' => {
                self.operators.push((Op::Concat, pos + 1));
            }
            _ => {}
        }
    }

    fn reduce(&mut self, op: Op, pos: usize) -> Res<()> {
        if op == Op::Open {
            return Err(ParseError::UnexpectedChar("unmatched '('", '(', pos));
        }
        let (rhs, lhs) = match (self.operands.pop(), self.operands.pop()) {
            (Some(rhs), Some(lhs)) => (rhs, lhs),
            _ => return Err(ParseError::UnexpectedChar("missing operand", op.symbol(), pos)),
        };
        self.operands.push(match op {
            Op::Union => Regex::union(lhs, rhs),
            _ => Regex::concat(lhs, rhs),
        });
        Ok(())
    }

    fn parse(mut self) -> Res<(Regex, BTreeSet<char>)> {
        for pos in 0..self.input.len() {
            let c = self.input[pos];
            match c {
                '*' => {
                    let r = self.operands.pop()
                        .ok_or(ParseError::UnexpectedChar("nothing to repeat", c, pos))?;
                    self.operands.push(Regex::star(r));
                    self.concat_next(pos);
                }
                '|' => {
                    while let Some(&(Op::Concat, at)) = self.operators.last() {
                        self.operators.pop();
                        self.reduce(Op::Concat, at)?;
                    }
                    self.operators.push((Op::Union, pos));
                }
                '(' => self.operators.push((Op::Open, pos)),
                ')' => {
                    loop {
                        match self.operators.pop() {
                            Some((Op::Open, _)) => break,
                            Some((op, at)) => self.reduce(op, at)?,
                            None => return Err(ParseError::UnexpectedChar("unmatched ')'", c, pos)),
                        }
                    }
                    self.concat_next(pos);
                }
                _ => {
                    if c != EPSILON {
                        self.alphabet.insert(c);
                    }
                    self.operands.push(Literal(c));
                    self.concat_next(pos);
                }
            }
        }
        while let Some((op, at)) = self.operators.pop() {
            self.reduce(op, at)?;
        }

        let end = self.input.len();
        let r = match (self.operands.pop(), self.operands.is_empty()) {
            (Some(r), true) => r,
            (None, _) => return Err(ParseError::UnexpectedEof("empty expression", end)),
            (Some(_), false) => return Err(ParseError::UnexpectedEof("malformed expression", end)),
        };
        if self.alphabet.is_empty() {
            return Err(ParseError::EmptyAlphabet(end));
        }
        Ok((r, self.alphabet))
    }
}

/// Parse a regular expression, also returning the symbols it uses.
pub fn parse(s: &str) -> Result<(Regex, BTreeSet<char>), ParseError> {
    Parser {
        input: s.chars().collect(),
        operands: Vec::new(),
        operators: Vec::new(),
        alphabet: BTreeSet::new(),
    }.parse()
}

impl str::FromStr for Regex {
    type Err = ParseError;
    /// Parse a string as a regular expression.
    fn from_str(s: &str) -> Result<Regex, ParseError> {
        parse(s).map(|(r, _)| r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(c: char) -> Regex {
        Literal(c)
    }

    #[test]
    fn test_parse() {
        assert_eq!("a".parse::<Regex>().unwrap(), lit('a'));
        assert_eq!("abc".parse::<Regex>().unwrap(),
            Regex::concat(lit('a'), Regex::concat(lit('b'), lit('c'))));
        assert_eq!("ab*".parse::<Regex>().unwrap(),
            Regex::concat(lit('a'), Regex::star(lit('b'))));
        assert_eq!("ab|c".parse::<Regex>().unwrap(),
            Regex::union(Regex::concat(lit('a'), lit('b')), lit('c')));
        assert_eq!("a|bc".parse::<Regex>().unwrap(),
            Regex::union(lit('a'), Regex::concat(lit('b'), lit('c'))));
        assert_eq!("a|b|c".parse::<Regex>().unwrap(),
            Regex::union(lit('a'), Regex::union(lit('b'), lit('c'))));
        assert_eq!("(a|b)*c".parse::<Regex>().unwrap(),
            Regex::concat(Regex::star(Regex::union(lit('a'), lit('b'))), lit('c')));
        assert_eq!("a**".parse::<Regex>().unwrap(), Regex::star(Regex::star(lit('a'))));
        assert_eq!("(a)(b)".parse::<Regex>().unwrap(), Regex::concat(lit('a'), lit('b')));
        assert_eq!("aε".parse::<Regex>().unwrap(), Regex::concat(lit('a'), lit(EPSILON)));
    }

    #[test]
    fn test_alphabet_side_output() {
        let (_, alphabet) = parse("b(a|ε)*b.").unwrap();
        assert_eq!(alphabet.into_iter().collect::<Vec<_>>(), vec!['.', 'a', 'b']);
    }

    #[test]
    fn test_parse_error() {
        assert_eq!(parse(""), Err(ParseError::UnexpectedEof("empty expression", 0)));
        assert_eq!(parse("()"), Err(ParseError::UnexpectedEof("empty expression", 2)));
        assert_eq!(parse("ε"), Err(ParseError::EmptyAlphabet(1)));
        assert_eq!(parse("(ε|ε)*"), Err(ParseError::EmptyAlphabet(6)));
        assert_eq!(parse("*a"), Err(ParseError::UnexpectedChar("nothing to repeat", '*', 0)));
        assert_eq!(parse("a)"), Err(ParseError::UnexpectedChar("unmatched ')'", ')', 1)));
        assert_eq!(parse("(a"), Err(ParseError::UnexpectedChar("unmatched '('", '(', 0)));
        assert_eq!(parse("a|"), Err(ParseError::UnexpectedChar("missing operand", '|', 1)));
        assert!(parse("|a").is_err());
        assert!(parse("a(|b)").is_err());
        assert!(parse("a()").is_err());
        assert!(parse("(()").is_err());
        assert!(parse(")(").is_err());
    }

    #[test]
    fn test_display() {
        for s in &["a", "ab|c", "a(b|c)", "(ab)c", "(a|b)|c", "a|b|c", "(ab)*", "a**", "(a|b)*abb"] {
            let re: Regex = s.parse().unwrap();
            assert_eq!(re.to_string(), *s);
        }
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", "ab*|ε".parse::<Regex>().unwrap()),
            "Union(Concat(Literal('a'), Star(Literal('b'))), Literal('ε'))");
    }

    #[test]
    fn test_long_flat_expression() {
        let text = "ab".repeat(20_000);
        let (re, alphabet) = parse(&text).unwrap();
        assert_eq!(alphabet.into_iter().collect::<Vec<_>>(), vec!['a', 'b']);
        assert_eq!(re.to_string(), text);
        assert!(format!("{:?}", re).starts_with("Concat(Literal('a'), Concat(Literal('b'), "));

        let text = format!("{}a", "a|".repeat(20_000));
        assert_eq!(text.parse::<Regex>().unwrap().to_string(), text);
    }
}
