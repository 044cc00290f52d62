#![crate_type="bin"]
extern crate regex_dfa;
use std::io::BufRead;
use std::process;
use regex_dfa::*;

const USAGE: &str = "usage: regex-dfa [--dot] [REGEX...]
Converts each REGEX, or each line of standard input when none are given,
to an NFA, a DFA and a minimal DFA.

  --dot       print the automata as Graphviz DOT text
  -h, --help  print this message";

fn run(regex: &str, dot: bool) -> Result<()> {
    let mut c = Conversion::new(regex)?;
    if dot {
        let out = Dot::new(regex);
        print!("{}", out.export_string(&c.nfa_diagram()));
        print!("{}", out.export_string(&c.dfa_diagram()?));
        c.minimize()?;
        print!("{}", out.export_string(&c.dfa_diagram()?));
        return Ok(());
    }
    println!("ok: {}", c.regex());
    println!("tree: {:?}", c.ast());
    println!("NFA:\n{}", c.nfa());
    println!("DFA:\n{}", c.dfa()?);
    println!("Minimized DFA:\n{}", c.minimize()?);
    Ok(())
}

fn main() {
    let mut dot = false;
    let mut regexes = Vec::new();
    for arg in std::env::args().skip(1) {
        match &arg[..] {
            "--dot" => dot = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return;
            }
            _ => regexes.push(arg),
        }
    }

    let mut failed = false;
    let mut convert = |regex: &str| {
        if let Err(e) = run(regex, dot) {
            eprintln!("error: {}: {}", regex, e);
            failed = true;
        }
    };
    if regexes.is_empty() {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => convert(line.trim()),
                Err(e) => {
                    eprintln!("error: {}", e);
                    process::exit(1);
                }
            }
        }
    } else {
        for regex in &regexes {
            convert(regex);
        }
    }
    if failed {
        process::exit(1);
    }
}
