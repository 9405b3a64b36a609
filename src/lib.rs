//! schemelet — an embeddable interpreter for a small Scheme-flavored
//! language.
//!
//! The language has integers, booleans, symbols, pairs and lists, and
//! first-class user-defined procedures with lexical scope. One expression is
//! evaluated per call and the result comes back in its canonical printed
//! form:
//!
//! ```
//! use schemelet::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! assert_eq!(interpreter.run("(+ 1 2 3)").unwrap(), "6");
//! assert_eq!(interpreter.run("(cons 1 2)").unwrap(), "(1 . 2)");
//! assert_eq!(interpreter.run("((lambda (x y) (+ x y)) 3 4)").unwrap(), "7");
//! ```
//!
//! Definitions persist on the interpreter, so programs are built up one
//! expression at a time:
//!
//! ```
//! use schemelet::Interpreter;
//!
//! let mut interpreter = Interpreter::new();
//! interpreter.run("(define (fact n) (if (<= n 1) 1 (* n (fact (- n 1)))))").unwrap();
//! assert_eq!(interpreter.run("(fact 5)").unwrap(), "120");
//! ```
//!
//! ## Modules
//!
//! - `tokenizer`: pull tokenizer over the source text
//! - `reader`: token stream to value graph
//! - `ast`: the tagged runtime value universe
//! - `evaluator`: scope chains, special forms and application
//! - `builtinops`: the registry of primitive procedures
//! - `printer`: values back to canonical text
//!
//! Evaluation is single-threaded and synchronous. Heap values are reference
//! counted; cycles created with `set-car!`/`set-cdr!` are tolerated and
//! leaked rather than collected.

use std::fmt;

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod printer;
pub mod reader;
pub(crate) mod tokenizer;

/// Maximum reader nesting before a parse is rejected
pub const MAX_PARSE_DEPTH: usize = 128;

/// Maximum evaluation nesting; recursion past this point is cut off instead
/// of exhausting the host stack
pub const MAX_EVAL_DEPTH: usize = 512;

/// Error raised by the interpreter. All three kinds are fatal to the current
/// evaluation; there is no recovery or partial result.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed tokens, unbalanced parentheses, misused special forms,
    /// assignment to an undefined name
    SyntaxError(String),
    /// Lookup of an unbound symbol
    NameError(String),
    /// Type or arity violation in a builtin, or evaluation of a value that
    /// is not an expression
    RuntimeError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SyntaxError(msg) => write!(f, "SyntaxError: {msg}"),
            Error::NameError(name) => write!(f, "NameError: '{name}' is not bound"),
            Error::RuntimeError(msg) => write!(f, "RuntimeError: {msg}"),
        }
    }
}

/// An interpreter instance: a global scope that persists across runs.
///
/// Successive [`Interpreter::run`] calls observe each other's definitions
/// and assignments. Two instances share nothing.
pub struct Interpreter {
    global_scope: evaluator::ScopeRef,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter {
            global_scope: evaluator::global_scope(),
        }
    }

    /// Evaluate one expression and return its canonical printed form.
    pub fn run(&mut self, source: &str) -> Result<String, Error> {
        let expr = reader::parse(source)?;
        let result = evaluator::eval(&expr, &self.global_scope)?;
        printer::serialize(&result)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
