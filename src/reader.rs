//! Recursive-descent reader: consumes tokens and builds the value graph the
//! evaluator runs on. Lists become cons chains, `'x` is rewritten to
//! `(quote x)`, and a quoted empty list collapses to the single cell
//! `(quote . ())` — the evaluator's quote handler understands both shapes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Error;
use crate::MAX_PARSE_DEPTH;
use crate::ast::{Pair, Value, pair, sym};
use crate::tokenizer::{Token, Tokenizer};

/// Parse a single expression from source text.
pub fn parse(input: &str) -> Result<Value, Error> {
    let mut tokens = Tokenizer::new(input)?;
    read(&mut tokens)
}

/// Read one datum and require the token stream to be exhausted afterwards.
pub(crate) fn read(tokens: &mut Tokenizer) -> Result<Value, Error> {
    let datum = read_datum(tokens, 0)?;
    if !tokens.is_end() {
        return Err(Error::SyntaxError(
            "only one expression may be given at a time".into(),
        ));
    }
    Ok(datum)
}

fn read_datum(tokens: &mut Tokenizer, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(Error::SyntaxError(format!(
            "expression nested deeper than {MAX_PARSE_DEPTH} levels"
        )));
    }
    let Some(token) = tokens.next_token()? else {
        return Err(Error::SyntaxError("unexpected end of input".into()));
    };
    match token {
        Token::Number(n) => Ok(Value::Number(n)),
        Token::Bool(b) => Ok(Value::Bool(b)),
        Token::Symbol(name) => Ok(Value::Symbol(name)),
        // A dot outside list context reads as the symbol "."
        Token::Dot => Ok(sym(".")),
        Token::Open => read_list(tokens, depth),
        Token::Close => Err(Error::SyntaxError("unexpected ')'".into())),
        Token::Quote => {
            let datum = read_datum(tokens, depth + 1)?;
            Ok(match datum {
                Value::Null => pair(sym("quote"), Value::Null),
                datum => pair(sym("quote"), pair(datum, Value::Null)),
            })
        }
    }
}

/// Read the body of a parenthesized form, the opening `(` already consumed.
fn read_list(tokens: &mut Tokenizer, depth: usize) -> Result<Value, Error> {
    let mut head = Value::Null;
    let mut tail_cell: Option<Rc<RefCell<Pair>>> = None;
    loop {
        match tokens.peek() {
            None => return Err(Error::SyntaxError("missing ')'".into())),
            Some(Token::Close) => {
                tokens.advance()?;
                return Ok(head);
            }
            Some(Token::Dot) => {
                let Some(last) = tail_cell else {
                    return Err(Error::SyntaxError(
                        "'.' must follow at least one list element".into(),
                    ));
                };
                tokens.advance()?;
                let terminal = read_datum(tokens, depth + 1)?;
                if matches!(terminal, Value::Symbol(_)) {
                    return Err(Error::SyntaxError(
                        "a symbol cannot terminate a dotted pair".into(),
                    ));
                }
                match tokens.peek() {
                    Some(Token::Close) => tokens.advance()?,
                    _ => {
                        return Err(Error::SyntaxError(
                            "expected ')' after the dotted tail".into(),
                        ));
                    }
                }
                last.borrow_mut().cdr = terminal;
                return Ok(head);
            }
            Some(_) => {
                let datum = read_datum(tokens, depth + 1)?;
                let cell = Rc::new(RefCell::new(Pair {
                    car: datum,
                    cdr: Value::Null,
                }));
                match &tail_cell {
                    None => head = Value::Pair(Rc::clone(&cell)),
                    Some(prev) => prev.borrow_mut().cdr = Value::Pair(Rc::clone(&cell)),
                }
                tail_cell = Some(cell);
            }
        }
    }
}
