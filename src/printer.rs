//! Canonical serialization of values back to source text. Lists print in
//! parenthesized form; a cdr chain that ends in a number or boolean prints
//! that terminal after a dot, while any other terminal atom is omitted.
//! Procedure values have no printed form and refuse to serialize.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Error;
use crate::ast::{Pair, Value};

/// Serialize a value to its canonical printed form.
pub fn serialize(value: &Value) -> Result<String, Error> {
    let mut out = String::new();
    write_value(&mut out, value)?;
    Ok(out)
}

fn write_value(out: &mut String, value: &Value) -> Result<(), Error> {
    match value {
        Value::Null => out.push_str("()"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(true) => out.push_str("#t"),
        Value::Bool(false) => out.push_str("#f"),
        Value::Symbol(name) => out.push_str(name),
        Value::Pair(cell) => write_chain(out, cell, true)?,
        Value::Builtin(_) | Value::ClosureFactory(_) | Value::Closure(_) => {
            return Err(Error::RuntimeError(
                "procedures have no printed form".into(),
            ));
        }
    }
    Ok(())
}

fn write_chain(
    out: &mut String,
    cell: &Rc<RefCell<Pair>>,
    parenthesize: bool,
) -> Result<(), Error> {
    if parenthesize {
        out.push('(');
    }
    let (car, cdr) = {
        let node = cell.borrow();
        (node.car.clone(), node.cdr.clone())
    };
    // A Null car renders as (), which also yields the (()) form for the
    // cell whose slots are both empty.
    write_value(out, &car)?;
    match &cdr {
        Value::Pair(next) => {
            out.push(' ');
            write_chain(out, next, false)?;
        }
        Value::Number(_) | Value::Bool(_) => {
            out.push_str(" . ");
            write_value(out, &cdr)?;
        }
        // Null ends the list; other terminal atoms are not shown.
        _ => {}
    }
    if parenthesize {
        out.push(')');
    }
    Ok(())
}
