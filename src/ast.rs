//! Core value types for the interpreter. The main enum, [`Value`], covers the
//! whole runtime universe: numbers, booleans, symbols, cons cells (and through
//! them proper and improper lists), built-in procedures, and the two lambda
//! stages (the capturing factory produced by `lambda` and the instantiated
//! closure it becomes on application). The reader emits these values and the
//! evaluator consumes them; there is no separate expression type.
//!
//! Cells are shared, mutable heap nodes: `set-car!` and `set-cdr!` rebind the
//! slots of an already-constructed cell, so two lists can share structure and
//! a list can be made to reference itself. Reference counting reclaims
//! acyclic garbage; cycles created through mutation are left to the process.
//!
//! Ergonomic helpers such as [`val`], [`sym`], [`pair`] and [`list_of`] keep
//! AST construction short in both code and tests.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::builtinops::BuiltinOp;
use crate::evaluator::ScopeRef;

/// Type alias for number values in the interpreter
pub(crate) type NumberType = i64;

/// A two-slot heap node. Both slots are rebindable after construction.
#[derive(Clone)]
pub struct Pair {
    pub car: Value,
    pub cdr: Value,
}

/// The lambda-expression value: captured defining scope, parameter names and
/// a non-empty body. Application instantiates it into a [`Closure`].
pub struct ClosureFactory {
    pub(crate) params: Vec<String>,
    pub(crate) body: Vec<Value>,
    pub(crate) captured: ScopeRef,
}

/// An instantiated application frame: the factory's fields plus a local
/// scope whose parent is the captured scope. Re-invoking the same closure
/// rebinds its parameters into that same scope.
pub struct Closure {
    pub(crate) params: Vec<String>,
    pub(crate) body: Vec<Value>,
    pub(crate) scope: ScopeRef,
}

/// Core runtime value.
///
/// `Null` is both the empty list and the value of an "absent" cell slot, so a
/// well-formed list is either `Null` or a `Pair` whose cdr is a well-formed
/// list. Procedure values (`Builtin`, `ClosureFactory`, `Closure`) never
/// self-evaluate and have no printed form.
#[derive(Clone, Default)]
pub enum Value {
    /// The empty list
    #[default]
    Null,
    /// Signed 64-bit integers, self-evaluating
    Number(NumberType),
    /// `#t` / `#f`, self-evaluating
    Bool(bool),
    /// Identifiers, evaluated by scope lookup
    Symbol(String),
    /// Cons cells with mutable slots
    Pair(Rc<RefCell<Pair>>),
    /// Primitive procedures from the builtin registry
    Builtin(&'static BuiltinOp),
    /// Lexical closure template, produced by `lambda`
    ClosureFactory(Rc<ClosureFactory>),
    /// Instantiated closure frame
    Closure(Rc<Closure>),
}

impl Value {
    /// The only falsy value in the language is `#f`.
    pub(crate) fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }

    /// Collect the elements of a proper list. Returns `None` when the cdr
    /// chain terminates in anything other than `Null`.
    pub(crate) fn proper_list_items(&self) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        let mut cursor = self.clone();
        loop {
            match cursor {
                Value::Null => return Some(items),
                Value::Pair(cell) => {
                    let (car, cdr) = {
                        let node = cell.borrow();
                        (node.car.clone(), node.cdr.clone())
                    };
                    items.push(car);
                    cursor = cdr;
                }
                _ => return None,
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Pair(cell) => {
                let node = cell.borrow();
                write!(f, "Pair({:?}, {:?})", node.car, node.cdr)
            }
            Value::Builtin(op) => write!(f, "Builtin({})", op.name),
            Value::ClosureFactory(factory) => {
                write!(f, "ClosureFactory(params={:?})", factory.params)
            }
            Value::Closure(closure) => write!(f, "Closure(params={:?})", closure.params),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Pair(a), Value::Pair(b)) => {
                // Identity first: shared cells compare equal without walking,
                // which also keeps self-referential structures comparable.
                Rc::ptr_eq(a, b) || {
                    let (left, right) = (a.borrow(), b.borrow());
                    left.car == right.car && left.cdr == right.cdr
                }
            }
            (Value::Builtin(a), Value::Builtin(b)) => std::ptr::eq(*a, *b),
            (Value::ClosureFactory(a), Value::ClosureFactory(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// From implementations so that `val` accepts plain Rust literals.

impl From<NumberType> for Value {
    fn from(n: NumberType) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        list_of(items)
    }
}

/// Allocate a fresh cell.
pub(crate) fn pair(car: Value, cdr: Value) -> Value {
    Value::Pair(Rc::new(RefCell::new(Pair { car, cdr })))
}

/// Build a proper list from a vector of elements.
pub(crate) fn list_of(items: Vec<Value>) -> Value {
    items
        .into_iter()
        .rev()
        .fold(Value::Null, |tail, item| pair(item, tail))
}

/// Helper function for creating symbols
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values from Rust literals
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// The empty list
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn nil() -> Value {
    Value::Null
}
