//! Built-in operations registry.
//!
//! Every primitive the language ships with is described by a [`BuiltinOp`]
//! carrying its name, its implementation and its accepted argument count.
//! Ordinary builtins are [`OpKind::Function`]: they receive an
//! already-evaluated argument slice and most of them never look at a scope.
//! [`OpKind::SpecialForm`] entries exist so that names like `if` and `define`
//! resolve to a value in the global scope; their operands are handled inline
//! by the evaluator, which dispatches to the same functions referenced here.
//!
//! Arity is validated centrally from the registry before a function builtin
//! runs, so the implementations themselves only deal with argument types.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{NumberType, Value, list_of, pair};
use crate::evaluator::{
    ScopeRef, eval_and, eval_define, eval_if, eval_or, eval_quote, eval_set,
};

/// Canonical signature of a function builtin
pub type BuiltinFn = fn(&[Value]) -> Result<Value, Error>;

/// Special forms receive their raw operand chain, the caller's scope and the
/// current evaluation depth.
pub type SpecialFormFn = fn(&Value, &ScopeRef, usize) -> Result<Value, Error>;

/// Implementation of a built-in operation
#[derive(Clone, Copy)]
pub enum OpKind {
    /// Regular procedure applied to evaluated arguments
    Function(BuiltinFn),
    /// Syntax handled inline by the evaluator
    SpecialForm(SpecialFormFn),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Accepted argument counts for an operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub(crate) fn validate(&self, name: &str, got: usize) -> Result<(), Error> {
        match self {
            Arity::Any => Ok(()),
            Arity::Exact(n) if got == *n => Ok(()),
            Arity::AtLeast(n) if got >= *n => Ok(()),
            Arity::Exact(n) => Err(Error::RuntimeError(format!(
                "'{name}' expects exactly {n} argument(s), got {got}"
            ))),
            Arity::AtLeast(n) => Err(Error::RuntimeError(format!(
                "'{name}' expects at least {n} argument(s), got {got}"
            ))),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug)]
pub struct BuiltinOp {
    pub name: &'static str,
    pub op_kind: OpKind,
    pub arity: Arity,
}

impl BuiltinOp {
    #[cfg_attr(not(test), expect(dead_code))]
    pub(crate) fn is_special_form(&self) -> bool {
        matches!(self.op_kind, OpKind::SpecialForm(_))
    }
}

//
// Argument extraction helpers
//

fn one_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, Error> {
    match args {
        [value] => Ok(value),
        _ => Err(Error::RuntimeError(format!(
            "'{name}' expects exactly 1 argument, got {}",
            args.len()
        ))),
    }
}

fn two_args<'a>(name: &str, args: &'a [Value]) -> Result<(&'a Value, &'a Value), Error> {
    match args {
        [first, second] => Ok((first, second)),
        _ => Err(Error::RuntimeError(format!(
            "'{name}' expects exactly 2 arguments, got {}",
            args.len()
        ))),
    }
}

fn expect_number(value: &Value) -> Result<NumberType, Error> {
    match value {
        Value::Number(n) => Ok(*n),
        _ => Err(Error::RuntimeError(
            "argument is expected to be a number".into(),
        )),
    }
}

fn numbers(args: &[Value]) -> Result<Vec<NumberType>, Error> {
    args.iter().map(expect_number).collect()
}

fn expect_index(name: &str, value: &Value) -> Result<usize, Error> {
    match value {
        Value::Number(n) if *n >= 0 => Ok(*n as usize),
        Value::Number(_) => Err(Error::RuntimeError(format!(
            "'{name}' index must be non-negative"
        ))),
        _ => Err(Error::RuntimeError(format!(
            "the second argument of '{name}' must be a number"
        ))),
    }
}

fn overflow(op: &str) -> Error {
    Error::RuntimeError(format!("integer overflow in '{op}'"))
}

//
// Type predicates
//

fn builtin_is_number(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(
        one_arg("number?", args)?,
        Value::Number(_)
    )))
}

fn builtin_is_boolean(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(
        one_arg("boolean?", args)?,
        Value::Bool(_)
    )))
}

fn builtin_is_symbol(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(
        one_arg("symbol?", args)?,
        Value::Symbol(_)
    )))
}

fn builtin_is_null(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(one_arg("null?", args)?, Value::Null)))
}

/// A counting walk over the cdr chain: non-empty cars count one each, a
/// number or boolean terminal counts one more. Exactly two countable
/// elements make a pair, so `(a b)` and `(a . b)` both qualify while
/// `(a b c)` does not.
fn builtin_is_pair(args: &[Value]) -> Result<Value, Error> {
    let mut countable = 0usize;
    let mut cursor = one_arg("pair?", args)?.clone();
    loop {
        match cursor {
            Value::Number(_) | Value::Bool(_) => {
                countable += 1;
                break;
            }
            Value::Pair(cell) => {
                let (car, cdr) = {
                    let node = cell.borrow();
                    (node.car.clone(), node.cdr.clone())
                };
                if !matches!(car, Value::Null) {
                    countable += 1;
                }
                cursor = cdr;
            }
            _ => break,
        }
    }
    Ok(Value::Bool(countable == 2))
}

/// True for the empty list and for any cdr chain that reaches the empty
/// list without passing through an atom.
fn builtin_is_list(args: &[Value]) -> Result<Value, Error> {
    let mut cursor = one_arg("list?", args)?.clone();
    loop {
        match cursor {
            Value::Null => return Ok(Value::Bool(true)),
            Value::Pair(cell) => {
                let next = cell.borrow().cdr.clone();
                cursor = next;
            }
            _ => return Ok(Value::Bool(false)),
        }
    }
}

//
// Numeric operations
//

// Chained comparisons: the relation must hold for every adjacent argument
// pair, so zero or one argument is vacuously true.
macro_rules! numeric_comparison {
    ($name:ident, $op:tt) => {
        fn $name(args: &[Value]) -> Result<Value, Error> {
            let nums = numbers(args)?;
            Ok(Value::Bool(nums.windows(2).all(|w| w[0] $op w[1])))
        }
    };
}

numeric_comparison!(builtin_num_eq, ==);
numeric_comparison!(builtin_lt, <);
numeric_comparison!(builtin_gt, >);
numeric_comparison!(builtin_le, <=);
numeric_comparison!(builtin_ge, >=);

fn builtin_add(args: &[Value]) -> Result<Value, Error> {
    let mut sum: NumberType = 0;
    for n in numbers(args)? {
        sum = sum.checked_add(n).ok_or_else(|| overflow("+"))?;
    }
    Ok(Value::Number(sum))
}

fn builtin_mul(args: &[Value]) -> Result<Value, Error> {
    let mut product: NumberType = 1;
    for n in numbers(args)? {
        product = product.checked_mul(n).ok_or_else(|| overflow("*"))?;
    }
    Ok(Value::Number(product))
}

/// Left fold seeded with the first argument; `(- 5)` is just 5.
fn builtin_sub(args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let Some((first, rest)) = nums.split_first() else {
        return Err(Error::RuntimeError(
            "'-' expects at least 1 argument, got 0".into(),
        ));
    };
    let mut result = *first;
    for n in rest {
        result = result.checked_sub(*n).ok_or_else(|| overflow("-"))?;
    }
    Ok(Value::Number(result))
}

/// Integer division truncating toward zero.
fn builtin_div(args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let Some((first, rest)) = nums.split_first() else {
        return Err(Error::RuntimeError(
            "'/' expects at least 1 argument, got 0".into(),
        ));
    };
    let mut result = *first;
    for n in rest {
        if *n == 0 {
            return Err(Error::RuntimeError("division by zero".into()));
        }
        result = result.checked_div(*n).ok_or_else(|| overflow("/"))?;
    }
    Ok(Value::Number(result))
}

fn builtin_abs(args: &[Value]) -> Result<Value, Error> {
    let n = expect_number(one_arg("abs", args)?)?;
    Ok(Value::Number(n.checked_abs().ok_or_else(|| overflow("abs"))?))
}

fn builtin_max(args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let Some((first, rest)) = nums.split_first() else {
        return Err(Error::RuntimeError(
            "'max' expects at least 1 argument, got 0".into(),
        ));
    };
    Ok(Value::Number(rest.iter().fold(*first, |acc, n| acc.max(*n))))
}

fn builtin_min(args: &[Value]) -> Result<Value, Error> {
    let nums = numbers(args)?;
    let Some((first, rest)) = nums.split_first() else {
        return Err(Error::RuntimeError(
            "'min' expects at least 1 argument, got 0".into(),
        ));
    };
    Ok(Value::Number(rest.iter().fold(*first, |acc, n| acc.min(*n))))
}

//
// Boolean operations
//

/// True only for `#f`; every other value negates to `#f`.
fn builtin_not(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(one_arg("not", args)?.is_false()))
}

//
// Pair and list operations
//

fn builtin_cons(args: &[Value]) -> Result<Value, Error> {
    let (car, cdr) = two_args("cons", args)?;
    Ok(pair(car.clone(), cdr.clone()))
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    match one_arg("car", args)? {
        Value::Pair(cell) => Ok(cell.borrow().car.clone()),
        Value::Null => Err(Error::RuntimeError(
            "'car' cannot be used on the empty list".into(),
        )),
        _ => Err(Error::RuntimeError("'car' expects a pair".into())),
    }
}

fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    match one_arg("cdr", args)? {
        Value::Pair(cell) => Ok(cell.borrow().cdr.clone()),
        Value::Null => Err(Error::RuntimeError(
            "'cdr' cannot be used on the empty list".into(),
        )),
        _ => Err(Error::RuntimeError("'cdr' expects a pair".into())),
    }
}

fn builtin_list(args: &[Value]) -> Result<Value, Error> {
    Ok(list_of(args.to_vec()))
}

fn builtin_list_ref(args: &[Value]) -> Result<Value, Error> {
    let (list, index) = two_args("list-ref", args)?;
    let index = expect_index("list-ref", index)?;
    let mut cursor = list.clone();
    for _ in 0..index {
        match cursor {
            Value::Pair(cell) => {
                let next = cell.borrow().cdr.clone();
                cursor = next;
            }
            _ => {
                return Err(Error::RuntimeError(
                    "'list-ref' index out of range".into(),
                ));
            }
        }
    }
    match cursor {
        Value::Pair(cell) => Ok(cell.borrow().car.clone()),
        _ => Err(Error::RuntimeError(
            "'list-ref' index out of range".into(),
        )),
    }
}

/// Returns the sublist starting at the given index; an index equal to the
/// list length lands on the empty list.
fn builtin_list_tail(args: &[Value]) -> Result<Value, Error> {
    let (list, index) = two_args("list-tail", args)?;
    let index = expect_index("list-tail", index)?;
    let mut cursor = list.clone();
    for _ in 0..index {
        match cursor {
            Value::Pair(cell) => {
                let next = cell.borrow().cdr.clone();
                cursor = next;
            }
            _ => {
                return Err(Error::RuntimeError(
                    "'list-tail' index out of range".into(),
                ));
            }
        }
    }
    Ok(cursor)
}

fn builtin_set_car(args: &[Value]) -> Result<Value, Error> {
    let (target, value) = two_args("set-car!", args)?;
    match target {
        Value::Pair(cell) => {
            cell.borrow_mut().car = value.clone();
            Ok(Value::Null)
        }
        Value::Null => Err(Error::RuntimeError(
            "'set-car!' cannot be used on the empty list".into(),
        )),
        _ => Err(Error::RuntimeError("'set-car!' expects a pair".into())),
    }
}

fn builtin_set_cdr(args: &[Value]) -> Result<Value, Error> {
    let (target, value) = two_args("set-cdr!", args)?;
    match target {
        Value::Pair(cell) => {
            cell.borrow_mut().cdr = value.clone();
            Ok(Value::Null)
        }
        Value::Null => Err(Error::RuntimeError(
            "'set-cdr!' cannot be used on the empty list".into(),
        )),
        _ => Err(Error::RuntimeError("'set-cdr!' expects a pair".into())),
    }
}

/// Registry of all built-in operations. The slice is the source of truth:
/// the global scope is populated from it and the lookup map indexes it.
static BUILTIN_OPS: &[BuiltinOp] = &[
    // Special forms, registered so their names resolve in the global scope.
    // The evaluator intercepts them by name before ordinary application and
    // dispatches to these same functions.
    BuiltinOp {
        name: "quote",
        op_kind: OpKind::SpecialForm(eval_quote),
        arity: Arity::Any,
    },
    BuiltinOp {
        name: "define",
        op_kind: OpKind::SpecialForm(eval_define),
        arity: Arity::AtLeast(2),
    },
    BuiltinOp {
        name: "set!",
        op_kind: OpKind::SpecialForm(eval_set),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "if",
        op_kind: OpKind::SpecialForm(eval_if),
        arity: Arity::AtLeast(2),
    },
    BuiltinOp {
        name: "and",
        op_kind: OpKind::SpecialForm(eval_and),
        arity: Arity::Any,
    },
    BuiltinOp {
        name: "or",
        op_kind: OpKind::SpecialForm(eval_or),
        arity: Arity::Any,
    },
    // Type predicates
    BuiltinOp {
        name: "number?",
        op_kind: OpKind::Function(builtin_is_number),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "boolean?",
        op_kind: OpKind::Function(builtin_is_boolean),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "symbol?",
        op_kind: OpKind::Function(builtin_is_symbol),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "null?",
        op_kind: OpKind::Function(builtin_is_null),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "pair?",
        op_kind: OpKind::Function(builtin_is_pair),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "list?",
        op_kind: OpKind::Function(builtin_is_list),
        arity: Arity::Exact(1),
    },
    // Comparison operations
    BuiltinOp {
        name: "=",
        op_kind: OpKind::Function(builtin_num_eq),
        arity: Arity::AtLeast(0),
    },
    BuiltinOp {
        name: "<",
        op_kind: OpKind::Function(builtin_lt),
        arity: Arity::AtLeast(0),
    },
    BuiltinOp {
        name: ">",
        op_kind: OpKind::Function(builtin_gt),
        arity: Arity::AtLeast(0),
    },
    BuiltinOp {
        name: "<=",
        op_kind: OpKind::Function(builtin_le),
        arity: Arity::AtLeast(0),
    },
    BuiltinOp {
        name: ">=",
        op_kind: OpKind::Function(builtin_ge),
        arity: Arity::AtLeast(0),
    },
    // Arithmetic operations
    BuiltinOp {
        name: "+",
        op_kind: OpKind::Function(builtin_add),
        arity: Arity::AtLeast(0),
    },
    BuiltinOp {
        name: "*",
        op_kind: OpKind::Function(builtin_mul),
        arity: Arity::AtLeast(0),
    },
    BuiltinOp {
        name: "-",
        op_kind: OpKind::Function(builtin_sub),
        arity: Arity::AtLeast(1),
    },
    BuiltinOp {
        name: "/",
        op_kind: OpKind::Function(builtin_div),
        arity: Arity::AtLeast(1),
    },
    BuiltinOp {
        name: "abs",
        op_kind: OpKind::Function(builtin_abs),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "max",
        op_kind: OpKind::Function(builtin_max),
        arity: Arity::AtLeast(1),
    },
    BuiltinOp {
        name: "min",
        op_kind: OpKind::Function(builtin_min),
        arity: Arity::AtLeast(1),
    },
    // Boolean operations
    BuiltinOp {
        name: "not",
        op_kind: OpKind::Function(builtin_not),
        arity: Arity::Exact(1),
    },
    // Pair and list operations
    BuiltinOp {
        name: "cons",
        op_kind: OpKind::Function(builtin_cons),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "car",
        op_kind: OpKind::Function(builtin_car),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "cdr",
        op_kind: OpKind::Function(builtin_cdr),
        arity: Arity::Exact(1),
    },
    BuiltinOp {
        name: "list",
        op_kind: OpKind::Function(builtin_list),
        arity: Arity::Any,
    },
    BuiltinOp {
        name: "list-ref",
        op_kind: OpKind::Function(builtin_list_ref),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "list-tail",
        op_kind: OpKind::Function(builtin_list_tail),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "set-car!",
        op_kind: OpKind::Function(builtin_set_car),
        arity: Arity::Exact(2),
    },
    BuiltinOp {
        name: "set-cdr!",
        op_kind: OpKind::Function(builtin_set_cdr),
        arity: Arity::Exact(2),
    },
];

/// Map from operation name to registry entry
static BUILTIN_INDEX: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|op| (op.name, op)).collect());

/// All registered operations, for installing into a global scope
pub(crate) fn builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}

/// Find an operation by name
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn find_op(name: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_INDEX.get(name).copied()
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};

    /// Expected outcome when calling a builtin directly
    #[derive(Debug)]
    enum CallResult {
        Ok(Value),
        SpecificError(&'static str),
        Error,
    }

    fn ok<T: Into<Value>>(value: T) -> CallResult {
        CallResult::Ok(value.into())
    }

    /// Invoke a function builtin through the registry, with the same central
    /// arity validation the evaluator performs.
    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        let op = find_op(name).expect("builtin not found");
        match &op.op_kind {
            OpKind::Function(func) => {
                op.arity.validate(op.name, args.len())?;
                func(args)
            }
            OpKind::SpecialForm(_) => {
                panic!("expected function builtin in tests, got special form: {name}")
            }
        }
    }

    fn run_call_tests(test_cases: Vec<(&str, Vec<Value>, CallResult)>) {
        for (i, (name, args, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Builtin test #{}", i + 1);
            match (call_builtin(name, args), expected) {
                (Ok(actual), CallResult::Ok(expected_val)) => {
                    assert_eq!(
                        &actual, expected_val,
                        "{test_id}: wrong result for '{name}'"
                    );
                }
                (Err(_), CallResult::Error) => {}
                (Err(err), CallResult::SpecificError(text)) => {
                    let message = format!("{err}");
                    assert!(
                        message.contains(text),
                        "{test_id}: error for '{name}' should contain '{text}', got: {message}"
                    );
                }
                (Ok(actual), CallResult::Error | CallResult::SpecificError(_)) => {
                    panic!("{test_id}: expected error for '{name}', got {actual:?}");
                }
                (Err(err), CallResult::Ok(_)) => {
                    panic!("{test_id}: unexpected error for '{name}': {err:?}");
                }
            }
        }
    }

    #[test]
    fn test_registry_lookup() {
        let add = find_op("+").unwrap();
        assert_eq!(add.arity, Arity::AtLeast(0));
        assert!(!add.is_special_form());

        let if_op = find_op("if").unwrap();
        assert!(if_op.is_special_form());

        let quote = find_op("quote").unwrap();
        assert!(quote.is_special_form());

        assert!(find_op("unknown").is_none());
        assert!(find_op("lambda").is_none()); // lambda is pure syntax

        // No duplicate names in the registry
        assert_eq!(BUILTIN_INDEX.len(), builtin_ops().len());
    }

    #[test]
    fn test_arity_validation() {
        assert!(Arity::Exact(2).validate("cons", 2).is_ok());
        assert!(Arity::Exact(2).validate("cons", 1).is_err());
        assert!(Arity::Exact(2).validate("cons", 3).is_err());
        assert!(Arity::AtLeast(1).validate("-", 1).is_ok());
        assert!(Arity::AtLeast(1).validate("-", 5).is_ok());
        assert!(Arity::AtLeast(1).validate("-", 0).is_err());
        assert!(Arity::Any.validate("list", 0).is_ok());

        let err = Arity::Exact(1).validate("car", 3).unwrap_err();
        assert!(matches!(err, Error::RuntimeError(_)));
    }

    #[test]
    #[expect(clippy::too_many_lines)] // comprehensive coverage is intentionally thorough
    fn test_builtin_implementations_data_driven() {
        use CallResult::{Error, SpecificError};

        let one_two_three = val(vec![val(1), val(2), val(3)]);
        let dotted = pair(val(1), val(2));

        let test_cases: Vec<(&str, Vec<Value>, CallResult)> = vec![
            // === ARITHMETIC ===
            ("+", vec![], ok(0)),
            ("+", vec![val(42)], ok(42)),
            ("+", vec![val(1), val(2), val(3)], ok(6)),
            ("+", vec![val(-5), val(10)], ok(5)),
            ("*", vec![], ok(1)),
            ("*", vec![val(7)], ok(7)),
            ("*", vec![val(2), val(3), val(4)], ok(24)),
            ("-", vec![val(10), val(3), val(2)], ok(5)),
            // A single argument is the fold seed, not a negation
            ("-", vec![val(5)], ok(5)),
            ("-", vec![], SpecificError("at least 1")),
            ("/", vec![val(100), val(5), val(2)], ok(10)),
            ("/", vec![val(7)], ok(7)),
            // Division truncates toward zero
            ("/", vec![val(7), val(2)], ok(3)),
            ("/", vec![val(-7), val(2)], ok(-3)),
            ("/", vec![val(1), val(0)], SpecificError("division by zero")),
            ("abs", vec![val(-5)], ok(5)),
            ("abs", vec![val(5)], ok(5)),
            ("abs", vec![val(0)], ok(0)),
            ("abs", vec![val(i64::MIN)], SpecificError("overflow")),
            ("max", vec![val(3), val(1), val(2)], ok(3)),
            ("max", vec![val(-5), val(-1), val(-10)], ok(-1)),
            ("max", vec![val(5)], ok(5)),
            ("min", vec![val(3), val(1), val(2)], ok(1)),
            ("min", vec![val(5)], ok(5)),
            ("min", vec![], SpecificError("at least 1")),
            // Overflow is detected, not wrapped
            ("+", vec![val(i64::MAX), val(1)], SpecificError("overflow")),
            ("-", vec![val(i64::MIN), val(1)], SpecificError("overflow")),
            ("*", vec![val(i64::MAX / 2 + 1), val(2)], SpecificError("overflow")),
            ("/", vec![val(i64::MIN), val(-1)], SpecificError("overflow")),
            // Non-numbers are rejected everywhere
            ("+", vec![val(1), val(true)], SpecificError("number")),
            ("-", vec![sym("a")], SpecificError("number")),
            ("max", vec![val(1), nil()], SpecificError("number")),
            ("abs", vec![val(false)], SpecificError("number")),
            // === COMPARISONS ===
            ("=", vec![val(5), val(5)], ok(true)),
            ("=", vec![val(5), val(6)], ok(false)),
            ("=", vec![val(5), val(5), val(5)], ok(true)),
            ("=", vec![val(5), val(5), val(6)], ok(false)),
            ("<", vec![val(1), val(2), val(3)], ok(true)),
            ("<", vec![val(1), val(3), val(2)], ok(false)),
            (">", vec![val(3), val(2), val(1)], ok(true)),
            (">", vec![val(3), val(3)], ok(false)),
            ("<=", vec![val(1), val(1), val(2)], ok(true)),
            (">=", vec![val(2), val(2), val(1)], ok(true)),
            // Vacuously true with zero or one argument
            ("=", vec![], ok(true)),
            ("<", vec![val(1)], ok(true)),
            (">=", vec![], ok(true)),
            ("=", vec![val(1), sym("x")], SpecificError("number")),
            ("<", vec![val(true), val(false)], SpecificError("number")),
            // === TYPE PREDICATES ===
            ("number?", vec![val(42)], ok(true)),
            ("number?", vec![val(true)], ok(false)),
            ("number?", vec![sym("x")], ok(false)),
            ("number?", vec![nil()], ok(false)),
            ("boolean?", vec![val(false)], ok(true)),
            ("boolean?", vec![val(0)], ok(false)),
            ("symbol?", vec![sym("x")], ok(true)),
            ("symbol?", vec![val(1)], ok(false)),
            ("null?", vec![nil()], ok(true)),
            ("null?", vec![val(0)], ok(false)),
            ("null?", vec![one_two_three.clone()], ok(false)),
            ("number?", vec![], Error),
            ("number?", vec![val(1), val(2)], Error),
            // === pair? COUNTS TWO ELEMENTS ===
            ("pair?", vec![dotted.clone()], ok(true)),
            ("pair?", vec![val(vec![val(1), val(2)])], ok(true)),
            ("pair?", vec![one_two_three.clone()], ok(false)),
            ("pair?", vec![val(vec![val(1)])], ok(false)),
            ("pair?", vec![nil()], ok(false)),
            ("pair?", vec![val(7)], ok(false)),
            ("pair?", vec![pair(nil(), nil())], ok(false)),
            // === list? FOLLOWS THE CDR CHAIN ===
            ("list?", vec![nil()], ok(true)),
            ("list?", vec![one_two_three.clone()], ok(true)),
            ("list?", vec![dotted.clone()], ok(false)),
            ("list?", vec![pair(val(1), pair(val(2), val(3)))], ok(false)),
            ("list?", vec![val(5)], ok(false)),
            // === not ===
            ("not", vec![val(false)], ok(true)),
            ("not", vec![val(true)], ok(false)),
            ("not", vec![val(0)], ok(false)),
            ("not", vec![nil()], ok(false)),
            ("not", vec![], Error),
            // === cons / car / cdr ===
            ("cons", vec![val(1), val(2)], CallResult::Ok(pair(val(1), val(2)))),
            (
                "cons",
                vec![val(1), val(vec![val(2), val(3)])],
                CallResult::Ok(one_two_three.clone()),
            ),
            ("cons", vec![val(1), nil()], CallResult::Ok(val(vec![val(1)]))),
            ("cons", vec![val(1)], Error),
            ("car", vec![one_two_three.clone()], ok(1)),
            ("car", vec![dotted.clone()], ok(1)),
            ("cdr", vec![one_two_three.clone()], CallResult::Ok(val(vec![val(2), val(3)]))),
            ("cdr", vec![dotted.clone()], ok(2)),
            ("car", vec![nil()], SpecificError("empty list")),
            ("cdr", vec![nil()], SpecificError("empty list")),
            ("car", vec![val(5)], SpecificError("pair")),
            ("cdr", vec![sym("x")], SpecificError("pair")),
            // === list ===
            ("list", vec![], CallResult::Ok(nil())),
            ("list", vec![val(1)], CallResult::Ok(val(vec![val(1)]))),
            (
                "list",
                vec![val(1), val(2), val(3)],
                CallResult::Ok(one_two_three.clone()),
            ),
            // === list-ref / list-tail ===
            ("list-ref", vec![one_two_three.clone(), val(0)], ok(1)),
            ("list-ref", vec![one_two_three.clone(), val(2)], ok(3)),
            ("list-ref", vec![one_two_three.clone(), val(3)], SpecificError("out of range")),
            ("list-ref", vec![nil(), val(0)], SpecificError("out of range")),
            ("list-ref", vec![one_two_three.clone(), val(-1)], SpecificError("non-negative")),
            ("list-ref", vec![one_two_three.clone(), sym("x")], SpecificError("number")),
            ("list-tail", vec![one_two_three.clone(), val(0)], CallResult::Ok(one_two_three.clone())),
            (
                "list-tail",
                vec![one_two_three.clone(), val(1)],
                CallResult::Ok(val(vec![val(2), val(3)])),
            ),
            // An index equal to the length gives the empty list
            ("list-tail", vec![one_two_three.clone(), val(3)], CallResult::Ok(nil())),
            ("list-tail", vec![one_two_three.clone(), val(4)], SpecificError("out of range")),
            ("list-tail", vec![nil(), val(0)], CallResult::Ok(nil())),
            ("list-tail", vec![nil(), val(1)], SpecificError("out of range")),
            // === slot mutation arity/type errors ===
            ("set-car!", vec![nil(), val(1)], SpecificError("empty list")),
            ("set-car!", vec![val(5), val(1)], SpecificError("pair")),
            ("set-cdr!", vec![nil(), val(1)], SpecificError("empty list")),
            ("set-cdr!", vec![val(5), val(1)], SpecificError("pair")),
        ];

        run_call_tests(test_cases);
    }

    #[test]
    fn test_set_car_and_set_cdr_mutate_in_place() {
        let cell = pair(val(1), val(2));

        let result = call_builtin("set-car!", &[cell.clone(), val(10)]).unwrap();
        assert_eq!(result, nil());
        assert_eq!(cell, pair(val(10), val(2)));

        call_builtin("set-cdr!", &[cell.clone(), nil()]).unwrap();
        assert_eq!(cell, val(vec![val(10)]));

        // Mutation is visible through every handle to the cell
        let alias = cell.clone();
        call_builtin("set-car!", &[cell, val(99)]).unwrap();
        assert_eq!(call_builtin("car", &[alias]).unwrap(), val(99));
    }

    #[test]
    fn test_set_cdr_can_close_a_cycle() {
        // (set-cdr! x x) creates a self-referential cell; building it must
        // not diverge or error, and car still reads the original element.
        let cell = pair(val(1), nil());
        call_builtin("set-cdr!", &[cell.clone(), cell.clone()]).unwrap();
        assert_eq!(call_builtin("car", &[cell.clone()]).unwrap(), val(1));
        // The cycle makes the value an endless chain of pairs
        let cdr = call_builtin("cdr", &[cell.clone()]).unwrap();
        assert!(matches!(cdr, Value::Pair(_)));
    }
}
