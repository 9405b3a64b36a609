//! The tree-walk evaluator: scope chains, special forms and procedure
//! application.
//!
//! Special forms are intercepted by head symbol before ordinary resolution,
//! because each one evaluates its operands under its own rule: `quote` not at
//! all, `if` only the chosen branch, `lambda` reads its operands as syntax,
//! `define`/`set!` evaluate the value position only, and the boolean
//! combiners walk their operands lazily. Everything else is a procedure
//! call: operands are evaluated strictly left to right and the head is
//! applied to the resulting argument vector.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::{Closure, ClosureFactory, Value};
use crate::builtinops::{OpKind, builtin_ops};

/// Scopes are shared by reference: closures keep their defining frame alive,
/// and `set!` through one handle is visible through every other.
pub type ScopeRef = Rc<Scope>;

/// One frame of the scope chain: name bindings plus an optional parent.
pub struct Scope {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<ScopeRef>,
}

impl Scope {
    pub(crate) fn new() -> ScopeRef {
        Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    pub(crate) fn with_parent(parent: &ScopeRef) -> ScopeRef {
        Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Look up a name in this frame only.
    pub(crate) fn lookup_local(&self, name: &str) -> Option<Value> {
        self.bindings.borrow().get(name).cloned()
    }

    /// Look up a name along the parent chain.
    pub(crate) fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.lookup_local(name) {
            return Some(value);
        }
        self.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Bind (or rebind) a name in this frame.
    pub(crate) fn define(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_owned(), value);
    }

    /// Rebind a name in the frame that already defines it.
    pub(crate) fn assign(&self, name: &str, value: Value) -> Result<(), Error> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_owned(), value);
            return Ok(());
        }
        match &self.parent {
            Some(parent) => parent.assign(name, value),
            None => Err(Error::SyntaxError(format!(
                "cannot assign to '{name}' before it is defined"
            ))),
        }
    }
}

/// Create a global scope with every registered builtin installed.
pub fn global_scope() -> ScopeRef {
    let scope = Scope::new();
    for op in builtin_ops() {
        scope.define(op.name, Value::Builtin(op));
    }
    scope
}

/// Evaluate an expression (public API).
pub fn eval(expr: &Value, scope: &ScopeRef) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, scope, 0)
}

/// Evaluate with depth tracking to keep runaway recursion off the host stack.
pub(crate) fn eval_with_depth_tracking(
    expr: &Value,
    scope: &ScopeRef,
    depth: usize,
) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::RuntimeError(format!(
            "evaluation nested deeper than {MAX_EVAL_DEPTH} levels"
        )));
    }
    match expr {
        // Self-evaluating atoms
        Value::Number(_) | Value::Bool(_) => Ok(expr.clone()),

        // Variable lookup
        Value::Symbol(name) => scope
            .lookup(name)
            .ok_or_else(|| Error::NameError(name.clone())),

        // The empty list and procedure values are not expressions
        Value::Null => Err(Error::RuntimeError(
            "the empty list is not a valid expression".into(),
        )),
        Value::Builtin(_) | Value::ClosureFactory(_) | Value::Closure(_) => Err(
            Error::RuntimeError("procedure values are not expressions".into()),
        ),

        // Compound forms: special form or procedure call
        Value::Pair(cell) => {
            let (head, tail) = {
                let node = cell.borrow();
                (node.car.clone(), node.cdr.clone())
            };
            eval_form(&head, &tail, scope, depth)
        }
    }
}

fn eval_form(head: &Value, tail: &Value, scope: &ScopeRef, depth: usize) -> Result<Value, Error> {
    match head {
        Value::Symbol(name) => match name.as_str() {
            "quote" => eval_quote(tail, scope, depth),
            "lambda" => eval_lambda(tail, scope, depth),
            "define" => eval_define(tail, scope, depth),
            "set!" => eval_set(tail, scope, depth),
            "if" => eval_if(tail, scope, depth),
            "and" => eval_and(tail, scope, depth),
            "or" => eval_or(tail, scope, depth),
            _ => {
                let callee = scope
                    .lookup(name)
                    .ok_or_else(|| Error::NameError(name.clone()))?;
                let args = eval_args(tail, scope, depth)?;
                apply(&callee, &args, depth)
            }
        },
        // Compound operator: evaluate it; lambda expressions and expressions
        // returning a closure factory are applicable.
        Value::Pair(_) => {
            let callee = eval_with_depth_tracking(head, scope, depth + 1)?;
            match callee {
                Value::ClosureFactory(_) | Value::Closure(_) => {
                    let args = eval_args(tail, scope, depth)?;
                    apply(&callee, &args, depth)
                }
                _ => Err(Error::RuntimeError(
                    "operator expression does not yield a procedure".into(),
                )),
            }
        }
        _ => Err(Error::RuntimeError(format!(
            "value in operator position cannot be applied: {head:?}"
        ))),
    }
}

/// Evaluate an operand chain strictly, left to right. The terminal atom of
/// an improper chain is evaluated and appended like any other operand.
fn eval_args(operands: &Value, scope: &ScopeRef, depth: usize) -> Result<Vec<Value>, Error> {
    let mut args = Vec::new();
    let mut cursor = operands.clone();
    loop {
        match cursor {
            Value::Null => return Ok(args),
            Value::Pair(cell) => {
                let (car, cdr) = {
                    let node = cell.borrow();
                    (node.car.clone(), node.cdr.clone())
                };
                args.push(eval_with_depth_tracking(&car, scope, depth + 1)?);
                cursor = cdr;
            }
            terminal => {
                args.push(eval_with_depth_tracking(&terminal, scope, depth + 1)?);
                return Ok(args);
            }
        }
    }
}

/// Apply a procedure value to already-evaluated arguments.
pub(crate) fn apply(callee: &Value, args: &[Value], depth: usize) -> Result<Value, Error> {
    match callee {
        Value::Builtin(op) => match &op.op_kind {
            OpKind::Function(func) => {
                op.arity.validate(op.name, args.len())?;
                func(args)
            }
            OpKind::SpecialForm(_) => Err(Error::RuntimeError(format!(
                "'{}' is a special form and cannot be applied as a value",
                op.name
            ))),
        },
        Value::ClosureFactory(factory) => {
            let closure = Closure {
                params: factory.params.clone(),
                body: factory.body.clone(),
                scope: Scope::with_parent(&factory.captured),
            };
            invoke_closure(&closure, args, depth)
        }
        Value::Closure(closure) => invoke_closure(closure, args, depth),
        _ => Err(Error::RuntimeError(
            "value in operator position is not a procedure".into(),
        )),
    }
}

/// Bind arguments into the closure's local scope and evaluate its body
/// expressions in order; the last value is the result.
fn invoke_closure(closure: &Closure, args: &[Value], depth: usize) -> Result<Value, Error> {
    if args.len() != closure.params.len() {
        return Err(Error::SyntaxError(format!(
            "procedure expects {} argument(s), got {}",
            closure.params.len(),
            args.len()
        )));
    }
    for (param, arg) in closure.params.iter().zip(args) {
        closure.scope.define(param, arg.clone());
    }
    let mut result = Value::Null;
    for expr in &closure.body {
        result = eval_with_depth_tracking(expr, &closure.scope, depth + 1)?;
    }
    Ok(result)
}

fn split_pair(value: &Value) -> Option<(Value, Value)> {
    if let Value::Pair(cell) = value {
        let node = cell.borrow();
        Some((node.car.clone(), node.cdr.clone()))
    } else {
        None
    }
}

/// Collect the raw operands of a special form, which must be a proper list.
fn operand_list(operands: &Value, form: &str) -> Result<Vec<Value>, Error> {
    operands
        .proper_list_items()
        .ok_or_else(|| Error::SyntaxError(format!("malformed '{form}' form")))
}

/// `quote` returns its operand unevaluated. A bare `(quote)` — including the
/// single-cell form the reader builds for `'()` — yields the empty list.
pub(crate) fn eval_quote(tail: &Value, _scope: &ScopeRef, _depth: usize) -> Result<Value, Error> {
    match tail {
        Value::Null => Ok(Value::Null),
        Value::Pair(cell) => Ok(cell.borrow().car.clone()),
        _ => Err(Error::SyntaxError("malformed 'quote' form".into())),
    }
}

/// Parse a lambda parameter list: a proper list of symbols, possibly empty.
fn parse_params(form: &Value) -> Result<Vec<String>, Error> {
    let items = form
        .proper_list_items()
        .ok_or_else(|| Error::SyntaxError("lambda parameters must form a proper list".into()))?;
    let mut params = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Symbol(name) => params.push(name),
            _ => return Err(Error::SyntaxError("lambda parameters must be symbols".into())),
        }
    }
    Ok(params)
}

/// Collect a non-empty lambda body.
fn collect_body(form: &Value) -> Result<Vec<Value>, Error> {
    let body = form
        .proper_list_items()
        .ok_or_else(|| Error::SyntaxError("lambda body must form a proper list".into()))?;
    if body.is_empty() {
        return Err(Error::SyntaxError("lambda body cannot be empty".into()));
    }
    Ok(body)
}

/// `lambda` captures the current scope into a closure factory.
pub(crate) fn eval_lambda(tail: &Value, scope: &ScopeRef, _depth: usize) -> Result<Value, Error> {
    let Some((params_form, body_form)) = split_pair(tail) else {
        return Err(Error::SyntaxError(
            "lambda needs a parameter list and a body".into(),
        ));
    };
    let params = parse_params(&params_form)?;
    let body = collect_body(&body_form)?;
    Ok(Value::ClosureFactory(Rc::new(ClosureFactory {
        params,
        body,
        captured: Rc::clone(scope),
    })))
}

/// `define` binds a name in the current frame and yields the empty list.
///
/// Three shapes are accepted: `(define name value)`, the procedure shorthand
/// `(define (name . params) body...)`, and `(define name lambda-expr args...)`
/// which applies the lambda to the evaluated extra operands and binds the
/// result.
pub(crate) fn eval_define(tail: &Value, scope: &ScopeRef, depth: usize) -> Result<Value, Error> {
    let Some((target, rest)) = split_pair(tail) else {
        return Err(Error::SyntaxError("define needs a name and a value".into()));
    };
    match target {
        // (define (name . params) body...)
        Value::Pair(_) => {
            let Some((name_form, params_form)) = split_pair(&target) else {
                return Err(Error::SyntaxError("malformed 'define' form".into()));
            };
            let Value::Symbol(name) = name_form else {
                return Err(Error::SyntaxError(
                    "procedure shorthand needs a symbol name".into(),
                ));
            };
            let params = parse_params(&params_form)?;
            let body = collect_body(&rest)?;
            let factory = Value::ClosureFactory(Rc::new(ClosureFactory {
                params,
                body,
                captured: Rc::clone(scope),
            }));
            scope.define(&name, factory);
            Ok(Value::Null)
        }
        Value::Symbol(name) => {
            let Some((value_expr, extra)) = split_pair(&rest) else {
                return Err(Error::SyntaxError("define needs a value".into()));
            };
            let value = eval_with_depth_tracking(&value_expr, scope, depth + 1)?;
            let value = match &extra {
                Value::Null => value,
                Value::Pair(_) => match &value {
                    // (define name lambda-expr args...) applies immediately
                    Value::ClosureFactory(_) | Value::Closure(_) => {
                        let args = eval_args(&extra, scope, depth)?;
                        apply(&value, &args, depth)?
                    }
                    _ => {
                        return Err(Error::SyntaxError(
                            "define takes a single value".into(),
                        ));
                    }
                },
                _ => return Err(Error::SyntaxError("malformed 'define' form".into())),
            };
            scope.define(&name, value);
            Ok(Value::Null)
        }
        _ => Err(Error::SyntaxError(
            "the first operand of define must be a name".into(),
        )),
    }
}

/// `set!` rebinds a name at its defining frame; the name must already be
/// bound somewhere along the chain.
pub(crate) fn eval_set(tail: &Value, scope: &ScopeRef, depth: usize) -> Result<Value, Error> {
    let operands = operand_list(tail, "set!")?;
    let [target, value_expr] = operands.as_slice() else {
        return Err(Error::SyntaxError(
            "set! takes a name and a value".into(),
        ));
    };
    let Value::Symbol(name) = target else {
        return Err(Error::SyntaxError(
            "the first operand of set! must be a name".into(),
        ));
    };
    let value = eval_with_depth_tracking(value_expr, scope, depth + 1)?;
    scope.assign(name, value)?;
    Ok(Value::Null)
}

/// `if` evaluates only the chosen branch. Every value other than `#f` takes
/// the consequent; a false condition with no alternative yields the empty
/// list.
pub(crate) fn eval_if(tail: &Value, scope: &ScopeRef, depth: usize) -> Result<Value, Error> {
    let operands = operand_list(tail, "if")?;
    if operands.len() < 2 || operands.len() > 3 {
        return Err(Error::SyntaxError(
            "if takes a condition, a consequent and an optional alternative".into(),
        ));
    }
    let condition = eval_with_depth_tracking(&operands[0], scope, depth + 1)?;
    if condition.is_false() {
        match operands.get(2) {
            Some(alternative) => eval_with_depth_tracking(alternative, scope, depth + 1),
            None => Ok(Value::Null),
        }
    } else {
        eval_with_depth_tracking(&operands[1], scope, depth + 1)
    }
}

/// Operand evaluation for the boolean combiners. Two kinds of compound
/// operands are kept verbatim instead of evaluated: quote forms, and forms
/// whose head symbol has no binding in scope (the probe that lets quoted
/// data flow through `and`/`or` unapplied).
fn combiner_operand(expr: &Value, scope: &ScopeRef, depth: usize) -> Result<Value, Error> {
    if let Some((head, _)) = split_pair(expr) {
        if let Value::Symbol(name) = &head {
            if name == "quote" || scope.lookup(name).is_none() {
                return Ok(expr.clone());
            }
        }
    }
    eval_with_depth_tracking(expr, scope, depth + 1)
}

/// A kept quote form in final position hands back its quoted datum.
fn unwrap_kept_quote(value: Value) -> Value {
    if let Some((head, quote_tail)) = split_pair(&value) {
        if matches!(&head, Value::Symbol(name) if name == "quote") {
            return match quote_tail {
                Value::Pair(inner) => inner.borrow().car.clone(),
                other => other,
            };
        }
    }
    value
}

/// `and` walks its operands lazily and returns the first `#f`; with none, the
/// final operand's value is the result. No operands at all yield `#t`.
pub(crate) fn eval_and(tail: &Value, scope: &ScopeRef, depth: usize) -> Result<Value, Error> {
    let operands = operand_list(tail, "and")?;
    let mut last = Value::Bool(true);
    for expr in &operands {
        let value = combiner_operand(expr, scope, depth)?;
        if value.is_false() {
            return Ok(value);
        }
        last = value;
    }
    Ok(unwrap_kept_quote(last))
}

/// `or` walks its operands lazily and returns the first value that is not
/// `#f`; with none, `#f`.
pub(crate) fn eval_or(tail: &Value, scope: &ScopeRef, depth: usize) -> Result<Value, Error> {
    let operands = operand_list(tail, "or")?;
    for expr in &operands {
        let value = combiner_operand(expr, scope, depth)?;
        if !value.is_false() {
            return Ok(value);
        }
    }
    Ok(Value::Bool(false))
}
