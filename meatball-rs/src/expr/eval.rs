//! Expression evaluator.
//!
//! Walks an AST produced by [`parse`](super::parser::parse) against a
//! [`ContextResolver`] and a function table.  Arguments are always evaluated
//! before the call, left to right; `if`/`when`/`cond` therefore see every
//! branch already computed.

use tracing::trace;

use super::function::{CallEnv, Callable, FunctionLookup};
use super::parser::{parse, Atom, Node};
use crate::context::ContextResolver;
use crate::env::Environment;
use crate::error::EvalError;
use crate::literal::{looks_like_container, parse_literal};
use crate::stack::ensure_sufficient_stack;
use crate::template::interpolate;
use crate::value::Value;

/// Everything an evaluation can see.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    resolver: &'a ContextResolver,
    functions: &'a dyn FunctionLookup,
    env: &'a dyn Environment,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        resolver: &'a ContextResolver,
        functions: &'a dyn FunctionLookup,
        env: &'a dyn Environment,
    ) -> Self {
        Evaluator { resolver, functions, env }
    }

    /// Parse and evaluate `src`.
    pub fn eval_str(&self, src: &str) -> Result<Value, EvalError> {
        let node = parse(src)?;
        self.eval(&node)
    }

    pub fn eval(&self, node: &Node) -> Result<Value, EvalError> {
        ensure_sufficient_stack(|| match node {
            Node::Application { head, args } => self.apply(head, args),
            Node::Symbol(name) => Ok(self.symbol(name)),
            Node::Atom(Atom::Str(s)) => Ok(self.string_atom(s)),
            Node::Atom(atom) => Ok(atom.to_value()),
            Node::Quoted(inner) => Ok(inner.literal()),
            Node::Nil => Ok(Value::List(Vec::new())),
        })
    }

    fn symbol(&self, name: &str) -> Value {
        if let Some(f) = self.functions.function(name) {
            return Value::Func(f);
        }
        if name.starts_with('/') || name.starts_with('.') {
            return Value::str(name);
        }
        self.resolver.resolve_value(name)
    }

    fn string_atom(&self, s: &str) -> Value {
        if looks_like_container(s) {
            if let Ok(v) = parse_literal(s) {
                return v;
            }
        }
        Value::Str(interpolate(s, self.resolver).into_owned())
    }

    fn apply(&self, head: &Node, args: &[Node]) -> Result<Value, EvalError> {
        if let Node::Symbol(name) = head {
            let mut values = self.eval_args(args)?;
            let callable = self
                .find_callable(name)
                .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
            self.coerce(name, &mut values);
            return self.invoke(name, &callable, &values);
        }
        let callable = match self.eval(head)? {
            Value::Func(f) => f,
            value => return Err(EvalError::UnknownFunction(value.to_string())),
        };
        let values = self.eval_args(args)?;
        self.invoke(callable.name(), &callable, &values)
    }

    fn eval_args(&self, args: &[Node]) -> Result<Vec<Value>, EvalError> {
        args.iter().map(|a| self.eval(a)).collect()
    }

    /// Function table first, then a callable bound in the context.
    fn find_callable(&self, name: &str) -> Option<Callable> {
        if let Some(f) = self.functions.function(name) {
            trace!(name, "function table hit");
            return Some(f);
        }
        match self.resolver.lookup(name) {
            Some(Value::Func(f)) => {
                trace!(name, "context callable");
                Some(f)
            }
            _ => None,
        }
    }

    /// Per-function argument rewrites applied after evaluation.
    fn coerce(&self, name: &str, args: &mut [Value]) {
        match name {
            "map" | "filter" => {
                if let Some(Value::Str(fname)) = args.first() {
                    if let Some(f) = self.functions.function(fname) {
                        args[0] = Value::Func(f);
                    }
                }
            }
            "get" | "select" => {
                if let Some(parsed) = args.first().and_then(parse_container) {
                    args[0] = parsed;
                }
            }
            "length" if args.len() == 1 => {
                if let Some(parsed) = parse_container(&args[0]) {
                    args[0] = parsed;
                }
            }
            "concat" => {
                for arg in args.iter_mut() {
                    if !matches!(arg, Value::Str(_)) {
                        *arg = Value::Str(arg.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    fn invoke(&self, name: &str, callable: &Callable, args: &[Value]) -> Result<Value, EvalError> {
        let mut call_env = CallEnv::new(self.env);
        if callable.takes_context() {
            call_env = call_env.with_context(self.resolver);
        }
        callable.call(args, &call_env).map_err(|msg| EvalError::function(name, msg))
    }
}

fn parse_container(v: &Value) -> Option<Value> {
    match v {
        Value::Str(s) if looks_like_container(s) => parse_literal(s).ok(),
        _ => None,
    }
}

/// Evaluate `node` with the given context, function table, and environment.
pub fn evaluate(
    node: &Node,
    resolver: &ContextResolver,
    functions: &dyn FunctionLookup,
    env: &dyn Environment,
) -> Result<Value, EvalError> {
    Evaluator::new(resolver, functions, env).eval(node)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
