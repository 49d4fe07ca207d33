//! Macro engines.
//!
//! An engine evaluates one macro syntax family.  Template engines substitute
//! `{…}` placeholders; function engines expose a set of built-ins; the
//! s-expression engine parses and evaluates a full expression.
//!
//! Engines are looked up by [`MacroEngine::name`] in the
//! [`MacroRegistry`](crate::registry::MacroRegistry).

use tracing::{debug, warn};

use crate::context::ContextResolver;
use crate::env::Environment;
use crate::error::EvalError;
use crate::expr::builtins;
use crate::expr::{Builtin, Callable, Evaluator, FunctionLookup};
use crate::template::TemplateSyntax;
use crate::value::Value;

/// What an engine evaluates against.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    pub resolver: &'a ContextResolver,
    /// Every function visible to expressions (registry table plus plugins).
    pub functions: &'a dyn FunctionLookup,
    pub env: &'a dyn Environment,
}

pub trait MacroEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate `expression`.  Failures that are data come back as
    /// `Ok(Value::Str(..))`; only fatal errors are `Err`.
    fn evaluate(&self, expression: &str, scope: &Scope<'_>) -> Result<Value, EvalError>;

    /// Built-ins this engine contributes to the shared function table.
    fn functions(&self) -> &[Builtin] {
        &[]
    }
}

// ── Template engines ──────────────────────────────────────────────────────────

/// `py`, `js`, or `go` template substitution.
#[derive(Debug, Clone, Copy)]
pub struct TemplateEngine {
    syntax: TemplateSyntax,
}

impl TemplateEngine {
    pub fn new(syntax: TemplateSyntax) -> Self {
        TemplateEngine { syntax }
    }

    pub fn py() -> Self {
        Self::new(TemplateSyntax::Py)
    }

    pub fn js() -> Self {
        Self::new(TemplateSyntax::Js)
    }

    pub fn go() -> Self {
        Self::new(TemplateSyntax::Go)
    }
}

impl MacroEngine for TemplateEngine {
    fn name(&self) -> &str {
        self.syntax.name()
    }

    fn evaluate(&self, expression: &str, scope: &Scope<'_>) -> Result<Value, EvalError> {
        Ok(Value::Str(self.syntax.render(expression, scope.resolver)))
    }
}

// ── Function engines ──────────────────────────────────────────────────────────

/// An engine that is only a bag of functions.  Evaluating it with a
/// function's name returns that function.
#[derive(Debug, Clone, Copy)]
pub struct FunctionEngine {
    name: &'static str,
    label: &'static str,
    functions: &'static [Builtin],
}

impl FunctionEngine {
    /// jq-style collection transforms.
    pub fn jq() -> Self {
        FunctionEngine { name: "jq", label: "jq", functions: builtins::JQ }
    }

    /// String utilities and `env`.
    pub fn util() -> Self {
        FunctionEngine { name: "util", label: "utility", functions: builtins::UTIL }
    }
}

impl MacroEngine for FunctionEngine {
    fn name(&self) -> &str {
        self.name
    }

    fn evaluate(&self, expression: &str, _scope: &Scope<'_>) -> Result<Value, EvalError> {
        let found = self.functions.iter().find(|b| b.name == expression);
        Ok(match found {
            Some(b) => Value::Func(Callable::Builtin(*b)),
            None => Value::Str(format!("Unknown {} function: {expression}", self.label)),
        })
    }

    fn functions(&self) -> &[Builtin] {
        self.functions
    }
}

// ── S-expression engine ───────────────────────────────────────────────────────

/// Full expression evaluation.  Non-fatal failures are rendered as
/// `S-expression error: …`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SExprEngine;

impl MacroEngine for SExprEngine {
    fn name(&self) -> &str {
        "sexpr"
    }

    fn evaluate(&self, expression: &str, scope: &Scope<'_>) -> Result<Value, EvalError> {
        debug!(expression, "sexpr");
        let evaluator = Evaluator::new(scope.resolver, scope.functions, scope.env);
        match evaluator.eval_str(expression) {
            Err(e) if !e.is_fatal() => {
                warn!(expression, error = %e, "expression failed");
                Ok(Value::Str(format!("S-expression error: {e}")))
            }
            other => other,
        }
    }

    fn functions(&self) -> &[Builtin] {
        builtins::SEXPR
    }
}

/// The engines every registry starts with, in registration order.
pub fn standard_engines() -> Vec<Box<dyn MacroEngine>> {
    vec![
        Box::new(TemplateEngine::py()),
        Box::new(TemplateEngine::js()),
        Box::new(TemplateEngine::go()),
        Box::new(FunctionEngine::jq()),
        Box::new(FunctionEngine::util()),
        Box::new(SExprEngine),
    ]
}

// ── Tests ─────────────────────────────────────────────────────────────────────
