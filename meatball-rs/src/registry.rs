//! Macro engine registry.
//!
//! Holds the named engines and the flat function table that expressions
//! call into.  The function table is the union of every engine's built-ins,
//! the template functions, and anything registered afterwards; a name
//! registered twice keeps the later entry.  Names missing from the table fall
//! back to the process-wide [plugin registry](crate::plugin).
//!
//! Both tables sit behind read-mostly locks so one registry can serve
//! concurrent preprocessing passes.  Locks are never held while an engine or
//! function runs.

use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::context::ContextResolver;
use crate::engine::{standard_engines, MacroEngine, Scope};
use crate::env::{Environment, ProcessEnv};
use crate::error::EvalError;
use crate::expr::builtins;
use crate::expr::{CallEnv, Callable, FunctionLookup, FunctionTable};
use crate::plugin;
use crate::value::Value;

static SHARED: LazyLock<Arc<MacroRegistry>> = LazyLock::new(|| Arc::new(MacroRegistry::new()));

pub struct MacroRegistry {
    engines: RwLock<IndexMap<String, Arc<dyn MacroEngine>>>,
    functions: RwLock<FunctionTable>,
    env: Arc<dyn Environment>,
}

impl Default for MacroRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroRegistry {
    /// A registry with the standard engines and their functions.
    pub fn new() -> Self {
        let registry = Self::empty();
        for engine in standard_engines() {
            registry.register_engine(Arc::from(engine));
        }
        {
            let mut functions = registry.functions.write();
            for b in builtins::TEMPLATE {
                functions.insert(Callable::Builtin(*b));
            }
        }
        registry
    }

    /// A registry with no engines and no functions.
    pub fn empty() -> Self {
        MacroRegistry {
            engines: RwLock::new(IndexMap::new()),
            functions: RwLock::new(FunctionTable::new()),
            env: Arc::new(ProcessEnv),
        }
    }

    /// The process-wide default registry.
    pub fn shared() -> Arc<MacroRegistry> {
        Arc::clone(&SHARED)
    }

    /// Replace the environment used by the `env` built-in.
    pub fn with_env(mut self, env: Arc<dyn Environment>) -> Self {
        self.env = env;
        self
    }

    /// Add (or replace) an engine and merge its built-ins into the function
    /// table.
    pub fn register_engine(&self, engine: Arc<dyn MacroEngine>) {
        let name = engine.name().to_owned();
        debug!(engine = %name, "register engine");
        {
            let mut functions = self.functions.write();
            for b in engine.functions() {
                functions.insert(Callable::Builtin(*b));
            }
        }
        self.engines.write().insert(name, engine);
    }

    /// Add (or replace) a function in this registry's table.
    pub fn register_function(&self, name: &str, callable: Callable) {
        debug!(name, "register function");
        self.functions.write().insert_as(name, callable);
    }

    pub fn engine(&self, name: &str) -> Option<Arc<dyn MacroEngine>> {
        self.engines.read().get(name).cloned()
    }

    pub fn has_engine(&self, name: &str) -> bool {
        self.engines.read().contains_key(name)
    }

    pub fn env(&self) -> &dyn Environment {
        self.env.as_ref()
    }

    /// Evaluate `expression` with the named engine.  An unknown engine is not
    /// an error: the result is the string `Unknown macro engine: <name>`.
    pub fn evaluate_macro(
        &self,
        engine_name: &str,
        expression: &str,
        resolver: &ContextResolver,
    ) -> Result<Value, EvalError> {
        let Some(engine) = self.engine(engine_name) else {
            warn!(engine = engine_name, "unknown macro engine");
            return Ok(Value::Str(format!("Unknown macro engine: {engine_name}")));
        };
        debug!(engine = engine_name, expression, "evaluate macro");
        let scope = Scope { resolver, functions: self, env: self.env() };
        engine.evaluate(expression, &scope)
    }

    pub fn evaluate_sexpr(
        &self,
        expression: &str,
        resolver: &ContextResolver,
    ) -> Result<Value, EvalError> {
        self.evaluate_macro("sexpr", expression, resolver)
    }

    /// Call a function by name with already-evaluated arguments.  Failures
    /// are returned as strings: `Unknown function: <name>` or
    /// `Function error: <message>`.
    pub fn evaluate_function(&self, name: &str, args: &[Value], resolver: &ContextResolver) -> Value {
        let Some(callable) = self.function(name) else {
            return Value::Str(format!("Unknown function: {name}"));
        };
        let mut call_env = CallEnv::new(self.env());
        if callable.takes_context() {
            call_env = call_env.with_context(resolver);
        }
        callable
            .call(args, &call_env)
            .unwrap_or_else(|e| Value::Str(format!("Function error: {e}")))
    }

    /// Engine names in registration order.
    pub fn list_engines(&self) -> Vec<String> {
        self.engines.read().keys().cloned().collect()
    }

    /// Function names in this registry's own table, sorted.
    pub fn list_functions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.read().names().map(str::to_owned).collect();
        names.sort();
        names
    }
}

impl FunctionLookup for MacroRegistry {
    fn function(&self, name: &str) -> Option<Callable> {
        self.functions.read().function(name).or_else(|| plugin::get(name))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
