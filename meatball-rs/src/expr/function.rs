//! Callable handles and function tables.
//!
//! A function is either a built-in (a plain `fn` pointer compiled into the
//! crate) or a plugin (a boxed closure registered at runtime).  Both are
//! invoked through [`Callable::call`] with already-evaluated arguments and a
//! [`CallEnv`] describing what the call may see.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::context::ContextResolver;
use crate::env::Environment;
use crate::value::Value;

/// What a function invocation can see besides its arguments.
#[derive(Clone, Copy)]
pub struct CallEnv<'a> {
    /// The active context; only supplied to functions that ask for it.
    pub context: Option<&'a ContextResolver>,
    /// Environment lookup for `env`.
    pub env: &'a dyn Environment,
}

impl<'a> CallEnv<'a> {
    pub fn new(env: &'a dyn Environment) -> Self {
        CallEnv { context: None, env }
    }

    pub fn with_context(mut self, context: &'a ContextResolver) -> Self {
        self.context = Some(context);
        self
    }

    /// The same environment without a context, for nested calls made by
    /// higher-order built-ins.
    pub fn without_context(self) -> Self {
        CallEnv { context: None, env: self.env }
    }
}

/// Signature of a built-in function.
pub type NativeFn = fn(&[Value], &CallEnv<'_>) -> Result<Value, String>;

/// Signature of a plugin function.
pub type PluginFn = Arc<dyn Fn(&[Value], &CallEnv<'_>) -> Result<Value, String> + Send + Sync>;

/// A built-in function entry.
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: NativeFn,
    /// Receives the active context (templating functions).
    pub takes_context: bool,
}

/// A typed handle to something invocable from an expression.
#[derive(Clone)]
pub enum Callable {
    Builtin(Builtin),
    Plugin { name: Arc<str>, func: PluginFn },
}

impl Callable {
    /// Wrap a closure that only needs its arguments.
    pub fn plugin<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        Callable::Plugin {
            name: Arc::from(name),
            func: Arc::new(move |args: &[Value], _: &CallEnv<'_>| f(args)),
        }
    }

    /// Wrap a closure that also wants the call environment.
    pub fn plugin_with_env<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[Value], &CallEnv<'_>) -> Result<Value, String> + Send + Sync + 'static,
    {
        Callable::Plugin { name: Arc::from(name), func: Arc::new(f) }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Builtin(b) => b.name,
            Callable::Plugin { name, .. } => name.as_ref(),
        }
    }

    pub fn takes_context(&self) -> bool {
        match self {
            Callable::Builtin(b) => b.takes_context,
            Callable::Plugin { .. } => false,
        }
    }

    pub fn call(&self, args: &[Value], env: &CallEnv<'_>) -> Result<Value, String> {
        match self {
            Callable::Builtin(b) => (b.func)(args, env),
            Callable::Plugin { func, .. } => func(args, env),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Builtin(b) => write!(f, "Builtin({})", b.name),
            Callable::Plugin { name, .. } => write!(f, "Plugin({name})"),
        }
    }
}

/// Name-based access to callables.
pub trait FunctionLookup {
    fn function(&self, name: &str) -> Option<Callable>;

    fn has_function(&self, name: &str) -> bool {
        self.function(name).is_some()
    }
}

/// A plain name → callable table.  Later insertions overwrite earlier ones.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Callable>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, callable: Callable) {
        self.functions.insert(callable.name().to_owned(), callable);
    }

    /// Insert under an explicit name (aliases such as `javascript` → `js`).
    pub fn insert_as(&mut self, name: impl Into<String>, callable: Callable) {
        self.functions.insert(name.into(), callable);
    }

    pub fn extend(&mut self, other: &FunctionTable) {
        for (name, callable) in &other.functions {
            self.functions.insert(name.clone(), callable.clone());
        }
    }

    pub fn get(&self, name: &str) -> Option<&Callable> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl FromIterator<Builtin> for FunctionTable {
    fn from_iter<I: IntoIterator<Item = Builtin>>(iter: I) -> Self {
        let mut table = FunctionTable::new();
        for b in iter {
            table.insert(Callable::Builtin(b));
        }
        table
    }
}

impl FunctionLookup for FunctionTable {
    fn function(&self, name: &str) -> Option<Callable> {
        self.functions.get(name).cloned()
    }
}
