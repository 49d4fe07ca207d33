//! Evaluation context and variable resolution.
//!
//! A [`Context`] is the flat name → value table visible to macros during one
//! preprocessing pass.  [`ContextResolver`] owns it and resolves the three
//! variable notations:
//!
//! | Form            | Meaning                                              |
//! |-----------------|------------------------------------------------------|
//! | `name`          | Direct lookup; unknown names resolve to themselves   |
//! | `a.b.c`         | Descend through nested mappings                      |
//! | `a[key]`        | Index `a` by `key` (a literal, or itself a variable) |
//!
//! Aliases registered with [`ContextResolver::add_alias`] are substituted
//! before any of the above.

use std::collections::HashMap;

use tracing::trace;

use crate::error::ResolveError;
use crate::literal::parse_literal;
use crate::value::{Map, Value};

/// Name → value table for one preprocessing pass.
pub type Context = Map;

/// Owns a [`Context`] plus alias table and resolves variable names against it.
#[derive(Debug, Default, Clone)]
pub struct ContextResolver {
    context: Context,
    aliases: HashMap<String, String>,
}

impl From<Context> for ContextResolver {
    fn from(context: Context) -> Self {
        Self::new(context)
    }
}

impl ContextResolver {
    pub fn new(context: Context) -> Self {
        ContextResolver { context, aliases: HashMap::new() }
    }

    /// Make `alias` resolve as if `target` had been written.
    pub fn add_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    /// Set (or overwrite) a top-level entry.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.context.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.context.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.context.contains_key(name)
    }

    /// Merge `entries` into the context; existing keys are overwritten.
    pub fn update(&mut self, entries: impl IntoIterator<Item = (String, Value)>) {
        for (k, v) in entries {
            trace!(key = %k, "context merge");
            self.context.insert(k, v);
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn into_inner(self) -> Context {
        self.context
    }

    pub fn len(&self) -> usize {
        self.context.len()
    }

    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
    }

    // ── Resolution ────────────────────────────────────────────────────────────

    /// Resolve `name`.
    ///
    /// Plain names that are not in the context resolve to the name itself, so
    /// unbound symbols flow through as literal text.  Dot and bracket paths
    /// that can't be followed are a [`ResolveError`].
    pub fn resolve(&self, name: &str) -> Result<Value, ResolveError> {
        let name = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        let dotted = name.contains('.');
        let bracketed = name.contains('[');

        if dotted && !bracketed {
            self.resolve_dotted(name)
        } else if bracketed && name.ends_with(']') {
            self.resolve_bracketed(name)
        } else {
            Ok(self.context.get(name).cloned().unwrap_or_else(|| Value::str(name)))
        }
    }

    /// Like [`resolve`](Self::resolve), with failures rendered to their
    /// visible error string.
    pub fn resolve_value(&self, name: &str) -> Value {
        self.resolve(name).unwrap_or_else(|e| Value::Str(e.to_string()))
    }

    /// Strict lookup: `None` unless `name` names something that exists.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let target = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        let bracketed = target.contains('[');
        let path = (target.contains('.') && !bracketed) || (bracketed && target.ends_with(']'));
        if path {
            self.resolve(target).ok()
        } else {
            self.context.get(target).cloned()
        }
    }

    fn resolve_dotted(&self, name: &str) -> Result<Value, ResolveError> {
        let mut parts = name.split('.');
        let first = parts.next().unwrap_or_default();
        let mut current = self.context.get(first).ok_or_else(|| ResolveError::new(name))?;
        for part in parts {
            current = match current {
                Value::Map(map) => map.get(part).ok_or_else(|| ResolveError::new(name))?,
                _ => return Err(ResolveError::new(name)),
            };
        }
        Ok(current.clone())
    }

    fn resolve_bracketed(&self, name: &str) -> Result<Value, ResolveError> {
        let Some((base_name, key_part)) = name.split_once('[') else {
            return Err(ResolveError::new(name));
        };
        let key_text = &key_part[..key_part.len() - 1];
        let empty = Value::Map(Map::new());
        let base = self.context.get(base_name).unwrap_or(&empty);

        let key = match parse_literal(key_text) {
            Ok(literal) => literal,
            Err(_) => self.resolve_value(key_text),
        };
        index(base, &key).ok_or_else(|| ResolveError::new(name))
    }
}

/// `base[key]` for maps (by key text), lists and strings (by integer,
/// negative counts from the end).
pub fn index(base: &Value, key: &Value) -> Option<Value> {
    match (base, key) {
        (Value::Map(map), Value::Str(k)) => map.get(k).cloned(),
        (Value::Map(map), k @ (Value::Int(_) | Value::Bool(_) | Value::Float(_) | Value::Null)) => {
            map.get(&k.to_string()).cloned()
        }
        (Value::List(items), k) => {
            let i = wrap_index(k.as_int()?, items.len())?;
            items.get(i).cloned()
        }
        (Value::Str(s), k) => {
            let chars: Vec<char> = s.chars().collect();
            let i = wrap_index(k.as_int()?, chars.len())?;
            chars.get(i).map(|c| Value::Str(c.to_string()))
        }
        _ => None,
    }
}

fn wrap_index(i: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if i < 0 { i + len } else { i };
    (0..len).contains(&i).then_some(i as usize)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
