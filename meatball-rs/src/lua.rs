//! Optional Lua 5.4 macro engine via the `mlua` crate.
//!
//! Enabled with the `lua` Cargo feature:
//! ```text
//! cargo build --features lua
//! cargo test  --features lua
//! ```
//!
//! The engine is not part of the standard set; hosts opt in with
//! [`MacroRegistry::register_engine`](crate::registry::MacroRegistry::register_engine):
//!
//! ```ignore
//! registry.register_engine(Arc::new(LuaEngine));
//! // document:  total: {lua: "price * qty"}
//! ```
//!
//! Every evaluation gets a fresh interpreter with the context exposed as
//! globals:
//!
//! | Context value          | Lua global                               |
//! |------------------------|------------------------------------------|
//! | `null`                 | `nil`                                    |
//! | bool / int / float     | boolean / integer / number               |
//! | string                 | string                                   |
//! | list                   | table with keys `1..n`                   |
//! | mapping                | table with string keys                   |
//! | function               | not exposed                              |

use mlua::prelude::*;
use tracing::{debug, warn};

use crate::engine::{MacroEngine, Scope};
use crate::error::EvalError;
use crate::template::strip_quotes;
use crate::value::{Map, Value};

// ── LuaEngine ─────────────────────────────────────────────────────────────────

/// Evaluates a Lua expression against the context.  Lua failures come back
/// as `Error: <message>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LuaEngine;

impl LuaEngine {
    /// Evaluate `chunk` as a Lua expression with `globals` installed.
    pub fn eval(&self, chunk: &str, globals: &Map) -> LuaResult<Value> {
        let lua = Lua::new();
        let table = lua.globals();
        for (name, value) in globals {
            if let Some(v) = to_lua(&lua, value)? {
                table.set(name.as_str(), v)?;
            }
        }
        let result: LuaValue = lua.load(chunk).set_name("=macro").eval()?;
        from_lua(result)
    }
}

impl MacroEngine for LuaEngine {
    fn name(&self) -> &str {
        "lua"
    }

    fn evaluate(&self, expression: &str, scope: &Scope<'_>) -> Result<Value, EvalError> {
        let chunk = strip_quotes(expression.trim());
        debug!(chunk, "lua");
        Ok(match self.eval(chunk, scope.resolver.context()) {
            Ok(v) => v,
            Err(e) => {
                warn!(chunk, error = %e, "lua evaluation failed");
                Value::Str(format!("Error: {e}"))
            }
        })
    }
}

// ── Conversion ────────────────────────────────────────────────────────────────

fn to_lua(lua: &Lua, value: &Value) -> LuaResult<Option<LuaValue>> {
    Ok(Some(match value {
        Value::Null => LuaValue::Nil,
        Value::Bool(b) => LuaValue::Boolean(*b),
        Value::Int(n) => LuaValue::Integer(*n),
        Value::Float(x) => LuaValue::Number(*x),
        Value::Str(s) => LuaValue::String(lua.create_string(s)?),
        Value::List(items) => {
            let t = lua.create_table_with_capacity(items.len(), 0)?;
            for (i, item) in items.iter().enumerate() {
                if let Some(v) = to_lua(lua, item)? {
                    t.raw_set(i as i64 + 1, v)?;
                }
            }
            LuaValue::Table(t)
        }
        Value::Map(map) => {
            let t = lua.create_table_with_capacity(0, map.len())?;
            for (k, item) in map {
                if let Some(v) = to_lua(lua, item)? {
                    t.raw_set(k.as_str(), v)?;
                }
            }
            LuaValue::Table(t)
        }
        Value::Func(_) => return Ok(None),
    }))
}

fn from_lua(value: LuaValue) -> LuaResult<Value> {
    Ok(match value {
        LuaValue::Nil => Value::Null,
        LuaValue::Boolean(b) => Value::Bool(b),
        LuaValue::Integer(n) => Value::Int(n),
        LuaValue::Number(x) => Value::Float(x),
        LuaValue::String(s) => Value::Str(s.to_string_lossy()),
        LuaValue::Table(t) => {
            // A non-empty border means a sequence; anything else is a map.
            if t.raw_len() > 0 {
                let items = t
                    .sequence_values::<LuaValue>()
                    .map(|v| v.and_then(from_lua))
                    .collect::<LuaResult<Vec<_>>>()?;
                Value::List(items)
            } else {
                let mut map = Map::new();
                for pair in t.pairs::<LuaValue, LuaValue>() {
                    let (k, v) = pair?;
                    map.insert(from_lua(k)?.to_string(), from_lua(v)?);
                }
                Value::Map(map)
            }
        }
        other => {
            return Err(LuaError::RuntimeError(format!(
                "cannot convert Lua {} to a value",
                other.type_name()
            )))
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::context::ContextResolver;
    use crate::literal::parse_literal;
    use crate::registry::MacroRegistry;

    fn registry() -> MacroRegistry {
        let r = MacroRegistry::new();
        r.register_engine(Arc::new(LuaEngine));
        r
    }

    fn eval(expr: &str, ctx: &ContextResolver) -> Value {
        registry().evaluate_macro("lua", expr, ctx).unwrap()
    }

    #[test]
    fn not_registered_by_default() {
        assert!(!MacroRegistry::new().has_engine("lua"));
        assert!(registry().has_engine("lua"));
    }

    #[test]
    fn arithmetic_over_context() {
        let mut ctx = ContextResolver::default();
        ctx.set("price", Value::Int(3));
        ctx.set("qty", Value::Int(4));
        assert_eq!(eval("price * qty", &ctx), Value::Int(12));
        assert_eq!(eval("price / 2", &ctx), Value::Float(1.5));
    }

    #[test]
    fn quotes_are_stripped() {
        let mut ctx = ContextResolver::default();
        ctx.set("name", "ann");
        assert_eq!(eval("\"name .. '!'\"", &ctx), Value::str("ann!"));
    }

    #[test]
    fn nested_values() {
        let mut ctx = ContextResolver::default();
        ctx.set("cfg", parse_literal("{'db': {'port': 5432}, 'hosts': ['a', 'b']}").unwrap());
        assert_eq!(eval("cfg.db.port + 1", &ctx), Value::Int(5433));
        assert_eq!(eval("cfg.hosts[2]", &ctx), Value::str("b"));
        assert_eq!(eval("#cfg.hosts", &ctx), Value::Int(2));
    }

    #[test]
    fn tables_convert_back() {
        let ctx = ContextResolver::default();
        assert_eq!(eval("{1, 2, 3}", &ctx), parse_literal("[1, 2, 3]").unwrap());
        assert_eq!(eval("{a = 'x'}", &ctx), parse_literal("{'a': 'x'}").unwrap());
        assert_eq!(eval("nil", &ctx), Value::Null);
    }

    #[test]
    fn failures_are_data() {
        let ctx = ContextResolver::default();
        let v = eval("error('boom')", &ctx);
        assert!(matches!(v, Value::Str(ref s) if s.starts_with("Error: ") && s.contains("boom")));
        let v = eval("(", &ctx);
        assert!(matches!(v, Value::Str(ref s) if s.starts_with("Error: ")));
    }

    #[test]
    fn document_inline_mapping() {
        let r = Arc::new(registry());
        let pre = crate::preprocess::Preprocessor::new(r);
        let mut ctx = ContextResolver::default();
        let out = pre.process_yaml("n: 5\nsq: {lua: 'n * n'}\n", &mut ctx).unwrap();
        assert_eq!(out, parse_literal("{'n': 5, 'sq': 25}").unwrap());
    }
}
