//! Built-in function library.
//!
//! Each function receives already-evaluated arguments and returns
//! `Result<Value, String>`; the evaluator attaches the function name to any
//! error.  Functions are grouped by the engine that contributes them:
//!
//! - [`SEXPR`]: arithmetic, comparison, constructors, control flow
//! - [`JQ`]: collection transforms
//! - [`UTIL`]: string utilities and `env`
//! - [`TEMPLATE`]: template rendering against the active context

use std::cmp::Ordering;

use super::function::{Builtin, CallEnv, NativeFn};
use crate::context::ContextResolver;
use crate::template::TemplateSyntax;
use crate::value::{Map, Value};

const fn plain(name: &'static str, func: NativeFn) -> Builtin {
    Builtin { name, func, takes_context: false }
}

const fn contextual(name: &'static str, func: NativeFn) -> Builtin {
    Builtin { name, func, takes_context: true }
}

pub const SEXPR: &[Builtin] = &[
    plain("+", add),
    plain("-", sub),
    plain("*", mul),
    plain("/", div),
    plain("=", eq),
    plain("<", lt),
    plain(">", gt),
    plain("list", list),
    plain("dict", dict),
    plain("if", if_),
    plain("when", when),
    plain("cond", cond),
];

pub const JQ: &[Builtin] = &[
    plain("map", map),
    plain("filter", filter),
    plain("select", select),
    plain("get", get),
    plain("length", length),
    plain("keys", keys),
    plain("values", values),
    plain("sort", sort),
    plain("reverse", reverse),
    plain("group_by", group_by),
    plain("unique", unique),
    plain("flatten", flatten),
];

pub const UTIL: &[Builtin] = &[
    plain("concat", concat),
    plain("upper", upper),
    plain("lower", lower),
    plain("strip", strip),
    plain("replace", replace),
    plain("split", split),
    plain("join", join),
    plain("env", env),
    plain("default", default),
];

pub const TEMPLATE: &[Builtin] = &[
    contextual("py", py_template),
    contextual("f", py_template),
    contextual("fstring", py_template),
    contextual("js", js_template),
    contextual("javascript", js_template),
    contextual("go", go_template),
    contextual("gostring", go_template),
];

// ── Arithmetic and comparison ─────────────────────────────────────────────────

fn add(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    args.iter().try_fold(Value::Int(0), |acc, v| acc.arith_add(v))
}

fn sub(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    match args {
        [a] => a.arith_neg(),
        [a, b] => a.arith_sub(b),
        _ => Err(arity("1 or 2", args.len())),
    }
}

fn mul(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    args.iter().try_fold(Value::Int(1), |acc, v| acc.arith_mul(v))
}

fn div(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let [a, b] = args else {
        return Err(arity("2", args.len()));
    };
    a.arith_div(b)
}

fn eq(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let [a, b] = args else {
        return Err(arity("2", args.len()));
    };
    Ok(Value::Bool(a.loose_eq(b)))
}

fn lt(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let [a, b] = args else {
        return Err(arity("2", args.len()));
    };
    Ok(Value::Bool(a.try_cmp(b)? == Ordering::Less))
}

fn gt(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let [a, b] = args else {
        return Err(arity("2", args.len()));
    };
    let ord = b.try_cmp(a).map_err(|e| e.replacen("'<'", "'>'", 1))?;
    Ok(Value::Bool(ord == Ordering::Less))
}

// ── Constructors and control ──────────────────────────────────────────────────

fn list(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    Ok(Value::List(args.to_vec()))
}

/// `(dict k1 v1 k2 v2 …)`; keys are stringified.
fn dict(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    if args.len() % 2 != 0 {
        return Err(format!(
            "dictionary update sequence element #{} has length 1; 2 is required",
            args.len() / 2
        ));
    }
    let map: Map = args
        .chunks_exact(2)
        .map(|pair| (pair[0].to_string(), pair[1].clone()))
        .collect();
    Ok(Value::Map(map))
}

fn if_(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    match args {
        [cond, then] => Ok(if cond.is_truthy() { then.clone() } else { Value::Null }),
        [cond, then, otherwise] => {
            Ok(if cond.is_truthy() { then.clone() } else { otherwise.clone() })
        }
        _ => Err(arity("2 or 3", args.len())),
    }
}

fn when(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let (cond, exprs) = args.split_first().ok_or_else(|| missing(0))?;
    if cond.is_truthy() {
        Ok(exprs.last().cloned().unwrap_or_default())
    } else {
        Ok(Value::Null)
    }
}

/// First clause `[test, expr, …]` whose test is truthy.
fn cond(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    for clause in args {
        if let Value::List(items) = clause {
            if let [test, expr, ..] = items.as_slice() {
                if test.is_truthy() {
                    return Ok(expr.clone());
                }
            }
        }
    }
    Ok(Value::Null)
}

// ── Collection transforms ─────────────────────────────────────────────────────

fn map(args: &[Value], env: &CallEnv<'_>) -> Result<Value, String> {
    let func = arg(args, 0)?;
    let items = iterate(arg(args, 1)?)?;
    let out = match func {
        Value::Func(f) => items
            .iter()
            .map(|item| f.call(std::slice::from_ref(item), env))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Str(key) => items
            .iter()
            .map(|item| pluck(item, key))
            .collect::<Result<Vec<_>, _>>()?,
        other => return Err(not_callable(other)),
    };
    Ok(Value::List(out))
}

fn filter(args: &[Value], env: &CallEnv<'_>) -> Result<Value, String> {
    let func = arg(args, 0)?;
    let items = iterate(arg(args, 1)?)?;
    let mut out = Vec::new();
    for item in items {
        let keep = match func {
            Value::Func(f) => f.call(std::slice::from_ref(&item), env)?.is_truthy(),
            Value::Str(key) => item
                .as_map()
                .and_then(|m| m.get(key))
                .is_some_and(Value::is_truthy),
            other => return Err(not_callable(other)),
        };
        if keep {
            out.push(item);
        }
    }
    Ok(Value::List(out))
}

fn select(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let data = arg(args, 0)?;
    let key = arg(args, 1)?;
    Ok(map_get(data, key).unwrap_or_default())
}

fn get(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let data = arg(args, 0)?;
    let key = arg(args, 1)?;
    let fallback = args.get(2).cloned().unwrap_or_default();
    Ok(map_get(data, key).unwrap_or(fallback))
}

fn length(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let n = match arg(args, 0)? {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => return Err(format!("object of type '{}' has no len()", other.type_name())),
    };
    Ok(Value::Int(n as i64))
}

fn keys(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    Ok(Value::List(match arg(args, 0)? {
        Value::Map(map) => map.keys().cloned().map(Value::Str).collect(),
        _ => Vec::new(),
    }))
}

fn values(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    Ok(Value::List(match arg(args, 0)? {
        Value::Map(map) => map.values().cloned().collect(),
        _ => Vec::new(),
    }))
}

fn sort(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let mut items = iterate(arg(args, 0)?)?;
    sort_by_key(&mut items, |v| v.clone())?;
    Ok(Value::List(items))
}

fn reverse(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let mut items = iterate(arg(args, 0)?)?;
    items.reverse();
    Ok(Value::List(items))
}

/// Sort by key (missing/falsy keys sort as `""`), falling back to input
/// order when keys are not comparable, then gather members per key.
fn group_by(args: &[Value], env: &CallEnv<'_>) -> Result<Value, String> {
    let func = arg(args, 0)?;
    let items = iterate(arg(args, 1)?)?;
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let key = match func {
            Value::Func(f) => f.call(std::slice::from_ref(&item), env)?,
            Value::Str(name) => item.as_map().and_then(|m| m.get(name)).cloned().unwrap_or_default(),
            other => return Err(not_callable(other)),
        };
        keyed.push((key, item));
    }

    let mut sorted = keyed.clone();
    let sort_key = |pair: &(Value, Value)| {
        if pair.0.is_truthy() { pair.0.clone() } else { Value::str("") }
    };
    if sort_by_key(&mut sorted, sort_key).is_ok() {
        keyed = sorted;
    }

    let mut groups = Map::new();
    for (key, item) in keyed {
        if let Value::List(members) =
            groups.entry(key.to_string()).or_insert_with(|| Value::List(Vec::new()))
        {
            members.push(item);
        }
    }
    Ok(Value::Map(groups))
}

/// Distinct elements in first-seen order.
fn unique(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let items = iterate(arg(args, 0)?)?;
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if matches!(item, Value::List(_) | Value::Map(_)) {
            return Err(format!("unhashable type: '{}'", item.type_name()));
        }
        if !out.iter().any(|seen| seen.loose_eq(&item)) {
            out.push(item);
        }
    }
    Ok(Value::List(out))
}

fn flatten(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let items = iterate(arg(args, 0)?)?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::List(inner) => out.extend(inner),
            other => out.push(other),
        }
    }
    Ok(Value::List(out))
}

// ── String utilities ──────────────────────────────────────────────────────────

fn concat(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    Ok(Value::Str(args.iter().map(Value::to_string).collect()))
}

fn upper(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    Ok(Value::Str(arg(args, 0)?.to_string().to_uppercase()))
}

fn lower(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    Ok(Value::Str(arg(args, 0)?.to_string().to_lowercase()))
}

fn strip(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    Ok(Value::Str(arg(args, 0)?.to_string().trim().to_owned()))
}

fn replace(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let text = arg(args, 0)?.to_string();
    let old = arg_str(args, 1)?;
    let new = arg_str(args, 2)?;
    Ok(Value::Str(text.replace(old, new)))
}

/// Split on a separator, or on runs of whitespace when none is given.
fn split(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let text = arg(args, 0)?.to_string();
    let parts: Vec<Value> = match args.get(1) {
        None | Some(Value::Null) => text.split_whitespace().map(Value::from).collect(),
        Some(Value::Str(sep)) if sep.is_empty() => return Err("empty separator".into()),
        Some(Value::Str(sep)) => text.split(sep.as_str()).map(Value::from).collect(),
        Some(other) => {
            return Err(format!("must be str or None, not {}", other.type_name()));
        }
    };
    Ok(Value::List(parts))
}

fn join(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let sep = arg_str(args, 0)?;
    let items = iterate(arg(args, 1)?)?;
    let parts: Vec<String> = items.iter().map(Value::to_string).collect();
    Ok(Value::Str(parts.join(sep)))
}

fn env(args: &[Value], call: &CallEnv<'_>) -> Result<Value, String> {
    let name = arg(args, 0)?.to_string();
    match call.env.lookup(&name) {
        Some(value) => Ok(Value::Str(value)),
        None => Ok(args.get(1).cloned().unwrap_or_else(|| Value::str(""))),
    }
}

fn default(args: &[Value], _: &CallEnv<'_>) -> Result<Value, String> {
    let value = arg(args, 0)?;
    let fallback = arg(args, 1)?;
    Ok(if value.is_truthy() { value.clone() } else { fallback.clone() })
}

// ── Templates ─────────────────────────────────────────────────────────────────

fn py_template(args: &[Value], env: &CallEnv<'_>) -> Result<Value, String> {
    Ok(render(TemplateSyntax::Py, args, env))
}

fn js_template(args: &[Value], env: &CallEnv<'_>) -> Result<Value, String> {
    Ok(render(TemplateSyntax::Js, args, env))
}

fn go_template(args: &[Value], env: &CallEnv<'_>) -> Result<Value, String> {
    Ok(render(TemplateSyntax::Go, args, env))
}

/// Arguments are joined with single spaces to form the template text.
fn render(syntax: TemplateSyntax, args: &[Value], env: &CallEnv<'_>) -> Value {
    let text: Vec<String> = args.iter().map(Value::to_string).collect();
    let empty = ContextResolver::default();
    let resolver = env.context.unwrap_or(&empty);
    Value::Str(syntax.render(&text.join(" "), resolver))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn arg(args: &[Value], idx: usize) -> Result<&Value, String> {
    args.get(idx).ok_or_else(|| missing(idx))
}

fn arg_str(args: &[Value], idx: usize) -> Result<&str, String> {
    match arg(args, idx)? {
        Value::Str(s) => Ok(s),
        other => Err(format!("argument {idx} must be str, not {}", other.type_name())),
    }
}

fn missing(idx: usize) -> String {
    format!("argument {idx} missing")
}

fn arity(expected: &str, got: usize) -> String {
    format!("expected {expected} arguments, got {got}")
}

fn not_callable(v: &Value) -> String {
    format!("'{}' object is not callable", v.type_name())
}

/// Elements of an iterable value: list items, map keys, or characters.
fn iterate(v: &Value) -> Result<Vec<Value>, String> {
    match v {
        Value::List(items) => Ok(items.clone()),
        Value::Map(map) => Ok(map.keys().cloned().map(Value::Str).collect()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(format!("'{}' object is not iterable", other.type_name())),
    }
}

fn pluck(item: &Value, key: &str) -> Result<Value, String> {
    match item {
        Value::Map(map) => Ok(map.get(key).cloned().unwrap_or_default()),
        other => Err(format!("'{}' object has no attribute '{key}'", other.type_name())),
    }
}

fn map_get(data: &Value, key: &Value) -> Option<Value> {
    let map = data.as_map()?;
    match key {
        Value::Str(k) => map.get(k).cloned(),
        other => map.get(&other.to_string()).cloned(),
    }
}

/// Stable sort by a derived key; the first incomparable pair aborts with its
/// error and leaves `items` in an unspecified order.
fn sort_by_key<T, K>(items: &mut [T], key: K) -> Result<(), String>
where
    K: Fn(&T) -> Value,
{
    let mut failure = None;
    items.sort_by(|a, b| match key(a).try_cmp(&key(b)) {
        Ok(ord) => ord,
        Err(e) => {
            if failure.is_none() {
                failure = Some(e);
            }
            Ordering::Equal
        }
    });
    failure.map_or(Ok(()), Err)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::expr::function::{Callable, FunctionTable};
    use crate::literal::parse_literal;

    fn table() -> FunctionTable {
        SEXPR.iter().chain(JQ).chain(UTIL).chain(TEMPLATE).copied().collect()
    }

    fn call(name: &str, args: Vec<Value>) -> Result<Value, String> {
        let env = MapEnv::new().with("HOME", "/home/me");
        let f = table().get(name).cloned().expect("not a builtin");
        f.call(&args, &CallEnv::new(&env))
    }

    fn ok(name: &str, args: Vec<Value>) -> Value {
        call(name, args).expect("call failed")
    }

    fn lit(src: &str) -> Value {
        parse_literal(src).unwrap()
    }

    fn func(name: &str) -> Value {
        Value::Func(table().get(name).cloned().unwrap())
    }

    #[test]
    fn arithmetic() {
        assert_eq!(ok("+", vec![Value::Int(1), Value::Int(2), Value::Int(3)]), Value::Int(6));
        assert_eq!(ok("+", vec![]), Value::Int(0));
        assert_eq!(ok("-", vec![Value::Int(5)]), Value::Int(-5));
        assert_eq!(ok("-", vec![Value::Int(5), Value::Int(2)]), Value::Int(3));
        assert_eq!(ok("*", vec![Value::Int(2), Value::Int(3), Value::Int(4)]), Value::Int(24));
        assert_eq!(ok("/", vec![Value::Int(7), Value::Int(2)]), Value::Float(3.5));
        assert!(call("-", vec![]).is_err());
        assert!(call("+", vec![Value::Int(1), "x".into()]).is_err());
    }

    #[test]
    fn comparisons() {
        assert_eq!(ok("=", vec![Value::Int(1), 1.0.into()]), Value::Bool(true));
        assert_eq!(ok("<", vec![Value::Int(1), Value::Int(2)]), Value::Bool(true));
        assert_eq!(ok(">", vec![Value::Int(1), Value::Int(2)]), Value::Bool(false));
        let err = call(">", vec!["a".into(), Value::Int(1)]).unwrap_err();
        assert!(err.starts_with("'>' not supported"), "{err}");
    }

    #[test]
    fn constructors() {
        assert_eq!(ok("list", vec![Value::Int(1), "a".into()]), lit("[1, 'a']"));
        assert_eq!(ok("dict", vec!["a".into(), Value::Int(1), "b".into(), Value::Int(2)]), lit("{'a': 1, 'b': 2}"));
        assert!(call("dict", vec!["a".into()]).is_err());
    }

    #[test]
    fn control() {
        assert_eq!(ok("if", vec![true.into(), "y".into(), "n".into()]), Value::str("y"));
        assert_eq!(ok("if", vec![Value::Int(0), "y".into()]), Value::Null);
        assert_eq!(ok("when", vec![true.into(), Value::Int(1), Value::Int(2)]), Value::Int(2));
        assert_eq!(ok("when", vec![false.into(), Value::Int(1)]), Value::Null);
        let clauses = vec![lit("[False, 'a']"), lit("[True, 'b']"), lit("[True, 'c']")];
        assert_eq!(ok("cond", clauses), Value::str("b"));
        assert_eq!(ok("cond", vec![lit("[0, 'a']")]), Value::Null);
    }

    #[test]
    fn map_with_function_and_key() {
        assert_eq!(ok("map", vec![func("upper"), lit("['a', 'b']")]), lit("['A', 'B']"));
        assert_eq!(
            ok("map", vec!["name".into(), lit("[{'name': 'x'}, {'id': 1}]")]),
            lit("['x', None]")
        );
        assert!(call("map", vec![Value::Int(1), lit("[1]")]).is_err());
    }

    #[test]
    fn filter_with_function_and_key() {
        let plugin = Value::Func(Callable::plugin("odd", |args| {
            Ok(Value::Bool(args[0].as_int().unwrap_or(0) % 2 == 1))
        }));
        assert_eq!(ok("filter", vec![plugin, lit("[1, 2, 3]")]), lit("[1, 3]"));
        assert_eq!(
            ok("filter", vec!["on".into(), lit("[{'on': True, 'n': 1}, {'on': False}, 'x']")]),
            lit("[{'on': True, 'n': 1}]")
        );
    }

    #[test]
    fn select_and_get() {
        let data = lit("{'a': 1}");
        assert_eq!(ok("select", vec![data.clone(), "a".into()]), Value::Int(1));
        assert_eq!(ok("select", vec![data.clone(), "b".into()]), Value::Null);
        assert_eq!(ok("get", vec![data.clone(), "b".into(), Value::Int(42)]), Value::Int(42));
        assert_eq!(ok("get", vec!["text".into(), "b".into()]), Value::Null);
    }

    #[test]
    fn length_and_views() {
        assert_eq!(ok("length", vec![lit("[1, 2, 3]")]), Value::Int(3));
        assert_eq!(ok("length", vec!["héllo".into()]), Value::Int(5));
        assert!(call("length", vec![Value::Int(3)]).is_err());
        let data = lit("{'a': 1, 'b': 2}");
        assert_eq!(ok("keys", vec![data.clone()]), lit("['a', 'b']"));
        assert_eq!(ok("values", vec![data]), lit("[1, 2]"));
        assert_eq!(ok("keys", vec![lit("[1]")]), lit("[]"));
    }

    #[test]
    fn sort_reverse_flatten() {
        assert_eq!(ok("sort", vec![lit("[3, 1, 2]")]), lit("[1, 2, 3]"));
        assert_eq!(ok("sort", vec!["cab".into()]), lit("['a', 'b', 'c']"));
        assert!(call("sort", vec![lit("[1, 'a']")]).is_err());
        assert_eq!(ok("reverse", vec![lit("[1, 2, 3]")]), lit("[3, 2, 1]"));
        assert_eq!(ok("flatten", vec![lit("[[1, 2], 3, [[4]]]")]), lit("[1, 2, 3, [4]]"));
    }

    #[test]
    fn group_by_key() {
        let data = lit("[{'k': 'a', 'n': 1}, {'k': 'b', 'n': 2}, {'k': 'a', 'n': 3}]");
        let grouped = ok("group_by", vec!["k".into(), data]);
        assert_eq!(
            grouped,
            lit("{'a': [{'k': 'a', 'n': 1}, {'k': 'a', 'n': 3}], 'b': [{'k': 'b', 'n': 2}]}")
        );
    }

    #[test]
    fn group_by_incomparable_keys_keeps_input_order() {
        let data = lit("[{'k': 2}, {'k': 'x'}, {'k': 2}]");
        let grouped = ok("group_by", vec!["k".into(), data]);
        assert_eq!(grouped, lit("{'2': [{'k': 2}, {'k': 2}], 'x': [{'k': 'x'}]}"));
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        assert_eq!(ok("unique", vec![lit("[3, 1, 3, 2, 1]")]), lit("[3, 1, 2]"));
        assert!(call("unique", vec![lit("[[1], [1]]")]).is_err());
    }

    #[test]
    fn string_utilities() {
        assert_eq!(ok("concat", vec!["a".into(), Value::Int(1), Value::Null]), Value::str("a1None"));
        assert_eq!(ok("upper", vec!["abc".into()]), Value::str("ABC"));
        assert_eq!(ok("lower", vec!["ABC".into()]), Value::str("abc"));
        assert_eq!(ok("strip", vec!["  x  ".into()]), Value::str("x"));
        assert_eq!(ok("replace", vec!["a-b".into(), "-".into(), "+".into()]), Value::str("a+b"));
        assert_eq!(ok("split", vec!["a  b c".into()]), lit("['a', 'b', 'c']"));
        assert_eq!(ok("split", vec!["a,b".into(), ",".into()]), lit("['a', 'b']"));
        assert!(call("split", vec!["a".into(), "".into()]).is_err());
        assert_eq!(ok("join", vec!["-".into(), lit("[1, 'b']")]), Value::str("1-b"));
        assert_eq!(ok("default", vec!["".into(), "d".into()]), Value::str("d"));
        assert_eq!(ok("default", vec!["v".into(), "d".into()]), Value::str("v"));
    }

    #[test]
    fn env_lookup() {
        assert_eq!(ok("env", vec!["HOME".into()]), Value::str("/home/me"));
        assert_eq!(ok("env", vec!["NOPE".into()]), Value::str(""));
        assert_eq!(ok("env", vec!["NOPE".into(), "fallback".into()]), Value::str("fallback"));
    }

    #[test]
    fn templates_use_call_context() {
        let env = MapEnv::new();
        let ctx = match lit("{'x': 'v', 'a': {'b': 'w'}}") {
            Value::Map(m) => ContextResolver::new(m),
            _ => unreachable!(),
        };
        let call = CallEnv::new(&env).with_context(&ctx);
        assert_eq!(py_template(&[Value::str("{x}"), Value::str("and"), Value::str("{x}")], &call), Ok(Value::str("v and v")));
        assert_eq!(js_template(&[Value::str("${x}/y")], &call), Ok(Value::str("v/y")));
        assert_eq!(go_template(&[Value::str("{{ .a.b }}")], &call), Ok(Value::str("w")));
    }

    #[test]
    fn templates_without_context() {
        assert_eq!(ok("f", vec!["{x}".into()]), Value::str("x"));
    }
}
