//! Runtime value type for macro evaluation, doubling as the document node.
//!
//! Documents arrive as YAML/JSON trees and leave the same way; in between,
//! every scalar, sequence and mapping is a [`Value`].  Expressions can also
//! produce first-class functions ([`Value::Func`]), which only ever appear in
//! evaluation results, never in parsed input.
//!
//! The coercions here (truthiness, stringification, loose equality, ordering)
//! follow the dynamic semantics that macro authors write against: `None` and
//! `True` print the way they do, `1 == 1.0`, strings sort lexically, and
//! lists compare element-wise.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::expr::function::Callable;

/// Insertion-ordered mapping with string keys.
pub type Map = IndexMap<String, Value>;

/// A macro-language runtime value / document node.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Map),
    Func(Callable),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            other => other.write_repr(f),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality.  Numbers of different variants are *not* equal
    /// here; use [`Value::loose_eq`] for the `=` built-in.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a.name() == b.name(),
            _ => false,
        }
    }
}

impl Value {
    /// Shorthand for building a string value.
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Truthiness: `null`, `false`, zero, and empty containers are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Func(_) => true,
        }
    }

    /// Name of the type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
            Value::Func(_) => "function",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render as a quoted representation (strings in single quotes), the form
    /// used for elements nested inside lists and maps.
    pub fn repr(&self) -> String {
        struct Repr<'a>(&'a Value);
        impl fmt::Display for Repr<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.write_repr(f)
            }
        }
        Repr(self).to_string()
    }

    fn write_repr(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("None"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write_float(*x, f),
            Value::Str(s) => write_quoted(s, f),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.write_repr(f)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(k, f)?;
                    f.write_str(": ")?;
                    v.write_repr(f)?;
                }
                f.write_str("}")
            }
            Value::Func(func) => write!(f, "<function {}>", func.name()),
        }
    }

    // ── Numeric helpers ───────────────────────────────────────────────────────

    /// Numeric view: booleans count as integers, everything else is `None`.
    fn numeric(&self) -> Option<Num> {
        match self {
            Value::Bool(b) => Some(Num::Int(*b as i64)),
            Value::Int(n) => Some(Num::Int(*n)),
            Value::Float(x) => Some(Num::Float(*x)),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        self.numeric().is_some()
    }

    /// Coerce to `f64` when the value is numeric.
    pub fn as_float(&self) -> Option<f64> {
        self.numeric().map(Num::to_f64)
    }

    /// Coerce to `i64` when the value is an integer (or boolean).
    pub fn as_int(&self) -> Option<i64> {
        match self.numeric()? {
            Num::Int(n) => Some(n),
            Num::Float(_) => None,
        }
    }

    pub fn arith_add(&self, rhs: &Value) -> Result<Value, String> {
        match (self.numeric(), rhs.numeric()) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a
                .checked_add(b)
                .map(Value::Int)
                .ok_or_else(|| "integer overflow".to_owned()),
            (Some(a), Some(b)) => Ok(Value::Float(a.to_f64() + b.to_f64())),
            _ => Err(unsupported("+", self, rhs)),
        }
    }

    pub fn arith_sub(&self, rhs: &Value) -> Result<Value, String> {
        match (self.numeric(), rhs.numeric()) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a
                .checked_sub(b)
                .map(Value::Int)
                .ok_or_else(|| "integer overflow".to_owned()),
            (Some(a), Some(b)) => Ok(Value::Float(a.to_f64() - b.to_f64())),
            _ => Err(unsupported("-", self, rhs)),
        }
    }

    /// Multiplication; a string or list times an integer repeats it.
    pub fn arith_mul(&self, rhs: &Value) -> Result<Value, String> {
        match (self, rhs) {
            (Value::Str(s), n) | (n, Value::Str(s)) if n.as_int().is_some() => {
                let count = repeat_count(n, s.len(), "string")?;
                return Ok(Value::Str(s.repeat(count)));
            }
            (Value::List(items), n) | (n, Value::List(items)) if n.as_int().is_some() => {
                let count = repeat_count(n, items.len(), "list")?;
                let mut out = Vec::with_capacity(items.len() * count);
                for _ in 0..count {
                    out.extend(items.iter().cloned());
                }
                return Ok(Value::List(out));
            }
            _ => {}
        }
        match (self.numeric(), rhs.numeric()) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a
                .checked_mul(b)
                .map(Value::Int)
                .ok_or_else(|| "integer overflow".to_owned()),
            (Some(a), Some(b)) => Ok(Value::Float(a.to_f64() * b.to_f64())),
            _ => Err(unsupported("*", self, rhs)),
        }
    }

    /// True division: the result is always a float.
    pub fn arith_div(&self, rhs: &Value) -> Result<Value, String> {
        match (self.numeric(), rhs.numeric()) {
            (Some(a), Some(b)) => {
                let b = b.to_f64();
                if b == 0.0 {
                    return Err("division by zero".into());
                }
                Ok(Value::Float(a.to_f64() / b))
            }
            _ => Err(unsupported("/", self, rhs)),
        }
    }

    pub fn arith_neg(&self) -> Result<Value, String> {
        match self.numeric() {
            Some(Num::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| "integer overflow".to_owned()),
            Some(Num::Float(x)) => Ok(Value::Float(-x)),
            None => Err(format!("bad operand type for unary -: '{}'", self.type_name())),
        }
    }

    // ── Comparison ────────────────────────────────────────────────────────────

    /// Equality as seen by the `=` built-in: numbers compare by value across
    /// int/float/bool, containers compare element-wise with the same rule.
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.loose_eq(w)))
            }
            _ => match (self.numeric(), rhs.numeric()) {
                (Some(a), Some(b)) => a.to_f64() == b.to_f64(),
                _ => self == rhs,
            },
        }
    }

    /// Ordering between comparable values: numbers, strings, and lists of
    /// comparable values.  Anything else is an error naming both types.
    pub fn try_cmp(&self, rhs: &Value) -> Result<Ordering, String> {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.try_cmp(y)? {
                        Ordering::Equal => continue,
                        other => return Ok(other),
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => match (self.numeric(), rhs.numeric()) {
                (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a.cmp(&b)),
                (Some(a), Some(b)) => Ok(a
                    .to_f64()
                    .partial_cmp(&b.to_f64())
                    .unwrap_or(Ordering::Equal)),
                _ => Err(format!(
                    "'<' not supported between instances of '{}' and '{}'",
                    self.type_name(),
                    rhs.type_name()
                )),
            },
        }
    }
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn to_f64(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(x) => x,
        }
    }
}

/// Upper bound on the length of a repeated string or list.
const MAX_REPEAT_LEN: usize = 1 << 20;

/// Validate `n` as a repeat count for something of length `len`.  Empty
/// operands always repeat zero times.
fn repeat_count(n: &Value, len: usize, what: &str) -> Result<usize, String> {
    let count = usize::try_from(n.as_int().unwrap_or(0).max(0)).unwrap_or(usize::MAX);
    if len == 0 {
        return Ok(0);
    }
    match len.checked_mul(count) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(count),
        _ => Err(format!("repeated {what} is too long")),
    }
}

fn unsupported(op: &str, lhs: &Value, rhs: &Value) -> String {
    format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        lhs.type_name(),
        rhs.type_name()
    )
}

/// Floats always keep a fractional part (`2.0`, not `2`); very large and very
/// small magnitudes switch to exponent form.
fn write_float(x: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else if x != 0.0 && !(1e-4..1e16).contains(&x.abs()) {
        write_exponent(x, f)
    } else if x.fract() == 0.0 {
        write!(f, "{x:.1}")
    } else {
        write!(f, "{x}")
    }
}

/// Exponent form with a signed, at least two-digit exponent: `1e+16`,
/// `2.5e-07`.
fn write_exponent(x: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = format!("{x:e}");
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    write!(f, "{mantissa}e{sign}{:02}", exponent.unsigned_abs())
}

fn write_quoted(s: &str, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // Prefer single quotes unless the string contains one and no double quote.
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(map)
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(v: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Y;
        match v {
            Y::Null => Value::Null,
            Y::Bool(b) => Value::Bool(b),
            Y::Number(n) => number_from_parts(n.as_i64(), n.as_f64()),
            Y::String(s) => Value::Str(s),
            Y::Sequence(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Y::Mapping(mapping) => Value::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (yaml_key(k), Value::from(v)))
                    .collect(),
            ),
            Y::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match v {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(b),
            J::Number(n) => number_from_parts(n.as_i64(), n.as_f64()),
            J::String(s) => Value::Str(s),
            J::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            J::Object(obj) => Value::Map(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

fn number_from_parts(int: Option<i64>, float: Option<f64>) -> Value {
    match (int, float) {
        (Some(n), _) => Value::Int(n),
        (None, Some(x)) => Value::Float(x),
        (None, None) => Value::Null,
    }
}

/// Mapping keys are strings; anything else is rendered to its scalar text.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        other => Value::from(other).to_string(),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Func(func) => serializer.serialize_str(&format!("<function {}>", func.name())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_scalars() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Null.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::str("hello").to_string(), "hello");
    }

    #[test]
    fn display_containers_quote_strings() {
        let v = Value::List(vec![Value::str("a"), Value::Int(1)]);
        assert_eq!(v.to_string(), "['a', 1]");
        let mut m = Map::new();
        m.insert("k".into(), Value::str("it's"));
        assert_eq!(Value::Map(m).to_string(), "{'k': \"it's\"}");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::str("0").is_truthy());
        assert!(Value::Float(0.5).is_truthy());
    }

    #[test]
    fn arithmetic() {
        let a = Value::Int(10);
        let b = Value::Int(4);
        assert_eq!(a.arith_add(&b), Ok(Value::Int(14)));
        assert_eq!(a.arith_sub(&b), Ok(Value::Int(6)));
        assert_eq!(a.arith_mul(&b), Ok(Value::Int(40)));
        assert_eq!(a.arith_div(&b), Ok(Value::Float(2.5)));
        assert_eq!(Value::Int(3).arith_add(&Value::Float(0.5)), Ok(Value::Float(3.5)));
    }

    #[test]
    fn arithmetic_type_errors() {
        let err = Value::Int(1).arith_add(&Value::str("x")).unwrap_err();
        assert!(err.contains("'int' and 'str'"), "{err}");
        assert!(Value::Int(1).arith_div(&Value::Int(0)).is_err());
    }

    #[test]
    fn string_repetition() {
        assert_eq!(Value::str("ab").arith_mul(&Value::Int(3)), Ok(Value::str("ababab")));
        assert_eq!(Value::Int(-2).arith_mul(&Value::str("ab")), Ok(Value::str("")));
    }

    #[test]
    fn oversized_repetition_is_an_error() {
        let err = Value::str("ab").arith_mul(&Value::Int(i64::MAX)).unwrap_err();
        assert_eq!(err, "repeated string is too long");
        let list = Value::List(vec![Value::Int(1), Value::Int(2)]);
        let err = list.arith_mul(&Value::Int(i64::MAX)).unwrap_err();
        assert_eq!(err, "repeated list is too long");
        assert_eq!(Value::str("").arith_mul(&Value::Int(i64::MAX)), Ok(Value::str("")));
        assert_eq!(Value::List(vec![]).arith_mul(&Value::Int(i64::MAX)), Ok(Value::List(vec![])));
    }

    #[test]
    fn large_and_small_floats_use_exponent_form() {
        assert_eq!(Value::Float(1e16).to_string(), "1e+16");
        assert_eq!(Value::Float(-2.5e20).to_string(), "-2.5e+20");
        assert_eq!(Value::Float(1e15).to_string(), "1000000000000000.0");
        assert_eq!(Value::Float(2.5e-7).to_string(), "2.5e-07");
        assert_eq!(Value::Float(0.0).to_string(), "0.0");
        assert_eq!(Value::Float(0.001).to_string(), "0.001");
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).loose_eq(&Value::Int(1)));
        assert!(!Value::str("1").loose_eq(&Value::Int(1)));
    }

    #[test]
    fn ordering() {
        assert_eq!(Value::Int(1).try_cmp(&Value::Float(1.5)), Ok(Ordering::Less));
        assert_eq!(Value::str("b").try_cmp(&Value::str("a")), Ok(Ordering::Greater));
        assert!(Value::str("a").try_cmp(&Value::Int(1)).is_err());
    }

    #[test]
    fn from_yaml_stringifies_keys() {
        let y: serde_yaml::Value = serde_yaml::from_str("1: one\nname: x\n").unwrap();
        let v = Value::from(y);
        let m = v.as_map().unwrap();
        assert_eq!(m.get("1"), Some(&Value::str("one")));
        assert_eq!(m.get("name"), Some(&Value::str("x")));
    }

    #[test]
    fn serialize_to_json() {
        let v = Value::List(vec![Value::Int(1), Value::str("a"), Value::Null]);
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"[1,"a",null]"#);
    }
}
