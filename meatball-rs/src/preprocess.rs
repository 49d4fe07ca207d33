//! Document preprocessor.
//!
//! One pass over a document tree, replacing macro nodes with their values.
//! Recognised macro forms, checked in this order for a string scalar:
//!
//! | Form                 | Example                        |
//! |----------------------|--------------------------------|
//! | literal escape       | `*(not a macro)`               |
//! | engine prefix        | `js:${host}/app.js`            |
//! | expression prefix    | `expr:'(+ x 3)'`               |
//! | parenthesised        | `(concat base "/app.js")`      |
//!
//! and for containers:
//!
//! | Form                 | Example                        |
//! |----------------------|--------------------------------|
//! | inline mapping       | `{go: "{{ .a.b }}"}`           |
//! | sequence             | `[sexpr, "(+ 1 2)"]`           |
//!
//! Everything else is returned exactly as it came in.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::context::ContextResolver;
use crate::error::{EvalError, PreprocessError};
use crate::registry::MacroRegistry;
use crate::stack::ensure_sufficient_stack;
use crate::template::strip_quotes;
use crate::value::{Map, Value};

/// Context key holding the raw text of the document being processed.
pub const ORIGINAL_YAML_KEY: &str = "_original_yaml";

/// Engine prefixes recognised on string scalars.
const TEMPLATE_PREFIXES: [&str; 3] = ["py", "js", "go"];

pub struct Preprocessor {
    registry: Arc<MacroRegistry>,
}

impl Default for Preprocessor {
    /// A preprocessor over the process-wide registry.
    fn default() -> Self {
        Self::new(MacroRegistry::shared())
    }
}

impl Preprocessor {
    pub fn new(registry: Arc<MacroRegistry>) -> Self {
        Preprocessor { registry }
    }

    pub fn registry(&self) -> &MacroRegistry {
        &self.registry
    }

    /// Parse `text` as YAML and expand its macros.
    ///
    /// The raw text is stored in `context` under [`ORIGINAL_YAML_KEY`] and a
    /// top-level mapping is merged into `context` before the pass, so
    /// expressions can refer to sibling keys.
    pub fn process_yaml(
        &self,
        text: &str,
        context: &mut ContextResolver,
    ) -> Result<Value, PreprocessError> {
        context.set(ORIGINAL_YAML_KEY, text);
        let document: serde_yaml::Value = serde_yaml::from_str(text)?;
        let document = Value::from(document);
        if let Value::Map(top) = &document {
            context.update(top.clone());
        }
        Ok(self.process_value(document, context)?)
    }

    /// Read and process a YAML file.
    pub fn process_yaml_file(
        &self,
        path: impl AsRef<Path>,
        context: &mut ContextResolver,
    ) -> Result<Value, PreprocessError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PreprocessError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.process_yaml(&text, context)
    }

    /// Expand the macros in an already-parsed tree.
    pub fn process_value(&self, value: Value, context: &ContextResolver) -> Result<Value, EvalError> {
        ensure_sufficient_stack(|| match value {
            Value::Str(s) => self.process_string(s, context),
            Value::List(items) => self.process_sequence(items, context),
            Value::Map(map) => self.process_mapping(map, context),
            other => Ok(other),
        })
    }

    fn process_sequence(&self, items: Vec<Value>, context: &ContextResolver) -> Result<Value, EvalError> {
        if let [Value::Str(engine), expression, ..] = items.as_slice() {
            if self.registry.has_engine(engine) {
                debug!(engine = %engine, "sequence macro");
                return self.registry.evaluate_macro(engine, &expression.to_string(), context);
            }
        }
        items
            .into_iter()
            .map(|item| self.process_value(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List)
    }

    fn process_mapping(&self, map: Map, context: &ContextResolver) -> Result<Value, EvalError> {
        if map.len() == 1 {
            if let Some((engine, Value::Str(expression))) = map.first() {
                if self.registry.has_engine(engine) {
                    debug!(engine = %engine, "inline mapping macro");
                    return self.registry.evaluate_macro(engine, expression.trim(), context);
                }
            }
        }
        let mut out = Map::with_capacity(map.len());
        for (key, val) in map {
            let processed = match val {
                Value::Str(expression) if self.registry.has_engine(&key) => {
                    debug!(engine = %key, "inline pair macro");
                    self.registry.evaluate_macro(&key, expression.trim(), context)?
                }
                other => self.process_value(other, context)?,
            };
            out.insert(key, processed);
        }
        Ok(Value::Map(out))
    }

    fn process_string(&self, raw: String, context: &ContextResolver) -> Result<Value, EvalError> {
        let s = raw.trim();
        if s.starts_with('*') {
            return Ok(Value::Str(raw));
        }
        if let Some(rest) = s.strip_prefix("expr:") {
            let expression = strip_quotes(rest.trim());
            debug!(expression, "expr prefix");
            return self.registry.evaluate_sexpr(expression, context);
        }
        for engine in TEMPLATE_PREFIXES {
            let Some(rest) = s.strip_prefix(engine).and_then(|r| r.strip_prefix(':')) else {
                continue;
            };
            debug!(engine, "prefix macro");
            return self.registry.evaluate_macro(engine, rest.trim(), context);
        }
        if s.starts_with('(') && s.ends_with(')') {
            debug!(expression = s, "expression macro");
            return self.registry.evaluate_sexpr(s, context);
        }
        Ok(Value::Str(raw))
    }
}

/// [`Preprocessor::process_yaml`] with the process-wide registry.
pub fn process_yaml(text: &str, context: &mut ContextResolver) -> Result<Value, PreprocessError> {
    Preprocessor::default().process_yaml(text, context)
}

/// [`Preprocessor::process_value`] with the process-wide registry.
pub fn process_value(value: Value, context: &ContextResolver) -> Result<Value, EvalError> {
    Preprocessor::default().process_value(value, context)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::parse_literal;

    fn run(src: &str) -> Value {
        let mut ctx = ContextResolver::default();
        process_yaml(src, &mut ctx).unwrap()
    }

    fn lit(src: &str) -> Value {
        parse_literal(src).unwrap()
    }

    #[test]
    fn plain_documents_unchanged() {
        assert_eq!(
            run("a: 1\nb: [x, y]\nc: {d: hello world}\n"),
            lit("{'a': 1, 'b': ['x', 'y'], 'c': {'d': 'hello world'}}")
        );
    }

    #[test]
    fn literal_escape() {
        assert_eq!(run("a: '*(+ 1 2)'\n"), lit("{'a': '*(+ 1 2)'}"));
    }

    #[test]
    fn non_macro_strings_keep_whitespace() {
        let ctx = ContextResolver::default();
        let v = process_value(Value::str("  padded  "), &ctx).unwrap();
        assert_eq!(v, Value::str("  padded  "));
    }

    #[test]
    fn parenthesised_expression() {
        assert_eq!(run("x: 2\ny: (+ x 3)\n"), lit("{'x': 2, 'y': 5}"));
    }

    #[test]
    fn expr_prefix_strips_quotes() {
        assert_eq!(run("x: 2\ny: \"expr:'(+ x 3)'\"\n"), lit("{'x': 2, 'y': 5}"));
    }

    #[test]
    fn template_prefixes() {
        let doc = "name: ann\na: 'py:hi {name}'\nb: 'js:${name}/x'\n";
        assert_eq!(run(doc), lit("{'name': 'ann', 'a': 'hi ann', 'b': 'ann/x'}"));
    }

    #[test]
    fn inline_mapping_replaced() {
        let doc = "a: {b: v}\nout: {go: '{{ .a.b }}/y'}\n";
        assert_eq!(run(doc), lit("{'a': {'b': 'v'}, 'out': 'v/y'}"));
    }

    #[test]
    fn inline_pair_in_larger_mapping() {
        let doc = "who: x\nout: {js: 'hi ${who}', keep: 1}\n";
        assert_eq!(run(doc), lit("{'who': 'x', 'out': {'js': 'hi x', 'keep': 1}}"));
    }

    #[test]
    fn sequence_form() {
        assert_eq!(run("v: [sexpr, '(* 6 7)']\n"), lit("{'v': 42}"));
        let v = run("v: [util, upper]\n");
        assert_eq!(v.as_map().unwrap()["v"].type_name(), "function");
    }

    #[test]
    fn single_engine_name_sequence_is_plain_list() {
        assert_eq!(run("langs: [go]\n"), lit("{'langs': ['go']}"));
        assert_eq!(run("engines: [sexpr]\n"), lit("{'engines': ['sexpr']}"));
    }

    #[test]
    fn unknown_engine_in_sequence_is_plain_list() {
        assert_eq!(run("v: [nope, x]\n"), lit("{'v': ['nope', 'x']}"));
    }

    #[test]
    fn runtime_errors_are_embedded() {
        let v = run("v: (/ 1 0)\n");
        assert_eq!(v, lit("{'v': 'S-expression error: /: division by zero'}"));
    }

    #[test]
    fn unknown_function_aborts() {
        let mut ctx = ContextResolver::default();
        let err = process_yaml("v: (no_such_function 1)\n", &mut ctx).unwrap_err();
        assert!(matches!(err, PreprocessError::Eval(EvalError::UnknownFunction(_))));
    }

    #[test]
    fn unbalanced_expression_aborts() {
        let mut ctx = ContextResolver::default();
        let err = process_yaml("v: (+ 1 (2)\n", &mut ctx);
        assert!(err.is_err());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let mut ctx = ContextResolver::default();
        let err = process_yaml("a: [unclosed\n", &mut ctx).unwrap_err();
        assert!(err.to_string().starts_with("YAML parse error"));
    }

    #[test]
    fn original_text_recorded() {
        let src = "a: (+ 1 1)\n";
        let mut ctx = ContextResolver::default();
        process_yaml(src, &mut ctx).unwrap();
        assert_eq!(ctx.get(ORIGINAL_YAML_KEY), Some(&Value::str(src)));
        assert_eq!(ctx.get("a"), Some(&Value::str("(+ 1 1)")));
    }
}
