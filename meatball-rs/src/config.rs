//! Run configuration for the `meatball` binary.
//!
//! | Source                | Effect                                         |
//! |-----------------------|------------------------------------------------|
//! | `-c<file>`            | initial context (JSON, or YAML by extension)   |
//! | `-D<name>=<value>`    | context entry; value read as a literal if it   |
//! |                       | parses as one, else kept as text               |
//! | `-a<alias>=<target>`  | resolver alias                                 |
//! | `-o<yaml\|json>`      | output format                                  |
//!
//! Later sources override earlier ones: file, then `-D` in order.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::cli::{CliArgs, Input, OutputFormat};
use crate::context::{Context, ContextResolver};
use crate::literal::parse_literal;
use crate::value::Value;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: invalid YAML: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{path}: context must be a mapping, found {found}")]
    NotAMapping { path: String, found: &'static str },
    #[error("cannot render output: {0}")]
    Output(String),
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Everything one invocation needs, assembled from the command line.
#[derive(Debug, Default)]
pub struct RunConfig {
    pub input: Input,
    pub format: OutputFormat,
    pub debug: bool,
    pub context_file: Option<PathBuf>,
    pub defines: Vec<(String, String)>,
    pub aliases: Vec<(String, String)>,
}

impl From<CliArgs> for RunConfig {
    fn from(args: CliArgs) -> Self {
        RunConfig {
            input: args.input,
            format: args.format,
            debug: args.debug,
            context_file: args.context_file,
            defines: args.defines,
            aliases: args.aliases,
        }
    }
}

impl RunConfig {
    /// Build the initial context: context file, then `-D` definitions, then
    /// aliases.
    pub fn load_context(&self) -> Result<ContextResolver, ConfigError> {
        let context = match &self.context_file {
            Some(path) => load_context_file(path)?,
            None => Context::new(),
        };
        let mut resolver = ContextResolver::new(context);
        for (name, raw) in &self.defines {
            debug!(name = %name, "define");
            resolver.set(name.as_str(), define_value(raw));
        }
        for (alias, target) in &self.aliases {
            resolver.add_alias(alias.as_str(), target.as_str());
        }
        Ok(resolver)
    }

    /// Read the input document.
    pub fn read_input(&self) -> Result<String, ConfigError> {
        match &self.input {
            Input::File(path) => read_file(path),
            Input::Stdin => {
                let mut text = String::new();
                std::io::stdin()
                    .read_to_string(&mut text)
                    .map_err(|source| ConfigError::Io { path: "<stdin>".into(), source })?;
                Ok(text)
            }
        }
    }

    /// Serialise the processed document in the configured format.
    pub fn render(&self, value: &Value) -> Result<String, ConfigError> {
        render(value, self.format)
    }
}

/// Serialise `value` as YAML or pretty JSON (with a trailing newline).
pub fn render(value: &Value, format: OutputFormat) -> Result<String, ConfigError> {
    match format {
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| ConfigError::Output(e.to_string()))
        }
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| ConfigError::Output(e.to_string())),
    }
}

/// Load a context mapping from a JSON file, or YAML for `.yaml`/`.yml`.
pub fn load_context_file(path: &Path) -> Result<Context, ConfigError> {
    let text = read_file(path)?;
    let shown = path.display().to_string();
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    let value = if is_yaml {
        let doc: serde_yaml::Value = serde_yaml::from_str(&text)
            .map_err(|source| ConfigError::Yaml { path: shown.clone(), source })?;
        Value::from(doc)
    } else {
        let doc: serde_json::Value = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Json { path: shown.clone(), source })?;
        Value::from(doc)
    };
    match value {
        Value::Map(map) => Ok(map),
        Value::Null => Ok(Context::new()),
        other => Err(ConfigError::NotAMapping { path: shown, found: other.type_name() }),
    }
}

/// `-D` values: literals (`2`, `[1, 2]`, `{'a': 1}`, `'quoted'`) parse;
/// anything else is text.
pub fn define_value(raw: &str) -> Value {
    parse_literal(raw).unwrap_or_else(|_| Value::str(raw))
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn define_values() {
        assert_eq!(define_value("2"), Value::Int(2));
        assert_eq!(define_value("[1, 2]"), Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(define_value("ann"), Value::str("ann"));
        assert_eq!(define_value("a b"), Value::str("a b"));
    }

    #[test]
    fn json_context_file() {
        let f = temp_file(".json", r#"{"session": {"id": 7}, "name": "x"}"#);
        let ctx = load_context_file(f.path()).unwrap();
        assert_eq!(ctx.get("name"), Some(&Value::str("x")));
    }

    #[test]
    fn yaml_context_file() {
        let f = temp_file(".yaml", "session:\n  id: 7\n");
        let ctx = load_context_file(f.path()).unwrap();
        assert!(ctx.get("session").is_some());
    }

    #[test]
    fn context_must_be_a_mapping() {
        let f = temp_file(".json", "[1, 2]");
        let err = load_context_file(f.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping { found: "list", .. }));
    }

    #[test]
    fn invalid_json_reported() {
        let f = temp_file(".json", "{nope");
        assert!(matches!(load_context_file(f.path()), Err(ConfigError::Json { .. })));
    }

    #[test]
    fn defines_override_file_and_aliases_apply() {
        let f = temp_file(".json", r#"{"x": 1, "session": {"id": 7}}"#);
        let config = RunConfig {
            context_file: Some(f.path().to_path_buf()),
            defines: vec![("x".into(), "5".into())],
            aliases: vec![("sid".into(), "session.id".into())],
            ..RunConfig::default()
        };
        let ctx = config.load_context().unwrap();
        assert_eq!(ctx.get("x"), Some(&Value::Int(5)));
        assert_eq!(ctx.resolve("sid"), Ok(Value::Int(7)));
    }

    #[test]
    fn render_formats() {
        let mut map = Context::new();
        map.insert("a".into(), Value::Int(1));
        let v = Value::Map(map);
        assert_eq!(render(&v, OutputFormat::Yaml).unwrap(), "a: 1\n");
        assert_eq!(render(&v, OutputFormat::Json).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
