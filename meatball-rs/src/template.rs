//! Template engines: `{name}` substitution in three surface syntaxes.
//!
//! | Syntax | Placeholder            | Rewritten to      |
//! |--------|------------------------|-------------------|
//! | `py`   | `{name}`               | (unchanged)       |
//! | `js`   | `${name}`              | `{name}`          |
//! | `go`   | `{{ .outer.inner }}`   | `{outer[inner]}`  |
//!
//! After rewriting, every `{…}` span is resolved through the
//! [`ContextResolver`].  `{{` and `}}` are literal braces.  A placeholder
//! whose content continues past the variable with a `/` (as in
//! `{user[name]}/static/app.js`) resolves only the variable prefix and keeps
//! the rest verbatim.
//!
//! Rendering never fails: malformed templates produce a
//! `Template error: …` string.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::context::ContextResolver;

static JS_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"));

static GO_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*\.([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\s*\}\}").expect("static regex")
});

static VARIABLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+(?:\[[^\]]+\])*(?:\.[A-Za-z0-9_]+)*").expect("static regex")
});

/// Malformed template text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Single '{{' encountered in format string")]
    UnclosedBrace,
    #[error("Single '}}' encountered in format string")]
    StrayBrace,
    #[error("Empty placeholder in format string")]
    EmptyPlaceholder,
}

/// Placeholder dialect of a template engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSyntax {
    Py,
    Js,
    Go,
}

impl TemplateSyntax {
    pub fn name(self) -> &'static str {
        match self {
            TemplateSyntax::Py => "py",
            TemplateSyntax::Js => "js",
            TemplateSyntax::Go => "go",
        }
    }

    /// Strip one layer of surrounding quotes and rewrite placeholders into
    /// `{…}` form.
    pub fn convert<'a>(self, template: &'a str) -> Cow<'a, str> {
        let template = strip_quotes(template);
        match self {
            TemplateSyntax::Py => Cow::Borrowed(template),
            TemplateSyntax::Js => JS_PLACEHOLDER.replace_all(template, "{$1}"),
            TemplateSyntax::Go => GO_PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
                let path: Vec<&str> = caps[1].split('.').collect();
                match path.as_slice() {
                    [outer, inner] => format!("{{{outer}[{inner}]}}"),
                    _ => format!("{{{}}}", &caps[1]),
                }
            }),
        }
    }

    /// Convert and substitute; errors become `Template error: …`.
    pub fn render(self, template: &str, resolver: &ContextResolver) -> String {
        let converted = self.convert(template);
        substitute(&converted, resolver).unwrap_or_else(|e| format!("Template error: {e}"))
    }
}

/// Remove one matching pair of `"` or `'` around `s`.
pub fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return &s[1..s.len() - 1];
        }
    }
    s
}

// ── Substitution ──────────────────────────────────────────────────────────────

/// Replace every `{…}` placeholder in `template` with its resolved value.
pub fn substitute(template: &str, resolver: &ContextResolver) -> Result<String, TemplateError> {
    scan(template, |content| {
        if content.is_empty() {
            return Err(TemplateError::EmptyPlaceholder);
        }
        Ok(resolve_placeholder(content, resolver))
    })
}

/// Lenient interpolation used for string atoms inside expressions: only
/// `{name}` spans naming something in the context are replaced.  Anything
/// else, including malformed braces, is left exactly as written.
pub fn interpolate<'a>(text: &'a str, resolver: &ContextResolver) -> Cow<'a, str> {
    if !text.contains('{') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let preceded_by_dollar = out.ends_with('$');
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' && close > 0 && !preceded_by_dollar => {
                let name = &after[..close];
                match resolver.lookup(name) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn resolve_placeholder(content: &str, resolver: &ContextResolver) -> String {
    if !content.contains('/') {
        return resolver.resolve_value(content).to_string();
    }
    let split_at = VARIABLE_PREFIX
        .find(content)
        .map(|m| m.end())
        .filter(|&end| end > 0)
        .or_else(|| content.find('/'))
        .unwrap_or(content.len());
    let (variable, suffix) = content.split_at(split_at);
    match resolver.resolve(variable) {
        Ok(value) => format!("{value}{suffix}"),
        Err(e) => e.to_string(),
    }
}

/// Walk `template`, handing each placeholder body to `on_placeholder`.
/// `{{`/`}}` produce literal braces.
fn scan<F>(template: &str, mut on_placeholder: F) -> Result<String, TemplateError>
where
    F: FnMut(&str) -> Result<String, TemplateError>,
{
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(TemplateError::StrayBrace),
            '{' => {
                let body_start = i + 1;
                let close = template[body_start..]
                    .find('}')
                    .map(|rel| body_start + rel)
                    .ok_or(TemplateError::UnclosedBrace)?;
                out.push_str(&on_placeholder(&template[body_start..close])?);
                while matches!(chars.peek(), Some((j, _)) if *j <= close) {
                    chars.next();
                }
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::parse_literal;
    use crate::value::Value;

    fn resolver(src: &str) -> ContextResolver {
        match parse_literal(src).unwrap() {
            Value::Map(m) => ContextResolver::new(m),
            other => panic!("not a map: {other:?}"),
        }
    }

    #[test]
    fn py_placeholders() {
        let r = resolver("{'name': 'World', 'n': 3}");
        assert_eq!(TemplateSyntax::Py.render("Hello {name} x{n}", &r), "Hello World x3");
    }

    #[test]
    fn surrounding_quotes_stripped() {
        let r = resolver("{'x': 'v'}");
        assert_eq!(TemplateSyntax::Py.render("\"{x}\"", &r), "v");
        assert_eq!(TemplateSyntax::Js.render("'${x}'", &r), "v");
    }

    #[test]
    fn js_placeholders() {
        let r = resolver("{'x': 'v'}");
        assert_eq!(TemplateSyntax::Js.render("${x}/y", &r), "v/y");
    }

    #[test]
    fn js_bracket_path_with_suffix() {
        let r = resolver("{'session': {'PLANTANGENET': 'foo'}}");
        assert_eq!(
            TemplateSyntax::Js.render("${session[PLANTANGENET]}/scripts/check_local.js", &r),
            "foo/scripts/check_local.js"
        );
    }

    #[test]
    fn go_placeholders() {
        let r = resolver("{'a': {'b': 'v'}, 'top': 't', 'x': {'y': {'z': 1}}}");
        assert_eq!(TemplateSyntax::Go.render("{{ .a.b }}/y", &r), "v/y");
        assert_eq!(TemplateSyntax::Go.render("{{.top}}", &r), "t");
        assert_eq!(TemplateSyntax::Go.render("{{ .x.y.z }}", &r), "1");
    }

    #[test]
    fn suffix_kept_after_variable_prefix() {
        let r = resolver("{'user': {'name': 'ann'}}");
        assert_eq!(
            TemplateSyntax::Py.render("{user[name]}/static/app.js", &r),
            "ann/static/app.js"
        );
        assert_eq!(TemplateSyntax::Py.render("{user.name}/x", &r), "ann/x");
    }

    #[test]
    fn resolution_errors_are_substituted() {
        let r = resolver("{'user': {}}");
        assert_eq!(
            TemplateSyntax::Py.render("id={user.id}", &r),
            "id=Error: cannot resolve 'user.id'"
        );
    }

    #[test]
    fn unknown_names_pass_through() {
        let r = ContextResolver::default();
        assert_eq!(TemplateSyntax::Py.render("{missing}", &r), "missing");
    }

    #[test]
    fn escaped_braces() {
        let r = resolver("{'x': 1}");
        assert_eq!(TemplateSyntax::Py.render("{{x}} = {x}", &r), "{x} = 1");
    }

    #[test]
    fn malformed_templates() {
        let r = ContextResolver::default();
        assert_eq!(
            TemplateSyntax::Py.render("a } b", &r),
            "Template error: Single '}' encountered in format string"
        );
        assert_eq!(
            TemplateSyntax::Py.render("a { b", &r),
            "Template error: Single '{' encountered in format string"
        );
        assert!(TemplateSyntax::Py.render("{}", &r).starts_with("Template error:"));
    }

    #[test]
    fn interpolation_is_lenient() {
        let r = resolver("{'name': 'ann'}");
        assert_eq!(interpolate("hi {name}", &r), "hi ann");
        assert_eq!(interpolate("{nope} ${name} {", &r), "{nope} ${name} {");
        assert_eq!(interpolate("plain", &r), "plain");
    }
}
