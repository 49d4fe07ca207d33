//! Structured-literal reader.
//!
//! Macro expressions carry containers as plain text: `"{'a': 1}"`,
//! `"[1, 2, 3]"`, `"'key'"`.  This module turns such text into a [`Value`],
//! accepting the literal dialect config authors tend to write
//! (`True`/`False`/`None`, tuples, single-quoted strings) as well as the JSON
//! keywords `true`/`false`/`null`.
//!
//! Only literals are recognised; anything else (bare words, operators,
//! calls) is rejected with [`LiteralError`].

use thiserror::Error;

use crate::value::{Map, Value};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("malformed literal at offset {offset}: {message}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Parse `src` as a single literal, surrounding whitespace allowed.
pub fn parse_literal(src: &str) -> Result<Value, LiteralError> {
    let mut reader = Reader { src: src.as_bytes(), text: src, pos: 0 };
    reader.skip_ws();
    let value = reader.value()?;
    reader.skip_ws();
    if reader.pos != reader.src.len() {
        return Err(reader.error("trailing characters"));
    }
    Ok(value)
}

/// `true` when `s` is bracketed like a container literal (`{…}` or `[…]`).
pub fn looks_like_container(s: &str) -> bool {
    let t = s.trim();
    (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']'))
}

struct Reader<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl Reader<'_> {
    fn error(&self, message: &str) -> LiteralError {
        LiteralError { offset: self.pos, message: message.to_owned() }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Result<Value, LiteralError> {
        crate::stack::ensure_sufficient_stack(|| self.value_inner())
    }

    fn value_inner(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'[') => {
                self.pos += 1;
                Ok(Value::List(self.sequence(b']')?))
            }
            Some(b'(') => {
                self.pos += 1;
                Ok(Value::List(self.sequence(b')')?))
            }
            Some(b'{') => {
                self.pos += 1;
                self.mapping()
            }
            Some(q @ (b'\'' | b'"')) => {
                self.pos += 1;
                self.string(q).map(Value::Str)
            }
            Some(b'-' | b'+' | b'.' | b'0'..=b'9') => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.keyword(),
            Some(_) => Err(self.error("unexpected character")),
        }
    }

    fn sequence(&mut self, close: u8) -> Result<Vec<Value>, LiteralError> {
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.value()?);
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            if self.eat(close) {
                return Ok(items);
            }
            return Err(self.error("expected ',' or closing bracket"));
        }
    }

    fn mapping(&mut self) -> Result<Value, LiteralError> {
        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.eat(b'}') {
                return Ok(Value::Map(map));
            }
            let key = self.value()?;
            self.skip_ws();
            if !self.eat(b':') {
                return Err(self.error("expected ':' after key"));
            }
            self.skip_ws();
            let value = self.value()?;
            map.insert(key.to_string(), value);
            self.skip_ws();
            if self.eat(b',') {
                continue;
            }
            if self.eat(b'}') {
                return Ok(Value::Map(map));
            }
            return Err(self.error("expected ',' or '}'"));
        }
    }

    fn string(&mut self, quote: u8) -> Result<String, LiteralError> {
        let mut out = String::new();
        let mut chars = self.text[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, '0')) => out.push('\0'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                c if c as u32 == quote as u32 => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                c => out.push(c),
            }
        }
        self.pos = self.src.len();
        Err(self.error("unterminated string"))
    }

    fn number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b'0'..=b'9' | b'.' | b'e' | b'E' | b'_'))
            || (matches!(self.peek(), Some(b'-' | b'+'))
                && matches!(self.src.get(self.pos - 1), Some(b'e' | b'E')))
        {
            self.pos += 1;
        }
        let text: String = self.text[start..self.pos].chars().filter(|&c| c != '_').collect();
        if let Ok(n) = text.parse::<i64>() {
            return Ok(Value::Int(n));
        }
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| LiteralError { offset: start, message: format!("invalid number '{text}'") })
    }

    fn keyword(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'_') {
            self.pos += 1;
        }
        match &self.text[start..self.pos] {
            "True" | "true" => Ok(Value::Bool(true)),
            "False" | "false" => Ok(Value::Bool(false)),
            "None" | "null" => Ok(Value::Null),
            word => Err(LiteralError { offset: start, message: format!("'{word}' is not a literal") }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
