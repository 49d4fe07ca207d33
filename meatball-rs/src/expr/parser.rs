//! Expression lexer, AST, and parser.
//!
//! Expressions are s-expressions:
//!
//! ```text
//! (concat "static/" (lower name) '.js')
//! (map upper (list 'a' 'b'))
//! '(1 2 3)
//! ```
//!
//! Tokens are split on whitespace and parenthesis boundaries.  Quoted
//! substrings (`"…"` or `'…'`) are single tokens whose quote characters are
//! kept until atom classification.  A `'` that does not delimit a string is
//! the quote mark, which makes the following form a literal.

use crate::error::ParseError;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen(usize),
    RParen(usize),
    /// Quote mark prefixing a form.
    Quote(usize),
    /// Raw atom text, including any surrounding string quotes.
    Word(String),
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'(' || b == b')'
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer { src, bytes: src.as_bytes(), pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// `"…"` with backslash escapes; the token keeps both quotes.
    fn read_double_quoted(&mut self) -> Result<Token, ParseError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'\\' => self.pos += 1,
                b'"' => return Ok(Token::Word(self.src[start..self.pos].to_owned())),
                _ => {}
            }
        }
        Err(ParseError::UnterminatedString(start))
    }

    /// `'…'` is a string only when the closing quote ends a token; otherwise
    /// the `'` is a quote mark.
    fn read_single_quote(&mut self) -> Token {
        let start = self.pos;
        if self.bytes.get(start + 1) != Some(&b'(') {
            if let Some(rel) = self.src[start + 1..].find('\'') {
                let close = start + 1 + rel;
                let ends_token = self.bytes.get(close + 1).map_or(true, |&b| is_delimiter(b));
                if ends_token {
                    self.pos = close + 1;
                    return Token::Word(self.src[start..self.pos].to_owned());
                }
            }
        }
        self.pos += 1;
        Token::Quote(start)
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if !is_delimiter(b)) {
            self.pos += 1;
        }
        Token::Word(self.src[start..self.pos].to_owned())
    }

    fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_ws();
            let Some(b) = self.peek() else { break };
            let token = match b {
                b'(' => {
                    self.pos += 1;
                    Token::LParen(self.pos - 1)
                }
                b')' => {
                    self.pos += 1;
                    Token::RParen(self.pos - 1)
                }
                b'"' => self.read_double_quoted()?,
                b'\'' => self.read_single_quote(),
                _ => self.read_word(),
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

/// A literal atom.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Atom {
    pub fn to_value(&self) -> Value {
        match self {
            Atom::Int(n) => Value::Int(*n),
            Atom::Float(x) => Value::Float(*x),
            Atom::Bool(b) => Value::Bool(*b),
            Atom::Str(s) => Value::Str(s.clone()),
        }
    }
}

/// A node of the abstract expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Atom(Atom),
    Symbol(String),
    Application { head: Box<Node>, args: Vec<Node> },
    Quoted(Box<Node>),
    /// The empty form `()`.
    Nil,
}

impl Node {
    /// The node read as data, without evaluating anything: symbols become
    /// their names, applications become lists.
    pub fn literal(&self) -> Value {
        ensure_sufficient_stack(|| match self {
            Node::Atom(atom) => atom.to_value(),
            Node::Symbol(name) => Value::Str(name.clone()),
            Node::Application { head, args } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(head.literal());
                items.extend(args.iter().map(Node::literal));
                Value::List(items)
            }
            Node::Quoted(inner) => inner.literal(),
            Node::Nil => Value::List(Vec::new()),
        })
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    src_len: usize,
}

impl Parser {
    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_node(&mut self) -> Result<Node, ParseError> {
        ensure_sufficient_stack(|| match self.advance() {
            None => Err(ParseError::Empty),
            Some(Token::RParen(at)) => Err(ParseError::UnexpectedClose(at)),
            Some(Token::LParen(at)) => self.parse_list(at),
            Some(Token::Quote(at)) => match self.peek() {
                None => Err(ParseError::DanglingQuote(at)),
                Some(_) => Ok(Node::Quoted(Box::new(self.parse_node()?))),
            },
            Some(Token::Word(text)) => Ok(classify(&text)),
        })
    }

    fn parse_list(&mut self, open: usize) -> Result<Node, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None => return Err(ParseError::Unclosed(open)),
                Some(Token::RParen(_)) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => items.push(self.parse_node()?),
            }
        }
        let mut items = items.into_iter();
        Ok(match items.next() {
            None => Node::Nil,
            Some(head) => Node::Application { head: Box::new(head), args: items.collect() },
        })
    }
}

/// Decide what a word token is: string, number, boolean, or symbol.
fn classify(text: &str) -> Node {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' || first == b'\'') && first == last {
            return Node::Atom(Atom::Str(unescape(&text[1..text.len() - 1])));
        }
    }
    match text {
        "true" | "#t" => return Node::Atom(Atom::Bool(true)),
        "false" | "#f" => return Node::Atom(Atom::Bool(false)),
        _ => {}
    }
    if looks_numeric(text) {
        if let Ok(n) = text.parse::<i64>() {
            return Node::Atom(Atom::Int(n));
        }
        if let Ok(x) = text.parse::<f64>() {
            return Node::Atom(Atom::Float(x));
        }
    }
    Node::Symbol(text.to_owned())
}

/// Digits with an optional sign and decimal point/exponent; keeps words like
/// `inf` and `nan` as symbols.
fn looks_numeric(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    body.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && body.chars().any(|c| c.is_ascii_digit())
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse an expression string into an AST.
pub fn parse(src: &str) -> Result<Node, ParseError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser { tokens, pos: 0, src_len: src.len() };
    let node = parser.parse_node()?;
    match parser.peek() {
        None => Ok(node),
        Some(Token::RParen(at)) => Err(ParseError::UnexpectedClose(*at)),
        Some(Token::LParen(at) | Token::Quote(at)) => Err(ParseError::Trailing(*at)),
        Some(Token::Word(_)) => Err(ParseError::Trailing(parser.src_len)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
