//! Source lexer, expression AST, expression parser, and evaluator.
//!
//! The lexer turns a whole script into [`Spanned`] tokens; both the
//! expression grammar here and the statement grammar in
//! [`stmt`](super::stmt) consume that stream through the shared [`Parser`].
//!
//! Operator precedence (lowest → highest):
//!   `||`  →  `&&`  →  equality (`== !=`)  →  relational (`< > <= >=`)  →
//!   concat (`.`)  →  additive (`+ -`)  →  multiplicative (`* /`)  →
//!   unary (`-`)  →  primary
//!
//! Equality and relational operators do not chain: `1 < 2 < 3` is a parse
//! error.

use std::collections::HashSet;

use super::error::{ErrorKind, ParseError};
use super::expand::{is_ident_continue, is_ident_start, parse_template, placeholder_names, Segment};
use super::value::{BoolStyle, Value};

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Dependency-injection interface used by the expression evaluator.
///
/// The [`Interpreter`](super::interp::Interpreter) implements this trait to
/// give the evaluator access to the current scope and the function table.
pub trait EvalContext {
    /// Look up a `$variable` in the current scope.
    fn get_var(&self, name: &str) -> Option<Value>;

    /// Look up a constant (current scope first, then top level).
    fn get_const(&self, name: &str) -> Option<Value>;

    /// Boolean rendering used by `.` and template expansion.
    fn bool_style(&self) -> BoolStyle;

    /// Invoke a user-defined function.
    fn call_fn(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ErrorKind>;
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Unsigned digits; the sign is a separate [`Token::Minus`].
    Int(u64),
    Float(f64),
    /// Body of a double-quoted string, escapes unprocessed.
    DqStr(String),
    /// Body of a single-quoted string, `\'` and `\\` resolved.
    SqStr(String),
    /// `$name`
    Var(String),
    /// Bare identifier: keyword, function or constant name.
    Ident(String),

    /// `<?php`
    OpenTag,
    /// Text between `?>` and the next `<?php`.
    InlineText(String),

    // Punctuation
    Assign,
    Semi,
    Comma,
    Colon,
    Question,
    Backslash,
    LParen,
    RParen,
    LBrace,
    RBrace,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Dot,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,

    /// Unrecognised input character, reported by the parser.
    Unknown(char),
    Eof,
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub col: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Lexer {
            src: src.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn starts_with_ignore_case(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i).is_some_and(|p| p.eq_ignore_ascii_case(&c)))
    }

    fn error(&self, line: usize, col: usize, message: impl Into<String>) -> ParseError {
        ParseError { line, col, message: message.into() }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => self.skip_line(),
                Some('/') if self.peek_at(1) == Some('/') => self.skip_line(),
                Some('/') if self.peek_at(1) == Some('*') => {
                    let (line, col) = (self.line, self.col);
                    self.advance();
                    self.advance();
                    loop {
                        if self.starts_with("*/") {
                            self.advance();
                            self.advance();
                            break;
                        }
                        if self.advance().is_none() {
                            return Err(self.error(line, col, "unterminated comment"));
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Line comments stop before a `?>` close tag.
    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' || self.starts_with("?>") {
                break;
            }
            self.advance();
        }
    }

    fn read_number(&mut self, line: usize, col: usize) -> Result<Token, ParseError> {
        let mut s = String::new();
        let mut is_float = false;

        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            s.push(c);
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            s.push('.');
            self.advance();
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                s.push(c);
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    s.extend(self.advance());
                }
                while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                    s.push(c);
                    self.advance();
                }
            }
        }

        if is_float {
            s.parse()
                .map(Token::Float)
                .map_err(|_| self.error(line, col, format!("invalid float literal '{s}'")))
        } else {
            s.parse()
                .map(Token::Int)
                .map_err(|_| self.error(line, col, format!("integer literal '{s}' out of range")))
        }
    }

    fn read_dq_string(&mut self, line: usize, col: usize) -> Result<Token, ParseError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error(line, col, "unterminated string")),
                Some('\\') => {
                    s.push('\\');
                    match self.advance() {
                        Some(c) => s.push(c),
                        None => return Err(self.error(line, col, "unterminated string")),
                    }
                }
                Some('"') => break,
                Some(c) => s.push(c),
            }
        }
        Ok(Token::DqStr(s))
    }

    fn read_sq_string(&mut self, line: usize, col: usize) -> Result<Token, ParseError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error(line, col, "unterminated string")),
                Some('\\') => match self.peek() {
                    Some(c @ ('\'' | '\\')) => {
                        self.advance();
                        s.push(c);
                    }
                    _ => s.push('\\'),
                },
                Some('\'') => break,
                Some(c) => s.push(c),
            }
        }
        Ok(Token::SqStr(s))
    }

    fn read_ident(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek().filter(|c| is_ident_continue(*c)) {
            s.push(c);
            self.advance();
        }
        s
    }

    /// Everything up to the next `<?php` (or EOF).  A single newline right
    /// after `?>` is swallowed.
    fn read_inline_text(&mut self) -> String {
        if self.peek() == Some('\n') {
            self.advance();
        }
        let mut s = String::new();
        while self.peek().is_some() && !self.starts_with_ignore_case("<?php") {
            s.extend(self.advance());
        }
        s
    }

    fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_trivia()?;
        let (line, col) = (self.line, self.col);
        let spanned = |token| Spanned { token, line, col };

        if self.starts_with_ignore_case("<?php") {
            for _ in 0..5 {
                self.advance();
            }
            return Ok(spanned(Token::OpenTag));
        }
        if self.starts_with("?>") {
            self.advance();
            self.advance();
            return Ok(spanned(Token::InlineText(self.read_inline_text())));
        }

        let Some(ch) = self.peek() else {
            return Ok(spanned(Token::Eof));
        };

        let token = match ch {
            '0'..='9' => self.read_number(line, col)?,
            '"' => {
                self.advance();
                self.read_dq_string(line, col)?
            }
            '\'' => {
                self.advance();
                self.read_sq_string(line, col)?
            }
            '$' => {
                self.advance();
                if !self.peek().is_some_and(is_ident_start) {
                    return Err(self.error(line, col, "expected variable name after '$'"));
                }
                Token::Var(self.read_ident())
            }
            c if is_ident_start(c) => Token::Ident(self.read_ident()),
            c => {
                self.advance();
                match c {
                    '=' if self.eat_char('=') => Token::EqEq,
                    '!' if self.eat_char('=') => Token::NotEq,
                    '<' if self.eat_char('=') => Token::Le,
                    '>' if self.eat_char('=') => Token::Ge,
                    '&' if self.eat_char('&') => Token::AndAnd,
                    '|' if self.eat_char('|') => Token::OrOr,
                    '<' => Token::Lt,
                    '>' => Token::Gt,
                    '/' => Token::Slash,
                    '=' => Token::Assign,
                    ';' => Token::Semi,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    '?' => Token::Question,
                    '\\' => Token::Backslash,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => Token::Star,
                    '.' => Token::Dot,
                    other => Token::Unknown(other),
                }
            }
        };
        Ok(spanned(token))
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token()?;
            let done = t.token == Token::Eof;
            tokens.push(t);
            if done {
                break;
            }
        }
        Ok(tokens)
    }
}

/// Tokenize a whole script.
pub fn tokenize(src: &str) -> Result<Vec<Spanned>, ParseError> {
    Lexer::new(src).tokenize()
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Concat => ".",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Double-quoted string with placeholders.
    Template(Vec<Segment>),
    Var(String),
    Const(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

impl Expr {
    /// Add every `$variable` this expression mentions (including template
    /// placeholders) to `out`.
    pub fn collect_var_refs(&self, out: &mut HashSet<String>) {
        match self {
            Expr::Literal(_) | Expr::Const(_) => {}
            Expr::Template(segs) => out.extend(placeholder_names(segs).map(str::to_owned)),
            Expr::Var(name) => {
                out.insert(name.clone());
            }
            Expr::Neg(inner) => inner.collect_var_refs(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_var_refs(out);
                rhs.collect_var_refs(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.collect_var_refs(out)),
        }
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Deepest nesting of expressions and blocks the parser accepts.
pub const MAX_NESTING: usize = 128;

/// Recursive-descent parser over a token stream.  The statement grammar
/// lives in [`stmt`](super::stmt).
pub(crate) struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Spanned>) -> Self {
        Parser { tokens, pos: 0, depth: 0 }
    }

    pub(crate) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    pub(crate) fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True if the next token is the keyword `kw` (case-insensitive).
    pub(crate) fn at_keyword(&self, kw: &str) -> bool {
        matches!(self.peek(), Token::Ident(s) if s.eq_ignore_ascii_case(kw))
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        let (line, col) = self
            .tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| (t.line, t.col))
            .unwrap_or((1, 1));
        ParseError { line, col, message: message.into() }
    }

    pub(crate) fn expect(&mut self, expected: &Token, what: &str) -> Result<(), ParseError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}, found {}", describe(self.peek()))))
        }
    }

    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected {what}, found {}", describe(&other)))),
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    pub(crate) fn nested<T>(
        &mut self,
        what: &str,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(format!(
                "{what} nested too deeply (limit {MAX_NESTING})"
            )));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.nested("expression", Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_relational()?;
        let op = match self.peek() {
            Token::EqEq => BinOp::Eq,
            Token::NotEq => BinOp::NotEq,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_relational()?;
        if matches!(self.peek(), Token::EqEq | Token::NotEq) {
            return Err(self.error("comparison operators cannot be chained"));
        }
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_concat()?;
        let op = match self.peek() {
            Token::Lt => BinOp::Lt,
            Token::Gt => BinOp::Gt,
            Token::Le => BinOp::Le,
            Token::Ge => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_concat()?;
        if matches!(self.peek(), Token::Lt | Token::Gt | Token::Le | Token::Ge) {
            return Err(self.error("comparison operators cannot be chained"));
        }
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_concat(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_additive()?;
        while self.eat(&Token::Dot) {
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(BinOp::Concat, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Token::Minus) {
            // `-9223372036854775808` only fits once the sign is applied.
            if let Token::Int(n) = *self.peek() {
                if n == i64::MIN.unsigned_abs() {
                    self.advance();
                    return Ok(Expr::Literal(Value::Int(i64::MIN)));
                }
            }
            let inner = self.nested("expression", Self::parse_unary)?;
            return Ok(match inner {
                Expr::Literal(Value::Int(n)) if n != i64::MIN => Expr::Literal(Value::Int(-n)),
                Expr::Literal(Value::Float(x)) => Expr::Literal(Value::Float(-x)),
                other => Expr::Neg(Box::new(other)),
            });
        }
        if self.eat(&Token::Plus) {
            return self.nested("expression", Self::parse_unary);
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().clone() {
            Token::Int(n) => {
                let n = i64::try_from(n)
                    .map_err(|_| self.error(format!("integer literal '{n}' out of range")))?;
                self.advance();
                Ok(Expr::Literal(Value::Int(n)))
            }
            Token::Float(x) => {
                self.advance();
                Ok(Expr::Literal(Value::Float(x)))
            }
            Token::SqStr(s) => {
                self.advance();
                Ok(Expr::Literal(Value::Str(s)))
            }
            Token::DqStr(raw) => {
                self.advance();
                let segs = parse_template(&raw);
                Ok(match segs.as_slice() {
                    [] => Expr::Literal(Value::Str(String::new())),
                    [Segment::Text(t)] => Expr::Literal(Value::Str(t.clone())),
                    _ => Expr::Template(segs),
                })
            }
            Token::Var(name) => {
                self.advance();
                Ok(Expr::Var(name))
            }
            Token::Ident(name) => {
                self.advance();
                if name.eq_ignore_ascii_case("true") {
                    return Ok(Expr::Literal(Value::Bool(true)));
                }
                if name.eq_ignore_ascii_case("false") {
                    return Ok(Expr::Literal(Value::Bool(false)));
                }
                if self.eat(&Token::LParen) {
                    let args = self.parse_args()?;
                    return Ok(Expr::Call(name, args));
                }
                Ok(Expr::Const(name))
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(self.error(format!("expected expression, found {}", describe(&other)))),
        }
    }

    /// Argument list after the opening `(`, through the closing `)`.
    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            self.expect(&Token::Comma, "',' or ')'")?;
        }
    }
}

/// Human-readable token description for diagnostics.
pub(crate) fn describe(t: &Token) -> String {
    match t {
        Token::Int(n) => format!("integer {n}"),
        Token::Float(x) => format!("number {x}"),
        Token::DqStr(_) | Token::SqStr(_) => "string literal".into(),
        Token::Var(name) => format!("${name}"),
        Token::Ident(name) => format!("'{name}'"),
        Token::OpenTag => "'<?php'".into(),
        Token::InlineText(_) => "'?>'".into(),
        Token::Assign => "'='".into(),
        Token::Semi => "';'".into(),
        Token::Comma => "','".into(),
        Token::Colon => "':'".into(),
        Token::Question => "'?'".into(),
        Token::Backslash => "'\\'".into(),
        Token::LParen => "'('".into(),
        Token::RParen => "')'".into(),
        Token::LBrace => "'{'".into(),
        Token::RBrace => "'}'".into(),
        Token::Plus => "'+'".into(),
        Token::Minus => "'-'".into(),
        Token::Star => "'*'".into(),
        Token::Slash => "'/'".into(),
        Token::Dot => "'.'".into(),
        Token::EqEq => "'=='".into(),
        Token::NotEq => "'!='".into(),
        Token::Lt => "'<'".into(),
        Token::Gt => "'>'".into(),
        Token::Le => "'<='".into(),
        Token::Ge => "'>='".into(),
        Token::AndAnd => "'&&'".into(),
        Token::OrOr => "'||'".into(),
        Token::Unknown(c) => format!("unexpected character '{c}'"),
        Token::Eof => "end of input".into(),
    }
}

/// Parse a standalone expression string.
pub fn parse_expr_str(src: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(tokenize(src)?);
    let expr = parser.parse_expr()?;
    if parser.peek() != &Token::Eof {
        return Err(parser.error(format!("unexpected {}", describe(parser.peek()))));
    }
    Ok(expr)
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an expression against `ctx`.
pub fn eval_expr(expr: &Expr, ctx: &mut dyn EvalContext) -> Result<Value, ErrorKind> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Template(segs) => Ok(Value::Str(super::expand::expand(segs, &*ctx))),
        Expr::Var(name) => ctx
            .get_var(name)
            .ok_or_else(|| ErrorKind::UndefinedBinding(format!("variable ${name}"))),
        Expr::Const(name) => ctx
            .get_const(name)
            .ok_or_else(|| ErrorKind::UndefinedBinding(format!("constant {name}"))),
        Expr::Neg(inner) => eval_expr(inner, ctx)?.arith_neg(),
        // Short-circuit: the right side only runs when it decides the result.
        Expr::Binary(BinOp::And, lhs, rhs) => Ok(Value::Bool(
            eval_expr(lhs, ctx)?.as_bool() && eval_expr(rhs, ctx)?.as_bool(),
        )),
        Expr::Binary(BinOp::Or, lhs, rhs) => Ok(Value::Bool(
            eval_expr(lhs, ctx)?.as_bool() || eval_expr(rhs, ctx)?.as_bool(),
        )),
        Expr::Binary(op, lhs, rhs) => {
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            match op {
                BinOp::Add => l.arith_add(&r),
                BinOp::Sub => l.arith_sub(&r),
                BinOp::Mul => l.arith_mul(&r),
                BinOp::Div => l.arith_div(&r),
                BinOp::Concat => Ok(l.concat(&r, ctx.bool_style())),
                BinOp::Eq => Ok(Value::Bool(l.loose_eq(&r))),
                BinOp::NotEq => Ok(Value::Bool(!l.loose_eq(&r))),
                BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                    let ord = l.compare(&r, op.symbol())?;
                    Ok(Value::Bool(match op {
                        BinOp::Lt => ord.is_lt(),
                        BinOp::Gt => ord.is_gt(),
                        BinOp::Le => ord.is_le(),
                        _ => ord.is_ge(),
                    }))
                }
                BinOp::And | BinOp::Or => unreachable!("handled above"),
            }
        }
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, ctx)?);
            }
            ctx.call_fn(name, values)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
