//! Statement AST and script-level parser.
//!
//! A script is an optional `<?php` open tag followed by `;`-terminated
//! statements.  `declare(...)` is accepted and ignored; `namespace A\B;` is
//! recorded on the [`Program`].  Text after a `?>` close tag becomes an
//! `echo` of that text.
//!
//! `if` / `elseif` / `else` blocks run in the enclosing scope; only function
//! bodies get a scope of their own.

use std::collections::HashSet;
use std::rc::Rc;

use super::error::ParseError;
use super::expr::{describe, tokenize, Expr, Parser, Token};
use super::value::Value;

/// A parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `$name = expr;`
    Assign { name: String, value: Expr },
    /// `const NAME = expr;`
    Const { name: String, value: Expr },
    /// `NAME = expr;`: assignment to a bare name, which can only ever
    /// target a constant.
    AssignConst { name: String, value: Expr },
    /// `function name($a, $b) { ... }`
    Function(Rc<FunctionDecl>),
    /// `return expr;`
    Return(Expr),
    /// `if (cond) { ... } else { ... }`.  An `elseif` chain nests as a
    /// single `If` inside `else_block`.
    If { cond: Expr, then_block: Vec<Stmt>, else_block: Vec<Stmt> },
    /// `echo a, b;` / `print a;` (no newline) or `println(a);` (newline).
    Echo { values: Vec<Expr>, newline: bool },
    /// Any other expression followed by `;`.
    Expr(Expr),
}

/// A function declaration, shared between the AST and the runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

impl FunctionDecl {
    /// `$variables` the body refers to that are not parameters, i.e. the names a
    /// nested declaration captures from its enclosing call.
    pub fn free_vars(&self) -> HashSet<String> {
        let mut refs = HashSet::new();
        for stmt in &self.body {
            stmt.collect_var_refs(&mut refs);
        }
        for p in &self.params {
            refs.remove(p);
        }
        refs
    }
}

impl Stmt {
    /// Add every `$variable` read by this statement to `out`.  Nested
    /// function declarations contribute their own free variables.
    pub fn collect_var_refs(&self, out: &mut HashSet<String>) {
        match self {
            Stmt::Assign { value, .. }
            | Stmt::Const { value, .. }
            | Stmt::AssignConst { value, .. }
            | Stmt::Return(value)
            | Stmt::Expr(value) => value.collect_var_refs(out),
            Stmt::Echo { values, .. } => values.iter().for_each(|v| v.collect_var_refs(out)),
            Stmt::Function(decl) => out.extend(decl.free_vars()),
            Stmt::If { cond, then_block, else_block } => {
                cond.collect_var_refs(out);
                for stmt in then_block.iter().chain(else_block) {
                    stmt.collect_var_refs(out);
                }
            }
        }
    }
}

/// A parsed script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// Namespace from a `namespace` statement, if any.
    pub namespace: Option<String>,
    pub stmts: Vec<Stmt>,
}

impl Program {
    /// Top-level function declarations, in source order.
    pub fn functions(&self) -> impl Iterator<Item = &Rc<FunctionDecl>> {
        self.stmts.iter().filter_map(|s| match s {
            Stmt::Function(decl) => Some(decl),
            _ => None,
        })
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Parse a script into a [`Program`].
pub fn parse_script(src: &str) -> Result<Program, ParseError> {
    let mut parser = Parser::new(tokenize(src)?);
    parser.parse_program()
}

impl Parser {
    fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::default();
        loop {
            match self.peek().clone() {
                Token::Eof => break,
                Token::OpenTag => {
                    self.advance();
                }
                Token::InlineText(text) => {
                    self.advance();
                    if !text.is_empty() {
                        program.stmts.push(Stmt::Echo {
                            values: vec![Expr::Literal(Value::Str(text))],
                            newline: false,
                        });
                    }
                }
                _ if self.at_keyword("namespace") => {
                    self.advance();
                    if program.namespace.is_some() {
                        return Err(self.error("only one namespace declaration is supported"));
                    }
                    program.namespace = Some(self.parse_namespace_name()?);
                    self.expect_terminator()?;
                }
                _ => {
                    if let Some(stmt) = self.parse_stmt(false)? {
                        program.stmts.push(stmt);
                    }
                }
            }
        }
        Ok(program)
    }

    /// Parse one statement.  Returns `None` for statements with no runtime
    /// effect (`declare(...)`, a bare `;`).
    fn parse_stmt(&mut self, in_function: bool) -> Result<Option<Stmt>, ParseError> {
        if self.eat(&Token::Semi) {
            return Ok(None);
        }

        if let Token::Var(name) = self.peek().clone() {
            if self.peek_at(1) == &Token::Assign {
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                self.expect_terminator()?;
                return Ok(Some(Stmt::Assign { name, value }));
            }
        }

        if let Token::Ident(word) = self.peek().clone() {
            match word.to_ascii_lowercase().as_str() {
                "const" => {
                    self.advance();
                    let name = self.expect_ident("constant name")?;
                    self.expect(&Token::Assign, "'='")?;
                    let value = self.parse_expr()?;
                    self.expect_terminator()?;
                    return Ok(Some(Stmt::Const { name, value }));
                }
                "function" => {
                    self.advance();
                    let decl = self.parse_function()?;
                    return Ok(Some(Stmt::Function(Rc::new(decl))));
                }
                "if" => {
                    self.advance();
                    return self.parse_if(in_function).map(Some);
                }
                "else" | "elseif" => {
                    return Err(self.error(format!("'{word}' without a matching 'if'")));
                }
                "return" => {
                    if !in_function {
                        return Err(self.error("'return' outside of a function"));
                    }
                    self.advance();
                    let value = self.parse_expr()?;
                    self.expect_terminator()?;
                    return Ok(Some(Stmt::Return(value)));
                }
                "echo" => {
                    self.advance();
                    let mut values = vec![self.parse_expr()?];
                    while self.eat(&Token::Comma) {
                        values.push(self.parse_expr()?);
                    }
                    self.expect_terminator()?;
                    return Ok(Some(Stmt::Echo { values, newline: false }));
                }
                "print" => {
                    self.advance();
                    let value = self.parse_expr()?;
                    self.expect_terminator()?;
                    return Ok(Some(Stmt::Echo { values: vec![value], newline: false }));
                }
                "println" => {
                    self.advance();
                    self.expect(&Token::LParen, "'('")?;
                    let value = self.parse_expr()?;
                    self.expect(&Token::RParen, "')'")?;
                    self.expect_terminator()?;
                    return Ok(Some(Stmt::Echo { values: vec![value], newline: true }));
                }
                "declare" => {
                    self.advance();
                    self.skip_parenthesised()?;
                    self.expect_terminator()?;
                    return Ok(None);
                }
                "namespace" => {
                    return Err(self.error("namespace declaration must be at the top level"));
                }
                _ => {}
            }
            if self.peek_at(1) == &Token::Assign {
                self.advance();
                self.advance();
                let value = self.parse_expr()?;
                self.expect_terminator()?;
                return Ok(Some(Stmt::AssignConst { name: word, value }));
            }
        }

        let expr = self.parse_expr()?;
        self.expect_terminator()?;
        Ok(Some(Stmt::Expr(expr)))
    }

    /// After the `function` keyword: name, parameters, optional return type,
    /// and the braced body.
    fn parse_function(&mut self) -> Result<FunctionDecl, ParseError> {
        let name = self.expect_ident("function name")?;
        self.expect(&Token::LParen, "'('")?;

        let mut params: Vec<String> = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                self.skip_type_hint();
                let param = match self.advance() {
                    Token::Var(p) => p,
                    other => {
                        return Err(self.error(format!(
                            "expected parameter name, found {}",
                            describe(&other)
                        )))
                    }
                };
                if params.contains(&param) {
                    return Err(self.error(format!("duplicate parameter ${param}")));
                }
                params.push(param);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma, "',' or ')'")?;
            }
        }

        if self.eat(&Token::Colon) {
            self.skip_type_hint();
        }

        let body = self.parse_block(true, &format!("body of function {name}"))?;
        Ok(FunctionDecl { name, params, body })
    }

    /// After the `if` keyword: `(cond) { ... }` plus any `elseif` / `else`
    /// branches.
    fn parse_if(&mut self, in_function: bool) -> Result<Stmt, ParseError> {
        self.expect(&Token::LParen, "'(' after 'if'")?;
        let cond = self.parse_expr()?;
        self.expect(&Token::RParen, "')'")?;
        let then_block = self.parse_block(in_function, "'if' block")?;

        let else_block = if self.at_keyword("elseif") {
            self.advance();
            vec![self.nested("block", |p| p.parse_if(in_function))?]
        } else if self.at_keyword("else") {
            self.advance();
            if self.at_keyword("if") {
                self.advance();
                vec![self.nested("block", |p| p.parse_if(in_function))?]
            } else {
                self.parse_block(in_function, "'else' block")?
            }
        } else {
            Vec::new()
        };

        Ok(Stmt::If { cond, then_block, else_block })
    }

    /// A braced statement list.  `what` names the block in the error for a
    /// missing `}`.
    fn parse_block(&mut self, in_function: bool, what: &str) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&Token::LBrace, "'{'")?;
        self.nested("block", |p| {
            let mut body = Vec::new();
            loop {
                match p.peek() {
                    Token::RBrace => {
                        p.advance();
                        return Ok(body);
                    }
                    Token::Eof => return Err(p.error(format!("unclosed {what}"))),
                    _ => {
                        if let Some(stmt) = p.parse_stmt(in_function)? {
                            body.push(stmt);
                        }
                    }
                }
            }
        })
    }

    /// Skip an optional `?Type` hint; types are documentation only.
    fn skip_type_hint(&mut self) {
        self.eat(&Token::Question);
        if matches!(self.peek(), Token::Ident(_)) {
            self.advance();
        }
    }

    /// `A\B\C` after the `namespace` keyword.
    fn parse_namespace_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_ident("namespace name")?;
        while self.eat(&Token::Backslash) {
            name.push('\\');
            name.push_str(&self.expect_ident("namespace segment")?);
        }
        Ok(name)
    }

    /// Skip a balanced `( ... )` group.
    fn skip_parenthesised(&mut self) -> Result<(), ParseError> {
        self.expect(&Token::LParen, "'('")?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eof => return Err(self.error("unbalanced parentheses")),
                _ => {}
            }
        }
        Ok(())
    }

    /// `;`, or a `?>` close tag, which also ends a statement.
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.eat(&Token::Semi) || matches!(self.peek(), Token::InlineText(_)) {
            Ok(())
        } else {
            Err(self.error(format!("expected ';', found {}", describe(self.peek()))))
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
