//! Snippet script interpreter.
//!
//! The [`Interpreter`] holds the top-level scope, the call stack and the
//! output [`Transcript`], and executes parsed [`Stmt`] trees.  It implements
//! [`EvalContext`] so the expression evaluator can call back into it for
//! variable lookups and function calls.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, trace};

use super::{
    error::{ErrorKind, RunError, ScriptError},
    expr::{eval_expr, EvalContext},
    stmt::{parse_script, FunctionDecl, Program, Stmt},
    value::{BoolStyle, Value},
};

/// Default limit on nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Upper bound on `max_call_depth`.  Script calls recurse on the native stack.
pub const MAX_CALL_DEPTH_LIMIT: usize = 1024;

// ── Options ───────────────────────────────────────────────────────────────────

/// Runtime knobs, usually filled in from [`Config`](crate::config::Config).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub bool_style: BoolStyle,
    pub max_call_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            bool_style: BoolStyle::default(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

// ── Transcript ────────────────────────────────────────────────────────────────

/// Append-only output sink.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Transcript {
    text: String,
}

impl Transcript {
    pub fn write(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Everything written so far.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Completed lines, plus a trailing partial line if there is one.
    pub fn lines(&self) -> Vec<String> {
        self.text.lines().map(str::to_owned).collect()
    }

    /// Drain the buffer.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ── ControlFlow ───────────────────────────────────────────────────────────────

/// Non-error control-flow signals that unwind a function body.
#[derive(Debug)]
pub enum ControlFlow {
    Return(Value),
}

// ── Functions and scopes ──────────────────────────────────────────────────────

/// A callable: the declaration plus whatever it captured when it was bound.
#[derive(Debug)]
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    /// Copies of enclosing bindings, taken at declaration time.
    captured: HashMap<String, Value>,
    /// Copies of enclosing constants, taken at declaration time.
    captured_consts: HashMap<String, Value>,
    /// Functions of the enclosing call visible at declaration time.
    captured_fns: HashMap<String, Rc<Function>>,
}

impl Function {
    fn top_level(decl: Rc<FunctionDecl>) -> Self {
        Function {
            decl,
            captured: HashMap::new(),
            captured_consts: HashMap::new(),
            captured_fns: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    vars: HashMap<String, Value>,
    consts: HashMap<String, Value>,
    functions: HashMap<String, Rc<Function>>,
}

#[derive(Debug)]
struct Frame {
    scope: Scope,
    callee: Rc<Function>,
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// The script interpreter.
pub struct Interpreter {
    /// Top-level scope.
    globals: Scope,
    /// Call stack (innermost frame last).
    frames: Vec<Frame>,
    /// Everything written by `echo`, `print` and `println`.
    pub output: Transcript,
    options: Options,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// `options.max_call_depth` is clamped to [`MAX_CALL_DEPTH_LIMIT`].
    pub fn with_options(options: Options) -> Self {
        Interpreter {
            globals: Scope::default(),
            frames: Vec::new(),
            output: Transcript::default(),
            options: Options {
                max_call_depth: options.max_call_depth.min(MAX_CALL_DEPTH_LIMIT),
                ..options
            },
        }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Set a top-level variable.
    pub fn set_global_var(&mut self, name: impl Into<String>, value: Value) {
        self.globals.vars.insert(name.into(), value);
    }

    /// Get a top-level variable.
    pub fn get_global_var(&self, name: &str) -> Option<&Value> {
        self.globals.vars.get(name)
    }

    /// Get a top-level constant.
    pub fn get_global_const(&self, name: &str) -> Option<&Value> {
        self.globals.consts.get(name)
    }

    /// Look up a top-level function.
    pub fn function(&self, name: &str) -> Option<&Rc<Function>> {
        self.globals.functions.get(name)
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Parse and run a script.  Bindings, constants and functions persist
    /// across calls on the same interpreter.
    pub fn exec_script(&mut self, src: &str) -> Result<(), ScriptError> {
        let program = parse_script(src)?;
        self.run(&program)?;
        Ok(())
    }

    /// Run a parsed program: hoist its top-level functions, then execute the
    /// statements in order.  The first failure stops the run.
    pub fn run(&mut self, program: &Program) -> Result<(), RunError> {
        debug!(
            namespace = program.namespace.as_deref().unwrap_or(""),
            statements = program.stmts.len(),
            "running program"
        );
        self.hoist(program)?;

        for (index, stmt) in program.stmts.iter().enumerate() {
            trace!(index, "statement");
            if let Err(kind) = self.exec_stmt(stmt) {
                debug!(index, error = %kind, "run aborted");
                return Err(RunError { index, kind });
            }
        }
        Ok(())
    }

    /// Bind every top-level function before the first statement runs.
    /// Either all of them are bound or, on a name clash, none are.
    fn hoist(&mut self, program: &Program) -> Result<(), RunError> {
        let mut seen = HashSet::new();
        for (index, stmt) in program.stmts.iter().enumerate() {
            let Stmt::Function(decl) = stmt else { continue };
            if self.globals.functions.contains_key(&decl.name) || !seen.insert(&decl.name) {
                return Err(RunError {
                    index,
                    kind: ErrorKind::FunctionRedeclared(decl.name.clone()),
                });
            }
        }

        for decl in program.functions() {
            debug!(function = %decl.name, params = decl.params.len(), "hoisted");
            self.globals
                .functions
                .insert(decl.name.clone(), Rc::new(Function::top_level(Rc::clone(decl))));
        }
        Ok(())
    }

    /// Execute a block of statements in the current scope.
    pub fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Option<ControlFlow>, ErrorKind> {
        for stmt in stmts {
            if let Some(cf) = self.exec_stmt(stmt)? {
                return Ok(Some(cf));
            }
        }
        Ok(None)
    }

    /// Execute a single statement.
    pub fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Option<ControlFlow>, ErrorKind> {
        match stmt {
            Stmt::Assign { name, value } => {
                let v = eval_expr(value, self)?;
                self.scope_mut().vars.insert(name.clone(), v);
                Ok(None)
            }

            Stmt::Const { name, value } => {
                if self.scope().consts.contains_key(name) {
                    return Err(ErrorKind::ConstantReassignment(name.clone()));
                }
                let v = eval_expr(value, self)?;
                self.scope_mut().consts.insert(name.clone(), v);
                Ok(None)
            }

            Stmt::AssignConst { name, .. } => {
                if self.get_const(name).is_some() {
                    Err(ErrorKind::ConstantReassignment(name.clone()))
                } else {
                    Err(ErrorKind::UndefinedBinding(format!("constant {name}")))
                }
            }

            Stmt::Function(decl) => {
                if self.frames.is_empty() {
                    self.bind_top_level(decl)?;
                } else {
                    self.bind_nested(decl)?;
                }
                Ok(None)
            }

            Stmt::If { cond, then_block, else_block } => {
                let block = if eval_expr(cond, self)?.as_bool() {
                    then_block
                } else {
                    else_block
                };
                self.exec_block(block)
            }

            Stmt::Return(value) => {
                let v = eval_expr(value, self)?;
                Ok(Some(ControlFlow::Return(v)))
            }

            Stmt::Echo { values, newline } => {
                for value in values {
                    let text = eval_expr(value, self)?.render(self.options.bool_style);
                    self.output.write(&text);
                }
                if *newline {
                    self.output.write("\n");
                }
                Ok(None)
            }

            Stmt::Expr(expr) => {
                eval_expr(expr, self)?;
                Ok(None)
            }
        }
    }

    /// Bind a top-level declaration reached by execution.  Declarations
    /// directly in the program were already bound by `hoist`; ones inside an
    /// `if` block are bound here, when their branch runs.
    fn bind_top_level(&mut self, decl: &Rc<FunctionDecl>) -> Result<(), ErrorKind> {
        match self.globals.functions.get(&decl.name) {
            Some(existing) if Rc::ptr_eq(&existing.decl, decl) => Ok(()),
            Some(_) => Err(ErrorKind::FunctionRedeclared(decl.name.clone())),
            None => {
                debug!(function = %decl.name, "bound conditional function");
                self.globals
                    .functions
                    .insert(decl.name.clone(), Rc::new(Function::top_level(Rc::clone(decl))));
                Ok(())
            }
        }
    }

    /// Bind a function declared inside a function body, snapshotting the
    /// enclosing bindings it refers to.
    fn bind_nested(&mut self, decl: &Rc<FunctionDecl>) -> Result<(), ErrorKind> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        if frame.scope.functions.contains_key(&decl.name) {
            return Err(ErrorKind::FunctionRedeclared(decl.name.clone()));
        }

        let captured: HashMap<String, Value> = decl
            .free_vars()
            .into_iter()
            .filter_map(|name| {
                let v = frame.scope.vars.get(&name)?.clone();
                Some((name, v))
            })
            .collect();

        let mut captured_consts = frame.callee.captured_consts.clone();
        captured_consts.extend(
            frame
                .scope
                .consts
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        let mut captured_fns = frame.callee.captured_fns.clone();
        captured_fns.extend(
            frame
                .scope
                .functions
                .iter()
                .map(|(k, f)| (k.clone(), Rc::clone(f))),
        );

        debug!(
            function = %decl.name,
            captured = captured.len(),
            "bound nested function"
        );
        let func = Function {
            decl: Rc::clone(decl),
            captured,
            captured_consts,
            captured_fns,
        };
        frame.scope.functions.insert(decl.name.clone(), Rc::new(func));
        Ok(())
    }

    /// Resolve a call: functions declared in the current call, the callee
    /// itself, its captured siblings, then the top level.
    fn lookup_fn(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(frame) = self.frames.last() {
            if let Some(f) = frame.scope.functions.get(name) {
                return Some(Rc::clone(f));
            }
            if frame.callee.decl.name == name {
                return Some(Rc::clone(&frame.callee));
            }
            if let Some(f) = frame.callee.captured_fns.get(name) {
                return Some(Rc::clone(f));
            }
        }
        self.globals.functions.get(name).cloned()
    }

    fn scope(&self) -> &Scope {
        self.frames.last().map(|f| &f.scope).unwrap_or(&self.globals)
    }

    fn scope_mut(&mut self) -> &mut Scope {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.scope,
            None => &mut self.globals,
        }
    }
}

// ── EvalContext impl ──────────────────────────────────────────────────────────

impl EvalContext for Interpreter {
    fn get_var(&self, name: &str) -> Option<Value> {
        self.scope().vars.get(name).cloned()
    }

    fn get_const(&self, name: &str) -> Option<Value> {
        self.scope()
            .consts
            .get(name)
            .or_else(|| {
                self.frames
                    .last()
                    .and_then(|f| f.callee.captured_consts.get(name))
            })
            .or_else(|| self.globals.consts.get(name))
            .cloned()
    }

    fn bool_style(&self) -> BoolStyle {
        self.options.bool_style
    }

    fn call_fn(&mut self, name: &str, args: Vec<Value>) -> Result<Value, ErrorKind> {
        let func = self
            .lookup_fn(name)
            .ok_or_else(|| ErrorKind::UnknownFunction(name.to_owned()))?;

        let params = &func.decl.params;
        if params.len() != args.len() {
            return Err(ErrorKind::ArityMismatch {
                name: name.to_owned(),
                expected: params.len(),
                found: args.len(),
            });
        }
        if self.frames.len() >= self.options.max_call_depth {
            return Err(ErrorKind::CallDepthExceeded(self.options.max_call_depth));
        }

        let mut scope = Scope {
            vars: func.captured.clone(),
            ..Scope::default()
        };
        for (param, arg) in params.iter().zip(args) {
            scope.vars.insert(param.clone(), arg);
        }

        debug!(function = name, depth = self.frames.len() + 1, "call");
        self.frames.push(Frame {
            scope,
            callee: Rc::clone(&func),
        });
        let result = self.exec_block(&func.decl.body);
        self.frames.pop();

        match result? {
            Some(ControlFlow::Return(v)) => Ok(v),
            None => Err(ErrorKind::MissingReturn(name.to_owned())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
