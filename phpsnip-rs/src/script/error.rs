//! Error types surfaced by the parser and the interpreter.

use thiserror::Error;

/// What went wrong while evaluating a statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("cannot reassign constant {0}")]
    ConstantReassignment(String),

    #[error("call to undefined function {0}()")]
    UnknownFunction(String),

    #[error("{name}() expects {expected} argument(s), {found} given")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("unsupported operand types: {left} {op} {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// A `$variable` or constant used in an expression without a binding.
    #[error("undefined {0}")]
    UndefinedBinding(String),

    #[error("cannot redeclare function {0}()")]
    FunctionRedeclared(String),

    #[error("{0}() finished without returning a value")]
    MissingReturn(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in '{0}'")]
    Overflow(&'static str),

    #[error("maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
}

/// A runtime failure, tagged with the 0-based index of the top-level
/// statement that was executing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("statement {index}: {kind}")]
pub struct RunError {
    pub index: usize,
    #[source]
    pub kind: ErrorKind,
}

/// A syntax error with a 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {col}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

/// Anything [`Interpreter::exec_script`](super::Interpreter::exec_script)
/// can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("runtime error: {0}")]
    Run(#[from] RunError),
}

impl ScriptError {
    /// The runtime error kind, if this is a runtime failure.
    pub fn kind(&self) -> Option<&ErrorKind> {
        match self {
            ScriptError::Run(e) => Some(&e.kind),
            ScriptError::Parse(_) => None,
        }
    }
}
