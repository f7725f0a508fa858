//! Snippet scripting language.
//!
//! This module implements a tree-walking interpreter for PHP-style snippet
//! scripts, covering:
//!
//! - `$variable` assignment and `const` declarations
//! - Double-quoted templates (`"Hello $nombre"`) and raw single-quoted text
//! - Integer/float arithmetic (`+ - * /`) and `.` concatenation
//! - Comparisons (`== != < > <= >=`), short-circuit `&&` / `||` and
//!   `if` / `elseif` / `else`
//! - `function` declarations, hoisted at top level, with nested
//!   declarations capturing enclosing bindings by value
//! - `echo`, `print`, `println`
//!
//! # Quick start
//!
//! ```rust
//! use phpsnip::script::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! interp.exec_script("$x = 6; println(\"x*7 = \" . $x * 7);").unwrap();
//! assert_eq!(interp.output.lines(), vec!["x*7 = 42"]);
//! ```

pub mod error;
pub mod expand;
pub mod expr;
pub mod interp;
pub mod stmt;
pub mod value;

// Re-exports for convenience.
pub use error::{ErrorKind, ParseError, RunError, ScriptError};
pub use expr::EvalContext;
pub use interp::{Interpreter, Options, Transcript};
pub use stmt::{parse_script, Program};
pub use value::{BoolStyle, Value};
