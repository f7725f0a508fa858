//! Double-quoted string templates.
//!
//! A double-quoted literal is split once, at parse time, into a list of
//! [`Segment`]s.  Expansion then walks the segments and substitutes each
//! placeholder with the current value of the named variable.
//!
//! | Sequence        | Meaning                                                 |
//! |-----------------|---------------------------------------------------------|
//! | `$name`         | Variable `name` (longest identifier after the `$`)      |
//! | `{$name}`       | Same, braced form for gluing text right after the name  |
//! | `\n` `\t` `\r`  | Newline, tab, carriage return                           |
//! | `\\` `\"`       | Backslash, double quote                                 |
//! | `\$`            | Literal `$`; no substitution                            |
//!
//! A placeholder naming an undefined variable is left in the output exactly
//! as written.  Any other backslash sequence is kept verbatim.

use super::expr::EvalContext;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text (escapes already resolved).
    Text(String),
    /// A placeholder.  `raw` is the source spelling, emitted when `name` is
    /// unbound.
    Var { name: String, raw: String },
}

/// Split the body of a double-quoted literal into segments.
pub fn parse_template(src: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = src.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.peek().copied() {
                Some('n') => {
                    chars.next();
                    text.push('\n');
                }
                Some('t') => {
                    chars.next();
                    text.push('\t');
                }
                Some('r') => {
                    chars.next();
                    text.push('\r');
                }
                Some('\\') => {
                    chars.next();
                    text.push('\\');
                }
                Some('"') => {
                    chars.next();
                    text.push('"');
                }
                Some('$') => {
                    chars.next();
                    text.push('$');
                }
                _ => text.push('\\'),
            },
            '$' => {
                if matches!(chars.peek(), Some(c) if is_ident_start(*c)) {
                    let name = read_ident(&mut chars);
                    flush_text(&mut segments, &mut text);
                    let raw = format!("${name}");
                    segments.push(Segment::Var { name, raw });
                } else {
                    text.push('$');
                }
            }
            '{' => {
                // {$name}, only when the closing brace follows the name.
                let mut look = chars.clone();
                if look.next() == Some('$')
                    && matches!(look.peek(), Some(c) if is_ident_start(*c))
                {
                    let name = read_ident(&mut look);
                    if look.next() == Some('}') {
                        chars = look;
                        flush_text(&mut segments, &mut text);
                        let raw = format!("{{${name}}}");
                        segments.push(Segment::Var { name, raw });
                        continue;
                    }
                }
                text.push('{');
            }
            other => text.push(other),
        }
    }

    flush_text(&mut segments, &mut text);
    segments
}

/// Substitute every placeholder in `segments` using `ctx`.
pub fn expand(segments: &[Segment], ctx: &dyn EvalContext) -> String {
    let style = ctx.bool_style();
    let mut out = String::new();
    for seg in segments {
        match seg {
            Segment::Text(t) => out.push_str(t),
            Segment::Var { name, raw } => match ctx.get_var(name) {
                Some(v) => out.push_str(&v.render(style)),
                None => out.push_str(raw),
            },
        }
    }
    out
}

/// Names referenced by the placeholders of a template.
pub fn placeholder_names(segments: &[Segment]) -> impl Iterator<Item = &str> {
    segments.iter().filter_map(|seg| match seg {
        Segment::Var { name, .. } => Some(name.as_str()),
        Segment::Text(_) => None,
    })
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Identifier start: ASCII letter, `_`, or any non-ASCII character.
pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn read_ident(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut name = String::new();
    while let Some(c) = chars.next_if(|c| is_ident_continue(*c)) {
        name.push(c);
    }
    name
}

fn flush_text(segments: &mut Vec<Segment>, text: &mut String) {
    if !text.is_empty() {
        segments.push(Segment::Text(std::mem::take(text)));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::error::ErrorKind;
    use super::super::value::{BoolStyle, Value};
    use std::collections::HashMap;

    struct TestCtx {
        vars: HashMap<String, Value>,
        style: BoolStyle,
    }

    impl TestCtx {
        fn new() -> Self {
            TestCtx { vars: HashMap::new(), style: BoolStyle::Php }
        }
    }

    impl EvalContext for TestCtx {
        fn get_var(&self, name: &str) -> Option<Value> {
            self.vars.get(name).cloned()
        }
        fn get_const(&self, _: &str) -> Option<Value> {
            None
        }
        fn bool_style(&self) -> BoolStyle {
            self.style
        }
        fn call_fn(&mut self, name: &str, _: Vec<Value>) -> Result<Value, ErrorKind> {
            Err(ErrorKind::UnknownFunction(name.into()))
        }
    }

    fn exp(src: &str, ctx: &TestCtx) -> String {
        expand(&parse_template(src), ctx)
    }

    #[test]
    fn no_substitution() {
        let ctx = TestCtx::new();
        assert_eq!(exp("hello world", &ctx), "hello world");
        assert_eq!(parse_template("hello"), vec![Segment::Text("hello".into())]);
    }

    #[test]
    fn simple_var() {
        let mut ctx = TestCtx::new();
        ctx.vars.insert("nombre".into(), Value::from("Diego"));
        assert_eq!(exp("Hello $nombre", &ctx), "Hello Diego");
    }

    #[test]
    fn longest_identifier_wins() {
        let mut ctx = TestCtx::new();
        ctx.vars.insert("a".into(), Value::Int(1));
        ctx.vars.insert("ab".into(), Value::Int(2));
        assert_eq!(exp("$ab!", &ctx), "2!");
        assert_eq!(exp("$a-$ab", &ctx), "1-2");
    }

    #[test]
    fn unknown_var_left_unresolved() {
        let ctx = TestCtx::new();
        assert_eq!(exp("Price: $precio USD", &ctx), "Price: $precio USD");
        assert_eq!(exp("{$precio}s", &ctx), "{$precio}s");
    }

    #[test]
    fn braced_var() {
        let mut ctx = TestCtx::new();
        ctx.vars.insert("n".into(), Value::Int(3));
        assert_eq!(exp("{$n}rd", &ctx), "3rd");
        // No closing brace: the `{` is literal and `$n` still expands.
        assert_eq!(exp("{$n rd", &ctx), "{3 rd");
    }

    #[test]
    fn lone_dollar_is_literal() {
        let ctx = TestCtx::new();
        assert_eq!(exp("cost $5", &ctx), "cost $5");
        assert_eq!(exp("end$", &ctx), "end$");
    }

    #[test]
    fn escapes() {
        let mut ctx = TestCtx::new();
        ctx.vars.insert("x".into(), Value::Int(9));
        assert_eq!(exp(r"a\nb\tc", &ctx), "a\nb\tc");
        assert_eq!(exp(r"\$x is $x", &ctx), "$x is 9");
        assert_eq!(exp(r#"say \"hi\""#, &ctx), "say \"hi\"");
        assert_eq!(exp(r"C:\dir", &ctx), r"C:\dir");
    }

    #[test]
    fn non_ascii_identifiers() {
        let mut ctx = TestCtx::new();
        ctx.vars.insert("año".into(), Value::Int(2024));
        assert_eq!(exp("$año.", &ctx), "2024.");
    }

    #[test]
    fn bool_uses_context_style() {
        let mut ctx = TestCtx::new();
        ctx.vars.insert("on".into(), Value::Bool(true));
        assert_eq!(exp("on=$on", &ctx), "on=1");
        ctx.style = BoolStyle::Word;
        assert_eq!(exp("on=$on", &ctx), "on=true");
    }

    #[test]
    fn placeholder_names_lists_vars() {
        let segs = parse_template("$a and {$b} but not \\$c");
        let names: Vec<&str> = placeholder_names(&segs).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
