use std::path::Path;

use proptest::prelude::*;
use phpsnip::script::expand::{expand, parse_template};
use phpsnip::script::stmt::parse_script;
use phpsnip::script::{ErrorKind, Interpreter, Value};

fn load_sample(rel: &str) -> Interpreter {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scripts").join(rel);
    let src = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    let mut interp = Interpreter::new();
    interp.exec_script(&src).unwrap_or_else(|e| panic!("{rel}: {e}"));
    interp
}

fn eval_call(interp: &mut Interpreter, call: &str) -> Result<Value, ErrorKind> {
    match interp.exec_script(&format!("$r = {call};")) {
        Ok(()) => Ok(interp.get_global_var("r").cloned().unwrap_or_default()),
        Err(e) => Err(e.kind().cloned().expect("runtime error")),
    }
}

proptest! {
    /// The parser returns Ok or Err for any input; it never panics.
    #[test]
    fn parser_does_not_panic(s in "\\PC*") {
        let _ = parse_script(&s);
    }

    /// Running arbitrary input never panics either.
    #[test]
    fn interpreter_does_not_panic(s in "[$a-z0-9 =;.+*/()<>!&|\"'{}-]{0,64}") {
        let mut interp = Interpreter::new();
        let _ = interp.exec_script(&s);
    }
}

proptest! {
    #[test]
    fn adder_sums(a in any::<i32>(), b in any::<i32>()) {
        let mut interp = load_sample("function/adder.php");
        let r = eval_call(&mut interp, &format!("adder({a}, {b})"));
        prop_assert_eq!(r, Ok(Value::Int(i64::from(a) + i64::from(b))));
    }

    #[test]
    fn doubled_adder_doubles(a in any::<i32>(), b in any::<i32>()) {
        let mut interp = load_sample("function/adder_doubled.php");
        let r = eval_call(&mut interp, &format!("adder({a}, {b})"));
        prop_assert_eq!(r, Ok(Value::Int((i64::from(a) + i64::from(b)) * 2)));
    }

    #[test]
    fn integer_comparisons_match_native(a in any::<i64>(), b in any::<i64>()) {
        let mut interp = Interpreter::new();
        for (op, expected) in [
            ("<", a < b),
            ("<=", a <= b),
            (">", a > b),
            (">=", a >= b),
            ("==", a == b),
            ("!=", a != b),
        ] {
            let r = eval_call(&mut interp, &format!("({a}) {op} ({b})"));
            prop_assert_eq!(r, Ok(Value::Bool(expected)), "{} {} {}", a, op, b);
        }
    }

    #[test]
    fn integer_division_is_exact_or_float(
        a in -1_000_000i32..1_000_000,
        b in prop_oneof![-1000i32..0, 1i32..1000],
    ) {
        let mut interp = Interpreter::new();
        let r = eval_call(&mut interp, &format!("({a}) / ({b})"));
        let expected = if a % b == 0 {
            Value::Int(i64::from(a / b))
        } else {
            Value::Float(f64::from(a) / f64::from(b))
        };
        prop_assert_eq!(r, Ok(expected));
    }

    #[test]
    fn adder_overflow_is_an_error(b in 1i64..1000) {
        let mut interp = load_sample("function/adder.php");
        let r = eval_call(&mut interp, &format!("adder({}, {b})", i64::MAX));
        prop_assert_eq!(r, Err(ErrorKind::Overflow("+")));
    }
}

proptest! {
    /// Text with no `$`, `\` or `{` passes through a template unchanged.
    #[test]
    fn plain_text_is_identity(s in "[^$\\\\{]*") {
        let interp = Interpreter::new();
        prop_assert_eq!(expand(&parse_template(&s), &interp), s);
    }

    /// Placeholders without a binding stay exactly as written.
    #[test]
    fn unbound_placeholder_kept(name in "[a-z_][a-z0-9_]{0,8}", braced in any::<bool>()) {
        let text = if braced { format!("<{{${name}}}>") } else { format!("<${name}>") };
        let interp = Interpreter::new();
        prop_assert_eq!(expand(&parse_template(&text), &interp), text);
    }

    #[test]
    fn bound_placeholder_substituted(name in "[a-z_][a-z0-9_]{0,8}", n in any::<i64>()) {
        let mut interp = Interpreter::new();
        interp.set_global_var(name.clone(), Value::Int(n));
        let text = format!("<${name}>");
        prop_assert_eq!(expand(&parse_template(&text), &interp), format!("<{n}>"));
    }
}

proptest! {
    /// A rejected reassignment leaves the constant's value untouched.
    #[test]
    fn constants_are_immutable(first in any::<i32>(), second in any::<i32>()) {
        let mut interp = Interpreter::new();
        interp.exec_script(&format!("const MAX_USERS = {first};")).unwrap();
        let err = interp.exec_script(&format!("MAX_USERS = {second};")).unwrap_err();
        prop_assert_eq!(err.kind(), Some(&ErrorKind::ConstantReassignment("MAX_USERS".into())));
        prop_assert_eq!(interp.get_global_const("MAX_USERS"), Some(&Value::Int(i64::from(first))));
    }
}
