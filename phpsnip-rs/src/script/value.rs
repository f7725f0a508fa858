//! Runtime value type for snippet scripts.
//!
//! Variables are loosely typed: a binding holds whichever variant was last
//! assigned to it, and operators check the variants at the point of use.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::error::ErrorKind;

/// A script runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

/// How booleans are rendered when converted to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolStyle {
    /// `true` renders as `1`, `false` as the empty string.
    #[default]
    Php,
    /// `true` / `false`.
    Word,
}

impl FromStr for BoolStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "php" => Ok(BoolStyle::Php),
            "word" => Ok(BoolStyle::Word),
            other => Err(format!("unknown bool style '{other}' (expected php or word)")),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Str(String::new())
    }
}

impl fmt::Display for Value {
    /// Renders with the default [`BoolStyle`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(BoolStyle::default()))
    }
}

impl Value {
    /// Text form of the value, as produced by concatenation and output.
    pub fn render(&self, style: BoolStyle) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            // `{}` on f64 already drops a zero fraction: 3.0 -> "3".
            Value::Float(x) => format!("{x}"),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => match (style, b) {
                (BoolStyle::Php, true) => "1".to_owned(),
                (BoolStyle::Php, false) => String::new(),
                (BoolStyle::Word, true) => "true".to_owned(),
                (BoolStyle::Word, false) => "false".to_owned(),
            },
        }
    }

    /// Name of the type, as used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
        }
    }

    // ── Arithmetic helpers ────────────────────────────────────────────────────

    pub fn arith_add(&self, rhs: &Value) -> Result<Value, ErrorKind> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_add(*b).map(Value::Int).ok_or(ErrorKind::Overflow("+"))
            }
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
            _ => Err(self.mismatch("+", rhs)),
        }
    }

    pub fn arith_sub(&self, rhs: &Value) -> Result<Value, ErrorKind> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_sub(*b).map(Value::Int).ok_or(ErrorKind::Overflow("-"))
            }
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
            _ => Err(self.mismatch("-", rhs)),
        }
    }

    pub fn arith_mul(&self, rhs: &Value) -> Result<Value, ErrorKind> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => {
                a.checked_mul(*b).map(Value::Int).ok_or(ErrorKind::Overflow("*"))
            }
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
            _ => Err(self.mismatch("*", rhs)),
        }
    }

    pub fn arith_neg(&self) -> Result<Value, ErrorKind> {
        match self {
            Value::Int(n) => n.checked_neg().map(Value::Int).ok_or(ErrorKind::Overflow("-")),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(ErrorKind::TypeMismatch {
                op: "-",
                left: "",
                right: other.type_name(),
            }),
        }
    }

    /// `/`.  Integer division stays an integer only when it is exact;
    /// otherwise the result is a float.
    pub fn arith_div(&self, rhs: &Value) -> Result<Value, ErrorKind> {
        match (self, rhs) {
            (Value::Int(_), Value::Int(0)) => Err(ErrorKind::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => match a.checked_rem(*b) {
                None => Err(ErrorKind::Overflow("/")),
                Some(0) => Ok(Value::Int(a / b)),
                Some(_) => Ok(Value::Float(*a as f64 / *b as f64)),
            },
            (Value::Float(_), Value::Float(b)) if *b == 0.0 => Err(ErrorKind::DivisionByZero),
            (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
            _ => Err(self.mismatch("/", rhs)),
        }
    }

    /// Truthiness, as used by `if`, `&&` and `||`: `0`, `0.0`, `""`, `"0"`
    /// and `false` are false.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty() && s != "0",
            Value::Bool(b) => *b,
        }
    }

    /// `==`.  Numbers compare by value across int and float, a bool compares
    /// against the other side's truthiness, and any other pair of different
    /// types is unequal.
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), other) | (other, Value::Bool(a)) => *a == other.as_bool(),
            _ => false,
        }
    }

    /// Ordering for `< > <= >=`: numbers by value, strings byte-wise,
    /// booleans with `false < true`.
    pub fn compare(&self, rhs: &Value, op: &'static str) -> Result<Ordering, ErrorKind> {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Ok(a.total_cmp(b)),
            (Value::Int(a), Value::Float(b)) => Ok((*a as f64).total_cmp(b)),
            (Value::Float(a), Value::Int(b)) => Ok(a.total_cmp(&(*b as f64))),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            _ => Err(self.mismatch(op, rhs)),
        }
    }

    /// `.` operator: both sides rendered to text and joined.
    pub fn concat(&self, rhs: &Value, style: BoolStyle) -> Value {
        let mut s = self.render(style);
        s.push_str(&rhs.render(style));
        Value::Str(s)
    }

    fn mismatch(&self, op: &'static str, rhs: &Value) -> ErrorKind {
        ErrorKind::TypeMismatch {
            op,
            left: self.type_name(),
            right: rhs.type_name(),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_int() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Int(-7).to_string(), "-7");
    }

    #[test]
    fn display_float() {
        assert_eq!(Value::Float(19.99).to_string(), "19.99");
        assert_eq!(Value::Float(3.14159).to_string(), "3.14159");
        assert_eq!(Value::Float(3.0).to_string(), "3");
    }

    #[test]
    fn render_bool_styles() {
        assert_eq!(Value::Bool(true).render(BoolStyle::Php), "1");
        assert_eq!(Value::Bool(false).render(BoolStyle::Php), "");
        assert_eq!(Value::Bool(true).render(BoolStyle::Word), "true");
        assert_eq!(Value::Bool(false).render(BoolStyle::Word), "false");
    }

    #[test]
    fn bool_style_from_str() {
        assert_eq!("php".parse::<BoolStyle>(), Ok(BoolStyle::Php));
        assert_eq!(" Word ".parse::<BoolStyle>(), Ok(BoolStyle::Word));
        assert!("yes".parse::<BoolStyle>().is_err());
    }

    #[test]
    fn arithmetic() {
        let a = Value::Int(10);
        let b = Value::Int(3);
        assert_eq!(a.arith_add(&b), Ok(Value::Int(13)));
        assert_eq!(a.arith_sub(&b), Ok(Value::Int(7)));
        assert_eq!(a.arith_mul(&b), Ok(Value::Int(30)));
        assert_eq!(
            Value::Float(1.5).arith_add(&Value::Float(2.0)),
            Ok(Value::Float(3.5))
        );
    }

    #[test]
    fn mixed_numeric_types_are_rejected() {
        let err = Value::Int(7).arith_add(&Value::Float(2.0)).unwrap_err();
        assert_eq!(
            err,
            ErrorKind::TypeMismatch { op: "+", left: "int", right: "float" }
        );
    }

    #[test]
    fn text_operands_are_rejected() {
        assert!(matches!(
            Value::from("5").arith_mul(&Value::Int(2)),
            Err(ErrorKind::TypeMismatch { op: "*", .. })
        ));
        assert!(Value::Bool(true).arith_neg().is_err());
    }

    #[test]
    fn overflow() {
        assert_eq!(
            Value::Int(i64::MAX).arith_add(&Value::Int(1)),
            Err(ErrorKind::Overflow("+"))
        );
        assert_eq!(Value::Int(i64::MIN).arith_neg(), Err(ErrorKind::Overflow("-")));
    }

    #[test]
    fn division() {
        assert_eq!(Value::Int(10).arith_div(&Value::Int(2)), Ok(Value::Int(5)));
        assert_eq!(Value::Int(10).arith_div(&Value::Int(4)), Ok(Value::Float(2.5)));
        assert_eq!(Value::Float(1.0).arith_div(&Value::Float(4.0)), Ok(Value::Float(0.25)));
        assert_eq!(Value::Int(1).arith_div(&Value::Int(0)), Err(ErrorKind::DivisionByZero));
        assert_eq!(
            Value::Float(1.0).arith_div(&Value::Float(0.0)),
            Err(ErrorKind::DivisionByZero)
        );
        assert_eq!(
            Value::Int(i64::MIN).arith_div(&Value::Int(-1)),
            Err(ErrorKind::Overflow("/"))
        );
        assert!(Value::Int(1).arith_div(&Value::Float(2.0)).is_err());
    }

    #[test]
    fn truthiness() {
        let falsy = [
            Value::Int(0),
            Value::Float(0.0),
            Value::from(""),
            Value::from("0"),
            Value::Bool(false),
        ];
        for v in falsy {
            assert!(!v.as_bool(), "{v:?}");
        }
        for v in [Value::Int(-1), Value::Float(0.5), Value::from("no"), Value::Bool(true)] {
            assert!(v.as_bool(), "{v:?}");
        }
    }

    #[test]
    fn equality() {
        assert!(Value::Int(2).loose_eq(&Value::Float(2.0)));
        assert!(Value::from("a").loose_eq(&Value::from("a")));
        assert!(Value::Bool(true).loose_eq(&Value::Int(5)));
        assert!(Value::from("").loose_eq(&Value::Bool(false)));
        assert!(!Value::from("1").loose_eq(&Value::Int(1)));
    }

    #[test]
    fn ordering() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5), "<"), Ok(Ordering::Less));
        assert_eq!(Value::from("b").compare(&Value::from("a"), ">"), Ok(Ordering::Greater));
        assert_eq!(Value::Bool(false).compare(&Value::Bool(true), "<"), Ok(Ordering::Less));
        assert_eq!(
            Value::from("1").compare(&Value::Int(1), "<="),
            Err(ErrorKind::TypeMismatch { op: "<=", left: "string", right: "int" })
        );
    }

    #[test]
    fn concat_renders_both_sides() {
        let v = Value::from("Price: ").concat(&Value::Float(19.99), BoolStyle::Php);
        assert_eq!(v, Value::from("Price: 19.99"));
        let v = Value::Bool(true).concat(&Value::from("\n"), BoolStyle::Php);
        assert_eq!(v, Value::from("1\n"));
    }

    #[test]
    fn from_impls() {
        let v: Value = 42i64.into();
        assert_eq!(v, Value::Int(42));
        let v: Value = "hi".into();
        assert_eq!(v, Value::Str("hi".into()));
        let v: Value = true.into();
        assert_eq!(v, Value::Bool(true));
    }
}
