use crate::ast::LiteralKind;
use crate::lexer::NumberKind;

/// Runtime value of a plzero program.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Integer(i32),
    Bool(bool),
    String(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
    #[error("unsupported operation: {lhs} {op} {rhs}")]
    UnsupportedOperation { op: &'static str, lhs: &'static str, rhs: &'static str },
    #[error("unsupported operation: {op} {operand}")]
    UnsupportedUnary { op: &'static str, operand: &'static str },
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow in '{op}'")]
    IntegerOverflow { op: &'static str },
    #[error("invalid {kind} literal '{text}'")]
    InvalidLiteral { kind: &'static str, text: String },
}

pub type ValueResult<T> = Result<T, ValueError>;

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Double(n) => write!(f, "{}", n),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

// Both operands of a numeric operator after promotion.
enum Numeric {
    Ints(i32, i32),
    Doubles(f64, f64),
}

impl Value {
    /// Builds a value from the literal text the lexer produced.
    ///
    /// Number text may contain the digit-group separator `'`, which is
    /// dropped before parsing. Whether the number becomes an `Integer` or a
    /// `Double` was decided by the lexer when it saw (or did not see) a
    /// decimal point.
    pub fn from_literal(kind: LiteralKind, text: &str) -> ValueResult<Value> {
        match kind {
            LiteralKind::Number(number) => {
                let digits: String = text.chars().filter(|c| *c != '\'').collect();
                match number {
                    NumberKind::Integer => digits.parse::<i32>().map(Value::Integer).map_err(|_| {
                        ValueError::InvalidLiteral { kind: "integer", text: text.to_string() }
                    }),
                    NumberKind::Double => digits.parse::<f64>().map(Value::Double).map_err(|_| {
                        ValueError::InvalidLiteral { kind: "double", text: text.to_string() }
                    }),
                }
            }
            LiteralKind::String => Ok(Value::String(text.to_string())),
            LiteralKind::Bool => match text {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(ValueError::InvalidLiteral { kind: "bool", text: text.to_string() }),
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Double(_) => "double",
            Value::Integer(_) => "integer",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
        }
    }

    pub fn as_double(&self) -> ValueResult<f64> {
        match self {
            Value::Double(n) => Ok(*n),
            other => Err(other.mismatch("double")),
        }
    }

    pub fn as_int(&self) -> ValueResult<i32> {
        match self {
            Value::Integer(n) => Ok(*n),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_bool(&self) -> ValueResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_string(&self) -> ValueResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string")),
        }
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch { expected, found: self.type_name() }
    }

    fn unsupported(op: &'static str, lhs: &Value, rhs: &Value) -> ValueError {
        ValueError::UnsupportedOperation { op, lhs: lhs.type_name(), rhs: rhs.type_name() }
    }

    fn numeric(op: &'static str, lhs: &Value, rhs: &Value) -> ValueResult<Numeric> {
        match (lhs, rhs) {
            (Value::Integer(a), Value::Integer(b)) => Ok(Numeric::Ints(*a, *b)),
            (Value::Integer(a), Value::Double(b)) => Ok(Numeric::Doubles(*a as f64, *b)),
            (Value::Double(a), Value::Integer(b)) => Ok(Numeric::Doubles(*a, *b as f64)),
            (Value::Double(a), Value::Double(b)) => Ok(Numeric::Doubles(*a, *b)),
            _ => Err(Value::unsupported(op, lhs, rhs)),
        }
    }

    // ── Unary ────────────────────────────────────────────────────────

    pub fn negate(&self) -> ValueResult<Value> {
        match self {
            Value::Integer(n) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or(ValueError::IntegerOverflow { op: "-" }),
            Value::Double(n) => Ok(Value::Double(-n)),
            other => Err(ValueError::UnsupportedUnary { op: "-", operand: other.type_name() }),
        }
    }

    pub fn not(&self) -> ValueResult<Value> {
        match self {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(ValueError::UnsupportedUnary { op: "!", operand: other.type_name() }),
        }
    }

    // ── Arithmetic ───────────────────────────────────────────────────

    pub fn add(&self, rhs: &Value) -> ValueResult<Value> {
        if let (Value::String(a), Value::String(b)) = (self, rhs) {
            return Ok(Value::String(format!("{a}{b}")));
        }
        match Value::numeric("+", self, rhs)? {
            Numeric::Ints(a, b) => a
                .checked_add(b)
                .map(Value::Integer)
                .ok_or(ValueError::IntegerOverflow { op: "+" }),
            Numeric::Doubles(a, b) => Ok(Value::Double(a + b)),
        }
    }

    pub fn subtract(&self, rhs: &Value) -> ValueResult<Value> {
        match Value::numeric("-", self, rhs)? {
            Numeric::Ints(a, b) => a
                .checked_sub(b)
                .map(Value::Integer)
                .ok_or(ValueError::IntegerOverflow { op: "-" }),
            Numeric::Doubles(a, b) => Ok(Value::Double(a - b)),
        }
    }

    pub fn multiply(&self, rhs: &Value) -> ValueResult<Value> {
        match Value::numeric("*", self, rhs)? {
            Numeric::Ints(a, b) => a
                .checked_mul(b)
                .map(Value::Integer)
                .ok_or(ValueError::IntegerOverflow { op: "*" }),
            Numeric::Doubles(a, b) => Ok(Value::Double(a * b)),
        }
    }

    /// Integer division truncates toward zero. Division by zero is an error
    /// for both integers and doubles.
    pub fn divide(&self, rhs: &Value) -> ValueResult<Value> {
        match Value::numeric("/", self, rhs)? {
            Numeric::Ints(_, 0) => Err(ValueError::DivisionByZero),
            Numeric::Ints(a, b) => a
                .checked_div(b)
                .map(Value::Integer)
                .ok_or(ValueError::IntegerOverflow { op: "/" }),
            Numeric::Doubles(_, b) if b == 0.0 => Err(ValueError::DivisionByZero),
            Numeric::Doubles(a, b) => Ok(Value::Double(a / b)),
        }
    }

    // ── Comparison ───────────────────────────────────────────────────

    pub fn less(&self, rhs: &Value) -> ValueResult<Value> {
        self.ordering("<", rhs, |a, b| a < b, |a, b| a < b)
    }

    pub fn less_equal(&self, rhs: &Value) -> ValueResult<Value> {
        self.ordering("<=", rhs, |a, b| a <= b, |a, b| a <= b)
    }

    pub fn greater(&self, rhs: &Value) -> ValueResult<Value> {
        self.ordering(">", rhs, |a, b| a > b, |a, b| a > b)
    }

    pub fn greater_equal(&self, rhs: &Value) -> ValueResult<Value> {
        self.ordering(">=", rhs, |a, b| a >= b, |a, b| a >= b)
    }

    fn ordering(
        &self,
        op: &'static str,
        rhs: &Value,
        ints: fn(i32, i32) -> bool,
        doubles: fn(f64, f64) -> bool,
    ) -> ValueResult<Value> {
        Ok(Value::Bool(match Value::numeric(op, self, rhs)? {
            Numeric::Ints(a, b) => ints(a, b),
            Numeric::Doubles(a, b) => doubles(a, b),
        }))
    }

    pub fn equal(&self, rhs: &Value) -> ValueResult<Value> {
        self.equality("==", rhs).map(Value::Bool)
    }

    pub fn not_equal(&self, rhs: &Value) -> ValueResult<Value> {
        self.equality("!=", rhs).map(|eq| Value::Bool(!eq))
    }

    fn equality(&self, op: &'static str, rhs: &Value) -> ValueResult<bool> {
        match (self, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            _ => match Value::numeric(op, self, rhs)? {
                Numeric::Ints(a, b) => Ok(a == b),
                Numeric::Doubles(a, b) => Ok(a == b),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literal_strips_separators() {
        let v = Value::from_literal(LiteralKind::Number(NumberKind::Integer), "1'000'000").unwrap();
        assert_eq!(v, Value::Integer(1_000_000));
    }

    #[test]
    fn double_literal_keeps_fraction() {
        let v = Value::from_literal(LiteralKind::Number(NumberKind::Double), "3.25").unwrap();
        assert_eq!(v, Value::Double(3.25));
    }

    #[test]
    fn integer_literal_out_of_range() {
        let err = Value::from_literal(LiteralKind::Number(NumberKind::Integer), "2'147'483'648").unwrap_err();
        assert!(matches!(err, ValueError::InvalidLiteral { kind: "integer", .. }));
    }

    #[test]
    fn bool_and_string_literals() {
        assert_eq!(Value::from_literal(LiteralKind::Bool, "true").unwrap(), Value::Bool(true));
        assert_eq!(Value::from_literal(LiteralKind::String, "hi").unwrap(), Value::from("hi"));
    }

    #[test]
    fn accessors_check_tag() {
        let v = Value::Integer(42);
        assert_eq!(v.as_int().unwrap(), 42);
        assert_eq!(v.as_int().unwrap(), 42);
        assert_eq!(
            v.as_double().unwrap_err(),
            ValueError::TypeMismatch { expected: "double", found: "integer" }
        );
        assert!(Value::Bool(true).as_string().is_err());
        assert_eq!(Value::from("x").as_string().unwrap(), "x");
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        assert_eq!(Value::Integer(7).subtract(&Value::Integer(2)).unwrap(), Value::Integer(5));
        assert_eq!(Value::Integer(7).divide(&Value::Integer(2)).unwrap(), Value::Integer(3));
        assert_eq!(Value::Integer(-7).divide(&Value::Integer(2)).unwrap(), Value::Integer(-3));
    }

    #[test]
    fn mixed_arithmetic_promotes() {
        assert_eq!(Value::Integer(1).add(&Value::Double(0.5)).unwrap(), Value::Double(1.5));
        assert_eq!(Value::Double(10.0).divide(&Value::Integer(4)).unwrap(), Value::Double(2.5));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(Value::from("ab").add(&Value::from("cd")).unwrap(), Value::from("abcd"));
    }

    #[test]
    fn string_minus_integer_unsupported() {
        let err = Value::from("ab").subtract(&Value::Integer(1)).unwrap_err();
        assert_eq!(
            err,
            ValueError::UnsupportedOperation { op: "-", lhs: "string", rhs: "integer" }
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(Value::Integer(1).divide(&Value::Integer(0)).unwrap_err(), ValueError::DivisionByZero);
        assert_eq!(Value::Double(1.0).divide(&Value::Double(0.0)).unwrap_err(), ValueError::DivisionByZero);
    }

    #[test]
    fn overflow_is_reported() {
        assert!(matches!(
            Value::Integer(i32::MAX).add(&Value::Integer(1)),
            Err(ValueError::IntegerOverflow { op: "+" })
        ));
        assert!(matches!(Value::Integer(i32::MIN).negate(), Err(ValueError::IntegerOverflow { .. })));
        assert!(matches!(
            Value::Integer(i32::MIN).divide(&Value::Integer(-1)),
            Err(ValueError::IntegerOverflow { op: "/" })
        ));
    }

    #[test]
    fn comparisons() {
        assert_eq!(Value::Integer(10).greater(&Value::Integer(5)).unwrap(), Value::Bool(true));
        assert_eq!(Value::Integer(2).less_equal(&Value::Double(2.0)).unwrap(), Value::Bool(true));
        assert_eq!(Value::Integer(3).equal(&Value::Double(3.0)).unwrap(), Value::Bool(true));
        assert_eq!(Value::from("a").not_equal(&Value::from("b")).unwrap(), Value::Bool(true));
        assert_eq!(Value::Bool(true).equal(&Value::Bool(true)).unwrap(), Value::Bool(true));
        assert!(Value::from("a").less(&Value::from("b")).is_err());
        assert!(Value::Bool(true).equal(&Value::Integer(1)).is_err());
    }

    #[test]
    fn unary_ops() {
        assert_eq!(Value::Integer(3).negate().unwrap(), Value::Integer(-3));
        assert_eq!(Value::Double(1.5).negate().unwrap(), Value::Double(-1.5));
        assert_eq!(Value::Bool(false).not().unwrap(), Value::Bool(true));
        assert!(Value::Integer(1).not().is_err());
        assert!(Value::from("s").negate().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(Value::Integer(7).to_string(), "7");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::from("abcd").to_string(), "abcd");
    }
}
