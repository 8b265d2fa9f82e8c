//! Operations on values.
//!
//! Arithmetic, comparison and logical operators as the evaluator applies
//! them to two already-classified operands.

use std::cmp::Ordering;

use dynval_numeric::{self as numeric, ArithOp};

use super::value::{EvalError, EvalResult, Value};
use crate::core::syntax::token::Operator;

/// Polymorphic `+`: numeric sum, or concatenation of display texts when
/// either side is a string.
pub fn add(lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(numeric::apply(
            ArithOp::Add,
            *a,
            *b,
        )?)),
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", lhs.display(), rhs.display())))
        }
        _ => Err(mismatch("number or String", lhs, rhs)),
    }
}

/// A numeric-only operator.
pub fn arith(op: ArithOp, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(numeric::apply(op, *a, *b)?)),
        _ => Err(mismatch("number", lhs, rhs)),
    }
}

/// Order two values: numbers after promotion, strings lexicographically.
/// `None` when either side is NaN.
pub fn compare(lhs: &Value, rhs: &Value) -> EvalResult<Option<Ordering>> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(numeric::compare(*a, *b)),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        _ => Err(mismatch("number or String", lhs, rhs)),
    }
}

fn booleans(lhs: &Value, rhs: &Value) -> EvalResult<(bool, bool)> {
    match (lhs, rhs) {
        (Value::Bool(a), Value::Bool(b)) => Ok((*a, *b)),
        _ => Err(mismatch("Boolean", lhs, rhs)),
    }
}

/// The type error for whichever operand is off.
fn mismatch(expected: &str, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::wrong_input(expected, format!("{} and {}", lhs.type_name(), rhs.type_name()))
}

/// Apply a binary operator.
pub fn binary(op: Operator, lhs: &Value, rhs: &Value) -> EvalResult<Value> {
    let ordered = |accept: fn(Ordering) -> bool| -> EvalResult<Value> {
        Ok(Value::Bool(compare(lhs, rhs)?.map_or(false, accept)))
    };

    match op {
        Operator::Add => add(lhs, rhs),
        Operator::Sub => arith(ArithOp::Sub, lhs, rhs),
        Operator::Mul => arith(ArithOp::Mul, lhs, rhs),
        Operator::Div => arith(ArithOp::Div, lhs, rhs),
        Operator::Rem => arith(ArithOp::Rem, lhs, rhs),
        Operator::Pow => arith(ArithOp::Pow, lhs, rhs),
        Operator::Lt => ordered(|o| o == Ordering::Less),
        Operator::Le => ordered(|o| o != Ordering::Greater),
        Operator::Gt => ordered(|o| o == Ordering::Greater),
        Operator::Ge => ordered(|o| o != Ordering::Less),
        Operator::Eq => Ok(Value::Bool(lhs == rhs)),
        Operator::Ne => Ok(Value::Bool(lhs != rhs)),
        Operator::And => booleans(lhs, rhs).map(|(a, b)| Value::Bool(a && b)),
        Operator::Or => booleans(lhs, rhs).map(|(a, b)| Value::Bool(a || b)),
        Operator::Not => Err(EvalError::wrong_input("binary operator", "`!`")),
    }
}

/// Apply the prefix `!`.
pub fn not(operand: &Value) -> EvalResult<Value> {
    operand.as_bool().map(|b| Value::Bool(!b))
}

impl Value {
    /// Polymorphic `+`, see [`add`].
    pub fn add(&self, rhs: &Value) -> EvalResult<Value> {
        add(self, rhs)
    }
}
