//! Numeric widths, promotion and narrowing for dynamic values.
//!
//! Every number carried by a dynamic value has one of six widths. Binary
//! operations first promote both operands to their [`common_type`], compute,
//! and then narrow the result back to the smallest width that holds it
//! exactly ([`Number::shrink_to_smallest`]).

use std::cmp::Ordering;
use std::fmt;

// ============================================================================
// Widths
// ============================================================================

/// The width of a stored number.
///
/// Declaration order is the promotion lattice: integral widths grow from
/// `Byte` to `Int64`, any float dominates any integral width and `Float64`
/// dominates `Float32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumericType {
    /// Signed 8-bit integer
    Byte,
    /// Signed 16-bit integer
    Short,
    /// Signed 32-bit integer
    Int32,
    /// Signed 64-bit integer
    Int64,
    /// Single-precision float
    Float32,
    /// Double-precision float
    Float64,
}

/// Candidate widths tried by [`Number::shrink_to_smallest`], narrowest first.
const SHRINK_ORDER: [NumericType; 5] = [
    NumericType::Byte,
    NumericType::Short,
    NumericType::Int32,
    NumericType::Int64,
    NumericType::Float32,
];

impl NumericType {
    /// All widths in lattice order.
    pub const ALL: [NumericType; 6] = [
        NumericType::Byte,
        NumericType::Short,
        NumericType::Int32,
        NumericType::Int64,
        NumericType::Float32,
        NumericType::Float64,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            NumericType::Byte => "Byte",
            NumericType::Short => "Short",
            NumericType::Int32 => "Int32",
            NumericType::Int64 => "Int64",
            NumericType::Float32 => "Float32",
            NumericType::Float64 => "Float64",
        }
    }

    pub fn is_integral(&self) -> bool {
        !self.is_floating()
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, NumericType::Float32 | NumericType::Float64)
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The narrowest width both operands of a binary operation promote to.
///
/// Symmetric, and never narrower than either input.
pub fn common_type(a: NumericType, b: NumericType) -> NumericType {
    a.max(b)
}

// ============================================================================
// Numbers
// ============================================================================

/// A number stored at a specific width.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Byte(i8),
    Short(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

impl Number {
    /// The width this number is stored at.
    pub fn numeric_type(&self) -> NumericType {
        match self {
            Number::Byte(_) => NumericType::Byte,
            Number::Short(_) => NumericType::Short,
            Number::Int32(_) => NumericType::Int32,
            Number::Int64(_) => NumericType::Int64,
            Number::Float32(_) => NumericType::Float32,
            Number::Float64(_) => NumericType::Float64,
        }
    }

    pub fn is_integral(&self) -> bool {
        self.numeric_type().is_integral()
    }

    pub fn is_floating(&self) -> bool {
        self.numeric_type().is_floating()
    }

    /// The exact integer value, if this number is stored at an integral width.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Byte(v) => Some(v as i64),
            Number::Short(v) => Some(v as i64),
            Number::Int32(v) => Some(v as i64),
            Number::Int64(v) => Some(v),
            Number::Float32(_) | Number::Float64(_) => None,
        }
    }

    /// The value as an `i64`, truncating and saturating floats.
    pub fn to_i64_saturating(&self) -> i64 {
        match *self {
            Number::Float32(v) => v as i64,
            Number::Float64(v) => v as i64,
            Number::Byte(v) => v as i64,
            Number::Short(v) => v as i64,
            Number::Int32(v) => v as i64,
            Number::Int64(v) => v,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Byte(v) => v as f64,
            Number::Short(v) => v as f64,
            Number::Int32(v) => v as f64,
            Number::Int64(v) => v as f64,
            Number::Float32(v) => v as f64,
            Number::Float64(v) => v,
        }
    }

    pub fn as_f32(&self) -> f32 {
        match *self {
            Number::Byte(v) => v as f32,
            Number::Short(v) => v as f32,
            Number::Int32(v) => v as f32,
            Number::Int64(v) => v as f32,
            Number::Float32(v) => v,
            Number::Float64(v) => v as f32,
        }
    }

    pub fn is_zero(&self) -> bool {
        match *self {
            Number::Byte(v) => v == 0,
            Number::Short(v) => v == 0,
            Number::Int32(v) => v == 0,
            Number::Int64(v) => v == 0,
            Number::Float32(v) => v == 0.0,
            Number::Float64(v) => v == 0.0,
        }
    }

    /// Reinterpret this number at `target` width with `as` semantics.
    ///
    /// Lossy when [`Number::can_narrow_to`] is false for `target`.
    pub fn cast(self, target: NumericType) -> Number {
        match self {
            Number::Float32(v) => cast_float(v as f64, target),
            Number::Float64(v) => cast_float(v, target),
            Number::Byte(v) => cast_int(v as i64, target),
            Number::Short(v) => cast_int(v as i64, target),
            Number::Int32(v) => cast_int(v as i64, target),
            Number::Int64(v) => cast_int(v, target),
        }
    }

    /// Whether reinterpreting this number at `target` loses nothing.
    ///
    /// Float sources are range-checked against the integral target's MIN/MAX
    /// converted to `f64`, which is imprecise right at the `Int64` boundary.
    pub fn can_narrow_to(&self, target: NumericType) -> bool {
        match *self {
            Number::Float32(v) => float_fits(v as f64, target),
            Number::Float64(v) => float_fits(v, target),
            Number::Byte(v) => int_fits(v as i64, target),
            Number::Short(v) => int_fits(v as i64, target),
            Number::Int32(v) => int_fits(v as i64, target),
            Number::Int64(v) => int_fits(v, target),
        }
    }

    /// Narrow to the smallest width that holds this value exactly.
    pub fn shrink_to_smallest(self) -> Number {
        let current = self.numeric_type();
        for target in SHRINK_ORDER {
            if target >= current {
                break;
            }
            if self.can_narrow_to(target) {
                return self.cast(target);
            }
        }
        self
    }
}

fn cast_int(v: i64, target: NumericType) -> Number {
    match target {
        NumericType::Byte => Number::Byte(v as i8),
        NumericType::Short => Number::Short(v as i16),
        NumericType::Int32 => Number::Int32(v as i32),
        NumericType::Int64 => Number::Int64(v),
        NumericType::Float32 => Number::Float32(v as f32),
        NumericType::Float64 => Number::Float64(v as f64),
    }
}

fn cast_float(v: f64, target: NumericType) -> Number {
    match target {
        NumericType::Byte => Number::Byte(v as i8),
        NumericType::Short => Number::Short(v as i16),
        NumericType::Int32 => Number::Int32(v as i32),
        NumericType::Int64 => Number::Int64(v as i64),
        NumericType::Float32 => Number::Float32(v as f32),
        NumericType::Float64 => Number::Float64(v),
    }
}

fn int_fits(v: i64, target: NumericType) -> bool {
    match target {
        NumericType::Byte => (i8::MIN as i64..=i8::MAX as i64).contains(&v),
        NumericType::Short => (i16::MIN as i64..=i16::MAX as i64).contains(&v),
        NumericType::Int32 => (i32::MIN as i64..=i32::MAX as i64).contains(&v),
        NumericType::Int64 => true,
        NumericType::Float32 => (v as f32) as i64 == v,
        NumericType::Float64 => (v as f64) as i64 == v,
    }
}

fn float_fits(v: f64, target: NumericType) -> bool {
    let (min, max) = match target {
        NumericType::Float64 => return true,
        NumericType::Float32 => return (v as f32) as f64 == v,
        NumericType::Byte => (i8::MIN as f64, i8::MAX as f64),
        NumericType::Short => (i16::MIN as f64, i16::MAX as f64),
        NumericType::Int32 => (i32::MIN as f64, i32::MAX as f64),
        NumericType::Int64 => (i64::MIN as f64, i64::MAX as f64),
    };
    v.is_finite() && v.fract() == 0.0 && v >= min && v <= max
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Number::Byte(v) => write!(f, "{}", v),
            Number::Short(v) => write!(f, "{}", v),
            Number::Int32(v) => write!(f, "{}", v),
            Number::Int64(v) => write!(f, "{}", v),
            // Printed through f64 so the text parses back to the same f32.
            Number::Float32(v) => write!(f, "{}", v as f64),
            Number::Float64(v) => write!(f, "{}", v),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        numeric_eq(*self, *other)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        compare(*self, *other)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Number {
                fn from(v: $ty) -> Self {
                    Number::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    i8 => Byte,
    i16 => Short,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}

// ============================================================================
// Arithmetic
// ============================================================================

/// A binary arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Failure of a numeric operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericError {
    DivisionByZero,
    /// The result overflowed to infinity or is not a number
    NonFinite,
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::DivisionByZero => write!(f, "division by zero"),
            NumericError::NonFinite => write!(f, "result is not a finite number"),
        }
    }
}

impl std::error::Error for NumericError {}

/// Apply `op` to two numbers.
///
/// Both operands are promoted to their common type first. Integral add, sub,
/// mul and rem run in `i64` and fall back to `f64` on overflow; div and pow
/// always run in a floating width. The result is shrunk to its smallest
/// exact width. Infinite and NaN results fail with `NonFinite`.
pub fn apply(op: ArithOp, lhs: Number, rhs: Number) -> Result<Number, NumericError> {
    let ty = common_type(lhs.numeric_type(), rhs.numeric_type());
    let (a, b) = (lhs.cast(ty), rhs.cast(ty));

    if matches!(op, ArithOp::Div | ArithOp::Rem) && b.is_zero() {
        return Err(NumericError::DivisionByZero);
    }

    let raw = match (op, ty) {
        (_, NumericType::Float32) => Number::Float32(float32_op(op, a.as_f32(), b.as_f32())),
        (_, NumericType::Float64) | (ArithOp::Div | ArithOp::Pow, _) => {
            Number::Float64(float64_op(op, a.as_f64(), b.as_f64()))
        }
        _ => integral_op(op, a.to_i64_saturating(), b.to_i64_saturating()),
    };
    if !raw.as_f64().is_finite() {
        return Err(NumericError::NonFinite);
    }

    Ok(raw.shrink_to_smallest())
}

fn integral_op(op: ArithOp, a: i64, b: i64) -> Number {
    let exact = match op {
        ArithOp::Add => a.checked_add(b),
        ArithOp::Sub => a.checked_sub(b),
        ArithOp::Mul => a.checked_mul(b),
        ArithOp::Rem => a.checked_rem(b),
        ArithOp::Div | ArithOp::Pow => None,
    };
    match exact {
        Some(v) => Number::Int64(v),
        None => Number::Float64(float64_op(op, a as f64, b as f64)),
    }
}

fn float64_op(op: ArithOp, a: f64, b: f64) -> f64 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
        ArithOp::Pow => a.powf(b),
    }
}

fn float32_op(op: ArithOp, a: f32, b: f32) -> f32 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Rem => a % b,
        ArithOp::Pow => a.powf(b),
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Compare two numbers after promoting both to their common type.
pub fn compare(lhs: Number, rhs: Number) -> Option<Ordering> {
    let ty = common_type(lhs.numeric_type(), rhs.numeric_type());
    match ty {
        NumericType::Float32 => lhs.as_f32().partial_cmp(&rhs.as_f32()),
        NumericType::Float64 => lhs.as_f64().partial_cmp(&rhs.as_f64()),
        _ => Some(lhs.to_i64_saturating().cmp(&rhs.to_i64_saturating())),
    }
}

/// Equality after promotion.
pub fn numeric_eq(lhs: Number, rhs: Number) -> bool {
    compare(lhs, rhs) == Some(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width(n: Number) -> NumericType {
        n.numeric_type()
    }

    #[test]
    fn test_common_type_lattice() {
        use NumericType::*;
        assert_eq!(common_type(Byte, Short), Short);
        assert_eq!(common_type(Int64, Int32), Int64);
        assert_eq!(common_type(Int64, Float32), Float32);
        assert_eq!(common_type(Float32, Float64), Float64);
        assert_eq!(common_type(Short, Short), Short);
    }

    #[test]
    fn test_shrink_integers() {
        assert_eq!(width(Number::Int64(5).shrink_to_smallest()), NumericType::Byte);
        assert_eq!(width(Number::Int64(300).shrink_to_smallest()), NumericType::Short);
        assert_eq!(width(Number::Int64(70_000).shrink_to_smallest()), NumericType::Int32);
        assert_eq!(
            width(Number::Int64(5_000_000_000).shrink_to_smallest()),
            NumericType::Int64
        );
        assert_eq!(width(Number::Int64(-128).shrink_to_smallest()), NumericType::Byte);
        assert_eq!(width(Number::Int64(-129).shrink_to_smallest()), NumericType::Short);
    }

    #[test]
    fn test_shrink_floats() {
        assert_eq!(width(Number::Float64(3.0).shrink_to_smallest()), NumericType::Byte);
        assert_eq!(width(Number::Float64(2.5).shrink_to_smallest()), NumericType::Float32);
        assert_eq!(width(Number::Float64(0.1).shrink_to_smallest()), NumericType::Float64);
        // 2^24 + 1 is not an f32 but still fits an Int32: the lossy step is skipped.
        assert_eq!(
            width(Number::Float64(16_777_217.0).shrink_to_smallest()),
            NumericType::Int32
        );
    }

    #[test]
    fn test_can_narrow_to() {
        assert!(Number::Int32(127).can_narrow_to(NumericType::Byte));
        assert!(!Number::Int32(128).can_narrow_to(NumericType::Byte));
        assert!(!Number::Float64(1.5).can_narrow_to(NumericType::Int64));
        assert!(!Number::Float64(f64::NAN).can_narrow_to(NumericType::Float32));
        assert!(!Number::Float64(f64::INFINITY).can_narrow_to(NumericType::Int64));
        assert!(Number::Float64(-32768.0).can_narrow_to(NumericType::Short));
    }

    #[test]
    fn test_apply_promotes_and_shrinks() {
        let sum = apply(ArithOp::Add, Number::Byte(100), Number::Byte(100)).unwrap();
        assert_eq!(width(sum), NumericType::Short);
        assert_eq!(sum.as_i64(), Some(200));

        let quotient = apply(ArithOp::Div, Number::Byte(10), Number::Byte(4)).unwrap();
        assert_eq!(width(quotient), NumericType::Float32);
        assert_eq!(quotient.as_f64(), 2.5);

        let whole = apply(ArithOp::Div, Number::Byte(10), Number::Byte(2)).unwrap();
        assert_eq!(whole.as_i64(), Some(5));
    }

    #[test]
    fn test_apply_overflow_falls_back_to_float() {
        // 2^64 is exact in f32
        let big = apply(ArithOp::Mul, Number::Int64(i64::MAX), Number::Byte(2)).unwrap();
        assert_eq!(width(big), NumericType::Float32);
        assert_eq!(big.as_f64(), 18_446_744_073_709_551_616.0);

        let n = Number::Int64(3_037_000_500);
        let square = apply(ArithOp::Mul, n, n).unwrap();
        assert_eq!(width(square), NumericType::Float64);
    }

    #[test]
    fn test_apply_rejects_non_finite_results() {
        assert_eq!(
            apply(ArithOp::Mul, Number::Float64(1e308), Number::Byte(10)),
            Err(NumericError::NonFinite)
        );
        assert_eq!(
            apply(ArithOp::Pow, Number::Byte(-1), Number::Float32(0.5)),
            Err(NumericError::NonFinite)
        );
        assert_eq!(
            apply(ArithOp::Add, Number::Float32(f32::MAX), Number::Float32(f32::MAX)),
            Err(NumericError::NonFinite)
        );
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            apply(ArithOp::Div, Number::Byte(1), Number::Byte(0)),
            Err(NumericError::DivisionByZero)
        );
        assert_eq!(
            apply(ArithOp::Rem, Number::Float64(1.5), Number::Float32(0.0)),
            Err(NumericError::DivisionByZero)
        );
    }

    #[test]
    fn test_compare_promotes() {
        assert_eq!(compare(Number::Byte(2), Number::Float64(2.5)), Some(Ordering::Less));
        assert!(numeric_eq(Number::Byte(5), Number::Float64(5.0)));
        assert!(Number::Int64(3) > Number::Short(-3));
    }

    #[test]
    fn test_display_float32_round_trips() {
        let text = Number::Float32(0.1).to_string();
        let parsed: f64 = text.parse().unwrap();
        assert_eq!(parsed as f32, 0.1f32);
        assert_eq!(Number::Float32(2.5).to_string(), "2.5");
    }
}
