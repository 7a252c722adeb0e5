//! Dynamically typed snapshot values and three-valued truth.
//!
//! Snapshot entries are heterogeneous: a generator may track a counter, a
//! running total, a flag and a buffer side by side. [`Value`] is the tagged
//! union that holds any of them, and [`Truth`] is the result of comparing
//! values when one side may be missing.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Not, Rem, Sub};

/// Three-valued logic result.
///
/// Comparisons against [`Value::Missing`] produce `Undefined` rather than
/// silently picking `True` or `False`. Boolean-only contexts (such as the
/// continuation check of `yield_while`) turn `Undefined` into an error.
///
/// # Example
///
/// ```rust
/// use stepwise::core::Truth;
///
/// assert_eq!(Truth::True.and(Truth::Undefined), Truth::Undefined);
/// assert_eq!(Truth::False.and(Truth::Undefined), Truth::False);
/// assert_eq!(Truth::True.or(Truth::Undefined), Truth::True);
/// assert_eq!(!Truth::Undefined, Truth::Undefined);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Truth {
    True,
    False,
    Undefined,
}

impl Truth {
    pub fn is_true(self) -> bool {
        matches!(self, Truth::True)
    }

    pub fn is_false(self) -> bool {
        matches!(self, Truth::False)
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Truth::Undefined)
    }

    /// Definite boolean, or `None` when undefined.
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Truth::True => Some(true),
            Truth::False => Some(false),
            Truth::Undefined => None,
        }
    }

    /// Kleene conjunction: `False` dominates, then `Undefined`.
    pub fn and(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::False, _) | (_, Truth::False) => Truth::False,
            (Truth::True, Truth::True) => Truth::True,
            _ => Truth::Undefined,
        }
    }

    /// Kleene disjunction: `True` dominates, then `Undefined`.
    pub fn or(self, other: Truth) -> Truth {
        match (self, other) {
            (Truth::True, _) | (_, Truth::True) => Truth::True,
            (Truth::False, Truth::False) => Truth::False,
            _ => Truth::Undefined,
        }
    }

    /// Conjunction over every item. An empty input is vacuously `True`.
    ///
    /// Stops at the first `False`.
    pub fn all<I>(truths: I) -> Truth
    where
        I: IntoIterator<Item = Truth>,
    {
        let mut acc = Truth::True;
        for truth in truths {
            match truth {
                Truth::False => return Truth::False,
                Truth::Undefined => acc = Truth::Undefined,
                Truth::True => {}
            }
        }
        acc
    }

    /// Disjunction over every item. An empty input is `False`.
    pub fn any<I>(truths: I) -> Truth
    where
        I: IntoIterator<Item = Truth>,
    {
        let mut acc = Truth::False;
        for truth in truths {
            match truth {
                Truth::True => return Truth::True,
                Truth::Undefined => acc = Truth::Undefined,
                Truth::False => {}
            }
        }
        acc
    }
}

impl Not for Truth {
    type Output = Truth;

    fn not(self) -> Truth {
        match self {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Undefined => Truth::Undefined,
        }
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }
}

impl From<Option<bool>> for Truth {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Truth::Undefined, Truth::from)
    }
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truth::True => write!(f, "true"),
            Truth::False => write!(f, "false"),
            Truth::Undefined => write!(f, "undefined"),
        }
    }
}

/// A single snapshot entry.
///
/// Arithmetic is permissive: booleans count as 0 and 1, a `Missing`
/// operand makes the whole result `Missing`, and sequences combine
/// element-wise with scalars or with sequences of the same length.
/// Integer results stay integers whenever they are exact.
///
/// # Example
///
/// ```rust
/// use stepwise::core::{Truth, Value};
///
/// let n = Value::from(7);
/// assert_eq!(&n * 3 + 1, Value::Int(22));
/// assert_eq!(&n / 2, Value::Float(3.5));
/// assert_eq!(&n + Value::Missing, Value::Missing);
///
/// assert_eq!(n.greater_than(5), Truth::True);
/// assert_eq!(n.eq_to(Value::Missing), Truth::Undefined);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Seq(Vec<Value>),
    #[default]
    Missing,
}

#[derive(Clone, Copy, Debug)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }

    fn partial_cmp(self, other: Num) -> Option<Ordering> {
        match (self, other) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    fn apply(self, lhs: Num, rhs: Num) -> Value {
        match (lhs, rhs) {
            (Num::Int(a), Num::Int(b)) => self.apply_int(a, b),
            (a, b) => self.apply_float(a.as_f64(), b.as_f64()),
        }
    }

    fn apply_int(self, a: i64, b: i64) -> Value {
        let exact = match self {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Sub => a.checked_sub(b),
            ArithOp::Mul => a.checked_mul(b),
            ArithOp::Div if b == 0 => return Value::Missing,
            ArithOp::Div if a.checked_rem(b) != Some(0) => {
                return Value::Float(a as f64 / b as f64)
            }
            ArithOp::Div => a.checked_div(b),
            ArithOp::Rem if b == 0 => return Value::Missing,
            ArithOp::Rem => a.checked_rem_euclid(b),
        };
        // Overflow falls back to floating point.
        exact.map_or_else(|| self.apply_float(a as f64, b as f64), Value::Int)
    }

    fn apply_float(self, a: f64, b: f64) -> Value {
        match self {
            ArithOp::Add => Value::Float(a + b),
            ArithOp::Sub => Value::Float(a - b),
            ArithOp::Mul => Value::Float(a * b),
            ArithOp::Div | ArithOp::Rem if b == 0.0 => Value::Missing,
            ArithOp::Div => Value::Float(a / b),
            ArithOp::Rem => Value::Float(a.rem_euclid(b)),
        }
    }
}

fn combine(lhs: &Value, rhs: &Value, op: ArithOp) -> Value {
    match (lhs, rhs) {
        (Value::Missing, _) | (_, Value::Missing) => Value::Missing,
        (Value::Seq(a), Value::Seq(b)) => {
            if a.len() == b.len() {
                Value::Seq(a.iter().zip(b).map(|(x, y)| combine(x, y, op)).collect())
            } else {
                Value::Missing
            }
        }
        (Value::Seq(a), scalar) => Value::Seq(a.iter().map(|x| combine(x, scalar, op)).collect()),
        (scalar, Value::Seq(b)) => Value::Seq(b.iter().map(|y| combine(scalar, y, op)).collect()),
        (a, b) => match (a.numeric(), b.numeric()) {
            (Some(x), Some(y)) => op.apply(x, y),
            _ => Value::Missing,
        },
    }
}

impl Value {
    /// Integer sequence `start, start + 1, ..., end - 1`.
    ///
    /// Returns `Missing` unless both bounds are integral. An empty range is
    /// an empty sequence.
    ///
    /// ```rust
    /// use stepwise::core::Value;
    ///
    /// assert_eq!(Value::range(2, 5), Value::from(vec![2, 3, 4]));
    /// assert_eq!(Value::range(2, 2), Value::Seq(vec![]));
    /// assert_eq!(Value::range(2, Value::Missing), Value::Missing);
    /// ```
    pub fn range(start: impl Into<Value>, end: impl Into<Value>) -> Value {
        match (start.into().as_i64(), end.into().as_i64()) {
            (Some(start), Some(end)) => Value::Seq((start..end).map(Value::Int).collect()),
            _ => Value::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Seq(_) => "sequence",
            Value::Missing => "missing",
        }
    }

    /// Integer view: integers, and floats with no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.numeric().map(Num::as_f64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Non-negative integer view, for positions into sequences.
    pub fn as_index(&self) -> Option<usize> {
        self.as_i64().and_then(|i| usize::try_from(i).ok())
    }

    fn numeric(&self) -> Option<Num> {
        match self {
            Value::Int(i) => Some(Num::Int(*i)),
            Value::Float(f) => Some(Num::Float(*f)),
            Value::Bool(b) => Some(Num::Int(i64::from(*b))),
            Value::Seq(_) | Value::Missing => None,
        }
    }

    fn ordering(&self, other: &Value) -> Option<Ordering> {
        self.numeric()?.partial_cmp(other.numeric()?)
    }

    /// Three-valued equality.
    ///
    /// Sequences are equal when they have the same length and every pair
    /// is equal.
    pub fn eq_to(&self, other: impl Into<Value>) -> Truth {
        let other = other.into();
        match (self, &other) {
            (Value::Missing, _) | (_, Value::Missing) => Truth::Undefined,
            (Value::Seq(a), Value::Seq(b)) => {
                if a.len() != b.len() {
                    return Truth::False;
                }
                Truth::all(a.iter().zip(b).map(|(x, y)| x.eq_to(y)))
            }
            (Value::Seq(_), _) | (_, Value::Seq(_)) => Truth::Undefined,
            (a, b) => a.ordering(b).map(|o| o == Ordering::Equal).into(),
        }
    }

    pub fn ne_to(&self, other: impl Into<Value>) -> Truth {
        !self.eq_to(other)
    }

    pub fn less_than(&self, other: impl Into<Value>) -> Truth {
        self.compare(&other.into(), |o| o == Ordering::Less)
    }

    pub fn at_most(&self, other: impl Into<Value>) -> Truth {
        self.compare(&other.into(), |o| o != Ordering::Greater)
    }

    pub fn greater_than(&self, other: impl Into<Value>) -> Truth {
        self.compare(&other.into(), |o| o == Ordering::Greater)
    }

    pub fn at_least(&self, other: impl Into<Value>) -> Truth {
        self.compare(&other.into(), |o| o != Ordering::Less)
    }

    fn compare(&self, other: &Value, accept: impl Fn(Ordering) -> bool) -> Truth {
        self.ordering(other).map(accept).into()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Missing => write!(f, "missing"),
        }
    }
}

macro_rules! arith_impl {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Into<Value>> $trait<T> for Value {
            type Output = Value;

            fn $method(self, rhs: T) -> Value {
                combine(&self, &rhs.into(), $op)
            }
        }

        impl<T: Into<Value>> $trait<T> for &Value {
            type Output = Value;

            fn $method(self, rhs: T) -> Value {
                combine(self, &rhs.into(), $op)
            }
        }
    };
}

arith_impl!(Add, add, ArithOp::Add);
arith_impl!(Sub, sub, ArithOp::Sub);
arith_impl!(Mul, mul, ArithOp::Mul);
arith_impl!(Div, div, ArithOp::Div);
arith_impl!(Rem, rem, ArithOp::Rem);

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Value::Float(value as f64), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Missing, Into::into)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Seq(iter.into_iter().map(Into::into).collect())
    }
}
