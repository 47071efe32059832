//! Typed conditions
//!
//! A [`Condition`] is a single predicate over one field: an operator plus either a
//! scalar value or a value set. The value type is restricted to the closed family of
//! [`Conditionable`] types, each of which maps onto a [`ValueKind`] carrying the
//! operator legality rules for that kind.
//!
//! Conditions are plain values. Nothing is enforced when fields are assigned;
//! [`Condition::validate`] runs before every evaluation, hash or compilation.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use super::error::FilterError;
use super::op::Op;
use crate::utils::hash::fnv1a_32;

/// Semantic kind of a condition value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Unsigned,
    Float,
    String,
    Timestamp,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Unsigned => "unsigned integer",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Timestamp => "timestamp",
        }
    }

    /// Operator legality table for this kind
    pub fn allows(self, op: Op) -> bool {
        match self {
            ValueKind::String => !matches!(op, Op::Gt | Op::Ge | Op::Lt | Op::Le),
            ValueKind::Integer | ValueKind::Unsigned | ValueKind::Float | ValueKind::Timestamp => {
                !op.is_affix()
            }
        }
    }

    /// Set operators on this kind denote a `[start, end]` interval
    pub fn uses_intervals(self) -> bool {
        self == ValueKind::Timestamp
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueKind::Integer | ValueKind::Unsigned | ValueKind::Float
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type-erased condition value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Time(DateTime<Utc>),
}

impl Value {
    /// Unambiguous rendering: strings are quoted and escaped
    fn fingerprint(&self) -> String {
        match self {
            Value::Str(v) => format!("{:?}", v),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Time(v) => f.write_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Types a [`Condition`] can hold
pub trait Conditionable:
    sealed::Sealed + Clone + Default + PartialEq + PartialOrd + fmt::Debug + Send + Sync + 'static
{
    const KIND: ValueKind;

    fn to_value(&self) -> Value;

    /// Parse a textual literal into this type
    fn parse_literal(raw: &str) -> Result<Self, FilterError>;

    /// Textual view used by affix matching
    fn as_text(&self) -> Option<&str> {
        None
    }
}

fn unparsable(raw: &str, kind: ValueKind, reason: impl fmt::Display) -> FilterError {
    FilterError::UnparsableValue {
        value: raw.to_string(),
        kind,
        reason: reason.to_string(),
    }
}

macro_rules! conditionable_number {
    ($ty:ty, $kind:expr, $variant:ident, $wide:ty) => {
        impl sealed::Sealed for $ty {}

        impl Conditionable for $ty {
            const KIND: ValueKind = $kind;

            fn to_value(&self) -> Value {
                Value::$variant(<$wide>::from(*self))
            }

            fn parse_literal(raw: &str) -> Result<Self, FilterError> {
                raw.parse::<$ty>().map_err(|e| unparsable(raw, $kind, e))
            }
        }
    };
}

conditionable_number!(i32, ValueKind::Integer, Int, i64);
conditionable_number!(i64, ValueKind::Integer, Int, i64);
conditionable_number!(u32, ValueKind::Unsigned, UInt, u64);
conditionable_number!(u64, ValueKind::Unsigned, UInt, u64);
conditionable_number!(f64, ValueKind::Float, Float, f64);

impl sealed::Sealed for f32 {}

impl Conditionable for f32 {
    const KIND: ValueKind = ValueKind::Float;

    /// Widened through the shortest decimal form, so `0.1f32` stays `0.1`
    fn to_value(&self) -> Value {
        let wide = self.to_string().parse().unwrap_or(f64::from(*self));
        Value::Float(wide)
    }

    fn parse_literal(raw: &str) -> Result<Self, FilterError> {
        raw.parse::<f32>().map_err(|e| unparsable(raw, ValueKind::Float, e))
    }
}

impl sealed::Sealed for String {}

impl Conditionable for String {
    const KIND: ValueKind = ValueKind::String;

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn parse_literal(raw: &str) -> Result<Self, FilterError> {
        Ok(raw.to_string())
    }

    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl sealed::Sealed for DateTime<Utc> {}

impl Conditionable for DateTime<Utc> {
    const KIND: ValueKind = ValueKind::Timestamp;

    fn to_value(&self) -> Value {
        Value::Time(*self)
    }

    /// RFC 3339, normalized to UTC
    fn parse_literal(raw: &str) -> Result<Self, FilterError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| unparsable(raw, ValueKind::Timestamp, e))
    }
}

/// Check operator legality for a condition of type `T` holding `values`
pub fn validate_op<T: Conditionable>(op: Op, values: &[T]) -> Result<(), FilterError> {
    validate_kind(T::KIND, op, values.len())
}

fn validate_kind(kind: ValueKind, op: Op, set_len: usize) -> Result<(), FilterError> {
    if !kind.allows(op) {
        return Err(FilterError::InvalidOperator { op, kind });
    }

    if op.is_set() {
        if kind.uses_intervals() {
            if set_len != 2 {
                return Err(FilterError::MalformedInterval { kind, got: set_len });
            }
        } else if set_len == 0 {
            return Err(FilterError::EmptySet { op });
        }
    } else if set_len > 0 {
        return Err(FilterError::InvalidOperator { op, kind });
    }

    Ok(())
}

/// Operand of a validated condition
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Value),
    Set(Vec<Value>),
}

/// Validated, type-erased view of a condition, consumed by SQL dialects
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionExpr {
    pub op: Op,
    pub kind: ValueKind,
    pub operand: Operand,
}

/// A typed predicate over a single field
#[derive(Debug, Clone, PartialEq)]
pub struct Condition<T: Conditionable> {
    pub op: Op,
    pub value: T,
    pub values: Vec<T>,
}

impl<T: Conditionable> Condition<T> {
    /// Scalar condition
    pub fn new(op: Op, value: T) -> Self {
        Self {
            op,
            value,
            values: Vec::new(),
        }
    }

    /// Set (or interval) condition
    pub fn set(op: Op, values: Vec<T>) -> Self {
        Self {
            op,
            value: T::default(),
            values,
        }
    }

    pub fn kind(&self) -> ValueKind {
        T::KIND
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        validate_op(self.op, &self.values)
    }

    /// Validate and erase the value type
    pub fn expr(&self) -> Result<ConditionExpr, FilterError> {
        self.validate()?;
        let operand = if self.op.is_set() {
            Operand::Set(self.values.iter().map(Conditionable::to_value).collect())
        } else {
            Operand::Scalar(self.value.to_value())
        };
        Ok(ConditionExpr {
            op: self.op,
            kind: T::KIND,
            operand,
        })
    }

    /// Generic textual rendering: `<field> <op-symbol> <value-or-set>`
    ///
    /// String values are quoted, so distinct sets never render alike.
    pub fn evaluate(&self, field: &str) -> Result<String, FilterError> {
        let expr = self.expr()?;
        Ok(match expr.operand {
            Operand::Scalar(value) => format!("{} {} {}", field, expr.op, value.fingerprint()),
            Operand::Set(values) => {
                let rendered: Vec<String> = values.iter().map(Value::fingerprint).collect();
                format!("{} {} [{}]", field, expr.op, rendered.join(" "))
            }
        })
    }

    /// Stable fingerprint of the condition applied to `field`
    pub fn hash(&self, field: &str) -> Result<String, FilterError> {
        let repr = self.evaluate(field)?;
        Ok(fnv1a_32(repr.as_bytes()).to_string())
    }
}
