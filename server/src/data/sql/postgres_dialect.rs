//! PostgreSQL SQL dialect implementation

use chrono::{DateTime, Utc};

use super::SqlDialect;
use crate::data::filters::{ConditionExpr, FilterError, Op, Operand, Value, ValueKind};
use crate::utils::sql::{escape_like_pattern, escape_string_literal};

/// Canonical timestamp literal format; values are normalized to UTC first
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S+00";

/// PostgreSQL SQL dialect
pub struct PostgresDialect;

impl PostgresDialect {
    fn literal(value: &Value) -> String {
        match value {
            Value::Int(v) => v.to_string(),
            Value::UInt(v) => v.to_string(),
            Value::Float(v) if v.is_finite() => v.to_string(),
            Value::Float(v) => format!("'{}'::DOUBLE PRECISION", float_special(*v)),
            Value::Str(s) => format!("'{}'", escape_string_literal(s)),
            Value::Time(t) => timestamp_literal(t),
        }
    }

    fn list(values: &[Value]) -> String {
        values
            .iter()
            .map(Self::literal)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn like(field: &str, value: &Value, op: Op, kind: ValueKind) -> Result<String, FilterError> {
        let Value::Str(s) = value else {
            return Err(FilterError::InvalidOperator { op, kind });
        };
        let escaped = escape_string_literal(&escape_like_pattern(s));
        Ok(match op {
            Op::Begins => format!("{} LIKE '{}%'", field, escaped),
            _ => format!("{} LIKE '%{}'", field, escaped),
        })
    }

    fn interval(field: &str, op: Op, values: &[Value]) -> Result<String, FilterError> {
        let [start, end] = values else {
            return Err(FilterError::MalformedInterval {
                kind: ValueKind::Timestamp,
                got: values.len(),
            });
        };
        let (start, end) = (Self::literal(start), Self::literal(end));
        Ok(if op == Op::Inside {
            format!("{field} >= {start} AND {field} <= {end}")
        } else {
            format!("({field} <= {start} OR {field} >= {end})")
        })
    }
}

fn float_special(v: f64) -> &'static str {
    if v.is_nan() {
        "NaN"
    } else if v.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    }
}

/// Render a timestamp as `'YYYY-MM-DD HH:MM:SS+00'::TIMESTAMPTZ`
fn timestamp_literal(t: &DateTime<Utc>) -> String {
    format!("'{}'::TIMESTAMPTZ", t.format(TIMESTAMP_FORMAT))
}

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn compile_condition(&self, field: &str, expr: &ConditionExpr) -> Result<String, FilterError> {
        match (&expr.operand, expr.op) {
            (Operand::Scalar(value), op) if op.is_affix() => {
                Self::like(field, value, op, expr.kind)
            }
            (Operand::Scalar(value), op) => {
                let symbol = op.comparison().ok_or(FilterError::InvalidOperator {
                    op,
                    kind: expr.kind,
                })?;
                Ok(format!("{} {} {}", field, symbol, Self::literal(value)))
            }
            (Operand::Set(values), op) if expr.kind.uses_intervals() => {
                Self::interval(field, op, values)
            }
            (Operand::Set(values), Op::Inside) => {
                Ok(format!("{} IN ({})", field, Self::list(values)))
            }
            (Operand::Set(values), Op::Outside) => {
                Ok(format!("{} NOT IN ({})", field, Self::list(values)))
            }
            (Operand::Set(_), op) => Err(FilterError::InvalidOperator {
                op,
                kind: expr.kind,
            }),
        }
    }

    fn compile_id(&self, id: &str) -> String {
        format!("id = '{}'", escape_string_literal(id))
    }
}
