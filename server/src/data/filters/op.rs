//! Condition operators

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison, set and affix operators a condition can apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Membership in a set, or containment in a `[start, end]` interval for timestamps
    Inside,
    /// Negation of [`Op::Inside`]
    Outside,
    /// String prefix match
    Begins,
    /// String suffix match
    Ends,
}

impl Op {
    pub const ALL: [Op; 10] = [
        Op::Eq,
        Op::Ne,
        Op::Gt,
        Op::Ge,
        Op::Lt,
        Op::Le,
        Op::Inside,
        Op::Outside,
        Op::Begins,
        Op::Ends,
    ];

    /// Canonical symbolic rendering
    pub fn symbol(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Inside => "∈",
            Op::Outside => "∉",
            Op::Begins => "~^",
            Op::Ends => "~$",
        }
    }

    /// Whether the operator works on a value set rather than a single value
    pub fn is_set(self) -> bool {
        matches!(self, Op::Inside | Op::Outside)
    }

    /// Whether the operator is a string affix match
    pub fn is_affix(self) -> bool {
        matches!(self, Op::Begins | Op::Ends)
    }

    /// SQL comparison operator for scalar comparisons
    pub fn comparison(self) -> Option<&'static str> {
        match self {
            Op::Eq => Some("="),
            Op::Ne => Some("!="),
            Op::Gt => Some(">"),
            Op::Ge => Some(">="),
            Op::Lt => Some("<"),
            Op::Le => Some("<="),
            _ => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
