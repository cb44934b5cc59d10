//! Typed transfer predicates and their interpreter.
//!
//! A predicate is a closed set of variants, never evaluated as code.
//! `highest`/`lowest` thresholds are resolved against the current squad
//! once per gameweek, producing a `Condition` that is then matched against
//! individual player rows.

use crate::{
    error::{SimError, SimResult},
    player::{PlayerRecord, Squad},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }
}

// Longest symbols first so ">=" is not read as ">".
const OPERATORS: [(&str, CmpOp); 6] = [
    (">=", CmpOp::Ge),
    ("<=", CmpOp::Le),
    ("==", CmpOp::Eq),
    ("!=", CmpOp::Ne),
    (">",  CmpOp::Gt),
    ("<",  CmpOp::Lt),
];

/// Right-hand side of a numeric comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Threshold {
    Literal(f64),
    /// Smallest value of the named field across the current squad.
    MinOf(String),
    /// Largest value of the named field across the current squad.
    MaxOf(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferPredicate {
    NumericComparison {
        field:     String,
        op:        CmpOp,
        threshold: Threshold,
    },
    BooleanEquals {
        field:   String,
        literal: bool,
    },
}

/// A predicate with every squad-relative threshold pinned to a number.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Numeric { field: String, op: CmpOp, threshold: f64 },
    Flag { field: String, literal: bool },
}

impl Condition {
    /// Rows missing the field never satisfy the condition.
    pub fn matches(&self, player: &PlayerRecord) -> bool {
        match self {
            Self::Numeric { field, op, threshold } => player
                .numeric(field)
                .is_some_and(|v| op.apply(v, *threshold)),
            Self::Flag { field, literal } => player
                .flag(field)
                .is_some_and(|v| v == *literal),
        }
    }
}

impl TransferPredicate {
    pub fn numeric(field: &str, op: CmpOp, threshold: Threshold) -> Self {
        Self::NumericComparison { field: field.to_string(), op, threshold }
    }

    pub fn flag(field: &str, literal: bool) -> Self {
        Self::BooleanEquals { field: field.to_string(), literal }
    }

    /// Pin `MinOf`/`MaxOf` thresholds against the squad's current values.
    pub fn resolve(&self, squad: &Squad) -> SimResult<Condition> {
        match self {
            Self::BooleanEquals { field, literal } => Ok(Condition::Flag {
                field:   field.clone(),
                literal: *literal,
            }),
            Self::NumericComparison { field, op, threshold } => {
                let threshold = match threshold {
                    Threshold::Literal(v) => *v,
                    Threshold::MinOf(of) => squad_extreme(squad, of, f64::min)?,
                    Threshold::MaxOf(of) => squad_extreme(squad, of, f64::max)?,
                };
                Ok(Condition::Numeric { field: field.clone(), op: *op, threshold })
            }
        }
    }
}

fn squad_extreme(squad: &Squad, field: &str, pick: fn(f64, f64) -> f64) -> SimResult<f64> {
    squad
        .iter()
        .filter_map(|p| p.numeric(field))
        .reduce(pick)
        .ok_or_else(|| SimError::InvalidPredicate(format!("no squad member has field '{field}'")))
}

impl fmt::Display for TransferPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BooleanEquals { field, literal } => write!(f, "{field} == {literal}"),
            Self::NumericComparison { field, op, threshold } => {
                let rhs = match threshold {
                    Threshold::Literal(v) => v.to_string(),
                    Threshold::MinOf(of) if of == field => "lowest".to_string(),
                    Threshold::MaxOf(of) if of == field => "highest".to_string(),
                    Threshold::MinOf(of) => format!("min({of})"),
                    Threshold::MaxOf(of) => format!("max({of})"),
                };
                write!(f, "{field} {} {rhs}", op.symbol())
            }
        }
    }
}

/// Parses `<field> <op> <value>`, with or without spaces. `value` is
/// `highest`, `lowest`, `true`/`false` (only with `==`/`!=`) or a number.
impl FromStr for TransferPredicate {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SimError::InvalidPredicate(s.to_string());

        let (idx, symbol, op) = OPERATORS
            .iter()
            .filter_map(|(sym, op)| s.find(sym).map(|i| (i, *sym, *op)))
            .min_by_key(|(i, sym, _)| (*i, std::cmp::Reverse(sym.len())))
            .ok_or_else(invalid)?;

        let field = s[..idx].trim();
        let value = s[idx + symbol.len()..].trim();
        if field.is_empty() || value.is_empty() {
            return Err(invalid());
        }

        match value.to_ascii_lowercase().as_str() {
            "highest" => Ok(Self::numeric(field, op, Threshold::MaxOf(field.to_string()))),
            "lowest"  => Ok(Self::numeric(field, op, Threshold::MinOf(field.to_string()))),
            b @ ("true" | "false") => {
                let literal = b == "true";
                match op {
                    CmpOp::Eq => Ok(Self::flag(field, literal)),
                    CmpOp::Ne => Ok(Self::flag(field, !literal)),
                    _         => Err(invalid()),
                }
            }
            _ => value
                .parse::<f64>()
                .map(|v| Self::numeric(field, op, Threshold::Literal(v)))
                .map_err(|_| invalid()),
        }
    }
}
