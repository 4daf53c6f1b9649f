//! Post-scan predicates applied to each yielded definition.

use crate::error::{FindError, Result};
use crate::record::Definition;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Comparison used by `--length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthOp {
    Eq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl LengthOp {
    // Two-character operators first so `>=5` is not read as `>` `=5`.
    const PREFIXES: [(&'static str, LengthOp); 6] = [
        ("==", LengthOp::Eq),
        (">=", LengthOp::Ge),
        ("<=", LengthOp::Le),
        ("=", LengthOp::Eq),
        (">", LengthOp::Gt),
        ("<", LengthOp::Lt),
    ];

    fn apply(self, length: i64, threshold: i64) -> bool {
        match self {
            LengthOp::Eq => length == threshold,
            LengthOp::Lt => length < threshold,
            LengthOp::Gt => length > threshold,
            LengthOp::Le => length <= threshold,
            LengthOp::Ge => length >= threshold,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            LengthOp::Eq => "=",
            LengthOp::Lt => "<",
            LengthOp::Gt => ">",
            LengthOp::Le => "<=",
            LengthOp::Ge => ">=",
        }
    }
}

/// Line-count comparison, e.g. `>=5` or a bare `3`.
///
/// Negative thresholds are accepted; `>-1` keeps every definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthFilter {
    pub op: LengthOp,
    pub threshold: i64,
}

impl LengthFilter {
    pub fn matches(&self, line_count: usize) -> bool {
        let length = i64::try_from(line_count).unwrap_or(i64::MAX);
        self.op.apply(length, self.threshold)
    }
}

impl FromStr for LengthFilter {
    type Err = FindError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let (op, rest) = LengthOp::PREFIXES
            .iter()
            .find_map(|(prefix, op)| trimmed.strip_prefix(prefix).map(|rest| (*op, rest)))
            .unwrap_or((LengthOp::Eq, trimmed));
        let threshold = rest
            .trim()
            .parse::<i64>()
            .map_err(|_| FindError::InvalidLength(s.to_string()))?;
        Ok(LengthFilter { op, threshold })
    }
}

impl fmt::Display for LengthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.symbol(), self.threshold)
    }
}

/// Content and length predicates, checked in a fixed order.
#[derive(Debug, Clone, Default)]
pub struct DefinitionFilter {
    /// Body must match.
    pub contains: Option<Regex>,
    /// Body must not match; rejects regardless of `contains`.
    pub without: Option<Regex>,
    pub length: Option<LengthFilter>,
}

impl DefinitionFilter {
    pub fn accepts(&self, def: &Definition) -> bool {
        if let Some(ref pattern) = self.contains {
            if !def.contains(pattern) {
                log::debug!("Skipping non-match: {}", def.signature());
                return false;
            }
        }
        if let Some(ref pattern) = self.without {
            if def.contains(pattern) {
                log::debug!("Skipping match: {}", def.signature());
                return false;
            }
        }
        if let Some(ref length) = self.length {
            if !length.matches(def.line_count()) {
                log::debug!("Skipping non-length match ({}): {}", length, def.signature());
                return false;
            }
        }
        true
    }
}
