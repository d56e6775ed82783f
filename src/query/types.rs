//! Query options and filters

use crate::graph::{Binding, Value, VARIABLE_SIGIL};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Select entry asking for the number of results instead of the bindings.
pub const COUNT_SENTINEL: &str = "?COUNT";

/// Comparison operator of a [`Filter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    /// Case-insensitive prefix match, strings only
    #[serde(rename = "LIKE")]
    Like,
}

impl FilterOp {
    fn holds(self, ordering: Ordering) -> bool {
        match self {
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Ne => ordering != Ordering::Equal,
            FilterOp::Le => ordering != Ordering::Greater,
            FilterOp::Ge => ordering != Ordering::Less,
            FilterOp::Like => false,
        }
    }
}

/// A `{key, op, val}` condition on one bound variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub op: FilterOp,
    pub val: Value,
}

impl Filter {
    pub fn new(key: impl Into<String>, op: FilterOp, val: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op,
            val: val.into(),
        }
    }

    /// Whether the binding's value at `key` has the filter value's type and
    /// satisfies the operator. Missing keys never match.
    pub fn matches(&self, binding: &Binding) -> bool {
        let Some(bound) = binding.get(strip_sigil(&self.key)) else {
            return false;
        };

        match (bound, &self.val) {
            (Value::String(have), Value::String(want)) => {
                let have = have.to_lowercase();
                let want = want.to_lowercase();
                match self.op {
                    FilterOp::Like => have.starts_with(&want),
                    op => op.holds(have.cmp(&want)),
                }
            }
            (Value::Integer(have), Value::Integer(want)) => self.op.holds(have.cmp(want)),
            (Value::Float(have), Value::Float(want)) => {
                have.partial_cmp(want).map_or(false, |ordering| self.op.holds(ordering))
            }
            (Value::Boolean(have), Value::Boolean(want)) => match self.op {
                FilterOp::Eq => have == want,
                FilterOp::Ne => have != want,
                _ => false,
            },
            _ => false,
        }
    }
}

/// Post-join options of a clause query.
///
/// Field names follow the JSON request body (`orderby` is one word).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// 0 = unlimited
    pub limit: usize,
    pub offset: usize,
    /// Variable to sort by, `-` prefix for descending. Empty means unsorted.
    #[serde(rename = "orderby")]
    pub order_by: String,
    pub filter: Vec<Filter>,
    pub distinct: bool,
    pub select: Vec<String>,
    /// Indices of clauses allowed to match nothing
    pub optional: Vec<usize>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter.push(filter);
        self
    }

    pub fn with_distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn with_select<I, S>(mut self, select: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = select.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_optional(mut self, optional: impl IntoIterator<Item = usize>) -> Self {
        self.optional = optional.into_iter().collect();
        self
    }

    /// True when the caller asked for a result count (`select: ["?COUNT"]`).
    pub fn wants_count(&self) -> bool {
        self.select.first().is_some_and(|s| s == COUNT_SENTINEL)
    }

    pub fn is_optional(&self, clause_index: usize) -> bool {
        self.optional.contains(&clause_index)
    }

    /// Sort key and direction; `None` when no ordering was requested.
    pub fn sort_key(&self) -> Option<(&str, bool)> {
        if self.order_by.is_empty() {
            return None;
        }
        let (descending, key) = match self.order_by.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, self.order_by.as_str()),
        };
        Some((strip_sigil(key), descending))
    }
}

/// Variable names are accepted with or without the leading `?`.
pub(crate) fn strip_sigil(name: &str) -> &str {
    name.strip_prefix(VARIABLE_SIGIL).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_json() {
        let opts: QueryOptions = serde_json::from_str(
            r#"{"limit": 5, "orderby": "-name", "filter": [{"key": "age", "op": ">=", "val": 30}],
                "select": ["?COUNT"], "optional": [1]}"#,
        )
        .unwrap();
        assert_eq!(opts.limit, 5);
        assert_eq!(opts.sort_key(), Some(("name", true)));
        assert_eq!(opts.filter[0], Filter::new("age", FilterOp::Ge, 30));
        assert!(opts.wants_count());
        assert!(opts.is_optional(1));
        assert!(!opts.is_optional(0));
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let res: Result<Filter, _> = serde_json::from_str(r#"{"key": "a", "op": "~=", "val": 1}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_string_filters_ignore_case() {
        let b = Binding::new().with("name", "Kevin Bacon");
        assert!(Filter::new("name", FilterOp::Eq, "kevin bacon").matches(&b));
        assert!(Filter::new("name", FilterOp::Like, "KEV").matches(&b));
        assert!(!Filter::new("name", FilterOp::Like, "bacon").matches(&b));
        assert!(Filter::new("name", FilterOp::Gt, "a").matches(&b));
    }

    #[test]
    fn test_filters_require_matching_types() {
        let b = Binding::new().with("n", 3).with("f", 2.5).with("flag", true);
        assert!(Filter::new("n", FilterOp::Le, 3).matches(&b));
        assert!(!Filter::new("n", FilterOp::Gt, 3).matches(&b));
        assert!(!Filter::new("n", FilterOp::Eq, 3.0).matches(&b));
        assert!(!Filter::new("n", FilterOp::Eq, "3").matches(&b));
        assert!(Filter::new("f", FilterOp::Lt, 3.0).matches(&b));
        assert!(Filter::new("flag", FilterOp::Ne, false).matches(&b));
        assert!(!Filter::new("flag", FilterOp::Gt, false).matches(&b));
        assert!(!Filter::new("n", FilterOp::Like, 3).matches(&b));
        assert!(!Filter::new("missing", FilterOp::Ne, 1).matches(&b));
    }
}
