//! Post-join result processing
//!
//! Stages run in a fixed order: filter, select, distinct, sort, paginate.

use super::types::{strip_sigil, Filter, QueryOptions};
use crate::graph::{Binding, Value};
use std::collections::HashSet;

/// Run every stage requested by `options`.
pub fn apply(bindings: Vec<Binding>, options: &QueryOptions) -> Vec<Binding> {
    let mut bindings = filter(bindings, &options.filter);
    if !options.wants_count() {
        project(&mut bindings, &options.select);
    }
    if options.distinct {
        bindings = distinct(bindings);
    }
    if let Some((key, descending)) = options.sort_key() {
        sort(&mut bindings, key, descending);
    }
    paginate(bindings, options.limit, options.offset)
}

/// Each filter scans the whole input and appends its matches, so the result
/// is the union of the filters; a binding matching two filters appears twice.
pub fn filter(bindings: Vec<Binding>, filters: &[Filter]) -> Vec<Binding> {
    if filters.is_empty() {
        return bindings;
    }
    filters
        .iter()
        .flat_map(|f| bindings.iter().filter(move |b| f.matches(b)).cloned())
        .collect()
}

/// Keep only the selected variables. An empty selection keeps everything.
pub fn project(bindings: &mut [Binding], select: &[String]) {
    if select.is_empty() {
        return;
    }
    let keep: HashSet<&str> = select.iter().map(|s| strip_sigil(s)).collect();
    for binding in bindings.iter_mut() {
        binding.retain(|k| keep.contains(k));
    }
}

/// Drop repeated bindings, first occurrence wins.
pub fn distinct(bindings: Vec<Binding>) -> Vec<Binding> {
    let mut seen = HashSet::new();
    bindings
        .into_iter()
        .filter(|b| seen.insert(b.canonical_key()))
        .collect()
}

/// Case-insensitive stable sort on a string-valued variable.
///
/// Bindings whose value at `key` is missing or not a string keep their slot;
/// only the string-valued bindings are reordered among themselves.
pub fn sort(bindings: &mut [Binding], key: &str, descending: bool) {
    let slots: Vec<usize> = bindings
        .iter()
        .enumerate()
        .filter(|(_, b)| matches!(b.get(key), Some(Value::String(_))))
        .map(|(i, _)| i)
        .collect();
    if slots.len() < 2 {
        return;
    }

    let mut keyed: Vec<(String, Binding)> = slots
        .iter()
        .map(|&i| {
            let sort_key = bindings[i]
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_lowercase)
                .unwrap_or_default();
            (sort_key, std::mem::take(&mut bindings[i]))
        })
        .collect();

    if descending {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
    }

    for (slot, (_, binding)) in slots.into_iter().zip(keyed) {
        bindings[slot] = binding;
    }
}

/// Slice `[offset, offset + limit)` only when the input holds at least
/// `offset + limit` bindings; shorter inputs are returned as is.
pub fn paginate(bindings: Vec<Binding>, limit: usize, offset: usize) -> Vec<Binding> {
    if limit == 0 && offset == 0 {
        return bindings;
    }
    if bindings.len() < offset.saturating_add(limit) {
        return bindings;
    }
    let end = if limit > 0 { offset + limit } else { bindings.len() };
    bindings[offset..end].to_vec()
}
