//! In-memory storage backend
//!
//! Keeps each partition as an insertion-ordered triple list plus a hash set
//! enforcing (subject, predicate, object) uniqueness. Semantics mirror
//! `SqliteStore`, which makes it the backend of choice for tests.

use super::cancel::CallContext;
use super::traits::{
    validate_partition_name, OpenStore, OrderBy, StorageError, StorageResult, TripleOptions, TripleStore,
};
use crate::graph::{Pattern, Triple, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Partition {
    triples: Vec<Triple>,
    keys: HashSet<Triple>,
}

impl Partition {
    fn insert(&mut self, triple: &Triple) -> bool {
        if !self.keys.insert(triple.clone()) {
            return false;
        }
        self.triples.push(triple.clone());
        true
    }

    fn remove_matching(&mut self, pattern: &Pattern) {
        let keys = &mut self.keys;
        self.triples.retain(|t| {
            if pattern.matches(t) {
                keys.remove(t);
                false
            } else {
                true
            }
        });
    }
}

/// Volatile triple store
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<HashMap<String, Partition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<String, Partition>>> {
        self.partitions.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<String, Partition>>> {
        self.partitions.write().map_err(|_| StorageError::LockPoisoned)
    }
}

/// Sort key matching SQLite's cross-type ordering: numbers before text.
#[derive(Debug)]
enum SortKey<'a> {
    Number(f64),
    Text(&'a str),
}

impl<'a> SortKey<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::String(s) => SortKey::Text(s),
            Value::Integer(i) => SortKey::Number(*i as f64),
            Value::Float(f) => SortKey::Number(*f),
            Value::Boolean(b) => SortKey::Number(if *b { 1.0 } else { 0.0 }),
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        }
    }
}

fn compare_at(order: OrderBy, a: &Triple, b: &Triple) -> Ordering {
    use crate::graph::Position;
    let ordering = match order.position {
        Position::Subject => a.subject.cmp(&b.subject),
        Position::Predicate => a.predicate.cmp(&b.predicate),
        Position::Object => SortKey::of(&a.object).cmp(&SortKey::of(&b.object)),
    };
    if order.descending {
        ordering.reverse()
    } else {
        ordering
    }
}

impl OpenStore for MemoryStore {
    /// Memory stores have no backing file; the path is ignored.
    fn open(_path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::new())
    }

    fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::new())
    }
}

impl TripleStore for MemoryStore {
    fn create_partition(&self, cx: &CallContext, name: &str) -> StorageResult<()> {
        cx.check()?;
        validate_partition_name(name)?;
        self.write()?.entry(name.to_string()).or_default();
        Ok(())
    }

    fn has_partition(&self, cx: &CallContext, name: &str) -> StorageResult<bool> {
        cx.check()?;
        Ok(self.read()?.contains_key(name))
    }

    fn list_partitions(&self, cx: &CallContext) -> StorageResult<Vec<String>> {
        cx.check()?;
        let mut names: Vec<String> = self.read()?.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn drop_partition(&self, cx: &CallContext, name: &str) -> StorageResult<()> {
        cx.check()?;
        self.write()?.remove(name);
        Ok(())
    }

    fn index(&self, cx: &CallContext, name: &str, _background: bool) -> StorageResult<()> {
        // Hash set and linear scans need no separate index build.
        self.create_partition(cx, name)
    }

    fn add_many(&self, cx: &CallContext, name: &str, triples: &[Triple]) -> StorageResult<usize> {
        cx.check()?;
        let mut partitions = self.write()?;
        let partition = partitions
            .get_mut(name)
            .ok_or_else(|| StorageError::PartitionNotFound(name.to_string()))?;

        let mut inserted = 0;
        for triple in triples.iter().filter(|t| t.is_valid()) {
            if partition.insert(triple) {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    fn add_one(&self, cx: &CallContext, name: &str, triple: &Triple) -> StorageResult<()> {
        cx.check()?;
        if !triple.is_valid() {
            return Err(StorageError::InvalidTriple(triple.to_string()));
        }
        let mut partitions = self.write()?;
        let partition = partitions
            .get_mut(name)
            .ok_or_else(|| StorageError::PartitionNotFound(name.to_string()))?;
        partition.insert(triple);
        Ok(())
    }

    fn remove(&self, cx: &CallContext, name: &str, pattern: &Pattern) -> StorageResult<()> {
        cx.check()?;
        let mut partitions = self.write()?;
        let partition = partitions
            .get_mut(name)
            .ok_or_else(|| StorageError::PartitionNotFound(name.to_string()))?;
        partition.remove_matching(pattern);
        Ok(())
    }

    fn count(&self, cx: &CallContext, name: &str, pattern: &Pattern) -> StorageResult<u64> {
        cx.check()?;
        let partitions = self.read()?;
        let partition = partitions
            .get(name)
            .ok_or_else(|| StorageError::PartitionNotFound(name.to_string()))?;
        Ok(partition.triples.iter().filter(|t| pattern.matches(t)).count() as u64)
    }

    fn query(
        &self,
        cx: &CallContext,
        name: &str,
        pattern: &Pattern,
        options: &TripleOptions,
    ) -> StorageResult<Vec<Triple>> {
        cx.check()?;
        let mut matched: Vec<Triple> = {
            let partitions = self.read()?;
            let partition = partitions
                .get(name)
                .ok_or_else(|| StorageError::PartitionNotFound(name.to_string()))?;
            partition
                .triples
                .iter()
                .filter(|t| pattern.matches(t) && options.overrides.admits(t))
                .cloned()
                .collect()
        };

        if let Some(order) = options.effective_order() {
            matched.sort_by(|a, b| compare_at(order, a, b));
        }

        let limit = if options.limit == 0 { usize::MAX } else { options.limit };
        Ok(matched.into_iter().skip(options.offset).take(limit).collect())
    }

    fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
