//! Storage trait definitions

use super::cancel::CallContext;
use crate::graph::{Pattern, Position, Triple, Value};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Graph partition not found: {0}")]
    PartitionNotFound(String),

    #[error("Invalid partition name: {0:?}")]
    InvalidPartitionName(String),

    #[error("Invalid triple: {0}")]
    InvalidTriple(String),

    #[error("Invalid order-by field: {0}")]
    InvalidOrderBy(String),

    #[error("Stored value has unknown kind tag: {0}")]
    CorruptValue(String),

    #[error("Storage call cancelled")]
    Cancelled,

    #[error("Storage call deadline exceeded")]
    DeadlineExceeded,

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True for errors raised by `CallContext::check`.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, StorageError::Cancelled | StorageError::DeadlineExceeded)
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Candidate values pushed down into a pattern query.
///
/// A non-empty list replaces the wildcard at that position with
/// "value is one of". An empty list leaves the position untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub subjects: Vec<String>,
    pub predicates: Vec<String>,
    pub objects: Vec<Value>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty() && self.predicates.is_empty() && self.objects.is_empty()
    }

    /// Whether a triple satisfies every non-empty override list.
    pub fn admits(&self, triple: &Triple) -> bool {
        (self.subjects.is_empty() || self.subjects.contains(&triple.subject))
            && (self.predicates.is_empty() || self.predicates.contains(&triple.predicate))
            && (self.objects.is_empty() || self.objects.contains(&triple.object))
    }
}

/// Sort order for triple queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub position: Position,
    pub descending: bool,
}

impl OrderBy {
    pub fn ascending(position: Position) -> Self {
        Self {
            position,
            descending: false,
        }
    }
}

impl FromStr for OrderBy {
    type Err = StorageError;

    /// Accepts `s|sub|subject`, `p|pred|predicate`, `o|obj|object`,
    /// optionally prefixed with `-` for descending order.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, field) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let position = match field {
            "s" | "sub" | "subject" => Position::Subject,
            "p" | "pred" | "predicate" => Position::Predicate,
            "o" | "obj" | "object" => Position::Object,
            _ => return Err(StorageError::InvalidOrderBy(s.to_string())),
        };
        Ok(Self {
            position,
            descending,
        })
    }
}

/// Options for pattern queries
#[derive(Debug, Clone, Default)]
pub struct TripleOptions {
    /// Maximum number of triples (0 = unlimited)
    pub limit: usize,
    /// Number of triples to skip
    pub offset: usize,
    pub order_by: Option<OrderBy>,
    pub overrides: Overrides,
}

impl TripleOptions {
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

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// The order actually applied: offsets without an explicit order are
    /// made deterministic by sorting on subject.
    pub fn effective_order(&self) -> Option<OrderBy> {
        match self.order_by {
            Some(order) => Some(order),
            None if self.limit != 0 && self.offset != 0 => Some(OrderBy::ascending(Position::Subject)),
            None => None,
        }
    }
}

/// Trait for triple storage backends
///
/// Every call is scoped to one named graph partition and must be safe to
/// invoke concurrently (Send + Sync). Partition creation must be idempotent.
pub trait TripleStore: Send + Sync {
    // === Partition Operations ===

    /// Create a partition and its indexes. Creating an existing partition is a no-op.
    fn create_partition(&self, cx: &CallContext, name: &str) -> StorageResult<()>;

    /// Whether a partition exists
    fn has_partition(&self, cx: &CallContext, name: &str) -> StorageResult<bool>;

    /// List all partition names
    fn list_partitions(&self, cx: &CallContext) -> StorageResult<Vec<String>>;

    /// Delete a partition with all its triples and indexes
    fn drop_partition(&self, cx: &CallContext, name: &str) -> StorageResult<()>;

    /// (Re)build the partition's indexes
    fn index(&self, cx: &CallContext, name: &str, background: bool) -> StorageResult<()>;

    // === Triple Operations ===

    /// Insert many triples, returning how many were newly stored.
    ///
    /// Invalid triples are skipped and duplicates are ignored; neither fails
    /// the batch.
    fn add_many(&self, cx: &CallContext, name: &str, triples: &[Triple]) -> StorageResult<usize>;

    /// Insert a single triple; inserting an existing triple is a no-op.
    fn add_one(&self, cx: &CallContext, name: &str, triple: &Triple) -> StorageResult<()>;

    /// Delete every triple matching the pattern
    fn remove(&self, cx: &CallContext, name: &str, pattern: &Pattern) -> StorageResult<()>;

    /// Count triples matching the pattern
    fn count(&self, cx: &CallContext, name: &str, pattern: &Pattern) -> StorageResult<u64>;

    /// Fetch triples matching the pattern, its overrides, order, limit and offset
    fn query(
        &self,
        cx: &CallContext,
        name: &str,
        pattern: &Pattern,
        options: &TripleOptions,
    ) -> StorageResult<Vec<Triple>>;

    /// Release backend resources
    fn close(&self) -> StorageResult<()>;

    // === Provided Operations ===

    /// Delete the partition's triples and re-provision it so writes keep working.
    fn remove_all(&self, cx: &CallContext, name: &str) -> StorageResult<()> {
        if !self.has_partition(cx, name)? {
            return Ok(());
        }
        self.drop_partition(cx, name)?;
        self.create_partition(cx, name)?;
        self.index(cx, name, false)
    }

    /// Remove triples matching each pattern in turn.
    ///
    /// A pattern that is entirely wildcards clears the whole partition.
    fn remove_many(&self, cx: &CallContext, name: &str, patterns: &[Pattern]) -> StorageResult<()> {
        for pattern in patterns {
            cx.check()?;
            if pattern.is_wildcard() {
                return self.remove_all(cx, name);
            }
            self.remove(cx, name, pattern)?;
        }
        Ok(())
    }
}

/// Extension trait for opening stores from paths
pub trait OpenStore: TripleStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Reject names no backend can address.
pub(crate) fn validate_partition_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.chars().any(char::is_control) {
        return Err(StorageError::InvalidPartitionName(name.to_string()));
    }
    Ok(())
}
