//! SQLite storage backend for tristore

use super::cancel::CallContext;
use super::traits::{
    validate_partition_name, OpenStore, OrderBy, Overrides, StorageError, StorageResult, TripleOptions,
    TripleStore,
};
use crate::graph::{Pattern, Position, Triple, Value};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, ToSql};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Default number of triples inserted per transaction by `add_many`.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Override lists longer than this are applied after the fetch instead of
/// being expanded into SQL `IN` lists.
const MAX_PUSHDOWN_VALUES: usize = 500;

// Object kind tags stored next to the object column.
const KIND_STRING: i64 = 0;
const KIND_INTEGER: i64 = 1;
const KIND_FLOAT: i64 = 2;
const KIND_BOOLEAN: i64 = 3;

type SqlParams = Vec<Box<dyn ToSql>>;

/// SQLite-backed triple store
///
/// A single database holds every graph partition: a `partitions` table of
/// names and a `triples` table keyed by partition. The object column is
/// untyped and paired with a kind tag so `1`, `1.0`, `true` and `"1"` stay
/// distinct under the uniqueness constraint.
/// Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    batch_size: usize,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS partitions (
                name TEXT PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS triples (
                g TEXT NOT NULL,
                s TEXT NOT NULL,
                p TEXT NOT NULL,
                kind INTEGER NOT NULL,
                o NOT NULL,
                FOREIGN KEY (g) REFERENCES partitions(name) ON DELETE CASCADE
            );

            PRAGMA foreign_keys = ON;

            -- Concurrent reads during writes for file databases
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Self::create_indexes(conn)
    }

    fn create_indexes(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE INDEX IF NOT EXISTS idx_triples_s ON triples(g, s);
            CREATE INDEX IF NOT EXISTS idx_triples_p ON triples(g, p);
            CREATE INDEX IF NOT EXISTS idx_triples_o ON triples(g, o);
            CREATE INDEX IF NOT EXISTS idx_triples_sp ON triples(g, s, p);
            CREATE INDEX IF NOT EXISTS idx_triples_so ON triples(g, s, o);
            CREATE INDEX IF NOT EXISTS idx_triples_po ON triples(g, p, o);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_triples_unique ON triples(g, s, p, kind, o);
            "#,
        )?;
        Ok(())
    }

    /// Set how many triples `add_many` inserts per transaction (0 is treated as 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn partition_exists(conn: &Connection, name: &str) -> StorageResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM partitions WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn require_partition(conn: &Connection, name: &str) -> StorageResult<()> {
        if Self::partition_exists(conn, name)? {
            Ok(())
        } else {
            Err(StorageError::PartitionNotFound(name.to_string()))
        }
    }

    fn encode(value: &Value) -> (i64, SqlValue) {
        match value {
            Value::String(s) => (KIND_STRING, SqlValue::Text(s.clone())),
            Value::Integer(i) => (KIND_INTEGER, SqlValue::Integer(*i)),
            Value::Float(f) => (KIND_FLOAT, SqlValue::Real(*f)),
            Value::Boolean(b) => (KIND_BOOLEAN, SqlValue::Integer(i64::from(*b))),
        }
    }

    fn decode(kind: i64, raw: SqlValue) -> StorageResult<Value> {
        match (kind, raw) {
            (KIND_STRING, SqlValue::Text(s)) => Ok(Value::String(s)),
            (KIND_INTEGER, SqlValue::Integer(i)) => Ok(Value::Integer(i)),
            (KIND_FLOAT, SqlValue::Real(f)) => Ok(Value::Float(f)),
            (KIND_FLOAT, SqlValue::Integer(i)) => Ok(Value::Float(i as f64)),
            (KIND_BOOLEAN, SqlValue::Integer(i)) => Ok(Value::Boolean(i != 0)),
            (kind, raw) => Err(StorageError::CorruptValue(format!("kind {} with {:?}", kind, raw))),
        }
    }

    /// Append `AND ...` conditions for the pattern's bound positions.
    fn push_pattern(sql: &mut String, params: &mut SqlParams, pattern: &Pattern) {
        if let Some(s) = pattern.subject() {
            sql.push_str(" AND s = ?");
            params.push(Box::new(s.to_string()));
        }
        if let Some(p) = pattern.predicate() {
            sql.push_str(" AND p = ?");
            params.push(Box::new(p.to_string()));
        }
        if let Some(o) = pattern.object() {
            let (kind, raw) = Self::encode(o);
            sql.push_str(" AND kind = ? AND o = ?");
            params.push(Box::new(kind));
            params.push(Box::new(raw));
        }
    }

    /// Push small override lists into SQL. Returns the overrides that still
    /// have to be checked in memory.
    fn push_overrides(sql: &mut String, params: &mut SqlParams, overrides: &Overrides) -> Overrides {
        let mut residual = Overrides::default();

        for (column, values, rest) in [
            ("s", &overrides.subjects, &mut residual.subjects),
            ("p", &overrides.predicates, &mut residual.predicates),
        ] {
            if values.is_empty() {
                continue;
            }
            if values.len() > MAX_PUSHDOWN_VALUES {
                *rest = values.clone();
                continue;
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            sql.push_str(&format!(" AND {} IN ({})", column, placeholders));
            for v in values {
                params.push(Box::new(v.clone()));
            }
        }

        if !overrides.objects.is_empty() {
            if overrides.objects.len() > MAX_PUSHDOWN_VALUES {
                residual.objects = overrides.objects.clone();
            } else {
                let alternatives = vec!["(kind = ? AND o = ?)"; overrides.objects.len()].join(" OR ");
                sql.push_str(&format!(" AND ({})", alternatives));
                for v in &overrides.objects {
                    let (kind, raw) = Self::encode(v);
                    params.push(Box::new(kind));
                    params.push(Box::new(raw));
                }
            }
        }

        residual
    }

    fn order_clause(order: Option<OrderBy>) -> String {
        match order {
            Some(order) => {
                let column = match order.position {
                    Position::Subject => "s",
                    Position::Predicate => "p",
                    Position::Object => "o",
                };
                let direction = if order.descending { "DESC" } else { "ASC" };
                format!(" ORDER BY {} {}, rowid ASC", column, direction)
            }
            None => " ORDER BY rowid ASC".to_string(),
        }
    }

    /// Insert one batch inside a transaction, stopping at the first error.
    fn insert_batch(conn: &mut Connection, cx: &CallContext, name: &str, batch: &[&Triple]) -> StorageResult<usize> {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt =
                tx.prepare_cached("INSERT OR IGNORE INTO triples (g, s, p, kind, o) VALUES (?1, ?2, ?3, ?4, ?5)")?;
            for triple in batch {
                cx.check()?;
                let (kind, raw) = Self::encode(&triple.object);
                inserted += stmt.execute(params![name, triple.subject, triple.predicate, kind, raw])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn insert_one(conn: &Connection, name: &str, triple: &Triple) -> StorageResult<usize> {
        let (kind, raw) = Self::encode(&triple.object);
        let rows = conn.execute(
            "INSERT OR IGNORE INTO triples (g, s, p, kind, o) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, triple.subject, triple.predicate, kind, raw],
        )?;
        Ok(rows)
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }
}

impl TripleStore for SqliteStore {
    // === Partition Operations ===

    fn create_partition(&self, cx: &CallContext, name: &str) -> StorageResult<()> {
        cx.check()?;
        validate_partition_name(name)?;
        let conn = self.lock()?;
        conn.execute("INSERT OR IGNORE INTO partitions (name) VALUES (?1)", params![name])?;
        Ok(())
    }

    fn has_partition(&self, cx: &CallContext, name: &str) -> StorageResult<bool> {
        cx.check()?;
        let conn = self.lock()?;
        Self::partition_exists(&conn, name)
    }

    fn list_partitions(&self, cx: &CallContext) -> StorageResult<Vec<String>> {
        cx.check()?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn drop_partition(&self, cx: &CallContext, name: &str) -> StorageResult<()> {
        cx.check()?;
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM triples WHERE g = ?1", params![name])?;
        tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
        tx.commit()?;
        Ok(())
    }

    fn index(&self, cx: &CallContext, name: &str, background: bool) -> StorageResult<()> {
        cx.check()?;
        validate_partition_name(name)?;
        let conn = self.lock()?;
        conn.execute("INSERT OR IGNORE INTO partitions (name) VALUES (?1)", params![name])?;
        // SQLite builds indexes synchronously; `background` only affects logging.
        debug!(partition = name, background, "building triple indexes");
        Self::create_indexes(&conn)?;
        conn.execute_batch("ANALYZE triples;")?;
        Ok(())
    }

    // === Triple Operations ===

    fn add_many(&self, cx: &CallContext, name: &str, triples: &[Triple]) -> StorageResult<usize> {
        cx.check()?;
        let mut conn = self.lock()?;
        Self::require_partition(&conn, name)?;

        let valid: Vec<&Triple> = triples.iter().filter(|t| t.is_valid()).collect();
        let mut inserted = 0;

        for batch in valid.chunks(self.batch_size) {
            match Self::insert_batch(&mut conn, cx, name, batch) {
                Ok(n) => inserted += n,
                Err(e) if e.is_interrupted() => return Err(e),
                Err(e) => {
                    warn!(partition = name, error = %e, "batch insert failed, retrying per triple");
                    for triple in batch {
                        cx.check()?;
                        match Self::insert_one(&conn, name, triple) {
                            Ok(n) => inserted += n,
                            Err(e) => warn!(partition = name, %triple, error = %e, "skipping triple"),
                        }
                    }
                }
            }
        }

        Ok(inserted)
    }

    fn add_one(&self, cx: &CallContext, name: &str, triple: &Triple) -> StorageResult<()> {
        cx.check()?;
        if !triple.is_valid() {
            return Err(StorageError::InvalidTriple(triple.to_string()));
        }
        let conn = self.lock()?;
        Self::require_partition(&conn, name)?;
        Self::insert_one(&conn, name, triple)?;
        Ok(())
    }

    fn remove(&self, cx: &CallContext, name: &str, pattern: &Pattern) -> StorageResult<()> {
        cx.check()?;
        let conn = self.lock()?;
        Self::require_partition(&conn, name)?;

        let mut sql = String::from("DELETE FROM triples WHERE g = ?");
        let mut params_vec: SqlParams = vec![Box::new(name.to_string())];
        Self::push_pattern(&mut sql, &mut params_vec, pattern);

        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;
        Ok(())
    }

    fn count(&self, cx: &CallContext, name: &str, pattern: &Pattern) -> StorageResult<u64> {
        cx.check()?;
        let conn = self.lock()?;
        Self::require_partition(&conn, name)?;

        let mut sql = String::from("SELECT COUNT(*) FROM triples WHERE g = ?");
        let mut params_vec: SqlParams = vec![Box::new(name.to_string())];
        Self::push_pattern(&mut sql, &mut params_vec, pattern);

        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let n: i64 = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    fn query(
        &self,
        cx: &CallContext,
        name: &str,
        pattern: &Pattern,
        options: &TripleOptions,
    ) -> StorageResult<Vec<Triple>> {
        cx.check()?;
        let conn = self.lock()?;
        Self::require_partition(&conn, name)?;

        let mut sql = String::from("SELECT s, p, kind, o FROM triples WHERE g = ?");
        let mut params_vec: SqlParams = vec![Box::new(name.to_string())];
        Self::push_pattern(&mut sql, &mut params_vec, pattern);
        let residual = Self::push_overrides(&mut sql, &mut params_vec, &options.overrides);
        sql.push_str(&Self::order_clause(options.effective_order()));

        // Paging moves into memory when overrides are still to be applied there.
        let page_in_sql = residual.is_empty();
        if page_in_sql && (options.limit != 0 || options.offset != 0) {
            let limit = if options.limit == 0 { -1 } else { options.limit as i64 };
            sql.push_str(" LIMIT ? OFFSET ?");
            params_vec.push(Box::new(limit));
            params_vec.push(Box::new(options.offset as i64));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_refs.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, SqlValue>(3)?,
            ))
        })?;

        let mut triples = Vec::new();
        for row in rows {
            cx.check()?;
            let (subject, predicate, kind, raw) = row?;
            let triple = Triple {
                subject,
                predicate,
                object: Self::decode(kind, raw)?,
            };
            if residual.admits(&triple) {
                triples.push(triple);
            }
        }

        if !page_in_sql {
            let limit = if options.limit == 0 { usize::MAX } else { options.limit };
            triples = triples.into_iter().skip(options.offset).take(limit).collect();
        }

        Ok(triples)
    }

    fn close(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}
