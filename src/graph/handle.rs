//! Graph handle: one named partition of a triple store

use super::binding::Binding;
use super::engine::{GraphError, GraphResult};
use super::triple::{Clause, Pattern, Triple};
use super::value::Value;
use crate::inference::InferenceRule;
use crate::query::{self, PathQuery, QueryOptions};
use crate::storage::{CallContext, TripleOptions, TripleStore};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// A cheap-to-clone handle on one graph partition.
///
/// The handle holds no triples itself; every call is forwarded to the shared
/// backend with the graph's id as the partition name.
#[derive(Clone)]
pub struct Graph {
    id: Arc<str>,
    store: Arc<dyn TripleStore>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Graph {
    pub(crate) fn new(id: &str, store: Arc<dyn TripleStore>) -> Self {
        Self { id: id.into(), store }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn timed<T>(&self, operation: &'static str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        debug!(graph = %self.id, operation, elapsed = ?start.elapsed(), "graph call finished");
        out
    }

    /// Insert many triples, skipping invalid ones and duplicates.
    pub fn add_many(&self, cx: &CallContext, triples: &[Triple]) -> GraphResult<usize> {
        self.timed("add_many", || Ok(self.store.add_many(cx, &self.id, triples)?))
    }

    /// Remove every triple matching any of the patterns. An all-wildcard
    /// pattern clears the graph.
    pub fn remove_many(&self, cx: &CallContext, patterns: &[Pattern]) -> GraphResult<()> {
        self.timed("remove_many", || Ok(self.store.remove_many(cx, &self.id, patterns)?))
    }

    /// Insert one triple. Unlike bulk inserts, an invalid triple is an error.
    pub fn add(&self, cx: &CallContext, triple: Triple) -> GraphResult<()> {
        if !triple.is_valid() {
            return Err(GraphError::InvalidTriple(triple.to_string()));
        }
        self.timed("add", || Ok(self.store.add_one(cx, &self.id, &triple)?))
    }

    /// Remove every triple matching the pattern.
    pub fn remove(&self, cx: &CallContext, pattern: &Pattern) -> GraphResult<()> {
        self.timed("remove", || Ok(self.store.remove(cx, &self.id, pattern)?))
    }

    /// Remove all triples, keeping the graph usable.
    pub fn clear(&self, cx: &CallContext) -> GraphResult<()> {
        self.timed("clear", || Ok(self.store.remove_all(cx, &self.id)?))
    }

    pub fn index(&self, cx: &CallContext, background: bool) -> GraphResult<()> {
        self.timed("index", || Ok(self.store.index(cx, &self.id, background)?))
    }

    pub fn triples(&self, cx: &CallContext, pattern: &Pattern, options: &TripleOptions) -> GraphResult<Vec<Triple>> {
        self.timed("triples", || Ok(self.store.query(cx, &self.id, pattern, options)?))
    }

    pub fn count(&self, cx: &CallContext, pattern: &Pattern) -> GraphResult<u64> {
        self.timed("count", || Ok(self.store.count(cx, &self.id, pattern)?))
    }

    /// The single value a pattern leaves open.
    ///
    /// Takes the first match and returns its subject if the pattern's
    /// subject is a wildcard, else its predicate if that is a wildcard, else
    /// its object. No match yields `GraphError::NotFound`.
    pub fn value(&self, cx: &CallContext, pattern: &Pattern) -> GraphResult<Value> {
        self.timed("value", || {
            let options = TripleOptions::new().with_limit(1);
            let triple = self
                .store
                .query(cx, &self.id, pattern, &options)?
                .into_iter()
                .next()
                .ok_or_else(|| GraphError::NotFound(format!("no triple matches in graph {}", self.id)))?;

            Ok(if pattern.subject().is_none() {
                Value::String(triple.subject)
            } else if pattern.predicate().is_none() {
                Value::String(triple.predicate)
            } else {
                triple.object
            })
        })
    }

    /// Run a clause query. Backend failures are logged and produce no
    /// bindings; use [`Graph::try_query`] to observe them.
    pub fn query(&self, cx: &CallContext, clauses: &[Clause], options: &QueryOptions) -> Vec<Binding> {
        match self.try_query(cx, clauses, options) {
            Ok(bindings) => bindings,
            Err(e) => {
                error!(graph = %self.id, error = %e, "query failed");
                Vec::new()
            }
        }
    }

    /// Run a clause query, surfacing backend failures.
    pub fn try_query(&self, cx: &CallContext, clauses: &[Clause], options: &QueryOptions) -> GraphResult<Vec<Binding>> {
        self.timed("query", || {
            let bindings = query::evaluate(self.store.as_ref(), cx, &self.id, clauses, &options.optional)?;
            Ok(query::apply(bindings, options))
        })
    }

    /// Shortest path between two named nodes, names ordered end to start.
    pub fn path(&self, cx: &CallContext, path: &PathQuery) -> GraphResult<Vec<String>> {
        self.timed("path", || path.execute(self.store.as_ref(), cx, &self.id))
    }

    /// Run an inference rule against this graph, returning how many triples
    /// it added.
    pub fn apply_inference(&self, cx: &CallContext, rule: &dyn InferenceRule) -> GraphResult<usize> {
        self.timed("apply_inference", || Ok(rule.apply(self, cx)?))
    }

    /// Copy every triple of `other` into this graph.
    pub fn merge(&self, cx: &CallContext, other: &Graph) -> GraphResult<usize> {
        self.timed("merge", || {
            let triples = other.store.query(cx, &other.id, &Pattern::any(), &TripleOptions::new())?;
            Ok(self.store.add_many(cx, &self.id, &triples)?)
        })
    }
}
