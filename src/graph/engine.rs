//! GraphEngine: The registry of named graphs

use super::handle::Graph;
use crate::inference::InferenceError;
use crate::storage::{CallContext, MemoryStore, StorageError, TripleStore};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that can occur in graph operations
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Invalid triple: {0}")]
    InvalidTriple(String),

    #[error("Missing graph name")]
    MissingGraphName,

    #[error("Graph not found: {0}")]
    GraphNotFound(String),

    /// No triple matched a single-value lookup
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unknown inference rule: {0}")]
    UnknownInference(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),
}

impl GraphError {
    /// True for the "no data" sentinel, as opposed to a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Process-wide registry of graph handles
///
/// Handles are created lazily on first use. Creation of a given name is
/// serialized through the map entry, so concurrent callers provision each
/// backend partition once.
pub struct GraphEngine {
    store: Arc<dyn TripleStore>,
    graphs: DashMap<String, Graph>,
}

impl GraphEngine {
    /// Create an engine over a storage backend
    pub fn new(store: Arc<dyn TripleStore>) -> Self {
        Self {
            store,
            graphs: DashMap::new(),
        }
    }

    /// Engine over a fresh `MemoryStore`
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The shared storage backend
    pub fn store(&self) -> &Arc<dyn TripleStore> {
        &self.store
    }

    /// Look a graph up in the registry, then in the backend.
    pub fn resolve(&self, cx: &CallContext, name: &str) -> GraphResult<Option<Graph>> {
        if let Some(graph) = self.graphs.get(name) {
            return Ok(Some(graph.clone()));
        }
        if name.is_empty() || !self.store.has_partition(cx, name)? {
            return Ok(None);
        }
        let graph = self
            .graphs
            .entry(name.to_string())
            .or_insert_with(|| Graph::new(name, Arc::clone(&self.store)))
            .clone();
        Ok(Some(graph))
    }

    /// Create a graph and its indexes. Creating an existing graph returns it.
    pub fn create(&self, cx: &CallContext, name: &str) -> GraphResult<Graph> {
        if name.is_empty() {
            return Err(GraphError::MissingGraphName);
        }
        match self.graphs.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                self.store.create_partition(cx, name)?;
                self.store.index(cx, name, false)?;
                let graph = Graph::new(name, Arc::clone(&self.store));
                entry.insert(graph.clone());
                info!(graph = name, "graph created");
                Ok(graph)
            }
        }
    }

    /// Resolve a graph, creating it when it does not exist yet.
    pub fn resolve_or_create(&self, cx: &CallContext, name: &str) -> GraphResult<Graph> {
        match self.resolve(cx, name)? {
            Some(graph) => Ok(graph),
            None => self.create(cx, name),
        }
    }

    /// Resolve a graph that must already exist.
    pub fn require(&self, cx: &CallContext, name: &str) -> GraphResult<Graph> {
        if name.is_empty() {
            return Err(GraphError::MissingGraphName);
        }
        self.resolve(cx, name)?
            .ok_or_else(|| GraphError::GraphNotFound(name.to_string()))
    }

    /// Names of every graph known to the backend
    pub fn list(&self, cx: &CallContext) -> GraphResult<Vec<String>> {
        Ok(self.store.list_partitions(cx)?)
    }

    /// Delete a graph with all its triples and forget its handle.
    pub fn drop_graph(&self, cx: &CallContext, name: &str) -> GraphResult<()> {
        if name.is_empty() {
            return Err(GraphError::MissingGraphName);
        }
        self.store.drop_partition(cx, name)?;
        self.graphs.remove(name);
        info!(graph = name, "graph dropped");
        Ok(())
    }

    /// Number of handles currently cached
    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    /// Release the storage backend
    pub fn close(&self) -> GraphResult<()> {
        self.graphs.clear();
        Ok(self.store.close()?)
    }
}
