//! Tristore: an embeddable triple store with a join query engine
//!
//! Facts are `(subject, predicate, object)` triples grouped into named
//! graphs. Graphs live in a pluggable backend (SQLite or memory) and are
//! queried with variable-binding clause joins, a filter / select / distinct /
//! sort / paginate result pipeline and a shortest-path search.
//!
//! # Core Concepts
//!
//! - **Triples**: string subject and predicate, typed [`Value`] object
//! - **Graphs**: named partitions of one [`TripleStore`], reached through [`GraphEngine`]
//! - **Clauses**: triple patterns whose `?variables` are joined into [`Binding`]s
//!
//! # Example
//!
//! ```
//! use tristore::{CallContext, Clause, GraphEngine, QueryOptions, Triple};
//!
//! let engine = GraphEngine::in_memory();
//! let cx = CallContext::background();
//! let graph = engine.create(&cx, "people").unwrap();
//! graph.add(&cx, Triple::new("/en/paul", "likes", "turtles")).unwrap();
//!
//! let found = graph.query(&cx, &[Clause::new("?who", "likes", "turtles")], &QueryOptions::new());
//! assert_eq!(found.len(), 1);
//! ```

pub mod config;
pub mod graph;
pub mod http;
pub mod inference;
pub mod query;
pub mod storage;

pub use config::{BackendKind, ConfigError, ServerConfig};
pub use graph::{
    Binding, Clause, Graph, GraphEngine, GraphError, GraphResult, Pattern, Position, Term, Triple, Value,
};
pub use inference::{GeoRule, Geocoder, InferenceError, InferenceRegistry, InferenceRule};
pub use query::{Filter, FilterOp, PathQuery, QueryOptions};
pub use storage::{
    CallContext, MemoryStore, OpenStore, OrderBy, SqliteStore, StorageError, StorageResult, TripleOptions,
    TripleStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
