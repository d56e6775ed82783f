//! Query system for tristore graphs
//!
//! Provides the clause join, the post-join result pipeline and shortest
//! path search.

mod chunk;
mod join;
mod path;
mod pipeline;
mod types;

pub use chunk::chunk;
pub use join::{compute_overrides, evaluate, extend, initial_bindings, join, ClausePlan};
pub use path::{PathNode, PathQuery, DEFAULT_NAME_PREDICATE};
pub use pipeline::{apply, distinct, filter, paginate, project, sort};
pub use types::{Filter, FilterOp, QueryOptions, COUNT_SENTINEL};
