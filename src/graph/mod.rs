//! Core graph data structures

mod binding;
mod engine;
mod handle;
mod triple;
mod value;

pub use binding::Binding;
pub use engine::{GraphEngine, GraphError, GraphResult};
pub use handle::Graph;
pub use triple::{Clause, Pattern, Position, Term, Triple, VARIABLE_SIGIL};
pub use value::Value;
