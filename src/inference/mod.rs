//! Inference rules: derive new triples from existing ones
//!
//! Rules are registered by name in an [`InferenceRegistry`] built at startup
//! and handed to whoever needs it; there is no global rule table.

mod geo;

use crate::graph::{Binding, Graph, GraphError, Triple};
use crate::storage::CallContext;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub use geo::{parse_google_response, Coordinates, GeoRule, Geocoder, LAT_PREDICATE, LNG_PREDICATE, ADDRESS_PREDICATE};

/// Errors raised while applying an inference rule
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// The external service refuses further requests for now
    #[error("OVER_QUERY_LIMIT")]
    QuotaExceeded,

    #[error("No results for {0:?}")]
    NoResults(String),

    #[error("Geocoder error: {0}")]
    Geocoder(String),

    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Graph error: {0}")]
    Graph(Box<GraphError>),
}

impl From<GraphError> for InferenceError {
    fn from(e: GraphError) -> Self {
        InferenceError::Graph(Box::new(e))
    }
}

/// Result type for inference operations
pub type InferenceResult<T> = Result<T, InferenceError>;

/// A rule deriving triples from the bindings of a query over a graph
pub trait InferenceRule: Send + Sync {
    /// Registry name
    fn name(&self) -> &str;

    /// Query the graph, derive triples and add them. Returns the number of
    /// triples added.
    fn apply(&self, graph: &Graph, cx: &CallContext) -> InferenceResult<usize>;

    /// Triples implied by one binding of the rule's query
    fn derive_triples(&self, args: &Binding) -> InferenceResult<Vec<Triple>>;
}

/// Name to rule mapping
#[derive(Clone, Default)]
pub struct InferenceRegistry {
    rules: BTreeMap<String, Arc<dyn InferenceRule>>,
}

impl InferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule under its own name, replacing any previous one.
    pub fn register(&mut self, rule: Arc<dyn InferenceRule>) -> &mut Self {
        self.rules.insert(rule.name().to_string(), rule);
        self
    }

    pub fn with_rule(mut self, rule: Arc<dyn InferenceRule>) -> Self {
        self.register(rule);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn InferenceRule>> {
        self.rules.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for InferenceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceRegistry").field("rules", &self.names()).finish()
    }
}
