//! Shortest path search over an adjacency predicate

use crate::graph::{GraphError, GraphResult, Pattern, Value};
use crate::storage::{CallContext, TripleOptions, TripleStore};
use std::collections::{HashSet, VecDeque};

/// Default predicate holding a node's display name
pub const DEFAULT_NAME_PREDICATE: &str = "name";

/// One discovered node. `parent` indexes the node it was reached from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
    pub id: String,
    pub parent: Option<usize>,
    pub depth: usize,
}

/// Query for the shortest path between two named nodes
///
/// Nodes are identified through their name triple `(id, names, name)`. The
/// adjacency predicate is followed in both directions.
#[derive(Debug, Clone)]
pub struct PathQuery {
    /// Name of the start node
    pub start: String,
    /// Name of the end node
    pub end: String,
    /// Predicate linking an id to its name
    pub name_predicate: String,
    /// Predicate treated as an undirected edge
    pub adjacency_predicate: String,
    /// Maximum number of hops (None = unbounded)
    pub max_depth: Option<usize>,
}

impl PathQuery {
    /// Create a new path query between two names
    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            name_predicate: DEFAULT_NAME_PREDICATE.to_string(),
            adjacency_predicate: String::new(),
            max_depth: None,
        }
    }

    /// Set the name predicate
    pub fn names(mut self, predicate: impl Into<String>) -> Self {
        self.name_predicate = predicate.into();
        self
    }

    /// Set the adjacency predicate
    pub fn adjacency(mut self, predicate: impl Into<String>) -> Self {
        self.adjacency_predicate = predicate.into();
        self
    }

    /// Set maximum path length
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Run the search and return names ordered from the end node back to the
    /// start node. An empty list means no path was found.
    ///
    /// Fails with `GraphError::NotFound` when either name has no node.
    pub fn execute(&self, store: &dyn TripleStore, cx: &CallContext, graph: &str) -> GraphResult<Vec<String>> {
        let start_id = self.resolve_id(store, cx, graph, &self.start)?;
        let end_id = self.resolve_id(store, cx, graph, &self.end)?;

        let chain = self.bfs(store, cx, graph, start_id, &end_id)?;

        let mut names = Vec::with_capacity(chain.len());
        for id in &chain {
            if let Some(name) = self.name_of(store, cx, graph, id)? {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Breadth-first search from `start` to `end`. Returns node ids from `end`
    /// back to `start`, or an empty list when the frontier runs dry.
    pub fn bfs(
        &self,
        store: &dyn TripleStore,
        cx: &CallContext,
        graph: &str,
        start: String,
        end: &str,
    ) -> GraphResult<Vec<String>> {
        if start == end {
            return Ok(vec![start]);
        }

        let mut arena = vec![PathNode {
            id: start.clone(),
            parent: None,
            depth: 0,
        }];
        let mut visited: HashSet<String> = HashSet::from([start]);
        let mut queue: VecDeque<usize> = VecDeque::from([0]);

        while let Some(current) = queue.pop_front() {
            let depth = arena[current].depth;
            if self.max_depth.is_some_and(|max| depth >= max) {
                continue;
            }

            for neighbor in self.neighbors(store, cx, graph, &arena[current].id)? {
                if !visited.insert(neighbor.clone()) {
                    continue;
                }
                let found = neighbor == end;
                arena.push(PathNode {
                    id: neighbor,
                    parent: Some(current),
                    depth: depth + 1,
                });
                let index = arena.len() - 1;
                if found {
                    return Ok(Self::reconstruct(&arena, index));
                }
                queue.push_back(index);
            }
        }

        Ok(Vec::new())
    }

    /// Incoming neighbours first (subjects pointing at `id`), then outgoing
    /// ones (string objects `id` points at).
    fn neighbors(&self, store: &dyn TripleStore, cx: &CallContext, graph: &str, id: &str) -> GraphResult<Vec<String>> {
        let options = TripleOptions::new();

        let incoming = Pattern::any()
            .with_predicate(self.adjacency_predicate.clone())
            .with_object(id);
        let mut neighbors: Vec<String> = store
            .query(cx, graph, &incoming, &options)?
            .into_iter()
            .map(|t| t.subject)
            .collect();

        let outgoing = Pattern::any()
            .with_subject(id)
            .with_predicate(self.adjacency_predicate.clone());
        neighbors.extend(store.query(cx, graph, &outgoing, &options)?.into_iter().filter_map(
            |t| match t.object {
                Value::String(s) => Some(s),
                _ => None,
            },
        ));

        Ok(neighbors)
    }

    fn reconstruct(arena: &[PathNode], from: usize) -> Vec<String> {
        let mut chain = Vec::new();
        let mut cursor = Some(from);
        while let Some(index) = cursor {
            chain.push(arena[index].id.clone());
            cursor = arena[index].parent;
        }
        chain
    }

    fn resolve_id(&self, store: &dyn TripleStore, cx: &CallContext, graph: &str, name: &str) -> GraphResult<String> {
        let pattern = Pattern::any()
            .with_predicate(self.name_predicate.clone())
            .with_object(name);
        store
            .query(cx, graph, &pattern, &TripleOptions::new().with_limit(1))?
            .into_iter()
            .next()
            .map(|t| t.subject)
            .ok_or_else(|| GraphError::NotFound(format!("no node named {:?}", name)))
    }

    fn name_of(&self, store: &dyn TripleStore, cx: &CallContext, graph: &str, id: &str) -> GraphResult<Option<String>> {
        let pattern = Pattern::any()
            .with_subject(id)
            .with_predicate(self.name_predicate.clone());
        let name = store
            .query(cx, graph, &pattern, &TripleOptions::new().with_limit(1))?
            .into_iter()
            .next()
            .and_then(|t| match t.object {
                Value::String(s) => Some(s),
                _ => None,
            });
        Ok(name)
    }
}
