//! Clause-by-clause join over variable bindings
//!
//! Each clause goes through four steps: build a storage pattern and the
//! variable positions ([`ClausePlan::build`]), derive override sets from the
//! bindings found so far ([`compute_overrides`]), fetch matching triples, and
//! extend or reject every existing binding against every triple ([`join`]).
//! Clauses run strictly in the order given.

use super::chunk::chunk;
use crate::graph::{Binding, Clause, Pattern, Position, Term, Triple, Value};
use crate::storage::{CallContext, Overrides, StorageResult, TripleOptions, TripleStore};
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Bindings per parallel work unit
const JOIN_CHUNK_SIZE: usize = 256;

/// Cross products smaller than this are joined on the calling thread.
const PARALLEL_THRESHOLD: usize = 16_384;

/// A clause rewritten for storage: variables replaced by wildcards.
#[derive(Debug, Clone, PartialEq)]
pub struct ClausePlan {
    pub pattern: Pattern,
    /// Variable name and the tuple position it binds. A variable repeated
    /// within one clause keeps its last position.
    pub positions: Vec<(String, Position)>,
}

impl ClausePlan {
    /// Returns `None` for clauses whose subject or predicate is a non-string
    /// constant; such clauses are skipped.
    pub fn build(clause: &Clause) -> Option<Self> {
        let mut positions: Vec<(String, Position)> = Vec::new();
        let mut constants: [Option<&Value>; 3] = [None, None, None];

        for position in Position::ALL {
            match clause.term(position) {
                Term::Variable(name) => {
                    positions.retain(|(n, _)| n != name);
                    positions.push((name.clone(), position));
                }
                Term::Constant(value) => constants[position.index()] = Some(value),
            }
        }

        let as_string = |value: Option<&Value>| -> Option<String> {
            match value {
                None => Some(String::new()),
                Some(Value::String(s)) => Some(s.clone()),
                Some(_) => None,
            }
        };
        let subject = as_string(constants[0])?;
        let predicate = as_string(constants[1])?;

        Some(Self {
            pattern: Pattern::new(subject, predicate, constants[2].cloned()),
            positions,
        })
    }

    pub fn has_variables(&self) -> bool {
        !self.positions.is_empty()
    }
}

/// Collect, per position, the distinct values existing bindings hold for the
/// clause's variables.
///
/// Subject and predicate overrides only take string values; a variable
/// bound to a number can never match those positions.
pub fn compute_overrides(plan: &ClausePlan, bindings: &[Binding]) -> Overrides {
    let mut overrides = Overrides::default();
    if bindings.is_empty() || !plan.has_variables() {
        return overrides;
    }

    for (name, position) in &plan.positions {
        let mut seen: HashSet<&Value> = HashSet::new();
        for value in bindings.iter().filter_map(|b| b.get(name)) {
            if !seen.insert(value) {
                continue;
            }
            match position {
                Position::Subject => {
                    if let Some(s) = value.as_str() {
                        overrides.subjects.push(s.to_string());
                    }
                }
                Position::Predicate => {
                    if let Some(s) = value.as_str() {
                        overrides.predicates.push(s.to_string());
                    }
                }
                Position::Object => overrides.objects.push(value.clone()),
            }
        }
    }

    overrides
}

/// One fresh binding per triple, holding the clause's variables.
pub fn initial_bindings(plan: &ClausePlan, triples: &[Triple]) -> Vec<Binding> {
    triples
        .iter()
        .map(|triple| {
            plan.positions
                .iter()
                .map(|(name, position)| (name.clone(), triple.value_at(*position)))
                .collect()
        })
        .collect()
}

/// Extend `binding` with the triple's values, or reject the triple when an
/// already-bound variable disagrees with it.
pub fn extend(binding: &Binding, triple: &Triple, positions: &[(String, Position)]) -> Option<Binding> {
    let mut extended = binding.clone();
    for (name, position) in positions {
        let value = triple.value_at(*position);
        match binding.get(name) {
            Some(bound) if *bound != value => return None,
            Some(_) => {}
            None => {
                extended.insert(name.clone(), value);
            }
        }
    }
    Some(extended)
}

fn join_sequential(bindings: &[Binding], triples: &[Triple], positions: &[(String, Position)]) -> Vec<Binding> {
    bindings
        .iter()
        .flat_map(|binding| triples.iter().filter_map(move |triple| extend(binding, triple, positions)))
        .collect()
}

/// Nested-loop join of every binding with every triple.
///
/// Large cross products are split into binding chunks evaluated on the rayon
/// pool; chunk outputs are concatenated in order, so the result equals the
/// sequential one.
pub fn join(bindings: &[Binding], triples: &[Triple], plan: &ClausePlan) -> Vec<Binding> {
    let work = bindings.len().saturating_mul(triples.len());
    if work < PARALLEL_THRESHOLD || bindings.len() <= JOIN_CHUNK_SIZE {
        return join_sequential(bindings, triples, &plan.positions);
    }

    chunk(bindings, JOIN_CHUNK_SIZE)
        .into_par_iter()
        .map(|group| join_sequential(group, triples, &plan.positions))
        .collect::<Vec<Vec<Binding>>>()
        .concat()
}

/// Evaluate `clauses` against one graph partition.
///
/// A required clause without matches empties the result immediately; an
/// optional one (by index) leaves the bindings untouched. Once a clause has
/// produced bindings, a join that eliminates all of them also ends
/// evaluation with no results.
pub fn evaluate(
    store: &dyn TripleStore,
    cx: &CallContext,
    graph: &str,
    clauses: &[Clause],
    optional: &[usize],
) -> StorageResult<Vec<Binding>> {
    let mut bindings: Vec<Binding> = Vec::new();
    let mut initialized = false;

    for (index, clause) in clauses.iter().enumerate() {
        let Some(plan) = ClausePlan::build(clause) else {
            debug!(graph, clause = index, "skipping clause with non-string subject or predicate");
            continue;
        };

        let overrides = compute_overrides(&plan, &bindings);
        let options = TripleOptions::new().with_overrides(overrides);
        let triples = store.query(cx, graph, &plan.pattern, &options)?;

        if triples.is_empty() {
            if optional.contains(&index) {
                continue;
            }
            return Ok(Vec::new());
        }

        if !initialized {
            bindings = initial_bindings(&plan, &triples);
            initialized = true;
        } else {
            bindings = join(&bindings, &triples, &plan);
            if bindings.is_empty() {
                return Ok(bindings);
            }
        }
        debug!(graph, clause = index, triples = triples.len(), bindings = bindings.len(), "clause joined");
    }

    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn likes_store() -> (MemoryStore, CallContext) {
        let store = MemoryStore::new();
        let cx = CallContext::background();
        store.create_partition(&cx, "g").unwrap();
        store
            .add_many(
                &cx,
                "g",
                &[
                    Triple::new("winona", "likes", "turtles"),
                    Triple::new("winona", "likes", "chickens"),
                    Triple::new("paul", "likes", "turtles"),
                    Triple::new("paul", "age", 40),
                    Triple::new("paul", "dislikes", "chickens"),
                ],
            )
            .unwrap();
        (store, cx)
    }

    #[test]
    fn test_plan_replaces_variables_with_wildcards() {
        let plan = ClausePlan::build(&Clause::new("?p", "likes", "?thing")).unwrap();
        assert_eq!(plan.pattern, Pattern::any().with_predicate("likes"));
        assert_eq!(
            plan.positions,
            vec![("p".to_string(), Position::Subject), ("thing".to_string(), Position::Object)]
        );
    }

    #[test]
    fn test_plan_skips_non_string_subject() {
        let clause = Clause::new(Term::constant(3), "likes", "?x");
        assert!(ClausePlan::build(&clause).is_none());
    }

    #[test]
    fn test_repeated_variable_keeps_last_position() {
        let plan = ClausePlan::build(&Clause::new("?x", "knows", "?x")).unwrap();
        assert_eq!(plan.positions, vec![("x".to_string(), Position::Object)]);
    }

    #[test]
    fn test_compute_overrides_collects_distinct_values() {
        let plan = ClausePlan::build(&Clause::new("?p", "age", "?age")).unwrap();
        let bindings = vec![
            Binding::new().with("p", "paul"),
            Binding::new().with("p", "paul"),
            Binding::new().with("p", "winona"),
            Binding::new().with("q", "other"),
        ];
        let overrides = compute_overrides(&plan, &bindings);
        assert_eq!(overrides.subjects, vec!["paul", "winona"]);
        assert!(overrides.predicates.is_empty());
        assert!(overrides.objects.is_empty());
    }

    #[test]
    fn test_compute_overrides_drops_numbers_at_subject() {
        let plan = ClausePlan::build(&Clause::new("?n", "label", "?l")).unwrap();
        let bindings = vec![Binding::new().with("n", 7)];
        assert!(compute_overrides(&plan, &bindings).is_empty());
    }

    #[test]
    fn test_extend_rejects_conflicts() {
        let positions = vec![("p".to_string(), Position::Subject), ("x".to_string(), Position::Object)];
        let binding = Binding::new().with("p", "paul");

        let ok = extend(&binding, &Triple::new("paul", "likes", "turtles"), &positions).unwrap();
        assert_eq!(ok, Binding::new().with("p", "paul").with("x", "turtles"));
        assert!(extend(&binding, &Triple::new("winona", "likes", "turtles"), &positions).is_none());
    }

    #[test]
    fn test_join_conjunction() {
        let (store, cx) = likes_store();
        let clauses = vec![
            Clause::new("?p", "likes", "turtles"),
            Clause::new("?p", "likes", "?thing"),
        ];
        let got = evaluate(&store, &cx, "g", &clauses, &[]).unwrap();
        assert_eq!(
            got,
            vec![
                Binding::new().with("p", "winona").with("thing", "turtles"),
                Binding::new().with("p", "winona").with("thing", "chickens"),
                Binding::new().with("p", "paul").with("thing", "turtles"),
            ]
        );
    }

    #[test]
    fn test_optional_clause_keeps_bindings() {
        let (store, cx) = likes_store();
        let clauses = vec![
            Clause::new("?p", "likes", "turtles"),
            Clause::new("?p", "hates", "?thing"),
        ];
        assert_eq!(evaluate(&store, &cx, "g", &clauses, &[1]).unwrap().len(), 2);
        assert!(evaluate(&store, &cx, "g", &clauses, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_required_clause_without_matches_short_circuits() {
        let (store, cx) = likes_store();
        let clauses = vec![
            Clause::new("?p", "hates", "?thing"),
            Clause::new("?p", "likes", "turtles"),
        ];
        assert!(evaluate(&store, &cx, "g", &clauses, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_constant_clause_multiplies_bindings() {
        let (store, cx) = likes_store();
        let clauses = vec![
            Clause::new("?p", "age", "?age"),
            Clause::new(Term::constant(""), "likes", "turtles"),
        ];
        let got = evaluate(&store, &cx, "g", &clauses, &[]).unwrap();
        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|b| b == &Binding::new().with("p", "paul").with("age", 40)));
    }

    #[test]
    fn test_join_eliminating_everything_ends_evaluation() {
        let (store, cx) = likes_store();
        let clauses = vec![
            Clause::new("?p", "likes", "?thing"),
            Clause::new("?p", "dislikes", "?thing"),
            Clause::new("?q", "likes", "?other"),
        ];
        assert!(evaluate(&store, &cx, "g", &clauses, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_parallel_join_matches_sequential() {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let bindings: Vec<Binding> = (0..2_000)
            .map(|_| Binding::new().with("a", format!("n{}", rng.gen_range(0..50))))
            .collect();
        let triples: Vec<Triple> = (0..200)
            .map(|i| Triple::new(format!("n{}", rng.gen_range(0..50)), "edge", format!("m{}", i)))
            .collect();
        let plan = ClausePlan::build(&Clause::new("?a", "edge", "?b")).unwrap();

        let parallel = join(&bindings, &triples, &plan);
        let sequential = join_sequential(&bindings, &triples, &plan.positions);
        assert_eq!(parallel, sequential);
    }
}
