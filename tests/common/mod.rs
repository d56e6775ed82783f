//! Shared fixtures for integration tests
//!
//! A small movie / friends / places dataset, loaded into graphs backed by
//! each storage backend.

#![allow(dead_code)]

use std::sync::Arc;
use tristore::{CallContext, Graph, GraphEngine, MemoryStore, OpenStore, SqliteStore, Triple, TripleStore, Value};

const MOVIES: &[(&str, &str, &str)] = &[
    ("/en/apollo_13", "name", "Apollo 13"),
    ("/en/apollo_13", "starring", "/en/kevin_bacon"),
    ("/en/apollo_13", "starring", "/en/tom_hanks"),
    ("/en/a_few_good_men", "name", "A Few Good Men"),
    ("/en/a_few_good_men", "starring", "/en/tom_cruise"),
    ("/en/a_few_good_men", "starring", "/en/kevin_bacon"),
    ("/en/a_few_good_men", "directed_by", "/en/rob_reiner"),
    ("/en/top_gun", "name", "Top Gun"),
    ("/en/top_gun", "starring", "/en/tom_cruise"),
    ("/en/top_gun", "starring", "/en/val_kilmer"),
    ("/en/rob_reiner", "name", "Rob Reiner"),
    ("/en/tom_hanks", "name", "Tom Hanks"),
    ("/en/kevin_bacon", "name", "Kevin Bacon"),
    ("/en/val_kilmer", "name", "Val Kilmer"),
    ("/en/tom_cruise", "name", "Tom Cruise"),
];

const FRIENDS: &[(&str, &str, &str)] = &[
    ("/en/paul", "is_not", "human"),
    ("/en/paul", "has", "hands"),
    ("/en/paul", "name", "Pavlos"),
    ("/en/paul", "likes", "/en/scotch"),
    ("/en/paul", "likes", "/en/scooters"),
    ("/en/paul", "loves", "/en/scotch"),
    ("/en/paul", "lives_in", "/en/san_francisco"),
    ("/en/paul", "location:address", "666 8th Ave, San Francisco, CA"),
    ("/en/paul", "friends_with", "/en/larry"),
    ("/en/paul", "friends_with", "/en/fuod"),
    ("/en/fuod", "friends_with", "/en/paul"),
    ("/en/fuod", "friends_with", "/en/winona"),
    ("/en/winona", "friends_with", "/en/fuod"),
    ("/rel1", "start", "2001"),
    ("/rel1", "end", "2003"),
    ("/rel1", "with", "/en/paul"),
    ("/rel1", "with", "/en/fuod"),
    ("/rel2", "start", "2005"),
    ("/rel2", "end", "2012"),
    ("/rel2", "with", "/en/paul"),
    ("/rel2", "with", "/en/larry"),
    ("/en/larry", "name", "Larry Schmiegal"),
    ("/en/larry", "likes", "/en/beer"),
    ("/en/larry", "hates", "/en/scotch"),
    ("/en/larry", "lives_in", "/en/los_angeles"),
    ("/en/larry", "location:address", "1535 Vine Street, Los Angeles, CA 90028"),
    ("/en/fuod", "name", "Fuod Ramseys"),
    ("/en/fuod", "lives_in", "/en/chicago"),
    ("/en/fuod", "likes", "/en/scotch"),
    ("/en/winona", "name", "Winona Winone"),
    ("/en/winona", "lives_in", "san_francisco"),
    ("/en/winona", "location:address", "661 8th Ave, San Francisco, CA"),
    ("/en/scotch", "is", "good"),
    ("/en/beer", "is", "carbonated"),
];

const PLACES: &[(&str, &str, &str)] = &[
    ("/en/europe", "name", "Europe"),
    ("/en/greece", "name", "Greece"),
    ("/en/greece", "inside", "Europe"),
    ("/en/greece", "population", "11000000"),
    ("/en/athens", "name", "Athens"),
    ("/en/athens", "inside", "/en/greece"),
    ("/en/athens", "population", "3370000"),
    ("/en/usa", "name", "United States of America"),
    ("/en/california", "inside", "/en/usa"),
    ("/en/california", "name", "California"),
    ("/en/san_francisco", "inside", "/en/california"),
    ("/en/san_francisco", "name", "San Francisco"),
    ("/en/los_angeles", "inside", "/en/california"),
    ("/en/los_angeles", "name", "Los Angeles"),
    ("/en/los_angeles", "population", "3800000"),
    ("/en/san_diego", "inside", "/en/california"),
    ("/en/san_diego", "name", "San Diego"),
    ("/en/san_diego", "population", "1300000"),
    ("/en/chicago", "name", "Chicago"),
    ("/en/chicago", "population", "2700000"),
    ("/en/chicago", "murder_rate", "9.72"),
];

/// Numeric-looking objects become integers or floats.
fn typed(raw: &str) -> Value {
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    Value::from(raw)
}

fn to_triples(rows: &[(&str, &str, &str)]) -> Vec<Triple> {
    rows.iter().map(|(s, p, o)| Triple::new(*s, *p, typed(o))).collect()
}

pub fn movie_triples() -> Vec<Triple> {
    to_triples(MOVIES)
}

pub fn friend_triples() -> Vec<Triple> {
    to_triples(FRIENDS)
}

/// The whole dataset
pub fn all_triples() -> Vec<Triple> {
    let mut triples = movie_triples();
    triples.extend(friend_triples());
    triples.extend(to_triples(PLACES));
    triples
}

/// One engine per storage backend, labelled for assertion messages.
pub fn engines() -> Vec<(&'static str, GraphEngine)> {
    let sqlite: Arc<dyn TripleStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let memory: Arc<dyn TripleStore> = Arc::new(MemoryStore::new());
    vec![("sqlite", GraphEngine::new(sqlite)), ("memory", GraphEngine::new(memory))]
}

/// Create `name` in the engine and load the full dataset into it.
pub fn loaded_graph(engine: &GraphEngine, name: &str) -> Graph {
    let cx = CallContext::background();
    let graph = engine.create(&cx, name).unwrap();
    let triples = all_triples();
    let inserted = graph.add_many(&cx, &triples).unwrap();
    assert_eq!(inserted, triples.len());
    graph
}
