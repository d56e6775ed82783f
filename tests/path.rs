//! Shortest path search over the movie and friends fixture

mod common;

use common::{engines, loaded_graph};
use tristore::{CallContext, PathQuery};

#[test]
fn test_paths_from_destination_to_origin() {
    let cases: &[(&str, &str, &str, &[&str])] = &[
        ("Tom Cruise", "Kevin Bacon", "starring", &["Kevin Bacon", "A Few Good Men", "Tom Cruise"]),
        ("Tom Hanks", "Kevin Bacon", "starring", &["Kevin Bacon", "Apollo 13", "Tom Hanks"]),
        (
            "Val Kilmer",
            "Kevin Bacon",
            "starring",
            &["Kevin Bacon", "A Few Good Men", "Tom Cruise", "Top Gun", "Val Kilmer"],
        ),
        ("Pavlos", "Winona Winone", "friends_with", &["Winona Winone", "Fuod Ramseys", "Pavlos"]),
        (
            "Larry Schmiegal",
            "Winona Winone",
            "friends_with",
            &["Winona Winone", "Fuod Ramseys", "Pavlos", "Larry Schmiegal"],
        ),
    ];

    for (backend, engine) in engines() {
        let cx = CallContext::background();
        let graph = loaded_graph(&engine, "paths");
        for (start, end, adjacency, expected) in cases {
            let query = PathQuery::between(*start, *end).names("name").adjacency(*adjacency);
            let path = graph.path(&cx, &query).unwrap();
            assert_eq!(path, *expected, "{} {} -> {}", backend, start, end);
        }
    }
}

#[test]
fn test_no_path_is_empty() {
    for (backend, engine) in engines() {
        let cx = CallContext::background();
        let graph = loaded_graph(&engine, "nopath");
        let query = PathQuery::between("Tom Cruise", "Pavlos").adjacency("starring");
        assert!(graph.path(&cx, &query).unwrap().is_empty(), "{}", backend);
    }
}

#[test]
fn test_same_start_and_end() {
    for (backend, engine) in engines() {
        let cx = CallContext::background();
        let graph = loaded_graph(&engine, "self");
        let query = PathQuery::between("Pavlos", "Pavlos").adjacency("friends_with");
        assert_eq!(graph.path(&cx, &query).unwrap(), vec!["Pavlos"], "{}", backend);
    }
}

#[test]
fn test_depth_limit() {
    for (backend, engine) in engines() {
        let cx = CallContext::background();
        let graph = loaded_graph(&engine, "depth");
        let query = PathQuery::between("Val Kilmer", "Kevin Bacon").adjacency("starring").max_depth(2);
        assert!(graph.path(&cx, &query).unwrap().is_empty(), "{}", backend);
    }
}

#[test]
fn test_unknown_name_is_not_found() {
    for (backend, engine) in engines() {
        let cx = CallContext::background();
        let graph = loaded_graph(&engine, "unknown");
        let query = PathQuery::between("Nobody", "Kevin Bacon").adjacency("starring");
        let err = graph.path(&cx, &query).unwrap_err();
        assert!(err.is_not_found(), "{}", backend);
    }
}
