//! HTTP API tests driving the router in-process

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value as Json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tristore::http::{router, AppState};
use tristore::inference::{Coordinates, InferenceResult};
use tristore::{GeoRule, GraphEngine, InferenceRegistry};

fn fixed_geocoder(_address: &str) -> InferenceResult<Coordinates> {
    Ok(Coordinates {
        lat: 37.7758944,
        lng: -122.4649686,
    })
}

fn app() -> Router {
    let engine = Arc::new(GraphEngine::in_memory());
    let inferences = InferenceRegistry::new().with_rule(Arc::new(GeoRule::new(fixed_geocoder)));
    router(Arc::new(AppState::new(engine, Arc::new(inferences), Duration::from_secs(5))))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Json>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Json>) -> (StatusCode, Json) {
    let (status, bytes) = send(app, method, uri, body).await;
    let json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, json)
}

async fn load_people(app: &Router) {
    let (status, body) = send_json(
        app,
        Method::POST,
        "/v1/data",
        Some(json!({
            "graph": "people",
            "prefix": {"foaf": "http://xmlns.com/foaf/0.1/"},
            "data": [
                ["/en/paul", "foaf:name", "Pavlos"],
                ["/en/paul", "age", 40],
                ["/en/paul", "likes", "turtles"],
                ["/en/winona", "foaf:name", "Winona Winone"],
                ["/en/winona", "age", 28],
                ["/en/winona", "likes", "turtles"],
                ["/en/winona", "likes", "chickens"],
                ["/en/paul", "friends_with", "/en/winona"],
                ["", "likes", "nobody"],
                null
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"graph": "people", "data": 8}));
}

#[tokio::test]
async fn test_ping() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/v1/ping", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"PONG");
}

#[tokio::test]
async fn test_add_and_list_graphs() {
    let app = app();
    load_people(&app).await;
    let (status, body) = send_json(&app, Method::GET, "/v1/graphs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": ["people"]}));
}

#[tokio::test]
async fn test_triples_and_count() {
    let app = app();
    load_people(&app).await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/v1/triples",
        Some(json!({"graph": "people", "sub": "/en/winona", "pred": "likes", "orderby": "o"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"graph": "people", "data": [
            ["/en/winona", "likes", "chickens"],
            ["/en/winona", "likes", "turtles"]
        ]})
    );

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/v1/triples/count",
        Some(json!({"graph": "people", "prefix": {"foaf": "http://xmlns.com/foaf/0.1/"}, "pred": "foaf:name"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(2));

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/v1/triples",
        Some(json!({"graph": "people", "orderby": "sideways"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_value_returns_null_when_missing() {
    let app = app();
    load_people(&app).await;

    let (_, body) = send_json(
        &app,
        Method::POST,
        "/v1/value",
        Some(json!({"graph": "people", "sub": "/en/paul", "pred": "age"})),
    )
    .await;
    assert_eq!(body, json!({"graph": "people", "data": 40}));

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/v1/value",
        Some(json!({"graph": "people", "sub": "/en/nobody", "pred": "age"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"graph": "people", "data": null}));
}

#[tokio::test]
async fn test_query_with_options() {
    let app = app();
    load_people(&app).await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/v1/query",
        Some(json!({
            "graph": "people",
            "prefix": {"foaf": "http://xmlns.com/foaf/0.1/"},
            "data": [["?id", "age", "?age"], ["?id", "foaf:name", "?name"]],
            "filter": [{"key": "age", "op": ">", "val": 30}],
            "select": ["name"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"graph": "people", "data": [{"name": "Pavlos"}]}));
}

#[tokio::test]
async fn test_query_count_echoes_request() {
    let app = app();
    load_people(&app).await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/v1/query",
        Some(json!({
            "graph": "people",
            "data": [["?who", "likes", "?thing"]],
            "select": ["?COUNT"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(3));
    assert_eq!(body["request"]["select"], json!(["?COUNT"]));
    assert_eq!(body["request"]["data"], json!([["?who", "likes", "?thing"]]));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app();
    let (status, body) = send_json(&app, Method::POST, "/v1/query", Some(json!({"data": "nope"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));

    let (status, _) = send_json(&app, Method::POST, "/v1/data", Some(json!({"graph": "", "data": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_data_drops_mistyped_entries() {
    let app = app();
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/v1/data",
        Some(json!({"graph": "g", "data": [
            ["a", "b", "c"],
            ["a", 5, "c"],
            [true, "b", "c"],
            "not a triple",
            ["d", "e", "f"]
        ]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"graph": "g", "data": 2}));

    let (_, body) = send_json(&app, Method::POST, "/v1/triples/count", Some(json!({"graph": "g"}))).await;
    assert_eq!(body["data"], json!(2));
}

#[tokio::test]
async fn test_remove_data() {
    let app = app();
    load_people(&app).await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/v1/data",
        Some(json!({"graph": "people", "data": [["/en/winona", null, null]]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (_, body) = send_json(&app, Method::POST, "/v1/triples/count", Some(json!({"graph": "people"}))).await;
    assert_eq!(body["data"], json!(4));

    send(&app, Method::DELETE, "/v1/data", Some(json!({"graph": "people", "data": [[null, null, null]]}))).await;
    let (_, body) = send_json(&app, Method::POST, "/v1/triples/count", Some(json!({"graph": "people"}))).await;
    assert_eq!(body["data"], json!(0));
}

#[tokio::test]
async fn test_index_and_drop() {
    let app = app();
    load_people(&app).await;

    let (status, _) = send(&app, Method::POST, "/v1/index?graph=people&background=false", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::POST, "/v1/index", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, "/v1/drop?graph=people", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    let (_, body) = send_json(&app, Method::GET, "/v1/graphs", None).await;
    assert_eq!(body, json!({"data": []}));
}

#[tokio::test]
async fn test_path() {
    let app = app();
    load_people(&app).await;

    let (status, body) = send_json(
        &app,
        Method::GET,
        "/v1/path?graph=people&start=Winona%20Winone&end=Pavlos&predicateName=http://xmlns.com/foaf/0.1/name&predicateAdjacent=friends_with",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"graph": "people", "data": ["Pavlos", "Winona Winone"]}));

    let (status, _) = send_json(
        &app,
        Method::GET,
        "/v1/path?graph=people&start=Nobody&end=Pavlos&predicateAdjacent=friends_with",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inference() {
    let app = app();
    send_json(
        &app,
        Method::POST,
        "/v1/data",
        Some(json!({"graph": "places", "data": [["/en/paul", "location:address", "666 8th Ave"]]})),
    )
    .await;

    let (status, body) = send_json(&app, Method::PUT, "/v1/inference?graph=places&inference=geo", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"graph": "places", "data": 2}));

    let (_, body) = send_json(
        &app,
        Method::POST,
        "/v1/value",
        Some(json!({"graph": "places", "sub": "666 8th Ave", "pred": "location:lat"})),
    )
    .await;
    assert_eq!(body["data"], json!(37.7758944));

    let (status, _) = send_json(&app, Method::PUT, "/v1/inference?graph=places&inference=astrology", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
