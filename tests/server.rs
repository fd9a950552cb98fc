//! HTTP API behavior against the in-process router.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use graphstudio::agent::{ConfigurableAgent, demo_graph};
use graphstudio::server::{AppState, build_router};

fn demo_router() -> Router {
    build_router(AppState::new(demo_graph()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn ok_endpoint_reports_healthy() {
    let response = demo_router()
        .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn graphs_endpoint_describes_the_active_graph() {
    let response = demo_router()
        .oneshot(Request::get("/graphs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], json!("demo"));
    assert_eq!(body["recursion_limit"], json!(50));
    // Demo graph has no checkpointer attached.
    assert_eq!(body["checkpointing"], Value::Null);
}

#[tokio::test]
async fn run_completes_and_returns_the_transcript() {
    let request = post_json(
        "/runs",
        json!({"messages": [{"role": "user", "content": "hello"}]}),
    );
    let response = demo_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], json!("done"));
    assert_eq!(body["steps"], json!(2));
    assert!(!body["thread_id"].as_str().unwrap().is_empty());
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.last().unwrap()["role"], json!("assistant"));
}

#[tokio::test]
async fn run_echoes_a_caller_supplied_thread_id() {
    let request = post_json(
        "/runs",
        json!({"thread_id": "t-42", "messages": [{"role": "user", "content": "hi"}]}),
    );
    let response = demo_router().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["thread_id"], json!("t-42"));
}

#[tokio::test]
async fn interrupting_graph_reports_interrupted_status() {
    let router = build_router(AppState::new(
        ConfigurableAgent::new(true).into_graph("interruptible"),
    ));
    let request = post_json(
        "/runs",
        json!({"messages": [{"role": "user", "content": "hello"}]}),
    );
    let response = router.oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], json!("interrupted"));
    assert_eq!(body["steps"], json!(1));
}

#[tokio::test]
async fn thread_lookup_without_checkpointer_is_not_found() {
    let response = demo_router()
        .oneshot(Request::get("/threads/t-1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
