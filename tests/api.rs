//! Drives the studio HTTP API end to end against the offline provider.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use posterkit::{
    api,
    keygate::KeyGate,
    orchestrator::Studio,
    providers::{CreativeProvider, MockProvider},
};
use serde_json::{json, Value};
use tower::ServiceExt;

const PNG: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn app_with(provider: MockProvider) -> Router {
    api::router(Studio::new(KeyGate::open(Arc::new(provider))))
}

async fn send(app: &Router, method: Method, uri: &str, body: Body, content_type: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", content_type)
        .body(body)
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    // axum's own rejections answer in plain text
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Body::empty(), "application/json").await
}

async fn post_json(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, method, uri, Body::from(body.to_string()), "application/json").await
}

async fn upload(app: &Router) -> (StatusCode, Value) {
    send(app, Method::POST, "/api/image", Body::from(PNG.to_vec()), "image/png").await
}

#[tokio::test]
async fn generate_without_upload_is_a_no_op() {
    let app = app_with(MockProvider::new());
    let (status, _) = post_json(&app, Method::PUT, "/api/styles/selected", json!({"id": "k-cream"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(&app, Method::POST, "/api/generate", Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, history) = get(&app, "/api/history").await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn upload_then_generate_fills_result_and_history() {
    let app = app_with(MockProvider::new());
    let (status, snap) = upload(&app).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["hasImage"], true);
    assert_eq!(snap["step"], "idle");
    assert!(!snap["description"].as_str().unwrap().is_empty());

    let (status, _) = post_json(
        &app,
        Method::PUT,
        "/api/config",
        json!({"aspectRatio": "square", "productAngle": "top", "focusPoints": ["Rain shower head"]}),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, outcome) = post_json(&app, Method::POST, "/api/generate", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["entry"]["styleName"], "Five-Star Hotel White");
    assert_eq!(outcome["details"].as_array().unwrap().len(), 3);
    assert_eq!(outcome["details"][0]["focusPoint"], "Rain shower head");

    let (_, result) = get(&app, "/api/result").await;
    assert_eq!(result["poster"]["mimeType"], "image/png");
    assert_eq!(result["details"].as_array().unwrap().len(), 3);

    let (_, history) = get(&app, "/api/history").await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn more_than_three_focus_points_are_rejected() {
    let app = app_with(MockProvider::new());
    let (status, _) = post_json(&app, Method::PUT, "/api/config", json!({"focusPoints": ["a", "b", "c", "d"]})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, cfg) = get(&app, "/api/config").await;
    assert_eq!(cfg["focusPoints"], json!([]));
}

#[tokio::test]
async fn delete_history_removes_only_the_target() {
    let app = app_with(MockProvider::new());
    upload(&app).await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let (_, outcome) = post_json(&app, Method::POST, "/api/generate", Value::Null).await;
        ids.push(outcome["entry"]["id"].as_str().unwrap().to_string());
    }

    let (status, _) = send(&app, Method::DELETE, &format!("/api/history/{}", ids[1]), Body::empty(), "application/json").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, history) = get(&app, "/api/history").await;
    let left: Vec<_> = history.as_array().unwrap().iter().map(|e| e["id"].as_str().unwrap().to_string()).collect();
    assert_eq!(left, vec![ids[2].clone(), ids[0].clone()]);

    let (status, err) = send(&app, Method::DELETE, &format!("/api/history/{}", ids[1]), Body::empty(), "application/json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "not_found");
}

#[tokio::test]
async fn provider_failure_surfaces_an_alert() {
    let app = app_with(MockProvider::failing());
    let (status, _) = upload(&app).await;
    assert_eq!(status, StatusCode::OK);

    let (status, err) = post_json(&app, Method::POST, "/api/generate", Value::Null).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(err["code"], "alert");
    assert_eq!(err["error"], "Generation failed, please try again later.");

    let (_, snap) = get(&app, "/api/state").await;
    assert_eq!(snap["step"], "idle");
    assert_eq!(snap["description"], "");
    let (_, history) = get(&app, "/api/history").await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn missing_key_gates_model_calls() {
    let gate = KeyGate::pending(|_| Arc::new(MockProvider::new()) as Arc<dyn CreativeProvider>);
    let app = api::router(Studio::new(gate));

    let (_, status_body) = get(&app, "/api/key").await;
    assert_eq!(status_body["hasApiKey"], false);

    let (status, err) = upload(&app).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["code"], "no_api_key");

    let (status, body) = post_json(&app, Method::PUT, "/api/key", json!({"apiKey": "k-123"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasApiKey"], true);

    let (status, _) = upload(&app).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn suggested_styles_come_first() {
    let app = app_with(MockProvider::new());
    upload(&app).await;
    let (status, catalog) = post_json(&app, Method::POST, "/api/styles/suggest", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let styles = catalog["styles"].as_array().unwrap();
    assert_eq!(styles.len(), 11);
    assert_eq!(catalog["selected"], styles[0]["id"]);
    assert_eq!(styles[1]["id"], "hotel-luxury");
}

#[tokio::test]
async fn unknown_style_and_bad_image_are_client_errors() {
    let app = app_with(MockProvider::new());
    let (status, err) = post_json(&app, Method::PUT, "/api/styles/selected", json!({"id": "nope"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "unknown_style");

    let (status, err) = send(&app, Method::POST, "/api/image", Body::from("hello"), "text/plain").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["code"], "invalid_image");
}

#[tokio::test]
async fn description_can_be_edited_after_analysis() {
    let app = app_with(MockProvider::new());
    upload(&app).await;
    let (status, snap) = post_json(&app, Method::PUT, "/api/description", json!({"description": "Walnut side table"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["description"], "Walnut side table");

    let (_, snap) = get(&app, "/api/state").await;
    assert_eq!(snap["description"], "Walnut side table");
}

#[tokio::test]
async fn removing_the_image_makes_generate_a_no_op() {
    let app = app_with(MockProvider::new());
    upload(&app).await;
    let (status, _) = post_json(&app, Method::POST, "/api/generate", Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    let (status, snap) = send(&app, Method::DELETE, "/api/image", Body::empty(), "application/json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snap["hasImage"], false);
    assert_eq!(snap["description"], "");

    let (_, result) = get(&app, "/api/result").await;
    assert_eq!(result["poster"], Value::Null);
    assert_eq!(result["details"], json!([]));

    let (status, _) = post_json(&app, Method::POST, "/api/generate", Value::Null).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, history) = get(&app, "/api/history").await;
    assert_eq!(history.as_array().unwrap().len(), 1);
}
