//! Integration tests for the kerasgen REST API.
//!
//! Run with: `cargo test --package kerasgen-api --test api_integration`

use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use kerasgen_api::create_router;
use kerasgen_ops::{Config, MemoryPublisher, OpsContext};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const PROJECT: &str = r#"{
    "content": {
        "input": "x",
        "output": "h1",
        "layers": [
            {"category": "layer", "type": "Dense", "name": "h1", "input": "x",
             "config": {"units": "64", "activation": "relu"}}
        ]
    },
    "config": {
        "optimizer": "adam", "learning_rate": 0.001, "loss": "mse",
        "metrics": ["accuracy", "mae"], "batch_size": 32, "epochs": 10, "output": "h1"
    }
}"#;

/// Create a test router rooted at `root` with an in-memory publisher.
fn create_test_router(root: &Path, publisher: Arc<MemoryPublisher>) -> Router {
    let mut config = Config::default();
    config.server.workspace_root = root.to_path_buf();
    create_router(OpsContext::new(config).with_publisher(publisher))
}

/// Send a request and return status, headers and raw body.
async fn send(
    router: &Router,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, body.to_vec())
}

/// Helper to make a GET request.
async fn get(router: &Router, uri: &str, user: Option<&str>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(user) = user {
        builder = builder.header("id", user);
    }
    let (status, _, body) = send(router, builder.body(Body::empty()).unwrap()).await;
    (status, body)
}

/// Helper to make a POST request with a raw JSON body.
async fn post(
    router: &Router,
    uri: &str,
    body: &str,
    user: Option<&str>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(user) = user {
        builder = builder.header("id", user);
    }
    send(router, builder.body(Body::from(body.to_string())).unwrap()).await
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or(json!(null))
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, body) = get(&router, "/health", None).await;
    assert_eq!(status, StatusCode::OK);

    let json = json_body(&body);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["data"]["version"].is_string());
    assert!(json["timestamp"].is_u64());
}

// =============================================================================
// Generate
// =============================================================================

#[tokio::test]
async fn test_generate_returns_attachment() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, headers, body) = post(&router, "/generate", PROJECT, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/x-python");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"model.py\""
    );

    let script = String::from_utf8(body).unwrap();
    assert_eq!(
        script,
        "import tensorflow as tf\n\n\
         h1 = tf.keras.layers.Dense(units=64, activation=\"relu\")(x)\n\
         model = tf.keras.Model(inputs=x, outputs=h1)\n\n\
         model.compile(optimizer=tf.keras.optimizers.adam(lr=0.001000), loss=\"mse\", metrics=[\"accuracy\", \"mae\"])\n"
    );
}

#[tokio::test]
async fn test_generate_saves_script_for_header_user() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, _, body) = post(&router, "/generate", PROJECT, Some("alice")).await;
    assert_eq!(status, StatusCode::OK);

    let saved = fs::read(temp.path().join("alice").join("model.py")).unwrap();
    assert_eq!(saved, body);
}

#[tokio::test]
async fn test_generate_malformed_body() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, _, body) = post(&router, "/generate", "{not json", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["data"]["code"], "BIND_ERROR");
}

#[tokio::test]
async fn test_generate_unknown_category() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let body = PROJECT.replace(r#""category": "layer""#, r#""category": "conv""#);
    let (status, _, body) = post(&router, "/generate", &body, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let json = json_body(&body);
    assert_eq!(json["data"]["code"], "UNKNOWN_CATEGORY");
    assert!(json["data"]["message"].as_str().unwrap().contains("conv"));
}

#[tokio::test]
async fn test_generate_unresolved_reference() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let body = PROJECT.replace(r#""name": "h1", "input": "x""#, r#""name": "h1", "input": "y""#);
    let (status, _, body) = post(&router, "/generate", &body, None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(&body)["data"]["code"], "UNRESOLVED_REFERENCE");
}

// =============================================================================
// Fit
// =============================================================================

#[tokio::test]
async fn test_fit_publishes_job() {
    let temp = TempDir::new().unwrap();
    let model = temp.path().join("alice").join("Model").join("variables");
    fs::create_dir_all(&model).unwrap();
    fs::write(model.join("variables.index"), b"index").unwrap();

    let publisher = Arc::new(MemoryPublisher::new());
    let router = create_test_router(temp.path(), publisher.clone());

    let (status, _, body) = post(&router, "/fit", PROJECT, Some("alice")).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let json = json_body(&body);
    assert_eq!(json["data"]["train"]["user_id"], "alice");
    assert_eq!(json["data"]["archived_files"], 2);
    assert!(temp.path().join("alice").join("Model.zip").exists());

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    let job: Value = serde_json::from_slice(&published[0]).unwrap();
    assert_eq!(job["epochs"], 10);
    assert_eq!(job["metrics"], json!(["accuracy", "mae"]));
}

#[tokio::test]
async fn test_fit_missing_model_dir() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, _, body) = post(&router, "/fit", PROJECT, Some("bob")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["data"]["code"], "MODEL_DIR_NOT_FOUND");
}

#[tokio::test]
async fn test_fit_broker_failure() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("alice").join("Model")).unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::failing("refused")));

    let (status, _, body) = post(&router, "/fit", PROJECT, Some("alice")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(&body)["data"]["code"], "BROKER_ERROR");
}

#[tokio::test]
async fn test_fit_without_user() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, _, body) = post(&router, "/fit", PROJECT, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body)["data"]["code"], "INVALID_USER_ID");
}

// =============================================================================
// Saved model
// =============================================================================

#[tokio::test]
async fn test_model_download() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("alice")).unwrap();
    fs::write(temp.path().join("alice").join("Model.zip"), b"PK\x03\x04").unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, body) = get(&router, "/model", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"PK\x03\x04");
}

#[tokio::test]
async fn test_model_not_found() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, body) = get(&router, "/model", Some("carol")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["data"]["code"], "ARCHIVE_NOT_FOUND");

    let (status, _) = get(&router, "/model", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_route() {
    let temp = TempDir::new().unwrap();
    let router = create_test_router(temp.path(), Arc::new(MemoryPublisher::new()));

    let (status, _) = get(&router, "/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
