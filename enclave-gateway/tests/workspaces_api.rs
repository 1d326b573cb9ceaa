//! Integration test: the `/workspaces` API over a real on-disk store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use enclave_core::DaemonId;
use enclave_gateway::routes::create_router;
use enclave_store::{DirectoryProvisioner, LocalWorkspaceStore};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "enclave-api-boundary";

async fn test_app() -> (Router, TempDir) {
    let dir = match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => panic!("failed to create tempdir: {e}"),
    };
    let store = match LocalWorkspaceStore::open(dir.path(), DirectoryProvisioner::new()).await {
        Ok(s) => s,
        Err(e) => panic!("failed to open store: {e}"),
    };
    (create_router(Arc::new(store), 1024 * 1024), dir)
}

fn multipart_body(files: &[(&str, &str)]) -> Body {
    let mut body = String::new();
    for (file_name, content) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\n\r\n{content}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Body::from(body)
}

async fn call(app: &Router, method: &str, uri: &str, files: Option<&[(&str, &str)]>) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match files {
        Some(files) => builder
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(multipart_body(files)),
        None => builder.body(Body::empty()),
    };
    let req = match req {
        Ok(r) => r,
        Err(e) => panic!("failed to build request: {e}"),
    };
    let resp = match app.clone().oneshot(req).await {
        Ok(r) => r,
        Err(e) => panic!("handler error: {e}"),
    };
    let status = resp.status();
    let bytes = match axum::body::to_bytes(resp.into_body(), 1024 * 1024).await {
        Ok(b) => b,
        Err(e) => panic!("failed to read body: {e}"),
    };
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(v) => v,
            Err(e) => panic!("invalid JSON: {e}"),
        }
    };
    (status, value)
}

fn as_id(value: &serde_json::Value) -> DaemonId {
    match value.as_str().map(str::parse::<DaemonId>) {
        Some(Ok(id)) => id,
        other => panic!("expected a workspace id, got {value} ({other:?})"),
    }
}

async fn wait_for_state(app: &Router, id: &DaemonId, state: &str) -> serde_json::Value {
    for _ in 0..200 {
        let (status, item) = call(app, "GET", &format!("/workspaces/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        if item["state"] == state {
            return item;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("workspace {id} never reached {state}");
}

#[tokio::test]
async fn get_unknown_workspace_returns_404() {
    let (app, _dir) = test_app().await;
    let (status, body) = call(&app, "GET", &format!("/workspaces/{}", DaemonId::workspace()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string(), "error body must carry a message");
}

#[tokio::test]
async fn delete_unknown_workspace_returns_404() {
    let (app, _dir) = test_app().await;
    let (status, _) = call(&app, "DELETE", &format!("/workspaces/{}", DaemonId::workspace()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_returns_201_and_distinct_ids() {
    let (app, _dir) = test_app().await;
    let (first_status, first) = call(&app, "POST", "/workspaces", Some(&[("flow.yml", "jtype: Flow")])).await;
    let (second_status, second) = call(&app, "POST", "/workspaces", Some(&[("flow.yml", "jtype: Flow")])).await;
    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::CREATED);
    assert_ne!(as_id(&first), as_id(&second), "each POST must allocate a new id");
}

#[tokio::test]
async fn put_on_existing_workspace_returns_200_and_same_id() {
    let (app, _dir) = test_app().await;
    let (_, created) = call(&app, "POST", "/workspaces", Some(&[("a.py", "print(1)")])).await;
    let id = as_id(&created);
    wait_for_state(&app, &id, "ACTIVE").await;

    let (status, updated) = call(&app, "PUT", &format!("/workspaces/{id}"), Some(&[("b.py", "print(2)")])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_id(&updated), id);

    let item = wait_for_state(&app, &id, "ACTIVE").await;
    assert_eq!(item["arguments"]["files"], serde_json::json!(["a.py", "b.py"]));
}

#[tokio::test]
async fn put_on_unknown_workspace_returns_400() {
    let (app, _dir) = test_app().await;
    let uri = format!("/workspaces/{}", DaemonId::workspace());
    let (status, _) = call(&app, "PUT", &uri, Some(&[("a.py", "x")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_with_escaping_file_name_returns_400() {
    let (app, _dir) = test_app().await;
    let (status, _) = call(&app, "POST", "/workspaces", Some(&[("../evil.sh", "rm -rf /")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_all_then_list_is_empty() {
    let (app, _dir) = test_app().await;
    for name in ["a.py", "b.py"] {
        let (status, _) = call(&app, "POST", "/workspaces", Some(&[(name, "x")])).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, before) = call(&app, "GET", "/workspaces", None).await;
    assert_eq!(before["size"], 2);

    let (status, _) = call(&app, "DELETE", "/workspaces", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, after) = call(&app, "GET", "/workspaces", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["items"], serde_json::json!({}));
    assert_eq!(after["size"], 0);
    assert_eq!(after["num_del"], 2);
}

#[tokio::test]
async fn get_after_delete_returns_404() {
    let (app, _dir) = test_app().await;
    let (_, created) = call(&app, "POST", "/workspaces", Some(&[("a.py", "x")])).await;
    let id = as_id(&created);
    let uri = format!("/workspaces/{id}");

    let (status, _) = call(&app, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
