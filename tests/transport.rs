//! The demo application served over real HTTP.

use reqwest::StatusCode;
use serde_json::{json, Value};

use expressway::config::AppConfig;

mod common;
use common::{client, start_demo_server};

#[tokio::test]
async fn test_health_and_request_id() {
    let server = start_demo_server(AppConfig::default()).await;

    let res = client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let id = res.headers().get("x-request-id").unwrap().to_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "status": "ok" }));

    // A caller-supplied ID is propagated unchanged.
    let res = client()
        .get(server.url("/health"))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn test_head_on_get_route_has_no_body() {
    let server = start_demo_server(AppConfig::default()).await;

    let res = client().head(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_route_params_query_and_wildcard() {
    let server = start_demo_server(AppConfig::default()).await;
    let http = client();

    let body: Value = http
        .get(server.url("/users/7/posts/3"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "userId": "7", "postId": "3" }));

    let body: Value = http
        .get(server.url("/search?q=hello%20world&page=2&tag=a&tag=b"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["query"], "hello world");
    assert_eq!(body["page"], 2);
    assert_eq!(body["tags"], json!(["a", "b"]));

    let res = http.get(server.url("/search?page=two")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = http
        .get(server.url("/files/docs/guide.txt"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["path"], "docs/guide.txt");
}

#[tokio::test]
async fn test_user_api_crud() {
    let server = start_demo_server(AppConfig::default()).await;
    let http = client();

    let list: Value = http.get(server.url("/api/users")).send().await.unwrap().json().await.unwrap();
    assert_eq!(list["count"], 2);

    let res = http
        .post(server.url("/api/users"))
        .json(&json!({ "name": "Ann", "email": "ann@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["id"], 3);

    let res = http
        .put(server.url("/api/users/3"))
        .json(&json!({ "email": "ann@example.org" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["email"], "ann@example.org");

    let res = http
        .post(server.url("/api/users"))
        .json(&json!({ "name": "No Email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await.unwrap()["error"], "Validation Error");

    let res = http.delete(server.url("/api/users/3")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = http.get(server.url("/api/users/3")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await.unwrap()["message"], "User 3 not found");

    assert_eq!(server.services.users.len(), 2);
}

#[tokio::test]
async fn test_unknown_route_gets_json_404() {
    let server = start_demo_server(AppConfig::default()).await;
    let res = client().delete(server.url("/nowhere")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "Cannot DELETE /nowhere");
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = AppConfig::default();
    config.server.max_body_size = 64;
    let server = start_demo_server(config).await;

    let res = client()
        .post(server.url("/echo"))
        .header("content-type", "application/json")
        .body(format!("{{\"data\":\"{}\"}}", "x".repeat(256)))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let res = client()
        .post(server.url("/echo"))
        .json(&json!({ "ok": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["body"], json!({ "ok": true }));
    assert_eq!(body["contentType"], "application/json");
}

#[tokio::test]
async fn test_errors_and_panics_become_500_without_details() {
    let server = start_demo_server(AppConfig::default()).await;
    let http = client();

    for path in ["/error/unhandled", "/error/panic"] {
        let res = http.get(server.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Internal Server Error" }), "{path}");
    }

    // The server keeps serving after a handler panic.
    let res = http.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_redirect_and_bearer_auth() {
    let mut config = AppConfig::default();
    config.security.api_token = "letmein".into();
    let server = start_demo_server(config).await;
    let http = client();

    let res = http.get(server.url("/redirect")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(res.headers()["location"], "/");

    let res = http.get(server.url("/protected")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = http
        .get(server.url("/protected"))
        .bearer_auth("letmein")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_cookie_round_trip() {
    let server = start_demo_server(AppConfig::default()).await;
    let http = client();

    let res = http
        .post(server.url("/login"))
        .json(&json!({ "username": "user", "password": "password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let set_cookie = res.headers()["set-cookie"].to_str().unwrap().to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let res = http
        .get(server.url("/profile"))
        .header("cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap()["name"], "Regular User");
}
