//! Site routes of the example application.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{json, Map, Value};

use crate::context::{Context, Parsed};
use crate::dispatch::{endpoint, BoxedHandler, HandlerError, HandlerResult, Next};
use crate::middleware::{JsonBody, Validate};
use crate::routing::{PatternError, Router, WILDCARD_PARAM};
use crate::security::RequireAuth;
use crate::session::{Session, SessionStore};

/// Demo accounts accepted by `/login`: (username, password, display name).
const ACCOUNTS: &[(&str, &str, &str)] = &[
    ("admin", "password", "Admin User"),
    ("user", "password", "Regular User"),
];

const HOME_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>expressway</title></head>
<body>
  <h1>expressway</h1>
  <ul>
    <li><a href="/users/42">/users/:id</a></li>
    <li><a href="/users/7/posts/3">/users/:userId/posts/:postId</a></li>
    <li><a href="/products/books/12">/products/:category/:id</a></li>
    <li><a href="/search?q=rust&amp;page=2">/search?q=&amp;page=</a></li>
    <li><a href="/files/docs/readme.txt">/files/*</a></li>
    <li><a href="/api/users">/api/users</a></li>
  </ul>
</body>
</html>
"#;

pub fn register(
    router: &mut Router,
    sessions: Arc<SessionStore>,
    api_token: &str,
) -> Result<(), PatternError> {
    router
        .get("/", |ctx, _next| {
            ctx.html(StatusCode::OK, HOME_PAGE)?;
            Ok(())
        })?
        .get("/health", |ctx, _next| {
            ctx.json(StatusCode::OK, &json!({ "status": "ok" }))?;
            Ok(())
        })?
        .get("/users/:id", |ctx, _next| {
            let body = json!({ "userId": ctx.param("id") });
            ctx.json(StatusCode::OK, &body)?;
            Ok(())
        })?
        .get("/users/:userId/posts/:postId", |ctx, _next| {
            let body = json!({
                "userId": ctx.param("userId"),
                "postId": ctx.param("postId"),
            });
            ctx.json(StatusCode::OK, &body)?;
            Ok(())
        })?
        .get("/products/:category/:id", |ctx, _next| {
            let body = json!({
                "category": ctx.param("category"),
                "productId": ctx.param("id"),
            });
            ctx.json(StatusCode::OK, &body)?;
            Ok(())
        })?
        .get("/search", search)?
        .get("/files/*", |ctx, _next| {
            let body = json!({ "path": ctx.param(WILDCARD_PARAM).unwrap_or_default() });
            ctx.json(StatusCode::OK, &body)?;
            Ok(())
        })?
        .get("/redirect", |ctx, _next| {
            ctx.response.redirect_to("/")?;
            Ok(())
        })?
        .get("/error/handled", |_ctx, _next| {
            Err(HandlerError::bad_request("Invalid input provided"))
        })?
        .get("/error/unhandled", |_ctx, _next| {
            Err(HandlerError::internal("database connection lost"))
        })?
        .get("/error/panic", |_ctx, _next| {
            // Exercises the panic boundary.
            panic!("handler blew up");
        })?;

    let json_body: BoxedHandler = Arc::new(JsonBody);
    router.register(Method::POST, "/echo", vec![json_body, endpoint(echo)])?;

    let protected: BoxedHandler = Arc::new(RequireAuth::bearer(api_token));
    router.register(
        Method::GET,
        "/protected",
        vec![
            protected,
            endpoint(|ctx| {
                ctx.json(StatusCode::OK, &json!({ "message": "Access granted" }))?;
                Ok(())
            }),
        ],
    )?;

    let store = Arc::clone(&sessions);
    let credentials: BoxedHandler = Arc::new(Validate::new().body_field("username").body_field("password"));
    router.register(
        Method::POST,
        "/login",
        vec![credentials, endpoint(move |ctx| login(ctx, &store))],
    )?;

    router.get("/profile", |ctx, _next| {
        let Some(session) = ctx.extensions().get::<Session>() else {
            ctx.json(
                StatusCode::UNAUTHORIZED,
                &json!({ "error": "Unauthorized", "message": "Please log in" }),
            )?;
            return Ok(());
        };
        let body = json!({
            "username": session.get::<String>("username"),
            "name": session.get::<String>("name"),
        });
        ctx.json(StatusCode::OK, &body)?;
        Ok(())
    })?;

    let store = sessions;
    router.register(
        Method::POST,
        "/logout",
        vec![endpoint(move |ctx| {
            let id = ctx.extensions().get::<Session>().map(|s| s.id().to_string());
            if let Some(id) = id {
                store.destroy(&id);
            }
            store.clear_cookie(ctx)?;
            ctx.json(StatusCode::OK, &json!({ "message": "Logged out" }))?;
            Ok(())
        })],
    )?;

    Ok(())
}

fn search(ctx: &mut Context, _next: Next<'_>) -> HandlerResult {
    let page = match ctx.query("page") {
        None => 1,
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| HandlerError::bad_request("page must be a number"))?,
    };
    let body = json!({
        "query": ctx.query("q").unwrap_or_default(),
        "page": page,
        "tags": ctx.request.query().get_all("tag"),
    });
    ctx.json(StatusCode::OK, &body)?;
    Ok(())
}

fn echo(ctx: &mut Context) -> HandlerResult {
    let body = ctx.request.body();
    let echoed = match body.parsed() {
        Parsed::Json(value) => value.clone(),
        Parsed::Form(form) => json!(form),
        Parsed::Unparsed => body.text().map(Value::from).unwrap_or(Value::Null),
        Parsed::Error(reason) => return Err(HandlerError::bad_request(reason.clone())),
    };
    let response = json!({
        "contentType": body.content_type(),
        "body": echoed,
    });
    ctx.json(StatusCode::OK, &response)?;
    Ok(())
}

fn login(ctx: &mut Context, sessions: &SessionStore) -> HandlerResult {
    let body = ctx.request.body();
    let username = body.field("username").unwrap_or_default();
    let password = body.field("password").unwrap_or_default();

    let Some(&(_, _, name)) = ACCOUNTS
        .iter()
        .find(|(user, pass, _)| *user == username && *pass == password)
    else {
        tracing::debug!(%username, "Login rejected");
        ctx.json(
            StatusCode::UNAUTHORIZED,
            &json!({ "error": "Unauthorized", "message": "Invalid username or password" }),
        )?;
        return Ok(());
    };

    let mut data = Map::new();
    data.insert("username".into(), Value::from(username.clone()));
    data.insert("name".into(), Value::from(name));
    let session = sessions.create(data);
    sessions.issue_cookie(ctx, &session)?;

    tracing::info!(%username, "User logged in");
    ctx.json(
        StatusCode::OK,
        &json!({ "message": "Logged in", "username": username, "name": name }),
    )?;
    Ok(())
}
