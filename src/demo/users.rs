//! In-memory user directory and its REST router.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::context::Context;
use crate::dispatch::{endpoint, BoxedHandler, HandlerError, HandlerResult};
use crate::middleware::{JsonBody, Validate};
use crate::routing::{PatternError, Router};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug)]
pub struct UserDirectory {
    users: DashMap<u64, User>,
    next_id: AtomicU64,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_data() -> Self {
        let dir = Self::new();
        dir.create(NewUser {
            name: "John Doe".into(),
            email: "john@example.com".into(),
        });
        dir.create(NewUser {
            name: "Jane Smith".into(),
            email: "jane@example.com".into(),
        });
        dir
    }

    /// All users ordered by id.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn get(&self, id: u64) -> Option<User> {
        self.users.get(&id).map(|r| r.value().clone())
    }

    pub fn create(&self, new: NewUser) -> User {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let user = User {
            id,
            name: new.name,
            email: new.email,
        };
        self.users.insert(id, user.clone());
        user
    }

    pub fn update(&self, id: u64, patch: UserPatch) -> Option<User> {
        let mut entry = self.users.get_mut(&id)?;
        if let Some(name) = patch.name {
            entry.name = name;
        }
        if let Some(email) = patch.email {
            entry.email = email;
        }
        Some(entry.value().clone())
    }

    pub fn remove(&self, id: u64) -> Option<User> {
        self.users.remove(&id).map(|(_, user)| user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn user_id(ctx: &Context) -> Result<u64, HandlerError> {
    ctx.param("id")
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| HandlerError::bad_request("user id must be a positive integer"))
}

fn user_not_found(ctx: &mut Context, id: u64) -> HandlerResult {
    ctx.json(
        StatusCode::NOT_FOUND,
        &json!({ "error": "Not Found", "message": format!("User {id} not found") }),
    )?;
    Ok(())
}

/// Prefix-agnostic CRUD router; the caller decides where to mount it.
pub fn api_router(users: Arc<UserDirectory>) -> Result<Router, PatternError> {
    let mut router = Router::new();
    router.use_handler(JsonBody);

    let dir = Arc::clone(&users);
    router.register(
        Method::GET,
        "/users",
        vec![endpoint(move |ctx| {
            let list = dir.list();
            ctx.json(StatusCode::OK, &json!({ "count": list.len(), "users": list }))?;
            Ok(())
        })],
    )?;

    let dir = Arc::clone(&users);
    router.register(
        Method::GET,
        "/users/:id",
        vec![endpoint(move |ctx| {
            let id = user_id(ctx)?;
            match dir.get(id) {
                Some(user) => ctx.json(StatusCode::OK, &user)?,
                None => return user_not_found(ctx, id),
            }
            Ok(())
        })],
    )?;

    let dir = Arc::clone(&users);
    let validate: BoxedHandler = Arc::new(Validate::new().body_field("name").body_field("email"));
    router.register(
        Method::POST,
        "/users",
        vec![
            validate,
            endpoint(move |ctx| {
                let new: NewUser = ctx.request.body().json()?;
                let user = dir.create(new);
                tracing::info!(user_id = user.id, "User created");
                ctx.json(StatusCode::CREATED, &user)?;
                Ok(())
            }),
        ],
    )?;

    let dir = Arc::clone(&users);
    router.register(
        Method::PUT,
        "/users/:id",
        vec![endpoint(move |ctx| {
            let id = user_id(ctx)?;
            let patch: UserPatch = ctx.request.body().json()?;
            match dir.update(id, patch) {
                Some(user) => ctx.json(StatusCode::OK, &user)?,
                None => return user_not_found(ctx, id),
            }
            Ok(())
        })],
    )?;

    let dir = users;
    router.register(
        Method::DELETE,
        "/users/:id",
        vec![endpoint(move |ctx| {
            let id = user_id(ctx)?;
            match dir.remove(id) {
                Some(user) => ctx.json(
                    StatusCode::OK,
                    &json!({ "message": "User deleted", "user": user }),
                )?,
                None => return user_not_found(ctx, id),
            }
            Ok(())
        })],
    )?;

    Ok(router)
}
