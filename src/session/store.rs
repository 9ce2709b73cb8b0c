//! In-memory session storage.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::context::{cookie_builder, Context, ResponseError};

/// A live session handed to handlers through the Context extensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    id: String,
    data: Map<String, Value>,
    expires_at: Instant,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| T::deserialize(v).ok())
    }

    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), serde_json::Error> {
        self.data.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }
}

#[derive(Debug)]
struct Entry {
    data: Map<String, Value>,
    expires_at: Instant,
}

/// Session table keyed by random v4 UUIDs.
///
/// Expired entries are invisible to readers and are dropped lazily on
/// access or in bulk by [`SessionStore::purge_expired`].
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Entry>,
    ttl: Duration,
    cookie_name: String,
    secure_cookie: bool,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::from_config(&SessionConfig::default())
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::from_secs(config.ttl_secs),
            cookie_name: config.cookie_name.clone(),
            secure_cookie: config.secure_cookie,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn create(&self, data: Map<String, Value>) -> Session {
        self.create_at(data, Instant::now())
    }

    pub fn create_at(&self, data: Map<String, Value>, now: Instant) -> Session {
        let id = Uuid::new_v4().to_string();
        let expires_at = now + self.ttl;
        self.sessions.insert(
            id.clone(),
            Entry {
                data: data.clone(),
                expires_at,
            },
        );
        tracing::debug!(session = %id, "Session created");
        Session {
            id,
            data,
            expires_at,
        }
    }

    pub fn get(&self, id: &str) -> Option<Session> {
        self.get_at(id, Instant::now())
    }

    /// Look up a live session. Unknown and expired ids both yield `None`.
    pub fn get_at(&self, id: &str, now: Instant) -> Option<Session> {
        let live = self.sessions.get(id).and_then(|entry| {
            (entry.expires_at > now).then(|| Session {
                id: id.to_string(),
                data: entry.data.clone(),
                expires_at: entry.expires_at,
            })
        });
        if live.is_none() {
            self.sessions.remove_if(id, |_, entry| entry.expires_at <= now);
        }
        live
    }

    /// Write back a session's data. Returns false if it no longer exists.
    pub fn save(&self, session: &Session) -> bool {
        match self.sessions.get_mut(&session.id) {
            Some(mut entry) => {
                entry.data = session.data.clone();
                true
            }
            None => false,
        }
    }

    pub fn destroy(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Set the session cookie on the response.
    pub fn issue_cookie(&self, ctx: &mut Context, session: &Session) -> Result<(), ResponseError> {
        let max_age = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let cookie = cookie_builder(self.cookie_name.clone(), session.id())
            .max_age(cookie::time::Duration::seconds(max_age))
            .secure(self.secure_cookie)
            .build();
        ctx.response.set_cookie(&cookie)?;
        Ok(())
    }

    pub fn clear_cookie(&self, ctx: &mut Context) -> Result<(), ResponseError> {
        ctx.response.clear_cookie(&self.cookie_name)?;
        Ok(())
    }
}
