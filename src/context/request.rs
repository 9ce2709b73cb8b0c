//! Read-side view of an inbound request.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method};

use crate::context::body::Body;
use crate::context::cookies::parse_cookies;
use crate::routing::ParamMap;

/// Decoded query string. Lookups return the last value for a key;
/// [`QueryMap::get_all`] exposes every value in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
    values: HashMap<String, Vec<String>>,
}

impl QueryMap {
    pub fn parse(raw: &str) -> Self {
        let mut values: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|v| v.last())
            .map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.values
            .get(key)
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate keys with their last value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .filter_map(|(k, v)| v.last().map(|last| (k.as_str(), last.as_str())))
    }
}

/// Inbound request state as handed over by the transport.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    raw_query: Option<String>,
    query: QueryMap,
    params: ParamMap,
    headers: HeaderMap,
    cookies: HashMap<String, String>,
    body: Body,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Build from transport parts. `target` is the request target
    /// (path with optional `?query`).
    pub fn new(method: Method, target: &str, headers: HeaderMap, body: Bytes) -> Self {
        let (path, raw_query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        let query = raw_query
            .as_deref()
            .map(QueryMap::parse)
            .unwrap_or_default();
        let cookies = parse_cookies(&headers);
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            method,
            path: path.to_string(),
            raw_query,
            query,
            params: ParamMap::new(),
            headers,
            cookies,
            body: Body::new(body, content_type),
            remote_addr: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Raw path, without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    pub fn query(&self) -> &QueryMap {
        &self.query
    }

    pub fn params(&self) -> &ParamMap {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn set_params(&mut self, params: ParamMap) {
        self.params = params;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text. Names are case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}
