//! Response accumulator.
//!
//! # Responsibilities
//! - Collect status, headers and body while the chain runs
//! - Refuse status/header changes once the response has been flushed
//!
//! # Design Decisions
//! - Every writer is a plain accumulator; nothing reaches the transport
//!   until dispatch returns
//! - `flush` marks the head as committed; body appends stay legal after it

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use serde::Serialize;
use thiserror::Error;

use cookie::Cookie;

use crate::context::cookies::{removal_cookie, to_header_value};

/// Errors raised by response writers.
#[derive(Debug, Error)]
pub enum ResponseError {
    /// Status or headers were mutated after the response was flushed.
    #[error("response already sent; status and headers can no longer change")]
    AlreadySent,

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    #[error("failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mutable response state threaded through the chain.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    sent: bool,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            sent: false,
        }
    }
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    fn ensure_open(&self) -> Result<(), ResponseError> {
        if self.sent {
            Err(ResponseError::AlreadySent)
        } else {
            Ok(())
        }
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        self.status = status;
        Ok(self)
    }

    /// Set the status from a raw code.
    pub fn set_status_code(&mut self, code: u16) -> Result<&mut Self, ResponseError> {
        let status = StatusCode::from_u16(code).map_err(|_| ResponseError::InvalidStatus(code))?;
        self.set_status(status)
    }

    /// Replace any existing values for `name`.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        let (name, value) = parse_header(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add a value for `name`, keeping existing ones.
    pub fn append_header(&mut self, name: &str, value: &str) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        let (name, value) = parse_header(name, value)?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn remove_header(&mut self, name: &str) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        self.headers.remove(name);
        Ok(self)
    }

    pub fn content_type(&mut self, value: &str) -> Result<&mut Self, ResponseError> {
        self.set_header(header::CONTENT_TYPE.as_str(), value)
    }

    /// Append bytes to the body buffer.
    pub fn write_body(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        self.body.extend_from_slice(chunk.as_ref());
        self
    }

    /// Replace the body. Sets `text/html` when no content type is present.
    pub fn send(&mut self, body: impl Into<Vec<u8>>) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        if !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
        }
        self.body = body.into();
        Ok(self)
    }

    /// Serialize `value` as the body with `application/json`.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        let bytes = serde_json::to_vec(value)?;
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = bytes;
        Ok(self)
    }

    /// `302 Found` to `location`.
    pub fn redirect_to(&mut self, location: &str) -> Result<&mut Self, ResponseError> {
        self.redirect_with(StatusCode::FOUND, location)
    }

    pub fn redirect_with(&mut self, status: StatusCode, location: &str) -> Result<&mut Self, ResponseError> {
        self.ensure_open()?;
        self.set_header(header::LOCATION.as_str(), location)?;
        self.status = status;
        self.body.clear();
        Ok(self)
    }

    /// Append a `Set-Cookie` header. Build cookies with
    /// [`cookie_builder`](crate::context::cookie_builder) for the usual defaults.
    pub fn set_cookie(&mut self, cookie: &Cookie<'_>) -> Result<&mut Self, ResponseError> {
        self.append_header(header::SET_COOKIE.as_str(), &to_header_value(cookie))
    }

    /// Expire a cookie on the client.
    pub fn clear_cookie(&mut self, name: &str) -> Result<&mut Self, ResponseError> {
        self.set_cookie(&removal_cookie(name.to_string()))
    }

    /// Commit status and headers. Later status/header changes fail with
    /// [`ResponseError::AlreadySent`].
    pub fn flush(&mut self) {
        self.sent = true;
    }

    /// Drop everything written so far. Only legal before flush.
    pub(crate) fn reset(&mut self) -> Result<(), ResponseError> {
        self.ensure_open()?;
        *self = Self::default();
        Ok(())
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), ResponseError> {
    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| ResponseError::InvalidHeader(name.to_string()))?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| ResponseError::InvalidHeader(format!("{name}: {value}")))?;
    Ok((name, value))
}
