//! Per-request state.
//!
//! # Data Flow
//! ```text
//! Transport (method, target, headers, body bytes)
//!     → Context::new
//!     → dispatcher binds path params from the winning route
//!     → chain elements read `request`, write `response`, stash typed
//!       values in `extensions`
//!     → transport serializes `response`
//! ```
//!
//! # Design Decisions
//! - Exactly one Context per request, exclusively borrowed by its dispatch
//! - Headers are `http::HeaderMap`, so lookups are case-insensitive
//! - Body parsing is lazy and memoized (see [`body::Parsed`])

pub mod body;
pub mod cookies;
pub mod request;
pub mod response;

pub use body::{Body, BodyError, FormMap, Parsed};
pub use cookies::{cookie_builder, removal_cookie};
pub use request::{QueryMap, Request};
pub use response::{Response, ResponseError};

use axum::body::Bytes;
use axum::http::{Extensions, HeaderMap, Method, StatusCode};
use serde::Serialize;

/// Request view, response accumulator and typed extensions for one request.
#[derive(Debug)]
pub struct Context {
    pub request: Request,
    pub response: Response,
    extensions: Extensions,
}

impl Context {
    pub fn new(method: Method, target: &str, headers: HeaderMap, body: Bytes) -> Self {
        Self::from_request(Request::new(method, target, headers, body))
    }

    pub fn from_request(request: Request) -> Self {
        Self {
            request,
            response: Response::default(),
            extensions: Extensions::new(),
        }
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    // Shorthands for the most common reads and writes.

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.path()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query().get(name)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.request.cookie(name)
    }

    /// Set the status and write a JSON body in one step.
    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) -> Result<(), ResponseError> {
        self.response.set_status(status)?.write_json(value)?;
        Ok(())
    }

    /// Set the status and an HTML body in one step.
    pub fn html(&mut self, status: StatusCode, body: impl Into<Vec<u8>>) -> Result<(), ResponseError> {
        self.response
            .set_status(status)?
            .content_type("text/html; charset=utf-8")?
            .send(body)?;
        Ok(())
    }

    /// Set the status and a plain-text body in one step.
    pub fn text(&mut self, status: StatusCode, body: impl Into<Vec<u8>>) -> Result<(), ResponseError> {
        self.response
            .set_status(status)?
            .content_type("text/plain; charset=utf-8")?
            .send(body)?;
        Ok(())
    }
}
