//! Composable routers.
//!
//! # Responsibilities
//! - Own a route table and router-scoped middleware
//! - Hold child routers mounted under literal prefixes
//! - Resolve (method, path) into params plus the effective handler chain
//!
//! # Design Decisions
//! - Mount prefixes are stored, not flattened: a child router keeps its own
//!   prefix-agnostic patterns and can be mounted in several places
//! - Local routes are tried before mounts; mounts are tried longest prefix
//!   first, ties in mount order
//! - Router middleware is prepended, parent before child, ahead of the
//!   route's own chain

use std::sync::Arc;

use axum::http::Method;

use crate::context::Context;
use crate::dispatch::{BoxedHandler, Handler, HandlerResult, Next};
use crate::routing::pattern::{normalize_mount_prefix, strip_mount_prefix, ParamMap, PatternError};
use crate::routing::table::{MethodFilter, RouteTable};

#[derive(Debug)]
struct Mount {
    prefix: String,
    router: Arc<Router>,
}

/// Listing entry produced by [`Router::describe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: String,
    pub path: String,
    pub chain_len: usize,
}

#[derive(Default)]
pub struct Router {
    middleware: Vec<BoxedHandler>,
    routes: RouteTable,
    mounts: Vec<Mount>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("middleware", &self.middleware.len())
            .field("routes", &self.routes)
            .field("mounts", &self.mounts)
            .finish()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append closure middleware that runs for every route resolved through
    /// this router or its mounts.
    pub fn use_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(f));
        self
    }

    /// Append a middleware value (see [`crate::middleware`]).
    pub fn use_handler<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.middleware.push(Arc::new(handler));
        self
    }

    /// Append an already boxed middleware.
    pub fn use_boxed(&mut self, handler: BoxedHandler) -> &mut Self {
        self.middleware.push(handler);
        self
    }

    /// Register a route with an explicit chain (route middleware followed by
    /// the terminal handler).
    pub fn register(
        &mut self,
        method: impl Into<MethodFilter>,
        pattern: &str,
        chain: Vec<BoxedHandler>,
    ) -> Result<&mut Self, PatternError> {
        self.routes.register(method.into(), pattern, chain)?;
        Ok(self)
    }

    pub fn get<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::GET, pattern, vec![Arc::new(f)])
    }

    pub fn post<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::POST, pattern, vec![Arc::new(f)])
    }

    pub fn put<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::PUT, pattern, vec![Arc::new(f)])
    }

    pub fn patch<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::PATCH, pattern, vec![Arc::new(f)])
    }

    pub fn delete<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(Method::DELETE, pattern, vec![Arc::new(f)])
    }

    /// Route matching every method.
    pub fn all<F>(&mut self, pattern: &str, f: F) -> Result<&mut Self, PatternError>
    where
        F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.register(MethodFilter::Any, pattern, vec![Arc::new(f)])
    }

    /// Attach `child` under a literal prefix.
    pub fn mount(&mut self, prefix: &str, child: impl Into<Arc<Router>>) -> Result<&mut Self, PatternError> {
        let prefix = normalize_mount_prefix(prefix)?;
        let at = self
            .mounts
            .iter()
            .position(|m| m.prefix.len() < prefix.len())
            .unwrap_or(self.mounts.len());
        self.mounts.insert(
            at,
            Mount {
                prefix,
                router: child.into(),
            },
        );
        Ok(self)
    }

    /// Middleware registered directly on this router.
    pub fn middleware(&self) -> &[BoxedHandler] {
        &self.middleware
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Resolve a request to its path params and effective chain.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<(ParamMap, Vec<BoxedHandler>)> {
        if let Some((params, route)) = self.routes.find(method, path) {
            let mut chain = Vec::with_capacity(self.middleware.len() + route.chain().len());
            chain.extend(self.middleware.iter().cloned());
            chain.extend(route.chain().iter().cloned());
            return Some((params, chain));
        }

        for mount in &self.mounts {
            let Some(rest) = strip_mount_prefix(&mount.prefix, path) else {
                continue;
            };
            if let Some((params, child_chain)) = mount.router.resolve(method, &rest) {
                let mut chain = Vec::with_capacity(self.middleware.len() + child_chain.len());
                chain.extend(self.middleware.iter().cloned());
                chain.extend(child_chain);
                return Some((params, chain));
            }
        }

        None
    }

    /// Flattened listing of every reachable route with its full path.
    pub fn describe(&self) -> Vec<RouteInfo> {
        let mut out = Vec::new();
        self.describe_into("", self.middleware.len(), &mut out);
        out
    }

    fn describe_into(&self, prefix: &str, inherited: usize, out: &mut Vec<RouteInfo>) {
        for route in self.routes.iter() {
            let path = join_prefix(prefix, route.pattern().as_str());
            out.push(RouteInfo {
                method: route.method().to_string(),
                path,
                chain_len: inherited + route.chain().len(),
            });
        }
        for mount in &self.mounts {
            let prefix = join_prefix(prefix, &mount.prefix);
            mount
                .router
                .describe_into(&prefix, inherited + mount.router.middleware.len(), out);
        }
    }
}

fn join_prefix(prefix: &str, path: &str) -> String {
    match (prefix.trim_end_matches('/'), path) {
        ("", p) => p.to_string(),
        (pre, "/") => pre.to_string(),
        (pre, p) => format!("{pre}{p}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::endpoint;

    fn tagged(tag: &'static str) -> BoxedHandler {
        endpoint(move |ctx| {
            ctx.response.write_body(tag);
            Ok(())
        })
    }

    fn run(chain: &[BoxedHandler]) -> String {
        // Run every element's side effect in order, ignoring `next`.
        let mut ctx = Context::new(Method::GET, "/", Default::default(), Default::default());
        let cursor = std::cell::Cell::new(crate::dispatch::DispatchState::Pending);
        for handler in chain {
            handler.call(&mut ctx, Next::start(&[], &cursor)).unwrap();
        }
        String::from_utf8(ctx.response.body().to_vec()).unwrap()
    }

    #[test]
    fn test_mounted_router_matches_under_prefix_only() {
        let mut api = Router::new();
        api.register(Method::GET, "/users/:id", vec![tagged("user")]).unwrap();

        let mut root = Router::new();
        root.mount("/api", api).unwrap();

        let (params, _) = root.resolve(&Method::GET, "/api/users/42").unwrap();
        assert_eq!(params["id"], "42");
        assert!(root.resolve(&Method::GET, "/users/42").is_none());
        assert!(root.resolve(&Method::GET, "/apix/users/42").is_none());
    }

    #[test]
    fn test_middleware_order_parent_child_route() {
        let mut api = Router::new();
        api.use_boxed(tagged("child-mw,"));
        api.register(Method::GET, "/ping", vec![tagged("route-mw,"), tagged("handler")])
            .unwrap();

        let mut root = Router::new();
        root.use_boxed(tagged("root-mw,"));
        root.mount("/api", api).unwrap();

        let (_, chain) = root.resolve(&Method::GET, "/api/ping").unwrap();
        assert_eq!(run(&chain), "root-mw,child-mw,route-mw,handler");
    }

    #[test]
    fn test_local_routes_before_mounts() {
        let mut child = Router::new();
        child.register(Method::GET, "/x", vec![tagged("child")]).unwrap();

        let mut root = Router::new();
        root.mount("/a", child).unwrap();
        root.register(Method::GET, "/a/x", vec![tagged("local")]).unwrap();

        let (_, chain) = root.resolve(&Method::GET, "/a/x").unwrap();
        assert_eq!(run(&chain), "local");
    }

    #[test]
    fn test_longest_prefix_tried_first() {
        let mut v1 = Router::new();
        v1.register(Method::GET, "/status", vec![tagged("v1")]).unwrap();
        let mut api = Router::new();
        api.register(Method::GET, "/v1/status", vec![tagged("api")]).unwrap();

        let mut root = Router::new();
        root.mount("/api", api).unwrap();
        root.mount("/api/v1", v1).unwrap();

        let (_, chain) = root.resolve(&Method::GET, "/api/v1/status").unwrap();
        assert_eq!(run(&chain), "v1");
    }

    #[test]
    fn test_child_reused_at_two_prefixes() {
        let mut child = Router::new();
        child.register(Method::GET, "/items/:id", vec![tagged("item")]).unwrap();
        let child = Arc::new(child);

        let mut root = Router::new();
        root.mount("/v1", Arc::clone(&child)).unwrap();
        root.mount("/v2/", child).unwrap();

        assert_eq!(root.resolve(&Method::GET, "/v1/items/1").unwrap().0["id"], "1");
        assert_eq!(root.resolve(&Method::GET, "/v2/items/2").unwrap().0["id"], "2");
    }

    #[test]
    fn test_mount_root_path_of_child() {
        let mut child = Router::new();
        child.register(Method::GET, "/", vec![tagged("index")]).unwrap();
        let mut root = Router::new();
        root.mount("/docs", child).unwrap();

        assert!(root.resolve(&Method::GET, "/docs").is_some());
        assert!(root.resolve(&Method::GET, "/docs/").is_some());
    }

    #[test]
    fn test_mount_prefix_must_be_literal() {
        let mut root = Router::new();
        let err = root.mount("/users/:id", Router::new()).unwrap_err();
        assert!(matches!(err, PatternError::InvalidMountPrefix(_)));
    }

    #[test]
    fn test_describe_lists_full_paths() {
        let mut api = Router::new();
        api.register(Method::GET, "/users", vec![tagged("a")]).unwrap();
        api.register(MethodFilter::Any, "/", vec![tagged("b")]).unwrap();
        let mut root = Router::new();
        root.register(Method::GET, "/", vec![tagged("c")]).unwrap();
        root.mount("/api", api).unwrap();

        let paths: Vec<_> = root
            .describe()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect();
        assert_eq!(paths, vec!["GET /", "GET /api/users", "ALL /api"]);
    }
}
