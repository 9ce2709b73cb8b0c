//! Ordered route storage.
//!
//! # Design Decisions
//! - Routes are appended in declaration order and never reordered
//! - Lookup returns the first structural match; there is no specificity
//!   ranking, so an earlier `/a/:x` shadows a later `/a/fixed`
//! - Declaring the same (method, pattern) twice is allowed but logged,
//!   since the later route can never be reached

use std::fmt;

use axum::http::Method;

use crate::dispatch::BoxedHandler;
use crate::routing::pattern::{ParamMap, PathPattern, PatternError};

/// Which request methods a route accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Only(Method),
}

impl MethodFilter {
    /// `HEAD` is accepted wherever `GET` is; the transport drops the body.
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Only(m) => m == method || (*m == Method::GET && *method == Method::HEAD),
        }
    }
}

impl From<Method> for MethodFilter {
    fn from(method: Method) -> Self {
        Self::Only(method)
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("ALL"),
            Self::Only(m) => write!(f, "{m}"),
        }
    }
}

/// A declared route. Immutable once registered.
pub struct Route {
    method: MethodFilter,
    pattern: PathPattern,
    chain: Vec<BoxedHandler>,
}

impl Route {
    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn chain(&self) -> &[BoxedHandler] {
        &self.chain
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and append a route. Fails fast on a malformed
    /// pattern or an empty chain.
    pub fn register(
        &mut self,
        method: MethodFilter,
        pattern: &str,
        chain: Vec<BoxedHandler>,
    ) -> Result<(), PatternError> {
        let pattern = PathPattern::compile(pattern)?;
        if chain.is_empty() {
            return Err(PatternError::EmptyChain(pattern.as_str().to_string()));
        }

        if self
            .routes
            .iter()
            .any(|r| r.method == method && r.pattern == pattern)
        {
            tracing::warn!(
                method = %method,
                pattern = %pattern,
                "Duplicate route declared; the earlier declaration shadows it"
            );
        }

        self.routes.push(Route {
            method,
            pattern,
            chain,
        });
        Ok(())
    }

    /// First route, in registration order, whose method and pattern match.
    pub fn find(&self, method: &Method, path: &str) -> Option<(ParamMap, &Route)> {
        self.routes.iter().find_map(|route| {
            if !route.method.allows(method) {
                return None;
            }
            route.pattern.matches(path).map(|params| (params, route))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::endpoint;

    fn noop() -> Vec<BoxedHandler> {
        vec![endpoint(|_ctx| Ok(()))]
    }

    #[test]
    fn test_first_registered_wins() {
        let mut table = RouteTable::new();
        table.register(Method::GET.into(), "/a/:x", noop()).unwrap();
        table.register(Method::GET.into(), "/a/fixed", noop()).unwrap();

        let (params, route) = table.find(&Method::GET, "/a/fixed").unwrap();
        assert_eq!(route.pattern().as_str(), "/a/:x");
        assert_eq!(params["x"], "fixed");
    }

    #[test]
    fn test_duplicate_is_kept_but_shadowed() {
        let mut table = RouteTable::new();
        table.register(Method::GET.into(), "/dup", noop()).unwrap();
        table
            .register(Method::GET.into(), "/dup", vec![endpoint(|_| Ok(())), endpoint(|_| Ok(()))])
            .unwrap();

        assert_eq!(table.len(), 2);
        let (_, route) = table.find(&Method::GET, "/dup").unwrap();
        assert_eq!(route.chain().len(), 1);
    }

    #[test]
    fn test_method_filter() {
        let mut table = RouteTable::new();
        table.register(Method::POST.into(), "/users", noop()).unwrap();
        table.register(MethodFilter::Any, "/any", noop()).unwrap();

        assert!(table.find(&Method::GET, "/users").is_none());
        assert!(table.find(&Method::POST, "/users").is_some());
        assert!(table.find(&Method::DELETE, "/any").is_some());
    }

    #[test]
    fn test_head_matches_get_routes_only() {
        let mut table = RouteTable::new();
        table.register(Method::GET.into(), "/page", noop()).unwrap();
        table.register(Method::POST.into(), "/form", noop()).unwrap();

        assert!(table.find(&Method::HEAD, "/page").is_some());
        assert!(table.find(&Method::HEAD, "/form").is_none());
        assert!(!MethodFilter::Only(Method::HEAD).allows(&Method::GET));
    }

    #[test]
    fn test_registration_errors() {
        let mut table = RouteTable::new();
        assert!(matches!(
            table.register(Method::GET.into(), "/x/*/y", noop()),
            Err(PatternError::WildcardNotLast(_))
        ));
        assert!(matches!(
            table.register(Method::GET.into(), "/x", Vec::new()),
            Err(PatternError::EmptyChain(_))
        ));
        assert!(table.is_empty());
    }
}
