//! Session lookup middleware.

use std::sync::Arc;

use crate::context::Context;
use crate::dispatch::{Handler, HandlerResult, Next};
use crate::session::store::SessionStore;

/// Resolves the session cookie and inserts the live
/// [`Session`](crate::session::Session) into the Context extensions.
///
/// A missing cookie, an unknown id and an expired id all look the same
/// downstream: no `Session` extension.
#[derive(Debug, Clone)]
pub struct LoadSession {
    store: Arc<SessionStore>,
}

impl LoadSession {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }
}

impl Handler for LoadSession {
    fn call(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let session = ctx
            .cookie(self.store.cookie_name())
            .and_then(|id| self.store.get(id));
        if let Some(session) = session {
            ctx.extensions_mut().insert(session);
        }
        next.run(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::routing::Router;
    use crate::session::Session;
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
    use std::time::Duration;

    fn dispatcher(store: Arc<SessionStore>) -> Dispatcher {
        let mut router = Router::new();
        router.use_handler(LoadSession::new(store));
        router
            .get("/whoami", |ctx, _next| {
                let user = ctx
                    .extensions()
                    .get::<Session>()
                    .and_then(|s| s.get::<String>("user"))
                    .unwrap_or_else(|| "anonymous".to_string());
                ctx.text(StatusCode::OK, user)?;
                Ok(())
            })
            .unwrap();
        Dispatcher::new(router)
    }

    fn whoami(d: &Dispatcher, cookie: Option<String>) -> Vec<u8> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie {
            headers.insert("cookie", HeaderValue::from_str(&cookie).unwrap());
        }
        let mut ctx = Context::new(Method::GET, "/whoami", headers, Default::default());
        d.dispatch(&mut ctx);
        ctx.response.body().to_vec()
    }

    #[test]
    fn test_live_session_is_loaded() {
        let store = Arc::new(SessionStore::new(Duration::from_secs(60)));
        let mut data = serde_json::Map::new();
        data.insert("user".into(), "ann".into());
        let session = store.create(data);
        let d = dispatcher(Arc::clone(&store));

        assert_eq!(whoami(&d, Some(format!("session_id={}", session.id()))), b"ann");
    }

    #[test]
    fn test_absent_unknown_and_expired_are_anonymous() {
        let store = Arc::new(SessionStore::new(Duration::ZERO));
        let expired = store.create(serde_json::Map::new());
        let d = dispatcher(store);

        assert_eq!(whoami(&d, None), b"anonymous");
        assert_eq!(whoami(&d, Some("session_id=bogus".into())), b"anonymous");
        assert_eq!(
            whoami(&d, Some(format!("session_id={}", expired.id()))),
            b"anonymous"
        );
    }
}
