//! Message route table.

use crate::context::Context;
use ledgerkit_types::{AppError, HandlerOutput, Msg, RequestQuery, ResponseQuery};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Processes the messages registered under one route.
///
/// Handlers are synchronous and charge gas through the context's meter;
/// returning an error aborts the enclosing transaction and discards its
/// writes.
pub trait Handler: Send + Sync {
    /// Execute one message against the per-transaction context.
    fn process(&self, ctx: &Context, msg: &dyn Msg) -> Result<HandlerOutput, AppError>;

    /// Answer a `/custom/<route>/...` query against a read-only view of the
    /// committed state.
    ///
    /// The default declines: a handler without a query surface reports an
    /// unknown request.
    fn query(&self, _ctx: &Context, req: &RequestQuery) -> ResponseQuery {
        ResponseQuery::from_error(AppError::UnknownRequest(format!(
            "no querier for path {:?}",
            req.path
        )))
    }
}

/// Maps route names to message handlers.
///
/// Registration is append-only and happens before the application seals.
/// Route names are restricted to lowercase alphanumeric.
#[derive(Default)]
pub struct Router {
    routes: BTreeMap<String, Arc<dyn Handler>>,
}

impl Router {
    /// Create an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a route name.
    ///
    /// # Panics
    ///
    /// Panics on an empty or non-`[a-z0-9]` name, and on a duplicate route —
    /// both are wiring bugs, fatal by contract.
    pub fn add_route(&mut self, name: &str, handler: Arc<dyn Handler>) {
        assert!(
            !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
            "route name {name:?} must be non-empty lowercase alphanumeric"
        );
        let prev = self.routes.insert(name.to_string(), handler);
        assert!(prev.is_none(), "route {name:?} is already registered");
    }

    /// Look up the handler for a route.
    pub fn route(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.routes.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;
    impl Handler for Noop {
        fn process(&self, _ctx: &Context, _msg: &dyn Msg) -> Result<HandlerOutput, AppError> {
            Ok(HandlerOutput::default())
        }
    }

    #[test]
    fn registers_and_resolves() {
        let mut router = Router::new();
        router.add_route("bank2", Arc::new(Noop));
        assert!(router.route("bank2").is_some());
        assert!(router.route("other").is_none());
    }

    #[test]
    #[should_panic(expected = "lowercase alphanumeric")]
    fn rejects_invalid_charset() {
        let mut router = Router::new();
        router.add_route("Bank", Arc::new(Noop));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn rejects_duplicates() {
        let mut router = Router::new();
        router.add_route("bank", Arc::new(Noop));
        router.add_route("bank", Arc::new(Noop));
    }
}
