//! Query dispatch over committed state.
//!
//! Paths have the shape `/app/<subcommand>`, `/store/<name>/<subcommand>`
//! or `/custom/<route>/...` (forwarded to the route's handler querier).
//! Queries read strictly from committed versions, never from the check or
//! deliver states: a write becomes queryable only after the commit that
//! persists it.

use crate::app::App;
use ledgerkit_storage::CommitKvStore;
use ledgerkit_types::{AppError, RequestQuery, ResponseQuery};

impl App {
    /// Answer a query against the last committed version (or the version in
    /// `req.height`, for store reads).
    pub fn query(&self, req: RequestQuery) -> ResponseQuery {
        let path = req.path.clone();
        let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
        match parts.as_slice() {
            ["app", "simulate"] => self.query_simulate(&req),
            ["app", "version"] => ResponseQuery::ok(
                self.app_version().as_bytes().to_vec(),
                self.last_block_height(),
            ),
            ["store", name, "key"] => self.query_store_key(name, req),
            ["custom", route, ..] => self.query_custom(route, &req),
            _ => ResponseQuery::from_error(AppError::UnknownRequest(format!(
                "unknown query path {:?}",
                req.path
            ))),
        }
    }

    /// `/app/simulate`: run the simulate pipeline on the encoded tx in
    /// `data` and return the borsh-encoded result.
    fn query_simulate(&self, req: &RequestQuery) -> ResponseQuery {
        let result = self.simulate(&req.data);
        match borsh::to_vec(&result) {
            Ok(value) => ResponseQuery::ok(value, self.last_block_height()),
            Err(err) => {
                ResponseQuery::from_error(AppError::Internal(format!("simulate encode: {err}")))
            }
        }
    }

    /// `/store/<name>/key`: raw get from the named store at the requested
    /// version (default latest committed).
    fn query_store_key(&self, name: &str, req: RequestQuery) -> ResponseQuery {
        let Some(engine) = self.commit_multi_store().store_by_name(name) else {
            return ResponseQuery::from_error(AppError::UnknownRequest(format!(
                "no store named {name:?}"
            )));
        };
        match engine.get_at_version(&req.data, req.height) {
            Ok(value) => {
                let height = if req.height == 0 {
                    self.last_block_height()
                } else {
                    req.height
                };
                ResponseQuery {
                    key: req.data,
                    value: value.unwrap_or_default(),
                    height,
                    ..Default::default()
                }
            }
            Err(error) => ResponseQuery::from_error(error),
        }
    }
}
