//! Deterministic replicated application core.
//!
//! Sits between a Byzantine-fault-tolerant consensus engine and an
//! application's business-logic handlers. Consensus drives the lifecycle
//! (`init_chain`, `begin_block`, `check_tx`/`deliver_tx`, `end_block`,
//! `commit`, `query`); the core executes transactions against a versioned
//! multi-store, enforcing gas budgets and isolating speculative state behind
//! cache overlays.
//!
//! # Construction and sealing
//!
//! Configuration happens on [`AppBuilder`] — options, handlers, routes and
//! store mounts. `load_latest_version()` (or `load_version(v)`) consumes the
//! builder and returns the sealed [`App`]; there is no setter left to call
//! afterwards, so mutation-after-seal is unrepresentable rather than merely
//! checked.
//!
//! # Execution states
//!
//! Three sandboxes exist over the committed multi-store: the check state
//! (admission), the deliver state (block execution) and an on-demand
//! simulate view derived from the check snapshot. Each transaction runs in
//! its own nested cache which is flushed into the mode state only on
//! success.

#![warn(missing_docs)]

mod app;
mod builder;
mod context;
mod handler;
mod query;
mod router;
mod state;

pub use app::App;
pub use builder::AppBuilder;
pub use context::Context;
pub use handler::{AnteHandler, AnteOutcome, BeginBlocker, EndBlocker, InitChainer};
pub use router::{Handler, Router};
pub use state::ExecMode;
