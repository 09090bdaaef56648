//! Domain events module.
//!
//! Provides domain event types, the sink trait services emit through, and
//! live queries that re-run when the data behind them changes.

mod domain_event;
mod sink;
mod watch;

pub use domain_event::*;
pub use sink::*;
pub use watch::watch_query;
