//! Ledgerbook host: configuration, logging and service wiring.

pub mod config;
pub mod main_lib;

pub use config::{Config, LogFormat};
pub use main_lib::{build_context, init_tracing, AppContext};
