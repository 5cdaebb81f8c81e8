#![forbid(unsafe_code)]

//! Host for the gridboard layout engine.
//!
//! # Role in gridboard
//! `gridboard` wires the layout editor to the outside world: it loads the
//! stored layout through a [`store::LayoutStore`], hands applied layouts to
//! the [`gateway::PersistenceGateway`], and exposes both through the
//! `gridboard` command line.
//!
//! # Logging
//! Diagnostics go through `tracing`. [`init_tracing`] installs a stderr
//! subscriber filtered by `RUST_LOG` (default `warn`), so persistence
//! failures are visible without any configuration.

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod replay;
pub mod store;

use tracing_subscriber::EnvFilter;

pub use cli::{Cli, Commands, run, run_from_env};
pub use config::{GlobalArgs, GridboardConfig, StoreTarget};
pub use error::{GridboardError, Result};
pub use gateway::{PersistenceGateway, SaveReport};
pub use store::{FileLayoutStore, HttpLayoutStore, LayoutStore};

/// Install the stderr log subscriber. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
