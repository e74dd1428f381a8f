//! Outfit Planner
//!
//! Composition root of the workspace: configuration, logging setup and the
//! assembled application. The auth screens' logic lives in `app-core`, the
//! session and submission state in `app-state`, navigation in `app-ui` and
//! the service boundary in `auth-client`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod app;
pub mod config;

pub use app::OutfitPlanner;
pub use config::AppConfig;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Fails if a
/// subscriber is already installed or the filter does not parse.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()?;
    Ok(())
}
