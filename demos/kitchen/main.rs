//! Runs a kitchen logging everything it does.
//!
//! ```text
//! cargo run --example kitchen -- demos/kitchen/kitchen.toml
//! ```
//!
//! Without a path, a 5-pizza buffer with 3 consumers is used. Stop it with `Ctrl+C`.

use std::sync::Arc;

use anyhow::Context as _;
use pizzeria::{Config, Coordinator, LogObserver};
use tracing_subscriber::EnvFilter;

/* ---------- */

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path).context("failed to load the kitchen config")?,
        None => Config::new(5, 3),
    };

    let mut coordinator = Coordinator::start_with_observer(config, Arc::new(LogObserver))?;
    coordinator.enable_graceful_shutdown()?;
    coordinator.wait();

    Ok(())
}
