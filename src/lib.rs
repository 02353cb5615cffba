//! Bridgemon Library
//!
//! Cross-chain bridge integrity monitor for an Omnichain Fungible
//! Token deployment. Each scheduler trigger runs one tick: sample the
//! Adapter-locked balance on the home chain and the OFT total supply
//! on the remote chain, compare them exactly, and on divergence alert
//! the operators and disarm the bridge with a privileged `resetPeer`
//! call on the configured side.

pub mod breaker;
pub mod chain_adapters;
pub mod checker;
pub mod config;
pub mod errors;
pub mod notifications;
pub mod sampler;
pub mod secrets;
pub mod tick;
pub mod types;

pub use crate::config::MonitorConfig;
pub use crate::errors::{MonitorError, TickFailure, TickPhase};
pub use crate::types::{BreakerSide, Reading, TickOutcome};

use anyhow::{Context, Result};
use tracing::info;

/// Initialize logging
pub fn init_logging(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;

    info!("Logging initialized at {} level", log_level);
    Ok(())
}

/// Version information
pub mod version {
    /// Current version from Cargo.toml
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
