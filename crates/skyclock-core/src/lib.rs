//! Shared foundation for skyclock: configuration, local persistence and
//! clock formatting.

pub mod clock;
pub mod config;
pub mod store;

pub use clock::{TimeFormat, TimeParts};
pub use config::Config;
pub use store::{FileStore, KvStore, MemoryStore, SharedStore, StoreError};

use anyhow::Result;

/// Initialize logging for the application.
///
/// # Errors
/// Currently infallible; kept fallible for call-site symmetry with the rest
/// of startup.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::debug!("skyclock core initialized");
    Ok(())
}
