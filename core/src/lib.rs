//! Core of the Beacon attention engine
//!
//! This crate classifies incoming notifications into priority tiers, groups
//! them into bundles, keeps the cross-module attention store and applies
//! focus mode. The CLI and any UI front-end share it through
//! [`AttentionEngine`].

pub mod badge;
pub mod bundler;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod focus;
pub mod notify;
pub mod persistence;
pub mod registry;


// Re-export schema types for convenience
pub use schema::*;

pub use badge::{format_badge, BadgeView};
pub use bundler::Bundler;
pub use classifier::{classify, Classifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::{Admission, AttentionEngine, EngineBuilder, Subscription};
pub use error::{AttentionError, Result};
pub use focus::{should_deliver, should_deliver_bundle};
pub use notify::{DesktopNotifier, NotificationBackend, Notifier};
pub use persistence::{
    AttentionSnapshot, JsonFileStore, KeyValueStore, MemoryStore, SqliteStore,
};
pub use registry::ModuleRegistry;

/// Core utilities and helper functions
pub mod utils {
    use tracing::info;

    /// Initialize tracing for the application
    ///
    /// `RUST_LOG` takes precedence over `level` when set.
    pub fn init_tracing(level: &str) -> crate::Result<()> {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| crate::AttentionError::Configuration(e.to_string()))?;

        info!("Tracing initialized with level: {}", level);
        Ok(())
    }
}
