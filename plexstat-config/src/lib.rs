//! Configuration for the plexstat collector.
//!
//! Values come from, in increasing precedence: built-in defaults, a TOML
//! file, the process environment (optionally seeded from `.env`), and
//! explicit overrides supplied by the command line.

#![allow(missing_docs)]

pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    Config, ConfigMetadata, ConfigOverrides, PlexConfig, RefreshConfig, ServerConfig,
    sources::{EnvConfig, FileConfig},
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
