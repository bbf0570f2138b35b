//! Configuration for the wren development server.
//!
//! Settings are layered with figment. Priority: CLI > environment (`WREN_*`) >
//! config file (`wren.toml` or the `wren` field of `package.json`) > defaults.

pub mod discovery;
pub mod error;
pub mod loading;
pub mod serve;
pub mod validation;

pub use discovery::ConfigDiscovery;
pub use error::{ConfigError, Result};
pub use loading::{
    CacheOverrides, ConfigOverrides, ImportMapOverrides, ReloadOverrides, WatchOverrides,
};
pub use serve::{CacheConfig, ImportMapConfig, ReloadConfig, ServeConfig, WatchConfig};
