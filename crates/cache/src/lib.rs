//! Inkwave tile cache.
//!
//! Two-tier (persistent / editing) on-disk cache of rendered document
//! tiles, keyed by document URL and tile geometry, with deferred
//! invalidation tied to the document save lifecycle.

pub mod cache;
pub mod config;
pub mod invalidation;
pub mod paths;
pub mod tile_name;

pub use cache::TileCache;
pub use config::{CacheConfig, ConfigError};
