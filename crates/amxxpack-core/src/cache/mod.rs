//! Incremental compilation cache for AMXX plugins
//!
//! Records content hashes of every compiled script, its plugin and the
//! project-wide include fingerprint so unchanged plugins can be skipped on
//! the next build.

mod error;
mod hash;
mod plugins;
mod store;

pub use error::{CacheError, Result};
pub use hash::{cache_key, hash_bytes, hash_file, hash_include_dirs, CacheValueKind};
pub use plugins::PluginsCache;
pub use store::{CacheStore, JsonCacheStore};

/// Default cache file name, relative to the project directory
pub const CACHE_FILE_NAME: &str = ".amxxpack-cache.json";

/// Subject of the project-wide include fingerprint
pub const INCLUDES_SUBJECT: &str = ".";
