//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional; defaults suit local development.
//!
//! - `KOMBU_HOST` - Bind address (default: 127.0.0.1)
//! - `KOMBU_PORT` - Listen port (default: 4000)
//! - `KOMBU_IMAGE_DIR` - Directory menu images are read from
//!   (default: `images`)
//! - `KOMBU_MENU_CACHE_TTL_SECS` - Menu view cache TTL (default: 300)
//! - `KOMBU_MENU_CACHE_CAPACITY` - Menu view cache max entries (default: 256)
//! - `KOMBU_IMAGE_CACHE_MAX_ENTRIES` - Image cache entry bound (default: 64)
//! - `KOMBU_IMAGE_CACHE_MAX_BYTES` - Image cache byte bound
//!   (default: 33554432, i.e. 32 MiB)
//! - `KOMBU_IMAGE_PRELOAD_THRESHOLD` - Access count above which an image
//!   becomes a preload candidate (default: 10)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Kombu server configuration.
#[derive(Debug, Clone)]
pub struct KombuConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory menu item images are served from
    pub image_dir: PathBuf,
    /// Menu view cache time-to-live
    pub menu_cache_ttl: Duration,
    /// Menu view cache entry capacity
    pub menu_cache_capacity: u64,
    /// Image cache entry-count bound
    pub image_cache_max_entries: usize,
    /// Image cache total-bytes bound
    pub image_cache_max_bytes: usize,
    /// Access count at which an image becomes a preload candidate
    pub image_preload_threshold: u64,
}

impl KombuConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            host: parse_env_or("KOMBU_HOST", "127.0.0.1")?,
            port: parse_env_or("KOMBU_PORT", "4000")?,
            image_dir: PathBuf::from(get_env_or_default("KOMBU_IMAGE_DIR", "images")),
            menu_cache_ttl: Duration::from_secs(parse_env_or(
                "KOMBU_MENU_CACHE_TTL_SECS",
                "300",
            )?),
            menu_cache_capacity: parse_env_or("KOMBU_MENU_CACHE_CAPACITY", "256")?,
            image_cache_max_entries: parse_env_or("KOMBU_IMAGE_CACHE_MAX_ENTRIES", "64")?,
            image_cache_max_bytes: parse_env_or("KOMBU_IMAGE_CACHE_MAX_BYTES", "33554432")?,
            image_preload_threshold: parse_env_or("KOMBU_IMAGE_PRELOAD_THRESHOLD", "10")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for KombuConfig {
    /// Development defaults, matching `from_env` with no variables set.
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 4000,
            image_dir: PathBuf::from("images"),
            menu_cache_ttl: Duration::from_secs(300),
            menu_cache_capacity: 256,
            image_cache_max_entries: 64,
            image_cache_max_bytes: 32 * 1024 * 1024,
            image_preload_threshold: 10,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable with a default value.
fn parse_env_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
