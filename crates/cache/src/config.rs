//! Cache configuration.
//!
//! The only required setting is the cache base directory under which
//! per-document roots are created. Configuration can be loaded from a file,
//! from the environment, or built programmatically.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Configuration for the tile cache subsystem.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Directory under which per-document cache roots are created.
    pub cache_base: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { cache_base: Self::default_cache_dir() }
    }
}

impl CacheConfig {
    pub fn new<P: AsRef<Path>>(cache_base: P) -> Self {
        Self { cache_base: cache_base.as_ref().to_path_buf() }
    }

    /// Sets the cache base directory.
    pub fn with_cache_base<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_base = path.as_ref().to_path_buf();
        self
    }

    /// Returns the default cache directory for the current platform.
    ///
    /// - macOS: ~/Library/Caches/inkwave/tiles
    /// - Linux: ~/.cache/inkwave/tiles
    /// - Windows: %LOCALAPPDATA%\inkwave\tiles
    pub fn default_cache_dir() -> PathBuf {
        if let Some(cache_dir) = dirs::cache_dir() {
            cache_dir.join("inkwave").join("tiles")
        } else {
            // Fallback to current directory if cache dir unavailable
            PathBuf::from("cache/tiles")
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `INKWAVE_CACHE_DIR`: cache base directory path
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("INKWAVE_CACHE_DIR") {
            config.cache_base = PathBuf::from(val);
        }

        config
    }

    /// Loads configuration from a TOML file.
    ///
    /// Expected file format:
    /// ```toml
    /// cache_dir = "/var/cache/inkwave/tiles"
    /// ```
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from a TOML string.
    fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for line in toml_str.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');

                match key {
                    "cache_dir" => {
                        if value.is_empty() {
                            return Err(ConfigError::InvalidValue(key.to_string()));
                        }
                        config.cache_base = PathBuf::from(value);
                    }
                    _ => {} // Ignore unknown keys
                }
            }
        }

        Ok(config)
    }

    /// Saves configuration to a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path.as_ref(), self.to_toml())?;
        Ok(())
    }

    /// Converts configuration to TOML format.
    fn to_toml(&self) -> String {
        format!(
            "# Inkwave tile cache configuration\n\
             cache_dir = \"{}\"\n",
            self.cache_base.display()
        )
    }
}

/// Errors that can occur during configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for configuration key: {0}")]
    InvalidValue(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert!(config.cache_base.ends_with("tiles"));
    }

    #[test]
    fn test_builder() {
        let config = CacheConfig::default().with_cache_base("/custom/path");
        assert_eq!(config.cache_base, PathBuf::from("/custom/path"));
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            # Test configuration
            cache_dir = "/tmp/test-tiles"
        "#;

        let config = CacheConfig::from_toml(toml).unwrap();
        assert_eq!(config.cache_base, PathBuf::from("/tmp/test-tiles"));
    }

    #[test]
    fn test_from_toml_empty_falls_back_to_default() {
        let config = CacheConfig::from_toml("").unwrap();
        assert_eq!(config, CacheConfig::default());
    }

    #[test]
    fn test_from_toml_unknown_keys_ignored() {
        let toml = r#"
            cache_dir = "/tmp/test-tiles"
            render_threads = 8
        "#;

        let config = CacheConfig::from_toml(toml).unwrap();
        assert_eq!(config.cache_base, PathBuf::from("/tmp/test-tiles"));
    }

    #[test]
    fn test_from_toml_rejects_empty_value() {
        let result = CacheConfig::from_toml("cache_dir = \"\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CacheConfig::new("/var/cache/inkwave/tiles");
        let parsed = CacheConfig::from_toml(&config.to_toml()).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_file_save_and_load() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let config_path = temp.path().join("cache.toml");

        let config = CacheConfig::new("/tmp/tiles");
        config.save_to_file(&config_path).unwrap();

        let loaded = CacheConfig::from_file(&config_path).unwrap();
        assert_eq!(config, loaded);
    }
}
