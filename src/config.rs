use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "PHOTOMIRROR_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// JSON export of the photo library. `sync --catalog` takes precedence.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Emit a progress line every N processed items.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    /// Clear shared album memberships before re-adding them.
    /// Off by default: shared albums are only ever added to.
    #[serde(default)]
    pub prune_shared_albums: bool,
}

fn default_batch_size() -> usize {
    100
}

fn default_progress_interval() -> usize {
    10
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            progress_interval: default_progress_interval(),
            prune_shared_albums: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_page_size() -> u32 {
    50
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    #[serde(default = "default_thumb_size")]
    pub default_size: u32,

    #[serde(default = "default_thumb_max_size")]
    pub max_size: u32,

    /// JPEG quality (1-100)
    #[serde(default = "default_thumb_quality")]
    pub quality: u8,

    /// Rendered thumbnails are cached here when set.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

fn default_thumb_size() -> u32 {
    300
}

fn default_thumb_max_size() -> u32 {
    2048
}

fn default_thumb_quality() -> u8 {
    85
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            default_size: default_thumb_size(),
            max_size: default_thumb_max_size(),
            quality: default_thumb_quality(),
            cache_dir: None,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photomirror")
        .join("photomirror.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            catalog: CatalogConfig::default(),
            sync: SyncConfig::default(),
            server: ServerConfig::default(),
            thumbnails: ThumbnailConfig::default(),
        }
    }
}

impl Config {
    /// Load from the default location, writing a default config on first run.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photomirror")
    }

    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sync.batch_size, 100);
        assert_eq!(config.sync.progress_interval, 10);
        assert!(!config.sync.prune_shared_albums);
        assert_eq!(config.server.page_size, 50);
        assert_eq!(config.thumbnails.default_size, 300);
        assert!(config.catalog.path.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            db_path = "/tmp/mirror.db"

            [sync]
            batch_size = 25
            prune_shared_albums = true

            [thumbnails]
            quality = 70
            "#,
        )
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/mirror.db"));
        assert_eq!(config.sync.batch_size, 25);
        assert_eq!(config.sync.progress_interval, 10);
        assert!(config.sync.prune_shared_albums);
        assert_eq!(config.thumbnails.quality, 70);
        assert_eq!(config.thumbnails.max_size, 2048);
    }

    #[test]
    fn test_save_and_load_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.bind = "0.0.0.0:9000".to_string();
        config.catalog.path = Some(PathBuf::from("/exports/library.json"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.bind, "0.0.0.0:9000");
        assert_eq!(loaded.catalog.path, Some(PathBuf::from("/exports/library.json")));
    }
}
