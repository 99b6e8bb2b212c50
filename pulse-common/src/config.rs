//! Configuration loading and resolution
//!
//! Every setting resolves through the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The config file is optional; a missing file yields the defaults. An
//! absent insight API key is a supported configuration (the generator runs
//! in offline-fallback mode), not an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

/// Default bind address for the service
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port for the service
pub const DEFAULT_PORT: u16 = 5780;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Storage backend selected at startup.
///
/// The store contract holds identically regardless of which backend is
/// active; call sites never branch on this after initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// Process-memory only; data is lost on restart
    Memory,
    /// Single JSON snapshot file, rewritten in full on every mutation
    File,
    /// SQLite database
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{}' (expected memory, file, or sqlite)",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageBackend::Memory => "memory",
            StorageBackend::File => "file",
            StorageBackend::Sqlite => "sqlite",
        };
        write!(f, "{}", name)
    }
}

/// Resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageConfig,
    pub insights: InsightsConfig,
}

/// Resolved storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Path of the JSON snapshot used by the file backend
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("submissions.json")
    }

    /// Path of the SQLite database used by the sqlite backend
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("pulse.db")
    }
}

/// Resolved insight-generation configuration
#[derive(Debug, Clone)]
pub struct InsightsConfig {
    /// API credential; `None` selects offline-fallback generation
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

/// Command-line overrides, passed in by the binary
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub storage: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
}

/// On-disk TOML configuration shape
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    #[serde(default)]
    pub storage: TomlStorage,
    #[serde(default)]
    pub insights: TomlInsights,
}

#[derive(Debug, Default, Deserialize)]
pub struct TomlStorage {
    pub backend: Option<String>,
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TomlInsights {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Load and resolve the full service configuration.
///
/// `overrides` carries the command-line tier; the environment and TOML tiers
/// are read here. A malformed config file is a startup error; a missing one
/// is the default configuration.
pub fn load(overrides: &Overrides) -> Result<Config> {
    let toml_config = match &overrides.config_file {
        Some(path) => read_config_file(path)?,
        None => match default_config_path() {
            Some(path) if path.exists() => read_config_file(&path)?,
            _ => TomlConfig::default(),
        },
    };

    let host = overrides
        .host
        .clone()
        .or_else(|| env_string("PULSE_HOST"))
        .or(toml_config.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = match &overrides.port {
        Some(port) => *port,
        None => match env_string("PULSE_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("Invalid PULSE_PORT value '{}'", raw)))?,
            None => toml_config.port.unwrap_or(DEFAULT_PORT),
        },
    };

    let backend = overrides
        .storage
        .clone()
        .or_else(|| env_string("PULSE_STORAGE"))
        .or(toml_config.storage.backend)
        .map(|raw| raw.parse())
        .transpose()?
        .unwrap_or(StorageBackend::File);

    let data_dir = overrides
        .data_dir
        .clone()
        .or_else(|| env_string("PULSE_DATA_DIR").map(PathBuf::from))
        .or(toml_config.storage.data_dir)
        .unwrap_or_else(default_data_dir);

    let api_key = resolve_api_key(toml_config.insights.api_key);

    let base_url = env_string("PULSE_OPENAI_BASE_URL")
        .or(toml_config.insights.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let model = env_string("PULSE_OPENAI_MODEL")
        .or(toml_config.insights.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let timeout_secs = match env_string("PULSE_OPENAI_TIMEOUT_SECS") {
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            Error::Config(format!("Invalid PULSE_OPENAI_TIMEOUT_SECS value '{}'", raw))
        })?,
        None => toml_config
            .insights
            .timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    };

    Ok(Config {
        host,
        port,
        storage: StorageConfig { backend, data_dir },
        insights: InsightsConfig {
            api_key,
            base_url,
            model,
            timeout_secs,
        },
    })
}

/// Resolve the insight API credential: `PULSE_OPENAI_API_KEY`, then the
/// conventional `OPENAI_API_KEY`, then the TOML tier. Empty or
/// whitespace-only values are treated as unset.
fn resolve_api_key(toml_key: Option<String>) -> Option<String> {
    let mut sources = Vec::new();

    let pulse_key = env_string("PULSE_OPENAI_API_KEY").filter(|k| is_valid_key(k));
    if pulse_key.is_some() {
        sources.push("PULSE_OPENAI_API_KEY");
    }

    let openai_key = env_string("OPENAI_API_KEY").filter(|k| is_valid_key(k));
    if openai_key.is_some() {
        sources.push("OPENAI_API_KEY");
    }

    let toml_key = toml_key.filter(|k| is_valid_key(k));
    if toml_key.is_some() {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "Insight API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    pulse_key.or(openai_key).or(toml_key)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_config_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config file {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse config file {} failed: {}", path.display(), e)))
}

/// Default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pulse").join("pulse-api.toml"))
}

/// Default data directory for the platform
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("pulse"))
        .unwrap_or_else(|| PathBuf::from("./pulse_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for name in [
            "PULSE_HOST",
            "PULSE_PORT",
            "PULSE_STORAGE",
            "PULSE_DATA_DIR",
            "PULSE_OPENAI_API_KEY",
            "OPENAI_API_KEY",
            "PULSE_OPENAI_BASE_URL",
            "PULSE_OPENAI_MODEL",
            "PULSE_OPENAI_TIMEOUT_SECS",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert_eq!(
            "File".parse::<StorageBackend>().unwrap(),
            StorageBackend::File
        );
        assert_eq!(
            " sqlite ".parse::<StorageBackend>().unwrap(),
            StorageBackend::Sqlite
        );
        assert!("mongo".parse::<StorageBackend>().is_err());
    }

    #[test]
    #[serial]
    fn test_defaults_when_nothing_configured() {
        clear_env();
        let config = load(&Overrides::default()).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.insights.api_key.is_none());
        assert_eq!(config.insights.model, DEFAULT_MODEL);
        assert_eq!(config.insights.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    #[serial]
    fn test_cli_beats_env() {
        clear_env();
        std::env::set_var("PULSE_PORT", "6000");
        std::env::set_var("PULSE_STORAGE", "sqlite");

        let overrides = Overrides {
            port: Some(7000),
            storage: Some("memory".to_string()),
            ..Default::default()
        };
        let config = load(&overrides).unwrap();

        assert_eq!(config.port, 7000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_beats_toml() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 6100\n[storage]\nbackend = \"sqlite\"\n[insights]\nmodel = \"gpt-4o\""
        )
        .unwrap();

        std::env::set_var("PULSE_PORT", "6200");
        let overrides = Overrides {
            config_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let config = load(&overrides).unwrap();

        assert_eq!(config.port, 6200);
        // No env/cli for these; TOML tier wins
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.insights.model, "gpt-4o");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_blank_api_key_is_unset() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "   ");
        let config = load(&Overrides::default()).unwrap();
        assert!(config.insights.api_key.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_api_key_from_env() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        let config = load(&Overrides::default()).unwrap();
        assert_eq!(config.insights.api_key.as_deref(), Some("sk-test"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_env_is_an_error() {
        clear_env();
        std::env::set_var("PULSE_PORT", "not-a-port");
        assert!(load(&Overrides::default()).is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_config_file_is_an_error() {
        clear_env();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"definitely not a number").unwrap();

        let overrides = Overrides {
            config_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        assert!(load(&overrides).is_err());
    }
}
